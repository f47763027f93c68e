use std::ops::{Deref, DerefMut};

use serde::Serialize;

/// One audio elementary stream.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AudioStream {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataformat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channelmode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bits_per_sample: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lossless: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoder_options: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
}

macro_rules! merge_some {
    ($dst:expr, $src:expr, $($field:ident),+ $(,)?) => {
        $( if $src.$field.is_some() { $dst.$field = $src.$field.clone(); } )+
    };
}

impl AudioStream {
    /// Copies every field `other` has set over this stream's values.
    pub fn merge_from(&mut self, other: &AudioStream) {
        merge_some!(
            self,
            other,
            dataformat,
            codec,
            sample_rate,
            channels,
            channelmode,
            bits_per_sample,
            bitrate,
            bitrate_mode,
            lossless,
            compression_ratio,
            encoder_options,
            language,
            name,
            default,
        );
    }
}

/// One video elementary stream.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct VideoStream {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataformat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_x: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_y: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_x: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_y: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_bottom: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_top: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_left: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_right: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bits_per_sample: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lossless: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoder_options: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
}

/// Top-level representative stream plus every stream found.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AudioSection {
    #[serde(flatten)]
    pub stream: AudioStream,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub streams: Vec<AudioStream>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct VideoSection {
    #[serde(flatten)]
    pub stream: VideoStream,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub streams: Vec<VideoStream>,
}

impl Deref for AudioSection {
    type Target = AudioStream;

    fn deref(&self) -> &AudioStream {
        &self.stream
    }
}

impl DerefMut for AudioSection {
    fn deref_mut(&mut self) -> &mut AudioStream {
        &mut self.stream
    }
}

impl Deref for VideoSection {
    type Target = VideoStream;

    fn deref(&self) -> &VideoStream {
        &self.stream
    }
}

impl DerefMut for VideoSection {
    fn deref_mut(&mut self) -> &mut VideoStream {
        &mut self.stream
    }
}

#[test]
fn merge_keeps_unset_fields() {
    let mut track = AudioStream {
        dataformat: Some("ac3".into()),
        language: Some("eng".into()),
        sample_rate: Some(8000.0),
        ..Default::default()
    };
    let parsed = AudioStream {
        sample_rate: Some(48000.0),
        channels: Some(6),
        ..Default::default()
    };
    track.merge_from(&parsed);
    assert_eq!(track.sample_rate, Some(48000.0));
    assert_eq!(track.channels, Some(6));
    assert_eq!(track.language.as_deref(), Some("eng"));
    assert_eq!(track.dataformat.as_deref(), Some("ac3"));
}
