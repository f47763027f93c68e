//! Maps Matroska track entries to audio and video streams.

use std::collections::BTreeMap;

use crate::formats::StreamHeader;
use crate::formats::matroska::Matroska;
use crate::formats::matroska::elements::{DataOffset, TrackEntry, VideoSettings};
use crate::formats::riff::{BitmapInfoHeader, WaveFormatEx};
use crate::process::Session;
use crate::process::subparse::{self, SubInput, SubParser};
use crate::report::{AudioSection, AudioStream, Diagnostics, VideoSection, VideoStream};
use crate::source::ByteRange;
use crate::utils::playtime::round_to;

const TRACK_VIDEO: u64 = 1;
const TRACK_AUDIO: u64 = 2;

/// Short codec name for a Matroska CodecID. Unknown IDs are returned as is.
pub fn codec_common_name(codec_id: &str) -> String {
    let name = match codec_id {
        id if id.starts_with("A_AAC") => "aac",
        "A_AC3" => "ac3",
        "A_DTS" => "dts",
        "A_FLAC" => "flac",
        "A_MPEG/L1" => "mp1",
        "A_MPEG/L2" => "mp2",
        "A_MPEG/L3" => "mp3",
        "A_PCM/INT/LIT" | "A_PCM/INT/BIG" => "pcm",
        "A_QUICKTIME/QDMC" | "A_QUICKTIME/QDM2" => "quicktime",
        "A_VORBIS" => "vorbis",
        "A_MS/ACM" => "acm",
        "V_MPEG1" => "mpeg",
        "V_THEORA" => "theora",
        "V_REAL/RV10" | "V_REAL/RV20" | "V_REAL/RV30" | "V_REAL/RV40" => "real",
        "V_QUICKTIME" => "quicktime",
        "V_MPEG4/ISO/AP" | "V_MPEG4/ISO/ASP" | "V_MPEG4/ISO/SP" => "mpeg4",
        "V_MPEG4/ISO/AVC" => "h264",
        "V_VP8" => "vp8",
        "V_MS/VFW/FOURCC" => "vcm",
        other => other,
    };
    name.to_string()
}

pub fn display_unit(unit: u64) -> &'static str {
    match unit {
        0 => "pixels",
        1 => "centimeters",
        2 => "inches",
        3 => "Display Aspect Ratio",
        _ => "unknown",
    }
}

/// Fills the report's audio and video sections from the track list.
pub(super) fn process_tracks(session: &mut Session, mkv: &mut Matroska) {
    let Matroska {
        tracks,
        track_data_offsets,
        track_codec_parsed,
        ..
    } = mkv;
    let Some(tracks) = tracks.as_ref() else {
        return;
    };

    let mut audio = Vec::new();
    let mut video = Vec::new();
    for track in &tracks.tracks {
        let number = track.track_number.unwrap_or(0);
        let codec_id = track.codec_id.as_deref().unwrap_or_default();
        match track.track_type {
            Some(TRACK_VIDEO) => {
                let (stream, parsed) = video_stream(session, track, codec_id);
                if let Some(parsed) = parsed {
                    track_codec_parsed.insert(number, parsed);
                }
                video.push(stream);
            }
            Some(TRACK_AUDIO) => {
                let mut tracker = AudioTrack {
                    session: &mut *session,
                    offsets: &*track_data_offsets,
                    parsed: &mut *track_codec_parsed,
                    number,
                };
                audio.push(tracker.stream(track, codec_id));
            }
            _ => {}
        }
    }

    let audio = representative(audio, |s| s.default == Some(true), |s| {
        s.default = None;
        s.name = None;
    });
    if let Some((stream, streams)) = audio {
        session.report.audio = Some(AudioSection { stream, streams });
    }
    let video = representative(video, |s| s.default == Some(true), |s| {
        s.default = None;
        s.name = None;
    });
    if let Some((stream, streams)) = video {
        session.report.video = Some(VideoSection { stream, streams });
    }
}

/// Picks the first stream flagged default, or the first stream, as the
/// top-level copy. Per-stream `default` and `name` are dropped from it.
fn representative<S: Clone>(
    streams: Vec<S>,
    is_default: impl Fn(&S) -> bool,
    strip: impl FnOnce(&mut S),
) -> Option<(S, Vec<S>)> {
    let index = streams.iter().position(is_default).unwrap_or(0);
    let mut top = streams.get(index)?.clone();
    strip(&mut top);
    Some((top, streams))
}

fn video_stream(
    session: &mut Session,
    track: &TrackEntry,
    codec_id: &str,
) -> (VideoStream, Option<StreamHeader>) {
    let settings = track.video.clone().unwrap_or_default();
    let VideoSettings {
        pixel_width,
        pixel_height,
        ..
    } = settings;

    let mut stream = VideoStream {
        dataformat: Some(codec_common_name(codec_id)),
        codec: track.codec_name.clone(),
        resolution_x: pixel_width,
        resolution_y: pixel_height,
        display_unit: Some(display_unit(settings.display_unit.unwrap_or(0)).into()),
        display_x: settings.display_width.or(pixel_width),
        display_y: settings.display_height.or(pixel_height),
        crop_bottom: settings.pixel_crop_bottom,
        crop_top: settings.pixel_crop_top,
        crop_left: settings.pixel_crop_left,
        crop_right: settings.pixel_crop_right,
        frame_rate: track
            .default_duration
            .filter(|&d| d > 0)
            .map(|d| round_to(1e9 / d as f64, 3)),
        name: track.name.clone(),
        default: Some(track.flag_default.unwrap_or(true)),
        ..Default::default()
    };

    let mut parsed = None;
    if codec_id == "V_MS/VFW/FOURCC" {
        match track.codec_private.as_deref().map(BitmapInfoHeader::parse) {
            Some(Ok(header)) => {
                stream.codec = Some(header.codec());
                parsed = Some(StreamHeader::Bitmap(header));
            }
            Some(Err(e)) => session.warn(format!("Unable to parse BITMAPINFOHEADER: {e}")),
            None => session.warn("Unable to parse video data because CodecPrivate data not set"),
        }
    }
    (stream, parsed)
}

/// Per-track state for mapping one audio track.
struct AudioTrack<'a, 'o> {
    session: &'a mut Session<'o>,
    offsets: &'a BTreeMap<u64, DataOffset>,
    parsed: &'a mut BTreeMap<u64, StreamHeader>,
    number: u64,
}

impl AudioTrack<'_, '_> {
    fn stream(&mut self, track: &TrackEntry, codec_id: &str) -> AudioStream {
        let settings = track.audio.clone().unwrap_or_default();
        let dataformat = codec_common_name(codec_id);
        let mut stream = AudioStream {
            dataformat: Some(dataformat.clone()),
            codec: track.codec_name.clone(),
            sample_rate: Some(settings.sampling_frequency.unwrap_or(8000.0)),
            channels: Some(settings.channels.unwrap_or(1) as u32),
            bits_per_sample: settings.bit_depth.map(|d| d as u32),
            language: Some(track.language.clone().unwrap_or_else(|| "eng".into())),
            name: track.name.clone(),
            default: Some(track.flag_default.unwrap_or(true)),
            ..Default::default()
        };

        match dataformat.as_str() {
            "pcm" => {
                if let (Some(rate), Some(channels), Some(depth)) =
                    (stream.sample_rate, stream.channels, stream.bits_per_sample)
                {
                    stream.bitrate = Some(rate * channels as f64 * depth as f64);
                }
            }
            "ac3" => self.from_block(&mut stream, track, SubParser::Ac3),
            "dts" => self.from_block(&mut stream, track, SubParser::Dts),
            "mp1" | "mp2" | "mp3" => self.from_block(&mut stream, track, SubParser::Mpeg),
            "flac" => self.from_block(&mut stream, track, SubParser::Flac),
            "aac" => self.session.warn(format!(
                "{codec_id} audio data contains no header, audio/video bitrates can't be calculated"
            )),
            "vorbis" => self.vorbis(&mut stream, track),
            "acm" => self.wave_format(&mut stream, track),
            _ => self.session.warn(format!("Unhandled audio type \"{codec_id}\"")),
        }
        stream
    }

    /// Runs a nested parser over the first block of the track. FLAC takes
    /// its headers from CodecPrivate when present.
    fn from_block(&mut self, stream: &mut AudioStream, track: &TrackEntry, parser: SubParser) {
        let Some(data) = self.offsets.get(&self.number).copied() else {
            self.session.warn(format!(
                "Unable to parse audio data because track_data_offsets[{}] not set",
                self.number
            ));
            return;
        };
        let input = match (parser, track.codec_private.as_deref()) {
            (SubParser::Flac, Some(private)) => SubInput::Inline(private),
            _ => SubInput::Range(ByteRange::new(data.offset, data.offset + data.length)),
        };
        self.run(stream, parser, input, data.offset);
    }

    /// Vorbis identification header, found by its keyword inside the
    /// Xiph-laced CodecPrivate.
    fn vorbis(&mut self, stream: &mut AudioStream, track: &TrackEntry) {
        let Some(private) = track.codec_private.as_deref() else {
            self.session
                .warn("Unable to parse audio data because CodecPrivate data not set");
            return;
        };
        let keyword = private
            .windows(6)
            .skip(1)
            .position(|w| w == b"vorbis")
            .map(|p| p + 1);
        let Some(pos) = keyword else {
            self.session.warn(
                "Unable to parse audio data because CodecPrivate data does not contain \"vorbis\" keyword",
            );
            return;
        };
        self.run(stream, SubParser::Vorbis, SubInput::Inline(&private[pos - 1..]), 0);
    }

    fn wave_format(&mut self, stream: &mut AudioStream, track: &TrackEntry) {
        let Some(private) = track.codec_private.as_deref() else {
            self.session
                .warn("Unable to parse audio data because CodecPrivate data not set");
            return;
        };
        match WaveFormatEx::parse(private) {
            Ok(format) => {
                stream.merge_from(&format.stream());
                self.parsed.insert(self.number, StreamHeader::WaveFormat(format));
            }
            Err(e) => self
                .session
                .warn(format!("Unable to parse WAVEFORMATEX from CodecPrivate: {e}")),
        }
    }

    fn run(&mut self, stream: &mut AudioStream, parser: SubParser, input: SubInput, offset: u64) {
        let result = subparse::dispatch(
            self.session.source.as_ref(),
            self.session.options,
            parser,
            input,
        );
        // Already logged by the nested session.
        self.session.report.absorb(Diagnostics {
            error: Vec::new(),
            warning: result.messages,
        });
        if result.failed {
            self.session.warn(format!(
                "Unable to parse audio data because {}::Analyze() failed at offset {offset}",
                parser.label()
            ));
            return;
        }
        if let Some(audio) = &result.audio {
            stream.merge_from(audio);
        }
        if let Some(parsed) = result.parsed {
            self.parsed.insert(self.number, parsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_names() {
        assert_eq!(codec_common_name("A_AAC/MPEG4/LC/SBR"), "aac");
        assert_eq!(codec_common_name("A_PCM/INT/BIG"), "pcm");
        assert_eq!(codec_common_name("V_MPEG4/ISO/AVC"), "h264");
        assert_eq!(codec_common_name("V_REAL/RV30"), "real");
        assert_eq!(codec_common_name("A_OPUS"), "A_OPUS");
        assert_eq!(display_unit(2), "inches");
        assert_eq!(display_unit(9), "unknown");
    }

    #[test]
    fn representative_prefers_first_default() {
        let streams = vec![
            AudioStream {
                default: Some(false),
                sample_rate: Some(8000.0),
                ..Default::default()
            },
            AudioStream {
                default: Some(true),
                name: Some("Commentary".into()),
                sample_rate: Some(48000.0),
                ..Default::default()
            },
            AudioStream {
                default: Some(true),
                sample_rate: Some(44100.0),
                ..Default::default()
            },
        ];
        let strip = |s: &mut AudioStream| {
            s.default = None;
            s.name = None;
        };
        let (top, all) = representative(streams, |s| s.default == Some(true), strip).unwrap();
        assert_eq!(top.sample_rate, Some(48000.0));
        assert_eq!(top.default, None);
        assert_eq!(top.name, None);
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].name.as_deref(), Some("Commentary"));

        assert!(representative(Vec::<AudioStream>::new(), |_| true, strip).is_none());
    }
}
