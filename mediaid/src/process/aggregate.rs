use std::collections::HashSet;

use crate::report::{AudioStream, Report, VideoStream};
use crate::utils::playtime::playtime_string;

/// Bit depth assumed for video streams that do not declare one.
const DEFAULT_VIDEO_DEPTH: f64 = 24.0;

/// Derives the fields one parser alone could not know.
pub fn aggregate(report: &mut Report) {
    channel_mode(report);
    combined_bitrate(report);
    video_bitrate(report);
    playtime_and_bitrate(report);
    if let Some(seconds) = report.playtime_seconds {
        report.playtime_string = Some(playtime_string(seconds));
    }
    audio_compression_ratio(report);
    video_compression_ratio(report);
    audio_streams(report);
}

fn channel_mode(report: &mut Report) {
    let Some(audio) = report.audio.as_mut() else {
        return;
    };
    if audio.channelmode.is_none() {
        audio.channelmode = match audio.channels {
            Some(1) => Some("mono".into()),
            Some(2) => Some("stereo".into()),
            _ => None,
        };
    }
}

fn combined_bitrate(report: &mut Report) {
    if report.bitrate.is_some() {
        return;
    }
    let audio = report.audio.as_ref().and_then(|a| a.bitrate);
    let video = report.video.as_ref().and_then(|v| v.bitrate);
    report.bitrate = match (audio, video) {
        (None, None) => None,
        (a, v) => Some(a.unwrap_or(0.0) + v.unwrap_or(0.0)),
    };
}

/// Whatever the audio does not use of the total belongs to the video.
fn video_bitrate(report: &mut Report) {
    let (Some(total), Some(audio)) = (
        report.bitrate,
        report.audio.as_ref().and_then(|a| a.bitrate),
    ) else {
        return;
    };
    if let Some(video) = report.video.as_mut() {
        if video.bitrate.is_none() && total > audio {
            video.bitrate = Some(total - audio);
        }
    }
}

fn playtime_and_bitrate(report: &mut Report) {
    let (Some(start), Some(end)) = (report.avdataoffset, report.avdataend) else {
        return;
    };
    let bits = end.saturating_sub(start) as f64 * 8.0;
    if bits <= 0.0 {
        return;
    }
    match (report.playtime_seconds, report.bitrate) {
        (None, Some(bitrate)) if bitrate > 0.0 => {
            report.playtime_seconds = Some(bits / bitrate);
        }
        (Some(seconds), None) if seconds > 0.0 => {
            report.bitrate = Some(bits / seconds);
        }
        _ => {}
    }
}

fn audio_compression_ratio(report: &mut Report) {
    let Some(audio) = report.audio.as_mut() else {
        return;
    };
    audio.stream.compression_ratio = audio_ratio(&audio.stream);
    for stream in &mut audio.streams {
        stream.compression_ratio = audio_ratio(stream);
    }
}

fn audio_ratio(stream: &AudioStream) -> Option<f64> {
    let bitrate = stream.bitrate.filter(|&b| b > 0.0)?;
    let depth = stream.bits_per_sample.unwrap_or(16) as f64;
    let raw = stream.channels? as f64 * stream.sample_rate? * depth;
    (raw > 0.0).then(|| bitrate / raw)
}

fn video_compression_ratio(report: &mut Report) {
    let playtime = report.playtime_seconds;
    let filesize = report.filesize;
    let Some(video) = report.video.as_mut() else {
        return;
    };
    let ratio = |stream: &VideoStream| -> Option<f64> {
        let (x, y) = (stream.resolution_x? as f64, stream.resolution_y? as f64);
        let depth = stream.bits_per_sample.map_or(DEFAULT_VIDEO_DEPTH, |d| d as f64);
        let (bitrate, frame_rate) = match (stream.frame_rate, playtime) {
            (Some(rate), _) => (stream.bitrate?, rate),
            // A still image.
            (None, None) => (filesize? as f64 * 8.0, 1.0),
            (None, Some(_)) => return None,
        };
        let raw = x * y * depth * frame_rate;
        (raw > 0.0 && bitrate > 0.0).then(|| bitrate / raw)
    };
    video.stream.compression_ratio = ratio(&video.stream);
    for stream in &mut video.streams {
        stream.compression_ratio = ratio(stream);
    }
}

/// An audio section that lists no streams describes exactly one.
fn audio_streams(report: &mut Report) {
    if let Some(audio) = report.audio.as_mut() {
        if audio.streams.is_empty() {
            audio.streams.push(audio.stream.clone());
        }
    }
}

/// Removes empty placeholders and repeated diagnostics.
pub fn clean_up(report: &mut Report) {
    if let Some(audio) = report.audio.as_mut() {
        clean_audio(&mut audio.stream);
        audio.streams.iter_mut().for_each(clean_audio);
        if audio.stream == AudioStream::default() && audio.streams.is_empty() {
            report.audio = None;
        }
    }
    if let Some(video) = report.video.as_mut() {
        clean_video(&mut video.stream);
        video.streams.iter_mut().for_each(clean_video);
        if video.stream == VideoStream::default() && video.streams.is_empty() {
            report.video = None;
        }
    }
    if report.bitrate == Some(0.0) {
        report.bitrate = None;
    }
    report.tags.retain(|_, fields| !fields.is_empty());
    report.comments.retain(|_, values| !values.is_empty());

    if report.fileformat.is_none() {
        report.avdataoffset = None;
        report.avdataend = None;
    }

    dedup(&mut report.error);
    dedup(&mut report.warning);
}

fn clean_audio(stream: &mut AudioStream) {
    if stream.dataformat.as_deref() == Some("") {
        stream.dataformat = None;
    }
    if stream.bits_per_sample == Some(0) {
        stream.bits_per_sample = None;
    }
    if stream.encoder_options.as_deref() == Some("") {
        stream.encoder_options = None;
    }
    if stream.bitrate == Some(0.0) {
        stream.bitrate = None;
    }
}

fn clean_video(stream: &mut VideoStream) {
    if stream.dataformat.as_deref() == Some("") {
        stream.dataformat = None;
    }
    if stream.bits_per_sample == Some(0) {
        stream.bits_per_sample = None;
    }
    if stream.encoder_options.as_deref() == Some("") {
        stream.encoder_options = None;
    }
    if stream.bitrate == Some(0.0) {
        stream.bitrate = None;
    }
}

/// Keeps the first occurrence of each message.
fn dedup(messages: &mut Vec<String>) {
    let mut seen = HashSet::new();
    messages.retain(|m| seen.insert(m.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{AudioSection, VideoSection};

    fn report_with(audio: AudioStream, video: Option<VideoStream>) -> Report {
        Report {
            filesize: Some(1_000_000),
            avdataoffset: Some(0),
            avdataend: Some(1_000_000),
            fileformat: Some("test".into()),
            audio: Some(AudioSection {
                stream: audio,
                streams: Vec::new(),
            }),
            video: video.map(|stream| VideoSection {
                stream,
                streams: Vec::new(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn derives_bitrate_playtime_and_ratios() {
        let mut report = report_with(
            AudioStream {
                sample_rate: Some(44100.0),
                channels: Some(2),
                bitrate: Some(128_000.0),
                ..Default::default()
            },
            None,
        );
        aggregate(&mut report);
        assert_eq!(report.bitrate, Some(128_000.0));
        assert_eq!(report.playtime_seconds, Some(62.5));
        assert_eq!(report.playtime_string.as_deref(), Some("1:03"));

        let audio = report.audio.as_ref().unwrap();
        assert_eq!(audio.channelmode.as_deref(), Some("stereo"));
        assert_eq!(audio.compression_ratio, Some(128_000.0 / (2.0 * 44100.0 * 16.0)));
        assert_eq!(audio.streams.len(), 1);
        assert_eq!(audio.streams[0].compression_ratio, audio.compression_ratio);
    }

    #[test]
    fn video_takes_the_remainder() {
        let mut report = report_with(
            AudioStream {
                bitrate: Some(192_000.0),
                ..Default::default()
            },
            Some(VideoStream {
                resolution_x: Some(640),
                resolution_y: Some(480),
                frame_rate: Some(25.0),
                ..Default::default()
            }),
        );
        report.bitrate = Some(1_192_000.0);
        aggregate(&mut report);
        let video = report.video.as_ref().unwrap();
        assert_eq!(video.bitrate, Some(1_000_000.0));
        assert_eq!(
            video.compression_ratio,
            Some(1_000_000.0 / (640.0 * 480.0 * 24.0 * 25.0))
        );
    }

    #[test]
    fn playtime_gives_bitrate() {
        let mut report = report_with(AudioStream::default(), None);
        report.playtime_seconds = Some(8.0);
        aggregate(&mut report);
        assert_eq!(report.bitrate, Some(1_000_000.0));
    }

    #[test]
    fn clean_up_drops_placeholders() {
        let mut report = report_with(
            AudioStream {
                dataformat: Some(String::new()),
                bitrate: Some(0.0),
                ..Default::default()
            },
            Some(VideoStream {
                resolution_x: Some(1),
                ..Default::default()
            }),
        );
        report.fileformat = None;
        report.bitrate = Some(0.0);
        report.error = vec!["a".into(), "b".into(), "a".into()];
        report.warning = vec!["w".into(), "w".into()];
        clean_up(&mut report);

        assert!(report.audio.is_none());
        assert!(report.video.is_some());
        assert!(report.bitrate.is_none());
        assert!(report.avdataoffset.is_none());
        assert_eq!(report.error, ["a", "b"]);
        assert_eq!(report.warning, ["w"]);
    }
}
