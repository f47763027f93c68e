use std::fmt::Display;

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use mediaid::report::{AudioStream, Report, VideoStream};
use mediaid::utils::playtime::time_str;
use mediaid::{Analyzer, Options};

use super::command::InfoArgs;
use crate::input::Input;

pub fn cmd_info(args: &InfoArgs, options: Options, multi: Option<&MultiProgress>) -> Result<()> {
    let analyzer = Analyzer::new(options);

    for path in &args.inputs {
        let input = Input::new(path);
        let name = input.display_name();
        log::info!("Analyzing {name}");

        let pb = match multi {
            Some(multi) => {
                let pb = multi.add(ProgressBar::new_spinner());
                pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
                pb.enable_steady_tick(std::time::Duration::from_millis(100));
                pb.set_message(format!("Analyzing {name}..."));
                Some(pb)
            }
            None => None,
        };

        let report = input.analyze(&analyzer)?;

        match pb {
            Some(pb) => {
                pb.finish_and_clear();
                pb.suspend(|| print!("{}", render(&name, &report)));
            }
            None => print!("{}", render(&name, &report)),
        }
    }

    Ok(())
}

/// Aligned label/value lines with a fixed label column.
#[derive(Default)]
struct Summary(String);

impl Summary {
    fn heading(&mut self, title: &str) {
        self.0.push_str(title);
        self.0.push('\n');
    }

    fn line(&mut self, indent: usize, label: &str, value: impl Display) {
        let width = 28 - indent;
        self.0
            .push_str(&format!("{:indent$}{label:width$}{value}\n", ""));
    }

    fn opt<T: Display>(&mut self, indent: usize, label: &str, value: Option<T>) {
        if let Some(value) = value {
            self.line(indent, label, value);
        }
    }

    fn blank(&mut self) {
        self.0.push('\n');
    }
}

fn render(name: &str, report: &Report) -> String {
    let mut out = Summary::default();
    out.blank();
    out.heading(name);
    out.heading(&"=".repeat(name.chars().count()));
    out.blank();

    out.heading("General");
    out.opt(2, "Format", report.fileformat.as_deref());
    out.opt(2, "MIME type", report.mime_type.as_deref());
    if let Some(size) = report.filesize {
        let size_mb = size as f64 / 1_000_000.0;
        out.line(2, "Size", format!("{size_mb:.2} MB ({size} bytes)"));
    }
    if let Some(seconds) = report.playtime_seconds {
        out.line(2, "Duration", time_str(seconds));
    }
    out.opt(2, "Overall bitrate", report.bitrate.map(kbps));
    out.blank();

    if let Some(video) = &report.video {
        out.heading("Video");
        video_lines(&mut out, 2, video);
        for (i, stream) in video.streams.iter().enumerate() {
            out.line(2, &format!("Stream {i}"), "");
            video_lines(&mut out, 4, stream);
        }
        out.blank();
    }

    if let Some(audio) = &report.audio {
        out.heading("Audio");
        audio_lines(&mut out, 2, audio);
        if audio.streams.len() > 1 {
            for (i, stream) in audio.streams.iter().enumerate() {
                out.line(2, &format!("Stream {i}"), "");
                audio_lines(&mut out, 4, stream);
            }
        }
        out.blank();
    }

    if !report.tags.is_empty() {
        out.heading("Tags");
        for (family, fields) in &report.tags {
            out.line(2, family, "");
            for (key, values) in fields {
                out.line(4, key, values.join("; "));
            }
        }
        out.blank();
    }

    if !report.warning.is_empty() || !report.error.is_empty() {
        out.heading("Diagnostics");
        for warning in &report.warning {
            out.line(2, "Warning", warning);
        }
        for error in &report.error {
            out.line(2, "Error", error);
        }
        out.blank();
    }

    out.0
}

fn audio_lines(out: &mut Summary, indent: usize, stream: &AudioStream) {
    out.opt(indent, "Codec", stream.codec.as_deref());
    out.opt(indent, "Data format", stream.dataformat.as_deref());
    out.opt(
        indent,
        "Sampling rate",
        stream.sample_rate.map(|r| format!("{r} Hz")),
    );
    out.opt(indent, "Channels", stream.channels);
    out.opt(indent, "Channel mode", stream.channelmode.as_deref());
    out.opt(indent, "Bits per sample", stream.bits_per_sample);
    out.opt(indent, "Bitrate", stream.bitrate.map(kbps));
    out.opt(indent, "Bitrate mode", stream.bitrate_mode.as_deref());
    out.opt(indent, "Lossless", stream.lossless);
    out.opt(indent, "Language", stream.language.as_deref());
    out.opt(indent, "Name", stream.name.as_deref());
    out.opt(indent, "Default", stream.default);
}

fn video_lines(out: &mut Summary, indent: usize, stream: &VideoStream) {
    out.opt(indent, "Codec", stream.codec.as_deref());
    out.opt(indent, "Data format", stream.dataformat.as_deref());
    if let (Some(x), Some(y)) = (stream.resolution_x, stream.resolution_y) {
        out.line(indent, "Resolution", format!("{x}x{y}"));
    }
    if let (Some(x), Some(y)) = (stream.display_x, stream.display_y) {
        let unit = stream.display_unit.as_deref().unwrap_or("pixels");
        out.line(indent, "Display size", format!("{x}x{y} {unit}"));
    }
    out.opt(indent, "Frame rate", stream.frame_rate.map(|r| format!("{r:.3} fps")));
    out.opt(indent, "Bitrate", stream.bitrate.map(kbps));
    out.opt(indent, "Name", stream.name.as_deref());
    out.opt(indent, "Default", stream.default);
}

fn kbps(bitrate: f64) -> String {
    format!("{:.1} kbps", bitrate / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaid::report::AudioSection;

    #[test]
    fn summary_lists_present_fields_only() {
        let report = Report {
            fileformat: Some("matroska".into()),
            filesize: Some(2_500_000),
            playtime_seconds: Some(61.5),
            bitrate: Some(325_203.0),
            audio: Some(AudioSection {
                stream: AudioStream {
                    dataformat: Some("ac3".into()),
                    sample_rate: Some(48000.0),
                    channels: Some(6),
                    ..Default::default()
                },
                streams: Vec::new(),
            }),
            warning: vec!["odd element".into()],
            ..Default::default()
        };

        let text = render("movie.mkv", &report);
        assert!(text.contains("movie.mkv\n=========\n"));
        assert!(text.contains("  Format                    matroska\n"));
        assert!(text.contains("  Size                      2.50 MB (2500000 bytes)\n"));
        assert!(text.contains("  Overall bitrate           325.2 kbps\n"));
        assert!(text.contains("  Sampling rate             48000 Hz\n"));
        assert!(text.contains("  Warning                   odd element\n"));
        assert!(!text.contains("MIME type"));
        assert!(!text.contains("Video"));
    }
}
