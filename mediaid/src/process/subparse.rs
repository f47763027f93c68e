use std::fmt::Display;

use crate::formats::StreamHeader;
use crate::formats::audio::{ac3, dts, flac, mpeg, vorbis};
use crate::process::{AttachmentMode, Options, Session};
use crate::report::{AudioStream, Report};
use crate::source::{ByteRange, ByteSource, MemorySource};

/// Leaf parsers a container can hand an embedded stream to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubParser {
    Ac3,
    Dts,
    Mpeg,
    Flac,
    Vorbis,
}

impl SubParser {
    /// Prefix for messages surfaced on the parent report.
    pub fn label(self) -> &'static str {
        match self {
            SubParser::Ac3 => "Ac3",
            SubParser::Dts => "Dts",
            SubParser::Mpeg => "Mp3",
            SubParser::Flac => "Flac",
            SubParser::Vorbis => "Ogg",
        }
    }

    fn analyze(self, session: &mut Session) -> anyhow::Result<()> {
        match self {
            SubParser::Ac3 => ac3::analyze(session),
            SubParser::Dts => dts::analyze(session),
            SubParser::Mpeg => mpeg::analyze(session),
            SubParser::Flac => flac::analyze(session),
            SubParser::Vorbis => vorbis::analyze(session),
        }
    }

    /// Moves this parser's own section out of a finished report.
    fn take_header(self, report: &mut Report) -> Option<StreamHeader> {
        match self {
            SubParser::Ac3 => report.ac3.take().map(StreamHeader::Ac3),
            SubParser::Dts => report.dts.take().map(StreamHeader::Dts),
            SubParser::Mpeg => report.mpeg.take().map(StreamHeader::Mpeg),
            SubParser::Flac => report.flac.take().map(StreamHeader::Flac),
            SubParser::Vorbis => report.ogg.take().map(StreamHeader::Vorbis),
        }
    }
}

impl Display for SubParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Where the embedded stream lives.
#[derive(Clone, Copy, Debug)]
pub enum SubInput<'a> {
    /// A byte range of the parent source.
    Range(ByteRange),
    /// Bytes already in memory, such as a codec's private data.
    Inline(&'a [u8]),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubResult {
    /// Stream fields found by the nested parser.
    pub audio: Option<AudioStream>,
    /// The nested parser's own section, when it produced one.
    pub parsed: Option<StreamHeader>,
    /// Nested errors then warnings, prefixed with the parser label.
    pub messages: Vec<String>,
    /// The nested parser returned an error.
    pub failed: bool,
}

/// Runs `parser` over an embedded stream in a session of its own.
///
/// The nested session reads from an independent source and never extracts
/// attachments. Nothing it records reaches the parent except through the
/// returned [`SubResult`].
pub fn dispatch(
    parent: &dyn ByteSource,
    options: &Options,
    parser: SubParser,
    input: SubInput,
) -> SubResult {
    let source: Box<dyn ByteSource> = match input {
        SubInput::Range(range) => match parent.sub_source(range) {
            Ok(source) => source,
            Err(e) => {
                return SubResult {
                    messages: vec![relabel(parser, &e.to_string())],
                    failed: true,
                    ..Default::default()
                };
            }
        },
        SubInput::Inline(bytes) => Box::new(MemorySource::new(bytes.to_vec())),
    };

    let nested = Options {
        attachments: AttachmentMode::None,
        ..options.clone()
    };
    log::debug!("running {parser} parser over {} bytes", source.len());
    let mut session = Session::new(source, &nested);
    let failed = match parser.analyze(&mut session) {
        Ok(()) => false,
        Err(e) => {
            session.error(e);
            true
        }
    };

    let mut report = session.report;
    let parsed = parser.take_header(&mut report);
    let audio = report.audio.take().map(|section| section.stream);
    let messages = report
        .error
        .iter()
        .chain(&report.warning)
        .map(|msg| relabel(parser, msg))
        .collect();

    SubResult {
        audio,
        parsed,
        messages,
        failed,
    }
}

fn relabel(parser: SubParser, msg: &str) -> String {
    format!("{}() says: [{msg}]", parser.label())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_isolated_from_the_rest_of_the_parent() {
        let mut data = vec![0xEE; 100];
        let frames = mpeg::tests::frames(2);
        data.extend_from_slice(&frames);
        data.extend_from_slice(&ac3::tests::FRAME_5_1);
        let parent = MemorySource::new(data);

        let range = ByteRange::new(100, 100 + frames.len() as u64);
        let result = dispatch(&parent, &Options::default(), SubParser::Mpeg, SubInput::Range(range));
        assert!(!result.failed);
        assert!(result.messages.is_empty(), "{:?}", result.messages);
        let audio = result.audio.unwrap();
        assert_eq!(audio.sample_rate, Some(44100.0));
        assert!(matches!(result.parsed, Some(StreamHeader::Mpeg(_))));
    }

    #[test]
    fn failures_are_relabeled() {
        let parent = MemorySource::new(vec![0u8; 64]);
        let result = dispatch(
            &parent,
            &Options::default(),
            SubParser::Ac3,
            SubInput::Range(ByteRange::new(0, 64)),
        );
        assert!(result.failed);
        assert!(result.parsed.is_none());
        assert_eq!(result.messages.len(), 1);
        assert!(result.messages[0].starts_with("Ac3() says: ["));
    }

    #[test]
    fn inline_vorbis_header() {
        let header = vorbis::tests::identification(2, 48000, 160_000);
        let parent = MemorySource::new(Vec::new());
        let result = dispatch(&parent, &Options::default(), SubParser::Vorbis, SubInput::Inline(&header));
        assert!(!result.failed);
        let audio = result.audio.unwrap();
        assert_eq!(audio.channels, Some(2));
        assert_eq!(audio.bitrate, Some(160_000.0));
    }

    #[test]
    fn out_of_range_input_fails_cleanly() {
        let parent = MemorySource::new(vec![0u8; 10]);
        let result = dispatch(
            &parent,
            &Options::default(),
            SubParser::Dts,
            SubInput::Range(ByteRange::new(5, 50)),
        );
        assert!(result.failed);
        assert!(result.audio.is_none());
        assert!(result.messages[0].starts_with("Dts() says: ["));
    }
}
