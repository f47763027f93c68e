use std::path::Path;
use std::sync::{Arc, LazyLock};

use anyhow::Result;
use regex::Regex;

use crate::process::sniff::{SNIFF_LENGTH, sniff, sniff_extension};
use crate::process::{Options, Session, aggregate, tags};
use crate::report::{Id3v2Header, Report};
use crate::source::{ByteSource, FileSource, MemorySource};
use crate::utils::byteorder::synchsafe;
use crate::utils::errors::FormatError;

static REMOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(ht|f)tp(s)?://").expect("valid regex"));

const ID3V2_HEADER_LENGTH: u64 = 10;

/// Runs the whole pipeline for one input and always returns a report.
///
/// Failures are recorded in the report's `error` list instead of being
/// returned.
#[derive(Clone, Debug, Default)]
pub struct Analyzer {
    options: Options,
}

impl Analyzer {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn analyze_path(&self, path: impl AsRef<Path>) -> Report {
        let path = path.as_ref();
        let display = path.to_string_lossy();
        if REMOTE.is_match(&display) {
            return failed(FormatError::RemoteFile);
        }

        let source = match FileSource::open(path) {
            Ok(source) => source,
            Err(e) => return failed(format!("Could not open \"{display}\" ({e})")),
        };
        log::debug!("analyzing {display}");
        self.run(Box::new(source), Some(path))
    }

    pub fn analyze_bytes(&self, data: impl Into<Arc<[u8]>>) -> Report {
        self.run(Box::new(MemorySource::new(data)), None)
    }

    /// Analyzes an already opened source. A `path`, when given, names the
    /// data in the report and enables the file-extension fallback.
    pub fn analyze_source(&self, source: Box<dyn ByteSource>, path: Option<&Path>) -> Report {
        self.run(source, path)
    }

    fn run(&self, source: Box<dyn ByteSource>, path: Option<&Path>) -> Report {
        let mut session = Session::new(source, &self.options);
        if let Some(path) = path {
            let report = &mut session.report;
            report.filenamepath = Some(path.to_string_lossy().into_owned());
            report.filename = path.file_name().map(|n| n.to_string_lossy().into_owned());
            report.filepath = path.parent().map(|p| p.to_string_lossy().into_owned());
        }

        if let Err(e) = identify_and_parse(&mut session, path) {
            session.error(e);
        }

        let mut report = session.report;
        if self.options.tags_process {
            tags::process_tags(&mut report);
        }
        if self.options.extra_info {
            aggregate::aggregate(&mut report);
        }
        aggregate::clean_up(&mut report);
        report
    }
}

fn failed(msg: impl std::fmt::Display) -> Report {
    let mut report = Report::default();
    report.error(msg);
    report
}

fn identify_and_parse(session: &mut Session, path: Option<&Path>) -> Result<()> {
    skip_id3v2(session)?;

    let head = session.read_at(session.avdataoffset(), SNIFF_LENGTH)?;
    let format = sniff(&head)
        .or_else(|| path.and_then(|p| sniff_extension(p, &head)))
        .ok_or(FormatError::UnknownFormat)?;
    log::debug!("identified as {format}");

    session.report.fileformat = Some(format.name().into());
    session.report.mime_type = format.mime_type().map(Into::into);
    format.analyze(session)
}

/// Moves the data offset past a leading ID3v2 tag.
fn skip_id3v2(session: &mut Session) -> Result<()> {
    let header = session.read_at(0, ID3V2_HEADER_LENGTH as usize)?;
    if header.len() < ID3V2_HEADER_LENGTH as usize || !header.starts_with(b"ID3") {
        return Ok(());
    }

    let mut length = synchsafe(&header[6..10]) + ID3V2_HEADER_LENGTH;
    // Footer present.
    if header[5] & 0x10 != 0 {
        length += ID3V2_HEADER_LENGTH;
    }
    let filesize = session.source.len();
    if length > filesize {
        session.warn(format!(
            "ID3v2 tag declares {length} bytes but file is only {filesize} bytes"
        ));
    }
    session.report.avdataoffset = Some(length.min(filesize));
    session.report.id3v2 = Some(Id3v2Header {
        header: true,
        majorversion: header[3],
        minorversion: header[4],
        headerlength: length,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::audio::mpeg;
    use crate::formats::cue;
    use crate::ebml::ids;
    use crate::ebml::writer::{element, master};
    use crate::formats::matroska::tests::{ebml_header, info, pcm_file};

    #[test]
    fn single_track_container() {
        let report = Analyzer::default().analyze_bytes(pcm_file());
        assert!(report.error.is_empty(), "{:?}", report.error);
        assert_eq!(report.fileformat.as_deref(), Some("matroska"));
        let audio = report.audio.as_ref().unwrap();
        assert_eq!(audio.sample_rate, Some(44100.0));
        assert_eq!(audio.channels, Some(2));
        assert_eq!(audio.channelmode.as_deref(), Some("stereo"));
        assert!((report.playtime_seconds.unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(report.playtime_string.as_deref(), Some("0:01"));
        assert_eq!(report.tags["matroska"]["title"], ["Test Title"]);
    }

    #[test]
    fn truncated_container_reports_an_error() {
        let mut file = pcm_file();
        file.truncate(file.len() - 10);
        let report = Analyzer::default().analyze_bytes(file);
        assert!(!report.error.is_empty());
        if let Some(audio) = &report.audio {
            assert_eq!(audio.sample_rate, Some(44100.0));
        }
    }

    #[test]
    fn unknown_format() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("garbage.xyz");
        std::fs::write(&path, b"\x00\x01\x02\x03 not a media file")?;

        let report = Analyzer::default().analyze_path(&path);
        assert_eq!(report.error, ["unable to determine file format"]);
        assert!(report.fileformat.is_none());
        assert!(report.avdataoffset.is_none());
        assert_eq!(report.filename.as_deref(), Some("garbage.xyz"));
        Ok(())
    }

    #[test]
    fn remote_and_missing_paths() {
        let analyzer = Analyzer::default();
        let report = analyzer.analyze_path("https://example.com/a.mkv");
        assert_eq!(
            report.error,
            ["Remote files are not supported - please copy the file locally first"]
        );

        let report = analyzer.analyze_path("/nonexistent/dir/file.mkv");
        assert_eq!(report.error.len(), 1);
        assert!(report.error[0].starts_with("Could not open \"/nonexistent/dir/file.mkv\" ("));
    }

    #[test]
    fn id3v2_tag_is_skipped() {
        let mut file = b"ID3\x04\x00\x00\x00\x00\x00\x14".to_vec();
        file.extend_from_slice(&[0; 20]);
        file.extend(mpeg::tests::frames(4));
        let report = Analyzer::default().analyze_bytes(file);
        assert!(report.error.is_empty(), "{:?}", report.error);
        assert_eq!(report.fileformat.as_deref(), Some("mp3"));
        assert_eq!(report.avdataoffset, Some(30));
        assert_eq!(report.id3v2.as_ref().map(|h| h.headerlength), Some(30));
        assert_eq!(report.bitrate, Some(128_000.0));
    }

    #[test]
    fn cue_sheet_by_extension() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("live.cue");
        std::fs::write(&path, cue::tests::SHEET)?;

        let report = Analyzer::default().analyze_path(&path);
        assert!(report.error.is_empty(), "{:?}", report.error);
        assert_eq!(report.fileformat.as_deref(), Some("cue"));
        assert_eq!(report.tags["cue"]["performer"], ["The Band"]);
        assert_eq!(report.cue.as_ref().map(|c| c.tracks.len()), Some(2));
        Ok(())
    }

    #[test]
    fn strict_mode_turns_warnings_into_errors() {
        let segment = master(ids::SEGMENT, &[element(0x1234, &[1, 2]), info(1000.0)]);
        let file = [ebml_header("matroska"), segment].concat();

        let lenient = Analyzer::default().analyze_bytes(file.clone());
        assert!(lenient.error.is_empty(), "{:?}", lenient.error);
        assert_eq!(lenient.warning.len(), 1);
        assert_eq!(lenient.playtime_seconds, Some(1.0));

        let strict = Analyzer::new(Options {
            strict: true,
            ..Default::default()
        });
        let report = strict.analyze_bytes(file);
        assert_eq!(report.error.len(), 1);
        assert!(report.error[0].starts_with("EBML parser: Unexpected element segment element"));
        assert!(report.playtime_seconds.is_none());
    }
}
