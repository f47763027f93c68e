use std::fmt::Display;
use std::path::PathBuf;

use log::Level;
use serde::Deserialize;

use crate::report::Report;
use crate::source::ByteSource;

/// Top-level entry points.
///
/// Provides the [`Analyzer`](analyze::Analyzer), which opens a file or buffer,
/// identifies the format and always hands back a [`Report`].
pub mod analyze;

/// Format identification from the leading bytes of a file.
pub mod sniff;

/// Nested parsing of elementary streams embedded in a container.
pub mod subparse;

/// Derived fields and clean-up run after the format parser returns.
pub mod aggregate;

/// Copying of per-format comments into the shared `tags` section.
pub mod tags;

pub use analyze::Analyzer;

/// Where embedded files (cover art, fonts) end up.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentMode {
    /// Attachments are listed but their content is not read.
    None,
    /// Content is returned in the report.
    #[default]
    Inline,
    /// Content is written into the directory, and the report carries the path.
    Directory(PathBuf),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Options {
    pub attachments: AttachmentMode,
    pub parse_whole_file: bool,
    pub hide_clusters: bool,
    pub read_buffer_size: usize,
    pub extra_info: bool,
    pub tags_process: bool,
    pub strict: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            attachments: AttachmentMode::Inline,
            parse_whole_file: false,
            hide_clusters: true,
            read_buffer_size: crate::ebml::walker::DEFAULT_READ_BUFFER_SIZE,
            extra_info: true,
            tags_process: true,
            strict: false,
        }
    }
}

impl Options {
    /// Diagnostics at or above this level abort the running parser.
    pub fn fail_level(&self) -> Level {
        if self.strict { Level::Warn } else { Level::Error }
    }
}

/// State owned by one parser run: its byte source, the report it fills and
/// the options it honors. Nested parsers get a session of their own.
pub struct Session<'o> {
    pub source: Box<dyn ByteSource>,
    pub report: Report,
    pub options: &'o Options,
}

impl<'o> Session<'o> {
    /// A session covering the whole of `source`.
    pub fn new(source: Box<dyn ByteSource>, options: &'o Options) -> Self {
        let len = source.len();
        let report = Report {
            filesize: Some(len),
            avdataoffset: Some(0),
            avdataend: Some(len),
            ..Default::default()
        };
        Self {
            source,
            report,
            options,
        }
    }

    pub fn fail_level(&self) -> Level {
        self.options.fail_level()
    }

    pub fn warn(&mut self, msg: impl Display) {
        self.report.warn(msg);
    }

    pub fn error(&mut self, msg: impl Display) {
        self.report.error(msg);
    }

    pub fn avdataoffset(&self) -> u64 {
        self.report.avdataoffset.unwrap_or(0)
    }

    pub fn avdataend(&self) -> u64 {
        self.report.avdataend.unwrap_or_else(|| self.source.len())
    }

    /// Reads up to `n` bytes at `offset`.
    pub fn read_at(&mut self, offset: u64, n: usize) -> anyhow::Result<Vec<u8>> {
        self.source.seek(crate::source::SeekPos::Start(offset))?;
        Ok(self.source.read(n)?)
    }
}
