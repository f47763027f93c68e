//! The analysis result.
//!
//! A [`Report`] is built incrementally by one format parser, then finished
//! by the aggregation pass. Every field is optional so a partial parse still
//! serializes to a meaningful document.

mod stream;

pub use stream::{AudioSection, AudioStream, VideoSection, VideoStream};

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Serialize, Serializer};

use crate::formats::archive::{EfaxHeader, ExeInfo, HpkInfo, SevenZipHeader};
use crate::formats::audio::ac3::Ac3Info;
use crate::formats::audio::dts::DtsInfo;
use crate::formats::audio::flac::FlacInfo;
use crate::formats::audio::mpeg::MpegInfo;
use crate::formats::audio::vorbis::VorbisInfo;
use crate::formats::bink::BinkInfo;
use crate::formats::cue::CueSheet;
use crate::formats::dsf::DsfInfo;
use crate::formats::ivf::IvfInfo;
use crate::formats::matroska::Matroska;

pub type Comments = BTreeMap<String, Vec<CommentValue>>;

/// Error and warning sink. Each entry is logged as it is recorded.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub error: Vec<String>,
    pub warning: Vec<String>,
}

impl Diagnostics {
    pub fn error(&mut self, msg: impl fmt::Display) {
        let msg = msg.to_string();
        log::error!("{msg}");
        self.error.push(msg);
    }

    pub fn warn(&mut self, msg: impl fmt::Display) {
        let msg = msg.to_string();
        log::warn!("{msg}");
        self.warning.push(msg);
    }

    pub fn is_empty(&self) -> bool {
        self.error.is_empty() && self.warning.is_empty()
    }
}

/// Embedded file payload, either held in memory or written to disk.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentData {
    Inline(#[serde(serialize_with = "serialize_len")] Vec<u8>),
    Saved(PathBuf),
}

impl AttachmentData {
    pub fn is_empty(&self) -> bool {
        match self {
            AttachmentData::Inline(data) => data.is_empty(),
            AttachmentData::Saved(path) => path.as_os_str().is_empty(),
        }
    }

    /// The attachment bytes, read back from disk when saved.
    pub fn contents(&self) -> std::io::Result<Vec<u8>> {
        match self {
            AttachmentData::Inline(data) => Ok(data.clone()),
            AttachmentData::Saved(path) => std::fs::read(path),
        }
    }
}

/// Binary payloads are reported by size only.
pub(crate) fn serialize_len<S: Serializer>(data: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format!("<{} bytes>", data.len()))
}

pub(crate) fn serialize_opt_len<S: Serializer>(
    data: &Option<Vec<u8>>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match data {
        Some(data) => serialize_len(data, s),
        None => s.serialize_none(),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Picture {
    pub data: AttachmentData,
    pub image_mime: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picturetype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommentValue {
    Text(String),
    Picture(Picture),
}

impl CommentValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CommentValue::Text(s) => Some(s),
            CommentValue::Picture(_) => None,
        }
    }
}

impl From<String> for CommentValue {
    fn from(s: String) -> Self {
        CommentValue::Text(s)
    }
}

/// Presence of a leading ID3v2 tag. The tag itself is skipped, not parsed.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Id3v2Header {
    pub header: bool,
    pub majorversion: u8,
    pub minorversion: u8,
    pub headerlength: u64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fileformat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesize: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filepath: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filenamepath: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avdataoffset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avdataend: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playtime_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playtime_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoSection>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub comments: Comments,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id3v2: Option<Id3v2Header>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matroska: Option<Matroska>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flac: Option<FlacInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mpeg: Option<MpegInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ac3: Option<Ac3Info>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dts: Option<DtsInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ogg: Option<VorbisInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ivf: Option<IvfInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dsf: Option<DsfInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bink: Option<BinkInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cue: Option<CueSheet>,
    #[serde(rename = "7zip", skip_serializing_if = "Option::is_none")]
    pub sevenzip: Option<SevenZipHeader>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exe: Option<ExeInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub efax: Option<EfaxHeader>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hpk: Option<HpkInfo>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub error: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warning: Vec<String>,
}

impl Report {
    pub fn error(&mut self, msg: impl fmt::Display) {
        let msg = msg.to_string();
        log::error!("{msg}");
        self.error.push(msg);
    }

    pub fn warn(&mut self, msg: impl fmt::Display) {
        let msg = msg.to_string();
        log::warn!("{msg}");
        self.warning.push(msg);
    }

    /// Appends diagnostics collected elsewhere. They were logged when first
    /// recorded, so they are not logged again.
    pub fn absorb(&mut self, diagnostics: Diagnostics) {
        self.error.extend(diagnostics.error);
        self.warning.extend(diagnostics.warning);
    }

    pub fn audio_mut(&mut self) -> &mut AudioSection {
        self.audio.get_or_insert_with(AudioSection::default)
    }

    pub fn video_mut(&mut self) -> &mut VideoSection {
        self.video.get_or_insert_with(VideoSection::default)
    }

    /// Comments gathered by the format parsers, keyed by the tag family they
    /// belong to.
    pub fn format_comments_mut(&mut self) -> Vec<(&'static str, &mut Comments)> {
        let mut out = Vec::new();
        if let Some(m) = self.matroska.as_mut() {
            out.push(("matroska", &mut m.comments));
        }
        if let Some(f) = self.flac.as_mut() {
            out.push(("vorbiscomment", &mut f.comments));
        }
        if let Some(c) = self.cue.as_mut() {
            out.push(("cue", &mut c.comments));
        }
        out
    }
}
