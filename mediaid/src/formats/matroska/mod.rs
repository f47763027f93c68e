//! Matroska and WebM.
//!
//! The file is walked once with [`ParseContext`]. The builder fills a
//! [`Matroska`] tree, then the track entries are mapped to audio and video
//! streams, running nested parsers over the first block of each audio track
//! where the codec allows it.

use std::collections::BTreeMap;

use anyhow::Result;
use serde::Serialize;

use crate::ebml::ParseContext;
use crate::formats::StreamHeader;
use crate::process::{AttachmentMode, Session};
use crate::report::{CommentValue, Comments, Picture};

pub mod block;
mod builder;
pub mod elements;
pub mod tracks;

use builder::Builder;
use elements::{
    AttachedFile, CuePoint, DataOffset, EbmlHeader, EditionEntry, ElementSpan, InfoEntry,
    SeekEntry, Tag, Tracks,
};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Matroska {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<EbmlHeader>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctype: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub segment: Vec<ElementSpan>,
    /// Direct children of every Segment, clusters excluded when hidden.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<ElementSpan>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub seek: Vec<SeekEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub info: Vec<InfoEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracks: Option<Tracks>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cues: Vec<CuePoint>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachedFile>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chapters: Vec<EditionEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cluster: Vec<elements::Cluster>,
    /// Keyed by track number.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub track_data_offsets: BTreeMap<u64, DataOffset>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub track_codec_parsed: BTreeMap<u64, StreamHeader>,
    #[serde(skip_serializing_if = "Comments::is_empty")]
    pub comments: Comments,
}

impl Matroska {
    /// Number of track entries seen so far.
    pub fn track_count(&self) -> usize {
        self.tracks.as_ref().map_or(0, |t| t.tracks.len())
    }

    /// Enough is known to describe every track: the Info element, the
    /// track list and a first block for each track have all been seen.
    pub fn is_complete(&self) -> bool {
        !self.info.is_empty()
            && self.track_count() > 0
            && self.track_data_offsets.len() == self.track_count()
    }

    /// Duration in seconds, from the first Info element that declares one.
    pub fn playtime(&self) -> Option<f64> {
        self.info.iter().find_map(|info| {
            let duration = info.duration?;
            let scale = info.timecode_scale.unwrap_or(1_000_000) as f64;
            Some(duration * scale / 1e9)
        })
    }

    /// Copies every named, non-empty SimpleTag string into the comments.
    fn collect_tag_comments(&mut self) {
        let mut found = Vec::new();
        for tag in &self.tags {
            for simple in &tag.simple_tag {
                simple.walk(&mut |t| {
                    if let (Some(name), Some(value)) = (&t.tag_name, &t.tag_string) {
                        if !name.is_empty() && !value.is_empty() {
                            found.push((name.to_lowercase(), value.clone()));
                        }
                    }
                });
            }
        }
        for (name, value) in found {
            self.comments
                .entry(name)
                .or_default()
                .push(CommentValue::Text(value));
        }
    }

    /// Image attachments whose content was read become pictures.
    fn collect_pictures(&mut self) {
        let pictures: Vec<_> = self
            .attachments
            .iter()
            .filter_map(|file| {
                let mime = file.file_mime_type.as_deref()?;
                let data = file.file_data.as_ref()?;
                if !mime.starts_with("image/") || data.is_empty() {
                    return None;
                }
                Some(CommentValue::Picture(Picture {
                    data: data.clone(),
                    image_mime: mime.to_string(),
                    filename: file.file_name.clone(),
                    picturetype: None,
                    description: file.file_description.clone(),
                }))
            })
            .collect();
        if !pictures.is_empty() {
            self.comments
                .entry("picture".into())
                .or_default()
                .extend(pictures);
        }
    }
}

pub fn analyze(session: &mut Session) -> Result<()> {
    let options = session.options;
    let start = session.avdataoffset();
    let end = session.avdataend();

    let mut mkv = Matroska::default();
    let (parsed, diagnostics) = {
        let mut ctx = ParseContext::new(&mut *session.source, start)
            .with_read_buffer_size(options.read_buffer_size);
        ctx.set_fail_level(options.fail_level());
        let parsed = Builder::new(&mut ctx, options, &mut mkv).parse(end);
        (parsed, std::mem::take(&mut ctx.diagnostics))
    };
    session.report.absorb(diagnostics);
    if let Err(e) = parsed {
        session.error(format!("EBML parser: {e}"));
    }

    if let Some(doctype) = &mkv.doctype {
        session.report.fileformat = Some(doctype.clone());
    }
    if let Some(playtime) = mkv.playtime() {
        session.report.playtime_seconds = Some(playtime);
    }
    mkv.collect_tag_comments();

    tracks::process_tracks(session, &mut mkv);

    if options.attachments != AttachmentMode::None {
        mkv.collect_pictures();
    }

    let webm = mkv.doctype.as_deref() == Some("webm");
    let video_streams = session.report.video.as_ref().map_or(0, |v| v.streams.len());
    let audio_streams = session.report.audio.as_ref().map_or(0, |a| a.streams.len());
    session.report.mime_type = if video_streams > 0 {
        Some(if webm { "video/webm" } else { "video/x-matroska" }.into())
    } else if audio_streams > 0 {
        Some(if webm { "audio/webm" } else { "audio/x-matroska" }.into())
    } else {
        None
    };

    let has_segment = !mkv.segment.is_empty();
    session.report.matroska = Some(mkv);
    if !has_segment {
        session.error("EBML parser: no Segment element found");
    }
    Ok(())
}
