//! Typed records for the Matroska element groups the builder understands.

use serde::Serialize;

use crate::formats::matroska::block::Block;
use crate::report::{AttachmentData, serialize_opt_len};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EbmlHeader {
    pub offset: u64,
    pub length: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_version: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_id_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctype_version: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctype_read_version: Option<u64>,
}

/// Position of a top-level element, as listed in `segments`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ElementSpan {
    pub id: u32,
    pub id_name: String,
    pub offset: u64,
    pub length: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SeekEntry {
    pub offset: u64,
    pub length: u64,
    pub target_id: u32,
    pub target_name: String,
    pub target_offset: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChapterTranslate {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chapter_translate_edition_uid: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter_translate_codec: Option<u64>,
    #[serde(rename = "ChapterTranslateID", skip_serializing_if = "Option::is_none")]
    pub chapter_translate_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InfoEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timecode_scale: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(rename = "DateUTC", skip_serializing_if = "Option::is_none")]
    pub date_utc: Option<i64>,
    #[serde(rename = "DateUTC_unix", skip_serializing_if = "Option::is_none")]
    pub date_utc_unix: Option<i64>,
    #[serde(rename = "SegmentUID", skip_serializing_if = "Option::is_none")]
    pub segment_uid: Option<String>,
    #[serde(rename = "PrevUID", skip_serializing_if = "Option::is_none")]
    pub prev_uid: Option<String>,
    #[serde(rename = "NextUID", skip_serializing_if = "Option::is_none")]
    pub next_uid: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub segment_family: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muxing_app: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writing_app: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter_translate: Option<ChapterTranslate>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VideoSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_width: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_height: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_crop_bottom: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_crop_top: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_crop_left: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_crop_right: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_width: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_height: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_unit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio_type: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stereo_mode: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_stereo_mode: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag_interlaced: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gamma_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour_space: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AudioSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_depth: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling_frequency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_sampling_frequency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_positions: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContentCompression {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_comp_algo: Option<u64>,
    #[serde(
        serialize_with = "serialize_opt_len",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_comp_settings: Option<Vec<u8>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContentEncryption {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_enc_algo: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_sig_algo: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_sig_hash_algo: Option<u64>,
    #[serde(
        rename = "ContentEncKeyID",
        serialize_with = "serialize_opt_len",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_enc_key_id: Option<Vec<u8>>,
    #[serde(
        serialize_with = "serialize_opt_len",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_signature: Option<Vec<u8>>,
    #[serde(
        rename = "ContentSigKeyID",
        serialize_with = "serialize_opt_len",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_sig_key_id: Option<Vec<u8>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContentEncoding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_encoding_order: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_encoding_scope: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_encoding_type: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_compression: Option<ContentCompression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_encryption: Option<ContentEncryption>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrackEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_number: Option<u64>,
    #[serde(rename = "TrackUID", skip_serializing_if = "Option::is_none")]
    pub track_uid: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_type: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_cache: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cache: Option<u64>,
    #[serde(rename = "MaxBlockAdditionID", skip_serializing_if = "Option::is_none")]
    pub max_block_addition_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_timecode_scale: Option<f64>,
    #[serde(rename = "CodecID", skip_serializing_if = "Option::is_none")]
    pub codec_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec_name: Option<String>,
    #[serde(
        serialize_with = "serialize_opt_len",
        skip_serializing_if = "Option::is_none"
    )]
    pub codec_private: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag_default: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag_forced: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag_lacing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec_decode_all: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioSettings>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub content_encodings: Vec<ContentEncoding>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Tracks {
    pub offset: u64,
    pub length: u64,
    pub tracks: Vec<TrackEntry>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CueTrackPositions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cue_track: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cue_cluster_position: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cue_block_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cue_codec_state: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CuePoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cue_time: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cue_track_positions: Vec<CueTrackPositions>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Targets {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_type_value: Option<u64>,
    #[serde(rename = "targettypevalue_long", skip_serializing_if = "Option::is_none")]
    pub target_type_value_long: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
    #[serde(rename = "TagTrackUID", skip_serializing_if = "Vec::is_empty")]
    pub tag_track_uid: Vec<u64>,
    #[serde(rename = "TagEditionUID", skip_serializing_if = "Vec::is_empty")]
    pub tag_edition_uid: Vec<u64>,
    #[serde(rename = "TagChapterUID", skip_serializing_if = "Vec::is_empty")]
    pub tag_chapter_uid: Vec<u64>,
    #[serde(rename = "TagAttachmentUID", skip_serializing_if = "Vec::is_empty")]
    pub tag_attachment_uid: Vec<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SimpleTag {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_string: Option<String>,
    #[serde(
        serialize_with = "serialize_opt_len",
        skip_serializing_if = "Option::is_none"
    )]
    pub tag_binary: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_default: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub simple_tag: Vec<SimpleTag>,
}

impl SimpleTag {
    /// Visits this tag and every nested tag, depth first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a SimpleTag)) {
        f(self);
        for child in &self.simple_tag {
            child.walk(f);
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<Targets>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub simple_tag: Vec<SimpleTag>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttachedFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_mime_type: Option<String>,
    #[serde(rename = "FileUID", skip_serializing_if = "Option::is_none")]
    pub file_uid: Option<u64>,
    #[serde(rename = "data_offset", skip_serializing_if = "Option::is_none")]
    pub data_offset: Option<u64>,
    #[serde(rename = "data_length", skip_serializing_if = "Option::is_none")]
    pub data_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_data: Option<AttachmentData>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChapterTrack {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chapter_track_number: Vec<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChapterDisplay {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chap_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chap_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chap_country: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChapterAtom {
    #[serde(rename = "ChapterUID", skip_serializing_if = "Option::is_none")]
    pub chapter_uid: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter_time_start: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter_time_end: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter_flag_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter_flag_hidden: Option<bool>,
    #[serde(rename = "ChapterSegmentUID", skip_serializing_if = "Option::is_none")]
    pub chapter_segment_uid: Option<String>,
    #[serde(
        rename = "ChapterSegmentEditionUID",
        skip_serializing_if = "Option::is_none"
    )]
    pub chapter_segment_edition_uid: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chapter_track: Vec<ChapterTrack>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chapter_display: Vec<ChapterDisplay>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EditionEntry {
    #[serde(rename = "EditionUID", skip_serializing_if = "Option::is_none")]
    pub edition_uid: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edition_flag_hidden: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edition_flag_default: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edition_flag_ordered: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chapter_atom: Vec<ChapterAtom>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlockGroup {
    #[serde(rename = "offset")]
    pub offset: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<Block>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_priority: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_duration: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reference_block: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec_state: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Cluster {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timecode: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_size: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub silent_tracks: Vec<Vec<u64>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub block_group: Vec<BlockGroup>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub simple_block: Vec<Block>,
}

/// Location of the first block seen for a track.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DataOffset {
    pub offset: u64,
    pub length: u64,
}

/// Human-readable meaning of a tag's TargetTypeValue.
pub fn target_type_value(value: u64) -> String {
    match value {
        10 => "A: ~ V:shot".into(),
        20 => "A:subtrack/part/movement ~ V:scene".into(),
        30 => "A:track/song ~ V:chapter".into(),
        40 => "A:part/session ~ V:part/session".into(),
        50 => "A:album/opera/concert ~ V:movie/episode/concert".into(),
        60 => "A:edition/issue/volume/opus ~ V:season/sequel/volume".into(),
        70 => "A:collection ~ V:collection".into(),
        other => other.to_string(),
    }
}

/// Seconds since the Unix epoch for a Matroska date: nanoseconds relative
/// to 2001-01-01T00:00:00 UTC.
pub fn ebml_date_to_unix(nanos: i64) -> i64 {
    const MILLENNIUM_UNIX: f64 = 978_307_200.0;
    (nanos as f64 / 1e9 + MILLENNIUM_UNIX).round() as i64
}

/// Identifier payloads are binary, shown as hex.
pub fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_and_targets() {
        assert_eq!(ebml_date_to_unix(0), 978_307_200);
        assert_eq!(ebml_date_to_unix(1_500_000_000), 978_307_202);
        assert_eq!(ebml_date_to_unix(-86_400_000_000_000), 978_220_800);
        assert_eq!(target_type_value(50), "A:album/opera/concert ~ V:movie/episode/concert");
        assert_eq!(target_type_value(55), "55");
        assert_eq!(hex_string(&[0x0A, 0xFF]), "0aff");
    }

    #[test]
    fn simple_tag_walk_is_depth_first() {
        let tag = SimpleTag {
            tag_name: Some("a".into()),
            simple_tag: vec![
                SimpleTag {
                    tag_name: Some("b".into()),
                    simple_tag: vec![SimpleTag {
                        tag_name: Some("c".into()),
                        ..Default::default()
                    }],
                    ..Default::default()
                },
                SimpleTag {
                    tag_name: Some("d".into()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let mut names = Vec::new();
        tag.walk(&mut |t| names.push(t.tag_name.clone().unwrap_or_default()));
        assert_eq!(names, ["a", "b", "c", "d"]);
    }
}
