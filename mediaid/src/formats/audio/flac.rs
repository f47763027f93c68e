//! FLAC metadata blocks: STREAMINFO, Vorbis comments and pictures.

use anyhow::{Result, bail};
use serde::Serialize;

use crate::formats::attachment::save_attachment;
use crate::process::{AttachmentMode, Session};
use crate::report::{AudioStream, CommentValue, Comments, Picture};
use crate::utils::bitstream_io::HeaderReader;
use crate::utils::byteorder::{ReadBytesBe, ReadBytesLe};
use crate::utils::errors::FormatError;

pub const MAGIC: &[u8; 4] = b"fLaC";

/// Picture block headers are parsed from at most this many leading bytes.
const PICTURE_HEADER_LIMIT: usize = 65536;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    StreamInfo,
    Padding,
    Application,
    SeekTable,
    VorbisComment,
    CueSheet,
    Picture,
    Reserved,
    Invalid,
}

impl BlockType {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => BlockType::StreamInfo,
            1 => BlockType::Padding,
            2 => BlockType::Application,
            3 => BlockType::SeekTable,
            4 => BlockType::VorbisComment,
            5 => BlockType::CueSheet,
            6 => BlockType::Picture,
            127 => BlockType::Invalid,
            _ => BlockType::Reserved,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetaBlock {
    pub block_type: BlockType,
    pub type_id: u8,
    pub offset: u64,
    pub block_length: u32,
    pub last_meta_block: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StreamInfo {
    pub min_block_size: u16,
    pub max_block_size: u16,
    pub min_frame_size: u32,
    pub max_frame_size: u32,
    pub sample_rate: u32,
    pub channels: u8,
    pub bits_per_sample: u8,
    pub samples_stream: u64,
    pub audio_signature: String,
}

impl StreamInfo {
    pub const LENGTH: usize = 34;

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut r = HeaderReader::new(bytes);
        let mut info = Self {
            min_block_size: r.get_n(16)?,
            max_block_size: r.get_n(16)?,
            min_frame_size: r.get_n(24)?,
            max_frame_size: r.get_n(24)?,
            sample_rate: r.get_n(20)?,
            ..Default::default()
        };
        info.channels = r.get_n::<u8>(3)? + 1;
        info.bits_per_sample = r.get_n::<u8>(5)? + 1;
        info.samples_stream = r.get_n(36)?;
        info.audio_signature = r.get_bytes(16)?.iter().map(|b| format!("{b:02x}")).collect();
        Ok(info)
    }

    pub fn playtime(&self) -> Option<f64> {
        (self.sample_rate > 0 && self.samples_stream > 0)
            .then(|| self.samples_stream as f64 / self.sample_rate as f64)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FlacInfo {
    pub blocks: Vec<MetaBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streaminfo: Option<StreamInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Comments::is_empty")]
    pub comments: Comments,
}

/// Reads a Vorbis comment block body: a vendor string and `KEY=value`
/// entries, all lengths little-endian.
pub fn parse_vorbis_comment(body: &[u8], comments: &mut Comments) -> Result<String> {
    let mut src = body;
    let vendor = read_le_string(&mut src)?;
    let count = u32::read_le(&mut src)?;
    for _ in 0..count {
        let entry = read_le_string(&mut src)?;
        let Some((key, value)) = entry.split_once('=') else {
            continue;
        };
        comments
            .entry(key.to_ascii_lowercase())
            .or_default()
            .push(CommentValue::Text(value.to_string()));
    }
    Ok(vendor)
}

fn read_le_string(src: &mut &[u8]) -> Result<String> {
    let len = u32::read_le(src)? as usize;
    if src.len() < len {
        bail!(FormatError::Truncated {
            expected: len as u64,
            found: src.len() as u64,
        });
    }
    let (text, rest) = src.split_at(len);
    *src = rest;
    Ok(String::from_utf8_lossy(text).into_owned())
}

fn read_be_string(src: &mut &[u8]) -> Result<String> {
    let len = u32::read_be(src)? as usize;
    if src.len() < len {
        bail!(FormatError::Truncated {
            expected: len as u64,
            found: src.len() as u64,
        });
    }
    let (text, rest) = src.split_at(len);
    *src = rest;
    Ok(String::from_utf8_lossy(text).into_owned())
}

pub fn picture_type_name(code: u32) -> &'static str {
    match code {
        0 => "Other",
        1 => "32x32 pixels 'file icon' (PNG only)",
        2 => "Other file icon",
        3 => "Cover (front)",
        4 => "Cover (back)",
        5 => "Leaflet page",
        6 => "Media (e.g. label side of CD)",
        7 => "Lead artist/lead performer/soloist",
        8 => "Artist/performer",
        9 => "Conductor",
        10 => "Band/Orchestra",
        11 => "Composer",
        12 => "Lyricist/text writer",
        13 => "Recording Location",
        14 => "During recording",
        15 => "During performance",
        16 => "Movie/video screen capture",
        17 => "A bright coloured fish",
        18 => "Illustration",
        19 => "Band/artist logotype",
        20 => "Publisher/Studio logotype",
        _ => "reserved",
    }
}

fn read_picture(session: &mut Session, block: &MetaBlock, index: usize) -> Result<()> {
    let body_offset = block.offset + 4;
    let head = session.read_at(
        body_offset,
        (block.block_length as usize).min(PICTURE_HEADER_LIMIT),
    )?;
    let mut src = &head[..];
    let picture_type = u32::read_be(&mut src)?;
    let image_mime = read_be_string(&mut src)?;
    let description = read_be_string(&mut src)?;
    // width, height, colour depth, palette size
    let _: [u8; 16] = ReadBytesBe::read_be(&mut src)?;
    let data_length = u32::read_be(&mut src)? as u64;
    let data_offset = body_offset + (head.len() - src.len()) as u64;

    if data_offset + data_length > body_offset + block.block_length as u64 {
        bail!(FormatError::Truncated {
            expected: data_length,
            found: (body_offset + block.block_length as u64).saturating_sub(data_offset),
        });
    }

    let name = format!("flac_picture_{index}");
    let options = session.options;
    let saved = save_attachment(
        session.source.as_mut(),
        options,
        &name,
        data_offset,
        data_length,
        Some(&image_mime),
    )?;
    if let Some(data) = saved {
        let picture = Picture {
            data,
            image_mime,
            filename: None,
            picturetype: Some(picture_type_name(picture_type).to_string()),
            description: (!description.is_empty()).then_some(description),
        };
        if let Some(flac) = session.report.flac.as_mut() {
            flac.comments
                .entry("picture".into())
                .or_default()
                .push(CommentValue::Picture(picture));
        }
    }
    Ok(())
}

pub fn analyze(session: &mut Session) -> Result<()> {
    let start = session.avdataoffset();
    let end = session.avdataend();
    let magic = session.read_at(start, 4)?;
    if magic != MAGIC {
        bail!(FormatError::BadMagic {
            expected: "fLaC".into(),
            offset: start,
            found: String::from_utf8_lossy(&magic).into_owned(),
        });
    }

    session.report.fileformat = Some("flac".into());
    session.report.flac = Some(FlacInfo::default());

    let mut pos = start + 4;
    let mut pictures = 0;
    loop {
        let header = session.read_at(pos, 4)?;
        if header.len() < 4 {
            bail!(FormatError::Truncated {
                expected: pos + 4,
                found: end,
            });
        }
        let block = MetaBlock {
            block_type: BlockType::from_code(header[0] & 0x7F),
            type_id: header[0] & 0x7F,
            offset: pos,
            block_length: u32::from_be_bytes([0, header[1], header[2], header[3]]),
            last_meta_block: header[0] & 0x80 != 0,
        };
        let body_offset = pos + 4;
        let next = body_offset + block.block_length as u64;
        if next > end {
            bail!(FormatError::Truncated {
                expected: next,
                found: end,
            });
        }

        match block.block_type {
            BlockType::StreamInfo => {
                let body = session.read_at(body_offset, StreamInfo::LENGTH)?;
                let info = StreamInfo::parse(&body)?;
                if let Some(flac) = session.report.flac.as_mut() {
                    flac.streaminfo = Some(info);
                }
            }
            BlockType::VorbisComment => {
                let body = session.read_at(body_offset, block.block_length as usize)?;
                let mut comments = Comments::new();
                let vendor = parse_vorbis_comment(&body, &mut comments)?;
                if let Some(flac) = session.report.flac.as_mut() {
                    flac.vendor = Some(vendor);
                    for (key, values) in comments {
                        flac.comments.entry(key).or_default().extend(values);
                    }
                }
            }
            BlockType::Picture if session.options.attachments != AttachmentMode::None => {
                read_picture(session, &block, pictures)?;
                pictures += 1;
            }
            BlockType::Invalid => {
                session.warn(format!("Invalid metadata block type 127 at offset {pos}"));
            }
            _ => {}
        }

        let last = block.last_meta_block;
        if let Some(flac) = session.report.flac.as_mut() {
            flac.blocks.push(block);
        }
        pos = next;
        if last {
            break;
        }
    }

    session.report.avdataoffset = Some(pos);

    let streaminfo = session
        .report
        .flac
        .as_ref()
        .and_then(|f| f.streaminfo.clone());
    let Some(streaminfo) = streaminfo else {
        session.error("STREAMINFO block not found");
        return Ok(());
    };

    let audio = session.report.audio_mut();
    audio.merge_from(&AudioStream {
        dataformat: Some("flac".into()),
        bitrate_mode: Some("vbr".into()),
        lossless: Some(true),
        sample_rate: Some(streaminfo.sample_rate as f64),
        channels: Some(streaminfo.channels as u32),
        bits_per_sample: Some(streaminfo.bits_per_sample as u32),
        ..Default::default()
    });

    if let Some(playtime) = streaminfo.playtime() {
        session.report.playtime_seconds = Some(playtime);
        let data = end.saturating_sub(pos);
        if data > 0 {
            let bitrate = data as f64 * 8.0 / playtime;
            session.report.bitrate = Some(bitrate);
            session.report.audio_mut().bitrate = Some(bitrate);
        }
    }
    Ok(())
}
