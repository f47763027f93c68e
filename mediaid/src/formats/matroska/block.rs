//! Block and SimpleBlock headers, including lace size tables.
//!
//! ```text
//! track number (vint) | timecode (i16 BE) | flags (u8) | [frame count - 1 (u8) | lace sizes]
//! ```
//!
//! Flag layout differs between the two block kinds: only SimpleBlock carries
//! the keyframe (0x80) and discardable (0x01) bits. Bits 0x06 select lacing.

use std::fmt::Display;

use anyhow::{Result, bail};
use serde::Serialize;

use crate::ebml::{Element, ParseContext};
use crate::utils::errors::EbmlError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Lacing {
    #[default]
    None,
    Xiph,
    FixedSize,
    Ebml,
}

impl Lacing {
    pub fn from_flags(flags: u8) -> Self {
        match (flags & 0x06) >> 1 {
            0 => Lacing::None,
            1 => Lacing::Xiph,
            2 => Lacing::FixedSize,
            _ => Lacing::Ebml,
        }
    }
}

impl Display for Lacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lacing::None => write!(f, "no lacing"),
            Lacing::Xiph => write!(f, "Xiph lacing"),
            Lacing::FixedSize => write!(f, "fixed-size lacing"),
            Lacing::Ebml => write!(f, "EBML lacing"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BlockFlags {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyframe: Option<bool>,
    pub invisible: bool,
    pub lacing: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discardable: Option<bool>,
    pub lacing_type: String,
}

impl BlockFlags {
    pub fn decode(raw: u8, simple: bool) -> Self {
        let lacing = Lacing::from_flags(raw);
        Self {
            keyframe: simple.then_some(raw & 0x80 != 0),
            invisible: raw & 0x08 != 0,
            lacing: (raw & 0x06) >> 1,
            discardable: simple.then_some(raw & 0x01 != 0),
            lacing_type: lacing.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Block {
    pub tracknumber: u64,
    pub timecode: i16,
    pub flags_raw: u8,
    pub flags: BlockFlags,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lace_frames: Option<u16>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lace_frames_size: Vec<u64>,
    /// First byte of frame data, after any lace header.
    #[serde(skip)]
    pub data_offset: u64,
}

impl Block {
    /// Reads the block header at the cursor. `element` is the enclosing
    /// Block or SimpleBlock; the cursor is left after the lace header.
    pub fn read(ctx: &mut ParseContext, element: &Element, simple: bool) -> Result<Self> {
        let tracknumber = ctx.read_vint()?;
        let header = ctx.read_bytes(3)?;
        let timecode = i16::from_be_bytes([header[0], header[1]]);
        let flags_raw = header[2];
        if ctx.offset() > element.end {
            bail!(EbmlError::InvalidBlock {
                what: "block header",
                offset: element.offset,
            });
        }

        let mut block = Self {
            tracknumber,
            timecode,
            flags_raw,
            flags: BlockFlags::decode(flags_raw, simple),
            ..Default::default()
        };

        let lacing = Lacing::from_flags(flags_raw);
        if lacing != Lacing::None {
            let frames = ctx.read_bytes(1)?[0] as u16 + 1;
            block.lace_frames = Some(frames);
            block.lace_frames_size = read_lace_sizes(ctx, element, lacing, frames)?;
        }

        block.data_offset = ctx.offset();
        Ok(block)
    }
}

/// Decodes the per-frame sizes of a laced block. The last frame's size is
/// whatever remains of the block after the sizes already declared.
fn read_lace_sizes(
    ctx: &mut ParseContext,
    element: &Element,
    lacing: Lacing,
    frames: u16,
) -> Result<Vec<u64>> {
    let frames = frames as usize;
    let mut sizes = Vec::with_capacity(frames);

    match lacing {
        Lacing::None => return Ok(sizes),
        Lacing::Xiph => {
            for _ in 1..frames {
                let mut size = 0u64;
                loop {
                    let byte = ctx.read_bytes(1)?[0];
                    size += byte as u64;
                    if byte != 0xFF {
                        break;
                    }
                }
                sizes.push(size);
            }
        }
        Lacing::Ebml => {
            if frames > 1 {
                let mut size = ctx.read_vint()? as i64;
                sizes.push(size as u64);
                for _ in 2..frames {
                    size += ctx.read_signed_vint()?;
                    if size < 0 {
                        bail!(EbmlError::InvalidBlock {
                            what: "EBML lace size",
                            offset: ctx.offset(),
                        });
                    }
                    sizes.push(size as u64);
                }
            }
        }
        Lacing::FixedSize => {
            let remaining = element.end.saturating_sub(ctx.offset());
            let each = remaining / frames as u64;
            if remaining % frames as u64 != 0 {
                ctx.warn(format!(
                    "Fixed-size lace at offset {} holds {remaining} bytes, not divisible into {frames} frames",
                    element.offset
                ));
            }
            sizes.resize(frames - 1, each);
        }
    }

    let declared: u64 = sizes.iter().sum();
    let remaining = element.end.saturating_sub(ctx.offset());
    if ctx.offset() > element.end || declared > remaining {
        bail!(EbmlError::InvalidBlock {
            what: "lace size table",
            offset: element.offset,
        });
    }
    sizes.push(remaining - declared);

    Ok(sizes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ebml::writer::element;
    use crate::ebml::{DataPolicy, ids, vint};
    use crate::source::MemorySource;

    /// Parses a lone SimpleBlock holding `body`, returning the block and the
    /// enclosing element end.
    fn parse(body: &[u8]) -> (Block, u64, Vec<String>) {
        let file = element(ids::CLUSTERSIMPLEBLOCK, body);
        let mut src = MemorySource::new(file.clone());
        let mut ctx = ParseContext::new(&mut src, 0);
        let el = ctx
            .next_element(file.len() as u64, DataPolicy::Skip)
            .unwrap()
            .unwrap();
        let block = Block::read(&mut ctx, &el, true).unwrap();
        (block, el.end, ctx.diagnostics.warning)
    }

    #[test]
    fn unlaced_block() {
        let mut body = vec![0x81, 0x00, 0x10, 0x80];
        body.extend_from_slice(&[0xAA; 5]);
        let (block, end, _) = parse(&body);
        assert_eq!(block.tracknumber, 1);
        assert_eq!(block.timecode, 16);
        assert_eq!(block.flags.keyframe, Some(true));
        assert_eq!(block.flags.lacing_type, "no lacing");
        assert!(block.lace_frames.is_none());
        assert_eq!(end - block.data_offset, 5);
    }

    #[test]
    fn xiph_lace_sizes_sum_to_payload() {
        // Three frames: 300, 20, and the remainder (7).
        let mut body = vec![0x82, 0xFF, 0xFE, 0x02, 0x02, 0xFF, 0x2D, 0x14];
        body.extend(vec![0u8; 300 + 20 + 7]);
        let (block, end, _) = parse(&body);
        assert_eq!(block.tracknumber, 2);
        assert_eq!(block.timecode, -2);
        assert_eq!(block.flags.lacing_type, "Xiph lacing");
        assert_eq!(block.lace_frames, Some(3));
        assert_eq!(block.lace_frames_size, [300, 20, 7]);
        assert_eq!(block.lace_frames_size.iter().sum::<u64>(), end - block.data_offset);
    }

    #[test]
    fn ebml_lace_sizes_sum_to_payload() {
        // Four frames: 500, 498 (delta -2), 510 (delta +12), remainder 42.
        let mut body = vec![0x81, 0x00, 0x00, 0x06, 0x03];
        body.extend(vint::encode(500, 2).unwrap());
        body.extend(vint::encode((-2i64 + 63) as u64, 1).unwrap());
        body.extend(vint::encode((12i64 + 63) as u64, 1).unwrap());
        body.extend(vec![0u8; 500 + 498 + 510 + 42]);
        let (block, end, _) = parse(&body);
        assert_eq!(block.flags.lacing_type, "EBML lacing");
        assert_eq!(block.lace_frames_size, [500, 498, 510, 42]);
        assert_eq!(block.lace_frames_size.iter().sum::<u64>(), end - block.data_offset);
    }

    #[test]
    fn fixed_lace_sizes_sum_to_payload() {
        let mut body = vec![0x81, 0x00, 0x00, 0x04, 0x03];
        body.extend(vec![0u8; 4 * 96]);
        let (block, end, warnings) = parse(&body);
        assert_eq!(block.flags.lacing_type, "fixed-size lacing");
        assert_eq!(block.lace_frames_size, [96; 4]);
        assert_eq!(block.lace_frames_size.iter().sum::<u64>(), end - block.data_offset);
        assert!(warnings.is_empty());

        let mut body = vec![0x81, 0x00, 0x00, 0x04, 0x02];
        body.extend(vec![0u8; 10]);
        let (block, end, warnings) = parse(&body);
        assert_eq!(block.lace_frames_size, [3, 3, 4]);
        assert_eq!(block.lace_frames_size.iter().sum::<u64>(), end - block.data_offset);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn oversized_lace_table_is_rejected() {
        let file = element(ids::CLUSTERSIMPLEBLOCK, &[0x81, 0x00, 0x00, 0x02, 0x01, 0x50, 0x00]);
        let mut src = MemorySource::new(file.clone());
        let mut ctx = ParseContext::new(&mut src, 0);
        let el = ctx
            .next_element(file.len() as u64, DataPolicy::Skip)
            .unwrap()
            .unwrap();
        assert!(Block::read(&mut ctx, &el, true).is_err());
    }

    #[test]
    fn group_block_flags_omit_simple_bits() {
        let flags = BlockFlags::decode(0x89, false);
        assert_eq!(flags.keyframe, None);
        assert_eq!(flags.discardable, None);
        assert!(flags.invisible);
        let flags = BlockFlags::decode(0x81, true);
        assert_eq!(flags.keyframe, Some(true));
        assert_eq!(flags.discardable, Some(true));
    }
}
