//! Lazy EBML element traversal.
//!
//! [`ParseContext`] keeps a read-ahead window over a [`ByteSource`] and hands
//! out one [`Element`] header at a time. Callers drive nesting themselves:
//! a handler loops on [`ParseContext::next_element`] with the parent's end
//! offset, recursing or skipping as it sees fit. The cursor only ever moves
//! forward.

use std::borrow::Cow;

use anyhow::Result;
use log::Level;

use crate::ebml::ids;
use crate::ebml::vint;
use crate::log_or_err;
use crate::report::Diagnostics;
use crate::source::{ByteSource, SeekPos};
use crate::utils::byteorder::{float_be, int_be, trimmed_string, uint_be};
use crate::utils::errors::{EbmlError, VintError};

/// Bytes kept buffered ahead of the cursor before a header is decoded.
pub const MIN_LOOKAHEAD: usize = 1024;

pub const DEFAULT_READ_BUFFER_SIZE: usize = 32768;

/// Elements whose payload is never read and never reported as unhandled.
const UNUSEFUL_ELEMENTS: [u32; 2] = [ids::CRC32, ids::VOID];

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub id: u32,
    pub id_name: Cow<'static, str>,
    pub offset: u64,
    pub length: u64,
    pub end: u64,
    pub data: Option<Vec<u8>>,
}

impl Element {
    pub fn bytes(&self) -> &[u8] {
        self.data.as_deref().unwrap_or_default()
    }

    pub fn uint(&self) -> u64 {
        uint_be(self.bytes())
    }

    pub fn int(&self) -> i64 {
        int_be(self.bytes())
    }

    pub fn float(&self) -> f64 {
        float_be(self.bytes())
    }

    pub fn flag(&self) -> bool {
        self.uint() != 0
    }

    pub fn string(&self) -> String {
        trimmed_string(self.bytes())
    }

    /// The payload read as a vint, as stored in SeekID.
    pub fn vint(&self) -> Result<u64, VintError> {
        vint::decode(self.bytes()).map(|(v, _)| v)
    }
}

/// Which payloads [`ParseContext::next_element`] materializes.
#[derive(Clone, Copy, Debug)]
pub enum DataPolicy<'a> {
    Skip,
    All,
    /// Everything except the listed container IDs.
    Except(&'a [u32]),
}

impl DataPolicy<'_> {
    fn wants(&self, id: u32) -> bool {
        match self {
            DataPolicy::Skip => false,
            DataPolicy::All => true,
            DataPolicy::Except(skip) => !skip.contains(&id),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WalkState {
    HasMoreElements,
    Exhausted,
}

pub struct ParseContext<'s> {
    source: &'s mut dyn ByteSource,
    buffer: Vec<u8>,
    buffer_offset: u64,
    current_offset: u64,
    data_end: u64,
    read_buffer_size: usize,
    state: WalkState,
    truncation_reported: bool,
    fail_level: Level,
    pub diagnostics: Diagnostics,
}

impl<'s> ParseContext<'s> {
    pub fn new(source: &'s mut dyn ByteSource, start: u64) -> Self {
        let data_end = source.len();
        Self {
            source,
            buffer: Vec::new(),
            buffer_offset: start,
            current_offset: start,
            data_end,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            state: WalkState::HasMoreElements,
            truncation_reported: false,
            fail_level: Level::Error,
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(MIN_LOOKAHEAD);
        self
    }

    /// Sets the failure level for structural warnings.
    ///
    /// - `log::Level::Error`: warnings are recorded and traversal continues (default)
    /// - `log::Level::Warn`: warnings abort the walk (strict mode)
    pub fn set_fail_level(&mut self, level: Level) {
        self.fail_level = level;
    }

    pub fn fail_level(&self) -> Level {
        self.fail_level
    }

    pub fn warn(&mut self, msg: impl std::fmt::Display) {
        self.diagnostics.warn(msg);
    }

    pub fn error(&mut self, msg: impl std::fmt::Display) {
        self.diagnostics.error(msg);
    }

    pub fn offset(&self) -> u64 {
        self.current_offset
    }

    pub fn data_end(&self) -> u64 {
        self.data_end
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == WalkState::Exhausted
    }

    /// Moves the cursor forward to `offset`. Never moves it backwards.
    pub fn skip_to(&mut self, offset: u64) {
        self.current_offset = self.current_offset.max(offset);
    }

    /// Direct access to the underlying source for bulk copies. The buffered
    /// window stays valid since the source is only read.
    pub fn source_mut(&mut self) -> &mut dyn ByteSource {
        &mut *self.source
    }

    fn buffered_ahead(&self) -> usize {
        let buffer_end = self.buffer_offset + self.buffer.len() as u64;
        if self.current_offset < self.buffer_offset || self.current_offset >= buffer_end {
            0
        } else {
            (buffer_end - self.current_offset) as usize
        }
    }

    /// Refills the window at the cursor when fewer than `min` bytes are
    /// buffered ahead. Returns `false` when nothing at all could be read.
    fn ensure_buffer(&mut self, min: usize) -> Result<bool> {
        let ahead = self.buffered_ahead();
        let buffer_end = self.buffer_offset + self.buffer.len() as u64;
        if ahead >= min || (ahead > 0 && buffer_end >= self.data_end) {
            return Ok(true);
        }

        let read_bytes = min.max(self.read_buffer_size);
        self.source.seek(SeekPos::Start(self.current_offset))?;
        self.buffer_offset = self.current_offset;
        self.buffer = self.source.read(read_bytes)?;

        if self.buffer.is_empty() {
            self.error(format!(
                "EBML parser: ran out of file at offset {}",
                self.current_offset
            ));
            return Ok(false);
        }

        Ok(true)
    }

    fn window(&self) -> &[u8] {
        let start = (self.current_offset - self.buffer_offset) as usize;
        &self.buffer[start.min(self.buffer.len())..]
    }

    /// Reads one vint at the cursor, returning the value and its length.
    pub fn read_vint_len(&mut self) -> Result<(u64, usize)> {
        if !self.ensure_buffer(vint::MAX_VINT_LENGTH)? {
            return Err(EbmlError::OutOfData(self.current_offset).into());
        }

        match vint::decode(self.window()) {
            Ok((value, len)) => {
                self.current_offset += len as u64;
                Ok((value, len))
            }
            Err(VintError::Incomplete { .. }) => {
                Err(EbmlError::OutOfData(self.current_offset).into())
            }
            Err(source) => Err(EbmlError::BadVint {
                offset: self.current_offset,
                source,
            }
            .into()),
        }
    }

    pub fn read_vint(&mut self) -> Result<u64> {
        Ok(self.read_vint_len()?.0)
    }

    pub fn read_signed_vint(&mut self) -> Result<i64> {
        if !self.ensure_buffer(vint::MAX_VINT_LENGTH)? {
            return Err(EbmlError::OutOfData(self.current_offset).into());
        }

        match vint::decode_signed(self.window()) {
            Ok((value, len)) => {
                self.current_offset += len as u64;
                Ok(value)
            }
            Err(VintError::Incomplete { .. }) => {
                Err(EbmlError::OutOfData(self.current_offset).into())
            }
            Err(source) => Err(EbmlError::BadVint {
                offset: self.current_offset,
                source,
            }
            .into()),
        }
    }

    /// Reads exactly `n` bytes at the cursor.
    pub fn read_bytes(&mut self, n: u64) -> Result<Vec<u8>> {
        let n_usize = usize::try_from(n).map_err(|_| EbmlError::DataTooLarge(n))?;
        if self.current_offset.saturating_add(n) > self.data_end {
            return Err(EbmlError::OutOfData(self.current_offset).into());
        }

        if !self.ensure_buffer(n_usize)? {
            return Err(EbmlError::OutOfData(self.current_offset).into());
        }

        let window = self.window();
        if window.len() < n_usize {
            return Err(EbmlError::OutOfData(self.current_offset).into());
        }

        let data = window[..n_usize].to_vec();
        self.current_offset += n;
        Ok(data)
    }

    /// Yields the next element header inside `[cursor, parent_end)`.
    ///
    /// Declared sizes running past `parent_end` are clamped to it. When the
    /// overrun also passes the end of the data, a single truncation error is
    /// recorded per walk; otherwise a warning is recorded.
    pub fn next_element(
        &mut self,
        parent_end: u64,
        policy: DataPolicy,
    ) -> Result<Option<Element>> {
        if self.state == WalkState::Exhausted || self.current_offset >= parent_end {
            return Ok(None);
        }

        if !self.ensure_buffer(MIN_LOOKAHEAD)? {
            self.state = WalkState::Exhausted;
            return Ok(None);
        }

        let offset = self.current_offset;

        let raw_id = self.read_vint()?;
        let id = u32::try_from(raw_id).map_err(|_| EbmlError::BadVint {
            offset,
            source: VintError::Overflow {
                value: raw_id,
                len: 4,
            },
        })?;
        let id_name = ids::id_name(id);
        // The size needs at least one byte inside the parent.
        if self.current_offset >= parent_end {
            return self.header_overrun(&id_name, offset, parent_end);
        }

        let (mut length, size_len) = self.read_vint_len()?;
        let data_start = self.current_offset;
        if data_start > parent_end {
            return self.header_overrun(&id_name, offset, parent_end);
        }

        if vint::is_unknown_size(length, size_len) {
            log::debug!("{id_name} at {offset} has unknown size, extending to {parent_end}");
            length = parent_end.saturating_sub(data_start);
        }

        let mut end = data_start.saturating_add(length);

        if end > parent_end {
            if end > self.data_end {
                if !self.truncation_reported {
                    self.truncation_reported = true;
                    self.error(format!(
                        "EBML parser: probable truncated file, {id_name} at offset {offset} \
                         declares {length} bytes but data ends at {}",
                        self.data_end
                    ));
                }
            } else {
                let err = EbmlError::Overrun {
                    name: id_name.to_string(),
                    id,
                    end,
                    parent_end,
                };
                log_or_err!(self, Level::Warn, err);
            }
            end = parent_end.max(data_start);
            length = end - data_start;
        }

        let dont_parse = UNUSEFUL_ELEMENTS.contains(&id)
            || ids::is_master(id)
            || ids::known_name(id).is_none();
        let data = if policy.wants(id) && !dont_parse {
            Some(self.read_bytes(length)?)
        } else {
            None
        };

        Ok(Some(Element {
            id,
            id_name,
            offset,
            length,
            end,
            data,
        }))
    }

    /// An element header that does not fit in its parent. The cursor is put
    /// back on the parent end and the level is exhausted.
    fn header_overrun(
        &mut self,
        name: &str,
        offset: u64,
        parent_end: u64,
    ) -> Result<Option<Element>> {
        self.current_offset = parent_end;
        let err = EbmlError::HeaderOverrun {
            name: name.to_string(),
            offset,
            parent_end,
        };
        log_or_err!(self, Level::Warn, err);
        Ok(None)
    }

    /// Reports an element the handler has no use for and moves past it.
    pub fn unhandled(&mut self, kind: &str, element: &Element) -> Result<()> {
        if !UNUSEFUL_ELEMENTS.contains(&element.id) {
            let err = EbmlError::Unexpected {
                name: format!("{kind} element {}", element.id_name),
                id: element.id,
                offset: element.offset,
            };
            log_or_err!(self, Level::Warn, err);
        }

        if element.data.is_none() {
            self.skip_to(element.end);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ebml::writer::{element, element_sized, id_bytes};
    use crate::source::MemorySource;

    fn uint_el(id: u32, v: u8) -> Vec<u8> {
        element(id, &[v])
    }

    #[test]
    fn walks_siblings_and_children() -> Result<()> {
        let children = [uint_el(ids::EBMLVERSION, 1), uint_el(ids::DOCTYPEVERSION, 4)].concat();
        let file = [element(ids::EBML, &children), element(ids::VOID, &[0; 3])].concat();
        let mut src = MemorySource::new(file.clone());
        let mut ctx = ParseContext::new(&mut src, 0);

        let top = ctx.next_element(file.len() as u64, DataPolicy::Skip)?.unwrap();
        assert_eq!(top.id, ids::EBML);
        assert_eq!(top.id_name, "EBML");
        assert_eq!(top.end, top.offset + 5 + top.length);

        let mut values = Vec::new();
        while let Some(child) = ctx.next_element(top.end, DataPolicy::All)? {
            values.push((child.id, child.uint()));
        }
        assert_eq!(values, [(ids::EBMLVERSION, 1), (ids::DOCTYPEVERSION, 4)]);

        let void = ctx.next_element(file.len() as u64, DataPolicy::All)?.unwrap();
        assert_eq!(void.id, ids::VOID);
        assert!(void.data.is_none());
        ctx.unhandled("test", &void)?;
        assert!(ctx.next_element(file.len() as u64, DataPolicy::All)?.is_none());
        assert!(ctx.diagnostics.warning.is_empty());
        Ok(())
    }

    #[test]
    fn overrun_inside_data_is_clamped_with_warning() -> Result<()> {
        // A child declaring 10 bytes inside a parent holding 6.
        let mut inner = element_sized(ids::TITLE, 10, b"abc");
        inner.extend_from_slice(&[0; 7]);
        let parent = element_sized(ids::INFO, 6, &inner);
        let mut src = MemorySource::new(parent.clone());
        let mut ctx = ParseContext::new(&mut src, 0);

        let info = ctx.next_element(parent.len() as u64, DataPolicy::Skip)?.unwrap();
        let child = ctx.next_element(info.end, DataPolicy::All)?.unwrap();
        assert_eq!(child.end, info.end);
        assert_eq!(child.length, info.end - (child.offset + 3));
        assert!(ctx.offset() <= info.end);
        assert_eq!(ctx.diagnostics.warning.len(), 1);
        assert!(ctx.diagnostics.error.is_empty());
        Ok(())
    }

    #[test]
    fn header_straddling_parent_end_stops_the_level() -> Result<()> {
        // Info holds only the Title ID; its size byte belongs to the sibling.
        let mut file = element_sized(ids::INFO, 2, &id_bytes(ids::TITLE));
        file.extend_from_slice(&[0x83, b'a', b'b', b'c']);
        let mut src = MemorySource::new(file.clone());
        let mut ctx = ParseContext::new(&mut src, 0);

        let info = ctx.next_element(file.len() as u64, DataPolicy::Skip)?.unwrap();
        assert_eq!(info.end, 7);
        assert!(ctx.next_element(info.end, DataPolicy::All)?.is_none());
        assert_eq!(ctx.offset(), info.end);
        assert!(ctx.next_element(info.end, DataPolicy::All)?.is_none());
        assert_eq!(ctx.diagnostics.warning.len(), 1);
        assert!(ctx.diagnostics.warning[0].contains("Title header at offset 5"));

        let mut src = MemorySource::new(file.clone());
        let mut ctx = ParseContext::new(&mut src, 0);
        ctx.set_fail_level(Level::Warn);
        let info = ctx.next_element(file.len() as u64, DataPolicy::Skip)?.unwrap();
        assert!(ctx.next_element(info.end, DataPolicy::All).is_err());
        Ok(())
    }

    #[test]
    fn size_vint_running_past_parent_end() -> Result<()> {
        // A 2-byte size starting on the last byte of the parent.
        let mut file = element_sized(ids::INFO, 3, &id_bytes(ids::TITLE));
        file.extend_from_slice(&[0x40, 0x01, b'x']);
        let mut src = MemorySource::new(file.clone());
        let mut ctx = ParseContext::new(&mut src, 0);

        let info = ctx.next_element(file.len() as u64, DataPolicy::Skip)?.unwrap();
        assert!(ctx.next_element(info.end, DataPolicy::All)?.is_none());
        assert_eq!(ctx.offset(), info.end);
        assert_eq!(ctx.diagnostics.warning.len(), 1);
        Ok(())
    }

    #[test]
    fn master_elements_are_never_materialized() -> Result<()> {
        let cluster = element(ids::CLUSTER, &[0xE7, 0x81, 0x01]);
        let video = element(ids::VIDEO, &[uint_el(ids::PIXELWIDTH, 8), cluster].concat());
        let mut src = MemorySource::new(video.clone());
        let mut ctx = ParseContext::new(&mut src, 0);

        let video_el = ctx.next_element(video.len() as u64, DataPolicy::All)?.unwrap();
        assert!(video_el.data.is_none());
        let width = ctx.next_element(video_el.end, DataPolicy::All)?.unwrap();
        assert_eq!(width.uint(), 8);
        let cluster = ctx.next_element(video_el.end, DataPolicy::All)?.unwrap();
        assert_eq!(cluster.id, ids::CLUSTER);
        assert!(cluster.data.is_none());
        ctx.unhandled("video", &cluster)?;
        assert_eq!(ctx.offset(), video_el.end);
        Ok(())
    }

    #[test]
    fn overrun_in_strict_mode_is_an_error() {
        let mut inner = element_sized(ids::TITLE, 10, b"abc");
        inner.extend_from_slice(&[0; 7]);
        let parent = element_sized(ids::INFO, 6, &inner);
        let mut src = MemorySource::new(parent.clone());
        let mut ctx = ParseContext::new(&mut src, 0);
        ctx.set_fail_level(Level::Warn);

        let info = ctx
            .next_element(parent.len() as u64, DataPolicy::Skip)
            .unwrap()
            .unwrap();
        assert!(ctx.next_element(info.end, DataPolicy::All).is_err());
    }

    #[test]
    fn overrun_past_data_is_truncation_error() -> Result<()> {
        let file = element_sized(ids::SEGMENT, 1000, &uint_el(ids::TIMECODESCALE, 1));
        let mut src = MemorySource::new(file.clone());
        let mut ctx = ParseContext::new(&mut src, 0);

        let seg = ctx.next_element(file.len() as u64, DataPolicy::Skip)?.unwrap();
        assert_eq!(seg.end, file.len() as u64);
        let child = ctx.next_element(seg.end, DataPolicy::All)?.unwrap();
        assert_eq!(child.uint(), 1);
        assert!(ctx.next_element(seg.end, DataPolicy::All)?.is_none());
        assert_eq!(ctx.diagnostics.error.len(), 1);
        assert!(ctx.diagnostics.error[0].contains("probable truncated file"));
        Ok(())
    }

    #[test]
    fn unknown_size_extends_to_parent() -> Result<()> {
        let mut file = vec![0x18, 0x53, 0x80, 0x67, 0xFF];
        file.extend(uint_el(ids::TIMECODESCALE, 7));
        let mut src = MemorySource::new(file.clone());
        let mut ctx = ParseContext::new(&mut src, 0);

        let seg = ctx.next_element(file.len() as u64, DataPolicy::Skip)?.unwrap();
        assert_eq!(seg.id, ids::SEGMENT);
        assert_eq!(seg.end, file.len() as u64);
        assert!(ctx.diagnostics.warning.is_empty() && ctx.diagnostics.error.is_empty());
        Ok(())
    }

    #[test]
    fn zero_byte_header_is_an_error() {
        let mut src = MemorySource::new(vec![0x00, 0x81, 0x00]);
        let mut ctx = ParseContext::new(&mut src, 0);
        let err = ctx.next_element(3, DataPolicy::All).unwrap_err();
        assert!(err.to_string().contains("offset 0"));
    }

    #[test]
    fn truncated_header_is_out_of_data() {
        let mut src = MemorySource::new(vec![0x1A, 0x45]);
        let mut ctx = ParseContext::new(&mut src, 0);
        assert!(ctx.next_element(10, DataPolicy::All).is_err());
    }

    #[test]
    fn refills_across_small_buffers() -> Result<()> {
        let payload = vec![b'x'; 3000];
        let file = [
            element(ids::TITLE, &payload),
            element(ids::MUXINGAPP, b"lib"),
            element(ids::WRITINGAPP, b"app"),
        ]
        .concat();
        let mut src = MemorySource::new(file.clone());
        let mut ctx = ParseContext::new(&mut src, 0).with_read_buffer_size(1024);

        let mut names = Vec::new();
        while let Some(el) = ctx.next_element(file.len() as u64, DataPolicy::All)? {
            names.push((el.id_name.to_string(), el.bytes().len()));
        }
        assert_eq!(
            names,
            [
                ("Title".to_string(), 3000),
                ("MuxingApp".to_string(), 3),
                ("WritingApp".to_string(), 3)
            ]
        );
        Ok(())
    }

    #[test]
    fn exhausted_source_stops_walk() -> Result<()> {
        let file = uint_el(ids::TIMECODESCALE, 1);
        let mut src = MemorySource::new(file);
        let mut ctx = ParseContext::new(&mut src, 0);
        ctx.skip_to(5);
        assert!(ctx.next_element(100, DataPolicy::All)?.is_none());
        assert!(ctx.is_exhausted());
        assert!(ctx.diagnostics.error[0].contains("ran out of file at offset 5"));
        assert!(ctx.next_element(100, DataPolicy::All)?.is_none());
        Ok(())
    }

    #[test]
    fn skip_to_is_monotonic() {
        let mut src = MemorySource::new(vec![0; 8]);
        let mut ctx = ParseContext::new(&mut src, 0);
        ctx.skip_to(6);
        ctx.skip_to(2);
        assert_eq!(ctx.offset(), 6);
    }
}
