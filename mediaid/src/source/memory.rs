use std::sync::Arc;

use super::{ByteRange, ByteSource, SeekPos, check_range, resolve_seek};
use crate::utils::errors::SourceError;

/// Source over an immutable in-memory buffer. Sub-sources share the buffer.
#[derive(Clone, Debug)]
pub struct MemorySource {
    data: Arc<[u8]>,
    base: usize,
    len: usize,
    pos: u64,
}

impl MemorySource {
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        let data = data.into();
        let len = data.len();
        Self {
            data,
            base: 0,
            len,
            pos: 0,
        }
    }
}

impl ByteSource for MemorySource {
    fn read_some(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
        if self.pos >= self.len as u64 {
            return Ok(0);
        }

        let start = self.base + self.pos as usize;
        let end = self.base + self.len;
        let n = buf.len().min(end - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.pos += n as u64;

        Ok(n)
    }

    fn seek(&mut self, pos: SeekPos) -> Result<u64, SourceError> {
        self.pos = resolve_seek(pos, self.pos, self.len as u64)?;
        Ok(self.pos)
    }

    fn position(&self) -> u64 {
        self.pos
    }

    fn len(&self) -> u64 {
        self.len as u64
    }

    fn sub_source(&self, range: ByteRange) -> Result<Box<dyn ByteSource>, SourceError> {
        check_range(range, self.len as u64)?;
        Ok(Box::new(Self {
            data: Arc::clone(&self.data),
            base: self.base + range.start as usize,
            len: range.len() as usize,
            pos: 0,
        }))
    }
}
