//! Random-access byte sources.
//!
//! Parsers read through [`ByteSource`] so the same code runs over files on
//! disk, in-memory buffers and windows carved out of either.

mod file;
mod memory;

pub use file::FileSource;
pub use memory::MemorySource;

use std::path::Path;

use crate::utils::errors::SourceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeekPos {
    Start(u64),
    Current(i64),
    End(i64),
}

/// Half-open byte interval `[start, end)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

pub trait ByteSource {
    /// One underlying read into `buf`. May return fewer bytes than requested;
    /// `Ok(0)` means the source is exhausted.
    fn read_some(&mut self, buf: &mut [u8]) -> Result<usize, SourceError>;

    fn seek(&mut self, pos: SeekPos) -> Result<u64, SourceError>;

    fn position(&self) -> u64;

    /// Logical length of the source in bytes.
    fn len(&self) -> u64;

    /// Opens an independent source over `range` with its own cursor,
    /// positioned at the start of the range.
    fn sub_source(&self, range: ByteRange) -> Result<Box<dyn ByteSource>, SourceError>;

    /// Backing file, if there is one.
    fn path(&self) -> Option<&Path> {
        None
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn at_end(&self) -> bool {
        self.position() >= self.len()
    }

    /// Reads up to `n` bytes, looping over short reads until `n` bytes are
    /// collected or the source is exhausted.
    fn read(&mut self, n: usize) -> Result<Vec<u8>, SourceError> {
        let remaining = self.len().saturating_sub(self.position());
        let want = (n as u64).min(remaining) as usize;
        let mut buf = vec![0; want];
        let mut filled = 0;

        while filled < want {
            let read = self.read_some(&mut buf[filled..])?;
            if read == 0 {
                break;
            }
            filled += read;
        }

        buf.truncate(filled);
        Ok(buf)
    }

    /// Reads through the first `\n`. A lone `\r` also ends the line; the byte
    /// after it is pushed back so CR, LF and CRLF endings can be mixed.
    fn read_line(&mut self) -> Result<Vec<u8>, SourceError> {
        let mut line = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            if self.read_some(&mut byte)? == 0 {
                break;
            }
            line.push(byte[0]);

            match byte[0] {
                b'\n' => break,
                b'\r' => {
                    if self.read_some(&mut byte)? == 0 {
                        break;
                    }
                    if byte[0] == b'\n' {
                        line.push(b'\n');
                    } else {
                        self.seek(SeekPos::Current(-1))?;
                    }
                    break;
                }
                _ => {}
            }
        }

        Ok(line)
    }
}

/// Resolves `pos` against a cursor and length, rejecting negative targets.
pub(crate) fn resolve_seek(pos: SeekPos, current: u64, len: u64) -> Result<u64, SourceError> {
    let target = match pos {
        SeekPos::Start(p) => p as i128,
        SeekPos::Current(d) => current as i128 + d as i128,
        SeekPos::End(d) => len as i128 + d as i128,
    };

    if target < 0 || target > u64::MAX as i128 {
        return Err(SourceError::SeekOutOfRange(target));
    }

    Ok(target as u64)
}

pub(crate) fn check_range(range: ByteRange, len: u64) -> Result<(), SourceError> {
    if range.start > range.end || range.end > len {
        return Err(SourceError::RangeOutOfBounds {
            start: range.start,
            end: range.end,
            len,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out at most three bytes per call.
    struct Trickle(MemorySource);

    impl ByteSource for Trickle {
        fn read_some(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
            let n = buf.len().min(3);
            self.0.read_some(&mut buf[..n])
        }
        fn seek(&mut self, pos: SeekPos) -> Result<u64, SourceError> {
            self.0.seek(pos)
        }
        fn position(&self) -> u64 {
            self.0.position()
        }
        fn len(&self) -> u64 {
            self.0.len()
        }
        fn sub_source(&self, range: ByteRange) -> Result<Box<dyn ByteSource>, SourceError> {
            self.0.sub_source(range)
        }
    }

    #[test]
    fn read_loops_over_short_reads() -> Result<(), SourceError> {
        let mut src = Trickle(MemorySource::new((0u8..20).collect::<Vec<_>>()));
        assert_eq!(src.read(10)?, (0u8..10).collect::<Vec<_>>());
        assert_eq!(src.position(), 10);
        assert_eq!(src.read(100)?.len(), 10);
        assert!(src.at_end());
        assert!(src.read(4)?.is_empty());
        Ok(())
    }

    #[test]
    fn read_line_mixed_endings() -> Result<(), SourceError> {
        let mut src = MemorySource::new(b"one\ntwo\r\nthree\rfour\r".to_vec());
        assert_eq!(src.read_line()?, b"one\n");
        assert_eq!(src.read_line()?, b"two\r\n");
        assert_eq!(src.read_line()?, b"three\r");
        assert_eq!(src.read_line()?, b"four\r");
        assert!(src.read_line()?.is_empty());
        Ok(())
    }

    #[test]
    fn seek_variants() -> Result<(), SourceError> {
        let mut src = MemorySource::new(vec![0; 16]);
        assert_eq!(src.seek(SeekPos::Start(4))?, 4);
        assert_eq!(src.seek(SeekPos::Current(-2))?, 2);
        assert_eq!(src.seek(SeekPos::End(-1))?, 15);
        assert!(src.seek(SeekPos::Current(-20)).is_err());
        Ok(())
    }

    #[test]
    fn sub_sources_have_independent_cursors() -> Result<(), SourceError> {
        let mut parent = MemorySource::new(b"0123456789".to_vec());
        parent.seek(SeekPos::Start(1))?;

        let mut child = parent.sub_source(ByteRange::new(3, 7))?;
        assert_eq!(child.len(), 4);
        assert_eq!(child.read(10)?, b"3456");
        assert_eq!(parent.position(), 1);

        let mut grandchild = child.sub_source(ByteRange::new(1, 3))?;
        assert_eq!(grandchild.read(10)?, b"45");

        assert!(parent.sub_source(ByteRange { start: 5, end: 11 }).is_err());
        Ok(())
    }
}
