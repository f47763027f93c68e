//! Bit-level reader used by the audio frame header parsers.

use std::io::Cursor;

use anyhow::Result;
use bitstream_io::{BigEndian, BitRead, BitReader, UnsignedInteger};

use crate::utils::errors::FormatError;

/// MSB-first reader over a fixed header buffer.
///
/// Running past the end of the buffer is reported as a truncated header
/// rather than a bare I/O error.
pub struct HeaderReader<'a> {
    bs: BitReader<Cursor<&'a [u8]>, BigEndian>,
    len_bits: u64,
}

impl<'a> HeaderReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            bs: BitReader::new(Cursor::new(buf)),
            len_bits: (buf.len() as u64) << 3,
        }
    }

    pub fn get(&mut self) -> Result<bool> {
        self.ensure(1)?;
        Ok(self.bs.read_bit()?)
    }

    pub fn get_n<I: UnsignedInteger>(&mut self, n: u32) -> Result<I> {
        self.ensure(n as u64)?;
        Ok(self.bs.read_unsigned_var(n)?)
    }

    /// Reads `n` whole bytes. The reader must be byte aligned.
    pub fn get_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        self.ensure((n as u64) << 3)?;
        let mut buf = vec![0; n];
        self.bs.read_bytes(&mut buf)?;
        Ok(buf)
    }

    pub fn position(&mut self) -> Result<u64> {
        Ok(self.bs.position_in_bits()?)
    }

    fn ensure(&mut self, bits: u64) -> Result<()> {
        let pos = self.position()?;
        if pos + bits > self.len_bits {
            return Err(FormatError::Truncated {
                expected: (pos + bits).div_ceil(8),
                found: self.len_bits >> 3,
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_fields_across_bytes() -> Result<()> {
        let mut reader = HeaderReader::new(&[0b1010_1100, 0xFF, 0x41, 0x42]);
        assert!(reader.get()?);
        assert_eq!(reader.get_n::<u8>(3)?, 0b010);
        assert_eq!(reader.get_n::<u16>(8)?, 0b1100_1111);
        assert_eq!(reader.get_n::<u8>(4)?, 0xF);
        assert_eq!(reader.position()?, 16);
        assert_eq!(reader.get_bytes(2)?, b"AB");
        Ok(())
    }

    #[test]
    fn short_header_is_truncated() {
        let mut reader = HeaderReader::new(&[0x0B, 0x77, 0x00]);
        let err = reader.get_n::<u32>(32).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Probably truncated file: expecting 4 bytes, found 3"
        );
    }
}
