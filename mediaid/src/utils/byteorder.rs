use crate::utils::errors::ByteOrderError;

pub trait ReadBytesLe: Sized {
    fn read_le(src: &mut &[u8]) -> Result<Self, ByteOrderError>;
}

pub trait ReadBytesBe: Sized {
    fn read_be(src: &mut &[u8]) -> Result<Self, ByteOrderError>;
}

/// A header preceded by a four-character code.
pub trait Chunk: ReadBytesLe {
    const MAGIC: [u8; 4];

    /// Checks the magic and decodes the little-endian header after it.
    fn read_chunk(src: &mut &[u8]) -> Result<Self, ByteOrderError> {
        let found: [u8; 4] = ReadBytesLe::read_le(src)?;
        if found != Self::MAGIC {
            return Err(ByteOrderError::BadMagic {
                expected: Self::MAGIC,
                found,
            });
        }
        Self::read_le(src)
    }
}

#[inline]
fn take<'a>(src: &mut &'a [u8], n: usize) -> Result<&'a [u8], ByteOrderError> {
    if src.len() < n {
        return Err(ByteOrderError::ShortBuffer {
            expected: n,
            available: src.len(),
        });
    }
    let (head, tail) = src.split_at(n);
    *src = tail;
    Ok(head)
}

macro_rules! impl_num_le_be {
    ($($t:ty),+) => { $(
        impl ReadBytesLe for $t {
            #[inline]
            fn read_le(src: &mut &[u8]) -> Result<Self, ByteOrderError> {
                let mut raw = [0u8; size_of::<$t>()];
                raw.copy_from_slice(take(src, size_of::<$t>())?);
                Ok(<$t>::from_le_bytes(raw))
            }
        }
        impl ReadBytesBe for $t {
            #[inline]
            fn read_be(src: &mut &[u8]) -> Result<Self, ByteOrderError> {
                let mut raw = [0u8; size_of::<$t>()];
                raw.copy_from_slice(take(src, size_of::<$t>())?);
                Ok(<$t>::from_be_bytes(raw))
            }
        }
    )+ }
}

impl_num_le_be!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl<const N: usize> ReadBytesLe for [u8; N] {
    #[inline]
    fn read_le(src: &mut &[u8]) -> Result<Self, ByteOrderError> {
        let mut raw = [0u8; N];
        raw.copy_from_slice(take(src, N)?);
        Ok(raw)
    }
}

impl<const N: usize> ReadBytesBe for [u8; N] {
    #[inline]
    fn read_be(src: &mut &[u8]) -> Result<Self, ByteOrderError> {
        <[u8; N] as ReadBytesLe>::read_le(src)
    }
}

/// Big-endian unsigned integer of any width up to 8 bytes.
pub fn uint_be(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .take(8)
        .fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

/// Big-endian two's complement integer of any width up to 8 bytes.
pub fn int_be(bytes: &[u8]) -> i64 {
    let len = bytes.len().min(8);
    if len == 0 {
        return 0;
    }
    let raw = uint_be(&bytes[..len]);
    let shift = 64 - (len as u32) * 8;
    ((raw << shift) as i64) >> shift
}

/// IEEE float stored big-endian in 4 or 8 bytes. Other widths read as 0.
pub fn float_be(bytes: &[u8]) -> f64 {
    match bytes.len() {
        4 => f32::from_bits(uint_be(bytes) as u32) as f64,
        8 => f64::from_bits(uint_be(bytes)),
        _ => 0.0,
    }
}

/// Decodes `bytes` as text with trailing NULs removed.
pub fn trimmed_string(bytes: &[u8]) -> String {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Synchsafe integer: 7 significant bits per byte.
pub fn synchsafe(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .take(8)
        .fold(0u64, |acc, &b| (acc << 7) | (b & 0x7F) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaid_macros::{FromBytes, chunk_magic};

    #[chunk_magic(b"TEST")]
    #[derive(FromBytes, Debug)]
    struct Mini {
        a: u16,
        b: u32,
        guid: [u8; 2],
    }

    #[test]
    fn from_bytes_both_orders() {
        let raw = [0x34, 0x12, 0x01, 0xEF, 0xCD, 0xAB, b'O', b'K'];

        let le = Mini::read_le(&mut &raw[..]).unwrap();
        assert_eq!((le.a, le.b, le.guid), (0x1234, 0xABCDEF01, *b"OK"));

        let be = Mini::read_be(&mut &raw[..]).unwrap();
        assert_eq!((be.a, be.b), (0x3412, 0x01EFCDAB));
    }

    #[test]
    fn chunk_magic_is_checked() {
        let mut raw = b"TEST".to_vec();
        raw.extend_from_slice(&[1, 0, 2, 0, 0, 0, 0, 0]);
        let chunk = Mini::read_chunk(&mut &raw[..]).unwrap();
        assert_eq!((chunk.a, chunk.b), (1, 2));

        raw[0] = b'X';
        assert!(matches!(
            Mini::read_chunk(&mut &raw[..]),
            Err(ByteOrderError::BadMagic { .. })
        ));
        assert!(matches!(
            Mini::read_le(&mut &raw[..3]),
            Err(ByteOrderError::ShortBuffer { expected: 2, .. })
        ));
    }

    #[test]
    fn scalar_helpers() {
        assert_eq!(uint_be(&[0x01, 0x00]), 256);
        assert_eq!(int_be(&[0xFF, 0xFE]), -2);
        assert_eq!(int_be(&[0x7F]), 127);
        assert_eq!(float_be(&1.5f32.to_be_bytes()), 1.5);
        assert_eq!(float_be(&1000.0f64.to_be_bytes()), 1000.0);
        assert_eq!(trimmed_string(b"abc\0\0"), "abc");
        assert_eq!(synchsafe(&[0x00, 0x00, 0x02, 0x01]), 257);
    }
}
