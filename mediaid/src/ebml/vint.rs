//! EBML variable-length integers.
//!
//! The count of leading zero bits in the first byte gives the total length:
//! `1xxxxxxx` is one byte, `01xxxxxx` two, down to `00000001` for eight.
//! Element IDs and sizes are both returned with the length marker removed.

use crate::utils::errors::VintError;

pub const MAX_VINT_LENGTH: usize = 8;

/// Encoded length announced by `first`. A zero byte has no marker and is
/// rejected.
#[inline]
pub fn vint_length(first: u8) -> Result<usize, VintError> {
    if first == 0 {
        return Err(VintError::ZeroLeadingByte);
    }
    Ok(first.leading_zeros() as usize + 1)
}

/// Decodes one vint from the start of `bytes`, returning the value and the
/// number of bytes consumed.
pub fn decode(bytes: &[u8]) -> Result<(u64, usize), VintError> {
    let Some(&first) = bytes.first() else {
        return Err(VintError::Incomplete {
            needed: 1,
            available: 0,
        });
    };

    let len = vint_length(first)?;
    if bytes.len() < len {
        return Err(VintError::Incomplete {
            needed: len,
            available: bytes.len(),
        });
    }

    let mut value = (first as u64) & (0xFF >> len);
    for &b in &bytes[1..len] {
        value = (value << 8) | b as u64;
    }

    Ok((value, len))
}

/// Signed vint as used by EBML lace deltas: the unsigned value shifted down
/// by half its range.
pub fn decode_signed(bytes: &[u8]) -> Result<(i64, usize), VintError> {
    let (raw, len) = decode(bytes)?;
    let bias = (1i64 << (7 * len - 1)) - 1;
    Ok((raw as i64 - bias, len))
}

/// Largest value that fits in `len` bytes.
#[inline]
pub fn max_value(len: usize) -> u64 {
    (1u64 << (7 * len)) - 1
}

/// All value bits set: the element size is unknown.
#[inline]
pub fn is_unknown_size(value: u64, len: usize) -> bool {
    value == max_value(len)
}

/// Encodes `value` in exactly `len` bytes.
pub fn encode(value: u64, len: usize) -> Result<Vec<u8>, VintError> {
    if !(1..=MAX_VINT_LENGTH).contains(&len) || value > max_value(len) {
        return Err(VintError::Overflow { value, len });
    }

    let mut out = value.to_be_bytes()[8 - len..].to_vec();
    out[0] |= 0x80 >> (len - 1);
    Ok(out)
}

/// Shortest encoding of `value` that is not the reserved all-ones pattern.
pub fn encode_min(value: u64) -> Result<Vec<u8>, VintError> {
    let len = (1..=MAX_VINT_LENGTH)
        .find(|&len| value < max_value(len))
        .ok_or(VintError::Overflow {
            value,
            len: MAX_VINT_LENGTH,
        })?;
    encode(value, len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_length_class_boundaries() {
        for len in 1..=MAX_VINT_LENGTH {
            for value in [0, 1, max_value(len) - 1, max_value(len)] {
                let encoded = encode(value, len).unwrap();
                assert_eq!(encoded.len(), len);
                assert_eq!(decode(&encoded).unwrap(), (value, len));
            }
            assert!(encode(max_value(len) + 1, len).is_err());
        }
    }

    #[test]
    fn zero_leading_byte_is_an_error() {
        assert_eq!(decode(&[0x00]), Err(VintError::ZeroLeadingByte));
        assert_eq!(decode(&[0x00, 0xFF, 0xFF]), Err(VintError::ZeroLeadingByte));
        assert_eq!(vint_length(0), Err(VintError::ZeroLeadingByte));
    }

    #[test]
    fn known_encodings() {
        assert_eq!(decode(&[0x81]).unwrap(), (1, 1));
        assert_eq!(decode(&[0x40, 0x02]).unwrap(), (2, 2));
        // EBML header ID with its marker removed.
        assert_eq!(decode(&[0x1A, 0x45, 0xDF, 0xA3]).unwrap(), (0x0A45DFA3, 4));
        assert_eq!(
            decode(&[0x40]),
            Err(VintError::Incomplete {
                needed: 2,
                available: 1
            })
        );
        assert!(is_unknown_size(0x7F, 1));
        assert!(is_unknown_size(0x00FF_FFFF_FFFF_FFFF, 8));
        assert_eq!(encode_min(0x7F).unwrap(), vec![0x40, 0x7F]);
    }

    #[test]
    fn signed_deltas() {
        assert_eq!(decode_signed(&[0xBF]).unwrap(), (0, 1));
        assert_eq!(decode_signed(&[0x80]).unwrap(), (-63, 1));
        assert_eq!(decode_signed(&[0x5F, 0xFF]).unwrap(), (0, 2));
        assert_eq!(decode_signed(&[0x60, 0x00]).unwrap(), (1, 2));
    }
}
