//! Builds EBML byte strings for tests.

use crate::ebml::vint;

/// Encodes an ID stored without its marker at its natural width.
pub fn id_bytes(id: u32) -> Vec<u8> {
    vint::encode_min(id as u64).unwrap_or_default()
}

/// Element with a size field matching `payload`.
pub fn element(id: u32, payload: &[u8]) -> Vec<u8> {
    element_sized(id, payload.len() as u64, payload)
}

/// Element whose declared size may disagree with the payload that follows.
pub fn element_sized(id: u32, declared: u64, payload: &[u8]) -> Vec<u8> {
    let mut out = id_bytes(id);
    out.extend(vint::encode_min(declared).unwrap_or_default());
    out.extend_from_slice(payload);
    out
}

pub fn uint(id: u32, value: u64) -> Vec<u8> {
    let raw = value.to_be_bytes();
    let skip = raw.iter().take_while(|&&b| b == 0).count().min(7);
    element(id, &raw[skip..])
}

pub fn float(id: u32, value: f64) -> Vec<u8> {
    element(id, &value.to_be_bytes())
}

pub fn string(id: u32, value: &str) -> Vec<u8> {
    element(id, value.as_bytes())
}

pub fn master(id: u32, children: &[Vec<u8>]) -> Vec<u8> {
    element(id, &children.concat())
}
