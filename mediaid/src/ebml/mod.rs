//! EBML primitives: variable-length integers, the element ID table and
//! the element walker.

pub mod ids;
pub mod vint;
pub mod walker;

#[cfg(test)]
pub(crate) mod writer;

pub use walker::{DataPolicy, Element, ParseContext};
