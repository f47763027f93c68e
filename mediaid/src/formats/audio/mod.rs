//! Elementary audio stream parsers.
//!
//! Each one reads the header at the session's data offset and fills both its
//! own report section and the shared `audio` section. They double as
//! sub-parsers for tracks inside a container.

pub mod ac3;
pub mod dts;
pub mod flac;
pub mod mpeg;
pub mod vorbis;
