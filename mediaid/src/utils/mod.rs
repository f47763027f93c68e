//! Supporting infrastructure shared by the parsers.

pub mod bitstream_io;
pub mod byteorder;
pub mod errors;
pub mod playtime;
