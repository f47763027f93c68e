#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! Identifies media and container files from their leading bytes and walks
//! their internal structure to report duration, bitrate, codec parameters,
//! tags and embedded attachments.
//!
//! ### Pipeline
//!
//! 1. The input is opened as a [`source::ByteSource`], a file or a buffer.
//! 2. A leading ID3v2 tag is skipped and the format is sniffed.
//! 3. The format's parser fills its section of the [`report::Report`].
//!    Containers hand embedded streams to nested parsers, each over a
//!    source of its own.
//! 4. Comments are copied into `tags` and derived fields are computed.
//!
//! ### Matroska
//!
//! The EBML walker ([`ebml::ParseContext`]) yields elements lazily through
//! a read-ahead buffer, so clusters and attachments are never loaded whole.
//! Declared sizes that overrun their parent are clamped and reported.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mediaid::process::{Analyzer, Options};
//!
//! let analyzer = Analyzer::new(Options::default());
//! let report = analyzer.analyze_path("movie.mkv");
//!
//! if let Some(audio) = &report.audio {
//!     println!("{:?} Hz, {:?} channels", audio.sample_rate, audio.channels);
//! }
//! for error in &report.error {
//!     eprintln!("{error}");
//! }
//! ```

/// EBML decoding.
///
/// - **Variable-length integers** ([`ebml::vint`]): IDs and sizes
/// - **Element IDs** ([`ebml::ids`]): Matroska ID constants and names
/// - **Walker** ([`ebml::walker`]): Bounded element iteration over a source
pub mod ebml;

/// Format parsers, one per supported file type, plus the Matroska tree
/// builder.
pub mod formats;

/// Analysis pipeline.
///
/// - **Entry points** ([`process::analyze`]): Paths, buffers and sources
/// - **Sniffing** ([`process::sniff`]): Signature table and name fallback
/// - **Sub-parsers** ([`process::subparse`]): Embedded stream dispatch
/// - **Tags** ([`process::tags`]): Comment collection
/// - **Aggregation** ([`process::aggregate`]): Derived fields and clean-up
pub mod process;

/// The analysis result and its stream descriptors.
pub mod report;

/// Random-access byte sources over files and memory.
pub mod source;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bit-level reading
/// - **Byte order** ([`utils::byteorder`]): Fixed-layout header decoding
/// - **Error Handling** ([`utils::errors`]): Error types
/// - **Durations** ([`utils::playtime`]): Playtime formatting
pub mod utils;

pub use process::{Analyzer, AttachmentMode, Options};
pub use report::Report;
