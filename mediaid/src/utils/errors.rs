/// Records `$err` as a warning on the session, or returns it as an error when
/// the session's fail level makes `$level` fatal.
#[macro_export]
macro_rules! log_or_err {
    ($session:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $session.fail_level() {
            return Err($err.into());
        } else {
            match $level {
                ::log::Level::Error => $session.error($err),
                ::log::Level::Warn => $session.warn($err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

#[derive(thiserror::Error, Debug)]
pub enum ByteOrderError {
    #[error("expected {expected} bytes, {available} available")]
    ShortBuffer { expected: usize, available: usize },

    #[error("expected \"{}\", found \"{}\"", String::from_utf8_lossy(.expected), String::from_utf8_lossy(.found))]
    BadMagic { expected: [u8; 4], found: [u8; 4] },
}

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("file is too large to be addressed on this platform ({0} bytes)")]
    TooLarge(u64),

    #[error("seek to {0} is outside the source")]
    SeekOutOfRange(i128),

    #[error("range {start}..{end} is outside the source (length {len})")]
    RangeOutOfBounds { start: u64, end: u64, len: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum VintError {
    #[error("invalid zero-byte element identifier")]
    ZeroLeadingByte,

    #[error("need {needed} bytes to decode variable-length integer, have {available}")]
    Incomplete { needed: usize, available: usize },

    #[error("value {value} does not fit in a {len}-byte variable-length integer")]
    Overflow { value: u64, len: usize },
}

#[derive(thiserror::Error, Debug)]
pub enum EbmlError {
    #[error("ran out of file at offset {0}")]
    OutOfData(u64),

    #[error("invalid element at offset {offset}: {source}")]
    BadVint { offset: u64, source: VintError },

    #[error("element data length {0} cannot be read into memory")]
    DataTooLarge(u64),

    #[error("Element {name} ({id:#X}) ends at {end} beyond parent end {parent_end}")]
    Overrun {
        name: String,
        id: u32,
        end: u64,
        parent_end: u64,
    },

    #[error("Element {name} header at offset {offset} runs past parent end {parent_end}")]
    HeaderOverrun {
        name: String,
        offset: u64,
        parent_end: u64,
    },

    #[error("Invalid SeekID at offset {offset}: {reason}")]
    BadSeekId { offset: u64, reason: String },

    #[error("Unexpected element {name} ({id:#X}) at offset {offset}")]
    Unexpected { name: String, id: u32, offset: u64 },

    #[error("invalid {what} at offset {offset}")]
    InvalidBlock { what: &'static str, offset: u64 },
}

#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    #[error("Expecting \"{expected}\" at offset {offset}, found \"{found}\"")]
    BadMagic {
        expected: String,
        offset: u64,
        found: String,
    },

    #[error("Remote files are not supported - please copy the file locally first")]
    RemoteFile,

    #[error("unable to determine file format")]
    UnknownFormat,

    #[error("{0}")]
    Unsupported(String),

    #[error("Probably truncated file: expecting {expected} bytes, found {found}")]
    Truncated { expected: u64, found: u64 },

    #[error("failed to read attachment data")]
    AttachmentRead,

    #[error("supplied path ({0}) does not exist, or is not writable")]
    AttachmentDir(String),
}
