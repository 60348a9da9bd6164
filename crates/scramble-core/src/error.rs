use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors surfaced by LFSR construction, polynomial library loading, and the
/// descrambler driver.
#[derive(Debug)]
pub enum Error {
    /// A tap exponent was outside the valid range `[1, 63]`.
    InvalidTap { tap: u32 },
    /// A tap list had no entries.
    EmptyTapList,
    /// The correlator was asked to run against a zero-length frame.
    EmptyFrame,
    /// A file read or write failed.
    Io { path: PathBuf, source: io::Error },
    /// A polynomial database line was not a CSV list of unsigned integers.
    MalformedPolyLine { line: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidTap { tap } => write!(f, "invalid tap exponent {tap} (must be in [1, 63])"),
            Error::EmptyTapList => write!(f, "tap list must not be empty"),
            Error::EmptyFrame => write!(f, "correlator input frame must not be empty"),
            Error::Io { path, source } => write!(f, "I/O error on {}: {source}", path.display()),
            Error::MalformedPolyLine { line } => {
                write!(f, "malformed polynomial database line: {line:?}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
