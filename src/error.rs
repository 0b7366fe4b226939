//! Library-wide error and result types.
//!
//! The patch entry points on [`crate::patcher::Patcher`] never surface these;
//! they are produced by NSO parsing, configuration loading and the platform
//! collaborators.

use std::fmt;
use std::io;

/// Result alias used throughout ldrpatch.
pub type Result<T> = std::result::Result<T, Error>;

/// All errors the library can produce.
#[derive(Debug)]
pub enum Error {
    /// A magic/signature field did not match the expected value.
    BadMagic,
    /// The stream ended before all expected bytes could be read.
    UnexpectedEof,
    /// An offset or size field would read or write outside the valid region.
    InvalidRange,
    /// A structural constraint was violated (message describes which one).
    Parse(&'static str),
    /// The input is well formed but uses something this build cannot handle.
    Unsupported(&'static str),
    /// A platform resource (SD card, mount, service) is not ready.
    Unavailable(&'static str),
    /// An underlying I/O operation failed.
    Io(io::Error),
    /// LZ4 decompression failed.
    #[cfg(feature = "compression")]
    Lz4,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BadMagic => write!(f, "bad magic value"),
            Error::UnexpectedEof => write!(f, "unexpected end of file"),
            Error::InvalidRange => write!(f, "invalid offset or size"),
            Error::Parse(s) => write!(f, "parse error: {s}"),
            Error::Unsupported(s) => write!(f, "unsupported: {s}"),
            Error::Unavailable(s) => write!(f, "unavailable: {s}"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "compression")]
            Error::Lz4 => write!(f, "lz4 decompression failed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Error::Io(e) = self {
            Some(e)
        } else {
            None
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::UnexpectedEof
        } else {
            Error::Io(e)
        }
    }
}
