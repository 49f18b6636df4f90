//! Error management module

use std::fmt;

/// The error type used by this crate.
///
/// Sniffing itself never fails: malformed markup and unknown labels only mean
/// that the sniffed encoding is not changed. Errors are produced only when the
/// sniffer is misconfigured or when reading the document from an I/O source.
#[derive(Debug)]
pub enum Error {
    /// IO error
    Io(::std::io::Error),
    /// The byte budget of a sniffer was zero. At least one byte must be
    /// inspected to make a decision.
    InvalidMaxBytes,
}

impl From<::std::io::Error> for Error {
    /// Creates a new `Error::Io` from the given error
    #[inline]
    fn from(error: ::std::io::Error) -> Error {
        Error::Io(error)
    }
}

/// A specialized `Result` type where the error is hard-wired to [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::InvalidMaxBytes => f.write_str("the number of bytes to sniff must be positive"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::InvalidMaxBytes => None,
        }
    }
}
