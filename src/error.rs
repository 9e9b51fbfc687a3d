//! Error types for the relay server

use std::io;

/// Errors surfaced by the relay server
///
/// Per-subscriber delivery failures never show up here; they are handled
/// inside the broadcaster by dropping the subscriber.
#[derive(Debug)]
pub enum Error {
    /// Socket or listener I/O error
    Io(io::Error),
    /// A bind address could not be parsed
    InvalidAddress(String),
    /// Server configuration is unusable
    InvalidConfig(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::InvalidAddress(addr) => write!(f, "Invalid bind address: {}", addr),
            Error::InvalidConfig(reason) => write!(f, "Invalid configuration: {}", reason),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

/// Result alias for relay operations
pub type Result<T> = std::result::Result<T, Error>;
