//! Error and Result types.

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};

/// Boxed source error for the variants that wrap an arbitrary failure
/// (an adapter's `getraw`/`getquoted` implementation, a transport failure).
pub type BoxDynError = Box<dyn StdError + 'static + Send + Sync>;

/// A specialized `Result` type for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error taxonomy described by the parameter-binding core.
///
/// This is not a 1:1 mirror of a generic SQL driver error type: every
/// variant here corresponds to a specific failure mode named in the
/// component design (the query rewriter, the adapter registry, or the
/// execution adapter), not to a transport-level wire error.
#[derive(Debug)]
pub enum Error {
    /// Caller misuse: empty SQL, mixed placeholder styles, missing key,
    /// index out of range, named-cursor precondition violation, or a
    /// format-string arity mismatch detected during textual fallback.
    Programming(String),

    /// The connection's declared codec could not be resolved, or a
    /// string-like value could not be transcoded into it.
    Interface(String),

    /// Allocation failure mid-rewrite, or a buffer-size accounting
    /// mismatch between pass 1's estimate and pass 2's actual output.
    Internal(String),

    /// No adapter could produce a binding for a value's runtime type, or
    /// the adapter's `getraw` is unimplemented or non-progressing.
    Type(String),

    /// The requested operation has no backend support (surfaced by the
    /// result-handling collaborator, not originated here).
    NotSupported(String),

    /// An error was returned by, or while talking to, the transport layer.
    /// This crate does not originate these; it only relays them.
    Transport(BoxDynError),
}

impl Error {
    pub(crate) fn programming(message: impl Into<String>) -> Self {
        Error::Programming(message.into())
    }

    pub(crate) fn interface(message: impl Into<String>) -> Self {
        Error::Interface(message.into())
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }

    pub(crate) fn ty(message: impl Into<String>) -> Self {
        Error::Type(message.into())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Transport(error) => Some(&**error),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::Programming(message) => write!(f, "programming error: {}", message),
            Error::Interface(message) => write!(f, "interface error: {}", message),
            Error::Internal(message) => write!(f, "internal error: {}", message),
            Error::Type(message) => write!(f, "type error: {}", message),
            Error::NotSupported(message) => write!(f, "not supported: {}", message),
            Error::Transport(error) => write!(f, "transport error: {}", error),
        }
    }
}

impl From<std::fmt::Error> for Error {
    fn from(_: std::fmt::Error) -> Self {
        Error::Internal("write to in-memory buffer failed".into())
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(_: std::str::Utf8Error) -> Self {
        Error::Interface("result column is not valid UTF-8 text".into())
    }
}
