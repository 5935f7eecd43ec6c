//! Error types for the module-cache index.
//!
//! Errors are classified into a small set of kinds: transient I/O failures
//! are skipped over by callers, permanent corruption triggers a full
//! rebuild, cancellation propagates unchanged, and anything else abandons
//! the current build while leaving the previous index in place.

use failure::{Backtrace, Context, Fail};
use std::fmt::{self, Display};
use std::io;

pub type Res<T> = Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    inner: Context<ErrorKind>,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        self.inner.get_context().clone()
    }
}

impl Fail for Error {
    fn cause(&self) -> Option<&dyn Fail> {
        self.inner.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        self.inner.backtrace()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: Context::new(kind),
        }
    }
}

impl From<Context<ErrorKind>> for Error {
    fn from(inner: Context<ErrorKind>) -> Error {
        Error { inner }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error {
            inner: e.context(ErrorKind::TransientIo),
        }
    }
}

impl ErrorKind {
    /// Wraps a lower-level cause with this kind, for call sites that have
    /// an error value richer than `io::Error`'s blanket conversion covers.
    pub fn with_cause<E: Fail>(self, cause: E) -> Error {
        Error {
            inner: cause.context(self),
        }
    }
}

/// `NoIndex` covers the reader's "no index yet" case; `PermanentCorruption`
/// covers its "format mismatch" and "corrupt" cases. The updater treats
/// `NoIndex` exactly like `PermanentCorruption`: both mean "proceed as a
/// full build".
#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum ErrorKind {
    /// A read or stat failed; the affected entity should be skipped and a
    /// warning logged by the caller.
    #[fail(display = "transient I/O error")]
    TransientIo,
    /// No pointer file exists yet under the index directory.
    #[fail(display = "no index has been built yet")]
    NoIndex,
    /// The index file's header is unparseable, or its format version does
    /// not match ours. Callers should behave as if no index exists.
    #[fail(display = "index file is corrupt or in an unrecognized format")]
    PermanentCorruption,
    /// The operation was cancelled through a `Cancel` token.
    #[fail(display = "operation cancelled")]
    Cancelled,
    /// Anything else encountered during a build; the run is abandoned.
    #[fail(display = "index build failed")]
    Unknown,
}

impl ErrorKind {
    pub fn is_cancelled(&self) -> bool {
        *self == ErrorKind::Cancelled
    }

    /// Kinds the Updater treats as "no usable prior index, fall back to a
    /// full build" rather than escalating to its caller.
    pub fn is_recoverable_by_full_build(&self) -> bool {
        matches!(
            self,
            ErrorKind::NoIndex | ErrorKind::PermanentCorruption | ErrorKind::TransientIo
        )
    }
}
