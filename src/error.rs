//! Error handling.
//!
//! This is a private module. Its public items are re-exported by the crate
//! root.

use std::{error, fmt};


//------------ Error ---------------------------------------------------------

/// An error happened while reading encoded data.
///
/// Only two kinds of errors can happen. Either the encoded data did not
/// conform to the chosen encoding rules, in which case the error is of the
/// [`ErrorKind::MalformedEncoding`] kind, or the caller asked for something
/// that can never succeed no matter the input – say, a character string
/// with a tag number that isn’t a character string type – in which case it
/// is of the [`ErrorKind::InvalidArgument`] kind.
///
/// The error carries a message describing what exactly went wrong. This
/// message is only intended for human consumption, e.g., as part of logging
/// or a diagnostic trail, and you should not match on it.
pub struct Error {
    /// The kind of error.
    kind: ErrorKind,

    /// The human readable error message.
    msg: ErrorMessage,
}

impl Error {
    /// Creates a new error signalling non-conforming encoded data.
    pub fn malformed(msg: impl Into<ErrorMessage>) -> Self {
        Error {
            kind: ErrorKind::MalformedEncoding,
            msg: msg.into(),
        }
    }

    /// Creates a new error signalling caller-side misuse.
    pub fn invalid_arg(msg: impl Into<ErrorMessage>) -> Self {
        Error {
            kind: ErrorKind::InvalidArgument,
            msg: msg.into(),
        }
    }

    /// Returns the kind of the error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns whether the error describes a wire format violation.
    pub fn is_malformed(&self) -> bool {
        matches!(self.kind, ErrorKind::MalformedEncoding)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("msg", &format_args!("{}", &self.msg))
            .finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            ErrorKind::MalformedEncoding => write!(f, "malformed encoding")?,
            ErrorKind::InvalidArgument => write!(f, "invalid argument")?,
        }
        write!(f, ": {}", self.msg)
    }
}

impl error::Error for Error { }


//------------ ErrorKind -----------------------------------------------------

/// The two kinds of errors that can happen while reading.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The encoded data violates the chosen encoding rules.
    MalformedEncoding,

    /// The caller requested something that can never be satisfied.
    InvalidArgument,
}


//------------ ErrorMessage --------------------------------------------------

/// An error message for use with [`Error`].
///
/// This type is intended as an intermediary to make it possible to pass all
/// kinds of types as an error message without explicit conversion. Any type
/// `T` that should be usable as an error message should implement
/// `From<T> for ErrorMessage`. Alternatively, you can call
/// [`ErrorMessage::from_boxed`] for any boxed trait object of the standard
/// `Display` trait.
pub struct ErrorMessage {
    /// The actual yet hidden message.
    inner: ErrorMessageKind,
}

/// The actual error message as a hidden enum.
enum ErrorMessageKind {
    /// The error message is a static str.
    Static(&'static str),

    /// The error message is a boxed trait object.
    Boxed(Box<dyn fmt::Display + Send + Sync + 'static>),
}

impl ErrorMessage {
    /// Creates an error message from a static str.
    pub fn from_static(msg: &'static str) -> Self {
        ErrorMessage {
            inner: ErrorMessageKind::Static(msg)
        }
    }

    /// Creates an error message from a boxed trait object.
    pub fn from_boxed(
        msg: Box<dyn fmt::Display + Send + Sync + 'static>
    ) -> Self {
        ErrorMessage {
            inner: ErrorMessageKind::Boxed(msg)
        }
    }
}

impl From<&'static str> for ErrorMessage {
    fn from(msg: &'static str) -> Self {
        Self::from_static(msg)
    }
}

impl From<String> for ErrorMessage {
    fn from(msg: String) -> Self {
        Self::from_boxed(Box::new(msg))
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.inner {
            ErrorMessageKind::Static(msg) => f.write_str(msg),
            ErrorMessageKind::Boxed(ref msg) => msg.fmt(f),
        }
    }
}
