// ABOUTME: Error types for jog encoding, conversion, and recomposition.
// ABOUTME: Variants map to the error taxonomy shared by the writer and decomposer.

use std::fmt;

/// The result type for jog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while encoding, decomposing, or recomposing values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A value cannot be encoded as a JSON element.
    Encoding(String),

    /// A sink write failed; the encode is aborted.
    Sink(String),

    /// A converter hook rejected its input.
    Converter(String),

    /// Simple-to-rich reconstruction failed: missing tag, unknown type
    /// name, or a factory error.
    Recompose(String),

    /// Builder misuse: a key was required, or forbidden, for the open frame.
    Builder(String),

    /// Recursion exceeded the configured depth limit.
    DepthExceeded,

    /// Custom error message (for serde integration).
    Custom(String),
}

impl Error {
    /// Create an `Encoding` error. Marked cold to help branch prediction.
    #[cold]
    #[inline(never)]
    pub fn encoding(msg: impl Into<String>) -> Self {
        Error::Encoding(msg.into())
    }

    /// Create a `Builder` misuse error. Marked cold to help branch prediction.
    #[cold]
    #[inline(never)]
    pub fn builder(msg: impl Into<String>) -> Self {
        Error::Builder(msg.into())
    }

    /// Create a `Converter` error. Marked cold to help branch prediction.
    #[cold]
    #[inline(never)]
    pub fn converter(msg: impl Into<String>) -> Self {
        Error::Converter(msg.into())
    }

    /// Create a `Recompose` error. Marked cold to help branch prediction.
    #[cold]
    #[inline(never)]
    pub fn recompose(msg: impl Into<String>) -> Self {
        Error::Recompose(msg.into())
    }

    /// Returns the stable taxonomy name for this error.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Encoding(_) => "encoding",
            Error::Sink(_) => "sink",
            Error::Converter(_) => "converter",
            Error::Recompose(_) => "recompose",
            Error::Builder(_) => "builder",
            Error::DepthExceeded => "depth_exceeded",
            Error::Custom(_) => "custom",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Encoding(msg) => write!(f, "encoding error: {msg}"),
            Error::Sink(msg) => write!(f, "sink error: {msg}"),
            Error::Converter(msg) => write!(f, "converter error: {msg}"),
            Error::Recompose(msg) => write!(f, "recompose error: {msg}"),
            Error::Builder(msg) => write!(f, "{msg}"),
            Error::DepthExceeded => write!(f, "maximum recursion depth exceeded"),
            Error::Custom(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Sink(err.to_string())
    }
}
