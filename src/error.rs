//! Error handling types.

/// Result type alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error produced while reading a Unity archive, serialized file, or object.
///
/// The variants mirror the failure taxonomy a caller needs to react to: a
/// [`Error::Truncated`] stream might be worth retrying once more data is
/// available, an [`Error::Unsupported`] format never will be, and
/// [`Error::Corrupt`] means an on-disk invariant was violated.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The stream ended before the expected data was fully read.
    #[error("unexpected end of stream")]
    Truncated,

    /// The data is a format, version, compression method, or URL scheme this
    /// crate does not (or cannot) implement.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// An on-disk framing invariant was violated (duplicate path ID,
    /// non-empty terminal string, a size mismatch, and so on).
    #[error("corrupt data: {0}")]
    Corrupt(String),

    /// A referenced archive or asset could not be located.
    #[error("not found: {0}")]
    NotFound(String),

    /// The data requires a decompression codec that isn't available.
    #[error("missing codec: {0}")]
    MissingCodec(String),

    /// An I/O error occurred reading the underlying byte source.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// An error occurred while parsing a fixed binary header.
    #[error(transparent)]
    BinRw(#[from] binrw::Error),
}

impl Error {
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    pub(crate) fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<std::io::ErrorKind> for Error {
    fn from(kind: std::io::ErrorKind) -> Self {
        if kind == std::io::ErrorKind::UnexpectedEof {
            Error::Truncated
        } else {
            Error::Io(kind.into())
        }
    }
}

/// Maps an I/O error into [`Error::Truncated`] when it's an EOF, and
/// [`Error::Io`] otherwise. [`std::io::Read::read_exact`] and friends both
/// report truncation this way, so call sites that want the spec's `Truncated`
/// taxonomy funnel their `io::Error` through this first.
pub(crate) fn io_to_truncated(err: std::io::Error) -> Error {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::Truncated
    } else {
        Error::Io(err)
    }
}
