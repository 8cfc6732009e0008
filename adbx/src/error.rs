//! Error types for adbx operations.

use std::string::FromUtf8Error;

/// Alias for `Result<T, adbx::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by device commands.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The host daemon answered a request with `FAIL`.
    #[error("request failed: {0}")]
    Fail(String),

    /// `pm clear` ran but did not report success.
    #[error("failed to clear {package}: {message}")]
    Clear {
        /// Package that was being cleared.
        package: String,
        /// Trimmed output of `pm clear`.
        message: String,
    },

    /// The daemon did not confirm restarting as root.
    #[error("root failed: {0}")]
    Root(String),

    /// The device did not finish booting before the deadline.
    #[error("timed out waiting for boot completion")]
    Timeout,

    /// The operation exists in the protocol but is not implemented here.
    #[error("{0} is not supported")]
    Unsupported(&'static str),

    /// A `reverse:list-forward` line did not have exactly three fields.
    #[error("malformed reverse entry: {line:?}")]
    MalformedReverse {
        /// The offending line.
        line: String,
    },

    /// Expected text but the device sent invalid UTF-8.
    #[error("response is not valid UTF-8")]
    Decode(#[from] FromUtf8Error),

    /// An I/O error from the connection layer.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` for failures worth retrying on a fresh connection.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Fail(_) | Self::Io(_))
    }
}
