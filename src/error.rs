//! Error type shared by every codec stage.

use thiserror::Error;

/// Errors raised while compressing or decompressing sparse data.
///
/// Every error is local to a single call. Nothing is retried and a
/// corrupt payload is never decoded on a best-effort basis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompressionError {
    /// A value or parameter is outside its legal domain: non-finite floats,
    /// or a precision outside `{0} ∪ [2, 32]`.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// The host container broke its contract: positions not strictly
    /// increasing, out of bounds, or a dimension too large to address.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The encoded payload disagrees with its declared counts or widths.
    #[error("corrupt stream: {0}")]
    CorruptStream(String),

    /// The archive was never successfully built.
    #[error("archive is not valid")]
    InvalidArchive,
}

impl CompressionError {
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        Self::CorruptStream(msg.into())
    }
}
