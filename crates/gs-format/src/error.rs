//! Song parsing error types.

/// Error type for song parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SongError {
    /// Bad magic bytes or structurally invalid song data
    #[error("invalid song format: {0}")]
    InvalidFormat(String),
    /// Buffer ended before a field could be read
    #[error("song data truncated: needed {needed} bytes at offset {offset}")]
    TruncatedData { offset: usize, needed: usize },
    /// Subtune count exceeds the configured maximum
    #[error("too many subtunes: {count} (max {max})")]
    TooManySubtunes { count: usize, max: usize },
    /// Requested subtune does not exist
    #[error("no such subtune: {index} (song has {count})")]
    NoSuchSubtune { index: usize, count: usize },
}

impl SongError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        SongError::InvalidFormat(reason.into())
    }
}
