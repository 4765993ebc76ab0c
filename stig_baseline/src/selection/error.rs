use super::checkpoint::CheckpointError;

/// Selection walk errors
#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    /// Operator ended input; the checkpoint stays on disk for a later resume
    #[error("Cancelled by operator")]
    Cancelled,

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error("Prompt I/O failure: {message}")]
    Io { message: String },
}

impl From<std::io::Error> for SelectionError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}
