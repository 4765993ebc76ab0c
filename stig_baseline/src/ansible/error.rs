/// Remediation-document errors
#[derive(Debug, thiserror::Error)]
pub enum AnsibleError {
    /// The shell-negation quoting transform touched a different number of
    /// lines than it found. Silent partial quoting would corrupt unrelated
    /// tasks, so the whole load is refused.
    #[error(
        "Quoting transform mismatch: {before} shell-negation lines found, {after} quoted lines produced; refusing to parse a partially quoted document"
    )]
    QuotingMismatch { before: usize, after: usize },

    #[error("Task document is not a YAML list: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O failure at '{path}': {message}")]
    Io { path: String, message: String },
}

impl AnsibleError {
    pub fn io(path: impl std::fmt::Display, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.to_string(),
            message: err.to_string(),
        }
    }
}
