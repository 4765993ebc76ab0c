/// External evaluator errors
#[derive(Debug, thiserror::Error)]
pub enum ScapError {
    #[error("Evaluator '{program}' was not found on PATH; install OpenSCAP or pass an explicit program")]
    ProgramNotFound { program: String },

    #[error("Could not launch '{program}': {reason}")]
    Launch { program: String, reason: String },

    /// The tool ran and exited nonzero. Its own diagnostics are the only
    /// useful signal, so both streams are carried verbatim.
    #[error("External command failed (exit {code}): {command}\n--- stdout ---\n{stdout}\n--- stderr ---\n{stderr}")]
    ExternalToolFailure {
        command: String,
        code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("I/O failure at '{path}': {message}")]
    Io { path: String, message: String },
}

impl ScapError {
    pub fn io(path: impl std::fmt::Display, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.to_string(),
            message: err.to_string(),
        }
    }
}
