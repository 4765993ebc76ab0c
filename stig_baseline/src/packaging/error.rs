/// Artifact packaging errors
#[derive(Debug, thiserror::Error)]
pub enum PackagingError {
    #[error("Archive name '{name}' does not follow the DISA STIG packaging convention")]
    BadArchiveName { name: String },

    #[error("Benchmark document has no top-level Profile element to anchor the insertion")]
    NoProfileAnchor,

    #[error("Archive entry '{entry}' not found in '{archive}'")]
    MissingEntry { entry: String, archive: String },

    #[error("No '*-ansible.zip' entry found in '{archive}'")]
    AnsibleArchiveNotFound { archive: String },

    #[error("XML failure: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Archive failure: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O failure at '{path}': {message}")]
    Io { path: String, message: String },
}

impl PackagingError {
    pub fn io(path: impl std::fmt::Display, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.to_string(),
            message: err.to_string(),
        }
    }

    pub fn missing_entry(entry: &str, archive: impl std::fmt::Display) -> Self {
        Self::MissingEntry {
            entry: entry.to_string(),
            archive: archive.to_string(),
        }
    }
}
