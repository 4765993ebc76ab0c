//! Up-front input validation
//!
//! Every filesystem argument is checked here before any archive is opened
//! or checkpoint touched, so a typo fails fast instead of surfacing as a
//! confusing mid-walk error.

use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum InputValidationError {
    #[error("Path does not exist: '{path}'")]
    NotFound { path: String },

    #[error("Path is not a regular file: '{path}'")]
    NotAFile { path: String },

    #[error("Path is not a directory: '{path}'")]
    NotADirectory { path: String },

    #[error("Expected a .zip archive: '{path}'")]
    NotAZipArchive { path: String },
}

impl InputValidationError {
    fn not_found(path: &Path) -> Self {
        Self::NotFound {
            path: path.display().to_string(),
        }
    }
}

/// Validate that `path` names an existing `.zip` archive file
pub fn validate_archive_path(path: &Path) -> Result<(), InputValidationError> {
    if !path.exists() {
        return Err(InputValidationError::not_found(path));
    }
    if !path.is_file() {
        return Err(InputValidationError::NotAFile {
            path: path.display().to_string(),
        });
    }
    let is_zip = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false);
    if !is_zip {
        return Err(InputValidationError::NotAZipArchive {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

/// Validate that `path` names an existing directory to write artifacts into
pub fn validate_output_dir(path: &Path) -> Result<(), InputValidationError> {
    if !path.exists() {
        return Err(InputValidationError::not_found(path));
    }
    if !path.is_dir() {
        return Err(InputValidationError::NotADirectory {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_path_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let missing = dir.path().join("nope.zip");
        assert_matches!(
            validate_archive_path(&missing),
            Err(InputValidationError::NotFound { .. })
        );
    }

    #[test]
    fn test_directory_is_not_an_archive() {
        let dir = TempDir::new().expect("tempdir");
        assert_matches!(
            validate_archive_path(dir.path()),
            Err(InputValidationError::NotAFile { .. })
        );
    }

    #[test]
    fn test_extension_must_be_zip() {
        let dir = TempDir::new().expect("tempdir");
        let tarball = dir.path().join("stig.tar");
        fs::write(&tarball, b"not a zip").expect("write");
        assert_matches!(
            validate_archive_path(&tarball),
            Err(InputValidationError::NotAZipArchive { .. })
        );

        let upper = dir.path().join("stig.ZIP");
        fs::write(&upper, b"zip-ish").expect("write");
        validate_archive_path(&upper).expect("case-insensitive extension");
    }

    #[test]
    fn test_output_dir_checks() {
        let dir = TempDir::new().expect("tempdir");
        validate_output_dir(dir.path()).expect("existing dir");

        let file = dir.path().join("plain.txt");
        fs::write(&file, b"x").expect("write");
        assert_matches!(
            validate_output_dir(&file),
            Err(InputValidationError::NotADirectory { .. })
        );
        assert_matches!(
            validate_output_dir(&dir.path().join("absent")),
            Err(InputValidationError::NotFound { .. })
        );
    }
}
