//! Resumable walk checkpoint
//!
//! A small typed record persisted to a single file. The encoding is a
//! versioned line format: the `profile:`/`last:` markers, plus one `pref:`
//! line per recorded preference so an interrupted walk resumes with the
//! exact preferences already recorded. The whole record is rewritten (write
//! temp, rename) after every rule; there is no in-place field mutation.
//!
//! The store path is injected by the caller, never a module constant, so
//! concurrent test runs stay isolated.

use super::preference::Preference;
use std::fs;
use std::path::{Path, PathBuf};

const FORMAT_VERSION: u32 = 1;

/// Errors around checkpoint persistence
///
/// Corruption is fatal and never auto-repaired; the message tells the
/// operator to delete the file and restart.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("Checkpoint file '{path}' is corrupt ({detail}); delete it manually and rerun")]
    Corrupt { path: String, detail: String },

    #[error("Checkpoint I/O failure at '{path}': {message}")]
    Io { path: String, message: String },
}

/// Progress marker for the rule-by-rule walk
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    /// Zero-based index of the chosen profile
    pub profile: usize,
    /// Index of the last fully recorded rule; 0 also covers "none yet"
    pub last: usize,
    /// Preferences recorded so far, in walk order
    pub preferences: Vec<Preference>,
}

impl Checkpoint {
    /// Fresh checkpoint right after profile choice
    pub fn started(profile: usize) -> Self {
        Self {
            profile,
            last: 0,
            preferences: Vec::new(),
        }
    }

    /// Index the walk resumes at; a zero `last` restarts at the beginning
    pub fn resume_index(&self) -> usize {
        if self.last == 0 {
            0
        } else {
            self.last + 1
        }
    }
}

/// Single-writer, single-reader persistence for one checkpoint file
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Build a corruption error for this store's path
    pub fn corrupt(&self, detail: impl Into<String>) -> CheckpointError {
        CheckpointError::Corrupt {
            path: self.path.display().to_string(),
            detail: detail.into(),
        }
    }

    fn io_error(&self, err: &std::io::Error) -> CheckpointError {
        CheckpointError::Io {
            path: self.path.display().to_string(),
            message: err.to_string(),
        }
    }

    pub fn load(&self) -> Result<Checkpoint, CheckpointError> {
        let text = fs::read_to_string(&self.path).map_err(|e| self.io_error(&e))?;
        self.parse(&text)
    }

    pub fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let encoded = encode(checkpoint).map_err(|detail| self.corrupt(detail))?;
        let temp = self.path.with_extension("tmp");
        fs::write(&temp, encoded).map_err(|e| self.io_error(&e))?;
        fs::rename(&temp, &self.path).map_err(|e| self.io_error(&e))?;
        log::debug!(
            "checkpoint saved: profile {} last {} ({} preferences)",
            checkpoint.profile,
            checkpoint.last,
            checkpoint.preferences.len()
        );
        Ok(())
    }

    pub fn remove(&self) -> Result<(), CheckpointError> {
        fs::remove_file(&self.path).map_err(|e| self.io_error(&e))
    }

    fn parse(&self, text: &str) -> Result<Checkpoint, CheckpointError> {
        let mut version: Option<u32> = None;
        let mut profile: Option<usize> = None;
        let mut last: Option<usize> = None;
        let mut preferences: Vec<Preference> = Vec::new();

        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            let (marker, value) = line
                .split_once(':')
                .ok_or_else(|| self.corrupt(format!("unrecognized line '{}'", line)))?;
            match marker {
                "version" => {
                    version = Some(
                        value
                            .parse()
                            .map_err(|_| self.corrupt(format!("bad version '{}'", value)))?,
                    );
                }
                "profile" => {
                    profile = Some(
                        value
                            .parse()
                            .map_err(|_| self.corrupt(format!("bad profile marker '{}'", value)))?,
                    );
                }
                "last" => {
                    last = Some(
                        value
                            .parse()
                            .map_err(|_| self.corrupt(format!("bad last marker '{}'", value)))?,
                    );
                }
                "pref" => {
                    let preference: Preference = serde_json::from_str(value)
                        .map_err(|e| self.corrupt(format!("bad preference record: {}", e)))?;
                    preferences.push(preference);
                }
                other => {
                    return Err(self.corrupt(format!("unknown marker '{}'", other)));
                }
            }
        }

        match version {
            Some(FORMAT_VERSION) => {}
            Some(v) => return Err(self.corrupt(format!("unsupported version {}", v))),
            None => return Err(self.corrupt("missing version marker")),
        }
        let profile = profile.ok_or_else(|| self.corrupt("missing profile marker"))?;
        let last = last.ok_or_else(|| self.corrupt("missing last marker"))?;

        // A non-zero last must cover exactly last+1 recorded preferences
        if last > 0 && preferences.len() != last + 1 {
            return Err(self.corrupt(format!(
                "last marker {} disagrees with {} recorded preferences",
                last,
                preferences.len()
            )));
        }
        if last == 0 && preferences.len() > 1 {
            return Err(self.corrupt(format!(
                "last marker 0 with {} recorded preferences",
                preferences.len()
            )));
        }

        Ok(Checkpoint {
            profile,
            last,
            preferences,
        })
    }
}

fn encode(checkpoint: &Checkpoint) -> Result<String, String> {
    let mut out = String::new();
    out.push_str(&format!("version:{}\n", FORMAT_VERSION));
    out.push_str(&format!("profile:{}\n", checkpoint.profile));
    out.push_str(&format!("last:{}\n", checkpoint.last));
    for preference in &checkpoint.preferences {
        let record = serde_json::to_string(preference)
            .map_err(|e| format!("unencodable preference: {}", e))?;
        out.push_str("pref:");
        out.push_str(&record);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn store_in(dir: &tempfile::TempDir) -> CheckpointStore {
        CheckpointStore::new(dir.path().join("walk.checkpoint"))
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);

        let checkpoint = Checkpoint {
            profile: 1,
            last: 2,
            preferences: vec![
                Preference::accepted("V-1", "one"),
                Preference::rejected("V-2", "two", "legacy system"),
                Preference::accepted("V-3", "three"),
            ],
        };
        store.save(&checkpoint).expect("save");
        assert!(store.exists());

        let loaded = store.load().expect("load");
        assert_eq!(loaded, checkpoint);
    }

    #[test]
    fn test_markers_present_in_encoding() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        store.save(&Checkpoint::started(2)).expect("save");

        let text = std::fs::read_to_string(store.path()).expect("read");
        assert!(text.contains("profile:2"));
        assert!(text.contains("last:0"));
        assert!(text.starts_with("version:1"));
    }

    #[test]
    fn test_missing_profile_marker_is_corrupt() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        std::fs::write(store.path(), "version:1\nlast:3\n").expect("write");
        assert_matches!(store.load(), Err(CheckpointError::Corrupt { .. }));
    }

    #[test]
    fn test_garbage_line_is_corrupt() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        std::fs::write(store.path(), "not a checkpoint at all").expect("write");
        assert_matches!(store.load(), Err(CheckpointError::Corrupt { .. }));
    }

    #[test]
    fn test_preference_count_mismatch_is_corrupt() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            "version:1\nprofile:0\nlast:4\npref:{\"id\":\"V-1\",\"rule_title\":\"t\",\"applicable\":true,\"rationale\":\"\"}\n",
        )
        .expect("write");
        assert_matches!(
            store.load(),
            Err(CheckpointError::Corrupt { ref detail, .. }) if detail.contains("disagrees")
        );
    }

    #[test]
    fn test_unsupported_version_is_corrupt() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        std::fs::write(store.path(), "version:9\nprofile:0\nlast:0\n").expect("write");
        assert_matches!(
            store.load(),
            Err(CheckpointError::Corrupt { ref detail, .. }) if detail.contains("version")
        );
    }

    #[test]
    fn test_remove_deletes_file() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(&dir);
        store.save(&Checkpoint::started(0)).expect("save");
        store.remove().expect("remove");
        assert!(!store.exists());
    }

    #[test]
    fn test_resume_index() {
        assert_eq!(Checkpoint::started(0).resume_index(), 0);
        let mid = Checkpoint {
            profile: 0,
            last: 4,
            preferences: vec![
                Preference::accepted("V-1", "a"),
                Preference::accepted("V-2", "b"),
                Preference::accepted("V-3", "c"),
                Preference::accepted("V-4", "d"),
                Preference::accepted("V-5", "e"),
            ],
        };
        assert_eq!(mid.resume_index(), 5);
    }
}
