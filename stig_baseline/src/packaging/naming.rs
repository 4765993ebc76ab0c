//! DISA packaging naming convention
//!
//! The vendor ships `U_<product>_V<n>R<m>_STIG.zip` containing a folder
//! `U_<product>_V<n>R<m>_Manual_STIG` whose benchmark document is named
//! `U_<product>_STIG_V<n>R<m>_Manual-xccdf.xml`. These substitutions are a
//! contract with the vendor's packaging scheme; every path derivation lives
//! here and nowhere else.

use super::error::PackagingError;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

static VERSION_TOKEN: OnceLock<Regex> = OnceLock::new();

/// Location of the benchmark document inside a STIG archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkEntry {
    pub folder: String,
    pub file: String,
}

impl BenchmarkEntry {
    /// Full internal archive path, forward slashes per the zip format
    pub fn entry_path(&self) -> String {
        format!("{}/{}", self.folder, self.file)
    }
}

/// Derive the benchmark entry location from the archive's file name
pub fn benchmark_entry(archive_path: &Path) -> Result<BenchmarkEntry, PackagingError> {
    let name = archive_file_name(archive_path)?;
    let stem = name
        .strip_suffix(".zip")
        .ok_or_else(|| PackagingError::BadArchiveName {
            name: name.to_string(),
        })?;
    if !stem.contains("_STIG") {
        return Err(PackagingError::BadArchiveName {
            name: name.to_string(),
        });
    }

    let folder = stem.replace("_STIG", "_Manual_STIG");
    let flattened = folder.replace("_STIG", "-xccdf.xml");
    // The vendor moves the STIG marker ahead of the V<n>R<m> release token
    // in the document name
    let version = VERSION_TOKEN
        .get_or_init(|| Regex::new(r"_V(\d+)R(\d+)").expect("literal pattern"));
    let file = version
        .replace(&flattened, "_STIG_V${1}R${2}")
        .into_owned();

    Ok(BenchmarkEntry { folder, file })
}

/// Output name for the repackaged archive
pub fn custom_archive_name(archive_path: &Path) -> Result<String, PackagingError> {
    let name = archive_file_name(archive_path)?;
    match name.strip_suffix(".zip") {
        Some(stem) => Ok(format!("{}_custom.zip", stem)),
        None => Err(PackagingError::BadArchiveName {
            name: name.to_string(),
        }),
    }
}

/// Tasks document path inside a nested `*-ansible.zip` entry
pub fn ansible_tasks_entry(ansible_zip_name: &str) -> Result<String, PackagingError> {
    let base = ansible_zip_name
        .rsplit('/')
        .next()
        .unwrap_or(ansible_zip_name);
    let role = base
        .strip_suffix("-ansible.zip")
        .ok_or_else(|| PackagingError::BadArchiveName {
            name: base.to_string(),
        })?;
    Ok(format!("roles/{}/tasks/main.yml", role))
}

fn archive_file_name(archive_path: &Path) -> Result<&str, PackagingError> {
    archive_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PackagingError::BadArchiveName {
            name: archive_path.display().to_string(),
        })
}
