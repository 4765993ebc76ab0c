//! Artifact packaging
//!
//! Patches the benchmark document with the synthesized profile and
//! repackages the vendor archive. The patch is a byte splice: the rendered
//! profile fragment is inserted at the position of the first pre-existing
//! top-level `Profile` element and every other byte of the document is left
//! untouched, so all namespace prefixes survive verbatim by construction.

pub mod error;
pub mod naming;

pub use error::PackagingError;
pub use naming::BenchmarkEntry;

use crate::benchmark::Profile;
use crate::synthesis::RationaleRecord;
use quick_xml::escape::escape;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::fs::{self, File};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

/// Read the benchmark document out of a vendor STIG archive
pub fn read_benchmark_entry(archive_path: &Path) -> Result<String, PackagingError> {
    let entry = naming::benchmark_entry(archive_path)?;
    let file = File::open(archive_path).map_err(|e| PackagingError::io(archive_path.display(), &e))?;
    let mut archive = ZipArchive::new(file)?;

    let entry_path = entry.entry_path();
    let mut stored = archive
        .by_name(&entry_path)
        .map_err(|_| PackagingError::missing_entry(&entry_path, archive_path.display()))?;
    let mut text = String::new();
    stored
        .read_to_string(&mut text)
        .map_err(|e| PackagingError::io(&entry_path, &e))?;
    Ok(text)
}

/// Insert the custom profile into the benchmark document
///
/// The fragment lands immediately before the first top-level element whose
/// local name is `Profile`. A document without one is structurally defective.
pub fn patch_benchmark_xml(original: &str, profile: &Profile) -> Result<String, PackagingError> {
    let offset = first_profile_offset(original)?.ok_or(PackagingError::NoProfileAnchor)?;

    let indent = line_indent(original, offset);
    let fragment = render_profile_fragment(profile, &indent);

    let mut patched = String::with_capacity(original.len() + fragment.len());
    patched.push_str(&original[..offset]);
    patched.push_str(&fragment);
    patched.push_str(&original[offset..]);
    Ok(patched)
}

/// Repackage the archive with the patched benchmark document
///
/// Every entry except the benchmark document is raw-copied, preserving its
/// bytes, name and metadata exactly. The patched entry is written at its
/// original position. Returns the output archive path.
pub fn repackage_archive(
    source: &Path,
    output_dir: &Path,
    patched_content: &str,
) -> Result<PathBuf, PackagingError> {
    let entry = naming::benchmark_entry(source)?;
    let target = entry.entry_path();

    let input = File::open(source).map_err(|e| PackagingError::io(source.display(), &e))?;
    let mut archive = ZipArchive::new(input)?;

    // Verified up front so a defective source never leaves a partial output
    // archive behind
    if !archive.file_names().any(|name| name == target) {
        return Err(PackagingError::missing_entry(&target, source.display()));
    }

    let out_path = output_dir.join(naming::custom_archive_name(source)?);
    let output = File::create(&out_path).map_err(|e| PackagingError::io(out_path.display(), &e))?;
    let mut writer = ZipWriter::new(output);

    for index in 0..archive.len() {
        let stored = archive.by_index_raw(index)?;
        if stored.name() == target {
            drop(stored);
            writer.start_file(target.as_str(), FileOptions::default())?;
            writer
                .write_all(patched_content.as_bytes())
                .map_err(|e| PackagingError::io(out_path.display(), &e))?;
        } else {
            writer.raw_copy_file(stored)?;
        }
    }
    writer.finish()?;

    log::info!("repackaged archive written to {}", out_path.display());
    Ok(out_path)
}

/// Serialize the rationale record, always overwriting any previous artifact
pub fn write_rationale(record: &RationaleRecord, path: &Path) -> Result<(), PackagingError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    let mut root = BytesStart::new("rationale");
    root.push_attribute(("profile", record.profile.as_str()));
    writer.write_event(Event::Start(root))?;

    for item in &record.items {
        let mut element = BytesStart::new("item");
        element.push_attribute(("rule", item.rule.as_str()));
        element.push_attribute(("title", item.title.as_str()));
        element.push_attribute(("rationale", item.rationale.as_str()));
        writer.write_event(Event::Empty(element))?;
    }

    writer.write_event(Event::End(BytesEnd::new("rationale")))?;

    fs::write(path, writer.into_inner()).map_err(|e| PackagingError::io(path.display(), &e))
}

/// Read the remediation tasks document from the nested `*-ansible.zip`
/// entry of a vendor archive
pub fn read_ansible_tasks(archive_path: &Path) -> Result<String, PackagingError> {
    let file = File::open(archive_path).map_err(|e| PackagingError::io(archive_path.display(), &e))?;
    let mut archive = ZipArchive::new(file)?;

    let nested_name = (0..archive.len())
        .filter_map(|i| archive.by_index_raw(i).ok().map(|f| f.name().to_string()))
        .find(|name| name.ends_with("-ansible.zip"))
        .ok_or_else(|| PackagingError::AnsibleArchiveNotFound {
            archive: archive_path.display().to_string(),
        })?;

    let mut nested_bytes = Vec::new();
    archive
        .by_name(&nested_name)
        .map_err(|_| PackagingError::missing_entry(&nested_name, archive_path.display()))?
        .read_to_end(&mut nested_bytes)
        .map_err(|e| PackagingError::io(&nested_name, &e))?;

    let mut nested = ZipArchive::new(Cursor::new(nested_bytes))?;
    let tasks_entry = naming::ansible_tasks_entry(&nested_name)?;
    let mut text = String::new();
    nested
        .by_name(&tasks_entry)
        .map_err(|_| PackagingError::missing_entry(&tasks_entry, &nested_name))?
        .read_to_string(&mut text)
        .map_err(|e| PackagingError::io(&tasks_entry, &e))?;
    Ok(text)
}

/// Byte offset of the first top-level Profile element, if any
fn first_profile_offset(document: &str) -> Result<Option<usize>, PackagingError> {
    let mut reader = Reader::from_str(document);
    let mut depth = 0usize;

    loop {
        let position = reader.buffer_position();
        match reader.read_event()? {
            Event::Start(start) => {
                if depth == 1 && local_name_is(&start, "Profile") {
                    return Ok(Some(position));
                }
                depth += 1;
            }
            Event::Empty(start) => {
                if depth == 1 && local_name_is(&start, "Profile") {
                    return Ok(Some(position));
                }
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

fn local_name_is(start: &BytesStart<'_>, expected: &str) -> bool {
    start.local_name().as_ref() == expected.as_bytes()
}

/// Whitespace prefix of the line containing `offset`
fn line_indent(document: &str, offset: usize) -> String {
    let line_start = document[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let prefix = &document[line_start..offset];
    if prefix.chars().all(|c| c == ' ' || c == '\t') {
        prefix.to_string()
    } else {
        String::new()
    }
}

/// Render the custom profile as an XML fragment aligned to `indent`
///
/// The fragment assumes the insertion point is already indented and ends
/// with a newline plus the same indent so the displaced element keeps its
/// original alignment.
fn render_profile_fragment(profile: &Profile, indent: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("<Profile id=\"{}\">\n", escape(&profile.id)));
    out.push_str(&format!(
        "{}  <title>{}</title>\n",
        indent,
        escape(&profile.title)
    ));
    out.push_str(&format!(
        "{}  <description>{}</description>\n",
        indent,
        escape(&profile.description)
    ));
    for select in &profile.selects {
        out.push_str(&format!(
            "{}  <select idref=\"{}\" selected=\"{}\"/>\n",
            indent,
            escape(&select.idref),
            escape(&select.selected)
        ));
    }
    out.push_str(&format!("{}</Profile>\n{}", indent, indent));
    out
}
