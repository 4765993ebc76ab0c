//! Remediation task filtering
//!
//! Loads the vendor's Ansible tasks document, drops the tasks for rejected
//! rules, and re-serializes in the target tool's style: mapping indent 2,
//! sequence indent 4, sequence offset 2, then a strip pass that removes the
//! fixed two-space prefix from continuation lines. The two-step
//! indent-then-strip matches Ansible's inconsistent native indentation for
//! top-level list items versus nested ones.

pub mod error;

pub use error::AnsibleError;

use crate::synthesis::RationaleRecord;
use regex::Regex;
use serde_yaml::Value;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

static NEGATION_LINE: OnceLock<Regex> = OnceLock::new();
static QUOTED_NEGATION_LINE: OnceLock<Regex> = OnceLock::new();
static TASK_NAME: OnceLock<Regex> = OnceLock::new();

fn negation_line() -> &'static Regex {
    NEGATION_LINE.get_or_init(|| Regex::new(r"(?m)(! systemctl.*)$").expect("literal pattern"))
}

fn quoted_negation_line() -> &'static Regex {
    QUOTED_NEGATION_LINE
        .get_or_init(|| Regex::new(r"(?m)'! systemctl[^']*'$").expect("literal pattern"))
}

fn task_name() -> &'static Regex {
    TASK_NAME.get_or_init(|| Regex::new(r"^stigrule_([0-9]+)_.*").expect("literal pattern"))
}

/// Quote bare `! systemctl ...` lines so they parse as YAML scalars
///
/// The count of candidate lines before the transform must equal the count
/// of quoted lines after it; any disagreement aborts the load.
pub fn quote_shell_negations(text: &str) -> Result<String, AnsibleError> {
    let before = negation_line().find_iter(text).count();
    let modified = negation_line().replace_all(text, "'${1}'").into_owned();
    let after = quoted_negation_line().find_iter(&modified).count();

    if before != after {
        return Err(AnsibleError::QuotingMismatch { before, after });
    }
    Ok(modified)
}

/// Parse the tasks document into a task list
pub fn load(text: &str) -> Result<Vec<Value>, AnsibleError> {
    let quoted = quote_shell_negations(text)?;
    let tasks: Vec<Value> = serde_yaml::from_str(&quoted)?;
    log::debug!("loaded {} remediation tasks", tasks.len());
    Ok(tasks)
}

/// Rule numbers to drop, derived from the rationale record
pub fn denylist(record: &RationaleRecord) -> Vec<String> {
    record
        .items
        .iter()
        .map(|item| {
            item.rule
                .strip_prefix("V-")
                .unwrap_or(&item.rule)
                .to_string()
        })
        .collect()
}

/// Drop tasks whose `stigrule_<number>_...` name is on the denylist
///
/// Tasks that do not follow the naming pattern are always retained, and
/// retained tasks keep their relative order.
pub fn filter_denied(tasks: Vec<Value>, denylist: &[String]) -> Vec<Value> {
    tasks
        .into_iter()
        .filter(|task| !is_denied(task, denylist))
        .collect()
}

fn is_denied(task: &Value, denylist: &[String]) -> bool {
    let name = match task.get("name").and_then(Value::as_str) {
        Some(name) => name,
        None => return false,
    };
    match task_name().captures(name) {
        Some(captures) => denylist.iter().any(|denied| denied == &captures[1]),
        None => false,
    }
}

/// Serialize the filtered tasks to a file
pub fn dump(tasks: &[Value], path: &Path) -> Result<(), AnsibleError> {
    let text = emit_tasks(tasks);
    fs::write(path, text).map_err(|e| AnsibleError::io(path.display(), &e))
}

/// Emit the task list in the target tool's indentation style
pub fn emit_tasks(tasks: &[Value]) -> String {
    let mut indented = String::new();
    // Sequence indent 4 puts top-level item content at column 4 with the
    // dash offset to column 2
    emit_sequence(&mut indented, tasks, 4);
    strip_continuation_indent(&indented)
}

/// Strip the fixed two-space prefix from continuation lines
///
/// Full-line comments and lines without the prefix are kept as-is.
pub fn strip_continuation_indent(text: &str) -> String {
    let mut out = String::new();
    for line in text.split_inclusive('\n') {
        let stripped = line.trim_start();
        if (!stripped.is_empty() && stripped.starts_with('#')) || !line.starts_with("  ") {
            out.push_str(line);
        } else {
            out.push_str(&line[2..]);
        }
    }
    out
}

fn pad(columns: usize) -> String {
    " ".repeat(columns)
}

fn emit_sequence(out: &mut String, items: &[Value], content_indent: usize) {
    let dash = pad(content_indent.saturating_sub(2));
    for item in items {
        match item {
            Value::Mapping(map) if !map.is_empty() => {
                let mut first = true;
                for (key, value) in map {
                    let prefix = if first {
                        format!("{}- ", dash)
                    } else {
                        pad(content_indent)
                    };
                    first = false;
                    emit_entry(out, &prefix, key, value, content_indent);
                }
            }
            Value::Sequence(nested) if !nested.is_empty() => {
                out.push_str(&format!("{}-\n", dash));
                emit_sequence(out, nested, content_indent + 4);
            }
            other => {
                out.push_str(&format!("{}- {}\n", dash, emit_scalar(other)));
            }
        }
    }
}

fn emit_mapping(out: &mut String, map: &serde_yaml::Mapping, indent: usize) {
    let prefix = pad(indent);
    for (key, value) in map {
        emit_entry(out, &prefix, key, value, indent);
    }
}

fn emit_entry(out: &mut String, prefix: &str, key: &Value, value: &Value, entry_indent: usize) {
    let key_text = emit_scalar(key);
    match value {
        Value::Mapping(map) if !map.is_empty() => {
            out.push_str(&format!("{}{}:\n", prefix, key_text));
            emit_mapping(out, map, entry_indent + 2);
        }
        Value::Sequence(items) if !items.is_empty() => {
            out.push_str(&format!("{}{}:\n", prefix, key_text));
            emit_sequence(out, items, entry_indent + 4);
        }
        Value::Mapping(_) => {
            out.push_str(&format!("{}{}: {{}}\n", prefix, key_text));
        }
        Value::Sequence(_) => {
            out.push_str(&format!("{}{}: []\n", prefix, key_text));
        }
        scalar => {
            out.push_str(&format!("{}{}: {}\n", prefix, key_text, emit_scalar(scalar)));
        }
    }
}

fn emit_scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => emit_string(s),
        Value::Tagged(tagged) => format!("{} {}", tagged.tag, emit_scalar(&tagged.value)),
        // Containers never reach here; entry emission handles them
        _ => String::new(),
    }
}

fn emit_string(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    if s.contains('\n') || s.contains('\\') || s.contains('"') {
        let mut escaped = String::with_capacity(s.len() + 2);
        escaped.push('"');
        for c in s.chars() {
            match c {
                '\\' => escaped.push_str("\\\\"),
                '"' => escaped.push_str("\\\""),
                '\n' => escaped.push_str("\\n"),
                '\t' => escaped.push_str("\\t"),
                other => escaped.push(other),
            }
        }
        escaped.push('"');
        return escaped;
    }
    if needs_single_quotes(s) {
        return format!("'{}'", s.replace('\'', "''"));
    }
    s.to_string()
}

fn needs_single_quotes(s: &str) -> bool {
    const RESERVED: [&str; 13] = [
        "true", "false", "null", "~", "yes", "no", "on", "off", "True", "False", "Null", "Yes",
        "No",
    ];

    let first = match s.chars().next() {
        Some(c) => c,
        None => return true,
    };
    if "!&*?|>%@`'\"#,[]{}".contains(first) {
        return true;
    }
    if s.starts_with("- ") || s == "-" || s.starts_with(": ") || s == ":" {
        return true;
    }
    if s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) {
        return true;
    }
    if s.contains(": ") || s.ends_with(':') || s.contains(" #") {
        return true;
    }
    if RESERVED.contains(&s) {
        return true;
    }
    looks_numeric(s)
}

/// Strings a YAML resolver could read back as a number
///
/// Covers decimal/float forms plus the hex, octal, infinity/NaN and
/// colon-separated sexagesimal spellings, so a string scalar never changes
/// type on a dump/load round trip.
fn looks_numeric(s: &str) -> bool {
    if s.parse::<f64>().is_ok() {
        return true;
    }
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    if let Some(digits) = unsigned.strip_prefix("0x").or_else(|| unsigned.strip_prefix("0X")) {
        return !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit());
    }
    if let Some(digits) = unsigned.strip_prefix("0o").or_else(|| unsigned.strip_prefix("0O")) {
        return !digits.is_empty() && digits.chars().all(|c| ('0'..='7').contains(&c));
    }
    if matches!(unsigned, ".inf" | ".Inf" | ".INF" | ".nan" | ".NaN" | ".NAN") {
        return true;
    }
    unsigned.contains(':')
        && unsigned
            .split(':')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}
