//! Benchmark model binding
//!
//! Binds the generic ordered document tree (see [`crate::tree`]) into the
//! typed entities in [`types`]. One binding function per entity keeps every
//! default and every required-field failure in a single place. Scalar fields
//! default to `""` when absent; the `Group`, `Profile` and `select` lists
//! are hard requirements.
//!
//! Cross-reference validation is a separate pass ([`validate_references`])
//! so the tolerant consumers that deliberately skip stale references can
//! keep doing so.

pub mod error;
pub mod types;

pub use error::ParseError;
pub use types::{Benchmark, Check, Fix, Fixtext, Group, PlainText, Profile, Rule, Select, Status};

use serde_json::Value;

/// Bind a decoded document tree into a `Benchmark`
pub fn bind_benchmark(document: &Value) -> Result<Benchmark, ParseError> {
    let root = document
        .get("Benchmark")
        .ok_or_else(|| ParseError::MissingDocumentRoot {
            field: "Benchmark".to_string(),
        })?;

    let groups = required_list(root, "Benchmark", "Group")?
        .into_iter()
        .map(bind_group)
        .collect::<Result<Vec<Group>, ParseError>>()?;

    let profiles = required_list(root, "Benchmark", "Profile")?
        .into_iter()
        .map(bind_profile)
        .collect::<Result<Vec<Profile>, ParseError>>()?;

    let plain_text = optional_list(root, "plain-text")
        .into_iter()
        .map(bind_plain_text)
        .collect();

    let benchmark = Benchmark {
        id: scalar(root, "@id"),
        title: scalar(root, "title"),
        description: scalar(root, "description"),
        version: scalar(root, "version"),
        status: bind_status(root.get("status")),
        plain_text,
        groups,
        profiles,
    };

    log::debug!(
        "bound benchmark '{}': {} groups, {} profiles",
        benchmark.id,
        benchmark.groups.len(),
        benchmark.profiles.len()
    );

    Ok(benchmark)
}

/// Enforce the Select -> Group invariant across every profile
///
/// An unresolvable `idref` is a defect in the source document, surfaced at
/// parse time rather than silently dropped.
pub fn validate_references(benchmark: &Benchmark) -> Result<(), ParseError> {
    for profile in &benchmark.profiles {
        for select in &profile.selects {
            if benchmark.group(&select.idref).is_none() {
                return Err(ParseError::UnresolvedSelect {
                    profile: profile.id.clone(),
                    idref: select.idref.clone(),
                });
            }
        }
    }
    Ok(())
}

fn bind_group(value: &Value) -> Result<Group, ParseError> {
    if !value.is_object() {
        return Err(ParseError::malformed_entry(
            "Benchmark",
            "Group",
            json_type_name(value),
        ));
    }

    let rule_value = value.get("Rule").unwrap_or(&Value::Null);

    Ok(Group {
        id: scalar(value, "@id"),
        title: scalar(value, "title"),
        description: scalar(value, "description"),
        rule: bind_rule(rule_value),
    })
}

fn bind_rule(value: &Value) -> Rule {
    Rule {
        id: scalar(value, "@id"),
        severity: scalar(value, "@severity"),
        weight: scalar(value, "@weight"),
        version: scalar(value, "version"),
        title: scalar(value, "title"),
        description: scalar(value, "description"),
        check: bind_check(value.get("check")),
        fix: bind_fix(value.get("fix")),
        fixtext: bind_fixtext(value.get("fixtext")),
    }
}

fn bind_check(value: Option<&Value>) -> Check {
    match value {
        Some(v) => Check {
            check_content: scalar(v, "check-content"),
        },
        None => Check::default(),
    }
}

fn bind_fix(value: Option<&Value>) -> Fix {
    match value {
        Some(v) => Fix {
            id: scalar(v, "@id"),
        },
        None => Fix::default(),
    }
}

fn bind_fixtext(value: Option<&Value>) -> Fixtext {
    match value {
        Some(v) => Fixtext {
            text: text_content(v),
            fixref: scalar(v, "@fixref"),
        },
        None => Fixtext::default(),
    }
}

fn bind_profile(value: &Value) -> Result<Profile, ParseError> {
    if !value.is_object() {
        return Err(ParseError::malformed_entry(
            "Benchmark",
            "Profile",
            json_type_name(value),
        ));
    }

    let selects = required_list(value, "Profile", "select")?
        .into_iter()
        .map(bind_select)
        .collect();

    Ok(Profile {
        id: scalar(value, "@id"),
        title: scalar(value, "title"),
        description: scalar(value, "description"),
        selects,
    })
}

fn bind_select(value: &Value) -> Select {
    Select {
        idref: scalar(value, "@idref"),
        selected: scalar(value, "@selected"),
    }
}

fn bind_status(value: Option<&Value>) -> Status {
    match value {
        Some(v) => Status {
            text: text_content(v),
            date: scalar(v, "@date"),
        },
        None => Status::default(),
    }
}

fn bind_plain_text(value: &Value) -> PlainText {
    PlainText {
        id: scalar(value, "@id"),
        text: text_content(value),
    }
}

/// Fetch a scalar field, defaulting to an empty string when absent
fn scalar(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        // Elements with attributes keep their text under #text
        Some(Value::Object(map)) => match map.get("#text") {
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        },
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Text of an element that may itself be a bare string or an attributed node
fn text_content(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("#text") {
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        },
        _ => String::new(),
    }
}

/// A required list field; a single occurrence decodes as a lone mapping and
/// is normalized to a one-element list
fn required_list<'a>(
    value: &'a Value,
    entity: &str,
    field: &str,
) -> Result<Vec<&'a Value>, ParseError> {
    match value.get(field) {
        Some(Value::Array(items)) => Ok(items.iter().collect()),
        Some(Value::Null) | None => Err(ParseError::missing_list(entity, field)),
        Some(single) => Ok(vec![single]),
    }
}

fn optional_list<'a>(value: &'a Value, field: &str) -> Vec<&'a Value> {
    match value.get(field) {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(single) => vec![single],
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
