//! Typed benchmark entities
//!
//! Immutable once constructed. Bound from the generic document tree by the
//! functions in the parent module; nothing here mutates after binding.

use serde::{Deserialize, Serialize};

/// Root aggregate for a parsed XCCDF benchmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    pub id: String,
    pub title: String,
    pub description: String,
    pub version: String,
    pub status: Status,
    pub plain_text: Vec<PlainText>,
    pub groups: Vec<Group>,
    pub profiles: Vec<Profile>,
}

/// Publication status carried on the benchmark root
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub text: String,
    pub date: String,
}

/// Free-form text blocks (release info, severity overrides) on the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlainText {
    pub id: String,
    pub text: String,
}

/// Container around exactly one rule, addressable by a stable id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub title: String,
    pub description: String,
    pub rule: Rule,
}

/// One hardening requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub severity: String,
    pub weight: String,
    pub version: String,
    pub title: String,
    pub description: String,
    pub check: Check,
    pub fix: Fix,
    pub fixtext: Fixtext,
}

/// Check logic attached to a rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub check_content: String,
}

/// Remediation reference id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub id: String,
}

/// Remediation text plus the fix it references
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixtext {
    pub text: String,
    pub fixref: String,
}

/// Named subset of groups, vendor-defined or synthesized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub title: String,
    pub description: String,
    pub selects: Vec<Select>,
}

/// Reference from a profile to a group, with the inclusion flag carried
/// literally from the source document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Select {
    pub idref: String,
    pub selected: String,
}

impl Benchmark {
    /// Locate a group by id
    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }
}
