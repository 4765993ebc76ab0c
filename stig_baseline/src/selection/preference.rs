use serde::{Deserialize, Serialize};

/// Minimum rationale length accepted for a rejected rule
pub const MIN_RATIONALE_CHARS: usize = 3;

/// Operator decision for one group, with rationale when rejected
///
/// The rule title is denormalized so reporting never has to walk back to
/// the benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preference {
    pub id: String,
    pub rule_title: String,
    pub applicable: bool,
    pub rationale: String,
}

impl Preference {
    /// An accepted rule; accepted preferences never carry a rationale
    pub fn accepted(id: impl Into<String>, rule_title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rule_title: rule_title.into(),
            applicable: true,
            rationale: String::new(),
        }
    }

    /// A rejected rule with the operator's rationale
    pub fn rejected(
        id: impl Into<String>,
        rule_title: impl Into<String>,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            rule_title: rule_title.into(),
            applicable: false,
            rationale: rationale.into(),
        }
    }
}

/// A rationale long enough to be recorded
pub fn rationale_is_acceptable(rationale: &str) -> bool {
    rationale.chars().count() >= MIN_RATIONALE_CHARS
}
