//! Profile synthesis
//!
//! Turns the recorded preferences into the custom `Profile` entity and the
//! rationale record. Both are built once, after the full walk, and are
//! write-once outputs.

use crate::benchmark::{Profile, Select};
use crate::selection::{Preference, Prompter, SelectionError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "Custom title";
pub const DEFAULT_DESCRIPTION: &str = "Custom description";

/// One rejected rule with the operator's reasoning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RationaleItem {
    pub rule: String,
    pub title: String,
    pub rationale: String,
}

/// The record of all rejected rules and why, headed by the custom profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RationaleRecord {
    pub profile: String,
    pub items: Vec<RationaleItem>,
}

/// Build the custom profile from accepted preferences
///
/// The select list is exactly the accepted group ids, in recorded order;
/// rejected rules get no select at all. Title and description are prompted,
/// falling back to fixed placeholders when left blank.
pub fn build_custom_profile<P: Prompter>(
    prompter: &mut P,
    preferences: &[Preference],
) -> Result<Profile, SelectionError> {
    let selects: Vec<Select> = preferences
        .iter()
        .filter(|p| p.applicable)
        .map(|p| Select {
            idref: p.id.clone(),
            selected: "true".to_string(),
        })
        .collect();

    let title = prompt_with_default(prompter, "Title for your profile", DEFAULT_TITLE)?;
    let description =
        prompt_with_default(prompter, "Description for your profile", DEFAULT_DESCRIPTION)?;

    Ok(Profile {
        id: derive_profile_id(&title),
        title,
        description,
        selects,
    })
}

/// Build the rationale record for every rejected preference
pub fn build_rationale(custom_title: &str, preferences: &[Preference]) -> RationaleRecord {
    RationaleRecord {
        profile: custom_title.to_string(),
        items: preferences
            .iter()
            .filter(|p| !p.applicable)
            .map(|p| RationaleItem {
                rule: p.id.clone(),
                title: p.rule_title.clone(),
                rationale: p.rationale.clone(),
            })
            .collect(),
    }
}

/// Stable profile id derived from the title
pub fn derive_profile_id(title: &str) -> String {
    title.replace([' ', '-'], "_")
}

fn prompt_with_default<P: Prompter>(
    prompter: &mut P,
    label: &str,
    default: &str,
) -> Result<String, SelectionError> {
    let answer = prompter
        .ask(&format!("{} [{}]: ", label, default))?
        .ok_or(SelectionError::Cancelled)?;
    if answer.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::ScriptedPrompter;

    fn walked_preferences() -> Vec<Preference> {
        vec![
            Preference::accepted("V-1", "one"),
            Preference::rejected("V-2", "two", "Not applicable in this environment"),
            Preference::accepted("V-3", "three"),
            Preference::rejected("V-4", "four", "handled by vendor image"),
        ]
    }

    #[test]
    fn test_custom_profile_selects_only_accepted_in_order() {
        let mut prompter = ScriptedPrompter::new(&["Site baseline", "Our hardened set"]);
        let profile =
            build_custom_profile(&mut prompter, &walked_preferences()).expect("profile");

        let idrefs: Vec<&str> = profile.selects.iter().map(|s| s.idref.as_str()).collect();
        assert_eq!(idrefs, ["V-1", "V-3"]);
        assert!(profile.selects.iter().all(|s| s.selected == "true"));
        assert_eq!(profile.title, "Site baseline");
        assert_eq!(profile.description, "Our hardened set");
    }

    #[test]
    fn test_blank_answers_use_placeholders() {
        let mut prompter = ScriptedPrompter::new(&["", ""]);
        let profile =
            build_custom_profile(&mut prompter, &walked_preferences()).expect("profile");
        assert_eq!(profile.title, DEFAULT_TITLE);
        assert_eq!(profile.description, DEFAULT_DESCRIPTION);
        assert_eq!(profile.id, "Custom_title");
    }

    #[test]
    fn test_profile_id_replaces_spaces_and_hyphens() {
        assert_eq!(derive_profile_id("RHEL-9 site baseline"), "RHEL_9_site_baseline");
    }

    #[test]
    fn test_rationale_keeps_only_rejections() {
        let record = build_rationale("Site baseline", &walked_preferences());
        assert_eq!(record.profile, "Site baseline");
        assert_eq!(record.items.len(), 2);
        assert_eq!(record.items[0].rule, "V-2");
        assert_eq!(record.items[0].rationale, "Not applicable in this environment");
        assert_eq!(record.items[1].rule, "V-4");
    }

    #[test]
    fn test_all_accepted_yields_empty_rationale() {
        let preferences = vec![
            Preference::accepted("V-1", "one"),
            Preference::accepted("V-2", "two"),
        ];
        let record = build_rationale("t", &preferences);
        assert!(record.items.is_empty());
    }
}
