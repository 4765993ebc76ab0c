//! Interactive rule selection
//!
//! Drives profile choice and the per-rule accept/reject walk, persisting a
//! checkpoint after every recorded rule so an interrupted session resumes
//! where it left off instead of restarting.
//!
//! State machine: NotStarted -> ProfileChosen -> IteratingRules(i) ->
//! Completed. Profile choice writes a fresh checkpoint; each recorded rule
//! rewrites it; [`SelectionEngine::close`] deletes it once the walk is done.

pub mod checkpoint;
pub mod error;
pub mod preference;
pub mod prompt;

pub use checkpoint::{Checkpoint, CheckpointError, CheckpointStore};
pub use error::SelectionError;
pub use preference::{rationale_is_acceptable, Preference, MIN_RATIONALE_CHARS};
pub use prompt::{ConsolePrompter, Decision, Prompter, ScriptedPrompter};

use crate::benchmark::{Benchmark, Group, Profile};
use regex::Regex;
use std::sync::OnceLock;

static INLINE_TAG: OnceLock<Regex> = OnceLock::new();

pub struct SelectionEngine<P: Prompter> {
    prompter: P,
    store: CheckpointStore,
}

impl<P: Prompter> SelectionEngine<P> {
    pub fn new(prompter: P, store: CheckpointStore) -> Self {
        Self { prompter, store }
    }

    /// Borrow the prompter for follow-up interaction (profile synthesis)
    pub fn prompter_mut(&mut self) -> &mut P {
        &mut self.prompter
    }

    /// Choose the profile to walk
    ///
    /// Replays the checkpointed profile index when a checkpoint exists;
    /// otherwise prompts for a 1-based ordinal and writes a fresh
    /// checkpoint.
    pub fn choose_profile<'b>(
        &mut self,
        benchmark: &'b Benchmark,
    ) -> Result<&'b Profile, SelectionError> {
        if self.store.exists() {
            let recorded = self.store.load()?;
            let profile = benchmark.profiles.get(recorded.profile).ok_or_else(|| {
                self.store.corrupt(format!(
                    "profile marker {} exceeds {} available profiles",
                    recorded.profile,
                    benchmark.profiles.len()
                ))
            })?;
            log::info!(
                "resuming from checkpoint: profile '{}' last recorded index {}",
                profile.title,
                recorded.last
            );
            return Ok(profile);
        }

        self.prompter.show("Please select a profile below:\n");
        for (ordinal, profile) in benchmark.profiles.iter().enumerate() {
            self.prompter
                .show(&format!("[{}] {}", ordinal + 1, profile.title));
        }

        let index = loop {
            let answer = self
                .prompter
                .ask("\nSelection: ")?
                .ok_or(SelectionError::Cancelled)?;
            match answer.trim().parse::<usize>() {
                Ok(ordinal) if (1..=benchmark.profiles.len()).contains(&ordinal) => {
                    break ordinal - 1;
                }
                _ => {
                    self.prompter.show(&format!(
                        "Enter a number between 1 and {}.",
                        benchmark.profiles.len()
                    ));
                }
            }
        };

        self.store.save(&Checkpoint::started(index))?;
        Ok(&benchmark.profiles[index])
    }

    /// Resolve a profile's selects into groups, in select order
    ///
    /// Selects that do not resolve to any group are deliberately skipped;
    /// they are stale references, not an error here.
    pub fn filter_groups<'b>(benchmark: &'b Benchmark, profile: &Profile) -> Vec<&'b Group> {
        profile
            .selects
            .iter()
            .filter_map(|select| benchmark.group(&select.idref))
            .collect()
    }

    /// Walk every group from the resume point, recording one preference per
    /// rule and rewriting the checkpoint after each
    pub fn collect_preferences(
        &mut self,
        groups: &[&Group],
    ) -> Result<Vec<Preference>, SelectionError> {
        let recorded = self.store.load()?;
        let start = recorded.resume_index();
        if start > groups.len() || recorded.preferences.len() > groups.len() {
            return Err(self
                .store
                .corrupt(format!(
                    "recorded progress ({} rules) exceeds the {} selected groups",
                    recorded.preferences.len().max(start),
                    groups.len()
                ))
                .into());
        }

        let mut preferences = recorded.preferences;
        preferences.truncate(start);

        for (index, group) in groups.iter().enumerate().skip(start) {
            self.present_rule(group);

            let decision = self.ask_decision(index, groups.len())?;
            let preference = match decision {
                Decision::Accept => Preference::accepted(&group.id, &group.rule.title),
                Decision::Reject => {
                    let rationale = self.ask_rationale()?;
                    Preference::rejected(&group.id, &group.rule.title, rationale)
                }
            };
            preferences.push(preference);

            self.store.save(&Checkpoint {
                profile: recorded.profile,
                last: index,
                preferences: preferences.clone(),
            })?;
        }

        Ok(preferences)
    }

    /// Delete the checkpoint; call only after the walk completed
    pub fn close(&self) -> Result<(), CheckpointError> {
        self.store.remove()
    }

    fn present_rule(&mut self, group: &Group) {
        let rule = &group.rule;
        self.prompter.show(&format!(
            "Title: {} (severity: {}, weight: {})",
            rule.title, rule.severity, rule.weight
        ));
        self.prompter
            .show(&format!("\nDescription:\n{}", display_text(&rule.description)));
        self.prompter
            .show(&format!("\nMitigation:\n{}", display_text(&rule.fixtext.text)));
        self.prompter.show(&format!(
            "\nControl:\n{}",
            display_text(&rule.check.check_content)
        ));
    }

    fn ask_decision(&mut self, index: usize, total: usize) -> Result<Decision, SelectionError> {
        loop {
            let answer = self
                .prompter
                .ask(&format!(
                    "Do you accept this rule for scan? ({}/{}) [Y/n]: ",
                    index + 1,
                    total
                ))?
                .ok_or(SelectionError::Cancelled)?;
            if let Some(decision) = prompt::parse_decision(&answer) {
                return Ok(decision);
            }
        }
    }

    fn ask_rationale(&mut self) -> Result<String, SelectionError> {
        loop {
            let answer = self
                .prompter
                .ask(&format!(
                    "Provide rationale on why you do not want to implement this measure (at least {} chars): ",
                    MIN_RATIONALE_CHARS
                ))?
                .ok_or(SelectionError::Cancelled)?;
            if rationale_is_acceptable(&answer) {
                return Ok(answer);
            }
        }
    }
}

/// Clean rule text for terminal display
///
/// Expands literal `\n` escapes carried in the source document and drops
/// leftover inline markup tags. Display only; stored rule text is untouched.
pub fn display_text(raw: &str) -> String {
    let expanded = raw.replace("\\n", "\n");
    let pattern = INLINE_TAG.get_or_init(|| Regex::new("</?[A-Za-z]+>").expect("literal pattern"));
    pattern.replace_all(&expanded, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::{Check, Fix, Fixtext, Rule, Select, Status};
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn group(id: &str, title: &str) -> Group {
        Group {
            id: id.to_string(),
            title: format!("SRG-{}", id),
            description: String::new(),
            rule: Rule {
                id: format!("SV-{}", id),
                severity: "medium".to_string(),
                weight: "10.0".to_string(),
                version: String::new(),
                title: title.to_string(),
                description: "desc".to_string(),
                check: Check {
                    check_content: "check".to_string(),
                },
                fix: Fix::default(),
                fixtext: Fixtext {
                    text: "fix it".to_string(),
                    fixref: String::new(),
                },
            },
        }
    }

    fn benchmark_with(groups: Vec<Group>, profiles: Vec<Profile>) -> Benchmark {
        Benchmark {
            id: "bench".to_string(),
            title: "Test benchmark".to_string(),
            description: String::new(),
            version: "1".to_string(),
            status: Status::default(),
            plain_text: Vec::new(),
            groups,
            profiles,
        }
    }

    fn profile(id: &str, title: &str, idrefs: &[&str]) -> Profile {
        Profile {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            selects: idrefs
                .iter()
                .map(|idref| Select {
                    idref: idref.to_string(),
                    selected: "true".to_string(),
                })
                .collect(),
        }
    }

    fn two_profile_benchmark() -> Benchmark {
        benchmark_with(
            vec![group("V-1", "one"), group("V-2", "two"), group("V-3", "three")],
            vec![
                profile("p-low", "Low", &["V-1"]),
                profile("p-high", "High", &["V-1", "V-2", "V-3"]),
            ],
        )
    }

    #[test]
    fn test_choose_profile_by_ordinal() {
        let dir = tempdir().expect("tempdir");
        let store = CheckpointStore::new(dir.path().join("cp"));
        let benchmark = two_profile_benchmark();

        let mut engine = SelectionEngine::new(ScriptedPrompter::new(&["2"]), store.clone());
        let chosen = engine.choose_profile(&benchmark).expect("choose");
        assert_eq!(chosen.title, "High");

        let saved = store.load().expect("load");
        assert_eq!(saved.profile, 1);
        assert_eq!(saved.last, 0);
    }

    #[test]
    fn test_choose_profile_retries_invalid_input() {
        let dir = tempdir().expect("tempdir");
        let store = CheckpointStore::new(dir.path().join("cp"));
        let benchmark = two_profile_benchmark();

        let mut engine =
            SelectionEngine::new(ScriptedPrompter::new(&["zero", "9", "1"]), store.clone());
        let chosen = engine.choose_profile(&benchmark).expect("choose");
        assert_eq!(chosen.title, "Low");
    }

    #[test]
    fn test_choose_profile_replays_checkpoint() {
        let dir = tempdir().expect("tempdir");
        let store = CheckpointStore::new(dir.path().join("cp"));
        store.save(&Checkpoint::started(1)).expect("seed");
        let benchmark = two_profile_benchmark();

        // No answers scripted: the engine must not prompt at all
        let mut engine = SelectionEngine::new(ScriptedPrompter::new(&[]), store);
        let chosen = engine.choose_profile(&benchmark).expect("choose");
        assert_eq!(chosen.title, "High");
    }

    #[test]
    fn test_choose_profile_rejects_out_of_range_marker() {
        let dir = tempdir().expect("tempdir");
        let store = CheckpointStore::new(dir.path().join("cp"));
        store.save(&Checkpoint::started(7)).expect("seed");
        let benchmark = two_profile_benchmark();

        let mut engine = SelectionEngine::new(ScriptedPrompter::new(&[]), store);
        assert_matches!(
            engine.choose_profile(&benchmark),
            Err(SelectionError::Checkpoint(CheckpointError::Corrupt { .. }))
        );
    }

    #[test]
    fn test_filter_groups_resolves_in_select_order() {
        let benchmark = benchmark_with(
            vec![group("V-1", "one"), group("V-2", "two")],
            vec![profile("p", "P", &["V-2", "V-1"])],
        );
        let groups = SelectionEngine::<ScriptedPrompter>::filter_groups(
            &benchmark,
            &benchmark.profiles[0],
        );
        let ids: Vec<&str> = groups.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, ["V-2", "V-1"]);
    }

    #[test]
    fn test_filter_groups_skips_stale_selects() {
        let benchmark = benchmark_with(
            vec![group("V-1", "one")],
            vec![profile("p", "P", &["V-404", "V-1", "V-500"])],
        );
        let groups = SelectionEngine::<ScriptedPrompter>::filter_groups(
            &benchmark,
            &benchmark.profiles[0],
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, "V-1");
    }

    #[test]
    fn test_collect_accept_and_reject() {
        let dir = tempdir().expect("tempdir");
        let store = CheckpointStore::new(dir.path().join("cp"));
        store.save(&Checkpoint::started(0)).expect("seed");

        let groups = vec![group("V-1", "one"), group("V-2", "two")];
        let refs: Vec<&Group> = groups.iter().collect();

        // Accept first (empty answer), reject second with rationale
        let mut engine = SelectionEngine::new(
            ScriptedPrompter::new(&["", "n", "Not applicable in this environment"]),
            store,
        );
        let preferences = engine.collect_preferences(&refs).expect("collect");

        assert_eq!(preferences.len(), 2);
        assert!(preferences[0].applicable);
        assert_eq!(preferences[0].rationale, "");
        assert!(!preferences[1].applicable);
        assert_eq!(preferences[1].rationale, "Not applicable in this environment");
    }

    #[test]
    fn test_short_rationale_is_reprompted() {
        let dir = tempdir().expect("tempdir");
        let store = CheckpointStore::new(dir.path().join("cp"));
        store.save(&Checkpoint::started(0)).expect("seed");

        let groups = vec![group("V-1", "one")];
        let refs: Vec<&Group> = groups.iter().collect();

        let mut engine =
            SelectionEngine::new(ScriptedPrompter::new(&["N", "no", "covered elsewhere"]), store);
        let preferences = engine.collect_preferences(&refs).expect("collect");
        assert_eq!(preferences[0].rationale, "covered elsewhere");
    }

    #[test]
    fn test_unrecognized_decision_is_reprompted() {
        let dir = tempdir().expect("tempdir");
        let store = CheckpointStore::new(dir.path().join("cp"));
        store.save(&Checkpoint::started(0)).expect("seed");

        let groups = vec![group("V-1", "one")];
        let refs: Vec<&Group> = groups.iter().collect();

        let mut engine = SelectionEngine::new(ScriptedPrompter::new(&["maybe", "y"]), store);
        let preferences = engine.collect_preferences(&refs).expect("collect");
        assert!(preferences[0].applicable);
    }

    #[test]
    fn test_cancellation_preserves_checkpoint() {
        let dir = tempdir().expect("tempdir");
        let store = CheckpointStore::new(dir.path().join("cp"));
        store.save(&Checkpoint::started(0)).expect("seed");

        let groups = vec![group("V-1", "one"), group("V-2", "two")];
        let refs: Vec<&Group> = groups.iter().collect();

        // Answer the first rule, then the script runs out mid-walk
        let mut engine = SelectionEngine::new(ScriptedPrompter::new(&["y"]), store.clone());
        assert_matches!(
            engine.collect_preferences(&refs),
            Err(SelectionError::Cancelled)
        );

        let saved = store.load().expect("checkpoint survives");
        assert_eq!(saved.last, 0);
        assert_eq!(saved.preferences.len(), 1);
    }

    #[test]
    fn test_resumed_walk_matches_uninterrupted_walk() {
        let groups = vec![
            group("V-1", "one"),
            group("V-2", "two"),
            group("V-3", "three"),
            group("V-4", "four"),
            group("V-5", "five"),
            group("V-6", "six"),
        ];
        let refs: Vec<&Group> = groups.iter().collect();
        let answers = ["y", "n", "old kernel", "y", "y", "n", "vendor control", "y"];

        // Uninterrupted run
        let dir = tempdir().expect("tempdir");
        let full_store = CheckpointStore::new(dir.path().join("full"));
        full_store.save(&Checkpoint::started(0)).expect("seed");
        let mut full_engine = SelectionEngine::new(ScriptedPrompter::new(&answers), full_store);
        let uninterrupted = full_engine.collect_preferences(&refs).expect("collect");

        // Interrupted after rule index 4, resumed with the remaining answers
        let split_store = CheckpointStore::new(dir.path().join("split"));
        split_store.save(&Checkpoint::started(0)).expect("seed");
        let mut first_half = SelectionEngine::new(
            ScriptedPrompter::new(&["y", "n", "old kernel", "y", "y", "n", "vendor control"]),
            split_store.clone(),
        );
        assert_matches!(
            first_half.collect_preferences(&refs),
            Err(SelectionError::Cancelled)
        );
        assert_eq!(split_store.load().expect("load").last, 4);

        let mut second_half =
            SelectionEngine::new(ScriptedPrompter::new(&["y"]), split_store);
        let resumed = second_half.collect_preferences(&refs).expect("resume");

        assert_eq!(resumed, uninterrupted);
        assert_eq!(resumed.len(), refs.len());
    }

    #[test]
    fn test_close_removes_checkpoint() {
        let dir = tempdir().expect("tempdir");
        let store = CheckpointStore::new(dir.path().join("cp"));
        store.save(&Checkpoint::started(0)).expect("seed");

        let engine = SelectionEngine::new(ScriptedPrompter::new(&[]), store.clone());
        engine.close().expect("close");
        assert!(!store.exists());
    }

    #[test]
    fn test_display_text_cleanup() {
        let raw = "First line.\\nSecond <VulnDiscussion>inner</VulnDiscussion> text.";
        let cleaned = display_text(raw);
        assert_eq!(cleaned, "First line.\nSecond inner text.");
    }
}
