//! Operator prompt seam
//!
//! The selection walk and profile synthesis talk to the operator through
//! the [`Prompter`] trait so interactive flows stay testable. The console
//! implementation blocks indefinitely on stdin; end-of-input is reported as
//! `None` and treated as cancellation by callers.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Blocking operator I/O
pub trait Prompter {
    /// Display informational text
    fn show(&mut self, text: &str);

    /// Ask a question and return the operator's trimmed answer, or `None`
    /// when input has ended
    fn ask(&mut self, message: &str) -> io::Result<Option<String>>;
}

/// Stdin/stdout prompter used by the CLI
#[derive(Debug, Default)]
pub struct ConsolePrompter;

impl Prompter for ConsolePrompter {
    fn show(&mut self, text: &str) {
        println!("{}", text);
    }

    fn ask(&mut self, message: &str) -> io::Result<Option<String>> {
        print!("{}", message);
        io::stdout().flush()?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }
}

/// Prompter that replays a fixed sequence of answers
///
/// Used by tests and by any non-interactive driver; returns `None` once the
/// script is exhausted.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    shown: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            shown: Vec::new(),
        }
    }

    /// Everything displayed so far, for assertions
    pub fn transcript(&self) -> &[String] {
        &self.shown
    }
}

impl Prompter for ScriptedPrompter {
    fn show(&mut self, text: &str) {
        self.shown.push(text.to_string());
    }

    fn ask(&mut self, message: &str) -> io::Result<Option<String>> {
        self.shown.push(message.to_string());
        Ok(self.answers.pop_front())
    }
}

/// Outcome of the accept/reject question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

/// Normalize an accept/reject answer; `None` means re-prompt
///
/// Empty input defaults to accept; otherwise a single letter matching Y or
/// N case-insensitively.
pub fn parse_decision(answer: &str) -> Option<Decision> {
    if answer.is_empty() {
        return Some(Decision::Accept);
    }
    if answer.eq_ignore_ascii_case("y") {
        return Some(Decision::Accept);
    }
    if answer.eq_ignore_ascii_case("n") {
        return Some(Decision::Reject);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_answer_accepts() {
        assert_eq!(parse_decision(""), Some(Decision::Accept));
    }

    #[test]
    fn test_single_letter_case_insensitive() {
        assert_eq!(parse_decision("y"), Some(Decision::Accept));
        assert_eq!(parse_decision("Y"), Some(Decision::Accept));
        assert_eq!(parse_decision("n"), Some(Decision::Reject));
        assert_eq!(parse_decision("N"), Some(Decision::Reject));
    }

    #[test]
    fn test_anything_else_reprompts() {
        assert_eq!(parse_decision("yes"), None);
        assert_eq!(parse_decision("no"), None);
        assert_eq!(parse_decision("x"), None);
        assert_eq!(parse_decision(" "), None);
    }

    #[test]
    fn test_scripted_prompter_exhaustion_is_eof() {
        let mut prompter = ScriptedPrompter::new(&["one"]);
        assert_eq!(prompter.ask("q1: ").expect("ask"), Some("one".to_string()));
        assert_eq!(prompter.ask("q2: ").expect("ask"), None);
    }
}
