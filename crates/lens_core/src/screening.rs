//! crates/lens_core/src/screening.rs
//!
//! Screens chat input for several questions packed into one message.
//! The assistant answers one question per request, so such input is answered
//! locally with guidance instead of being sent to the backend.

use regex::Regex;
use std::sync::OnceLock;

/// Sent back as the assistant's turn when the screen fires.
pub const MULTI_QUESTION_GUIDANCE: &str = "It looks like you asked more than one question at once. \
I work best with one question at a time, so please send your questions separately and I'll answer each of them.";

/// A numbered-list marker such as `1.` or `"2.`, at the start of a line or
/// after sentence-ending punctuation, with or without spaces around it.
/// A digit after the period makes it a number (`1.5`), not a marker, and
/// punctuation right after a digit (`2.0.`) does not start a marker either.
fn numbered_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)(?:^\s*|(?:^|[^\d])[.!?]\s*)["'“‘]?\d+\.(?:[^\d]|$)"#)
            .expect("numbered marker pattern is valid")
    })
}

/// Two question marks with something other than `?` between them.
/// A run like `???` is emphasis and does not match.
fn separated_question_marks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\?[^?]+\?").expect("question mark pattern is valid"))
}

/// Returns `true` when the input looks like more than one question.
pub fn has_multiple_questions(input: &str) -> bool {
    numbered_marker().is_match(input) || separated_question_marks().is_match(input)
}
