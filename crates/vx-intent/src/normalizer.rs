//! Utterance normalization.
//!
//! Transcribed speech arrives with arbitrary casing, stray punctuation and
//! politeness fillers. Everything downstream (rule patterns, log mining,
//! learned rules) keys on the normalized form produced here.

use std::sync::LazyLock;

use regex::Regex;

/// Words dropped wherever they stand alone.
pub const FILLER_WORDS: &[&str] = &["please", "the", "a", "an", "to"];

static FILLERS: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = FILLER_WORDS.join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b")).expect("filler regex is valid")
});

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[,!?;:"“”()\[\]]"#).expect("punctuation regex is valid"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// Canonicalize raw transcribed text into a matchable string.
///
/// Lower-cases, strips sentence punctuation (a `.` only when it ends a
/// word, so `google.com` survives), removes filler words on whole-word
/// boundaries and collapses whitespace. Empty or whitespace-only input
/// yields an empty string.
pub fn normalize(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let stripped = PUNCTUATION.replace_all(&lower, " ");

    let words: Vec<&str> = stripped
        .split_whitespace()
        .map(|w| w.trim_end_matches('.'))
        .filter(|w| !w.is_empty())
        .collect();
    let joined = words.join(" ");

    let without_fillers = FILLERS.replace_all(&joined, " ");
    WHITESPACE
        .replace_all(&without_fillers, " ")
        .trim()
        .to_string()
}
