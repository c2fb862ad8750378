//! Checking typed verb conjugations.

use std::collections::BTreeSet;

use crate::model::{ConjugationForm, Verb};

/// Normalizes Japanese input for comparison: trims, drops every whitespace
/// character (including the full-width space) and lowercases romaji.
#[must_use]
pub fn normalize_japanese_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// The conjugated text for `form`, if the verb has it.
#[must_use]
pub fn conjugation(verb: &Verb, form: ConjugationForm) -> Option<&str> {
    verb.conjugation(form).map(|c| c.text.as_str())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConjugationCheck {
    pub is_correct: bool,
    pub correct_answer: String,
}

/// Compares a typed answer against the expected conjugation.
///
/// Either the kanji spelling or the kana-only spelling is accepted, ignoring
/// whitespace and case. Returns `None` when the verb lacks `form`.
#[must_use]
pub fn check_conjugation(
    user_answer: &str,
    verb: &Verb,
    form: ConjugationForm,
) -> Option<ConjugationCheck> {
    let expected = verb.conjugation(form)?;
    let given = normalize_japanese_text(user_answer);

    let matches_text = !given.is_empty() && given == normalize_japanese_text(&expected.text);
    let matches_kana = expected
        .furigana
        .as_deref()
        .map(normalize_japanese_text)
        .is_some_and(|kana| !kana.is_empty() && kana == given);

    Some(ConjugationCheck {
        is_correct: matches_text || matches_kana,
        correct_answer: expected.text.clone(),
    })
}

/// Every form present in at least one verb, sorted.
#[must_use]
pub fn available_forms(verbs: &[Verb]) -> Vec<ConjugationForm> {
    verbs
        .iter()
        .flat_map(|v| v.conjugations.iter().map(|c| c.form))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
