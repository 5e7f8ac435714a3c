//! Client-side answer checks performed before any scoring call.

use thiserror::Error;

use crate::constants::{MAX_ANSWER_CHARS, PASS_NOUN};

/// Reasons an answer is refused before it reaches the scorer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuessRejection {
    #[error("answer is empty")]
    Empty,
    #[error("answer is longer than {max} characters")]
    TooLong { max: usize },
    #[error("\"{0}\" has already been played")]
    Duplicate(String),
    #[error("answer just repeats the category word \"{0}\"")]
    EchoesCategory(String),
    #[error("\"{PASS_NOUN}\" is reserved")]
    Reserved,
}

/// Lowercased, punctuation-free form used for comparisons.
#[must_use]
pub fn normalize(answer: &str) -> String {
    let cleaned: String = answer
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect();
    cleaned
        .split_whitespace()
        .map(singular)
        .collect::<Vec<_>>()
        .join(" ")
}

fn singular(word: &str) -> &str {
    const ES_ENDINGS: [&str; 5] = ["ses", "xes", "zes", "ches", "shes"];
    if word.len() > 4 && ES_ENDINGS.iter().any(|ending| word.ends_with(ending)) {
        return &word[..word.len() - 2];
    }
    if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        return &word[..word.len() - 1];
    }
    word
}

fn compact(normalized: &str) -> String {
    normalized.chars().filter(|c| !c.is_whitespace()).collect()
}

fn echoes(word: &str, adjective: &str) -> bool {
    word == adjective || (adjective.len() >= 5 && word.starts_with(adjective))
}

/// Validate a raw answer against earlier answers and the active category words.
///
/// Returns the trimmed answer on success.
///
/// # Errors
///
/// Returns a [`GuessRejection`] describing why the answer cannot be played.
pub fn validate_answer<'a>(
    answer: &str,
    previous: impl IntoIterator<Item = &'a str>,
    adjectives: &[&str],
) -> Result<String, GuessRejection> {
    let trimmed = answer.trim();
    if trimmed.is_empty() {
        return Err(GuessRejection::Empty);
    }
    if trimmed.chars().count() > MAX_ANSWER_CHARS {
        return Err(GuessRejection::TooLong {
            max: MAX_ANSWER_CHARS,
        });
    }
    if trimmed.eq_ignore_ascii_case(PASS_NOUN) {
        return Err(GuessRejection::Reserved);
    }

    let normalized = normalize(trimmed);
    if normalized.is_empty() {
        return Err(GuessRejection::Empty);
    }

    for adjective in adjectives {
        let adjective = normalize(adjective);
        if adjective.is_empty() {
            continue;
        }
        if normalized.split(' ').any(|word| echoes(word, &adjective))
            || compact(&normalized) == compact(&adjective)
        {
            return Err(GuessRejection::EchoesCategory(adjective));
        }
    }

    let packed = compact(&normalized);
    for earlier in previous {
        if earlier.eq_ignore_ascii_case(PASS_NOUN) {
            continue;
        }
        if compact(&normalize(earlier)) == packed {
            return Err(GuessRejection::Duplicate(earlier.to_string()));
        }
    }

    Ok(trimmed.to_string())
}
