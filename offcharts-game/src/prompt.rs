//! Grading prompt construction.
//!
//! Every prompt is a single system-role message. Answers are listed with
//! 1-based labels, prior answers first and the current answer last.

use std::fmt::Write;

use crate::constants::{FALLBACK_SCORE, MAX_SCORE, MIN_SCORE};

const RUBRIC: &str = "\
You are the judge of \"Off the Charts\", a word-association party game. \
Players name a thing (a noun or short noun phrase) that fits the given adjective. \
Score how strongly and how vividly the answer embodies the adjective.";

const CALIBRATION: &str = "\
Calibration:
- 1-2: no real connection, or the answer only works through wordplay.
- 3-4: a weak or generic fit that many things share.
- 5-6: a reasonable fit that most people would accept.
- 7-8: a strong, specific fit that people would nod at.
- 9: an excellent, memorable fit.
- 10: the definitive example; reserve it for answers nobody could top.
Most ordinary answers land between 4 and 7. Judge the thing itself, not the player's phrasing.";

fn progression_rule(per_adjective: bool) -> String {
    let scope = if per_adjective {
        "Apply this separately for each adjective; each adjective can earn at most one bonus."
    } else {
        "At most one bonus applies."
    };
    format!(
        "Progression bonus: after scoring, add +1 if the CURRENT answer is strictly better \
         than every previous answer for that adjective. {scope} The bonus never stacks and a \
         score never exceeds {MAX_SCORE}. The first answer never earns the bonus."
    )
}

fn answer_list(previous: &[String], noun: &str) -> String {
    let mut out = String::new();
    for (index, earlier) in previous.iter().enumerate() {
        let _ = writeln!(out, "#{}. {}", index + 1, earlier.trim());
    }
    let _ = write!(out, "#{}. {} (current answer)", previous.len() + 1, noun.trim());
    out
}

fn appeal_rules() -> String {
    format!(
        "Appeal rules:
- Read the player's argument in good faith. Raise the score if the argument reveals a fit you missed.
- Never lower a score. If unconvinced, return the original score unchanged.
- Scores stay between {MIN_SCORE} and {MAX_SCORE}.
- Set \"accepted\" to true only if you raised at least one score."
    )
}

/// Prompt grading one answer against two adjectives at once.
#[must_use]
pub fn pair_score_prompt(
    adjective1: &str,
    adjective2: &str,
    noun: &str,
    previous: &[String],
) -> String {
    let answers = answer_list(previous, noun);
    let bonus = progression_rule(true);
    format!(
        "{RUBRIC}

This round has two adjectives: \"{adjective1}\" (adjective 1) and \"{adjective2}\" (adjective 2).
Score the current answer against each adjective independently, from {MIN_SCORE} to {MAX_SCORE}.

{CALIBRATION}

Answers so far:
{answers}

{bonus}

Respond with JSON only, no markdown:
{{\"score1\": <integer>, \"reasoning1\": \"<one short sentence>\", \"score2\": <integer>, \"reasoning2\": \"<one short sentence>\"}}
If unsure, use {FALLBACK_SCORE}."
    )
}

/// Prompt grading one answer against a single adjective.
#[must_use]
pub fn single_score_prompt(
    adjective: &str,
    noun: &str,
    previous: &[String],
    category_hint: Option<&str>,
) -> String {
    let answers = answer_list(previous, noun);
    let bonus = progression_rule(false);
    let hint = category_hint
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(|h| format!("\nPlayers were nudged with the hint \"{h}\"; it is a suggestion, not a requirement.\n"))
        .unwrap_or_default();
    format!(
        "{RUBRIC}

The adjective is \"{adjective}\". Score the current answer from {MIN_SCORE} to {MAX_SCORE}.
{hint}
{CALIBRATION}

Answers so far:
{answers}

{bonus}

If two or more answers share the top score for this adjective, name your favorite of them by its label number in \"favoriteIndex\"; otherwise use null.

Respond with JSON only, no markdown:
{{\"score\": <integer>, \"reasoning\": \"<one short sentence>\", \"favoriteIndex\": <label number or null>}}"
    )
}

/// Prompt re-judging a pair score in light of a player's appeal.
#[must_use]
pub fn pair_appeal_prompt(
    adjective1: &str,
    adjective2: &str,
    noun: &str,
    original: (u8, u8),
    original_reasoning: Option<&str>,
    appeal_text: &str,
) -> String {
    let reasoning = original_reasoning.unwrap_or("(not provided)");
    let rules = appeal_rules();
    format!(
        "{RUBRIC}

A player is appealing the score for the answer \"{noun}\".
Adjective 1: \"{adjective1}\", original score {first}/{MAX_SCORE}.
Adjective 2: \"{adjective2}\", original score {second}/{MAX_SCORE}.
Original reasoning: {reasoning}

The player's appeal:
\"\"\"
{appeal}
\"\"\"

{rules}

Respond with JSON only, no markdown:
{{\"newScore1\": <integer>, \"newScore2\": <integer>, \"reasoning\": \"<one or two sentences addressed to the player>\", \"accepted\": <true|false>}}",
        first = original.0,
        second = original.1,
        appeal = appeal_text.trim(),
    )
}

/// Prompt re-judging a single-adjective score in light of a player's appeal.
#[must_use]
pub fn single_appeal_prompt(
    adjective: &str,
    noun: &str,
    original: u8,
    original_reasoning: Option<&str>,
    appeal_text: &str,
) -> String {
    let reasoning = original_reasoning.unwrap_or("(not provided)");
    let rules = appeal_rules();
    format!(
        "{RUBRIC}

A player is appealing the score for the answer \"{noun}\" against the adjective \"{adjective}\".
Original score: {original}/{MAX_SCORE}.
Original reasoning: {reasoning}

The player's appeal:
\"\"\"
{appeal}
\"\"\"

{rules}

Respond with JSON only, no markdown:
{{\"newScore\": <integer>, \"reasoning\": \"<one or two sentences addressed to the player>\", \"accepted\": <true|false>}}",
        appeal = appeal_text.trim(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_are_labelled_in_order() {
        let previous = vec!["glue".to_string(), "tape".to_string()];
        let prompt = pair_score_prompt("sticky", "nostalgic", "honey", &previous);
        let glue = prompt.find("#1. glue").unwrap();
        let tape = prompt.find("#2. tape").unwrap();
        let honey = prompt.find("#3. honey (current answer)").unwrap();
        assert!(glue < tape && tape < honey);
        assert!(prompt.contains("\"score1\""));
        assert!(prompt.contains("Progression bonus"));
    }

    #[test]
    fn first_answer_is_label_one() {
        let prompt = single_score_prompt("spooky", "attic", &[], None);
        assert!(prompt.contains("#1. attic (current answer)"));
        assert!(prompt.contains("favoriteIndex"));
        assert!(!prompt.contains("nudged"));
    }

    #[test]
    fn hint_is_embedded_when_present() {
        let prompt = single_score_prompt("spooky", "attic", &[], Some(" a place "));
        assert!(prompt.contains("hint \"a place\""));
    }

    #[test]
    fn appeal_prompts_forbid_lowering() {
        let pair = pair_appeal_prompt("a", "b", "noun", (6, 4), None, "please");
        assert!(pair.contains("Never lower a score"));
        assert!(pair.contains("original score 6/10"));
        assert!(pair.contains("original score 4/10"));
        assert!(pair.contains("(not provided)"));

        let single = single_appeal_prompt("a", "noun", 3, Some("meh"), "  hear me out ");
        assert!(single.contains("Original score: 3/10."));
        assert!(single.contains("hear me out\n"));
        assert!(single.contains("\"newScore\""));
    }
}
