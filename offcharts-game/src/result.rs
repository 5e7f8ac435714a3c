//! End-of-game summary and share text.
use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::constants::MAX_SCORE;
use crate::state::{GameMode, GameState, ScoreSet, SlotStatus, Variant};

/// Best answer of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestGuess {
    /// Adjective(s) of the category, joined with " + " for pairs.
    pub category: String,
    pub turn: usize,
    pub noun: String,
    pub scores: ScoreSet,
}

/// Complete summary of a game for reports and the result screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub date_key: String,
    pub variant: Variant,
    pub mode: GameMode,
    pub adjectives: Vec<String>,
    pub complete: bool,
    pub turns_played: usize,
    pub total_score: u32,
    pub max_score: u32,
    pub passes: usize,
    pub unscored: usize,
    pub perfect: usize,
    pub appeals_used: u8,
    pub best: Vec<Option<BestGuess>>,
}

fn score_cell(status: SlotStatus, scores: &ScoreSet) -> char {
    match status {
        SlotStatus::Passed => '⬜',
        SlotStatus::Empty | SlotStatus::Guessed => '❔',
        SlotStatus::Scored | SlotStatus::Appealed => {
            let low = scores.iter().copied().min().unwrap_or(0);
            match low {
                MAX_SCORE => '🔥',
                8..=9 => '🟩',
                5..=7 => '🟨',
                _ => '🟥',
            }
        }
    }
}

/// Build the summary for `state`, finished or not.
#[must_use]
pub fn summarize(state: &GameState) -> GameSummary {
    let per_guess = state.variant.scores_per_guess();
    let best = state
        .best_guesses()
        .into_iter()
        .enumerate()
        .map(|(category, turn)| {
            let turn = turn?;
            let guess = state.guess(turn)?;
            Some(BestGuess {
                category: state.category_adjectives(category).join(" + "),
                turn,
                noun: guess.noun.clone(),
                scores: guess.scores.clone(),
            })
        })
        .collect();

    let count = |wanted: SlotStatus| state.guesses.iter().filter(|g| g.status() == wanted).count();
    let turns_played = state
        .guesses
        .iter()
        .filter(|g| g.status() != SlotStatus::Empty)
        .count();
    let unscored = state
        .guesses
        .iter()
        .enumerate()
        .filter(|(turn, g)| g.status() == SlotStatus::Guessed && *turn != state.current_turn)
        .count();

    #[allow(clippy::cast_possible_truncation)]
    let max_score = (state.max_turns() * per_guess) as u32 * u32::from(MAX_SCORE);

    GameSummary {
        date_key: state.date_key.clone(),
        variant: state.variant,
        mode: state.mode,
        adjectives: state.adjectives.clone(),
        complete: state.is_complete(),
        turns_played,
        total_score: state.total_score(),
        max_score,
        passes: count(SlotStatus::Passed),
        unscored,
        perfect: state.guesses.iter().filter(|g| g.is_perfect()).count(),
        appeals_used: crate::constants::APPEALS_PER_GAME.saturating_sub(state.appeals_remaining),
        best,
    }
}

/// Spoiler-free text block for sharing a result: one cell per turn, one row per category.
#[must_use]
pub fn share_text(state: &GameState) -> String {
    let summary = summarize(state);
    let date = summary.date_key.get(..10).unwrap_or(summary.date_key.as_str());
    let mut out = format!(
        "Off the Charts {date} ({})\n{}/{}",
        summary.variant, summary.total_score, summary.max_score
    );
    if summary.appeals_used > 0 {
        out.push_str(" ⚖️");
    }
    for category in 0..state.variant.category_count() {
        out.push('\n');
        for turn in state.variant.category_turns(category) {
            if let Some(guess) = state.guess(turn) {
                out.push(score_cell(guess.status(), &guess.scores));
            }
        }
    }
    out
}

impl GameSummary {
    /// One-line description used by logs and console reports.
    #[must_use]
    pub fn headline(&self) -> String {
        let mut line = format!(
            "{} {}: {}/{}",
            self.date_key, self.variant, self.total_score, self.max_score
        );
        for best in self.best.iter().flatten() {
            let scores = best
                .scores
                .iter()
                .map(u8::to_string)
                .collect::<Vec<_>>()
                .join("/");
            let _ = write!(line, " | {}: {} ({scores})", best.category, best.noun);
        }
        line
    }
}
