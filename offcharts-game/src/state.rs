use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use thiserror::Error;

use crate::constants::{
    APPEALS_PER_GAME, GRID_ADJECTIVES, GRID_TURNS_PER_CATEGORY, MAX_SCORE, PAIR_ADJECTIVES,
    PAIR_TURNS, PASS_NOUN, PASS_SCORE,
};
use crate::daily::DailyPuzzle;
use crate::numbers::clamp_score;
use crate::validate::{GuessRejection, validate_answer};

/// One score per adjective a guess is graded against.
pub type ScoreSet = SmallVec<[u8; 2]>;
pub type ReasoningSet = SmallVec<[String; 2]>;

/// Game layout: one combined two-adjective category, or a 3x3 grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Two adjectives scored together over five turns.
    #[default]
    Pair,
    /// Three adjectives, three turns each, scored one adjective at a time.
    Grid,
}

impl Variant {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pair => "pair",
            Self::Grid => "grid",
        }
    }

    #[must_use]
    pub const fn adjective_count(self) -> usize {
        match self {
            Self::Pair => PAIR_ADJECTIVES,
            Self::Grid => GRID_ADJECTIVES,
        }
    }

    #[must_use]
    pub const fn turn_count(self) -> usize {
        match self {
            Self::Pair => PAIR_TURNS,
            Self::Grid => GRID_ADJECTIVES * GRID_TURNS_PER_CATEGORY,
        }
    }

    #[must_use]
    pub const fn category_count(self) -> usize {
        match self {
            Self::Pair => 1,
            Self::Grid => GRID_ADJECTIVES,
        }
    }

    #[must_use]
    pub const fn turns_per_category(self) -> usize {
        match self {
            Self::Pair => PAIR_TURNS,
            Self::Grid => GRID_TURNS_PER_CATEGORY,
        }
    }

    /// Number of scores recorded per guess.
    #[must_use]
    pub const fn scores_per_guess(self) -> usize {
        match self {
            Self::Pair => PAIR_ADJECTIVES,
            Self::Grid => 1,
        }
    }

    #[must_use]
    pub const fn category_of(self, turn: usize) -> usize {
        turn / self.turns_per_category()
    }

    #[must_use]
    pub const fn category_turns(self, category: usize) -> Range<usize> {
        let start = category * self.turns_per_category();
        start..start + self.turns_per_category()
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pair" => Ok(Self::Pair),
            "grid" => Ok(Self::Grid),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Daily,
    Debug,
}

/// Lifecycle of a single turn slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    Empty,
    /// Noun recorded, awaiting (or missing) a score.
    Guessed,
    Scored,
    Appealed,
    Passed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guess {
    pub noun: String,
    #[serde(default)]
    pub scores: ScoreSet,
    #[serde(default)]
    pub reasonings: ReasoningSet,
    #[serde(default)]
    pub appealed: bool,
    #[serde(default)]
    pub appeal_deltas: ScoreSet,
    #[serde(default)]
    pub appeal_reasoning: Option<String>,
    #[serde(default)]
    pub is_pass: bool,
}

impl Guess {
    fn passed() -> Self {
        Self {
            noun: PASS_NOUN.to_string(),
            scores: SmallVec::new(),
            is_pass: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn status(&self) -> SlotStatus {
        if self.is_pass {
            SlotStatus::Passed
        } else if self.noun.is_empty() {
            SlotStatus::Empty
        } else if self.scores.is_empty() {
            SlotStatus::Guessed
        } else if self.appealed {
            SlotStatus::Appealed
        } else {
            SlotStatus::Scored
        }
    }

    /// Sum of this guess's scores; zero for passes and unscored guesses.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.scores.iter().map(|s| u32::from(*s)).sum()
    }

    /// Per-adjective scores as displayed, with passes reading as zero.
    #[must_use]
    pub fn display_scores(&self, per_guess: usize) -> ScoreSet {
        if self.is_pass {
            return SmallVec::from_elem(PASS_SCORE, per_guess);
        }
        self.scores.clone()
    }

    #[must_use]
    pub fn is_perfect(&self) -> bool {
        !self.is_pass && !self.scores.is_empty() && self.scores.iter().all(|s| *s == MAX_SCORE)
    }
}

/// Grading returned by the scorer, already converted into game units.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScoreOutcome {
    pub scores: ScoreSet,
    pub reasonings: ReasoningSet,
    /// Position in the answer list that was sent to the scorer.
    pub favorite_index: Option<usize>,
}

/// Result of an appeal, already converted into game units.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppealOutcome {
    pub scores: ScoreSet,
    pub reasoning: String,
    pub accepted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("the game is already complete")]
    Complete,
    #[error("turn {0} is out of range")]
    TurnOutOfRange(usize),
    #[error("turn {0} is not the active turn")]
    NotCurrentTurn(usize),
    #[error("turn {0} is still waiting for a score")]
    AwaitingScore(usize),
    #[error("turn {turn} cannot be scored from state {status:?}")]
    NotScorable { turn: usize, status: SlotStatus },
    #[error("expected {expected} scores, got {got}")]
    ScoreShape { expected: usize, got: usize },
    #[error("no appeals remaining")]
    NoAppealsLeft,
    #[error("turn {turn} cannot be appealed from state {status:?}")]
    NotAppealable { turn: usize, status: SlotStatus },
    #[error(transparent)]
    Rejected(#[from] GuessRejection),
}

/// Complete per-session game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub mode: GameMode,
    pub variant: Variant,
    pub date_key: String,
    pub adjectives: Vec<String>,
    pub guesses: Vec<Guess>,
    pub current_turn: usize,
    pub appeals_remaining: u8,
    /// Model-reported favorite per category, as a turn index.
    #[serde(default)]
    pub favorites: Vec<Option<usize>>,
}

impl GameState {
    #[must_use]
    pub fn new(puzzle: &DailyPuzzle, mode: GameMode) -> Self {
        let variant = puzzle.variant;
        Self {
            mode,
            variant,
            date_key: puzzle.date_key.clone(),
            adjectives: puzzle.adjectives.clone(),
            guesses: vec![Guess::default(); variant.turn_count()],
            current_turn: 0,
            appeals_remaining: APPEALS_PER_GAME,
            favorites: vec![None; variant.category_count()],
        }
    }

    #[must_use]
    pub fn max_turns(&self) -> usize {
        self.variant.turn_count()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current_turn >= self.max_turns()
    }

    #[must_use]
    pub fn guess(&self, turn: usize) -> Option<&Guess> {
        self.guesses.get(turn)
    }

    #[must_use]
    pub fn status(&self, turn: usize) -> Option<SlotStatus> {
        self.guesses.get(turn).map(Guess::status)
    }

    #[must_use]
    pub fn current_category(&self) -> Option<usize> {
        (!self.is_complete()).then(|| self.variant.category_of(self.current_turn))
    }

    /// Adjectives a guess in `category` is graded against.
    #[must_use]
    pub fn category_adjectives(&self, category: usize) -> Vec<&str> {
        match self.variant {
            Variant::Pair => self.adjectives.iter().map(String::as_str).collect(),
            Variant::Grid => self
                .adjectives
                .get(category)
                .map(String::as_str)
                .into_iter()
                .collect(),
        }
    }

    /// Turns in the same category as `turn`, before it, that hold a real answer.
    #[must_use]
    pub fn prior_answer_turns(&self, turn: usize) -> Vec<usize> {
        let range = self.variant.category_turns(self.variant.category_of(turn));
        range
            .filter(|t| *t < turn)
            .filter(|t| {
                self.guesses
                    .get(*t)
                    .is_some_and(|g| matches!(g.status(), SlotStatus::Guessed | SlotStatus::Scored | SlotStatus::Appealed))
            })
            .collect()
    }

    /// Nouns sent to the scorer as history for `turn`.
    #[must_use]
    pub fn previous_nouns(&self, turn: usize) -> Vec<String> {
        self.prior_answer_turns(turn)
            .into_iter()
            .map(|t| self.guesses[t].noun.clone())
            .collect()
    }

    /// Record a noun for the active turn.
    ///
    /// # Errors
    ///
    /// Fails when the game is over, the active turn is awaiting its score, or
    /// the answer is rejected by validation.
    pub fn record_guess(&mut self, noun: &str) -> Result<usize, GameError> {
        if self.is_complete() {
            return Err(GameError::Complete);
        }
        let turn = self.current_turn;
        let status = self.guesses[turn].status();
        if status != SlotStatus::Empty {
            return Err(GameError::AwaitingScore(turn));
        }

        let category = self.variant.category_of(turn);
        let adjectives = self.category_adjectives(category);
        let range = self.variant.category_turns(category);
        let played = self.guesses[range].iter().map(|g| g.noun.as_str());
        let accepted = validate_answer(noun, played, &adjectives)?;

        self.guesses[turn].noun = accepted;
        Ok(turn)
    }

    /// Store a score for a guessed turn and advance past it.
    ///
    /// A perfect score locks its category: every remaining empty slot in that
    /// category becomes a pass.
    ///
    /// # Errors
    ///
    /// Fails if the turn does not exist, holds no pending guess, or the number
    /// of scores does not match the variant.
    pub fn apply_score(&mut self, turn: usize, outcome: ScoreOutcome) -> Result<(), GameError> {
        let status = self.status(turn).ok_or(GameError::TurnOutOfRange(turn))?;
        if status != SlotStatus::Guessed {
            return Err(GameError::NotScorable { turn, status });
        }
        let expected = self.variant.scores_per_guess();
        if outcome.scores.len() != expected {
            return Err(GameError::ScoreShape {
                expected,
                got: outcome.scores.len(),
            });
        }

        let favorite_turn = outcome.favorite_index.and_then(|index| {
            let mut listed = self.prior_answer_turns(turn);
            listed.push(turn);
            listed.get(index).copied()
        });

        let guess = &mut self.guesses[turn];
        guess.scores = outcome
            .scores
            .iter()
            .map(|s| clamp_score(i64::from(*s)))
            .collect();
        guess.reasonings = outcome.reasonings;
        guess.reasonings.resize(expected, String::new());

        let category = self.variant.category_of(turn);
        if let Some(favorite) = favorite_turn
            && let Some(slot) = self.favorites.get_mut(category)
        {
            *slot = Some(favorite);
        }

        self.lock_category_if_perfect(turn);
        self.advance_from(turn);
        Ok(())
    }

    /// Leave a guessed turn without a score (backend unavailable) and move on.
    ///
    /// # Errors
    ///
    /// Fails if the turn is not holding a pending guess.
    pub fn mark_unscored(&mut self, turn: usize) -> Result<(), GameError> {
        let status = self.status(turn).ok_or(GameError::TurnOutOfRange(turn))?;
        if status != SlotStatus::Guessed {
            return Err(GameError::NotScorable { turn, status });
        }
        self.advance_from(turn);
        Ok(())
    }

    /// Pass the active turn.
    ///
    /// # Errors
    ///
    /// Fails when the game is already complete or the active slot holds a
    /// pending guess.
    pub fn pass(&mut self) -> Result<bool, GameError> {
        if self.is_complete() {
            return Err(GameError::Complete);
        }
        self.pass_slot(self.current_turn)
    }

    /// Pass a specific slot. Passing an already-passed slot is a no-op and
    /// returns `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Fails for unknown turns, turns other than the active one, and slots
    /// that already hold a guess.
    pub fn pass_slot(&mut self, turn: usize) -> Result<bool, GameError> {
        let status = self.status(turn).ok_or(GameError::TurnOutOfRange(turn))?;
        match status {
            SlotStatus::Passed => return Ok(false),
            SlotStatus::Empty => {}
            SlotStatus::Guessed => return Err(GameError::AwaitingScore(turn)),
            SlotStatus::Scored | SlotStatus::Appealed => {
                return Err(GameError::NotScorable { turn, status });
            }
        }
        if turn != self.current_turn {
            return Err(GameError::NotCurrentTurn(turn));
        }
        self.guesses[turn] = Guess::passed();
        self.advance_from(turn);
        Ok(true)
    }

    /// Check whether `turn` may be appealed right now.
    ///
    /// # Errors
    ///
    /// Returns why the appeal is not allowed.
    pub fn check_appeal(&self, turn: usize) -> Result<(), GameError> {
        let status = self.status(turn).ok_or(GameError::TurnOutOfRange(turn))?;
        if self.appeals_remaining == 0 {
            return Err(GameError::NoAppealsLeft);
        }
        if status != SlotStatus::Scored {
            return Err(GameError::NotAppealable { turn, status });
        }
        Ok(())
    }

    /// Spend the appeal token on `turn`. Scores never decrease.
    ///
    /// # Errors
    ///
    /// Fails when no token remains, the slot is not a scored guess, or the
    /// score count does not match the variant.
    pub fn apply_appeal(&mut self, turn: usize, outcome: AppealOutcome) -> Result<(), GameError> {
        self.check_appeal(turn)?;
        let expected = self.variant.scores_per_guess();
        if outcome.scores.len() != expected {
            return Err(GameError::ScoreShape {
                expected,
                got: outcome.scores.len(),
            });
        }

        let guess = &mut self.guesses[turn];
        let mut deltas = ScoreSet::new();
        for (current, proposed) in guess.scores.iter_mut().zip(outcome.scores.iter()) {
            let raised = (*current).max(clamp_score(i64::from(*proposed)));
            deltas.push(raised - *current);
            *current = raised;
        }
        guess.appeal_deltas = deltas;
        guess.appeal_reasoning = Some(outcome.reasoning);
        guess.appealed = true;
        self.appeals_remaining = self.appeals_remaining.saturating_sub(1);

        self.lock_category_if_perfect(turn);
        self.skip_resolved();
        Ok(())
    }

    fn lock_category_if_perfect(&mut self, turn: usize) {
        if !self.guesses[turn].is_perfect() {
            return;
        }
        let range = self.variant.category_turns(self.variant.category_of(turn));
        for slot in &mut self.guesses[range] {
            if slot.status() == SlotStatus::Empty {
                *slot = Guess::passed();
            }
        }
    }

    fn advance_from(&mut self, turn: usize) {
        if turn == self.current_turn {
            self.current_turn += 1;
        }
        self.skip_resolved();
    }

    fn skip_resolved(&mut self) {
        while self.current_turn < self.max_turns()
            && self.guesses[self.current_turn].status() != SlotStatus::Empty
        {
            self.current_turn += 1;
        }
    }

    /// Whether every slot in a category is resolved or locked.
    #[must_use]
    pub fn is_category_closed(&self, category: usize) -> bool {
        self.variant
            .category_turns(category)
            .all(|t| self.guesses.get(t).is_none_or(|g| g.status() != SlotStatus::Empty))
    }

    /// Best guess of the combined `Pair` category: highest score sum, earliest wins ties.
    #[must_use]
    pub fn best_pair(&self) -> Option<usize> {
        let mut best: Option<(usize, u32)> = None;
        for (turn, guess) in self.guesses.iter().enumerate() {
            if guess.is_pass || guess.scores.len() != PAIR_ADJECTIVES {
                continue;
            }
            let total = guess.total();
            if best.is_none_or(|(_, top)| total > top) {
                best = Some((turn, total));
            }
        }
        best.map(|(turn, _)| turn)
    }

    /// Best guess in one category: highest score, the model favorite breaks
    /// ties when it names one of the tied guesses, otherwise earliest wins.
    #[must_use]
    pub fn best_in_category(&self, category: usize) -> Option<usize> {
        if self.variant == Variant::Pair {
            return self.best_pair();
        }
        let range = self.variant.category_turns(category);
        let scored: Vec<(usize, u32)> = range
            .filter_map(|t| {
                let guess = self.guesses.get(t)?;
                (!guess.is_pass && !guess.scores.is_empty()).then(|| (t, guess.total()))
            })
            .collect();
        let top = scored.iter().map(|(_, total)| *total).max()?;
        let tied: Vec<usize> = scored
            .iter()
            .filter(|(_, total)| *total == top)
            .map(|(t, _)| *t)
            .collect();
        let favorite = self.favorites.get(category).copied().flatten();
        match favorite {
            Some(turn) if tied.contains(&turn) => Some(turn),
            _ => tied.first().copied(),
        }
    }

    /// Best guess per category, in category order.
    #[must_use]
    pub fn best_guesses(&self) -> Vec<Option<usize>> {
        (0..self.variant.category_count())
            .map(|category| self.best_in_category(category))
            .collect()
    }

    /// Sum of every recorded score.
    #[must_use]
    pub fn total_score(&self) -> u32 {
        self.guesses.iter().map(Guess::total).sum()
    }
}
