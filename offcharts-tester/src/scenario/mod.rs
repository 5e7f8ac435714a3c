use anyhow::{Result, bail};
use async_trait::async_trait;
use offcharts_game::{
    DailyPuzzle, GameMode, GameSession, GameState, SaveStore, ScoreService, TurnReport,
    validate_answer,
};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;
use std::path::PathBuf;

use crate::logic::JudgeBehavior;

pub mod resilience;
pub mod rules;
pub mod smoke;

/// Everything a scenario needs for one playthrough.
#[derive(Debug, Clone)]
pub struct ScenarioCtx {
    pub puzzle: DailyPuzzle,
    pub mode: GameMode,
    pub seed: u64,
    pub verbose: bool,
    pub save_dir: Option<PathBuf>,
}

impl ScenarioCtx {
    #[must_use]
    pub fn new(puzzle: DailyPuzzle, seed: u64) -> Self {
        let mode = if puzzle.date_key.starts_with("debug-") {
            GameMode::Debug
        } else {
            GameMode::Daily
        };
        Self {
            puzzle,
            mode,
            seed,
            verbose: false,
            save_dir: None,
        }
    }

    fn log(&self, message: &str) {
        if self.verbose {
            println!("     ↳ {message}");
        }
        log::debug!("[{} {}] {message}", self.puzzle.date_key, self.puzzle.variant);
    }
}

#[async_trait]
pub trait Scenario: Send + Sync {
    fn key(&self) -> &'static str;
    fn name(&self) -> &'static str;

    /// Scripted judge behavior used in logic mode.
    fn judge(&self) -> JudgeBehavior {
        JudgeBehavior::Fair
    }

    /// Whether the scenario's expectations hold against a live model.
    fn supports_http(&self) -> bool {
        false
    }

    /// Play one game and check its expectations, returning the final state.
    async fn play(&self, ctx: &ScenarioCtx, service: &dyn ScoreService) -> Result<GameState>;
}

const ANSWER_BANK: &[&str] = &[
    "honey",
    "volcano",
    "lighthouse",
    "jellyfish",
    "accordion",
    "cactus",
    "marshmallow",
    "submarine",
    "pinata",
    "glacier",
    "velvet",
    "thunderstorm",
    "origami",
    "tuba",
    "lava lamp",
    "chandelier",
    "mushroom",
    "skateboard",
    "typewriter",
    "compass",
    "hammock",
    "octopus",
    "saxophone",
    "pretzel",
    "telescope",
    "snow globe",
    "bonsai",
    "trampoline",
    "fossil",
    "harmonica",
];

/// Seeded supply of answers that pass validation for the active turn.
#[derive(Debug, Clone)]
pub struct AnswerBank {
    words: Vec<&'static str>,
    cursor: usize,
}

impl AnswerBank {
    #[must_use]
    pub fn shuffled(seed: u64) -> Self {
        let mut words = ANSWER_BANK.to_vec();
        words.shuffle(&mut ChaCha20Rng::seed_from_u64(seed));
        Self { words, cursor: 0 }
    }

    /// Next unused answer the active category will accept.
    pub fn next_for(&mut self, state: &GameState) -> Option<String> {
        let category = state.current_category()?;
        let adjectives = state.category_adjectives(category);
        let range = state.variant.category_turns(category);
        while let Some(word) = self.words.get(self.cursor).copied() {
            self.cursor += 1;
            let played = state.guesses[range.clone()].iter().map(|g| g.noun.as_str());
            if let Ok(answer) = validate_answer(word, played, &adjectives) {
                return Some(answer);
            }
        }
        None
    }
}

/// Submit one answer from the bank on the active turn.
pub async fn play_turn<S: SaveStore + Send>(
    session: &mut GameSession<S>,
    bank: &mut AnswerBank,
    service: &dyn ScoreService,
    ctx: &ScenarioCtx,
) -> Result<TurnReport> {
    let Some(answer) = bank.next_for(session.state()) else {
        bail!("answer bank exhausted on turn {}", session.state().current_turn);
    };
    let report = session.submit(&answer, service).await?;
    match &report {
        TurnReport::Scored { turn, outcome } => ctx.log(&format!(
            "turn {turn}: {answer} -> {:?}",
            outcome.scores.as_slice()
        )),
        TurnReport::Unscored { turn, error } => {
            ctx.log(&format!("turn {turn}: {answer} unscored ({error})"));
        }
    }
    Ok(report)
}

/// Submit answers until the game is complete.
pub async fn play_out<S: SaveStore + Send>(
    session: &mut GameSession<S>,
    bank: &mut AnswerBank,
    service: &dyn ScoreService,
    ctx: &ScenarioCtx,
) -> Result<Vec<TurnReport>> {
    let mut reports = Vec::new();
    while !session.state().is_complete() {
        reports.push(play_turn(session, bank, service, ctx).await?);
    }
    Ok(reports)
}

pub fn get_scenario(name: &str) -> Option<Box<dyn Scenario>> {
    match name.to_lowercase().as_str() {
        "smoke" => Some(Box::new(smoke::SmokeScenario)),
        "perfect-lock" | "lock" => Some(Box::new(rules::PerfectLockScenario)),
        "appeal" => Some(Box::new(rules::AppealScenario)),
        "pass" => Some(Box::new(rules::PassScenario)),
        "outage" => Some(Box::new(resilience::OutageScenario)),
        "garbled" | "fallback" => Some(Box::new(resilience::GarbledScenario)),
        "resume" => Some(Box::new(resilience::ResumeScenario)),
        "determinism" | "deterministic" => Some(Box::new(smoke::DeterminismScenario)),
        _ => None,
    }
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Full game with a fair judge"),
        ("perfect-lock", "Perfect score locks the category"),
        ("appeal", "Appeal raises or keeps scores and spends the token"),
        ("pass", "Passing opens every category"),
        ("outage", "Judge outage leaves turns unscored, rescore recovers them"),
        ("garbled", "Unparsable judge replies fall back to neutral scores"),
        ("resume", "Saves survive reload and reset on a new day"),
        ("determinism", "Same seed and answers replay the same game"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use offcharts_game::{Variant, daily_puzzle};

    #[test]
    fn registry_resolves_every_listed_scenario() {
        for (key, _) in list_scenarios() {
            let scenario = get_scenario(key).unwrap();
            assert_eq!(scenario.key(), key);
        }
        assert!(get_scenario("nope").is_none());
    }

    #[test]
    fn bank_is_seeded_and_skips_category_echoes() {
        let puzzle = DailyPuzzle {
            date_key: "debug-bank".into(),
            variant: Variant::Grid,
            adjectives: vec!["honey".into(), "fossil".into(), "velvet".into()],
        };
        let state = GameState::new(&puzzle, GameMode::Debug);
        let mut a = AnswerBank::shuffled(9);
        let mut b = AnswerBank::shuffled(9);
        for _ in 0..5 {
            let next = a.next_for(&state).unwrap();
            assert_ne!(next, "honey");
            assert_eq!(Some(next), b.next_for(&state));
        }
    }

    #[test]
    fn debug_keys_open_debug_mode() {
        let ctx = ScenarioCtx::new(daily_puzzle("debug-x", Variant::Pair), 1);
        assert_eq!(ctx.mode, GameMode::Debug);
        let ctx = ScenarioCtx::new(daily_puzzle("2025-12-10-v1", Variant::Pair), 1);
        assert_eq!(ctx.mode, GameMode::Daily);
    }
}
