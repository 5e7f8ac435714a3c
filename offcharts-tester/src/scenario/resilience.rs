use anyhow::{Context, Result, bail, ensure};
use async_trait::async_trait;
use chrono::Days;
use offcharts_game::constants::FALLBACK_SCORE;
use offcharts_game::daily::key_date;
use offcharts_game::{
    AppealReport, GameError, GameSession, GameState, Gateway, MemoryStore, SaveStore,
    ScoreService, SessionError, SlotStatus, TurnReport, daily_puzzle, date_key_for, share_text,
    summarize,
};
use std::path::{Path, PathBuf};

use super::{AnswerBank, Scenario, ScenarioCtx, play_out, play_turn};
use crate::common::FileStore;
use crate::logic::{JudgeBehavior, ScriptedJudge};

pub struct OutageScenario;

#[async_trait]
impl Scenario for OutageScenario {
    fn key(&self) -> &'static str {
        "outage"
    }

    fn name(&self) -> &'static str {
        "Judge Outage Recovery"
    }

    fn judge(&self) -> JudgeBehavior {
        JudgeBehavior::Offline
    }

    async fn play(&self, ctx: &ScenarioCtx, service: &dyn ScoreService) -> Result<GameState> {
        let mut session = GameSession::open(MemoryStore::new(), ctx.puzzle.clone(), ctx.mode)?;
        let mut bank = AnswerBank::shuffled(ctx.seed);
        let reports = play_out(&mut session, &mut bank, service, ctx).await?;

        let turns = ctx.puzzle.variant.turn_count();
        ensure!(reports.len() == turns, "every turn should be played during the outage");
        ensure!(
            reports.iter().all(|r| matches!(r, TurnReport::Unscored { .. })),
            "no turn should be scored while the judge is down"
        );
        let summary = summarize(session.state());
        ensure!(summary.complete, "an outage must not block the game");
        ensure!(summary.unscored == turns, "expected {turns} unscored turns, got {}", summary.unscored);
        ensure!(summary.total_score == 0, "unscored turns must add nothing");
        ensure!(
            share_text(session.state()).lines().skip(2).all(|row| row.chars().all(|c| c == '❔')),
            "unscored cells should read as unknown"
        );

        match session.appeal(0, "Please look again.", service).await {
            Err(SessionError::Game(GameError::NotAppealable { .. })) => {}
            other => bail!("appealing an unscored turn should fail, got {other:?}"),
        }

        ensure!(
            matches!(session.rescore(0, service).await?, TurnReport::Unscored { .. }),
            "rescoring against a dead judge should stay unscored"
        );

        let recovered = Gateway::new(ScriptedJudge::new(ctx.seed, JudgeBehavior::Fair));
        for turn in 0..turns {
            match session.rescore(turn, &recovered).await? {
                TurnReport::Scored { .. } => ctx.log(&format!("turn {turn} rescored")),
                TurnReport::Unscored { error, .. } => bail!("turn {turn} still unscored: {error}"),
            }
        }
        match session.rescore(0, &recovered).await {
            Err(SessionError::Game(GameError::NotScorable { .. })) => {}
            other => bail!("rescoring a scored turn should fail, got {other:?}"),
        }

        let summary = summarize(session.state());
        ensure!(summary.unscored == 0, "rescore should clear every unscored turn");
        ensure!(
            session.state().current_turn == turns,
            "rescoring must not move the active turn"
        );
        Ok(session.state().clone())
    }
}

pub struct GarbledScenario;

#[async_trait]
impl Scenario for GarbledScenario {
    fn key(&self) -> &'static str {
        "garbled"
    }

    fn name(&self) -> &'static str {
        "Garbled Judge Fallback"
    }

    fn judge(&self) -> JudgeBehavior {
        JudgeBehavior::Garbled
    }

    async fn play(&self, ctx: &ScenarioCtx, service: &dyn ScoreService) -> Result<GameState> {
        let mut session = GameSession::open(MemoryStore::new(), ctx.puzzle.clone(), ctx.mode)?;
        let mut bank = AnswerBank::shuffled(ctx.seed);
        play_out(&mut session, &mut bank, service, ctx).await?;

        let state = session.state();
        for (turn, guess) in state.guesses.iter().enumerate() {
            ensure!(
                guess.scores.iter().all(|s| *s == FALLBACK_SCORE),
                "turn {turn} should fall back to {FALLBACK_SCORE}, got {:?}",
                guess.scores.as_slice()
            );
        }
        let variant = ctx.puzzle.variant;
        let expected = u32::try_from(variant.turn_count() * variant.scores_per_guess())?
            * u32::from(FALLBACK_SCORE);
        ensure!(state.total_score() == expected, "total should be {expected}");

        let before = state.guesses[0].scores.clone();
        match session.appeal(0, "It deserves more.", service).await? {
            AppealReport::Decided { outcome, .. } => {
                ensure!(!outcome.accepted, "an unreadable ruling cannot be accepted");
                ensure!(outcome.scores == before, "an unreadable ruling keeps the scores");
            }
            AppealReport::Deferred { error, .. } => bail!("appeal deferred: {error}"),
        }
        ensure!(
            session.state().appeals_remaining == 0,
            "an answered appeal spends the token even when unreadable"
        );
        Ok(session.state().clone())
    }
}

pub struct ResumeScenario;

fn next_key(date_key: &str) -> String {
    key_date(date_key)
        .and_then(|date| date.checked_add_days(Days::new(1)))
        .map_or_else(|| format!("{date_key}-next"), date_key_for)
}

fn save_root(ctx: &ScenarioCtx) -> (PathBuf, bool) {
    let leaf = format!("{}-{}-{}", ctx.puzzle.date_key, ctx.puzzle.variant, ctx.seed);
    match &ctx.save_dir {
        Some(dir) => (dir.join(leaf), false),
        None => (
            std::env::temp_dir().join(format!("offcharts-tester-{}-{leaf}", std::process::id())),
            true,
        ),
    }
}

impl ResumeScenario {
    async fn exercise(
        ctx: &ScenarioCtx,
        service: &dyn ScoreService,
        dir: &Path,
    ) -> Result<GameState> {
        let store = FileStore::open(dir)?;
        let mut session = GameSession::open(store, ctx.puzzle.clone(), ctx.mode)?;
        let key = session.key().to_string();
        let mut bank = AnswerBank::shuffled(ctx.seed);

        let half = ctx.puzzle.variant.turn_count().div_ceil(2);
        while session.state().current_turn < half && !session.state().is_complete() {
            play_turn(&mut session, &mut bank, service, ctx).await?;
        }
        let (store, midway) = session.into_parts();

        let mut session = GameSession::open(store, ctx.puzzle.clone(), ctx.mode)?;
        ensure!(*session.state() == midway, "reloaded game differs from the saved one");
        play_out(&mut session, &mut bank, service, ctx).await?;
        let (mut store, finished) = session.into_parts();

        let raw = store.get(&key)?.context("finished game was not saved")?;
        let saved: GameState = serde_json::from_str(&raw)?;
        ensure!(saved == finished, "save file is out of date");

        let tomorrow = daily_puzzle(&next_key(&ctx.puzzle.date_key), ctx.puzzle.variant);
        let session = GameSession::open(&mut store, tomorrow.clone(), ctx.mode)?;
        ensure!(
            session.state().date_key == tomorrow.date_key && session.state().current_turn == 0,
            "a new day should start a fresh game"
        );
        drop(session);

        store.set(&key, "{ not a save")?;
        let mut session = GameSession::open(&mut store, ctx.puzzle.clone(), ctx.mode)?;
        ensure!(
            session.state().current_turn == 0,
            "an unreadable save should be replaced"
        );

        play_turn(&mut session, &mut bank, service, ctx).await?;
        session.reset()?;
        ensure!(
            session.state().guesses.iter().all(|g| g.status() == SlotStatus::Empty),
            "reset should clear the board"
        );
        Ok(finished)
    }
}

#[async_trait]
impl Scenario for ResumeScenario {
    fn key(&self) -> &'static str {
        "resume"
    }

    fn name(&self) -> &'static str {
        "Save and Resume"
    }

    fn supports_http(&self) -> bool {
        true
    }

    async fn play(&self, ctx: &ScenarioCtx, service: &dyn ScoreService) -> Result<GameState> {
        let (dir, scratch) = save_root(ctx);
        let outcome = Self::exercise(ctx, service, &dir).await;
        if scratch {
            let _ = std::fs::remove_dir_all(&dir);
        }
        outcome
    }
}
