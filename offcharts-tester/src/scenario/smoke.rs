use anyhow::{Result, ensure};
use async_trait::async_trait;
use offcharts_game::{
    GameSession, GameState, MemoryStore, ScoreService, SlotStatus, share_text, summarize,
};

use super::{AnswerBank, Scenario, ScenarioCtx, play_out};

pub struct SmokeScenario;

#[async_trait]
impl Scenario for SmokeScenario {
    fn key(&self) -> &'static str {
        "smoke"
    }

    fn name(&self) -> &'static str {
        "Smoke Test"
    }

    fn supports_http(&self) -> bool {
        true
    }

    async fn play(&self, ctx: &ScenarioCtx, service: &dyn ScoreService) -> Result<GameState> {
        let mut session = GameSession::open(MemoryStore::new(), ctx.puzzle.clone(), ctx.mode)?;
        ensure!(
            session.state().adjectives.len() == ctx.puzzle.variant.adjective_count(),
            "puzzle should carry {} adjectives",
            ctx.puzzle.variant.adjective_count()
        );

        let mut bank = AnswerBank::shuffled(ctx.seed);
        play_out(&mut session, &mut bank, service, ctx).await?;

        let state = session.state().clone();
        let summary = summarize(&state);
        ensure!(summary.complete, "game should be complete");
        ensure!(summary.unscored == 0, "{} turns were left unscored", summary.unscored);
        ensure!(
            summary.total_score <= summary.max_score,
            "total {} exceeds max {}",
            summary.total_score,
            summary.max_score
        );
        for (turn, guess) in state.guesses.iter().enumerate() {
            match guess.status() {
                SlotStatus::Scored => ensure!(
                    guess.scores.len() == state.variant.scores_per_guess()
                        && guess.scores.iter().all(|s| (1..=10).contains(s)),
                    "turn {turn} has out-of-range scores {:?}",
                    guess.scores.as_slice()
                ),
                SlotStatus::Passed => {}
                other => anyhow::bail!("turn {turn} ended in state {other:?}"),
            }
        }
        ensure!(
            summary.best.iter().all(Option::is_some),
            "every category should have a best answer"
        );

        let share = share_text(&state);
        ensure!(
            share.lines().count() == state.variant.category_count() + 2,
            "share text has the wrong shape:\n{share}"
        );
        ctx.log(&summary.headline());
        Ok(state)
    }
}

pub struct DeterminismScenario;

#[async_trait]
impl Scenario for DeterminismScenario {
    fn key(&self) -> &'static str {
        "determinism"
    }

    fn name(&self) -> &'static str {
        "Deterministic Replay"
    }

    async fn play(&self, ctx: &ScenarioCtx, service: &dyn ScoreService) -> Result<GameState> {
        let mut finals = Vec::with_capacity(2);
        for _ in 0..2 {
            let mut session =
                GameSession::open(MemoryStore::new(), ctx.puzzle.clone(), ctx.mode)?;
            let mut bank = AnswerBank::shuffled(ctx.seed);
            play_out(&mut session, &mut bank, service, ctx).await?;
            finals.push(session.state().clone());
        }
        ensure!(
            finals[0] == finals[1],
            "replaying the same answers produced different games"
        );
        ensure!(
            share_text(&finals[0]) == share_text(&finals[1]),
            "share text differs between replays"
        );
        Ok(finals.swap_remove(0))
    }
}
