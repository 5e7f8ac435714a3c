use anyhow::{Result, bail, ensure};
use async_trait::async_trait;
use offcharts_game::constants::{MAX_APPEAL_CHARS, MAX_SCORE};
use offcharts_game::{
    AppealReport, GameError, GameSession, GameState, GatewayError, MemoryStore, ScoreService,
    SessionError, SlotStatus, TurnReport, share_text, summarize,
};

use super::{AnswerBank, Scenario, ScenarioCtx, play_out, play_turn};
use crate::logic::JudgeBehavior;

const APPEAL_TEXT: &str = "Think about it again: this answer nails the category better than it looks.";

pub struct PerfectLockScenario;

#[async_trait]
impl Scenario for PerfectLockScenario {
    fn key(&self) -> &'static str {
        "perfect-lock"
    }

    fn name(&self) -> &'static str {
        "Perfect Score Lock"
    }

    fn judge(&self) -> JudgeBehavior {
        JudgeBehavior::Generous
    }

    async fn play(&self, ctx: &ScenarioCtx, service: &dyn ScoreService) -> Result<GameState> {
        let mut session = GameSession::open(MemoryStore::new(), ctx.puzzle.clone(), ctx.mode)?;
        let mut bank = AnswerBank::shuffled(ctx.seed);
        let reports = play_out(&mut session, &mut bank, service, ctx).await?;

        let state = session.state().clone();
        let variant = state.variant;
        ensure!(
            reports.len() == variant.category_count(),
            "expected one answer per category, played {}",
            reports.len()
        );
        for category in 0..variant.category_count() {
            let mut turns = variant.category_turns(category);
            let first = turns.next().unwrap_or_default();
            ensure!(
                state.guesses[first].is_perfect(),
                "category {category} opener should be perfect"
            );
            for turn in turns {
                ensure!(
                    state.status(turn) == Some(SlotStatus::Passed),
                    "turn {turn} should be locked after a perfect score"
                );
            }
        }

        let summary = summarize(&state);
        let expected_total = u32::try_from(variant.category_count() * variant.scores_per_guess())?
            * u32::from(MAX_SCORE);
        ensure!(
            summary.total_score == expected_total,
            "total {} should be {expected_total}",
            summary.total_score
        );
        ensure!(summary.perfect == variant.category_count(), "perfect count mismatch");
        ensure!(
            share_text(&state).lines().skip(2).all(|row| row.starts_with('🔥')),
            "every share row should open with a perfect cell"
        );
        Ok(state)
    }
}

pub struct AppealScenario;

#[async_trait]
impl Scenario for AppealScenario {
    fn key(&self) -> &'static str {
        "appeal"
    }

    fn name(&self) -> &'static str {
        "Appeal Flow"
    }

    fn supports_http(&self) -> bool {
        true
    }

    async fn play(&self, ctx: &ScenarioCtx, service: &dyn ScoreService) -> Result<GameState> {
        let mut session = GameSession::open(MemoryStore::new(), ctx.puzzle.clone(), ctx.mode)?;
        let mut bank = AnswerBank::shuffled(ctx.seed);

        let turn = match play_turn(&mut session, &mut bank, service, ctx).await? {
            TurnReport::Scored { turn, .. } => turn,
            TurnReport::Unscored { turn, error } => bail!("turn {turn} was not scored: {error}"),
        };
        let before = session.state().guesses[turn].scores.clone();

        let long_text = "a".repeat(MAX_APPEAL_CHARS + 1);
        match session.appeal(turn, &long_text, service).await {
            Err(SessionError::Gateway(GatewayError::InvalidField { field, .. })) => {
                ensure!(field == "appealText", "wrong field rejected: {field}");
            }
            other => bail!("over-long appeal should be refused, got {other:?}"),
        }
        ensure!(
            session.state().appeals_remaining == 1,
            "a refused appeal must not spend the token"
        );

        let outcome = match session.appeal(turn, APPEAL_TEXT, service).await? {
            AppealReport::Decided { outcome, .. } => outcome,
            AppealReport::Deferred { error, .. } => bail!("appeal was deferred: {error}"),
        };
        ctx.log(&format!(
            "appeal {:?} -> {:?} accepted={}",
            before.as_slice(),
            outcome.scores.as_slice(),
            outcome.accepted
        ));

        let guess = &session.state().guesses[turn];
        ensure!(guess.status() == SlotStatus::Appealed, "turn should read as appealed");
        let mut raised = false;
        for (index, (old, new)) in before.iter().zip(guess.scores.iter()).enumerate() {
            ensure!(new >= old, "appeal lowered score {index}: {old} -> {new}");
            ensure!(
                guess.appeal_deltas.get(index).copied() == Some(new - old),
                "appeal delta {index} does not match the raise"
            );
            raised |= new > old;
        }
        ensure!(!raised || outcome.accepted, "a raised score must count as accepted");
        ensure!(session.state().appeals_remaining == 0, "appeal token should be spent");

        match session.appeal(turn, APPEAL_TEXT, service).await {
            Err(SessionError::Game(GameError::NoAppealsLeft)) => {}
            other => bail!("second appeal should be refused, got {other:?}"),
        }

        play_out(&mut session, &mut bank, service, ctx).await?;
        ensure!(summarize(session.state()).appeals_used == 1, "one appeal should be recorded");
        ensure!(share_text(session.state()).contains('⚖'), "share text should flag the appeal");
        Ok(session.state().clone())
    }
}

pub struct PassScenario;

#[async_trait]
impl Scenario for PassScenario {
    fn key(&self) -> &'static str {
        "pass"
    }

    fn name(&self) -> &'static str {
        "Pass Handling"
    }

    fn supports_http(&self) -> bool {
        true
    }

    async fn play(&self, ctx: &ScenarioCtx, service: &dyn ScoreService) -> Result<GameState> {
        let mut session = GameSession::open(MemoryStore::new(), ctx.puzzle.clone(), ctx.mode)?;
        let mut bank = AnswerBank::shuffled(ctx.seed);
        let variant = ctx.puzzle.variant;

        while !session.state().is_complete() {
            let turn = session.state().current_turn;
            let opens_category = variant.category_turns(variant.category_of(turn)).start == turn;
            if opens_category {
                ensure!(session.pass()?, "passing turn {turn} should change the board");
                ctx.log(&format!("turn {turn}: PASS"));
            } else {
                play_turn(&mut session, &mut bank, service, ctx).await?;
            }
        }

        match session.pass() {
            Err(SessionError::Game(GameError::Complete)) => {}
            other => bail!("passing a finished game should fail, got {other:?}"),
        }

        let state = session.state().clone();
        for category in 0..variant.category_count() {
            let opener = variant.category_turns(category).start;
            ensure!(
                state.status(opener) == Some(SlotStatus::Passed),
                "category {category} opener should be a pass"
            );
        }
        let summary = summarize(&state);
        ensure!(summary.passes >= variant.category_count(), "passes were not counted");
        let counted: u32 = state.guesses.iter().filter(|g| !g.is_pass).map(|g| g.total()).sum();
        ensure!(summary.total_score == counted, "passes must add nothing to the total");
        ensure!(
            share_text(&state).lines().skip(2).all(|row| row.starts_with('⬜')),
            "every share row should open with a pass cell"
        );
        Ok(state)
    }
}
