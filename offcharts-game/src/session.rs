//! Session driver binding a [`GameState`] to a [`SaveStore`] and a [`ScoreService`].
//!
//! Every mutating operation persists the state before returning. Backend
//! failures never abort a turn: the guess stays on the board unscored and the
//! player moves on.

use thiserror::Error;

use crate::api::{
    AppealRequest, PairAppealRequest, PairScoreRequest, ScoreRequest, SingleAppealRequest,
    SingleScoreRequest,
};
use crate::constants::{SAVE_KEY_PREFIX, SAVE_VERSION};
use crate::daily::DailyPuzzle;
use crate::gateway::{GatewayError, ScoreService};
use crate::result::{GameSummary, summarize};
use crate::state::{
    AppealOutcome, GameError, GameMode, GameState, ScoreOutcome, SlotStatus, Variant,
};
use crate::store::{SaveStore, StoreError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("save storage failed: {0}")]
    Store(#[from] StoreError),
    #[error("save encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// What happened to a submitted guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnReport {
    Scored { turn: usize, outcome: ScoreOutcome },
    /// The scorer failed; the guess is kept without a score.
    Unscored { turn: usize, error: GatewayError },
}

impl TurnReport {
    #[must_use]
    pub const fn turn(&self) -> usize {
        match self {
            Self::Scored { turn, .. } | Self::Unscored { turn, .. } => *turn,
        }
    }
}

/// What happened to an appeal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppealReport {
    /// The judge answered; `outcome.scores` are the scores now on the board.
    Decided { turn: usize, outcome: AppealOutcome },
    /// The judge was unreachable; the appeal token was not spent.
    Deferred { turn: usize, error: GatewayError },
}

/// Storage key for a variant's save slot.
#[must_use]
pub fn save_key(variant: Variant, mode: GameMode) -> String {
    match mode {
        GameMode::Daily => format!("{SAVE_KEY_PREFIX}.{variant}.v{SAVE_VERSION}"),
        GameMode::Debug => format!("{SAVE_KEY_PREFIX}.{variant}.debug.v{SAVE_VERSION}"),
    }
}

fn matches_puzzle(state: &GameState, puzzle: &DailyPuzzle) -> bool {
    state.date_key == puzzle.date_key
        && state.variant == puzzle.variant
        && state.adjectives == puzzle.adjectives
        && state.guesses.len() == puzzle.variant.turn_count()
        && state.current_turn <= state.guesses.len()
}

/// Request grading `turn` of `state`, with the category's earlier answers as history.
#[must_use]
pub fn score_request(state: &GameState, turn: usize) -> Option<ScoreRequest> {
    let guess = state.guess(turn)?;
    let previous_nouns = state.previous_nouns(turn);
    let category = state.variant.category_of(turn);
    let request = match state.variant {
        Variant::Pair => ScoreRequest::Pair(PairScoreRequest {
            adjective1: state.adjectives.first()?.clone(),
            adjective2: state.adjectives.get(1)?.clone(),
            noun: guess.noun.clone(),
            previous_nouns,
        }),
        Variant::Grid => ScoreRequest::Single(SingleScoreRequest {
            adjective: state.adjectives.get(category)?.clone(),
            noun: guess.noun.clone(),
            previous_nouns,
            placeholder_category: None,
        }),
    };
    Some(request)
}

/// Request re-judging the scores already recorded for `turn`.
#[must_use]
pub fn appeal_request(state: &GameState, turn: usize, appeal_text: &str) -> Option<AppealRequest> {
    let guess = state.guess(turn)?;
    let reasoning = guess
        .reasonings
        .iter()
        .filter(|r| !r.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");
    let original_reasoning = (!reasoning.is_empty()).then_some(reasoning);
    let request = match state.variant {
        Variant::Pair => AppealRequest::Pair(PairAppealRequest {
            adjective1: state.adjectives.first()?.clone(),
            adjective2: state.adjectives.get(1)?.clone(),
            noun: guess.noun.clone(),
            original_score1: i64::from(*guess.scores.first()?),
            original_score2: i64::from(*guess.scores.get(1)?),
            original_reasoning,
            appeal_text: appeal_text.to_string(),
        }),
        Variant::Grid => AppealRequest::Single(SingleAppealRequest {
            adjective: state.adjectives.get(state.variant.category_of(turn))?.clone(),
            noun: guess.noun.clone(),
            original_score: i64::from(*guess.scores.first()?),
            original_reasoning,
            appeal_text: appeal_text.to_string(),
        }),
    };
    Some(request)
}

pub struct GameSession<S: SaveStore> {
    store: S,
    puzzle: DailyPuzzle,
    state: GameState,
    key: String,
}

impl<S: SaveStore> GameSession<S> {
    /// Resume today's save for this puzzle, or start a fresh game.
    ///
    /// Saves that fail to decode or belong to a different puzzle are removed.
    ///
    /// # Errors
    ///
    /// Fails only when the store itself cannot be read or written.
    pub fn open(mut store: S, puzzle: DailyPuzzle, mode: GameMode) -> Result<Self, SessionError> {
        let key = save_key(puzzle.variant, mode);
        let resumed = match store.get(&key)? {
            Some(raw) => match serde_json::from_str::<GameState>(&raw) {
                Ok(state) if matches_puzzle(&state, &puzzle) => Some(state),
                Ok(state) => {
                    log::info!(
                        "discarding save for {} (today is {})",
                        state.date_key,
                        puzzle.date_key
                    );
                    store.remove(&key)?;
                    None
                }
                Err(err) => {
                    log::warn!("discarding unreadable save {key}: {err}");
                    store.remove(&key)?;
                    None
                }
            },
            None => None,
        };

        let mut state = resumed.unwrap_or_else(|| GameState::new(&puzzle, mode));
        let pending = state.current_turn;
        if state.status(pending) == Some(SlotStatus::Guessed) {
            log::warn!("resumed turn {pending} was never graded; leaving it unscored");
            state.mark_unscored(pending)?;
        }
        let mut session = Self {
            store,
            puzzle,
            state,
            key,
        };
        session.save()?;
        Ok(session)
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn into_parts(self) -> (S, GameState) {
        (self.store, self.state)
    }

    #[must_use]
    pub fn summary(&self) -> GameSummary {
        summarize(&self.state)
    }

    fn save(&mut self) -> Result<(), SessionError> {
        let encoded = serde_json::to_string(&self.state)?;
        self.store.set(&self.key, &encoded)?;
        Ok(())
    }

    /// Throw away progress and start the same puzzle over.
    ///
    /// # Errors
    ///
    /// Fails when the store cannot be modified.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.store.remove(&self.key)?;
        self.state = GameState::new(&self.puzzle, self.state.mode);
        self.save()
    }

    /// Play `noun` on the active turn and grade it.
    ///
    /// # Errors
    ///
    /// Fails when the guess is rejected or the game cannot accept it; scorer
    /// failures are reported as [`TurnReport::Unscored`] instead.
    pub async fn submit<V>(&mut self, noun: &str, service: &V) -> Result<TurnReport, SessionError>
    where
        V: ScoreService + ?Sized,
    {
        let turn = self.state.record_guess(noun)?;
        self.save()?;
        let report = self.grade(turn, service).await?;
        if let TurnReport::Unscored { error, .. } = &report {
            log::warn!("turn {turn} left unscored: {error}");
            self.state.mark_unscored(turn)?;
        }
        self.save()?;
        Ok(report)
    }

    /// Retry grading a turn that was left unscored.
    ///
    /// A turn behind the active one stays behind it. A guess still pending on
    /// the active turn is graded like a fresh submit and moves play on either way.
    ///
    /// # Errors
    ///
    /// Fails when `turn` is not holding an unscored guess.
    pub async fn rescore<V>(&mut self, turn: usize, service: &V) -> Result<TurnReport, SessionError>
    where
        V: ScoreService + ?Sized,
    {
        let status = self.state.status(turn).ok_or(GameError::TurnOutOfRange(turn))?;
        if status != SlotStatus::Guessed {
            return Err(GameError::NotScorable { turn, status }.into());
        }
        let report = self.grade(turn, service).await?;
        if turn == self.state.current_turn
            && let TurnReport::Unscored { error, .. } = &report
        {
            log::warn!("turn {turn} left unscored: {error}");
            self.state.mark_unscored(turn)?;
        }
        self.save()?;
        Ok(report)
    }

    async fn grade<V>(&mut self, turn: usize, service: &V) -> Result<TurnReport, SessionError>
    where
        V: ScoreService + ?Sized,
    {
        let request = score_request(&self.state, turn).ok_or(GameError::TurnOutOfRange(turn))?;
        match service.score(request).await {
            Ok(reply) => {
                let outcome = reply.into_outcome();
                match self.state.apply_score(turn, outcome.clone()) {
                    Ok(()) => Ok(TurnReport::Scored { turn, outcome }),
                    Err(err) => Ok(TurnReport::Unscored {
                        turn,
                        error: GatewayError::Backend(format!("unusable score reply: {err}")),
                    }),
                }
            }
            Err(error) => Ok(TurnReport::Unscored { turn, error }),
        }
    }

    /// Pass the active turn.
    ///
    /// # Errors
    ///
    /// Fails when the game is complete or the active slot holds a guess.
    pub fn pass(&mut self) -> Result<bool, SessionError> {
        let changed = self.state.pass()?;
        if changed {
            self.save()?;
        }
        Ok(changed)
    }

    /// Spend the game's appeal token on `turn`.
    ///
    /// # Errors
    ///
    /// Fails when the turn cannot be appealed or the appeal text is refused;
    /// an unreachable judge is reported as [`AppealReport::Deferred`].
    pub async fn appeal<V>(
        &mut self,
        turn: usize,
        appeal_text: &str,
        service: &V,
    ) -> Result<AppealReport, SessionError>
    where
        V: ScoreService + ?Sized,
    {
        self.state.check_appeal(turn)?;
        let request = appeal_request(&self.state, turn, appeal_text)
            .ok_or(GameError::TurnOutOfRange(turn))?;
        request.validate()?;

        match service.appeal(request).await {
            Ok(reply) => {
                let outcome = reply.into_outcome();
                let accepted = outcome.accepted;
                let reasoning = outcome.reasoning.clone();
                self.state.apply_appeal(turn, outcome)?;
                self.save()?;
                let scores = self.state.guesses[turn].scores.clone();
                Ok(AppealReport::Decided {
                    turn,
                    outcome: AppealOutcome {
                        scores,
                        reasoning,
                        accepted,
                    },
                })
            }
            Err(error) if error.is_client_error() => Err(error.into()),
            Err(error) => {
                log::warn!("appeal on turn {turn} deferred: {error}");
                Ok(AppealReport::Deferred { turn, error })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AppealReply, PairAppealReply, PairScoreReply, ScoreReply, SingleScoreReply};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays queued replies; an empty queue behaves like an outage.
    #[derive(Default)]
    struct Queue {
        scores: Mutex<Vec<ScoreReply>>,
        appeals: Mutex<Vec<AppealReply>>,
    }

    impl Queue {
        fn with_scores(scores: &[(u8, u8)]) -> Self {
            let queue = Self::default();
            {
                let mut pending = queue.scores.lock().unwrap();
                for (a, b) in scores.iter().rev() {
                    pending.push(ScoreReply::Pair(PairScoreReply {
                        score1: *a,
                        reasoning1: "one".into(),
                        score2: *b,
                        reasoning2: "two".into(),
                    }));
                }
            }
            queue
        }
    }

    #[async_trait]
    impl ScoreService for Queue {
        async fn score(&self, _request: ScoreRequest) -> Result<ScoreReply, GatewayError> {
            self.scores
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| GatewayError::Backend("offline".into()))
        }

        async fn appeal(&self, _request: AppealRequest) -> Result<AppealReply, GatewayError> {
            self.appeals
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| GatewayError::Backend("offline".into()))
        }
    }

    fn puzzle(date_key: &str) -> DailyPuzzle {
        DailyPuzzle {
            date_key: date_key.into(),
            variant: Variant::Pair,
            adjectives: vec!["sticky".into(), "nostalgic".into()],
        }
    }

    #[test]
    fn save_keys_are_per_variant_and_mode() {
        assert_eq!(save_key(Variant::Pair, GameMode::Daily), "offcharts.save.pair.v3");
        assert_eq!(save_key(Variant::Grid, GameMode::Debug), "offcharts.save.grid.debug.v3");
    }

    #[tokio::test]
    async fn submit_scores_and_persists() {
        let mut store = MemoryStore::new();
        let service = Queue::with_scores(&[(8, 6)]);
        {
            let mut session =
                GameSession::open(&mut store, puzzle("2025-12-10-v1"), GameMode::Daily).unwrap();
            let report = session.submit("honey", &service).await.unwrap();
            assert!(matches!(report, TurnReport::Scored { turn: 0, .. }));
            assert_eq!(session.state().current_turn, 1);
        }

        let resumed = GameSession::open(&mut store, puzzle("2025-12-10-v1"), GameMode::Daily).unwrap();
        assert_eq!(resumed.state().guesses[0].scores.as_slice(), &[8, 6]);
        assert_eq!(resumed.state().current_turn, 1);
    }

    #[tokio::test]
    async fn outage_leaves_turn_unscored_then_rescore() {
        let service = Queue::default();
        let mut session =
            GameSession::open(MemoryStore::new(), puzzle("2025-12-10-v1"), GameMode::Daily).unwrap();
        let report = session.submit("honey", &service).await.unwrap();
        assert!(matches!(report, TurnReport::Unscored { turn: 0, .. }));
        assert_eq!(session.state().status(0), Some(SlotStatus::Guessed));
        assert_eq!(session.state().current_turn, 1);

        service.scores.lock().unwrap().push(ScoreReply::Pair(PairScoreReply {
            score1: 4,
            reasoning1: String::new(),
            score2: 4,
            reasoning2: String::new(),
        }));
        let report = session.rescore(0, &service).await.unwrap();
        assert_eq!(report.turn(), 0);
        assert_eq!(session.state().status(0), Some(SlotStatus::Scored));
        assert_eq!(session.state().current_turn, 1);
    }

    #[tokio::test]
    async fn interrupted_submit_resumes_as_unscored() {
        let mut store = MemoryStore::new();
        let mut pending = GameState::new(&puzzle("2025-12-10-v1"), GameMode::Daily);
        pending.record_guess("honey").unwrap();
        store
            .set(
                &save_key(Variant::Pair, GameMode::Daily),
                &serde_json::to_string(&pending).unwrap(),
            )
            .unwrap();

        let service = Queue::with_scores(&[(7, 5), (3, 8)]);
        let mut session =
            GameSession::open(&mut store, puzzle("2025-12-10-v1"), GameMode::Daily).unwrap();
        assert_eq!(session.state().status(0), Some(SlotStatus::Guessed));
        assert_eq!(session.state().current_turn, 1);

        let report = session.submit("glue", &service).await.unwrap();
        assert!(matches!(report, TurnReport::Scored { turn: 1, .. }));
        session.pass().unwrap();
        let report = session.rescore(0, &service).await.unwrap();
        assert!(matches!(report, TurnReport::Scored { turn: 0, .. }));
        assert_eq!(session.state().guesses[0].scores.as_slice(), &[3, 8]);
        assert_eq!(session.state().current_turn, 3);
    }

    #[tokio::test]
    async fn mismatched_reply_shape_leaves_turn_unscored() {
        let service = Queue::default();
        service.scores.lock().unwrap().push(ScoreReply::Single(SingleScoreReply {
            score: 7,
            reasoning: "one adjective only".into(),
            favorite_index: None,
        }));
        let mut session =
            GameSession::open(MemoryStore::new(), puzzle("2025-12-10-v1"), GameMode::Daily).unwrap();
        let report = session.submit("honey", &service).await.unwrap();
        assert!(matches!(
            report,
            TurnReport::Unscored { turn: 0, error: GatewayError::Backend(_) }
        ));
        assert_eq!(session.state().status(0), Some(SlotStatus::Guessed));
        assert_eq!(session.state().current_turn, 1);
        assert!(session.pass().unwrap());
    }

    #[tokio::test]
    async fn stale_and_corrupt_saves_are_discarded() {
        let mut store = MemoryStore::new();
        let key = save_key(Variant::Pair, GameMode::Daily);
        store.set(&key, "{not json").unwrap();
        let session = GameSession::open(&mut store, puzzle("2025-12-11-v1"), GameMode::Daily).unwrap();
        assert_eq!(session.state().current_turn, 0);
        drop(session);

        let service = Queue::with_scores(&[(3, 3)]);
        let mut session =
            GameSession::open(&mut store, puzzle("2025-12-11-v1"), GameMode::Daily).unwrap();
        session.submit("honey", &service).await.unwrap();
        drop(session);

        let next_day = GameSession::open(&mut store, puzzle("2025-12-12-v1"), GameMode::Daily).unwrap();
        assert_eq!(next_day.state().date_key, "2025-12-12-v1");
        assert_eq!(next_day.state().current_turn, 0);
    }

    #[tokio::test]
    async fn deferred_appeal_keeps_the_token() {
        let service = Queue::with_scores(&[(6, 4)]);
        let mut session =
            GameSession::open(MemoryStore::new(), puzzle("2025-12-10-v1"), GameMode::Daily).unwrap();
        session.submit("honey", &service).await.unwrap();

        let report = session.appeal(0, "Honey is childhood.", &service).await.unwrap();
        assert!(matches!(report, AppealReport::Deferred { turn: 0, .. }));
        assert_eq!(session.state().appeals_remaining, 1);

        service.appeals.lock().unwrap().push(AppealReply::Pair(PairAppealReply {
            new_score1: 5,
            new_score2: 9,
            reasoning: "Fair.".into(),
            accepted: true,
        }));
        let report = session.appeal(0, "Honey is childhood.", &service).await.unwrap();
        match report {
            AppealReport::Decided { outcome, .. } => {
                assert_eq!(outcome.scores.as_slice(), &[6, 9]);
                assert!(outcome.accepted);
            }
            AppealReport::Deferred { .. } => panic!("appeal should have been decided"),
        }
        assert_eq!(session.state().appeals_remaining, 0);
        assert!(matches!(
            session.appeal(0, "again", &service).await,
            Err(SessionError::Game(GameError::NoAppealsLeft))
        ));
    }

    #[tokio::test]
    async fn blank_appeal_text_is_refused_locally() {
        let service = Queue::with_scores(&[(6, 4)]);
        let mut session =
            GameSession::open(MemoryStore::new(), puzzle("2025-12-10-v1"), GameMode::Daily).unwrap();
        session.submit("honey", &service).await.unwrap();
        assert!(matches!(
            session.appeal(0, "   ", &service).await,
            Err(SessionError::Gateway(GatewayError::MissingField("appealText")))
        ));
        assert_eq!(session.state().appeals_remaining, 1);
    }

    #[tokio::test]
    async fn reset_starts_over() {
        let service = Queue::with_scores(&[(2, 2)]);
        let mut session =
            GameSession::open(MemoryStore::new(), puzzle("2025-12-10-v1"), GameMode::Debug).unwrap();
        session.submit("honey", &service).await.unwrap();
        session.pass().unwrap();
        session.reset().unwrap();
        assert_eq!(session.state().current_turn, 0);
        assert_eq!(session.state().mode, GameMode::Debug);
        let (store, _) = session.into_parts();
        assert!(store.get("offcharts.save.pair.debug.v3").unwrap().is_some());
    }

    #[test]
    fn requests_carry_category_history() {
        let grid = DailyPuzzle {
            date_key: "2026-03-01-v1".into(),
            variant: Variant::Grid,
            adjectives: vec!["toxic".into(), "edgy".into(), "nerdy".into()],
        };
        let mut state = GameState::new(&grid, GameMode::Daily);
        for _ in 0..3 {
            state.pass().unwrap();
        }
        let turn = state.record_guess("leather jacket").unwrap();
        let Some(ScoreRequest::Single(request)) = score_request(&state, turn) else {
            panic!("grid turns use the single shape");
        };
        assert_eq!(request.adjective, "edgy");
        assert!(request.previous_nouns.is_empty());
    }
}
