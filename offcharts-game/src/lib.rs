//! Off the Charts Game Engine
//!
//! Platform-agnostic core logic for the Off the Charts daily word-association
//! game. This crate selects the daily adjectives, validates answers, runs the
//! turn state machine, and grades answers through a pluggable text generator.
//! It has no HTTP, storage, or UI dependencies of its own.

pub mod api;
pub mod constants;
pub mod daily;
pub mod data;
pub mod gateway;
pub mod numbers;
pub mod parse;
pub mod prompt;
pub mod result;
pub mod session;
pub mod state;
pub mod store;
pub mod validate;

// Re-export commonly used types
pub use api::{
    AppealReply, AppealRequest, PairAppealReply, PairAppealRequest, PairScoreReply,
    PairScoreRequest, ScoreReply, ScoreRequest, SingleAppealReply, SingleAppealRequest,
    SingleScoreReply, SingleScoreRequest,
};
pub use daily::{DailyPuzzle, daily_puzzle, date_key_for, debug_puzzle, pick_daily, today_key};
pub use data::{BASE_ADJECTIVES, PRESET_CALENDAR};
pub use gateway::{
    Effort, Gateway, GatewayError, GenerationRequest, ScoreService, TextGenerator,
};
pub use result::{BestGuess, GameSummary, share_text, summarize};
pub use session::{AppealReport, GameSession, SessionError, TurnReport, save_key};
pub use state::{
    AppealOutcome, GameError, GameMode, GameState, Guess, ScoreOutcome, SlotStatus, Variant,
};
pub use store::{MemoryStore, SaveStore, StoreError};
pub use validate::{GuessRejection, validate_answer};
