//! Centralized tuning constants for Off the Charts game logic.
//!
//! Puzzle generation, score bounds, and persistence versions live here so
//! that gameplay can only be adjusted through reviewed code changes.

// Scores -------------------------------------------------------------------
pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 10;
/// Neutral score used when a backend reply cannot be parsed.
pub const FALLBACK_SCORE: u8 = 5;
/// Score recorded for a passed slot.
pub const PASS_SCORE: u8 = 0;
pub const PASS_NOUN: &str = "PASS";

// Turns --------------------------------------------------------------------
pub const PAIR_ADJECTIVES: usize = 2;
pub const PAIR_TURNS: usize = 5;
pub const GRID_ADJECTIVES: usize = 3;
pub const GRID_TURNS_PER_CATEGORY: usize = 3;
pub const APPEALS_PER_GAME: u8 = 1;

// Answers ------------------------------------------------------------------
pub const MAX_ANSWER_CHARS: usize = 40;
pub const MAX_APPEAL_CHARS: usize = 280;

// Puzzle generation ----------------------------------------------------------
/// Embedded in every date key; bumping it reshuffles every puzzle and
/// invalidates saves made under the old algorithm.
pub const PUZZLE_VERSION: &str = "v1";
/// First day of the preset calendar.
pub const PRESET_EPOCH: (i32, u32, u32) = (2025, 12, 10);
pub(crate) const LCG_MULTIPLIER: u32 = 1_664_525;
pub(crate) const LCG_INCREMENT: u32 = 1_013_904_223;
pub(crate) const KEY_HASH_BASE: u32 = 31;

// Persistence ----------------------------------------------------------------
pub const SAVE_KEY_PREFIX: &str = "offcharts.save";
pub const SAVE_VERSION: u32 = 3;

// Generation hints -------------------------------------------------------------
pub const SCORE_MAX_OUTPUT_TOKENS: u32 = 400;
pub const APPEAL_MAX_OUTPUT_TOKENS: u32 = 500;
