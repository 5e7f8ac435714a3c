//! Numeric helpers centralizing score rounding and clamping.

use crate::constants::{MAX_SCORE, MIN_SCORE};

/// Round a raw model value and clamp it into the playable score range.
///
/// Non-finite input yields `None` so callers can fall back to their own default.
#[must_use]
pub fn round_to_score(value: f64) -> Option<u8> {
    if !value.is_finite() {
        return None;
    }
    let clamped = value
        .round()
        .clamp(f64::from(MIN_SCORE), f64::from(MAX_SCORE));
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        Some(clamped as u8)
    }
}

/// Clamp an integer score supplied by a client into the playable range.
#[must_use]
pub fn clamp_score(value: i64) -> u8 {
    let clamped = value.clamp(i64::from(MIN_SCORE), i64::from(MAX_SCORE));
    u8::try_from(clamped).unwrap_or(MIN_SCORE)
}
