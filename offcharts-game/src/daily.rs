//! Deterministic daily puzzle selection.
//!
//! Date keys look like `2025-12-10-v1`: a calendar date followed by the puzzle
//! algorithm version. The first fourteen days after launch use hand-picked
//! pairings; every other key is hashed into a seed that drives a
//! linear-congruential draw without replacement.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::constants::{KEY_HASH_BASE, LCG_INCREMENT, LCG_MULTIPLIER, PRESET_EPOCH, PUZZLE_VERSION};
use crate::data::{BASE_ADJECTIVES, PRESET_CALENDAR};
use crate::state::Variant;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DEBUG_KEY_PREFIX: &str = "debug-";

/// Adjectives chosen for one puzzle key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPuzzle {
    pub date_key: String,
    pub variant: Variant,
    pub adjectives: Vec<String>,
}

/// Build the version-stamped key for a calendar date.
#[must_use]
pub fn date_key_for(date: NaiveDate) -> String {
    format!("{}-{PUZZLE_VERSION}", date.format(DATE_FORMAT))
}

/// Key for the current local calendar day.
#[must_use]
pub fn today_key() -> String {
    date_key_for(Local::now().date_naive())
}

/// Calendar date embedded at the front of a key, if any.
#[must_use]
pub fn key_date(date_key: &str) -> Option<NaiveDate> {
    let prefix = date_key.get(..10)?;
    NaiveDate::parse_from_str(prefix, DATE_FORMAT).ok()
}

fn preset_epoch() -> Option<NaiveDate> {
    let (year, month, day) = PRESET_EPOCH;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Preset tuple scheduled for the key's date, if the date is inside the calendar.
#[must_use]
pub fn preset_for(date_key: &str) -> Option<&'static [&'static str]> {
    let date = key_date(date_key)?;
    let offset = date.signed_duration_since(preset_epoch()?).num_days();
    let index = usize::try_from(offset).ok()?;
    PRESET_CALENDAR.get(index).copied()
}

/// Polynomial base-31 hash over the key's UTF-16 code units.
#[must_use]
pub fn key_seed(date_key: &str) -> u32 {
    date_key.encode_utf16().fold(0_u32, |hash, unit| {
        hash.wrapping_mul(KEY_HASH_BASE).wrapping_add(u32::from(unit))
    })
}

const fn next_seed(seed: u32) -> u32 {
    seed.wrapping_mul(LCG_MULTIPLIER).wrapping_add(LCG_INCREMENT)
}

/// Pick `count` distinct adjectives for `date_key` from `pool`.
///
/// Identical inputs always produce identical output.
#[must_use]
pub fn pick_daily(date_key: &str, count: usize, pool: &[&str]) -> Vec<String> {
    if let Some(preset) = preset_for(date_key)
        && preset.len() == count
    {
        return preset.iter().map(|word| (*word).to_string()).collect();
    }

    if pool.len() <= count {
        return pool.iter().map(|word| (*word).to_string()).collect();
    }

    let mut remaining: Vec<&str> = pool.to_vec();
    let mut seed = key_seed(date_key);
    let mut picks = Vec::with_capacity(count);
    for _ in 0..count {
        seed = next_seed(seed);
        let len = u32::try_from(remaining.len()).unwrap_or(u32::MAX);
        #[allow(clippy::cast_possible_truncation)]
        let index = (seed % len) as usize;
        picks.push(remaining.remove(index).to_string());
    }
    picks
}

/// Daily puzzle for a date key using the built-in adjective pool.
#[must_use]
pub fn daily_puzzle(date_key: &str, variant: Variant) -> DailyPuzzle {
    DailyPuzzle {
        date_key: date_key.to_string(),
        variant,
        adjectives: pick_daily(date_key, variant.adjective_count(), BASE_ADJECTIVES),
    }
}

/// Puzzle for a free-form debug label; never lands on the preset calendar.
#[must_use]
pub fn debug_puzzle(label: &str, variant: Variant) -> DailyPuzzle {
    daily_puzzle(&format!("{DEBUG_KEY_PREFIX}{label}"), variant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn day(offset: u64) -> String {
        let epoch = preset_epoch().unwrap();
        date_key_for(epoch + chrono::Days::new(offset))
    }

    #[test]
    fn launch_day_returns_first_preset() {
        assert_eq!(
            pick_daily("2025-12-10-v1", 2, BASE_ADJECTIVES),
            vec!["sticky".to_string(), "nostalgic".to_string()]
        );
    }

    #[test]
    fn first_fourteen_days_follow_the_calendar() {
        for (offset, preset) in PRESET_CALENDAR.iter().enumerate() {
            let key = day(offset as u64);
            let expected: Vec<String> = preset.iter().map(|w| (*w).to_string()).collect();
            assert_eq!(pick_daily(&key, 2, BASE_ADJECTIVES), expected, "{key}");
        }
    }

    #[test]
    fn preset_is_skipped_when_count_differs() {
        assert_eq!(
            pick_daily("2025-12-10-v1", 3, BASE_ADJECTIVES),
            vec!["festive", "greasy", "nervous"]
        );
    }

    #[test]
    fn first_day_after_calendar_is_drawn() {
        assert_eq!(
            pick_daily("2025-12-24-v1", 2, BASE_ADJECTIVES),
            vec!["dramatic", "overrated"]
        );
    }

    #[test]
    fn days_outside_calendar_use_seeded_draw() {
        assert!(preset_for(&day(14)).is_none());
        assert!(preset_for("2025-12-09-v1").is_none());
        assert!(preset_for("debug-1").is_none());
    }

    #[test]
    fn key_seed_matches_polynomial_hash() {
        assert_eq!(key_seed(""), 0);
        assert_eq!(key_seed("abc"), 96_354);
        assert_eq!(key_seed("debug-7"), 1_541_690_173);
    }

    #[test]
    fn seeded_draw_is_stable() {
        let pool = ["a", "b", "c", "d", "e"];
        assert_eq!(pick_daily("", 2, &pool), vec!["d", "c"]);
        assert_eq!(pick_daily("abc", 3, &pool), vec!["b", "a", "e"]);
        assert_eq!(pick_daily("2026-02-01-v1", 2, &pool), vec!["d", "b"]);
    }

    #[test]
    fn selection_is_deterministic_and_distinct() {
        for offset in 14..120 {
            let key = day(offset);
            for count in [2, 3] {
                let first = pick_daily(&key, count, BASE_ADJECTIVES);
                let second = pick_daily(&key, count, BASE_ADJECTIVES);
                assert_eq!(first, second);
                assert_eq!(first.len(), count);
                let unique: HashSet<_> = first.iter().collect();
                assert_eq!(unique.len(), count);
                assert!(first.iter().all(|w| BASE_ADJECTIVES.contains(&w.as_str())));
            }
        }
    }

    #[test]
    fn small_pool_is_returned_whole() {
        let pool = ["left", "right"];
        assert_eq!(pick_daily("2030-01-01-v1", 2, &pool), vec!["left", "right"]);
        assert_eq!(pick_daily("2030-01-01-v1", 3, &pool), vec!["left", "right"]);
    }

    #[test]
    fn date_keys_embed_version() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        assert_eq!(date_key_for(date), "2026-03-04-v1");
        assert_eq!(key_date("2026-03-04-v1"), Some(date));
        assert_eq!(key_date("nonsense"), None);
    }

    #[test]
    fn puzzles_respect_variant_sizes() {
        let pair = daily_puzzle("2026-05-05-v1", Variant::Pair);
        let grid = daily_puzzle("2026-05-05-v1", Variant::Grid);
        assert_eq!(pair.adjectives.len(), 2);
        assert_eq!(grid.adjectives.len(), 3);
        let debug = debug_puzzle("7", Variant::Pair);
        assert_eq!(debug.date_key, "debug-7");
        assert_eq!(debug.adjectives.len(), 2);
    }
}
