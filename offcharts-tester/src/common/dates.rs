use anyhow::{Context, Result, bail};
use chrono::{Days, NaiveDate};
use offcharts_game::constants::PRESET_EPOCH;
use offcharts_game::daily::key_date;
use offcharts_game::{PRESET_CALENDAR, date_key_for, today_key};

const DATE_FORMAT: &str = "%Y-%m-%d";
const MAX_RANGE_DAYS: u64 = 366;

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .with_context(|| format!("expected a YYYY-MM-DD date, got {raw:?}"))
}

fn preset_keys() -> Result<Vec<String>> {
    let (year, month, day) = PRESET_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(year, month, day).context("preset epoch is not a date")?;
    (0..PRESET_CALENDAR.len())
        .map(|offset| {
            let offset = u64::try_from(offset)?;
            epoch
                .checked_add_days(Days::new(offset))
                .map(date_key_for)
                .context("preset calendar overflows the date range")
        })
        .collect()
}

fn range_keys(start: &str, end: &str) -> Result<Vec<String>> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    if end < start {
        bail!("date range ends before it starts: {start}..{end}");
    }
    let span = u64::try_from(end.signed_duration_since(start).num_days())?;
    if span >= MAX_RANGE_DAYS {
        bail!("date range covers more than {MAX_RANGE_DAYS} days");
    }
    (0..=span)
        .map(|offset| {
            start
                .checked_add_days(Days::new(offset))
                .map(date_key_for)
                .context("date range overflows")
        })
        .collect()
}

/// Resolve CLI date tokens into puzzle keys.
///
/// Accepts `today`, `presets` (the launch calendar), plain dates, inclusive
/// `start..end` ranges, full keys such as `2025-12-10-v1`, and `debug-<label>`
/// keys. Duplicates are dropped; no tokens means today.
pub fn resolve_date_inputs(tokens: &[String]) -> Result<Vec<String>> {
    let mut keys: Vec<String> = Vec::new();
    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let resolved = if token.eq_ignore_ascii_case("today") {
            vec![today_key()]
        } else if token.eq_ignore_ascii_case("presets") || token.eq_ignore_ascii_case("calendar") {
            preset_keys()?
        } else if let Some((start, end)) = token.split_once("..") {
            range_keys(start, end)?
        } else if token.starts_with("debug-") {
            vec![token.to_string()]
        } else if token.len() == 10 {
            vec![date_key_for(parse_date(token)?)]
        } else if key_date(token).is_some() {
            vec![token.to_string()]
        } else {
            bail!("Unrecognized date token: {token}");
        };
        for key in resolved {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
    }

    if keys.is_empty() {
        keys.push(today_key());
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn plain_dates_and_keys() {
        let keys = resolve_date_inputs(&tokens(&["2026-01-01", "2026-01-01-v1", "debug-7"])).unwrap();
        assert_eq!(keys, vec!["2026-01-01-v1", "debug-7"]);
    }

    #[test]
    fn presets_cover_the_calendar() {
        let keys = resolve_date_inputs(&tokens(&["presets"])).unwrap();
        assert_eq!(keys.len(), 14);
        assert_eq!(keys[0], "2025-12-10-v1");
        assert_eq!(keys[13], "2025-12-23-v1");
    }

    #[test]
    fn ranges_are_inclusive() {
        let keys = resolve_date_inputs(&tokens(&["2026-02-27..2026-03-02"])).unwrap();
        assert_eq!(
            keys,
            vec!["2026-02-27-v1", "2026-02-28-v1", "2026-03-01-v1", "2026-03-02-v1"]
        );
        assert!(resolve_date_inputs(&tokens(&["2026-03-02..2026-02-27"])).is_err());
        assert!(resolve_date_inputs(&tokens(&["2026-01-01..2027-06-01"])).is_err());
    }

    #[test]
    fn empty_input_means_today() {
        assert_eq!(resolve_date_inputs(&[]).unwrap(), vec![today_key()]);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(resolve_date_inputs(&tokens(&["yesterday-ish"])).is_err());
        assert!(resolve_date_inputs(&tokens(&["2026-13-45"])).is_err());
    }
}
