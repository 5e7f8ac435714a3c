//! Model reply parsing.
//!
//! Replies are untrusted free text. Each response shape has one parser that
//! applies the same three tiers:
//!
//! | Tier | Source |
//! |------|--------|
//! | [`ParseTier::Json`] | the reply (or a fenced / brace-delimited slice of it) decodes as a JSON object |
//! | [`ParseTier::Extracted`] | regular expressions recover `"key": value` pairs from broken JSON or prose |
//! | [`ParseTier::Fallback`] | nothing usable; safe defaults apply |
//!
//! Every score leaving this module is rounded and clamped into `[1, 10]`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::api::{PairAppealReply, PairScoreReply, SingleAppealReply, SingleScoreReply};
use crate::constants::FALLBACK_SCORE;
use crate::numbers::{clamp_score, round_to_score};

static NUMBER_FIELD: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r#""?\b([A-Za-z_][A-Za-z0-9_]*)"?\s*[:=]\s*"?(-?\d+(?:\.\d+)?)"#)
        .ok()
});

static STRING_FIELD: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r#""([A-Za-z_][A-Za-z0-9_]*)"\s*:\s*"((?:[^"\\]|\\.)*)"?"#)
        .ok()
});

static BOOL_FIELD: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r#""?\b([A-Za-z_][A-Za-z0-9_]*)"?\s*:\s*"?(true|false)\b"#)
        .ok()
});

static FENCED_BLOCK: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").ok()
});

/// Which tier produced the parsed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseTier {
    Json,
    Extracted,
    Fallback,
}

/// Flattened view of the fields recovered from a reply.
///
/// Keys are folded to lowercase with underscores removed, so `newScore1`,
/// `new_score1` and `NEWSCORE1` all land on `newscore1`.
#[derive(Debug, Clone, Default)]
pub struct ReplyFields {
    numbers: HashMap<String, f64>,
    strings: HashMap<String, String>,
    bools: HashMap<String, bool>,
}

fn fold_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl ReplyFields {
    fn is_empty(&self) -> bool {
        self.numbers.is_empty() && self.strings.is_empty() && self.bools.is_empty()
    }

    fn from_object(object: &Map<String, Value>) -> Self {
        let mut fields = Self::default();
        for (key, value) in object {
            let key = fold_key(key);
            match value {
                Value::Number(n) => {
                    if let Some(v) = n.as_f64() {
                        fields.numbers.insert(key, v);
                    }
                }
                Value::String(s) => {
                    if let Ok(v) = s.trim().parse::<f64>() {
                        fields.numbers.insert(key.clone(), v);
                    }
                    match s.trim().to_ascii_lowercase().as_str() {
                        "true" => {
                            fields.bools.insert(key.clone(), true);
                        }
                        "false" => {
                            fields.bools.insert(key.clone(), false);
                        }
                        _ => {}
                    }
                    fields.strings.insert(key, s.clone());
                }
                Value::Bool(b) => {
                    fields.bools.insert(key, *b);
                }
                _ => {}
            }
        }
        fields
    }

    fn from_patterns(text: &str) -> Self {
        let mut fields = Self::default();
        for caps in NUMBER_FIELD.iter().flat_map(|re| re.captures_iter(text)) {
            if let Ok(v) = caps[2].parse::<f64>() {
                fields.numbers.entry(fold_key(&caps[1])).or_insert(v);
            }
        }
        for caps in STRING_FIELD.iter().flat_map(|re| re.captures_iter(text)) {
            let raw = &caps[2];
            let decoded = serde_json::from_str::<String>(&format!("\"{raw}\""))
                .unwrap_or_else(|_| raw.to_string());
            fields.strings.entry(fold_key(&caps[1])).or_insert(decoded);
        }
        for caps in BOOL_FIELD.iter().flat_map(|re| re.captures_iter(text)) {
            fields
                .bools
                .entry(fold_key(&caps[1]))
                .or_insert(&caps[2] == "true");
        }
        fields
    }

    /// Recover fields from a raw reply, reporting which tier succeeded.
    #[must_use]
    pub fn parse(text: &str) -> (Self, ParseTier) {
        if let Some(object) = decode_object(text) {
            return (Self::from_object(&object), ParseTier::Json);
        }
        let extracted = Self::from_patterns(text);
        if extracted.is_empty() {
            (extracted, ParseTier::Fallback)
        } else {
            (extracted, ParseTier::Extracted)
        }
    }

    fn number(&self, key: &str) -> Option<f64> {
        self.numbers.get(key).copied()
    }

    fn score(&self, key: &str) -> Option<u8> {
        self.number(key).and_then(round_to_score)
    }

    fn string(&self, key: &str) -> Option<String> {
        self.strings.get(key).map(|s| s.trim().to_string())
    }

    fn flag(&self, key: &str) -> Option<bool> {
        self.bools.get(key).copied()
    }
}

fn object_from(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

/// Strict decode: the whole reply, then a fenced block, then the outermost braces.
fn decode_object(text: &str) -> Option<Map<String, Value>> {
    if let Some(object) = object_from(text) {
        return Some(object);
    }
    if let Some(caps) = FENCED_BLOCK.as_ref().and_then(|re| re.captures(text))
        && let Some(object) = object_from(&caps[1])
    {
        return Some(object);
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    object_from(&text[start..=end])
}

fn note_tier(shape: &str, tier: ParseTier) {
    match tier {
        ParseTier::Json => {}
        ParseTier::Extracted => log::warn!("{shape}: reply was not valid JSON; recovered fields by pattern"),
        ParseTier::Fallback => log::warn!("{shape}: reply held no recognizable fields; using defaults"),
    }
}

/// Parse a two-adjective scoring reply.
#[must_use]
pub fn parse_pair_score(text: &str) -> PairScoreReply {
    let (fields, tier) = ReplyFields::parse(text);
    note_tier("pair score", tier);
    PairScoreReply {
        score1: fields.score("score1").unwrap_or(FALLBACK_SCORE),
        reasoning1: fields.string("reasoning1").unwrap_or_default(),
        score2: fields.score("score2").unwrap_or(FALLBACK_SCORE),
        reasoning2: fields.string("reasoning2").unwrap_or_default(),
    }
}

/// Parse a single-adjective scoring reply.
///
/// `answer_count` is the number of labelled answers in the prompt; a
/// favorite label outside `1..=answer_count` is dropped.
#[must_use]
pub fn parse_single_score(text: &str, answer_count: usize) -> SingleScoreReply {
    let (fields, tier) = ReplyFields::parse(text);
    note_tier("single score", tier);
    let favorite_index = fields.number("favoriteindex").and_then(|label| {
        if !label.is_finite() || label.fract() != 0.0 || label < 1.0 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let label = label as usize;
        (label <= answer_count).then(|| label - 1)
    });
    SingleScoreReply {
        score: fields.score("score").unwrap_or(FALLBACK_SCORE),
        reasoning: fields.string("reasoning").unwrap_or_default(),
        favorite_index,
    }
}

fn raised(original: u8, proposed: Option<u8>) -> u8 {
    proposed.map_or(original, |score| score.max(original))
}

/// Parse a two-adjective appeal reply. Scores never drop below the originals.
#[must_use]
pub fn parse_pair_appeal(text: &str, original1: i64, original2: i64) -> PairAppealReply {
    let original1 = clamp_score(original1);
    let original2 = clamp_score(original2);
    let (fields, tier) = ReplyFields::parse(text);
    note_tier("pair appeal", tier);
    let proposed1 = fields.score("newscore1");
    let proposed2 = fields.score("newscore2");
    let reasoning = fields.string("reasoning");
    // a decodable reply with none of the expected fields is still a total miss
    if tier == ParseTier::Fallback
        || (proposed1.is_none() && proposed2.is_none() && reasoning.is_none())
    {
        return PairAppealReply {
            new_score1: original1,
            new_score2: original2,
            reasoning: text.trim().to_string(),
            accepted: false,
        };
    }

    let new_score1 = raised(original1, proposed1);
    let new_score2 = raised(original2, proposed2);
    let increased = new_score1 > original1 || new_score2 > original2;
    PairAppealReply {
        new_score1,
        new_score2,
        reasoning: reasoning.unwrap_or_default(),
        accepted: increased || fields.flag("accepted").unwrap_or(false),
    }
}

/// Parse a single-adjective appeal reply. The score never drops below the original.
#[must_use]
pub fn parse_single_appeal(text: &str, original: i64) -> SingleAppealReply {
    let original = clamp_score(original);
    let (fields, tier) = ReplyFields::parse(text);
    note_tier("single appeal", tier);
    let proposed = fields.score("newscore");
    let reasoning = fields.string("reasoning");
    if tier == ParseTier::Fallback || (proposed.is_none() && reasoning.is_none()) {
        return SingleAppealReply {
            new_score: original,
            reasoning: text.trim().to_string(),
            accepted: false,
        };
    }

    let new_score = raised(original, proposed);
    SingleAppealReply {
        new_score,
        reasoning: reasoning.unwrap_or_default(),
        accepted: new_score > original || fields.flag("accepted").unwrap_or(false),
    }
}
