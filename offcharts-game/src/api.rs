//! Wire shapes for the scoring and appeal endpoints.
//!
//! Each endpoint accepts two body shapes, distinguished by field names: the
//! pair shape carries `adjective1`/`adjective2`, the single shape carries
//! `adjective`. Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};
use smallvec::smallvec;

use crate::constants::{MAX_ANSWER_CHARS, MAX_APPEAL_CHARS, MAX_SCORE, MIN_SCORE};
use crate::gateway::GatewayError;
use crate::state::{AppealOutcome, ScoreOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreRequest {
    Pair(PairScoreRequest),
    Single(SingleScoreRequest),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairScoreRequest {
    pub adjective1: String,
    pub adjective2: String,
    pub noun: String,
    #[serde(default)]
    pub previous_nouns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleScoreRequest {
    pub adjective: String,
    pub noun: String,
    #[serde(default)]
    pub previous_nouns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder_category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreReply {
    Pair(PairScoreReply),
    Single(SingleScoreReply),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairScoreReply {
    pub score1: u8,
    pub reasoning1: String,
    pub score2: u8,
    pub reasoning2: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleScoreReply {
    pub score: u8,
    pub reasoning: String,
    /// Zero-based position in `previousNouns + [noun]` of the model's favorite
    /// among tied top answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AppealRequest {
    Pair(PairAppealRequest),
    Single(SingleAppealRequest),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairAppealRequest {
    pub adjective1: String,
    pub adjective2: String,
    pub noun: String,
    pub original_score1: i64,
    pub original_score2: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_reasoning: Option<String>,
    pub appeal_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleAppealRequest {
    pub adjective: String,
    pub noun: String,
    pub original_score: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_reasoning: Option<String>,
    pub appeal_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AppealReply {
    Pair(PairAppealReply),
    Single(SingleAppealReply),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairAppealReply {
    pub new_score1: u8,
    pub new_score2: u8,
    pub reasoning: String,
    pub accepted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleAppealReply {
    pub new_score: u8,
    pub reasoning: String,
    pub accepted: bool,
}

fn require(field: &'static str, value: &str) -> Result<(), GatewayError> {
    if value.trim().is_empty() {
        return Err(GatewayError::MissingField(field));
    }
    Ok(())
}

fn limit(field: &'static str, value: &str, max: usize) -> Result<(), GatewayError> {
    if value.chars().count() > max {
        return Err(GatewayError::InvalidField {
            field,
            reason: format!("longer than {max} characters"),
        });
    }
    Ok(())
}

fn score_bounds(field: &'static str, value: i64) -> Result<(), GatewayError> {
    if !(i64::from(MIN_SCORE)..=i64::from(MAX_SCORE)).contains(&value) {
        return Err(GatewayError::InvalidField {
            field,
            reason: format!("must be between {MIN_SCORE} and {MAX_SCORE}"),
        });
    }
    Ok(())
}

impl ScoreRequest {
    /// Reject blank required fields before any backend call.
    ///
    /// # Errors
    ///
    /// Returns a client error naming the offending field.
    pub fn validate(&self) -> Result<(), GatewayError> {
        match self {
            Self::Pair(req) => {
                require("adjective1", &req.adjective1)?;
                require("adjective2", &req.adjective2)?;
                require("noun", &req.noun)?;
                limit("noun", &req.noun, MAX_ANSWER_CHARS)
            }
            Self::Single(req) => {
                require("adjective", &req.adjective)?;
                require("noun", &req.noun)?;
                limit("noun", &req.noun, MAX_ANSWER_CHARS)
            }
        }
    }
}

impl AppealRequest {
    /// Reject blank required fields and out-of-range original scores before
    /// any backend call.
    ///
    /// # Errors
    ///
    /// Returns a client error naming the offending field.
    pub fn validate(&self) -> Result<(), GatewayError> {
        let (noun, appeal_text) = match self {
            Self::Pair(req) => {
                require("adjective1", &req.adjective1)?;
                require("adjective2", &req.adjective2)?;
                score_bounds("originalScore1", req.original_score1)?;
                score_bounds("originalScore2", req.original_score2)?;
                (&req.noun, &req.appeal_text)
            }
            Self::Single(req) => {
                require("adjective", &req.adjective)?;
                score_bounds("originalScore", req.original_score)?;
                (&req.noun, &req.appeal_text)
            }
        };
        require("noun", noun)?;
        require("appealText", appeal_text)?;
        limit("appealText", appeal_text, MAX_APPEAL_CHARS)
    }
}

impl ScoreReply {
    #[must_use]
    pub fn into_outcome(self) -> ScoreOutcome {
        match self {
            Self::Pair(reply) => ScoreOutcome {
                scores: smallvec![reply.score1, reply.score2],
                reasonings: smallvec![reply.reasoning1, reply.reasoning2],
                favorite_index: None,
            },
            Self::Single(reply) => ScoreOutcome {
                scores: smallvec![reply.score],
                reasonings: smallvec![reply.reasoning],
                favorite_index: reply.favorite_index,
            },
        }
    }
}

impl AppealReply {
    #[must_use]
    pub const fn accepted(&self) -> bool {
        match self {
            Self::Pair(reply) => reply.accepted,
            Self::Single(reply) => reply.accepted,
        }
    }

    #[must_use]
    pub fn into_outcome(self) -> AppealOutcome {
        match self {
            Self::Pair(reply) => AppealOutcome {
                scores: smallvec![reply.new_score1, reply.new_score2],
                reasoning: reply.reasoning,
                accepted: reply.accepted,
            },
            Self::Single(reply) => AppealOutcome {
                scores: smallvec![reply.new_score],
                reasoning: reply.reasoning,
                accepted: reply.accepted,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn score_request_shapes_are_distinguished() {
        let pair: ScoreRequest = serde_json::from_value(json!({
            "adjective1": "sticky",
            "adjective2": "nostalgic",
            "noun": "honey",
            "previousNouns": ["glue"]
        }))
        .unwrap();
        assert!(matches!(pair, ScoreRequest::Pair(ref req) if req.previous_nouns == ["glue"]));

        let single: ScoreRequest = serde_json::from_value(json!({
            "adjective": "sticky",
            "noun": "honey",
            "placeholderCategory": "a food"
        }))
        .unwrap();
        assert!(matches!(
            single,
            ScoreRequest::Single(ref req) if req.placeholder_category.as_deref() == Some("a food")
        ));
    }

    #[test]
    fn missing_noun_matches_no_shape() {
        let result = serde_json::from_value::<ScoreRequest>(json!({ "adjective": "sticky" }));
        assert!(result.is_err());
    }

    #[test]
    fn blank_fields_fail_validation() {
        let req = ScoreRequest::Single(SingleScoreRequest {
            adjective: "sticky".into(),
            noun: "   ".into(),
            previous_nouns: Vec::new(),
            placeholder_category: None,
        });
        assert_eq!(req.validate(), Err(GatewayError::MissingField("noun")));
    }

    #[test]
    fn appeal_text_is_bounded() {
        let req = AppealRequest::Single(SingleAppealRequest {
            adjective: "sticky".into(),
            noun: "honey".into(),
            original_score: 6,
            original_reasoning: None,
            appeal_text: "x".repeat(MAX_APPEAL_CHARS + 1),
        });
        assert!(matches!(
            req.validate(),
            Err(GatewayError::InvalidField {
                field: "appealText",
                ..
            })
        ));
    }

    #[test]
    fn appeal_originals_must_be_playable_scores() {
        let req = AppealRequest::Pair(PairAppealRequest {
            adjective1: "sticky".into(),
            adjective2: "nostalgic".into(),
            noun: "honey".into(),
            original_score1: 12,
            original_score2: 4,
            original_reasoning: None,
            appeal_text: "It is both.".into(),
        });
        assert!(matches!(
            req.validate(),
            Err(GatewayError::InvalidField {
                field: "originalScore1",
                ..
            })
        ));

        let req = AppealRequest::Single(SingleAppealRequest {
            adjective: "sticky".into(),
            noun: "honey".into(),
            original_score: 0,
            original_reasoning: None,
            appeal_text: "It is sticky.".into(),
        });
        assert!(req.validate().is_err());
    }

    #[test]
    fn replies_serialize_camel_case() {
        let reply = ScoreReply::Single(SingleScoreReply {
            score: 7,
            reasoning: "nice".into(),
            favorite_index: Some(0),
        });
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({ "score": 7, "reasoning": "nice", "favoriteIndex": 0 })
        );

        let appeal = AppealReply::Pair(PairAppealReply {
            new_score1: 6,
            new_score2: 9,
            reasoning: "ok".into(),
            accepted: true,
        });
        assert_eq!(
            serde_json::to_value(&appeal).unwrap(),
            json!({ "newScore1": 6, "newScore2": 9, "reasoning": "ok", "accepted": true })
        );
    }

    #[test]
    fn pair_reply_converts_to_outcome() {
        let outcome = ScoreReply::Pair(PairScoreReply {
            score1: 4,
            reasoning1: "a".into(),
            score2: 9,
            reasoning2: "b".into(),
        })
        .into_outcome();
        assert_eq!(outcome.scores.as_slice(), &[4, 9]);
        assert_eq!(outcome.reasonings.len(), 2);
    }
}
