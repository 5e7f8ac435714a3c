//! Scoring and appeal gateways.
//!
//! A [`Gateway`] validates a request, builds the grading prompt, hands it to a
//! [`TextGenerator`], and parses whatever comes back. Transport concerns (HTTP,
//! credentials, model selection) belong to the generator implementation.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::api::{AppealReply, AppealRequest, ScoreReply, ScoreRequest};
use crate::constants::{APPEAL_MAX_OUTPUT_TOKENS, SCORE_MAX_OUTPUT_TOKENS};
use crate::parse::{parse_pair_appeal, parse_pair_score, parse_single_appeal, parse_single_score};
use crate::prompt::{pair_appeal_prompt, pair_score_prompt, single_appeal_prompt, single_score_prompt};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("text generation failed: {0}")]
    Backend(String),
    #[error("text generation returned status {status}: {body}")]
    Status { status: u16, body: String },
}

impl GatewayError {
    /// Whether the caller sent a bad request, as opposed to a backend failure.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::MissingField(_) | Self::InvalidField { .. })
    }
}

/// Effort hint forwarded to generators that support it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Effort {
    #[default]
    Low,
    Medium,
    High,
}

impl Effort {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// One generation call: a single system-role prompt plus output hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub max_output_tokens: u32,
    pub reasoning_effort: Effort,
    pub verbosity: Effort,
}

impl GenerationRequest {
    #[must_use]
    pub fn new(system_prompt: String, max_output_tokens: u32) -> Self {
        Self {
            system_prompt,
            max_output_tokens,
            reasoning_effort: Effort::Low,
            verbosity: Effort::Low,
        }
    }
}

/// Text-generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce the model's raw text for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Backend`] or [`GatewayError::Status`] when the
    /// backend cannot be reached or refuses the call.
    async fn generate(&self, request: GenerationRequest) -> Result<String, GatewayError>;
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Arc<T> {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GatewayError> {
        (**self).generate(request).await
    }
}

/// Anything that can grade answers and judge appeals.
#[async_trait]
pub trait ScoreService: Send + Sync {
    /// # Errors
    ///
    /// Returns a client error for malformed requests or a backend error when
    /// grading could not be performed.
    async fn score(&self, request: ScoreRequest) -> Result<ScoreReply, GatewayError>;

    /// # Errors
    ///
    /// Same failure modes as [`ScoreService::score`].
    async fn appeal(&self, request: AppealRequest) -> Result<AppealReply, GatewayError>;
}

#[async_trait]
impl<T: ScoreService + ?Sized> ScoreService for Arc<T> {
    async fn score(&self, request: ScoreRequest) -> Result<ScoreReply, GatewayError> {
        (**self).score(request).await
    }

    async fn appeal(&self, request: AppealRequest) -> Result<AppealReply, GatewayError> {
        (**self).appeal(request).await
    }
}

/// Prompt-and-parse pipeline over a [`TextGenerator`].
#[derive(Debug, Clone)]
pub struct Gateway<G> {
    generator: G,
}

impl<G: TextGenerator> Gateway<G> {
    pub const fn new(generator: G) -> Self {
        Self { generator }
    }

    pub const fn generator(&self) -> &G {
        &self.generator
    }

    async fn run(&self, prompt: String, max_output_tokens: u32) -> Result<String, GatewayError> {
        let request = GenerationRequest::new(prompt, max_output_tokens);
        let text = self.generator.generate(request).await?;
        log::debug!("generator returned {} chars", text.len());
        Ok(text)
    }
}

#[async_trait]
impl<G: TextGenerator> ScoreService for Gateway<G> {
    async fn score(&self, request: ScoreRequest) -> Result<ScoreReply, GatewayError> {
        request.validate()?;
        match request {
            ScoreRequest::Pair(req) => {
                let prompt =
                    pair_score_prompt(&req.adjective1, &req.adjective2, &req.noun, &req.previous_nouns);
                let text = self.run(prompt, SCORE_MAX_OUTPUT_TOKENS).await?;
                Ok(ScoreReply::Pair(parse_pair_score(&text)))
            }
            ScoreRequest::Single(req) => {
                let prompt = single_score_prompt(
                    &req.adjective,
                    &req.noun,
                    &req.previous_nouns,
                    req.placeholder_category.as_deref(),
                );
                let text = self.run(prompt, SCORE_MAX_OUTPUT_TOKENS).await?;
                let answer_count = req.previous_nouns.len() + 1;
                Ok(ScoreReply::Single(parse_single_score(&text, answer_count)))
            }
        }
    }

    async fn appeal(&self, request: AppealRequest) -> Result<AppealReply, GatewayError> {
        request.validate()?;
        match request {
            AppealRequest::Pair(req) => {
                let original = (
                    crate::numbers::clamp_score(req.original_score1),
                    crate::numbers::clamp_score(req.original_score2),
                );
                let prompt = pair_appeal_prompt(
                    &req.adjective1,
                    &req.adjective2,
                    &req.noun,
                    original,
                    req.original_reasoning.as_deref(),
                    &req.appeal_text,
                );
                let text = self.run(prompt, APPEAL_MAX_OUTPUT_TOKENS).await?;
                Ok(AppealReply::Pair(parse_pair_appeal(
                    &text,
                    req.original_score1,
                    req.original_score2,
                )))
            }
            AppealRequest::Single(req) => {
                let prompt = single_appeal_prompt(
                    &req.adjective,
                    &req.noun,
                    crate::numbers::clamp_score(req.original_score),
                    req.original_reasoning.as_deref(),
                    &req.appeal_text,
                );
                let text = self.run(prompt, APPEAL_MAX_OUTPUT_TOKENS).await?;
                Ok(AppealReply::Single(parse_single_appeal(&text, req.original_score)))
            }
        }
    }
}
