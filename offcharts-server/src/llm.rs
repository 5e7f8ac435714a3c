//! Hosted language-model client speaking the OpenAI Responses API.

use async_trait::async_trait;
use offcharts_game::{GatewayError, GenerationRequest, TextGenerator};
use serde_json::{Value, json};

use crate::config::ServerConfig;

const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Debug, Clone)]
pub struct OpenAiGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    output_cap: Option<u32>,
}

impl OpenAiGenerator {
    /// Build a client from server configuration.
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be constructed.
    pub fn from_config(config: &ServerConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.llm_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key().map(str::to_string),
            model: config.model.clone(),
            output_cap: config.max_output_tokens,
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/responses", self.base_url)
    }

    /// JSON body sent for one generation.
    #[must_use]
    pub fn request_body(&self, request: &GenerationRequest) -> Value {
        let max_output_tokens = self
            .output_cap
            .map_or(request.max_output_tokens, |cap| cap.min(request.max_output_tokens));
        json!({
            "model": self.model,
            "input": [
                { "role": "system", "content": request.system_prompt }
            ],
            "max_output_tokens": max_output_tokens,
            "reasoning": { "effort": request.reasoning_effort.as_str() },
            "text": { "verbosity": request.verbosity.as_str() },
        })
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

/// Pull the generated text out of a Responses API payload.
///
/// Prefers the aggregated `output_text` field and falls back to joining every
/// `output[].content[].text` part.
#[must_use]
pub fn extract_output_text(payload: &Value) -> Option<String> {
    if let Some(text) = payload.get("output_text").and_then(Value::as_str)
        && !text.trim().is_empty()
    {
        return Some(text.to_string());
    }

    let parts: Vec<&str> = payload
        .get("output")?
        .as_array()?
        .iter()
        .filter_map(|item| item.get("content")?.as_array())
        .flatten()
        .filter_map(|part| part.get("text")?.as_str())
        .collect();
    (!parts.is_empty()).then(|| parts.concat())
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GatewayError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(GatewayError::Backend("OPENAI_API_KEY is not set".to_string()));
        };

        let body = self.request_body(&request);
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| GatewayError::Backend(err.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| GatewayError::Backend(err.to_string()))?;
        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body: truncate(&text),
            });
        }

        let payload: Value = serde_json::from_str(&text)
            .map_err(|err| GatewayError::Backend(format!("malformed response: {err}")))?;
        // an empty completion still goes through the parser and falls back to defaults
        Ok(extract_output_text(&payload).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn generator(extra: &[&str]) -> OpenAiGenerator {
        let mut args = vec!["offcharts-server", "--model", "gpt-test", "--api-key", "sk-test"];
        args.extend_from_slice(extra);
        OpenAiGenerator::from_config(&ServerConfig::try_parse_from(args).unwrap()).unwrap()
    }

    #[test]
    fn body_carries_prompt_and_hints() {
        let generator = generator(&[]);
        let body = generator.request_body(&GenerationRequest::new("judge this".into(), 400));
        assert_eq!(body["model"], "gpt-test");
        assert_eq!(body["input"][0]["role"], "system");
        assert_eq!(body["input"][0]["content"], "judge this");
        assert_eq!(body["max_output_tokens"], 400);
        assert_eq!(body["reasoning"]["effort"], "low");
        assert_eq!(body["text"]["verbosity"], "low");
    }

    #[test]
    fn configured_cap_bounds_output() {
        let generator = generator(&["--max-output-tokens", "128"]);
        let body = generator.request_body(&GenerationRequest::new("x".into(), 500));
        assert_eq!(body["max_output_tokens"], 128);
    }

    #[test]
    fn output_text_is_preferred() {
        let payload = json!({ "output_text": "{\"score\": 7}", "output": [] });
        assert_eq!(extract_output_text(&payload).as_deref(), Some("{\"score\": 7}"));
    }

    #[test]
    fn output_parts_are_joined() {
        let payload = json!({
            "output": [
                { "type": "reasoning", "summary": [] },
                { "type": "message", "content": [
                    { "type": "output_text", "text": "{\"score\": " },
                    { "type": "output_text", "text": "8}" }
                ]}
            ]
        });
        assert_eq!(extract_output_text(&payload).as_deref(), Some("{\"score\": 8}"));
        assert_eq!(extract_output_text(&json!({ "output": [] })), None);
    }
}
