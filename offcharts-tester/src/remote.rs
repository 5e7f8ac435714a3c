use async_trait::async_trait;
use offcharts_game::{
    AppealReply, AppealRequest, DailyPuzzle, GatewayError, ScoreReply, ScoreRequest,
    ScoreService, Variant,
};
use offcharts_game::daily::key_date;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// [`ScoreService`] backed by a running `offcharts-server`.
#[derive(Debug, Clone)]
pub struct HttpScoreService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpScoreService {
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be constructed.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Backend(format!("client setup failed: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| GatewayError::Backend(format!("unreadable reply: {e}")));
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(body);
        if status == reqwest::StatusCode::BAD_REQUEST {
            Err(GatewayError::InvalidField {
                field: "request",
                reason: message,
            })
        } else {
            Err(GatewayError::Status {
                status: status.as_u16(),
                body: message,
            })
        }
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Backend(e.to_string()))?;
        Self::read(response).await
    }

    /// Ask the server which adjectives it serves for a date.
    ///
    /// # Errors
    ///
    /// Fails when the server is unreachable or rejects the query.
    pub async fn daily(&self, variant: Variant, date_key: &str) -> Result<DailyPuzzle, GatewayError> {
        let mut request = self
            .client
            .get(self.url("/api/daily"))
            .query(&[("variant", variant.as_str())]);
        if let Some(date) = key_date(date_key) {
            request = request.query(&[("date", date.format("%Y-%m-%d").to_string())]);
        }
        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Backend(e.to_string()))?;
        Self::read(response).await
    }
}

#[async_trait]
impl ScoreService for HttpScoreService {
    async fn score(&self, request: ScoreRequest) -> Result<ScoreReply, GatewayError> {
        self.post("/api/score", &request).await
    }

    async fn appeal(&self, request: AppealRequest) -> Result<AppealReply, GatewayError> {
        self.post("/api/appeal", &request).await
    }
}
