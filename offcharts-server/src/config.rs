use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-5-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, Parser)]
#[command(name = "offcharts-server", version)]
#[command(about = "Scoring and appeal service for Off the Charts")]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "OFFCHARTS_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// API key for the hosted model
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model used for grading and appeals
    #[arg(long, env = "OFFCHARTS_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OFFCHARTS_LLM_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub llm_base_url: String,

    /// Upper bound applied to every generation's output length
    #[arg(long)]
    pub max_output_tokens: Option<u32>,

    /// Timeout for each outbound model call, in seconds
    #[arg(long, default_value_t = 30)]
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Key with surrounding whitespace removed; blank keys count as missing.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}
