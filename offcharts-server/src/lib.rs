//! Off the Charts scoring service.
//!
//! Exposes the scoring and appeal gateways over HTTP and supplies the hosted
//! model client they grade with.

pub mod config;
pub mod llm;
pub mod routes;

pub use config::ServerConfig;
pub use llm::OpenAiGenerator;
pub use routes::{AppState, app};
