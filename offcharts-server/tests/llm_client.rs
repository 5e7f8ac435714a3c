use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use clap::Parser;
use offcharts_game::{GatewayError, GenerationRequest, TextGenerator};
use offcharts_server::{OpenAiGenerator, ServerConfig};
use serde_json::{Value, json};
use std::net::SocketAddr;

async fn fake_responses(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some("Bearer sk-test") => {}
        Some("Bearer sk-accepted") => {
            return (
                StatusCode::ACCEPTED,
                Json(json!({ "output_text": "{\"score\": 6, \"reasoning\": \"late\"}" })),
            );
        }
        _ => return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "bad key" }))),
    }
    let prompt = body["input"][0]["content"].as_str().unwrap_or_default();
    let text = format!("{{\"score\": {}, \"reasoning\": \"echo\"}}", prompt.len() % 10 + 1);
    (
        StatusCode::OK,
        Json(json!({
            "output": [
                { "type": "message", "content": [ { "type": "output_text", "text": text } ] }
            ]
        })),
    )
}

async fn spawn_upstream() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = Router::new().route("/v1/responses", post(fake_responses));
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn generator(addr: SocketAddr, key: &str) -> OpenAiGenerator {
    let base = format!("http://{addr}/v1/");
    let config = ServerConfig::try_parse_from([
        "offcharts-server",
        "--llm-base-url",
        base.as_str(),
        "--api-key",
        key,
        "--request-timeout-secs",
        "5",
    ])
    .unwrap();
    OpenAiGenerator::from_config(&config).unwrap()
}

#[tokio::test]
async fn generator_reads_message_text() {
    let addr = spawn_upstream().await;
    let text = generator(addr, "sk-test")
        .generate(GenerationRequest::new("abc".to_string(), 100))
        .await
        .unwrap();
    assert_eq!(text, "{\"score\": 4, \"reasoning\": \"echo\"}");
}

#[tokio::test]
async fn any_success_status_is_read() {
    let addr = spawn_upstream().await;
    let text = generator(addr, "sk-accepted")
        .generate(GenerationRequest::new("abc".to_string(), 100))
        .await
        .unwrap();
    assert_eq!(text, "{\"score\": 6, \"reasoning\": \"late\"}");
}

#[tokio::test]
async fn upstream_rejection_reports_status() {
    let addr = spawn_upstream().await;
    let err = generator(addr, "sk-wrong")
        .generate(GenerationRequest::new("abc".to_string(), 100))
        .await
        .unwrap_err();
    match err {
        GatewayError::Status { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("bad key"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unreachable_upstream_is_a_backend_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = generator(addr, "sk-test")
        .generate(GenerationRequest::new("abc".to_string(), 100))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Backend(_)));
}
