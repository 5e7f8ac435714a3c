use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use offcharts_game::{
    AppealRequest, GatewayError, ScoreRequest, ScoreService, Variant, daily_puzzle, date_key_for,
    today_key,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    service: Arc<dyn ScoreService>,
}

impl AppState {
    pub fn new(service: Arc<dyn ScoreService>) -> Self {
        Self { service }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/score", post(score))
        .route("/api/appeal", post(appeal))
        .route("/api/daily", get(daily))
        .route("/healthz", get(healthz))
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn gateway_failure(err: &GatewayError) -> Response {
    if err.is_client_error() {
        error_response(StatusCode::BAD_REQUEST, err.to_string())
    } else {
        log::error!("generation failed: {err}");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

async fn score(
    State(state): State<AppState>,
    payload: Result<Json<ScoreRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    match &request {
        ScoreRequest::Pair(req) => log::info!(
            "score pair {}/{} noun={:?} history={}",
            req.adjective1,
            req.adjective2,
            req.noun,
            req.previous_nouns.len()
        ),
        ScoreRequest::Single(req) => log::info!(
            "score single {} noun={:?} history={}",
            req.adjective,
            req.noun,
            req.previous_nouns.len()
        ),
    }
    match state.service.score(request).await {
        Ok(reply) => Json(reply).into_response(),
        Err(err) => gateway_failure(&err),
    }
}

async fn appeal(
    State(state): State<AppState>,
    payload: Result<Json<AppealRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    match state.service.appeal(request).await {
        Ok(reply) => {
            log::info!("appeal decided, accepted={}", reply.accepted());
            Json(reply).into_response()
        }
        Err(err) => gateway_failure(&err),
    }
}

#[derive(Debug, Deserialize)]
struct DailyQuery {
    variant: Option<String>,
    date: Option<String>,
}

async fn daily(Query(query): Query<DailyQuery>) -> Response {
    let variant = match query.variant.as_deref() {
        None => Variant::default(),
        Some(raw) => match raw.parse::<Variant>() {
            Ok(variant) => variant,
            Err(()) => {
                return error_response(StatusCode::BAD_REQUEST, format!("unknown variant: {raw}"));
            }
        },
    };
    let date_key = match query.date.as_deref() {
        None => today_key(),
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => date_key_for(date),
            Err(_) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("date must be YYYY-MM-DD, got {raw}"),
                );
            }
        },
    };
    Json(daily_puzzle(&date_key, variant)).into_response()
}

async fn healthz() -> &'static str {
    "ok"
}
