use crate::collectors::collect_snapshot;
use crate::config::Config;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header::CONTENT_LENGTH, header::CONTENT_TYPE, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Router};
use std::sync::Arc;
use tracing::error;

#[derive(Clone)]
pub struct HttpAppState {
    pub config: Arc<Config>,
}

/// `GET /metrics` returns the JSON snapshot; every other path or method is a bare 404.
pub fn build_router(config: Arc<Config>) -> Router {
    Router::new()
        .route(
            "/metrics",
            get(metrics_handler).head(not_found).fallback(not_found),
        )
        .fallback(not_found)
        .with_state(HttpAppState { config })
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn metrics_handler(State(state): State<HttpAppState>) -> Response {
    let snapshot = match collect_snapshot(&state.config.sources).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            error!(error = %err, "не удалось собрать снимок метрик");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let body = match serde_json::to_vec(&snapshot) {
        Ok(body) => body,
        Err(err) => {
            error!(error = %err, "ошибка сериализации снимка");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let len = body.len();
    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
    response
}
