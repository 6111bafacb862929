//! Briefing page and JSON API handlers

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::json;
use shared::{BriefingDocument, BriefingPage, BriefingStore};
use std::sync::Arc;
use tracing::{error, warn};

pub type SharedStore = Arc<BriefingStore>;

pub fn create_router(store: SharedStore) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/briefing", get(api_briefing))
        .route("/health", get(health))
        .with_state(store)
}

/// GET / - the styled briefing, or the empty state when nothing is stored
pub async fn index(State(store): State<SharedStore>) -> Response {
    let raw = match store.get_raw().await {
        Ok(raw) => raw,
        Err(e) => {
            error!(error = %e, "failed to read briefing");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read briefing").into_response();
        }
    };

    let Some(raw) = raw else {
        return Html(BriefingPage::render_empty()).into_response();
    };

    match serde_json::from_str::<BriefingDocument>(&raw) {
        Ok(doc) => Html(BriefingPage::render(&doc)).into_response(),
        Err(e) => {
            warn!(error = %e, "stored briefing is not a valid document");
            Html(BriefingPage::render_empty()).into_response()
        }
    }
}

/// GET /api/briefing - stored JSON exactly as written
pub async fn api_briefing(State(store): State<SharedStore>) -> Response {
    match store.get_raw().await {
        Ok(Some(raw)) => ([(header::CONTENT_TYPE, "application/json")], raw).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "No briefing data" })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to read briefing");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to read briefing" })),
            )
                .into_response()
        }
    }
}

pub async fn health() -> impl IntoResponse {
    "OK"
}
