//! Health check endpoint.

use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use comment_push_common::firestore::DocumentStore;

use crate::state::AppState;

pub fn router<S: DocumentStore>() -> Router<AppState<S>> {
    Router::new().route("/health", get(health_check))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "comment-push-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
