//! Firestore `document.created` trigger for solution comments.
//!
//! Eventarc delivers the event as a CloudEvent in binary mode: metadata in
//! `ce-*` headers, `DocumentEventData` JSON in the body. Success and quiet
//! skips answer 200; provider or store failures answer 5xx so the event is
//! redelivered.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tracing::Instrument;
use uuid::Uuid;

use comment_push_common::error::AppError;
use comment_push_common::firestore::{DocumentEventData, DocumentStore};
use comment_push_common::types::CommentEvent;
use comment_push_notifier::dispatcher::DispatchOutcome;

use crate::state::AppState;

pub fn router<S: DocumentStore>() -> Router<AppState<S>> {
    Router::new().route("/", post(comment_created::<S>))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// POST / — Notify the solution owner about a newly created comment.
async fn comment_created<S: DocumentStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Json(data): Json<DocumentEventData>,
) -> Result<Json<serde_json::Value>, AppError> {
    let invocation_id = header_str(&headers, "ce-id")
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let Some(document) = data.value else {
        tracing::info!(
            invocation_id = %invocation_id,
            ce_type = header_str(&headers, "ce-type").unwrap_or(""),
            "Event carries no document, ignoring"
        );
        return Ok(Json(json!({ "status": "ignored" })));
    };

    let event = CommentEvent::from_document(&document).inspect_err(|e| {
        tracing::warn!(
            invocation_id = %invocation_id,
            subject = header_str(&headers, "ce-subject").unwrap_or(""),
            error = %e,
            "Rejecting event"
        );
    })?;

    let span = tracing::info_span!(
        "comment_created",
        invocation_id = %invocation_id,
        solution_id = %event.solution_id,
        comment_id = %event.comment_id,
    );

    let outcome = state
        .dispatcher
        .dispatch(&event)
        .instrument(span.clone())
        .await;

    match outcome {
        Ok(DispatchOutcome::Sent { recipients }) => Ok(Json(json!({
            "status": "sent",
            "recipients": recipients
        }))),
        Ok(DispatchOutcome::Skipped(reason)) => Ok(Json(json!({
            "status": "skipped",
            "reason": reason
        }))),
        Err(e) => {
            tracing::error!(parent: &span, error = %e, "Comment notification failed");
            Err(e)
        }
    }
}
