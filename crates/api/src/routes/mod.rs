pub mod events;
pub mod health;

use axum::Router;

use comment_push_common::firestore::DocumentStore;

use crate::state::AppState;

/// Build the complete router: the event trigger plus health.
pub fn create_router<S: DocumentStore>(state: AppState<S>) -> Router {
    Router::new()
        .merge(health::router())
        .merge(events::router())
        .with_state(state)
}
