//! Shared application state for the Axum server.

use std::sync::Arc;

use comment_push_notifier::dispatcher::NotificationDispatcher;

/// Application state shared across all route handlers via Axum `State`.
pub struct AppState<S> {
    pub dispatcher: Arc<NotificationDispatcher<S>>,
}

impl<S> AppState<S> {
    pub fn new(dispatcher: NotificationDispatcher<S>) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }
}

// Manual impl: the store itself does not need to be `Clone`.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}
