//! Comment notification pipeline.
//!
//! For each new comment:
//! 1. Resolve the solution owner (`solutions/{id}.ownerId`)
//! 2. Drop self-comments
//! 3. Load the owner's push tokens (`users/{ownerId}.huaweiPushTokens`)
//! 4. Fetch a fresh access token and send one multicast notification
//!
//! Steps 1–3 end the invocation quietly when there is nobody to notify.
//! Only token acquisition and delivery can fail.

use serde::Serialize;

use comment_push_common::config::AppConfig;
use comment_push_common::error::AppError;
use comment_push_common::firestore::DocumentStore;
use comment_push_common::types::{
    CommentEvent, SOLUTIONS_COLLECTION, Solution, USERS_COLLECTION, UserProfile,
};

use crate::oauth::OAuthClient;
use crate::payload::NotificationPayload;
use crate::push::PushSender;

/// Why an event ended without a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Solution missing, or it has no owner
    OwnerNotFound,
    SelfComment,
    NoPushTokens,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::OwnerNotFound => write!(f, "owner_not_found"),
            SkipReason::SelfComment => write!(f, "self_comment"),
            SkipReason::NoPushTokens => write!(f, "no_push_tokens"),
        }
    }
}

/// Terminal state of a successful invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent { recipients: usize },
    Skipped(SkipReason),
}

/// Decide who, if anyone, should hear about a comment.
///
/// Returns the owner id, or the reason to stay silent.
pub fn notification_recipient<'a>(
    author_user_id: &str,
    owner_id: Option<&'a str>,
) -> Result<&'a str, SkipReason> {
    match owner_id {
        None => Err(SkipReason::OwnerNotFound),
        Some(owner) if owner == author_user_id => Err(SkipReason::SelfComment),
        Some(owner) => Ok(owner),
    }
}

/// Orchestrates owner lookup, token lookup, OAuth and push delivery.
pub struct NotificationDispatcher<S> {
    store: S,
    oauth: OAuthClient,
    push: PushSender,
    deep_link_base: String,
}

impl<S: DocumentStore> NotificationDispatcher<S> {
    pub fn new(
        store: S,
        oauth: OAuthClient,
        push: PushSender,
        deep_link_base: impl Into<String>,
    ) -> Self {
        Self {
            store,
            oauth,
            push,
            deep_link_base: deep_link_base.into(),
        }
    }

    /// Wire the provider clients from configuration, sharing one HTTP client.
    pub fn from_config(store: S, http: reqwest::Client, config: &AppConfig) -> Self {
        Self::new(
            store,
            OAuthClient::from_config(http.clone(), config),
            PushSender::from_config(http, config),
            &config.deep_link_base,
        )
    }

    /// Owner of a solution, if the solution exists and names one.
    pub async fn resolve_owner(&self, solution_id: &str) -> Result<Option<String>, AppError> {
        let document = self
            .store
            .get_document(SOLUTIONS_COLLECTION, solution_id)
            .await?;
        Ok(document.and_then(|doc| Solution::from_document(&doc).owner_id))
    }

    /// Registered push tokens of a user; empty when the user or field is missing.
    pub async fn push_tokens(&self, owner_id: &str) -> Result<Vec<String>, AppError> {
        let document = self.store.get_document(USERS_COLLECTION, owner_id).await?;
        Ok(document
            .map(|doc| UserProfile::from_document(&doc).push_tokens)
            .unwrap_or_default())
    }

    /// Run the full pipeline for one comment.
    pub async fn dispatch(&self, event: &CommentEvent) -> Result<DispatchOutcome, AppError> {
        let owner_id = self.resolve_owner(&event.solution_id).await?;

        let owner_id = match notification_recipient(&event.author_user_id, owner_id.as_deref()) {
            Ok(owner) => owner.to_string(),
            Err(reason) => {
                tracing::info!(
                    solution_id = %event.solution_id,
                    reason = %reason,
                    "Skipping notification: self-comment or owner not found"
                );
                return Ok(DispatchOutcome::Skipped(reason));
            }
        };

        let tokens = self.push_tokens(&owner_id).await?;
        if tokens.is_empty() {
            tracing::info!(owner_id = %owner_id, "Owner has no push tokens");
            return Ok(DispatchOutcome::Skipped(SkipReason::NoPushTokens));
        }

        let access_token = self.oauth.fetch_access_token().await?;

        let payload = NotificationPayload::for_comment(event, tokens, &self.deep_link_base);
        let receipt = self.push.send(&access_token, &payload).await?;

        let recipients = payload.recipient_tokens.len();
        tracing::info!(
            owner_id = %owner_id,
            recipients,
            code = receipt.code.as_deref().unwrap_or(""),
            "Notification sent"
        );

        Ok(DispatchOutcome::Sent { recipients })
    }
}
