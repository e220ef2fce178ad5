//! Notification content for a new comment, and its Push Kit wire format.

use serde::Serialize;

use comment_push_common::types::CommentEvent;

/// Number of comment characters quoted in the notification body.
pub const PREVIEW_CHARS: usize = 50;

/// Push Kit click action type that opens a custom intent URI.
pub const CLICK_ACTION_INTENT: u8 = 1;

/// Content of one multicast notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub deep_link_target: String,
    /// Device tokens, passed through unmodified
    pub recipient_tokens: Vec<String>,
}

impl NotificationPayload {
    /// Build the notification telling a solution owner about a new comment.
    pub fn for_comment(
        event: &CommentEvent,
        recipient_tokens: Vec<String>,
        deep_link_base: &str,
    ) -> Self {
        Self {
            title: comment_title(&event.author_username),
            body: comment_preview(&event.text),
            deep_link_target: post_detail_intent(deep_link_base, &event.solution_id),
            recipient_tokens,
        }
    }

    /// Request body for `POST /v1/{client_id}/messages:send`.
    pub fn to_message(&self) -> PushMessage {
        PushMessage {
            message: Message {
                notification: Notification {
                    title: self.title.clone(),
                    body: self.body.clone(),
                },
                android: AndroidConfig {
                    notification: AndroidNotification {
                        click_action: ClickAction {
                            action_type: CLICK_ACTION_INTENT,
                            intent: self.deep_link_target.clone(),
                        },
                    },
                },
                token: self.recipient_tokens.clone(),
            },
        }
    }
}

pub fn comment_title(username: &str) -> String {
    format!("{} commented on your post!", username)
}

/// Quoted preview: the first 50 characters followed by `...`.
///
/// The ellipsis is appended unconditionally, short comments included.
pub fn comment_preview(text: &str) -> String {
    let preview: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("\"{}...\"", preview)
}

pub fn post_detail_intent(deep_link_base: &str, solution_id: &str) -> String {
    format!(
        "{}/post_detail?postId={}",
        deep_link_base.trim_end_matches('/'),
        solution_id
    )
}

#[derive(Debug, Clone, Serialize)]
pub struct PushMessage {
    pub message: Message,
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub notification: Notification,
    pub android: AndroidConfig,
    pub token: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AndroidConfig {
    pub notification: AndroidNotification,
}

#[derive(Debug, Clone, Serialize)]
pub struct AndroidNotification {
    pub click_action: ClickAction,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClickAction {
    #[serde(rename = "type")]
    pub action_type: u8,
    pub intent: String,
}
