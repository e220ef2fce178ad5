//! Push gateway delivery: one bearer-authenticated multicast request per notification.

use reqwest::StatusCode;
use serde::Deserialize;

use comment_push_common::config::AppConfig;
use comment_push_common::error::AppError;

use crate::oauth::AccessToken;
use crate::payload::NotificationPayload;

/// Push Kit result code for a fully accepted request.
pub const SUCCESS_CODE: &str = "80000000";

/// What the gateway answered to an accepted send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushReceipt {
    pub status: u16,
    /// Provider result code, when the body carries one
    pub code: Option<String>,
    pub msg: Option<String>,
    pub request_id: Option<String>,
    pub body: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GatewayResponse {
    code: Option<String>,
    msg: Option<String>,
    request_id: Option<String>,
}

/// Sends notifications to the push gateway.
#[derive(Debug, Clone)]
pub struct PushSender {
    http: reqwest::Client,
    send_url: String,
}

impl PushSender {
    pub fn new(http: reqwest::Client, send_url: impl Into<String>) -> Self {
        Self {
            http,
            send_url: send_url.into(),
        }
    }

    pub fn from_config(http: reqwest::Client, config: &AppConfig) -> Self {
        Self::new(http, config.push_send_url())
    }

    /// POST the payload to every recipient token in a single request.
    ///
    /// HTTP 200 is success regardless of per-token results; any other status
    /// becomes `AppError::PushRejected` carrying the raw body.
    pub async fn send(
        &self,
        token: &AccessToken,
        payload: &NotificationPayload,
    ) -> Result<PushReceipt, AppError> {
        let response = self
            .http
            .post(&self.send_url)
            .bearer_auth(&token.value)
            .json(&payload.to_message())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::info!(status = status.as_u16(), response = %body, "Push API responded");

        if status != StatusCode::OK {
            return Err(AppError::PushRejected {
                status: status.as_u16(),
                body,
            });
        }

        // The result code is informational only; multicast outcomes are opaque.
        let parsed: GatewayResponse = serde_json::from_str(&body).unwrap_or_default();
        if let Some(code) = parsed.code.as_deref()
            && code != SUCCESS_CODE
        {
            tracing::warn!(
                code,
                msg = parsed.msg.as_deref().unwrap_or(""),
                recipients = payload.recipient_tokens.len(),
                "Push accepted with non-success result code"
            );
        }

        Ok(PushReceipt {
            status: status.as_u16(),
            code: parsed.code,
            msg: parsed.msg,
            request_id: parsed.request_id,
            body,
        })
    }
}
