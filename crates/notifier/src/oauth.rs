//! Client-credentials token exchange against the push provider's OAuth server.

use chrono::{DateTime, Duration, Utc};
use reqwest::StatusCode;

use comment_push_common::config::AppConfig;
use comment_push_common::error::AppError;

/// Short-lived bearer credential for the push gateway. Never cached.
#[derive(Clone)]
pub struct AccessToken {
    pub value: String,
    /// Derived from `expires_in` when the provider sends it
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// OAuth 2.0 client-credentials client.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl OAuthClient {
    pub fn new(
        http: reqwest::Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn from_config(http: reqwest::Client, config: &AppConfig) -> Self {
        Self::new(
            http,
            &config.huawei_token_url,
            &config.huawei_client_id,
            &config.huawei_client_secret,
        )
    }

    /// Exchange the client credentials for a fresh access token.
    ///
    /// Succeeds only on HTTP 200 with a non-empty `access_token` in a JSON body.
    /// Every other response becomes `AppError::TokenAcquisition` carrying the
    /// raw body.
    pub async fn fetch_access_token(&self) -> Result<AccessToken, AppError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self.http.post(&self.token_url).form(&form).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let failed = |body: String| AppError::TokenAcquisition {
            status: status.as_u16(),
            body,
        };

        if status != StatusCode::OK {
            tracing::warn!(status = status.as_u16(), "Token endpoint rejected request");
            return Err(failed(body));
        }

        let parsed: serde_json::Value = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse token response");
                return Err(failed(body));
            }
        };

        let value = match parsed.get("access_token").and_then(|v| v.as_str()) {
            Some(token) if !token.is_empty() => token.to_string(),
            _ => return Err(failed(body)),
        };

        let expires_at = parsed
            .get("expires_in")
            .and_then(|v| v.as_i64())
            .and_then(Duration::try_seconds)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl));

        tracing::debug!(expires_at = ?expires_at, "Access token acquired");
        Ok(AccessToken { value, expires_at })
    }
}
