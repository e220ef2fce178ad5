use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Huawei Push Kit app client ID (also part of the push send path)
    pub huawei_client_id: String,

    /// Huawei Push Kit app client secret
    pub huawei_client_secret: String,

    /// OAuth client-credentials token endpoint
    pub huawei_token_url: String,

    /// Push gateway base URL, without the `/v1/{client_id}/messages:send` suffix
    pub huawei_push_base_url: String,

    /// Scheme + host of the app deep link (e.g. `app://e_repairkit`)
    pub deep_link_base: String,

    /// GCP project hosting the Firestore database
    pub firestore_project_id: String,

    /// Firestore database ID (default: `(default)`)
    pub firestore_database: String,

    /// Firestore emulator `host:port`; when set, reads skip authentication
    pub firestore_emulator_host: Option<String>,

    /// HTTP listen port (default: 8080)
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated the same as missing ones.
    pub fn from_vars<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            var(key).ok_or_else(|| anyhow::anyhow!("{} environment variable is required", key))
        };

        Ok(Self {
            huawei_client_id: required("HUAWEI_CLIENT_ID")?,
            huawei_client_secret: required("HUAWEI_CLIENT_SECRET")?,
            huawei_token_url: var("HUAWEI_TOKEN_URL").unwrap_or_else(|| {
                "https://oauth-login.cloud.huawei.com/oauth2/v3/token".to_string()
            }),
            huawei_push_base_url: var("HUAWEI_PUSH_BASE_URL")
                .unwrap_or_else(|| "https://push-api.cloud.huawei.com".to_string()),
            deep_link_base: var("DEEP_LINK_BASE")
                .unwrap_or_else(|| "app://e_repairkit".to_string()),
            firestore_project_id: required("GOOGLE_CLOUD_PROJECT")?,
            firestore_database: var("FIRESTORE_DATABASE")
                .unwrap_or_else(|| "(default)".to_string()),
            firestore_emulator_host: var("FIRESTORE_EMULATOR_HOST"),
            port: var("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid u16"))?,
        })
    }

    /// Full URL of the push gateway send endpoint for this app.
    pub fn push_send_url(&self) -> String {
        format!(
            "{}/v1/{}/messages:send",
            self.huawei_push_base_url.trim_end_matches('/'),
            self.huawei_client_id
        )
    }
}
