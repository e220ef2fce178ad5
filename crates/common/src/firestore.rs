//! Firestore document access over the REST v1 API.
//!
//! Documents are read with plain point lookups. On Cloud Run the bearer token
//! comes from the metadata server; against the emulator no auth is sent.

use std::collections::HashMap;
use std::future::Future;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::AppConfig;
use crate::error::AppError;

/// Public Firestore REST endpoint.
pub const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// GCE metadata server endpoint for the default service account token.
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// A typed Firestore value, as encoded in REST and event JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    /// int64 values are transported as decimal strings
    IntegerValue(String),
    /// Non-finite values travel as `"NaN"`, `"Infinity"` or `"-Infinity"`
    DoubleValue(
        #[serde(deserialize_with = "deserialize_double", serialize_with = "serialize_double")] f64,
    ),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(serde_json::Value),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

fn deserialize_double<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Number(n) => Ok(n),
        Repr::Text(text) => match text.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            other => other.parse().map_err(serde::de::Error::custom),
        },
    }
}

fn serialize_double<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_nan() {
        serializer.serialize_str("NaN")
    } else if value.is_infinite() {
        serializer.serialize_str(if *value > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        serializer.serialize_f64(*value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Value::StringValue(value.into())
    }

    pub fn string_array<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::ArrayValue(ArrayValue {
            values: values.into_iter().map(Value::string).collect(),
        })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::StringValue(s) => Some(s),
            _ => None,
        }
    }
}

/// A Firestore document: full resource name plus its fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

impl Document {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: HashMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// String field value; `None` if absent or not a string.
    pub fn string_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// String entries of an array field, in stored order.
    ///
    /// A missing field yields an empty list. Non-string entries are skipped.
    pub fn string_array_field(&self, key: &str) -> Vec<String> {
        match self.fields.get(key) {
            Some(Value::ArrayValue(array)) => array
                .values
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(other) => {
                tracing::warn!(field = key, value = ?other, "Expected array field");
                Vec::new()
            }
            None => Vec::new(),
        }
    }
}

/// Payload of a Firestore document event delivered with `application/json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEventData {
    /// Document state after the change; absent for deletes
    pub value: Option<Document>,
    /// Document state before the change; absent for creates
    pub old_value: Option<Document>,
}

/// Read-only point lookups against a document database.
pub trait DocumentStore: Send + Sync + 'static {
    /// Fetch `collection/id`. A missing document is `Ok(None)`.
    fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<Option<Document>, AppError>> + Send;
}

/// How the Firestore client authenticates its reads.
#[derive(Debug, Clone)]
pub enum FirestoreAuth {
    /// Emulator: no Authorization header
    None,
    /// Fetch a service account token from the metadata server before each read
    MetadataServer { token_url: String },
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// Firestore REST client.
#[derive(Debug, Clone)]
pub struct FirestoreClient {
    http: reqwest::Client,
    documents_url: String,
    auth: FirestoreAuth,
}

impl FirestoreClient {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        project_id: &str,
        database: &str,
        auth: FirestoreAuth,
    ) -> Self {
        Self {
            http,
            documents_url: format!(
                "{}/projects/{}/databases/{}/documents",
                base_url.trim_end_matches('/'),
                project_id,
                database
            ),
            auth,
        }
    }

    /// Build a client from configuration, targeting the emulator when one is set.
    pub fn from_config(http: reqwest::Client, config: &AppConfig) -> Self {
        match &config.firestore_emulator_host {
            Some(host) => {
                tracing::info!(host = %host, "Using Firestore emulator");
                Self::new(
                    http,
                    &format!("http://{}/v1", host),
                    &config.firestore_project_id,
                    &config.firestore_database,
                    FirestoreAuth::None,
                )
            }
            None => Self::new(
                http,
                FIRESTORE_BASE_URL,
                &config.firestore_project_id,
                &config.firestore_database,
                FirestoreAuth::MetadataServer {
                    token_url: METADATA_TOKEN_URL.to_string(),
                },
            ),
        }
    }

    async fn bearer_token(&self) -> Result<Option<String>, AppError> {
        let token_url = match &self.auth {
            FirestoreAuth::None => return Ok(None),
            FirestoreAuth::MetadataServer { token_url } => token_url,
        };

        let response = self
            .http
            .get(token_url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AppError::Store(format!(
                "metadata token request returned {}: {}",
                status, body
            )));
        }

        let token: MetadataToken = serde_json::from_str(&body)
            .map_err(|e| AppError::Store(format!("invalid metadata token response: {}", e)))?;
        Ok(Some(token.access_token))
    }
}

impl DocumentStore for FirestoreClient {
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        let mut url = reqwest::Url::parse(&self.documents_url).map_err(|e| {
            AppError::Store(format!("invalid documents URL {}: {}", self.documents_url, e))
        })?;
        // Segments are percent-encoded so ids containing `#`, `?` or `%` stay intact.
        url.path_segments_mut()
            .map_err(|_| AppError::Store(format!("cannot-be-a-base URL {}", self.documents_url)))?
            .push(collection)
            .push(id);

        let mut request = self.http.get(url);
        if let Some(token) = self.bearer_token().await? {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(collection, id, "Document not found");
            return Ok(None);
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(AppError::Store(format!(
                "GET {}/{} returned {}: {}",
                collection, id, status, body
            )));
        }

        let document: Document = serde_json::from_str(&body).map_err(|e| {
            AppError::Store(format!("invalid document {}/{}: {}", collection, id, e))
        })?;
        Ok(Some(document))
    }
}

/// In-memory document store, keyed by collection and id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    documents: HashMap<(String, String), Document>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(
        mut self,
        collection: impl Into<String>,
        id: impl Into<String>,
        document: Document,
    ) -> Self {
        self.documents
            .insert((collection.into(), id.into()), document);
        self
    }
}

impl DocumentStore for InMemoryStore {
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        Ok(self
            .documents
            .get(&(collection.to_string(), id.to_string()))
            .cloned())
    }
}
