//! Firestore adapter for document writes.
//!
//! The REST API expects typed field values, so plain JSON payloads are
//! encoded into the `stringValue`/`integerValue`/... representation
//! before the write.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::DocumentStore;

const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com";

/// Firestore REST client scoped to a project's default database
pub struct FirestoreClient {
    /// Cloud project id
    project: String,
    /// OAuth bearer token
    access_token: String,
    /// API origin (overridable for tests)
    base_url: String,
    /// HTTP client
    client: reqwest::Client,
}

impl FirestoreClient {
    /// Create a new Firestore client
    pub fn new(project: String, access_token: String) -> Self {
        Self {
            project,
            access_token,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the API origin (for tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents/{}",
            self.base_url, self.project, collection
        )
    }
}

/// Encode a JSON value into Firestore's typed value representation
fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({"nullValue": null}),
        Value::Bool(b) => json!({"booleanValue": b}),
        Value::Number(n) => {
            if n.is_f64() {
                json!({"doubleValue": n})
            } else {
                // Integer values travel as strings in the REST API
                json!({"integerValue": n.to_string()})
            }
        }
        Value::String(s) => json!({"stringValue": s}),
        Value::Array(items) => json!({
            "arrayValue": {"values": items.iter().map(encode_value).collect::<Vec<_>>()}
        }),
        Value::Object(map) => json!({"mapValue": {"fields": encode_fields(map)}}),
    }
}

fn encode_fields(map: &Map<String, Value>) -> Value {
    let fields: Map<String, Value> = map
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect();
    Value::Object(fields)
}

/// Encode a JSON object payload into a Firestore document body
fn encode_document(data: &Value) -> Result<Value> {
    let map = data
        .as_object()
        .context("document payload must be a JSON object")?;
    Ok(json!({"fields": encode_fields(map)}))
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn add_document(&self, collection: &str, data: &Value) -> Result<String> {
        let document = encode_document(data)?;

        let response = self
            .client
            .post(self.collection_url(collection))
            .bearer_auth(&self.access_token)
            .json(&document)
            .send()
            .await
            .context("Failed to call Firestore API")?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Firestore API returned {}: {}", status, detail.trim());
        }

        let created: Value = response
            .json()
            .await
            .context("Failed to parse Firestore API response")?;

        // Document name is "projects/.../documents/<collection>/<id>"
        let name = created
            .get("name")
            .and_then(Value::as_str)
            .context("Firestore response missing document name")?;

        let id = name
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .context("Firestore document name has no id segment")?;

        Ok(id.to_string())
    }
}
