//! Request pipeline building blocks.
//!
//! Every operation runs the same shape: validate the inbound fields,
//! build the capability request, invoke the capability (with a bounded
//! timeout and optional retry), normalize the response, and map
//! failures into a uniform error envelope.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Failure taxonomy for the request pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required inbound field is absent or empty
    #[error("Missing {0}")]
    MissingField(String),

    /// The outbound capability call failed (transport or remote error)
    #[error("Capability call failed: {0}")]
    Capability(anyhow::Error),

    /// The capability succeeded but its payload did not match the expected shape
    #[error("Malformed capability output: {0}")]
    MalformedOutput(String),

    /// The document store rejected or failed the write
    #[error("Document write failed: {0}")]
    Write(anyhow::Error),
}

impl PipelineError {
    /// HTTP-style status for this failure (400 for validation, 500 otherwise)
    pub fn status(&self) -> u16 {
        match self {
            Self::MissingField(_) => 400,
            Self::Capability(_) | Self::MalformedOutput(_) | Self::Write(_) => 500,
        }
    }

    /// Convert into the uniform JSON error body
    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: self.to_string(),
        }
    }
}

/// Uniform JSON error body returned for any stage failure
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

/// Validated view over an untyped inbound JSON body.
///
/// Absent keys, JSON null, and empty strings are all treated as missing.
/// Numeric fields pass through in their display form without further
/// type checks.
pub struct Fields<'a> {
    body: &'a Value,
}

impl<'a> Fields<'a> {
    pub fn new(body: &'a Value) -> Self {
        Self { body }
    }

    /// Get a required string field, failing with `MissingField` otherwise
    pub fn require(&self, name: &str) -> Result<&'a str, PipelineError> {
        match self.body.get(name).and_then(Value::as_str) {
            Some(s) if !s.is_empty() => Ok(s),
            _ => Err(PipelineError::MissingField(name.to_string())),
        }
    }

    /// Get a required scalar field (non-empty string or number) as its
    /// display form
    pub fn require_scalar(&self, name: &str) -> Result<String, PipelineError> {
        match self.body.get(name) {
            Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => Err(PipelineError::MissingField(name.to_string())),
        }
    }

    /// Get a required field of any non-null shape
    pub fn require_value(&self, name: &str) -> Result<&'a Value, PipelineError> {
        match self.body.get(name) {
            Some(Value::Null) | None => Err(PipelineError::MissingField(name.to_string())),
            Some(Value::String(s)) if s.is_empty() => {
                Err(PipelineError::MissingField(name.to_string()))
            }
            Some(value) => Ok(value),
        }
    }

    /// Get a required non-empty list of non-empty strings
    pub fn require_string_list(&self, name: &str) -> Result<Vec<&'a str>, PipelineError> {
        let items = self
            .body
            .get(name)
            .and_then(Value::as_array)
            .ok_or_else(|| PipelineError::MissingField(name.to_string()))?;

        let mut list = Vec::with_capacity(items.len());
        for item in items {
            match item.as_str() {
                Some(s) if !s.is_empty() => list.push(s),
                _ => return Err(PipelineError::MissingField(name.to_string())),
            }
        }

        if list.is_empty() {
            return Err(PipelineError::MissingField(name.to_string()));
        }

        Ok(list)
    }

    /// Get an optional field, substituting the default for absent, null,
    /// or empty values
    pub fn optional(&self, name: &str, default: &str) -> String {
        self.optional_or_else(name, || default.to_string())
    }

    /// Like [`Fields::optional`] with a lazily computed default
    pub fn optional_or_else(&self, name: &str, default: impl FnOnce() -> String) -> String {
        match self.body.get(name) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => default(),
        }
    }
}

/// Whether a capability call may be safely re-issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Idempotency {
    /// Safe to retry (labeling, generation, agent queries)
    Idempotent,

    /// Must run at most once (document writes); never retried, even
    /// after an ambiguous timeout
    AtMostOnce,
}

/// Retry policy for failed capability calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including first try)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay between retries in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Maximum delay between retries in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Backoff multiplier (delay *= multiplier after each retry)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_max_attempts() -> u32 {
    1
}
fn default_initial_delay() -> u64 {
    1000
}
fn default_max_delay() -> u64 {
    30000
}
fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryPolicy {
    /// Calculate delay for a specific attempt (1-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::from_millis(self.initial_delay_ms);
        }

        let delay =
            self.initial_delay_ms as f64 * self.backoff_multiplier.powi((attempt - 1) as i32);

        let capped = delay.min(self.max_delay_ms as f64) as u64;
        Duration::from_millis(capped)
    }

    /// Check if we should retry based on attempt count
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Bounds applied to every capability invocation
#[derive(Debug, Clone)]
pub struct InvokePolicy {
    /// Per-attempt timeout
    pub timeout: Duration,

    /// Retry policy (applies to idempotent calls only)
    pub retry: RetryPolicy,
}

impl Default for InvokePolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
        }
    }
}

/// Invoke a capability call under the given policy.
///
/// Each attempt is bounded by the policy timeout. Idempotent calls are
/// retried per the policy; at-most-once calls get exactly one attempt
/// regardless of outcome, so an ambiguous timeout can never lead to a
/// duplicate side effect.
pub async fn invoke<T, F, Fut>(
    policy: &InvokePolicy,
    idempotency: Idempotency,
    mut call: F,
) -> Result<T, anyhow::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, anyhow::Error>>,
{
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        let error = match tokio::time::timeout(policy.timeout, call()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => e,
            Err(_) => anyhow::anyhow!(
                "capability call timed out after {}s",
                policy.timeout.as_secs()
            ),
        };

        let retryable =
            idempotency == Idempotency::Idempotent && policy.retry.should_retry(attempt);
        if !retryable {
            return Err(error);
        }

        let delay = policy.retry.delay_for_attempt(attempt);
        warn!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Capability call failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_require_present_field() {
        let body = json!({"imageUrl": "gs://bucket/pot.jpg"});
        let fields = Fields::new(&body);
        assert_eq!(fields.require("imageUrl").unwrap(), "gs://bucket/pot.jpg");
    }

    #[test]
    fn test_require_absent_and_empty_both_missing() {
        let body = json!({"imageUrl": ""});
        let fields = Fields::new(&body);

        assert!(matches!(
            fields.require("imageUrl"),
            Err(PipelineError::MissingField(name)) if name == "imageUrl"
        ));
        assert!(matches!(
            fields.require("collection"),
            Err(PipelineError::MissingField(name)) if name == "collection"
        ));
    }

    #[test]
    fn test_require_scalar_accepts_numbers() {
        let body = json!({"price": 1500});
        let fields = Fields::new(&body);
        assert_eq!(fields.require_scalar("price").unwrap(), "1500");

        let body = json!({"price": "1500"});
        let fields = Fields::new(&body);
        assert_eq!(fields.require_scalar("price").unwrap(), "1500");

        let body = json!({"price": ""});
        let fields = Fields::new(&body);
        assert!(fields.require_scalar("price").is_err());
    }

    #[test]
    fn test_require_string_list() {
        let body = json!({"imageUrls": ["a.jpg", "b.jpg"]});
        let fields = Fields::new(&body);
        assert_eq!(
            fields.require_string_list("imageUrls").unwrap(),
            vec!["a.jpg", "b.jpg"]
        );

        let body = json!({"imageUrls": []});
        let fields = Fields::new(&body);
        assert!(fields.require_string_list("imageUrls").is_err());

        let body = json!({});
        let fields = Fields::new(&body);
        assert!(fields.require_string_list("imageUrls").is_err());
    }

    #[test]
    fn test_optional_defaults() {
        let body = json!({"text": ""});
        let fields = Fields::new(&body);
        assert_eq!(fields.optional("text", "Hello"), "Hello");
        assert_eq!(
            fields.optional("productInfo", "A new product"),
            "A new product"
        );

        let body = json!({"sessionId": 42});
        let fields = Fields::new(&body);
        assert_eq!(fields.optional("sessionId", "fallback"), "42");
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(PipelineError::MissingField("x".into()).status(), 400);
        assert_eq!(
            PipelineError::Capability(anyhow::anyhow!("boom")).status(),
            500
        );
        assert_eq!(PipelineError::MalformedOutput("bad".into()).status(), 500);
        assert_eq!(PipelineError::Write(anyhow::anyhow!("boom")).status(), 500);
    }

    #[test]
    fn test_missing_field_envelope_message() {
        let envelope = PipelineError::MissingField("imageUrl".into()).envelope();
        assert_eq!(envelope.error, "Missing imageUrl");
    }

    #[test]
    fn test_retry_policy_delays() {
        let policy = RetryPolicy {
            initial_delay_ms: 1000,
            backoff_multiplier: 2.0,
            max_delay_ms: 10000,
            ..Default::default()
        };

        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(4000));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(8000));
        assert_eq!(policy.delay_for_attempt(5), Duration::from_millis(10000)); // Capped
    }

    #[test]
    fn test_retry_policy_fire_once_by_default() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(1));
    }
}
