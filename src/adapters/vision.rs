//! Google Vision adapter for image label detection.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use super::LabelDetection;

const DEFAULT_BASE_URL: &str = "https://vision.googleapis.com";

/// Vision REST API client
pub struct VisionClient {
    /// API key passed as a query parameter
    api_key: String,
    /// API origin (overridable for tests)
    base_url: String,
    /// HTTP client
    client: reqwest::Client,
}

impl VisionClient {
    /// Create a new Vision client
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the API origin (for tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn annotate_url(&self) -> String {
        format!("{}/v1/images:annotate?key={}", self.base_url, self.api_key)
    }
}

#[async_trait]
impl LabelDetection for VisionClient {
    async fn detect_labels(&self, image_url: &str) -> Result<Value> {
        let body = json!({
            "requests": [{
                "image": {"source": {"imageUri": image_url}},
                "features": [{"type": "LABEL_DETECTION"}],
            }]
        });

        let response = self
            .client
            .post(self.annotate_url())
            .json(&body)
            .send()
            .await
            .context("Failed to call Vision API")?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Vision API returned {}: {}", status, detail.trim());
        }

        response
            .json()
            .await
            .context("Failed to parse Vision API response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotate_url() {
        let client = VisionClient::new("key123".to_string()).with_base_url("http://localhost:9090");
        assert_eq!(
            client.annotate_url(),
            "http://localhost:9090/v1/images:annotate?key=key123"
        );
    }
}
