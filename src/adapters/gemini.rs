//! Gemini adapter for text generation.
//!
//! Requests carry text parts plus optional base64 inline-data parts for
//! vision-grounded generation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use serde_json::Value;

use super::{GenerationPart, TextGeneration};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini `generateContent` REST client
pub struct GeminiClient {
    /// API key passed as a query parameter
    api_key: String,
    /// API origin (overridable for tests)
    base_url: String,
    /// HTTP client
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

/// Untagged union of text and inline media content parts
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

impl From<&GenerationPart> for Part {
    fn from(part: &GenerationPart) -> Self {
        match part {
            GenerationPart::Text(text) => Part::Text { text: text.clone() },
            GenerationPart::InlineImage { mime_type, data } => Part::InlineData {
                inline_data: InlineData {
                    mime_type: mime_type.clone(),
                    data: STANDARD.encode(data),
                },
            },
        }
    }
}

impl GeminiClient {
    /// Create a new Gemini client
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

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        )
    }
}

#[async_trait]
impl TextGeneration for GeminiClient {
    async fn generate(&self, model: &str, parts: &[GenerationPart]) -> Result<Value> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: parts.iter().map(Part::from).collect(),
            }],
        };

        let response = self
            .client
            .post(self.generate_url(model))
            .json(&body)
            .send()
            .await
            .context("Failed to call Gemini API")?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API returned {}: {}", status, detail.trim());
        }

        response
            .json()
            .await
            .context("Failed to parse Gemini API response")
    }
}
