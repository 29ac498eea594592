//! Dialogflow CX adapter for the conversational agent.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use super::ConversationalAgent;

const DEFAULT_BASE_URL: &str = "https://dialogflow.googleapis.com";

/// Dialogflow CX sessions REST client
pub struct DialogflowClient {
    /// Cloud project id
    project: String,
    /// Agent location (e.g. "us-central1" or "global")
    location: String,
    /// Agent id within the project/location
    agent_id: String,
    /// OAuth bearer token
    access_token: String,
    /// API origin (overridable for tests)
    base_url: String,
    /// HTTP client
    client: reqwest::Client,
}

impl DialogflowClient {
    /// Create a new Dialogflow client
    pub fn new(project: String, location: String, agent_id: String, access_token: String) -> Self {
        Self {
            project,
            location,
            agent_id,
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

    /// Full session resource path for a session id
    fn session_path(&self, session_id: &str) -> String {
        format!(
            "projects/{}/locations/{}/agents/{}/sessions/{}",
            self.project, self.location, self.agent_id, session_id
        )
    }

    fn detect_intent_url(&self, session_id: &str) -> String {
        format!(
            "{}/v3/{}:detectIntent",
            self.base_url,
            self.session_path(session_id)
        )
    }
}

#[async_trait]
impl ConversationalAgent for DialogflowClient {
    async fn detect_intent(
        &self,
        session_id: &str,
        text: &str,
        language_code: &str,
    ) -> Result<Value> {
        let body = json!({
            "queryInput": {
                "text": {"text": text},
                "languageCode": language_code,
            }
        });

        let response = self
            .client
            .post(self.detect_intent_url(session_id))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .context("Failed to call Dialogflow API")?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Dialogflow API returned {}: {}", status, detail.trim());
        }

        response
            .json()
            .await
            .context("Failed to parse Dialogflow API response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> DialogflowClient {
        DialogflowClient::new(
            "my-project".to_string(),
            "us-central1".to_string(),
            "agent-1".to_string(),
            "token".to_string(),
        )
    }

    #[test]
    fn test_session_path() {
        assert_eq!(
            client().session_path("sess-42"),
            "projects/my-project/locations/us-central1/agents/agent-1/sessions/sess-42"
        );
    }

    #[test]
    fn test_detect_intent_url() {
        let client = client().with_base_url("http://localhost:9090");
        assert_eq!(
            client.detect_intent_url("sess-42"),
            "http://localhost:9090/v3/projects/my-project/locations/us-central1/agents/agent-1/sessions/sess-42:detectIntent"
        );
    }
}
