//! Capability adapters for external services.
//!
//! Each external capability sits behind a narrow trait so handlers can
//! be exercised with fakes in tests. The real implementations are thin
//! REST clients over the Google APIs.

pub mod dialogflow;
pub mod firestore;
pub mod gemini;
pub mod storage;
pub mod vision;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

// Re-export the concrete clients
pub use dialogflow::DialogflowClient;
pub use firestore::FirestoreClient;
pub use gemini::GeminiClient;
pub use storage::StorageClient;
pub use vision::VisionClient;

/// One part of a generation request: plain text or an inline binary
/// attachment
#[derive(Debug, Clone)]
pub enum GenerationPart {
    Text(String),
    InlineImage { mime_type: String, data: Vec<u8> },
}

/// Image labeling capability
#[async_trait]
pub trait LabelDetection: Send + Sync {
    /// Annotate an image reference, returning the raw annotation response
    async fn detect_labels(&self, image_url: &str) -> Result<Value>;
}

/// Generative text capability
#[async_trait]
pub trait TextGeneration: Send + Sync {
    /// Generate content from text and inline attachments, returning the
    /// raw candidate response
    async fn generate(&self, model: &str, parts: &[GenerationPart]) -> Result<Value>;
}

/// Conversational agent capability
#[async_trait]
pub trait ConversationalAgent: Send + Sync {
    /// Send one utterance into a session, returning the raw query result
    async fn detect_intent(
        &self,
        session_id: &str,
        text: &str,
        language_code: &str,
    ) -> Result<Value>;
}

/// Document database capability
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create one document in a collection, returning its generated id
    async fn add_document(&self, collection: &str, data: &Value) -> Result<String>;
}

/// Binary object store capability
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch the raw bytes behind a storage reference
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>>;
}
