//! Cloud Storage adapter for fetching image bytes.
//!
//! Listing generation receives `gs://` references and needs the raw
//! bytes to attach inline to the generation request.

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::BlobStore;

const DEFAULT_BASE_URL: &str = "https://storage.googleapis.com";

/// Cloud Storage download client
pub struct StorageClient {
    /// Bucket used for bare object references
    bucket: String,
    /// OAuth bearer token
    access_token: String,
    /// API origin (overridable for tests)
    base_url: String,
    /// HTTP client
    client: reqwest::Client,
}

impl StorageClient {
    /// Create a new storage client with a default bucket
    pub fn new(bucket: String, access_token: String) -> Self {
        Self {
            bucket,
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

    /// Split a reference into (bucket, object path).
    ///
    /// `gs://bucket/path` references carry their own bucket; bare paths
    /// resolve against the configured default bucket.
    fn split_reference<'a>(&'a self, reference: &'a str) -> Result<(&'a str, &'a str)> {
        if let Some(rest) = reference.strip_prefix("gs://") {
            let (bucket, object) = rest
                .split_once('/')
                .with_context(|| format!("no object path in reference '{}'", reference))?;
            if object.is_empty() {
                anyhow::bail!("no object path in reference '{}'", reference);
            }
            Ok((bucket, object))
        } else if !self.bucket.is_empty() {
            Ok((&self.bucket, reference))
        } else {
            anyhow::bail!(
                "no bucket configured for bare object reference '{}'",
                reference
            )
        }
    }

    fn object_url(&self, reference: &str) -> Result<String> {
        let (bucket, object) = self.split_reference(reference)?;
        Ok(format!("{}/{}/{}", self.base_url, bucket, object))
    }
}

#[async_trait]
impl BlobStore for StorageClient {
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>> {
        let url = self.object_url(reference)?;

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .with_context(|| format!("Failed to download object '{}'", reference))?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Storage download for '{}' returned {}",
                reference,
                response.status()
            );
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read object bytes for '{}'", reference))?;

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> StorageClient {
        StorageClient::new("shilpi-uploads".to_string(), "token".to_string())
    }

    #[test]
    fn test_split_gs_reference() {
        let client = client();
        assert_eq!(
            client.split_reference("gs://other-bucket/images/pot.jpg").unwrap(),
            ("other-bucket", "images/pot.jpg")
        );
    }

    #[test]
    fn test_split_bare_reference_uses_default_bucket() {
        let client = client();
        assert_eq!(
            client.split_reference("images/pot.jpg").unwrap(),
            ("shilpi-uploads", "images/pot.jpg")
        );
    }

    #[test]
    fn test_bare_reference_without_default_bucket_fails() {
        let client = StorageClient::new(String::new(), "token".to_string());
        assert!(client.split_reference("images/pot.jpg").is_err());
    }

    #[test]
    fn test_gs_reference_without_object_fails() {
        let client = client();
        assert!(client.split_reference("gs://bucket-only").is_err());
        assert!(client.split_reference("gs://bucket-only/").is_err());
    }

    #[test]
    fn test_object_url() {
        let client = client().with_base_url("http://localhost:9090");
        assert_eq!(
            client.object_url("gs://b/images/pot.jpg").unwrap(),
            "http://localhost:9090/b/images/pot.jpg"
        );
    }
}
