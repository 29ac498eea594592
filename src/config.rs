//! Configuration for the gateway.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (SHILPI_CONFIG, GEMINI_API_KEY,
//!    GCLOUD_PROJECT, GCLOUD_ACCESS_TOKEN)
//! 2. Config file (.shilpi/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - SHILPI_CONFIG points directly at a config file
//! - Otherwise the current directory and its parents are searched for
//!   .shilpi/config.yaml, falling back to ~/.shilpi/config.yaml
//!
//! Secrets (API key, access token, project id) come from the
//! environment only and are never read from the config file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::pipeline::{InvokePolicy, RetryPolicy};

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub gemini: GeminiSection,
    #[serde(default)]
    pub dialogflow: DialogflowSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub invoke: InvokeSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerSection {
    /// Bind address, e.g. "127.0.0.1:8080"
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeminiSection {
    pub model: Option<String>,
    pub listing_model: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DialogflowSection {
    pub agent_id: Option<String>,
    pub location: Option<String>,
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageSection {
    /// Bucket used for bare object references
    pub bucket: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvokeSection {
    /// Per-attempt timeout in seconds
    pub timeout_seconds: Option<u64>,
    /// Retry policy for idempotent capability calls
    pub retry: Option<RetryPolicy>,
}

fn default_address() -> String {
    "127.0.0.1:8080".to_string()
}
fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}
fn default_listing_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_agent_id() -> String {
    "default-agent-id".to_string()
}
fn default_agent_location() -> String {
    "us-central1".to_string()
}
fn default_agent_language() -> String {
    "en".to_string()
}
fn default_timeout_seconds() -> u64 {
    120
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Bind address for the HTTP server
    pub address: String,

    /// Cloud project id (GCLOUD_PROJECT)
    pub project: Option<String>,

    /// OAuth bearer token for Dialogflow/Firestore/Storage (GCLOUD_ACCESS_TOKEN)
    pub access_token: Option<String>,

    /// API key for Vision/Gemini (GEMINI_API_KEY)
    pub gemini_api_key: Option<String>,

    /// Model for plain text generation
    pub gemini_model: String,

    /// Model for vision-grounded listing generation
    pub listing_model: String,

    /// Dialogflow agent id
    pub agent_id: String,

    /// Dialogflow agent location
    pub agent_location: String,

    /// Language tag for agent queries
    pub agent_language: String,

    /// Default storage bucket ("" means gs:// references only)
    pub bucket: String,

    /// Per-attempt capability timeout in seconds
    pub timeout_seconds: u64,

    /// Retry policy for idempotent capability calls
    pub retry: RetryPolicy,

    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Build the invocation policy from the resolved timeout and retry
    pub fn invoke_policy(&self) -> InvokePolicy {
        InvokePolicy {
            timeout: std::time::Duration::from_secs(self.timeout_seconds),
            retry: self.retry.clone(),
        }
    }
}

/// Find the config file: SHILPI_CONFIG, then .shilpi/config.yaml in the
/// current directory or any parent, then ~/.shilpi/config.yaml
fn find_config_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("SHILPI_CONFIG") {
        return Some(PathBuf::from(path));
    }

    let mut current = std::env::current_dir().ok()?;
    loop {
        let config_path = current.join(".shilpi").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    let home_config = dirs::home_dir()?.join(".shilpi").join("config.yaml");
    if home_config.exists() {
        return Some(home_config);
    }

    None
}

/// Load and parse a config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Load configuration from all sources
pub fn load_config() -> Result<ResolvedConfig> {
    let config_file = find_config_file();

    let file = match config_file {
        Some(ref path) => Some(load_config_file(path)?),
        None => None,
    };

    Ok(resolve(file, config_file))
}

fn resolve(file: Option<ConfigFile>, config_file: Option<PathBuf>) -> ResolvedConfig {
    let server = file.as_ref().map(|f| f.server.clone()).unwrap_or_default();
    let gemini = file.as_ref().map(|f| f.gemini.clone()).unwrap_or_default();
    let dialogflow = file
        .as_ref()
        .map(|f| f.dialogflow.clone())
        .unwrap_or_default();
    let storage = file.as_ref().map(|f| f.storage.clone()).unwrap_or_default();
    let invoke = file.as_ref().map(|f| f.invoke.clone()).unwrap_or_default();

    ResolvedConfig {
        address: server.address.unwrap_or_else(default_address),
        project: env_var("GCLOUD_PROJECT"),
        access_token: env_var("GCLOUD_ACCESS_TOKEN"),
        gemini_api_key: env_var("GEMINI_API_KEY"),
        gemini_model: gemini.model.unwrap_or_else(default_gemini_model),
        listing_model: gemini.listing_model.unwrap_or_else(default_listing_model),
        agent_id: dialogflow.agent_id.unwrap_or_else(default_agent_id),
        agent_location: dialogflow.location.unwrap_or_else(default_agent_location),
        agent_language: dialogflow
            .language_code
            .unwrap_or_else(default_agent_language),
        bucket: storage.bucket.unwrap_or_default(),
        timeout_seconds: invoke.timeout_seconds.unwrap_or_else(default_timeout_seconds),
        retry: invoke.retry.unwrap_or_default(),
        config_file,
    }
}
