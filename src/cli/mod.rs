//! Command-line interface for the gateway.
//!
//! Provides commands for serving the HTTP gateway and inspecting the
//! resolved configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::{
    DialogflowClient, FirestoreClient, GeminiClient, StorageClient, VisionClient,
};
use crate::config::{self, ResolvedConfig};
use crate::server::{self, AppState, GatewaySettings};

/// shilpi - AI capability gateway for the Shilpi marketplace
#[derive(Parser, Debug)]
#[command(name = "shilpi")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Address to bind to (overrides config)
        #[arg(short, long)]
        address: Option<String>,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the parsed command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Serve { address } => serve(address).await,
            Commands::Config => show_config(),
        }
    }
}

async fn serve(address: Option<String>) -> Result<()> {
    let config = config::load_config()?;
    let address = address.unwrap_or_else(|| config.address.clone());
    let state = build_state(&config)?;

    server::serve(&address, state).await
}

/// Construct the real capability clients and wire them into the
/// application state
pub fn build_state(config: &ResolvedConfig) -> Result<AppState> {
    let api_key = config
        .gemini_api_key
        .clone()
        .context("GEMINI_API_KEY is not set")?;
    let project = config
        .project
        .clone()
        .context("GCLOUD_PROJECT is not set")?;
    let access_token = config
        .access_token
        .clone()
        .context("GCLOUD_ACCESS_TOKEN is not set")?;

    let settings = GatewaySettings {
        gemini_model: config.gemini_model.clone(),
        listing_model: config.listing_model.clone(),
        agent_language: config.agent_language.clone(),
        policy: config.invoke_policy(),
    };

    Ok(AppState {
        labels: Arc::new(VisionClient::new(api_key.clone())),
        generator: Arc::new(GeminiClient::new(api_key)),
        agent: Arc::new(DialogflowClient::new(
            project.clone(),
            config.agent_location.clone(),
            config.agent_id.clone(),
            access_token.clone(),
        )),
        documents: Arc::new(FirestoreClient::new(project, access_token.clone())),
        blobs: Arc::new(StorageClient::new(config.bucket.clone(), access_token)),
        settings: Arc::new(settings),
    })
}

fn show_config() -> Result<()> {
    let config = config::load_config()?;

    let secret = |value: &Option<String>| if value.is_some() { "(set)" } else { "(unset)" };

    match &config.config_file {
        Some(path) => println!("Config file:     {}", path.display()),
        None => println!("Config file:     (none, using defaults)"),
    }
    println!("Bind address:    {}", config.address);
    println!("Project:         {}", config.project.as_deref().unwrap_or("(unset)"));
    println!("Access token:    {}", secret(&config.access_token));
    println!("Gemini API key:  {}", secret(&config.gemini_api_key));
    println!("Gemini model:    {}", config.gemini_model);
    println!("Listing model:   {}", config.listing_model);
    println!("Agent:           {} ({})", config.agent_id, config.agent_location);
    println!("Agent language:  {}", config.agent_language);
    if config.bucket.is_empty() {
        println!("Storage bucket:  (gs:// references only)");
    } else {
        println!("Storage bucket:  {}", config.bucket);
    }
    println!("Call timeout:    {}s", config.timeout_seconds);
    println!("Max attempts:    {}", config.retry.max_attempts);

    Ok(())
}
