//! shilpi - AI capability gateway for the Shilpi artisan marketplace
//!
//! A small HTTP service that forwards app requests to Google cloud
//! capabilities (Vision labeling, Gemini generation, Dialogflow CX,
//! Firestore, Cloud Storage) and returns normalized JSON.
//!
//! # Architecture
//!
//! Every operation runs the same request pipeline:
//! - Validate the inbound fields (fail fast, no side effects)
//! - Build the capability request
//! - Invoke the capability under a bounded timeout (retry only when
//!   the call is idempotent)
//! - Normalize the response down to a small fixed set of fields,
//!   with explicit defaults for anything the remote omitted
//!
//! # Modules
//!
//! - `adapters`: Capability clients behind narrow traits
//! - `core`: Pipeline logic (validation, invocation, extraction)
//! - `server`: HTTP routes and the uniform error boundary
//! - `config`: YAML + environment configuration
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Start the gateway
//! shilpi serve --address 0.0.0.0:8080
//!
//! # Inspect the resolved configuration
//! shilpi config
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod server;

// Re-export main types at crate root for convenience
pub use crate::core::{ErrorEnvelope, Fields, Idempotency, InvokePolicy, PipelineError};
pub use crate::server::{AppState, GatewaySettings};
