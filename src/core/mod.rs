//! Request pipeline core.
//!
//! The pieces every operation shares: field validation, the bounded
//! capability invoker, safe-path response extraction, and the listing
//! text recovery.

pub mod extract;
pub mod listing;
pub mod pipeline;

pub use extract::{pluck, text_or, Seg};
pub use listing::{language_guide, listing_prompt, parse_listing, ListingFields, DEFAULT_LANGUAGE};
pub use pipeline::{
    invoke, ErrorEnvelope, Fields, Idempotency, InvokePolicy, PipelineError, RetryPolicy,
};
