//! Operation handlers.
//!
//! Each handler is one instance of the request pipeline: validate the
//! inbound fields, build the capability request, invoke, normalize.
//! Failures propagate as `PipelineError` and become the JSON envelope
//! at the route boundary.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use futures::future::try_join_all;
use serde::Serialize;
use serde_json::{json, Value};

use crate::adapters::GenerationPart;
use crate::core::extract::{pluck, text_or, Seg};
use crate::core::listing::{listing_prompt, parse_listing, DEFAULT_LANGUAGE};
use crate::core::pipeline::{invoke, Fields, Idempotency, PipelineError};

use super::AppState;

/// Path to the first candidate's text in a generation response
const CANDIDATE_TEXT_PATH: [Seg<'static>; 6] = [
    Seg::Key("candidates"),
    Seg::Idx(0),
    Seg::Key("content"),
    Seg::Key("parts"),
    Seg::Idx(0),
    Seg::Key("text"),
];

/// Path to the first response message's text in an agent query result
const AGENT_REPLY_PATH: [Seg<'static>; 6] = [
    Seg::Key("queryResult"),
    Seg::Key("responseMessages"),
    Seg::Idx(0),
    Seg::Key("text"),
    Seg::Key("text"),
    Seg::Idx(0),
];

fn body_or_empty(body: Option<Json<Value>>) -> Value {
    body.map(|Json(value)| value).unwrap_or_else(|| json!({}))
}

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

#[derive(Debug, Serialize)]
pub struct LabelsResponse {
    pub labels: Vec<String>,
}

/// POST /extract-labels (also bound to /analyze-image)
pub async fn extract_labels(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Json<LabelsResponse>, PipelineError> {
    let body = body_or_empty(body);
    let fields = Fields::new(&body);

    let image_url = fields.require("imageUrl")?;

    let result = invoke(&state.settings.policy, Idempotency::Idempotent, || {
        state.labels.detect_labels(image_url)
    })
    .await
    .map_err(PipelineError::Capability)?;

    let labels = pluck(
        &result,
        &[Seg::Key("responses"), Seg::Idx(0), Seg::Key("labelAnnotations")],
    )
    .and_then(Value::as_array)
    .map(|annotations| {
        annotations
            .iter()
            .map(|annotation| {
                annotation
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            })
            .collect()
    })
    .unwrap_or_default();

    Ok(Json(LabelsResponse { labels }))
}

#[derive(Debug, Serialize)]
pub struct DescriptionResponse {
    pub description: String,
}

/// POST /generate-description
pub async fn generate_description(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Json<DescriptionResponse>, PipelineError> {
    let body = body_or_empty(body);
    let fields = Fields::new(&body);

    let product_info = fields.optional("productInfo", "A new product");
    let prompt = format!(
        "Write a creative and engaging product description for: {}",
        product_info
    );
    let parts = [GenerationPart::Text(prompt)];

    let result = invoke(&state.settings.policy, Idempotency::Idempotent, || {
        state.generator.generate(&state.settings.gemini_model, &parts)
    })
    .await
    .map_err(PipelineError::Capability)?;

    let description = text_or(&result, &CANDIDATE_TEXT_PATH, "No description generated");

    Ok(Json(DescriptionResponse { description }))
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// POST /chat
pub async fn chat(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Json<ChatResponse>, PipelineError> {
    let body = body_or_empty(body);
    let fields = Fields::new(&body);

    let session_id =
        fields.optional_or_else("sessionId", || Utc::now().timestamp_millis().to_string());
    let text = fields.optional("text", "Hello");

    let result = invoke(&state.settings.policy, Idempotency::Idempotent, || {
        state
            .agent
            .detect_intent(&session_id, &text, &state.settings.agent_language)
    })
    .await
    .map_err(PipelineError::Capability)?;

    let reply = text_or(&result, &AGENT_REPLY_PATH, "No response from agent");

    Ok(Json(ChatResponse { reply }))
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub id: String,
    pub message: String,
}

/// POST /save-record
pub async fn save_record(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Json<SaveResponse>, PipelineError> {
    let body = body_or_empty(body);
    let fields = Fields::new(&body);

    let collection = fields.require("collection")?;
    let data = fields.require_value("data")?;

    // Writes run at most once; an ambiguous outcome must not be retried
    let id = invoke(&state.settings.policy, Idempotency::AtMostOnce, || {
        state.documents.add_document(collection, data)
    })
    .await
    .map_err(PipelineError::Write)?;

    Ok(Json(SaveResponse {
        id,
        message: "Saved successfully".to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub success: bool,
    pub data: ListingData,
}

#[derive(Debug, Serialize)]
pub struct ListingData {
    pub title: String,
    pub region: String,
    pub description: String,
    pub features: Vec<String>,
    pub price: String,
    pub language: String,
}

/// POST /generate-listing
pub async fn generate_listing(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Json<ListingResponse>, PipelineError> {
    let body = body_or_empty(body);
    let fields = Fields::new(&body);

    let image_urls = fields.require_string_list("imageUrls")?;
    let price = fields.require_scalar("price")?;
    let language = fields.optional("language", DEFAULT_LANGUAGE);

    // Fixed fan-out: fetch every referenced image, join before generating.
    // Any single failure fails the whole request.
    let images = try_join_all(image_urls.iter().map(|reference| state.blobs.fetch(reference)))
        .await
        .map_err(PipelineError::Capability)?;

    let mut parts = vec![GenerationPart::Text(listing_prompt(
        image_urls.len(),
        &price,
        &language,
    ))];
    parts.extend(images.into_iter().map(|data| GenerationPart::InlineImage {
        mime_type: "image/jpeg".to_string(),
        data,
    }));

    let result = invoke(&state.settings.policy, Idempotency::Idempotent, || {
        state.generator.generate(&state.settings.listing_model, &parts)
    })
    .await
    .map_err(PipelineError::Capability)?;

    let text = text_or(&result, &CANDIDATE_TEXT_PATH, "");
    let listing = parse_listing(&text)?;

    Ok(Json(ListingResponse {
        success: true,
        data: ListingData {
            title: listing.title,
            region: listing.region,
            description: listing.description,
            features: listing.features,
            price: format!("₹{}", price),
            language,
        },
    }))
}
