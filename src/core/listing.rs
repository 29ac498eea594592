//! Product listing generation support.
//!
//! The listing operation asks the generative model for formatted text
//! with an embedded JSON object. `parse_listing` isolates the fragile
//! fence-strip + brace-slice recovery so a stricter structured-output
//! mode can replace it without touching callers.

use serde::{Deserialize, Serialize};

use super::pipeline::PipelineError;

/// Language used when the request names no template
pub const DEFAULT_LANGUAGE: &str = "english";

/// Per-language writing instructions for the listing prompt.
///
/// Unknown languages fall back to the English guide.
pub fn language_guide(language: &str) -> &'static str {
    match language {
        "english" => "Write entirely in English. Keep it casual and friendly.",
        "hindi" => "Write entirely in Hindi (Devanagari script). Keep it casual.",
        "hinglish" => "Write in Hinglish (Hindi + English mix). Natural and casual.",
        "tamil" => "Write entirely in Tamil script. Keep it casual.",
        "bengali" => "Write entirely in Bengali script. Keep it casual.",
        _ => "Write entirely in English. Keep it casual and friendly.",
    }
}

/// Render the listing prompt for a generation request
pub fn listing_prompt(image_count: usize, price: &str, language: &str) -> String {
    format!(
        r#"You are helping an Indian artisan list their product online.

**LANGUAGE:** {guide}

**TONE:** Casual, friendly, conversational.

{image_count} image(s) provided.

Create a simple product listing with ONLY these fields:

{{
  "title": "Catchy, SEO-friendly title in {language} (60-80 characters)",
  "region": "Which part of India is this craft from? (Just state/region name)",
  "description": "2-3 engaging sentences in {language} (150 chars max)",
  "features": [
    "List 5-7 specific features in {language}",
    "Keep each point short and clear"
  ]
}}

Analyze the images and describe what you see. Focus on colors, patterns, materials, craftsmanship.

**CRITICAL:** Return ONLY valid JSON with these 4 fields. No extra text.
Price: ₹{price}"#,
        guide = language_guide(language),
        image_count = image_count,
        language = language,
        price = price,
    )
}

/// The four listing fields the model is asked for.
///
/// Any field the model omits defaults to empty rather than failing the
/// operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingFields {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub region: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub features: Vec<String>,
}

/// Recover the embedded JSON object from generated listing text.
///
/// Steps, in order: slice between the first `{` and last `}` (only when
/// both exist), strip code-fence markers, trim, then parse. A payload
/// that still does not parse fails with `MalformedOutput`.
pub fn parse_listing(text: &str) -> Result<ListingFields, PipelineError> {
    let sliced = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start <= end => &text[start..=end],
        _ => text,
    };

    let cleaned = sliced
        .replace("```json\n", "")
        .replace("```json", "")
        .replace("```\n", "")
        .replace("```", "");
    let cleaned = cleaned.trim();

    serde_json::from_str(cleaned)
        .map_err(|e| PipelineError::MalformedOutput(format!("listing did not parse as JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let listing = parse_listing(
            r#"{"title": "Blue Pottery Vase", "region": "Rajasthan", "description": "Lovely.", "features": ["Hand-painted"]}"#,
        )
        .unwrap();

        assert_eq!(listing.title, "Blue Pottery Vase");
        assert_eq!(listing.region, "Rajasthan");
        assert_eq!(listing.features, vec!["Hand-painted"]);
    }

    #[test]
    fn test_parse_fenced_json_with_prose() {
        let text = "Here is your listing!\n```json\n{\"title\": \"Terracotta Diya Set\", \"region\": \"West Bengal\", \"description\": \"Warm glow.\", \"features\": [\"Set of 6\"]}\n```\nHope you like it.";

        let listing = parse_listing(text).unwrap();
        assert_eq!(listing.title, "Terracotta Diya Set");
        assert_eq!(listing.region, "West Bengal");
    }

    #[test]
    fn test_parse_missing_features_defaults_empty() {
        let listing =
            parse_listing(r#"{"title": "Brass Lamp", "region": "Tamil Nadu", "description": "Classic."}"#)
                .unwrap();

        assert_eq!(listing.title, "Brass Lamp");
        assert!(listing.features.is_empty());
    }

    #[test]
    fn test_parse_all_fields_missing_defaults_empty() {
        let listing = parse_listing("{}").unwrap();
        assert_eq!(listing.title, "");
        assert_eq!(listing.region, "");
        assert_eq!(listing.description, "");
        assert!(listing.features.is_empty());
    }

    #[test]
    fn test_parse_unrecoverable_text_is_malformed() {
        assert!(matches!(
            parse_listing("I could not generate a listing."),
            Err(PipelineError::MalformedOutput(_))
        ));
        assert!(matches!(
            parse_listing(""),
            Err(PipelineError::MalformedOutput(_))
        ));
    }

    #[test]
    fn test_language_guide_fallback() {
        assert_eq!(language_guide("tamil"), "Write entirely in Tamil script. Keep it casual.");
        assert_eq!(language_guide("klingon"), language_guide("english"));
    }

    #[test]
    fn test_listing_prompt_interpolation() {
        let prompt = listing_prompt(3, "1500", "hindi");

        assert!(prompt.contains("3 image(s) provided."));
        assert!(prompt.contains("Price: ₹1500"));
        assert!(prompt.contains("Write entirely in Hindi (Devanagari script). Keep it casual."));
    }
}
