//! Listing Parse Integration Tests
//!
//! Pins the exact recovery behavior for generated listing text: slice
//! between the first `{` and last `}`, strip code fences, parse, and
//! default the missing listing fields.

use shilpi::core::listing::parse_listing;
use shilpi::core::pipeline::PipelineError;

#[test]
fn test_prose_around_braces_is_discarded() {
    let text = "Sure thing! Here is the listing you asked for:\n\
        {\"title\": \"Madhubani Painting\", \"region\": \"Bihar\", \"description\": \"Vivid folk art.\", \"features\": [\"Natural dyes\", \"Handmade paper\"]}\n\
        Let me know if you want changes.";

    let listing = parse_listing(text).unwrap();
    assert_eq!(listing.title, "Madhubani Painting");
    assert_eq!(listing.region, "Bihar");
    assert_eq!(listing.features.len(), 2);
}

#[test]
fn test_fenced_payload_parses() {
    let fenced = "```json\n{\"title\": \"Kantha Quilt\"}\n```";

    let listing = parse_listing(fenced).unwrap();
    assert_eq!(listing.title, "Kantha Quilt");
}

#[test]
fn test_missing_fields_default_instead_of_failing() {
    let listing = parse_listing("{\"title\": \"Dhokra Figurine\"}").unwrap();

    assert_eq!(listing.title, "Dhokra Figurine");
    assert_eq!(listing.region, "");
    assert_eq!(listing.description, "");
    assert!(listing.features.is_empty());
}

#[test]
fn test_extra_fields_are_ignored() {
    let listing = parse_listing(
        "{\"title\": \"Pashmina Shawl\", \"price\": \"unexpected\", \"seller\": \"someone\"}",
    )
    .unwrap();

    assert_eq!(listing.title, "Pashmina Shawl");
}

#[test]
fn test_text_without_braces_is_malformed() {
    let error = parse_listing("No JSON here at all.").unwrap_err();
    assert!(matches!(error, PipelineError::MalformedOutput(_)));
    assert_eq!(error.status(), 500);
}

#[test]
fn test_multiple_objects_in_text_are_malformed() {
    // First `{` to last `}` spans both objects and the middle prose
    let error =
        parse_listing("{\"title\": \"A\"} and also {\"region\": \"B\"}").unwrap_err();
    assert!(matches!(error, PipelineError::MalformedOutput(_)));
}

#[test]
fn test_fenced_non_object_is_malformed() {
    let error = parse_listing("```json\n\"just a string\"\n```").unwrap_err();
    assert!(matches!(error, PipelineError::MalformedOutput(_)));
}

#[test]
fn test_empty_text_is_malformed() {
    assert!(parse_listing("").is_err());
}
