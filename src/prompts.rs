//! Prompt text for LLM-based field extraction.
//!
//! Every string the model sees lives here so prompt changes are made in one
//! place and unit tests can inspect them without a model. The assembly of
//! these pieces into a request is done by [`crate::pipeline::prompt`].

/// System message for text-mode extraction.
pub const TEXT_SYSTEM_PROMPT: &str = "You are an expert document parser. Extract information accurately and return it in the specified JSON format.";

/// System message for vision-mode extraction.
pub const VISION_SYSTEM_PROMPT: &str = "You are an expert document parser. Analyze document images and extract information accurately, returning it in the specified JSON format.";

/// The JSON shape the model must return.
pub const RESPONSE_FORMAT: &str = r#"{
    "configurable_fields": {
        "field_name": "extracted_value_or_null"
    },
    "discovered_fields": {
        "other_field_name": "extracted_value"
    },
    "confidence_score": <number_between_0_and_1>,
    "processing_notes": "Any relevant notes about the extraction process"
}"#;

/// Formatting rules and the placeholder-confidence warning, appended last.
pub const CLOSING_RULES: &str = "Please ensure the JSON is valid and complete. For dates, use ISO format (YYYY-MM-DD). For amounts, extract numeric values without currency symbols.

IMPORTANT: Generate a genuine confidence score based on your actual assessment - do not use example values!";

/// Opening sentence; `{source}` names what the model is looking at.
pub fn preamble(source: &str) -> String {
    format!(
        "Please analyze {source} and extract information according to these requirements:"
    )
}

/// The numbered instruction list shared by both modes.
///
/// `legibility` is the first confidence criterion, phrased for the mode
/// (e.g. "How clear and readable the document text was").
pub fn instruction_block(legibility: &str) -> String {
    format!(
        "INSTRUCTIONS:
1. Extract values for the configurable fields listed above. If a field is not found in the document, set its value to null.
2. Additionally, identify and extract any other relevant information you find in the document that might be valuable.
3. Provide YOUR OWN confidence score between 0.0 and 1.0 based on your assessment of:
   - {legibility}
   - How certain you are about the field value matches
   - How complete your extraction is
   - Overall document quality and structure
4. Return the response in the following JSON format:

{RESPONSE_FORMAT}"
    )
}
