//! Result types returned by the extraction pipeline.

use crate::schema::FieldSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The normalised extraction record.
///
/// Serialises to exactly four top-level keys. `configurable_fields` always
/// holds every name of the schema the document was parsed against, in schema
/// order; a field the model did not find is `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub configurable_fields: Map<String, Value>,
    pub discovered_fields: Map<String, Value>,
    pub confidence_score: Option<f64>,
    pub processing_notes: Option<String>,
}

impl ParsedDocument {
    /// Value of a requested field, or `None` when it is absent (`null`).
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.configurable_fields.get(name).filter(|v| !v.is_null())
    }

    /// Names of `required` schema fields the model left absent.
    pub fn missing_required<'a>(&self, schema: &'a FieldSchema) -> Vec<&'a str> {
        schema
            .iter()
            .filter(|f| f.required && self.field(&f.name).is_none())
            .map(|f| f.name.as_str())
            .collect()
    }
}

/// Which content path produced the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Machine-readable text pulled directly from the PDF.
    Text,
    /// Rendered page images, for PDFs with no extractable text.
    Vision,
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMode::Text => f.write_str("text"),
            ExtractionMode::Vision => f.write_str("vision"),
        }
    }
}

/// Per-call diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub mode: ExtractionMode,
    /// Model identifier the prompt was sent to.
    pub model: String,
    pub page_count: usize,
    /// Characters of extracted text (text mode only).
    pub text_chars: Option<usize>,
    /// Page images attached (vision mode only).
    pub image_count: Option<usize>,
    /// Why text mode was abandoned, when the vision fallback ran.
    pub fallback_reason: Option<String>,
    pub conversion_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Full output of one extraction: the record plus diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOutput {
    pub document: ParsedDocument,
    pub stats: ExtractionStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ConfigurableField, DataType};
    use serde_json::json;

    fn doc(fields: Value) -> ParsedDocument {
        ParsedDocument {
            configurable_fields: fields.as_object().cloned().unwrap_or_default(),
            discovered_fields: Map::new(),
            confidence_score: None,
            processing_notes: None,
        }
    }

    #[test]
    fn serialises_exactly_four_keys() {
        let v = serde_json::to_value(doc(json!({"a": null}))).unwrap();
        let keys: Vec<&String> = v.as_object().unwrap().keys().collect();
        assert_eq!(
            keys,
            vec![
                "configurable_fields",
                "discovered_fields",
                "confidence_score",
                "processing_notes"
            ]
        );
        assert_eq!(v["confidence_score"], Value::Null);
    }

    #[test]
    fn missing_required_lists_absent_required_fields() {
        let schema = FieldSchema::new(vec![
            ConfigurableField::new("a", "", DataType::String).required(true),
            ConfigurableField::new("b", "", DataType::String).required(true),
            ConfigurableField::new("c", "", DataType::String),
        ])
        .unwrap();
        let d = doc(json!({"a": "x", "b": null, "c": null}));
        assert_eq!(d.missing_required(&schema), vec!["b"]);
        assert_eq!(d.field("a"), Some(&json!("x")));
        assert_eq!(d.field("b"), None);
    }

    #[test]
    fn mode_display_matches_serde() {
        assert_eq!(ExtractionMode::Vision.to_string(), "vision");
        assert_eq!(serde_json::to_value(ExtractionMode::Text).unwrap(), json!("text"));
    }
}
