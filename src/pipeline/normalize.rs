//! Response normalisation: raw model text → [`ParsedDocument`].
//!
//! Models are asked for a bare JSON object but regularly wrap it in a
//! markdown fence anyway, so when the reply does not parse as-is the fenced
//! interior is extracted and parsed instead. The
//! parsed object is then reconciled against the schema: every schema field is
//! present in the result (absent ones as `null`), keys the model invented
//! under `configurable_fields` are dropped, and `discovered_fields` is copied
//! through untouched.
//!
//! Nothing beyond fence stripping is repaired. Text that is not a JSON object
//! after stripping is a [`DocParseError::MalformedResponse`].

use crate::error::DocParseError;
use crate::output::ParsedDocument;
use crate::schema::FieldSchema;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

static JSON_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[ \t]*(?i:json)[ \t]*\r?\n?(.*?)(?:```|$)").expect("valid regex")
});

static ANY_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n?(.*?)(?:```|$)").expect("valid regex")
});

/// Parse and reconcile a model reply against `schema`.
pub fn normalize(raw: &str, schema: &FieldSchema) -> Result<ParsedDocument, DocParseError> {
    // A bare object may itself contain backticks, so it is tried before any
    // fence is looked for.
    let parsed: Value = match serde_json::from_str(raw.trim()) {
        Ok(value) => value,
        Err(_) => serde_json::from_str(strip_fences(raw)).map_err(|e| malformed(format!("{e}")))?,
    };

    let Value::Object(mut top) = parsed else {
        return Err(malformed(format!(
            "expected a JSON object, got {}",
            json_kind(&parsed)
        )));
    };

    let returned = take_object(&mut top, "configurable_fields")?;
    let discovered_fields = take_object(&mut top, "discovered_fields")?;

    let mut configurable_fields = Map::new();
    for name in schema.names() {
        let value = returned.get(name).cloned().unwrap_or(Value::Null);
        configurable_fields.insert(name.to_string(), value);
    }

    let dropped: Vec<&String> = returned.keys().filter(|k| !schema.contains(k)).collect();
    if !dropped.is_empty() {
        debug!("Dropped {} unrequested configurable field(s): {:?}", dropped.len(), dropped);
    }

    let confidence_score = confidence(top.remove("confidence_score"))?;
    let processing_notes = notes(top.remove("processing_notes"));

    let document = ParsedDocument {
        configurable_fields,
        discovered_fields,
        confidence_score,
        processing_notes,
    };

    let missing = document.missing_required(schema);
    if !missing.is_empty() {
        warn!("Required field(s) not found in document: {:?}", missing);
    }

    Ok(document)
}

/// Interior of the first ```` ```json ```` fence, else of the first fence of
/// any kind, else the whole text. Always trimmed.
pub fn strip_fences(raw: &str) -> &str {
    let raw = raw.trim();
    if !raw.contains("```") {
        return raw;
    }
    JSON_FENCE
        .captures(raw)
        .or_else(|| ANY_FENCE.captures(raw))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(raw)
}

fn take_object(top: &mut Map<String, Value>, key: &str) -> Result<Map<String, Value>, DocParseError> {
    match top.remove(key) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(malformed(format!(
            "'{key}' must be an object, got {}",
            json_kind(&other)
        ))),
    }
}

fn confidence(value: Option<Value>) -> Result<Option<f64>, DocParseError> {
    let score = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| malformed(format!("confidence_score {n} is not representable")))?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| malformed(format!("confidence_score '{s}' is not a number")))?,
        Some(other) => {
            return Err(malformed(format!(
                "confidence_score must be a number, got {}",
                json_kind(&other)
            )))
        }
    };

    // serde_json writes NaN and infinities as null
    if !score.is_finite() {
        return Err(malformed(format!(
            "confidence_score {score} is not a finite number"
        )));
    }
    if !(0.0..=1.0).contains(&score) {
        warn!("Model reported confidence_score {} outside [0, 1]", score);
    }
    Ok(Some(score))
}

fn notes(value: Option<Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn malformed(detail: String) -> DocParseError {
    DocParseError::MalformedResponse { detail }
}
