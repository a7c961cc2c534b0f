//! Field schema: which pieces of information the caller wants extracted.
//!
//! A [`FieldSchema`] is an ordered list of [`ConfigurableField`] descriptors.
//! Order matters twice: it is the order the fields are listed in the prompt,
//! and the order of keys in the resulting `configurable_fields` map.
//!
//! Names must be unique within a schema. Duplicates are rejected at
//! construction time rather than silently collapsing during normalisation.

use crate::error::DocParseError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Expected type of an extracted value.
///
/// The type is advisory: it is rendered into the prompt so the model formats
/// the value accordingly, but returned values are not coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    String,
    Number,
    /// ISO 8601 (`YYYY-MM-DD`).
    Date,
    Boolean,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Number => "number",
            DataType::Date => "date",
            DataType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, typed piece of information the caller wants extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurableField {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub data_type: DataType,
    #[serde(default)]
    pub required: bool,
}

impl ConfigurableField {
    pub fn new(name: impl Into<String>, description: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            data_type,
            required: false,
        }
    }

    /// Mark the field as required.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Render the prompt line `- {name} ({data_type}): {description}`.
    pub fn prompt_line(&self) -> String {
        format!("- {} ({}): {}", self.name, self.data_type, self.description)
    }
}

/// Ordered list of field descriptors with unique names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ConfigurableField>", into = "Vec<ConfigurableField>")]
pub struct FieldSchema {
    fields: Vec<ConfigurableField>,
}

impl FieldSchema {
    /// Build a schema, rejecting empty and duplicate field names.
    pub fn new(fields: Vec<ConfigurableField>) -> Result<Self, DocParseError> {
        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if field.name.trim().is_empty() {
                return Err(DocParseError::InvalidSchema(
                    "field names must not be empty".into(),
                ));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(DocParseError::InvalidSchema(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
        }
        Ok(Self { fields })
    }

    /// Parse a JSON array of field descriptors.
    ///
    /// ```rust
    /// use edgequake_docparse::FieldSchema;
    ///
    /// let schema = FieldSchema::from_json(
    ///     r#"[{"name": "invoice_number", "description": "Invoice ID"}]"#,
    /// ).unwrap();
    /// assert_eq!(schema.names().collect::<Vec<_>>(), vec!["invoice_number"]);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, DocParseError> {
        let fields: Vec<ConfigurableField> = serde_json::from_str(json)
            .map_err(|e| DocParseError::InvalidSchema(format!("invalid custom fields JSON: {e}")))?;
        Self::new(fields)
    }

    pub fn fields(&self) -> &[ConfigurableField] {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigurableField> {
        self.fields.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&ConfigurableField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Newline-joined prompt lines, one per field.
    pub fn prompt_lines(&self) -> String {
        self.fields
            .iter()
            .map(ConfigurableField::prompt_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The eight built-in fields commonly found on business documents.
impl Default for FieldSchema {
    fn default() -> Self {
        Self {
            fields: default_fields(),
        }
    }
}

impl TryFrom<Vec<ConfigurableField>> for FieldSchema {
    type Error = DocParseError;

    fn try_from(fields: Vec<ConfigurableField>) -> Result<Self, Self::Error> {
        Self::new(fields)
    }
}

impl From<FieldSchema> for Vec<ConfigurableField> {
    fn from(schema: FieldSchema) -> Self {
        schema.fields
    }
}

impl<'a> IntoIterator for &'a FieldSchema {
    type Item = &'a ConfigurableField;
    type IntoIter = std::slice::Iter<'a, ConfigurableField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Built-in default field list.
pub fn default_fields() -> Vec<ConfigurableField> {
    vec![
        ConfigurableField::new(
            "document_type",
            "Type of document (e.g., invoice, contract, resume, etc.)",
            DataType::String,
        ),
        ConfigurableField::new("date", "Primary date mentioned in the document", DataType::Date),
        ConfigurableField::new("company_name", "Company or organization name", DataType::String),
        ConfigurableField::new("person_name", "Person's name (if applicable)", DataType::String),
        ConfigurableField::new("email", "Email address", DataType::String),
        ConfigurableField::new("phone", "Phone number", DataType::String),
        ConfigurableField::new("amount", "Monetary amount (if applicable)", DataType::Number),
        ConfigurableField::new("address", "Physical address", DataType::String),
    ]
}

/// Per-document extraction request: which fields, plus optional free-text
/// guidance for the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionRequest {
    pub fields: FieldSchema,
    pub instructions: Option<String>,
}

/// Wire shape of a request object: `{custom_fields?, extraction_instructions?}`.
#[derive(Deserialize)]
struct RequestBody {
    #[serde(default)]
    custom_fields: Option<Vec<ConfigurableField>>,
    #[serde(default)]
    extraction_instructions: Option<String>,
}

impl ExtractionRequest {
    pub fn new(fields: FieldSchema) -> Self {
        Self {
            fields,
            instructions: None,
        }
    }

    /// Attach free-text instructions. Blank strings are treated as absent.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        let text = instructions.into();
        self.instructions = if text.trim().is_empty() { None } else { Some(text) };
        self
    }

    /// Parse a request object; a missing `custom_fields` selects the default schema.
    pub fn from_json(json: &str) -> Result<Self, DocParseError> {
        let body: RequestBody = serde_json::from_str(json)
            .map_err(|e| DocParseError::InvalidRequest(format!("invalid request JSON: {e}")))?;
        let fields = match body.custom_fields {
            Some(fields) => FieldSchema::new(fields)?,
            None => FieldSchema::default(),
        };
        let request = Self::new(fields);
        Ok(match body.extraction_instructions {
            Some(text) => request.with_instructions(text),
            None => request,
        })
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schema_has_eight_fields_in_order() {
        let schema = FieldSchema::default();
        let names: Vec<&str> = schema.names().collect();
        assert_eq!(
            names,
            vec![
                "document_type",
                "date",
                "company_name",
                "person_name",
                "email",
                "phone",
                "amount",
                "address"
            ]
        );
        assert_eq!(schema.get("date").map(|f| f.data_type), Some(DataType::Date));
        assert_eq!(schema.get("amount").map(|f| f.data_type), Some(DataType::Number));
        assert!(schema.iter().all(|f| !f.required));
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = FieldSchema::new(vec![
            ConfigurableField::new("a", "first", DataType::String),
            ConfigurableField::new("a", "second", DataType::Number),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate field name 'a'"), "got: {err}");
        assert!(err.is_invalid_input());
    }

    #[test]
    fn blank_names_rejected() {
        let err = FieldSchema::new(vec![ConfigurableField::new("  ", "x", DataType::String)])
            .unwrap_err();
        assert!(matches!(err, DocParseError::InvalidSchema(_)));
    }

    #[test]
    fn empty_schema_is_allowed() {
        let schema = FieldSchema::new(vec![]).unwrap();
        assert!(schema.is_empty());
        assert_eq!(schema.prompt_lines(), "");
    }

    #[test]
    fn from_json_applies_defaults() {
        let schema = FieldSchema::from_json(
            r#"[
                {"name": "total", "description": "Invoice total", "data_type": "number", "required": true},
                {"name": "vendor", "description": "Vendor name"}
            ]"#,
        )
        .unwrap();
        assert_eq!(schema.len(), 2);
        let total = schema.get("total").unwrap();
        assert_eq!(total.data_type, DataType::Number);
        assert!(total.required);
        let vendor = schema.get("vendor").unwrap();
        assert_eq!(vendor.data_type, DataType::String);
        assert!(!vendor.required);
    }

    #[test]
    fn from_json_rejects_unknown_data_type() {
        let err = FieldSchema::from_json(r#"[{"name": "x", "description": "y", "data_type": "currency"}]"#)
            .unwrap_err();
        assert!(matches!(err, DocParseError::InvalidSchema(_)));
    }

    #[test]
    fn from_json_rejects_duplicates_via_serde() {
        let json = r#"[{"name": "x", "description": "1"}, {"name": "x", "description": "2"}]"#;
        assert!(FieldSchema::from_json(json).is_err());
        assert!(serde_json::from_str::<FieldSchema>(json).is_err());
    }

    #[test]
    fn prompt_line_format() {
        let f = ConfigurableField::new("amount", "Monetary amount (if applicable)", DataType::Number);
        assert_eq!(f.prompt_line(), "- amount (number): Monetary amount (if applicable)");
    }

    #[test]
    fn schema_serialises_as_plain_list() {
        let schema = FieldSchema::new(vec![ConfigurableField::new("a", "b", DataType::Boolean)]).unwrap();
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"name": "a", "description": "b", "data_type": "boolean", "required": false}])
        );
    }

    #[test]
    fn request_from_json_defaults_schema() {
        let req = ExtractionRequest::from_json(r#"{"extraction_instructions": "Focus on totals"}"#).unwrap();
        assert_eq!(req.fields, FieldSchema::default());
        assert_eq!(req.instructions(), Some("Focus on totals"));
    }

    #[test]
    fn request_from_json_custom_fields_and_blank_instructions() {
        let req = ExtractionRequest::from_json(
            r#"{"custom_fields": [{"name": "po", "description": "PO number"}], "extraction_instructions": "   "}"#,
        )
        .unwrap();
        assert_eq!(req.fields.names().collect::<Vec<_>>(), vec!["po"]);
        assert_eq!(req.instructions(), None);
    }

    #[test]
    fn request_from_json_rejects_garbage() {
        let err = ExtractionRequest::from_json("not json").unwrap_err();
        assert!(matches!(err, DocParseError::InvalidRequest(_)));
    }
}
