//! Prompt construction: document content + schema → model request payload.
//!
//! A pure function of its inputs. Both modes share the same instruction
//! structure; they differ only in the system message, in whether the
//! document text is embedded, and in whether page images are attached.

use crate::output::ExtractionMode;
use crate::pipeline::converter::DocumentContent;
use crate::prompts::{
    instruction_block, preamble, CLOSING_RULES, TEXT_SYSTEM_PROMPT, VISION_SYSTEM_PROMPT,
};
use crate::schema::FieldSchema;
use edgequake_llm::ImageData;

/// Everything the extraction client needs to issue one model call.
#[derive(Debug, Clone)]
pub struct PromptPayload {
    pub mode: ExtractionMode,
    /// System message.
    pub system: String,
    /// User instruction text.
    pub text: String,
    /// Page images attached to the user message (vision mode only).
    pub images: Vec<ImageData>,
}

/// Build the request payload for `content` against `schema`.
pub fn build_prompt(
    content: &DocumentContent,
    schema: &FieldSchema,
    instructions: Option<&str>,
) -> PromptPayload {
    match content {
        DocumentContent::Text(document_text) => PromptPayload {
            mode: ExtractionMode::Text,
            system: TEXT_SYSTEM_PROMPT.to_string(),
            text: render_text(schema, Some(document_text), instructions),
            images: Vec::new(),
        },
        DocumentContent::Images(images) => PromptPayload {
            mode: ExtractionMode::Vision,
            system: VISION_SYSTEM_PROMPT.to_string(),
            text: render_text(schema, None, instructions),
            images: images.clone(),
        },
    }
}

fn render_text(schema: &FieldSchema, document_text: Option<&str>, instructions: Option<&str>) -> String {
    let (source, legibility) = match document_text {
        Some(_) => (
            "the following document",
            "How clear and readable the document text was",
        ),
        None => (
            "the document images",
            "How clear and readable the document images are",
        ),
    };

    let mut sections = vec![
        preamble(source),
        format!("CONFIGURABLE FIELDS TO EXTRACT:\n{}", schema.prompt_lines()),
    ];
    if let Some(text) = document_text {
        sections.push(format!("DOCUMENT TEXT:\n{text}"));
    }
    sections.push(instruction_block(legibility));
    sections.push(format!(
        "ADDITIONAL EXTRACTION INSTRUCTIONS:\n{}",
        instructions.map(str::trim).filter(|s| !s.is_empty()).unwrap_or("None")
    ));
    sections.push(CLOSING_RULES.to_string());

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ConfigurableField, DataType};

    fn schema() -> FieldSchema {
        FieldSchema::new(vec![
            ConfigurableField::new("invoice_number", "Invoice identifier", DataType::String),
            ConfigurableField::new("total", "Invoice total", DataType::Number),
        ])
        .unwrap()
    }

    fn image() -> ImageData {
        ImageData::new("aGVsbG8=", "image/png").with_detail("high")
    }

    #[test]
    fn field_lines_are_newline_separated() {
        let p = build_prompt(&DocumentContent::Text("ACME".into()), &schema(), None);
        assert!(p.text.contains(
            "CONFIGURABLE FIELDS TO EXTRACT:\n- invoice_number (string): Invoice identifier\n- total (number): Invoice total\n"
        ));
    }

    #[test]
    fn text_mode_embeds_document() {
        let p = build_prompt(&DocumentContent::Text("Invoice #42\nTotal: $10".into()), &schema(), None);
        assert_eq!(p.mode, ExtractionMode::Text);
        assert_eq!(p.system, TEXT_SYSTEM_PROMPT);
        assert!(p.text.contains("DOCUMENT TEXT:\nInvoice #42\nTotal: $10"));
        assert!(p.images.is_empty());
    }

    #[test]
    fn vision_mode_attaches_images_without_text_section() {
        let p = build_prompt(&DocumentContent::Images(vec![image(), image()]), &schema(), None);
        assert_eq!(p.mode, ExtractionMode::Vision);
        assert_eq!(p.system, VISION_SYSTEM_PROMPT);
        assert_eq!(p.images.len(), 2);
        assert!(!p.text.contains("DOCUMENT TEXT:"));
        assert!(p.text.contains("document images are"));
    }

    #[test]
    fn both_modes_share_instruction_contract() {
        let text = build_prompt(&DocumentContent::Text("x".into()), &schema(), None).text;
        let vision = build_prompt(&DocumentContent::Images(vec![image()]), &schema(), None).text;
        for p in [&text, &vision] {
            assert!(p.contains("\"configurable_fields\""));
            assert!(p.contains("\"discovered_fields\""));
            assert!(p.contains("\"confidence_score\""));
            assert!(p.contains("\"processing_notes\""));
            assert!(p.contains("set its value to null"));
            assert!(p.contains("ISO format (YYYY-MM-DD)"));
            assert!(p.contains("do not use example values"));
        }
    }

    #[test]
    fn instructions_rendered_or_none() {
        let with = build_prompt(
            &DocumentContent::Text("x".into()),
            &schema(),
            Some("Amounts are in EUR"),
        );
        assert!(with.text.contains("ADDITIONAL EXTRACTION INSTRUCTIONS:\nAmounts are in EUR"));

        let without = build_prompt(&DocumentContent::Text("x".into()), &schema(), Some("  "));
        assert!(without.text.contains("ADDITIONAL EXTRACTION INSTRUCTIONS:\nNone"));
    }

    #[test]
    fn build_is_deterministic() {
        let a = build_prompt(&DocumentContent::Text("same".into()), &schema(), Some("i"));
        let b = build_prompt(&DocumentContent::Text("same".into()), &schema(), Some("i"));
        assert_eq!(a.text, b.text);
        assert_eq!(a.system, b.system);
    }
}
