//! # edgequake-docparse
//!
//! Extract structured fields from PDF documents with large language models.
//!
//! ## Why this crate?
//!
//! Invoices, receipts and contracts carry the same handful of facts (a date,
//! a counterparty, an amount) in endlessly varying layouts. Instead of a
//! template per layout, this crate hands the document to an LLM together with
//! a caller-defined field schema and reconciles the model's JSON reply against
//! that schema, so every requested field is always present in the result.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      read a path, download a URL, check type / size / %PDF
//!  ├─ 2. Convert    text via pdfium; scanned PDFs fall back to page images
//!  ├─ 3. Prompt     schema + content → system and user messages
//!  ├─ 4. Model      gpt-4o-mini for text, gpt-4o for images (configurable)
//!  └─ 5. Normalise  strip fences, parse JSON, close over the schema
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_docparse::{DocumentParser, ExtractionConfig, ExtractionRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider credentials come from OPENAI_API_KEY etc.
//!     let parser = DocumentParser::from_config(ExtractionConfig::default())?;
//!     let output = parser
//!         .parse_input("invoice.pdf", &ExtractionRequest::default())
//!         .await?;
//!     println!("{}", serde_json::to_string_pretty(&output.document)?);
//!     eprintln!("mode: {}, confidence: {:?}",
//!         output.stats.mode,
//!         output.document.confidence_score);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docparse` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-docparse = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod schema;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::{ClientError, ConverterError, DocParseError, ErrorCategory};
pub use extract::{write_json, DocumentParser};
pub use output::{ExtractionMode, ExtractionOutput, ExtractionStats, ParsedDocument};
pub use pipeline::client::{ExtractionClient, LlmExtractionClient};
pub use pipeline::converter::{DocumentContent, DocumentConverter};
pub use pipeline::input::InputDocument;
pub use pipeline::normalize::normalize;
pub use pipeline::pdfium::PdfiumConverter;
pub use pipeline::prompt::{build_prompt, PromptPayload};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use schema::{default_fields, ConfigurableField, DataType, ExtractionRequest, FieldSchema};
