//! Extraction entry points.
//!
//! [`DocumentParser`] sequences the pipeline for one document:
//!
//! ```text
//! validate ─▶ open ─▶ TextAttempt ──ok──▶ prompt ─▶ model ─▶ normalize
//!                        │                  ▲
//!                        └─err─▶ VisionAttempt ──err──▶ ConversionFailed
//! ```
//!
//! The parser holds only read-only configuration and shared handles to the
//! converter and client, so one instance can serve any number of concurrent
//! calls. Nothing is retried and no partial record is ever returned.

use crate::config::ExtractionConfig;
use crate::error::{ConverterError, DocParseError};
use crate::output::{ExtractionMode, ExtractionOutput, ExtractionStats};
use crate::pipeline::client::{ExtractionClient, LlmExtractionClient};
use crate::pipeline::converter::{DocumentContent, DocumentConverter};
use crate::pipeline::encode::encode_pages;
use crate::pipeline::input::{resolve_input, validate_document, InputDocument};
use crate::pipeline::normalize::normalize;
use crate::pipeline::pdfium::PdfiumConverter;
use crate::pipeline::prompt::build_prompt;
use crate::schema::ExtractionRequest;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Mode-selection state. Each state is entered at most once per document.
enum Attempt {
    Text,
    Vision { text_error: ConverterError },
}

/// Extracts schema fields from PDF documents.
pub struct DocumentParser {
    config: ExtractionConfig,
    converter: Arc<dyn DocumentConverter>,
    client: Arc<dyn ExtractionClient>,
}

impl std::fmt::Debug for DocumentParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentParser")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DocumentParser {
    pub fn new(
        config: ExtractionConfig,
        converter: Arc<dyn DocumentConverter>,
        client: Arc<dyn ExtractionClient>,
    ) -> Self {
        Self {
            config,
            converter,
            client,
        }
    }

    /// Production parser: pdfium converter plus `edgequake_llm` providers.
    ///
    /// # Errors
    /// [`DocParseError::ProviderNotConfigured`] when a provider cannot be
    /// created (usually a missing API key).
    pub fn from_config(config: ExtractionConfig) -> Result<Self, DocParseError> {
        let converter = Arc::new(PdfiumConverter::from_config(&config));
        let client = Arc::new(LlmExtractionClient::from_config(&config)?);
        Ok(Self::new(config, converter, client))
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract fields from an in-memory document.
    ///
    /// # Errors
    /// One of the four failure categories: invalid input, conversion failure
    /// (both paths, with both messages), upstream failure, or malformed
    /// response. See [`DocParseError::category`].
    pub async fn parse(
        &self,
        document: InputDocument,
        request: &ExtractionRequest,
    ) -> Result<ExtractionOutput, DocParseError> {
        let result = self.run(document, request).await;
        if let (Err(e), Some(cb)) = (&result, &self.config.progress_callback) {
            cb.on_extraction_error(&e.to_string());
        }
        result
    }

    /// Extract fields from raw bytes with the given filename.
    pub async fn parse_bytes(
        &self,
        filename: impl Into<String>,
        bytes: Vec<u8>,
        request: &ExtractionRequest,
    ) -> Result<ExtractionOutput, DocParseError> {
        self.parse(InputDocument::new(filename, bytes), request).await
    }

    /// Extract fields from a local path or an HTTP/HTTPS URL.
    pub async fn parse_input(
        &self,
        input: &str,
        request: &ExtractionRequest,
    ) -> Result<ExtractionOutput, DocParseError> {
        let document = resolve_input(input, &self.config).await?;
        self.parse(document, request).await
    }

    /// Synchronous wrapper around [`parse_input`](Self::parse_input).
    ///
    /// Creates a temporary tokio runtime internally.
    pub fn parse_sync(
        &self,
        input: &str,
        request: &ExtractionRequest,
    ) -> Result<ExtractionOutput, DocParseError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| DocParseError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.parse_input(input, request))
    }

    async fn run(
        &self,
        document: InputDocument,
        request: &ExtractionRequest,
    ) -> Result<ExtractionOutput, DocParseError> {
        let total_start = Instant::now();
        info!("Starting extraction: {} ({} bytes)", document.filename, document.len());

        // ── Step 1: Validate ─────────────────────────────────────────────────
        validate_document(&document, &self.config)?;
        let InputDocument { filename, bytes } = document;
        let size_bytes = bytes.len();
        let pdf: Arc<[u8]> = bytes.into();

        // ── Step 2: Open ─────────────────────────────────────────────────────
        let conversion_start = Instant::now();
        let page_count = self
            .blocking(&pdf, |c, b| c.page_count(b))
            .await
            .map_err(|e| open_error(&filename, e))?;
        debug!("{}: {} pages", filename, page_count);

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_extraction_start(&filename, size_bytes, page_count);
        }

        // ── Step 3: Choose mode ──────────────────────────────────────────────
        let mut state = Attempt::Text;
        let (content, fallback_reason) = loop {
            match state {
                Attempt::Text => match self.blocking(&pdf, |c, b| c.extract_text(b)).await {
                    Ok(text) => break (DocumentContent::Text(text), None),
                    Err(text_error) => {
                        warn!("Text extraction failed, falling back to vision: {}", text_error);
                        if let Some(ref cb) = self.config.progress_callback {
                            cb.on_fallback(&text_error.to_string());
                        }
                        state = Attempt::Vision { text_error };
                    }
                },
                Attempt::Vision { text_error } => {
                    let rendered = self
                        .blocking(&pdf, |c, b| {
                            let pages = c.render_pages(b)?;
                            encode_pages(&pages)
                        })
                        .await;
                    match rendered {
                        Ok(images) => {
                            break (DocumentContent::Images(images), Some(text_error.to_string()))
                        }
                        Err(vision_error) => {
                            return Err(DocParseError::ConversionFailed {
                                text_error: text_error.to_string(),
                                vision_error: vision_error.to_string(),
                            })
                        }
                    }
                }
            }
        };
        let conversion_duration_ms = conversion_start.elapsed().as_millis() as u64;

        let (mode, model, text_chars, image_count) = match &content {
            DocumentContent::Text(text) => (
                ExtractionMode::Text,
                self.config.model.as_str(),
                Some(text.chars().count()),
                None,
            ),
            DocumentContent::Images(images) => (
                ExtractionMode::Vision,
                self.config.vision_model.as_str(),
                None,
                Some(images.len()),
            ),
        };
        info!(
            "Content ready in {} mode ({}ms), using model {}",
            mode, conversion_duration_ms, model
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_mode_selected(mode);
        }

        // ── Step 4: Prompt and call the model ────────────────────────────────
        let payload = build_prompt(&content, &request.fields, request.instructions());
        debug!(
            "Prompt: {} chars, {} image(s)",
            payload.text.len(),
            payload.images.len()
        );

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_request_sent(model);
        }
        let llm_start = Instant::now();
        let raw = self
            .client
            .send(&payload, model)
            .await
            .map_err(|source| DocParseError::Upstream {
                model: model.to_string(),
                source,
            })?;
        let llm_duration_ms = llm_start.elapsed().as_millis() as u64;
        debug!("Model reply: {} chars in {}ms", raw.len(), llm_duration_ms);

        // ── Step 5: Normalise ────────────────────────────────────────────────
        let document = normalize(&raw, &request.fields)?;

        let stats = ExtractionStats {
            mode,
            model: model.to_string(),
            page_count,
            text_chars,
            image_count,
            fallback_reason,
            conversion_duration_ms,
            llm_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };

        info!(
            "Extraction complete: {} mode, {} field(s), {}ms total",
            mode,
            document.configurable_fields.len(),
            stats.total_duration_ms
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_extraction_complete(mode, stats.total_duration_ms);
        }

        Ok(ExtractionOutput { document, stats })
    }

    /// Run a converter call on the blocking pool.
    async fn blocking<T, F>(&self, pdf: &Arc<[u8]>, f: F) -> Result<T, ConverterError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn DocumentConverter, &[u8]) -> Result<T, ConverterError> + Send + 'static,
    {
        let converter = Arc::clone(&self.converter);
        let pdf = Arc::clone(pdf);
        tokio::task::spawn_blocking(move || f(&*converter, &pdf[..]))
            .await
            .map_err(|e| ConverterError::Task(e.to_string()))?
    }
}

/// Map a failure to open the document. Structural problems are the caller's;
/// a missing PDF library breaks both paths alike.
fn open_error(filename: &str, e: ConverterError) -> DocParseError {
    match e {
        ConverterError::PasswordRequired => DocParseError::PasswordRequired {
            filename: filename.to_string(),
        },
        ConverterError::WrongPassword => DocParseError::WrongPassword {
            filename: filename.to_string(),
        },
        ConverterError::Binding(_) | ConverterError::Task(_) => {
            DocParseError::ConversionFailed {
                text_error: e.to_string(),
                vision_error: e.to_string(),
            }
        }
        other => DocParseError::CorruptPdf {
            filename: filename.to_string(),
            detail: other.to_string(),
        },
    }
}

/// Write `value` as pretty JSON to `path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn write_json(path: &Path, value: &impl Serialize) -> Result<(), DocParseError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| DocParseError::Internal(format!("JSON serialisation failed: {e}")))?;
    let write_err = |source| DocParseError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}
