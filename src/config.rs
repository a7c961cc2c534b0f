//! Configuration types for document field extraction.
//!
//! All server-side behaviour is controlled through [`ExtractionConfig`],
//! built via its [`ExtractionConfigBuilder`]. These are read-only settings:
//! the orchestrator consumes them but never mutates them, so one config can
//! be shared by every concurrent request.
//!
//! Per-document choices (which fields, extra instructions) live in
//! [`crate::schema::ExtractionRequest`] instead. In particular the model used
//! for each mode is *not* a per-request choice: text mode uses [`model`],
//! vision mode always uses [`vision_model`].
//!
//! [`model`]: ExtractionConfig::model
//! [`vision_model`]: ExtractionConfig::vision_model

use crate::error::DocParseError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// Default model for text-mode extraction.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Vision-capable model used whenever the image fallback runs.
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o";

/// Default LLM provider name passed to `edgequake_llm::ProviderFactory`.
pub const DEFAULT_PROVIDER: &str = "openai";

/// Configuration for document field extraction.
///
/// # Example
/// ```rust
/// use edgequake_docparse::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .model("gpt-4o-mini")
///     .max_file_size_mb(20)
///     .allowed_extensions_csv("pdf, PDF")
///     .build()
///     .unwrap();
/// assert_eq!(config.allowed_extensions, vec!["pdf".to_string()]);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// LLM provider name (e.g. "openai", "anthropic", "azure"). Default: "openai".
    pub provider_name: String,

    /// Model for text-mode extraction. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Model for vision-mode extraction. Default: [`DEFAULT_VISION_MODEL`].
    pub vision_model: String,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Extraction is transcription, not generation; low temperature keeps
    /// field values faithful to the document.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 2000.
    pub max_tokens: usize,

    /// Upload size ceiling in MiB. Default: 10.
    pub max_file_size_mb: u64,

    /// Accepted file extensions, lowercase, without dots. Default: `["pdf"]`.
    pub allowed_extensions: Vec<String>,

    /// Rendering DPI for the vision fallback. Range: 72–400. Default: 200.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 2000.
    ///
    /// Caps memory on oversized pages (posters, drawings) regardless of DPI.
    pub max_rendered_pixels: u32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Explicit path to the pdfium shared library. If None, the system library is used.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional stage-progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            provider_name: DEFAULT_PROVIDER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            temperature: 0.1,
            max_tokens: 2000,
            max_file_size_mb: 10,
            allowed_extensions: vec!["pdf".to_string()],
            dpi: 200,
            max_rendered_pixels: 2000,
            password: None,
            pdfium_lib_path: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("vision_model", &self.vision_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_file_size_mb", &self.max_file_size_mb)
            .field("allowed_extensions", &self.allowed_extensions)
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Size ceiling in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    /// `true` when `filename` ends with one of the allowed extensions
    /// (case-insensitive).
    pub fn is_allowed_extension(&self, filename: &str) -> bool {
        let lower = filename.to_lowercase();
        self.allowed_extensions
            .iter()
            .any(|ext| lower.ends_with(&format!(".{ext}")))
    }
}

/// Split a comma-separated extension list: trims, lowercases, strips
/// leading dots, drops blanks and duplicates.
pub fn parse_extension_list(csv: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for ext in csv.split(',') {
        let ext = ext.trim().trim_start_matches('.').to_lowercase();
        if !ext.is_empty() && !out.contains(&ext) {
            out.push(ext);
        }
    }
    out
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn vision_model(mut self, model: impl Into<String>) -> Self {
        self.config.vision_model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_file_size_mb(mut self, mb: u64) -> Self {
        self.config.max_file_size_mb = mb;
        self
    }

    pub fn allowed_extensions(mut self, exts: Vec<String>) -> Self {
        self.config.allowed_extensions = parse_extension_list(&exts.join(","));
        self
    }

    /// Set allowed extensions from a comma-separated list such as `"pdf, PDF"`.
    pub fn allowed_extensions_csv(mut self, csv: &str) -> Self {
        self.config.allowed_extensions = parse_extension_list(csv);
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, DocParseError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(DocParseError::InvalidConfig("model must not be empty".into()));
        }
        if c.vision_model.trim().is_empty() {
            return Err(DocParseError::InvalidConfig(
                "vision model must not be empty".into(),
            ));
        }
        if c.provider_name.trim().is_empty() {
            return Err(DocParseError::InvalidConfig(
                "provider name must not be empty".into(),
            ));
        }
        if c.max_file_size_mb == 0 {
            return Err(DocParseError::InvalidConfig(
                "max file size must be ≥ 1 MB".into(),
            ));
        }
        if c.allowed_extensions.is_empty() {
            return Err(DocParseError::InvalidConfig(
                "at least one allowed extension is required".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(DocParseError::InvalidConfig("max tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}
