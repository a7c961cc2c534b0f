//! Error types for the edgequake-docparse library.
//!
//! Three layers of errors reflect three places a document can fail:
//!
//! * [`ConverterError`] — the PDF converter could not produce text or page
//!   images. Text failures are *expected* (scanned PDFs) and trigger the
//!   vision fallback; they only become fatal when the image path fails too.
//!
//! * [`ClientError`] — the remote model call failed (transport, auth,
//!   throttling). Never retried here; surfaced as-is.
//!
//! * [`DocParseError`] — **Fatal**: the extraction cannot produce a record.
//!   Returned as `Err(DocParseError)` from every top-level entry point. Each
//!   variant belongs to exactly one [`ErrorCategory`] so callers (the CLI, an
//!   HTTP layer) can map failures to exit codes or status codes without
//!   matching on every variant.
//!
//! No partial results exist: either the full normalised record is produced
//! or one of these errors is returned.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Caller error: bad file type, oversized file, corrupt PDF, bad schema.
    InvalidInput,
    /// Neither text extraction nor image conversion succeeded.
    ConversionFailure,
    /// The remote model call failed.
    UpstreamFailure,
    /// The model reply could not be parsed into the expected JSON shape.
    MalformedResponse,
    /// The library was configured incorrectly (no provider, bad settings).
    Configuration,
    /// Unexpected internal failure (task panic, runtime creation).
    Internal,
}

/// All fatal errors returned by the edgequake-docparse library.
#[derive(Debug, Error)]
pub enum DocParseError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file extension is not in the configured allow-list.
    #[error("Unsupported file type '{filename}': allowed extensions are {allowed:?}")]
    UnsupportedFileType {
        filename: String,
        allowed: Vec<String>,
    },

    /// The document exceeds the configured size ceiling.
    #[error("File size {size_bytes} bytes exceeds maximum allowed size of {limit_mb}MB")]
    FileTooLarge { size_bytes: u64, limit_mb: u64 },

    /// The bytes do not start with the `%PDF` header.
    #[error("'{filename}' is not a valid PDF\nFirst bytes: {magic:?}")]
    NotAPdf { filename: String, magic: Vec<u8> },

    /// The PDF header is present but the document cannot be opened.
    #[error("PDF '{filename}' is corrupt: {detail}")]
    CorruptPdf { filename: String, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{filename}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { filename: String },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{filename}'")]
    WrongPassword { filename: String },

    /// The caller-supplied field schema is unusable.
    #[error("Invalid field schema: {0}")]
    InvalidSchema(String),

    /// The caller-supplied request object could not be parsed.
    #[error("Invalid extraction request: {0}")]
    InvalidRequest(String),

    // ── Conversion errors ─────────────────────────────────────────────────
    /// Both the text path and the image path failed.
    #[error(
        "Both text extraction and image conversion failed. \
Text error: {text_error}. Vision error: {vision_error}"
    )]
    ConversionFailed {
        text_error: String,
        vision_error: String,
    },

    // ── Upstream errors ───────────────────────────────────────────────────
    /// The remote model call failed.
    #[error("Model call to '{model}' failed: {source}")]
    Upstream {
        model: String,
        #[source]
        source: ClientError,
    },

    // ── Response errors ───────────────────────────────────────────────────
    /// The model reply is not the expected JSON object.
    #[error("Failed to parse model response as JSON: {detail}")]
    MalformedResponse { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// The configured provider could not be instantiated.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not write the JSON result file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocParseError {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FileNotFound { .. }
            | Self::PermissionDenied { .. }
            | Self::DownloadFailed { .. }
            | Self::DownloadTimeout { .. }
            | Self::UnsupportedFileType { .. }
            | Self::FileTooLarge { .. }
            | Self::NotAPdf { .. }
            | Self::CorruptPdf { .. }
            | Self::PasswordRequired { .. }
            | Self::WrongPassword { .. }
            | Self::InvalidSchema(_)
            | Self::InvalidRequest(_) => ErrorCategory::InvalidInput,
            Self::ConversionFailed { .. } => ErrorCategory::ConversionFailure,
            Self::Upstream { .. } => ErrorCategory::UpstreamFailure,
            Self::MalformedResponse { .. } => ErrorCategory::MalformedResponse,
            Self::ProviderNotConfigured { .. } | Self::InvalidConfig(_) => {
                ErrorCategory::Configuration
            }
            Self::OutputWriteFailed { .. } | Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// `true` when the caller supplied something unusable.
    pub fn is_invalid_input(&self) -> bool {
        self.category() == ErrorCategory::InvalidInput
    }
}

/// Failure of the document converter for one extraction path.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConverterError {
    /// The PDF opened fine but contains no machine-readable text.
    #[error("No text could be extracted from the PDF")]
    NoText,

    /// The document could not be loaded.
    #[error("Failed to load PDF: {0}")]
    Load(String),

    /// The document is encrypted and no password was supplied.
    #[error("PDF is encrypted and requires a password")]
    PasswordRequired,

    /// The supplied password was rejected.
    #[error("Wrong password for encrypted PDF")]
    WrongPassword,

    /// The PDF has zero pages, so there is nothing to render.
    #[error("PDF contains no pages")]
    NoPages,

    /// A page failed to rasterise.
    #[error("Failed to render page {page}: {detail}")]
    Render { page: usize, detail: String },

    /// A rendered page failed to encode as PNG.
    #[error("Failed to encode page {page}: {detail}")]
    Encode { page: usize, detail: String },

    /// The pdfium shared library could not be loaded.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy."
    )]
    Binding(String),

    /// The blocking conversion task panicked or was cancelled.
    #[error("Conversion task failed: {0}")]
    Task(String),
}

/// Failure of the remote model call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The provider throttled the request (HTTP 429).
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Network, authentication, or other API failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// No provider was constructed for the requested model.
    #[error("No provider configured for model '{0}'")]
    UnknownModel(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_failed_reports_both_causes() {
        let e = DocParseError::ConversionFailed {
            text_error: ConverterError::NoText.to_string(),
            vision_error: ConverterError::Binding("libpdfium.so missing".into()).to_string(),
        };
        let msg = e.to_string();
        assert!(msg.contains("No text could be extracted"), "got: {msg}");
        assert!(msg.contains("libpdfium.so missing"), "got: {msg}");
        assert_eq!(e.category(), ErrorCategory::ConversionFailure);
    }

    #[test]
    fn upstream_display_includes_model_and_cause() {
        let e = DocParseError::Upstream {
            model: "gpt-4o".into(),
            source: ClientError::RateLimited("429 Too Many Requests".into()),
        };
        let msg = e.to_string();
        assert!(msg.contains("gpt-4o"));
        assert!(msg.contains("429"));
        assert_eq!(e.category(), ErrorCategory::UpstreamFailure);
    }

    #[test]
    fn file_too_large_display() {
        let e = DocParseError::FileTooLarge {
            size_bytes: 11 * 1024 * 1024,
            limit_mb: 10,
        };
        assert!(e.to_string().contains("10MB"));
        assert!(e.is_invalid_input());
    }

    #[test]
    fn categories_cover_taxonomy() {
        assert_eq!(
            DocParseError::InvalidSchema("dup".into()).category(),
            ErrorCategory::InvalidInput
        );
        assert_eq!(
            DocParseError::CorruptPdf {
                filename: "a.pdf".into(),
                detail: "xref".into()
            }
            .category(),
            ErrorCategory::InvalidInput
        );
        assert_eq!(
            DocParseError::MalformedResponse {
                detail: "eof".into()
            }
            .category(),
            ErrorCategory::MalformedResponse
        );
        assert_eq!(
            DocParseError::InvalidConfig("model".into()).category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            DocParseError::Internal("panic".into()).category(),
            ErrorCategory::Internal
        );
    }
}
