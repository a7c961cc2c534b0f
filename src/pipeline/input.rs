//! Input resolution and validation.
//!
//! Documents arrive as bytes plus a filename. Local paths are read from disk;
//! HTTP/HTTPS URLs are downloaded. Before any conversion work the bytes are
//! checked against the configured allow-list and size ceiling and for the
//! `%PDF` magic header, so a caller error is reported as such instead of as a
//! pdfium failure.

use crate::config::ExtractionConfig;
use crate::error::DocParseError;
use std::path::Path;
use tracing::{debug, info};

/// A document held in memory, ready for validation and conversion.
#[derive(Clone)]
pub struct InputDocument {
    /// Original filename (used for extension checks and error messages).
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl InputDocument {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for InputDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputDocument")
            .field("filename", &self.filename)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a local path or URL into an in-memory document.
pub async fn resolve_input(
    input: &str,
    config: &ExtractionConfig,
) -> Result<InputDocument, DocParseError> {
    if is_url(input) {
        download_url(input, config).await
    } else {
        read_local(Path::new(input)).await
    }
}

async fn read_local(path: &Path) -> Result<InputDocument, DocParseError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => DocParseError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => DocParseError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    debug!("Read local document: {} ({} bytes)", path.display(), bytes.len());
    Ok(InputDocument::new(filename, bytes))
}

async fn download_url(url: &str, config: &ExtractionConfig) -> Result<InputDocument, DocParseError> {
    info!("Downloading document from: {}", url);
    let timeout_secs = config.download_timeout_secs;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DocParseError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            DocParseError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            DocParseError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(DocParseError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    // Refuse before buffering when the server declares the length up front.
    if let Some(declared) = response.content_length() {
        check_size(declared, config)?;
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| DocParseError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(InputDocument::new(filename_from_url(url), bytes.to_vec()))
}

/// Last path segment of the URL when it looks like a filename, else `downloaded.pdf`.
pub fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }
    "downloaded.pdf".to_string()
}

/// Reject documents the pipeline must not process.
///
/// Checks, in order: extension allow-list, size ceiling, `%PDF` header.
pub fn validate_document(doc: &InputDocument, config: &ExtractionConfig) -> Result<(), DocParseError> {
    if !config.is_allowed_extension(&doc.filename) {
        return Err(DocParseError::UnsupportedFileType {
            filename: doc.filename.clone(),
            allowed: config.allowed_extensions.clone(),
        });
    }

    check_size(doc.bytes.len() as u64, config)?;

    if !doc.bytes.starts_with(b"%PDF") {
        return Err(DocParseError::NotAPdf {
            filename: doc.filename.clone(),
            magic: doc.bytes.iter().take(4).copied().collect(),
        });
    }

    Ok(())
}

fn check_size(size_bytes: u64, config: &ExtractionConfig) -> Result<(), DocParseError> {
    if size_bytes > config.max_file_size_bytes() {
        return Err(DocParseError::FileTooLarge {
            size_bytes,
            limit_mb: config.max_file_size_mb,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn pdf(filename: &str, len: usize) -> InputDocument {
        let mut bytes = b"%PDF-1.7\n".to_vec();
        bytes.resize(len.max(bytes.len()), b' ');
        InputDocument::new(filename, bytes)
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn filename_from_url_uses_last_segment() {
        assert_eq!(filename_from_url("https://example.com/a/invoice.pdf"), "invoice.pdf");
        assert_eq!(filename_from_url("https://example.com/download"), "downloaded.pdf");
        assert_eq!(filename_from_url("not a url"), "downloaded.pdf");
    }

    #[test]
    fn accepts_valid_pdf() {
        let config = ExtractionConfig::default();
        assert!(validate_document(&pdf("Invoice.PDF", 64), &config).is_ok());
    }

    #[test]
    fn rejects_wrong_extension() {
        let config = ExtractionConfig::default();
        let err = validate_document(&pdf("scan.png", 64), &config).unwrap_err();
        assert!(matches!(err, DocParseError::UnsupportedFileType { .. }));
    }

    #[test]
    fn rejects_oversized_file() {
        let config = ExtractionConfig::builder().max_file_size_mb(1).build().unwrap();
        let at_limit = pdf("a.pdf", 1024 * 1024);
        assert!(validate_document(&at_limit, &config).is_ok());
        let over = pdf("a.pdf", 1024 * 1024 + 1);
        let err = validate_document(&over, &config).unwrap_err();
        assert!(matches!(err, DocParseError::FileTooLarge { limit_mb: 1, .. }));
    }

    #[test]
    fn rejects_missing_magic() {
        let config = ExtractionConfig::default();
        let doc = InputDocument::new("fake.pdf", b"<html>".to_vec());
        match validate_document(&doc, &config).unwrap_err() {
            DocParseError::NotAPdf { magic, .. } => assert_eq!(magic, b"<htm".to_vec()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_empty_file() {
        let config = ExtractionConfig::default();
        let doc = InputDocument::new("empty.pdf", Vec::new());
        assert!(matches!(
            validate_document(&doc, &config),
            Err(DocParseError::NotAPdf { .. })
        ));
    }

    #[test]
    fn declared_length_over_ceiling_rejected() {
        let config = ExtractionConfig::builder().max_file_size_mb(1).build().unwrap();
        assert!(check_size(1024 * 1024, &config).is_ok());
        assert!(matches!(
            check_size(1024 * 1024 + 1, &config),
            Err(DocParseError::FileTooLarge { size_bytes: 1_048_577, limit_mb: 1 })
        ));
    }

    #[tokio::test]
    async fn resolve_local_reads_file() {
        let mut tmp = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        tmp.write_all(b"%PDF-1.4 test").unwrap();
        let path = tmp.path().to_string_lossy().to_string();

        let doc = resolve_input(&path, &ExtractionConfig::default()).await.unwrap();
        assert!(doc.filename.ends_with(".pdf"));
        assert_eq!(doc.bytes, b"%PDF-1.4 test");
    }

    #[tokio::test]
    async fn resolve_missing_file_is_not_found() {
        let err = resolve_input("/definitely/not/a/real/file.pdf", &ExtractionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DocParseError::FileNotFound { .. }));
    }
}
