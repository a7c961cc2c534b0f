//! Document converter boundary: PDF bytes → text or page images.
//!
//! The converter is a black box with two independent paths. The text path
//! fails with [`ConverterError::NoText`] on image-only PDFs (scans); the
//! orchestrator treats that as the signal to try the image path.
//!
//! Implementations are blocking. PDF libraries like pdfium are CPU-bound
//! and not async-safe, so the orchestrator always calls them from
//! `tokio::task::spawn_blocking`, which is why the trait requires
//! `Send + Sync` and is held as `Arc<dyn DocumentConverter>`.

use crate::error::ConverterError;
use edgequake_llm::ImageData;
use image::DynamicImage;

/// Converts raw PDF bytes into model-ready content.
pub trait DocumentConverter: Send + Sync {
    /// Open the document and count its pages.
    ///
    /// Used as the structural validity check before either path runs.
    fn page_count(&self, pdf: &[u8]) -> Result<usize, ConverterError>;

    /// Extract machine-readable text from every page.
    ///
    /// Returns [`ConverterError::NoText`] when the document opens but
    /// contains no non-whitespace text.
    fn extract_text(&self, pdf: &[u8]) -> Result<String, ConverterError>;

    /// Rasterise every page, in page order.
    fn render_pages(&self, pdf: &[u8]) -> Result<Vec<DynamicImage>, ConverterError>;
}

/// Document content in the form the prompt builder consumes.
#[derive(Debug, Clone)]
pub enum DocumentContent {
    /// Extracted text (text mode).
    Text(String),
    /// Encoded page images, one per page (vision mode).
    Images(Vec<ImageData>),
}
