//! Production [`DocumentConverter`] backed by pdfium.
//!
//! Each call binds pdfium, loads the document from the in-memory bytes and
//! drops everything before returning, so the converter itself holds no
//! library state and can be shared freely. All methods block and are meant
//! to run inside `spawn_blocking`.
//!
//! Rendering scales each page by `dpi / 72` (PDF user space is 72 units per
//! inch) and caps the longest edge at `max_rendered_pixels`, so an A0 poster
//! cannot allocate a 13 000 px bitmap.

use crate::config::ExtractionConfig;
use crate::error::ConverterError;
use crate::pipeline::converter::DocumentConverter;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};

/// pdfium-backed converter.
#[derive(Debug, Clone)]
pub struct PdfiumConverter {
    dpi: u32,
    max_rendered_pixels: u32,
    password: Option<String>,
    library_path: Option<PathBuf>,
}

impl Default for PdfiumConverter {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

impl PdfiumConverter {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            dpi: config.dpi,
            max_rendered_pixels: config.max_rendered_pixels,
            password: config.password.clone(),
            library_path: config.pdfium_lib_path.clone(),
        }
    }

    fn bind(&self) -> Result<Pdfium, ConverterError> {
        let bindings = match &self.library_path {
            Some(path) => Pdfium::bind_to_library(path),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| ConverterError::Binding(format!("{:?}", e)))?;
        Ok(Pdfium::new(bindings))
    }

    fn load<'a>(&'a self, pdfium: &'a Pdfium, pdf: &'a [u8]) -> Result<PdfDocument<'a>, ConverterError> {
        pdfium
            .load_pdf_from_byte_slice(pdf, self.password.as_deref())
            .map_err(|e| classify_load_error(format!("{:?}", e), self.password.is_some()))
    }
}

impl DocumentConverter for PdfiumConverter {
    fn page_count(&self, pdf: &[u8]) -> Result<usize, ConverterError> {
        let pdfium = self.bind()?;
        let document = self.load(&pdfium, pdf)?;
        let pages = document.pages().len() as usize;
        info!("PDF loaded: {} pages", pages);
        Ok(pages)
    }

    fn extract_text(&self, pdf: &[u8]) -> Result<String, ConverterError> {
        let pdfium = self.bind()?;
        let document = self.load(&pdfium, pdf)?;

        let mut text = String::new();
        for (idx, page) in document.pages().iter().enumerate() {
            let page_text = page
                .text()
                .map_err(|e| ConverterError::Load(format!("page {}: {:?}", idx + 1, e)))?;
            text.push_str(&page_text.all());
            text.push('\n');
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(ConverterError::NoText);
        }
        debug!("Extracted {} chars of text", text.len());
        Ok(text.to_string())
    }

    fn render_pages(&self, pdf: &[u8]) -> Result<Vec<DynamicImage>, ConverterError> {
        let pdfium = self.bind()?;
        let document = self.load(&pdfium, pdf)?;
        let pages = document.pages();
        if pages.len() == 0 {
            return Err(ConverterError::NoPages);
        }

        let max = self.max_rendered_pixels as i32;
        let render_config = PdfRenderConfig::new()
            .scale_page_by_factor(scale_for_dpi(self.dpi))
            .set_maximum_width(max)
            .set_maximum_height(max);

        let mut images = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            let bitmap = page
                .render_with_config(&render_config)
                .map_err(|e| ConverterError::Render {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                })?;
            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                idx + 1,
                image.width(),
                image.height()
            );
            images.push(image);
        }

        Ok(images)
    }
}

/// Render scale for a target DPI.
fn scale_for_dpi(dpi: u32) -> f32 {
    dpi as f32 / 72.0
}

/// Map a pdfium load failure onto the converter taxonomy.
fn classify_load_error(detail: String, password_supplied: bool) -> ConverterError {
    if detail.contains("Password") || detail.contains("password") {
        if password_supplied {
            ConverterError::WrongPassword
        } else {
            ConverterError::PasswordRequired
        }
    } else {
        ConverterError::Load(detail)
    }
}
