//! Image encoding: rendered page → base64 PNG wrapped in `ImageData`.
//!
//! Vision APIs accept images as base64 data embedded in the JSON request
//! body. PNG is lossless, which keeps small print legible for the model;
//! `detail: "high"` asks OpenAI-class models for the full tile budget.

use crate::error::ConverterError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode one rendered page (1-indexed `page` for error messages).
pub fn encode_page(page: usize, img: &DynamicImage) -> Result<ImageData, ConverterError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| ConverterError::Encode {
            page,
            detail: e.to_string(),
        })?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded page {} → {} bytes base64", page, b64.len());

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}

/// Encode all pages in order; the first failure aborts.
pub fn encode_pages(images: &[DynamicImage]) -> Result<Vec<ImageData>, ConverterError> {
    images
        .iter()
        .enumerate()
        .map(|(idx, img)| encode_page(idx + 1, img))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn red_square() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])))
    }

    #[test]
    fn encode_small_image() {
        let data = encode_page(1, &red_square()).expect("encode should succeed");
        assert_eq!(data.mime_type, "image/png");
        assert_eq!(data.detail.as_deref(), Some("high"));
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert!(decoded.starts_with(b"\x89PNG"));
    }

    #[test]
    fn encode_pages_keeps_order_and_count() {
        let pages = vec![red_square(), red_square(), red_square()];
        let encoded = encode_pages(&pages).unwrap();
        assert_eq!(encoded.len(), 3);
        assert!(encoded.iter().all(|d| d.detail.as_deref() == Some("high")));
    }
}
