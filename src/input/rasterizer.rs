//! First-page rasterization of uploaded PDFs
//!
//! The model only ever sees page one of a resume, rendered to a JPEG and
//! base64-wrapped for the request body. Validation happens with lopdf before
//! any rendering so malformed uploads fail fast with a document error.

use crate::config::RenderConfig;
use crate::error::{CareerMateError, Result};
use base64::prelude::*;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use log::debug;
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;

pub const JPEG_MIME_TYPE: &str = "image/jpeg";

/// Base64 image payload sent alongside a prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageImage {
    pub mime_type: String,
    pub data: String,
}

impl PageImage {
    pub fn jpeg(bytes: &[u8]) -> Self {
        Self {
            mime_type: JPEG_MIME_TYPE.to_string(),
            data: BASE64_STANDARD.encode(bytes),
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64_STANDARD
            .decode(&self.data)
            .map_err(|e| CareerMateError::Rendering(format!("Invalid base64 payload: {}", e)))
    }
}

/// Renders a single PDF page to a bitmap
pub trait PageRenderer: Send + Sync {
    fn render_page(&self, pdf_bytes: &[u8], page_index: u16, scale: f32) -> Result<DynamicImage>;
}

/// The pdfium bindings are process-wide and can only be loaded once
static PDFIUM: OnceLock<Pdfium> = OnceLock::new();

/// Renderer backed by the pdfium library
#[derive(Debug, Clone, Default)]
pub struct PdfiumRenderer {
    library_path: Option<PathBuf>,
}

impl PdfiumRenderer {
    pub fn new(library_path: Option<PathBuf>) -> Self {
        Self { library_path }
    }

    fn bind(&self) -> Result<Pdfium> {
        let bindings = match &self.library_path {
            Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| CareerMateError::Rendering(format!("Failed to load pdfium: {}", e)))?;

        Ok(Pdfium::new(bindings))
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render_page(&self, pdf_bytes: &[u8], page_index: u16, scale: f32) -> Result<DynamicImage> {
        let pdfium = shared(&PDFIUM, || self.bind())?;

        let document = pdfium
            .load_pdf_from_byte_slice(pdf_bytes, None)
            .map_err(|e| CareerMateError::Document(format!("pdfium could not open the document: {}", e)))?;

        let page = document
            .pages()
            .get(page_index)
            .map_err(|e| CareerMateError::Document(format!("Page {} is not available: {}", page_index + 1, e)))?;

        let config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| CareerMateError::Rendering(format!("Failed to render page {}: {}", page_index + 1, e)))?;

        Ok(bitmap.as_image())
    }
}

/// Value initialized on first success; a failed init is retried on the next call.
/// When a concurrent init wins the race, its value is returned instead of the error.
fn shared<T>(cell: &OnceLock<T>, init: impl FnOnce() -> Result<T>) -> Result<&T> {
    if let Some(value) = cell.get() {
        return Ok(value);
    }
    match init() {
        Ok(value) => Ok(cell.get_or_init(|| value)),
        Err(e) => cell.get().ok_or(e),
    }
}

/// Converts page one of a PDF into a JPEG payload
#[derive(Debug, Clone)]
pub struct Rasterizer<R> {
    renderer: R,
    scale: f32,
    jpeg_quality: u8,
}

impl<R: PageRenderer> Rasterizer<R> {
    pub fn new(renderer: R, config: &RenderConfig) -> Self {
        Self {
            renderer,
            scale: config.scale,
            jpeg_quality: config.jpeg_quality.clamp(1, 100),
        }
    }

    pub fn rasterize_first_page(&self, pdf_bytes: &[u8]) -> Result<PageImage> {
        let pages = count_pages(pdf_bytes)?;
        if pages == 0 {
            return Err(CareerMateError::Document("The PDF has no pages".to_string()));
        }

        debug!("Rendering page 1 of {} at {}x", pages, self.scale);
        let image = self.renderer.render_page(pdf_bytes, 0, self.scale)?;
        let jpeg = encode_jpeg(&image, self.jpeg_quality)?;
        debug!("Encoded page 1 as {} byte JPEG ({}x{})", jpeg.len(), image.width(), image.height());

        Ok(PageImage::jpeg(&jpeg))
    }
}

/// Number of pages in the document; fails for anything lopdf cannot parse
pub fn count_pages(pdf_bytes: &[u8]) -> Result<usize> {
    let document = lopdf::Document::load_mem(pdf_bytes)
        .map_err(|e| CareerMateError::Document(format!("Not a valid PDF: {}", e)))?;
    Ok(document.get_pages().len())
}

/// JPEG has no alpha channel, so the bitmap is flattened to RGB first
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let rgb = image.to_rgb8();
    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder.encode_image(&rgb)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Document, Object};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingRenderer {
        requested: Arc<Mutex<Vec<u16>>>,
    }

    impl PageRenderer for RecordingRenderer {
        fn render_page(&self, _pdf_bytes: &[u8], page_index: u16, scale: f32) -> Result<DynamicImage> {
            self.requested.lock().unwrap().push(page_index);
            let side = (10.0 * scale) as u32;
            Ok(DynamicImage::new_rgba8(side, side))
        }
    }

    fn pdf_with_pages(count: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = (0..count)
            .map(|_| {
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                })
                .into()
            })
            .collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_only_first_page_is_rendered() {
        let renderer = RecordingRenderer::default();
        let rasterizer = Rasterizer::new(renderer.clone(), &RenderConfig::default());

        let image = rasterizer.rasterize_first_page(&pdf_with_pages(3)).unwrap();

        assert_eq!(*renderer.requested.lock().unwrap(), vec![0]);
        assert_eq!(image.mime_type, "image/jpeg");
        let jpeg = image.decode().unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_malformed_bytes_are_a_document_error() {
        let renderer = RecordingRenderer::default();
        let rasterizer = Rasterizer::new(renderer.clone(), &RenderConfig::default());

        let result = rasterizer.rasterize_first_page(b"definitely not a pdf");

        assert!(matches!(result, Err(CareerMateError::Document(_))));
        assert!(renderer.requested.lock().unwrap().is_empty());
    }

    #[test]
    fn test_zero_page_document_is_rejected() {
        let renderer = RecordingRenderer::default();
        let rasterizer = Rasterizer::new(renderer.clone(), &RenderConfig::default());

        let result = rasterizer.rasterize_first_page(&pdf_with_pages(0));

        assert!(matches!(result, Err(CareerMateError::Document(_))));
        assert!(renderer.requested.lock().unwrap().is_empty());
    }

    #[test]
    fn test_shared_value_is_initialized_once() {
        let cell = OnceLock::new();
        let mut calls = 0;

        let first = shared(&cell, || {
            calls += 1;
            Ok(7)
        })
        .unwrap();
        assert_eq!(*first, 7);

        let second = shared(&cell, || -> Result<i32> { panic!("initialized twice") }).unwrap();
        assert_eq!(*second, 7);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_failed_shared_init_is_retried() {
        let cell = OnceLock::new();

        let failed = shared(&cell, || Err(CareerMateError::Rendering("no pdfium".to_string())));
        assert!(matches!(failed, Err(CareerMateError::Rendering(_))));

        assert_eq!(*shared(&cell, || Ok("bound")).unwrap(), "bound");
    }

    #[test]
    fn test_count_pages() {
        assert_eq!(count_pages(&pdf_with_pages(2)).unwrap(), 2);
    }

    #[test]
    fn test_encode_jpeg_drops_alpha() {
        let jpeg = encode_jpeg(&DynamicImage::new_rgba8(8, 4), 80).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 4));
    }
}
