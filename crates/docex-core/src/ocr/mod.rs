//! OCR pipeline: rasterize pages, then run Tesseract on each page image.

mod rasterize;
mod tesseract;

pub use rasterize::{PageImages, PageRasterizer};
pub use tesseract::TesseractEngine;

use std::path::Path;

use tracing::debug;

use crate::error::BackendError;
use crate::input::{non_empty, TextInput};
use crate::models::config::OcrConfig;
use crate::pdf::is_pdf;

/// Extensions handed to Tesseract without rasterizing.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp", "gif", "webp"];

/// Separator between pages in OCR output, matching `pdftotext`.
pub const PAGE_BREAK: char = '\x0c';

/// Recognized text of one page.
#[derive(Debug, Clone)]
pub struct PageText {
    /// Page number (1-indexed).
    pub page: u32,

    /// Recognized text.
    pub text: String,

    /// Time spent in the OCR engine.
    pub processing_time_ms: u64,
}

/// Slow path: OCR over page images.
#[derive(Debug, Clone)]
pub struct TesseractInput {
    engine: TesseractEngine,
    rasterizer: PageRasterizer,
}

impl TesseractInput {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            engine: TesseractEngine::new(config),
            rasterizer: PageRasterizer::new(config),
        }
    }

    pub fn engine(&self) -> &TesseractEngine {
        &self.engine
    }
}

impl Default for TesseractInput {
    fn default() -> Self {
        Self::new(&OcrConfig::default())
    }
}

impl TextInput for TesseractInput {
    fn to_text(&self, path: &Path) -> Result<String, BackendError> {
        let pages = if is_image(path) {
            vec![self.engine.recognize(1, path)?]
        } else if is_pdf(path) {
            let images = self.rasterizer.rasterize(path)?;
            self.engine.recognize_all(images.pages())?
        } else {
            return Err(BackendError::Unsupported(format!(
                "{} is neither a PDF nor an image",
                path.display()
            )));
        };

        debug!("OCR produced {} pages for {}", pages.len(), path.display());
        non_empty(join_pages(&pages), "OCR")
    }
}

/// Concatenate page texts with form feeds between pages.
pub fn join_pages(pages: &[PageText]) -> String {
    let mut out = String::new();
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            out.push(PAGE_BREAK);
        }
        out.push_str(page.text.trim_end());
    }
    out
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|ext| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}
