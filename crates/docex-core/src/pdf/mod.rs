//! PDF access: embedded text layer and embedded page images.

mod document;
#[cfg(test)]
pub(crate) mod fixtures;
mod pdftotext;

pub use document::PdfDocument;
pub use pdftotext::PdfTextInput;

use image::DynamicImage;

use crate::error::BackendError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Operations on a loaded PDF.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract text from the entire PDF.
    fn extract_text(&self) -> Result<String>;

    /// Extract embedded images from a page (1-indexed).
    fn extract_images(&self, page: u32) -> Result<Vec<DynamicImage>>;
}

/// True if the file looks like a PDF by extension.
pub fn is_pdf(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}
