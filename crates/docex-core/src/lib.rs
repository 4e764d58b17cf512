//! Core library for template-driven document data extraction.
//!
//! This crate provides:
//! - Text-layer extraction from PDFs (in-process or via `pdftotext`)
//! - OCR via the `tesseract` binary, with `pdftoppm` rasterization
//! - Regex templates in the invoice2data format (YAML/JSON)
//! - An orchestrator that tries the text layer first and falls back to OCR
//! - A batch runner with per-file failure isolation

pub mod backend;
pub mod batch;
pub mod error;
pub mod input;
pub mod models;
pub mod ocr;
pub mod orchestrator;
pub mod pdf;
pub mod template;

pub use backend::{ExtractionBackend, TemplateBackend};
pub use batch::{BatchEntry, BatchResult, BatchRunner};
pub use error::{BackendError, DocexError, Result, TemplateError};
pub use input::{InputMethod, TextInput};
pub use models::config::DocexConfig;
pub use models::value::{ExtractionResult, FieldValue};
pub use ocr::TesseractInput;
pub use orchestrator::{ExtractOptions, Extractor};
pub use pdf::PdfTextInput;
pub use template::{Template, TemplateLoader, TemplateSet, TemplateStore};

use std::path::Path;

/// Extract fields from one file with the default configuration.
pub fn extract(
    path: impl AsRef<Path>,
    fallback_to_ocr: bool,
    template_folder: Option<&Path>,
) -> Result<ExtractionResult> {
    let options = ExtractOptions {
        fallback_to_ocr,
        template_folder: template_folder.map(Path::to_path_buf),
    };
    Extractor::from_config(&DocexConfig::default()).extract(path.as_ref(), &options)
}

/// Extract fields from many files with the default configuration.
pub fn extract_batch<P: AsRef<Path>>(paths: &[P], options: &ExtractOptions) -> BatchResult {
    Extractor::from_config(&DocexConfig::default()).extract_batch(paths, options)
}
