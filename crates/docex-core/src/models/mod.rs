//! Data models shared across the pipeline.

pub mod config;
pub mod value;

pub use config::{DocexConfig, ExtractionConfig, OcrConfig, PdfConfig};
pub use value::{ExtractionResult, FieldValue};
