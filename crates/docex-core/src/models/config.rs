//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DocexError, Result};

/// Main configuration for the docex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocexConfig {
    /// Orchestration configuration.
    pub extraction: ExtractionConfig,

    /// Text-layer extraction configuration.
    pub pdf: PdfConfig,

    /// OCR configuration.
    pub ocr: OcrConfig,
}

/// Orchestration defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Retry with OCR when the text layer yields nothing.
    pub fallback_to_ocr: bool,

    /// Folder with custom templates (built-in templates when unset).
    pub template_folder: Option<PathBuf>,

    /// Number of files processed concurrently in batch mode.
    pub jobs: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            fallback_to_ocr: true,
            template_folder: None,
            jobs: 1,
        }
    }
}

/// Text-layer extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Path to the `pdftotext` binary. In-process extraction when unset.
    pub pdftotext_cmd: Option<PathBuf>,

    /// Keep the physical layout when running `pdftotext`.
    pub layout: bool,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            pdftotext_cmd: None,
            layout: true,
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Path to the `tesseract` binary.
    pub tesseract_cmd: PathBuf,

    /// Path to the `pdftoppm` binary used to rasterize PDF pages.
    pub pdftoppm_cmd: PathBuf,

    /// Tesseract language code(s), e.g. `eng` or `eng+deu`.
    pub language: String,

    /// Rasterization resolution.
    pub dpi: u32,

    /// Tesseract page segmentation mode (`--psm`).
    pub page_segmentation_mode: Option<u8>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_cmd: PathBuf::from("tesseract"),
            pdftoppm_cmd: PathBuf::from("pdftoppm"),
            language: "eng".to_string(),
            dpi: 300,
            page_segmentation_mode: None,
        }
    }
}

impl DocexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| DocexError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| DocexError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
