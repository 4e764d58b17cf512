//! Tesseract command-line engine wrapper.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info};

use crate::error::BackendError;
use crate::input::{locate, run_command};
use crate::models::config::OcrConfig;

use super::PageText;

/// OCR engine backed by the `tesseract` binary.
///
/// The binary path comes from the configuration handed to the constructor.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    program: PathBuf,
    language: String,
    dpi: u32,
    page_segmentation_mode: Option<u8>,
}

impl TesseractEngine {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            program: config.tesseract_cmd.clone(),
            language: config.language.clone(),
            dpi: config.dpi,
            page_segmentation_mode: config.page_segmentation_mode,
        }
    }

    /// Configured binary path.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Whether the configured binary can be found.
    pub fn is_available(&self) -> bool {
        locate(&self.program).is_some()
    }

    /// Command-line arguments for recognizing one image to stdout.
    fn args(&self, image: &Path) -> Vec<String> {
        let mut args = vec![
            image.display().to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            self.language.clone(),
            "--dpi".to_string(),
            self.dpi.to_string(),
        ];
        if let Some(psm) = self.page_segmentation_mode {
            args.push("--psm".to_string());
            args.push(psm.to_string());
        }
        args
    }

    /// Recognize the text of one page image.
    pub fn recognize(&self, page: u32, image: &Path) -> Result<PageText, BackendError> {
        let start = Instant::now();
        let stdout = run_command(&self.program, self.args(image))?;
        let text = String::from_utf8_lossy(&stdout).into_owned();
        let processing_time_ms = start.elapsed().as_millis() as u64;

        debug!(
            "OCR page {}: {} chars in {}ms",
            page,
            text.trim().len(),
            processing_time_ms
        );

        Ok(PageText {
            page,
            text,
            processing_time_ms,
        })
    }

    /// Recognize a sequence of page images, in order.
    pub fn recognize_all(&self, images: &[PathBuf]) -> Result<Vec<PageText>, BackendError> {
        let start = Instant::now();
        let pages = images
            .iter()
            .enumerate()
            .map(|(i, image)| self.recognize(i as u32 + 1, image))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "OCR complete: {} pages in {}ms",
            pages.len(),
            start.elapsed().as_millis()
        );
        Ok(pages)
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new(&OcrConfig::default())
    }
}
