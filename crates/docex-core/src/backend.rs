//! Extraction backends: turn a file into an [`ExtractionResult`] with one method.

use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::input::{InputMethod, TextInput};
use crate::models::config::DocexConfig;
use crate::models::value::ExtractionResult;
use crate::ocr::TesseractInput;
use crate::pdf::PdfTextInput;
use crate::template::TemplateSet;

/// Runs one extraction attempt.
///
/// Failures of the attempt itself are reported as [`crate::DocexError::Backend`];
/// callers may retry those with another method.
pub trait ExtractionBackend {
    fn extract(
        &self,
        path: &Path,
        templates: &TemplateSet,
        method: InputMethod,
    ) -> Result<ExtractionResult>;
}

impl<B: ExtractionBackend + ?Sized> ExtractionBackend for &B {
    fn extract(
        &self,
        path: &Path,
        templates: &TemplateSet,
        method: InputMethod,
    ) -> Result<ExtractionResult> {
        (**self).extract(path, templates, method)
    }
}

/// Text producers plus template matching.
#[derive(Debug, Clone, Default)]
pub struct TemplateBackend {
    text_layer: PdfTextInput,
    ocr: TesseractInput,
}

impl TemplateBackend {
    pub fn new(text_layer: PdfTextInput, ocr: TesseractInput) -> Self {
        Self { text_layer, ocr }
    }

    pub fn from_config(config: &DocexConfig) -> Self {
        Self::new(PdfTextInput::new(&config.pdf), TesseractInput::new(&config.ocr))
    }

    fn input(&self, method: InputMethod) -> &dyn TextInput {
        match method {
            InputMethod::TextLayer => &self.text_layer,
            InputMethod::Ocr => &self.ocr,
        }
    }

    /// Text the given method produces for `path`, without template matching.
    pub fn to_text(&self, path: &Path, method: InputMethod) -> Result<String> {
        Ok(self.input(method).to_text(path)?)
    }
}

impl ExtractionBackend for TemplateBackend {
    fn extract(
        &self,
        path: &Path,
        templates: &TemplateSet,
        method: InputMethod,
    ) -> Result<ExtractionResult> {
        let text = self.to_text(path, method)?;
        debug!(
            "{}: {} characters via {}",
            path.display(),
            text.chars().count(),
            method
        );
        Ok(templates.extract(&text))
    }
}
