//! Fast path: the PDF's embedded text layer.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{is_pdf, PdfDocument, PdfProcessor};
use crate::error::BackendError;
use crate::input::{non_empty, run_command, TextInput};
use crate::models::config::PdfConfig;

/// Reads the text layer, either through `pdftotext` or in-process.
#[derive(Debug, Clone)]
pub struct PdfTextInput {
    pdftotext_cmd: Option<PathBuf>,
    layout: bool,
}

impl PdfTextInput {
    pub fn new(config: &PdfConfig) -> Self {
        Self {
            pdftotext_cmd: config.pdftotext_cmd.clone(),
            layout: config.layout,
        }
    }

    fn with_pdftotext(&self, program: &Path, path: &Path) -> Result<String, BackendError> {
        let mut args: Vec<&OsStr> = Vec::with_capacity(5);
        if self.layout {
            args.push(OsStr::new("-layout"));
        }
        args.extend([
            OsStr::new("-enc"),
            OsStr::new("UTF-8"),
            path.as_os_str(),
            OsStr::new("-"),
        ]);

        let stdout = run_command(program, args)?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    fn in_process(&self, path: &Path) -> Result<String, BackendError> {
        let doc = PdfDocument::open(path)?;
        debug!("Reading text layer of {} ({} pages)", path.display(), doc.page_count());
        doc.extract_text()
    }
}

impl Default for PdfTextInput {
    fn default() -> Self {
        Self::new(&PdfConfig::default())
    }
}

impl TextInput for PdfTextInput {
    fn to_text(&self, path: &Path) -> Result<String, BackendError> {
        if !is_pdf(path) {
            return Err(BackendError::Unsupported(format!(
                "{} has no text layer (not a PDF)",
                path.display()
            )));
        }

        let text = match &self.pdftotext_cmd {
            Some(program) => self.with_pdftotext(program, path)?,
            None => self.in_process(path)?,
        };
        non_empty(text, "text layer")
    }
}
