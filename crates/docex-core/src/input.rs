//! Text producers and the external programs behind them.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::BackendError;

/// Extraction method selector passed to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputMethod {
    /// Read the PDF's embedded text layer.
    TextLayer,
    /// Rasterize pages and run OCR.
    Ocr,
}

impl fmt::Display for InputMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputMethod::TextLayer => f.write_str("text-layer"),
            InputMethod::Ocr => f.write_str("ocr"),
        }
    }
}

/// Turns an input file into plain text.
pub trait TextInput {
    fn to_text(&self, path: &Path) -> Result<String, BackendError>;
}

/// Resolve a program to an executable path.
///
/// Paths with a directory component are checked as-is; bare names are
/// looked up on `PATH`.
pub fn locate(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return program.is_file().then(|| program.to_path_buf());
    }
    which::which(program).ok()
}

/// Run a program to completion and return its stdout.
pub fn run_command<I, S>(program: &Path, args: I) -> Result<Vec<u8>, BackendError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let name = program.display().to_string();
    let mut command = Command::new(program);
    command.args(args);
    trace!("Running {:?}", command);

    let output = command.output().map_err(|e| BackendError::Spawn {
        program: name.clone(),
        reason: e.to_string(),
    })?;

    if !output.status.success() {
        return Err(BackendError::Command {
            program: name,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    debug!("{} produced {} bytes", name, output.stdout.len());
    Ok(output.stdout)
}

/// Reject whitespace-only text.
pub(crate) fn non_empty(text: String, what: &str) -> Result<String, BackendError> {
    if text.trim().is_empty() {
        Err(BackendError::NoText(format!("{} produced no text", what)))
    } else {
        Ok(text)
    }
}
