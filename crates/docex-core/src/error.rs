//! Error types for the docex-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the docex library.
#[derive(Error, Debug)]
pub enum DocexError {
    /// The input file does not exist.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Every configured extraction method ran without producing data.
    #[error("no data extracted from {} with any method", path.display())]
    Exhausted { path: PathBuf },

    /// A single extraction attempt failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Templates could not be loaded.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl DocexError {
    /// Whether this error only describes a failed attempt and may be retried
    /// with another extraction method.
    pub fn is_backend_failure(&self) -> bool {
        matches!(self, DocexError::Backend(_))
    }
}

/// Errors raised while turning an input file into text.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Pdf(String),

    /// The PDF is encrypted with a non-empty password.
    #[error("PDF is encrypted")]
    Encrypted,

    /// An external program could not be started.
    #[error("failed to run {program}: {reason}")]
    Spawn { program: String, reason: String },

    /// An external program exited unsuccessfully.
    #[error("{program} exited with {status}: {stderr}")]
    Command {
        program: String,
        status: String,
        stderr: String,
    },

    /// The input produced no usable text.
    #[error("no text extracted: {0}")]
    NoText(String),

    /// The method cannot handle this kind of file.
    #[error("unsupported input: {0}")]
    Unsupported(String),

    /// Image decoding or encoding failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error while preparing intermediate files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to loading and compiling templates.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// The template folder does not exist.
    #[error("template folder not found: {}", .0.display())]
    FolderNotFound(PathBuf),

    /// The folder exists but contains no template files.
    #[error("no templates found in {}", .0.display())]
    Empty(PathBuf),

    /// A template file could not be read or deserialized.
    #[error("failed to parse template {source_name}: {reason}")]
    Parse { source_name: String, reason: String },

    /// A keyword or field pattern is not a valid regex.
    #[error("invalid regex in template {issuer} ({field}): {source}")]
    Regex {
        issuer: String,
        field: String,
        #[source]
        source: regex::Error,
    },

    /// The template is structurally invalid.
    #[error("invalid template {issuer}: {reason}")]
    Invalid { issuer: String, reason: String },

    /// I/O error while walking the template folder.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the docex library.
pub type Result<T> = std::result::Result<T, DocexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_failure_classification() {
        let err = DocexError::from(BackendError::NoText("empty page".to_string()));
        assert!(err.is_backend_failure());

        assert!(!DocexError::NotFound(PathBuf::from("a.pdf")).is_backend_failure());
        assert!(!DocexError::Config("bad".to_string()).is_backend_failure());
        assert!(!DocexError::from(TemplateError::FolderNotFound(PathBuf::from("t"))).is_backend_failure());
    }

    #[test]
    fn test_messages() {
        let err = DocexError::Exhausted {
            path: PathBuf::from("data/delta.pdf"),
        };
        assert_eq!(
            err.to_string(),
            "no data extracted from data/delta.pdf with any method"
        );

        let err = DocexError::NotFound(PathBuf::from("missing.pdf"));
        assert_eq!(err.to_string(), "file not found: missing.pdf");
    }
}
