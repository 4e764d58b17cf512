//! Turning PDF pages into image files for OCR.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::BackendError;
use crate::input::run_command;
use crate::models::config::OcrConfig;
use crate::pdf::{PdfDocument, PdfProcessor};

/// Page images written to a temporary directory.
///
/// The directory and its files are removed when this value is dropped.
pub struct PageImages {
    _dir: TempDir,
    pages: Vec<PathBuf>,
}

impl PageImages {
    /// Page image paths in page order.
    pub fn pages(&self) -> &[PathBuf] {
        &self.pages
    }
}

/// Rasterizes PDFs with `pdftoppm`, falling back to embedded page images.
#[derive(Debug, Clone)]
pub struct PageRasterizer {
    pdftoppm_cmd: PathBuf,
    dpi: u32,
}

impl PageRasterizer {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            pdftoppm_cmd: config.pdftoppm_cmd.clone(),
            dpi: config.dpi,
        }
    }

    /// Produce one PNG per page.
    pub fn rasterize(&self, pdf: &Path) -> Result<PageImages, BackendError> {
        let dir = tempfile::Builder::new().prefix("docex-ocr-").tempdir()?;

        let pages = match self.with_pdftoppm(pdf, dir.path()) {
            Ok(pages) if !pages.is_empty() => pages,
            Ok(_) => {
                warn!("pdftoppm produced no images, using embedded page images");
                self.embedded_images(pdf, dir.path())?
            }
            Err(e) => {
                warn!("pdftoppm failed ({}), using embedded page images", e);
                self.embedded_images(pdf, dir.path())?
            }
        };

        if pages.is_empty() {
            return Err(BackendError::NoText(format!(
                "no page images could be produced from {}",
                pdf.display()
            )));
        }

        debug!("Rasterized {} pages into {}", pages.len(), dir.path().display());
        Ok(PageImages { _dir: dir, pages })
    }

    fn with_pdftoppm(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, BackendError> {
        let prefix = out_dir.join("page");
        let dpi = self.dpi.to_string();
        run_command(
            &self.pdftoppm_cmd,
            [
                OsStr::new("-png"),
                OsStr::new("-r"),
                OsStr::new(&dpi),
                pdf.as_os_str(),
                prefix.as_os_str(),
            ],
        )?;

        list_pngs(out_dir)
    }

    fn embedded_images(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, BackendError> {
        let doc = PdfDocument::open(pdf)?;
        let mut pages = Vec::new();

        for page in 1..=doc.page_count() {
            let images = match doc.extract_images(page) {
                Ok(images) => images,
                Err(e) => {
                    warn!("Failed to extract images from page {}: {}", page, e);
                    continue;
                }
            };
            for (i, image) in images.iter().enumerate() {
                let path = out_dir.join(format!("embedded-{:04}-{:02}.png", page, i + 1));
                image.save(&path)?;
                pages.push(path);
            }
        }

        Ok(pages)
    }
}

impl Default for PageRasterizer {
    fn default() -> Self {
        Self::new(&OcrConfig::default())
    }
}

/// PNG files in a directory, sorted by name.
///
/// pdftoppm zero-pads page numbers, so name order is page order.
fn list_pngs(dir: &Path) -> Result<Vec<PathBuf>, BackendError> {
    let mut pngs: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.eq_ignore_ascii_case("png"))
                .unwrap_or(false)
        })
        .collect();
    pngs.sort();
    Ok(pngs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_list_pngs_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page-10.png", "page-02.png", "page-01.png", "notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let names: Vec<String> = list_pngs(dir.path())
            .unwrap()
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(names, vec!["page-01.png", "page-02.png", "page-10.png"]);
    }

    #[test]
    fn test_unreadable_pdf_without_pdftoppm() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("scan.pdf");
        fs::write(&pdf, b"not really a pdf").unwrap();

        let rasterizer = PageRasterizer::new(&OcrConfig {
            pdftoppm_cmd: PathBuf::from("docex-missing-pdftoppm"),
            ..OcrConfig::default()
        });
        assert!(matches!(
            rasterizer.rasterize(&pdf),
            Err(BackendError::Pdf(_))
        ));
    }
}
