//! Tools command - report which external programs can be found.

use std::path::Path;

use console::style;

use docex_core::input::locate;

use super::load_config;

pub async fn run(config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    match &config.pdf.pdftotext_cmd {
        Some(program) => report("pdftotext", program, "text layer"),
        None => println!(
            "{} {:<10} in-process (pdf-extract)",
            style("✓").green(),
            "pdftotext"
        ),
    }
    report("pdftoppm", &config.ocr.pdftoppm_cmd, "OCR rasterization");
    report("tesseract", &config.ocr.tesseract_cmd, "OCR");

    Ok(())
}

fn report(name: &str, program: &Path, used_for: &str) {
    match locate(program) {
        Some(path) => println!("{} {:<10} {}", style("✓").green(), name, path.display()),
        None => println!(
            "{} {:<10} {} not found ({} unavailable)",
            style("✗").red(),
            name,
            program.display(),
            used_for
        ),
    }
}
