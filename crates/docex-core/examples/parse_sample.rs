//! Extract the bundled sample invoice and print what was found.
//!
//! Run from the workspace root:
//!
//! ```sh
//! cargo run -p docex-core --example parse_sample
//! ```
//!
//! Set `RUST_LOG=info` to see which method produced the result.

use std::path::Path;

use docex_core::{DocexConfig, ExtractOptions, Extractor};
use tracing_subscriber::EnvFilter;

const SAMPLE_FILE: &str = "data/pdf_files/delta.pdf";
const TEMPLATE_FOLDER: &str = "data/templates";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let extractor = Extractor::from_config(&DocexConfig::default());
    let options = ExtractOptions::default().with_template_folder(TEMPLATE_FOLDER);

    match extractor.extract(Path::new(SAMPLE_FILE), &options) {
        Ok(result) => match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("Extracted data: {}", json),
            Err(_) => println!("Extracted data: {:?}", result),
        },
        Err(e) => println!("Error: {}", e),
    }
}
