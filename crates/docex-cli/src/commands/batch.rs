//! Batch command for multiple files.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use docex_core::{BatchEntry, BatchResult, BatchRunner, ExtractOptions, Extractor};

use super::extract::{format_result, OutputFormat};
use super::load_config;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob patterns
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output directory for per-file results
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Template folder (default: built-in templates)
    #[arg(short, long)]
    templates: Option<PathBuf>,

    /// Use only the PDF text layer, never OCR
    #[arg(long)]
    no_ocr: bool,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers (default: from config)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let mut options = ExtractOptions::from_config(&config);
    if args.no_ocr {
        options.fallback_to_ocr = false;
    }
    if let Some(folder) = &args.templates {
        options.template_folder = Some(folder.clone());
    }

    let files = expand_inputs(&args.inputs)?;
    if files.is_empty() {
        anyhow::bail!("No matching files found for: {}", args.inputs.join(" "));
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let jobs = args.jobs.unwrap_or(config.extraction.jobs);
    let progress = pb.clone();
    let runner = BatchRunner::new()
        .jobs(jobs)
        .on_progress(move |_, _| progress.inc(1));

    let extractor = Extractor::from_config(&config);
    let results = runner.run(&extractor, &files, &options);
    pb.finish_with_message("Complete");

    if let Some(output_dir) = &args.output_dir {
        write_outputs(output_dir, &results, args.format)?;
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(results.succeeded()).green(),
        style(results.failed()).red()
    );

    if results.failed() > 0 {
        println!();
        println!("{}", style("Failed files:").red());
        for (path, entry) in results.iter() {
            if let Some(error) = entry.error() {
                println!("  - {}: {}", path.display(), error);
            }
        }
    }

    Ok(())
}

/// Expand glob patterns; plain paths are kept even when missing.
fn expand_inputs(inputs: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.contains(['*', '?', '[']) {
            let matched: Vec<PathBuf> = glob(input)?
                .filter_map(|r| r.ok())
                .filter(|p| p.is_file())
                .collect();
            debug!("{} matched {} files", input, matched.len());
            files.extend(matched);
        } else {
            files.push(PathBuf::from(input));
        }
    }
    Ok(files)
}

/// One output file per extracted document. Repeated stems get `-2`, `-3`, ...
fn write_outputs(output_dir: &Path, results: &BatchResult, format: OutputFormat) -> anyhow::Result<()> {
    let mut used = HashSet::new();
    for (path, entry) in results.iter() {
        let Some(result) = entry.result() else {
            continue;
        };

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        let mut name = format!("{}.{}", stem, format.extension());
        let mut n = 1;
        while !used.insert(name.clone()) {
            n += 1;
            name = format!("{}-{}.{}", stem, n, format.extension());
        }
        let output_path = output_dir.join(name);

        fs::write(&output_path, format_result(result, format)?)?;
        debug!("Wrote output to {}", output_path.display());
    }
    Ok(())
}

fn write_summary(path: &Path, results: &BatchResult) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["filename", "status", "issuer", "fields", "error"])?;

    for (file, entry) in results.iter() {
        let filename = file.display().to_string();
        match entry {
            BatchEntry::Extracted(result) => {
                let issuer = result
                    .get("issuer")
                    .map(ToString::to_string)
                    .unwrap_or_default();
                wtr.write_record([
                    filename.as_str(),
                    "success",
                    issuer.as_str(),
                    result.len().to_string().as_str(),
                    "",
                ])?;
            }
            BatchEntry::Failed { error } => {
                wtr.write_record([filename.as_str(), "error", "", "", error.as_str()])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
