//! Batch extraction with per-file failure isolation.

use std::path::{Path, PathBuf};
use std::time::Instant;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::ExtractionBackend;
use crate::error::{DocexError, Result};
use crate::models::value::ExtractionResult;
use crate::orchestrator::{ExtractOptions, Extractor};
use crate::template::TemplateStore;

/// Outcome for one file of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Extracted(ExtractionResult),
    Failed { error: String },
}

impl BatchEntry {
    pub fn is_success(&self) -> bool {
        matches!(self, BatchEntry::Extracted(_))
    }

    pub fn result(&self) -> Option<&ExtractionResult> {
        match self {
            BatchEntry::Extracted(result) => Some(result),
            BatchEntry::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            BatchEntry::Extracted(_) => None,
            BatchEntry::Failed { error } => Some(error),
        }
    }
}

impl From<Result<ExtractionResult>> for BatchEntry {
    fn from(result: Result<ExtractionResult>) -> Self {
        match result {
            Ok(result) => BatchEntry::Extracted(result),
            Err(e) => BatchEntry::from(e),
        }
    }
}

impl From<DocexError> for BatchEntry {
    fn from(error: DocexError) -> Self {
        BatchEntry::Failed {
            error: error.to_string(),
        }
    }
}

/// Per-file outcomes in submission order.
///
/// A path submitted twice keeps its first position and its last outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BatchResult {
    entries: IndexMap<PathBuf, BatchEntry>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: PathBuf, entry: BatchEntry) {
        self.entries.insert(path, entry);
    }

    pub fn get(&self, path: &Path) -> Option<&BatchEntry> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &BatchEntry)> {
        self.entries.iter().map(|(path, entry)| (path.as_path(), entry))
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.keys().map(PathBuf::as_path)
    }

    pub fn succeeded(&self) -> usize {
        self.entries.values().filter(|e| e.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }
}

impl FromIterator<(PathBuf, BatchEntry)> for BatchResult {
    fn from_iter<I: IntoIterator<Item = (PathBuf, BatchEntry)>>(iter: I) -> Self {
        let mut result = Self::new();
        for (path, entry) in iter {
            result.insert(path, entry);
        }
        result
    }
}

type ProgressFn = Box<dyn Fn(&Path, &BatchEntry) + Send + Sync>;

/// Runs an [`Extractor`] over many files, optionally in parallel.
pub struct BatchRunner {
    jobs: usize,
    on_progress: Option<ProgressFn>,
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchRunner {
    pub fn new() -> Self {
        Self {
            jobs: 1,
            on_progress: None,
        }
    }

    /// Number of files processed concurrently. `0` is treated as `1`.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Called once for each finished file.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Path, &BatchEntry) + Send + Sync + 'static,
    {
        self.on_progress = Some(Box::new(callback));
        self
    }

    fn report(&self, path: &Path, entry: &BatchEntry) {
        if let Some(callback) = &self.on_progress {
            callback(path, entry);
        }
    }

    fn run_one<S, B>(
        &self,
        extractor: &Extractor<S, B>,
        path: &Path,
        options: &ExtractOptions,
    ) -> BatchEntry
    where
        S: TemplateStore,
        B: ExtractionBackend,
    {
        let entry = BatchEntry::from(extractor.extract(path, options));
        if let Some(error) = entry.error() {
            warn!("{}: {}", path.display(), error);
        }
        self.report(path, &entry);
        entry
    }

    /// Extract every path, recording failures per file.
    ///
    /// The result is in submission order whatever the number of jobs.
    pub fn run<S, B, P>(
        &self,
        extractor: &Extractor<S, B>,
        paths: &[P],
        options: &ExtractOptions,
    ) -> BatchResult
    where
        S: TemplateStore + Sync,
        B: ExtractionBackend + Sync,
        P: AsRef<Path> + Sync,
    {
        let start = Instant::now();
        let entries = if self.jobs > 1 && paths.len() > 1 {
            self.run_parallel(extractor, paths, options)
        } else {
            paths
                .iter()
                .map(|path| self.run_one(extractor, path.as_ref(), options))
                .collect()
        };

        let result: BatchResult = paths
            .iter()
            .map(|path| path.as_ref().to_path_buf())
            .zip(entries)
            .collect();

        info!(
            "Batch complete: {} succeeded, {} failed in {}ms",
            result.succeeded(),
            result.failed(),
            start.elapsed().as_millis()
        );
        result
    }

    fn run_parallel<S, B, P>(
        &self,
        extractor: &Extractor<S, B>,
        paths: &[P],
        options: &ExtractOptions,
    ) -> Vec<BatchEntry>
    where
        S: TemplateStore + Sync,
        B: ExtractionBackend + Sync,
        P: AsRef<Path> + Sync,
    {
        let run = || -> Vec<BatchEntry> {
            paths
                .par_iter()
                .map(|path| self.run_one(extractor, path.as_ref(), options))
                .collect()
        };

        match rayon::ThreadPoolBuilder::new().num_threads(self.jobs).build() {
            Ok(pool) => {
                debug!("Running batch on {} threads", self.jobs);
                pool.install(run)
            }
            Err(e) => {
                warn!("Failed to build thread pool ({}), using global pool", e);
                run()
            }
        }
    }
}
