//! Extraction orchestration: text layer first, OCR as a fallback.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::backend::{ExtractionBackend, TemplateBackend};
use crate::batch::{BatchEntry, BatchResult};
use crate::error::{DocexError, Result};
use crate::input::InputMethod;
use crate::models::config::DocexConfig;
use crate::models::value::ExtractionResult;
use crate::template::{TemplateLoader, TemplateSet, TemplateStore};

/// Options for a single extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Retry with OCR when the text layer yields nothing.
    pub fallback_to_ocr: bool,

    /// Folder with templates; built-in templates when `None`.
    pub template_folder: Option<PathBuf>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            fallback_to_ocr: true,
            template_folder: None,
        }
    }
}

impl ExtractOptions {
    pub fn from_config(config: &DocexConfig) -> Self {
        Self {
            fallback_to_ocr: config.extraction.fallback_to_ocr,
            template_folder: config.extraction.template_folder.clone(),
        }
    }

    pub fn with_fallback(mut self, fallback_to_ocr: bool) -> Self {
        self.fallback_to_ocr = fallback_to_ocr;
        self
    }

    pub fn with_template_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.template_folder = Some(folder.into());
        self
    }
}

/// Extracts fields from documents using a template store and a backend.
///
/// Holds no per-file state; each call loads its own template set.
#[derive(Debug, Clone)]
pub struct Extractor<S, B> {
    store: S,
    backend: B,
}

impl Extractor<TemplateLoader, TemplateBackend> {
    /// File-based templates with the text-layer and Tesseract inputs.
    pub fn from_config(config: &DocexConfig) -> Self {
        Self::new(TemplateLoader::new(), TemplateBackend::from_config(config))
    }
}

impl Default for Extractor<TemplateLoader, TemplateBackend> {
    fn default() -> Self {
        Self::from_config(&DocexConfig::default())
    }
}

impl<S: TemplateStore, B: ExtractionBackend> Extractor<S, B> {
    pub fn new(store: S, backend: B) -> Self {
        Self { store, backend }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Extract fields from one file.
    ///
    /// Fails with [`DocexError::NotFound`] before loading templates when the
    /// file is missing, and with [`DocexError::Exhausted`] when no method
    /// produced a non-empty result. Backend failures are logged and only
    /// decide whether the next method runs.
    pub fn extract(&self, path: &Path, options: &ExtractOptions) -> Result<ExtractionResult> {
        if !path.exists() {
            return Err(DocexError::NotFound(path.to_path_buf()));
        }

        let templates = self.store.load(options.template_folder.as_deref())?;
        debug!(
            "Loaded {} templates for {}",
            templates.len(),
            path.display()
        );

        if let Some(result) = self.attempt(path, &templates, InputMethod::TextLayer)? {
            return Ok(result);
        }

        if options.fallback_to_ocr {
            info!("Falling back to OCR for {}", path.display());
            if let Some(result) = self.attempt(path, &templates, InputMethod::Ocr)? {
                return Ok(result);
            }
        }

        Err(DocexError::Exhausted {
            path: path.to_path_buf(),
        })
    }

    /// Run one method. `None` means the attempt failed or found nothing.
    fn attempt(
        &self,
        path: &Path,
        templates: &TemplateSet,
        method: InputMethod,
    ) -> Result<Option<ExtractionResult>> {
        match self.backend.extract(path, templates, method) {
            Ok(result) if !result.is_empty() => {
                info!(
                    "Extracted {} fields from {} via {}",
                    result.len(),
                    path.display(),
                    method
                );
                Ok(Some(result))
            }
            Ok(_) => {
                warn!("No data extracted from {} via {}", path.display(), method);
                Ok(None)
            }
            Err(e) if e.is_backend_failure() => {
                warn!("{} extraction failed for {}: {}", method, path.display(), e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Extract every path in order, recording failures per file.
    pub fn extract_batch<P: AsRef<Path>>(
        &self,
        paths: &[P],
        options: &ExtractOptions,
    ) -> BatchResult {
        let mut results = BatchResult::new();
        for path in paths {
            let path = path.as_ref();
            let entry = BatchEntry::from(self.extract(path, options));
            results.insert(path.to_path_buf(), entry);
        }
        results
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::backend::tests::{FIXTURE_LINES, FIXTURE_TEMPLATE};
    use crate::error::{BackendError, TemplateError};
    use crate::models::value::FieldValue;
    use crate::pdf::fixtures;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// What the fake backend does for one method.
    #[derive(Clone)]
    pub(crate) enum Outcome {
        Fields(&'static str),
        Empty,
        Fail,
        Io,
    }

    /// Counts loads and returns an empty set.
    #[derive(Default)]
    pub(crate) struct CountingStore {
        pub loads: AtomicUsize,
        pub fail: bool,
        pub folders: Mutex<Vec<Option<PathBuf>>>,
    }

    impl TemplateStore for CountingStore {
        fn load(&self, folder: Option<&Path>) -> std::result::Result<TemplateSet, TemplateError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.folders
                .lock()
                .unwrap()
                .push(folder.map(Path::to_path_buf));
            if self.fail {
                return Err(TemplateError::FolderNotFound(PathBuf::from("missing")));
            }
            Ok(TemplateSet::default())
        }
    }

    /// Scripted backend that counts calls per method.
    pub(crate) struct FakeBackend {
        pub text_layer: Outcome,
        pub ocr: Outcome,
        pub calls: Mutex<HashMap<InputMethod, usize>>,
    }

    impl FakeBackend {
        pub fn new(text_layer: Outcome, ocr: Outcome) -> Self {
            Self {
                text_layer,
                ocr,
                calls: Mutex::new(HashMap::new()),
            }
        }

        pub fn calls(&self, method: InputMethod) -> usize {
            self.calls
                .lock()
                .unwrap()
                .get(&method)
                .copied()
                .unwrap_or(0)
        }
    }

    impl ExtractionBackend for FakeBackend {
        fn extract(
            &self,
            _path: &Path,
            _templates: &TemplateSet,
            method: InputMethod,
        ) -> Result<ExtractionResult> {
            *self.calls.lock().unwrap().entry(method).or_insert(0) += 1;
            let outcome = match method {
                InputMethod::TextLayer => &self.text_layer,
                InputMethod::Ocr => &self.ocr,
            };
            match outcome {
                Outcome::Fields(issuer) => {
                    let mut result = ExtractionResult::new();
                    result.insert("issuer", *issuer);
                    result.insert("method", method.to_string());
                    Ok(result)
                }
                Outcome::Empty => Ok(ExtractionResult::new()),
                Outcome::Fail => Err(BackendError::NoText("scripted failure".to_string()).into()),
                Outcome::Io => Err(std::io::Error::other("disk gone").into()),
            }
        }
    }

    pub(crate) fn existing_file(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"%PDF-1.4").unwrap();
        path
    }

    fn extractor(text_layer: Outcome, ocr: Outcome) -> Extractor<CountingStore, FakeBackend> {
        Extractor::new(CountingStore::default(), FakeBackend::new(text_layer, ocr))
    }

    #[test]
    fn test_missing_file_is_not_found() {
        for fallback in [true, false] {
            let ex = extractor(Outcome::Fields("A"), Outcome::Fields("B"));
            let options = ExtractOptions::default()
                .with_fallback(fallback)
                .with_template_folder("templates");
            let err = ex
                .extract(Path::new("/nonexistent/invoice.pdf"), &options)
                .unwrap_err();

            assert!(matches!(err, DocexError::NotFound(_)));
            assert_eq!(ex.store().loads.load(Ordering::SeqCst), 0);
            assert_eq!(ex.backend().calls(InputMethod::TextLayer), 0);
            assert_eq!(ex.backend().calls(InputMethod::Ocr), 0);
        }
    }

    #[test]
    fn test_text_layer_success_skips_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let path = existing_file(&dir, "a.pdf");
        let ex = extractor(Outcome::Fields("Acme"), Outcome::Fields("Other"));

        let result = ex.extract(&path, &ExtractOptions::default()).unwrap();
        assert_eq!(result.get("issuer"), Some(&FieldValue::from("Acme")));
        assert_eq!(ex.backend().calls(InputMethod::TextLayer), 1);
        assert_eq!(ex.backend().calls(InputMethod::Ocr), 0);
    }

    #[test]
    fn test_no_fallback_is_exhausted() {
        let dir = tempfile::tempdir().unwrap();
        let path = existing_file(&dir, "a.pdf");

        for text_layer in [Outcome::Fail, Outcome::Empty] {
            let ex = extractor(text_layer, Outcome::Fields("Other"));
            let options = ExtractOptions::default().with_fallback(false);
            let err = ex.extract(&path, &options).unwrap_err();

            assert!(matches!(err, DocexError::Exhausted { .. }));
            assert_eq!(ex.backend().calls(InputMethod::TextLayer), 1);
            assert_eq!(ex.backend().calls(InputMethod::Ocr), 0);
        }
    }

    #[test]
    fn test_ocr_fallback_result_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let path = existing_file(&dir, "scan.pdf");

        for text_layer in [Outcome::Fail, Outcome::Empty] {
            let ex = extractor(text_layer, Outcome::Fields("Scanned"));
            let result = ex.extract(&path, &ExtractOptions::default()).unwrap();

            assert_eq!(result.get("issuer"), Some(&FieldValue::from("Scanned")));
            assert_eq!(result.get("method"), Some(&FieldValue::from("ocr")));
            assert_eq!(ex.backend().calls(InputMethod::TextLayer), 1);
            assert_eq!(ex.backend().calls(InputMethod::Ocr), 1);
        }
    }

    #[test]
    fn test_both_methods_failing_is_exhausted() {
        let dir = tempfile::tempdir().unwrap();
        let path = existing_file(&dir, "a.pdf");

        let ex = extractor(Outcome::Fail, Outcome::Empty);
        let err = ex.extract(&path, &ExtractOptions::default()).unwrap_err();
        assert!(matches!(err, DocexError::Exhausted { ref path } if path.ends_with("a.pdf")));
        assert_eq!(ex.backend().calls(InputMethod::Ocr), 1);
    }

    #[test]
    fn test_non_backend_errors_propagate() {
        let dir = tempfile::tempdir().unwrap();
        let path = existing_file(&dir, "a.pdf");

        let ex = extractor(Outcome::Io, Outcome::Fields("Other"));
        let err = ex.extract(&path, &ExtractOptions::default()).unwrap_err();
        assert!(matches!(err, DocexError::Io(_)));
        assert_eq!(ex.backend().calls(InputMethod::Ocr), 0);
    }

    #[test]
    fn test_template_load_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let path = existing_file(&dir, "a.pdf");

        let store = CountingStore {
            fail: true,
            ..CountingStore::default()
        };
        let ex = Extractor::new(store, FakeBackend::new(Outcome::Empty, Outcome::Empty));
        let err = ex.extract(&path, &ExtractOptions::default()).unwrap_err();

        assert!(matches!(err, DocexError::Template(_)));
        assert_eq!(ex.backend().calls(InputMethod::TextLayer), 0);
    }

    #[test]
    fn test_template_folder_is_passed_to_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = existing_file(&dir, "a.pdf");
        let ex = extractor(Outcome::Fields("Acme"), Outcome::Empty);

        ex.extract(&path, &ExtractOptions::default()).unwrap();
        ex.extract(
            &path,
            &ExtractOptions::default().with_template_folder("custom"),
        )
        .unwrap();

        let folders = ex.store().folders.lock().unwrap().clone();
        assert_eq!(folders, vec![None, Some(PathBuf::from("custom"))]);
    }

    #[test]
    fn test_repeated_extraction_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = existing_file(&dir, "a.pdf");
        let ex = extractor(Outcome::Empty, Outcome::Fields("Scanned"));

        let first = ex.extract(&path, &ExtractOptions::default()).unwrap();
        let second = ex.extract(&path, &ExtractOptions::default()).unwrap();
        assert_eq!(first, second);
        assert_eq!(ex.store().loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_batch_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let a = existing_file(&dir, "a.pdf");
        let b = dir.path().join("b.pdf");
        let c = existing_file(&dir, "c.pdf");
        let ex = extractor(Outcome::Fields("Acme"), Outcome::Empty);

        let results = ex.extract_batch(&[&a, &b, &c], &ExtractOptions::default());

        let keys: Vec<&Path> = results.paths().collect();
        assert_eq!(keys, vec![a.as_path(), b.as_path(), c.as_path()]);
        assert!(matches!(results.get(&a), Some(BatchEntry::Extracted(_))));
        match results.get(&b) {
            Some(BatchEntry::Failed { error }) => assert!(error.contains("not found")),
            other => panic!("expected failure for b, got {:?}", other),
        }
        assert!(matches!(results.get(&c), Some(BatchEntry::Extracted(_))));
        assert_eq!(ex.backend().calls(InputMethod::TextLayer), 2);
    }

    /// Delegates to a real backend and records the methods tried.
    struct Recording<B> {
        inner: B,
        methods: Mutex<Vec<InputMethod>>,
    }

    impl<B: ExtractionBackend> ExtractionBackend for Recording<B> {
        fn extract(
            &self,
            path: &Path,
            templates: &TemplateSet,
            method: InputMethod,
        ) -> Result<ExtractionResult> {
            self.methods.lock().unwrap().push(method);
            self.inner.extract(path, templates, method)
        }
    }

    fn template_extractor(
        template: &str,
    ) -> (tempfile::TempDir, Extractor<TemplateLoader, Recording<TemplateBackend>>) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fixture.yml"), template).unwrap();

        let mut config = DocexConfig::default();
        config.ocr.tesseract_cmd = PathBuf::from("docex-missing-tesseract");
        config.ocr.pdftoppm_cmd = PathBuf::from("docex-missing-pdftoppm");
        let backend = Recording {
            inner: TemplateBackend::from_config(&config),
            methods: Mutex::new(Vec::new()),
        };
        (dir, Extractor::new(TemplateLoader::new(), backend))
    }

    #[test]
    fn test_text_layer_pdf_is_extracted_without_ocr() {
        let (templates, ex) = template_extractor(FIXTURE_TEMPLATE);
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::write(&dir, "invoice.pdf", &fixtures::text_pdf(FIXTURE_LINES));

        let options = ExtractOptions::default().with_template_folder(templates.path());
        let result = ex.extract(&path, &options).unwrap();

        assert_eq!(result.get("issuer"), Some(&FieldValue::from("Fixture Ltd")));
        assert_eq!(
            *ex.backend().methods.lock().unwrap(),
            vec![InputMethod::TextLayer]
        );
    }

    #[test]
    fn test_unmatched_text_layer_falls_back_to_ocr() {
        let other = FIXTURE_TEMPLATE.replace("['Fixture Ltd']", "['Someone Else']");
        let (templates, ex) = template_extractor(&other);
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::write(&dir, "invoice.pdf", &fixtures::text_pdf(FIXTURE_LINES));

        let options = ExtractOptions::default().with_template_folder(templates.path());
        let err = ex.extract(&path, &options).unwrap_err();

        assert!(matches!(err, DocexError::Exhausted { .. }));
        assert_eq!(
            *ex.backend().methods.lock().unwrap(),
            vec![InputMethod::TextLayer, InputMethod::Ocr]
        );
    }

    #[test]
    fn test_options_from_config() {
        let mut config = DocexConfig::default();
        config.extraction.fallback_to_ocr = false;
        config.extraction.template_folder = Some(PathBuf::from("tpl"));

        assert_eq!(
            ExtractOptions::from_config(&config),
            ExtractOptions {
                fallback_to_ocr: false,
                template_folder: Some(PathBuf::from("tpl")),
            }
        );
        assert_eq!(
            ExtractOptions::from_config(&DocexConfig::default()),
            ExtractOptions::default()
        );
    }
}
