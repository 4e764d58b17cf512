//! Extraction templates: loading, matching and field extraction.

mod builtin;
pub mod definition;
mod loader;
mod matching;
pub mod parsing;
mod patterns;

pub use builtin::BUILTIN_TEMPLATES;
pub use definition::{FieldSpec, FieldType, Group, TemplateDef, TemplateOptions};
pub use loader::TemplateLoader;
pub use matching::{fold_accents, Template};

use std::path::Path;

use tracing::{debug, info};

use crate::error::TemplateError;
use crate::models::value::ExtractionResult;

/// Source of template sets.
pub trait TemplateStore {
    /// Load templates from `folder`, or the default set when `None`.
    fn load(&self, folder: Option<&Path>) -> Result<TemplateSet, TemplateError>;
}

/// Templates in the order they are tried (highest priority first).
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    templates: Vec<Template>,
}

impl TemplateSet {
    /// Build a set, ordering templates by descending priority.
    ///
    /// Templates with equal priority keep their load order.
    pub fn new(mut templates: Vec<Template>) -> Self {
        templates.sort_by(|a, b| b.priority().cmp(&a.priority()));
        Self { templates }
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    /// Find a template by issuer name.
    pub fn get(&self, issuer: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.issuer() == issuer)
    }

    /// First template whose keywords match `text`.
    pub fn find_match(&self, text: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.matches(&t.prepare(text)))
    }

    /// Extract fields with the first matching template.
    ///
    /// Returns an empty result when no template matches or the matching
    /// template misses a required field. Later templates are not tried once
    /// one has matched.
    pub fn extract(&self, text: &str) -> ExtractionResult {
        for template in &self.templates {
            let prepared = template.prepare(text);
            if template.matches(&prepared) {
                info!(
                    "Using template {} ({})",
                    template.issuer(),
                    template.source()
                );
                return template.extract(&prepared);
            }
            debug!("Template {} does not match", template.issuer());
        }

        info!("No template matched ({} tried)", self.templates.len());
        ExtractionResult::new()
    }
}
