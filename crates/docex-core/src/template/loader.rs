//! Template loading from folders and from the built-in set.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::TemplateError;

use super::builtin::BUILTIN_TEMPLATES;
use super::definition::TemplateDef;
use super::matching::Template;
use super::{TemplateSet, TemplateStore};

/// Serialization format of a template file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Json,
}

impl Format {
    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "yml" | "yaml" => Some(Format::Yaml),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

/// Loads templates from YAML/JSON files or the built-in set.
#[derive(Debug, Clone, Default)]
pub struct TemplateLoader;

impl TemplateLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load every template file below `folder`, recursively.
    pub fn load_folder(&self, folder: &Path) -> Result<TemplateSet, TemplateError> {
        if !folder.is_dir() {
            return Err(TemplateError::FolderNotFound(folder.to_path_buf()));
        }

        let mut files = Vec::new();
        collect_template_files(folder, &mut files)?;
        files.sort();

        if files.is_empty() {
            return Err(TemplateError::Empty(folder.to_path_buf()));
        }

        let mut templates = Vec::with_capacity(files.len());
        for path in &files {
            let content = fs::read_to_string(path).map_err(|e| TemplateError::Parse {
                source_name: path.display().to_string(),
                reason: e.to_string(),
            })?;
            // Format::from_path is Some for every collected file.
            let format = Format::from_path(path).unwrap_or(Format::Yaml);
            templates.push(parse_template(&content, format, &path.display().to_string())?);
        }

        info!(
            "Loaded {} templates from {}",
            templates.len(),
            folder.display()
        );
        Ok(TemplateSet::new(templates))
    }

    /// Load the templates compiled into the binary.
    pub fn load_builtin(&self) -> Result<TemplateSet, TemplateError> {
        let templates = BUILTIN_TEMPLATES
            .iter()
            .map(|(name, content)| parse_template(content, Format::Yaml, name))
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Loaded {} built-in templates", templates.len());
        Ok(TemplateSet::new(templates))
    }
}

impl TemplateStore for TemplateLoader {
    fn load(&self, folder: Option<&Path>) -> Result<TemplateSet, TemplateError> {
        match folder {
            Some(folder) => self.load_folder(folder),
            None => self.load_builtin(),
        }
    }
}

fn collect_template_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), TemplateError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        // Symlinked directories are not followed.
        if entry.file_type()?.is_dir() {
            collect_template_files(&path, files)?;
        } else if Format::from_path(&path).is_some() {
            files.push(path);
        }
    }
    Ok(())
}

fn parse_template(content: &str, format: Format, source: &str) -> Result<Template, TemplateError> {
    let def: TemplateDef = match format {
        Format::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
    }
    .map_err(|reason| TemplateError::Parse {
        source_name: source.to_string(),
        reason,
    })?;

    Template::compile(def, source)
}
