//! On-disk template format (YAML or JSON).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Default template priority.
pub const DEFAULT_PRIORITY: i32 = 5;

/// Fields every template must produce unless it overrides `required_fields`.
pub const DEFAULT_REQUIRED_FIELDS: &[&str] = &["amount", "date", "invoice_number"];

/// A template as written by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDef {
    /// Company issuing the documents this template matches.
    pub issuer: String,

    /// Regexes that must all be present in the text.
    pub keywords: OneOrMany,

    /// Regexes that must all be absent from the text.
    #[serde(default)]
    pub exclude_keywords: OneOrMany,

    /// Field name to extraction rule.
    #[serde(default)]
    pub fields: IndexMap<String, FieldSpec>,

    /// Text preparation and parsing options.
    #[serde(default)]
    pub options: TemplateOptions,

    /// Higher priorities are tried first.
    #[serde(default = "default_priority")]
    pub priority: i32,

    /// Fields that must be present for a match to count.
    #[serde(default)]
    pub required_fields: Option<Vec<String>>,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

/// A single string or a list of strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl OneOrMany {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s.clone()],
            OneOrMany::Many(v) => v.clone(),
        }
    }
}

/// How a field is extracted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSpec {
    /// One regex (or a literal when the field name starts with `static_`).
    Pattern(String),
    /// Several regexes, all applied.
    Patterns(Vec<String>),
    /// Explicit rule.
    Rule(FieldRule),
}

/// Detailed field rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRule {
    #[serde(default)]
    pub parser: ParserKind,

    /// Patterns for the regex parser.
    #[serde(default)]
    pub regex: OneOrMany,

    /// Literal for the static parser.
    #[serde(default)]
    pub value: Option<String>,

    #[serde(default, rename = "type")]
    pub kind: Option<FieldType>,

    #[serde(default)]
    pub group: Group,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    #[default]
    Regex,
    Static,
}

/// Target type of an extracted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Int,
    Float,
    Date,
}

impl FieldType {
    /// Type implied by a field name when none is given.
    pub fn infer(field: &str) -> Self {
        if field.starts_with("date") {
            FieldType::Date
        } else if field.starts_with("amount") {
            FieldType::Float
        } else {
            FieldType::Text
        }
    }
}

/// How multiple matches of one field are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    /// Distinct values, collapsed to a scalar when only one remains.
    #[default]
    Unique,
    First,
    Last,
    Sum,
    Join,
}

/// Template options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateOptions {
    pub currency: String,
    /// chrono format strings tried in order.
    pub date_formats: Vec<String>,
    pub decimal_separator: String,
    pub remove_whitespace: bool,
    pub remove_accents: bool,
    pub lowercase: bool,
    /// Regex substitutions applied before matching.
    pub replace: Vec<(String, String)>,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            currency: "EUR".to_string(),
            date_formats: Vec::new(),
            decimal_separator: ".".to_string(),
            remove_whitespace: false,
            remove_accents: false,
            lowercase: false,
            replace: Vec::new(),
        }
    }
}
