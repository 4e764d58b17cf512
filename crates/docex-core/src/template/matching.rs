//! Compiled templates: text preparation, keyword matching and field extraction.

use regex::Regex;
use rust_decimal::Decimal;
use tracing::{debug, trace, warn};

use crate::error::TemplateError;
use crate::models::value::{ExtractionResult, FieldValue};

use super::definition::{
    FieldSpec, FieldType, Group, ParserKind, TemplateDef, TemplateOptions,
    DEFAULT_REQUIRED_FIELDS,
};
use super::parsing::{parse_date, parse_int, parse_number};
use super::patterns::WHITESPACE;

const STATIC_PREFIX: &str = "static_";

/// A template ready to be matched against text.
#[derive(Debug, Clone)]
pub struct Template {
    issuer: String,
    source: String,
    keywords: Vec<Regex>,
    exclude_keywords: Vec<Regex>,
    fields: Vec<CompiledField>,
    replacements: Vec<(Regex, String)>,
    options: TemplateOptions,
    priority: i32,
    required_fields: Vec<String>,
}

#[derive(Debug, Clone)]
struct CompiledField {
    name: String,
    rule: CompiledRule,
}

#[derive(Debug, Clone)]
enum CompiledRule {
    Static(String),
    Regex {
        patterns: Vec<Regex>,
        kind: FieldType,
        group: Group,
    },
}

impl Template {
    /// Validate a definition and compile its regexes.
    pub fn compile(def: TemplateDef, source: impl Into<String>) -> Result<Self, TemplateError> {
        let issuer = def.issuer.trim().to_string();
        if issuer.is_empty() {
            return Err(TemplateError::Invalid {
                issuer: def.issuer,
                reason: "issuer must not be empty".to_string(),
            });
        }

        let keywords = def.keywords.to_vec();
        if keywords.is_empty() {
            return Err(TemplateError::Invalid {
                issuer,
                reason: "at least one keyword is required".to_string(),
            });
        }
        let keywords = compile_all(&issuer, "keywords", &keywords)?;
        let exclude_keywords =
            compile_all(&issuer, "exclude_keywords", &def.exclude_keywords.to_vec())?;

        let mut replacements = Vec::with_capacity(def.options.replace.len());
        for (pattern, replacement) in &def.options.replace {
            let regex = compile(&issuer, "options.replace", pattern)?;
            replacements.push((regex, replacement.clone()));
        }

        let mut fields = Vec::with_capacity(def.fields.len());
        for (name, spec) in def.fields {
            fields.push(compile_field(&issuer, name, spec)?);
        }

        let required_fields = def.required_fields.unwrap_or_else(|| {
            DEFAULT_REQUIRED_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect()
        });

        Ok(Self {
            issuer,
            source: source.into(),
            keywords,
            exclude_keywords,
            fields,
            replacements,
            options: def.options,
            priority: def.priority,
            required_fields,
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Where the template was loaded from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn options(&self) -> &TemplateOptions {
        &self.options
    }

    pub fn required_fields(&self) -> &[String] {
        &self.required_fields
    }

    /// Keyword patterns as written.
    pub fn keywords(&self) -> Vec<&str> {
        self.keywords.iter().map(Regex::as_str).collect()
    }

    /// Names of the fields this template produces.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Apply the template's text options.
    pub fn prepare(&self, text: &str) -> String {
        let mut prepared = text.to_string();

        for (regex, replacement) in &self.replacements {
            prepared = regex.replace_all(&prepared, replacement.as_str()).into_owned();
        }
        if self.options.remove_whitespace {
            prepared = WHITESPACE.replace_all(&prepared, "").into_owned();
        }
        if self.options.remove_accents {
            prepared = fold_accents(&prepared);
        }
        if self.options.lowercase {
            prepared = prepared.to_lowercase();
        }

        prepared
    }

    /// True if all keywords and no exclude keywords occur in prepared text.
    pub fn matches(&self, prepared: &str) -> bool {
        self.keywords.iter().all(|k| k.is_match(prepared))
            && !self.exclude_keywords.iter().any(|k| k.is_match(prepared))
    }

    /// Extract fields from prepared text.
    ///
    /// Returns an empty result when a required field is missing.
    pub fn extract(&self, prepared: &str) -> ExtractionResult {
        let mut result = ExtractionResult::new();
        result.insert("issuer", self.issuer.as_str());

        for field in &self.fields {
            match &field.rule {
                CompiledRule::Static(value) => {
                    result.insert(field.name.as_str(), value.as_str());
                }
                CompiledRule::Regex {
                    patterns,
                    kind,
                    group,
                } => {
                    let values = self.extract_values(prepared, &field.name, patterns, *kind);
                    if values.is_empty() {
                        debug!("{}: field {} not found", self.issuer, field.name);
                        continue;
                    }
                    if let Some(value) = combine(values, *group) {
                        trace!("{}: {} = {}", self.issuer, field.name, value);
                        result.insert(field.name.as_str(), value);
                    }
                }
            }
        }

        result.insert("currency", self.options.currency.as_str());
        result.insert("desc", format!("Invoice from {}", self.issuer));

        let missing: Vec<&str> = self
            .required_fields
            .iter()
            .filter(|f| !result.contains(f))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            warn!(
                "{}: unable to match required fields: {}",
                self.issuer,
                missing.join(", ")
            );
            return ExtractionResult::new();
        }

        result
    }

    fn extract_values(
        &self,
        prepared: &str,
        name: &str,
        patterns: &[Regex],
        kind: FieldType,
    ) -> Vec<FieldValue> {
        let mut values = Vec::new();

        for pattern in patterns {
            for caps in pattern.captures_iter(prepared) {
                let Some(raw) = caps.get(1).or_else(|| caps.get(0)) else {
                    continue;
                };
                let raw = raw.as_str().trim();
                match self.convert(raw, kind) {
                    Some(value) => values.push(value),
                    None => debug!("{}: could not parse {} value {:?}", self.issuer, name, raw),
                }
            }
        }

        values
    }

    fn convert(&self, raw: &str, kind: FieldType) -> Option<FieldValue> {
        match kind {
            FieldType::Text if raw.is_empty() => None,
            FieldType::Text => Some(FieldValue::Text(raw.to_string())),
            FieldType::Int => parse_int(raw).map(FieldValue::Integer),
            FieldType::Float => {
                parse_number(raw, &self.options.decimal_separator).map(FieldValue::Number)
            }
            FieldType::Date => parse_date(raw, &self.options.date_formats).map(FieldValue::Date),
        }
    }
}

fn compile_field(issuer: &str, name: String, spec: FieldSpec) -> Result<CompiledField, TemplateError> {
    let stripped = name.strip_prefix(STATIC_PREFIX).map(str::to_string);

    let rule = match (spec, stripped) {
        (FieldSpec::Pattern(value), Some(stripped)) => {
            return Ok(CompiledField {
                name: stripped,
                rule: CompiledRule::Static(value),
            });
        }
        (FieldSpec::Patterns(_), Some(_)) => {
            return Err(TemplateError::Invalid {
                issuer: issuer.to_string(),
                reason: format!("static field {} must be a single value", name),
            });
        }
        (FieldSpec::Pattern(pattern), None) => CompiledRule::Regex {
            patterns: vec![compile(issuer, &name, &pattern)?],
            kind: FieldType::infer(&name),
            group: Group::default(),
        },
        (FieldSpec::Patterns(patterns), None) => CompiledRule::Regex {
            patterns: compile_all(issuer, &name, &patterns)?,
            kind: FieldType::infer(&name),
            group: Group::default(),
        },
        (FieldSpec::Rule(rule), _) => match rule.parser {
            ParserKind::Static => match rule.value {
                Some(value) => CompiledRule::Static(value),
                None => {
                    return Err(TemplateError::Invalid {
                        issuer: issuer.to_string(),
                        reason: format!("static field {} has no value", name),
                    });
                }
            },
            ParserKind::Regex => {
                let patterns = rule.regex.to_vec();
                if patterns.is_empty() {
                    return Err(TemplateError::Invalid {
                        issuer: issuer.to_string(),
                        reason: format!("field {} has no regex", name),
                    });
                }
                let output_name = name.strip_prefix(STATIC_PREFIX).unwrap_or(&name);
                CompiledRule::Regex {
                    patterns: compile_all(issuer, &name, &patterns)?,
                    kind: rule.kind.unwrap_or_else(|| FieldType::infer(output_name)),
                    group: rule.group,
                }
            }
        },
    };

    let name = match name.strip_prefix(STATIC_PREFIX) {
        Some(stripped) => stripped.to_string(),
        None => name,
    };
    Ok(CompiledField { name, rule })
}

fn compile(issuer: &str, field: &str, pattern: &str) -> Result<Regex, TemplateError> {
    Regex::new(pattern).map_err(|source| TemplateError::Regex {
        issuer: issuer.to_string(),
        field: field.to_string(),
        source,
    })
}

fn compile_all(issuer: &str, field: &str, patterns: &[String]) -> Result<Vec<Regex>, TemplateError> {
    patterns.iter().map(|p| compile(issuer, field, p)).collect()
}

/// Combine all matches of a field according to its group mode.
fn combine(values: Vec<FieldValue>, group: Group) -> Option<FieldValue> {
    match group {
        Group::First => values.into_iter().next(),
        Group::Last => values.into_iter().last(),
        Group::Unique => {
            let mut unique: Vec<FieldValue> = Vec::with_capacity(values.len());
            for value in values {
                if !unique.contains(&value) {
                    unique.push(value);
                }
            }
            if unique.len() == 1 {
                unique.pop()
            } else {
                Some(FieldValue::List(unique))
            }
        }
        Group::Sum => {
            if values.iter().all(|v| matches!(v, FieldValue::Integer(_))) {
                let total = values.iter().try_fold(0i64, |acc, v| match v {
                    FieldValue::Integer(i) => acc.checked_add(*i),
                    _ => Some(acc),
                });
                match total {
                    Some(total) => return Some(FieldValue::Integer(total)),
                    None => debug!("integer sum overflows, summing as decimals"),
                }
            }
            let numbers: Vec<Decimal> = values.iter().filter_map(FieldValue::as_decimal).collect();
            if numbers.is_empty() {
                return None;
            }
            match numbers
                .into_iter()
                .try_fold(Decimal::ZERO, |acc, n| acc.checked_add(n))
            {
                Some(total) => Some(FieldValue::Number(total)),
                None => {
                    debug!("sum of {} values overflows, dropping", values.len());
                    None
                }
            }
        }
        Group::Join => {
            let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            Some(FieldValue::Text(parts.join(" ")))
        }
    }
}

/// Replace accented Latin letters with their ASCII base letters.
pub fn fold_accents(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii() {
            out.push(c);
            continue;
        }
        let lower = c.to_lowercase().next().unwrap_or(c);
        match base_letter(lower) {
            Some(base) if c.is_uppercase() => out.push_str(&base.to_uppercase()),
            Some(base) => out.push_str(base),
            None => out.push(c),
        }
    }
    out
}

fn base_letter(c: char) -> Option<&'static str> {
    let base = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' | 'ĉ' | 'ċ' => "c",
        'ď' | 'đ' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'ğ' | 'ģ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => "i",
        'ķ' => "k",
        'ł' | 'ľ' | 'ĺ' | 'ļ' => "l",
        'ñ' | 'ń' | 'ň' | 'ņ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ŕ' | 'ř' => "r",
        'ś' | 'š' | 'ş' | 'ș' => "s",
        'ß' => "ss",
        'ť' | 'ţ' | 'ț' => "t",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn template(yaml: &str) -> Template {
        let def: TemplateDef = serde_yaml::from_str(yaml).unwrap();
        Template::compile(def, "test.yml").unwrap()
    }

    const ACME: &str = r#"
issuer: Acme Corp
keywords: ['Acme Corp']
exclude_keywords: ['CREDIT NOTE']
fields:
  invoice_number: 'Invoice No\.?\s*(\S+)'
  date: 'Date:\s*(\d{2}\.\d{2}\.\d{4})'
  amount: 'Total:\s*([\d,]+\.\d{2})'
  reference: 'Ref:\s*(\w+)'
  static_vendor_code: ACME-01
options:
  currency: USD
  date_formats: ['%d.%m.%Y']
"#;

    const ACME_TEXT: &str = "Acme Corp\nInvoice No. A-1001\nDate: 05.03.2024\nRef: X1\nRef: X2\nRef: X1\nTotal: 1,250.00\n";

    #[test]
    fn test_extract_fields_in_order() {
        let t = template(ACME);
        let prepared = t.prepare(ACME_TEXT);
        assert!(t.matches(&prepared));

        let result = t.extract(&prepared);
        let names: Vec<&str> = result.field_names().collect();
        assert_eq!(
            names,
            vec![
                "issuer",
                "invoice_number",
                "date",
                "amount",
                "reference",
                "vendor_code",
                "currency",
                "desc"
            ]
        );
        assert_eq!(result.get("invoice_number"), Some(&FieldValue::from("A-1001")));
        assert_eq!(
            result.get("date"),
            Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()))
        );
        assert_eq!(
            result.get("amount"),
            Some(&FieldValue::Number(Decimal::from_str("1250.00").unwrap()))
        );
        assert_eq!(
            result.get("reference"),
            Some(&FieldValue::List(vec![
                FieldValue::from("X1"),
                FieldValue::from("X2")
            ]))
        );
        assert_eq!(result.get("vendor_code"), Some(&FieldValue::from("ACME-01")));
        assert_eq!(result.get("currency"), Some(&FieldValue::from("USD")));
        assert_eq!(result.get("desc"), Some(&FieldValue::from("Invoice from Acme Corp")));
    }

    #[test]
    fn test_exclude_keywords() {
        let t = template(ACME);
        let text = format!("CREDIT NOTE\n{}", ACME_TEXT);
        assert!(!t.matches(&t.prepare(&text)));
        assert!(!t.matches(&t.prepare("Some other vendor")));
    }

    #[test]
    fn test_missing_required_field_yields_empty_result() {
        let t = template(ACME);
        let text = "Acme Corp\nInvoice No. A-1001\nDate: 05.03.2024\n";
        let prepared = t.prepare(text);
        assert!(t.matches(&prepared));
        assert!(t.extract(&prepared).is_empty());
    }

    #[test]
    fn test_custom_required_fields() {
        let t = template(
            r#"
issuer: Minimal
keywords: 'Minimal'
required_fields: [reference]
fields:
  reference: 'Ref (\d+)'
"#,
        );
        let result = t.extract(&t.prepare("Minimal Ref 42"));
        assert_eq!(result.get("reference"), Some(&FieldValue::from("42")));
    }

    #[test]
    fn test_group_modes() {
        let t = template(
            r#"
issuer: Groups
keywords: 'Groups'
required_fields: []
fields:
  first_line:
    regex: 'Line (\d+)'
    type: int
    group: first
  last_line:
    regex: 'Line (\d+)'
    type: int
    group: last
  line_total:
    regex: 'Line (\d+)'
    type: int
    group: sum
  amount_total:
    regex: 'Cost ([\d.]+)'
    group: sum
  words:
    regex: 'Word (\w+)'
    group: join
"#,
        );
        let text = "Groups\nLine 1\nLine 2\nLine 4\nCost 1.50\nCost 2.25\nWord hello\nWord world\n";
        let result = t.extract(&t.prepare(text));

        assert_eq!(result.get("first_line"), Some(&FieldValue::Integer(1)));
        assert_eq!(result.get("last_line"), Some(&FieldValue::Integer(4)));
        assert_eq!(result.get("line_total"), Some(&FieldValue::Integer(7)));
        assert_eq!(
            result.get("amount_total"),
            Some(&FieldValue::Number(Decimal::from_str("3.75").unwrap()))
        );
        assert_eq!(result.get("words"), Some(&FieldValue::from("hello world")));
    }

    #[test]
    fn test_sum_overflow() {
        let t = template(
            r#"
issuer: Big
keywords: 'Big'
required_fields: []
fields:
  line_total:
    regex: 'Line (\d+)'
    type: int
    group: sum
  cost_total:
    regex: 'Cost (\d+)'
    type: float
    group: sum
  fee_total:
    regex: 'Fee (\d+)'
    type: float
    group: sum
"#,
        );
        let text = "Big\nLine 9000000000000000000\nLine 9000000000000000000\n\
                    Cost 70000000000000000000000000000\nCost 70000000000000000000000000000\n\
                    Fee 5\n";
        let result = t.extract(&t.prepare(text));

        assert_eq!(
            result.get("line_total"),
            Some(&FieldValue::Number(
                Decimal::from_str("18000000000000000000").unwrap()
            ))
        );
        assert_eq!(result.get("cost_total"), None);
        assert_eq!(result.get("fee_total"), Some(&FieldValue::Number(Decimal::from(5))));
    }

    #[test]
    fn test_prepare_options() {
        let t = template(
            r#"
issuer: Prepared
keywords: 'zolc'
required_fields: []
options:
  replace: [['Q', 'O']]
  remove_whitespace: true
  remove_accents: true
  lowercase: true
"#,
        );
        assert_eq!(t.prepare("Żółć  QK\n"), "zolcok");
        assert!(t.matches(&t.prepare("Ż ół ć")));
    }

    #[test]
    fn test_fold_accents() {
        assert_eq!(fold_accents("Łódź Straße Ærø"), "Lodz Strasse AEro");
        assert_eq!(fold_accents("plain ascii"), "plain ascii");
    }

    #[test]
    fn test_compile_errors() {
        let def: TemplateDef = serde_yaml::from_str("issuer: Broken\nkeywords: ['(unclosed']\n").unwrap();
        assert!(matches!(
            Template::compile(def, "broken.yml"),
            Err(TemplateError::Regex { ref field, .. }) if field == "keywords"
        ));

        let def: TemplateDef = serde_yaml::from_str("issuer: NoKeywords\nkeywords: []\n").unwrap();
        assert!(matches!(
            Template::compile(def, "nokw.yml"),
            Err(TemplateError::Invalid { .. })
        ));

        let def: TemplateDef = serde_yaml::from_str(
            "issuer: BadStatic\nkeywords: x\nfields:\n  static_code: ['a', 'b']\n",
        )
        .unwrap();
        assert!(matches!(
            Template::compile(def, "static.yml"),
            Err(TemplateError::Invalid { .. })
        ));
    }
}
