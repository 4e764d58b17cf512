//! Extracted values and per-file extraction results.

use std::fmt;

use chrono::NaiveDate;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single extracted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Number(Decimal),
    Date(NaiveDate),
    Text(String),
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Get the value as text, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as a decimal number.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            FieldValue::Number(d) => Some(*d),
            FieldValue::Integer(i) => Some(Decimal::from(*i)),
            _ => None,
        }
    }

    /// Get the value as a date.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Number(d) => write!(f, "{}", d),
            FieldValue::Date(d) => write!(f, "{}", d),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::List(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", parts.join("; "))
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Number(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

/// Field name to value mapping produced for one file.
///
/// Fields keep the order in which the template produced them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractionResult {
    fields: IndexMap<String, FieldValue>,
}

impl ExtractionResult {
    /// Create an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Look up a field.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Whether the field is present.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// True when nothing was extracted.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Iterate over fields in extraction order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Field names in extraction order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl FromIterator<(String, FieldValue)> for ExtractionResult {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    #[test]
    fn test_result_keeps_insertion_order() {
        let mut result = ExtractionResult::new();
        result.insert("issuer", "Acme Corp");
        result.insert("amount", Decimal::from_str("123.45").unwrap());
        result.insert("date", NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

        let names: Vec<&str> = result.field_names().collect();
        assert_eq!(names, vec!["issuer", "amount", "date"]);
        assert_eq!(result.len(), 3);
        assert!(result.contains("amount"));
        assert_eq!(
            result.get("amount").and_then(FieldValue::as_decimal),
            Some(Decimal::from_str("123.45").unwrap())
        );
    }

    #[test]
    fn test_result_serializes_as_object() {
        let mut result = ExtractionResult::new();
        result.insert("invoice_number", "INV-7");
        result.insert("date", NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        result.insert(
            "refs",
            FieldValue::List(vec![FieldValue::from("A"), FieldValue::from("B")]),
        );

        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(
            json,
            r#"{"invoice_number":"INV-7","date":"2024-01-15","refs":["A","B"]}"#
        );
    }

    #[test]
    fn test_display() {
        let list = FieldValue::List(vec![FieldValue::Integer(3), FieldValue::from("x")]);
        assert_eq!(list.to_string(), "3; x");
    }
}
