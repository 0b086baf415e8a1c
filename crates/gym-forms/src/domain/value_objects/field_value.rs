//! Field values and the value set

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

static NULL: FieldValue = FieldValue::Null;

/// Current value of one input
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Null, blank text and empty lists count as empty; numbers never do.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Number(_) => false,
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.iter().all(|i| i.trim().is_empty()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric reading of the value. Text accepts a decimal comma.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().replace(',', ".").parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Copy with surrounding whitespace removed from every string
    pub fn trimmed(&self) -> Self {
        match self {
            Self::Text(s) => Self::Text(s.trim().to_string()),
            Self::List(items) => Self::List(
                items
                    .iter()
                    .map(|i| i.trim().to_string())
                    .filter(|i| !i.is_empty())
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
            Self::List(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        Self::Number(n as f64)
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        Self::Number(n as f64)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Live mapping of field name to value for one open form
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueSet(BTreeMap<String, FieldValue>);

impl ValueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `name`; missing keys read as `Null`
    pub fn get(&self, name: &str) -> &FieldValue {
        self.0.get(name).unwrap_or(&NULL)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Reset a field to `Null`, keeping the key
    pub fn clear(&mut self, name: &str) {
        self.0.insert(name.to_string(), FieldValue::Null);
    }

    /// Non-empty text view of a field, trimmed
    pub fn text(&self, name: &str) -> Option<String> {
        let value = self.get(name);
        if value.is_empty() {
            None
        } else {
            Some(value.to_string().trim().to_string())
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy with every string trimmed
    pub fn trimmed(&self) -> Self {
        Self(self.0.iter().map(|(k, v)| (k.clone(), v.trimmed())).collect())
    }

    /// Names whose value differs between `self` and `other`
    pub fn changed_from(&self, other: &ValueSet) -> Vec<String> {
        let mut changed: Vec<String> = self
            .0
            .iter()
            .filter(|(k, v)| other.get(k) != *v)
            .map(|(k, _)| k.clone())
            .collect();
        changed.extend(
            other
                .0
                .keys()
                .filter(|k| !self.0.contains_key(*k) && !other.get(k).is_empty())
                .cloned(),
        );
        changed
    }

    pub fn into_inner(self) -> BTreeMap<String, FieldValue> {
        self.0
    }
}

impl<K, V> FromIterator<(K, V)> for ValueSet
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emptiness() {
        assert!(FieldValue::Null.is_empty());
        assert!(FieldValue::from("   ").is_empty());
        assert!(FieldValue::List(vec![" ".into()]).is_empty());
        assert!(!FieldValue::Number(0.0).is_empty());
        assert!(!FieldValue::from("a").is_empty());
    }

    #[test]
    fn test_number_display_drops_fraction() {
        assert_eq!(FieldValue::Number(12.0).to_string(), "12");
        assert_eq!(FieldValue::Number(12.5).to_string(), "12.5");
    }

    #[test]
    fn test_as_number_accepts_decimal_comma() {
        assert_eq!(FieldValue::from("12,5").as_number(), Some(12.5));
        assert_eq!(FieldValue::from("abc").as_number(), None);
        assert_eq!(FieldValue::from("NaN").as_number(), None);
    }

    #[test]
    fn test_missing_key_reads_null() {
        let values = ValueSet::new();
        assert_eq!(values.get("nombre"), &FieldValue::Null);
        assert_eq!(values.text("nombre"), None);
    }

    #[test]
    fn test_trimmed_value_set() {
        let values: ValueSet = [("nombre", "  Ana  "), ("dni", "123 ")].into_iter().collect();
        let trimmed = values.trimmed();
        assert_eq!(trimmed.get("nombre"), &FieldValue::from("Ana"));
        assert_eq!(trimmed.get("dni"), &FieldValue::from("123"));
    }

    #[test]
    fn test_json_shapes() {
        let values: ValueSet =
            serde_json::from_str(r#"{"a":null,"b":3,"c":"x","d":["p@q.com"]}"#).unwrap();
        assert_eq!(values.get("a"), &FieldValue::Null);
        assert_eq!(values.get("b"), &FieldValue::Number(3.0));
        assert_eq!(values.get("c"), &FieldValue::from("x"));
        assert_eq!(values.get("d"), &FieldValue::List(vec!["p@q.com".into()]));
    }

    #[test]
    fn test_changed_from() {
        let before: ValueSet = [("a", "1"), ("b", "2")].into_iter().collect();
        let mut after = before.clone();
        after.set("b", "3");
        after.set("c", "4");
        let mut changed = after.changed_from(&before);
        changed.sort();
        assert_eq!(changed, vec!["b".to_string(), "c".to_string()]);
    }
}
