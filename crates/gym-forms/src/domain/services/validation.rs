//! Field validation
//!
//! Pure functions over (descriptor, value). Rules run in a fixed order and
//! the first failing rule wins:
//!
//! 1. required but empty
//! 2. too short (text)
//! 3. pattern / address format mismatch
//! 4. not a number (numeric)
//! 5. below min (numeric)
//! 6. above max (numeric)
//! 7. custom `validate` callback

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::descriptor::{FieldDescriptor, FieldKind};
use crate::domain::value_objects::{FieldValue, ValueSet};

/// First blocking error of a form
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// What a rendered field shows under its input
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValidationState {
    pub invalid: bool,
    pub helper_text: Option<String>,
}

/// Validate one value against its descriptor
pub fn validate_field(descriptor: &FieldDescriptor, value: &FieldValue) -> Option<String> {
    let label = &descriptor.label;

    if value.is_empty() {
        if descriptor.required {
            return Some(format!("{label} es obligatorio"));
        }
        return custom_rule(descriptor, value);
    }

    match &descriptor.kind {
        FieldKind::ShortText {
            min_length,
            pattern,
            ..
        } => {
            let text = value.to_string();
            let text = text.trim();
            if let Some(min) = min_length {
                if text.chars().count() < *min {
                    return Some(format!("{label} debe tener al menos {min} caracteres"));
                }
            }
            if let Some(pattern) = pattern {
                if !pattern.is_match(text) {
                    return Some(format!("{label} tiene un formato inválido"));
                }
            }
        }
        FieldKind::EmailList { max_items } => {
            let addresses = email_entries(value);
            if let Some(bad) = addresses.iter().find(|a| !is_email(a)) {
                return Some(format!("{label} contiene un email inválido: {bad}"));
            }
            if let Some(max) = max_items {
                if addresses.len() > *max {
                    return Some(format!("{label} admite como máximo {max} emails"));
                }
            }
        }
        FieldKind::Number { min, max } => {
            let Some(number) = value.as_number() else {
                return Some(format!("{label} debe ser un número"));
            };
            if let Some(min) = min {
                if number < *min {
                    return Some(format!("{label} debe ser mayor o igual a {min}"));
                }
            }
            if let Some(max) = max {
                if number > *max {
                    return Some(format!("{label} debe ser menor o igual a {max}"));
                }
            }
        }
        FieldKind::Date
        | FieldKind::Time
        | FieldKind::Select { .. }
        | FieldKind::SearchSelect { .. }
        | FieldKind::Color => {}
    }

    custom_rule(descriptor, value)
}

fn custom_rule(descriptor: &FieldDescriptor, value: &FieldValue) -> Option<String> {
    descriptor.validate.as_ref().and_then(|rule| rule(value))
}

/// First error across `descriptors`, in order. Submit-time gate.
pub fn validate_all_fields<'a, I>(descriptors: I, values: &ValueSet) -> Option<FieldError>
where
    I: IntoIterator<Item = &'a FieldDescriptor>,
{
    descriptors.into_iter().find_map(|descriptor| {
        validate_field(descriptor, values.get(&descriptor.name))
            .map(|message| FieldError::new(&descriptor.name, message))
    })
}

/// Invalid flag and helper text for one field.
///
/// An external (async) error always wins. Synchronous errors only show once
/// the field was touched, so a fresh form is not painted red.
pub fn field_validation_state(
    descriptor: &FieldDescriptor,
    value: &FieldValue,
    external_error: Option<&str>,
    touched: bool,
) -> FieldValidationState {
    if let Some(error) = external_error {
        return FieldValidationState {
            invalid: true,
            helper_text: Some(error.to_string()),
        };
    }

    if touched {
        if let Some(error) = validate_field(descriptor, value) {
            return FieldValidationState {
                invalid: true,
                helper_text: Some(error),
            };
        }
    }

    FieldValidationState {
        invalid: false,
        helper_text: descriptor.helper_text.clone(),
    }
}

/// Cut text to at most `max` characters
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Apply the descriptor's max length to a stored value
pub fn truncate_to_max_length(descriptor: &FieldDescriptor, value: FieldValue) -> FieldValue {
    match (descriptor.kind.max_length(), value) {
        (Some(max), FieldValue::Text(text)) if text.chars().count() > max => {
            FieldValue::Text(truncate_chars(&text, max))
        }
        (_, value) => value,
    }
}

/// Turn raw input into the value to store.
///
/// Returns `None` when the pattern guard rejects the edit. Steps, in order:
/// pattern guard, max length, numeric coercion, capitalization.
pub fn normalize_input(descriptor: &FieldDescriptor, input: FieldValue) -> Option<FieldValue> {
    match &descriptor.kind {
        FieldKind::ShortText {
            max_length,
            pattern,
            capitalize,
            ..
        } => {
            let FieldValue::Text(text) = input else {
                return Some(input);
            };
            if let Some(pattern) = pattern {
                if !text.is_empty() && !pattern.is_match(&text) {
                    return None;
                }
            }
            let text = match max_length {
                Some(max) => truncate_chars(&text, *max),
                None => text,
            };
            let text = match capitalize {
                Some(mode) => mode.apply(&text),
                None => text,
            };
            Some(FieldValue::Text(text))
        }
        FieldKind::Select { numeric: true, .. } | FieldKind::SearchSelect { numeric: true, .. } => {
            Some(coerce_numeric(input))
        }
        FieldKind::EmailList { .. } => Some(match input {
            FieldValue::Text(text) => FieldValue::List(split_emails(&text)),
            other => other,
        }),
        _ => Some(input),
    }
}

fn coerce_numeric(input: FieldValue) -> FieldValue {
    match input {
        FieldValue::Text(text) if text.trim().is_empty() => FieldValue::Null,
        FieldValue::Text(text) => match text.trim().parse::<f64>() {
            Ok(n) => FieldValue::Number(n),
            Err(_) => FieldValue::Text(text),
        },
        other => other,
    }
}

fn split_emails(text: &str) -> Vec<String> {
    text.split([',', ';'])
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn email_entries(value: &FieldValue) -> Vec<String> {
    match value {
        FieldValue::List(items) => items
            .iter()
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .collect(),
        FieldValue::Text(text) => split_emails(text),
        _ => Vec::new(),
    }
}

fn is_email(address: &str) -> bool {
    let mut parts = address.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !address.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::descriptor::Capitalize;
    use proptest::prelude::*;

    fn nombre() -> FieldDescriptor {
        FieldDescriptor::new("nombre", "Nombre", FieldKind::text_between(3, 40)).required(true)
    }

    fn dni() -> FieldDescriptor {
        FieldDescriptor::new("dni", "DNI", FieldKind::text_between(7, 8))
            .required(true)
            .with_pattern(r"^\d*$")
            .unwrap()
    }

    fn edad() -> FieldDescriptor {
        FieldDescriptor::new("edad", "Edad", FieldKind::number(Some(12.0), Some(99.0)))
    }

    #[test]
    fn test_required_message_names_label() {
        let err = validate_field(&nombre(), &FieldValue::from("   ")).unwrap();
        assert!(err.contains("Nombre"));
        assert!(validate_field(&nombre(), &FieldValue::Null).is_some());
    }

    #[test]
    fn test_optional_empty_is_valid() {
        assert_eq!(validate_field(&edad(), &FieldValue::Null), None);
    }

    #[test]
    fn test_too_short() {
        let err = validate_field(&nombre(), &FieldValue::from("Al")).unwrap();
        assert!(err.contains("al menos 3"));
    }

    #[test]
    fn test_pattern_mismatch() {
        let err = validate_field(&dni(), &FieldValue::from("12345a7")).unwrap();
        assert!(err.contains("formato"));
    }

    #[test]
    fn test_length_checked_before_pattern() {
        let err = validate_field(&dni(), &FieldValue::from("1a")).unwrap();
        assert!(err.contains("al menos 7"));
    }

    #[test]
    fn test_numeric_rules_in_order() {
        assert!(validate_field(&edad(), &FieldValue::from("doce"))
            .unwrap()
            .contains("número"));
        assert!(validate_field(&edad(), &FieldValue::from("5"))
            .unwrap()
            .contains("mayor"));
        assert!(validate_field(&edad(), &FieldValue::Number(120.0))
            .unwrap()
            .contains("menor"));
        assert_eq!(validate_field(&edad(), &FieldValue::from("30")), None);
    }

    #[test]
    fn test_custom_rule_runs_last() {
        let field = nombre().with_validator(|v| {
            (v.to_string() == "admin").then(|| "Nombre reservado".to_string())
        });
        assert_eq!(
            validate_field(&field, &FieldValue::from("admin")).as_deref(),
            Some("Nombre reservado")
        );
        // length rule wins over the custom rule
        assert!(validate_field(&field, &FieldValue::from("ad"))
            .unwrap()
            .contains("al menos"));
    }

    #[test]
    fn test_email_list() {
        let field = FieldDescriptor::new(
            "avisos",
            "Emails",
            FieldKind::EmailList { max_items: Some(2) },
        );
        assert_eq!(
            validate_field(&field, &FieldValue::from("a@b.com, c@d.com")),
            None
        );
        assert!(validate_field(&field, &FieldValue::from("a@b.com, nope"))
            .unwrap()
            .contains("nope"));
        assert!(validate_field(&field, &FieldValue::from("a@b.com,c@d.com,e@f.com"))
            .unwrap()
            .contains("máximo"));
    }

    #[test]
    fn test_validate_all_returns_first_in_order() {
        let fields = vec![nombre(), dni()];
        let values: ValueSet = [("nombre", ""), ("dni", "")].into_iter().collect();
        let err = validate_all_fields(&fields, &values).unwrap();
        assert_eq!(err.field, "nombre");

        let values: ValueSet = [("nombre", "Ana"), ("dni", "")].into_iter().collect();
        let err = validate_all_fields(&fields, &values).unwrap();
        assert_eq!(err.field, "dni");
        assert!(err.message.contains("DNI"));

        let values: ValueSet = [("nombre", "Ana"), ("dni", "1234567")].into_iter().collect();
        assert_eq!(validate_all_fields(&fields, &values), None);
    }

    #[test]
    fn test_external_error_has_priority() {
        let state = field_validation_state(
            &dni(),
            &FieldValue::from("1"),
            Some("El DNI ya existe"),
            true,
        );
        assert!(state.invalid);
        assert_eq!(state.helper_text.as_deref(), Some("El DNI ya existe"));
    }

    #[test]
    fn test_untouched_field_hides_sync_error() {
        let field = dni().with_helper_text("Sin puntos");
        let state = field_validation_state(&field, &FieldValue::Null, None, false);
        assert!(!state.invalid);
        assert_eq!(state.helper_text.as_deref(), Some("Sin puntos"));

        let state = field_validation_state(&field, &FieldValue::Null, None, true);
        assert!(state.invalid);
        assert!(state.helper_text.unwrap().contains("DNI"));
    }

    #[test]
    fn test_normalize_rejects_pattern_and_truncates() {
        assert_eq!(normalize_input(&dni(), FieldValue::from("12a")), None);
        assert_eq!(
            normalize_input(&dni(), FieldValue::from("123456789")),
            Some(FieldValue::from("12345678"))
        );
        // clearing is always allowed
        assert_eq!(
            normalize_input(&dni(), FieldValue::from("")),
            Some(FieldValue::from(""))
        );
    }

    #[test]
    fn test_normalize_coerces_numeric_select() {
        let plan = FieldDescriptor::new("plan_id", "Plan", FieldKind::numeric_select(vec![]));
        assert_eq!(
            normalize_input(&plan, FieldValue::from("3")),
            Some(FieldValue::Number(3.0))
        );
        assert_eq!(normalize_input(&plan, FieldValue::from("")), Some(FieldValue::Null));
    }

    #[test]
    fn test_normalize_capitalizes_after_truncation() {
        let field = nombre().with_capitalize(Capitalize::EachWord);
        assert_eq!(
            normalize_input(&field, FieldValue::from("ana maría")),
            Some(FieldValue::from("Ana María"))
        );
    }

    #[test]
    fn test_normalize_splits_email_text() {
        let field = FieldDescriptor::new("avisos", "Emails", FieldKind::EmailList { max_items: None });
        assert_eq!(
            normalize_input(&field, FieldValue::from("a@b.com; c@d.com")),
            Some(FieldValue::List(vec!["a@b.com".into(), "c@d.com".into()]))
        );
    }

    proptest! {
        #[test]
        fn prop_truncation_is_exact_and_idempotent(text in "\\PC{0,80}", max in 0usize..50) {
            let field = FieldDescriptor::new("nota", "Nota", FieldKind::ShortText {
                min_length: None,
                max_length: Some(max),
                pattern: None,
                capitalize: None,
            });
            let once = truncate_to_max_length(&field, FieldValue::Text(text.clone()));
            let stored = once.to_string();
            prop_assert_eq!(stored.chars().count(), text.chars().count().min(max));
            let twice = truncate_to_max_length(&field, once.clone());
            prop_assert_eq!(twice, once);
        }
    }
}
