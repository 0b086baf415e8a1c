//! Value Objects module
//!
//! Immutable, validated primitives shared by descriptors and services.

pub mod field_value;
pub mod money;
pub mod pattern;

pub use field_value::{FieldValue, ValueSet};
pub use money::{Amount, PaymentMethod};
pub use pattern::Pattern;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tenant (gym) identifier
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Metadata embedded in a select option (plans carry quota and price)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numero_clases: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precio: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duracion_dias: Option<u32>,
}

impl OptionMeta {
    pub fn is_empty(&self) -> bool {
        self.numero_clases.is_none() && self.precio.is_none() && self.duracion_dias.is_none()
    }
}

/// One entry of a select / search-select field
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: FieldValue,
    #[serde(default, skip_serializing_if = "OptionMeta::is_empty")]
    pub meta: OptionMeta,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            meta: OptionMeta::default(),
        }
    }

    pub fn with_meta(mut self, meta: OptionMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Whether this option is the one a stored value points at.
    ///
    /// Selects store ids either as numbers or as strings depending on where
    /// the value came from, so comparison goes through the display form.
    pub fn matches(&self, value: &FieldValue) -> bool {
        !value.is_empty() && self.value.to_string() == value.to_string()
    }
}
