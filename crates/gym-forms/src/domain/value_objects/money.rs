//! Money Value Objects
//!
//! Exact amounts for the payment fields and the payment method
//! discriminator that routes them.

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use super::FieldValue;
use crate::domain::names::{MONTO_EFECTIVO, MONTO_MP, MONTO_TARJETA};

/// Price embedded in an option label, e.g. `"Yoga - $1.234,56"`
fn label_price_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\s?(\d{1,3}(?:\.\d{3})+(?:,\d{1,2})?|\d+(?:,\d{1,2})?)")
            .expect("label price pattern is valid")
    })
}

fn thousands_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{1,3}(\.\d{3})+$").expect("thousands pattern is valid"))
}

/// Non-negative monetary amount
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Parse user or label text.
    ///
    /// Accepts `5000`, `5000.5`, `1.234` (thousands dot) and `1.234,56`
    /// (decimal comma), with an optional leading `$`.
    pub fn parse(text: &str) -> Option<Self> {
        let cleaned: String = text
            .trim()
            .trim_start_matches('$')
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if cleaned.is_empty() {
            return None;
        }

        let normalized = if cleaned.contains(',') {
            cleaned.replace('.', "").replace(',', ".")
        } else if thousands_pattern().is_match(&cleaned) {
            cleaned.replace('.', "")
        } else {
            cleaned
        };

        Decimal::from_str(&normalized)
            .ok()
            .filter(|d| !d.is_sign_negative())
            .map(Self)
    }

    /// Read an amount already stored in a field
    pub fn from_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Number(n) => Decimal::from_str(&n.to_string())
                .ok()
                .filter(|d| !d.is_sign_negative())
                .map(Self),
            FieldValue::Text(s) => Self::parse(s),
            _ => None,
        }
    }

    /// Price shown inside an option label, if any
    pub fn from_label(label: &str) -> Option<Self> {
        label_price_pattern()
            .captures(label)
            .and_then(|caps| caps.get(1))
            .and_then(|m| Self::parse(m.as_str()))
    }

    /// `None` on overflow
    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Text stored in an amount field, without trailing zeros
    pub fn to_field_value(&self) -> FieldValue {
        FieldValue::Text(self.to_string())
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}


impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// Payment method discriminator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Efectivo
    Cash,
    /// Tarjeta
    Card,
    /// Mercado Pago / transferencia
    Transfer,
    /// Up to three partial amounts
    Mixed,
}

impl PaymentMethod {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "efectivo" | "cash" => Some(Self::Cash),
            "tarjeta" | "card" | "debito" | "débito" | "credito" | "crédito" => Some(Self::Card),
            "mercadopago" | "mercado pago" | "mp" | "transferencia" | "transfer" => {
                Some(Self::Transfer)
            }
            "mixto" | "mixed" => Some(Self::Mixed),
            _ => None,
        }
    }

    pub fn from_value(value: &FieldValue) -> Option<Self> {
        value.as_text().and_then(Self::parse)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "Efectivo",
            Self::Card => "Tarjeta",
            Self::Transfer => "MercadoPago",
            Self::Mixed => "Mixto",
        }
    }

    /// The single amount field this method fills; `None` for mixed
    pub fn amount_field(&self) -> Option<&'static str> {
        match self {
            Self::Cash => Some(MONTO_EFECTIVO),
            Self::Card => Some(MONTO_TARJETA),
            Self::Transfer => Some(MONTO_MP),
            Self::Mixed => None,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
