//! Field visibility
//!
//! Filters the descriptor list down to what should render, based on the
//! payment origin and payment method discriminators. Hidden fields keep
//! their stored value.

use serde::{Deserialize, Serialize};

use crate::domain::descriptor::FieldDescriptor;
use crate::domain::names::*;
use crate::domain::value_objects::{PaymentMethod, ValueSet};

/// Fields that only show for one origin value
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginRule {
    pub origin: String,
    pub fields: Vec<String>,
}

impl OriginRule {
    pub fn new<I, S>(origin: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            origin: origin.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// Visibility rules for discriminated forms.
///
/// Origin rules only apply when the form declares `origin_field`; amount
/// rules only when it declares `method_field`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityRules {
    pub origin_field: String,
    pub origins: Vec<OriginRule>,
    pub method_field: String,
}

impl Default for VisibilityRules {
    fn default() -> Self {
        Self::gym_payments()
    }
}

impl VisibilityRules {
    /// plan / servicio / producto origins and the three amount fields
    pub fn gym_payments() -> Self {
        Self {
            origin_field: ORIGEN.into(),
            origins: vec![
                OriginRule::new("plan", [PLAN_ID, FECHA_DE_VENCIMIENTO]),
                OriginRule::new("servicio", [SERVICIO_ID]),
                OriginRule::new("producto", [PRODUCTO_ID]),
            ],
            method_field: METODO_PAGO.into(),
        }
    }

    /// Descriptors to render for the given discriminator values
    pub fn visible_fields<'a>(
        &self,
        descriptors: &'a [FieldDescriptor],
        origin: Option<&str>,
        method: Option<&str>,
    ) -> Vec<&'a FieldDescriptor> {
        let has_origin = descriptors.iter().any(|d| d.name == self.origin_field);
        let has_method = descriptors.iter().any(|d| d.name == self.method_field);
        let origin = origin.map(str::trim).filter(|o| !o.is_empty());
        let method = method.and_then(PaymentMethod::parse);

        descriptors
            .iter()
            .filter(|d| !has_origin || self.origin_allows(&d.name, origin))
            .filter(|d| !has_method || method_allows(&d.name, method))
            .collect()
    }

    /// Same as [`visible_fields`](Self::visible_fields), reading the
    /// discriminators from `values`
    pub fn visible_for<'a>(
        &self,
        descriptors: &'a [FieldDescriptor],
        values: &ValueSet,
    ) -> Vec<&'a FieldDescriptor> {
        let origin = values.text(&self.origin_field);
        let method = values.text(&self.method_field);
        self.visible_fields(descriptors, origin.as_deref(), method.as_deref())
    }

    fn origin_allows(&self, field: &str, origin: Option<&str>) -> bool {
        let owners: Vec<&OriginRule> = self
            .origins
            .iter()
            .filter(|rule| rule.fields.iter().any(|f| f == field))
            .collect();
        if owners.is_empty() {
            return true;
        }
        match origin {
            Some(origin) => owners.iter().any(|rule| rule.origin.eq_ignore_ascii_case(origin)),
            None => false,
        }
    }
}

fn method_allows(field: &str, method: Option<PaymentMethod>) -> bool {
    if !AMOUNT_FIELDS.contains(&field) {
        return true;
    }
    match method {
        None => false,
        Some(PaymentMethod::Mixed) => true,
        Some(single) => single.amount_field() == Some(field),
    }
}

/// Visible descriptors under the gym payment rules
pub fn visible_fields<'a>(
    descriptors: &'a [FieldDescriptor],
    origin: Option<&str>,
    method: Option<&str>,
) -> Vec<&'a FieldDescriptor> {
    VisibilityRules::gym_payments().visible_fields(descriptors, origin, method)
}
