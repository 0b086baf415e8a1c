//! Derived state
//!
//! When a driver field changes, its reducers recompute dependent fields.
//! Reducers are pure `(context, values) -> values` functions looked up in a
//! table keyed by driver name. They run once per change; a value written by
//! a reducer never triggers another reducer.

use chrono::{Days, NaiveDate};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::domain::descriptor::FieldDescriptor;
use crate::domain::names::*;
use crate::domain::value_objects::{Amount, FieldValue, PaymentMethod, SelectOption, ValueSet};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Read-only view a reducer gets besides the values
pub struct DerivationContext<'a> {
    pub descriptors: &'a [FieldDescriptor],
    /// Values before the triggering change
    pub previous: &'a ValueSet,
    /// Names locked for this form instance
    locked: Option<&'a HashSet<String>>,
}

impl<'a> DerivationContext<'a> {
    pub fn new(descriptors: &'a [FieldDescriptor], previous: &'a ValueSet) -> Self {
        Self {
            descriptors,
            previous,
            locked: None,
        }
    }

    /// Reducers leave these names untouched
    pub fn with_locked(mut self, locked: &'a HashSet<String>) -> Self {
        self.locked = Some(locked);
        self
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.descriptors.iter().any(|d| d.name == name)
    }

    /// Locked for this instance, or declared `disabled`
    pub fn is_locked(&self, name: &str) -> bool {
        self.locked.is_some_and(|locked| locked.contains(name))
            || self.descriptors.iter().any(|d| d.name == name && d.disabled)
    }

    /// Option of `field` whose value equals `value`
    pub fn selected_option(&self, field: &str, value: &FieldValue) -> Option<&'a SelectOption> {
        self.descriptors
            .iter()
            .find(|d| d.name == field)
            .and_then(|d| d.kind.options().iter().find(|o| o.matches(value)))
    }

    /// Write only fields the form declares and does not lock
    fn write(&self, values: &mut ValueSet, name: &str, value: FieldValue) {
        if self.has_field(name) && !self.is_locked(name) {
            values.set(name, value);
        }
    }

    fn clear(&self, values: &mut ValueSet, name: &str) {
        if !self.is_locked(name) && (self.has_field(name) || values.contains(name)) {
            values.clear(name);
        }
    }
}

/// Derived-state reducer
pub type Reducer = fn(&DerivationContext<'_>, ValueSet) -> ValueSet;

/// Driver field name -> reducers, applied in registration order
#[derive(Clone, Default)]
pub struct DerivationTable {
    reducers: HashMap<String, Vec<Reducer>>,
}

impl DerivationTable {
    /// Table with no derivations
    pub fn empty() -> Self {
        Self::default()
    }

    /// Plan / service / product pricing and payment method routing
    pub fn gym_payments() -> Self {
        Self::empty()
            .register(PLAN_ID, derive_from_plan)
            .register(SERVICIO_ID, derive_from_service)
            .register(PRODUCTO_ID, derive_from_product)
            .register(METODO_PAGO, derive_from_payment_method)
            .register(FECHA_DE_PAGO, derive_expiration)
    }

    pub fn register(mut self, driver: impl Into<String>, reducer: Reducer) -> Self {
        self.reducers.entry(driver.into()).or_default().push(reducer);
        self
    }

    pub fn drives(&self, field: &str) -> bool {
        self.reducers.contains_key(field)
    }

    /// Run the reducers registered for `changed`; other fields pass through
    pub fn apply(&self, changed: &str, ctx: &DerivationContext<'_>, values: ValueSet) -> ValueSet {
        match self.reducers.get(changed) {
            Some(reducers) => reducers
                .iter()
                .fold(values, |values, reducer| reducer(ctx, values)),
            None => values,
        }
    }
}

impl fmt::Debug for DerivationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut drivers: Vec<&String> = self.reducers.keys().collect();
        drivers.sort();
        f.debug_struct("DerivationTable").field("drivers", &drivers).finish()
    }
}

/// Put `amount` in the field of the selected single payment method
fn route_amount(ctx: &DerivationContext<'_>, values: &mut ValueSet, amount: Amount) {
    let target = PaymentMethod::from_value(values.get(METODO_PAGO)).and_then(|m| m.amount_field());
    if let Some(field) = target {
        ctx.write(values, field, amount.to_field_value());
    }
}

/// Plan selected: quota from option metadata, price into the amount field,
/// expiration from the payment date.
pub fn derive_from_plan(ctx: &DerivationContext<'_>, mut values: ValueSet) -> ValueSet {
    let selected = values.get(PLAN_ID).clone();
    match ctx.selected_option(PLAN_ID, &selected) {
        Some(option) => {
            let quota = option.meta.numero_clases.unwrap_or(0);
            ctx.write(&mut values, CLASES_PAGADAS, FieldValue::from(quota));
            ctx.write(&mut values, CLASES_REALIZADAS, FieldValue::from(0));
            if let Some(price) = option.meta.precio {
                route_amount(ctx, &mut values, Amount::new(price));
            }
            derive_expiration(ctx, values)
        }
        None => {
            ctx.write(&mut values, CLASES_PAGADAS, FieldValue::from(0));
            ctx.write(&mut values, CLASES_REALIZADAS, FieldValue::from(0));
            values
        }
    }
}

fn route_option_price(ctx: &DerivationContext<'_>, mut values: ValueSet, driver: &str) -> ValueSet {
    let selected = values.get(driver).clone();
    let price = ctx.selected_option(driver, &selected).and_then(|option| {
        option
            .meta
            .precio
            .map(Amount::new)
            .or_else(|| Amount::from_label(&option.label))
    });
    if let Some(price) = price {
        route_amount(ctx, &mut values, price);
    }
    values
}

/// Service selected: price from metadata or label
pub fn derive_from_service(ctx: &DerivationContext<'_>, values: ValueSet) -> ValueSet {
    route_option_price(ctx, values, SERVICIO_ID)
}

/// Product selected: price from metadata or label
pub fn derive_from_product(ctx: &DerivationContext<'_>, values: ValueSet) -> ValueSet {
    route_option_price(ctx, values, PRODUCTO_ID)
}

/// Payment method changed.
///
/// Mixed clears the three amounts for independent entry. A single method
/// receives the sum of whatever was entered before; the others are cleared.
/// Locked amounts neither move nor count. A locked target field or a sum
/// that overflows leaves every amount as it was.
pub fn derive_from_payment_method(ctx: &DerivationContext<'_>, mut values: ValueSet) -> ValueSet {
    let Some(method) = PaymentMethod::from_value(values.get(METODO_PAGO)) else {
        return values;
    };
    if method.amount_field().is_some_and(|field| ctx.is_locked(field)) {
        return values;
    }

    let movable: Vec<&str> = AMOUNT_FIELDS
        .into_iter()
        .filter(|field| !ctx.is_locked(field))
        .collect();
    let total = movable
        .iter()
        .filter_map(|field| Amount::from_value(values.get(field)))
        .try_fold(None, |total: Option<Amount>, amount| match total {
            None => Some(Some(amount)),
            Some(total) => total.checked_add(amount).map(Some),
        });
    let Some(total) = total else {
        return values;
    };

    for field in movable {
        ctx.clear(&mut values, field);
    }

    if let (Some(field), Some(total)) = (method.amount_field(), total) {
        ctx.write(&mut values, field, total.to_field_value());
    }
    values
}

/// Expiration = payment date + plan duration, when both are known
pub fn derive_expiration(ctx: &DerivationContext<'_>, mut values: ValueSet) -> ValueSet {
    let selected = values.get(PLAN_ID).clone();
    let Some(days) = ctx
        .selected_option(PLAN_ID, &selected)
        .and_then(|o| o.meta.duracion_dias)
    else {
        return values;
    };
    let paid_on = values
        .text(FECHA_DE_PAGO)
        .and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok());
    if let Some(expires) = paid_on.and_then(|d| d.checked_add_days(Days::new(days as u64))) {
        ctx.write(
            &mut values,
            FECHA_DE_VENCIMIENTO,
            FieldValue::Text(expires.format(DATE_FORMAT).to_string()),
        );
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::descriptor::FieldKind;
    use crate::domain::value_objects::OptionMeta;
    use rust_decimal::Decimal;

    fn plan_options() -> Vec<SelectOption> {
        vec![
            SelectOption::new("Mensual 12 clases", 1).with_meta(OptionMeta {
                numero_clases: Some(12),
                precio: Some(Decimal::new(5000, 0)),
                duracion_dias: Some(30),
            }),
            SelectOption::new("Libre", 2),
        ]
    }

    fn payment_fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new(PLAN_ID, "Plan", FieldKind::numeric_select(plan_options())),
            FieldDescriptor::new(
                SERVICIO_ID,
                "Servicio",
                FieldKind::select(vec![SelectOption::new("Masajes - $1.234,56", "s1")]),
            ),
            FieldDescriptor::new(
                PRODUCTO_ID,
                "Producto",
                FieldKind::select(vec![SelectOption::new("Agua $800", "p1")]),
            ),
            FieldDescriptor::new(METODO_PAGO, "Método", FieldKind::select(vec![])),
            FieldDescriptor::new(CLASES_PAGADAS, "Clases pagadas", FieldKind::number(None, None)),
            FieldDescriptor::new(CLASES_REALIZADAS, "Clases realizadas", FieldKind::number(None, None)),
            FieldDescriptor::new(FECHA_DE_PAGO, "Fecha de pago", FieldKind::Date),
            FieldDescriptor::new(FECHA_DE_VENCIMIENTO, "Vencimiento", FieldKind::Date),
            FieldDescriptor::new(MONTO_EFECTIVO, "Efectivo", FieldKind::text()),
            FieldDescriptor::new(MONTO_MP, "Mercado Pago", FieldKind::text()),
            FieldDescriptor::new(MONTO_TARJETA, "Tarjeta", FieldKind::text()),
        ]
    }

    fn apply(table: &DerivationTable, fields: &[FieldDescriptor], changed: &str, values: ValueSet) -> ValueSet {
        let previous = values.clone();
        let ctx = DerivationContext::new(fields, &previous);
        table.apply(changed, &ctx, values)
    }

    #[test]
    fn test_plan_fills_quota_and_cash_amount() {
        let fields = payment_fields();
        let mut values = ValueSet::new();
        values.set(METODO_PAGO, "Efectivo");
        values.set(PLAN_ID, 1);

        let next = apply(&DerivationTable::gym_payments(), &fields, PLAN_ID, values);
        assert_eq!(next.get(CLASES_PAGADAS), &FieldValue::Number(12.0));
        assert_eq!(next.get(CLASES_REALIZADAS), &FieldValue::Number(0.0));
        assert_eq!(next.get(MONTO_EFECTIVO), &FieldValue::from("5000"));
        assert!(next.get(MONTO_MP).is_empty());
        assert!(next.get(MONTO_TARJETA).is_empty());
    }

    #[test]
    fn test_stale_plan_resets_quota() {
        let fields = payment_fields();
        let mut values = ValueSet::new();
        values.set(CLASES_PAGADAS, 8);
        values.set(CLASES_REALIZADAS, 3);
        values.set(PLAN_ID, 99);

        let next = apply(&DerivationTable::gym_payments(), &fields, PLAN_ID, values);
        assert_eq!(next.get(CLASES_PAGADAS), &FieldValue::Number(0.0));
        assert_eq!(next.get(CLASES_REALIZADAS), &FieldValue::Number(0.0));
    }

    #[test]
    fn test_plan_without_method_leaves_amounts() {
        let fields = payment_fields();
        let mut values = ValueSet::new();
        values.set(PLAN_ID, 1);
        let next = apply(&DerivationTable::gym_payments(), &fields, PLAN_ID, values);
        for field in AMOUNT_FIELDS {
            assert!(next.get(field).is_empty());
        }
    }

    #[test]
    fn test_plan_sets_expiration_from_payment_date() {
        let fields = payment_fields();
        let mut values = ValueSet::new();
        values.set(FECHA_DE_PAGO, "2024-01-15");
        values.set(PLAN_ID, 1);
        let next = apply(&DerivationTable::gym_payments(), &fields, PLAN_ID, values);
        assert_eq!(next.get(FECHA_DE_VENCIMIENTO), &FieldValue::from("2024-02-14"));

        let mut moved = next.clone();
        moved.set(FECHA_DE_PAGO, "2024-03-01");
        let next = apply(&DerivationTable::gym_payments(), &fields, FECHA_DE_PAGO, moved);
        assert_eq!(next.get(FECHA_DE_VENCIMIENTO), &FieldValue::from("2024-03-31"));
    }

    #[test]
    fn test_service_price_from_label() {
        let fields = payment_fields();
        let mut values = ValueSet::new();
        values.set(METODO_PAGO, "Tarjeta");
        values.set(SERVICIO_ID, "s1");
        let next = apply(&DerivationTable::gym_payments(), &fields, SERVICIO_ID, values);
        assert_eq!(next.get(MONTO_TARJETA), &FieldValue::from("1234.56"));
    }

    #[test]
    fn test_product_price_into_mp() {
        let fields = payment_fields();
        let mut values = ValueSet::new();
        values.set(METODO_PAGO, "MercadoPago");
        values.set(PRODUCTO_ID, "p1");
        let next = apply(&DerivationTable::gym_payments(), &fields, PRODUCTO_ID, values);
        assert_eq!(next.get(MONTO_MP), &FieldValue::from("800"));
    }

    #[test]
    fn test_method_switch_moves_amount() {
        let fields = payment_fields();
        let mut values = ValueSet::new();
        values.set(MONTO_EFECTIVO, "5000");
        values.set(METODO_PAGO, "Tarjeta");
        let next = apply(&DerivationTable::gym_payments(), &fields, METODO_PAGO, values);
        assert_eq!(next.get(MONTO_TARJETA), &FieldValue::from("5000"));
        assert!(next.get(MONTO_EFECTIVO).is_empty());
        assert!(next.get(MONTO_MP).is_empty());
    }

    #[test]
    fn test_mixed_clears_all_amounts() {
        let fields = payment_fields();
        let mut values = ValueSet::new();
        values.set(MONTO_EFECTIVO, "100");
        values.set(MONTO_MP, "200");
        values.set(MONTO_TARJETA, "300");
        values.set(METODO_PAGO, "Mixto");
        let next = apply(&DerivationTable::gym_payments(), &fields, METODO_PAGO, values);
        for field in AMOUNT_FIELDS {
            assert!(next.get(field).is_empty());
        }
    }

    #[test]
    fn test_mixed_to_single_sums_partials() {
        let fields = payment_fields();
        let mut values = ValueSet::new();
        values.set(MONTO_EFECTIVO, "1000");
        values.set(MONTO_MP, "2500,50");
        values.set(METODO_PAGO, "Efectivo");
        let next = apply(&DerivationTable::gym_payments(), &fields, METODO_PAGO, values);
        assert_eq!(next.get(MONTO_EFECTIVO), &FieldValue::from("3500.5"));
        assert!(next.get(MONTO_MP).is_empty());
    }

    #[test]
    fn test_overflowing_sum_leaves_amounts() {
        let fields = payment_fields();
        let mut values = ValueSet::new();
        values.set(MONTO_EFECTIVO, "79228162514264337593543950335");
        values.set(MONTO_MP, "1");
        values.set(METODO_PAGO, "Efectivo");
        let next = apply(&DerivationTable::gym_payments(), &fields, METODO_PAGO, values.clone());
        assert_eq!(next, values);
    }

    #[test]
    fn test_locked_fields_are_not_derived() {
        let fields = payment_fields();
        let locked: HashSet<String> = [CLASES_PAGADAS, MONTO_EFECTIVO]
            .into_iter()
            .map(String::from)
            .collect();
        let mut values = ValueSet::new();
        values.set(MONTO_EFECTIVO, "700");
        values.set(MONTO_MP, "300");
        values.set(METODO_PAGO, "Tarjeta");

        let previous = values.clone();
        let ctx = DerivationContext::new(&fields, &previous).with_locked(&locked);
        let next = DerivationTable::gym_payments().apply(METODO_PAGO, &ctx, values);
        assert_eq!(next.get(MONTO_EFECTIVO), &FieldValue::from("700"));
        assert_eq!(next.get(MONTO_TARJETA), &FieldValue::from("300"));
        assert!(next.get(MONTO_MP).is_empty());

        let mut values = next;
        values.set(PLAN_ID, 1);
        let previous = values.clone();
        let ctx = DerivationContext::new(&fields, &previous).with_locked(&locked);
        let next = DerivationTable::gym_payments().apply(PLAN_ID, &ctx, values);
        assert!(next.get(CLASES_PAGADAS).is_empty());
        assert_eq!(next.get(CLASES_REALIZADAS), &FieldValue::Number(0.0));
    }

    #[test]
    fn test_other_fields_pass_through() {
        let fields = payment_fields();
        let mut values = ValueSet::new();
        values.set("observaciones", "hola");
        let next = apply(&DerivationTable::gym_payments(), &fields, "observaciones", values.clone());
        assert_eq!(next, values);
    }

    #[test]
    fn test_table_is_additive() {
        fn shout(_: &DerivationContext<'_>, mut values: ValueSet) -> ValueSet {
            let upper = values.get("nombre").to_string().to_uppercase();
            values.set("apodo", upper);
            values
        }
        let table = DerivationTable::empty().register("nombre", shout);
        assert!(table.drives("nombre"));
        assert!(!table.drives(PLAN_ID));

        let fields = payment_fields();
        let mut values = ValueSet::new();
        values.set("nombre", "ana");
        let next = apply(&table, &fields, "nombre", values);
        assert_eq!(next.get("apodo"), &FieldValue::from("ANA"));
    }
}
