//! Domain module
//!
//! Field descriptors, value objects, the form aggregate and the pure
//! services it orchestrates.

pub mod aggregates;
pub mod descriptor;
pub mod events;
pub mod services;
pub mod value_objects;

/// Field names the gym payment forms give meaning to
pub mod names {
    /// Plan selector driving quota and price
    pub const PLAN_ID: &str = "plan_id";
    /// Service selector
    pub const SERVICIO_ID: &str = "servicio_id";
    /// Product selector
    pub const PRODUCTO_ID: &str = "producto_id";
    /// Payment method discriminator
    pub const METODO_PAGO: &str = "metodo_pago";
    /// Payment origin discriminator (plan / servicio / producto)
    pub const ORIGEN: &str = "origen";
    /// Classes included by the plan
    pub const CLASES_PAGADAS: &str = "clases_pagadas";
    /// Classes already used
    pub const CLASES_REALIZADAS: &str = "clases_realizadas";
    /// Payment date
    pub const FECHA_DE_PAGO: &str = "fecha_de_pago";
    /// Plan expiration date
    pub const FECHA_DE_VENCIMIENTO: &str = "fecha_de_vencimiento";
    /// Cash amount
    pub const MONTO_EFECTIVO: &str = "monto_efectivo";
    /// Mercado Pago / transfer amount
    pub const MONTO_MP: &str = "monto_mp";
    /// Card amount
    pub const MONTO_TARJETA: &str = "monto_tarjeta";

    /// The three amount fields, in display order
    pub const AMOUNT_FIELDS: [&str; 3] = [MONTO_EFECTIVO, MONTO_MP, MONTO_TARJETA];
}
