//! Gym Forms - data-driven form engine
//!
//! Headless engine behind the gym back-office dialogs (alumnos, pagos,
//! planes, turnos). A form is described by an ordered list of field
//! descriptors; the engine owns the live value set and answers what to
//! show, what is invalid and what to hand to the submit callback.
//!
//! ## Architecture
//!
//! - **Domain Layer**: field descriptors, value objects, the form aggregate,
//!   domain events and the pure services (validation, derivation, visibility)
//! - **Ports Layer**: capabilities supplied by the caller (async validators,
//!   submit handler, cached option search)
//! - **Infrastructure Layer**: in-memory ranked option cache
//!
//! ## Flow
//!
//! ```text
//!  change(field, input)
//!     │
//!     ├─ locked? ──────────────► ignored
//!     ├─ pattern guard ────────► rejected
//!     ├─ truncate / coerce / capitalize
//!     ├─ derivation table (plan_id, servicio_id, producto_id, metodo_pago)
//!     ├─ sync errors recomputed
//!     └─ async check (debounced, generation-guarded)
//!
//!  submit()
//!     ├─ trim ─► first sync error ─► blocked
//!     ├─ pending async error ─────► blocked
//!     └─ SubmitHandler::submit(values)
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod definition;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ports;

pub use config::{AsyncTrigger, FormConfig};
pub use definition::FormDefinition;
pub use domain::aggregates::{
    ChangeOutcome, FormBuilder, FormEngine, FormMode, FormState, PendingCheck, RenderedField,
    SubmitOutcome,
};
pub use domain::descriptor::{Capitalize, FieldDescriptor, FieldKind, GridPlacement, Layout};
pub use domain::events::{EditRejection, FormEvent};
pub use domain::services::derivation::{DerivationContext, DerivationTable, Reducer};
pub use domain::services::validation::{
    field_validation_state, validate_all_fields, validate_field, FieldError, FieldValidationState,
};
pub use domain::services::visibility::{visible_fields, OriginRule, VisibilityRules};
pub use domain::value_objects::{
    Amount, FieldValue, OptionMeta, Pattern, PaymentMethod, SelectOption, TenantId, ValueSet,
};
pub use error::{FormsError, Result};
pub use infrastructure::CachedOptionIndex;
pub use ports::outbound::{AsyncValidator, OptionSearch, SubmitHandler};
