//! Aggregates module

pub mod form;

pub use form::{
    ChangeOutcome, FormBuilder, FormEngine, FormMode, FormState, PendingCheck, RenderedField,
    SubmitOutcome, ValuesListener,
};
