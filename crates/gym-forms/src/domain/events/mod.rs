//! Form events
//!
//! Accumulated by the form aggregate and drained with `take_events`.

use serde::Serialize;

use crate::domain::aggregates::FormMode;
use crate::domain::services::validation::FieldError;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum FormEvent {
    Opened { mode: FormMode },
    ValueChanged { field: String, derived: Vec<String> },
    EditRejected { field: String, reason: EditRejection },
    Blurred { field: String },
    AsyncChecked { field: String, error: Option<String> },
    SubmitBlocked { error: FieldError },
    Submitted,
    SubmitFailed { reason: String },
    Closed,
}

/// Why a change event did not touch the value set
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum EditRejection {
    Locked,
    PatternMismatch,
}
