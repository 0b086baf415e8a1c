//! Ports module
//!
//! Capabilities the caller hands to the form engine.

pub mod outbound;

pub use outbound::{AsyncValidator, OptionSearch, SubmitHandler};
