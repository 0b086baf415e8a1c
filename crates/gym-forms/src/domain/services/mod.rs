//! Domain services
//!
//! Stateless functions the form aggregate orchestrates.

pub mod derivation;
pub mod search;
pub mod validation;
pub mod visibility;
