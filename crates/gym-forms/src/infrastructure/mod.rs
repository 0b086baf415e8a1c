//! Infrastructure module
//!
//! Concrete adapters for the outbound ports.

pub mod option_cache;

pub use option_cache::CachedOptionIndex;
