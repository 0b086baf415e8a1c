//! Outbound ports
//!
//! Everything the engine needs from the outside world: remote checks, the
//! submit call and cached option lookups. Closures implement each trait, so
//! callers rarely need a named type.

use async_trait::async_trait;
use std::future::Future;

use crate::domain::value_objects::{FieldValue, SelectOption, TenantId, ValueSet};

/// Asynchronous field check, e.g. a remote duplicate-DNI lookup.
///
/// `Ok(Some(message))` marks the field invalid. An `Err` is treated as
/// "no error" by the engine.
#[async_trait]
pub trait AsyncValidator: Send + Sync {
    async fn validate(&self, value: FieldValue, values: ValueSet) -> anyhow::Result<Option<String>>;
}

#[async_trait]
impl<F, Fut> AsyncValidator for F
where
    F: Fn(FieldValue, ValueSet) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Option<String>>> + Send + 'static,
{
    async fn validate(&self, value: FieldValue, values: ValueSet) -> anyhow::Result<Option<String>> {
        (self)(value, values).await
    }
}

/// Receives the trimmed value set on submit
#[async_trait]
pub trait SubmitHandler: Send + Sync {
    async fn submit(&self, values: ValueSet) -> anyhow::Result<()>;
}

#[async_trait]
impl<F, Fut> SubmitHandler for F
where
    F: Fn(ValueSet) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn submit(&self, values: ValueSet) -> anyhow::Result<()> {
        (self)(values).await
    }
}

/// Read-only option lookup for search-select fields: (tenant, query) ->
/// ranked options
pub trait OptionSearch: Send + Sync {
    fn search(&self, tenant: &TenantId, query: &str) -> Vec<SelectOption>;
}

impl<F> OptionSearch for F
where
    F: Fn(&TenantId, &str) -> Vec<SelectOption> + Send + Sync,
{
    fn search(&self, tenant: &TenantId, query: &str) -> Vec<SelectOption> {
        (self)(tenant, query)
    }
}
