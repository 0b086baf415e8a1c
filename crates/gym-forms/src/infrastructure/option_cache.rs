//! In-memory option cache
//!
//! Holds the option lists the surrounding app already fetched (alumnos,
//! planes, productos) per tenant, and answers ranked lookups from them.

use dashmap::DashMap;
use tracing::debug;

use crate::domain::services::search::rank_options;
use crate::domain::value_objects::{SelectOption, TenantId};
use crate::ports::outbound::OptionSearch;

const DEFAULT_LIMIT: usize = 20;

/// Per-tenant option cache
#[derive(Debug)]
pub struct CachedOptionIndex {
    entries: DashMap<TenantId, Vec<SelectOption>>,
    limit: usize,
}

impl CachedOptionIndex {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: DashMap::new(),
            limit,
        }
    }

    /// Replace the cached options of a tenant
    pub fn load(&self, tenant: TenantId, options: Vec<SelectOption>) {
        debug!(tenant = %tenant, count = options.len(), "caching options");
        self.entries.insert(tenant, options);
    }

    pub fn invalidate(&self, tenant: &TenantId) {
        self.entries.remove(tenant);
    }

    pub fn len(&self, tenant: &TenantId) -> usize {
        self.entries.get(tenant).map(|e| e.len()).unwrap_or(0)
    }
}

impl Default for CachedOptionIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionSearch for CachedOptionIndex {
    fn search(&self, tenant: &TenantId, query: &str) -> Vec<SelectOption> {
        match self.entries.get(tenant) {
            Some(options) => rank_options(&options, query, self.limit),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenants_are_isolated() {
        let index = CachedOptionIndex::new();
        let gym_a = TenantId::new("gym-a");
        let gym_b = TenantId::new("gym-b");
        index.load(gym_a.clone(), vec![SelectOption::new("Lucía Fernández", 10)]);
        index.load(gym_b.clone(), vec![SelectOption::new("Lucas Ruiz", 20)]);

        let found = index.search(&gym_a, "luc");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "Lucía Fernández");
        assert!(index.search(&TenantId::new("gym-c"), "luc").is_empty());
    }

    #[test]
    fn test_limit_and_invalidate() {
        let index = CachedOptionIndex::with_limit(2);
        let gym = TenantId::new("gym");
        index.load(
            gym.clone(),
            (1..=5).map(|i| SelectOption::new(format!("Alumno {i}"), i)).collect(),
        );
        assert_eq!(index.search(&gym, "alumno").len(), 2);
        assert_eq!(index.len(&gym), 5);

        index.invalidate(&gym);
        assert!(index.search(&gym, "alumno").is_empty());
    }
}
