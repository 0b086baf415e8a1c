//! Engine Configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::value_objects::TenantId;
use crate::error::{FormsError, Result};

/// When async validators run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AsyncTrigger {
    #[default]
    Blur,
    Change,
}

impl FromStr for AsyncTrigger {
    type Err = FormsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "blur" => Ok(Self::Blur),
            "change" => Ok(Self::Change),
            other => Err(FormsError::Config(format!("unknown async trigger: {other}"))),
        }
    }
}

/// Form engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Async validation trigger
    pub async_trigger: AsyncTrigger,
    /// Delay before an async validator is invoked
    pub debounce_ms: u64,
    /// Tenant used for cached option search
    pub tenant_id: Option<TenantId>,
    /// Max options returned by a search
    pub search_limit: usize,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            async_trigger: AsyncTrigger::Blur,
            debounce_ms: 500,
            tenant_id: None,
            search_limit: 20,
        }
    }
}

impl FormConfig {
    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply `GYM_FORMS_*` environment overrides
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ms) = lookup("GYM_FORMS_DEBOUNCE_MS") {
            self.debounce_ms = ms
                .trim()
                .parse()
                .map_err(|_| FormsError::Config(format!("invalid GYM_FORMS_DEBOUNCE_MS: {ms}")))?;
        }
        if let Some(trigger) = lookup("GYM_FORMS_ASYNC_TRIGGER") {
            self.async_trigger = trigger.parse()?;
        }
        if let Some(tenant) = lookup("GYM_FORMS_TENANT_ID") {
            self.tenant_id = Some(TenantId::new(tenant));
        }
        Ok(self)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn with_trigger(mut self, trigger: AsyncTrigger) -> Self {
        self.async_trigger = trigger;
        self
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    pub fn with_tenant(mut self, tenant: TenantId) -> Self {
        self.tenant_id = Some(tenant);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = FormConfig::default();
        assert_eq!(config.async_trigger, AsyncTrigger::Blur);
        assert_eq!(config.debounce(), Duration::from_millis(500));
    }

    #[test]
    fn test_partial_json() {
        let config: FormConfig = serde_json::from_str(r#"{"async_trigger":"change"}"#).unwrap();
        assert_eq!(config.async_trigger, AsyncTrigger::Change);
        assert_eq!(config.debounce_ms, 500);
        assert_eq!(config.search_limit, 20);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("GYM_FORMS_DEBOUNCE_MS", "250"),
            ("GYM_FORMS_ASYNC_TRIGGER", "Change"),
            ("GYM_FORMS_TENANT_ID", "gym-7"),
        ]
        .into_iter()
        .collect();
        let config = FormConfig::default()
            .with_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.debounce_ms, 250);
        assert_eq!(config.async_trigger, AsyncTrigger::Change);
        assert_eq!(config.tenant_id, Some(TenantId::new("gym-7")));
    }

    #[test]
    fn test_bad_override() {
        let err = FormConfig::default()
            .with_overrides(|k| (k == "GYM_FORMS_DEBOUNCE_MS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, FormsError::Config(_)));
    }
}
