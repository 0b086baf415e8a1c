//! Form definitions
//!
//! The serializable part of a form: fields, layout and locked names.
//! Behaviour hooks (custom rules, blur hooks, async validators, option
//! search) are attached in code after loading.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::domain::aggregates::{FormBuilder, FormEngine};
use crate::domain::descriptor::{FieldDescriptor, Layout};
use crate::error::{FormsError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub locked: Vec<String>,
}

impl FormDefinition {
    pub fn from_json(json: &str) -> Result<Self> {
        let definition: Self = serde_json::from_str(json)?;
        definition.check()?;
        Ok(definition)
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Names must be unique; layout and locked entries must name fields
    pub fn check(&self) -> Result<()> {
        let mut names = HashSet::new();
        for field in &self.fields {
            if !names.insert(field.name.as_str()) {
                return Err(FormsError::InvalidDefinition(format!(
                    "duplicate field name: {}",
                    field.name
                )));
            }
        }
        if let Some(unknown) = self.layout.names().find(|n| !names.contains(n.as_str())) {
            return Err(FormsError::InvalidDefinition(format!(
                "layout references unknown field: {unknown}"
            )));
        }
        if let Some(unknown) = self.locked.iter().find(|n| !names.contains(n.as_str())) {
            return Err(FormsError::InvalidDefinition(format!(
                "locked list references unknown field: {unknown}"
            )));
        }
        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Engine builder with fields, layout and locked names applied
    pub fn into_builder(self) -> FormBuilder {
        FormEngine::builder(self.fields)
            .layout(self.layout)
            .locked(self.locked)
    }
}
