//! Validate command

use anyhow::{Context, Result};
use colored::Colorize;
use gym_forms::FormDefinition;
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

use crate::output::OutputFormat;

#[derive(Debug, Serialize, Tabled)]
pub struct FieldRow {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    #[tabled(rename = "type")]
    pub kind: &'static str,
    pub required: bool,
    pub locked: bool,
}

pub fn handle(path: &Path, format: OutputFormat) -> Result<()> {
    let definition = FormDefinition::load(path)
        .with_context(|| format!("loading definition {}", path.display()))?;

    let rows: Vec<FieldRow> = definition
        .fields
        .iter()
        .map(|field| FieldRow {
            name: field.name.clone(),
            label: field.label.clone(),
            kind: field.kind.type_name(),
            required: field.required,
            locked: field.disabled || definition.locked.contains(&field.name),
        })
        .collect();

    format.print(&rows)?;
    eprintln!(
        "{} {} ({} fields)",
        "valid:".green().bold(),
        definition.title.as_deref().unwrap_or("form"),
        rows.len()
    );
    Ok(())
}
