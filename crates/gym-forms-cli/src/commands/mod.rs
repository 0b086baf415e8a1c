//! CLI Commands

pub mod apply;
pub mod submit;
pub mod validate;
pub mod visible;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use gym_forms::{
    ChangeOutcome, FormConfig, FormDefinition, FormEngine, SubmitHandler, TenantId, ValueSet,
};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tabled::Tabled;

use crate::FormArgs;

/// Engine config: file (if any), then `GYM_FORMS_*` env, then tenant flag
pub fn engine_config(path: Option<&Path>, tenant_id: Option<String>) -> Result<FormConfig> {
    let config = match path {
        Some(path) => FormConfig::load(path)
            .with_context(|| format!("loading engine config {}", path.display()))?,
        None => FormConfig::default(),
    };
    let config = config.with_env_overrides()?;
    Ok(match tenant_id {
        Some(tenant) => config.with_tenant(TenantId::new(tenant)),
        None => config,
    })
}

/// Build an engine from a definition file and open it
pub fn open_engine<H>(args: &FormArgs, config: FormConfig, submit: H) -> Result<FormEngine>
where
    H: SubmitHandler + 'static,
{
    let definition = FormDefinition::load(&args.definition)
        .with_context(|| format!("loading definition {}", args.definition.display()))?;
    let engine = definition.into_builder().config(config).build(submit)?;

    match &args.values {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading values {}", path.display()))?;
            let values: ValueSet = serde_json::from_str(&content)
                .with_context(|| format!("parsing values {}", path.display()))?;
            engine.open_edit(values)?;
        }
        None => engine.open_create()?,
    }
    Ok(engine)
}

/// Submit handler for commands that never submit
pub async fn no_submit(_values: ValueSet) -> anyhow::Result<()> {
    bail!("this command does not submit")
}

/// Apply `field=value` edits in order, blurring each field after its edit
pub fn apply_edits(engine: &FormEngine, edits: &[String]) -> Result<()> {
    for edit in edits {
        let (field, value) = parse_assignment(edit)?;
        match engine.change(field, value)? {
            ChangeOutcome::Applied(_) => {}
            ChangeOutcome::Locked => {
                eprintln!("{} {} is read-only", "skipped:".yellow(), field);
            }
            ChangeOutcome::Rejected => {
                eprintln!("{} {:?} does not match the format of {}", "rejected:".yellow(), value, field);
            }
        }
        engine.blur(field)?;
    }
    Ok(())
}

fn parse_assignment(edit: &str) -> Result<(&str, &str)> {
    match edit.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => Ok((field.trim(), value)),
        _ => bail!("expected FIELD=VALUE, got {edit:?}"),
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct ValueRow {
    pub field: String,
    pub value: String,
}

pub fn value_rows(values: &ValueSet) -> Vec<ValueRow> {
    values
        .iter()
        .map(|(field, value)| ValueRow {
            field: field.clone(),
            value: value.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gym_forms::FieldValue;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("dni=1234567").unwrap(), ("dni", "1234567"));
        assert_eq!(parse_assignment("nota=a=b").unwrap(), ("nota", "a=b"));
        assert_eq!(parse_assignment("email=").unwrap(), ("email", ""));
        assert!(parse_assignment("dni").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn test_value_rows() {
        let values: ValueSet = [("nombre", FieldValue::from("Ana")), ("edad", FieldValue::Null)]
            .into_iter()
            .collect();
        let rows = value_rows(&values);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].field, "edad");
        assert_eq!(rows[0].value, "");
        assert_eq!(rows[1].value, "Ana");
    }
}
