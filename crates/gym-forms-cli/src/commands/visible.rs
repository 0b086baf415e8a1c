//! Visible command

use anyhow::Result;
use gym_forms::{FormConfig, RenderedField};
use serde::Serialize;
use tabled::Tabled;

use super::{apply_edits, no_submit, open_engine};
use crate::{output::OutputFormat, FormArgs};

#[derive(Debug, Serialize, Tabled)]
pub struct VisibleRow {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    #[tabled(rename = "type")]
    pub kind: &'static str,
    pub row: u16,
    pub column: u16,
    pub value: String,
    pub read_only: bool,
    pub status: String,
}

impl From<RenderedField> for VisibleRow {
    fn from(field: RenderedField) -> Self {
        let status = match (field.state.invalid, field.state.helper_text) {
            (true, Some(message)) => format!("error: {message}"),
            (true, None) => "error".to_string(),
            (false, Some(helper)) => helper,
            (false, None) => String::new(),
        };
        Self {
            name: field.name,
            label: field.label,
            kind: field.kind,
            row: field.placement.row,
            column: field.placement.column,
            value: field.value.to_string(),
            read_only: field.read_only,
            status,
        }
    }
}

pub fn handle(args: FormArgs, config: FormConfig, format: OutputFormat) -> Result<()> {
    let engine = open_engine(&args, config, no_submit)?;
    apply_edits(&engine, &args.edits)?;

    let rows: Vec<VisibleRow> = engine.render_plan().into_iter().map(VisibleRow::from).collect();
    format.print(&rows)
}
