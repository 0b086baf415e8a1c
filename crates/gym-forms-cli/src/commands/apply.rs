//! Apply command

use anyhow::Result;
use colored::Colorize;
use gym_forms::{FormConfig, FormEvent};

use super::{apply_edits, no_submit, open_engine, value_rows};
use crate::{output::OutputFormat, FormArgs};

pub fn handle(args: FormArgs, config: FormConfig, format: OutputFormat) -> Result<()> {
    let engine = open_engine(&args, config, no_submit)?;
    apply_edits(&engine, &args.edits)?;

    for event in engine.take_events() {
        if let FormEvent::ValueChanged { field, derived } = event {
            if !derived.is_empty() {
                eprintln!("{} {} -> {}", "derived:".cyan(), field, derived.join(", "));
            }
        }
    }
    for (field, message) in engine.errors() {
        eprintln!("{} {}: {}", "invalid:".red(), field, message);
    }

    format.print(&value_rows(&engine.values()))
}
