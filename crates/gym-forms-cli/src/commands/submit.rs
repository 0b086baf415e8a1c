//! Submit command

use anyhow::{anyhow, bail, Result};
use colored::Colorize;
use gym_forms::{FormConfig, SubmitOutcome, ValueSet};
use tokio::sync::mpsc;

use super::{apply_edits, open_engine, value_rows};
use crate::{output::OutputFormat, FormArgs};

pub async fn handle(args: FormArgs, config: FormConfig, format: OutputFormat) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<ValueSet>();
    let engine = open_engine(&args, config, move |values: ValueSet| {
        let tx = tx.clone();
        async move {
            tx.send(values).map_err(|_| anyhow!("submit receiver closed"))
        }
    })?;
    apply_edits(&engine, &args.edits)?;

    match engine.submit().await? {
        SubmitOutcome::Submitted => {
            let values = rx.try_recv().map_err(|_| anyhow!("submit handler did not run"))?;
            format.print(&value_rows(&values))?;
            eprintln!("{} {} fields", "submitted:".green().bold(), values.len());
            Ok(())
        }
        SubmitOutcome::Blocked(error) => {
            bail!("submit blocked on {}: {}", error.field, error.message)
        }
    }
}
