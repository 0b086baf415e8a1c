//! Output formatting

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn print<T: Serialize + Tabled>(&self, rows: &[T]) -> Result<()> {
        match self {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(rows)?),
            OutputFormat::Table => println!("{}", Table::new(rows).with(Style::rounded())),
        }
        Ok(())
    }
}
