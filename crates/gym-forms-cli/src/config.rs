//! CLI Configuration

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::output::OutputFormat;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    pub tenant_id: Option<String>,
    pub default_format: Option<String>,
}

impl Config {
    pub fn load(profile: Option<&str>) -> Result<Self> {
        let path = Self::config_path(profile)?;
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Default output format, if the profile names a known one
    pub fn format(&self) -> Option<OutputFormat> {
        self.default_format
            .as_deref()
            .and_then(|f| OutputFormat::from_str(f, true).ok())
    }

    fn config_path(profile: Option<&str>) -> Result<PathBuf> {
        let home = dirs::home_dir().context("Cannot find home directory")?;
        Ok(home.join(".gymform").join(Self::file_name(profile)))
    }

    fn file_name(profile: Option<&str>) -> String {
        match profile {
            Some(p) => format!("config.{}.toml", p),
            None => "config.toml".to_string(),
        }
    }
}
