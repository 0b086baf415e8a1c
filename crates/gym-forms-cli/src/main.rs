//! gymform CLI
//!
//! Drives gym back-office form definitions from the command line.
//!
//! # Usage
//!
//! ```bash
//! gymform validate pago.json
//! gymform visible pago.json --values pago-edit.json
//! gymform apply pago.json --set origen=plan --set metodo_pago=Efectivo --set plan_id=1
//! gymform submit alumno.json --set nombre="ana lópez" --set dni=1234567 --format json
//! ```

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;

#[derive(Parser)]
#[command(name = "gymform")]
#[command(version)]
#[command(about = "Gym back-office form engine", long_about = None)]
struct Cli {
    /// Tenant (gym) used for option search
    #[arg(long, env = "GYMFORM_TENANT_ID")]
    tenant_id: Option<String>,

    /// Engine configuration file (JSON)
    #[arg(long, env = "GYM_FORMS_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short)]
    format: Option<output::OutputFormat>,

    /// Profile name from config file
    #[arg(long, short)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a form definition and list its fields
    Validate {
        /// Form definition (JSON)
        definition: PathBuf,
    },
    /// Show the fields visible for a set of values
    Visible(FormArgs),
    /// Apply a sequence of edits and print the resulting values
    Apply(FormArgs),
    /// Apply edits, then run submit validation
    Submit(FormArgs),
}

#[derive(Args)]
pub struct FormArgs {
    /// Form definition (JSON)
    pub definition: PathBuf,

    /// Existing values (JSON object); opens the form in edit mode
    #[arg(long)]
    pub values: Option<PathBuf>,

    /// Edits applied in order, as `field=value`
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    pub edits: Vec<String>,
}

/// `RUST_LOG`, or `info` when unset
fn log_directive(rust_log: Option<String>) -> String {
    rust_log.unwrap_or_else(|| "info".into())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(log_directive(
            std::env::var("RUST_LOG").ok(),
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let profile = match config::Config::load(cli.profile.as_deref()) {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable profile");
            config::Config::default()
        }
    };
    let format = cli
        .format
        .or_else(|| profile.format())
        .unwrap_or(output::OutputFormat::Table);
    let tenant_id = cli.tenant_id.or(profile.tenant_id);

    let result = match commands::engine_config(cli.config.as_deref(), tenant_id) {
        Ok(engine_config) => match cli.command {
            Commands::Validate { definition } => commands::validate::handle(&definition, format),
            Commands::Visible(args) => commands::visible::handle(args, engine_config, format),
            Commands::Apply(args) => commands::apply::handle(args, engine_config, format),
            Commands::Submit(args) => commands::submit::handle(args, engine_config, format).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
