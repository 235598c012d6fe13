use crate::config;
use crate::kernel::Kernel;
use crate::logging;
use crate::research::ReportType;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::{json, Value};

/// gptr - research kernel that dispatches commands to plugins
#[derive(Parser, Debug)]
#[command(name = "gptr")]
#[command(version)]
#[command(about = "Research kernel that dispatches commands to plugins", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Conduct research on a query
    Research(ResearchCommand),

    /// Manage configuration
    Config {
        #[arg(value_enum)]
        action: ConfigAction,

        /// Configuration key
        key: Option<String>,

        /// Configuration value
        value: Option<String>,
    },

    /// Any other command is looked up in the plugin registry
    #[command(external_subcommand)]
    External(Vec<String>),
}

#[derive(clap::Args, Debug, Clone, Serialize)]
pub struct ResearchCommand {
    /// Research query
    pub query: String,

    /// Report type
    #[arg(long, value_enum, default_value_t = ReportType::ResearchReport)]
    pub report_type: ReportType,

    /// Report tone
    #[arg(long, default_value = "objective")]
    pub tone: String,

    /// Domains to search
    #[arg(long, num_args = 0..)]
    pub domains: Vec<String>,

    /// Simulate without API calls
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigAction {
    Show,
    Set,
    Get,
}

impl Command {
    /// Command name and plugin args for the kernel
    pub fn into_dispatch(self) -> Result<(String, Value)> {
        match self {
            Command::Research(research) => {
                let args = serde_json::to_value(&research).context("Failed to encode research args")?;
                Ok(("research".to_string(), args))
            }
            Command::Config { action, key, value } => Ok((
                "config".to_string(),
                json!({ "action": action, "key": key, "value": value }),
            )),
            Command::External(mut argv) => {
                // clap guarantees the command name is present
                let name = if argv.is_empty() {
                    String::new()
                } else {
                    argv.remove(0)
                };
                Ok((name, json!({ "argv": argv })))
            }
        }
    }
}

/// Parse the command line, run the command, return the exit code
pub async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let (config, settings_error) = config::load_or_defaults(|key| std::env::var(key).ok());
    let log_file = std::env::var("GPTR_LOG_FILE").ok();
    let _log_guard = logging::init(&config.log_level, log_file.as_deref())?;
    if let Some(e) = settings_error {
        tracing::warn!(error = %format!("{e:#}"), "ignoring settings file, using defaults");
    }

    let kernel = Kernel::bootstrap(config, |key| std::env::var(key).ok());
    let (command, args) = cli.command.into_dispatch()?;

    tracing::info!(command = %command, "running command");

    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    let code = kernel
        .dispatch(&command, args, &mut stdout.lock(), &mut stderr.lock())
        .await;

    Ok(code)
}
