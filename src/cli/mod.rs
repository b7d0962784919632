//! Command-line interface for pagesmith.
//!
//! ```text
//! pagesmith [--verbose | --quiet] [--config <path>] <command>
//!
//! Commands:
//!   serve    Serve the site over HTTP
//!   check    Compile every template and verify every page
//!   render   Render one page to stdout
//! ```
//!
//! Every command starts by loading the configuration file (`pagesmith.toml`
//! in the working directory unless `--config` says otherwise). Errors are
//! returned to `main`, which prints them through
//! [`user_friendly_error`](crate::core::user_friendly_error).

mod check;
mod render;
mod serve;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::constants::DEFAULT_CONFIG_FILE;
use crate::core::PagesmithError;

pub use check::{CheckCommand, CheckResults, OutputFormat, PageSummary, check_config};
pub use render::RenderCommand;
pub use serve::ServeCommand;

/// Settings derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Default log filter; `RUST_LOG` takes precedence
    pub log_level: String,
    /// Configuration file to load
    pub config_path: PathBuf,
}

impl CliConfig {
    /// Install the global tracing subscriber.
    ///
    /// Logs go to stderr so `render` output on stdout stays clean.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("pagesmith={}", self.log_level)));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

#[derive(Parser)]
#[command(
    name = "pagesmith",
    about = "Render handlebars pages from static or backend JSON data",
    version,
    long_about = "pagesmith serves HTML pages rendered from handlebars templates. Each page \
                  takes its data from a fixed payload or from a JSON backend, and templates \
                  are recompiled without a restart on SIGHUP."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the site over HTTP
    Serve(ServeCommand),

    /// Compile every template and layout and verify every page
    Check(CheckCommand),

    /// Render one page to stdout
    Render(RenderCommand),
}

impl Cli {
    /// Run the selected command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(config).await
    }

    /// Translate the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        };

        CliConfig {
            log_level: log_level.to_string(),
            config_path: self.config.clone(),
        }
    }

    /// Run the selected command with an explicit configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        match self.command {
            Commands::Serve(cmd) => cmd.execute(&config.config_path).await,
            Commands::Check(cmd) => cmd.execute(&config.config_path).await,
            Commands::Render(cmd) => cmd.execute(&config.config_path).await,
        }
    }
}

/// Load the configuration file, reporting a missing file distinctly.
pub(crate) async fn load_config(path: &Path) -> Result<Config> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(PagesmithError::ConfigNotFound {
            path: path.display().to_string(),
        }
        .into());
    }
    Config::load_from(path).await
}
