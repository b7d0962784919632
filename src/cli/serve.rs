use anyhow::Result;
use clap::Args;
use std::path::Path;
use tracing::info;

use super::load_config;
use crate::server::{Site, serve};

/// Serve the site over HTTP until interrupted.
///
/// Send `SIGHUP` to the process to recompile all templates and layouts.
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to listen on, overriding `listen` from the config file
    #[arg(short, long, value_name = "ADDR")]
    pub listen: Option<String>,
}

impl ServeCommand {
    pub async fn execute(self, config_path: &Path) -> Result<()> {
        let config = load_config(config_path).await?;
        let listen = self.listen.unwrap_or_else(|| config.listen.clone());

        let site = Site::build(&config).await?;
        info!(config = %config_path.display(), pages = site.handlers().len(), "Site ready");
        serve(site, &listen).await
    }
}
