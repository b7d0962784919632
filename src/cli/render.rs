use anyhow::{Context, Result, anyhow};
use clap::Args;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::load_config;
use crate::core::PagesmithError;
use crate::generator::PageRequest;
use crate::server::Site;

/// Render one page to stdout.
///
/// Without `--data` the page produces its data the way the server would:
/// from its fixed payload, or by querying its backend with the given
/// `--param` values.
#[derive(Args, Debug)]
pub struct RenderCommand {
    /// Name of the page to render
    pub page: String,

    /// JSON file to render the page with instead of its own data
    #[arg(long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Path parameter for the backend URL, as NAME=VALUE
    #[arg(long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,
}

impl RenderCommand {
    pub async fn execute(self, config_path: &Path) -> Result<()> {
        let config = load_config(config_path).await?;
        if config.page(&self.page).is_none() {
            return Err(PagesmithError::PageNotFound {
                name: self.page,
            }
            .into());
        }

        let site = Site::build(&config).await?;
        let handler = site
            .handler(&self.page)
            .ok_or_else(|| anyhow!("No handler started for page '{}'", self.page))?;

        let body = match &self.data {
            Some(path) => {
                let content = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read data file: {}", path.display()))?;
                let data: Value = serde_json::from_str(&content)
                    .with_context(|| format!("Invalid JSON in {}", path.display()))?;
                handler.renderer().render_to_vec(&data)?
            }
            None => {
                let request = self
                    .params
                    .iter()
                    .fold(PageRequest::new(), |request, (name, value)| request.with_param(name, value));
                handler.handle(&request).await?.body
            }
        };

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&body)?;
        stdout.flush()?;
        Ok(())
    }
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{raw}'")),
    }
}
