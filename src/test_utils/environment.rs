//! A site written to disk by [`SiteFixture`](super::SiteFixture).

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::Config;

/// A temporary site directory; deleted on drop.
#[derive(Debug)]
pub struct TestSite {
    dir: TempDir,
    config_path: PathBuf,
}

impl TestSite {
    pub(crate) fn new(dir: TempDir, config_path: PathBuf) -> Self {
        Self {
            dir,
            config_path,
        }
    }

    /// Root directory of the site.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the generated `pagesmith.toml`.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the site's configuration the way the CLI does.
    pub async fn config(&self) -> Result<Config> {
        Config::load_from(&self.config_path).await
    }

    /// Overwrite (or create) `templates/<name>.hbs`.
    pub fn write_template(&self, name: &str, source: &str) -> Result<()> {
        self.write("templates", name, source)
    }

    /// Overwrite (or create) `layouts/<name>.hbs`.
    pub fn write_layout(&self, name: &str, source: &str) -> Result<()> {
        self.write("layouts", name, source)
    }

    /// Overwrite (or create) `partials/<name>.hbs`.
    pub fn write_partial(&self, name: &str, source: &str) -> Result<()> {
        self.write("partials", name, source)
    }

    fn write(&self, dir: &str, name: &str, source: &str) -> Result<()> {
        let path = self.dir.path().join(dir).join(format!("{name}.hbs"));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, source).with_context(|| format!("Failed to write {}", path.display()))
    }
}
