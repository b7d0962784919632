//! Builder for on-disk test sites.

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::environment::TestSite;
use crate::config::{Config, Page};
use crate::constants::DEFAULT_CONFIG_FILE;

/// Describes a site to write into a temporary directory.
///
/// Templates land in `templates/<name>.hbs`, layouts in
/// `layouts/<name>.hbs`, partials in `partials/<name>.hbs` and
/// static text files in `static/`. The generated `pagesmith.toml` references
/// them with paths relative to the site root.
#[derive(Debug, Clone, Default)]
pub struct SiteFixture {
    templates: BTreeMap<String, String>,
    layouts: BTreeMap<String, String>,
    partials: BTreeMap<String, String>,
    static_txt: BTreeMap<String, String>,
    not_found: Option<String>,
    server_error: Option<String>,
    pages: Vec<Page>,
}

impl SiteFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template.
    pub fn template(mut self, name: &str, source: &str) -> Self {
        self.templates.insert(name.to_string(), source.to_string());
        self
    }

    /// Add a layout.
    pub fn layout(mut self, name: &str, source: &str) -> Self {
        self.layouts.insert(name.to_string(), source.to_string());
        self
    }

    /// Add a partial file.
    pub fn partial(mut self, name: &str, source: &str) -> Self {
        self.partials.insert(name.to_string(), source.to_string());
        self
    }

    /// Serve `content` verbatim at `route`.
    pub fn static_txt(mut self, route: &str, content: &str) -> Self {
        self.static_txt.insert(route.to_string(), content.to_string());
        self
    }

    /// Replace the built-in 404 page.
    pub fn not_found(mut self, body: &str) -> Self {
        self.not_found = Some(body.to_string());
        self
    }

    /// Replace the built-in 500 page.
    pub fn server_error(mut self, body: &str) -> Self {
        self.server_error = Some(body.to_string());
        self
    }

    /// Add a fully specified page.
    pub fn page(mut self, page: Page) -> Self {
        self.pages.push(page);
        self
    }

    /// Add a page rendering `template` with a fixed payload.
    pub fn static_page(self, name: &str, url_pattern: &str, template: &str, extra: Value) -> Self {
        self.page(Page {
            name: name.to_string(),
            url_pattern: url_pattern.to_string(),
            template: template.to_string(),
            extra,
            ..Default::default()
        })
    }

    /// Add a page rendering `template` with data from `backend`.
    pub fn backend_page(self, name: &str, url_pattern: &str, template: &str, backend: &str) -> Self {
        self.page(Page {
            name: name.to_string(),
            url_pattern: url_pattern.to_string(),
            template: template.to_string(),
            backend: Some(backend.to_string()),
            ..Default::default()
        })
    }

    /// Write the site into a fresh temporary directory.
    pub fn build(self) -> Result<TestSite> {
        let dir = TempDir::new().context("Failed to create temp dir")?;
        let root = dir.path();

        let mut config = Config::default();
        for (name, source) in &self.templates {
            let path = write_source(root, "templates", &format!("{name}.hbs"), source)?;
            config.templates.insert(name.clone(), path);
        }
        for (name, source) in &self.layouts {
            let path = write_source(root, "layouts", &format!("{name}.hbs"), source)?;
            config.layouts.insert(name.clone(), path);
        }
        for (name, source) in &self.partials {
            write_source(root, "partials", &format!("{name}.hbs"), source)?;
        }
        config.partials_dir = Some(PathBuf::from("partials"));
        fs::create_dir_all(root.join("partials"))?;

        for (index, (route, content)) in self.static_txt.iter().enumerate() {
            let path = write_source(root, "static", &format!("{index}.txt"), content)?;
            config.static_txt.insert(route.clone(), path);
        }
        if let Some(body) = &self.not_found {
            config.errors.not_found = Some(write_source(root, "static", "404.html", body)?);
        }
        if let Some(body) = &self.server_error {
            config.errors.server_error = Some(write_source(root, "static", "500.html", body)?);
        }
        config.pages = self.pages;

        let toml = toml::to_string(&config).context("Failed to serialize test config")?;
        let config_path = root.join(DEFAULT_CONFIG_FILE);
        fs::write(&config_path, toml)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;

        Ok(TestSite::new(dir, config_path))
    }
}

/// Write `content` to `<root>/<dir>/<file>` and return the relative path.
fn write_source(root: &Path, dir: &str, file: &str, content: &str) -> Result<PathBuf> {
    let relative = Path::new(dir).join(file);
    let path = root.join(&relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(relative)
}
