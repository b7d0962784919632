use anyhow::{Result, bail};
use clap::{Args, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::load_config;
use crate::broker::{ArtifactId, ArtifactKind};
use crate::config::Config;
use crate::server::{axum_route, site_compiler};

/// Output format of `check`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Compile every template and layout and verify every page.
///
/// Unlike `serve`, which stops at the first broken template, `check` reports
/// every failure.
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Result of a check, as printed with `--format json`.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct CheckResults {
    pub valid: bool,
    pub templates: usize,
    pub layouts: usize,
    pub pages: Vec<PageSummary>,
    pub errors: Vec<String>,
}

/// One checked page.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PageSummary {
    pub name: String,
    pub route: String,
    pub topic: String,
    pub source: String,
}

impl CheckCommand {
    pub async fn execute(self, config_path: &Path) -> Result<()> {
        let config = load_config(config_path).await?;
        let results = check_config(&config);

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
            OutputFormat::Text => print_text(&results),
        }

        if !results.valid {
            bail!("{} of the site's templates failed to compile", results.errors.len());
        }
        Ok(())
    }
}

/// Compile everything `config` declares, collecting every failure.
pub fn check_config(config: &Config) -> CheckResults {
    let compiler = site_compiler(config);
    let mut results = CheckResults::default();

    let declared = config
        .templates
        .iter()
        .map(|(name, path)| (ArtifactId::template(name), path))
        .chain(config.layouts.iter().map(|(name, path)| (ArtifactId::layout(name), path)));

    let mut sources = BTreeMap::new();
    for (id, path) in declared {
        let path = config.resolve_path(path);
        match std::fs::read_to_string(&path) {
            Ok(source) => {
                sources.insert(id, source);
            }
            Err(e) => results.errors.push(format!("{id}: cannot read {}: {e}", path.display())),
        }
    }

    let kinds = [
        (ArtifactKind::Template, &mut results.templates),
        (ArtifactKind::Layout, &mut results.layouts),
    ];
    for (kind, count) in kinds {
        let batch = compiler.compile_batch(
            sources
                .iter()
                .filter(|(id, _)| id.kind == kind)
                .map(|(id, source)| (id.name.as_str(), source.as_str())),
        );
        for (name, result) in batch {
            match result {
                Ok(_) => *count += 1,
                Err(e) => results.errors.push(format!("{kind} '{name}': {e}")),
            }
        }
    }

    for page in &config.pages {
        results.pages.push(PageSummary {
            name: page.display_name().to_string(),
            route: axum_route(&page.url_pattern),
            topic: page.topic().to_string(),
            source: page.backend().unwrap_or("static").to_string(),
        });
    }

    results.valid = results.errors.is_empty();
    results
}

fn print_text(results: &CheckResults) {
    println!("{} {} templates, {} layouts compiled", "✓".green(), results.templates, results.layouts);
    for page in &results.pages {
        println!("  {} {} -> {} [{}]", page.route.cyan(), page.name, page.topic, page.source);
    }
    for error in &results.errors {
        println!("{} {}", "✗".red(), error);
    }
}
