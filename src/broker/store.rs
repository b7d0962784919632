//! Compiled templates and layouts, keyed by their configured names.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::Topic;
use crate::config::Config;
use crate::templating::{Compiler, Renderer, Template, TemplateError};

/// Namespace of a compiled artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    /// Declared under `[templates]`
    Template,
    /// Declared under `[layouts]`
    Layout,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template => f.write_str("template"),
            Self::Layout => f.write_str("layout"),
        }
    }
}

/// Identifies one compiled artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactId {
    pub kind: ArtifactKind,
    pub name: String,
}

impl ArtifactId {
    pub fn template(name: impl Into<String>) -> Self {
        Self {
            kind: ArtifactKind::Template,
            name: name.into(),
        }
    }

    pub fn layout(name: impl Into<String>) -> Self {
        Self {
            kind: ArtifactKind::Layout,
            name: name.into(),
        }
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.name)
    }
}

/// Outcome of recompiling artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadReport {
    /// Artifacts compiled successfully and now live
    pub recompiled: Vec<ArtifactId>,
    /// Artifacts that failed and kept their previous version, with the error
    pub failed: Vec<(ArtifactId, String)>,
    /// Requested names matching no artifact
    pub unknown: Vec<String>,
    /// Topics whose renderer was rebuilt and broadcast
    pub rebuilt: Vec<Topic>,
}

impl ReloadReport {
    /// Whether every requested artifact recompiled.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.unknown.is_empty()
    }
}

#[derive(Debug)]
struct Artifact {
    path: PathBuf,
    compiled: Arc<Template>,
}

/// Every declared template and layout in compiled form.
#[derive(Debug)]
pub struct TemplateStore {
    compiler: Compiler,
    artifacts: BTreeMap<ArtifactId, Artifact>,
}

impl TemplateStore {
    /// Compile every template and layout declared in `config`.
    ///
    /// # Errors
    ///
    /// Fails on the first artifact that cannot be read or compiled; a site
    /// never starts with a broken template.
    pub fn load(config: &Config, compiler: Compiler) -> Result<Self, TemplateError> {
        let sources = config
            .templates
            .iter()
            .map(|(name, path)| (ArtifactId::template(name), config.resolve_path(path)))
            .chain(
                config
                    .layouts
                    .iter()
                    .map(|(name, path)| (ArtifactId::layout(name), config.resolve_path(path))),
            );
        Self::from_sources(compiler, sources)
    }

    /// Compile artifacts from explicit source files.
    pub fn from_sources(
        compiler: Compiler,
        sources: impl IntoIterator<Item = (ArtifactId, PathBuf)>,
    ) -> Result<Self, TemplateError> {
        let mut artifacts = BTreeMap::new();
        for (id, path) in sources {
            let compiled = compile_file(&compiler, &id, &path)?;
            debug!(artifact = %id, path = %path.display(), "Compiled");
            artifacts.insert(
                id,
                Artifact {
                    path,
                    compiled: Arc::new(compiled),
                },
            );
        }

        info!(count = artifacts.len(), "Compiled templates and layouts");
        Ok(Self {
            compiler,
            artifacts,
        })
    }

    /// Number of compiled artifacts.
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Whether the store holds no artifacts.
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Compiled artifact by id.
    pub fn get(&self, id: &ArtifactId) -> Option<Arc<Template>> {
        self.artifacts.get(id).map(|artifact| artifact.compiled.clone())
    }

    /// Compiled template by name.
    pub fn template(&self, name: &str) -> Option<Arc<Template>> {
        self.get(&ArtifactId::template(name))
    }

    /// Compiled layout by name.
    pub fn layout(&self, name: &str) -> Option<Arc<Template>> {
        self.get(&ArtifactId::layout(name))
    }

    /// Build the renderer serving `topic`, if its artifacts exist.
    pub fn renderer(&self, topic: &Topic) -> Option<Renderer> {
        let template = self.template(topic.template())?;
        match topic.layout() {
            None => Some(Renderer::template(template)),
            Some(layout) => Some(Renderer::layout(template, self.layout(layout)?)),
        }
    }

    /// Recompile the artifacts named in `names`, or all of them when `names`
    /// is empty.
    ///
    /// A name matches both a template and a layout of that name. Artifacts
    /// that fail keep their previous compiled version. Sources and partials
    /// are read and compiled on the blocking thread pool, so the caller's
    /// task never blocks on the filesystem.
    pub async fn reload(&mut self, names: &[String]) -> ReloadReport {
        let mut report = ReloadReport::default();

        let targets: Vec<ArtifactId> = if names.is_empty() {
            self.artifacts.keys().cloned().collect()
        } else {
            let mut targets = Vec::new();
            for name in names {
                let before = targets.len();
                targets.extend(self.artifacts.keys().filter(|id| &id.name == name).cloned());
                if targets.len() == before {
                    warn!(name = %name, "Reload requested for unknown template");
                    report.unknown.push(name.clone());
                }
            }
            targets
        };

        let jobs: Vec<(ArtifactId, PathBuf)> = targets
            .iter()
            .filter_map(|id| self.artifacts.get(id).map(|artifact| (id.clone(), artifact.path.clone())))
            .collect();
        let compiler = self.compiler.clone();
        let compiled = tokio::task::spawn_blocking(move || {
            jobs.into_iter()
                .map(|(id, path)| {
                    let result = compile_file(&compiler, &id, &path);
                    (id, result)
                })
                .collect::<Vec<_>>()
        })
        .await;

        let compiled = match compiled {
            Ok(compiled) => compiled,
            Err(e) => {
                warn!(error = %e, "Template compilation task failed, keeping previous versions");
                let reason = format!("compilation task failed: {e}");
                report.failed.extend(targets.into_iter().map(|id| (id, reason.clone())));
                return report;
            }
        };

        for (id, result) in compiled {
            let Some(artifact) = self.artifacts.get_mut(&id) else {
                continue;
            };
            match result {
                Ok(compiled) => {
                    artifact.compiled = Arc::new(compiled);
                    debug!(artifact = %id, "Recompiled");
                    report.recompiled.push(id);
                }
                Err(e) => {
                    warn!(artifact = %id, error = %e, "Keeping previous version");
                    report.failed.push((id, e.to_string()));
                }
            }
        }

        report
    }
}

fn compile_file(compiler: &Compiler, id: &ArtifactId, path: &Path) -> Result<Template, TemplateError> {
    let source = std::fs::read_to_string(path).map_err(|source| TemplateError::TemplateRead {
        name: id.name.clone(),
        path: path.to_path_buf(),
        source,
    })?;
    compiler.compile_named(&id.name, &source)
}
