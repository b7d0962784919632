//! Partial resolution for `{{> name}}` tags.
//!
//! Partials are resolved once, at compile time, through a [`PartialProvider`].
//! The server uses a [`PartialChain`] of two pools:
//!
//! 1. [`StaticPartials`] - an immutable in-memory map that always contains the
//!    built-in `pagesmith/debug` fragment, so it is available without any
//!    filesystem access and cannot be shadowed by a file of the same name.
//! 2. [`FilePartials`] - a directory lookup for everything else.
//!
//! A static entry only wins when it is non-empty; an empty static value falls
//! through to the next pool.

use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use super::error::TemplateError;
use crate::constants::{DEBUG_PARTIAL_NAME, DEBUG_PARTIAL_SOURCE, PARTIAL_EXTENSIONS};

/// Source of partial templates, looked up by name.
///
/// Implementations must tolerate concurrent calls: compilers are shared by
/// the broker and reload requests. Lookups may block; the broker only
/// compiles on tokio's blocking thread pool.
pub trait PartialProvider: Send + Sync + fmt::Debug {
    /// Return the source text of the partial called `name`.
    fn get(&self, name: &str) -> Result<String, TemplateError>;
}

/// Immutable in-memory partial pool.
#[derive(Debug, Clone, Default)]
pub struct StaticPartials {
    partials: HashMap<String, String>,
}

impl StaticPartials {
    /// Create a pool from the given name/source pairs.
    pub fn new(partials: HashMap<String, String>) -> Self {
        Self {
            partials,
        }
    }

    /// Create a pool containing the built-in partials plus `extra`.
    ///
    /// Built-ins are inserted last so configuration cannot replace them.
    pub fn with_builtins(extra: HashMap<String, String>) -> Self {
        let mut partials = extra;
        partials.insert(DEBUG_PARTIAL_NAME.to_string(), DEBUG_PARTIAL_SOURCE.to_string());
        Self {
            partials,
        }
    }

    /// Number of partials in the pool.
    pub fn len(&self) -> usize {
        self.partials.len()
    }

    /// Whether the pool holds no partials at all.
    pub fn is_empty(&self) -> bool {
        self.partials.is_empty()
    }
}

impl PartialProvider for StaticPartials {
    fn get(&self, name: &str) -> Result<String, TemplateError> {
        self.partials.get(name).cloned().ok_or_else(|| TemplateError::PartialNotFound {
            name: name.to_string(),
        })
    }
}

/// Partials read from a directory on disk.
///
/// `{{> shared/header}}` resolves to the first existing file among
/// `<root>/shared/header`, `<root>/shared/header.hbs` and
/// `<root>/shared/header.handlebars`.
#[derive(Debug, Clone)]
pub struct FilePartials {
    root: PathBuf,
}

impl FilePartials {
    /// Create a provider rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    /// Directory partial names are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidates(&self, name: &str) -> Vec<PathBuf> {
        PARTIAL_EXTENSIONS.iter().map(|ext| self.root.join(format!("{name}{ext}"))).collect()
    }
}

/// Partial names must stay inside the partials directory.
fn is_safe_partial_name(name: &str) -> bool {
    !name.is_empty()
        && Path::new(name).components().all(|component| matches!(component, Component::Normal(_)))
}

impl PartialProvider for FilePartials {
    fn get(&self, name: &str) -> Result<String, TemplateError> {
        if !is_safe_partial_name(name) {
            tracing::warn!("Rejected partial name '{}' outside {}", name, self.root.display());
            return Err(TemplateError::PartialNotFound {
                name: name.to_string(),
            });
        }

        for path in self.candidates(name) {
            if !path.is_file() {
                continue;
            }
            tracing::debug!("Resolved partial '{}' to {}", name, path.display());
            return std::fs::read_to_string(&path).map_err(|source| TemplateError::PartialRead {
                name: name.to_string(),
                path,
                source,
            });
        }

        Err(TemplateError::PartialNotFound {
            name: name.to_string(),
        })
    }
}

/// Ordered chain of partial providers.
///
/// Every provider except the last is skipped when it fails or returns empty
/// text. The last provider's answer is returned as-is, error included.
#[derive(Debug, Clone, Default)]
pub struct PartialChain {
    providers: Vec<Arc<dyn PartialProvider>>,
}

impl PartialChain {
    /// Create a chain trying `providers` in order.
    pub fn new(providers: Vec<Arc<dyn PartialProvider>>) -> Self {
        Self {
            providers,
        }
    }

    /// The standard two-pool chain: static partials first, then the filesystem.
    pub fn static_then_files(statics: StaticPartials, files: FilePartials) -> Self {
        Self::new(vec![Arc::new(statics), Arc::new(files)])
    }

    /// Append a fallback provider.
    pub fn with_fallback(mut self, provider: Arc<dyn PartialProvider>) -> Self {
        self.providers.push(provider);
        self
    }
}

impl PartialProvider for PartialChain {
    fn get(&self, name: &str) -> Result<String, TemplateError> {
        let Some((last, preferred)) = self.providers.split_last() else {
            return Err(TemplateError::PartialNotFound {
                name: name.to_string(),
            });
        };

        for provider in preferred {
            match provider.get(name) {
                Ok(text) if !text.is_empty() => return Ok(text),
                Ok(_) => tracing::debug!("Partial '{}' is empty in {:?}, falling back", name, provider),
                Err(e) => tracing::debug!("Partial '{}' not served by {:?}: {}", name, provider, e),
            }
        }

        last.get(name)
    }
}
