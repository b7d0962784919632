//! Error types for template compilation and rendering.
//!
//! Compilation errors (syntax problems, unresolved partials) are fatal for the
//! template being compiled but never for its siblings in a batch. Render-time
//! errors come from helpers or the output sink.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving partials, compiling templates or rendering them.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Malformed template syntax (unclosed block, mismatched closing tag)
    #[error("syntax error: {0}")]
    Syntax(#[from] handlebars::TemplateError),

    /// No provider in the resolver chain knows the partial
    #[error("partial not found: {name}")]
    PartialNotFound {
        /// Name used in the `{{> name}}` tag
        name: String,
    },

    /// Partials include each other deeper than the allowed nesting depth
    #[error("partial '{name}' is nested more than {depth} levels deep")]
    PartialRecursion {
        /// Partial whose inclusion exceeded the limit
        name: String,
        /// The configured limit
        depth: usize,
    },

    /// A partial exists on disk but could not be read
    #[error("failed to read partial '{name}' from {}", path.display())]
    PartialRead {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A declared template or layout file could not be read
    #[error("failed to read template '{name}' from {}", path.display())]
    TemplateRead {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Compilation of a named template (or partial) failed
    #[error("failed to compile '{name}': {source}")]
    Compile {
        /// Template, layout or partial name
        name: String,
        #[source]
        source: Box<TemplateError>,
    },

    /// Rendering a compiled template failed
    #[error("failed to render template: {0}")]
    Render(#[from] handlebars::RenderError),

    /// The output sink rejected a write
    #[error("failed to write rendered output: {0}")]
    Write(#[from] std::io::Error),
}

impl TemplateError {
    /// Wrap this error with the name of the template being compiled.
    pub fn in_template(self, name: impl Into<String>) -> Self {
        Self::Compile {
            name: name.into(),
            source: Box::new(self),
        }
    }

    /// Whether the innermost cause is an unresolved partial.
    pub fn is_partial_not_found(&self) -> bool {
        match self {
            Self::PartialNotFound {
                ..
            } => true,
            Self::Compile {
                source,
                ..
            } => source.is_partial_not_found(),
            _ => false,
        }
    }
}
