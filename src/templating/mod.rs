//! Handlebars templating for pagesmith pages.
//!
//! This module owns the whole template pipeline:
//!
//! - [`partials`] - resolving `{{> name}}` references through an ordered chain
//!   of providers (built-in static partials first, then the filesystem)
//! - [`compiler`] - parsing template source into an immutable [`Template`]
//!   and resolving every partial it reaches at compile time
//! - [`helpers`] - helpers available to every template, such as `json`
//! - [`renderer`] - the [`Renderer`] variants handlers render responses with
//!
//! # Example
//!
//! ```rust
//! use pagesmith::templating::{Compiler, Renderer, StaticPartials};
//! use serde_json::json;
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! let mut partials = HashMap::new();
//! partials.insert("item".to_string(), "<li>{{name}}</li>".to_string());
//! let compiler = Compiler::new(Arc::new(StaticPartials::with_builtins(partials)));
//!
//! let page = Arc::new(compiler.compile("<ul>{{#each items}}{{> item}}{{/each}}</ul>")?);
//! let layout = Arc::new(compiler.compile("<body>{{{content}}}</body>")?);
//!
//! let html = Renderer::layout(page, layout)
//!     .render_to_vec(&json!({"items": [{"name": "one"}, {"name": "two"}]}))?;
//! assert_eq!(html, b"<body><ul><li>one</li><li>two</li></ul></body>");
//! # Ok::<(), pagesmith::templating::TemplateError>(())
//! ```

pub mod compiler;
pub mod error;
pub mod helpers;
pub mod partials;
pub mod renderer;
pub mod template;

pub use compiler::Compiler;
pub use error::TemplateError;
pub use partials::{FilePartials, PartialChain, PartialProvider, StaticPartials};
pub use renderer::{CONTENT_KEY, Renderer};
pub use template::Template;
