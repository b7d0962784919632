//! pagesmith - handlebars pages served from static payloads or JSON backends
//!
//! pagesmith serves HTML pages described in a TOML file. Each page binds a URL
//! pattern to a handlebars template (optionally wrapped in a layout) and to its
//! data: either a fixed payload from the configuration or the JSON answer of
//! a backend queried per request. Templates are compiled once at startup and
//! can be recompiled while the server runs; page handlers pick up the new
//! versions without dropping a request.
//!
//! # Architecture
//!
//! ```text
//!   config ──> TemplateStore ──> RendererBroker ──(Subscription / Delivery)──> Handler
//!                 │                                                             │
//!            Compiler + PartialChain                            ResponseGenerator + Renderer
//!                                                                               │
//!                                                                     server (axum Router)
//! ```
//!
//! - [`templating`] compiles handlebars sources into immutable templates,
//!   resolving partials at compile time, and composes templates with layouts
//! - [`broker`] owns the compiled templates and hands renderers to handlers
//!   over one-shot subscriptions, rebuilding them on reload
//! - [`handler`] serves one page: generate data, render it with the current
//!   renderer, attach `Cache-Control`
//! - [`generator`] produces page data from a fixed payload or a backend
//! - [`client`] fetches backend JSON with caching and retries
//! - [`server`] builds the axum router and runs the HTTP server
//! - [`config`] loads and validates `pagesmith.toml`
//! - [`cli`] implements the `pagesmith` command
//!
//! # Example
//!
//! ```rust,no_run
//! use pagesmith::config::Config;
//! use pagesmith::server::{Site, serve};
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::load_from(Path::new("pagesmith.toml")).await?;
//! let site = Site::build(&config).await?;
//! serve(site, &config.listen).await?;
//! # Ok(())
//! # }
//! ```

// Page model and configuration
pub mod config;
pub mod constants;

// Rendering pipeline
pub mod broker;
pub mod handler;
pub mod templating;

// Page data
pub mod client;
pub mod generator;

// Surfaces
pub mod cli;
pub mod core;
pub mod server;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
