//! Core types shared by the CLI and the library.
//!
//! Currently this is the user-facing error layer:
//!
//! - [`PagesmithError`] - the failure categories shown to users
//! - [`ErrorContext`] - an error plus optional details and a suggestion
//! - [`user_friendly_error`] - classify any [`anyhow::Error`] for display
//!
//! Module-level errors such as [`ConfigError`](crate::config::ConfigError)
//! or [`TemplateError`](crate::templating::TemplateError) stay precise for
//! code that handles them; the CLI converts whatever reaches `main` with
//! [`user_friendly_error`] and prints it in color.

pub mod error;

pub use error::{ErrorContext, PagesmithError, user_friendly_error};
