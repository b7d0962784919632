//! User-facing error reporting.
//!
//! Library modules return their own `thiserror` enums ([`ConfigError`],
//! [`TemplateError`], ...) and the CLI collects them in [`anyhow::Error`].
//! Before printing, [`user_friendly_error`] classifies the error chain into a
//! [`PagesmithError`] and wraps it in an [`ErrorContext`] carrying optional
//! details and a suggestion, printed in color by [`ErrorContext::display`].

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::broker::BrokerClosed;
use crate::config::ConfigError;
use crate::templating::TemplateError;

/// Failure categories reported to users.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PagesmithError {
    /// The configuration file does not exist
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// The configuration file is not valid TOML or has the wrong shape
    #[error("Failed to parse {file}: {reason}")]
    ConfigParseError { file: String, reason: String },

    /// The configuration parsed but is inconsistent
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A template, layout or partial failed to compile
    #[error("Template error: {reason}")]
    TemplateError { reason: String },

    /// `render` was asked for a page that is not configured
    #[error("Page '{name}' is not configured")]
    PageNotFound { name: String },

    /// The server could not bind its listen address
    #[error("Cannot listen on {addr}: {reason}")]
    BindFailed { addr: String, reason: String },

    /// The renderer broker stopped unexpectedly
    #[error("Renderer broker stopped")]
    BrokerStopped,

    /// Anything else
    #[error("{message}")]
    Other { message: String },
}

/// A [`PagesmithError`] with optional details and a suggestion.
#[derive(Debug)]
pub struct ErrorContext {
    /// The classified error
    pub error: PagesmithError,
    /// How the user might fix it
    pub suggestion: Option<String>,
    /// Additional explanation
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: PagesmithError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion, printed in green.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details, printed in yellow.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print to stderr with terminal colors.
    ///
    /// ```rust,no_run
    /// use pagesmith::core::{ErrorContext, PagesmithError};
    ///
    /// ErrorContext::new(PagesmithError::PageNotFound { name: "home".into() })
    ///     .with_suggestion("Run 'pagesmith check' to list configured pages")
    ///     .display();
    /// ```
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Classify an error chain for display.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let chain_text = || {
        error.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>().join(": ")
    };

    if let Some(known) = error.chain().find_map(|e| e.downcast_ref::<PagesmithError>()) {
        return create_error_context(known.clone());
    }

    if let Some(config_error) = error.chain().find_map(|e| e.downcast_ref::<ConfigError>()) {
        let context = ErrorContext::new(PagesmithError::InvalidConfig {
            reason: config_error.to_string(),
        });
        return match config_error.suggestion() {
            Some(name) => context.with_suggestion(format!("Did you mean '{name}'?")),
            None => context.with_suggestion("Check the [templates], [layouts] and [[pages]] sections"),
        };
    }

    if let Some(template_error) = error.chain().find_map(|e| e.downcast_ref::<TemplateError>()) {
        let context = ErrorContext::new(PagesmithError::TemplateError {
            reason: template_error.to_string(),
        });
        return if template_error.is_partial_not_found() {
            context.with_suggestion(
                "Partials are looked up in partials_dir as <name>, <name>.hbs or <name>.handlebars",
            )
        } else {
            context
                .with_suggestion("Check that every section is closed and every tag is terminated")
        };
    }

    if let Some(toml_error) = error.chain().find_map(|e| e.downcast_ref::<toml::de::Error>()) {
        return ErrorContext::new(PagesmithError::ConfigParseError {
            file: "configuration file".to_string(),
            reason: toml_error.message().to_string(),
        })
        .with_details(error.to_string())
        .with_suggestion("Check the TOML syntax: quotes, brackets and [[pages]] tables");
    }

    if error.chain().any(|e| e.downcast_ref::<BrokerClosed>().is_some()) {
        return create_error_context(PagesmithError::BrokerStopped);
    }

    if let Some(io_error) = error.chain().find_map(|e| e.downcast_ref::<std::io::Error>()) {
        if io_error.kind() == std::io::ErrorKind::NotFound {
            return ErrorContext::new(PagesmithError::Other {
                message: error.to_string(),
            })
            .with_details(chain_text())
            .with_suggestion("Check that the path exists and is relative to the config file");
        }
    }

    let details = chain_text();
    let context = ErrorContext::new(PagesmithError::Other {
        message: error.to_string(),
    });
    if details.is_empty() {
        context
    } else {
        context.with_details(details)
    }
}

fn create_error_context(error: PagesmithError) -> ErrorContext {
    match &error {
        PagesmithError::ConfigNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Create pagesmith.toml or pass its location with --config"),
        PagesmithError::PageNotFound {
            ..
        } => ErrorContext::new(error).with_suggestion("Run 'pagesmith check' to list configured pages"),
        PagesmithError::BindFailed {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Pick another address with --listen or stop the process using it"),
        PagesmithError::BrokerStopped => ErrorContext::new(error)
            .with_details("The background task compiling templates exited before the server"),
        _ => ErrorContext::new(error),
    }
}
