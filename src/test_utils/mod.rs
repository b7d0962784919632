//! Test utilities for pagesmith
//!
//! Helpers shared by unit tests and the integration suites (enabled there
//! through the `test-utils` feature):
//!
//! - [`SiteFixture`] writes templates, layouts, partials and a
//!   `pagesmith.toml` into a temporary directory
//! - [`TestSite`] is the resulting on-disk site, with helpers to edit
//!   templates for reload tests
//! - [`StubFetcher`] answers backend requests from canned responses and
//!   records every URL it was asked for
//!
//! # Example
//!
//! ```rust,no_run
//! use pagesmith::test_utils::{SiteFixture, StubFetcher};
//! use serde_json::json;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let site = SiteFixture::new()
//!     .template("home", "<h1>{{title}}</h1>")
//!     .static_page("home", "/", "home", json!({"title": "Hi"}))
//!     .build()?;
//! let config = site.config().await?;
//! # Ok(())
//! # }
//! ```

pub mod environment;
pub mod fixtures;
pub mod stub;

pub use environment::TestSite;
pub use fixtures::SiteFixture;
pub use stub::StubFetcher;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, tests run without a subscriber.
///
/// ```bash
/// RUST_LOG=pagesmith=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
