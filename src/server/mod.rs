//! The HTTP server.
//!
//! [`Site::build`] turns a [`Config`] into a running set of page handlers
//! behind an axum [`Router`]: every configured page gets a route, static text
//! files are served verbatim and unknown paths answer with the 404 page.
//! [`serve`] binds the router to a socket and, on unix, recompiles every
//! template on `SIGHUP`.

mod routes;

pub use routes::axum_route;

use anyhow::{Context, Result, anyhow};
use axum::Router;
use axum::http::StatusCode;
use futures::future::try_join_all;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::broker::{BrokerHandle, RendererBroker, TemplateStore, WeakBrokerHandle};
use crate::client::{CachedClient, Fetcher};
use crate::config::Config;
use crate::constants::{DEFAULT_NOT_FOUND_BODY, DEFAULT_SERVER_ERROR_BODY};
use crate::core::PagesmithError;
use crate::handler::{Handler, HandlerConfig};
use crate::templating::{Compiler, FilePartials, PartialChain, StaticPartials};
use routes::{FixedPage, HTML, TEXT, fixed_route, page_route};

/// Compiler resolving partials from the built-ins, then `partials_dir`.
pub fn site_compiler(config: &Config) -> Compiler {
    let chain = PartialChain::static_then_files(
        StaticPartials::with_builtins(HashMap::new()),
        FilePartials::new(config.partials_root()),
    );
    Compiler::new(Arc::new(chain))
}

/// A configured site: broker, page handlers and the router serving them.
#[derive(Debug, Clone)]
pub struct Site {
    broker: BrokerHandle,
    handlers: Vec<Arc<Handler>>,
    router: Router,
}

impl Site {
    /// Compile templates, start the broker and one handler per page.
    ///
    /// Backends are queried through a [`CachedClient`] configured from the
    /// `[client]` section.
    pub async fn build(config: &Config) -> Result<Self> {
        let client = CachedClient::from_config(&config.client)?;
        Self::with_fetcher(config, Arc::new(client)).await
    }

    /// Like [`build`](Self::build) with an explicit backend fetcher.
    pub async fn with_fetcher(config: &Config, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let compiler = site_compiler(config);
        let sources = config.clone();
        let store = tokio::task::spawn_blocking(move || TemplateStore::load(&sources, compiler))
            .await
            .map_err(|e| anyhow!("Task join error during template compilation: {}", e))?
            .context("Failed to compile templates")?;
        let broker = RendererBroker::spawn(store);

        let handlers = try_join_all(config.pages.iter().map(|page| {
            let handler_config = HandlerConfig::from_page(page.clone(), fetcher.clone());
            Handler::start(handler_config, &broker)
        }))
        .await
        .context("Failed to start page handlers")?;
        let handlers: Vec<Arc<Handler>> = handlers.into_iter().map(Arc::new).collect();

        let not_found = load_fixed(config, config.errors.not_found.as_deref(), DEFAULT_NOT_FOUND_BODY).await?;
        let server_error =
            load_fixed(config, config.errors.server_error.as_deref(), DEFAULT_SERVER_ERROR_BODY).await?;

        let mut router = Router::new();
        for handler in &handlers {
            info!(
                page = handler.page().display_name(),
                route = %handler.page().url_pattern,
                topic = %handler.topic(),
                "Serving page"
            );
            router = page_route(router, handler.clone(), server_error.clone());
        }
        for (route, path) in &config.static_txt {
            let path = config.resolve_path(path);
            let body = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read static file: {}", path.display()))?;
            router = fixed_route(router, route, FixedPage::new(body, TEXT));
        }
        let router = router.fallback(move || {
            let page = not_found.clone();
            async move { page.respond(StatusCode::NOT_FOUND) }
        });

        Ok(Self {
            broker,
            handlers,
            router,
        })
    }

    /// The router serving the site.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Handle to the site's renderer broker.
    pub fn broker(&self) -> &BrokerHandle {
        &self.broker
    }

    /// Page handlers in configuration order.
    pub fn handlers(&self) -> &[Arc<Handler>] {
        &self.handlers
    }

    /// Handler of the page named `name`.
    pub fn handler(&self, name: &str) -> Option<&Arc<Handler>> {
        self.handlers.iter().find(|handler| handler.page().name == name)
    }
}

async fn load_fixed(config: &Config, path: Option<&Path>, default: &'static str) -> Result<FixedPage> {
    let body = match path {
        Some(path) => {
            let path = config.resolve_path(path);
            tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read error page: {}", path.display()))?
        }
        None => default.as_bytes().to_vec(),
    };
    Ok(FixedPage::new(body, HTML))
}

/// Serve `site` on `listen` until interrupted.
pub async fn serve(site: Site, listen: &str) -> Result<()> {
    let listener = TcpListener::bind(listen).await.map_err(|e| PagesmithError::BindFailed {
        addr: listen.to_string(),
        reason: e.to_string(),
    })?;
    info!(addr = %listener.local_addr()?, pages = site.handlers.len(), "Listening");

    let reloader = tokio::spawn(reload_on_hangup(site.broker.downgrade()));
    let result = axum::serve(listener, site.router())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed");
    reloader.abort();
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[cfg(unix)]
async fn reload_on_hangup(broker: WeakBrokerHandle) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangups = match signal(SignalKind::hangup()) {
        Ok(hangups) => hangups,
        Err(e) => {
            warn!(error = %e, "Cannot listen for SIGHUP, reload disabled");
            return;
        }
    };

    while hangups.recv().await.is_some() {
        let Some(broker) = broker.upgrade() else {
            break;
        };
        info!("SIGHUP received, reloading templates");
        match broker.reload(Vec::new()).await {
            Ok(report) if !report.is_clean() => {
                for (id, error) in &report.failed {
                    warn!(artifact = %id, error = %error, "Reload failed");
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Reload failed");
                break;
            }
        }
    }
}

#[cfg(not(unix))]
async fn reload_on_hangup(_broker: WeakBrokerHandle) {}
