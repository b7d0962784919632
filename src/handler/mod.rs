//! Page handlers.
//!
//! A [`Handler`] serves one page: it asks its [`ResponseGenerator`] for data,
//! renders the data with the page's current renderer and attaches the page's
//! `Cache-Control` value. The renderer is replaced in the background whenever
//! the broker delivers a newer one, without blocking requests in flight.

use arc_swap::ArcSwap;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::broker::{BrokerClosed, BrokerHandle, Topic, WeakBrokerHandle};
use crate::client::Fetcher;
use crate::config::Page;
use crate::generator::{GenerateError, PageRequest, ResponseGenerator};
use crate::templating::{Renderer, TemplateError};

/// Serving a page failed.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The page data could not be produced
    #[error("failed to generate data for page '{page}': {source}")]
    Generate {
        page: String,
        #[source]
        source: GenerateError,
    },

    /// The renderer failed
    #[error("failed to render page '{page}': {source}")]
    Render {
        page: String,
        #[source]
        source: TemplateError,
    },

    /// The broker stopped before delivering a renderer
    #[error("no renderer for page '{page}': {source}")]
    BrokerClosed {
        page: String,
        #[source]
        source: BrokerClosed,
    },
}

/// What a handler needs to serve a page.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// The page served
    pub page: Page,
    /// Source of the page data
    pub generator: ResponseGenerator,
    /// `Cache-Control` header value attached to every response
    pub cache_control: String,
}

impl HandlerConfig {
    /// Configuration for `page`, querying backends through `client`.
    pub fn from_page(page: Page, client: Arc<dyn Fetcher>) -> Self {
        let generator = ResponseGenerator::for_page(&page, client);
        let cache_control = page.cache_control();
        Self {
            page,
            generator,
            cache_control,
        }
    }
}

/// A successfully rendered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub body: Vec<u8>,
    pub cache_control: String,
}

/// Serves one page and keeps its renderer current.
#[derive(Debug)]
pub struct Handler {
    config: HandlerConfig,
    topic: Topic,
    renderer: Arc<ArcSwap<Renderer>>,
    follower: JoinHandle<()>,
}

impl Handler {
    /// Subscribe to the page's topic, wait for its first renderer and start
    /// following updates.
    ///
    /// The page's template and layout must exist in the broker's store;
    /// [`Config::validate`](crate::config::Config::validate) guarantees this
    /// for configured pages.
    pub async fn start(config: HandlerConfig, broker: &BrokerHandle) -> Result<Self, HandlerError> {
        let topic = config.page.topic();
        let closed = |source| HandlerError::BrokerClosed {
            page: config.page.name.clone(),
            source,
        };

        let receiver = broker.subscribe(topic.clone(), 0).await.map_err(closed)?;
        let first = receiver.await.map_err(|_| closed(BrokerClosed))?;
        debug!(page = %config.page.name, topic = %topic, "Handler ready");

        let renderer = Arc::new(ArcSwap::new(first.renderer));
        let follower = tokio::spawn(follow(
            topic.clone(),
            first.generation,
            broker.downgrade(),
            renderer.clone(),
        ));

        Ok(Self {
            config,
            topic,
            renderer,
            follower,
        })
    }

    /// The page served.
    pub fn page(&self) -> &Page {
        &self.config.page
    }

    /// Broker topic this handler follows.
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// The renderer currently in use.
    pub fn renderer(&self) -> Arc<Renderer> {
        self.renderer.load_full()
    }

    /// Produce the response for `request`.
    pub async fn handle(&self, request: &PageRequest) -> Result<RenderedPage, HandlerError> {
        let page = &self.config.page.name;

        let data = self.config.generator.generate(request).await.map_err(|source| {
            error!(page = %page, kind = source.kind(), error = %source, "Response generation failed");
            HandlerError::Generate {
                page: page.clone(),
                source,
            }
        })?;

        let renderer = self.renderer.load();
        let body = renderer.render_to_vec(&data).map_err(|source| {
            error!(page = %page, error = %source, "Render failed");
            HandlerError::Render {
                page: page.clone(),
                source,
            }
        })?;

        Ok(RenderedPage {
            body,
            cache_control: self.config.cache_control.clone(),
        })
    }
}

impl Drop for Handler {
    fn drop(&mut self) {
        self.follower.abort();
    }
}

/// Resubscribe after every delivery until the broker goes away.
async fn follow(
    topic: Topic,
    mut seen_generation: u64,
    broker: WeakBrokerHandle,
    current: Arc<ArcSwap<Renderer>>,
) {
    loop {
        let Some(handle) = broker.upgrade() else {
            break;
        };
        let Ok(receiver) = handle.subscribe(topic.clone(), seen_generation).await else {
            break;
        };
        drop(handle);

        let Ok(delivery) = receiver.await else {
            break;
        };
        seen_generation = delivery.generation;
        current.store(delivery.renderer);
        debug!(topic = %topic, generation = seen_generation, "Renderer swapped");
    }
    debug!(topic = %topic, "Stopped following renderer updates");
}
