//! Renderer broker: compiles templates and hands renderers to page handlers.
//!
//! The broker is a single tokio task owning the [`TemplateStore`] and, per
//! [`Topic`], the current renderer, its generation counter and the pending
//! subscriptions. Handlers talk to it over one bounded registration channel.
//!
//! # Subscription protocol
//!
//! A handler sends a [`Subscription`] carrying the generation it last saw and
//! a one-shot delivery sender, then waits on the receiver:
//!
//! - if the broker holds a newer renderer for the topic than the handler has
//!   seen, it is delivered immediately;
//! - otherwise the subscription is parked until the next rebuild of the topic.
//!
//! After each delivery the handler swaps in the new renderer and subscribes
//! again. Because a subscription always names the last generation seen, a
//! rebuild broadcast while a handler is between two subscriptions is picked
//! up on resubscription instead of being missed.
//!
//! # Lifetime
//!
//! The broker runs until every strong [`BrokerHandle`] is dropped. Handlers
//! only keep a [`WeakBrokerHandle`], so they never keep the broker alive; when
//! it stops, parked delivery senders are dropped and handler loops end.

mod actor;
mod store;

pub use actor::{BrokerClosed, BrokerHandle, RendererBroker, WeakBrokerHandle};
pub use store::{ArtifactId, ArtifactKind, ReloadReport, TemplateStore};

use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::constants::TOPIC_SEPARATOR;
use crate::templating::Renderer;

/// Key of one renderer stream: a template, optionally wrapped in a layout.
///
/// Displays as the template name alone or as `layout-:-template`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Topic {
    template: String,
    layout: Option<String>,
}

impl Topic {
    pub fn new(template: impl Into<String>, layout: Option<&str>) -> Self {
        Self {
            template: template.into(),
            layout: layout.map(str::to_string),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn layout(&self) -> Option<&str> {
        self.layout.as_deref()
    }

    /// Whether rebuilding `id` changes this topic's renderer.
    pub fn depends_on(&self, id: &ArtifactId) -> bool {
        match id.kind {
            ArtifactKind::Template => self.template == id.name,
            ArtifactKind::Layout => self.layout.as_deref() == Some(id.name.as_str()),
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.layout {
            Some(layout) => write!(f, "{layout}{TOPIC_SEPARATOR}{}", self.template),
            None => f.write_str(&self.template),
        }
    }
}

/// A renderer handed to a subscriber.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Generation of the topic this renderer belongs to
    pub generation: u64,
    /// The renderer
    pub renderer: Arc<Renderer>,
}

/// One-shot registration for the next renderer of a topic.
#[derive(Debug)]
pub struct Subscription {
    /// Topic to receive renderers for
    pub topic: Topic,
    /// Last generation the subscriber has seen; `0` for none
    pub seen_generation: u64,
    /// Where the renderer is delivered
    pub deliver: oneshot::Sender<Delivery>,
}

/// Messages accepted on the broker's registration channel.
#[derive(Debug)]
pub enum BrokerCommand {
    /// Register for the next renderer of a topic
    Subscribe(Subscription),
    /// Recompile the named artifacts (all when empty) and broadcast
    Reload {
        names: Vec<String>,
        done: Option<oneshot::Sender<ReloadReport>>,
    },
}
