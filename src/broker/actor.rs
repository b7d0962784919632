use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::store::{ReloadReport, TemplateStore};
use super::{BrokerCommand, Delivery, Subscription, Topic};
use crate::constants::BROKER_CHANNEL_CAPACITY;
use crate::templating::Renderer;

/// The broker task is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("renderer broker has shut down")]
pub struct BrokerClosed;

#[derive(Debug, Default)]
struct TopicState {
    generation: u64,
    renderer: Option<Arc<Renderer>>,
    pending: Vec<oneshot::Sender<Delivery>>,
}

impl TopicState {
    fn current(&self) -> Option<Delivery> {
        self.renderer.as_ref().map(|renderer| Delivery {
            generation: self.generation,
            renderer: renderer.clone(),
        })
    }

    /// Install a new renderer and hand it to every parked subscriber.
    ///
    /// Returns how many subscribers received it.
    fn publish(&mut self, renderer: Renderer) -> usize {
        self.generation += 1;
        let renderer = Arc::new(renderer);
        self.renderer = Some(renderer.clone());

        let delivery = Delivery {
            generation: self.generation,
            renderer,
        };
        self.pending
            .drain(..)
            .map(|deliver| deliver.send(delivery.clone()).is_ok())
            .filter(|delivered| *delivered)
            .count()
    }
}

/// The broker actor. See the [module docs](super) for the protocol.
#[derive(Debug)]
pub struct RendererBroker {
    store: TemplateStore,
    topics: HashMap<Topic, TopicState>,
    commands: mpsc::Receiver<BrokerCommand>,
}

impl RendererBroker {
    /// Start the broker on the current tokio runtime.
    pub fn spawn(store: TemplateStore) -> BrokerHandle {
        let (sender, commands) = mpsc::channel(BROKER_CHANNEL_CAPACITY);
        let broker = Self {
            store,
            topics: HashMap::new(),
            commands,
        };
        tokio::spawn(broker.run());
        BrokerHandle {
            commands: sender,
        }
    }

    async fn run(mut self) {
        debug!(artifacts = self.store.len(), "Renderer broker started");
        while let Some(command) = self.commands.recv().await {
            match command {
                BrokerCommand::Subscribe(subscription) => self.subscribe(subscription),
                BrokerCommand::Reload {
                    names,
                    done,
                } => {
                    let report = self.reload(&names).await;
                    if let Some(done) = done {
                        let _ = done.send(report);
                    }
                }
            }
        }
        debug!(topics = self.topics.len(), "Renderer broker stopped");
    }

    fn subscribe(&mut self, subscription: Subscription) {
        let Subscription {
            topic,
            seen_generation,
            deliver,
        } = subscription;

        let state = self.topics.entry(topic.clone()).or_default();
        if state.renderer.is_none() {
            match self.store.renderer(&topic) {
                Some(renderer) => {
                    state.publish(renderer);
                    debug!(topic = %topic, "Built renderer");
                }
                None => warn!(topic = %topic, "No template or layout for topic, subscription parked"),
            }
        }

        match state.current() {
            Some(delivery) if delivery.generation > seen_generation => {
                debug!(topic = %topic, generation = delivery.generation, "Delivering current renderer");
                let _ = deliver.send(delivery);
            }
            _ => {
                state.pending.retain(|pending| !pending.is_closed());
                state.pending.push(deliver);
            }
        }
    }

    async fn reload(&mut self, names: &[String]) -> ReloadReport {
        let mut report = self.store.reload(names).await;

        for (topic, state) in &mut self.topics {
            if !report.recompiled.iter().any(|id| topic.depends_on(id)) {
                continue;
            }
            let Some(renderer) = self.store.renderer(topic) else {
                continue;
            };
            let delivered = state.publish(renderer);
            debug!(topic = %topic, generation = state.generation, delivered, "Broadcast renderer");
            report.rebuilt.push(topic.clone());
        }
        report.rebuilt.sort();

        info!(
            recompiled = report.recompiled.len(),
            failed = report.failed.len(),
            topics = report.rebuilt.len(),
            "Reloaded templates"
        );
        report
    }
}

/// Strong handle to the broker; the broker runs while one exists.
#[derive(Debug, Clone)]
pub struct BrokerHandle {
    commands: mpsc::Sender<BrokerCommand>,
}

impl BrokerHandle {
    /// The shared registration channel.
    pub fn sender(&self) -> &mpsc::Sender<BrokerCommand> {
        &self.commands
    }

    /// A handle that does not keep the broker alive.
    pub fn downgrade(&self) -> WeakBrokerHandle {
        WeakBrokerHandle {
            commands: self.commands.downgrade(),
        }
    }

    /// Register for the next renderer of `topic` newer than `seen_generation`.
    ///
    /// Suspends while the registration channel is full.
    pub async fn subscribe(
        &self,
        topic: Topic,
        seen_generation: u64,
    ) -> Result<oneshot::Receiver<Delivery>, BrokerClosed> {
        let (deliver, receiver) = oneshot::channel();
        let subscription = Subscription {
            topic,
            seen_generation,
            deliver,
        };
        self.commands.send(BrokerCommand::Subscribe(subscription)).await.map_err(|_| BrokerClosed)?;
        Ok(receiver)
    }

    /// Recompile the named templates and layouts (all when empty) and
    /// broadcast rebuilt renderers.
    pub async fn reload(&self, names: Vec<String>) -> Result<ReloadReport, BrokerClosed> {
        let (done, receiver) = oneshot::channel();
        self.commands
            .send(BrokerCommand::Reload {
                names,
                done: Some(done),
            })
            .await
            .map_err(|_| BrokerClosed)?;
        receiver.await.map_err(|_| BrokerClosed)
    }
}

/// Handle that does not keep the broker alive.
#[derive(Debug, Clone)]
pub struct WeakBrokerHandle {
    commands: mpsc::WeakSender<BrokerCommand>,
}

impl WeakBrokerHandle {
    /// Strong handle, if the broker is still running.
    pub fn upgrade(&self) -> Option<BrokerHandle> {
        self.commands.upgrade().map(|commands| BrokerHandle {
            commands,
        })
    }
}
