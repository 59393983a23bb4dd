// src/rabbitmq/publisher.rs
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use super::backoff::ReconnectPolicy;
use super::broker::{Broker, BrokerChannel};
use super::connection::ConnectionManager;
use super::lapin_broker::LapinBroker;
use super::ready::ReadyLatch;
use crate::config::BrokerConfig;
use crate::message::{Envelope, ExchangeDeclaration};

/// Forwards payloads from an in-process queue to a fanout exchange,
/// reconnecting when a publish fails.
///
/// Delivery is best effort: the payload whose publish failed is dropped,
/// and nothing is reported back to the producers. Closing the queue (by
/// dropping every sender) is the only way to stop a running publisher.
pub struct Publisher<B: Broker = LapinBroker> {
    id: String,
    connections: ConnectionManager<B>,
    ready: ReadyLatch,
}

impl Publisher<LapinBroker> {
    pub fn new(exchange: &str, config: BrokerConfig) -> Self {
        let broker = LapinBroker::with_connection_name(&format!("fanout-publisher:{}", exchange));
        Publisher::with_broker(exchange, config, broker)
    }
}

impl<B: Broker> Publisher<B> {
    pub fn with_broker(exchange: &str, config: BrokerConfig, broker: B) -> Self {
        Publisher {
            id: Uuid::new_v4().to_string()[..8].to_string(),
            connections: ConnectionManager::new(broker, config, ExchangeDeclaration::fanout(exchange)),
            ready: ReadyLatch::new(),
        }
    }

    pub fn with_reconnect_policy<P: ReconnectPolicy + 'static>(mut self, policy: P) -> Self {
        self.connections = self.connections.with_reconnect_policy(policy);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn exchange(&self) -> &str {
        self.connections.exchange()
    }

    /// True once the first connection has been established, and from then on
    /// for the life of this publisher, even after it has stopped.
    pub fn is_ready(&self) -> bool {
        self.ready.is_set()
    }

    /// Spawns the publish loop on the current tokio runtime.
    pub fn start(self: &Arc<Self>, payloads: mpsc::Receiver<Vec<u8>>) -> JoinHandle<()>
    where
        B: 'static,
    {
        let publisher = Arc::clone(self);
        tokio::spawn(async move { publisher.run(payloads).await })
    }

    /// Runs the publish loop until the queue is closed and drained, or a
    /// reconnect fails terminally.
    pub async fn run(&self, mut payloads: mpsc::Receiver<Vec<u8>>) {
        let exchange = self.exchange();
        let publisher_id = self.id();

        let mut session = match self.connections.acquire().await {
            Ok(session) => session,
            Err(err) => {
                error!(exchange, publisher_id, error = %err, "publisher of {} not start!", exchange);
                return;
            }
        };
        self.ready.mark();
        info!(exchange, publisher_id, "A new publisher on {}", exchange);

        while let Some(payload) = payloads.recv().await {
            let envelope = Envelope::fanout(payload);
            if let Err(err) = session.channel().publish(exchange, &envelope).await {
                error!(exchange, publisher_id, error = %err, "Publish failed, reconnecting...");
                session.close().await;
                session = match self.connections.acquire().await {
                    Ok(session) => session,
                    Err(err) => {
                        error!(exchange, publisher_id, error = %err, "publisher of {} terminate!", exchange);
                        return;
                    }
                };
            }
        }

        session.close().await;
        info!(exchange, publisher_id, "publisher of {} terminate, queue closed", exchange);
    }
}
