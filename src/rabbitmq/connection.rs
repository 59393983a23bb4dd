// src/rabbitmq/connection.rs
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::backoff::{FixedInterval, ReconnectPolicy};
use super::broker::{Broker, BrokerChannel, BrokerConnection};
use super::errors::Result;
use crate::config::BrokerConfig;
use crate::message::ExchangeDeclaration;

/// A live connection and the channel opened on it, with the exchange
/// already declared. Owned by exactly one publish loop.
pub struct Session<C: BrokerConnection> {
    connection: C,
    channel: C::Channel,
}

impl<C: BrokerConnection> Session<C> {
    pub fn channel(&self) -> &C::Channel {
        &self.channel
    }

    /// Closes the channel, then the connection. Consumes the session so
    /// neither can be closed twice.
    pub async fn close(self) {
        if let Err(err) = self.channel.close().await {
            warn!(error = %err, "Failed to close channel");
        }
        if let Err(err) = self.connection.close().await {
            warn!(error = %err, "Failed to close connection");
        }
    }
}

enum AcquireState<C: BrokerConnection> {
    Retrying { attempt: u32 },
    Dialed(C),
    Established(Session<C>),
}

/// Produces sessions for one exchange: dials until the broker answers,
/// then opens a channel and declares the exchange.
pub struct ConnectionManager<B: Broker> {
    broker: B,
    config: BrokerConfig,
    declaration: ExchangeDeclaration,
    policy: Box<dyn ReconnectPolicy>,
}

impl<B: Broker> ConnectionManager<B> {
    pub fn new(broker: B, config: BrokerConfig, declaration: ExchangeDeclaration) -> Self {
        ConnectionManager {
            broker,
            config,
            declaration,
            policy: Box::new(FixedInterval::default()),
        }
    }

    pub fn with_reconnect_policy<P: ReconnectPolicy + 'static>(mut self, policy: P) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn exchange(&self) -> &str {
        &self.declaration.name
    }

    /// Dial failures, including a URL that cannot be rendered, are retried
    /// forever with the reconnect policy's delay. Channel and declare
    /// failures are returned as terminal errors without retrying.
    pub async fn acquire(&self) -> Result<Session<B::Connection>> {
        let exchange = self.exchange();
        let mut state = AcquireState::Retrying { attempt: 0 };
        loop {
            state = match state {
                AcquireState::Retrying { attempt } => {
                    debug!(endpoint = %self.config.endpoint(), "Dialing RabbitMQ");
                    let dialed = match self.config.url() {
                        Ok(url) => self.broker.dial(&url).await,
                        Err(err) => Err(err),
                    };
                    match dialed {
                        Ok(connection) => {
                            info!(exchange, "RabbitMQ connect successful");
                            AcquireState::Dialed(connection)
                        }
                        Err(err) => {
                            let attempt = attempt.saturating_add(1);
                            let delay = self.policy.delay(attempt);
                            error!(exchange, attempt, error = %err, "Retry in {:?}", delay);
                            sleep(delay).await;
                            AcquireState::Retrying { attempt }
                        }
                    }
                }
                AcquireState::Dialed(connection) => match self.open_channel(&connection).await {
                    Ok(channel) => AcquireState::Established(Session { connection, channel }),
                    Err(err) => {
                        error!(exchange, error = %err, "Publisher on {} is terminated", exchange);
                        if let Err(close_err) = connection.close().await {
                            warn!(error = %close_err, "Failed to close connection");
                        }
                        return Err(err);
                    }
                },
                AcquireState::Established(session) => return Ok(session),
            };
        }
    }

    async fn open_channel(
        &self,
        connection: &B::Connection,
    ) -> Result<<B::Connection as BrokerConnection>::Channel> {
        let channel = connection.open_channel().await?;
        channel.declare_exchange(&self.declaration).await?;
        Ok(channel)
    }
}
