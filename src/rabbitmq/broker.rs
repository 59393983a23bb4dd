// src/rabbitmq/broker.rs
// Seam between the publish loop and the AMQP client library.

use async_trait::async_trait;

use super::errors::Result;
use crate::message::{Envelope, ExchangeDeclaration};

#[async_trait]
pub trait Broker: Send + Sync {
    type Connection: BrokerConnection;

    async fn dial(&self, url: &str) -> Result<Self::Connection>;
}

#[async_trait]
pub trait BrokerConnection: Send + Sync {
    type Channel: BrokerChannel;

    async fn open_channel(&self) -> Result<Self::Channel>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait BrokerChannel: Send + Sync {
    async fn declare_exchange(&self, declaration: &ExchangeDeclaration) -> Result<()>;

    /// Fire-and-forget: success means the frame was handed to the broker,
    /// not that it was confirmed.
    async fn publish(&self, exchange: &str, envelope: &Envelope) -> Result<()>;

    async fn close(&self) -> Result<()>;
}
