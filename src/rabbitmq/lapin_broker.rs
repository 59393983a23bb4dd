// src/rabbitmq/lapin_broker.rs
use async_trait::async_trait;
use lapin::{types::FieldTable, Channel, Connection, ConnectionProperties};

use super::broker::{Broker, BrokerChannel, BrokerConnection};
use super::errors::{RabbitMQError, Result};
use crate::message::{Envelope, ExchangeDeclaration};

const REPLY_SUCCESS: u16 = 200;

/// Dials RabbitMQ through lapin.
#[derive(Clone, Default)]
pub struct LapinBroker {
    properties: ConnectionProperties,
}

impl LapinBroker {
    /// Advertises `name` as the client connection name in the management UI.
    pub fn with_connection_name(name: &str) -> Self {
        LapinBroker {
            properties: ConnectionProperties::default().with_connection_name(name.into()),
        }
    }
}

#[async_trait]
impl Broker for LapinBroker {
    type Connection = Connection;

    async fn dial(&self, url: &str) -> Result<Connection> {
        Connection::connect(url, self.properties.clone())
            .await
            .map_err(|e| RabbitMQError::DialError(e.to_string()))
    }
}

#[async_trait]
impl BrokerConnection for Connection {
    type Channel = Channel;

    async fn open_channel(&self) -> Result<Channel> {
        self.create_channel()
            .await
            .map_err(|e| RabbitMQError::ChannelError(e.to_string()))
    }

    async fn close(&self) -> Result<()> {
        Connection::close(self, REPLY_SUCCESS, "Closing publisher")
            .await
            .map_err(|e| RabbitMQError::CloseError(e.to_string()))
    }
}

#[async_trait]
impl BrokerChannel for Channel {
    async fn declare_exchange(&self, declaration: &ExchangeDeclaration) -> Result<()> {
        self.exchange_declare(
            &declaration.name,
            declaration.kind.clone(),
            declaration.options,
            FieldTable::default(),
        )
        .await
        .map_err(|e| RabbitMQError::ExchangeDeclareError(e.to_string()))
    }

    async fn publish(&self, exchange: &str, envelope: &Envelope) -> Result<()> {
        // No confirm_select on this channel, so the returned confirm is dropped.
        self.basic_publish(
            exchange,
            &envelope.routing_key,
            envelope.publish_options(),
            &envelope.body,
            envelope.properties(),
        )
        .await
        .map(|_confirm| ())
        .map_err(|e| RabbitMQError::PublishError(e.to_string()))
    }

    async fn close(&self) -> Result<()> {
        Channel::close(self, REPLY_SUCCESS, "Closing publisher")
            .await
            .map_err(|e| RabbitMQError::CloseError(e.to_string()))
    }
}
