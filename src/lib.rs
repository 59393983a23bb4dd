//! Resilient publisher that forwards in-process payloads to a RabbitMQ
//! fanout exchange, reconnecting whenever the broker drops it.

pub mod config;
pub mod message;
pub mod rabbitmq;

pub use config::{BrokerConfig, PublisherSettings, ReconnectSettings};
pub use message::{Envelope, ExchangeDeclaration};
pub use rabbitmq::{Publisher, RabbitMQError};
