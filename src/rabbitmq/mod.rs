// src/rabbitmq/mod.rs
// RabbitMQ fanout publishing with automatic reconnect

pub mod backoff;
pub mod broker;
pub mod connection;
pub mod errors;
pub mod lapin_broker;
pub mod publisher;
pub mod ready;

// Re-export specific items to simplify imports elsewhere
pub use backoff::{ExponentialBackoff, FixedInterval, ReconnectPolicy};
pub use broker::{Broker, BrokerChannel, BrokerConnection};
pub use connection::{ConnectionManager, Session};
pub use errors::{RabbitMQError, Result};
pub use lapin_broker::LapinBroker;
pub use publisher::Publisher;
pub use ready::ReadyLatch;
