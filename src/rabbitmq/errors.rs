// src/rabbitmq/errors.rs

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RabbitMQError {
    #[error("RabbitMQ dial error: {0}")]
    DialError(String),

    #[error("RabbitMQ channel error: {0}")]
    ChannelError(String),

    #[error("RabbitMQ exchange declare error: {0}")]
    ExchangeDeclareError(String),

    #[error("RabbitMQ publish error: {0}")]
    PublishError(String),

    #[error("RabbitMQ close error: {0}")]
    CloseError(String),

    #[error("Invalid broker URL: {0}")]
    InvalidUrl(String),
}

// Custom Result type for RabbitMQ operations
pub type Result<T> = std::result::Result<T, RabbitMQError>;

impl From<url::ParseError> for RabbitMQError {
    fn from(error: url::ParseError) -> Self {
        RabbitMQError::InvalidUrl(error.to_string())
    }
}
