use chrono::{DateTime, Utc};
use lapin::{
    options::{BasicPublishOptions, ExchangeDeclareOptions},
    BasicProperties, ExchangeKind,
};

pub const CONTENT_TYPE: &str = "text/plain";

/// One outbound publish: the raw payload plus the fixed envelope every
/// fanout message carries.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub routing_key: String,
    pub mandatory: bool,
    pub immediate: bool,
    pub content_type: &'static str,
    pub timestamp: DateTime<Utc>,
    pub body: Vec<u8>,
}

impl Envelope {
    /// Stamps the payload with the current wall clock time.
    pub fn fanout(body: Vec<u8>) -> Self {
        Envelope {
            routing_key: String::new(),
            mandatory: false,
            immediate: false,
            content_type: CONTENT_TYPE,
            timestamp: Utc::now(),
            body,
        }
    }

    pub fn publish_options(&self) -> BasicPublishOptions {
        BasicPublishOptions {
            mandatory: self.mandatory,
            immediate: self.immediate,
        }
    }

    pub fn properties(&self) -> BasicProperties {
        BasicProperties::default()
            .with_content_type(self.content_type.into())
            .with_timestamp(self.timestamp.timestamp() as u64)
    }
}

/// The exchange the publisher declares on every (re)connect.
#[derive(Clone, Debug)]
pub struct ExchangeDeclaration {
    pub name: String,
    pub kind: ExchangeKind,
    pub options: ExchangeDeclareOptions,
}

impl ExchangeDeclaration {
    pub fn fanout(name: impl Into<String>) -> Self {
        ExchangeDeclaration {
            name: name.into(),
            kind: ExchangeKind::Fanout,
            options: ExchangeDeclareOptions {
                passive: false,
                durable: true,
                auto_delete: false,
                internal: false,
                nowait: false,
            },
        }
    }
}
