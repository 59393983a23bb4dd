// In-memory broker whose failures are scripted per dial, session and publish.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fanout_publisher::message::{Envelope, ExchangeDeclaration};
use fanout_publisher::rabbitmq::{Broker, BrokerChannel, BrokerConnection, RabbitMQError, Result};
use lapin::ExchangeKind;
use tokio::time::Instant;

/// Which operations fail. Sessions and publish attempts are numbered from 1.
#[derive(Debug, Default, Clone)]
pub struct Script {
    pub dial_failures: u32,
    pub channel_failures: HashSet<usize>,
    pub declare_failures: HashSet<usize>,
    pub publish_failures: HashSet<usize>,
    pub channel_close_failures: HashSet<usize>,
    pub connection_close_failures: HashSet<usize>,
}

#[derive(Debug, Clone)]
pub struct Declared {
    pub session: usize,
    pub name: String,
    pub fanout: bool,
    pub durable: bool,
    pub auto_delete: bool,
    pub internal: bool,
    pub nowait: bool,
}

#[derive(Debug, Clone)]
pub struct Delivered {
    pub session: usize,
    pub exchange: String,
    pub routing_key: String,
    pub mandatory: bool,
    pub immediate: bool,
    pub content_type: String,
    pub body: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct Record {
    pub urls: Vec<String>,
    pub dial_times: Vec<Instant>,
    pub sessions: usize,
    pub declared: Vec<Declared>,
    pub publish_attempts: usize,
    pub delivered: Vec<Delivered>,
    pub channel_closes: HashMap<usize, usize>,
    pub connection_closes: HashMap<usize, usize>,
}

impl Record {
    pub fn bodies(&self) -> Vec<String> {
        self.delivered
            .iter()
            .map(|d| String::from_utf8_lossy(&d.body).into_owned())
            .collect()
    }

    pub fn channel_closes(&self, session: usize) -> usize {
        self.channel_closes.get(&session).copied().unwrap_or(0)
    }

    pub fn connection_closes(&self, session: usize) -> usize {
        self.connection_closes.get(&session).copied().unwrap_or(0)
    }
}

#[derive(Default)]
struct State {
    script: Script,
    record: Record,
}

#[derive(Clone, Default)]
pub struct ScriptedBroker {
    state: Arc<Mutex<State>>,
}

impl ScriptedBroker {
    pub fn new(script: Script) -> Self {
        ScriptedBroker {
            state: Arc::new(Mutex::new(State {
                script,
                record: Record::default(),
            })),
        }
    }

    pub fn record<T>(&self, inspect: impl FnOnce(&Record) -> T) -> T {
        inspect(&self.state.lock().unwrap().record)
    }
}

pub struct ScriptedConnection {
    session: usize,
    state: Arc<Mutex<State>>,
}

pub struct ScriptedChannel {
    session: usize,
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl Broker for ScriptedBroker {
    type Connection = ScriptedConnection;

    async fn dial(&self, url: &str) -> Result<ScriptedConnection> {
        let mut state = self.state.lock().unwrap();
        state.record.urls.push(url.to_string());
        state.record.dial_times.push(Instant::now());
        if state.record.dial_times.len() as u32 <= state.script.dial_failures {
            return Err(RabbitMQError::DialError("Connection refused (os error 111)".to_string()));
        }
        state.record.sessions += 1;
        Ok(ScriptedConnection {
            session: state.record.sessions,
            state: Arc::clone(&self.state),
        })
    }
}

#[async_trait]
impl BrokerConnection for ScriptedConnection {
    type Channel = ScriptedChannel;

    async fn open_channel(&self) -> Result<ScriptedChannel> {
        let state = self.state.lock().unwrap();
        if state.script.channel_failures.contains(&self.session) {
            return Err(RabbitMQError::ChannelError("channels limit reached".to_string()));
        }
        Ok(ScriptedChannel {
            session: self.session,
            state: Arc::clone(&self.state),
        })
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        *state.record.connection_closes.entry(self.session).or_default() += 1;
        if state.script.connection_close_failures.contains(&self.session) {
            return Err(RabbitMQError::CloseError("connection reset by peer".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BrokerChannel for ScriptedChannel {
    async fn declare_exchange(&self, declaration: &ExchangeDeclaration) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.record.declared.push(Declared {
            session: self.session,
            name: declaration.name.clone(),
            fanout: matches!(declaration.kind, ExchangeKind::Fanout),
            durable: declaration.options.durable,
            auto_delete: declaration.options.auto_delete,
            internal: declaration.options.internal,
            nowait: declaration.options.nowait,
        });
        if state.script.declare_failures.contains(&self.session) {
            return Err(RabbitMQError::ExchangeDeclareError(
                "PRECONDITION_FAILED - inequivalent arg 'type'".to_string(),
            ));
        }
        Ok(())
    }

    async fn publish(&self, exchange: &str, envelope: &Envelope) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.record.publish_attempts += 1;
        if state.script.publish_failures.contains(&state.record.publish_attempts) {
            return Err(RabbitMQError::PublishError("broken pipe".to_string()));
        }
        state.record.delivered.push(Delivered {
            session: self.session,
            exchange: exchange.to_string(),
            routing_key: envelope.routing_key.clone(),
            mandatory: envelope.mandatory,
            immediate: envelope.immediate,
            content_type: envelope.content_type.to_string(),
            body: envelope.body.clone(),
        });
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        *state.record.channel_closes.entry(self.session).or_default() += 1;
        if state.script.channel_close_failures.contains(&self.session) {
            return Err(RabbitMQError::CloseError("channel already closed".to_string()));
        }
        Ok(())
    }
}
