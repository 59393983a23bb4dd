// src/rabbitmq/ready.rs
use std::sync::atomic::{AtomicBool, Ordering};

/// One-way flag: once marked it stays set for the life of the value.
#[derive(Debug, Default)]
pub struct ReadyLatch {
    ready: AtomicBool,
}

impl ReadyLatch {
    pub fn new() -> Self {
        ReadyLatch::default()
    }

    pub fn mark(&self) {
        self.ready.store(true, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}
