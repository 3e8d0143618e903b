//! Common handlers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use reposync::{ActivityError, ChangeDescriptor, RepositoryHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// How a [`Recorder`] behaves when notified.
#[derive(Clone, Copy)]
pub enum Behavior {
    Succeed,
    Fail,
    Panic,
}

/// Sends every descriptor it receives to a channel, after an optional delay.
pub struct Recorder {
    name: String,
    delay: Duration,
    behavior: Behavior,
    tx: UnboundedSender<ChangeDescriptor>,
}

impl Recorder {
    pub fn new(name: &str, tx: UnboundedSender<ChangeDescriptor>) -> Self {
        Self {
            name: name.to_string(),
            delay: Duration::ZERO,
            behavior: Behavior::Succeed,
            tx,
        }
    }

    pub fn slow(name: &str, delay: Duration, tx: UnboundedSender<ChangeDescriptor>) -> Self {
        Self {
            delay,
            ..Self::new(name, tx)
        }
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn into_handle(self) -> Arc<dyn RepositoryHandle> {
        Arc::new(self)
    }
}

#[async_trait]
impl RepositoryHandle for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn notify_activity(&self, descriptor: ChangeDescriptor) -> Result<(), ActivityError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.behavior {
            Behavior::Succeed => {
                let _ = self.tx.send(descriptor);
                Ok(())
            }
            Behavior::Fail => Err(ActivityError::handler_failed(
                &descriptor.repository,
                "simulated failure",
            )),
            Behavior::Panic => panic!("simulated panic in {}", self.name),
        }
    }
}
