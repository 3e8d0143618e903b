//! Single-owner execution context for platform-bound work.
//!
//! Background code never touches main-context resources directly; it hands a
//! closure to a [`MainContextInvoker`], and the one thread running
//! [`MainContext::run`] executes those closures strictly in submission order,
//! one at a time.
//!
//! `invoke` only enqueues. It never runs the work synchronously and never
//! waits for it, on every target. The only thing allocated on the caller's
//! side is the boxed closure, which moves into the queue.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use thiserror::Error;

type Work = Box<dyn FnOnce() + Send + 'static>;
type ScopeFactory = Box<dyn Fn() -> Box<dyn Any> + Send + 'static>;

enum Message {
    Run(Work),
    Shutdown,
}

/// Errors returned synchronously by [`MainContextInvoker`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvokeError {
    #[error("Main context is not running")]
    ContextUnavailable,
}

/// Consumer side: owns the queue and executes work on whichever thread runs it.
pub struct MainContext {
    receiver: Receiver<Message>,
    scope: Option<ScopeFactory>,
}

/// Submission side. Cheap to clone and safe to use from any thread.
#[derive(Clone)]
pub struct MainContextInvoker {
    sender: Sender<Message>,
    // Set once the stop marker is queued; held for reading while enqueueing
    // so no unit can land behind the marker.
    closed: Arc<RwLock<bool>>,
}

impl MainContext {
    pub fn new() -> (Self, MainContextInvoker) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (
            Self {
                receiver,
                scope: None,
            },
            MainContextInvoker {
                sender,
                closed: Arc::new(RwLock::new(false)),
            },
        )
    }

    /// Acquire a scope around each unit of work.
    ///
    /// The guard returned by `factory` is created right before the work runs
    /// and dropped right after, also when the work panics.
    pub fn with_scope<F, G>(mut self, factory: F) -> Self
    where
        F: Fn() -> G + Send + 'static,
        G: 'static,
    {
        self.scope = Some(Box::new(move || Box::new(factory()) as Box<dyn Any>));
        self
    }

    /// Execute queued work on the current thread.
    ///
    /// Returns after a [`MainContextInvoker::shutdown`] marker is reached or
    /// once every invoker has been dropped and the queue is drained.
    pub fn run(self) {
        crate::debug_event!("main-context", "running");
        let mut executed = 0usize;

        for message in self.receiver.iter() {
            match message {
                Message::Run(work) => {
                    self.execute(work);
                    executed += 1;
                }
                Message::Shutdown => break,
            }
        }

        crate::debug_event!("main-context", "stopped", "{executed} units executed");
    }

    /// Run the context on a dedicated, named thread.
    pub fn spawn(self, name: &str) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || self.run())
    }

    fn execute(&self, work: Work) {
        let _scope = self.scope.as_ref().map(|factory| factory());

        if panic::catch_unwind(AssertUnwindSafe(work)).is_err() {
            tracing::error!("[main-context] work panicked; context keeps running");
        }
    }
}

impl MainContextInvoker {
    /// Enqueue `work` and return without waiting for it.
    ///
    /// Fails once [`shutdown`](Self::shutdown) was requested or the context
    /// is gone; accepted work always runs.
    pub fn invoke<F>(&self, work: F) -> Result<(), InvokeError>
    where
        F: FnOnce() + Send + 'static,
    {
        let closed = self.closed.read();
        if *closed {
            return Err(InvokeError::ContextUnavailable);
        }
        self.sender
            .send(Message::Run(Box::new(work)))
            .map_err(|_| InvokeError::ContextUnavailable)
    }

    /// Enqueue `work`; its result arrives on the returned receiver once it ran.
    pub fn invoke_with_reply<F, T>(&self, work: F) -> Result<Receiver<T>, InvokeError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        self.invoke(move || {
            // Caller may have stopped listening
            let _ = reply_tx.send(work());
        })?;
        Ok(reply_rx)
    }

    /// Ask the context to stop after the work already submitted.
    pub fn shutdown(&self) -> Result<(), InvokeError> {
        let mut closed = self.closed.write();
        if *closed {
            return Err(InvokeError::ContextUnavailable);
        }
        self.sender
            .send(Message::Shutdown)
            .map_err(|_| InvokeError::ContextUnavailable)?;
        *closed = true;
        Ok(())
    }

    /// Whether new work would be rejected.
    pub fn is_closed(&self) -> bool {
        *self.closed.read()
    }

    /// Units submitted but not yet started.
    pub fn pending(&self) -> usize {
        self.sender.len()
    }
}

impl std::fmt::Debug for MainContextInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainContextInvoker")
            .field("pending", &self.pending())
            .finish()
    }
}
