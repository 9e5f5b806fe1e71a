//! UI-affinity executor
//!
//! Some platform reads (key window safe area) and all haptic primitives must
//! run on the thread that owns the UI. [`UiExecutor`] is the handle the core
//! uses to get there:
//!
//! - [`UiExecutor::run_sync`] hands a closure to the UI thread and blocks the
//!   caller until the result comes back. Called from the UI thread itself it
//!   runs the closure inline, so it can never wait on itself.
//! - [`UiExecutor::dispatch`] queues a closure and returns immediately.
//!
//! The UI thread is either a dedicated thread started by
//! [`UiExecutor::spawn`], or a host-owned thread attached with
//! [`UiExecutor::attach_current`] that drains jobs through [`UiQueue::run_pending`].
//!
//! Callers of `run_sync` must not hold a lock the UI thread could need.

use std::sync::mpsc as std_mpsc;
use std::thread::{self, ThreadId};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{Result, StrataError};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Cloneable handle to the UI-affinity thread
#[derive(Clone, Debug)]
pub struct UiExecutor {
    sender: mpsc::UnboundedSender<Job>,
    thread_id: ThreadId,
}

/// Job queue of a host-owned UI thread
///
/// Must be drained from the thread that called [`UiExecutor::attach_current`].
pub struct UiQueue {
    receiver: mpsc::UnboundedReceiver<Job>,
}

impl UiExecutor {
    /// Starts a dedicated thread that runs queued jobs until every handle is dropped
    pub fn spawn(name: &str) -> Result<Self> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                debug!("UI executor thread started");
                while let Some(job) = receiver.blocking_recv() {
                    job();
                }
                debug!("UI executor queue closed, thread exiting");
            })
            .map_err(|e| StrataError::Executor(format!("Failed to spawn UI thread: {}", e)))?;

        Ok(Self {
            sender,
            thread_id: handle.thread().id(),
        })
    }

    /// Declares the calling thread as the UI thread
    ///
    /// Jobs submitted from other threads wait until the host calls
    /// [`UiQueue::run_pending`] on this thread.
    pub fn attach_current() -> (Self, UiQueue) {
        let (sender, receiver) = mpsc::unbounded_channel::<Job>();
        let executor = Self {
            sender,
            thread_id: thread::current().id(),
        };
        (executor, UiQueue { receiver })
    }

    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Runs `job` on the UI thread and waits for its result
    pub fn run_sync<R, F>(&self, job: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        if self.is_ui_thread() {
            return Ok(job());
        }

        let (reply_tx, reply_rx) = std_mpsc::sync_channel(1);
        self.sender
            .send(Box::new(move || {
                // Receiver only goes away if the caller stopped waiting
                let _ = reply_tx.send(job());
            }))
            .map_err(|_| StrataError::Executor("UI thread is no longer running".to_string()))?;

        reply_rx
            .recv()
            .map_err(|_| StrataError::Executor("UI thread dropped the job".to_string()))
    }

    /// Queues `job` on the UI thread without waiting for it
    pub fn dispatch<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.sender.send(Box::new(job)).map_err(|_| {
            warn!("Dropping UI job, executor is no longer running");
            StrataError::Executor("UI thread is no longer running".to_string())
        })
    }
}

impl UiQueue {
    /// Runs every job queued so far, returns how many ran
    pub fn run_pending(&mut self) -> usize {
        let mut count = 0;
        while let Ok(job) = self.receiver.try_recv() {
            job();
            count += 1;
        }
        count
    }
}
