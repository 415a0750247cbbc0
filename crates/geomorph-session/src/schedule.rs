//! Recurring tasks with explicit cancellation.
//!
//! A [`RecurringTask`] owns a tokio task that ticks on a fixed period and
//! forwards one message per tick into the runtime's event channel. The message
//! is built from an immutable snapshot taken when the task was spawned, so a
//! tick can always be matched against the state it was scheduled for.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

/// A periodic task that stops when cancelled or dropped.
#[derive(Debug)]
pub struct RecurringTask {
    name: &'static str,
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RecurringTask {
    /// Spawns a task that sends `make(&snapshot)` to `sink` every `period`.
    ///
    /// The first tick fires one full period after spawning. The task ends on
    /// its own once `sink` is closed.
    pub fn spawn<S, T, F>(
        name: &'static str,
        period: Duration,
        snapshot: S,
        sink: mpsc::UnboundedSender<T>,
        make: F,
    ) -> Self
    where
        S: Send + 'static,
        T: Send + 'static,
        F: Fn(&S) -> T + Send + 'static,
    {
        let (cancel, mut cancelled) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if sink.send(make(&snapshot)).is_err() {
                            break;
                        }
                    }
                    changed = cancelled.changed() => {
                        if changed.is_err() || *cancelled.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!(task = name, "Recurring task stopped");
        });
        Self {
            name,
            cancel,
            handle,
        }
    }

    /// Stops the task; no tick is delivered after this returns to the caller's
    /// event loop.
    pub fn cancel(&self) {
        if !*self.cancel.borrow() {
            debug!(task = self.name, "Cancelling recurring task");
            self.cancel.send_replace(true);
        }
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Returns `true` if the underlying task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RecurringTask {
    fn drop(&mut self) {
        self.cancel();
        self.handle.abort();
    }
}
