//! Progress streaming and cooperative cancellation
//!
//! Both engines report progress through a [`ProgressReporter`]. A reporter is
//! either silent or backed by a bounded tokio channel, so a slow consumer
//! applies backpressure instead of letting events pile up.
//!
//! Every checkpoint is also a suspension point: the engine yields to the
//! runtime, then looks at the cancel signal (a `watch` channel, the same
//! primitive the CLI uses for ctrl-c). What happens next depends on the
//! [`CancelPolicy`].
//!
//! # Example
//!
//! ```no_run
//! use sieve::protocol::{CancelPolicy, ProgressReporter};
//! use tokio::sync::watch;
//!
//! # async fn example() {
//! let (cancel_tx, cancel_rx) = watch::channel(false);
//! let (reporter, mut events) = ProgressReporter::channel(16);
//! let reporter = reporter.with_cancellation(cancel_rx, CancelPolicy::AbortNow);
//!
//! tokio::spawn(async move {
//!     while let Some(event) = events.recv().await {
//!         println!("{:>5.1}% {}", event.percent, event.message);
//!     }
//! });
//! # let _ = (reporter, cancel_tx);
//! # }
//! ```

use crate::domain::{Result, SieveError};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

/// Default number of rows between checkpoints
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// A single progress update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Completion in percent, 0.0 - 100.0
    pub percent: f64,
    /// What the engine is doing
    pub message: String,
}

/// What a run does once its cancel signal fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelPolicy {
    /// Stop at the next checkpoint and return [`SieveError::Cancelled`]; output is discarded
    #[default]
    AbortNow,
    /// Stop emitting progress but finish the run; the report is flagged `cancelled`
    DrainToCompletion,
}

impl std::str::FromStr for CancelPolicy {
    type Err = SieveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "abort_now" | "abort" => Ok(Self::AbortNow),
            "drain_to_completion" | "drain" => Ok(Self::DrainToCompletion),
            _ => Err(SieveError::Configuration(format!(
                "Invalid cancel policy: {s}. Expected 'abort_now' or 'drain_to_completion'"
            ))),
        }
    }
}

/// Progress sink and cancellation handle threaded through one engine call
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    sender: Option<mpsc::Sender<ProgressEvent>>,
    cancel: Option<watch::Receiver<bool>>,
    policy: CancelPolicy,
    batch_size: usize,
    draining: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::silent()
    }
}

impl ProgressReporter {
    /// A reporter that emits nothing and is never cancelled
    pub fn silent() -> Self {
        Self {
            sender: None,
            cancel: None,
            policy: CancelPolicy::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            draining: false,
        }
    }

    /// A reporter backed by a bounded channel of `capacity` events
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let reporter = Self {
            sender: Some(tx),
            ..Self::silent()
        };
        (reporter, rx)
    }

    /// Attach a cancel signal and the policy to apply when it fires
    pub fn with_cancellation(mut self, signal: watch::Receiver<bool>, policy: CancelPolicy) -> Self {
        self.cancel = Some(signal);
        self.policy = policy;
        self
    }

    /// Set the number of rows between checkpoints
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Rows between checkpoints
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Policy applied on cancellation
    pub fn policy(&self) -> CancelPolicy {
        self.policy
    }

    /// Whether the cancel signal has fired
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Whether the run observed a cancel under [`CancelPolicy::DrainToCompletion`]
    pub fn was_drained(&self) -> bool {
        self.draining
    }

    /// Row interval for a row-wise pass: every 1% of rows, capped at the batch size
    pub fn row_step(&self, total_rows: usize) -> usize {
        total_rows.div_ceil(100).max(1).min(self.batch_size)
    }

    /// Suspension point: yield, honour cancellation, then emit an event
    ///
    /// `processed` is reported back in [`SieveError::Cancelled`] when the run aborts.
    pub async fn checkpoint(
        &mut self,
        percent: f64,
        message: impl Into<String>,
        processed: usize,
    ) -> Result<()> {
        tokio::task::yield_now().await;

        if self.is_cancelled() {
            match self.policy {
                CancelPolicy::AbortNow => {
                    tracing::info!(processed, "Run cancelled, aborting");
                    return Err(SieveError::Cancelled { processed });
                }
                CancelPolicy::DrainToCompletion => {
                    if !self.draining {
                        tracing::info!(processed, "Run cancelled, draining to completion");
                    }
                    self.draining = true;
                    return Ok(());
                }
            }
        }

        self.emit(percent, message).await;
        Ok(())
    }

    /// Send an event unless draining; a dropped receiver silences the reporter
    pub async fn emit(&mut self, percent: f64, message: impl Into<String>) {
        if self.draining {
            return;
        }
        let Some(sender) = self.sender.as_ref() else {
            return;
        };

        let event = ProgressEvent {
            percent: percent.clamp(0.0, 100.0),
            message: message.into(),
        };
        if sender.send(event).await.is_err() {
            tracing::debug!("Progress receiver dropped; further events are discarded");
            self.sender = None;
        }
    }
}
