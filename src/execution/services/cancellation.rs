//! In-process cancellation signals for active runs.

use crate::execution::domain::RunId;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

/// Outcome of [`CancellationRegistry::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelRequest {
    /// The pipeline's signal was tripped.
    Signalled,
    /// The pipeline already claimed its completion; the signal was left
    /// untouched.
    Committing,
    /// No pipeline is registered for the run.
    Unregistered,
}

#[derive(Debug)]
struct Entry {
    sender: watch::Sender<bool>,
    committing: bool,
}

/// Registry of cancellation senders keyed by run.
///
/// The pipeline registers its run before storing it and releases it when it
/// returns. Before writing its completed state the pipeline claims the
/// commit with [`Self::begin_commit`]; from then on cancellation requests
/// are refused, and a request that arrived first makes the claim fail.
#[derive(Debug, Clone, Default)]
pub struct CancellationRegistry {
    entries: Arc<Mutex<HashMap<RunId, Entry>>>,
}

impl CancellationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `run_id` and returns the signal its pipeline listens on.
    #[must_use]
    pub fn register(&self, run_id: RunId) -> CancellationSignal {
        let (sender, receiver) = watch::channel(false);
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                run_id,
                Entry {
                    sender,
                    committing: false,
                },
            );
        CancellationSignal { receiver }
    }

    /// Trips the signal of `run_id` unless its pipeline is committing.
    #[must_use]
    pub fn cancel(&self, run_id: RunId) -> CancelRequest {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(&run_id) {
            None => CancelRequest::Unregistered,
            Some(entry) if entry.committing => CancelRequest::Committing,
            Some(entry) => {
                entry.sender.send_replace(true);
                CancelRequest::Signalled
            }
        }
    }

    /// Claims the completion of `run_id`.
    ///
    /// Returns `false` when cancellation was already requested. Unregistered
    /// runs can always commit.
    #[must_use]
    pub fn begin_commit(&self, run_id: RunId) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get_mut(&run_id).is_none_or(|entry| {
            if *entry.sender.borrow() {
                return false;
            }
            entry.committing = true;
            true
        })
    }

    /// Forgets `run_id`.
    pub fn release(&self, run_id: RunId) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&run_id);
    }

    /// Returns `true` while a pipeline is registered for `run_id`.
    #[must_use]
    pub fn is_registered(&self, run_id: RunId) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&run_id)
    }
}

/// Receiving half of a run's cancellation signal.
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    receiver: watch::Receiver<bool>,
}

impl CancellationSignal {
    /// Returns a signal that never fires.
    #[must_use]
    pub fn never() -> Self {
        let (_sender, receiver) = watch::channel(false);
        Self { receiver }
    }

    /// Returns `true` once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves when cancellation is requested.
    ///
    /// Pends forever if the registry dropped the sender without cancelling.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        if receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Drives `future` to completion unless cancellation wins first.
    ///
    /// An already-tripped signal wins even against a ready future.
    pub async fn run_until_cancelled<F: Future>(&self, future: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            () = self.cancelled() => None,
            output = future => Some(output),
        }
    }
}
