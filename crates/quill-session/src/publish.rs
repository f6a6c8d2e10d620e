use std::sync::{Mutex, PoisonError};
use tokio::sync::{mpsc, watch};

use crate::state::SessionState;

/// Sink for successive session snapshots
pub trait StatePublisher: Send + Sync {
    /// Publish a snapshot.
    ///
    /// Returns `false` when the snapshot was rejected (the observer is gone
    /// or follows a newer session); the driver stops on rejection.
    fn publish(&self, state: &SessionState) -> bool;
}

/// Latest-value channel for views.
///
/// Only snapshots of the session currently held by the channel are accepted,
/// and a terminated session is final. A superseded or cancelled loop cannot
/// overwrite what observers already saw.
impl StatePublisher for watch::Sender<SessionState> {
    fn publish(&self, state: &SessionState) -> bool {
        let mut accepted = false;
        self.send_if_modified(|current| {
            if current.session_id() != state.session_id() || current.is_terminated() {
                return false;
            }
            accepted = true;
            *current = state.clone();
            true
        });
        accepted
    }
}

/// Every snapshot, in order
impl StatePublisher for mpsc::UnboundedSender<SessionState> {
    fn publish(&self, state: &SessionState) -> bool {
        self.send(state.clone()).is_ok()
    }
}

/// Latest value plus ordered per-event feeds for one controller.
///
/// The watch channel decides acceptance; only accepted snapshots are
/// forwarded to event subscribers, so they see the same filtered sequence.
pub(crate) struct Broadcast {
    latest: watch::Sender<SessionState>,
    events: Mutex<Vec<mpsc::UnboundedSender<SessionState>>>,
}

impl Broadcast {
    pub(crate) fn new(initial: SessionState) -> Self {
        let (latest, _) = watch::channel(initial);
        Self {
            latest,
            events: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn latest(&self) -> &watch::Sender<SessionState> {
        &self.latest
    }

    pub(crate) fn subscribe_events(&self) -> mpsc::UnboundedReceiver<SessionState> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock_events().push(tx);
        rx
    }

    /// Replace the current session without notifying event subscribers
    pub(crate) fn reset(&self, state: SessionState) {
        let _events = self.lock_events();
        self.latest.send_replace(state);
    }

    /// Apply `modify` to the current state, forwarding the result when it changed
    pub(crate) fn update(&self, modify: impl FnOnce(&mut SessionState) -> bool) {
        let mut events = self.lock_events();
        let mut changed = None;
        self.latest.send_if_modified(|current| {
            if !modify(current) {
                return false;
            }
            changed = Some(current.clone());
            true
        });
        if let Some(state) = changed {
            events.retain(|tx| tx.send(state.clone()).is_ok());
        }
    }

    fn lock_events(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::UnboundedSender<SessionState>>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StatePublisher for Broadcast {
    fn publish(&self, state: &SessionState) -> bool {
        // Held across both channels so every subscriber sees one order
        let mut events = self.lock_events();
        if !self.latest.publish(state) {
            return false;
        }
        events.retain(|tx| tx.send(state.clone()).is_ok());
        true
    }
}
