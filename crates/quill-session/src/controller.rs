use quill_types::GenerateRequest;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::driver::StreamDriver;
use crate::publish::Broadcast;
use crate::state::SessionState;

/// Owns the published session and the loop feeding it.
///
/// Each submission resets the state and cancels the previous loop, so late
/// fragments of an older request never reach the new session.
pub struct SessionController {
    driver: Arc<StreamDriver>,
    broadcast: Arc<Broadcast>,
    current: Mutex<Option<CancellationToken>>,
}

impl SessionController {
    pub fn new(driver: StreamDriver) -> Self {
        let broadcast = Broadcast::new(driver.reducer().reset());
        Self {
            driver: Arc::new(driver),
            broadcast: Arc::new(broadcast),
            current: Mutex::new(None),
        }
    }

    /// Snapshots of the current session, latest value only
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.broadcast.latest().subscribe()
    }

    /// Every snapshot published from now on, one per processed event.
    ///
    /// Snapshots of superseded sessions are filtered out like on `subscribe`.
    pub fn subscribe_events(&self) -> mpsc::UnboundedReceiver<SessionState> {
        self.broadcast.subscribe_events()
    }

    pub fn current(&self) -> SessionState {
        self.broadcast.latest().borrow().clone()
    }

    /// Start a new session in the background.
    ///
    /// Must be called from within a Tokio runtime. The handle resolves to the
    /// session's last state.
    pub fn submit(&self, instruction: impl Into<String>) -> JoinHandle<SessionState> {
        let request = GenerateRequest::new(instruction);
        let cancel = CancellationToken::new();

        if let Some(previous) = self.replace_token(Some(cancel.clone())) {
            previous.cancel();
        }

        let state = self.driver.reducer().reset();
        // Event subscribers get the reset state from the driver's first publish
        self.broadcast.reset(state.clone());

        let driver = Arc::clone(&self.driver);
        let broadcast = Arc::clone(&self.broadcast);

        tokio::spawn(async move {
            driver
                .run_with_state(state, &request, broadcast.as_ref(), &cancel)
                .await
        })
    }

    /// Stop the in-flight session, marking it terminated
    pub fn cancel(&self) {
        let Some(token) = self.replace_token(None) else {
            return;
        };
        token.cancel();

        let reducer = self.driver.reducer();
        self.broadcast.update(|current| {
            if current.is_terminated() {
                return false;
            }
            *current = reducer.terminate(current.clone());
            true
        });
    }

    fn replace_token(&self, token: Option<CancellationToken>) -> Option<CancellationToken> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, token)
    }
}
