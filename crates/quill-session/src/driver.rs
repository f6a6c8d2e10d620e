use futures::StreamExt;
use quill_stream::{decode_stream, EventDecoder, Signal};
use quill_types::{GenerateRequest, SessionConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::publish::StatePublisher;
use crate::reducer::SessionReducer;
use crate::state::SessionState;
use crate::transport::Transport;

/// Read loop for one submission.
///
/// Pulls fragments from the transport, decodes them and applies each event
/// to the session state in stream order, publishing a snapshot after every
/// step. The only suspension point is the wait for the next fragment.
pub struct StreamDriver {
    transport: Arc<dyn Transport>,
    reducer: SessionReducer,
}

impl StreamDriver {
    pub fn new(transport: Arc<dyn Transport>, config: SessionConfig) -> Self {
        Self {
            transport,
            reducer: SessionReducer::new(config),
        }
    }

    pub fn reducer(&self) -> &SessionReducer {
        &self.reducer
    }

    /// Run a submission from a freshly reset state
    pub async fn run<P>(
        &self,
        request: &GenerateRequest,
        publisher: &P,
        cancel: &CancellationToken,
    ) -> SessionState
    where
        P: StatePublisher + ?Sized,
    {
        let state = self.reducer.reset();
        self.run_with_state(state, request, publisher, cancel).await
    }

    /// Run a submission starting from `state`.
    ///
    /// Returns the last state reached. A cancelled or superseded run returns
    /// early without terminating its state.
    pub async fn run_with_state<P>(
        &self,
        mut state: SessionState,
        request: &GenerateRequest,
        publisher: &P,
        cancel: &CancellationToken,
    ) -> SessionState
    where
        P: StatePublisher + ?Sized,
    {
        let session_id = state.session_id().to_string();
        tracing::info!(session_id = %session_id, "Session started");

        if !publisher.publish(&state) {
            return state;
        }

        let opened = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(session_id = %session_id, "Cancelled before the stream opened");
                return state;
            }
            opened = self.transport.open(request) => opened,
        };

        let fragments = match opened {
            Ok(fragments) => fragments,
            Err(e) => {
                tracing::error!(session_id = %session_id, error = %e, "Failed to open stream");
                state = self.reducer.fail(state, e);
                publisher.publish(&state);
                return state;
            }
        };

        let mut signals = decode_stream(fragments, EventDecoder::new());

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                next = signals.next() => Some(next),
            };

            // Checked before every application so a stale loop never mutates
            let Some(next) = next.filter(|_| !cancel.is_cancelled()) else {
                tracing::debug!(session_id = %session_id, "Session cancelled");
                return state;
            };

            state = match next {
                Some(Ok(Signal::Event(event))) => self.reducer.apply(state, &event),
                Some(Ok(Signal::Done)) => self.reducer.terminate(state),
                Some(Err(e)) => {
                    tracing::error!(session_id = %session_id, error = %e, "Stream failed");
                    self.reducer.fail(state, e)
                }
                // End of input without the sentinel
                None => self.reducer.terminate(state),
            };

            if !publisher.publish(&state) {
                tracing::debug!(session_id = %session_id, "Snapshot rejected, stopping");
                return state;
            }

            if state.is_terminated() {
                tracing::info!(
                    session_id = %session_id,
                    failed = state.error().is_some(),
                    "Session terminated"
                );
                return state;
            }
        }
    }
}
