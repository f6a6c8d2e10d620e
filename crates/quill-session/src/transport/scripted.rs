use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use quill_types::{GenerateRequest, TransportError};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::{FragmentStream, Transport};

/// In-memory transport replaying a fixed list of fragments.
///
/// Every `open` replays the same script and records the request, which makes
/// the driver deterministic to exercise without a server.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    steps: Vec<Result<Bytes, TransportError>>,
    open_error: Option<TransportError>,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<GenerateRequest>>>,
}

impl ScriptedTransport {
    pub fn new<I, B>(fragments: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self {
            steps: fragments.into_iter().map(|f| Ok(f.into())).collect(),
            ..Self::default()
        }
    }

    /// Transport whose `open` fails, e.g. with a non-success status
    pub fn failing(error: TransportError) -> Self {
        Self {
            open_error: Some(error),
            ..Self::default()
        }
    }

    /// Append a read failure after the scripted fragments
    pub fn with_read_error(mut self, error: TransportError) -> Self {
        self.steps.push(Err(error));
        self
    }

    /// Wait this long before delivering each fragment
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open(&self, request: &GenerateRequest) -> Result<FragmentStream, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        if let Some(error) = &self.open_error {
            return Err(error.clone());
        }

        let steps = futures::stream::iter(self.steps.clone());
        match self.delay {
            Some(delay) => Ok(Box::pin(steps.then(move |step| async move {
                tokio::time::sleep(delay).await;
                step
            }))),
            None => Ok(Box::pin(steps)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_fragments_and_records_requests() {
        let transport = ScriptedTransport::new(["data: a\n", "data: b\n"])
            .with_read_error(TransportError::Read("eof".to_string()));

        let items: Vec<_> = transport
            .open(&GenerateRequest::new("hi"))
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(items.len(), 3);
        assert_eq!(items[0], Ok(Bytes::from_static(b"data: a\n")));
        assert!(items[2].is_err());
        assert_eq!(transport.requests(), vec![GenerateRequest::new("hi")]);
    }

    #[tokio::test]
    async fn test_failing_open() {
        let transport = ScriptedTransport::failing(TransportError::Status(400));

        let result = transport.open(&GenerateRequest::new("")).await;
        assert!(matches!(result, Err(TransportError::Status(400))));
    }
}
