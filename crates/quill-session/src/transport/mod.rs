mod http;
mod scripted;

pub use http::{HttpTransport, HttpTransportBuilder, DEFAULT_ENDPOINT};
pub use scripted::ScriptedTransport;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use quill_types::{GenerateRequest, TransportError};
use std::pin::Pin;

/// Raw body fragments in delivery order
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Source of the streamed response body for one submission
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return the body as it arrives.
    ///
    /// Non-success statuses and connection failures are errors here; read
    /// failures surface as `Err` items of the stream.
    async fn open(&self, request: &GenerateRequest) -> Result<FragmentStream, TransportError>;
}
