use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of the transport delivering the stream.
///
/// Fatal to the session that observed it. Kept `Clone` so it can be stored
/// inside published session snapshots.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum TransportError {
    #[error("HTTP error! status: {0}")]
    Status(u16),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Stream read error: {0}")]
    Read(String),
}

/// Failure to turn a frame payload into a known event.
///
/// Never fatal: the decoder reports it as `Event::Malformed`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Invalid JSON: {0}")]
    Json(String),

    #[error("Invalid {kind} event: {message}")]
    Shape { kind: String, message: String },
}
