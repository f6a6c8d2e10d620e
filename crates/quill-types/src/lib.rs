//! Shared types for Quill agent streams: the decoded [`Event`] model, the
//! generation request body, session configuration and error types.

pub mod config;
pub mod error;
pub mod events;
pub mod request;

pub use config::{Policy, SessionConfig};
pub use error::{DecodeError, TransportError};
pub use events::Event;
pub use request::GenerateRequest;
