//! Session state for Quill agent streams.
//!
//! [`SessionReducer`] folds decoded events into a [`SessionState`] under one of
//! three aggregation policies. [`StreamDriver`] runs the read loop over a
//! [`Transport`], and [`SessionController`] handles submissions, publishing
//! snapshots to subscribers and cancelling superseded loops.

pub mod controller;
pub mod driver;
pub mod publish;
pub mod reducer;
pub mod render;
pub mod state;
pub mod transport;

pub use controller::SessionController;
pub use driver::StreamDriver;
pub use publish::StatePublisher;
pub use reducer::SessionReducer;
pub use render::{render_output, render_snapshot};
pub use state::{AgentState, SessionState};
pub use transport::{
    FragmentStream, HttpTransport, HttpTransportBuilder, ScriptedTransport, Transport,
    DEFAULT_ENDPOINT,
};

// Re-export key types from quill-types
pub use quill_types::{Event, GenerateRequest, Policy, SessionConfig, TransportError};
