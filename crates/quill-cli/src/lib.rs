//! Terminal front end for Quill sessions: configuration, logging setup and
//! the snapshot-diffing view used by the `quill` binary.

pub mod config;
pub mod logging;
pub mod view;
