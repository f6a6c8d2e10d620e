//! Decoding of line-delimited agent event streams.
//!
//! Transport fragments flow through [`ChunkAssembler`] (line reassembly),
//! [`FrameExtractor`] (`data: ` framing) and [`EventDecoder`] (JSON events).
//! [`StreamDecoder`] chains the three synchronously; [`decode_stream`] adapts
//! it to an async fragment stream.

pub mod buffer_utils;
pub mod decoder;
pub mod streaming;

pub use buffer_utils::{ChunkAssembler, Frame, FrameExtractor, DATA_PREFIX, DONE_SENTINEL};
pub use decoder::{EventDecoder, PayloadDecoder};
pub use streaming::{decode_stream, Signal, StreamDecoder};
