mod buffering;
mod sse_parser;

pub use buffering::ChunkAssembler;
pub use sse_parser::{Frame, FrameExtractor, DATA_PREFIX, DONE_SENTINEL};
