/// Field prefix of lines carrying a frame
pub const DATA_PREFIX: &str = "data: ";

/// Payload announcing that no more frames follow
pub const DONE_SENTINEL: &str = "[DONE]";

/// Payload of one `data: ` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    payload: String,
}

impl Frame {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Compared on the raw payload, before any JSON parsing
    pub fn is_done(&self) -> bool {
        self.payload == DONE_SENTINEL
    }
}

/// Picks frame lines out of the stream.
///
/// Anything without the data prefix (comments, keep-alives, blank separators,
/// `event:` fields) is skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameExtractor;

impl FrameExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, line: &str) -> Option<Frame> {
        line.strip_prefix(DATA_PREFIX).map(Frame::new)
    }
}
