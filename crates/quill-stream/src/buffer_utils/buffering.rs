use std::collections::VecDeque;

/// Reassembles complete lines from arbitrarily split fragments.
///
/// Bytes are buffered until a `\n` arrives, so fragments may cut through a
/// line, a JSON payload or a multi-byte character. A `\r` immediately before
/// the `\n` is dropped, even when the two arrive in different fragments.
#[derive(Debug)]
pub struct ChunkAssembler {
    buffer: VecDeque<u8>,
    /// Leading bytes of `buffer` already known to hold no `\n`
    scanned: usize,
}

impl Default for ChunkAssembler {
    fn default() -> Self {
        Self::with_capacity(4096)
    }
}

impl ChunkAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            scanned: 0,
        }
    }

    /// Append a fragment and return every line it completed, in order
    pub fn feed(&mut self, fragment: impl AsRef<[u8]>) -> Vec<String> {
        self.buffer.extend(fragment.as_ref());

        let mut lines = Vec::new();
        while let Some(line) = self.next_line() {
            lines.push(line);
        }
        lines
    }

    /// Drain the unterminated remainder as a final line
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }

        self.scanned = 0;
        let line_bytes: Vec<u8> = self.buffer.drain(..).collect();
        Some(decode_line(line_bytes))
    }

    /// Drop any buffered partial line
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
    }

    /// Bytes waiting for a line terminator
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    fn next_line(&mut self) -> Option<String> {
        let Some(offset) = self.buffer.range(self.scanned..).position(|&b| b == b'\n') else {
            self.scanned = self.buffer.len();
            return None;
        };
        let newline_pos = self.scanned + offset;
        self.scanned = 0;

        let mut line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
        line_bytes.pop();

        Some(decode_line(line_bytes))
    }
}

fn decode_line(mut bytes: Vec<u8>) -> String {
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }

    match String::from_utf8(bytes) {
        Ok(line) => line,
        Err(e) => {
            tracing::warn!(error = %e.utf8_error(), "Replacing invalid UTF-8 in stream line");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}
