use futures::{Stream, StreamExt};
use quill_types::Event;
use std::pin::Pin;

use crate::buffer_utils::{ChunkAssembler, FrameExtractor};
use crate::decoder::{EventDecoder, PayloadDecoder};

/// Output of the decode pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// A decoded frame, including unknown and malformed ones
    Event(Event),
    /// The termination sentinel was seen
    Done,
}

/// Synchronous fragment -> signal pipeline.
///
/// Chains [`ChunkAssembler`], [`FrameExtractor`] and a [`PayloadDecoder`].
/// Once the termination sentinel has been seen every later input is ignored.
pub struct StreamDecoder<D = EventDecoder> {
    assembler: ChunkAssembler,
    extractor: FrameExtractor,
    decoder: D,
    done: bool,
}

impl Default for StreamDecoder<EventDecoder> {
    fn default() -> Self {
        Self::new(EventDecoder::new())
    }
}

impl<D: PayloadDecoder> StreamDecoder<D> {
    pub fn new(decoder: D) -> Self {
        Self {
            assembler: ChunkAssembler::new(),
            extractor: FrameExtractor::new(),
            decoder,
            done: false,
        }
    }

    /// Feed one transport fragment, returning signals in stream order
    pub fn feed(&mut self, fragment: impl AsRef<[u8]>) -> Vec<Signal> {
        if self.done {
            return Vec::new();
        }
        let lines = self.assembler.feed(fragment);
        self.process(lines)
    }

    /// Flush a trailing unterminated line at end of input
    pub fn finish(&mut self) -> Vec<Signal> {
        if self.done {
            return Vec::new();
        }
        let lines: Vec<String> = self.assembler.finish().into_iter().collect();
        self.process(lines)
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    fn process(&mut self, lines: Vec<String>) -> Vec<Signal> {
        let mut signals = Vec::with_capacity(lines.len());

        for line in lines {
            let Some(frame) = self.extractor.extract(&line) else {
                if !line.is_empty() {
                    tracing::trace!(line = %line, "Skipping non-data line");
                }
                continue;
            };

            if frame.is_done() {
                self.done = true;
                self.assembler.reset();
                signals.push(Signal::Done);
                break;
            }

            signals.push(Signal::Event(self.decoder.decode(frame.payload())));
        }

        signals
    }
}

/// Decode a stream of transport fragments into signals.
///
/// Fragment errors are forwarded once and end the stream. The stream also
/// ends right after `Signal::Done`; when the source ends first, a trailing
/// unterminated line is still decoded.
pub fn decode_stream<S, B, E, D>(
    fragments: S,
    decoder: D,
) -> Pin<Box<dyn Stream<Item = Result<Signal, E>> + Send>>
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Send + 'static,
    D: PayloadDecoder + 'static,
{
    Box::pin(async_stream::stream! {
        let mut fragments = Box::pin(fragments);
        let mut pipeline = StreamDecoder::new(decoder);

        while let Some(fragment) = fragments.next().await {
            match fragment {
                Ok(bytes) => {
                    for signal in pipeline.feed(bytes) {
                        yield Ok(signal);
                    }
                    if pipeline.is_done() {
                        return;
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        for signal in pipeline.finish() {
            yield Ok(signal);
        }
    })
}
