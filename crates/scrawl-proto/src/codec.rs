//! Brace-framing codec for tokio.
//!
//! The legacy scrawl clients do not length-prefix or delimit their JSON
//! messages; the only frame boundary on the wire is the closing brace of the
//! object itself. This codec reproduces that contract byte-for-byte: a frame
//! is everything up to and including the first `}` in the buffer.
//!
//! The scheme is correct only for flat JSON objects with no literal `}`
//! inside string values. That weakness is part of the wire contract and is
//! kept for compatibility, not fixed. Behavior for payloads that embed `}`
//! in a string is undefined.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::error;
use crate::message::Message;

/// One decoded frame: the parsed message plus the exact bytes it arrived in.
///
/// The relay forwards `raw` to peers, never a re-serialization, so whitespace
/// and key order survive the trip through the server.
#[derive(Debug, Clone)]
pub struct Frame {
    /// The original candidate slice, `}` included.
    pub raw: Bytes,
    /// The decoded message.
    pub message: Message,
}

/// Codec that frames messages at the first closing brace.
#[derive(Debug, Default)]
pub struct BraceCodec {
    /// Index of next byte to check for `}`, so repeated partial reads do not
    /// rescan the whole buffer.
    next_index: usize,
}

impl BraceCodec {
    /// Create a new codec.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for BraceCodec {
    type Item = Frame;
    type Error = error::ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<Frame>> {
        loop {
            let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'}') else {
                // No complete frame yet - remember where we stopped
                self.next_index = src.len();
                return Ok(None);
            };

            // Found a candidate - everything up to and including the brace
            let candidate = src.split_to(self.next_index + offset + 1).freeze();
            self.next_index = 0;

            match serde_json::from_slice::<Message>(&candidate) {
                Ok(message) => {
                    return Ok(Some(Frame {
                        raw: candidate,
                        message,
                    }));
                }
                Err(e) => {
                    // Malformed candidate: discard it and keep scanning the
                    // remainder. The connection is never torn down for this.
                    debug!(error = %e, len = candidate.len(), "Discarding unparseable frame");
                }
            }
        }
    }
}

impl Encoder<Bytes> for BraceCodec {
    type Error = error::ProtocolError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> error::Result<()> {
        // The closing brace of the JSON object is the frame boundary; no
        // delimiter is appended.
        dst.extend_from_slice(&item);
        Ok(())
    }
}

impl Encoder<&Message> for BraceCodec {
    type Error = error::ProtocolError;

    fn encode(&mut self, item: &Message, dst: &mut BytesMut) -> error::Result<()> {
        dst.extend_from_slice(&item.to_bytes());
        Ok(())
    }
}
