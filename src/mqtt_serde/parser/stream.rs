use crate::mqtt_serde::control_packet::MqttPacket;
use crate::mqtt_serde::parser::{ParseError, ParseOk, PartialPacket};
use bytes::{Buf, BytesMut};

/// A stateful reassembler fronting the codec.
///
/// Transport chunks arrive at arbitrary boundaries; `feed` buffers them and
/// yields every whole frame completed by the chunk, in wire order. While a
/// frame is incomplete the decoded fixed header is kept as a [`PartialPacket`]
/// snapshot alongside the raw bytes.
#[derive(Debug, Default)]
pub struct PacketAssembler {
    buffer: BytesMut,
    partial: Option<PartialPacket>,
}

impl PacketAssembler {
    pub fn new() -> Self {
        PacketAssembler {
            buffer: BytesMut::with_capacity(4096),
            partial: None,
        }
    }

    /// The fixed-header snapshot of the frame currently being accumulated,
    /// if the header has been seen but the payload is still short.
    pub fn read_buffer(&self) -> Option<&PartialPacket> {
        self.partial.as_ref()
    }

    /// Number of buffered bytes not yet consumed by a whole frame.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop all buffered state. Used when the transport goes away.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.partial = None;
    }

    /// Append a transport chunk and extract every frame it completes.
    ///
    /// An error is a protocol fault and leaves the assembler unusable for the
    /// connection; the caller is expected to tear the transport down.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<MqttPacket>, ParseError> {
        if chunk.is_empty() && self.buffer.is_empty() {
            return Ok(Vec::new());
        }
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while !self.buffer.is_empty() {
            let partial = match PartialPacket::decode(&self.buffer) {
                Ok(partial) => partial,
                Err(e) if e.is_incomplete() => {
                    // Chunk ended inside the fixed header; wait for more bytes.
                    self.partial = None;
                    return Ok(frames);
                }
                Err(e) => return Err(e),
            };

            if !partial.is_complete() {
                self.partial = Some(partial);
                return Ok(frames);
            }

            let total = partial.total_len();
            match MqttPacket::from_bytes(&self.buffer[..total])? {
                ParseOk::Packet(frame, consumed) => {
                    if consumed != total {
                        return Err(ParseError::InternalError(
                            "frame decoder consumed a different length than declared".to_string(),
                        ));
                    }
                    self.buffer.advance(total);
                    self.partial = None;
                    frames.push(frame);
                }
                ParseOk::Continue(..) => {
                    return Err(ParseError::InternalError(
                        "full decoder demanded more bytes for a complete frame".to_string(),
                    ));
                }
            }
        }
        Ok(frames)
    }
}
