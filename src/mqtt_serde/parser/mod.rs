use super::control_packet::MqttPacket;
use crate::mqtt_serde::base_data::{BinaryData, TwoByteInteger, Utf8String, VariableByteInteger};
use std::error::Error;
use std::fmt;

pub type ParserResult = Result<ParseOk, ParseError>;

// First byte of the fixed header
pub const FIXED_HDR_LEN: usize = 1;

#[derive(Debug)]
pub enum ParseError {
    More(usize, String), // not enough data yet, hint for how many more bytes are needed
    ParseError(String),
    Utf8Error(std::str::Utf8Error),
    StringTooLong,
    BufferTooShort,
    InvalidPacketType,
    RemainingLengthTooLong,
    RemainingLengthOutOfRange(usize),
    InternalError(String),
}

impl ParseError {
    /// A header-level `More` means the chunk ended mid-frame, which is not a
    /// protocol fault; everything else is unrecoverable for the connection.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, ParseError::More(..) | ParseError::BufferTooShort)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::More(hint, msg) => write!(f, "More data needed ({} bytes): {}", hint, msg),
            ParseError::ParseError(msg) => write!(f, "Parse Error: {}", msg),
            ParseError::Utf8Error(e) => write!(f, "UTF-8 Error: {}", e),
            ParseError::StringTooLong => write!(f, "String Too Long"),
            ParseError::BufferTooShort => write!(f, "Buffer Too Short"),
            ParseError::InvalidPacketType => write!(f, "Invalid Packet Type"),
            ParseError::RemainingLengthTooLong => write!(f, "Remaining Length Too Long"),
            ParseError::RemainingLengthOutOfRange(v) => {
                write!(f, "Remaining Length Out Of Range: {}", v)
            }
            ParseError::InternalError(msg) => write!(f, "Internal Error: {}", msg),
        }
    }
}

impl Error for ParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ParseError::Utf8Error(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum ParseOk {
    Continue(usize, usize),    // (hint, consumed)
    Packet(MqttPacket, usize), // (packet, consumed)
}

pub fn packet_type(buffer: &[u8]) -> Result<u8, ParseError> {
    if buffer.is_empty() {
        return Err(ParseError::BufferTooShort);
    }
    Ok(buffer[0] >> 4)
}

pub fn parse_remaining_length(buffer: &[u8]) -> Result<(usize, usize), ParseError> {
    VariableByteInteger::decode(buffer)
}

pub fn parse_utf8_string(buffer: &[u8]) -> Result<(String, usize), ParseError> {
    Utf8String::decode(buffer)
}

pub fn parse_message_id(buffer: &[u8]) -> Result<(u16, usize), ParseError> {
    TwoByteInteger::decode(buffer)
}

pub fn parse_binary_data(buffer: &[u8]) -> Result<(Vec<u8>, usize), ParseError> {
    BinaryData::decode(buffer)
}

/// A frame decoded only as far as the fixed header allows: type and flag bits,
/// the declared remaining length, and whatever payload bytes the buffer holds.
///
/// This is the entry point the stream reassembler uses; the payload is a
/// snapshot and grows as further chunks arrive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialPacket {
    pub packet_type: u8,
    pub dup: bool,
    pub qos: u8,
    pub retain: bool,
    pub remaining_length: usize,
    /// Bytes occupied by the fixed header (type byte + remaining-length field).
    pub header_len: usize,
    /// Payload bytes accumulated so far, at most `remaining_length`.
    pub payload: Vec<u8>,
}

impl PartialPacket {
    /// Decode the fixed header and capture the available payload bytes.
    ///
    /// Returns `ParseError::More` when the buffer ends inside the fixed
    /// header itself; a complete header with a short payload is *not* an
    /// error, the shortfall shows up as `payload.len() < remaining_length`.
    pub fn decode(buffer: &[u8]) -> Result<PartialPacket, ParseError> {
        if buffer.is_empty() {
            return Err(ParseError::More(1, "fixed header: empty buffer".to_string()));
        }
        let packet_type = buffer[0] >> 4;
        if !(1..=14).contains(&packet_type) {
            return Err(ParseError::InvalidPacketType);
        }
        let flags = buffer[0] & 0x0F;
        let (remaining_length, vbi_len) = parse_remaining_length(&buffer[1..])?;
        let header_len = FIXED_HDR_LEN + vbi_len;

        let available = buffer.len() - header_len;
        let take = available.min(remaining_length);
        let payload = buffer[header_len..header_len + take].to_vec();

        Ok(PartialPacket {
            packet_type,
            dup: (flags & 0x08) > 0,
            qos: (flags & 0x06) >> 1,
            retain: (flags & 0x01) > 0,
            remaining_length,
            header_len,
            payload,
        })
    }

    /// True once every declared payload byte has been captured.
    pub fn is_complete(&self) -> bool {
        self.payload.len() == self.remaining_length
    }

    /// Total frame size on the wire.
    pub fn total_len(&self) -> usize {
        self.header_len + self.remaining_length
    }
}

pub mod stream;
