// SPDX-License-Identifier: MPL-2.0

use serde::{Deserialize, Serialize};

use crate::mqtt_serde::control_packet::{ControlPacketType, MqttControlPacket, MqttPacket};
use crate::mqtt_serde::parser::{packet_type, parse_remaining_length, ParseError, ParseOk};

/// CONNECT return codes defined by MQTT 3.1.
pub const RETURN_ACCEPTED: u8 = 0;
pub const RETURN_BAD_PROTOCOL_VERSION: u8 = 1;
pub const RETURN_IDENTIFIER_REJECTED: u8 = 2;
pub const RETURN_SERVER_UNAVAILABLE: u8 = 3;
pub const RETURN_BAD_USERNAME_OR_PASSWORD: u8 = 4;
pub const RETURN_NOT_AUTHORIZED: u8 = 5;

/// Represents the CONNACK packet in MQTT 3.1.
///
/// The variable header is two bytes: a reserved byte (written as zero,
/// tolerated on decode) and the connect return code.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct MqttConnAck {
    /// The return code for the connection attempt, `0..=5`.
    pub return_code: u8,
}

impl MqttConnAck {
    /// Creates a new `MqttConnAck` packet.
    pub fn new(return_code: u8) -> Self {
        Self { return_code }
    }

    pub fn accepted(&self) -> bool {
        self.return_code == RETURN_ACCEPTED
    }
}

impl MqttControlPacket for MqttConnAck {
    fn control_packet_type(&self) -> u8 {
        ControlPacketType::CONNACK as u8
    }

    fn variable_header(&self) -> Result<Vec<u8>, ParseError> {
        if self.return_code > RETURN_NOT_AUTHORIZED {
            return Err(ParseError::ParseError(
                "Invalid CONNACK return code".to_string(),
            ));
        }
        Ok(vec![0x00, self.return_code])
    }

    fn payload(&self) -> Result<Vec<u8>, ParseError> {
        // CONNACK has no payload.
        Ok(Vec::new())
    }

    fn from_bytes(buffer: &[u8]) -> Result<ParseOk, ParseError> {
        let packet_type = packet_type(buffer)?;
        if packet_type != ControlPacketType::CONNACK as u8 {
            return Err(ParseError::InvalidPacketType);
        }

        let flags = buffer[0] & 0x0F;
        if flags != 0x00 {
            return Err(ParseError::ParseError(
                "CONNACK packet has invalid fixed header flags".to_string(),
            ));
        }

        let (size, vbi_len) = parse_remaining_length(&buffer[1..])?;
        let total_len = 1 + vbi_len + size;

        if total_len > buffer.len() {
            return Ok(ParseOk::Continue(total_len - buffer.len(), 0));
        }

        if size != 2 {
            return Err(ParseError::ParseError(
                "CONNACK packet must have a remaining length of 2".to_string(),
            ));
        }

        // First variable-header byte is reserved; its value is ignored.
        let return_code = buffer[1 + vbi_len + 1];
        if return_code > RETURN_NOT_AUTHORIZED {
            return Err(ParseError::ParseError(
                "Invalid CONNACK return code".to_string(),
            ));
        }

        Ok(ParseOk::Packet(
            MqttPacket::ConnAck(MqttConnAck::new(return_code)),
            total_len,
        ))
    }
}
