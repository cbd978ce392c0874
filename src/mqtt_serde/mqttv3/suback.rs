use serde::{Deserialize, Serialize};

use crate::mqtt_serde::control_packet::{ControlPacketType, MqttControlPacket, MqttPacket};
use crate::mqtt_serde::parser::{packet_type, parse_remaining_length, ParseError, ParseOk};

/// Represents the SUBACK packet in MQTT 3.1.
///
/// The broker confirms a SUBSCRIBE with one granted-QoS byte per requested
/// topic filter, in request order.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct MqttSubAck {
    /// The Message Identifier from the SUBSCRIBE packet being acknowledged.
    pub message_id: u16,
    /// Granted QoS levels, one per topic filter. MQTT 3.1 grants `0..=2`.
    pub granted_qos: Vec<u8>,
}

impl MqttSubAck {
    /// Creates a new `MqttSubAck` packet.
    pub fn new(message_id: u16, granted_qos: Vec<u8>) -> Self {
        Self {
            message_id,
            granted_qos,
        }
    }
}

impl MqttControlPacket for MqttSubAck {
    fn control_packet_type(&self) -> u8 {
        ControlPacketType::SUBACK as u8
    }

    fn variable_header(&self) -> Result<Vec<u8>, ParseError> {
        Ok(self.message_id.to_be_bytes().to_vec())
    }

    fn payload(&self) -> Result<Vec<u8>, ParseError> {
        for &qos in &self.granted_qos {
            if qos > 2 {
                return Err(ParseError::ParseError(format!(
                    "Invalid SUBACK granted QoS: {}",
                    qos
                )));
            }
        }
        Ok(self.granted_qos.clone())
    }

    fn from_bytes(buffer: &[u8]) -> Result<ParseOk, ParseError> {
        let packet_type = packet_type(buffer)?;
        if packet_type != ControlPacketType::SUBACK as u8 {
            return Err(ParseError::InvalidPacketType);
        }

        // Bits 3,2,1,0 of fixed header MUST be 0.
        let flags = buffer[0] & 0x0F;
        if flags != 0x00 {
            return Err(ParseError::ParseError(
                "SUBACK packet has invalid fixed header flags".to_string(),
            ));
        }

        let (size, vbi_len) = parse_remaining_length(&buffer[1..])?;
        let mut offset = 1 + vbi_len;
        let total_len = offset + size;

        if total_len > buffer.len() {
            return Ok(ParseOk::Continue(total_len - buffer.len(), 0));
        }

        // Variable Header: Message Identifier
        if size < 2 {
            return Err(ParseError::ParseError(
                "SUBACK packet must have a 2-byte message identifier".to_string(),
            ));
        }
        let message_id = u16::from_be_bytes([buffer[offset], buffer[offset + 1]]);
        offset += 2;

        // Payload: granted QoS bytes
        let granted_qos = buffer[offset..total_len].to_vec();
        for &qos in &granted_qos {
            if qos > 2 {
                return Err(ParseError::ParseError(format!(
                    "Invalid SUBACK granted QoS in payload: {}",
                    qos
                )));
            }
        }

        Ok(ParseOk::Packet(
            MqttPacket::SubAck(MqttSubAck::new(message_id, granted_qos)),
            total_len,
        ))
    }
}
