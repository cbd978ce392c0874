use serde::{Deserialize, Serialize};

use crate::mqtt_serde::control_packet::{ControlPacketType, MqttControlPacket, MqttPacket};
use crate::mqtt_serde::parser::{packet_type, parse_remaining_length, ParseError, ParseOk};

/// Represents the PUBREL packet in MQTT 3.1.
///
/// PUBREL is the third leg of the QoS 2 handshake, releasing the message for
/// delivery. Its fixed-header flags carry the QoS 1 bit.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct MqttPubRel {
    pub message_id: u16,
}

impl MqttPubRel {
    pub fn new(message_id: u16) -> Self {
        Self { message_id }
    }
}

impl MqttControlPacket for MqttPubRel {
    fn control_packet_type(&self) -> u8 {
        ControlPacketType::PUBREL as u8
    }

    fn flags(&self) -> u8 {
        // Bits 3,2,1,0 MUST be 0,0,1,0
        0x02
    }

    fn variable_header(&self) -> Result<Vec<u8>, ParseError> {
        Ok(self.message_id.to_be_bytes().to_vec())
    }

    fn payload(&self) -> Result<Vec<u8>, ParseError> {
        Ok(Vec::new())
    }

    fn from_bytes(buffer: &[u8]) -> Result<ParseOk, ParseError> {
        let packet_type = packet_type(buffer)?;
        if packet_type != ControlPacketType::PUBREL as u8 {
            return Err(ParseError::InvalidPacketType);
        }

        let flags = buffer[0] & 0x0F;
        if flags != 0x02 {
            return Err(ParseError::ParseError(
                "PUBREL packet has invalid fixed header flags".to_string(),
            ));
        }

        let (size, vbi_len) = parse_remaining_length(&buffer[1..])?;
        let total_len = 1 + vbi_len + size;

        if total_len > buffer.len() {
            return Ok(ParseOk::Continue(total_len - buffer.len(), 0));
        }

        if size != 2 {
            return Err(ParseError::ParseError(
                "PUBREL packet must have a remaining length of 2".to_string(),
            ));
        }

        let message_id = u16::from_be_bytes([buffer[1 + vbi_len], buffer[1 + vbi_len + 1]]);

        Ok(ParseOk::Packet(
            MqttPacket::PubRel(MqttPubRel::new(message_id)),
            total_len,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pubrel_serialization() {
        let pubrel = MqttPubRel::new(7);
        // QoS 1 bit set in the fixed header
        assert_eq!(pubrel.to_bytes().unwrap(), vec![0x62, 0x02, 0x00, 0x07]);
    }

    #[test]
    fn test_pubrel_roundtrip() {
        let original = MqttPubRel::new(300);
        let bytes = original.to_bytes().unwrap();
        match MqttPubRel::from_bytes(&bytes).unwrap() {
            ParseOk::Packet(MqttPacket::PubRel(parsed), _) => assert_eq!(original, parsed),
            _ => panic!("Expected PUBREL packet"),
        }
    }

    #[test]
    fn test_pubrel_zero_flags_rejected() {
        assert!(MqttPubRel::from_bytes(&[0x60, 0x02, 0x00, 0x07]).is_err());
    }
}
