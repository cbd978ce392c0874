use serde::{Deserialize, Serialize};

use crate::mqtt_serde::base_data::{TwoByteInteger, Utf8String};
use crate::mqtt_serde::control_packet::{ControlPacketType, MqttControlPacket, MqttPacket};
use crate::mqtt_serde::parser::{
    packet_type, parse_remaining_length, parse_utf8_string, ParseError, ParseOk,
};

/// Represents the PUBLISH packet in MQTT 3.1.
///
/// A PUBLISH packet carries an application message from client to broker or
/// broker to client.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct MqttPublish {
    pub dup: bool,
    pub qos: u8,
    pub retain: bool,
    pub topic_name: String,
    /// Message Identifier is only present for QoS levels 1 and 2.
    pub message_id: Option<u16>,
    pub payload: Vec<u8>,
}

impl MqttPublish {
    /// Creates a new `MqttPublish` packet.
    pub fn new(
        topic_name: String,
        qos: u8,
        payload: Vec<u8>,
        message_id: Option<u16>,
        retain: bool,
        dup: bool,
    ) -> Self {
        Self {
            dup,
            qos,
            retain,
            topic_name,
            message_id,
            payload,
        }
    }
}

impl MqttControlPacket for MqttPublish {
    fn control_packet_type(&self) -> u8 {
        ControlPacketType::PUBLISH as u8
    }

    fn flags(&self) -> u8 {
        ((self.dup as u8) << 3) | (self.qos << 1) | (self.retain as u8)
    }

    fn variable_header(&self) -> Result<Vec<u8>, ParseError> {
        let mut vh = Utf8String::encode(&self.topic_name);
        if self.qos > 0 {
            let msg_id = self.message_id.ok_or_else(|| {
                ParseError::ParseError("Message ID is required for QoS > 0".to_string())
            })?;
            vh.extend_from_slice(&TwoByteInteger::encode(msg_id));
        }
        Ok(vh)
    }

    fn payload(&self) -> Result<Vec<u8>, ParseError> {
        Ok(self.payload.clone())
    }

    fn from_bytes(buffer: &[u8]) -> Result<ParseOk, ParseError> {
        let packet_type = packet_type(buffer)?;
        if packet_type != ControlPacketType::PUBLISH as u8 {
            return Err(ParseError::InvalidPacketType);
        }

        let flags = buffer[0] & 0x0F;
        let dup = (flags & 0x08) > 0;
        let qos = (flags & 0x06) >> 1;
        let retain = (flags & 0x01) > 0;

        if qos > 2 {
            return Err(ParseError::ParseError("Invalid QoS level".to_string()));
        }

        let (size, vbi_len) = parse_remaining_length(&buffer[1..])?;
        let mut offset = 1 + vbi_len;
        let total_len = offset + size;

        if total_len > buffer.len() {
            return Ok(ParseOk::Continue(total_len - buffer.len(), 0));
        }

        // Variable Header
        let (topic_name, consumed) = parse_utf8_string(&buffer[offset..total_len])?;
        offset += consumed;

        let message_id = if qos > 0 {
            if offset + 2 > total_len {
                return Err(ParseError::ParseError(
                    "Missing message ID for QoS > 0".to_string(),
                ));
            }
            let id = u16::from_be_bytes([buffer[offset], buffer[offset + 1]]);
            offset += 2;
            Some(id)
        } else {
            None
        };

        // Payload
        let payload = buffer[offset..total_len].to_vec();

        Ok(ParseOk::Packet(
            MqttPacket::Publish(MqttPublish {
                dup,
                qos,
                retain,
                topic_name,
                message_id,
                payload,
            }),
            total_len,
        ))
    }
}
