use serde::{Deserialize, Serialize};

use crate::mqtt_serde::base_data::{TwoByteInteger, Utf8String};
use crate::mqtt_serde::control_packet::{ControlPacketType, MqttControlPacket, MqttPacket};
use crate::mqtt_serde::parser::{
    packet_type, parse_remaining_length, parse_utf8_string, ParseError, ParseOk,
};

/// A single topic filter with its requested QoS in a SUBSCRIBE packet.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct SubscriptionTopic {
    pub topic_filter: String,
    pub qos: u8,
}

impl SubscriptionTopic {
    pub fn new(topic_filter: impl Into<String>, qos: u8) -> Self {
        Self {
            topic_filter: topic_filter.into(),
            qos,
        }
    }
}

/// Represents the SUBSCRIBE packet in MQTT 3.1.
///
/// Sent from the Client to the broker to create one or more subscriptions.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct MqttSubscribe {
    /// Correlates the SUBSCRIBE packet with a SUBACK packet.
    pub message_id: u16,
    pub subscriptions: Vec<SubscriptionTopic>,
}

impl MqttSubscribe {
    /// Creates a new `MqttSubscribe` packet.
    pub fn new(message_id: u16, subscriptions: Vec<SubscriptionTopic>) -> Self {
        Self {
            message_id,
            subscriptions,
        }
    }
}

impl MqttControlPacket for MqttSubscribe {
    fn control_packet_type(&self) -> u8 {
        ControlPacketType::SUBSCRIBE as u8
    }

    fn flags(&self) -> u8 {
        // For SUBSCRIBE, bits 3,2,1,0 MUST be 0,0,1,0
        0x02
    }

    fn variable_header(&self) -> Result<Vec<u8>, ParseError> {
        Ok(TwoByteInteger::encode(self.message_id).to_vec())
    }

    fn payload(&self) -> Result<Vec<u8>, ParseError> {
        let mut payload = Vec::new();
        for sub in &self.subscriptions {
            payload.extend(Utf8String::encode(&sub.topic_filter));
            // QoS must be 0, 1, or 2.
            if sub.qos > 2 {
                return Err(ParseError::ParseError("Invalid QoS level".to_string()));
            }
            payload.push(sub.qos);
        }
        Ok(payload)
    }

    fn from_bytes(buffer: &[u8]) -> Result<ParseOk, ParseError> {
        let packet_type = packet_type(buffer)?;
        if packet_type != ControlPacketType::SUBSCRIBE as u8 {
            return Err(ParseError::InvalidPacketType);
        }

        let flags = buffer[0] & 0x0F;
        if flags != 0x02 {
            return Err(ParseError::ParseError(
                "SUBSCRIBE packet has invalid fixed header flags".to_string(),
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
                "SUBSCRIBE packet must have a 2-byte message identifier".to_string(),
            ));
        }
        let message_id = u16::from_be_bytes([buffer[offset], buffer[offset + 1]]);
        offset += 2;

        // Payload: Subscriptions
        let mut subscriptions = Vec::new();
        let payload_end = total_len;
        while offset < payload_end {
            let (topic_filter, consumed) = parse_utf8_string(&buffer[offset..payload_end])?;
            offset += consumed;

            if offset >= payload_end {
                return Err(ParseError::ParseError(
                    "SUBSCRIBE payload is missing QoS byte".to_string(),
                ));
            }
            let qos = buffer[offset];
            if qos > 2 {
                return Err(ParseError::ParseError(
                    "Invalid QoS level in payload".to_string(),
                ));
            }
            offset += 1;

            subscriptions.push(SubscriptionTopic { topic_filter, qos });
        }

        if offset != total_len {
            return Err(ParseError::InternalError(
                "Failed to consume entire SUBSCRIBE packet".to_string(),
            ));
        }

        Ok(ParseOk::Packet(
            MqttPacket::Subscribe(MqttSubscribe::new(message_id, subscriptions)),
            total_len,
        ))
    }
}
