use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

use super::parser::packet_type;
use super::parser::{ParseError, ParseOk};

use crate::mqtt_serde::base_data::VariableByteInteger;
use crate::mqtt_serde::mqttv3;

/// The nine MQTT 3.1 control-packet exchanges, fourteen frames in total.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[serde(tag = "type")]
pub enum MqttPacket {
    Connect(mqttv3::connect::MqttConnect),
    ConnAck(mqttv3::connack::MqttConnAck),
    Publish(mqttv3::publish::MqttPublish),
    PubAck(mqttv3::puback::MqttPubAck),
    PubRec(mqttv3::pubrec::MqttPubRec),
    PubRel(mqttv3::pubrel::MqttPubRel),
    PubComp(mqttv3::pubcomp::MqttPubComp),
    Subscribe(mqttv3::subscribe::MqttSubscribe),
    SubAck(mqttv3::suback::MqttSubAck),
    Unsubscribe(mqttv3::unsubscribe::MqttUnsubscribe),
    UnsubAck(mqttv3::unsuback::MqttUnsubAck),
    PingReq(mqttv3::pingreq::MqttPingReq),
    PingResp(mqttv3::pingresp::MqttPingResp),
    Disconnect(mqttv3::disconnect::MqttDisconnect),
}

impl MqttPacket {
    pub fn to_bytes(&self) -> Result<Vec<u8>, ParseError> {
        match self {
            MqttPacket::Connect(p) => p.to_bytes(),
            MqttPacket::ConnAck(p) => p.to_bytes(),
            MqttPacket::Publish(p) => p.to_bytes(),
            MqttPacket::PubAck(p) => p.to_bytes(),
            MqttPacket::PubRec(p) => p.to_bytes(),
            MqttPacket::PubRel(p) => p.to_bytes(),
            MqttPacket::PubComp(p) => p.to_bytes(),
            MqttPacket::Subscribe(p) => p.to_bytes(),
            MqttPacket::SubAck(p) => p.to_bytes(),
            MqttPacket::Unsubscribe(p) => p.to_bytes(),
            MqttPacket::UnsubAck(p) => p.to_bytes(),
            MqttPacket::PingReq(p) => p.to_bytes(),
            MqttPacket::PingResp(p) => p.to_bytes(),
            MqttPacket::Disconnect(p) => p.to_bytes(),
        }
    }

    pub fn from_bytes(buffer: &[u8]) -> Result<ParseOk, ParseError> {
        let packet_type_byte = packet_type(buffer)?;
        let packet_type = ControlPacketType::try_from(packet_type_byte)?;

        match packet_type {
            ControlPacketType::CONNECT => mqttv3::connect::MqttConnect::from_bytes(buffer),
            ControlPacketType::CONNACK => mqttv3::connack::MqttConnAck::from_bytes(buffer),
            ControlPacketType::PUBLISH => mqttv3::publish::MqttPublish::from_bytes(buffer),
            ControlPacketType::PUBACK => mqttv3::puback::MqttPubAck::from_bytes(buffer),
            ControlPacketType::PUBREC => mqttv3::pubrec::MqttPubRec::from_bytes(buffer),
            ControlPacketType::PUBREL => mqttv3::pubrel::MqttPubRel::from_bytes(buffer),
            ControlPacketType::PUBCOMP => mqttv3::pubcomp::MqttPubComp::from_bytes(buffer),
            ControlPacketType::SUBSCRIBE => mqttv3::subscribe::MqttSubscribe::from_bytes(buffer),
            ControlPacketType::SUBACK => mqttv3::suback::MqttSubAck::from_bytes(buffer),
            ControlPacketType::UNSUBSCRIBE => {
                mqttv3::unsubscribe::MqttUnsubscribe::from_bytes(buffer)
            }
            ControlPacketType::UNSUBACK => mqttv3::unsuback::MqttUnsubAck::from_bytes(buffer),
            ControlPacketType::PINGREQ => mqttv3::pingreq::MqttPingReq::from_bytes(buffer),
            ControlPacketType::PINGRESP => mqttv3::pingresp::MqttPingResp::from_bytes(buffer),
            ControlPacketType::DISCONNECT => mqttv3::disconnect::MqttDisconnect::from_bytes(buffer),
        }
    }
}

pub enum ControlPacketType {
    CONNECT = 1,
    CONNACK = 2,
    PUBLISH = 3,
    PUBACK = 4,
    PUBREC = 5,
    PUBREL = 6,
    PUBCOMP = 7,
    SUBSCRIBE = 8,
    SUBACK = 9,
    UNSUBSCRIBE = 10,
    UNSUBACK = 11,
    PINGREQ = 12,
    PINGRESP = 13,
    DISCONNECT = 14,
}

impl TryFrom<u8> for ControlPacketType {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ControlPacketType::CONNECT),
            2 => Ok(ControlPacketType::CONNACK),
            3 => Ok(ControlPacketType::PUBLISH),
            4 => Ok(ControlPacketType::PUBACK),
            5 => Ok(ControlPacketType::PUBREC),
            6 => Ok(ControlPacketType::PUBREL),
            7 => Ok(ControlPacketType::PUBCOMP),
            8 => Ok(ControlPacketType::SUBSCRIBE),
            9 => Ok(ControlPacketType::SUBACK),
            10 => Ok(ControlPacketType::UNSUBSCRIBE),
            11 => Ok(ControlPacketType::UNSUBACK),
            12 => Ok(ControlPacketType::PINGREQ),
            13 => Ok(ControlPacketType::PINGRESP),
            14 => Ok(ControlPacketType::DISCONNECT),
            _ => Err(ParseError::InvalidPacketType),
        }
    }
}

pub trait MqttControlPacket {
    // 4-bit control packet type
    fn control_packet_type(&self) -> u8;

    // Flag bits in the fixed header; reserved bits stay zero
    fn flags(&self) -> u8 {
        0u8
    }

    // Constructs the fixed header: type/flags byte followed by the
    // remaining-length field.
    fn fixed_header(&self, len: usize) -> Result<Vec<u8>, ParseError> {
        let byte1: u8 = (self.control_packet_type()) << 4 | self.flags();
        let variable_length = VariableByteInteger::encode(len)?;
        let mut hdr = vec![byte1];
        hdr.extend(variable_length);
        Ok(hdr)
    }

    // return variable header
    fn variable_header(&self) -> Result<Vec<u8>, ParseError>;

    // return payload
    fn payload(&self) -> Result<Vec<u8>, ParseError>;

    // decoder
    fn from_bytes(buffer: &[u8]) -> Result<ParseOk, ParseError>;

    // encoder
    fn to_bytes(&self) -> Result<Vec<u8>, ParseError> {
        let mut bytes = Vec::new();

        let vhdr = self.variable_header()?;
        let payload = self.payload()?;
        let remaining_length = vhdr.len() + payload.len();
        bytes.extend(self.fixed_header(remaining_length)?);
        bytes.extend(vhdr);
        bytes.extend(payload);
        Ok(bytes)
    }
}
