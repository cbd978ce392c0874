// SPDX-License-Identifier: MPL-2.0

//! MQTT 3.1 wire codec: per-packet encode/decode plus the chunk reassembler.

pub mod base_data;
pub mod control_packet;
pub mod mqttv3;
pub mod parser;

pub use crate::mqtt_serde::parser::stream::PacketAssembler;
