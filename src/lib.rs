// SPDX-License-Identifier: MPL-2.0

//! An MQTT 3.1 client protocol engine.
//!
//! The crate mediates between a local application and a remote broker over a
//! reliable byte stream. It owns the wire codec, the inbound stream
//! reassembler, the QoS 1/2 handshake bookkeeping and the keep-alive state
//! machine; the actual transport (TCP or otherwise) and the application
//! surface are collaborators driven through [`mqtt_client::engine::MqttEngine`].
//!
//! - [`mqtt_serde`] — control-packet codec and stream reassembly.
//! - [`mqtt_client`] — commands, events, handlers and the engine state machine.

pub mod mqtt_client;
pub mod mqtt_serde;
