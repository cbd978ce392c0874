// SPDX-License-Identifier: MPL-2.0

//! Pure decision logic: `(registers, stimulus) -> Action`.
//!
//! Each function inspects the registers and a single stimulus and returns the
//! effects the engine must carry out. No I/O, no mutation, no clock access
//! beyond the `now` passed in.

use std::time::Instant;

use super::actions::Action;
use super::commands::ClientCommand;
use super::error::MqttClientError;
use super::events::{ConnectFailureReason, MqttEvent};
use super::opts::MqttClientOptions;
use super::registers::Registers;
use crate::mqtt_serde::control_packet::MqttPacket;
use crate::mqtt_serde::mqttv3::puback::MqttPubAck;
use crate::mqtt_serde::mqttv3::pubcomp::MqttPubComp;
use crate::mqtt_serde::mqttv3::publish::MqttPublish;
use crate::mqtt_serde::mqttv3::pubrec::MqttPubRec;
use crate::mqtt_serde::mqttv3::pubrel::MqttPubRel;
use crate::mqtt_serde::mqttv3::{
    disconnect::MqttDisconnect, pingreq::MqttPingReq, subscribe::MqttSubscribe,
    unsubscribe::MqttUnsubscribe,
};

/// Actions for a fresh connection: write CONNECT and arm the keep-alive
/// machinery. Stashed by the engine while the transport comes up.
pub fn on_connect(opts: &MqttClientOptions) -> Action {
    let keep_alive_ms = opts.keep_alive_ms();
    let mut actions = vec![
        Action::SendToNetwork(MqttPacket::Connect(opts.to_connect())),
        Action::SetKeepAlive(keep_alive_ms),
    ];
    if keep_alive_ms > 0 {
        actions.push(Action::StartPingRespTimer(keep_alive_ms));
    }
    Action::seq(actions)
}

/// Handle an application command while connected.
pub fn on_command(registers: &Registers, command: ClientCommand) -> Action {
    match command {
        ClientCommand::Publish(cmd) => {
            if cmd.qos == 0 {
                let frame = MqttPublish::new(cmd.topic_name, 0, cmd.payload, None, cmd.retain, false);
                return Action::SendToNetwork(MqttPacket::Publish(frame));
            }
            let id = registers.next_free_message_id();
            let frame = MqttPublish::new(
                cmd.topic_name,
                cmd.qos,
                cmd.payload,
                Some(id),
                cmd.retain,
                false,
            );
            let packet = MqttPacket::Publish(frame);
            Action::seq(vec![
                Action::StoreSentInFlightFrame(id, packet.clone()),
                Action::SendToNetwork(packet),
            ])
        }
        ClientCommand::Subscribe(cmd) => {
            let id = registers.next_free_message_id();
            let packet = MqttPacket::Subscribe(MqttSubscribe::new(id, cmd.subscriptions));
            Action::seq(vec![
                Action::StoreSentInFlightFrame(id, packet.clone()),
                Action::SendToNetwork(packet),
            ])
        }
        ClientCommand::Unsubscribe(cmd) => {
            let id = registers.next_free_message_id();
            let packet = MqttPacket::Unsubscribe(MqttUnsubscribe::new(id, cmd.topics));
            Action::seq(vec![
                Action::StoreSentInFlightFrame(id, packet.clone()),
                Action::SendToNetwork(packet),
            ])
        }
        ClientCommand::Disconnect => Action::seq(vec![
            Action::SendToNetwork(MqttPacket::Disconnect(MqttDisconnect::new())),
            Action::ForciblyCloseTransport,
        ]),
        // Connect and Status are resolved by the engine's state machine
        // before handler dispatch.
        ClientCommand::Connect(_) | ClientCommand::Status => Action::none(),
    }
}

/// Handle a decoded inbound frame.
pub fn on_packet(registers: &Registers, packet: MqttPacket) -> Action {
    match packet {
        MqttPacket::ConnAck(ack) => {
            if ack.accepted() {
                return Action::SendToClient(MqttEvent::Connected);
            }
            match ConnectFailureReason::from_return_code(ack.return_code) {
                Some(reason) => Action::seq(vec![
                    Action::SendToClient(MqttEvent::ConnectionFailure(reason)),
                    Action::ForciblyCloseTransport,
                ]),
                None => protocol_fault("CONNACK carried an unknown return code"),
            }
        }
        MqttPacket::Publish(publish) => on_inbound_publish(registers, publish),
        MqttPacket::PubAck(ack) => Action::RemoveSentInFlightFrame(ack.message_id),
        MqttPacket::PubRec(rec) => {
            let pubrel = MqttPacket::PubRel(MqttPubRel::new(rec.message_id));
            Action::seq(vec![
                Action::StoreSentInFlightFrame(rec.message_id, pubrel.clone()),
                Action::SendToNetwork(pubrel),
            ])
        }
        MqttPacket::PubRel(rel) => Action::seq(vec![
            Action::RemoveRecvInFlightFrameId(rel.message_id),
            Action::SendToNetwork(MqttPacket::PubComp(MqttPubComp::new(rel.message_id))),
        ]),
        MqttPacket::PubComp(comp) => Action::RemoveSentInFlightFrame(comp.message_id),
        MqttPacket::SubAck(ack) => Action::seq(vec![
            Action::RemoveSentInFlightFrame(ack.message_id),
            Action::SendToClient(MqttEvent::Subscribed(ack.granted_qos)),
        ]),
        MqttPacket::UnsubAck(ack) => Action::seq(vec![
            Action::RemoveSentInFlightFrame(ack.message_id),
            Action::SendToClient(MqttEvent::Unsubscribed),
        ]),
        MqttPacket::PingResp(_) => Action::SetPendingPingResponse(false),
        // Client-to-broker packets have no business arriving here; a 3.1
        // broker never sends them. Absorb silently.
        MqttPacket::Connect(_)
        | MqttPacket::Subscribe(_)
        | MqttPacket::Unsubscribe(_)
        | MqttPacket::PingReq(_)
        | MqttPacket::Disconnect(_) => Action::none(),
    }
}

fn on_inbound_publish(registers: &Registers, publish: MqttPublish) -> Action {
    match publish.qos {
        0 => Action::SendToClient(MqttEvent::MessageReceived(publish)),
        1 => {
            let Some(id) = publish.message_id else {
                return protocol_fault("QoS 1 PUBLISH without a message id");
            };
            Action::seq(vec![
                Action::SendToClient(MqttEvent::MessageReceived(publish)),
                Action::SendToNetwork(MqttPacket::PubAck(MqttPubAck::new(id))),
            ])
        }
        _ => {
            let Some(id) = publish.message_id else {
                return protocol_fault("QoS 2 PUBLISH without a message id");
            };
            if registers.recv_in_flight.contains(&id) {
                // Redelivery before PUBREL: re-ack only, the application has
                // already seen the message.
                return Action::SendToNetwork(MqttPacket::PubRec(MqttPubRec::new(id)));
            }
            Action::seq(vec![
                Action::SendToClient(MqttEvent::MessageReceived(publish)),
                Action::StoreRecvInFlightFrameId(id),
                Action::SendToNetwork(MqttPacket::PubRec(MqttPubRec::new(id))),
            ])
        }
    }
}

/// Keep-alive tick: ping, escalate a missed ping, or re-arm for the
/// remainder of the quiet period.
pub fn on_timer_tick(registers: &Registers, now: Instant) -> Action {
    if registers.ping_response_pending {
        // The previous PINGREQ went unanswered for a full period.
        return Action::seq(vec![
            Action::SendToClient(MqttEvent::ConnectionFailure(
                ConnectFailureReason::ServerNotResponding,
            )),
            Action::ForciblyCloseTransport,
        ]);
    }

    if registers.keep_alive_ms == 0 {
        return Action::none();
    }

    let elapsed_ms = now.duration_since(registers.last_sent_at).as_millis() as u64;
    if elapsed_ms >= registers.keep_alive_ms {
        Action::seq(vec![
            Action::SendToNetwork(MqttPacket::PingReq(MqttPingReq::new())),
            Action::SetPendingPingResponse(true),
            Action::StartPingRespTimer(registers.keep_alive_ms),
        ])
    } else {
        Action::StartPingRespTimer(registers.keep_alive_ms - elapsed_ms)
    }
}

fn protocol_fault(message: &str) -> Action {
    Action::seq(vec![
        Action::SendToClient(MqttEvent::Error(MqttClientError::ProtocolViolation {
            message: message.to_string(),
        })),
        Action::ForciblyCloseTransport,
    ])
}
