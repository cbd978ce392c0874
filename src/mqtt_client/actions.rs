//! Effect descriptions produced by the handlers.
//!
//! Handlers never touch the transport, the timer or the application sink;
//! they return `Action` values and the engine interprets them. This keeps the
//! decision logic pure and unit-testable without a live transport.

use super::events::MqttEvent;
use crate::mqtt_serde::control_packet::MqttPacket;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Ordered composition; children execute left to right.
    Sequence(Vec<Action>),
    /// Encode a frame and write it to the transport; refreshes the
    /// last-sent timestamp.
    SendToNetwork(MqttPacket),
    /// Emit an application-visible event.
    SendToClient(MqttEvent),
    /// Set the keep-alive interval in milliseconds.
    SetKeepAlive(u64),
    /// Schedule a single-shot wakeup after the given delay, replacing any
    /// pending wakeup.
    StartPingRespTimer(u64),
    /// Set or clear the ping-outstanding flag.
    SetPendingPingResponse(bool),
    /// Abort the transport and run the standard disconnect teardown.
    ForciblyCloseTransport,
    /// Record a QoS >= 1 frame awaiting acknowledgement.
    StoreSentInFlightFrame(u16, MqttPacket),
    /// Drop the record for an acknowledged frame; absent ids are ignored.
    RemoveSentInFlightFrame(u16),
    /// Record an inbound QoS 2 message id awaiting PUBREL.
    StoreRecvInFlightFrameId(u16),
    /// Drop an inbound QoS 2 message id after PUBREL.
    RemoveRecvInFlightFrameId(u16),
}

impl Action {
    /// The empty action.
    pub fn none() -> Action {
        Action::Sequence(Vec::new())
    }

    pub fn seq(actions: Vec<Action>) -> Action {
        Action::Sequence(actions)
    }

    /// Flatten into execution order, for inspection in tests.
    pub fn flatten(&self) -> Vec<&Action> {
        match self {
            Action::Sequence(actions) => actions.iter().flat_map(|a| a.flatten()).collect(),
            other => vec![other],
        }
    }
}
