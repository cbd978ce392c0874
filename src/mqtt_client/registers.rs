//! The engine's mutable protocol state and its pure mutators.
//!
//! Handlers read `Registers` and describe changes as actions; only the
//! engine's action interpreter calls the mutators. Keeping the mutations
//! here, one small method each, lets handler logic be tested without an
//! engine around it.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use super::timer::TimerHandle;
use crate::mqtt_serde::control_packet::MqttPacket;
use crate::mqtt_serde::parser::stream::PacketAssembler;

pub struct Registers {
    /// Negotiated keep-alive interval in milliseconds; 0 disables pings.
    pub keep_alive_ms: u64,
    /// When the last outbound byte was written.
    pub last_sent_at: Instant,
    /// True between sending PINGREQ and receiving PINGRESP.
    pub ping_response_pending: bool,
    /// The currently scheduled keep-alive wakeup, if any.
    pub timer_handle: Option<TimerHandle>,
    /// Whether the engine is subscribed to transport termination.
    pub transport_watched: bool,
    /// QoS >= 1 frames sent and not yet fully acknowledged, by message id.
    pub sent_in_flight: HashMap<u16, MqttPacket>,
    /// Inbound QoS 2 message ids with PUBREC sent and PUBCOMP outstanding.
    pub recv_in_flight: HashSet<u16>,
    /// Reassembly state for the inbound byte stream.
    pub read_buffer: PacketAssembler,
    next_message_id: u16,
}

impl Registers {
    pub fn new(now: Instant) -> Self {
        Registers {
            keep_alive_ms: 0,
            last_sent_at: now,
            ping_response_pending: false,
            timer_handle: None,
            transport_watched: false,
            sent_in_flight: HashMap::new(),
            recv_in_flight: HashSet::new(),
            read_buffer: PacketAssembler::new(),
            next_message_id: 1,
        }
    }

    pub fn set_keep_alive(&mut self, ms: u64) {
        self.keep_alive_ms = ms;
    }

    pub fn touch_last_sent(&mut self, now: Instant) {
        self.last_sent_at = now;
    }

    pub fn set_ping_response_pending(&mut self, pending: bool) {
        self.ping_response_pending = pending;
    }

    pub fn set_timer_handle(&mut self, handle: Option<TimerHandle>) {
        self.timer_handle = handle;
    }

    pub fn take_timer_handle(&mut self) -> Option<TimerHandle> {
        self.timer_handle.take()
    }

    pub fn watch_transport(&mut self) {
        self.transport_watched = true;
    }

    pub fn unwatch_transport(&mut self) {
        self.transport_watched = false;
    }

    /// Next message id not currently in flight. Ids are allocated
    /// monotonically, wrap at 65535 and never take the value 0.
    pub fn next_free_message_id(&self) -> u16 {
        let mut candidate = self.next_message_id;
        loop {
            if candidate != 0 && !self.sent_in_flight.contains_key(&candidate) {
                return candidate;
            }
            candidate = candidate.wrapping_add(1);
        }
    }

    /// Record a frame awaiting acknowledgement. First-transmission frames
    /// (PUBLISH, SUBSCRIBE, UNSUBSCRIBE) advance the id allocator; a PUBREL
    /// replacing a stored PUBLISH keeps its original id and does not.
    pub fn store_sent_in_flight(&mut self, id: u16, frame: MqttPacket) {
        if matches!(
            frame,
            MqttPacket::Publish(_) | MqttPacket::Subscribe(_) | MqttPacket::Unsubscribe(_)
        ) {
            self.next_message_id = match id.wrapping_add(1) {
                0 => 1,
                next => next,
            };
        }
        self.sent_in_flight.insert(id, frame);
    }

    pub fn remove_sent_in_flight(&mut self, id: u16) -> Option<MqttPacket> {
        self.sent_in_flight.remove(&id)
    }

    pub fn store_recv_in_flight(&mut self, id: u16) {
        self.recv_in_flight.insert(id);
    }

    pub fn remove_recv_in_flight(&mut self, id: u16) -> bool {
        self.recv_in_flight.remove(&id)
    }

    /// Reset everything tied to the dead connection. The id allocator keeps
    /// its position so a reconnect does not reuse recent ids.
    pub fn clear_session(&mut self) {
        self.keep_alive_ms = 0;
        self.ping_response_pending = false;
        self.timer_handle = None;
        self.sent_in_flight.clear();
        self.recv_in_flight.clear();
        self.read_buffer.clear();
    }
}
