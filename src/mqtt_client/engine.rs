// SPDX-License-Identifier: MPL-2.0

//! The top-level protocol state machine.
//!
//! `MqttEngine` consumes one stimulus at a time — an application command, a
//! transport event or a timer fire — routes it through the pure handlers and
//! interprets the resulting [`Action`] tree against its collaborators: the
//! transport link, the application event sink and the timer driver.
//!
//! Exactly one stimulus is in flight at any time; handlers never observe
//! intermediate state. The owning run loop (see `client.rs`) serializes
//! stimuli through a single queue.

use std::time::Instant;

use tracing::{debug, warn};

use super::actions::Action;
use super::commands::ClientCommand;
use super::error::MqttClientError;
use super::events::{ConnectFailureReason, MqttEvent};
use super::handlers;
use super::registers::Registers;
use super::timer::{TimerDriver, TimerHandle};
use super::transport::{TransportEvent, TransportLink};

/// Sink for application-visible events.
pub trait EventSink {
    fn emit(&mut self, event: MqttEvent);
}

impl EventSink for tokio::sync::mpsc::UnboundedSender<MqttEvent> {
    fn emit(&mut self, event: MqttEvent) {
        // A dropped receiver just means nobody is listening anymore.
        let _ = self.send(event);
    }
}

/// One unit of work for the engine.
#[derive(Debug)]
pub enum Stimulus {
    Command(ClientCommand),
    Transport(TransportEvent),
    TimerFired(TimerHandle),
}

/// Connection lifecycle of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Initial state; also reached after any disconnect.
    NotConnected,
    /// A transport connect has been requested and not yet resolved.
    Connecting,
    /// The transport is up; MQTT traffic flows.
    Connected,
}

pub struct MqttEngine<T, C, K>
where
    T: TransportLink,
    C: EventSink,
    K: TimerDriver,
{
    state: EngineState,
    registers: Registers,
    transport: T,
    client: C,
    timer: K,
    /// Actions to run once the transport comes up (writes CONNECT).
    pending_connack: Option<Action>,
    /// True once a successful CONNACK has been seen on this connection.
    session_up: bool,
}

impl<T, C, K> MqttEngine<T, C, K>
where
    T: TransportLink,
    C: EventSink,
    K: TimerDriver,
{
    pub fn new(transport: T, client: C, timer: K, now: Instant) -> Self {
        MqttEngine {
            state: EngineState::NotConnected,
            registers: Registers::new(now),
            transport,
            client,
            timer,
            pending_connack: None,
            session_up: false,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    /// Dispatch a single stimulus.
    pub fn handle(&mut self, stimulus: Stimulus, now: Instant) {
        match stimulus {
            Stimulus::Command(command) => self.handle_command(command, now),
            Stimulus::Transport(event) => self.handle_transport_event(event, now),
            Stimulus::TimerFired(handle) => self.handle_timer_fired(handle, now),
        }
    }

    pub fn handle_command(&mut self, command: ClientCommand, now: Instant) {
        match (self.state, command) {
            (_, ClientCommand::Status) => {
                let event = if self.session_up {
                    MqttEvent::Connected
                } else {
                    MqttEvent::Disconnected
                };
                self.client.emit(event);
            }
            (EngineState::NotConnected, ClientCommand::Connect(opts)) => {
                debug!(client_id = %opts.client_id, "requesting transport connect");
                self.pending_connack = Some(handlers::on_connect(&opts));
                self.state = EngineState::Connecting;
                self.transport.connect();
            }
            (EngineState::Connected, ClientCommand::Connect(_)) => {
                // Already connected; a new session needs a Disconnect first.
                debug!("ignoring Connect while connected");
            }
            (EngineState::NotConnected | EngineState::Connecting, _) => {
                self.client
                    .emit(MqttEvent::Error(MqttClientError::NotConnected));
            }
            (EngineState::Connected, command) => {
                let action = handlers::on_command(&self.registers, command);
                self.apply(action, now);
            }
        }
    }

    pub fn handle_transport_event(&mut self, event: TransportEvent, now: Instant) {
        match (self.state, event) {
            (EngineState::Connecting, TransportEvent::Connected) => {
                debug!("transport up, writing CONNECT");
                self.state = EngineState::Connected;
                self.registers.watch_transport();
                if let Some(action) = self.pending_connack.take() {
                    self.apply(action, now);
                }
            }
            (EngineState::Connecting, TransportEvent::ConnectFailed) => {
                self.state = EngineState::NotConnected;
                self.pending_connack = None;
                self.client.emit(MqttEvent::ConnectionFailure(
                    ConnectFailureReason::TransportNotReady,
                ));
            }
            (EngineState::Connected, TransportEvent::Received(bytes)) => {
                self.handle_received(&bytes, now);
            }
            (EngineState::Connected, TransportEvent::Closed | TransportEvent::Terminated) => {
                self.teardown();
            }
            (state, event) => {
                // Late events from a transport we already abandoned.
                debug!(?state, ?event, "ignoring stale transport event");
            }
        }
    }

    fn handle_received(&mut self, bytes: &[u8], now: Instant) {
        match self.registers.read_buffer.feed(bytes) {
            Ok(frames) => {
                for frame in frames {
                    let action = handlers::on_packet(&self.registers, frame);
                    self.apply(action, now);
                    if self.state != EngineState::Connected {
                        // The frame tore the connection down; drop the rest.
                        break;
                    }
                }
            }
            Err(e) => {
                let preview = hex::encode(&bytes[..bytes.len().min(20)]);
                warn!(error = %e, preview = %preview, "protocol fault on inbound bytes");
                self.client
                    .emit(MqttEvent::Error(MqttClientError::from(e)));
                self.apply(Action::ForciblyCloseTransport, now);
            }
        }
    }

    pub fn handle_timer_fired(&mut self, handle: TimerHandle, now: Instant) {
        if self.state != EngineState::Connected {
            return;
        }
        if self.registers.timer_handle != Some(handle) {
            // A wakeup that was cancelled or superseded while in flight.
            return;
        }
        self.registers.set_timer_handle(None);
        let action = handlers::on_timer_tick(&self.registers, now);
        self.apply(action, now);
    }

    /// Interpret an action tree against the collaborators and the registers.
    fn apply(&mut self, action: Action, now: Instant) {
        match action {
            Action::Sequence(actions) => {
                for action in actions {
                    self.apply(action, now);
                }
            }
            Action::SendToNetwork(frame) => match frame.to_bytes() {
                Ok(bytes) => {
                    if let Err(e) = self.transport.write(&bytes) {
                        // The transport will follow up with Closed; nothing
                        // more to do here.
                        warn!(error = %e, "transport write failed");
                    }
                    self.registers.touch_last_sent(now);
                }
                Err(e) => {
                    warn!(error = %e, "failed to encode outbound frame");
                    self.client
                        .emit(MqttEvent::Error(MqttClientError::from(e)));
                }
            },
            Action::SendToClient(event) => {
                match event {
                    MqttEvent::Connected => self.session_up = true,
                    MqttEvent::Disconnected => self.session_up = false,
                    _ => {}
                }
                self.client.emit(event);
            }
            Action::SetKeepAlive(ms) => self.registers.set_keep_alive(ms),
            Action::StartPingRespTimer(ms) => {
                if let Some(old) = self.registers.take_timer_handle() {
                    self.timer.cancel(old);
                }
                let handle = self.timer.schedule_once(ms);
                self.registers.set_timer_handle(Some(handle));
            }
            Action::SetPendingPingResponse(pending) => {
                self.registers.set_ping_response_pending(pending);
            }
            Action::ForciblyCloseTransport => {
                self.transport.abort();
                self.teardown();
            }
            Action::StoreSentInFlightFrame(id, frame) => {
                self.registers.store_sent_in_flight(id, frame);
            }
            Action::RemoveSentInFlightFrame(id) => {
                self.registers.remove_sent_in_flight(id);
            }
            Action::StoreRecvInFlightFrameId(id) => {
                self.registers.store_recv_in_flight(id);
            }
            Action::RemoveRecvInFlightFrameId(id) => {
                self.registers.remove_recv_in_flight(id);
            }
        }
    }

    /// Standard disconnect handling: cancel the timer, drop connection state
    /// and report `Disconnected`.
    fn teardown(&mut self) {
        if let Some(handle) = self.registers.take_timer_handle() {
            self.timer.cancel(handle);
        }
        self.registers.clear_session();
        self.registers.unwatch_transport();
        self.pending_connack = None;
        self.state = EngineState::NotConnected;
        self.session_up = false;
        self.client.emit(MqttEvent::Disconnected);
        debug!("engine reset to not-connected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mqtt_client::commands::{PublishCommand, SubscribeCommand};
    use crate::mqtt_client::opts::MqttClientOptions;
    use crate::mqtt_serde::control_packet::{MqttControlPacket, MqttPacket};
    use crate::mqtt_serde::mqttv3::puback::MqttPubAck;
    use crate::mqtt_serde::mqttv3::pingresp::MqttPingResp;
    use crate::mqtt_serde::mqttv3::publish::MqttPublish;
    use crate::mqtt_serde::parser::ParseOk;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct MockTransport {
        written: Arc<Mutex<Vec<Vec<u8>>>>,
        connects: Arc<Mutex<usize>>,
        aborted: Arc<Mutex<bool>>,
    }

    impl TransportLink for MockTransport {
        fn connect(&mut self) {
            *self.connects.lock().unwrap() += 1;
        }
        fn write(&mut self, bytes: &[u8]) -> Result<(), crate::mqtt_client::transport::TransportError> {
            self.written.lock().unwrap().push(bytes.to_vec());
            Ok(())
        }
        fn close(&mut self) {}
        fn abort(&mut self) {
            *self.aborted.lock().unwrap() = true;
        }
    }

    impl MockTransport {
        fn frames(&self) -> Vec<MqttPacket> {
            self.written
                .lock()
                .unwrap()
                .iter()
                .map(|bytes| match MqttPacket::from_bytes(bytes).unwrap() {
                    ParseOk::Packet(frame, _) => frame,
                    other => panic!("unexpected parse result: {:?}", other),
                })
                .collect()
        }
    }

    #[derive(Clone, Default)]
    struct MockSink {
        events: Arc<Mutex<Vec<MqttEvent>>>,
    }

    impl EventSink for MockSink {
        fn emit(&mut self, event: MqttEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl MockSink {
        fn take(&self) -> Vec<MqttEvent> {
            std::mem::take(&mut *self.events.lock().unwrap())
        }
    }

    #[derive(Clone, Default)]
    struct MockTimer {
        scheduled: Arc<Mutex<Vec<(u64, u64)>>>, // (handle id, delay ms)
        cancelled: Arc<Mutex<Vec<u64>>>,
        next: Arc<Mutex<u64>>,
    }

    impl TimerDriver for MockTimer {
        fn schedule_once(&mut self, delay_ms: u64) -> TimerHandle {
            let mut next = self.next.lock().unwrap();
            *next += 1;
            self.scheduled.lock().unwrap().push((*next, delay_ms));
            TimerHandle(*next)
        }
        fn cancel(&mut self, handle: TimerHandle) {
            self.cancelled.lock().unwrap().push(handle.0);
        }
    }

    type TestEngine = MqttEngine<MockTransport, MockSink, MockTimer>;

    fn engine() -> (TestEngine, MockTransport, MockSink, MockTimer, Instant) {
        let transport = MockTransport::default();
        let sink = MockSink::default();
        let timer = MockTimer::default();
        let now = Instant::now();
        let engine = MqttEngine::new(transport.clone(), sink.clone(), timer.clone(), now);
        (engine, transport, sink, timer, now)
    }

    fn opts(keep_alive: u16) -> MqttClientOptions {
        MqttClientOptions::builder()
            .client_id("test")
            .keep_alive(keep_alive)
            .build()
            .unwrap()
    }

    /// Bring an engine to `Connected` with the CONNECT frame written.
    fn connected_engine(keep_alive: u16) -> (TestEngine, MockTransport, MockSink, MockTimer, Instant) {
        let (mut engine, transport, sink, timer, now) = engine();
        engine.handle_command(ClientCommand::Connect(opts(keep_alive)), now);
        engine.handle_transport_event(TransportEvent::Connected, now);
        engine.handle_transport_event(TransportEvent::Received(vec![0x20, 0x02, 0x00, 0x00]), now);
        transport.written.lock().unwrap().clear();
        sink.take();
        (engine, transport, sink, timer, now)
    }

    #[test]
    fn test_connack_success_path() {
        let (mut engine, transport, sink, _timer, now) = engine();

        engine.handle_command(ClientCommand::Connect(opts(60)), now);
        assert_eq!(engine.state(), EngineState::Connecting);
        assert_eq!(*transport.connects.lock().unwrap(), 1);
        assert!(transport.frames().is_empty());

        engine.handle_transport_event(TransportEvent::Connected, now);
        assert_eq!(engine.state(), EngineState::Connected);
        assert!(engine.registers().transport_watched);
        let frames = transport.frames();
        assert_eq!(frames.len(), 1);
        match &frames[0] {
            MqttPacket::Connect(c) => {
                assert_eq!(c.client_id, "test");
                assert_eq!(c.keep_alive, 60);
            }
            other => panic!("expected CONNECT, got {:?}", other),
        }
        assert_eq!(engine.registers().keep_alive_ms, 60_000);
        assert!(engine.registers().timer_handle.is_some());

        // CONNACK return code 0
        engine.handle_transport_event(TransportEvent::Received(vec![0x20, 0x02, 0x00, 0x00]), now);
        assert_eq!(sink.take(), vec![MqttEvent::Connected]);

        // Status now reports connected.
        engine.handle_command(ClientCommand::Status, now);
        assert_eq!(sink.take(), vec![MqttEvent::Connected]);
    }

    #[test]
    fn test_connack_rejection_closes_transport() {
        let (mut engine, transport, sink, _timer, now) = engine();
        engine.handle_command(ClientCommand::Connect(opts(60)), now);
        engine.handle_transport_event(TransportEvent::Connected, now);
        sink.take();

        // CONNACK return code 4: bad credentials
        engine.handle_transport_event(TransportEvent::Received(vec![0x20, 0x02, 0x00, 0x04]), now);
        assert_eq!(
            sink.take(),
            vec![
                MqttEvent::ConnectionFailure(ConnectFailureReason::BadUserNameOrPassword),
                MqttEvent::Disconnected,
            ]
        );
        assert!(*transport.aborted.lock().unwrap());
        assert_eq!(engine.state(), EngineState::NotConnected);
    }

    #[test]
    fn test_transport_connect_failure() {
        let (mut engine, _transport, sink, _timer, now) = engine();
        engine.handle_command(ClientCommand::Connect(opts(60)), now);
        engine.handle_transport_event(TransportEvent::ConnectFailed, now);
        assert_eq!(engine.state(), EngineState::NotConnected);
        assert_eq!(
            sink.take(),
            vec![MqttEvent::ConnectionFailure(
                ConnectFailureReason::TransportNotReady
            )]
        );
    }

    #[test]
    fn test_state_gate_rejects_commands_before_connect() {
        let (mut engine, _transport, sink, _timer, now) = engine();

        engine.handle_command(
            ClientCommand::Publish(PublishCommand::new("t", vec![], 0, false)),
            now,
        );
        assert_eq!(
            sink.take(),
            vec![MqttEvent::Error(MqttClientError::NotConnected)]
        );

        engine.handle_command(ClientCommand::Connect(opts(60)), now);
        sink.take();
        // Still connecting: same gate.
        engine.handle_command(
            ClientCommand::Subscribe(SubscribeCommand::single("a", 0)),
            now,
        );
        assert_eq!(
            sink.take(),
            vec![MqttEvent::Error(MqttClientError::NotConnected)]
        );
        assert!(engine.registers().sent_in_flight.is_empty());
    }

    #[test]
    fn test_status_while_not_connected() {
        let (mut engine, _transport, sink, _timer, now) = engine();
        engine.handle_command(ClientCommand::Status, now);
        assert_eq!(sink.take(), vec![MqttEvent::Disconnected]);
    }

    #[test]
    fn test_qos1_publish_handshake() {
        let (mut engine, transport, _sink, _timer, now) = connected_engine(60);

        engine.handle_command(
            ClientCommand::Publish(PublishCommand::new("t", b"hi".to_vec(), 1, false)),
            now,
        );
        let frames = transport.frames();
        assert_eq!(frames.len(), 1);
        let id = match &frames[0] {
            MqttPacket::Publish(p) => p.message_id.unwrap(),
            other => panic!("expected PUBLISH, got {:?}", other),
        };
        assert!(engine.registers().sent_in_flight.contains_key(&id));

        let puback = MqttPacket::PubAck(MqttPubAck::new(id)).to_bytes().unwrap();
        engine.handle_transport_event(TransportEvent::Received(puback), now);
        assert!(engine.registers().sent_in_flight.is_empty());
    }

    #[test]
    fn test_qos2_publish_handshake() {
        let (mut engine, transport, _sink, _timer, now) = connected_engine(60);

        engine.handle_command(
            ClientCommand::Publish(PublishCommand::new("t", b"hi".to_vec(), 2, false)),
            now,
        );
        let id = match &transport.frames()[0] {
            MqttPacket::Publish(p) => p.message_id.unwrap(),
            other => panic!("expected PUBLISH, got {:?}", other),
        };
        transport.written.lock().unwrap().clear();

        // PUBREC: stored frame becomes PUBREL and PUBREL goes out.
        let pubrec = crate::mqtt_serde::mqttv3::pubrec::MqttPubRec::new(id)
            .to_bytes()
            .unwrap();
        engine.handle_transport_event(TransportEvent::Received(pubrec), now);
        assert!(matches!(
            engine.registers().sent_in_flight.get(&id),
            Some(MqttPacket::PubRel(_))
        ));
        assert!(matches!(
            transport.frames()[0],
            MqttPacket::PubRel(ref r) if r.message_id == id
        ));

        // PUBCOMP clears the record.
        let pubcomp = crate::mqtt_serde::mqttv3::pubcomp::MqttPubComp::new(id)
            .to_bytes()
            .unwrap();
        engine.handle_transport_event(TransportEvent::Received(pubcomp), now);
        assert!(engine.registers().sent_in_flight.is_empty());
    }

    #[test]
    fn test_qos2_inbound_dedup() {
        let (mut engine, transport, sink, _timer, now) = connected_engine(60);

        let publish = MqttPublish::new("t".to_string(), 2, b"m".to_vec(), Some(5), false, false)
            .to_bytes()
            .unwrap();
        engine.handle_transport_event(TransportEvent::Received(publish.clone()), now);
        engine.handle_transport_event(TransportEvent::Received(publish), now);

        // Exactly one delivery to the application, two PUBRECs on the wire.
        let deliveries = sink
            .take()
            .into_iter()
            .filter(|e| matches!(e, MqttEvent::MessageReceived(_)))
            .count();
        assert_eq!(deliveries, 1);
        let pubrecs = transport
            .frames()
            .into_iter()
            .filter(|f| matches!(f, MqttPacket::PubRec(_)))
            .count();
        assert_eq!(pubrecs, 2);
        assert!(engine.registers().recv_in_flight.contains(&5));

        // PUBREL releases the id and PUBCOMP goes out.
        let pubrel = crate::mqtt_serde::mqttv3::pubrel::MqttPubRel::new(5)
            .to_bytes()
            .unwrap();
        engine.handle_transport_event(TransportEvent::Received(pubrel), now);
        assert!(!engine.registers().recv_in_flight.contains(&5));
        assert!(transport
            .frames()
            .iter()
            .any(|f| matches!(f, MqttPacket::PubComp(c) if c.message_id == 5)));
    }

    #[test]
    fn test_keep_alive_silence_pings_once() {
        let (mut engine, transport, _sink, _timer, now) = connected_engine(60);

        let handle = engine.registers().timer_handle.unwrap();
        let tick = now + Duration::from_secs(60);
        engine.handle_timer_fired(handle, tick);

        let frames = transport.frames();
        assert_eq!(frames.len(), 1);
        assert!(matches!(frames[0], MqttPacket::PingReq(_)));
        assert!(engine.registers().ping_response_pending);
        // Re-armed for the next period.
        assert!(engine.registers().timer_handle.is_some());

        // PINGRESP clears the flag.
        engine.handle_transport_event(
            TransportEvent::Received(MqttPingResp::new().to_bytes().unwrap()),
            tick,
        );
        assert!(!engine.registers().ping_response_pending);
    }

    #[test]
    fn test_timer_tick_with_recent_traffic_rearms_only() {
        let (mut engine, transport, _sink, timer, now) = connected_engine(60);

        let handle = engine.registers().timer_handle.unwrap();
        // Traffic 20s into the period.
        engine.handle_command(
            ClientCommand::Publish(PublishCommand::new("t", vec![], 0, false)),
            now + Duration::from_secs(20),
        );
        transport.written.lock().unwrap().clear();

        engine.handle_timer_fired(handle, now + Duration::from_secs(60));
        assert!(transport.frames().is_empty());
        // Last wakeup covers the remaining 20s of quiet time.
        let scheduled = timer.scheduled.lock().unwrap();
        assert_eq!(scheduled.last().unwrap().1, 20_000);
    }

    #[test]
    fn test_ping_timeout_aborts_and_disconnects() {
        let (mut engine, transport, sink, _timer, now) = connected_engine(60);

        let handle = engine.registers().timer_handle.unwrap();
        engine.handle_timer_fired(handle, now + Duration::from_secs(60));
        assert!(engine.registers().ping_response_pending);
        sink.take();

        // No PINGRESP before the next tick.
        let handle = engine.registers().timer_handle.unwrap();
        engine.handle_timer_fired(handle, now + Duration::from_secs(120));

        assert!(*transport.aborted.lock().unwrap());
        assert_eq!(engine.state(), EngineState::NotConnected);
        assert_eq!(
            sink.take(),
            vec![
                MqttEvent::ConnectionFailure(ConnectFailureReason::ServerNotResponding),
                MqttEvent::Disconnected,
            ]
        );
    }

    #[test]
    fn test_stale_timer_fire_is_ignored() {
        let (mut engine, transport, _sink, _timer, now) = connected_engine(60);
        engine.handle_timer_fired(TimerHandle(999), now + Duration::from_secs(60));
        assert!(transport.frames().is_empty());
    }

    #[test]
    fn test_transport_closed_clears_state() {
        let (mut engine, _transport, sink, timer, now) = connected_engine(60);

        engine.handle_command(
            ClientCommand::Publish(PublishCommand::new("t", b"x".to_vec(), 1, false)),
            now,
        );
        assert_eq!(engine.registers().sent_in_flight.len(), 1);
        let armed = engine.registers().timer_handle.unwrap();

        engine.handle_transport_event(TransportEvent::Closed, now);
        assert_eq!(engine.state(), EngineState::NotConnected);
        assert!(!engine.registers().transport_watched);
        assert!(engine.registers().sent_in_flight.is_empty());
        assert!(engine.registers().timer_handle.is_none());
        assert!(timer.cancelled.lock().unwrap().contains(&armed.0));
        assert_eq!(sink.take(), vec![MqttEvent::Disconnected]);

        // Late Closed from the dead transport is ignored.
        engine.handle_transport_event(TransportEvent::Closed, now);
        assert!(sink.take().is_empty());
    }

    #[test]
    fn test_disconnect_command() {
        let (mut engine, transport, sink, _timer, now) = connected_engine(60);

        engine.handle_command(ClientCommand::Disconnect, now);
        let frames = transport.frames();
        assert!(matches!(frames[0], MqttPacket::Disconnect(_)));
        assert!(*transport.aborted.lock().unwrap());
        assert_eq!(engine.state(), EngineState::NotConnected);
        assert_eq!(sink.take(), vec![MqttEvent::Disconnected]);
    }

    #[test]
    fn test_malformed_inbound_bytes_are_fatal() {
        let (mut engine, transport, sink, _timer, now) = connected_engine(60);

        // Reserved packet type 0.
        engine.handle_transport_event(TransportEvent::Received(vec![0x00, 0x00]), now);
        assert_eq!(engine.state(), EngineState::NotConnected);
        assert!(*transport.aborted.lock().unwrap());
        let events = sink.take();
        assert!(matches!(
            events[0],
            MqttEvent::Error(MqttClientError::ProtocolViolation { .. })
        ));
        assert_eq!(events[1], MqttEvent::Disconnected);
    }

    #[test]
    fn test_interleaved_frames_in_one_chunk() {
        let (mut engine, _transport, _sink, _timer, now) = connected_engine(60);

        // Outstanding QoS 1 publish with id 7 and a pending ping.
        engine.handle_command(
            ClientCommand::Publish(PublishCommand::new("t", b"x".to_vec(), 1, false)),
            now,
        );
        let handle = engine.registers().timer_handle.unwrap();
        engine.handle_timer_fired(handle, now + Duration::from_secs(60));
        assert!(engine.registers().ping_response_pending);
        let id = *engine.registers().sent_in_flight.keys().next().unwrap();

        let mut chunk = MqttPingResp::new().to_bytes().unwrap();
        chunk.extend(MqttPubAck::new(id).to_bytes().unwrap());
        engine.handle_transport_event(TransportEvent::Received(chunk), now);

        assert!(!engine.registers().ping_response_pending);
        assert!(engine.registers().sent_in_flight.is_empty());
    }

    #[test]
    fn test_chunked_publish_reassembly() {
        let (mut engine, _transport, sink, _timer, now) = connected_engine(60);

        let payload = vec![0x42u8; 30_000];
        let publish =
            MqttPublish::new("bulk".to_string(), 1, payload.clone(), Some(3), false, false);
        let bytes = publish.to_bytes().unwrap();
        let split = bytes.len() / 2;

        engine.handle_transport_event(TransportEvent::Received(bytes[..split].to_vec()), now);
        assert!(sink.take().is_empty());
        engine.handle_transport_event(TransportEvent::Received(bytes[split..].to_vec()), now);

        let events = sink.take();
        assert_eq!(events.len(), 1);
        match &events[0] {
            MqttEvent::MessageReceived(p) => {
                assert_eq!(p.topic_name, "bulk");
                assert_eq!(p.payload, payload);
            }
            other => panic!("expected MessageReceived, got {:?}", other),
        }
    }
}
