//! Channel-driven front end for the engine.
//!
//! [`start`] spawns a task that owns the [`MqttEngine`] and serializes every
//! stimulus — application commands, transport events, timer fires — through
//! one queue, so handlers always run one at a time. [`MqttClient`] is the
//! cheap clonable handle the application keeps.

use std::time::Instant;

use tokio::sync::mpsc;
use tracing::debug;

use super::commands::{ClientCommand, PublishCommand, SubscribeCommand, UnsubscribeCommand};
use super::engine::MqttEngine;
use super::error::MqttClientError;
use super::events::MqttEvent;
use super::opts::MqttClientOptions;
use super::timer::TokioTimer;
use super::transport::{TransportEvent, TransportLink};

/// Handle for submitting commands to a running engine.
#[derive(Clone)]
pub struct MqttClient {
    commands: mpsc::UnboundedSender<ClientCommand>,
}

impl MqttClient {
    pub fn status(&self) -> Result<(), MqttClientError> {
        self.send(ClientCommand::Status)
    }

    pub fn connect(&self, opts: MqttClientOptions) -> Result<(), MqttClientError> {
        self.send(ClientCommand::Connect(opts))
    }

    pub fn disconnect(&self) -> Result<(), MqttClientError> {
        self.send(ClientCommand::Disconnect)
    }

    pub fn publish(&self, command: PublishCommand) -> Result<(), MqttClientError> {
        self.send(ClientCommand::Publish(command))
    }

    pub fn subscribe(&self, command: SubscribeCommand) -> Result<(), MqttClientError> {
        self.send(ClientCommand::Subscribe(command))
    }

    pub fn unsubscribe(&self, command: UnsubscribeCommand) -> Result<(), MqttClientError> {
        self.send(ClientCommand::Unsubscribe(command))
    }

    fn send(&self, command: ClientCommand) -> Result<(), MqttClientError> {
        self.commands
            .send(command)
            .map_err(|_| MqttClientError::ChannelClosed)
    }
}

/// Spawn the engine's stimulus loop.
///
/// The transport delivers its events through `transport_events`; the returned
/// receiver carries everything the engine reports back to the application.
/// The loop ends when every [`MqttClient`] handle is dropped and the
/// transport event channel is closed.
pub fn start<T>(
    transport: T,
    transport_events: mpsc::UnboundedReceiver<TransportEvent>,
) -> (MqttClient, mpsc::UnboundedReceiver<MqttEvent>)
where
    T: TransportLink + Send + 'static,
{
    let (command_tx, mut command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (timer_tx, mut timer_rx) = mpsc::unbounded_channel();

    let timer = TokioTimer::new(timer_tx);
    let mut engine = MqttEngine::new(transport, event_tx, timer, Instant::now());
    let mut transport_events = transport_events;

    tokio::spawn(async move {
        loop {
            tokio::select! {
                command = command_rx.recv() => match command {
                    Some(command) => engine.handle_command(command, Instant::now()),
                    None => break,
                },
                event = transport_events.recv() => match event {
                    Some(event) => engine.handle_transport_event(event, Instant::now()),
                    None => break,
                },
                Some(handle) = timer_rx.recv() => {
                    engine.handle_timer_fired(handle, Instant::now());
                }
            }
        }
        debug!("engine stimulus loop stopped");
    });

    (
        MqttClient {
            commands: command_tx,
        },
        event_rx,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mqtt_client::transport::TransportError;
    use std::sync::{Arc, Mutex};
    use tokio::time::{timeout, Duration};

    /// Transport that hands connect/write notifications back to the test.
    #[derive(Clone)]
    struct ScriptedTransport {
        events: mpsc::UnboundedSender<TransportEvent>,
        written: Arc<Mutex<Vec<u8>>>,
    }

    impl TransportLink for ScriptedTransport {
        fn connect(&mut self) {
            // Come up immediately.
            let _ = self.events.send(TransportEvent::Connected);
        }
        fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
            self.written.lock().unwrap().extend_from_slice(bytes);
            Ok(())
        }
        fn close(&mut self) {}
        fn abort(&mut self) {}
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<MqttEvent>) -> MqttEvent {
        timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn test_full_connect_flow_over_channels() {
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let written = Arc::new(Mutex::new(Vec::new()));
        let transport = ScriptedTransport {
            events: transport_tx.clone(),
            written: written.clone(),
        };

        let (client, mut events) = start(transport, transport_rx);

        let opts = MqttClientOptions::builder()
            .client_id("chan-test")
            .keep_alive(60)
            .build()
            .unwrap();
        client.connect(opts).unwrap();

        // Feed CONNACK once the CONNECT frame has been written.
        timeout(Duration::from_secs(1), async {
            loop {
                if !written.lock().unwrap().is_empty() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("CONNECT was never written");
        transport_tx
            .send(TransportEvent::Received(vec![0x20, 0x02, 0x00, 0x00]))
            .unwrap();

        assert_eq!(next_event(&mut events).await, MqttEvent::Connected);

        client.status().unwrap();
        assert_eq!(next_event(&mut events).await, MqttEvent::Connected);

        transport_tx.send(TransportEvent::Closed).unwrap();
        assert_eq!(next_event(&mut events).await, MqttEvent::Disconnected);
    }

    #[tokio::test]
    async fn test_command_gate_over_channels() {
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let transport = ScriptedTransport {
            events: transport_tx,
            written: Arc::new(Mutex::new(Vec::new())),
        };
        let (client, mut events) = start(transport, transport_rx);

        client
            .publish(PublishCommand::new("t", vec![], 0, false))
            .unwrap();
        assert_eq!(
            next_event(&mut events).await,
            MqttEvent::Error(MqttClientError::NotConnected)
        );
    }
}
