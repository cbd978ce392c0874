// SPDX-License-Identifier: MPL-2.0

pub mod actions;
pub mod client;
pub mod commands;
pub mod engine;
pub mod error;
pub mod events;
pub mod handlers;
pub mod opts;
pub mod registers;
pub mod timer;
pub mod transport;

pub use client::{start, MqttClient};
pub use commands::{ClientCommand, PublishCommand, SubscribeCommand, UnsubscribeCommand};
pub use engine::{EngineState, EventSink, MqttEngine, Stimulus};
pub use error::MqttClientError;
pub use events::{ConnectFailureReason, MqttEvent};
pub use opts::MqttClientOptions;
pub use transport::{TransportEvent, TransportLink};
