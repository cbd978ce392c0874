// SPDX-License-Identifier: MPL-2.0

//! Error types surfaced through the application event port.

use crate::mqtt_serde::parser::ParseError;
use std::fmt;

/// Failures the engine reports to the application.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum MqttClientError {
    /// A command other than Connect/Status was issued without a connection.
    NotConnected,

    /// The transport could not be brought up for a connection attempt.
    TransportNotReady,

    /// The broker sent bytes that violate MQTT 3.1 framing. Fatal to the
    /// connection.
    ProtocolViolation { message: String },

    /// The engine's stimulus loop is gone; the command could not be delivered.
    ChannelClosed,
}

impl MqttClientError {
    /// Protocol violations end the connection; everything else leaves the
    /// engine where it was.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ProtocolViolation { .. })
    }
}

impl fmt::Display for MqttClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "Not connected to broker. Call connect() first."),
            Self::TransportNotReady => write!(f, "Transport could not be established."),
            Self::ProtocolViolation { message } => {
                write!(f, "MQTT protocol violation: {}", message)
            }
            Self::ChannelClosed => write!(f, "Engine command channel closed unexpectedly."),
        }
    }
}

impl std::error::Error for MqttClientError {}

impl From<ParseError> for MqttClientError {
    fn from(error: ParseError) -> Self {
        Self::ProtocolViolation {
            message: error.to_string(),
        }
    }
}
