//! The application event port: everything the engine reports back.

use super::error::MqttClientError;
use crate::mqtt_serde::mqttv3::connack;
use crate::mqtt_serde::mqttv3::publish::MqttPublish;

/// Why a connection attempt did not produce a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectFailureReason {
    /// The transport never came up.
    TransportNotReady,
    /// A ping went unanswered for a full keep-alive period.
    ServerNotResponding,
    /// CONNACK return code 1.
    BadProtocolVersion,
    /// CONNACK return code 2.
    IdentifierRejected,
    /// CONNACK return code 3.
    ServerUnavailable,
    /// CONNACK return code 4.
    BadUserNameOrPassword,
    /// CONNACK return code 5.
    NotAuthorized,
}

impl ConnectFailureReason {
    /// Map a non-zero CONNACK return code onto its failure reason.
    pub fn from_return_code(code: u8) -> Option<Self> {
        match code {
            connack::RETURN_BAD_PROTOCOL_VERSION => Some(Self::BadProtocolVersion),
            connack::RETURN_IDENTIFIER_REJECTED => Some(Self::IdentifierRejected),
            connack::RETURN_SERVER_UNAVAILABLE => Some(Self::ServerUnavailable),
            connack::RETURN_BAD_USERNAME_OR_PASSWORD => Some(Self::BadUserNameOrPassword),
            connack::RETURN_NOT_AUTHORIZED => Some(Self::NotAuthorized),
            _ => None,
        }
    }
}

/// Events emitted by the engine for the application.
#[derive(Debug, Clone, PartialEq)]
pub enum MqttEvent {
    /// The broker accepted the CONNECT.
    Connected,
    /// The connection is gone, by request or by transport loss.
    Disconnected,
    /// A connection attempt failed.
    ConnectionFailure(ConnectFailureReason),
    /// An application message arrived.
    MessageReceived(MqttPublish),
    /// The broker confirmed a subscription with the granted QoS levels.
    Subscribed(Vec<u8>),
    /// The broker confirmed an unsubscription.
    Unsubscribed,
    /// A non-fatal or fatal error, see [`MqttClientError`].
    Error(MqttClientError),
}
