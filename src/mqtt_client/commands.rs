use serde::{Deserialize, Serialize};

use super::opts::MqttClientOptions;
use crate::mqtt_serde::mqttv3::subscribe::SubscriptionTopic;

/// The application command port: everything a caller can ask of the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    /// Query the current connection state.
    Status,
    /// Open a transport connection and perform the MQTT handshake.
    Connect(MqttClientOptions),
    /// Send DISCONNECT and tear the transport down.
    Disconnect,
    Publish(PublishCommand),
    Subscribe(SubscribeCommand),
    Unsubscribe(UnsubscribeCommand),
}

/// A publish request from the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishCommand {
    pub topic_name: String,
    pub payload: Vec<u8>,
    pub qos: u8,
    pub retain: bool,
}

impl PublishCommand {
    pub fn new(topic_name: impl Into<String>, payload: Vec<u8>, qos: u8, retain: bool) -> Self {
        Self {
            topic_name: topic_name.into(),
            payload,
            qos,
            retain,
        }
    }

    pub fn builder() -> PublishCommandBuilder {
        PublishCommandBuilder::new()
    }
}

/// Builder for publish commands.
#[derive(Debug, Clone)]
pub struct PublishCommandBuilder {
    topic_name: Option<String>,
    payload: Vec<u8>,
    qos: u8,
    retain: bool,
}

/// Error type for publish builder validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishBuilderError {
    /// Topic name was not provided
    NoTopic,
}

impl std::fmt::Display for PublishBuilderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoTopic => write!(f, "Topic name not provided. Call topic() to set the topic."),
        }
    }
}

impl std::error::Error for PublishBuilderError {}

impl PublishCommandBuilder {
    pub fn new() -> Self {
        Self {
            topic_name: None,
            payload: Vec::new(),
            qos: 0,
            retain: false,
        }
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic_name = Some(topic.into());
        self
    }

    pub fn payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn qos(mut self, qos: u8) -> Self {
        self.qos = qos;
        self
    }

    pub fn retain(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }

    pub fn build(self) -> Result<PublishCommand, PublishBuilderError> {
        let topic_name = self.topic_name.ok_or(PublishBuilderError::NoTopic)?;
        Ok(PublishCommand {
            topic_name,
            payload: self.payload,
            qos: self.qos,
            retain: self.retain,
        })
    }
}

impl Default for PublishCommandBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A subscribe request: one or more topic filters with requested QoS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeCommand {
    pub subscriptions: Vec<SubscriptionTopic>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeBuilderError {
    NoTopics,
}

impl std::fmt::Display for SubscribeBuilderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoTopics => write!(
                f,
                "No topics added to subscription. Call add_topic() at least once."
            ),
        }
    }
}

impl std::error::Error for SubscribeBuilderError {}

impl SubscribeCommand {
    pub fn new(subscriptions: Vec<SubscriptionTopic>) -> Self {
        Self { subscriptions }
    }

    pub fn single(topic: impl Into<String>, qos: u8) -> Self {
        Self::new(vec![SubscriptionTopic::new(topic, qos)])
    }

    pub fn builder() -> SubscribeCommandBuilder {
        SubscribeCommandBuilder::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SubscribeCommandBuilder {
    topics: Vec<SubscriptionTopic>,
}

impl SubscribeCommandBuilder {
    pub fn new() -> Self {
        Self { topics: Vec::new() }
    }

    pub fn add_topic(mut self, topic: impl Into<String>, qos: u8) -> Self {
        self.topics.push(SubscriptionTopic::new(topic, qos));
        self
    }

    pub fn build(self) -> Result<SubscribeCommand, SubscribeBuilderError> {
        if self.topics.is_empty() {
            return Err(SubscribeBuilderError::NoTopics);
        }
        Ok(SubscribeCommand {
            subscriptions: self.topics,
        })
    }
}

/// An unsubscribe request: topic filters to drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsubscribeCommand {
    pub topics: Vec<String>,
}

impl UnsubscribeCommand {
    pub fn new(topics: Vec<String>) -> Self {
        Self { topics }
    }

    pub fn from_topics(topics: Vec<String>) -> Self {
        Self::new(topics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_publish() {
        let cmd = PublishCommand::builder()
            .topic("sensors/temp")
            .payload(b"23.5".to_vec())
            .qos(1)
            .build()
            .unwrap();

        assert_eq!(cmd.topic_name, "sensors/temp");
        assert_eq!(cmd.payload, b"23.5");
        assert_eq!(cmd.qos, 1);
        assert!(!cmd.retain);
    }

    #[test]
    fn test_publish_with_retain() {
        let cmd = PublishCommand::builder()
            .topic("status/online")
            .payload(b"true".to_vec())
            .retain(true)
            .build()
            .unwrap();

        assert!(cmd.retain);
        assert_eq!(cmd.qos, 0); // Default QoS
    }

    #[test]
    fn test_publish_no_topic_error() {
        let result = PublishCommand::builder().payload(b"test".to_vec()).build();
        assert!(matches!(result, Err(PublishBuilderError::NoTopic)));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Topic name not provided"));
    }

    #[test]
    fn test_subscribe_single() {
        let cmd = SubscribeCommand::single("sensors/#", 2);
        assert_eq!(cmd.subscriptions.len(), 1);
        assert_eq!(cmd.subscriptions[0].topic_filter, "sensors/#");
        assert_eq!(cmd.subscriptions[0].qos, 2);
    }

    #[test]
    fn test_subscribe_builder_multiple() {
        let cmd = SubscribeCommand::builder()
            .add_topic("sensors/temp", 1)
            .add_topic("sensors/humidity", 0)
            .build()
            .unwrap();
        assert_eq!(cmd.subscriptions.len(), 2);
        assert_eq!(cmd.subscriptions[1].topic_filter, "sensors/humidity");
    }

    #[test]
    fn test_subscribe_no_topics_error() {
        let result = SubscribeCommand::builder().build();
        assert!(matches!(result, Err(SubscribeBuilderError::NoTopics)));
    }

    #[test]
    fn test_unsubscribe_from_topics() {
        let cmd = UnsubscribeCommand::from_topics(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(cmd.topics, vec!["a", "b"]);
    }
}
