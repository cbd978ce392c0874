use crate::mqtt_serde::mqttv3::connect::{MqttConnect, Will};

/// Connection parameters carried by a `Connect` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttClientOptions {
    pub client_id: String,
    pub clean_session: bool,
    /// Keep-alive interval in seconds; 0 disables keep-alive pings.
    pub keep_alive: u16,
    pub will: Option<Will>,
    pub username: Option<String>,
    pub password: Option<Vec<u8>>,
}

impl MqttClientOptions {
    pub fn builder() -> MqttClientOptionsBuilder {
        MqttClientOptionsBuilder::new()
    }

    /// Keep-alive interval in milliseconds, the unit the engine ticks in.
    pub fn keep_alive_ms(&self) -> u64 {
        self.keep_alive as u64 * 1000
    }

    /// The CONNECT frame these options describe.
    pub fn to_connect(&self) -> MqttConnect {
        MqttConnect {
            clean_session: self.clean_session,
            keep_alive: self.keep_alive,
            client_id: self.client_id.clone(),
            will: self.will.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MqttClientOptionsBuilder {
    client_id: Option<String>,
    clean_session: bool,
    keep_alive: u16,
    will: Option<Will>,
    username: Option<String>,
    password: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionsBuilderError {
    /// A client identifier was not provided.
    NoClientId,
}

impl std::fmt::Display for OptionsBuilderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoClientId => write!(
                f,
                "Client identifier not provided. Call client_id() to set it."
            ),
        }
    }
}

impl std::error::Error for OptionsBuilderError {}

impl MqttClientOptionsBuilder {
    pub fn new() -> Self {
        Self {
            client_id: None,
            clean_session: true,
            keep_alive: 60,
            will: None,
            username: None,
            password: None,
        }
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn clean_session(mut self, clean_session: bool) -> Self {
        self.clean_session = clean_session;
        self
    }

    pub fn keep_alive(mut self, seconds: u16) -> Self {
        self.keep_alive = seconds;
        self
    }

    pub fn will(mut self, topic: impl Into<String>, message: impl Into<Vec<u8>>) -> Self {
        self.will = Some(Will {
            retain: false,
            qos: 0,
            topic: topic.into(),
            message: message.into(),
        });
        self
    }

    pub fn will_qos(mut self, qos: u8) -> Self {
        if let Some(will) = self.will.as_mut() {
            will.qos = qos;
        } else {
            panic!("Cannot set will_qos: no will set. Call will() first.");
        }
        self
    }

    pub fn will_retain(mut self, retain: bool) -> Self {
        if let Some(will) = self.will.as_mut() {
            will.retain = retain;
        } else {
            panic!("Cannot set will_retain: no will set. Call will() first.");
        }
        self
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<Vec<u8>>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn build(self) -> Result<MqttClientOptions, OptionsBuilderError> {
        let client_id = self.client_id.ok_or(OptionsBuilderError::NoClientId)?;
        Ok(MqttClientOptions {
            client_id,
            clean_session: self.clean_session,
            keep_alive: self.keep_alive,
            will: self.will,
            username: self.username,
            password: self.password,
        })
    }
}

impl Default for MqttClientOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
