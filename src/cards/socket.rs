//! Socket types and creation for card connections

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::allocator::generate_socket_id_with;
use crate::config::SocketSettings;
use crate::error::{SocketError, SocketResult};

/// Unique identifier for a socket, stable for the socket's whole life
pub type SocketId = String;

/// Type of socket (input or output)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocketType {
    #[default]
    Input,
    Output,
}

impl SocketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SocketType::Input => "input",
            SocketType::Output => "output",
        }
    }
}

impl std::fmt::Display for SocketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A connection point on a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Socket {
    pub id: SocketId,
    #[serde(rename = "type")]
    pub socket_type: SocketType,
    /// Position within the owning array of this socket's type
    pub index: usize,
    pub name: String,
    /// Payload carried by the socket. `None` is the explicit "no value" marker
    /// and serializes as `null`.
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default = "Utc::now")]
    pub moment_updated: DateTime<Utc>,
}

impl Socket {
    /// Checks if this socket is an input
    pub fn is_input(&self) -> bool {
        matches!(self.socket_type, SocketType::Input)
    }

    /// Checks if this socket is an output
    pub fn is_output(&self) -> bool {
        matches!(self.socket_type, SocketType::Output)
    }

    /// Replace the value, bumping `moment_updated` only when it actually changed.
    /// Returns whether anything changed.
    pub fn set_value(&mut self, value: Option<Value>) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        self.moment_updated = Utc::now();
        true
    }
}

/// Everything needed to build a socket
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocketInit {
    #[serde(rename = "type")]
    pub socket_type: SocketType,
    pub index: usize,
    #[serde(default)]
    pub existing_id: Option<SocketId>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
}

impl SocketInit {
    pub fn new(socket_type: SocketType, index: usize) -> Self {
        Self {
            socket_type,
            index,
            ..Self::default()
        }
    }

    pub fn with_existing_id(mut self, id: impl Into<SocketId>) -> Self {
        self.existing_id = Some(id.into());
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Default display name for a socket, e.g. "Input 1" for index 0
pub fn default_socket_name(settings: &SocketSettings, socket_type: SocketType, index: usize) -> String {
    format!("{} {}", settings.name_prefix(socket_type), index + 1)
}

/// Creates a socket using the process-wide settings
pub fn create_socket(init: SocketInit) -> SocketResult<Socket> {
    create_socket_with(init, SocketSettings::global())
}

/// Creates a socket, reusing `existing_id` when present
pub fn create_socket_with(init: SocketInit, settings: &SocketSettings) -> SocketResult<Socket> {
    if init.index >= settings.max_sockets_per_side {
        return Err(SocketError::invalid_argument(format!(
            "{} socket index {} exceeds the limit of {} sockets per side",
            init.socket_type, init.index, settings.max_sockets_per_side
        )));
    }

    let name = match init.name {
        Some(name) if name.trim().is_empty() => {
            return Err(SocketError::invalid_argument(format!(
                "{} socket {} was given a blank name",
                init.socket_type, init.index
            )));
        }
        Some(name) => name,
        None => default_socket_name(settings, init.socket_type, init.index),
    };

    Ok(Socket {
        id: generate_socket_id_with(init.existing_id.as_deref(), settings),
        socket_type: init.socket_type,
        index: init.index,
        name,
        value: init.value,
        moment_updated: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_socket_defaults() {
        let socket = create_socket(SocketInit::new(SocketType::Input, 0)).unwrap();
        assert!(socket.is_input());
        assert_eq!(socket.index, 0);
        assert_eq!(socket.name, "Input 1");
        assert_eq!(socket.value, None);
        assert!(!socket.id.is_empty());

        let output = create_socket(SocketInit::new(SocketType::Output, 2)).unwrap();
        assert!(output.is_output());
        assert_eq!(output.name, "Output 3");
    }

    #[test]
    fn test_create_socket_keeps_existing_id_and_value() {
        let init = SocketInit::new(SocketType::Input, 0)
            .with_existing_id("socket-abc")
            .with_value(json!({"content": "hi"}))
            .with_name("Content");
        let socket = create_socket(init).unwrap();
        assert_eq!(socket.id, "socket-abc");
        assert_eq!(socket.name, "Content");
        assert_eq!(socket.value, Some(json!({"content": "hi"})));
    }

    #[test]
    fn test_create_socket_rejects_bad_arguments() {
        let settings = SocketSettings {
            max_sockets_per_side: 4,
            ..SocketSettings::default()
        };
        let err = create_socket_with(SocketInit::new(SocketType::Input, 4), &settings).unwrap_err();
        assert!(matches!(err, SocketError::InvalidArgument { .. }));

        let blank = SocketInit::new(SocketType::Input, 0).with_name("  ");
        assert!(create_socket_with(blank, &settings).is_err());
    }

    #[test]
    fn test_negative_index_rejected_on_deserialize() {
        let parsed: Result<SocketInit, _> = serde_json::from_value(json!({"type": "input", "index": -1}));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_missing_value_serializes_as_null() {
        let socket = create_socket(SocketInit::new(SocketType::Output, 0)).unwrap();
        let json = serde_json::to_value(&socket).unwrap();
        assert_eq!(json["value"], Value::Null);
        assert_eq!(json["type"], "output");
        assert!(json.get("momentUpdated").is_some());
    }

    #[test]
    fn test_set_value_bumps_timestamp_only_on_change() {
        let mut socket = create_socket(SocketInit::new(SocketType::Input, 0)).unwrap();
        let before = socket.moment_updated;
        assert!(!socket.set_value(None));
        assert_eq!(socket.moment_updated, before);
        assert!(socket.set_value(Some(json!(1))));
        assert!(socket.moment_updated >= before);
    }
}
