//! Card types: the canvas entities that own sockets

use serde::{Deserialize, Serialize};

use super::socket::{Socket, SocketId, SocketType};

/// Unique identifier for a card
pub type CardId = String;

/// How a card body is shown on the canvas
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Default,
    Minimized,
}

/// The two ordered socket arrays of a card
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardSockets {
    #[serde(default)]
    pub inputs: Vec<Socket>,
    #[serde(default)]
    pub outputs: Vec<Socket>,
}

impl CardSockets {
    /// The socket array of one type
    pub fn of_type(&self, socket_type: SocketType) -> &[Socket] {
        match socket_type {
            SocketType::Input => &self.inputs,
            SocketType::Output => &self.outputs,
        }
    }

    pub fn of_type_mut(&mut self, socket_type: SocketType) -> &mut Vec<Socket> {
        match socket_type {
            SocketType::Input => &mut self.inputs,
            SocketType::Output => &mut self.outputs,
        }
    }

    /// Find a socket of either type by id
    pub fn find(&self, socket_id: &str) -> Option<&Socket> {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .find(|socket| socket.id == socket_id)
    }

    pub fn ids(&self, socket_type: SocketType) -> Vec<SocketId> {
        self.of_type(socket_type).iter().map(|s| s.id.clone()).collect()
    }
}

/// A card on the canvas. Owns its sockets; sockets never outlive their card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub uuid: CardId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub display: DisplayMode,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub sockets: CardSockets,
}

impl Card {
    /// Creates an empty card at the origin
    pub fn new(uuid: impl Into<CardId>, name: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the position of the card
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_sockets(mut self, socket_type: SocketType, sockets: Vec<Socket>) -> Self {
        *self.sockets.of_type_mut(socket_type) = sockets;
        self
    }

    /// Whether the card body is visible
    pub fn is_expanded(&self) -> bool {
        self.display == DisplayMode::Default
    }

    /// Socket of a type at a position
    pub fn socket_at(&self, socket_type: SocketType, index: usize) -> Option<&Socket> {
        self.sockets.of_type(socket_type).get(index)
    }
}
