//! Error type shared by every socket, card and graph operation

use std::path::PathBuf;

use thiserror::Error;

use crate::cards::{CardId, SocketId};

/// Result alias used throughout the crate
pub type SocketResult<T> = Result<T, SocketError>;

/// Errors raised by socket allocation, diffing, event validation and the card graph
#[derive(Debug, Error)]
pub enum SocketError {
    /// A socket update event breaks one of its identity invariants.
    /// This is a bug in whoever computed the diff and must reach the caller.
    #[error("socket update validation failed: {message}")]
    Validation { message: String },

    /// A malformed argument, such as an index past the per-side socket limit
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("unknown card '{card_id}'")]
    UnknownCard { card_id: CardId },

    #[error("card '{card_id}' has no socket '{socket_id}'")]
    UnknownSocket { card_id: CardId, socket_id: SocketId },

    #[error("invalid connection: {message}")]
    InvalidConnection { message: String },

    /// The event was computed against sockets the card no longer has
    #[error("stale socket update for card '{card_id}': {message}")]
    StaleEvent { card_id: CardId, message: String },

    #[error("failed to render content: {message}")]
    Render { message: String },

    #[error("config error in {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SocketError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn unknown_card(card_id: impl Into<CardId>) -> Self {
        Self::UnknownCard {
            card_id: card_id.into(),
        }
    }

    pub fn unknown_socket(card_id: impl Into<CardId>, socket_id: impl Into<SocketId>) -> Self {
        Self::UnknownSocket {
            card_id: card_id.into(),
            socket_id: socket_id.into(),
        }
    }

    pub fn invalid_connection(message: impl Into<String>) -> Self {
        Self::InvalidConnection {
            message: message.into(),
        }
    }

    pub fn stale(card_id: impl Into<CardId>, message: impl Into<String>) -> Self {
        Self::StaleEvent {
            card_id: card_id.into(),
            message: message.into(),
        }
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error signals a broken diff rather than bad host input
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
