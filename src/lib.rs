//! Card sockets core library
//!
//! Socket identity, positional socket array diffing, socket update events and
//! the card edge store that consumes them.

pub mod cards;
pub mod config;
pub mod constants;
pub mod error;
pub mod replay;

// Re-export commonly used types
pub use cards::{
    update_socket_array, Card, CardEvent, CardGraph, ReindexMap, Socket, SocketId, SocketType,
    SocketUpdateEvent, ViewCard,
};
pub use config::SocketSettings;
pub use error::{SocketError, SocketResult};
pub use replay::{ReplayScript, Replayer};
