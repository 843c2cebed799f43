//! Card system - sockets, socket array diffing and the card edge store

// Socket primitives
pub mod allocator;
pub mod card;
pub mod socket;

// Socket array updates
pub mod differ;
pub mod events;
pub mod reindex;
pub mod transaction;

// Edge store and card hosting
pub mod content;
pub mod graph;
pub mod hooks;
pub mod view_card;

// Re-export core types
pub use card::{Card, CardId, CardSockets, DisplayMode};
pub use socket::{create_socket, Socket, SocketId, SocketInit, SocketType};
pub use allocator::generate_socket_id;

// Re-export update types
pub use differ::{update_socket_array, DesiredSockets, SocketDelta, SocketDiff, SocketSpec};
pub use events::{create_socket_update_event, SocketUpdateEvent, SocketUpdateParams};
pub use reindex::{ReindexEntry, ReindexMap};
pub use transaction::CardTransaction;

pub use content::{ContentKind, ContentRenderer, ContentRenderers, RenderedContent};
pub use graph::{AppliedUpdate, CardGraph, Connection};
pub use hooks::{CardEvent, CardEventSink, ConnectionDrag, NullSink};
pub use view_card::ViewCard;
