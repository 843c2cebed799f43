//! Card graph: cards plus the edges between their sockets

use std::collections::HashMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::card::{Card, CardId};
use super::events::SocketUpdateEvent;
use super::socket::{SocketId, SocketType};
use super::transaction::CardTransaction;
use crate::error::{SocketError, SocketResult};

/// An edge from an output socket on one card to an input socket on another
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub from_card: CardId,
    pub from_socket: SocketId,
    pub to_card: CardId,
    pub to_socket: SocketId,
}

impl Connection {
    /// Creates a new connection
    pub fn new(
        from_card: impl Into<CardId>,
        from_socket: impl Into<SocketId>,
        to_card: impl Into<CardId>,
        to_socket: impl Into<SocketId>,
    ) -> Self {
        Self {
            from_card: from_card.into(),
            from_socket: from_socket.into(),
            to_card: to_card.into(),
            to_socket: to_socket.into(),
        }
    }

    /// Whether either end of this connection is the given socket of the given card
    pub fn touches(&self, card_id: &str, socket_id: &str) -> bool {
        (self.from_card == card_id && self.from_socket == socket_id)
            || (self.to_card == card_id && self.to_socket == socket_id)
    }
}

/// What applying a socket update did to the edge list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedUpdate {
    pub removed_connections: Vec<Connection>,
    pub redirected_connections: usize,
}

/// Cards and their connections. This is the edge store that consumes
/// [`SocketUpdateEvent`]s.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardGraph {
    cards: HashMap<CardId, Card>,
    connections: Vec<Connection>,
}

impl CardGraph {
    /// Creates a new empty card graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a card, replacing any card with the same uuid
    pub fn add_card(&mut self, card: Card) -> CardId {
        let id = card.uuid.clone();
        if self.cards.insert(id.clone(), card).is_some() {
            debug!("Replaced card {}", id);
        }
        id
    }

    /// Removes a card and all its connections
    pub fn remove_card(&mut self, card_id: &str) -> Option<Card> {
        self.connections
            .retain(|conn| conn.from_card != card_id && conn.to_card != card_id);
        let removed = self.cards.remove(card_id);
        if removed.is_some() {
            info!("Removed card {}", card_id);
        }
        removed
    }

    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.cards.get(card_id)
    }

    /// Puts back a card and edge list captured before a failed multi-step update
    pub(crate) fn restore(&mut self, card: Card, connections: Vec<Connection>) {
        self.cards.insert(card.uuid.clone(), card);
        self.connections = connections;
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.values()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Adds a connection between an output and an input on different cards
    pub fn add_connection(&mut self, connection: Connection) -> SocketResult<()> {
        if connection.from_card == connection.to_card {
            return Err(SocketError::invalid_connection("cannot connect a card to itself"));
        }

        let from_card = self
            .cards
            .get(&connection.from_card)
            .ok_or_else(|| SocketError::unknown_card(connection.from_card.clone()))?;
        let from_socket = from_card
            .sockets
            .find(&connection.from_socket)
            .ok_or_else(|| SocketError::unknown_socket(connection.from_card.clone(), connection.from_socket.clone()))?;
        if !from_socket.is_output() {
            return Err(SocketError::invalid_connection(format!(
                "socket {} is not an output",
                connection.from_socket
            )));
        }

        let to_card = self
            .cards
            .get(&connection.to_card)
            .ok_or_else(|| SocketError::unknown_card(connection.to_card.clone()))?;
        let to_socket = to_card
            .sockets
            .find(&connection.to_socket)
            .ok_or_else(|| SocketError::unknown_socket(connection.to_card.clone(), connection.to_socket.clone()))?;
        if !to_socket.is_input() {
            return Err(SocketError::invalid_connection(format!(
                "socket {} is not an input",
                connection.to_socket
            )));
        }

        if self.connections.contains(&connection) {
            return Err(SocketError::invalid_connection("connection already exists"));
        }

        debug!(
            "Connected {}:{} -> {}:{}",
            connection.from_card, connection.from_socket, connection.to_card, connection.to_socket
        );
        self.connections.push(connection);
        Ok(())
    }

    /// Helper to connect by socket position rather than id
    pub fn connect_by_index(
        &mut self,
        from_card: &str,
        from_index: usize,
        to_card: &str,
        to_index: usize,
    ) -> SocketResult<Connection> {
        let from_socket = self.socket_id_at(from_card, SocketType::Output, from_index)?;
        let to_socket = self.socket_id_at(to_card, SocketType::Input, to_index)?;
        let connection = Connection::new(from_card, from_socket, to_card, to_socket);
        self.add_connection(connection.clone())?;
        Ok(connection)
    }

    /// Removes a matching connection
    pub fn remove_connection(&mut self, connection: &Connection) -> Option<Connection> {
        let index = self.connections.iter().position(|c| c == connection)?;
        Some(self.connections.remove(index))
    }

    /// All connections touching one socket
    pub fn connections_for_socket(&self, card_id: &str, socket_id: &str) -> Vec<&Connection> {
        self.connections
            .iter()
            .filter(|conn| conn.touches(card_id, socket_id))
            .collect()
    }

    pub fn is_socket_connected(&self, card_id: &str, socket_id: &str) -> bool {
        self.connections.iter().any(|conn| conn.touches(card_id, socket_id))
    }

    pub fn socket_id_at(&self, card_id: &str, socket_type: SocketType, index: usize) -> SocketResult<SocketId> {
        let card = self.cards.get(card_id).ok_or_else(|| SocketError::unknown_card(card_id))?;
        card.socket_at(socket_type, index)
            .map(|socket| socket.id.clone())
            .ok_or_else(|| {
                SocketError::invalid_argument(format!(
                    "card {card_id} has no {socket_type} socket at index {index}"
                ))
            })
    }

    /// Opens a single-writer update on one card. While the transaction lives it
    /// holds the graph mutably, so no other update can start.
    pub fn begin_update(&mut self, card_id: &str) -> SocketResult<CardTransaction<'_>> {
        CardTransaction::begin(self, card_id)
    }

    /// Applies a socket update: drops edges to deleted sockets, redirects edges
    /// to renamed sockets, and swaps in the new socket array.
    ///
    /// The card's current sockets of the event's type must be exactly the
    /// event's old sockets, otherwise the event is stale.
    pub fn apply_socket_update(&mut self, event: &SocketUpdateEvent) -> SocketResult<AppliedUpdate> {
        let card_id = event.card_id();
        let socket_type = event.socket_type();
        let card = self
            .cards
            .get_mut(card_id)
            .ok_or_else(|| SocketError::unknown_card(card_id))?;

        let current = card.sockets.of_type(socket_type);
        let matches = current.len() == event.old_sockets().len()
            && current
                .iter()
                .zip(event.old_sockets())
                .all(|(have, expected)| have.id == expected.id);
        if !matches {
            return Err(SocketError::stale(
                card_id,
                format!("current {socket_type} sockets differ from the event's old sockets"),
            ));
        }

        *card.sockets.of_type_mut(socket_type) = event.new_sockets().to_vec();

        let mut applied = AppliedUpdate::default();
        let deleted = event.deleted_socket_ids();
        let renames: HashMap<&str, &SocketId> = event
            .reindex_map()
            .renamed()
            .map(|(from, to)| (from.as_str(), to))
            .collect();
        let mut kept = Vec::with_capacity(self.connections.len());
        for mut conn in self.connections.drain(..) {
            if deleted.iter().any(|id| conn.touches(card_id, id)) {
                applied.removed_connections.push(conn);
                continue;
            }
            // One lookup per endpoint; a swap must not be applied twice
            let mut redirected = false;
            if conn.from_card == card_id {
                if let Some(to) = renames.get(conn.from_socket.as_str()) {
                    conn.from_socket = (*to).clone();
                    redirected = true;
                }
            }
            if conn.to_card == card_id {
                if let Some(to) = renames.get(conn.to_socket.as_str()) {
                    conn.to_socket = (*to).clone();
                    redirected = true;
                }
            }
            if redirected {
                applied.redirected_connections += 1;
            }
            kept.push(conn);
        }
        self.connections = kept;

        debug!(
            "Applied {} socket update to card {}: {} edges removed, {} redirected",
            socket_type,
            card_id,
            applied.removed_connections.len(),
            applied.redirected_connections
        );
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::differ::update_socket_array;
    use crate::cards::reindex::ReindexMap;
    use crate::cards::events::{create_socket_update_event, SocketUpdateParams};
    use crate::cards::socket::{create_socket, Socket, SocketInit};

    fn card_with(id: &str, inputs: usize, outputs: usize) -> Card {
        let make = |socket_type: SocketType, count: usize| -> Vec<Socket> {
            (0..count)
                .map(|i| {
                    create_socket(
                        SocketInit::new(socket_type, i).with_existing_id(format!("{id}-{socket_type}-{i}")),
                    )
                    .unwrap()
                })
                .collect()
        };
        Card::new(id, id)
            .with_sockets(SocketType::Input, make(SocketType::Input, inputs))
            .with_sockets(SocketType::Output, make(SocketType::Output, outputs))
    }

    fn two_card_graph() -> CardGraph {
        let mut graph = CardGraph::new();
        graph.add_card(card_with("a", 0, 2));
        graph.add_card(card_with("b", 2, 0));
        graph
    }

    #[test]
    fn test_basic_card_operations() {
        let mut graph = two_card_graph();
        assert!(graph.card("a").is_some());
        graph.connect_by_index("a", 0, "b", 1).unwrap();
        assert_eq!(graph.connections().len(), 1);

        let removed = graph.remove_card("b");
        assert!(removed.is_some());
        assert!(graph.connections().is_empty());
    }

    #[test]
    fn test_connection_validation() {
        let mut graph = two_card_graph();
        let self_conn = Connection::new("a", "a-output-0", "a", "a-output-1");
        assert!(matches!(graph.add_connection(self_conn), Err(SocketError::InvalidConnection { .. })));

        let backwards = Connection::new("b", "b-input-0", "a", "a-output-0");
        assert!(graph.add_connection(backwards).is_err());

        let missing = Connection::new("a", "nope", "b", "b-input-0");
        assert!(matches!(graph.add_connection(missing), Err(SocketError::UnknownSocket { .. })));

        let ghost = Connection::new("ghost", "x", "b", "b-input-0");
        assert!(matches!(graph.add_connection(ghost), Err(SocketError::UnknownCard { .. })));

        graph.connect_by_index("a", 0, "b", 0).unwrap();
        assert!(graph.connect_by_index("a", 0, "b", 0).is_err());
        assert!(graph.is_socket_connected("b", "b-input-0"));
        assert_eq!(graph.connections_for_socket("a", "a-output-0").len(), 1);
    }

    #[test]
    fn test_shrinking_inputs_drops_their_edges() {
        let mut graph = two_card_graph();
        graph.connect_by_index("a", 0, "b", 0).unwrap();
        graph.connect_by_index("a", 1, "b", 1).unwrap();

        let old = graph.card("b").unwrap().sockets.inputs.clone();
        let diff = update_socket_array(&old, 1, SocketType::Input).unwrap();
        let event = SocketUpdateEvent::from_diff("b", old, diff, SocketType::Input).unwrap();
        let applied = graph.apply_socket_update(&event).unwrap();

        assert_eq!(applied.removed_connections.len(), 1);
        assert_eq!(applied.removed_connections[0].to_socket, "b-input-1");
        assert_eq!(graph.connections().len(), 1);
        assert_eq!(graph.card("b").unwrap().sockets.inputs.len(), 1);
    }

    #[test]
    fn test_renamed_socket_redirects_edges() {
        let mut graph = two_card_graph();
        graph.connect_by_index("a", 0, "b", 0).unwrap();

        let old = graph.card("b").unwrap().sockets.inputs.clone();
        let mut renamed = old.clone();
        renamed[0].id = "b-input-0-renamed".into();
        let mut reindex = ReindexMap::new();
        reindex.insert(Some("b-input-0".into()), "b-input-0-renamed".into());
        reindex.keep("b-input-1".into());
        let event = create_socket_update_event(SocketUpdateParams {
            card_id: "b".into(),
            old_sockets: old,
            new_sockets: renamed,
            reindex_map: reindex,
            deleted_socket_ids: vec![],
            socket_type: SocketType::Input,
        })
        .unwrap();

        let applied = graph.apply_socket_update(&event).unwrap();
        assert_eq!(applied.redirected_connections, 1);
        assert_eq!(graph.connections()[0].to_socket, "b-input-0-renamed");
    }

    #[test]
    fn test_swapped_ids_redirect_once() {
        let mut graph = two_card_graph();
        graph.connect_by_index("a", 0, "b", 0).unwrap();

        let old = graph.card("b").unwrap().sockets.inputs.clone();
        let mut swapped = old.clone();
        swapped[0].id = "b-input-1".into();
        swapped[1].id = "b-input-0".into();
        let mut reindex = ReindexMap::new();
        reindex.insert(Some("b-input-0".into()), "b-input-1".into());
        reindex.insert(Some("b-input-1".into()), "b-input-0".into());
        let event = create_socket_update_event(SocketUpdateParams {
            card_id: "b".into(),
            old_sockets: old,
            new_sockets: swapped,
            reindex_map: reindex,
            deleted_socket_ids: vec![],
            socket_type: SocketType::Input,
        })
        .unwrap();

        let applied = graph.apply_socket_update(&event).unwrap();
        assert_eq!(applied.redirected_connections, 1);
        assert_eq!(graph.connections()[0].to_socket, "b-input-1");
        assert_eq!(graph.connections()[0].from_socket, "a-output-0");
    }

    #[test]
    fn test_stale_event_is_rejected() {
        let mut graph = two_card_graph();
        let old = graph.card("b").unwrap().sockets.inputs.clone();
        let diff = update_socket_array(&old, 1, SocketType::Input).unwrap();
        let event = SocketUpdateEvent::from_diff("b", old, diff, SocketType::Input).unwrap();
        graph.apply_socket_update(&event).unwrap();

        let err = graph.apply_socket_update(&event).unwrap_err();
        assert!(matches!(err, SocketError::StaleEvent { .. }));
    }

    #[test]
    fn test_graph_serializes() {
        let mut graph = two_card_graph();
        graph.connect_by_index("a", 0, "b", 0).unwrap();
        let json = serde_json::to_string(&graph).unwrap();
        let restored: CardGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.connections(), graph.connections());
    }
}
