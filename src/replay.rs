//! Replays a JSON script of card operations against a [`CardGraph`]
//!
//! Every step goes through the same paths a host canvas would use: socket
//! resizes and value changes go through a [`CardTransaction`](crate::cards::CardTransaction),
//! view cards are built with [`ViewCard`], and all emitted events are collected
//! in order.

use std::collections::HashMap;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cards::{
    Card, CardEvent, CardEventSink, CardGraph, CardId, CardTransaction, Connection, SocketType, ViewCard,
};
use crate::config::SocketSettings;
use crate::error::{SocketError, SocketResult};

/// An ordered list of card operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayScript {
    #[serde(default)]
    pub steps: Vec<ReplayStep>,
}

impl ReplayScript {
    pub fn from_json(text: &str) -> SocketResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> SocketResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum ReplayStep {
    /// Adds a plain card and sizes its socket arrays
    #[serde(rename_all = "camelCase")]
    AddCard {
        card: Card,
        #[serde(default)]
        inputs: usize,
        #[serde(default)]
        outputs: usize,
    },
    AddViewCard { card: Card },
    #[serde(rename_all = "camelCase")]
    Resize {
        card_id: CardId,
        #[serde(rename = "type")]
        socket_type: SocketType,
        count: usize,
    },
    #[serde(rename_all = "camelCase")]
    Connect {
        from_card: CardId,
        from_index: usize,
        to_card: CardId,
        to_index: usize,
    },
    #[serde(rename_all = "camelCase")]
    Disconnect {
        from_card: CardId,
        from_index: usize,
        to_card: CardId,
        to_index: usize,
    },
    #[serde(rename_all = "camelCase")]
    SetValue {
        card_id: CardId,
        #[serde(rename = "type", default)]
        socket_type: SocketType,
        index: usize,
        value: Value,
    },
    #[serde(rename_all = "camelCase")]
    RemoveCard { card_id: CardId },
}

impl ReplayStep {
    pub fn name(&self) -> &'static str {
        match self {
            ReplayStep::AddCard { .. } => "addCard",
            ReplayStep::AddViewCard { .. } => "addViewCard",
            ReplayStep::Resize { .. } => "resize",
            ReplayStep::Connect { .. } => "connect",
            ReplayStep::Disconnect { .. } => "disconnect",
            ReplayStep::SetValue { .. } => "setValue",
            ReplayStep::RemoveCard { .. } => "removeCard",
        }
    }
}

/// Owns a graph plus the view cards living on it
#[derive(Debug)]
pub struct Replayer {
    graph: CardGraph,
    views: HashMap<CardId, ViewCard>,
    settings: SocketSettings,
}

impl Default for Replayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Replayer {
    pub fn new() -> Self {
        Self::with_settings(SocketSettings::global().clone())
    }

    pub fn with_settings(settings: SocketSettings) -> Self {
        Self {
            graph: CardGraph::new(),
            views: HashMap::new(),
            settings,
        }
    }

    pub fn graph(&self) -> &CardGraph {
        &self.graph
    }

    pub fn view(&self, card_id: &str) -> Option<&ViewCard> {
        self.views.get(card_id)
    }

    /// Runs every step in order, stopping at the first failure
    pub fn run(&mut self, script: &ReplayScript) -> SocketResult<Vec<CardEvent>> {
        let mut events: Vec<CardEvent> = Vec::new();
        for (index, step) in script.steps.iter().enumerate() {
            debug!("Replay step {} ({})", index, step.name());
            self.apply(step, &mut events)?;
        }
        info!("Replayed {} steps, {} events", script.steps.len(), events.len());
        Ok(events)
    }

    pub fn apply(&mut self, step: &ReplayStep, sink: &mut dyn CardEventSink) -> SocketResult<()> {
        match step {
            ReplayStep::AddCard { card, inputs, outputs } => {
                let mut card = card.clone();
                card.sockets = Default::default();
                let card_id = self.graph.add_card(card);
                self.commit_update(&card_id, sink, |tx| {
                    for (socket_type, count) in [(SocketType::Input, *inputs), (SocketType::Output, *outputs)] {
                        if count > 0 {
                            tx.resize(socket_type, count)?;
                        }
                    }
                    Ok(())
                })
            }
            ReplayStep::AddViewCard { card } => {
                let view = ViewCard::new(card, sink)?;
                let card_id = self.graph.add_card(view.card().clone());
                self.views.insert(card_id, view);
                Ok(())
            }
            ReplayStep::Resize {
                card_id,
                socket_type,
                count,
            } => {
                let fixed = match socket_type {
                    SocketType::Input => 1,
                    SocketType::Output => 0,
                };
                if self.views.contains_key(card_id) && *count != fixed {
                    return Err(SocketError::invalid_argument(format!(
                        "view card {card_id} has exactly {fixed} {socket_type} sockets, cannot resize to {count}"
                    )));
                }
                self.commit_update(card_id, sink, |tx| tx.resize(*socket_type, *count).map(|_| ()))
            }
            ReplayStep::Connect {
                from_card,
                from_index,
                to_card,
                to_index,
            } => {
                let connection = self.graph.connect_by_index(from_card, *from_index, to_card, *to_index)?;
                if let Some(view) = self.views.get_mut(to_card) {
                    view.set_socket_connected(&connection.to_socket, true);
                }
                self.propagate(from_card, sink)
            }
            ReplayStep::Disconnect {
                from_card,
                from_index,
                to_card,
                to_index,
            } => {
                let from_socket = self.graph.socket_id_at(from_card, SocketType::Output, *from_index)?;
                let to_socket = self.graph.socket_id_at(to_card, SocketType::Input, *to_index)?;
                let connection = Connection::new(from_card.as_str(), from_socket, to_card.as_str(), to_socket);
                self.graph
                    .remove_connection(&connection)
                    .ok_or_else(|| SocketError::invalid_connection("no such connection"))?;
                self.sync_connection_flags();
                Ok(())
            }
            ReplayStep::SetValue {
                card_id,
                socket_type,
                index,
                value,
            } => {
                let value = value.clone();
                self.commit_update(card_id, sink, |tx| {
                    tx.set_socket_value(*socket_type, *index, value).map(|_| ())
                })?;
                if *socket_type == SocketType::Output {
                    self.propagate(card_id, sink)?;
                }
                Ok(())
            }
            ReplayStep::RemoveCard { card_id } => {
                self.graph
                    .remove_card(card_id)
                    .ok_or_else(|| SocketError::unknown_card(card_id.as_str()))?;
                if let Some(mut view) = self.views.remove(card_id) {
                    view.close(sink);
                    view.teardown();
                }
                self.sync_connection_flags();
                Ok(())
            }
        }
    }

    fn commit_update<F>(&mut self, card_id: &str, sink: &mut dyn CardEventSink, stage: F) -> SocketResult<()>
    where
        F: FnOnce(&mut CardTransaction<'_>) -> SocketResult<()>,
    {
        let mut tx = self.graph.begin_update(card_id)?.with_settings(self.settings.clone());
        stage(&mut tx)?;
        let mut edges_changed = false;
        for event in tx.commit()? {
            edges_changed |= event.touches_edges();
            sink.emit(CardEvent::SocketsUpdated(event));
        }
        self.refresh_view(card_id);
        if edges_changed {
            self.sync_connection_flags();
        }
        Ok(())
    }

    fn refresh_view(&mut self, card_id: &str) {
        if let (Some(view), Some(card)) = (self.views.get_mut(card_id), self.graph.card(card_id)) {
            view.sync_from(card, None);
        }
    }

    /// Pushes output values of `card_id` into every connected input
    fn propagate(&mut self, card_id: &str, sink: &mut dyn CardEventSink) -> SocketResult<()> {
        let Some(source) = self.graph.card(card_id) else {
            return Ok(());
        };

        let targets: Vec<(CardId, usize, Value)> = self
            .graph
            .connections()
            .iter()
            .filter(|conn| conn.from_card == card_id)
            .filter_map(|conn| {
                let value = source.sockets.find(&conn.from_socket)?.value.clone()?;
                let target = self.graph.card(&conn.to_card)?;
                let (index, current) = target
                    .sockets
                    .inputs
                    .iter()
                    .enumerate()
                    .find(|(_, socket)| socket.id == conn.to_socket)?;
                (current.value.as_ref() != Some(&value)).then(|| (conn.to_card.clone(), index, value))
            })
            .collect();

        for (target, index, value) in targets {
            self.commit_update(&target, sink, |tx| {
                tx.set_socket_value(SocketType::Input, index, value).map(|_| ())
            })?;
        }
        Ok(())
    }

    /// Clears view card connection flags for inputs that lost their edges
    fn sync_connection_flags(&mut self) {
        for (card_id, view) in self.views.iter_mut() {
            let Some(card) = self.graph.card(card_id) else {
                continue;
            };
            for socket in &card.sockets.inputs {
                if !self.graph.is_socket_connected(card_id, &socket.id) {
                    view.set_socket_connected(&socket.id, false);
                }
            }
        }
    }
}
