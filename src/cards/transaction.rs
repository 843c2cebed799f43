//! Single-writer socket updates for one card
//!
//! A [`CardTransaction`] borrows the whole [`CardGraph`] mutably, so while one
//! is open nothing else can diff or apply updates. Resizes are staged against a
//! private copy of the card's sockets and only reach the graph on `commit`.

use log::debug;
use serde_json::Value;

use super::card::{CardId, CardSockets};
use super::differ::{update_socket_array_with, DesiredSockets, SocketSpec};
use super::events::SocketUpdateEvent;
use super::graph::CardGraph;
use super::socket::{Socket, SocketType};
use crate::config::SocketSettings;
use crate::error::{SocketError, SocketResult};

pub struct CardTransaction<'g> {
    graph: &'g mut CardGraph,
    card_id: CardId,
    staged: CardSockets,
    events: Vec<SocketUpdateEvent>,
    settings: SocketSettings,
}

impl<'g> CardTransaction<'g> {
    pub(crate) fn begin(graph: &'g mut CardGraph, card_id: &str) -> SocketResult<Self> {
        let staged = graph
            .card(card_id)
            .map(|card| card.sockets.clone())
            .ok_or_else(|| SocketError::unknown_card(card_id))?;
        debug!("Begin socket update on card {}", card_id);
        Ok(Self {
            graph,
            card_id: card_id.to_string(),
            staged,
            events: Vec::new(),
            settings: SocketSettings::global().clone(),
        })
    }

    /// Use these settings instead of the process-wide ones
    pub fn with_settings(mut self, settings: SocketSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn card_id(&self) -> &str {
        &self.card_id
    }

    /// Sockets of a type as they will be after commit
    pub fn staged(&self, socket_type: SocketType) -> &[Socket] {
        self.staged.of_type(socket_type)
    }

    pub fn pending_events(&self) -> &[SocketUpdateEvent] {
        &self.events
    }

    /// Diffs the staged sockets of a type against `desired` and stages the event
    pub fn resize(
        &mut self,
        socket_type: SocketType,
        desired: impl Into<DesiredSockets>,
    ) -> SocketResult<&SocketUpdateEvent> {
        let old = self.staged.of_type(socket_type).to_vec();
        let diff = update_socket_array_with(&old, desired, socket_type, &self.settings)?;
        let event = SocketUpdateEvent::from_diff(self.card_id.clone(), old, diff, socket_type)?;
        *self.staged.of_type_mut(socket_type) = event.new_sockets().to_vec();
        self.events.push(event);
        Ok(&self.events[self.events.len() - 1])
    }

    /// Sets the value of one staged socket, keeping the array length
    pub fn set_socket_value(
        &mut self,
        socket_type: SocketType,
        index: usize,
        value: Value,
    ) -> SocketResult<&SocketUpdateEvent> {
        let len = self.staged.of_type(socket_type).len();
        if index >= len {
            return Err(SocketError::invalid_argument(format!(
                "card {} has no {} socket at index {}",
                self.card_id, socket_type, index
            )));
        }
        let mut specs = vec![SocketSpec::default(); len];
        specs[index].value = Some(value);
        self.resize(socket_type, specs)
    }

    /// Applies every staged event to the graph in order and hands them back
    /// for dispatch. Either all events apply or the graph is left untouched.
    pub fn commit(mut self) -> SocketResult<Vec<SocketUpdateEvent>> {
        let events = std::mem::take(&mut self.events);
        if events.is_empty() {
            return Ok(events);
        }

        let card_backup = self
            .graph
            .card(&self.card_id)
            .cloned()
            .ok_or_else(|| SocketError::unknown_card(self.card_id.clone()))?;
        let connections_backup = self.graph.connections().to_vec();

        for event in &events {
            if let Err(err) = self.graph.apply_socket_update(event) {
                self.graph.restore(card_backup, connections_backup);
                return Err(err);
            }
        }

        debug!("Committed {} socket updates on card {}", events.len(), self.card_id);
        Ok(events)
    }
}

impl Drop for CardTransaction<'_> {
    fn drop(&mut self) {
        if !self.events.is_empty() {
            debug!(
                "Discarded {} staged socket updates on card {}",
                self.events.len(),
                self.card_id
            );
        }
    }
}
