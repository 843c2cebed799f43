//! Card events forwarded to the owning canvas
//!
//! Cards never call into the canvas directly. They emit [`CardEvent`]s into an
//! injected [`CardEventSink`], and the host decides how to deliver them.

use std::sync::mpsc::Sender;

use log::warn;
use serde::{Deserialize, Serialize};

use super::card::{Card, CardId};
use super::events::SocketUpdateEvent;
use super::socket::{SocketId, SocketType};

/// Payload shared by the three connection drag events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDrag {
    pub card_id: CardId,
    pub socket_id: SocketId,
    pub socket_type: SocketType,
    /// Canvas-space pointer position, passed through untouched
    pub x: f32,
    pub y: f32,
}

/// Everything a card can tell its canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum CardEvent {
    #[serde(rename_all = "camelCase")]
    UpdatePosition { card_id: CardId, x: f32, y: f32 },
    UpdateCard(Card),
    CloseCard(CardId),
    CloneCard(CardId),
    #[serde(rename_all = "camelCase")]
    SelectCard { card_id: CardId, additive: bool },
    ConnectionDragStart(ConnectionDrag),
    ConnectionDrag(ConnectionDrag),
    ConnectionDragEnd(ConnectionDrag),
    SocketsUpdated(SocketUpdateEvent),
}

impl CardEvent {
    /// The card this event concerns
    pub fn card_id(&self) -> &str {
        match self {
            CardEvent::UpdatePosition { card_id, .. } | CardEvent::SelectCard { card_id, .. } => card_id,
            CardEvent::UpdateCard(card) => &card.uuid,
            CardEvent::CloseCard(card_id) | CardEvent::CloneCard(card_id) => card_id,
            CardEvent::ConnectionDragStart(drag)
            | CardEvent::ConnectionDrag(drag)
            | CardEvent::ConnectionDragEnd(drag) => &drag.card_id,
            CardEvent::SocketsUpdated(event) => event.card_id(),
        }
    }

    /// Event name as a canvas would listen for it
    pub fn name(&self) -> &'static str {
        match self {
            CardEvent::UpdatePosition { .. } => "update-position",
            CardEvent::UpdateCard(_) => "update-card",
            CardEvent::CloseCard(_) => "close-card",
            CardEvent::CloneCard(_) => "clone-card",
            CardEvent::SelectCard { .. } => "select-card",
            CardEvent::ConnectionDragStart(_) => "connection-drag-start",
            CardEvent::ConnectionDrag(_) => "connection-drag",
            CardEvent::ConnectionDragEnd(_) => "connection-drag-end",
            CardEvent::SocketsUpdated(_) => "sockets-updated",
        }
    }
}

/// Receiver of card events
pub trait CardEventSink {
    fn emit(&mut self, event: CardEvent);
}

/// Collects events in order, handy for hosts that drain once per frame
impl CardEventSink for Vec<CardEvent> {
    fn emit(&mut self, event: CardEvent) {
        self.push(event);
    }
}

/// Forwards events to another thread. A closed channel drops the event.
impl CardEventSink for Sender<CardEvent> {
    fn emit(&mut self, event: CardEvent) {
        let name = event.name();
        if self.send(event).is_err() {
            warn!("Card event receiver is gone, dropping {} event", name);
        }
    }
}

/// Sink that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl CardEventSink for NullSink {
    fn emit(&mut self, _event: CardEvent) {}
}
