//! View card: a single-input card that displays whatever flows into it
//!
//! The card owns its state outright. The host calls [`ViewCard::sync_from`] when
//! the canvas hands it new card data and forwards user interactions through the
//! event methods; nothing here watches anything.

use std::collections::HashSet;

use log::{debug, info, warn};
use serde_json::Value;

use super::card::{Card, CardSockets};
use super::content::{ContentKind, ContentRenderers, JsonRenderer, ContentRenderer, RenderedContent};
use super::events::{create_socket_update_event, SocketUpdateParams};
use super::hooks::{CardEvent, CardEventSink, ConnectionDrag};
use super::reindex::ReindexMap;
use super::socket::{create_socket, Socket, SocketId, SocketInit, SocketType};
use crate::config::SocketSettings;
use crate::constants;
use crate::error::{SocketError, SocketResult};

#[derive(Debug)]
pub struct ViewCard {
    card: Card,
    connected: HashSet<SocketId>,
    renderers: ContentRenderers,
}

impl ViewCard {
    /// Builds the card from incoming data with the default renderers and
    /// announces its input socket through `sink`
    pub fn new(card_data: &Card, sink: &mut dyn CardEventSink) -> SocketResult<Self> {
        let renderers = ContentRenderers::default().with_markdown_enabled(SocketSettings::global().markdown_enabled);
        Self::with_renderers(card_data, renderers, sink)
    }

    /// Builds the card with a single input socket, reusing the incoming socket's
    /// id and value, and emits the initial `sockets-updated` event.
    pub fn with_renderers(
        card_data: &Card,
        renderers: ContentRenderers,
        sink: &mut dyn CardEventSink,
    ) -> SocketResult<Self> {
        if card_data.uuid.trim().is_empty() {
            return Err(SocketError::invalid_argument("view card data has no uuid"));
        }

        let incoming = card_data.sockets.inputs.first();
        let socket = create_socket(SocketInit {
            socket_type: SocketType::Input,
            index: 0,
            existing_id: incoming.map(|s| s.id.clone()),
            value: incoming.and_then(|s| s.value.clone()),
            name: None,
        })?;

        let card = Card {
            uuid: card_data.uuid.clone(),
            name: non_blank_or(&card_data.name, constants::view_card::DEFAULT_NAME),
            description: non_blank_or(&card_data.description, constants::view_card::DEFAULT_DESCRIPTION),
            display: card_data.display,
            x: card_data.x,
            y: card_data.y,
            sockets: CardSockets {
                inputs: vec![socket.clone()],
                outputs: Vec::new(),
            },
        };

        let mut reindex_map = ReindexMap::new();
        reindex_map.create(socket.id.clone());
        let registration = create_socket_update_event(SocketUpdateParams {
            card_id: card.uuid.clone(),
            old_sockets: Vec::new(),
            new_sockets: vec![socket],
            reindex_map,
            deleted_socket_ids: Vec::new(),
            socket_type: SocketType::Input,
        })?;
        sink.emit(CardEvent::SocketsUpdated(registration));

        let connected = incoming.map(|s| s.id.clone()).into_iter().collect();

        info!("View card {} ready with input socket {}", card.uuid, card.sockets.inputs[0].id);
        Ok(Self {
            card,
            connected,
            renderers,
        })
    }

    pub fn card(&self) -> &Card {
        &self.card
    }

    pub fn into_card(self) -> Card {
        self.card
    }

    pub fn input_socket(&self) -> Option<&Socket> {
        self.card.sockets.inputs.first()
    }

    /// Pulls position and input value from new card data.
    /// Returns whether anything changed.
    pub fn sync_from(&mut self, new_data: &Card, old_data: Option<&Card>) -> bool {
        let mut changed = false;

        if old_data.map_or(true, |old| old.x != new_data.x) && self.card.x != new_data.x {
            self.card.x = new_data.x;
            changed = true;
        }
        if old_data.map_or(true, |old| old.y != new_data.y) && self.card.y != new_data.y {
            self.card.y = new_data.y;
            changed = true;
        }

        let new_value = new_data.sockets.inputs.first().and_then(|s| s.value.clone());
        if let (Some(current), Some(value)) = (self.card.sockets.inputs.first_mut(), new_value) {
            if current.set_value(Some(value)) {
                debug!("View card {} input value updated", self.card.uuid);
                changed = true;
            }
        }

        changed
    }

    /// Replaces the local card data wholesale and tells the canvas
    pub fn handle_card_update(&mut self, data: Card, sink: &mut dyn CardEventSink) {
        self.card = data;
        sink.emit(CardEvent::UpdateCard(self.card.clone()));
    }

    /// Asks the canvas to move the card. The canvas feeds the new position back
    /// through [`ViewCard::sync_from`].
    pub fn move_to(&self, x: f32, y: f32, sink: &mut dyn CardEventSink) {
        sink.emit(CardEvent::UpdatePosition {
            card_id: self.card.uuid.clone(),
            x,
            y,
        });
    }

    pub fn close(&self, sink: &mut dyn CardEventSink) {
        sink.emit(CardEvent::CloseCard(self.card.uuid.clone()));
    }

    pub fn clone_card(&self, sink: &mut dyn CardEventSink) {
        sink.emit(CardEvent::CloneCard(self.card.uuid.clone()));
    }

    pub fn select(&self, additive: bool, sink: &mut dyn CardEventSink) {
        sink.emit(CardEvent::SelectCard {
            card_id: self.card.uuid.clone(),
            additive,
        });
    }

    pub fn begin_connection_drag(&self, x: f32, y: f32, sink: &mut dyn CardEventSink) -> SocketResult<()> {
        let drag = self.drag_payload(x, y)?;
        sink.emit(CardEvent::ConnectionDragStart(drag));
        Ok(())
    }

    pub fn connection_drag(&self, x: f32, y: f32, sink: &mut dyn CardEventSink) -> SocketResult<()> {
        let drag = self.drag_payload(x, y)?;
        sink.emit(CardEvent::ConnectionDrag(drag));
        Ok(())
    }

    pub fn end_connection_drag(&self, x: f32, y: f32, sink: &mut dyn CardEventSink) -> SocketResult<()> {
        let drag = self.drag_payload(x, y)?;
        sink.emit(CardEvent::ConnectionDragEnd(drag));
        Ok(())
    }

    fn drag_payload(&self, x: f32, y: f32) -> SocketResult<ConnectionDrag> {
        let socket = self
            .input_socket()
            .ok_or_else(|| SocketError::unknown_socket(self.card.uuid.clone(), "input 0"))?;
        Ok(ConnectionDrag {
            card_id: self.card.uuid.clone(),
            socket_id: socket.id.clone(),
            socket_type: socket.socket_type,
            x,
            y,
        })
    }

    pub fn is_socket_connected(&self, socket_id: &str) -> bool {
        self.connected.contains(socket_id)
    }

    pub fn set_socket_connected(&mut self, socket_id: &str, connected: bool) {
        if connected {
            self.connected.insert(socket_id.to_string());
        } else {
            self.connected.remove(socket_id);
        }
    }

    /// View cards never flag socket errors
    pub fn has_socket_error(&self, _socket: &Socket) -> bool {
        false
    }

    /// Drops connection tracking when the card leaves the canvas
    pub fn teardown(&mut self) {
        debug!("Tearing down view card {}", self.card.uuid);
        self.connected.clear();
    }

    fn input_value(&self) -> Option<&Value> {
        self.input_socket().and_then(|s| s.value.as_ref())
    }

    pub fn content_kind(&self) -> Option<ContentKind> {
        self.renderers.classify(self.input_value())
    }

    pub fn is_json_content(&self) -> bool {
        self.content_kind() == Some(ContentKind::Json)
    }

    /// Pretty JSON for the input value, or an empty string if it is not JSON
    pub fn formatted_json(&self) -> String {
        match self.input_value() {
            Some(value) if self.is_json_content() => JsonRenderer.render(value).unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// Renders the input value with the injected renderers. Failures become an
    /// empty body with the error message attached.
    pub fn content(&self) -> RenderedContent {
        match self.renderers.render(self.input_value()) {
            Ok(content) => content,
            Err(err) => {
                warn!("View card {} failed to render content: {}", self.card.uuid, err);
                RenderedContent {
                    kind: self.content_kind(),
                    body: String::new(),
                    error: Some(err.to_string()),
                }
            }
        }
    }
}

fn non_blank_or(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::card::DisplayMode;
    use crate::cards::hooks::NullSink;
    use serde_json::json;

    fn incoming(value: Option<Value>) -> Card {
        let socket = create_socket(SocketInit {
            socket_type: SocketType::Input,
            index: 0,
            existing_id: Some("in-1".into()),
            value,
            name: None,
        })
        .unwrap();
        Card::new("view-1", "")
            .with_position(10.0, 20.0)
            .with_sockets(SocketType::Input, vec![socket])
    }

    #[test]
    fn test_new_emits_registration_event() {
        let mut events: Vec<CardEvent> = Vec::new();
        let view = ViewCard::new(&Card::new("view-1", "My View"), &mut events).unwrap();

        assert_eq!(view.card().name, "My View");
        assert_eq!(view.card().description, "View Node");
        assert_eq!(view.card().display, DisplayMode::Default);
        assert_eq!(view.card().sockets.inputs.len(), 1);
        assert!(view.card().sockets.outputs.is_empty());

        assert_eq!(events.len(), 1);
        let CardEvent::SocketsUpdated(event) = &events[0] else {
            panic!("expected sockets-updated, got {:?}", events[0]);
        };
        let socket_id = &view.input_socket().unwrap().id;
        assert!(event.old_sockets().is_empty());
        assert_eq!(&event.new_sockets()[0].id, socket_id);
        let entry = event.reindex_map().iter().next().unwrap();
        assert_eq!(entry.from, None);
        assert_eq!(&entry.to, socket_id);
        assert!(!view.is_socket_connected(socket_id));
    }

    #[test]
    fn test_new_reuses_incoming_socket() {
        let mut events: Vec<CardEvent> = Vec::new();
        let view = ViewCard::new(&incoming(Some(json!("# Hello"))), &mut events).unwrap();
        let socket = view.input_socket().unwrap();
        assert_eq!(socket.id, "in-1");
        assert_eq!(socket.value, Some(json!("# Hello")));
        assert_eq!(view.card().name, "View");
        assert_eq!((view.card().x, view.card().y), (10.0, 20.0));
        assert!(view.is_socket_connected("in-1"));
    }

    #[test]
    fn test_blank_uuid_is_rejected() {
        let mut events: Vec<CardEvent> = Vec::new();
        assert!(ViewCard::new(&Card::new(" ", "x"), &mut events).is_err());
        assert!(events.is_empty());
    }

    #[test]
    fn test_sync_from_updates_position_and_value() {
        let mut events: Vec<CardEvent> = Vec::new();
        let original = incoming(None);
        let mut view = ViewCard::new(&original, &mut events).unwrap();

        let mut moved = incoming(Some(json!({"a": 1})));
        moved.x = 50.0;
        assert!(view.sync_from(&moved, Some(&original)));
        assert_eq!(view.card().x, 50.0);
        assert_eq!(view.card().y, 20.0);
        assert_eq!(view.input_socket().unwrap().value, Some(json!({"a": 1})));

        assert!(!view.sync_from(&moved, Some(&moved)));

        let cleared = incoming(None);
        view.sync_from(&cleared, Some(&moved));
        assert_eq!(view.input_socket().unwrap().value, Some(json!({"a": 1})));
    }

    #[test]
    fn test_ui_events_carry_card_id() {
        let mut events: Vec<CardEvent> = Vec::new();
        let view = ViewCard::new(&incoming(None), &mut events).unwrap();
        events.clear();

        view.move_to(1.0, 2.0, &mut events);
        view.close(&mut events);
        view.clone_card(&mut events);
        view.select(false, &mut events);
        view.begin_connection_drag(3.0, 4.0, &mut events).unwrap();
        view.connection_drag(5.0, 6.0, &mut events).unwrap();
        view.end_connection_drag(7.0, 8.0, &mut events).unwrap();

        let names: Vec<_> = events.iter().map(|e| e.name()).collect();
        assert_eq!(
            names,
            vec![
                "update-position",
                "close-card",
                "clone-card",
                "select-card",
                "connection-drag-start",
                "connection-drag",
                "connection-drag-end",
            ]
        );
        assert!(events.iter().all(|e| e.card_id() == "view-1"));
        if let CardEvent::ConnectionDragStart(drag) = &events[4] {
            assert_eq!(drag.socket_id, "in-1");
            assert_eq!(drag.socket_type, SocketType::Input);
        }
    }

    #[test]
    fn test_handle_card_update_emits() {
        let mut events: Vec<CardEvent> = Vec::new();
        let mut view = ViewCard::new(&incoming(None), &mut events).unwrap();
        let mut replacement = view.card().clone();
        replacement.name = "Renamed".into();
        view.handle_card_update(replacement, &mut events);
        assert_eq!(view.card().name, "Renamed");
        assert!(matches!(events.last(), Some(CardEvent::UpdateCard(card)) if card.name == "Renamed"));
    }

    #[test]
    fn test_content_rendering() {
        let mut events: Vec<CardEvent> = Vec::new();
        let view = ViewCard::new(&incoming(Some(json!("[1, 2]"))), &mut events).unwrap();
        assert!(view.is_json_content());
        assert_eq!(view.formatted_json(), "[\n  1,\n  2\n]");

        let view = ViewCard::new(&incoming(Some(json!("**bold**"))), &mut events).unwrap();
        assert!(!view.is_json_content());
        assert_eq!(view.formatted_json(), "");
        let content = view.content();
        assert_eq!(content.kind, Some(ContentKind::Markdown));
        assert_eq!(content.body, "**bold**");

        let view = ViewCard::new(&incoming(Some(json!("{broken}"))), &mut events).unwrap();
        let content = view.content();
        assert!(content.body.is_empty());
        assert!(content.error.is_some());
        assert_eq!(view.formatted_json(), "");
    }

    #[test]
    fn test_connection_tracking_and_teardown() {
        let mut view = ViewCard::new(&incoming(None), &mut NullSink).unwrap();
        view.set_socket_connected("other", true);
        assert!(view.is_socket_connected("other"));
        view.set_socket_connected("other", false);
        assert!(!view.is_socket_connected("other"));
        assert!(!view.has_socket_error(view.input_socket().unwrap()));

        view.teardown();
        assert!(!view.is_socket_connected("in-1"));
    }
}
