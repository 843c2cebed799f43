//! Socket update events
//!
//! A [`SocketUpdateEvent`] is the single notification the edge store receives
//! for one socket array transition. It is checked on construction so a broken
//! diff never reaches the graph.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::card::CardId;
use super::differ::SocketDiff;
use super::reindex::ReindexMap;
use super::socket::{Socket, SocketId, SocketType};
use crate::error::{SocketError, SocketResult};

/// Inputs for [`create_socket_update_event`]
#[derive(Debug, Clone)]
pub struct SocketUpdateParams {
    pub card_id: CardId,
    pub old_sockets: Vec<Socket>,
    pub new_sockets: Vec<Socket>,
    pub reindex_map: ReindexMap,
    pub deleted_socket_ids: Vec<SocketId>,
    pub socket_type: SocketType,
}

/// Validated description of one socket array transition on a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocketUpdateEvent {
    card_id: CardId,
    old_sockets: Vec<Socket>,
    new_sockets: Vec<Socket>,
    reindex_map: ReindexMap,
    deleted_socket_ids: Vec<SocketId>,
    #[serde(rename = "type")]
    socket_type: SocketType,
}

impl SocketUpdateEvent {
    /// Builds the event for a diff computed against `old_sockets`
    pub fn from_diff(
        card_id: impl Into<CardId>,
        old_sockets: Vec<Socket>,
        diff: SocketDiff,
        socket_type: SocketType,
    ) -> SocketResult<Self> {
        create_socket_update_event(SocketUpdateParams {
            card_id: card_id.into(),
            old_sockets,
            new_sockets: diff.new_sockets,
            reindex_map: diff.reindex_map,
            deleted_socket_ids: diff.deleted_socket_ids,
            socket_type,
        })
    }

    pub fn card_id(&self) -> &str {
        &self.card_id
    }

    pub fn old_sockets(&self) -> &[Socket] {
        &self.old_sockets
    }

    pub fn new_sockets(&self) -> &[Socket] {
        &self.new_sockets
    }

    pub fn reindex_map(&self) -> &ReindexMap {
        &self.reindex_map
    }

    pub fn deleted_socket_ids(&self) -> &[SocketId] {
        &self.deleted_socket_ids
    }

    pub fn socket_type(&self) -> SocketType {
        self.socket_type
    }

    /// Whether a deleted or renamed socket could leave a dangling edge
    pub fn touches_edges(&self) -> bool {
        !self.deleted_socket_ids.is_empty() || self.reindex_map.renamed().next().is_some()
    }

    /// Re-checks the invariants, e.g. after deserializing an event from a host
    pub fn validate(&self) -> SocketResult<()> {
        validate_parts(
            &self.old_sockets,
            &self.new_sockets,
            &self.reindex_map,
            &self.deleted_socket_ids,
            self.socket_type,
        )
    }
}

/// Assembles a socket update event, rejecting any identity invariant violation
pub fn create_socket_update_event(params: SocketUpdateParams) -> SocketResult<SocketUpdateEvent> {
    validate_parts(
        &params.old_sockets,
        &params.new_sockets,
        &params.reindex_map,
        &params.deleted_socket_ids,
        params.socket_type,
    )?;

    Ok(SocketUpdateEvent {
        card_id: params.card_id,
        old_sockets: params.old_sockets,
        new_sockets: params.new_sockets,
        reindex_map: params.reindex_map,
        deleted_socket_ids: params.deleted_socket_ids,
        socket_type: params.socket_type,
    })
}

fn validate_parts(
    old_sockets: &[Socket],
    new_sockets: &[Socket],
    reindex_map: &ReindexMap,
    deleted_socket_ids: &[SocketId],
    socket_type: SocketType,
) -> SocketResult<()> {
    let old_ids: HashSet<&str> = old_sockets.iter().map(|s| s.id.as_str()).collect();

    let mut new_ids = HashSet::with_capacity(new_sockets.len());
    for socket in new_sockets {
        if socket.socket_type != socket_type {
            return Err(SocketError::validation(format!(
                "new socket {} is a {} socket in a {} update",
                socket.id, socket.socket_type, socket_type
            )));
        }
        if !new_ids.insert(socket.id.as_str()) {
            return Err(SocketError::validation(format!(
                "socket id {} appears twice in new sockets",
                socket.id
            )));
        }
    }

    let mut targets = HashSet::with_capacity(reindex_map.len());
    let mut sources = HashSet::with_capacity(reindex_map.len());
    for entry in reindex_map {
        if let Some(from) = &entry.from {
            if !old_ids.contains(from.as_str()) {
                return Err(SocketError::validation(format!(
                    "reindex source {from} is not among the old sockets"
                )));
            }
            if !sources.insert(from.as_str()) {
                return Err(SocketError::validation(format!("reindex source {from} is mapped twice")));
            }
        }
        if !new_ids.contains(entry.to.as_str()) {
            return Err(SocketError::validation(format!(
                "reindex target {} is not among the new sockets",
                entry.to
            )));
        }
        if !targets.insert(entry.to.as_str()) {
            return Err(SocketError::validation(format!(
                "reindex target {} is the target of more than one mapping",
                entry.to
            )));
        }
    }

    let mut deleted = HashSet::with_capacity(deleted_socket_ids.len());
    for id in deleted_socket_ids {
        if !deleted.insert(id.as_str()) {
            return Err(SocketError::validation(format!("deleted socket {id} is listed twice")));
        }
        if new_ids.contains(id.as_str()) {
            return Err(SocketError::validation(format!(
                "deleted socket {id} reappears in new sockets"
            )));
        }
        if !old_ids.contains(id.as_str()) {
            return Err(SocketError::validation(format!(
                "deleted socket {id} was never among the old sockets"
            )));
        }
        if sources.contains(id.as_str()) {
            return Err(SocketError::validation(format!(
                "deleted socket {id} is also a reindex source"
            )));
        }
    }

    // Every old socket either carries over through the reindex map or is deleted
    for socket in old_sockets {
        if !sources.contains(socket.id.as_str()) && !deleted.contains(socket.id.as_str()) {
            return Err(SocketError::validation(format!(
                "old socket {} is neither reindexed nor deleted",
                socket.id
            )));
        }
    }

    Ok(())
}
