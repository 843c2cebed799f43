//! Socket array diffing
//!
//! Given a card's current sockets of one type and the desired shape, compute the
//! new socket array plus the identity transitions the edge store needs. Sockets
//! are matched by position: slot `i` keeps its id as long as the old socket in
//! slot `i` has the right type.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::reindex::ReindexMap;
use super::socket::{create_socket_with, Socket, SocketId, SocketInit, SocketType};
use crate::config::SocketSettings;
use crate::error::{SocketError, SocketResult};

/// Desired mutable fields for one socket slot. `None` leaves the field alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocketSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
}

impl SocketSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: None,
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }
}

/// The shape a socket array should take
#[derive(Debug, Clone, PartialEq)]
pub enum DesiredSockets {
    /// Just this many sockets; reused sockets keep their fields
    Count(usize),
    /// One spec per slot
    Specs(Vec<SocketSpec>),
}

impl DesiredSockets {
    pub fn len(&self) -> usize {
        match self {
            DesiredSockets::Count(count) => *count,
            DesiredSockets::Specs(specs) => specs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn spec(&self, index: usize) -> Option<&SocketSpec> {
        match self {
            DesiredSockets::Count(_) => None,
            DesiredSockets::Specs(specs) => specs.get(index),
        }
    }
}

impl From<usize> for DesiredSockets {
    fn from(count: usize) -> Self {
        DesiredSockets::Count(count)
    }
}

impl From<Vec<SocketSpec>> for DesiredSockets {
    fn from(specs: Vec<SocketSpec>) -> Self {
        DesiredSockets::Specs(specs)
    }
}

/// Result of diffing one socket array
#[derive(Debug, Clone, PartialEq)]
pub struct SocketDiff {
    pub new_sockets: Vec<Socket>,
    pub reindex_map: ReindexMap,
    pub deleted_socket_ids: Vec<SocketId>,
    moved: Vec<SocketId>,
    updated: Vec<SocketId>,
}

/// The effective change a diff makes, ignoring identity-mapped entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocketDelta {
    pub created: Vec<SocketId>,
    pub deleted: Vec<SocketId>,
    /// Reused sockets whose index changed
    pub moved: Vec<SocketId>,
    /// Reused sockets whose name or value changed
    pub updated: Vec<SocketId>,
}

impl SocketDelta {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.deleted.is_empty() && self.moved.is_empty() && self.updated.is_empty()
    }
}

impl SocketDiff {
    pub fn delta(&self) -> SocketDelta {
        SocketDelta {
            created: self.reindex_map.created_ids().cloned().collect(),
            deleted: self.deleted_socket_ids.clone(),
            moved: self.moved.clone(),
            updated: self.updated.clone(),
        }
    }

    pub fn new_ids(&self) -> Vec<SocketId> {
        self.new_sockets.iter().map(|s| s.id.clone()).collect()
    }
}

/// Diffs `old_sockets` against `desired` using the process-wide settings
pub fn update_socket_array(
    old_sockets: &[Socket],
    desired: impl Into<DesiredSockets>,
    socket_type: SocketType,
) -> SocketResult<SocketDiff> {
    update_socket_array_with(old_sockets, desired, socket_type, SocketSettings::global())
}

/// Diffs `old_sockets` against `desired`.
///
/// Never fails on empty input or a zero count. Running it again on its own
/// output with the same `desired` yields the same ids and an empty delta.
pub fn update_socket_array_with(
    old_sockets: &[Socket],
    desired: impl Into<DesiredSockets>,
    socket_type: SocketType,
    settings: &SocketSettings,
) -> SocketResult<SocketDiff> {
    let desired = desired.into();
    let count = desired.len();
    if count > settings.max_sockets_per_side {
        return Err(SocketError::invalid_argument(format!(
            "requested {} {} sockets, limit is {}",
            count, socket_type, settings.max_sockets_per_side
        )));
    }

    let mut new_sockets = Vec::with_capacity(count);
    let mut reindex_map = ReindexMap::new();
    let mut deleted_socket_ids = Vec::new();
    let mut moved = Vec::new();
    let mut updated = Vec::new();

    for index in 0..count {
        let spec = desired.spec(index);

        match old_sockets.get(index) {
            Some(existing) if existing.socket_type == socket_type => {
                let mut socket = existing.clone();
                if socket.index != index {
                    socket.index = index;
                    moved.push(socket.id.clone());
                }
                if let Some(spec) = spec {
                    if apply_spec(&mut socket, spec)? {
                        updated.push(socket.id.clone());
                    }
                }
                reindex_map.keep(socket.id.clone());
                new_sockets.push(socket);
            }
            other => {
                if let Some(incompatible) = other {
                    warn!(
                        "Socket {} at {} slot {} is a {} socket, replacing it",
                        incompatible.id, socket_type, index, incompatible.socket_type
                    );
                    deleted_socket_ids.push(incompatible.id.clone());
                }
                let mut init = SocketInit::new(socket_type, index);
                if let Some(spec) = spec {
                    init.name = spec.name.clone();
                    init.value = spec.value.clone();
                }
                let socket = create_socket_with(init, settings)?;
                reindex_map.create(socket.id.clone());
                new_sockets.push(socket);
            }
        }
    }

    deleted_socket_ids.extend(old_sockets.iter().skip(count).map(|s| s.id.clone()));

    debug!(
        "Diffed {} sockets: {} -> {} ({} created, {} deleted)",
        socket_type,
        old_sockets.len(),
        new_sockets.len(),
        reindex_map.created_ids().count(),
        deleted_socket_ids.len()
    );

    Ok(SocketDiff {
        new_sockets,
        reindex_map,
        deleted_socket_ids,
        moved,
        updated,
    })
}

/// Copies provided fields onto a reused socket; returns whether it changed
fn apply_spec(socket: &mut Socket, spec: &SocketSpec) -> SocketResult<bool> {
    let mut changed = false;
    if let Some(name) = &spec.name {
        if name.trim().is_empty() {
            return Err(SocketError::invalid_argument(format!(
                "{} socket {} was given a blank name",
                socket.socket_type, socket.index
            )));
        }
        if *name != socket.name {
            socket.name = name.clone();
            changed = true;
        }
    }
    if let Some(value) = &spec.value {
        changed |= socket.set_value(Some(value.clone()));
    }
    Ok(changed)
}
