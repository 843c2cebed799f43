//! Mapping from old socket identities to new ones
//!
//! A created socket has no previous identity, so its entry has `from == None`.
//! Several created sockets means several `None` sources, which is why this is an
//! ordered list of pairs rather than a map keyed by the old id.

use serde::{Deserialize, Serialize};

use super::socket::SocketId;

/// One `old id (or nothing) -> new id` transition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(Option<SocketId>, SocketId)", into = "(Option<SocketId>, SocketId)")]
pub struct ReindexEntry {
    pub from: Option<SocketId>,
    pub to: SocketId,
}

impl ReindexEntry {
    /// A surviving socket that kept its id
    pub fn is_identity(&self) -> bool {
        self.from.as_deref() == Some(self.to.as_str())
    }

    /// A socket that did not exist before
    pub fn is_creation(&self) -> bool {
        self.from.is_none()
    }
}

impl From<(Option<SocketId>, SocketId)> for ReindexEntry {
    fn from((from, to): (Option<SocketId>, SocketId)) -> Self {
        Self { from, to }
    }
}

impl From<ReindexEntry> for (Option<SocketId>, SocketId) {
    fn from(entry: ReindexEntry) -> Self {
        (entry.from, entry.to)
    }
}

/// Ordered `old -> new` socket identity transitions.
///
/// Serialized as `[[from, to], ...]` with `null` for created sockets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReindexMap {
    entries: Vec<ReindexEntry>,
}

impl ReindexMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: Option<SocketId>, to: SocketId) {
        self.entries.push(ReindexEntry { from, to });
    }

    /// Records a reused socket whose id carried forward unchanged
    pub fn keep(&mut self, id: SocketId) {
        self.insert(Some(id.clone()), id);
    }

    /// Records a freshly created socket
    pub fn create(&mut self, to: SocketId) {
        self.insert(None, to);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReindexEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The new id an old socket maps to, if it survived
    pub fn target_of(&self, from: &str) -> Option<&SocketId> {
        self.entries
            .iter()
            .find(|entry| entry.from.as_deref() == Some(from))
            .map(|entry| &entry.to)
    }

    /// Ids of sockets that did not exist before
    pub fn created_ids(&self) -> impl Iterator<Item = &SocketId> {
        self.entries
            .iter()
            .filter(|entry| entry.is_creation())
            .map(|entry| &entry.to)
    }

    /// Entries whose identity actually changed (old id mapped to a different id)
    pub fn renamed(&self) -> impl Iterator<Item = (&SocketId, &SocketId)> {
        self.entries.iter().filter_map(|entry| match &entry.from {
            Some(from) if *from != entry.to => Some((from, &entry.to)),
            _ => None,
        })
    }
}

impl FromIterator<(Option<SocketId>, SocketId)> for ReindexMap {
    fn from_iter<I: IntoIterator<Item = (Option<SocketId>, SocketId)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(ReindexEntry::from).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ReindexMap {
    type Item = &'a ReindexEntry;
    type IntoIter = std::slice::Iter<'a, ReindexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
