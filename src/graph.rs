//! Room graph: the arena of all live groups and the set of shared lines.
//!
//! This is the single owner of everything in a room. Groups live in an
//! `id → Group` map; connection endpoints name their peer by id and are
//! resolved here at use time. Lines live in their own map so that the two
//! endpoint records of a connection can share one line without shared
//! ownership — whichever incident group is deleted first removes the line,
//! and the survivor's later cascade tolerates it already being gone.
//!
//! All mutation of a room passes through this type (directly or via
//! [`crate::engine::Engine`]) so that local state and emitted operations stay
//! in lockstep.

#[cfg(test)]
#[path = "graph_test.rs"]
mod graph_test;

use std::collections::HashMap;

use crate::model::{Endpoint, Group, GroupId, Line, LineId, Role};

/// Precondition violation raised by graph mutation.
///
/// These are programming errors, not user-recoverable conditions; the
/// interaction layer structurally prevents them in production flows.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A group cannot be connected to itself.
    #[error("cannot connect group {0:?} to itself")]
    SelfLoop(GroupId),
}

/// The complete set of groups and lines for one collaborative room.
pub struct RoomGraph {
    groups: HashMap<GroupId, Group>,
    lines: HashMap<LineId, Line>,
}

impl RoomGraph {
    /// Create an empty room.
    #[must_use]
    pub fn new() -> Self {
        Self { groups: HashMap::new(), lines: HashMap::new() }
    }

    // --- Arena access ---

    /// Insert a group. An existing group with the same id is overwritten;
    /// callers guard against that where it matters.
    pub fn insert(&mut self, group: Group) {
        self.groups.insert(group.id, group);
    }

    /// Look up a group by id.
    #[must_use]
    pub fn get(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    /// Look up a group mutably by id.
    pub fn get_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.get_mut(&id)
    }

    /// Whether a group with this id is live in the room.
    #[must_use]
    pub fn contains(&self, id: GroupId) -> bool {
        self.groups.contains_key(&id)
    }

    /// Iterate over all live groups in arbitrary order.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// Number of live groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` if the room holds no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Look up a shared line by id.
    #[must_use]
    pub fn line(&self, id: LineId) -> Option<&Line> {
        self.lines.get(&id)
    }

    /// Number of live lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    // --- Connection graph ---

    /// Connect two distinct groups with a shared line anchored at their
    /// current centers. Pushes a `P1` endpoint onto `from` and a `P2`
    /// endpoint onto `to`, both naming the other as peer.
    ///
    /// Returns `Ok(None)` when either id does not resolve — expected when a
    /// remote connect races a delete, and absorbed by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::SelfLoop`] when `from == to`.
    pub fn connect(&mut self, from: GroupId, to: GroupId) -> Result<Option<LineId>, GraphError> {
        if from == to {
            return Err(GraphError::SelfLoop(from));
        }
        let (Some(a), Some(b)) = (self.groups.get(&from), self.groups.get(&to)) else {
            return Ok(None);
        };

        let line = LineId::new();
        self.lines.insert(line, Line { start: a.center(), end: b.center() });
        if let Some(a) = self.groups.get_mut(&from) {
            a.connections.push(Endpoint { role: Role::P1, line, peer: to });
        }
        if let Some(b) = self.groups.get_mut(&to) {
            b.connections.push(Endpoint { role: Role::P2, line, peer: from });
        }
        Ok(Some(line))
    }

    /// Re-anchor the line terminals incident to `id` at the group's current
    /// center: `P1` endpoints drive the start terminal, `P2` endpoints the
    /// end terminal. O(degree); run on every position change so lines stay
    /// visually attached. An already-destroyed line is a silent no-op.
    ///
    /// Returns `false` when the group does not resolve.
    pub fn propagate_move(&mut self, id: GroupId) -> bool {
        let Some(group) = self.groups.get(&id) else {
            return false;
        };
        let center = group.center();
        let endpoints: Vec<(LineId, Role)> =
            group.connections.iter().map(|e| (e.line, e.role)).collect();
        for (line, role) in endpoints {
            if let Some(line) = self.lines.get_mut(&line) {
                match role {
                    Role::P1 => line.start = center,
                    Role::P2 => line.end = center,
                }
            }
        }
        true
    }

    /// Remove a group and cascade over its connections: each peer's matching
    /// endpoint record is dropped and each shared line destroyed. Missing
    /// peers and already-missing endpoint records are tolerated no-ops, so
    /// removing the second end of a half-torn connection is safe.
    ///
    /// Returns the removed group and the ids of the lines destroyed with it
    /// (for the caller to release from the canvas), or `None` if the id does
    /// not resolve — re-removal is a no-op.
    pub fn remove_group(&mut self, id: GroupId) -> Option<(Group, Vec<LineId>)> {
        let group = self.groups.remove(&id)?;
        let mut destroyed = Vec::with_capacity(group.connections.len());
        for endpoint in &group.connections {
            if self.lines.remove(&endpoint.line).is_some() {
                destroyed.push(endpoint.line);
            }
            if let Some(peer) = self.groups.get_mut(&endpoint.peer) {
                peer.connections.retain(|e| e.peer != id);
            }
        }
        Some((group, destroyed))
    }

    /// Remove a group *without* cascading over its connections.
    ///
    /// Used by ungroup, which dismantles the wrapper but carries the identity
    /// and connections forward for an immediately following regroup. The
    /// peers' endpoint records keep naming the taken id until
    /// [`RoomGraph::repoint_peers`] runs; lookups through them miss in the
    /// meantime, which every use site tolerates.
    pub fn take(&mut self, id: GroupId) -> Option<Group> {
        self.groups.remove(&id)
    }

    /// Re-point every peer endpoint that names `old` to name `new` instead.
    ///
    /// Used by regroup, which re-wraps a group's constituents under a freshly
    /// allocated id while carrying its connections forward: the carried
    /// endpoint records already name the right peers, but those peers still
    /// name the pre-edit id.
    pub fn repoint_peers(&mut self, endpoints: &[Endpoint], old: GroupId, new: GroupId) {
        for endpoint in endpoints {
            if let Some(peer) = self.groups.get_mut(&endpoint.peer) {
                for record in &mut peer.connections {
                    if record.peer == old {
                        record.peer = new;
                    }
                }
            }
        }
    }
}

impl Default for RoomGraph {
    fn default() -> Self {
        Self::new()
    }
}
