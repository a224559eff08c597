//! The shared-graph consistency engine: group lifecycle, interaction glue,
//! and idempotent remote apply.
//!
//! Every entry point that commits a local mutation applies it to the room
//! graph first and then surfaces the matching [`Operation`] as an
//! [`Action::Broadcast`] for the host to send — apply-then-broadcast, so the
//! originating client never waits on its own network round-trip. Remote
//! operations come back in through [`Engine::apply_remote`], which resolves
//! ids through the arena and absorbs anything it cannot resolve.
//!
//! Per-group state machine: `Created → (Editing ⇄ Idle) → Deleted`. While a
//! label edit is in flight the group's constituents are detached and held in
//! an [`Ungrouped`] value; [`Engine::end_edit`] re-wraps them under a freshly
//! allocated id, carrying the connections forward so edges survive the edit
//! round-trip. `Deleted` is terminal.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use tracing::{debug, warn};

use crate::consts::{DEFAULT_GROUP_HEIGHT, DEFAULT_GROUP_WIDTH};
use crate::graph::RoomGraph;
use crate::interact::{Disambiguator, Intent};
use crate::model::{
    ClientId, Endpoint, Group, GroupId, IdAllocator, LabelHandle, Role, ShapeHandle, ShapeKind,
};
use crate::render::{CanvasEntity, Renderer};
use crate::sync::Operation;

/// Effects surfaced to the host for processing.
///
/// The engine never touches the transport or UI chrome directly: it hands
/// back broadcasts for the room channel and notifications the host's overlay
/// layer may care about.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Send this operation to the room. Emitted exactly once per committed
    /// local mutation, after the mutation has been applied.
    Broadcast(Operation),
    /// The active selection changed.
    SelectionChanged(Option<GroupId>),
    /// The scene changed; the host should ask the renderer to redraw.
    RenderNeeded,
}

/// Precondition violation raised by lifecycle operations.
///
/// Programming errors surfaced to the caller, never silently recovered.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The shape or label handle passed to `create_group` already belongs to
    /// a live group.
    #[error("constituent handle is already owned by group {0:?}")]
    ConstituentOwned(GroupId),
}

/// Everything needed to create a group locally.
///
/// The handles come from the rendering layer (which has already drawn the
/// shape and label); the engine wraps them, allocates identity, and takes
/// over their lifecycle.
#[derive(Debug, Clone)]
pub struct NewGroup {
    /// The drawable shape constituent.
    pub shape: ShapeHandle,
    /// The editable label constituent.
    pub label: LabelHandle,
    /// Shape variant.
    pub kind: ShapeKind,
    /// Fill color as a CSS color string.
    pub color: String,
    /// Left edge of the bounding box.
    pub x: f64,
    /// Top edge of the bounding box.
    pub y: f64,
    /// Bounding-box width.
    pub width: f64,
    /// Bounding-box height.
    pub height: f64,
}

/// A group's constituents, detached for the duration of a label edit.
///
/// Carries the identity and connections forward for the immediately
/// following [`Engine::end_edit`]; neither is destroyed by ungrouping.
#[derive(Debug, Clone)]
pub struct Ungrouped {
    /// Identity of the group that was taken apart.
    pub id: GroupId,
    /// The detached shape constituent.
    pub shape: ShapeHandle,
    /// The detached label constituent, now in text editing.
    pub label: LabelHandle,
    /// Shape variant, carried for re-wrapping.
    pub kind: ShapeKind,
    /// Fill color, carried for re-wrapping.
    pub color: String,
    /// Last known left edge; constituents render at the same coordinates
    /// they had inside the group.
    pub x: f64,
    /// Last known top edge.
    pub y: f64,
    /// Bounding-box width, carried for re-wrapping.
    pub width: f64,
    /// Bounding-box height, carried for re-wrapping.
    pub height: f64,
    /// The connections list, reused as-is so edges are not lost across the
    /// edit round-trip.
    pub connections: Vec<Endpoint>,
}

/// One client's view of a room, and the only mutation path into it.
pub struct Engine {
    graph: RoomGraph,
    alloc: IdAllocator,
    interact: Disambiguator,
    selection: Option<GroupId>,
    editing: Option<Ungrouped>,
}

impl Engine {
    /// Create an engine for one client session on an empty room.
    #[must_use]
    pub fn new(client: ClientId) -> Self {
        Self {
            graph: RoomGraph::new(),
            alloc: IdAllocator::new(client),
            interact: Disambiguator::new(),
            selection: None,
            editing: None,
        }
    }

    // --- Queries ---

    /// The client this engine mints ids for.
    #[must_use]
    pub fn client(&self) -> ClientId {
        self.alloc.client()
    }

    /// The room graph, read-only. All mutation goes through engine methods.
    #[must_use]
    pub fn graph(&self) -> &RoomGraph {
        &self.graph
    }

    /// The currently selected group, if any.
    #[must_use]
    pub fn selection(&self) -> Option<GroupId> {
        self.selection
    }

    /// Whether connect mode is active.
    #[must_use]
    pub fn connect_mode(&self) -> bool {
        self.interact.connect_mode()
    }

    /// The in-flight label edit, if any.
    #[must_use]
    pub fn editing(&self) -> Option<&Ungrouped> {
        self.editing.as_ref()
    }

    // --- Local mutations ---

    /// Create a group from a shape and a label, allocate its identity,
    /// insert it into the room, and mark it as the active selection.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ConstituentOwned`] when either handle already
    /// belongs to a live group or to the in-flight edit.
    pub fn create_group(
        &mut self,
        spec: NewGroup,
        renderer: &mut dyn Renderer,
    ) -> Result<(GroupId, Vec<Action>), EngineError> {
        if let Some(owner) = self
            .graph
            .groups()
            .find(|g| g.shape == spec.shape || g.label == spec.label)
        {
            return Err(EngineError::ConstituentOwned(owner.id));
        }
        if let Some(edit) = &self.editing {
            if edit.shape == spec.shape || edit.label == spec.label {
                return Err(EngineError::ConstituentOwned(edit.id));
            }
        }

        let id = self.alloc.next();
        let group = Group {
            id,
            shape: spec.shape,
            label: spec.label,
            kind: spec.kind,
            color: spec.color.clone(),
            x: spec.x,
            y: spec.y,
            width: spec.width,
            height: spec.height,
            editable: true,
            connections: Vec::new(),
        };
        self.graph.insert(group);
        self.selection = Some(id);
        renderer.add_to_canvas(CanvasEntity::Group(id));
        renderer.set_active_object(CanvasEntity::Group(id));

        let actions = vec![
            Action::Broadcast(Operation::CreateGroup {
                id,
                x: spec.x,
                y: spec.y,
                shape_kind: spec.kind,
                color_value: spec.color,
            }),
            Action::SelectionChanged(Some(id)),
            Action::RenderNeeded,
        ];
        Ok((id, actions))
    }

    /// Feed one raw click on a group at monotonic time `now_ms`.
    ///
    /// The disambiguator classifies it; a qualifying click either completes a
    /// connection pair or starts a label edit. Clicks on unknown groups and
    /// clicks arriving while an edit is already in flight change nothing.
    pub fn click(&mut self, group: GroupId, now_ms: i64, renderer: &mut dyn Renderer) -> Vec<Action> {
        if self.editing.is_some() || !self.graph.contains(group) {
            return Vec::new();
        }
        match self.interact.click(group, now_ms) {
            Intent::None => Vec::new(),
            Intent::Connect { from, to } => self.commit_connect(from, to, renderer),
            Intent::EnterEdit(id) => self.begin_edit(id, renderer),
        }
    }

    /// Toggle connect mode, returning the new state.
    pub fn toggle_connect_mode(&mut self) -> bool {
        self.interact.toggle_connect_mode()
    }

    fn commit_connect(&mut self, from: GroupId, to: GroupId, renderer: &mut dyn Renderer) -> Vec<Action> {
        match self.graph.connect(from, to) {
            Ok(Some(line)) => {
                renderer.add_to_canvas(CanvasEntity::Line(line));
                renderer.send_to_back(line);
                vec![
                    Action::Broadcast(Operation::Connect { from_id: from, to_id: to }),
                    Action::RenderNeeded,
                ]
            }
            Ok(None) => Vec::new(),
            // The disambiguator never stages the same group twice; a
            // self-loop here means a host bug, and changes no state.
            Err(err) => {
                warn!(%err, "refused local connect");
                Vec::new()
            }
        }
    }

    fn begin_edit(&mut self, id: GroupId, renderer: &mut dyn Renderer) -> Vec<Action> {
        let Some(group) = self.graph.get_mut(id) else {
            return Vec::new();
        };
        if !group.editable {
            return Vec::new();
        }
        group.editable = false;

        // Ungroup: the wrapper leaves the canvas and the constituents come
        // back individually at the same absolute coordinates. Identity and
        // connections are carried forward for the regroup in `end_edit`.
        let Some(group) = self.graph.take(id) else {
            return Vec::new();
        };
        let edit = Ungrouped {
            id: group.id,
            shape: group.shape,
            label: group.label,
            kind: group.kind,
            color: group.color,
            x: group.x,
            y: group.y,
            width: group.width,
            height: group.height,
            connections: group.connections,
        };
        renderer.remove_from_canvas(CanvasEntity::Group(id));
        renderer.add_to_canvas(CanvasEntity::Shape(edit.shape));
        renderer.add_to_canvas(CanvasEntity::Label(edit.label));
        renderer.set_active_object(CanvasEntity::Label(edit.label));
        renderer.enter_text_edit(edit.label);
        self.editing = Some(edit);

        vec![
            Action::Broadcast(Operation::EditStarted { id }),
            Action::RenderNeeded,
        ]
    }

    /// Finish the in-flight label edit: re-wrap the detached constituents at
    /// their last known position under a freshly allocated id, reusing the
    /// carried connections. Peer endpoint records are re-pointed to the new
    /// id, and the id swap is broadcast as delete + create + reconnect so
    /// remote graphs track the new identity.
    ///
    /// A call with no edit in flight is a no-op.
    pub fn end_edit(&mut self, renderer: &mut dyn Renderer) -> Vec<Action> {
        let Some(edit) = self.editing.take() else {
            return Vec::new();
        };
        renderer.remove_from_canvas(CanvasEntity::Shape(edit.shape));
        renderer.remove_from_canvas(CanvasEntity::Label(edit.label));

        let old = edit.id;
        let id = self.alloc.next();
        // Endpoints whose shared line died during the edit (a peer was
        // deleted) are already-removed as far as the graph is concerned.
        let connections: Vec<Endpoint> = edit
            .connections
            .into_iter()
            .filter(|e| self.graph.line(e.line).is_some())
            .collect();
        self.graph.repoint_peers(&connections, old, id);

        let group = Group {
            id,
            shape: edit.shape,
            label: edit.label,
            kind: edit.kind,
            color: edit.color.clone(),
            x: edit.x,
            y: edit.y,
            width: edit.width,
            height: edit.height,
            editable: true,
            connections,
        };
        let reconnects: Vec<Operation> = group
            .connections
            .iter()
            .map(|e| match e.role {
                Role::P1 => Operation::Connect { from_id: id, to_id: e.peer },
                Role::P2 => Operation::Connect { from_id: e.peer, to_id: id },
            })
            .collect();
        self.graph.insert(group);
        self.selection = Some(id);
        renderer.add_to_canvas(CanvasEntity::Group(id));
        renderer.set_active_object(CanvasEntity::Group(id));

        let mut actions = vec![
            Action::Broadcast(Operation::DeleteGroup { id: old }),
            Action::Broadcast(Operation::CreateGroup {
                id,
                x: edit.x,
                y: edit.y,
                shape_kind: edit.kind,
                color_value: edit.color,
            }),
        ];
        actions.extend(reconnects.into_iter().map(Action::Broadcast));
        actions.push(Action::SelectionChanged(Some(id)));
        actions.push(Action::RenderNeeded);
        actions
    }

    /// One step of a local drag gesture: move the group to `(x, y)` and
    /// re-anchor its incident line terminals. Not broadcast — the completed
    /// gesture is, via [`Engine::end_move`].
    pub fn move_group(&mut self, id: GroupId, x: f64, y: f64) -> Vec<Action> {
        let Some(group) = self.graph.get_mut(id) else {
            return Vec::new();
        };
        group.x = x;
        group.y = y;
        self.graph.propagate_move(id);
        vec![Action::RenderNeeded]
    }

    /// Commit a completed drag gesture: broadcast the group's final position
    /// once, rather than one message per pointer sample.
    pub fn end_move(&mut self, id: GroupId) -> Vec<Action> {
        let Some(group) = self.graph.get(id) else {
            return Vec::new();
        };
        vec![Action::Broadcast(Operation::Move { id, x: group.x, y: group.y })]
    }

    /// Change a group's fill color and broadcast the change.
    pub fn set_color(&mut self, id: GroupId, color: impl Into<String>) -> Vec<Action> {
        let Some(group) = self.graph.get_mut(id) else {
            return Vec::new();
        };
        let color = color.into();
        group.color = color.clone();
        vec![
            Action::Broadcast(Operation::ColorChange { id, color_value: color }),
            Action::RenderNeeded,
        ]
    }

    /// Delete a group, cascading over its connections: each peer loses its
    /// matching endpoint record and each shared line leaves the canvas.
    /// Deleting an id that is not live is a no-op and broadcasts nothing.
    pub fn delete_group(&mut self, id: GroupId, renderer: &mut dyn Renderer) -> Vec<Action> {
        let Some((_, lines)) = self.graph.remove_group(id) else {
            return Vec::new();
        };
        for line in lines {
            renderer.remove_from_canvas(CanvasEntity::Line(line));
        }
        renderer.remove_from_canvas(CanvasEntity::Group(id));
        self.interact.forget(id);

        let mut actions = vec![Action::Broadcast(Operation::DeleteGroup { id })];
        if self.selection == Some(id) {
            self.selection = None;
            actions.push(Action::SelectionChanged(None));
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Delete the active selection, if any.
    pub fn delete_selected(&mut self, renderer: &mut dyn Renderer) -> Vec<Action> {
        match self.selection {
            Some(id) => self.delete_group(id, renderer),
            None => Vec::new(),
        }
    }

    // --- Remote apply ---

    /// Replay one remote operation against the local room.
    ///
    /// Ids are resolved through the arena; an unresolvable id is an absorbed
    /// no-op, never an error — applying the same message twice yields the
    /// same state as applying it once. Never re-broadcasts.
    pub fn apply_remote(&mut self, op: Operation, renderer: &mut dyn Renderer) -> Vec<Action> {
        match op {
            Operation::CreateGroup { id, x, y, shape_kind, color_value } => {
                if self.graph.contains(id) {
                    debug!(?id, "remote create for existing group ignored");
                    return Vec::new();
                }
                // Render handles are client-local; mint fresh ones here.
                let group = Group {
                    id,
                    shape: ShapeHandle::new(),
                    label: LabelHandle::new(),
                    kind: shape_kind,
                    color: color_value,
                    x,
                    y,
                    width: DEFAULT_GROUP_WIDTH,
                    height: DEFAULT_GROUP_HEIGHT,
                    editable: true,
                    connections: Vec::new(),
                };
                self.graph.insert(group);
                renderer.add_to_canvas(CanvasEntity::Group(id));
                vec![Action::RenderNeeded]
            }
            Operation::DeleteGroup { id } => {
                let Some((_, lines)) = self.graph.remove_group(id) else {
                    debug!(?id, "remote delete for unknown group ignored");
                    return Vec::new();
                };
                for line in lines {
                    renderer.remove_from_canvas(CanvasEntity::Line(line));
                }
                renderer.remove_from_canvas(CanvasEntity::Group(id));
                self.interact.forget(id);
                let mut actions = Vec::new();
                if self.selection == Some(id) {
                    self.selection = None;
                    actions.push(Action::SelectionChanged(None));
                }
                actions.push(Action::RenderNeeded);
                actions
            }
            Operation::Connect { from_id, to_id } => match self.graph.connect(from_id, to_id) {
                Ok(Some(line)) => {
                    renderer.add_to_canvas(CanvasEntity::Line(line));
                    renderer.send_to_back(line);
                    vec![Action::RenderNeeded]
                }
                Ok(None) => {
                    debug!(?from_id, ?to_id, "remote connect with unresolved group ignored");
                    Vec::new()
                }
                Err(err) => {
                    warn!(%err, "malformed remote connect ignored");
                    Vec::new()
                }
            },
            Operation::ColorChange { id, color_value } => {
                let Some(group) = self.graph.get_mut(id) else {
                    debug!(?id, "remote color change for unknown group ignored");
                    return Vec::new();
                };
                group.color = color_value;
                vec![Action::RenderNeeded]
            }
            Operation::Move { id, x, y } => {
                let Some(group) = self.graph.get_mut(id) else {
                    debug!(?id, "remote move for unknown group ignored");
                    return Vec::new();
                };
                group.x = x;
                group.y = y;
                self.graph.propagate_move(id);
                vec![Action::RenderNeeded]
            }
            Operation::EditStarted { id } => {
                let Some(group) = self.graph.get_mut(id) else {
                    debug!(?id, "remote edit notice for unknown group ignored");
                    return Vec::new();
                };
                group.editable = false;
                vec![Action::RenderNeeded]
            }
        }
    }
}
