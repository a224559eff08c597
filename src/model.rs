//! Entity model: identifiers, the per-client id allocator, groups, connection
//! endpoints, and the shared line segment.
//!
//! A `Group` is the atomic visible unit — a shape composed with an editable
//! label. A connection between two groups is materialized as two directed
//! [`Endpoint`] records (one stored on each incident group) plus one shared
//! [`Line`] owned by the room graph. Endpoints name their peer by id and
//! resolve it through the arena at use time, so the cyclic peer references of
//! the visual graph never become ownership cycles.

#[cfg(test)]
#[path = "model_test.rs"]
mod model_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one client session in a room.
///
/// Embedded in every [`GroupId`] so that ids minted by different clients can
/// never collide, without any central allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Mint a fresh random client id for this session.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a group, stable for the group's whole life.
///
/// The `(client, seq)` pair makes ids globally unique across a room: `seq` is
/// strictly increasing per creating client, and `client` disambiguates
/// concurrent creators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId {
    /// The client that created the group.
    pub client: ClientId,
    /// Creation sequence number local to that client, starting at 0.
    pub seq: u64,
}

/// Hands out strictly increasing [`GroupId`]s for one client session.
///
/// No side effects beyond advancing the local counter; remote ids are never
/// minted here (their `client` part differs).
#[derive(Debug)]
pub struct IdAllocator {
    client: ClientId,
    next_seq: u64,
}

impl IdAllocator {
    /// Create an allocator for the given client session, starting at seq 0.
    #[must_use]
    pub fn new(client: ClientId) -> Self {
        Self { client, next_seq: 0 }
    }

    /// The client this allocator mints ids for.
    #[must_use]
    pub fn client(&self) -> ClientId {
        self.client
    }

    /// Allocate the next id. Each call returns a strictly larger `seq`.
    pub fn next(&mut self) -> GroupId {
        let id = GroupId { client: self.client, seq: self.next_seq };
        self.next_seq += 1;
        id
    }
}

/// Opaque handle to a drawable shape primitive owned by the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeHandle(pub Uuid);

impl ShapeHandle {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ShapeHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque handle to an editable text label owned by the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelHandle(pub Uuid);

impl LabelHandle {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LabelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifier for the shared rendered line of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineId(pub Uuid);

impl LineId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LineId {
    fn default() -> Self {
        Self::new()
    }
}

/// The kind of shape a group wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Axis-aligned rectangle.
    Rect,
    /// Ellipse inscribed within the bounding box.
    Ellipse,
    /// User-provided image tile.
    Image,
}

/// Which terminal of the shared line an endpoint drives.
///
/// For every connection exactly one incident group holds `P1` (the line's
/// start terminal) and the other holds `P2` (the end terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    P1,
    P2,
}

/// One directed half of a connection, stored on the incident group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Which line terminal this group drives.
    pub role: Role,
    /// The shared line, owned by the room graph and destroyed by whichever
    /// incident group is deleted first.
    pub line: LineId,
    /// Id of the group on the other side, resolved through the arena.
    pub peer: GroupId,
}

/// A point in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The shared rendered segment of one connection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    /// Terminal driven by the `P1` endpoint.
    pub start: Point,
    /// Terminal driven by the `P2` endpoint.
    pub end: Point,
}

/// A composed, selectable visual unit: one shape plus one label.
#[derive(Debug, Clone)]
pub struct Group {
    /// Unique identity, never reassigned after creation.
    pub id: GroupId,
    /// The drawable shape constituent.
    pub shape: ShapeHandle,
    /// The editable label constituent, associated with the same id.
    pub label: LabelHandle,
    /// Shape variant, carried on the wire for remote re-creation.
    pub kind: ShapeKind,
    /// Fill color as a CSS color string.
    pub color: String,
    /// Left edge of the bounding box in world coordinates.
    pub x: f64,
    /// Top edge of the bounding box in world coordinates.
    pub y: f64,
    /// Width of the bounding box.
    pub width: f64,
    /// Height of the bounding box.
    pub height: f64,
    /// False while the label is mid-edit (locally or on a remote client).
    pub editable: bool,
    /// Endpoint records for every connection incident to this group.
    pub connections: Vec<Endpoint>,
}

impl Group {
    /// Center point of the bounding box; line terminals anchor here.
    #[must_use]
    pub fn center(&self) -> Point {
        Point { x: self.x + self.width / 2.0, y: self.y + self.height / 2.0 }
    }

    /// Number of connections incident to this group.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.connections.len()
    }
}
