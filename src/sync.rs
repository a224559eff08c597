//! Operation wire contract for room synchronization.
//!
//! Every locally-committed mutation is serialized into exactly one
//! [`Operation`] and broadcast to the room *after* the local mutation has been
//! applied (apply-then-broadcast — the originating client never waits on its
//! own round-trip). Remote operations are replayed through
//! [`crate::engine::Engine::apply_remote`], which resolves ids through the
//! room graph and absorbs anything it cannot resolve. Idempotent apply is the
//! only conflict-safety mechanism: no operation log, no vector clocks.
//!
//! The wire encoding is JSON, internally tagged on `"op"`, with camelCase
//! field names matching the room channel's conventions.

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;

use serde::{Deserialize, Serialize};

use crate::model::{GroupId, ShapeKind};

/// A serialized description of one committed local mutation, broadcast for
/// remote replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Operation {
    /// A group was created. Receivers mint their own render handles; extent
    /// is not carried and defaults on the receiving side.
    CreateGroup {
        id: GroupId,
        x: f64,
        y: f64,
        shape_kind: ShapeKind,
        color_value: String,
    },
    /// A group was deleted; receivers cascade over its connections.
    DeleteGroup { id: GroupId },
    /// A connection was created between two groups. `from_id` holds the `P1`
    /// endpoint, `to_id` the `P2` endpoint.
    Connect { from_id: GroupId, to_id: GroupId },
    /// A group's fill color changed.
    ColorChange { id: GroupId, color_value: String },
    /// A group finished moving. Emitted once per completed drag gesture, not
    /// per pointer sample; receivers re-anchor incident lines.
    Move { id: GroupId, x: f64, y: f64 },
    /// A group entered label editing on some client; receivers mark it
    /// non-editable until the edit round-trip replaces it.
    EditStarted { id: GroupId },
}

/// Error returned by [`decode_operation`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The payload was not a well-formed operation message.
    #[error("failed to decode operation: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Encode an operation into its JSON wire form.
#[must_use]
pub fn encode_operation(op: &Operation) -> String {
    // Serializing this enum cannot fail: every field is a plain value and the
    // map keys are strings. The fallback is never reached in practice.
    serde_json::to_string(op).unwrap_or_default()
}

/// Decode a JSON wire payload into an operation.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed or unrecognized payloads.
pub fn decode_operation(payload: &str) -> Result<Operation, CodecError> {
    Ok(serde_json::from_str(payload)?)
}
