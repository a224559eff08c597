//! Shared-graph consistency engine for a multi-user visual board.
//!
//! Each participant in a room sees shapes grouped with labels, connections
//! between them, and one shared canvas state that must stay consistent across
//! clients. This crate owns the part with real invariants: unique identity,
//! symmetric edges, cascading deletes, move propagation, and the
//! apply-then-broadcast synchronization contract that makes every client
//! converge. Rendering, the socket transport, and UI chrome are external
//! collaborators — the host wires a [`render::Renderer`] in, forwards
//! [`engine::Action::Broadcast`] payloads to the room channel, and feeds
//! received operations to [`engine::Engine::apply_remote`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Group lifecycle, interaction glue, and remote apply |
//! | [`model`] | Ids, the per-client allocator, groups, endpoints, lines |
//! | [`graph`] | The room arena: connect, move propagation, cascade delete |
//! | [`interact`] | Double-click latch and connect-mode staging |
//! | [`sync`] | Operation wire contract and JSON codec |
//! | [`render`] | Consumed rendering-collaborator interface |
//! | [`consts`] | Shared numeric constants (click window, default extent) |

pub mod consts;
pub mod engine;
pub mod graph;
pub mod interact;
pub mod model;
pub mod render;
pub mod sync;
