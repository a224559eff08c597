//! Interaction disambiguation: the double-click latch and connect-mode
//! staging.
//!
//! A raw pointer-click stream is ambiguous — the same click can mean "start
//! editing this label" or "stage this group for a new connection". This
//! module resolves each click into one [`Intent`] using a time-window latch
//! and a mode flag, and guarantees the connection graph is never invoked with
//! invalid arguments (no self-loops, never more than two staged groups).
//!
//! The latch is an explicit two-state machine (`Idle → Armed → Idle`) with a
//! deadline compared against a caller-supplied monotonic clock, so the state
//! is testable without real time passing.

#[cfg(test)]
#[path = "interact_test.rs"]
mod interact_test;

use std::collections::HashMap;

use crate::consts::DOUBLE_CLICK_WINDOW_MS;
use crate::model::GroupId;

/// How a single raw click was classified by the latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    /// First click of a potential pair; the latch is now armed.
    Single,
    /// Second click inside the window; the latch has reset.
    Double,
}

/// Double-click latch for one group.
///
/// The first click arms the latch with a deadline. A second click before the
/// deadline is a double click and resets the latch; a click after the
/// deadline is treated as fresh and re-arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClickLatch {
    /// Waiting for a first click.
    #[default]
    Idle,
    /// A click was seen; a second one before `deadline` completes the pair.
    Armed {
        /// Monotonic milliseconds after which the armed click goes stale.
        deadline: i64,
    },
}

impl ClickLatch {
    /// Feed one click at monotonic time `now_ms` and classify it.
    pub fn observe(&mut self, now_ms: i64) -> ClickKind {
        match *self {
            ClickLatch::Armed { deadline } if now_ms < deadline => {
                *self = ClickLatch::Idle;
                ClickKind::Double
            }
            _ => {
                *self = ClickLatch::Armed { deadline: now_ms + DOUBLE_CLICK_WINDOW_MS };
                ClickKind::Single
            }
        }
    }
}

/// What one disambiguated click asks the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Nothing — an unpaired single click, or a stage with no partner yet.
    None,
    /// Create a connection between two distinct staged groups.
    Connect {
        /// First-staged group; holds the `P1` endpoint.
        from: GroupId,
        /// Second-staged group; holds the `P2` endpoint.
        to: GroupId,
    },
    /// Enter label editing on this group.
    EnterEdit(GroupId),
}

/// Resolves the raw click stream into intents.
///
/// Holds one latch per clicked group (the latch belongs to the object, not
/// the canvas — clicking A then B quickly is two singles, not a double) plus
/// the connect-mode flag and its pending selection buffer.
#[derive(Debug, Default)]
pub struct Disambiguator {
    connect_mode: bool,
    staged: Vec<GroupId>,
    latches: HashMap<GroupId, ClickLatch>,
}

impl Disambiguator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether connect mode is active.
    #[must_use]
    pub fn connect_mode(&self) -> bool {
        self.connect_mode
    }

    /// The groups currently staged for connection, in staging order.
    #[must_use]
    pub fn staged(&self) -> &[GroupId] {
        &self.staged
    }

    /// Toggle connect mode, returning the new state. Entering clears any
    /// stale staged selection; leaving discards a half-staged pair.
    pub fn toggle_connect_mode(&mut self) -> bool {
        self.connect_mode = !self.connect_mode;
        self.staged.clear();
        self.connect_mode
    }

    /// Feed one click on `group` at monotonic time `now_ms`.
    ///
    /// A qualifying (double) click either stages the group for connection or
    /// asks for label editing, depending on the mode flag. Completing a pair
    /// exits connect mode, so a third selection can never over-stage the
    /// buffer. Staging the same group twice is rejected — self-loops are
    /// structurally impossible downstream.
    pub fn click(&mut self, group: GroupId, now_ms: i64) -> Intent {
        let kind = self.latches.entry(group).or_default().observe(now_ms);
        if kind == ClickKind::Single {
            return Intent::None;
        }
        if !self.connect_mode {
            return Intent::EnterEdit(group);
        }
        if self.staged.contains(&group) {
            return Intent::None;
        }
        self.staged.push(group);
        if self.staged.len() < 2 {
            return Intent::None;
        }
        let to = self.staged.pop();
        let from = self.staged.pop();
        self.connect_mode = false;
        match (from, to) {
            (Some(from), Some(to)) => Intent::Connect { from, to },
            _ => Intent::None,
        }
    }

    /// Drop all state held for a group that no longer exists.
    pub fn forget(&mut self, group: GroupId) {
        self.latches.remove(&group);
        self.staged.retain(|g| *g != group);
    }
}
