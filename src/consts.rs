//! Shared numeric constants.

/// How long (milliseconds) the click latch stays armed waiting for the second
/// click of a double click.
pub const DOUBLE_CLICK_WINDOW_MS: i64 = 500;

/// Bounding-box width used when re-creating a remotely-announced group, whose
/// wire message carries position but not extent.
pub const DEFAULT_GROUP_WIDTH: f64 = 120.0;

/// Bounding-box height used when re-creating a remotely-announced group.
pub const DEFAULT_GROUP_HEIGHT: f64 = 80.0;
