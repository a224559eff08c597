//! Consumed interface of the rendering collaborator.
//!
//! The engine owns lifecycle; the rendering layer owns pixels. Destruction
//! always flows through the engine so the renderer is told to release its own
//! handles as a side effect. Nothing in this crate draws — a host supplies a
//! [`Renderer`] and the engine tells it *what* changed.

use crate::model::{GroupId, LabelHandle, LineId, ShapeHandle};

/// Anything the engine can ask the renderer to add, remove, or activate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasEntity {
    /// A composed group (shape + label drawn as one unit).
    Group(GroupId),
    /// A detached shape constituent, shown individually during label editing.
    Shape(ShapeHandle),
    /// A detached label constituent.
    Label(LabelHandle),
    /// The shared line of a connection.
    Line(LineId),
}

/// The drawing surface, as seen from the consistency engine.
pub trait Renderer {
    /// Add an entity to the canvas.
    fn add_to_canvas(&mut self, entity: CanvasEntity);
    /// Remove an entity from the canvas, releasing the renderer's handle.
    fn remove_from_canvas(&mut self, entity: CanvasEntity);
    /// Redraw everything.
    fn render_all(&mut self);
    /// Stack a line beneath all other elements.
    fn send_to_back(&mut self, line: LineId);
    /// Open the text editor on a label with its full text selected.
    fn enter_text_edit(&mut self, label: LabelHandle);
    /// Mark an entity as the active selection.
    fn set_active_object(&mut self, entity: CanvasEntity);
}

/// Renderer that does nothing. Useful for headless hosts and tests.
#[derive(Debug, Default)]
pub struct NoopRenderer;

impl Renderer for NoopRenderer {
    fn add_to_canvas(&mut self, _entity: CanvasEntity) {}
    fn remove_from_canvas(&mut self, _entity: CanvasEntity) {}
    fn render_all(&mut self) {}
    fn send_to_back(&mut self, _line: LineId) {}
    fn enter_text_edit(&mut self, _label: LabelHandle) {}
    fn set_active_object(&mut self, _entity: CanvasEntity) {}
}
