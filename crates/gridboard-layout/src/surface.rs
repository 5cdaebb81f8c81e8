//! Seams between the editor and its host: where pixels go and where saved
//! layouts go.

use gridboard_core::geometry::GridRect;

use crate::grid::{LayoutMap, PanelId};
use crate::placement::PlacementRejection;

/// Display adapter driven by the layout editor.
///
/// After every commit or ghost change the editor calls exactly the methods
/// for the rectangles that changed; a surface never has to diff.
pub trait LayoutSurface {
    /// Render `panel` at its committed rectangle.
    fn draw_panel(&mut self, panel: &PanelId, rect: GridRect);

    /// Show (or move) the preview rectangle for `panel`.
    fn draw_ghost(&mut self, panel: &PanelId, rect: GridRect);

    /// Remove the preview rectangle.
    fn clear_ghost(&mut self);

    /// Toggle drag and resize affordances on every panel.
    fn set_edit_mode(&mut self, editing: bool);

    /// A candidate was refused and the ghost stayed put.
    ///
    /// The default is silent; hosts that want a shake or a tooltip hook in
    /// here without touching the editor.
    fn placement_rejected(
        &mut self,
        _panel: &PanelId,
        _candidate: GridRect,
        _rejection: &PlacementRejection,
    ) {
    }
}

/// Receiver of applied layouts.
///
/// `save` must not block the editor on I/O; implementations hand the layout
/// off and report failures on their own.
pub trait LayoutSink {
    fn save(&mut self, layout: &LayoutMap);
}

/// Surface that renders nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSurface;

impl LayoutSurface for NullSurface {
    fn draw_panel(&mut self, _panel: &PanelId, _rect: GridRect) {}

    fn draw_ghost(&mut self, _panel: &PanelId, _rect: GridRect) {}

    fn clear_ghost(&mut self) {}

    fn set_edit_mode(&mut self, _editing: bool) {}
}

/// Sink that keeps every applied layout in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    saved: Vec<LayoutMap>,
}

impl MemorySink {
    #[must_use]
    pub fn saved(&self) -> &[LayoutMap] {
        &self.saved
    }

    #[must_use]
    pub fn last(&self) -> Option<&LayoutMap> {
        self.saved.last()
    }
}

impl LayoutSink for MemorySink {
    fn save(&mut self, layout: &LayoutMap) {
        self.saved.push(layout.clone());
    }
}
