//! Character-grid rendering of the dashboard canvas.
//!
//! One glyph per cell: panels are lettered `A`, `B`, … in startup order,
//! free cells are `.`, and the ghost is drawn over everything as `*`. In edit
//! mode each panel's bottom-right cell is lowercase to mark its resize grip.

use std::fmt::Write as _;

use gridboard_core::geometry::{GRID_CELLS, GridRect};

use crate::grid::{GridModel, PanelId};
use crate::placement::PlacementRejection;
use crate::surface::LayoutSurface;

const EMPTY_CELL: char = '.';
const GHOST_CELL: char = '*';

#[derive(Debug, Clone)]
struct PanelSlot {
    panel: PanelId,
    glyph: char,
    rect: GridRect,
}

/// [`LayoutSurface`] that keeps a text picture of the canvas.
#[derive(Debug, Clone)]
pub struct TextSurface {
    slots: Vec<PanelSlot>,
    ghost: Option<(PanelId, GridRect)>,
    editing: bool,
    last_rejection: Option<(PanelId, GridRect, PlacementRejection)>,
}

impl TextSurface {
    /// Surface showing every panel of `model` at its committed rectangle.
    #[must_use]
    pub fn new(model: &GridModel) -> Self {
        let slots = model
            .iter()
            .zip(glyphs())
            .map(|((panel, rect), glyph)| PanelSlot {
                panel: panel.clone(),
                glyph,
                rect,
            })
            .collect();
        Self {
            slots,
            ghost: None,
            editing: false,
            last_rejection: None,
        }
    }

    #[must_use]
    pub fn is_editing(&self) -> bool {
        self.editing
    }

    #[must_use]
    pub fn ghost(&self) -> Option<GridRect> {
        self.ghost.as_ref().map(|(_, rect)| *rect)
    }

    /// Most recent refused candidate, for feedback.
    #[must_use]
    pub fn last_rejection(&self) -> Option<&(PanelId, GridRect, PlacementRejection)> {
        self.last_rejection.as_ref()
    }

    /// Glyph assigned to `panel`.
    #[must_use]
    pub fn glyph(&self, panel: &PanelId) -> Option<char> {
        self.slot(panel).map(|slot| slot.glyph)
    }

    /// Glyph at a 1-indexed cell.
    #[must_use]
    pub fn cell(&self, col: u16, row: u16) -> char {
        if self
            .ghost
            .as_ref()
            .is_some_and(|(_, ghost)| ghost.contains_cell(col, row))
        {
            return GHOST_CELL;
        }
        self.slots
            .iter()
            .find(|slot| slot.rect.contains_cell(col, row))
            .map_or(EMPTY_CELL, |slot| {
                let grip = u32::from(col) + 1 == slot.rect.right()
                    && u32::from(row) + 1 == slot.rect.bottom();
                if self.editing && grip {
                    slot.glyph.to_ascii_lowercase()
                } else {
                    slot.glyph
                }
            })
    }

    /// Mode header, the 12 grid rows, then one legend line per panel.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mode = if self.editing { "editing" } else { "viewing" };
        let _ = writeln!(out, "mode: {mode}");
        for row in 1..=GRID_CELLS {
            let line: String = (1..=GRID_CELLS).map(|col| self.cell(col, row)).collect();
            out.push_str(&line);
            out.push('\n');
        }
        for slot in &self.slots {
            let _ = writeln!(out, "{} {} {}", slot.glyph, slot.panel, slot.rect);
        }
        if let Some((panel, rect)) = &self.ghost {
            let _ = writeln!(out, "{GHOST_CELL} ghost of {panel} {rect}");
        }
        out
    }

    fn slot(&self, panel: &PanelId) -> Option<&PanelSlot> {
        self.slots.iter().find(|slot| &slot.panel == panel)
    }
}

fn glyphs() -> impl Iterator<Item = char> {
    ('A'..='Z').chain('0'..='9')
}

impl LayoutSurface for TextSurface {
    fn draw_panel(&mut self, panel: &PanelId, rect: GridRect) {
        if let Some(slot) = self.slots.iter_mut().find(|slot| &slot.panel == panel) {
            slot.rect = rect;
        }
    }

    fn draw_ghost(&mut self, panel: &PanelId, rect: GridRect) {
        self.ghost = Some((panel.clone(), rect));
    }

    fn clear_ghost(&mut self) {
        self.ghost = None;
    }

    fn set_edit_mode(&mut self, editing: bool) {
        self.editing = editing;
    }

    fn placement_rejected(
        &mut self,
        panel: &PanelId,
        candidate: GridRect,
        rejection: &PlacementRejection,
    ) {
        self.last_rejection = Some((panel.clone(), candidate, rejection.clone()));
    }
}
