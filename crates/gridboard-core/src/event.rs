#![forbid(unsafe_code)]

//! Canonical input events for the layout editor.
//!
//! Hosts translate their native input (DOM pointer events, terminal mouse
//! reports, scripted fixtures) into [`InputEvent`] values. Pointer events
//! carry absolute pixel positions only; everything the editor derives from
//! them is recomputed from the absolute position, so delivering the same
//! move twice is harmless.
//!
//! # Wire shape
//!
//! Events serialize in an externally tagged form, which is what replay
//! scripts contain:
//!
//! ```json
//! [
//!   { "command": "enter_edit" },
//!   { "pointer": { "kind": "down", "position": { "x": 50, "y": 50 } } },
//!   { "pointer": { "kind": "move", "position": { "x": 50, "y": 650 } } },
//!   { "pointer": { "kind": "up", "position": { "x": 50, "y": 650 } } },
//!   { "command": "apply" }
//! ]
//! ```

use serde::{Deserialize, Serialize};

use crate::geometry::PointerPosition;

/// One input delivered to the layout editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputEvent {
    /// Pointer activity on the canvas.
    Pointer(PointerEvent),
    /// One of the three user-facing layout controls.
    Command(LayoutCommand),
}

impl InputEvent {
    #[must_use]
    pub const fn pointer(kind: PointerEventKind, x: i32, y: i32) -> Self {
        Self::Pointer(PointerEvent::new(kind, PointerPosition::new(x, y)))
    }

    #[must_use]
    pub const fn command(command: LayoutCommand) -> Self {
        Self::Command(command)
    }
}

/// Parameterless layout controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutCommand {
    EnterEdit,
    Apply,
    Cancel,
}

/// Phase of a pointer interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerEventKind {
    Down,
    Move,
    Up,
}

/// A pointer sample in canvas pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub position: PointerPosition,
    /// Identifies the physical pointer; moves and releases from a pointer
    /// other than the one that started a gesture are ignored.
    #[serde(default)]
    pub pointer_id: u32,
}

impl PointerEvent {
    #[must_use]
    pub const fn new(kind: PointerEventKind, position: PointerPosition) -> Self {
        Self {
            kind,
            position,
            pointer_id: 0,
        }
    }

    #[must_use]
    pub const fn with_pointer_id(mut self, pointer_id: u32) -> Self {
        self.pointer_id = pointer_id;
        self
    }
}
