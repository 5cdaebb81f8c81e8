#![forbid(unsafe_code)]

//! Core: canvas geometry and input events.
//!
//! # Role in gridboard
//! `gridboard-core` is the dependency-free bottom layer. It owns the cell
//! and pixel coordinate spaces and the input vocabulary that hosts feed into
//! the layout editor.
//!
//! # Primary responsibilities
//! - **GridRect**: 1-indexed cell rectangles with bounds and overlap tests.
//! - **CanvasBounds**: exact pixel ↔ cell conversion for a rendered canvas.
//! - **InputEvent**: pointer samples and the enter-edit/apply/cancel commands.
//!
//! # How it fits in the system
//! `gridboard-layout` builds the grid model and the interaction controller on
//! top of these types; `gridboard` hosts them behind a CLI and persistence.

pub mod event;
pub mod geometry;

pub use event::{InputEvent, LayoutCommand, PointerEvent, PointerEventKind};
pub use geometry::{
    CanvasBounds, GRID_CELLS, GeometryError, GridRect, MIN_PANEL_SPAN, PixelOffset, PixelRect,
    PointerPosition, pixel_to_cell,
};
