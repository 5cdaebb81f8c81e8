#![forbid(unsafe_code)]

//! Layout: the committed grid, placement rules, and the edit-session
//! controller.
//!
//! # Role in gridboard
//! `gridboard-layout` owns every rule about where panels may sit. Hosts hand
//! it input events and a [`LayoutSurface`]; it hands back transition records
//! and calls the surface for exactly the rectangles that changed.
//!
//! # Primary responsibilities
//! - **GridModel**: fixed panel set with validated rectangles.
//! - **check_placement**: bounds and no-overlap legality of a candidate.
//! - **GhostLayer**: sticky preview that only ever shows legal candidates.
//! - **LayoutEditor**: enter/apply/cancel sessions and drag/resize gestures.
//! - **persist**: stored-document decoding and default synthesis.
//!
//! # Feature flags
//! - `tracing`: emit `editor.transition` and `editor.placement_rejected`
//!   events through the `tracing` crate.

pub mod editor;
pub mod ghost;
pub mod grid;
pub mod persist;
pub mod placement;
pub mod surface;
pub mod text_surface;

pub use editor::{
    EditorEffect, EditorState, EditorTransition, LayoutEditor, NoopReason, PanelRegion,
    RESIZE_HANDLE_PX, ViewMode, hit_test,
};
pub use ghost::{GhostLayer, GhostUpdate};
pub use grid::{GridModel, LayoutError, LayoutIssue, LayoutMap, LayoutSnapshot, PanelId};
pub use persist::{
    DEFAULT_PANEL_SPAN, FallbackReason, LayoutDocument, LayoutOrigin, LayoutPayload, LoadedLayout,
    MAX_DEFAULT_PANELS, decode_layout, default_layout, resolve_layout,
};
pub use placement::{PlacementRejection, check_placement, is_valid_placement};
pub use surface::{LayoutSink, LayoutSurface, MemorySink, NullSurface};
pub use text_surface::TextSurface;
