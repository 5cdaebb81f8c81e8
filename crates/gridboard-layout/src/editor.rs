//! Edit-session controller for panel drag and resize.
//!
//! ```text
//! Viewing --enter--> Idle --down(body)---> Dragging --up--> Idle
//!                     |  \--down(handle)-> Resizing --up--> Idle
//!                     \--apply|cancel--> Viewing
//! ```
//!
//! Gestures exist only inside an edit session. Every call returns an
//! [`EditorTransition`]; inputs that do not apply to the current state come
//! back as [`EditorEffect::Noop`] with a reason instead of an error. The only
//! error is [`LayoutError::UnknownPanel`].
//!
//! Commits happen on release, never mid-gesture: the committed model is
//! overlap-free at every observable instant, and the ghost absorbs every
//! illegal intermediate position.

use gridboard_core::event::{InputEvent, LayoutCommand, PointerEvent, PointerEventKind};
use gridboard_core::geometry::{
    CanvasBounds, GridRect, MIN_PANEL_SPAN, PixelOffset, PointerPosition,
};
use serde::{Deserialize, Serialize};

use crate::ghost::{GhostLayer, GhostUpdate};
use crate::grid::{GridModel, LayoutError, LayoutSnapshot, PanelId};
use crate::placement::{PlacementRejection, check_placement};
use crate::surface::{LayoutSink, LayoutSurface};

/// Side length, in pixels, of the resize grip in each panel's bottom-right
/// corner.
pub const RESIZE_HANDLE_PX: u32 = 16;

/// Outer mode of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    Viewing,
    Editing,
}

/// Observable editor state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EditorState {
    Viewing,
    Idle,
    Dragging { panel: PanelId },
    Resizing { panel: PanelId },
}

impl EditorState {
    #[must_use]
    pub const fn view_mode(&self) -> ViewMode {
        match self {
            Self::Viewing => ViewMode::Viewing,
            _ => ViewMode::Editing,
        }
    }
}

/// Why an input was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoopReason {
    NotEditing,
    AlreadyEditing,
    GestureInProgress,
    NoActiveGesture,
    NoActiveDrag,
    NoActiveResize,
    PointerMismatch,
    NoPanelUnderPointer,
}

/// What one transition did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum EditorEffect {
    EditEntered {
        snapshot_hash: u64,
    },
    EditApplied {
        layout_hash: u64,
        abandoned_gesture: bool,
    },
    EditCanceled {
        restored_hash: u64,
        abandoned_gesture: bool,
    },
    DragStarted {
        panel: PanelId,
        anchor: PixelOffset,
        ghost: GridRect,
    },
    ResizeStarted {
        panel: PanelId,
        origin: PointerPosition,
        ghost: GridRect,
    },
    GhostMoved {
        panel: PanelId,
        ghost: GridRect,
    },
    GhostUnchanged {
        panel: PanelId,
    },
    GhostHeld {
        panel: PanelId,
        candidate: GridRect,
        rejection: PlacementRejection,
    },
    Committed {
        panel: PanelId,
        from: GridRect,
        to: GridRect,
    },
    /// Gesture ended without any legal candidate; nothing was committed.
    Released {
        panel: PanelId,
    },
    Noop {
        reason: NoopReason,
    },
}

/// One editor step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorTransition {
    pub transition_id: u64,
    pub from: EditorState,
    pub to: EditorState,
    pub effect: EditorEffect,
}

/// Part of a panel under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelRegion {
    Body,
    ResizeHandle,
}

/// Panel (and region of it) under `pointer`, if any.
#[must_use]
pub fn hit_test(
    model: &GridModel,
    pointer: PointerPosition,
    canvas: &CanvasBounds,
) -> Option<(PanelId, PanelRegion)> {
    model.iter().find_map(|(panel, rect)| {
        let pixels = canvas.rect_pixels(rect);
        if !pixels.contains(pointer) {
            return None;
        }
        let region = if pixels.corner_square(RESIZE_HANDLE_PX).contains(pointer) {
            PanelRegion::ResizeHandle
        } else {
            PanelRegion::Body
        };
        Some((panel.clone(), region))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureKind {
    Drag,
    Resize,
}

#[derive(Debug, Clone)]
struct DragGesture {
    panel: PanelId,
    pointer_id: u32,
    committed: GridRect,
    anchor: PixelOffset,
    ghost: GhostLayer,
}

#[derive(Debug, Clone)]
struct ResizeGesture {
    panel: PanelId,
    pointer_id: u32,
    committed: GridRect,
    origin: PointerPosition,
    ghost: GhostLayer,
}

#[derive(Debug, Clone)]
enum Gesture {
    Idle,
    Dragging(DragGesture),
    Resizing(ResizeGesture),
}

impl Gesture {
    fn ghost(&self) -> Option<&GhostLayer> {
        match self {
            Self::Idle => None,
            Self::Dragging(drag) => Some(&drag.ghost),
            Self::Resizing(resize) => Some(&resize.ghost),
        }
    }

    fn pointer_id(&self) -> Option<u32> {
        match self {
            Self::Idle => None,
            Self::Dragging(drag) => Some(drag.pointer_id),
            Self::Resizing(resize) => Some(resize.pointer_id),
        }
    }
}

#[derive(Debug, Clone)]
struct EditSession {
    snapshot: LayoutSnapshot,
    gesture: Gesture,
}

/// Owns the committed layout and the (optional) edit session over it.
#[derive(Debug, Clone)]
pub struct LayoutEditor {
    model: GridModel,
    session: Option<EditSession>,
    transition_counter: u64,
}

impl LayoutEditor {
    /// Start in viewing mode over `model`.
    #[must_use]
    pub fn new(model: GridModel) -> Self {
        Self {
            model,
            session: None,
            transition_counter: 0,
        }
    }

    /// Committed layout.
    #[must_use]
    pub fn model(&self) -> &GridModel {
        &self.model
    }

    #[must_use]
    pub fn into_model(self) -> GridModel {
        self.model
    }

    #[must_use]
    pub fn state(&self) -> EditorState {
        match &self.session {
            None => EditorState::Viewing,
            Some(session) => match &session.gesture {
                Gesture::Idle => EditorState::Idle,
                Gesture::Dragging(drag) => EditorState::Dragging {
                    panel: drag.panel.clone(),
                },
                Gesture::Resizing(resize) => EditorState::Resizing {
                    panel: resize.panel.clone(),
                },
            },
        }
    }

    #[must_use]
    pub fn view_mode(&self) -> ViewMode {
        if self.session.is_some() {
            ViewMode::Editing
        } else {
            ViewMode::Viewing
        }
    }

    /// Rectangle the ghost currently shows, during a gesture.
    #[must_use]
    pub fn ghost(&self) -> Option<GridRect> {
        self.active_ghost().map(GhostLayer::shown)
    }

    /// Candidate that releasing now would commit.
    #[must_use]
    pub fn last_valid_candidate(&self) -> Option<GridRect> {
        self.active_ghost().and_then(GhostLayer::last_valid)
    }

    /// Rollback point of the current edit session.
    #[must_use]
    pub fn session_snapshot(&self) -> Option<&LayoutSnapshot> {
        self.session.as_ref().map(|session| &session.snapshot)
    }

    /// Viewing → Editing. Takes the rollback snapshot and turns on panel
    /// affordances.
    pub fn enter_edit_mode(&mut self, surface: &mut dyn LayoutSurface) -> EditorTransition {
        let from = self.state();
        if self.session.is_some() {
            return self.noop(from, NoopReason::AlreadyEditing);
        }
        let snapshot = self.model.snapshot();
        let snapshot_hash = snapshot.state_hash();
        self.session = Some(EditSession {
            snapshot,
            gesture: Gesture::Idle,
        });
        surface.set_edit_mode(true);
        self.finish(from, EditorEffect::EditEntered { snapshot_hash })
    }

    /// Editing → Viewing, keeping every commit of the session and handing the
    /// layout to `sink`. An unfinished gesture is dropped without committing.
    pub fn apply_edit(
        &mut self,
        surface: &mut dyn LayoutSurface,
        sink: &mut dyn LayoutSink,
    ) -> EditorTransition {
        let from = self.state();
        let Some(session) = self.session.take() else {
            return self.noop(from, NoopReason::NotEditing);
        };
        let abandoned_gesture = abandon_gesture(&session.gesture, surface);
        sink.save(&self.model.to_persistable());
        surface.set_edit_mode(false);
        let layout_hash = self.model.state_hash();
        self.finish(
            from,
            EditorEffect::EditApplied {
                layout_hash,
                abandoned_gesture,
            },
        )
    }

    /// Editing → Viewing, restoring every panel to its rectangle at session
    /// entry.
    pub fn cancel_edit(&mut self, surface: &mut dyn LayoutSurface) -> EditorTransition {
        let from = self.state();
        let Some(session) = self.session.take() else {
            return self.noop(from, NoopReason::NotEditing);
        };
        let abandoned_gesture = abandon_gesture(&session.gesture, surface);
        self.model.restore(session.snapshot);
        for (panel, rect) in self.model.iter() {
            surface.draw_panel(panel, rect);
        }
        surface.set_edit_mode(false);
        let restored_hash = self.model.state_hash();
        self.finish(
            from,
            EditorEffect::EditCanceled {
                restored_hash,
                abandoned_gesture,
            },
        )
    }

    /// Idle → Dragging `panel`. The anchor is the pointer's offset from the
    /// panel's rendered top-left pixel.
    pub fn begin_drag(
        &mut self,
        panel: &PanelId,
        pointer: PointerPosition,
        canvas: &CanvasBounds,
        surface: &mut dyn LayoutSurface,
    ) -> Result<EditorTransition, LayoutError> {
        self.start_gesture(panel, pointer, 0, canvas, GestureKind::Drag, surface)
    }

    /// Recompute the drag candidate from an absolute pointer position.
    pub fn update_drag(
        &mut self,
        pointer: PointerPosition,
        canvas: &CanvasBounds,
        surface: &mut dyn LayoutSurface,
    ) -> EditorTransition {
        let from = self.state();
        let effect = match self.session.as_mut().map(|session| &mut session.gesture) {
            None => EditorEffect::Noop {
                reason: NoopReason::NotEditing,
            },
            Some(Gesture::Dragging(drag)) => {
                let (col, row) = canvas.pixel_to_cell(pointer - drag.anchor);
                let candidate = drag.committed.with_origin(col, row);
                offer_candidate(&self.model, &drag.panel, &mut drag.ghost, candidate, surface)
            }
            Some(_) => EditorEffect::Noop {
                reason: NoopReason::NoActiveDrag,
            },
        };
        self.finish(from, effect)
    }

    /// Dragging → Idle, committing the last legal candidate if there was one.
    pub fn end_drag(
        &mut self,
        surface: &mut dyn LayoutSurface,
    ) -> Result<EditorTransition, LayoutError> {
        let from = self.state();
        let drag = match self.take_gesture(GestureKind::Drag) {
            Ok(Gesture::Dragging(drag)) => drag,
            Ok(_) => return Ok(self.noop(from, NoopReason::NoActiveDrag)),
            Err(reason) => return Ok(self.noop(from, reason)),
        };
        let effect = self.release(drag.panel, &drag.ghost, surface)?;
        Ok(self.finish(from, effect))
    }

    /// Idle → Resizing `panel` from `pointer`.
    pub fn begin_resize(
        &mut self,
        panel: &PanelId,
        pointer: PointerPosition,
        canvas: &CanvasBounds,
        surface: &mut dyn LayoutSurface,
    ) -> Result<EditorTransition, LayoutError> {
        self.start_gesture(panel, pointer, 0, canvas, GestureKind::Resize, surface)
    }

    /// Recompute the resize candidate from an absolute pointer position.
    ///
    /// The pixel delta from the resize origin is rounded to whole cells and
    /// added to the starting spans; spans below the minimum become exactly
    /// the minimum before validation.
    pub fn update_resize(
        &mut self,
        pointer: PointerPosition,
        canvas: &CanvasBounds,
        surface: &mut dyn LayoutSurface,
    ) -> EditorTransition {
        let from = self.state();
        let effect = match self.session.as_mut().map(|session| &mut session.gesture) {
            None => EditorEffect::Noop {
                reason: NoopReason::NotEditing,
            },
            Some(Gesture::Resizing(resize)) => {
                let (dw, dh) = canvas.cells_from_delta(pointer - resize.origin);
                let candidate = resize.committed.with_size(
                    grow_span(resize.committed.w, dw),
                    grow_span(resize.committed.h, dh),
                );
                offer_candidate(
                    &self.model,
                    &resize.panel,
                    &mut resize.ghost,
                    candidate,
                    surface,
                )
            }
            Some(_) => EditorEffect::Noop {
                reason: NoopReason::NoActiveResize,
            },
        };
        self.finish(from, effect)
    }

    /// Resizing → Idle, committing the last legal size if there was one.
    pub fn end_resize(
        &mut self,
        surface: &mut dyn LayoutSurface,
    ) -> Result<EditorTransition, LayoutError> {
        let from = self.state();
        let resize = match self.take_gesture(GestureKind::Resize) {
            Ok(Gesture::Resizing(resize)) => resize,
            Ok(_) => return Ok(self.noop(from, NoopReason::NoActiveResize)),
            Err(reason) => return Ok(self.noop(from, reason)),
        };
        let effect = self.release(resize.panel, &resize.ghost, surface)?;
        Ok(self.finish(from, effect))
    }

    /// Route one input to the operation the current state allows.
    ///
    /// Pointer-down hit-tests the canvas: the resize grip starts a resize,
    /// the rest of a panel starts a drag. Moves and releases follow whichever
    /// gesture is active and are ignored when they come from another pointer.
    pub fn handle_event(
        &mut self,
        event: &InputEvent,
        canvas: &CanvasBounds,
        surface: &mut dyn LayoutSurface,
        sink: &mut dyn LayoutSink,
    ) -> Result<EditorTransition, LayoutError> {
        match *event {
            InputEvent::Command(LayoutCommand::EnterEdit) => Ok(self.enter_edit_mode(surface)),
            InputEvent::Command(LayoutCommand::Apply) => Ok(self.apply_edit(surface, sink)),
            InputEvent::Command(LayoutCommand::Cancel) => Ok(self.cancel_edit(surface)),
            InputEvent::Pointer(pointer) => self.handle_pointer(pointer, canvas, surface),
        }
    }

    fn handle_pointer(
        &mut self,
        event: PointerEvent,
        canvas: &CanvasBounds,
        surface: &mut dyn LayoutSurface,
    ) -> Result<EditorTransition, LayoutError> {
        let from = self.state();
        if event.kind == PointerEventKind::Down {
            if let Some(reason) = self.start_blocker() {
                return Ok(self.noop(from, reason));
            }
            let Some((panel, region)) = hit_test(&self.model, event.position, canvas) else {
                return Ok(self.noop(from, NoopReason::NoPanelUnderPointer));
            };
            let kind = match region {
                PanelRegion::Body => GestureKind::Drag,
                PanelRegion::ResizeHandle => GestureKind::Resize,
            };
            return self.start_gesture(
                &panel,
                event.position,
                event.pointer_id,
                canvas,
                kind,
                surface,
            );
        }

        let Some(session) = &self.session else {
            return Ok(self.noop(from, NoopReason::NotEditing));
        };
        match session.gesture.pointer_id() {
            None => return Ok(self.noop(from, NoopReason::NoActiveGesture)),
            Some(active) if active != event.pointer_id => {
                return Ok(self.noop(from, NoopReason::PointerMismatch));
            }
            Some(_) => {}
        }
        let dragging = matches!(from, EditorState::Dragging { .. });
        match (event.kind, dragging) {
            (PointerEventKind::Move, true) => Ok(self.update_drag(event.position, canvas, surface)),
            (PointerEventKind::Move, false) => {
                Ok(self.update_resize(event.position, canvas, surface))
            }
            (_, true) => self.end_drag(surface),
            (_, false) => self.end_resize(surface),
        }
    }

    fn start_blocker(&self) -> Option<NoopReason> {
        match &self.session {
            None => Some(NoopReason::NotEditing),
            Some(session) if !matches!(session.gesture, Gesture::Idle) => {
                Some(NoopReason::GestureInProgress)
            }
            Some(_) => None,
        }
    }

    fn start_gesture(
        &mut self,
        panel: &PanelId,
        pointer: PointerPosition,
        pointer_id: u32,
        canvas: &CanvasBounds,
        kind: GestureKind,
        surface: &mut dyn LayoutSurface,
    ) -> Result<EditorTransition, LayoutError> {
        let from = self.state();
        if let Some(reason) = self.start_blocker() {
            return Ok(self.noop(from, reason));
        }
        let committed = self.model.get(panel)?;
        let ghost = GhostLayer::new(committed);
        let (gesture, effect) = match kind {
            GestureKind::Drag => {
                let anchor = pointer - canvas.cell_origin(committed.col, committed.row);
                (
                    Gesture::Dragging(DragGesture {
                        panel: panel.clone(),
                        pointer_id,
                        committed,
                        anchor,
                        ghost,
                    }),
                    EditorEffect::DragStarted {
                        panel: panel.clone(),
                        anchor,
                        ghost: committed,
                    },
                )
            }
            GestureKind::Resize => (
                Gesture::Resizing(ResizeGesture {
                    panel: panel.clone(),
                    pointer_id,
                    committed,
                    origin: pointer,
                    ghost,
                }),
                EditorEffect::ResizeStarted {
                    panel: panel.clone(),
                    origin: pointer,
                    ghost: committed,
                },
            ),
        };
        if let Some(session) = self.session.as_mut() {
            session.gesture = gesture;
        }
        surface.draw_ghost(panel, committed);
        Ok(self.finish(from, effect))
    }

    /// Detach the active gesture if it is of `kind`; otherwise leave the
    /// session untouched.
    fn take_gesture(&mut self, kind: GestureKind) -> Result<Gesture, NoopReason> {
        let session = self.session.as_mut().ok_or(NoopReason::NotEditing)?;
        let matches_kind = match (&session.gesture, kind) {
            (Gesture::Dragging(_), GestureKind::Drag) => true,
            (Gesture::Resizing(_), GestureKind::Resize) => true,
            _ => false,
        };
        if !matches_kind {
            return Ok(Gesture::Idle);
        }
        Ok(std::mem::replace(&mut session.gesture, Gesture::Idle))
    }

    fn release(
        &mut self,
        panel: PanelId,
        ghost: &GhostLayer,
        surface: &mut dyn LayoutSurface,
    ) -> Result<EditorEffect, LayoutError> {
        surface.clear_ghost();
        let Some(rect) = ghost.last_valid() else {
            return Ok(EditorEffect::Released { panel });
        };
        let previous = self.model.set(&panel, rect)?;
        if previous != rect {
            surface.draw_panel(&panel, rect);
        }
        Ok(EditorEffect::Committed {
            panel,
            from: previous,
            to: rect,
        })
    }

    fn active_ghost(&self) -> Option<&GhostLayer> {
        self.session
            .as_ref()
            .and_then(|session| session.gesture.ghost())
    }

    fn noop(&mut self, from: EditorState, reason: NoopReason) -> EditorTransition {
        self.finish(from, EditorEffect::Noop { reason })
    }

    fn finish(&mut self, from: EditorState, effect: EditorEffect) -> EditorTransition {
        self.transition_counter = self.transition_counter.saturating_add(1);
        let transition = EditorTransition {
            transition_id: self.transition_counter,
            from,
            to: self.state(),
            effect,
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(
            message = "editor.transition",
            transition_id = transition.transition_id,
            from = ?transition.from,
            to = ?transition.to,
            effect = ?transition.effect,
            layout_hash = self.model.state_hash()
        );
        transition
    }
}

fn offer_candidate(
    model: &GridModel,
    panel: &PanelId,
    ghost: &mut GhostLayer,
    candidate: GridRect,
    surface: &mut dyn LayoutSurface,
) -> EditorEffect {
    let verdict = check_placement(panel, candidate, model);
    match ghost.offer(candidate, verdict) {
        GhostUpdate::Moved(rect) => {
            surface.draw_ghost(panel, rect);
            EditorEffect::GhostMoved {
                panel: panel.clone(),
                ghost: rect,
            }
        }
        GhostUpdate::Unchanged => EditorEffect::GhostUnchanged {
            panel: panel.clone(),
        },
        GhostUpdate::Held(rejection) => {
            #[cfg(feature = "tracing")]
            tracing::trace!(
                message = "editor.placement_rejected",
                panel = %panel,
                candidate = %candidate,
                rejection = %rejection
            );
            surface.placement_rejected(panel, candidate, &rejection);
            EditorEffect::GhostHeld {
                panel: panel.clone(),
                candidate,
                rejection,
            }
        }
    }
}

fn abandon_gesture(gesture: &Gesture, surface: &mut dyn LayoutSurface) -> bool {
    if matches!(gesture, Gesture::Idle) {
        return false;
    }
    surface.clear_ghost();
    true
}

fn grow_span(start: u16, delta: i32) -> u16 {
    let span = (i64::from(start) + i64::from(delta)).max(i64::from(MIN_PANEL_SPAN));
    u16::try_from(span).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{MemorySink, NullSurface};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Draw {
        Panel(PanelId, GridRect),
        Ghost(PanelId, GridRect),
        ClearGhost,
        EditMode(bool),
        Rejected(PanelId, GridRect),
    }

    #[derive(Debug, Default)]
    struct RecordingSurface {
        calls: Vec<Draw>,
    }

    impl RecordingSurface {
        fn take(&mut self) -> Vec<Draw> {
            std::mem::take(&mut self.calls)
        }
    }

    impl LayoutSurface for RecordingSurface {
        fn draw_panel(&mut self, panel: &PanelId, rect: GridRect) {
            self.calls.push(Draw::Panel(panel.clone(), rect));
        }

        fn draw_ghost(&mut self, panel: &PanelId, rect: GridRect) {
            self.calls.push(Draw::Ghost(panel.clone(), rect));
        }

        fn clear_ghost(&mut self) {
            self.calls.push(Draw::ClearGhost);
        }

        fn set_edit_mode(&mut self, editing: bool) {
            self.calls.push(Draw::EditMode(editing));
        }

        fn placement_rejected(
            &mut self,
            panel: &PanelId,
            candidate: GridRect,
            _rejection: &PlacementRejection,
        ) {
            self.calls.push(Draw::Rejected(panel.clone(), candidate));
        }
    }

    fn id(raw: &str) -> PanelId {
        PanelId::new(raw)
    }

    fn canvas() -> CanvasBounds {
        CanvasBounds::from_size(1200, 1200).expect("valid canvas")
    }

    fn at(x: i32, y: i32) -> PointerPosition {
        PointerPosition::new(x, y)
    }

    fn two_panels() -> LayoutEditor {
        LayoutEditor::new(
            GridModel::new([
                (id("A"), GridRect::new(1, 1, 6, 6)),
                (id("B"), GridRect::new(7, 1, 6, 6)),
            ])
            .expect("valid model"),
        )
    }

    fn editing(mut editor: LayoutEditor) -> LayoutEditor {
        editor.enter_edit_mode(&mut NullSurface);
        editor
    }

    #[test]
    fn starts_viewing_and_ignores_gestures() {
        let mut editor = two_panels();
        assert_eq!(editor.view_mode(), ViewMode::Viewing);
        let t = editor
            .begin_drag(&id("A"), at(50, 50), &canvas(), &mut NullSurface)
            .expect("begin");
        assert_eq!(
            t.effect,
            EditorEffect::Noop {
                reason: NoopReason::NotEditing
            }
        );
        assert_eq!(t.to, EditorState::Viewing);
    }

    #[test]
    fn enter_edit_takes_snapshot_and_shows_affordances() {
        let mut editor = two_panels();
        let mut surface = RecordingSurface::default();
        let t = editor.enter_edit_mode(&mut surface);
        assert_eq!(t.from, EditorState::Viewing);
        assert_eq!(t.to, EditorState::Idle);
        assert_eq!(surface.take(), vec![Draw::EditMode(true)]);
        assert_eq!(
            editor.session_snapshot().map(LayoutSnapshot::state_hash),
            Some(editor.model().state_hash())
        );

        let again = editor.enter_edit_mode(&mut surface);
        assert_eq!(
            again.effect,
            EditorEffect::Noop {
                reason: NoopReason::AlreadyEditing
            }
        );
    }

    #[test]
    fn drag_into_neighbor_keeps_ghost_home() {
        let mut editor = editing(two_panels());
        let mut surface = RecordingSurface::default();
        editor
            .begin_drag(&id("A"), at(50, 50), &canvas(), &mut surface)
            .expect("begin");
        assert_eq!(surface.take(), vec![Draw::Ghost(id("A"), GridRect::new(1, 1, 6, 6))]);

        // Top-left lands on column 4: cols 4..=9 collide with B at 7..=12.
        let t = editor.update_drag(at(350, 50), &canvas(), &mut surface);
        assert_eq!(
            t.effect,
            EditorEffect::GhostHeld {
                panel: id("A"),
                candidate: GridRect::new(4, 1, 6, 6),
                rejection: PlacementRejection::Overlap { with: id("B") },
            }
        );
        assert_eq!(surface.take(), vec![Draw::Rejected(id("A"), GridRect::new(4, 1, 6, 6))]);
        assert_eq!(editor.ghost(), Some(GridRect::new(1, 1, 6, 6)));
        assert_eq!(editor.last_valid_candidate(), None);

        let t = editor.end_drag(&mut surface).expect("end");
        assert_eq!(t.effect, EditorEffect::Released { panel: id("A") });
        assert_eq!(editor.model().get(&id("A")), Ok(GridRect::new(1, 1, 6, 6)));
        assert_eq!(surface.take(), vec![Draw::ClearGhost]);
    }

    #[test]
    fn drag_into_free_space_commits_on_release() {
        let mut editor = editing(two_panels());
        let mut surface = RecordingSurface::default();
        editor
            .begin_drag(&id("A"), at(50, 50), &canvas(), &mut surface)
            .expect("begin");
        let t = editor.update_drag(at(50, 650), &canvas(), &mut surface);
        assert_eq!(
            t.effect,
            EditorEffect::GhostMoved {
                panel: id("A"),
                ghost: GridRect::new(1, 7, 6, 6),
            }
        );
        // Still uncommitted mid-gesture.
        assert_eq!(editor.model().get(&id("A")), Ok(GridRect::new(1, 1, 6, 6)));

        surface.take();
        let t = editor.end_drag(&mut surface).expect("end");
        assert_eq!(
            t.effect,
            EditorEffect::Committed {
                panel: id("A"),
                from: GridRect::new(1, 1, 6, 6),
                to: GridRect::new(1, 7, 6, 6),
            }
        );
        assert_eq!(t.to, EditorState::Idle);
        assert_eq!(editor.model().get(&id("A")), Ok(GridRect::new(1, 7, 6, 6)));
        assert_eq!(
            surface.take(),
            vec![Draw::ClearGhost, Draw::Panel(id("A"), GridRect::new(1, 7, 6, 6))]
        );
    }

    #[test]
    fn sticky_ghost_survives_trailing_invalid_moves() {
        let mut editor = editing(two_panels());
        let mut surface = NullSurface;
        editor
            .begin_drag(&id("A"), at(50, 50), &canvas(), &mut surface)
            .expect("begin");
        editor.update_drag(at(50, 350), &canvas(), &mut surface);
        for x in [350, 450, 550, 650, 5000] {
            editor.update_drag(at(x, 50), &canvas(), &mut surface);
        }
        assert_eq!(editor.ghost(), Some(GridRect::new(1, 4, 6, 6)));
        let t = editor.end_drag(&mut surface).expect("end");
        assert_eq!(
            t.effect,
            EditorEffect::Committed {
                panel: id("A"),
                from: GridRect::new(1, 1, 6, 6),
                to: GridRect::new(1, 4, 6, 6),
            }
        );
    }

    #[test]
    fn repeated_moves_are_idempotent() {
        let mut editor = editing(two_panels());
        let mut surface = RecordingSurface::default();
        editor
            .begin_drag(&id("A"), at(50, 50), &canvas(), &mut surface)
            .expect("begin");
        surface.take();
        editor.update_drag(at(50, 650), &canvas(), &mut surface);
        let t = editor.update_drag(at(50, 650), &canvas(), &mut surface);
        assert_eq!(t.effect, EditorEffect::GhostUnchanged { panel: id("A") });
        assert_eq!(surface.take().len(), 1, "only the first move redraws");
    }

    #[test]
    fn anchor_keeps_grab_point() {
        let mut editor = editing(two_panels());
        let mut surface = NullSurface;
        // Grab B near its right edge; B's top-left pixel is (600, 0).
        let t = editor
            .begin_drag(&id("B"), at(1150, 20), &canvas(), &mut surface)
            .expect("begin");
        assert!(matches!(
            t.effect,
            EditorEffect::DragStarted { anchor, .. } if anchor == PixelOffset::new(550, 20)
        ));
        editor.update_drag(at(1150, 620), &canvas(), &mut surface);
        assert_eq!(editor.ghost(), Some(GridRect::new(7, 7, 6, 6)));
    }

    #[test]
    fn resize_grows_by_rounded_cells() {
        let mut editor = editing(LayoutEditor::new(
            GridModel::new([(id("A"), GridRect::new(1, 1, 6, 6))]).expect("model"),
        ));
        let mut surface = NullSurface;
        editor
            .begin_resize(&id("A"), at(590, 590), &canvas(), &mut surface)
            .expect("begin");
        let t = editor.update_resize(at(690, 690), &canvas(), &mut surface);
        assert_eq!(
            t.effect,
            EditorEffect::GhostMoved {
                panel: id("A"),
                ghost: GridRect::new(1, 1, 7, 7),
            }
        );
        editor.end_resize(&mut surface).expect("end");
        assert_eq!(editor.model().get(&id("A")), Ok(GridRect::new(1, 1, 7, 7)));
    }

    #[test]
    fn resize_below_minimum_is_clamped_not_rejected() {
        let mut editor = editing(two_panels());
        let mut surface = NullSurface;
        editor
            .begin_resize(&id("A"), at(590, 590), &canvas(), &mut surface)
            .expect("begin");
        let t = editor.update_resize(at(-4000, -4000), &canvas(), &mut surface);
        assert_eq!(
            t.effect,
            EditorEffect::GhostMoved {
                panel: id("A"),
                ghost: GridRect::new(1, 1, 2, 2),
            }
        );
    }

    #[test]
    fn resize_into_neighbor_is_held() {
        let mut editor = editing(two_panels());
        let mut surface = NullSurface;
        editor
            .begin_resize(&id("A"), at(590, 590), &canvas(), &mut surface)
            .expect("begin");
        editor.update_resize(at(590, 790), &canvas(), &mut surface);
        assert_eq!(editor.ghost(), Some(GridRect::new(1, 1, 6, 8)));
        let t = editor.update_resize(at(690, 790), &canvas(), &mut surface);
        assert!(matches!(t.effect, EditorEffect::GhostHeld { .. }));
        editor.end_resize(&mut surface).expect("end");
        assert_eq!(editor.model().get(&id("A")), Ok(GridRect::new(1, 1, 6, 8)));
    }

    #[test]
    fn only_one_gesture_at_a_time() {
        let mut editor = editing(two_panels());
        let mut surface = NullSurface;
        editor
            .begin_resize(&id("A"), at(590, 590), &canvas(), &mut surface)
            .expect("begin");
        let t = editor
            .begin_drag(&id("B"), at(650, 50), &canvas(), &mut surface)
            .expect("second begin");
        assert_eq!(
            t.effect,
            EditorEffect::Noop {
                reason: NoopReason::GestureInProgress
            }
        );
        let t = editor.update_drag(at(650, 650), &canvas(), &mut surface);
        assert_eq!(
            t.effect,
            EditorEffect::Noop {
                reason: NoopReason::NoActiveDrag
            }
        );
        let t = editor.end_drag(&mut surface).expect("end drag");
        assert_eq!(
            t.effect,
            EditorEffect::Noop {
                reason: NoopReason::NoActiveDrag
            }
        );
        assert_eq!(editor.state(), EditorState::Resizing { panel: id("A") });
    }

    #[test]
    fn unknown_panel_is_an_error() {
        let mut editor = editing(two_panels());
        let err = editor
            .begin_drag(&id("nope"), at(0, 0), &canvas(), &mut NullSurface)
            .expect_err("unknown panel");
        assert_eq!(err, LayoutError::UnknownPanel { panel: id("nope") });
        assert_eq!(editor.state(), EditorState::Idle);
    }

    #[test]
    fn cancel_restores_pre_session_layout() {
        let mut editor = two_panels();
        let before = editor.model().clone();
        let mut surface = RecordingSurface::default();
        editor.enter_edit_mode(&mut surface);
        editor
            .begin_drag(&id("A"), at(50, 50), &canvas(), &mut surface)
            .expect("begin");
        editor.update_drag(at(50, 650), &canvas(), &mut surface);
        editor.end_drag(&mut surface).expect("end");
        editor
            .begin_resize(&id("B"), at(1190, 590), &canvas(), &mut surface)
            .expect("begin");
        editor.update_resize(at(1190, 790), &canvas(), &mut surface);
        editor.end_resize(&mut surface).expect("end");
        assert_ne!(editor.model(), &before);

        surface.take();
        let t = editor.cancel_edit(&mut surface);
        assert_eq!(editor.model(), &before);
        assert_eq!(
            t.effect,
            EditorEffect::EditCanceled {
                restored_hash: before.state_hash(),
                abandoned_gesture: false,
            }
        );
        assert_eq!(
            surface.take(),
            vec![
                Draw::Panel(id("A"), GridRect::new(1, 1, 6, 6)),
                Draw::Panel(id("B"), GridRect::new(7, 1, 6, 6)),
                Draw::EditMode(false),
            ]
        );
        assert_eq!(editor.view_mode(), ViewMode::Viewing);
    }

    #[test]
    fn enter_then_cancel_is_identity() {
        let mut editor = two_panels();
        let before = editor.model().clone();
        editor.enter_edit_mode(&mut NullSurface);
        editor.cancel_edit(&mut NullSurface);
        assert_eq!(editor.model(), &before);
        assert_eq!(editor.model().state_hash(), before.state_hash());
    }

    #[test]
    fn apply_saves_and_leaves_edit_mode() {
        let mut editor = editing(two_panels());
        let mut sink = MemorySink::default();
        editor
            .begin_drag(&id("A"), at(50, 50), &canvas(), &mut NullSurface)
            .expect("begin");
        editor.update_drag(at(50, 650), &canvas(), &mut NullSurface);
        editor.end_drag(&mut NullSurface).expect("end");
        let t = editor.apply_edit(&mut NullSurface, &mut sink);
        assert!(matches!(
            t.effect,
            EditorEffect::EditApplied {
                abandoned_gesture: false,
                ..
            }
        ));
        assert_eq!(t.to, EditorState::Viewing);
        let saved = sink.last().expect("saved layout");
        assert_eq!(saved.get(&id("A")), Some(&GridRect::new(1, 7, 6, 6)));
        assert_eq!(saved.len(), 2);
        assert!(editor.session_snapshot().is_none());

        let model = editor.into_model();
        assert_eq!(&model.to_persistable(), saved);
    }

    #[test]
    fn apply_outside_edit_mode_is_noop() {
        let mut editor = two_panels();
        let mut sink = MemorySink::default();
        let t = editor.apply_edit(&mut NullSurface, &mut sink);
        assert_eq!(
            t.effect,
            EditorEffect::Noop {
                reason: NoopReason::NotEditing
            }
        );
        assert!(sink.saved().is_empty());
        let t = editor.cancel_edit(&mut NullSurface);
        assert_eq!(
            t.effect,
            EditorEffect::Noop {
                reason: NoopReason::NotEditing
            }
        );
    }

    #[test]
    fn apply_mid_gesture_drops_uncommitted_ghost() {
        let mut editor = editing(two_panels());
        let mut surface = RecordingSurface::default();
        let mut sink = MemorySink::default();
        editor
            .begin_drag(&id("A"), at(50, 50), &canvas(), &mut surface)
            .expect("begin");
        editor.update_drag(at(50, 650), &canvas(), &mut surface);
        surface.take();
        let t = editor.apply_edit(&mut surface, &mut sink);
        assert!(matches!(
            t.effect,
            EditorEffect::EditApplied {
                abandoned_gesture: true,
                ..
            }
        ));
        assert_eq!(surface.take(), vec![Draw::ClearGhost, Draw::EditMode(false)]);
        assert_eq!(
            sink.last().and_then(|layout| layout.get(&id("A")).copied()),
            Some(GridRect::new(1, 1, 6, 6))
        );
    }

    #[test]
    fn handle_event_dispatches_by_hit_region() {
        let mut editor = two_panels();
        let mut sink = MemorySink::default();
        let canvas = canvas();
        let mut run = |editor: &mut LayoutEditor, event: InputEvent| {
            editor
                .handle_event(&event, &canvas, &mut NullSurface, &mut sink)
                .expect("event")
        };

        let t = run(&mut editor, InputEvent::pointer(PointerEventKind::Down, 50, 50));
        assert_eq!(
            t.effect,
            EditorEffect::Noop {
                reason: NoopReason::NotEditing
            }
        );

        run(&mut editor, InputEvent::command(LayoutCommand::EnterEdit));
        // Bottom-right grip of A spans pixels 584..600.
        let t = run(&mut editor, InputEvent::pointer(PointerEventKind::Down, 595, 595));
        assert!(matches!(t.effect, EditorEffect::ResizeStarted { .. }));
        run(&mut editor, InputEvent::pointer(PointerEventKind::Move, 595, 795));
        let t = run(&mut editor, InputEvent::pointer(PointerEventKind::Up, 595, 795));
        assert_eq!(
            t.effect,
            EditorEffect::Committed {
                panel: id("A"),
                from: GridRect::new(1, 1, 6, 6),
                to: GridRect::new(1, 1, 6, 8),
            }
        );

        let t = run(&mut editor, InputEvent::pointer(PointerEventKind::Down, 700, 100));
        assert!(matches!(t.effect, EditorEffect::DragStarted { .. }));
        run(&mut editor, InputEvent::pointer(PointerEventKind::Move, 700, 700));
        run(&mut editor, InputEvent::pointer(PointerEventKind::Up, 700, 700));
        assert_eq!(editor.model().get(&id("B")), Ok(GridRect::new(7, 7, 6, 6)));

        let t = run(&mut editor, InputEvent::pointer(PointerEventKind::Down, 50, 1150));
        assert_eq!(
            t.effect,
            EditorEffect::Noop {
                reason: NoopReason::NoPanelUnderPointer
            }
        );
        let t = run(&mut editor, InputEvent::pointer(PointerEventKind::Move, 50, 1150));
        assert_eq!(
            t.effect,
            EditorEffect::Noop {
                reason: NoopReason::NoActiveGesture
            }
        );

        run(&mut editor, InputEvent::command(LayoutCommand::Apply));
        assert_eq!(editor.view_mode(), ViewMode::Viewing);
        assert_eq!(sink.saved().len(), 1);
    }

    #[test]
    fn foreign_pointer_is_ignored() {
        let mut editor = editing(two_panels());
        let mut sink = MemorySink::default();
        let canvas = canvas();
        let down = InputEvent::Pointer(
            PointerEvent::new(PointerEventKind::Down, at(50, 50)).with_pointer_id(1),
        );
        editor
            .handle_event(&down, &canvas, &mut NullSurface, &mut sink)
            .expect("down");
        let stray = InputEvent::Pointer(
            PointerEvent::new(PointerEventKind::Up, at(50, 650)).with_pointer_id(2),
        );
        let t = editor
            .handle_event(&stray, &canvas, &mut NullSurface, &mut sink)
            .expect("stray");
        assert_eq!(
            t.effect,
            EditorEffect::Noop {
                reason: NoopReason::PointerMismatch
            }
        );
        assert_eq!(editor.state(), EditorState::Dragging { panel: id("A") });
    }

    #[test]
    fn transition_ids_are_monotonic() {
        let mut editor = two_panels();
        let first = editor.enter_edit_mode(&mut NullSurface);
        let second = editor.cancel_edit(&mut NullSurface);
        let third = editor.cancel_edit(&mut NullSurface);
        assert_eq!(
            [first.transition_id, second.transition_id, third.transition_id],
            [1, 2, 3]
        );
    }

    #[test]
    fn transition_serializes_with_tags() {
        let mut editor = two_panels();
        let t = editor.enter_edit_mode(&mut NullSurface);
        let value = serde_json::to_value(&t).expect("serialize");
        assert_eq!(value["from"]["state"], "viewing");
        assert_eq!(value["to"]["state"], "idle");
        assert_eq!(value["effect"]["effect"], "edit_entered");
    }

    #[cfg(feature = "tracing")]
    mod tracing_capture {
        use super::*;
        use std::sync::{Arc, Mutex};
        use tracing::Subscriber;
        use tracing_subscriber::Layer;
        use tracing_subscriber::layer::{Context, SubscriberExt};

        #[derive(Default)]
        struct Seen {
            messages: Vec<String>,
        }

        struct Capture {
            seen: Arc<Mutex<Seen>>,
        }

        impl<S: Subscriber> Layer<S> for Capture {
            fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
                struct MessageVisitor(Option<String>);
                impl tracing::field::Visit for MessageVisitor {
                    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                        if field.name() == "message" {
                            self.0 = Some(value.to_string());
                        }
                    }

                    fn record_debug(
                        &mut self,
                        field: &tracing::field::Field,
                        value: &dyn std::fmt::Debug,
                    ) {
                        if field.name() == "message" {
                            self.0 = Some(format!("{value:?}").trim_matches('"').to_string());
                        }
                    }
                }
                let mut visitor = MessageVisitor(None);
                event.record(&mut visitor);
                if let Some(message) = visitor.0 {
                    self.seen
                        .lock()
                        .expect("capture lock")
                        .messages
                        .push(message);
                }
            }
        }

        #[test]
        fn rejection_and_transitions_are_traced() {
            let seen = Arc::new(Mutex::new(Seen::default()));
            let subscriber = tracing_subscriber::registry().with(Capture {
                seen: Arc::clone(&seen),
            });
            let _guard = tracing::subscriber::set_default(subscriber);
            tracing::callsite::rebuild_interest_cache();

            let mut editor = editing(two_panels());
            editor
                .begin_drag(&id("A"), at(50, 50), &canvas(), &mut NullSurface)
                .expect("begin");
            editor.update_drag(at(350, 50), &canvas(), &mut NullSurface);

            let seen = seen.lock().expect("capture lock");
            assert!(seen.messages.iter().any(|m| m == "editor.transition"));
            assert!(
                seen.messages
                    .iter()
                    .any(|m| m == "editor.placement_rejected")
            );
        }
    }
}
