//! Scripted input replay.
//!
//! A script is a JSON array of [`InputEvent`]s. Each event goes through
//! [`LayoutEditor::handle_event`] and the resulting transition is written as
//! one JSON line, so a replay doubles as a trace of the session.

use std::fs;
use std::io::Write;
use std::path::Path;

use gridboard_core::{CanvasBounds, InputEvent};
use gridboard_layout::{EditorEffect, LayoutEditor, LayoutSink, LayoutSurface};
use serde::Serialize;

use crate::error::{GridboardError, Result};

/// Tallies of one replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub events: usize,
    pub commits: usize,
    pub rejections: usize,
    pub noops: usize,
    pub applies: usize,
    pub cancels: usize,
}

impl ReplaySummary {
    fn record(&mut self, effect: &EditorEffect) {
        self.events += 1;
        match effect {
            EditorEffect::Committed { .. } => self.commits += 1,
            EditorEffect::GhostHeld { .. } => self.rejections += 1,
            EditorEffect::Noop { .. } => self.noops += 1,
            EditorEffect::EditApplied { .. } => self.applies += 1,
            EditorEffect::EditCanceled { .. } => self.cancels += 1,
            _ => {}
        }
    }
}

/// Read a replay script.
pub fn load_script(path: &Path) -> Result<Vec<InputEvent>> {
    let raw = fs::read_to_string(path).map_err(|error| {
        GridboardError::invalid(format!("cannot read script {}: {error}", path.display()))
    })?;
    serde_json::from_str(&raw).map_err(|error| {
        GridboardError::invalid(format!("malformed script {}: {error}", path.display()))
    })
}

/// Feed `events` through `editor`, writing each transition to `out`.
pub fn replay_events(
    editor: &mut LayoutEditor,
    events: &[InputEvent],
    canvas: &CanvasBounds,
    surface: &mut dyn LayoutSurface,
    sink: &mut dyn LayoutSink,
    out: &mut dyn Write,
) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();
    for event in events {
        let transition = editor.handle_event(event, canvas, surface, sink)?;
        summary.record(&transition.effect);
        serde_json::to_writer(&mut *out, &transition)?;
        writeln!(out)?;
    }
    Ok(summary)
}
