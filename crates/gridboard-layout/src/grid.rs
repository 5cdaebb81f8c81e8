//! Committed grid model: panel identity → rectangle.
//!
//! The panel set is fixed when the model is built. After construction the
//! model only ever changes through [`GridModel::set`] (one validated commit)
//! or [`GridModel::restore`] (bulk rollback to a snapshot). Neither re-runs
//! placement validation; legality is decided once, by
//! [`crate::placement::check_placement`], before a commit is attempted.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use gridboard_core::geometry::GridRect;
use serde::{Deserialize, Serialize};

/// Stable identifier of one dashboard panel.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelId(String);

impl PanelId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PanelId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for PanelId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Key-ordered id → rectangle mapping, the persisted form of a layout.
pub type LayoutMap = BTreeMap<PanelId, GridRect>;

/// Deep copy of every committed rectangle at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutSnapshot {
    rects: LayoutMap,
}

impl LayoutSnapshot {
    /// Rectangle recorded for `panel`, if it was part of the model.
    #[must_use]
    pub fn get(&self, panel: &PanelId) -> Option<GridRect> {
        self.rects.get(panel).copied()
    }

    #[must_use]
    pub fn state_hash(&self) -> u64 {
        hash_rects(&self.rects)
    }
}

/// One violated structural invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutIssue {
    OutOfBounds { panel: PanelId, rect: GridRect },
    BelowMinimumSize { panel: PanelId, rect: GridRect },
    Overlap { first: PanelId, second: PanelId },
}

impl fmt::Display for LayoutIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { panel, rect } => {
                write!(f, "panel {panel} at {rect} leaves the 12x12 canvas")
            }
            Self::BelowMinimumSize { panel, rect } => {
                write!(f, "panel {panel} at {rect} is below the minimum 2x2 size")
            }
            Self::Overlap { first, second } => {
                write!(f, "panels {first} and {second} overlap")
            }
        }
    }
}

/// Grid model construction and lookup errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// A lookup or commit named a panel outside the fixed set.
    UnknownPanel { panel: PanelId },
    DuplicatePanel { panel: PanelId },
    EmptyPanelSet,
    /// Default synthesis cannot place this many panels on the canvas.
    TooManyPanels { count: usize, max: usize },
    InvariantViolation(LayoutIssue),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPanel { panel } => write!(f, "unknown panel {panel}"),
            Self::DuplicatePanel { panel } => write!(f, "panel {panel} listed more than once"),
            Self::EmptyPanelSet => write!(f, "panel set must not be empty"),
            Self::TooManyPanels { count, max } => {
                write!(f, "{count} panels do not fit the default layout (max {max})")
            }
            Self::InvariantViolation(issue) => write!(f, "layout invariant violated: {issue}"),
        }
    }
}

impl std::error::Error for LayoutError {}

/// Authoritative committed layout for a fixed panel set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridModel {
    order: Vec<PanelId>,
    rects: LayoutMap,
}

impl GridModel {
    /// Build a model from `(id, rect)` pairs in startup order.
    ///
    /// Rejects empty and duplicate panel sets and any layout that breaks the
    /// bounds, minimum-size, or no-overlap invariants.
    pub fn new(entries: impl IntoIterator<Item = (PanelId, GridRect)>) -> Result<Self, LayoutError> {
        let mut order = Vec::new();
        let mut rects = LayoutMap::new();
        for (panel, rect) in entries {
            if rects.insert(panel.clone(), rect).is_some() {
                return Err(LayoutError::DuplicatePanel { panel });
            }
            order.push(panel);
        }
        if order.is_empty() {
            return Err(LayoutError::EmptyPanelSet);
        }
        let model = Self { order, rects };
        if let Some(issue) = model.invariant_issues().into_iter().next() {
            return Err(LayoutError::InvariantViolation(issue));
        }
        Ok(model)
    }

    /// Committed rectangle for `panel`.
    pub fn get(&self, panel: &PanelId) -> Result<GridRect, LayoutError> {
        self.rects
            .get(panel)
            .copied()
            .ok_or_else(|| LayoutError::UnknownPanel {
                panel: panel.clone(),
            })
    }

    /// Overwrite the committed rectangle for `panel`, returning the previous
    /// one. The caller must already have validated `rect`.
    pub fn set(&mut self, panel: &PanelId, rect: GridRect) -> Result<GridRect, LayoutError> {
        let slot = self
            .rects
            .get_mut(panel)
            .ok_or_else(|| LayoutError::UnknownPanel {
                panel: panel.clone(),
            })?;
        Ok(std::mem::replace(slot, rect))
    }

    #[must_use]
    pub fn contains(&self, panel: &PanelId) -> bool {
        self.rects.contains_key(panel)
    }

    #[must_use]
    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot {
            rects: self.rects.clone(),
        }
    }

    /// Replace every committed rectangle with the snapshot's.
    ///
    /// Entries for panels outside this model's set are ignored, so a
    /// snapshot can never grow the panel set.
    pub fn restore(&mut self, snapshot: LayoutSnapshot) {
        for (panel, rect) in snapshot.rects {
            if let Some(slot) = self.rects.get_mut(&panel) {
                *slot = rect;
            }
        }
    }

    /// Full mapping for storage.
    #[must_use]
    pub fn to_persistable(&self) -> LayoutMap {
        self.rects.clone()
    }

    /// Panel ids in startup order.
    #[must_use]
    pub fn panel_ids(&self) -> &[PanelId] {
        &self.order
    }

    /// `(id, rect)` pairs in startup order.
    pub fn iter(&self) -> impl Iterator<Item = (&PanelId, GridRect)> + '_ {
        self.order
            .iter()
            .filter_map(|panel| self.rects.get(panel).map(|rect| (panel, *rect)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Deterministic hash of the committed rectangles for diagnostics.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        hash_rects(&self.rects)
    }

    /// Every bounds, minimum-size, and overlap violation, in startup order.
    #[must_use]
    pub fn invariant_issues(&self) -> Vec<LayoutIssue> {
        let mut issues = Vec::new();
        let entries: Vec<(&PanelId, GridRect)> = self.iter().collect();
        for (panel, rect) in &entries {
            if !rect.is_within_bounds() {
                issues.push(LayoutIssue::OutOfBounds {
                    panel: (*panel).clone(),
                    rect: *rect,
                });
            }
            if !rect.meets_min_size() {
                issues.push(LayoutIssue::BelowMinimumSize {
                    panel: (*panel).clone(),
                    rect: *rect,
                });
            }
        }
        for (index, (first, a)) in entries.iter().enumerate() {
            for (second, b) in &entries[index + 1..] {
                if a.overlaps(b) {
                    issues.push(LayoutIssue::Overlap {
                        first: (*first).clone(),
                        second: (*second).clone(),
                    });
                }
            }
        }
        issues
    }
}

fn hash_rects(rects: &LayoutMap) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    for (panel, rect) in rects {
        panel.hash(&mut hasher);
        rect.hash(&mut hasher);
    }
    hasher.finish()
}
