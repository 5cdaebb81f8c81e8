//! Layout documents: decoding what the store returned and synthesizing a
//! default when it cannot be used.
//!
//! Loading never fails because of stored data. A document that is missing,
//! unparseable, incomplete, or breaks a layout invariant falls back to the
//! default grid; the [`LayoutOrigin`] of the result says which path was
//! taken. The only error is a panel set that cannot be laid out at all.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use gridboard_core::geometry::{GRID_CELLS, GridRect, MIN_PANEL_SPAN};
use serde::de::{Deserializer, IgnoredAny};
use serde::{Deserialize, Serialize};

use crate::grid::{GridModel, LayoutError, LayoutIssue, LayoutMap, PanelId};

/// Width of every panel in the default layout.
pub const DEFAULT_PANEL_SPAN: u16 = 6;

/// Panels placed side by side in each default row.
pub const DEFAULT_PANELS_PER_ROW: usize = 2;

/// Largest panel set the default layout can place.
pub const MAX_DEFAULT_PANELS: usize =
    DEFAULT_PANELS_PER_ROW * (GRID_CELLS / MIN_PANEL_SPAN) as usize;

/// One field of a stored document, decoded leniently.
///
/// A field that is present but has the wrong shape is kept as `Malformed`
/// instead of failing the whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentField<T> {
    Absent,
    Parsed(T),
    Malformed,
}

impl<T> Default for DocumentField<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> DocumentField<T> {
    #[must_use]
    pub fn parsed(&self) -> Option<&T> {
        match self {
            Self::Parsed(value) => Some(value),
            Self::Absent | Self::Malformed => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldRepr<T> {
    Parsed(T),
    Null(()),
    Malformed(IgnoredAny),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for DocumentField<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match FieldRepr::<T>::deserialize(deserializer)? {
            FieldRepr::Parsed(value) => Self::Parsed(value),
            FieldRepr::Null(()) => Self::Absent,
            FieldRepr::Malformed(IgnoredAny) => Self::Malformed,
        })
    }
}

/// Stored mapping with each rectangle decoded on its own.
pub type StoredLayout = BTreeMap<PanelId, DocumentField<GridRect>>;

/// Body of a layout load response.
///
/// Current stores write `layout`; the previous dashboard wrote only the
/// widget `order`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct LayoutDocument {
    #[serde(default)]
    pub layout: DocumentField<StoredLayout>,
    #[serde(default)]
    pub order: DocumentField<Vec<DocumentField<PanelId>>>,
}

/// Body of a layout save request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutPayload {
    pub layout: LayoutMap,
}

impl LayoutPayload {
    #[must_use]
    pub fn new(layout: LayoutMap) -> Self {
        Self { layout }
    }
}

/// Why the default layout was used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FallbackReason {
    /// The store could not be reached or returned nothing.
    Unavailable,
    /// The response body was not a JSON object.
    BodyMalformed,
    LayoutAbsent,
    LayoutMalformed,
    MissingPanel {
        panel: PanelId,
    },
    PanelMalformed {
        panel: PanelId,
    },
    Invalid {
        #[serde(serialize_with = "serialize_display")]
        issue: LayoutIssue,
    },
}

fn serialize_display<T: fmt::Display, S: serde::Serializer>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "stored layout unavailable"),
            Self::BodyMalformed => write!(f, "layout response is not a JSON object"),
            Self::LayoutAbsent => write!(f, "no stored layout"),
            Self::LayoutMalformed => write!(f, "stored layout is malformed"),
            Self::MissingPanel { panel } => write!(f, "stored layout has no entry for {panel}"),
            Self::PanelMalformed { panel } => {
                write!(f, "stored rectangle for {panel} is malformed")
            }
            Self::Invalid { issue } => write!(f, "stored layout rejected: {issue}"),
        }
    }
}

/// Where a loaded layout came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum LayoutOrigin {
    Stored {
        /// Stored ids outside the panel set, dropped on load.
        dropped: Vec<PanelId>,
    },
    /// Default grid, ordered by a stored widget order.
    LegacyOrder { recognized: usize },
    Default { reason: FallbackReason },
}

/// Model produced by a load, with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedLayout {
    pub model: GridModel,
    pub origin: LayoutOrigin,
}

impl LoadedLayout {
    /// Default grid for `panels`, recording why it was used.
    pub fn fallback(panels: &[PanelId], reason: FallbackReason) -> Result<Self, LayoutError> {
        Ok(Self {
            model: default_layout(panels)?,
            origin: LayoutOrigin::Default { reason },
        })
    }

    /// Whether the model came from the store unchanged.
    #[must_use]
    pub fn is_stored(&self) -> bool {
        matches!(self.origin, LayoutOrigin::Stored { .. })
    }
}

/// Decode a load response body for `panels`.
pub fn decode_layout(body: &str, panels: &[PanelId]) -> Result<LoadedLayout, LayoutError> {
    match serde_json::from_str::<LayoutDocument>(body) {
        Ok(document) => resolve_layout(&document, panels),
        Err(_) => {
            let loaded = LoadedLayout::fallback(panels, FallbackReason::BodyMalformed)?;
            trace_load(&loaded);
            Ok(loaded)
        }
    }
}

/// Choose between the stored layout, the legacy order, and the default.
pub fn resolve_layout(
    document: &LayoutDocument,
    panels: &[PanelId],
) -> Result<LoadedLayout, LayoutError> {
    let loaded = choose_layout(document, panels)?;
    trace_load(&loaded);
    Ok(loaded)
}

fn trace_load(loaded: &LoadedLayout) {
    #[cfg(feature = "tracing")]
    tracing::debug!(
        message = "persist.load",
        origin = ?loaded.origin,
        panels = loaded.model.len(),
        layout_hash = loaded.model.state_hash()
    );
    #[cfg(not(feature = "tracing"))]
    let _ = loaded;
}

fn choose_layout(
    document: &LayoutDocument,
    panels: &[PanelId],
) -> Result<LoadedLayout, LayoutError> {
    let reason = match &document.layout {
        DocumentField::Parsed(stored) => match stored_model(stored, panels)? {
            Ok(loaded) => return Ok(loaded),
            Err(reason) => reason,
        },
        DocumentField::Absent => FallbackReason::LayoutAbsent,
        DocumentField::Malformed => FallbackReason::LayoutMalformed,
    };

    if let DocumentField::Parsed(order) = &document.order {
        let known: HashSet<&PanelId> = panels.iter().collect();
        let mut seen = HashSet::new();
        let mut ordered: Vec<PanelId> = order
            .iter()
            .filter_map(DocumentField::parsed)
            .filter(|panel| known.contains(panel) && seen.insert(*panel))
            .cloned()
            .collect();
        let recognized = ordered.len();
        ordered.extend(panels.iter().filter(|panel| !seen.contains(panel)).cloned());
        return Ok(LoadedLayout {
            model: default_layout(&ordered)?,
            origin: LayoutOrigin::LegacyOrder { recognized },
        });
    }

    LoadedLayout::fallback(panels, reason)
}

fn stored_model(
    stored: &StoredLayout,
    panels: &[PanelId],
) -> Result<Result<LoadedLayout, FallbackReason>, LayoutError> {
    if panels.is_empty() {
        return Err(LayoutError::EmptyPanelSet);
    }
    let mut entries = Vec::with_capacity(panels.len());
    for panel in panels {
        let rect = match stored.get(panel) {
            Some(DocumentField::Parsed(rect)) => *rect,
            Some(DocumentField::Malformed) => {
                return Ok(Err(FallbackReason::PanelMalformed {
                    panel: panel.clone(),
                }));
            }
            Some(DocumentField::Absent) | None => {
                return Ok(Err(FallbackReason::MissingPanel {
                    panel: panel.clone(),
                }));
            }
        };
        entries.push((panel.clone(), rect));
    }
    let dropped = stored
        .keys()
        .filter(|panel| !panels.contains(panel))
        .cloned()
        .collect();
    match GridModel::new(entries) {
        Ok(model) => Ok(Ok(LoadedLayout {
            model,
            origin: LayoutOrigin::Stored { dropped },
        })),
        Err(LayoutError::InvariantViolation(issue)) => Ok(Err(FallbackReason::Invalid { issue })),
        Err(err) => Err(err),
    }
}

/// Default grid for `panels`, in the given order.
///
/// Panels fill rows left to right, two per row, each [`DEFAULT_PANEL_SPAN`]
/// columns wide. Rows are six cells tall for up to four panels; larger sets
/// get shorter rows so every panel fits.
pub fn default_layout(panels: &[PanelId]) -> Result<GridModel, LayoutError> {
    if panels.len() > MAX_DEFAULT_PANELS {
        return Err(LayoutError::TooManyPanels {
            count: panels.len(),
            max: MAX_DEFAULT_PANELS,
        });
    }
    let rows = panels.len().div_ceil(DEFAULT_PANELS_PER_ROW);
    let height = if panels.len() <= 2 * DEFAULT_PANELS_PER_ROW {
        DEFAULT_PANEL_SPAN
    } else {
        // rows <= 6 here, so the quotient is at least MIN_PANEL_SPAN.
        (GRID_CELLS / rows as u16).max(MIN_PANEL_SPAN)
    };
    GridModel::new(panels.iter().enumerate().map(|(index, panel)| {
        let slot = (index % DEFAULT_PANELS_PER_ROW) as u16;
        let row = (index / DEFAULT_PANELS_PER_ROW) as u16;
        (
            panel.clone(),
            GridRect::new(
                1 + slot * DEFAULT_PANEL_SPAN,
                1 + row * height,
                DEFAULT_PANEL_SPAN,
                height,
            ),
        )
    }))
}
