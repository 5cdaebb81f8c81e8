//! Placement legality: the one predicate that gates every ghost update and
//! every commit.

use std::fmt;

use gridboard_core::geometry::GridRect;
use serde::{Deserialize, Serialize};

use crate::grid::{GridModel, PanelId};

/// Why a candidate rectangle was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rejection", rename_all = "snake_case")]
pub enum PlacementRejection {
    OutOfBounds,
    Overlap { with: PanelId },
}

impl fmt::Display for PlacementRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds => write!(f, "out of bounds"),
            Self::Overlap { with } => write!(f, "overlaps {with}"),
        }
    }
}

/// Check `rect` as the new position of `target`.
///
/// The candidate must fit the canvas and must not overlap any other panel
/// of `model`. `target`'s own committed rectangle is excluded, so a panel
/// can always be placed where it already is. The first overlapping panel in
/// startup order is reported.
pub fn check_placement(
    target: &PanelId,
    rect: GridRect,
    model: &GridModel,
) -> Result<(), PlacementRejection> {
    if !rect.is_within_bounds() {
        return Err(PlacementRejection::OutOfBounds);
    }
    match model
        .iter()
        .find(|(panel, other)| *panel != target && rect.overlaps(other))
    {
        Some((panel, _)) => Err(PlacementRejection::Overlap {
            with: panel.clone(),
        }),
        None => Ok(()),
    }
}

/// Boolean form of [`check_placement`].
#[must_use]
pub fn is_valid_placement(target: &PanelId, rect: GridRect, model: &GridModel) -> bool {
    check_placement(target, rect, model).is_ok()
}
