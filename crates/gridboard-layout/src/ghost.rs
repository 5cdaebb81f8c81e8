//! Preview ("ghost") rectangle shown during a drag or resize.
//!
//! The ghost never validates anything itself: callers pass the verdict of
//! [`crate::placement::check_placement`] along with every candidate. Valid
//! candidates move the ghost; invalid ones are dropped, so the preview
//! always sits on the last legal position of the gesture.

use gridboard_core::geometry::GridRect;

use crate::placement::PlacementRejection;

/// Result of offering one candidate to the ghost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GhostUpdate {
    /// The candidate was legal and differs from what was shown.
    Moved(GridRect),
    /// The candidate was legal but already shown.
    Unchanged,
    /// The candidate was illegal; the ghost kept its position.
    Held(PlacementRejection),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhostLayer {
    shown: GridRect,
    last_valid: Option<GridRect>,
}

impl GhostLayer {
    /// Ghost sitting on the panel's committed rectangle. No candidate has
    /// been accepted yet.
    #[must_use]
    pub const fn new(committed: GridRect) -> Self {
        Self {
            shown: committed,
            last_valid: None,
        }
    }

    /// Rectangle currently displayed.
    #[must_use]
    pub const fn shown(&self) -> GridRect {
        self.shown
    }

    /// Last accepted candidate of the gesture, if any.
    #[must_use]
    pub const fn last_valid(&self) -> Option<GridRect> {
        self.last_valid
    }

    pub fn offer(
        &mut self,
        candidate: GridRect,
        verdict: Result<(), PlacementRejection>,
    ) -> GhostUpdate {
        if let Err(rejection) = verdict {
            return GhostUpdate::Held(rejection);
        }
        self.last_valid = Some(candidate);
        if candidate == self.shown {
            return GhostUpdate::Unchanged;
        }
        self.shown = candidate;
        GhostUpdate::Moved(candidate)
    }
}
