#![forbid(unsafe_code)]

//! Geometric primitives for the dashboard canvas.
//!
//! Two coordinate spaces meet here:
//!
//! - **Cell space**: the fixed 12×12 grid. [`GridRect`] coordinates are
//!   1-indexed (`col`/`row` of the top-left cell) with spans `w`/`h`.
//! - **Pixel space**: integer device coordinates reported by the pointer and
//!   the canvas bounding box ([`CanvasBounds`]).
//!
//! All conversions between the two use exact integer arithmetic
//! (`div_euclid`), so a given pointer position always maps to the same cell
//! regardless of canvas size or platform float behavior.

use std::fmt;
use std::ops::Sub;

use serde::{Deserialize, Serialize};

/// Number of cells along each canvas axis.
pub const GRID_CELLS: u16 = 12;

/// Smallest span (in cells) a panel may have on either axis.
pub const MIN_PANEL_SPAN: u16 = 2;

/// A panel rectangle in cell space.
///
/// `col`/`row` are 1-indexed; `w`/`h` are cell spans. A rectangle covers the
/// half-open ranges `col..col + w` and `row..row + h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridRect {
    pub col: u16,
    pub row: u16,
    pub w: u16,
    pub h: u16,
}

impl GridRect {
    /// Create a new rectangle.
    #[inline]
    #[must_use]
    pub const fn new(col: u16, row: u16, w: u16, h: u16) -> Self {
        Self { col, row, w, h }
    }

    /// Column one past the right edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.col as u32 + self.w as u32
    }

    /// Row one past the bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.row as u32 + self.h as u32
    }

    /// Same size, moved to a new top-left cell.
    #[inline]
    #[must_use]
    pub const fn with_origin(self, col: u16, row: u16) -> Self {
        Self { col, row, ..self }
    }

    /// Same top-left cell, new spans.
    #[inline]
    #[must_use]
    pub const fn with_size(self, w: u16, h: u16) -> Self {
        Self { w, h, ..self }
    }

    /// Whether the rectangle fits entirely on the 12×12 canvas.
    #[inline]
    #[must_use]
    pub const fn is_within_bounds(&self) -> bool {
        let limit = GRID_CELLS as u32 + 1;
        self.col >= 1 && self.row >= 1 && self.right() <= limit && self.bottom() <= limit
    }

    /// Whether both spans meet [`MIN_PANEL_SPAN`].
    #[inline]
    #[must_use]
    pub const fn meets_min_size(&self) -> bool {
        self.w >= MIN_PANEL_SPAN && self.h >= MIN_PANEL_SPAN
    }

    /// Strict axis-aligned intersection test. Rectangles that only share an
    /// edge do not overlap.
    #[inline]
    #[must_use]
    pub const fn overlaps(&self, other: &GridRect) -> bool {
        (self.col as u32) < other.right()
            && self.right() > other.col as u32
            && (self.row as u32) < other.bottom()
            && self.bottom() > other.row as u32
    }

    /// Whether the cell at (`col`, `row`) lies inside the rectangle.
    #[inline]
    #[must_use]
    pub const fn contains_cell(&self, col: u16, row: u16) -> bool {
        col >= self.col
            && (col as u32) < self.right()
            && row >= self.row
            && (row as u32) < self.bottom()
    }
}

impl fmt::Display for GridRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{}) {}x{}", self.col, self.row, self.w, self.h)
    }
}

/// Pointer position in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: i32,
    pub y: i32,
}

impl PointerPosition {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Pixel displacement between two pointer positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelOffset {
    pub dx: i32,
    pub dy: i32,
}

impl PixelOffset {
    #[must_use]
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

impl Sub for PointerPosition {
    type Output = PixelOffset;

    fn sub(self, rhs: PointerPosition) -> PixelOffset {
        PixelOffset {
            dx: self.x.saturating_sub(rhs.x),
            dy: self.y.saturating_sub(rhs.y),
        }
    }
}

impl Sub<PixelOffset> for PointerPosition {
    type Output = PointerPosition;

    fn sub(self, rhs: PixelOffset) -> PointerPosition {
        PointerPosition {
            x: self.x.saturating_sub(rhs.dx),
            y: self.y.saturating_sub(rhs.dy),
        }
    }
}

/// A rectangle in pixel space (used for hit testing rendered panels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Whether a point lies inside the rectangle (right/bottom exclusive).
    #[must_use]
    pub fn contains(&self, point: PointerPosition) -> bool {
        let x = i64::from(point.x);
        let y = i64::from(point.y);
        let left = i64::from(self.x);
        let top = i64::from(self.y);
        x >= left
            && x < left + i64::from(self.width)
            && y >= top
            && y < top + i64::from(self.height)
    }

    /// Square of side `size` anchored at the bottom-right corner, shrunk to
    /// fit when the rectangle is smaller than `size`.
    #[must_use]
    pub fn corner_square(&self, size: u32) -> PixelRect {
        let side = size.min(self.width).min(self.height);
        PixelRect {
            x: self.x.saturating_add_unsigned(self.width - side),
            y: self.y.saturating_add_unsigned(self.height - side),
            width: side,
            height: side,
        }
    }
}

/// Bounding box of the rendered canvas in pixel space.
///
/// Width and height must each be at least [`GRID_CELLS`] pixels so every
/// cell is at least one pixel wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CanvasBounds {
    origin: PointerPosition,
    width: u32,
    height: u32,
}

impl CanvasBounds {
    /// Construct validated canvas bounds.
    pub fn new(origin: PointerPosition, width: u32, height: u32) -> Result<Self, GeometryError> {
        let min = u32::from(GRID_CELLS);
        if width < min || height < min {
            return Err(GeometryError::InvalidCanvas { width, height });
        }
        Ok(Self {
            origin,
            width,
            height,
        })
    }

    /// Canvas anchored at the pixel origin.
    pub fn from_size(width: u32, height: u32) -> Result<Self, GeometryError> {
        Self::new(PointerPosition::default(), width, height)
    }

    #[must_use]
    pub const fn origin(&self) -> PointerPosition {
        self.origin
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Map a pixel position to the 1-indexed cell under it, clamped to the
    /// canvas so callers always receive in-range coordinates.
    #[must_use]
    pub fn pixel_to_cell(&self, pointer: PointerPosition) -> (u16, u16) {
        let col = cell_on_axis(
            i64::from(pointer.x) - i64::from(self.origin.x),
            self.width,
        );
        let row = cell_on_axis(
            i64::from(pointer.y) - i64::from(self.origin.y),
            self.height,
        );
        (col, row)
    }

    /// Top-left pixel of the cell at (`col`, `row`).
    ///
    /// Rounded up, so `pixel_to_cell(cell_origin(c, r)) == (c, r)` for every
    /// in-range cell.
    #[must_use]
    pub fn cell_origin(&self, col: u16, row: u16) -> PointerPosition {
        PointerPosition {
            x: offset_pixel(self.origin.x, cell_start_px(col, self.width)),
            y: offset_pixel(self.origin.y, cell_start_px(row, self.height)),
        }
    }

    /// Pixel-space rectangle covered by a cell-space rectangle.
    #[must_use]
    pub fn rect_pixels(&self, rect: GridRect) -> PixelRect {
        let x0 = cell_start_px(rect.col, self.width);
        let y0 = cell_start_px(rect.row, self.height);
        let x1 = cell_start_px(rect.col.saturating_add(rect.w), self.width);
        let y1 = cell_start_px(rect.row.saturating_add(rect.h), self.height);
        PixelRect {
            x: offset_pixel(self.origin.x, x0),
            y: offset_pixel(self.origin.y, y0),
            width: u32::try_from(x1.saturating_sub(x0)).unwrap_or(u32::MAX),
            height: u32::try_from(y1.saturating_sub(y0)).unwrap_or(u32::MAX),
        }
    }

    /// Convert a pixel delta into a whole-cell delta, rounding to the
    /// nearest cell. Exact halves round toward positive infinity.
    #[must_use]
    pub fn cells_from_delta(&self, delta: PixelOffset) -> (i32, i32) {
        (
            nearest_cells(i64::from(delta.dx), self.width),
            nearest_cells(i64::from(delta.dy), self.height),
        )
    }
}

/// Free-function form of [`CanvasBounds::pixel_to_cell`].
#[must_use]
pub fn pixel_to_cell(pointer: PointerPosition, canvas: &CanvasBounds) -> (u16, u16) {
    canvas.pixel_to_cell(pointer)
}

// floor(relative / (extent / 12)) + 1 == floor(relative * 12 / extent) + 1
fn cell_on_axis(relative: i64, extent: u32) -> u16 {
    let cells = i64::from(GRID_CELLS);
    let index = (relative * cells).div_euclid(i64::from(extent)) + 1;
    // Clamped into 1..=12, so the narrowing cast is lossless.
    index.clamp(1, cells) as u16
}

fn cell_start_px(index: u16, extent: u32) -> i64 {
    let steps = i64::from(index.saturating_sub(1));
    let cells = i64::from(GRID_CELLS);
    (steps * i64::from(extent) + cells - 1).div_euclid(cells)
}

fn nearest_cells(delta: i64, extent: u32) -> i32 {
    let scaled = delta * i64::from(GRID_CELLS);
    let extent = i64::from(extent);
    let cells = (2 * scaled + extent).div_euclid(2 * extent);
    i32::try_from(cells).unwrap_or(if cells < 0 { i32::MIN } else { i32::MAX })
}

fn offset_pixel(base: i32, offset: i64) -> i32 {
    let value = i64::from(base) + offset;
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

/// Geometry construction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    InvalidCanvas { width: u32, height: u32 },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCanvas { width, height } => write!(
                f,
                "invalid canvas {width}x{height} px (each side must be >= {GRID_CELLS})"
            ),
        }
    }
}

impl std::error::Error for GeometryError {}
