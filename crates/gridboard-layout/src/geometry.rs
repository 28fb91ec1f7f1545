#![forbid(unsafe_code)]

//! Grid coordinate space and pixel/cell conversions.
//!
//! The board is a fixed `columns × rows` lattice. Everything the engine
//! stores is expressed in cells; the presentation layer works in pixels.
//! This module is the only place where the two meet:
//!
//! - [`pixel_delta_to_cell_delta`] snaps a gesture displacement to whole
//!   cells (nearest integer, so a drag must cross about half a cell before
//!   the target changes).
//! - [`clamp_position`] pins an anchor plus delta inside the grid, whatever
//!   the size of the delta.
//! - [`cell_origin_px`], [`span_px`] and [`grid_extent_px`] go the other way
//!   for rendering.
//!
//! # Invariants
//!
//! 1. `clamp_position` always returns a position satisfying
//!    `0 <= x && x + width <= columns` (same for y) when the widget fits the
//!    grid at all.
//! 2. `pixel_delta_to_cell_delta(0, 0, ..) == (0, 0)` for any metrics.

use serde::{Deserialize, Serialize};

/// Fixed grid dimensions in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSize {
    pub columns: u16,
    pub rows: u16,
}

impl GridSize {
    /// Create a grid size.
    #[must_use]
    pub const fn new(columns: u16, rows: u16) -> Self {
        Self { columns, rows }
    }

    /// Total number of cells.
    #[must_use]
    pub const fn cell_count(self) -> u32 {
        self.columns as u32 * self.rows as u32
    }

    /// Whether the rectangle lies completely inside the grid.
    #[must_use]
    pub fn contains_rect(self, rect: GridRect) -> bool {
        rect.x >= 0
            && rect.y >= 0
            && rect.right() <= i64::from(self.columns)
            && rect.bottom() <= i64::from(self.rows)
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self::new(3, 6)
    }
}

/// A single cell coordinate.
///
/// Ordering is row-major (`y` first), which is also the order in which
/// first-fit placement scans the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellPoint {
    pub x: u16,
    pub y: u16,
}

impl CellPoint {
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

impl PartialOrd for CellPoint {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellPoint {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

/// Signed displacement in whole cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CellDelta {
    pub columns: i32,
    pub rows: i32,
}

impl CellDelta {
    #[must_use]
    pub const fn new(columns: i32, rows: i32) -> Self {
        Self { columns, rows }
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.columns == 0 && self.rows == 0
    }
}

/// Candidate rectangle in cell units.
///
/// The origin is signed so that out-of-grid candidates can be represented
/// and rejected instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridRect {
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

impl GridRect {
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle anchored at a cell.
    #[must_use]
    pub fn at(origin: CellPoint, width: u16, height: u16) -> Self {
        Self::new(i32::from(origin.x), i32::from(origin.y), width, height)
    }

    /// Exclusive right edge. Widened so that an origin near `i32::MAX`
    /// cannot overflow.
    #[must_use]
    pub const fn right(self) -> i64 {
        self.x as i64 + self.width as i64
    }

    /// Exclusive bottom edge, widened like [`right`](Self::right).
    #[must_use]
    pub const fn bottom(self) -> i64 {
        self.y as i64 + self.height as i64
    }

    #[must_use]
    pub const fn area(self) -> u32 {
        self.width as u32 * self.height as u32
    }

    /// Strict overlap test: touching edges do not intersect.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        (self.x as i64) < other.right()
            && self.right() > other.x as i64
            && (self.y as i64) < other.bottom()
            && self.bottom() > other.y as i64
    }

    #[must_use]
    pub const fn contains_cell(self, x: i32, y: i32) -> bool {
        x >= self.x && (x as i64) < self.right() && y >= self.y && (y as i64) < self.bottom()
    }

    /// Origin as a cell, if it is non-negative.
    #[must_use]
    pub fn origin(self) -> Option<CellPoint> {
        let x = u16::try_from(self.x).ok()?;
        let y = u16::try_from(self.y).ok()?;
        Some(CellPoint::new(x, y))
    }

    /// Every covered cell in row-major order. Negative cells are skipped.
    pub fn cells(self) -> impl Iterator<Item = CellPoint> {
        (i64::from(self.y)..self.bottom()).flat_map(move |y| {
            (i64::from(self.x)..self.right()).filter_map(move |x| {
                let x = u16::try_from(x).ok()?;
                let y = u16::try_from(y).ok()?;
                Some(CellPoint::new(x, y))
            })
        })
    }
}

/// Pixel dimensions of one cell and the gap between cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellMetrics {
    pub cell_width: f64,
    pub cell_height: f64,
    pub gap: f64,
}

impl CellMetrics {
    #[must_use]
    pub const fn new(cell_width: f64, cell_height: f64, gap: f64) -> Self {
        Self {
            cell_width,
            cell_height,
            gap,
        }
    }

    /// Horizontal distance between two neighbouring cell origins.
    #[must_use]
    pub fn step_x(self) -> f64 {
        self.cell_width + self.gap
    }

    /// Vertical distance between two neighbouring cell origins.
    #[must_use]
    pub fn step_y(self) -> f64 {
        self.cell_height + self.gap
    }
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self::new(100.0, 100.0, 4.0)
    }
}

/// Nearest integer with ties toward positive infinity.
fn round_half_up(value: f64) -> i32 {
    let rounded = (value + 0.5).floor();
    if rounded >= f64::from(i32::MAX) {
        i32::MAX
    } else if rounded <= f64::from(i32::MIN) {
        i32::MIN
    } else {
        rounded as i32
    }
}

/// Convert a pixel displacement into a whole-cell displacement.
///
/// Each axis is divided by `cell + gap` and rounded to the nearest integer.
/// Non-finite input snaps to zero.
#[must_use]
pub fn pixel_delta_to_cell_delta(dx: f64, dy: f64, metrics: CellMetrics) -> CellDelta {
    let snap = |delta: f64, step: f64| {
        if !delta.is_finite() || step <= 0.0 {
            0
        } else {
            round_half_up(delta / step)
        }
    };
    CellDelta::new(snap(dx, metrics.step_x()), snap(dy, metrics.step_y()))
}

/// Move `origin` by `delta` and pin the result inside the grid.
///
/// `x' = max(0, min(columns - width, x + Δx))`, symmetric for y.
#[must_use]
pub fn clamp_position(
    origin: CellPoint,
    delta: CellDelta,
    width: u16,
    height: u16,
    grid: GridSize,
) -> CellPoint {
    let clamp_axis = |pos: u16, delta: i32, span: u16, limit: u16| -> u16 {
        let max = i64::from(limit) - i64::from(span);
        let moved = i64::from(pos) + i64::from(delta);
        // `max` may be negative when the widget is larger than the grid;
        // the lower bound wins in that case.
        let clamped = moved.min(max).max(0);
        u16::try_from(clamped).unwrap_or(0)
    };
    CellPoint::new(
        clamp_axis(origin.x, delta.columns, width, grid.columns),
        clamp_axis(origin.y, delta.rows, height, grid.rows),
    )
}

/// Whether a raw gesture displacement counts as a drag rather than a tap.
#[must_use]
pub fn exceeds_drag_threshold(dx: f64, dy: f64, threshold: f64) -> bool {
    dx.abs() > threshold || dy.abs() > threshold
}

/// Top-left pixel position of a cell inside the board.
#[must_use]
pub fn cell_origin_px(pos: CellPoint, metrics: CellMetrics) -> (f64, f64) {
    (
        f64::from(pos.x) * metrics.step_x() + metrics.gap,
        f64::from(pos.y) * metrics.step_y() + metrics.gap,
    )
}

/// Pixel size of a `width × height` widget, gaps included, times `scale`.
#[must_use]
pub fn span_px(width: u16, height: u16, metrics: CellMetrics, scale: f64) -> (f64, f64) {
    let span = |cells: u16, cell: f64| {
        let cells = f64::from(cells);
        (cell * cells + (cells - 1.0).max(0.0) * metrics.gap) * scale
    };
    (
        span(width, metrics.cell_width),
        span(height, metrics.cell_height),
    )
}

/// Total pixel size of the board including the outer gaps.
#[must_use]
pub fn grid_extent_px(grid: GridSize, metrics: CellMetrics) -> (f64, f64) {
    (
        f64::from(grid.columns) * metrics.step_x() + metrics.gap,
        f64::from(grid.rows) * metrics.step_y() + metrics.gap,
    )
}

/// Derives cell metrics from a screen size.
///
/// Vertical padding is a fraction of the screen height with a floor; the
/// remaining area is split evenly between cells and then clamped to a
/// usable range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenFit {
    pub top_padding_ratio: f64,
    pub bottom_padding_ratio: f64,
    pub min_top_padding: f64,
    pub min_bottom_padding: f64,
    pub min_cell_width: f64,
    pub max_cell_width: f64,
    pub min_cell_height: f64,
    pub max_cell_height: f64,
}

impl Default for ScreenFit {
    fn default() -> Self {
        Self {
            top_padding_ratio: 0.08,
            bottom_padding_ratio: 0.04,
            min_top_padding: 60.0,
            min_bottom_padding: 20.0,
            min_cell_width: 60.0,
            max_cell_width: 200.0,
            min_cell_height: 60.0,
            max_cell_height: 150.0,
        }
    }
}

/// Result of fitting the grid to a screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenLayout {
    pub top_padding: f64,
    pub bottom_padding: f64,
    pub metrics: CellMetrics,
    pub board_width: f64,
    pub board_height: f64,
}

impl ScreenFit {
    /// Fit `grid` with the given `gap` onto a `screen_width × screen_height` screen.
    #[must_use]
    pub fn fit(&self, screen_width: f64, screen_height: f64, grid: GridSize, gap: f64) -> ScreenLayout {
        let top_padding = (screen_height * self.top_padding_ratio).max(self.min_top_padding);
        let bottom_padding =
            (screen_height * self.bottom_padding_ratio).max(self.min_bottom_padding);

        let columns = f64::from(grid.columns.max(1));
        let rows = f64::from(grid.rows.max(1));
        let available_height = screen_height - top_padding - bottom_padding;
        let available_width = screen_width - (columns + 1.0) * gap;

        let cell_width = (available_width / columns).clamp(self.min_cell_width, self.max_cell_width);
        let cell_height = ((available_height - (rows + 1.0) * gap) / rows)
            .clamp(self.min_cell_height, self.max_cell_height);

        let metrics = CellMetrics::new(cell_width, cell_height, gap);
        let (board_width, board_height) = grid_extent_px(grid, metrics);
        ScreenLayout {
            top_padding,
            bottom_padding,
            metrics,
            board_width,
            board_height,
        }
    }
}
