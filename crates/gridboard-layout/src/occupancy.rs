#![forbid(unsafe_code)]

//! Free/occupied queries over a set of placed widgets.
//!
//! All functions here are pure: they read a widget slice and a grid size and
//! never mutate anything, so repeated calls with the same inputs return the
//! same answers.
//!
//! # Placement policy
//!
//! [`find_free_cell`] is first-fit in row-major order: rows outer (top
//! first), columns inner (left first). The scan order is a policy choice,
//! but callers and tests rely on it, so it is part of the contract.

use serde::{Deserialize, Serialize};

use crate::geometry::{CellPoint, GridRect, GridSize};
use crate::widget::{Widget, WidgetId, WidgetSizeSpec};

/// Whether `candidate` is inside the grid and overlaps no widget other than
/// `exclude`.
#[must_use]
pub fn is_free(
    candidate: GridRect,
    widgets: &[Widget],
    exclude: Option<WidgetId>,
    grid: GridSize,
) -> bool {
    if !grid.contains_rect(candidate) {
        return false;
    }
    first_overlap(candidate, widgets, exclude).is_none()
}

/// The first widget (in registry order) overlapping `candidate`.
#[must_use]
pub fn first_overlap(
    candidate: GridRect,
    widgets: &[Widget],
    exclude: Option<WidgetId>,
) -> Option<WidgetId> {
    widgets
        .iter()
        .filter(|widget| Some(widget.id()) != exclude)
        .find(|widget| candidate.intersects(widget.rect()))
        .map(Widget::id)
}

/// First free top-left position for a `width × height` rectangle.
#[must_use]
pub fn find_free_cell(
    width: u16,
    height: u16,
    widgets: &[Widget],
    exclude: Option<WidgetId>,
    grid: GridSize,
) -> Option<CellPoint> {
    if width == 0 || height == 0 || width > grid.columns || height > grid.rows {
        return None;
    }
    (0..=grid.rows - height)
        .flat_map(|y| (0..=grid.columns - width).map(move |x| CellPoint::new(x, y)))
        .find(|&origin| is_free(GridRect::at(origin, width, height), widgets, exclude, grid))
}

/// Sum of widget areas.
#[must_use]
pub fn occupied_cell_count(widgets: &[Widget]) -> u32 {
    widgets.iter().map(|widget| widget.rect().area()).sum()
}

/// `100 × occupied / total`, in `[0, 100]` while the registry is consistent.
#[must_use]
pub fn occupancy_percentage(widgets: &[Widget], grid: GridSize) -> f64 {
    let total = grid.cell_count();
    if total == 0 {
        return 0.0;
    }
    f64::from(occupied_cell_count(widgets)) * 100.0 / f64::from(total)
}

/// Every cell covered by `widget`, row-major.
#[must_use]
pub fn cells_of(widget: &Widget) -> Vec<CellPoint> {
    widget.rect().cells().collect()
}

/// Point-in-any-widget test.
#[must_use]
pub fn is_occupied(x: u16, y: u16, widgets: &[Widget]) -> bool {
    widgets
        .iter()
        .any(|widget| widget.rect().contains_cell(i32::from(x), i32::from(y)))
}

/// Space statistics used to explain why something does not fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceAnalysis {
    pub occupancy_percentage: f64,
    /// Whether at least one 1×1 cell is free.
    pub has_any_space: bool,
    /// Candidate sizes that currently fit somewhere.
    pub available_sizes: Vec<WidgetSizeSpec>,
    pub total_cells: u32,
    pub occupied_cells: u32,
    pub free_cells: u32,
}

/// Analyze the grid against a list of candidate sizes.
#[must_use]
pub fn analyze_space(
    widgets: &[Widget],
    candidate_sizes: &[WidgetSizeSpec],
    grid: GridSize,
) -> SpaceAnalysis {
    let total_cells = grid.cell_count();
    let occupied_cells = occupied_cell_count(widgets);
    SpaceAnalysis {
        occupancy_percentage: occupancy_percentage(widgets, grid),
        has_any_space: find_free_cell(1, 1, widgets, None, grid).is_some(),
        available_sizes: candidate_sizes
            .iter()
            .filter(|size| find_free_cell(size.width, size.height, widgets, None, grid).is_some())
            .cloned()
            .collect(),
        total_cells,
        occupied_cells,
        free_cells: total_cells.saturating_sub(occupied_cells),
    }
}

/// Display state of one cell in the edit-mode overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    Free,
    Occupied,
    RecentlyFreed,
}

/// Row-major cell states for the whole grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyOverlay {
    pub grid: GridSize,
    pub cells: Vec<CellState>,
}

impl OccupancyOverlay {
    /// Build the overlay. A recently freed cell is shown as such even if a
    /// widget has since moved onto it.
    #[must_use]
    pub fn build(widgets: &[Widget], recently_freed: &[CellPoint], grid: GridSize) -> Self {
        let mut cells = vec![CellState::Free; grid.cell_count() as usize];
        for widget in widgets {
            for cell in widget.rect().cells() {
                if let Some(slot) = Self::index(grid, cell).and_then(|i| cells.get_mut(i)) {
                    *slot = CellState::Occupied;
                }
            }
        }
        for &cell in recently_freed {
            if let Some(slot) = Self::index(grid, cell).and_then(|i| cells.get_mut(i)) {
                *slot = CellState::RecentlyFreed;
            }
        }
        Self { grid, cells }
    }

    fn index(grid: GridSize, cell: CellPoint) -> Option<usize> {
        if cell.x >= grid.columns || cell.y >= grid.rows {
            return None;
        }
        Some(usize::from(cell.y) * usize::from(grid.columns) + usize::from(cell.x))
    }

    /// State at a cell, `None` outside the grid.
    #[must_use]
    pub fn get(&self, x: u16, y: u16) -> Option<CellState> {
        Self::index(self.grid, CellPoint::new(x, y)).and_then(|i| self.cells.get(i).copied())
    }

    /// Iterate rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[CellState]> {
        self.cells.chunks(usize::from(self.grid.columns.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::WidgetCatalog;

    const GRID: GridSize = GridSize::new(3, 6);

    fn widget(raw: u64, x: u16, y: u16, w: u16, h: u16) -> Widget {
        Widget::new(
            WidgetId::new(raw).expect("test ID must be non-zero"),
            "goals",
            w,
            h,
            CellPoint::new(x, y),
        )
    }

    #[test]
    fn out_of_bounds_is_never_free() {
        assert!(!is_free(GridRect::new(-1, 0, 1, 1), &[], None, GRID));
        assert!(!is_free(GridRect::new(2, 0, 2, 1), &[], None, GRID));
        assert!(!is_free(GridRect::new(0, 5, 1, 2), &[], None, GRID));
        assert!(is_free(GridRect::new(2, 5, 1, 1), &[], None, GRID));
    }

    #[test]
    fn exclusion_ignores_self() {
        let widgets = [widget(1, 0, 0, 2, 2)];
        let candidate = GridRect::new(1, 1, 2, 2);
        assert!(!is_free(candidate, &widgets, None, GRID));
        assert!(is_free(candidate, &widgets, WidgetId::new(1), GRID));
    }

    #[test]
    fn first_fit_is_row_major() {
        let widgets = [widget(1, 0, 0, 2, 1), widget(2, 2, 0, 1, 2)];
        assert_eq!(
            find_free_cell(1, 1, &widgets, None, GRID),
            Some(CellPoint::new(0, 1))
        );
        assert_eq!(
            find_free_cell(2, 2, &widgets, None, GRID),
            Some(CellPoint::new(0, 1))
        );
        assert_eq!(
            find_free_cell(3, 1, &widgets, None, GRID),
            Some(CellPoint::new(0, 2))
        );
    }

    #[test]
    fn find_free_cell_rejects_degenerate_sizes() {
        assert_eq!(find_free_cell(0, 1, &[], None, GRID), None);
        assert_eq!(find_free_cell(4, 1, &[], None, GRID), None);
        assert_eq!(find_free_cell(1, 7, &[], None, GRID), None);
        assert_eq!(find_free_cell(3, 6, &[], None, GRID), Some(CellPoint::new(0, 0)));
    }

    #[test]
    fn occupancy_of_single_large_widget() {
        let widgets = [widget(1, 0, 0, 2, 2)];
        let pct = occupancy_percentage(&widgets, GRID);
        assert!((pct - 22.22).abs() < 0.01, "got {pct}");
    }

    #[test]
    fn cells_and_point_queries_agree() {
        let w = widget(1, 1, 2, 2, 2);
        let cells = cells_of(&w);
        assert_eq!(cells.len(), 4);
        for cell in &cells {
            assert!(is_occupied(cell.x, cell.y, std::slice::from_ref(&w)));
        }
        assert!(!is_occupied(0, 2, std::slice::from_ref(&w)));
        assert!(!is_occupied(1, 4, std::slice::from_ref(&w)));
    }

    #[test]
    fn analyze_space_filters_sizes() {
        // Column 2 fully free, columns 0-1 full: only 1-wide sizes fit.
        let widgets = [widget(1, 0, 0, 2, 6)];
        let catalog = WidgetCatalog::standard();
        let analysis = analyze_space(&widgets, &catalog.sizes, GRID);
        assert!(analysis.has_any_space);
        assert_eq!(analysis.total_cells, 18);
        assert_eq!(analysis.occupied_cells, 12);
        assert_eq!(analysis.free_cells, 6);
        let labels: Vec<_> = analysis
            .available_sizes
            .iter()
            .map(|s| s.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Small (1×1)", "Tall (1×2)"]);
    }

    #[test]
    fn analyze_space_is_repeatable() {
        let widgets = [widget(1, 0, 0, 2, 1), widget(2, 2, 3, 1, 2)];
        let sizes = WidgetCatalog::standard().sizes;
        assert_eq!(
            analyze_space(&widgets, &sizes, GRID),
            analyze_space(&widgets, &sizes, GRID)
        );
    }

    #[test]
    fn overlay_marks_recently_freed_over_occupied() {
        let widgets = [widget(1, 0, 0, 1, 1)];
        let freed = [CellPoint::new(0, 0), CellPoint::new(2, 5), CellPoint::new(9, 9)];
        let overlay = OccupancyOverlay::build(&widgets, &freed, GRID);
        assert_eq!(overlay.get(0, 0), Some(CellState::RecentlyFreed));
        assert_eq!(overlay.get(2, 5), Some(CellState::RecentlyFreed));
        assert_eq!(overlay.get(1, 0), Some(CellState::Free));
        assert_eq!(overlay.get(3, 0), None);
        assert_eq!(overlay.rows().count(), 6);
    }
}
