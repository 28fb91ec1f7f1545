#![forbid(unsafe_code)]

//! Authoritative collection of placed widgets.
//!
//! The registry owns the widget sequence and is the only code that mutates
//! widget positions. Every mutation re-validates against the current state
//! (never against an earlier space check), so the two core invariants hold
//! after every call, successful or not:
//!
//! 1. Every widget lies inside the grid.
//! 2. The occupied-cell sets of any two widgets are disjoint.
//!
//! Insertion order is preserved for rendering; `remove` and `clear` never
//! reorder the remaining entries.

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, NoSpaceReport};
use crate::geometry::{CellPoint, GridRect, GridSize};
use crate::occupancy::{analyze_space, cells_of, find_free_cell, first_overlap};
use crate::widget::{Widget, WidgetId};

/// A widget that was just removed, with the cells it vacated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovedWidget {
    pub widget: Widget,
    pub freed_cells: Vec<CellPoint>,
}

/// Why a move was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum MoveRejection {
    OutOfBounds,
    Overlap { blocker: WidgetId },
}

/// Result of [`WidgetRegistry::move_widget`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MoveOutcome {
    /// The widget now sits at `to`; `freed_cells` are its old cells.
    Committed {
        from: CellPoint,
        to: CellPoint,
        freed_cells: Vec<CellPoint>,
    },
    /// Nothing changed.
    Rejected { reason: MoveRejection },
}

/// Kind of invariant breach found by [`WidgetRegistry::invariant_report`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantCode {
    OutOfBounds,
    Overlap,
    ZeroSize,
    DuplicateId,
}

/// One invariant breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantIssue {
    pub code: InvariantCode,
    pub widget: WidgetId,
    pub other: Option<WidgetId>,
}

/// Ordered widget collection bound to one grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetRegistry {
    grid: GridSize,
    widgets: Vec<Widget>,
    next_id: WidgetId,
}

impl WidgetRegistry {
    /// Empty registry for `grid`.
    #[must_use]
    pub fn new(grid: GridSize) -> Self {
        Self {
            grid,
            widgets: Vec::new(),
            next_id: WidgetId::MIN,
        }
    }

    #[must_use]
    pub const fn grid(&self) -> GridSize {
        self.grid
    }

    /// Widgets in insertion order.
    #[must_use]
    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    #[must_use]
    pub fn find_by_id(&self, id: WidgetId) -> Option<&Widget> {
        self.widgets.iter().find(|widget| widget.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: WidgetId) -> bool {
        self.find_by_id(id).is_some()
    }

    /// Place a new `width × height` widget at the first free cell.
    ///
    /// The returned [`LayoutError::NoSpace`] report is analysed without
    /// catalog sizes; callers holding a catalog can re-analyse for
    /// alternatives.
    pub fn add(&mut self, kind: &str, width: u16, height: u16) -> Result<Widget, LayoutError> {
        if width == 0 || height == 0 {
            return Err(LayoutError::InvalidSize { width, height });
        }
        let Some(origin) = find_free_cell(width, height, &self.widgets, None, self.grid) else {
            let analysis = analyze_space(&self.widgets, &[], self.grid);
            tracing::info!(
                target: "gridboard.registry",
                kind = %kind,
                width,
                height,
                occupancy = analysis.occupancy_percentage,
                "no free cell for widget"
            );
            return Err(LayoutError::NoSpace(Box::new(NoSpaceReport::new(
                kind, width, height, analysis,
            ))));
        };

        let id = self.allocate_id()?;
        let widget = Widget::new(id, kind, width, height, origin);
        self.widgets.push(widget.clone());
        tracing::debug!(
            target: "gridboard.registry",
            %id,
            kind = %kind,
            width,
            height,
            x = origin.x,
            y = origin.y,
            "widget added"
        );
        self.debug_check();
        Ok(widget)
    }

    /// Remove a widget and report the cells it vacated.
    pub fn remove(&mut self, id: WidgetId) -> Result<RemovedWidget, LayoutError> {
        let Some(index) = self.index_of(id) else {
            return Err(LayoutError::NotFound { id });
        };
        let widget = self.widgets.remove(index);
        let freed_cells = cells_of(&widget);
        tracing::debug!(
            target: "gridboard.registry",
            %id,
            kind = %widget.kind(),
            freed = freed_cells.len(),
            "widget removed"
        );
        self.debug_check();
        Ok(RemovedWidget {
            widget,
            freed_cells,
        })
    }

    /// Re-validate and apply a move to `(x, y)`.
    ///
    /// The widget ignores collisions with itself. On rejection the widget is
    /// left untouched.
    pub fn move_widget(&mut self, id: WidgetId, x: i32, y: i32) -> Result<MoveOutcome, LayoutError> {
        let Some(index) = self.index_of(id) else {
            return Err(LayoutError::NotFound { id });
        };
        let current = &self.widgets[index];
        let from = current.position();
        let candidate = GridRect::new(x, y, current.width(), current.height());

        let rejection = if !self.grid.contains_rect(candidate) {
            Some(MoveRejection::OutOfBounds)
        } else {
            first_overlap(candidate, &self.widgets, Some(id))
                .map(|blocker| MoveRejection::Overlap { blocker })
        };
        let to = match (rejection, candidate.origin()) {
            (None, Some(to)) => to,
            (reason, _) => {
                let reason = reason.unwrap_or(MoveRejection::OutOfBounds);
                tracing::info!(
                    target: "gridboard.registry",
                    %id,
                    x,
                    y,
                    ?reason,
                    "move rejected"
                );
                return Ok(MoveOutcome::Rejected { reason });
            }
        };

        let freed_cells = cells_of(current);
        self.widgets[index].set_position(to);
        tracing::debug!(
            target: "gridboard.registry",
            %id,
            from_x = from.x,
            from_y = from.y,
            to_x = to.x,
            to_y = to.y,
            "widget moved"
        );
        self.debug_check();
        Ok(MoveOutcome::Committed {
            from,
            to,
            freed_cells,
        })
    }

    /// Remove every widget, returning how many were removed.
    ///
    /// The id counter is not reset, so ids are never reused.
    pub fn clear(&mut self) -> usize {
        let removed = self.widgets.len();
        self.widgets.clear();
        tracing::debug!(target: "gridboard.registry", removed, "registry cleared");
        removed
    }

    /// Every invariant breach in the current state. Empty when consistent.
    #[must_use]
    pub fn invariant_report(&self) -> Vec<InvariantIssue> {
        let mut issues = Vec::new();
        for (i, widget) in self.widgets.iter().enumerate() {
            let id = widget.id();
            if widget.width() == 0 || widget.height() == 0 {
                issues.push(InvariantIssue {
                    code: InvariantCode::ZeroSize,
                    widget: id,
                    other: None,
                });
            }
            if !self.grid.contains_rect(widget.rect()) {
                issues.push(InvariantIssue {
                    code: InvariantCode::OutOfBounds,
                    widget: id,
                    other: None,
                });
            }
            for other in &self.widgets[i + 1..] {
                if other.id() == id {
                    issues.push(InvariantIssue {
                        code: InvariantCode::DuplicateId,
                        widget: id,
                        other: Some(other.id()),
                    });
                }
                if widget.rect().intersects(other.rect()) {
                    issues.push(InvariantIssue {
                        code: InvariantCode::Overlap,
                        widget: id,
                        other: Some(other.id()),
                    });
                }
            }
        }
        issues
    }

    fn index_of(&self, id: WidgetId) -> Option<usize> {
        self.widgets.iter().position(|widget| widget.id() == id)
    }

    fn allocate_id(&mut self) -> Result<WidgetId, LayoutError> {
        let id = self.next_id;
        self.next_id = id.checked_next().ok_or(LayoutError::IdSpaceExhausted)?;
        Ok(id)
    }

    fn debug_check(&self) {
        debug_assert!(
            self.invariant_report().is_empty(),
            "registry invariant breached: {:?}",
            self.invariant_report()
        );
    }
}
