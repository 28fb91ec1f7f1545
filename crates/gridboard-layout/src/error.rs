#![forbid(unsafe_code)]

//! Engine error types.
//!
//! Every variant is recoverable: a failed call leaves the registry exactly
//! as it was. Internal invariant breaches are not represented here; see
//! [`WidgetRegistry::invariant_report`](crate::registry::WidgetRegistry::invariant_report).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::occupancy::SpaceAnalysis;
use crate::widget::{WidgetId, WidgetSizeSpec, display_kind};

/// Occupancy at or above which the grid is reported as full.
pub const GRID_FULL_PERCENTAGE: f64 = 95.0;

/// Why a requested widget could not be placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum NoSpaceCategory {
    /// Occupancy is at or above [`GRID_FULL_PERCENTAGE`].
    GridFull,
    /// Not even a single 1×1 cell is free.
    Packed,
    /// Other catalog sizes still fit.
    SizeUnavailable { alternatives: Vec<WidgetSizeSpec> },
    /// Free cells exist but none of the catalog sizes fit.
    Fragmented,
}

impl NoSpaceCategory {
    /// Classify a space analysis taken after a failed placement.
    #[must_use]
    pub fn classify(analysis: &SpaceAnalysis) -> Self {
        if analysis.occupancy_percentage >= GRID_FULL_PERCENTAGE {
            Self::GridFull
        } else if !analysis.has_any_space {
            Self::Packed
        } else if !analysis.available_sizes.is_empty() {
            Self::SizeUnavailable {
                alternatives: analysis.available_sizes.clone(),
            }
        } else {
            Self::Fragmented
        }
    }
}

/// Diagnostic attached to [`LayoutError::NoSpace`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoSpaceReport {
    pub kind: String,
    pub width: u16,
    pub height: u16,
    pub analysis: SpaceAnalysis,
    pub category: NoSpaceCategory,
}

impl NoSpaceReport {
    #[must_use]
    pub fn new(kind: impl Into<String>, width: u16, height: u16, analysis: SpaceAnalysis) -> Self {
        let category = NoSpaceCategory::classify(&analysis);
        Self {
            kind: kind.into(),
            width,
            height,
            analysis,
            category,
        }
    }
}

impl fmt::Display for NoSpaceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = display_kind(&self.kind);
        let (w, h) = (self.width, self.height);
        match &self.category {
            NoSpaceCategory::GridFull => write!(
                f,
                "grid is {:.0}% full; cannot add {kind} widget ({w}×{h}), remove widgets first",
                self.analysis.occupancy_percentage
            ),
            NoSpaceCategory::Packed => write!(
                f,
                "no free cell remains; cannot add {kind} widget ({w}×{h})"
            ),
            NoSpaceCategory::SizeUnavailable { alternatives } => {
                let labels: Vec<&str> = alternatives.iter().map(|s| s.label.as_str()).collect();
                write!(
                    f,
                    "not enough space for {kind} widget ({w}×{h}); sizes that fit: {}",
                    labels.join(", ")
                )
            }
            NoSpaceCategory::Fragmented => write!(
                f,
                "cannot fit {kind} widget ({w}×{h}) in the remaining {} free cells",
                self.analysis.free_cells
            ),
        }
    }
}

/// Errors returned by registry and session operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum LayoutError {
    /// No free rectangle of the requested size exists.
    NoSpace(Box<NoSpaceReport>),
    /// The id is not (or no longer) in the registry.
    NotFound { id: WidgetId },
    /// The widget kind is empty or not in the catalog.
    UnknownWidgetType { kind: String },
    /// The size is not in the catalog.
    UnsupportedSize { width: u16, height: u16 },
    /// Zero width or height.
    InvalidSize { width: u16, height: u16 },
    /// Drags are only accepted in edit mode.
    EditModeInactive,
    /// Another widget is already being dragged.
    DragInProgress { active: WidgetId },
    /// A drag event referenced a widget that is not being dragged.
    NoActiveDrag { id: WidgetId },
    /// The registry changed between the reset prompt and its confirmation.
    ResetConfirmationStale { expected: usize, actual: usize },
    /// The widget id space is exhausted.
    IdSpaceExhausted,
}

impl LayoutError {
    /// Whether this is the benign race between removal and a pending gesture.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSpace(report) => write!(f, "no space: {report}"),
            Self::NotFound { id } => write!(f, "{id} not found"),
            Self::UnknownWidgetType { kind } => write!(f, "unknown widget type {kind:?}"),
            Self::UnsupportedSize { width, height } => {
                write!(f, "widget size {width}×{height} is not in the catalog")
            }
            Self::InvalidSize { width, height } => {
                write!(f, "widget size must be positive (got {width}×{height})")
            }
            Self::EditModeInactive => write!(f, "edit mode is not active"),
            Self::DragInProgress { active } => {
                write!(f, "{active} is already being dragged")
            }
            Self::NoActiveDrag { id } => write!(f, "{id} is not being dragged"),
            Self::ResetConfirmationStale { expected, actual } => write!(
                f,
                "reset confirmation was for {expected} widgets but {actual} are placed"
            ),
            Self::IdSpaceExhausted => write!(f, "widget id space exhausted"),
        }
    }
}

impl std::error::Error for LayoutError {}
