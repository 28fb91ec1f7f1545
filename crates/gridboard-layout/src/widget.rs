#![forbid(unsafe_code)]

//! Widget entities and the externally supplied catalogs.
//!
//! A [`Widget`] is a placed rectangle with a stable [`WidgetId`]. Its `kind`
//! is an opaque display tag: layout logic never branches on it. Which kinds
//! and which sizes are allowed is decided by a [`WidgetCatalog`] that callers
//! pass in with each request.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{CellPoint, GridRect};

/// Stable identifier for placed widgets.
///
/// `0` is reserved/invalid so IDs are always non-zero. Deserialization goes
/// through [`WidgetId::new`], so a `0` in a trace is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct WidgetId(u64);

/// Rejected raw widget ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroWidgetId;

impl fmt::Display for ZeroWidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("widget id must be non-zero")
    }
}

impl std::error::Error for ZeroWidgetId {}

impl WidgetId {
    /// Lowest valid widget ID.
    pub const MIN: Self = Self(1);

    /// Create a widget ID, rejecting 0.
    #[must_use]
    pub const fn new(raw: u64) -> Option<Self> {
        if raw == 0 { None } else { Some(Self(raw)) }
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Return the next ID, or `None` on overflow.
    #[must_use]
    pub const fn checked_next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(next) => Some(Self(next)),
            None => None,
        }
    }
}

impl TryFrom<u64> for WidgetId {
    type Error = ZeroWidgetId;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or(ZeroWidgetId)
    }
}

impl From<WidgetId> for u64 {
    fn from(id: WidgetId) -> Self {
        id.0
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "widget-{}", self.0)
    }
}

/// A placed rectangular occupant of one or more grid cells.
///
/// Size is fixed at creation; the anchor only changes through
/// [`WidgetRegistry::move_widget`](crate::registry::WidgetRegistry::move_widget).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Widget {
    id: WidgetId,
    kind: String,
    width: u16,
    height: u16,
    grid_x: u16,
    grid_y: u16,
}

impl Widget {
    pub(crate) fn new(id: WidgetId, kind: impl Into<String>, width: u16, height: u16, at: CellPoint) -> Self {
        Self {
            id,
            kind: kind.into(),
            width,
            height,
            grid_x: at.x,
            grid_y: at.y,
        }
    }

    #[must_use]
    pub const fn id(&self) -> WidgetId {
        self.id
    }

    /// Display tag from the widget type catalog.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    #[must_use]
    pub const fn grid_x(&self) -> u16 {
        self.grid_x
    }

    #[must_use]
    pub const fn grid_y(&self) -> u16 {
        self.grid_y
    }

    /// Top-left anchor.
    #[must_use]
    pub const fn position(&self) -> CellPoint {
        CellPoint::new(self.grid_x, self.grid_y)
    }

    /// Occupied rectangle.
    #[must_use]
    pub fn rect(&self) -> GridRect {
        GridRect::at(self.position(), self.width, self.height)
    }

    pub(crate) fn set_position(&mut self, at: CellPoint) {
        self.grid_x = at.x;
        self.grid_y = at.y;
    }
}

/// One entry of the widget type catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetTypeSpec {
    pub kind: String,
    pub default_width: u16,
    pub default_height: u16,
}

impl WidgetTypeSpec {
    #[must_use]
    pub fn new(kind: impl Into<String>, default_width: u16, default_height: u16) -> Self {
        Self {
            kind: kind.into(),
            default_width,
            default_height,
        }
    }
}

/// One entry of the widget size catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetSizeSpec {
    pub width: u16,
    pub height: u16,
    pub label: String,
}

impl WidgetSizeSpec {
    #[must_use]
    pub fn new(width: u16, height: u16, label: impl Into<String>) -> Self {
        Self {
            width,
            height,
            label: label.into(),
        }
    }
}

/// Allowed widget kinds and sizes, supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetCatalog {
    pub types: Vec<WidgetTypeSpec>,
    pub sizes: Vec<WidgetSizeSpec>,
}

impl WidgetCatalog {
    #[must_use]
    pub fn new(types: Vec<WidgetTypeSpec>, sizes: Vec<WidgetSizeSpec>) -> Self {
        Self { types, sizes }
    }

    /// The profile-dashboard catalog: seven widget kinds, four sizes.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            types: vec![
                WidgetTypeSpec::new("profile", 2, 1),
                WidgetTypeSpec::new("school", 2, 1),
                WidgetTypeSpec::new("goals", 1, 1),
                WidgetTypeSpec::new("exam_prep", 1, 1),
                WidgetTypeSpec::new("trophies", 2, 2),
                WidgetTypeSpec::new("friends", 1, 1),
                WidgetTypeSpec::new("class", 1, 1),
            ],
            sizes: vec![
                WidgetSizeSpec::new(1, 1, "Small (1×1)"),
                WidgetSizeSpec::new(2, 1, "Wide (2×1)"),
                WidgetSizeSpec::new(1, 2, "Tall (1×2)"),
                WidgetSizeSpec::new(2, 2, "Large (2×2)"),
            ],
        }
    }

    #[must_use]
    pub fn find_type(&self, kind: &str) -> Option<&WidgetTypeSpec> {
        self.types.iter().find(|spec| spec.kind == kind)
    }

    #[must_use]
    pub fn find_size(&self, width: u16, height: u16) -> Option<&WidgetSizeSpec> {
        self.sizes
            .iter()
            .find(|spec| spec.width == width && spec.height == height)
    }

    /// Catalog label for a size, or `"W×H"` when the size is not listed.
    #[must_use]
    pub fn size_label(&self, width: u16, height: u16) -> String {
        self.find_size(width, height)
            .map_or_else(|| format!("{width}×{height}"), |spec| spec.label.clone())
    }
}

/// Upper-case display form of a widget kind (`exam_prep` → `EXAM PREP`).
#[must_use]
pub fn display_kind(kind: &str) -> String {
    kind.replace('_', " ").to_uppercase()
}
