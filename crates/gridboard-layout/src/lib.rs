#![forbid(unsafe_code)]

//! Grid layout engine for drag-and-drop dashboard widgets.
//!
//! Widgets are rectangles on a fixed `columns × rows` grid. The engine keeps
//! two guarantees for every reachable state: each widget lies inside the
//! grid, and no two widgets share a cell.
//!
//! - [`geometry`]: pixel/cell conversion and clamping.
//! - [`occupancy`]: free/occupied queries, first-fit search, space analysis.
//! - [`registry`]: the authoritative widget collection.
//! - [`drag`]: the drag reconciler (hint box, commit or bounce on release).
//! - [`session`]: the orchestrator presentation code talks to.
//! - [`event`]: serializable inbound events for trace replay.
//!
//! ```
//! use gridboard_layout::{EngineConfig, LayoutSession, WidgetCatalog};
//!
//! let catalog = WidgetCatalog::standard();
//! let mut session = LayoutSession::new(EngineConfig::default()).unwrap();
//! let widget = session.add_widget("goals", 1, 1, &catalog).unwrap();
//!
//! session.set_edit_mode(true);
//! session.move_drag_start(widget.id()).unwrap();
//! session.move_drag_update(widget.id(), 104.0, 0.0);
//! session.move_drag_end(widget.id(), 104.0, 0.0).unwrap();
//! assert_eq!(session.widgets()[0].grid_x(), 1);
//! ```

pub mod config;
pub mod drag;
pub mod error;
pub mod event;
pub mod geometry;
pub mod occupancy;
pub mod registry;
pub mod session;
pub mod widget;

pub use config::{ConfigError, EngineConfig, FeedbackTiming};
pub use drag::{
    DragCancelReason, DragEffect, DragNoopReason, DragPhase, DragReconciler, DragTransition,
    DragTuning, HintBox,
};
pub use error::{LayoutError, NoSpaceCategory, NoSpaceReport};
pub use event::{EventOutcome, EventReport, SessionEvent};
pub use geometry::{
    CellDelta, CellMetrics, CellPoint, GridRect, GridSize, ScreenFit, ScreenLayout,
    clamp_position, pixel_delta_to_cell_delta,
};
pub use occupancy::{CellState, OccupancyOverlay, SpaceAnalysis};
pub use registry::{MoveOutcome, MoveRejection, RemovedWidget, WidgetRegistry};
pub use session::{
    FeedbackKind, FreedCellsEvent, LayoutSession, ResetPrompt, ReturningMarker, SessionSnapshot,
};
pub use widget::{
    Widget, WidgetCatalog, WidgetId, WidgetSizeSpec, WidgetTypeSpec, ZeroWidgetId, display_kind,
};
