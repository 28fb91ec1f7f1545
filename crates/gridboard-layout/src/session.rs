#![forbid(unsafe_code)]

//! Layout session: the single owner of engine state.
//!
//! A [`LayoutSession`] holds the registry, the one active-drag slot, the
//! edit-mode flag and the per-widget gesture arena. Presentation code calls
//! the inbound operations and renders [`LayoutSession::snapshot`] afterwards;
//! nothing here schedules timers. Feedback is emitted with a suggested
//! display duration and dropped again through
//! [`LayoutSession::expire_feedback`].
//!
//! The session is not `Sync`-guarded. Multi-threaded hosts must marshal
//! every call onto one serialized context.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, EngineConfig};
use crate::drag::{DragCancelReason, DragEffect, DragReconciler, DragTransition, HintBox};
use crate::error::{LayoutError, NoSpaceReport};
use crate::geometry::{CellPoint, GridSize};
use crate::occupancy::{OccupancyOverlay, SpaceAnalysis, analyze_space};
use crate::registry::{RemovedWidget, WidgetRegistry};
use crate::widget::{Widget, WidgetCatalog, WidgetId};

/// Cells that just became free, with a suggested highlight duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreedCellsEvent {
    pub cells: Vec<CellPoint>,
    pub display_ms: u64,
}

/// A widget animating back to its anchor after a rejected or canceled drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturningMarker {
    pub widget: WidgetId,
    pub anchor: CellPoint,
    pub display_ms: u64,
}

/// Feedback the presentation layer can expire when its timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedbackKind {
    RecentlyFreed,
    Returning { widget: WidgetId },
}

/// Count shown in the reset confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetPrompt {
    pub widget_count: usize,
}

impl ResetPrompt {
    /// Nothing to reset.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.widget_count == 0
    }
}

/// Immutable copy of everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub widgets: Vec<Widget>,
    pub hint: Option<HintBox>,
    pub recently_freed: Option<FreedCellsEvent>,
    pub returning: Vec<ReturningMarker>,
    pub edit_mode: bool,
    pub dragging: Option<WidgetId>,
}

/// Ephemeral per-widget gesture state. Never outlives its widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct GestureSlot {
    last_transition: u64,
    returning: Option<ReturningMarker>,
}

/// Engine orchestrator.
#[derive(Debug, Clone)]
pub struct LayoutSession {
    config: EngineConfig,
    registry: WidgetRegistry,
    drag: DragReconciler,
    gestures: FxHashMap<WidgetId, GestureSlot>,
    edit_mode: bool,
    recently_freed: Option<FreedCellsEvent>,
    events_applied: u64,
}

impl LayoutSession {
    /// Create an empty session. The configuration must validate.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        let config = config.validated()?;
        Ok(Self {
            registry: WidgetRegistry::new(config.grid),
            drag: DragReconciler::new(config.drag, config.cell),
            gestures: FxHashMap::default(),
            edit_mode: false,
            recently_freed: None,
            events_applied: 0,
            config,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn grid(&self) -> GridSize {
        self.config.grid
    }

    #[must_use]
    pub const fn registry(&self) -> &WidgetRegistry {
        &self.registry
    }

    /// Current widgets in insertion order.
    #[must_use]
    pub fn widgets(&self) -> &[Widget] {
        self.registry.widgets()
    }

    #[must_use]
    pub fn hint(&self) -> Option<HintBox> {
        self.drag.hint()
    }

    #[must_use]
    pub const fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    #[must_use]
    pub fn dragging(&self) -> Option<WidgetId> {
        self.drag.active_widget()
    }

    #[must_use]
    pub const fn recently_freed(&self) -> Option<&FreedCellsEvent> {
        self.recently_freed.as_ref()
    }

    /// Returning markers ordered by widget id.
    #[must_use]
    pub fn returning(&self) -> Vec<ReturningMarker> {
        let mut markers: Vec<_> = self
            .gestures
            .values()
            .filter_map(|slot| slot.returning)
            .collect();
        markers.sort_by_key(|marker| marker.widget);
        markers
    }

    /// Id of the last effective transition of the gesture tracked for `id`.
    #[must_use]
    pub fn gesture_transition(&self, id: WidgetId) -> Option<u64> {
        self.gestures.get(&id).map(|slot| slot.last_transition)
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            widgets: self.registry.widgets().to_vec(),
            hint: self.hint(),
            recently_freed: self.recently_freed.clone(),
            returning: self.returning(),
            edit_mode: self.edit_mode,
            dragging: self.dragging(),
        }
    }

    // -----------------------------------------------------------------------
    // Space queries
    // -----------------------------------------------------------------------

    /// Space statistics against the catalog sizes.
    #[must_use]
    pub fn analyze_space(&self, catalog: &WidgetCatalog) -> SpaceAnalysis {
        analyze_space(self.registry.widgets(), &catalog.sizes, self.grid())
    }

    /// Whether at least one free 1×1 cell exists.
    #[must_use]
    pub fn can_add_any(&self) -> bool {
        analyze_space(self.registry.widgets(), &[], self.grid()).has_any_space
    }

    /// Edit-mode overlay including the current recently-freed cells.
    #[must_use]
    pub fn occupancy_overlay(&self) -> OccupancyOverlay {
        let freed = self
            .recently_freed
            .as_ref()
            .map_or(&[][..], |event| event.cells.as_slice());
        OccupancyOverlay::build(self.registry.widgets(), freed, self.grid())
    }

    // -----------------------------------------------------------------------
    // Add / remove
    // -----------------------------------------------------------------------

    /// Validate against the catalog and place a widget at the first free cell.
    ///
    /// On [`LayoutError::NoSpace`] the report is re-analysed against the
    /// catalog sizes so it lists the alternatives that still fit.
    pub fn add_widget(
        &mut self,
        kind: &str,
        width: u16,
        height: u16,
        catalog: &WidgetCatalog,
    ) -> Result<Widget, LayoutError> {
        if kind.is_empty() || catalog.find_type(kind).is_none() {
            return Err(LayoutError::UnknownWidgetType { kind: kind.to_owned() });
        }
        if width == 0 || height == 0 {
            return Err(LayoutError::InvalidSize { width, height });
        }
        if catalog.find_size(width, height).is_none() {
            return Err(LayoutError::UnsupportedSize { width, height });
        }

        match self.registry.add(kind, width, height) {
            Ok(widget) => {
                self.drag.refresh_hint(&self.registry);
                Ok(widget)
            }
            Err(LayoutError::NoSpace(_)) => {
                let analysis = self.analyze_space(catalog);
                let report = NoSpaceReport::new(kind, width, height, analysis);
                tracing::info!(
                    target: "gridboard.session",
                    kind = %kind,
                    width,
                    height,
                    category = ?report.category,
                    "add refused: {report}"
                );
                Err(LayoutError::NoSpace(Box::new(report)))
            }
            Err(err) => Err(err),
        }
    }

    /// [`add_widget`](Self::add_widget) with the kind's catalog default size.
    pub fn add_widget_default(&mut self, kind: &str, catalog: &WidgetCatalog) -> Result<Widget, LayoutError> {
        let Some(spec) = catalog.find_type(kind) else {
            return Err(LayoutError::UnknownWidgetType { kind: kind.to_owned() });
        };
        let (width, height) = (spec.default_width, spec.default_height);
        self.add_widget(kind, width, height, catalog)
    }

    /// Remove a widget, publish its freed cells and drop any drag state for it.
    pub fn remove_widget(&mut self, id: WidgetId) -> Result<RemovedWidget, LayoutError> {
        let removed = self.registry.remove(id).inspect_err(|_| {
            tracing::warn!(target: "gridboard.session", %id, "remove of unknown widget ignored");
        })?;

        if self.drag.active_widget() == Some(id) {
            self.drag.cancel(id, DragCancelReason::WidgetRemoved);
        }
        self.drag.refresh_hint(&self.registry);
        self.gestures.remove(&id);
        self.publish_freed(removed.freed_cells.clone());
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Drag lifecycle
    // -----------------------------------------------------------------------

    /// Begin dragging `id`. Requires edit mode and no other live drag.
    pub fn move_drag_start(&mut self, id: WidgetId) -> Result<DragTransition, LayoutError> {
        if !self.edit_mode {
            return Err(LayoutError::EditModeInactive);
        }
        if let Some(active) = self.drag.active_widget() {
            tracing::debug!(
                target: "gridboard.session",
                %id,
                %active,
                "drag start refused while another drag is live"
            );
            return Err(LayoutError::DragInProgress { active });
        }
        let Some(widget) = self.registry.find_by_id(id) else {
            tracing::warn!(target: "gridboard.session", %id, "drag start for unknown widget ignored");
            return Err(LayoutError::NotFound { id });
        };

        let transition = self.drag.begin(widget);
        self.gestures.insert(
            id,
            GestureSlot {
                last_transition: transition.transition_id,
                returning: None,
            },
        );
        Ok(transition)
    }

    /// Feed the cumulative displacement of the live drag.
    ///
    /// Events for a widget that is not being dragged come back as no-ops.
    pub fn move_drag_update(&mut self, id: WidgetId, dx: f64, dy: f64) -> DragTransition {
        let transition = self.drag.update(id, dx, dy, &self.registry);
        self.touch_slot(id, &transition);
        transition
    }

    /// Release the live drag and commit or reject the move.
    ///
    /// A release for a widget that no longer exists (for example one removed
    /// mid-drag) fails with [`LayoutError::NotFound`]; a release for an
    /// existing widget that is not being dragged fails with
    /// [`LayoutError::NoActiveDrag`].
    pub fn move_drag_end(&mut self, id: WidgetId, dx: f64, dy: f64) -> Result<DragTransition, LayoutError> {
        if self.drag.active_widget() != Some(id) && !self.registry.contains(id) {
            tracing::warn!(target: "gridboard.session", %id, "drag end for unknown widget ignored");
            self.gestures.remove(&id);
            return Err(LayoutError::NotFound { id });
        }
        let transition = match self.drag.finish(id, dx, dy, &mut self.registry) {
            Ok(transition) => transition,
            Err(err) => {
                if err.is_not_found() {
                    self.gestures.remove(&id);
                }
                return Err(err);
            }
        };

        match &transition.effect {
            DragEffect::Committed { freed_cells, .. } => {
                self.gestures.remove(&id);
                self.publish_freed(freed_cells.clone());
            }
            DragEffect::Bounced { anchor, reason, .. } => {
                tracing::info!(target: "gridboard.session", %id, ?reason, "drop rejected, returning to anchor");
                self.mark_returning(id, *anchor, transition.transition_id);
            }
            _ => {
                self.gestures.remove(&id);
            }
        }
        Ok(transition)
    }

    /// Cancel the live drag of `id`; the widget returns to its anchor.
    pub fn move_drag_cancel(&mut self, id: WidgetId) -> DragTransition {
        let transition = self.drag.cancel(id, DragCancelReason::Gesture);
        if let DragEffect::Canceled { anchor, .. } = transition.effect {
            self.mark_returning(id, anchor, transition.transition_id);
        }
        transition
    }

    // -----------------------------------------------------------------------
    // Mode and reset
    // -----------------------------------------------------------------------

    /// Set edit mode. Leaving it cancels any live drag and drops gesture
    /// feedback; the cancel transition is returned.
    pub fn set_edit_mode(&mut self, enabled: bool) -> Option<DragTransition> {
        if self.edit_mode == enabled {
            return None;
        }
        self.edit_mode = enabled;
        tracing::info!(target: "gridboard.session", enabled, "edit mode changed");
        if enabled {
            return None;
        }
        self.gestures.clear();
        self.drag.force_cancel(DragCancelReason::EditModeExited)
    }

    /// Flip edit mode and return the new value.
    pub fn toggle_edit_mode(&mut self) -> bool {
        self.set_edit_mode(!self.edit_mode);
        self.edit_mode
    }

    /// Count to show in the reset confirmation.
    #[must_use]
    pub fn request_reset(&self) -> ResetPrompt {
        ResetPrompt {
            widget_count: self.registry.len(),
        }
    }

    /// Clear the registry and all ephemeral state after confirmation.
    ///
    /// The prompt must still match the current widget count. Returns the
    /// number of widgets removed.
    pub fn reset_all(&mut self, prompt: ResetPrompt) -> Result<usize, LayoutError> {
        let actual = self.registry.len();
        if prompt.widget_count != actual {
            return Err(LayoutError::ResetConfirmationStale {
                expected: prompt.widget_count,
                actual,
            });
        }
        if prompt.is_empty() {
            return Ok(0);
        }

        self.drag.force_cancel(DragCancelReason::Reset);
        let removed = self.registry.clear();
        self.gestures.clear();
        self.recently_freed = None;
        tracing::info!(target: "gridboard.session", removed, "layout reset");
        Ok(removed)
    }

    /// Drop feedback whose display timer has fired. `false` if it was
    /// already gone.
    pub fn expire_feedback(&mut self, kind: FeedbackKind) -> bool {
        match kind {
            FeedbackKind::RecentlyFreed => self.recently_freed.take().is_some(),
            FeedbackKind::Returning { widget } => {
                let Some(slot) = self.gestures.get_mut(&widget) else {
                    return false;
                };
                let had_marker = slot.returning.take().is_some();
                if self.drag.active_widget() != Some(widget) {
                    self.gestures.remove(&widget);
                }
                had_marker
            }
        }
    }

    pub(crate) fn next_event_seq(&mut self) -> u64 {
        self.events_applied = self.events_applied.saturating_add(1);
        self.events_applied
    }

    fn publish_freed(&mut self, cells: Vec<CellPoint>) {
        self.recently_freed = Some(FreedCellsEvent {
            cells,
            display_ms: self.config.feedback.freed_cells_ms,
        });
    }

    fn mark_returning(&mut self, id: WidgetId, anchor: CellPoint, transition_id: u64) {
        if !self.registry.contains(id) {
            self.gestures.remove(&id);
            return;
        }
        let display_ms = self.config.feedback.bounce_ms;
        self.gestures.insert(
            id,
            GestureSlot {
                last_transition: transition_id,
                returning: Some(ReturningMarker {
                    widget: id,
                    anchor,
                    display_ms,
                }),
            },
        );
    }

    fn touch_slot(&mut self, id: WidgetId, transition: &DragTransition) {
        if matches!(transition.effect, DragEffect::Noop { .. }) {
            return;
        }
        if let Some(slot) = self.gestures.get_mut(&id) {
            slot.last_transition = transition.transition_id;
        }
    }

    #[cfg(test)]
    fn gesture_slot_count(&self) -> usize {
        self.gestures.len()
    }
}
