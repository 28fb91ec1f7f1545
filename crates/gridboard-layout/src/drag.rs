#![forbid(unsafe_code)]

//! Drag/drop reconciliation for one gesture at a time.
//!
//! ```text
//! Idle -> Dragging -> Committing -> Idle
//!             |   \-> Bouncing ----> Idle   (rejected drop, visual only)
//!             \-----> Idle                  (tap on the anchor, or cancel)
//! ```
//!
//! The reconciler turns a cumulative pixel displacement into a candidate
//! cell (snap with [`pixel_delta_to_cell_delta`], pin with
//! [`clamp_position`]) and exposes it as a [`HintBox`] while the gesture is
//! live. On release it asks the registry to commit the move. `Committing`
//! and `Bouncing` are reported in [`DragTransition::via`] but the machine
//! itself is always back in `Idle` when a call returns.
//!
//! Every update snaps to a candidate cell first, so a change of target is
//! never dropped. Only the occupancy check is throttled: while the candidate
//! stays the same it is re-run at most once per `update_hysteresis_px` of
//! travel. Release always recomputes from the final displacement, and
//! [`DragReconciler::refresh_hint`] re-checks the live hint after the
//! registry changed underneath it.

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::geometry::{
    CellMetrics, CellPoint, GridRect, clamp_position, exceeds_drag_threshold,
    pixel_delta_to_cell_delta,
};
use crate::occupancy::is_free;
use crate::registry::{MoveOutcome, MoveRejection, WidgetRegistry};
use crate::widget::{Widget, WidgetId};

/// Default pixel travel before a gesture counts as a drag.
pub const DRAG_DEFAULT_THRESHOLD_PX: f64 = 3.0;

/// Default pixel travel between two hint recomputations.
pub const DRAG_DEFAULT_HYSTERESIS_PX: f64 = 4.0;

/// Pixel thresholds for drag detection and hint throttling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragTuning {
    pub threshold_px: f64,
    pub update_hysteresis_px: f64,
}

impl Default for DragTuning {
    fn default() -> Self {
        Self {
            threshold_px: DRAG_DEFAULT_THRESHOLD_PX,
            update_hysteresis_px: DRAG_DEFAULT_HYSTERESIS_PX,
        }
    }
}

/// Proposed placement shown while a drag is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintBox {
    pub grid_x: u16,
    pub grid_y: u16,
    pub width: u16,
    pub height: u16,
    pub is_valid: bool,
}

impl HintBox {
    #[must_use]
    pub const fn position(&self) -> CellPoint {
        CellPoint::new(self.grid_x, self.grid_y)
    }
}

/// Lifecycle phase labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragPhase {
    Idle,
    Dragging,
    Committing,
    Bouncing,
}

/// Why a live drag ended without a commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragCancelReason {
    /// The gesture system interrupted the drag.
    Gesture,
    EditModeExited,
    Reset,
    WidgetRemoved,
}

/// Explicit no-op diagnostics for events that are safely ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragNoopReason {
    IdleWithoutActiveDrag,
    ActiveDragAlreadyInProgress,
    WidgetMismatch,
    ThresholdNotReached,
    BelowHysteresis,
    SameCandidate,
}

/// Effect emitted by one reconciler step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum DragEffect {
    Started {
        widget: WidgetId,
        anchor: CellPoint,
    },
    HintUpdated {
        hint: HintBox,
    },
    HintCleared,
    /// Released on the anchor cell: not a move.
    Tapped {
        widget: WidgetId,
        anchor: CellPoint,
    },
    Committed {
        widget: WidgetId,
        from: CellPoint,
        to: CellPoint,
        freed_cells: Vec<CellPoint>,
    },
    /// Drop refused; the widget animates back to `anchor`.
    Bounced {
        widget: WidgetId,
        anchor: CellPoint,
        target: CellPoint,
        reason: MoveRejection,
    },
    Canceled {
        widget: WidgetId,
        anchor: CellPoint,
        reason: DragCancelReason,
    },
    Noop {
        reason: DragNoopReason,
    },
}

/// One reconciler transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragTransition {
    pub transition_id: u64,
    pub from: DragPhase,
    /// Transient phase passed through on release, if any.
    pub via: Option<DragPhase>,
    pub to: DragPhase,
    pub effect: DragEffect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Evaluation {
    dx: f64,
    dy: f64,
    candidate: CellPoint,
}

/// State of a live drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveDrag {
    widget: WidgetId,
    anchor: CellPoint,
    width: u16,
    height: u16,
    last_evaluation: Option<Evaluation>,
    hint: Option<HintBox>,
}

impl ActiveDrag {
    #[must_use]
    pub const fn widget(&self) -> WidgetId {
        self.widget
    }

    /// Grid position captured at gesture start.
    #[must_use]
    pub const fn anchor(&self) -> CellPoint {
        self.anchor
    }

    #[must_use]
    pub const fn hint(&self) -> Option<HintBox> {
        self.hint
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Idle,
    Dragging(ActiveDrag),
}

/// Drag lifecycle machine. Holds at most one live drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragReconciler {
    state: DragState,
    tuning: DragTuning,
    metrics: CellMetrics,
    transition_counter: u64,
}

impl DragReconciler {
    #[must_use]
    pub fn new(tuning: DragTuning, metrics: CellMetrics) -> Self {
        Self {
            state: DragState::Idle,
            tuning,
            metrics,
            transition_counter: 0,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> DragPhase {
        match self.state {
            DragState::Idle => DragPhase::Idle,
            DragState::Dragging(_) => DragPhase::Dragging,
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// The live drag, if any.
    #[must_use]
    pub const fn active(&self) -> Option<&ActiveDrag> {
        match &self.state {
            DragState::Idle => None,
            DragState::Dragging(active) => Some(active),
        }
    }

    #[must_use]
    pub fn active_widget(&self) -> Option<WidgetId> {
        self.active().map(ActiveDrag::widget)
    }

    #[must_use]
    pub fn hint(&self) -> Option<HintBox> {
        self.active().and_then(ActiveDrag::hint)
    }

    #[must_use]
    pub const fn tuning(&self) -> DragTuning {
        self.tuning
    }

    /// Re-check the live hint against `registry` and return it.
    ///
    /// Call after the registry changed under a live drag. The cached
    /// candidate stays; only its validity is recomputed.
    pub fn refresh_hint(&mut self, registry: &WidgetRegistry) -> Option<HintBox> {
        let DragState::Dragging(mut active) = self.state else {
            return None;
        };
        let hint = active.hint?;
        let refreshed = Self::hint_at(&active, hint.position(), registry);
        if refreshed != active.hint {
            tracing::debug!(
                target: "gridboard.drag",
                widget = %active.widget,
                is_valid = refreshed.is_some_and(|h| h.is_valid),
                "live hint re-evaluated"
            );
            active.hint = refreshed;
            self.state = DragState::Dragging(active);
        }
        refreshed
    }

    /// Start dragging `widget`, anchored at its current position.
    ///
    /// Refused with a no-op while another drag is live.
    pub fn begin(&mut self, widget: &Widget) -> DragTransition {
        let from = self.phase();
        let effect = match self.state {
            DragState::Dragging(_) => DragEffect::Noop {
                reason: DragNoopReason::ActiveDragAlreadyInProgress,
            },
            DragState::Idle => {
                let anchor = widget.position();
                self.state = DragState::Dragging(ActiveDrag {
                    widget: widget.id(),
                    anchor,
                    width: widget.width(),
                    height: widget.height(),
                    last_evaluation: None,
                    hint: None,
                });
                DragEffect::Started {
                    widget: widget.id(),
                    anchor,
                }
            }
        };
        self.transition(from, None, effect)
    }

    /// Feed the cumulative displacement of the live gesture.
    pub fn update(&mut self, id: WidgetId, dx: f64, dy: f64, registry: &WidgetRegistry) -> DragTransition {
        let from = self.phase();
        let DragState::Dragging(mut active) = self.state else {
            return self.noop(from, DragNoopReason::IdleWithoutActiveDrag);
        };
        if active.widget != id {
            return self.noop(from, DragNoopReason::WidgetMismatch);
        }

        if !exceeds_drag_threshold(dx, dy, self.tuning.threshold_px) {
            if active.hint.is_none() {
                return self.noop(from, DragNoopReason::ThresholdNotReached);
            }
            active.hint = None;
            active.last_evaluation = None;
            self.state = DragState::Dragging(active);
            return self.transition(from, None, DragEffect::HintCleared);
        }

        let candidate = self.candidate(&active, dx, dy, registry);
        let same_candidate = active
            .last_evaluation
            .filter(|last| last.candidate == candidate);
        if let Some(last) = same_candidate {
            let hysteresis = self.tuning.update_hysteresis_px;
            if (dx - last.dx).abs() < hysteresis && (dy - last.dy).abs() < hysteresis {
                return self.noop(from, DragNoopReason::BelowHysteresis);
            }
        }
        active.last_evaluation = Some(Evaluation { dx, dy, candidate });

        let hint = Self::hint_at(&active, candidate, registry);
        if same_candidate.is_some() && hint == active.hint {
            self.state = DragState::Dragging(active);
            return self.noop(from, DragNoopReason::SameCandidate);
        }
        active.hint = hint;
        self.state = DragState::Dragging(active);
        let effect = match hint {
            Some(hint) => DragEffect::HintUpdated { hint },
            None => DragEffect::HintCleared,
        };
        self.transition(from, None, effect)
    }

    /// Release the live gesture at its final displacement.
    ///
    /// Returns [`LayoutError::NoActiveDrag`] (state untouched) for a stray
    /// release, and [`LayoutError::NotFound`] (drag dropped) when the widget
    /// vanished from the registry.
    pub fn finish(
        &mut self,
        id: WidgetId,
        dx: f64,
        dy: f64,
        registry: &mut WidgetRegistry,
    ) -> Result<DragTransition, LayoutError> {
        let from = self.phase();
        let DragState::Dragging(active) = self.state else {
            return Err(LayoutError::NoActiveDrag { id });
        };
        if active.widget != id {
            return Err(LayoutError::NoActiveDrag { id });
        }
        self.state = DragState::Idle;

        let target = self.candidate(&active, dx, dy, registry);
        if target == active.anchor {
            return Ok(self.transition(
                from,
                None,
                DragEffect::Tapped {
                    widget: id,
                    anchor: active.anchor,
                },
            ));
        }

        let outcome = registry
            .move_widget(id, i32::from(target.x), i32::from(target.y))
            .inspect_err(|_| {
                tracing::warn!(
                    target: "gridboard.drag",
                    %id,
                    "dragged widget vanished before release"
                );
            })?;
        Ok(match outcome {
            MoveOutcome::Committed {
                from: old,
                to,
                freed_cells,
            } => self.transition(
                from,
                Some(DragPhase::Committing),
                DragEffect::Committed {
                    widget: id,
                    from: old,
                    to,
                    freed_cells,
                },
            ),
            MoveOutcome::Rejected { reason } => self.transition(
                from,
                Some(DragPhase::Bouncing),
                DragEffect::Bounced {
                    widget: id,
                    anchor: active.anchor,
                    target,
                    reason,
                },
            ),
        })
    }

    /// Cancel the live drag of `id` without touching the registry.
    pub fn cancel(&mut self, id: WidgetId, reason: DragCancelReason) -> DragTransition {
        let from = self.phase();
        match self.state {
            DragState::Idle => self.noop(from, DragNoopReason::IdleWithoutActiveDrag),
            DragState::Dragging(active) if active.widget != id => {
                self.noop(from, DragNoopReason::WidgetMismatch)
            }
            DragState::Dragging(active) => {
                self.state = DragState::Idle;
                self.transition(
                    from,
                    None,
                    DragEffect::Canceled {
                        widget: active.widget,
                        anchor: active.anchor,
                        reason,
                    },
                )
            }
        }
    }

    /// Unconditionally return to Idle. `None` if nothing was live.
    pub fn force_cancel(&mut self, reason: DragCancelReason) -> Option<DragTransition> {
        let id = self.active_widget()?;
        Some(self.cancel(id, reason))
    }

    fn candidate(&self, active: &ActiveDrag, dx: f64, dy: f64, registry: &WidgetRegistry) -> CellPoint {
        let delta = pixel_delta_to_cell_delta(dx, dy, self.metrics);
        clamp_position(active.anchor, delta, active.width, active.height, registry.grid())
    }

    /// Hint for `candidate`; `None` on the anchor.
    fn hint_at(active: &ActiveDrag, candidate: CellPoint, registry: &WidgetRegistry) -> Option<HintBox> {
        if candidate == active.anchor {
            return None;
        }
        let rect = GridRect::at(candidate, active.width, active.height);
        Some(HintBox {
            grid_x: candidate.x,
            grid_y: candidate.y,
            width: active.width,
            height: active.height,
            is_valid: is_free(rect, registry.widgets(), Some(active.widget), registry.grid()),
        })
    }

    fn noop(&mut self, from: DragPhase, reason: DragNoopReason) -> DragTransition {
        self.transition(from, None, DragEffect::Noop { reason })
    }

    fn transition(&mut self, from: DragPhase, via: Option<DragPhase>, effect: DragEffect) -> DragTransition {
        self.transition_counter = self.transition_counter.saturating_add(1);
        let transition = DragTransition {
            transition_id: self.transition_counter,
            from,
            via,
            to: self.phase(),
            effect,
        };
        if !matches!(transition.effect, DragEffect::Noop { .. }) {
            tracing::debug!(
                target: "gridboard.drag",
                transition_id = transition.transition_id,
                from = ?transition.from,
                to = ?transition.to,
                effect = ?transition.effect,
                "drag transition"
            );
        }
        transition
    }
}
