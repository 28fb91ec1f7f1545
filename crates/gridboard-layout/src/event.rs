#![forbid(unsafe_code)]

//! Serializable inbound events and their recorded outcomes.
//!
//! A trace is a sequence of [`SessionEvent`]s, one JSON object per line:
//!
//! ```text
//! {"event":"set_edit_mode","enabled":true}
//! {"event":"add_widget","kind":"goals","width":1,"height":1}
//! {"event":"drag_start","id":1}
//! {"event":"drag_update","id":1,"dx":104.0,"dy":0.0}
//! {"event":"drag_end","id":1,"dx":104.0,"dy":0.0}
//! ```
//!
//! [`LayoutSession::apply`] never fails: recoverable errors are recorded in
//! the [`EventReport`] so a whole trace can be replayed deterministically.

use serde::{Deserialize, Serialize};

use crate::drag::DragTransition;
use crate::error::LayoutError;
use crate::geometry::CellPoint;
use crate::session::{FeedbackKind, LayoutSession, ResetPrompt};
use crate::widget::{Widget, WidgetCatalog, WidgetId};

/// One inbound call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Without a size, the catalog default for `kind` is used.
    AddWidget {
        kind: String,
        #[serde(default)]
        width: Option<u16>,
        #[serde(default)]
        height: Option<u16>,
    },
    RemoveWidget {
        id: WidgetId,
    },
    DragStart {
        id: WidgetId,
    },
    DragUpdate {
        id: WidgetId,
        dx: f64,
        dy: f64,
    },
    DragEnd {
        id: WidgetId,
        dx: f64,
        dy: f64,
    },
    DragCancel {
        id: WidgetId,
    },
    RequestReset,
    /// Confirm a reset for the count shown in the prompt.
    ResetAll {
        widget_count: usize,
    },
    SetEditMode {
        enabled: bool,
    },
    ToggleEditMode,
    ExpireFeedback {
        feedback: FeedbackKind,
    },
}

/// What an event did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EventOutcome {
    Added {
        widget: Widget,
    },
    Removed {
        widget: WidgetId,
        freed_cells: Vec<CellPoint>,
    },
    Drag {
        transition: DragTransition,
    },
    ResetPrompt {
        widget_count: usize,
    },
    Reset {
        removed: usize,
    },
    EditMode {
        enabled: bool,
        canceled: Option<DragTransition>,
    },
    FeedbackExpired {
        expired: bool,
    },
    Failed {
        error: LayoutError,
        message: String,
    },
}

impl EventOutcome {
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl From<LayoutError> for EventOutcome {
    fn from(error: LayoutError) -> Self {
        Self::Failed {
            message: error.to_string(),
            error,
        }
    }
}

/// One applied event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventReport {
    /// 1-based position in the session's event stream.
    pub seq: u64,
    pub event: SessionEvent,
    pub outcome: EventOutcome,
}

impl LayoutSession {
    /// Dispatch one event and record its outcome.
    pub fn apply(&mut self, event: &SessionEvent, catalog: &WidgetCatalog) -> EventReport {
        let outcome = match event {
            SessionEvent::AddWidget {
                kind,
                width: Some(width),
                height: Some(height),
            } => self
                .add_widget(kind, *width, *height, catalog)
                .map(|widget| EventOutcome::Added { widget }),
            SessionEvent::AddWidget { kind, .. } => self
                .add_widget_default(kind, catalog)
                .map(|widget| EventOutcome::Added { widget }),
            SessionEvent::RemoveWidget { id } => {
                self.remove_widget(*id).map(|removed| EventOutcome::Removed {
                    widget: removed.widget.id(),
                    freed_cells: removed.freed_cells,
                })
            }
            SessionEvent::DragStart { id } => self
                .move_drag_start(*id)
                .map(|transition| EventOutcome::Drag { transition }),
            SessionEvent::DragUpdate { id, dx, dy } => Ok(EventOutcome::Drag {
                transition: self.move_drag_update(*id, *dx, *dy),
            }),
            SessionEvent::DragEnd { id, dx, dy } => self
                .move_drag_end(*id, *dx, *dy)
                .map(|transition| EventOutcome::Drag { transition }),
            SessionEvent::DragCancel { id } => Ok(EventOutcome::Drag {
                transition: self.move_drag_cancel(*id),
            }),
            SessionEvent::RequestReset => Ok(EventOutcome::ResetPrompt {
                widget_count: self.request_reset().widget_count,
            }),
            SessionEvent::ResetAll { widget_count } => self
                .reset_all(ResetPrompt {
                    widget_count: *widget_count,
                })
                .map(|removed| EventOutcome::Reset { removed }),
            SessionEvent::SetEditMode { enabled } => {
                let canceled = self.set_edit_mode(*enabled);
                Ok(EventOutcome::EditMode {
                    enabled: self.edit_mode(),
                    canceled,
                })
            }
            SessionEvent::ToggleEditMode => {
                let canceled = self.set_edit_mode(!self.edit_mode());
                Ok(EventOutcome::EditMode {
                    enabled: self.edit_mode(),
                    canceled,
                })
            }
            SessionEvent::ExpireFeedback { feedback } => Ok(EventOutcome::FeedbackExpired {
                expired: self.expire_feedback(*feedback),
            }),
        };

        EventReport {
            seq: self.next_event_seq(),
            event: event.clone(),
            outcome: outcome.unwrap_or_else(EventOutcome::from),
        }
    }
}
