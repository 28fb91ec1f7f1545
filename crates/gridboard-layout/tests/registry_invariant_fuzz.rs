//! Property/fuzz-style invariants for layout sessions.
//!
//! Random event streams (adds, removes, drags, cancels, mode flips, resets)
//! are driven through the public `LayoutSession` API. After every event the
//! registry must be in bounds and overlap-free, failed events must leave the
//! widget list untouched, and replaying the same stream must reproduce the
//! same final state.

use gridboard_layout::occupancy::is_free;
use gridboard_layout::{
    CellPoint, DragEffect, EngineConfig, EventOutcome, FeedbackKind, GridRect, LayoutSession,
    SessionEvent, Widget, WidgetCatalog, WidgetId,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0x9E37_79B9_7F4A_7C15,
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn choose_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        (self.next_u64() % len as u64) as usize
    }

    fn choose_bool(&mut self) -> bool {
        (self.next_u64() & 1) == 0
    }

    fn next_px(&mut self, max_cells: i64) -> f64 {
        let span = (2 * max_cells * 104 + 1) as u64;
        ((self.next_u64() % span) as i64 - max_cells * 104) as f64
    }
}

fn random_id(session: &LayoutSession, rng: &mut Lcg) -> WidgetId {
    let widgets = session.widgets();
    if widgets.is_empty() || rng.next_u64() % 8 == 0 {
        // Occasionally address an id that is gone or never existed.
        return WidgetId::new(1 + rng.next_u64() % 64).unwrap_or(WidgetId::MIN);
    }
    widgets[rng.choose_index(widgets.len())].id()
}

fn random_event(session: &LayoutSession, catalog: &WidgetCatalog, rng: &mut Lcg) -> SessionEvent {
    let live = session.dragging();
    match rng.next_u64() % 12 {
        0..=2 => {
            let kind = catalog.types[rng.choose_index(catalog.types.len())].kind.clone();
            if rng.choose_bool() {
                SessionEvent::AddWidget {
                    kind,
                    width: None,
                    height: None,
                }
            } else {
                let size = &catalog.sizes[rng.choose_index(catalog.sizes.len())];
                SessionEvent::AddWidget {
                    kind,
                    width: Some(size.width),
                    height: Some(size.height),
                }
            }
        }
        3 => SessionEvent::RemoveWidget {
            id: random_id(session, rng),
        },
        4 => SessionEvent::DragStart {
            id: random_id(session, rng),
        },
        5..=6 => SessionEvent::DragUpdate {
            id: live.unwrap_or_else(|| random_id(session, rng)),
            dx: rng.next_px(4),
            dy: rng.next_px(7),
        },
        7 => SessionEvent::DragEnd {
            id: live.unwrap_or_else(|| random_id(session, rng)),
            dx: rng.next_px(4),
            dy: rng.next_px(7),
        },
        8 => SessionEvent::DragCancel {
            id: live.unwrap_or_else(|| random_id(session, rng)),
        },
        9 => SessionEvent::SetEditMode {
            enabled: rng.next_u64() % 4 != 0,
        },
        10 => {
            if rng.next_u64() % 6 == 0 {
                SessionEvent::ResetAll {
                    widget_count: session.request_reset().widget_count,
                }
            } else {
                SessionEvent::ExpireFeedback {
                    feedback: FeedbackKind::RecentlyFreed,
                }
            }
        }
        _ => SessionEvent::ExpireFeedback {
            feedback: FeedbackKind::Returning {
                widget: random_id(session, rng),
            },
        },
    }
}

fn assert_disjoint_and_in_bounds(session: &LayoutSession) {
    let grid = session.grid();
    let widgets = session.widgets();
    let mut seen = vec![false; grid.cell_count() as usize];
    for widget in widgets {
        assert!(
            u32::from(widget.grid_x()) + u32::from(widget.width()) <= u32::from(grid.columns)
                && u32::from(widget.grid_y()) + u32::from(widget.height())
                    <= u32::from(grid.rows),
            "out of bounds: {widget:?}"
        );
        for cell in widget.rect().cells() {
            let index = usize::from(cell.y) * usize::from(grid.columns) + usize::from(cell.x);
            assert!(!seen[index], "cell {cell:?} claimed twice");
            seen[index] = true;
        }
    }
    assert!(session.registry().invariant_report().is_empty());
}

fn positions(widgets: &[Widget]) -> Vec<(WidgetId, CellPoint)> {
    widgets.iter().map(|w| (w.id(), w.position())).collect()
}

fn run_sequence(seed: u64, steps: usize) -> (LayoutSession, Vec<SessionEvent>) {
    let catalog = WidgetCatalog::standard();
    let mut session = LayoutSession::new(EngineConfig::default()).expect("default config");
    let mut rng = Lcg::new(seed);
    let mut events = Vec::with_capacity(steps);

    for _ in 0..steps {
        let event = random_event(&session, &catalog, &mut rng);
        let before = positions(session.widgets());
        let report = session.apply(&event, &catalog);

        if report.outcome.is_failure() {
            assert_eq!(
                positions(session.widgets()),
                before,
                "failed event mutated the registry: {report:?}"
            );
        }
        if let EventOutcome::Drag { transition } = &report.outcome {
            if let DragEffect::Bounced { widget, anchor, .. } = &transition.effect {
                let still = session.widgets().iter().find(|w| w.id() == *widget);
                assert_eq!(still.map(Widget::position), Some(*anchor));
            }
        }
        if !session.edit_mode() {
            assert_eq!(session.dragging(), None);
            assert_eq!(session.hint(), None);
        }
        if let Some(active) = session.dragging() {
            assert!(session.registry().contains(active), "drag outlived widget {active}");
        }
        if let (Some(active), Some(hint)) = (session.dragging(), session.hint()) {
            let rect = GridRect::at(hint.position(), hint.width, hint.height);
            let free = is_free(rect, session.widgets(), Some(active), session.grid());
            assert_eq!(hint.is_valid, free, "stale hint after {report:?}");
        }
        assert_disjoint_and_in_bounds(&session);
        events.push(event);
    }

    (session, events)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_event_streams_preserve_invariants(
        seed in any::<u64>(),
        steps in 20usize..160,
    ) {
        let (session, _) = run_sequence(seed, steps);
        assert_disjoint_and_in_bounds(&session);
    }

    #[test]
    fn random_event_streams_replay_deterministically(
        seed in any::<u64>(),
        steps in 20usize..100,
    ) {
        let (original, events) = run_sequence(seed, steps);
        let catalog = WidgetCatalog::standard();
        let mut replay = LayoutSession::new(EngineConfig::default()).expect("default config");
        for event in &events {
            replay.apply(event, &catalog);
        }
        prop_assert_eq!(replay.snapshot(), original.snapshot());
    }
}

#[test]
fn seed_corpus_preserves_invariants() {
    for seed in [0_u64, 1, 7, 42, 0xDEAD_BEEF, u64::MAX] {
        let (session, events) = run_sequence(seed, 400);
        assert_eq!(events.len(), 400);
        assert_disjoint_and_in_bounds(&session);
    }
}
