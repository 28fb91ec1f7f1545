#![no_main]

use arbitrary::Arbitrary;
use gridboard_layout::{EngineConfig, LayoutSession, WidgetCatalog, WidgetId};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Add { kind: u8, width: u8, height: u8 },
    AddDefault { kind: u8 },
    Remove { slot: u8 },
    DragStart { slot: u8 },
    DragUpdate { slot: u8, dx: i16, dy: i16 },
    DragEnd { slot: u8, dx: i16, dy: i16 },
    DragCancel { slot: u8 },
    EditMode(bool),
    Reset,
}

#[derive(Debug, Arbitrary)]
struct Input {
    columns: u8,
    rows: u8,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let mut config = EngineConfig::default();
    config.grid.columns = u16::from(input.columns % 12) + 1; // 1..=12
    config.grid.rows = u16::from(input.rows % 24) + 1; // 1..=24
    let Ok(mut session) = LayoutSession::new(config) else {
        return;
    };
    let catalog = WidgetCatalog::standard();

    for op in input.ops.into_iter().take(512) {
        // Slots address live widgets when there are any, stale ids otherwise.
        let pick = |session: &LayoutSession, slot: u8| -> WidgetId {
            let widgets = session.widgets();
            if widgets.is_empty() {
                WidgetId::new(u64::from(slot) + 1).unwrap_or(WidgetId::MIN)
            } else {
                widgets[usize::from(slot) % widgets.len()].id()
            }
        };
        match op {
            Op::Add {
                kind,
                width,
                height,
            } => {
                let kind = &catalog.types[usize::from(kind) % catalog.types.len()].kind;
                let _ = session.add_widget(kind, u16::from(width % 4), u16::from(height % 4), &catalog);
            }
            Op::AddDefault { kind } => {
                let kind = &catalog.types[usize::from(kind) % catalog.types.len()].kind;
                let _ = session.add_widget_default(kind, &catalog);
            }
            Op::Remove { slot } => {
                let id = pick(&session, slot);
                let _ = session.remove_widget(id);
            }
            Op::DragStart { slot } => {
                let id = pick(&session, slot);
                let _ = session.move_drag_start(id);
            }
            Op::DragUpdate { slot, dx, dy } => {
                let id = session.dragging().unwrap_or_else(|| pick(&session, slot));
                session.move_drag_update(id, f64::from(dx), f64::from(dy));
            }
            Op::DragEnd { slot, dx, dy } => {
                let id = session.dragging().unwrap_or_else(|| pick(&session, slot));
                let _ = session.move_drag_end(id, f64::from(dx), f64::from(dy));
            }
            Op::DragCancel { slot } => {
                let id = pick(&session, slot);
                session.move_drag_cancel(id);
            }
            Op::EditMode(enabled) => {
                session.set_edit_mode(enabled);
            }
            Op::Reset => {
                let _ = session.reset_all(session.request_reset());
            }
        }

        // Post-conditions that must always hold:
        let report = session.registry().invariant_report();
        assert!(report.is_empty(), "invariant breached: {report:?}");
        if let Some(active) = session.dragging() {
            assert!(session.edit_mode(), "drag live outside edit mode");
            assert!(session.registry().contains(active), "drag outlived widget");
        }
    }
});
