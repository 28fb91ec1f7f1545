//! End-to-end layout scenarios on the reference 3×6 board.

use gridboard_layout::occupancy::{analyze_space, find_free_cell, is_free};
use gridboard_layout::{
    CellPoint, DragEffect, DragPhase, EngineConfig, GridRect, HintBox, LayoutError, LayoutSession,
    MoveOutcome, MoveRejection, NoSpaceCategory, WidgetCatalog, WidgetRegistry,
};

const STEP_PX: f64 = 100.0 + 4.0;

fn session() -> LayoutSession {
    LayoutSession::new(EngineConfig::default()).expect("default config")
}

#[test]
fn first_fit_scans_row_major() {
    let mut registry = WidgetRegistry::new(EngineConfig::default().grid);
    registry.add("profile", 2, 1).expect("room");
    registry.add("class", 1, 2).expect("room");
    assert_eq!(registry.widgets()[1].position(), CellPoint::new(2, 0));

    assert_eq!(
        find_free_cell(1, 1, registry.widgets(), None, registry.grid()),
        Some(CellPoint::new(0, 1))
    );
}

#[test]
fn queries_do_not_mutate() {
    let catalog = WidgetCatalog::standard();
    let mut registry = WidgetRegistry::new(EngineConfig::default().grid);
    registry.add("trophies", 2, 2).expect("room");
    registry.add("goals", 1, 1).expect("room");
    let before = registry.clone();

    let first = analyze_space(registry.widgets(), &catalog.sizes, registry.grid());
    let free = is_free(GridRect::new(0, 2, 3, 4), registry.widgets(), None, registry.grid());
    assert_eq!(
        analyze_space(registry.widgets(), &catalog.sizes, registry.grid()),
        first
    );
    assert_eq!(
        is_free(GridRect::new(0, 2, 3, 4), registry.widgets(), None, registry.grid()),
        free
    );
    assert_eq!(registry, before);
}

#[test]
fn single_large_widget_occupancy() {
    let catalog = WidgetCatalog::standard();
    let mut s = session();
    s.add_widget("trophies", 2, 2, &catalog).expect("room");
    let analysis = s.analyze_space(&catalog);
    assert!((analysis.occupancy_percentage - 22.22).abs() < 0.01);
    assert!(analysis.has_any_space);
    assert_eq!(analysis.occupied_cells, 4);
    assert_eq!(analysis.free_cells, 14);
}

#[test]
fn full_grid_refuses_another_widget() {
    let catalog = WidgetCatalog::standard();
    let mut s = session();
    for _ in 0..18 {
        s.add_widget("goals", 1, 1, &catalog).expect("room");
    }
    match s.add_widget("goals", 1, 1, &catalog) {
        Err(LayoutError::NoSpace(report)) => {
            assert_eq!(report.analysis.occupancy_percentage, 100.0);
            assert!(!report.analysis.has_any_space);
            assert_eq!(report.category, NoSpaceCategory::GridFull);
        }
        other => panic!("expected NoSpace, got {other:?}"),
    }
    assert_eq!(s.widgets().len(), 18);
}

#[test]
fn add_then_remove_round_trips() {
    let catalog = WidgetCatalog::standard();
    let mut s = session();
    let widget = s.add_widget("school", 2, 1, &catalog).expect("room");
    s.remove_widget(widget.id()).expect("present");
    assert!(s.widgets().is_empty());
    assert_eq!(
        find_free_cell(1, 1, s.widgets(), None, s.grid()),
        Some(CellPoint::new(0, 0))
    );
}

#[test]
fn rejected_move_keeps_position() {
    let mut registry = WidgetRegistry::new(EngineConfig::default().grid);
    let a = registry.add("goals", 1, 1).expect("room");
    let b = registry.add("trophies", 2, 2).expect("room");
    assert_eq!(b.position(), CellPoint::new(1, 0));

    let outcome = registry.move_widget(a.id(), 2, 1).expect("present");
    assert_eq!(
        outcome,
        MoveOutcome::Rejected {
            reason: MoveRejection::Overlap { blocker: b.id() }
        }
    );
    let after = registry.find_by_id(a.id()).expect("present");
    assert_eq!((after.grid_x(), after.grid_y()), (0, 0));
}

#[test]
fn drag_one_step_right_commits() {
    let catalog = WidgetCatalog::standard();
    let mut s = session();
    s.set_edit_mode(true);
    let widget = s.add_widget("goals", 1, 1, &catalog).expect("room");

    s.move_drag_start(widget.id()).expect("start");
    s.move_drag_update(widget.id(), STEP_PX, 0.0);
    assert_eq!(
        s.hint(),
        Some(HintBox {
            grid_x: 1,
            grid_y: 0,
            width: 1,
            height: 1,
            is_valid: true,
        })
    );

    let transition = s.move_drag_end(widget.id(), STEP_PX, 0.0).expect("end");
    assert_eq!(transition.via, Some(DragPhase::Committing));
    assert_eq!(transition.to, DragPhase::Idle);
    assert_eq!(s.widgets()[0].position(), CellPoint::new(1, 0));
}

#[test]
fn concurrent_drag_is_rejected() {
    let catalog = WidgetCatalog::standard();
    let mut s = session();
    s.set_edit_mode(true);
    let a = s.add_widget("goals", 1, 1, &catalog).expect("room");
    let b = s.add_widget("friends", 1, 1, &catalog).expect("room");

    s.move_drag_start(a.id()).expect("start");
    let before = s.snapshot();
    assert_eq!(
        s.move_drag_start(b.id()),
        Err(LayoutError::DragInProgress { active: a.id() })
    );
    assert_eq!(s.snapshot(), before);
}

#[test]
fn tap_is_distinct_from_bounce() {
    let catalog = WidgetCatalog::standard();
    let mut s = session();
    s.set_edit_mode(true);
    let a = s.add_widget("goals", 1, 1, &catalog).expect("room");
    s.add_widget("goals", 1, 1, &catalog).expect("room");

    s.move_drag_start(a.id()).expect("start");
    let tap = s.move_drag_end(a.id(), 20.0, -10.0).expect("end");
    assert!(matches!(tap.effect, DragEffect::Tapped { .. }));
    assert!(s.returning().is_empty());

    s.move_drag_start(a.id()).expect("start");
    let bounce = s.move_drag_end(a.id(), STEP_PX, 0.0).expect("end");
    assert!(matches!(bounce.effect, DragEffect::Bounced { .. }));
    assert_eq!(s.returning().len(), 1);
}

#[test]
fn custom_grid_from_config() {
    let mut config = EngineConfig::default();
    config.grid.columns = 4;
    config.grid.rows = 2;
    let catalog = WidgetCatalog::standard();
    let mut s = LayoutSession::new(config).expect("valid");
    for _ in 0..2 {
        s.add_widget("trophies", 2, 2, &catalog).expect("room");
    }
    assert_eq!(s.widgets()[1].position(), CellPoint::new(2, 0));
    assert!(!s.can_add_any());
}
