use std::fs;
use std::io::BufReader;

use gridboard_layout::{EngineConfig, EventOutcome, LayoutError, NoSpaceCategory};
use gridboard_replay::ReplayError;
use gridboard_replay::replay::{RunArgs, load_catalog, load_config, read_trace, replay, run_replay};
use tempfile::tempdir;

const NARROW_CATALOG: &str = r#"{
    "types": [{"kind": "note", "default_width": 1, "default_height": 1}],
    "sizes": [
        {"width": 1, "height": 1, "label": "Small"},
        {"width": 2, "height": 1, "label": "Wide"}
    ]
}"#;

#[test]
fn config_and_catalog_files_drive_the_session() {
    let dir = tempdir().expect("tempdir");
    let config_path = dir.path().join("engine.toml");
    fs::write(&config_path, "[grid]\ncolumns = 2\nrows = 1\n").expect("write config");
    let catalog_path = dir.path().join("catalog.json");
    fs::write(&catalog_path, NARROW_CATALOG).expect("write catalog");
    let trace_path = dir.path().join("trace.jsonl");
    fs::write(
        &trace_path,
        concat!(
            "{\"event\":\"add_widget\",\"kind\":\"note\"}\n",
            "{\"event\":\"add_widget\",\"kind\":\"note\",\"width\":2,\"height\":1}\n",
            "{\"event\":\"add_widget\",\"kind\":\"goals\"}\n",
        ),
    )
    .expect("write trace");

    let config = load_config(Some(config_path.as_path())).expect("config");
    assert_eq!((config.grid.columns, config.grid.rows), (2, 1));
    let catalog = load_catalog(Some(catalog_path.as_path())).expect("catalog");
    let file = fs::File::open(&trace_path).expect("open trace");
    let events = read_trace(BufReader::new(file)).expect("trace");

    let summary = replay(config, &catalog, &events).expect("replay");
    assert_eq!(summary.failures, 2);
    match &summary.reports[1].outcome {
        EventOutcome::Failed {
            error: LayoutError::NoSpace(report),
            ..
        } => {
            assert_eq!(
                report.category,
                NoSpaceCategory::SizeUnavailable {
                    alternatives: vec![catalog.sizes[0].clone()]
                }
            );
        }
        other => panic!("expected NoSpace, got {other:?}"),
    }
    assert!(matches!(
        &summary.reports[2].outcome,
        EventOutcome::Failed {
            error: LayoutError::UnknownWidgetType { .. },
            ..
        }
    ));
}

#[test]
fn json_config_is_accepted() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("engine.json");
    fs::write(&path, r#"{"drag": {"threshold_px": 10.0}}"#).expect("write config");
    let config = load_config(Some(path.as_path())).expect("config");
    assert_eq!(config.drag.threshold_px, 10.0);
    assert_eq!(config.grid, EngineConfig::default().grid);
}

#[test]
fn invalid_config_maps_to_config_exit_code() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("engine.toml");
    fs::write(&path, "[grid]\nrows = 0\n").expect("write config");
    let err = load_config(Some(path.as_path())).expect_err("rows must be positive");
    assert!(matches!(err, ReplayError::Config(_)));
    assert_eq!(err.exit_code(), 78);
}

#[test]
fn unsupported_config_extension_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("engine.yaml");
    fs::write(&path, "grid: {}\n").expect("write config");
    assert!(matches!(
        load_config(Some(path.as_path())),
        Err(ReplayError::InvalidArgument { .. })
    ));
}

#[test]
fn strict_mode_fails_on_failed_events() {
    let dir = tempdir().expect("tempdir");
    let trace_path = dir.path().join("trace.jsonl");
    fs::write(&trace_path, "{\"event\":\"drag_start\",\"id\":1}\n").expect("write trace");

    let args = RunArgs {
        events: trace_path,
        config: None,
        catalog: None,
        json: true,
        strict: true,
    };
    let err = run_replay(args).expect_err("edit mode is off");
    assert_eq!(err.exit_code(), 2);
    assert_eq!(err.to_string(), "1 of 1 events failed");
}
