#![no_main]

use gridboard_layout::{EngineConfig, LayoutSession, SessionEvent, WidgetCatalog};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(mut session) = LayoutSession::new(EngineConfig::default()) else {
        return;
    };
    let catalog = WidgetCatalog::standard();

    for line in text.lines().take(256) {
        let Ok(event) = serde_json::from_str::<SessionEvent>(line) else {
            continue;
        };
        let report = session.apply(&event, &catalog);
        // Every report must serialize back out.
        serde_json::to_string(&report).expect("report serializes");
        assert!(session.registry().invariant_report().is_empty());
    }
});
