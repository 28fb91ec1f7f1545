use std::fmt::Write as _;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use gridboard_layout::{
    DragEffect, EngineConfig, EventOutcome, EventReport, LayoutSession, SessionEvent,
    SessionSnapshot, WidgetCatalog,
};
use serde::Serialize;

use crate::error::{ReplayError, Result};

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// JSONL trace, one event per line.
    #[arg(long)]
    pub events: PathBuf,

    /// Engine configuration (`.toml` or `.json`).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Widget catalog as JSON; the standard catalog when omitted.
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Emit JSON lines instead of text.
    #[arg(long)]
    pub json: bool,

    /// Exit with status 2 when any event failed.
    #[arg(long)]
    pub strict: bool,
}

/// Result of replaying a whole trace.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    pub reports: Vec<EventReport>,
    pub failures: usize,
    pub snapshot: SessionSnapshot,
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ReplayError::MissingPath {
            path: path.to_path_buf(),
        })
    }
}

pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    ensure_exists(path)?;
    let config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => EngineConfig::from_json_file(path)?,
        Some("toml") | None => EngineConfig::from_toml_file(path)?,
        Some(other) => {
            return Err(ReplayError::invalid(format!(
                "unsupported config extension .{other} (expected .toml or .json)"
            )));
        }
    };
    Ok(config.validated()?)
}

pub fn load_catalog(path: Option<&Path>) -> Result<WidgetCatalog> {
    let Some(path) = path else {
        return Ok(WidgetCatalog::standard());
    };
    ensure_exists(path)?;
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Parse a JSONL trace. Blank lines and `#` comments are skipped.
pub fn read_trace(reader: impl BufRead) -> Result<Vec<SessionEvent>> {
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event = serde_json::from_str(trimmed).map_err(|e| ReplayError::TraceLine {
            line: index + 1,
            message: e.to_string(),
        })?;
        events.push(event);
    }
    Ok(events)
}

pub fn replay(
    config: EngineConfig,
    catalog: &WidgetCatalog,
    events: &[SessionEvent],
) -> Result<ReplaySummary> {
    let mut session = LayoutSession::new(config)?;
    let mut reports = Vec::with_capacity(events.len());
    let mut failures = 0;

    for event in events {
        let report = session.apply(event, catalog);
        if let EventOutcome::Failed { message, .. } = &report.outcome {
            failures += 1;
            tracing::debug!(seq = report.seq, %message, "event failed");
        }
        reports.push(report);
    }

    tracing::info!(events = reports.len(), failures, "trace replayed");
    Ok(ReplaySummary {
        reports,
        failures,
        snapshot: session.snapshot(),
    })
}

fn describe_outcome(outcome: &EventOutcome) -> String {
    match outcome {
        EventOutcome::Added { widget } => format!(
            "added {} {} ({}x{}) at ({}, {})",
            widget.id(),
            widget.kind(),
            widget.width(),
            widget.height(),
            widget.grid_x(),
            widget.grid_y()
        ),
        EventOutcome::Removed {
            widget,
            freed_cells,
        } => format!("removed {widget}, freed {} cells", freed_cells.len()),
        EventOutcome::Drag { transition } => match &transition.effect {
            DragEffect::Started { widget, anchor } => {
                format!("drag {widget} from ({}, {})", anchor.x, anchor.y)
            }
            DragEffect::HintUpdated { hint } => format!(
                "hint ({}, {}) {}",
                hint.grid_x,
                hint.grid_y,
                if hint.is_valid { "valid" } else { "blocked" }
            ),
            DragEffect::HintCleared => "hint cleared".to_string(),
            DragEffect::Tapped { widget, .. } => format!("tap on {widget}"),
            DragEffect::Committed { widget, to, .. } => {
                format!("moved {widget} to ({}, {})", to.x, to.y)
            }
            DragEffect::Bounced {
                widget,
                anchor,
                reason,
                ..
            } => format!(
                "bounced {widget} back to ({}, {}): {reason:?}",
                anchor.x, anchor.y
            ),
            DragEffect::Canceled { widget, reason, .. } => {
                format!("canceled drag of {widget} ({reason:?})")
            }
            DragEffect::Noop { reason } => format!("no-op ({reason:?})"),
        },
        EventOutcome::ResetPrompt { widget_count } => {
            format!("reset would remove {widget_count} widgets")
        }
        EventOutcome::Reset { removed } => format!("reset removed {removed} widgets"),
        EventOutcome::EditMode { enabled, canceled } => format!(
            "edit mode {}{}",
            if *enabled { "on" } else { "off" },
            if canceled.is_some() { ", drag canceled" } else { "" }
        ),
        EventOutcome::FeedbackExpired { expired } => {
            format!("feedback {}", if *expired { "expired" } else { "already gone" })
        }
        EventOutcome::Failed { message, .. } => format!("FAILED: {message}"),
    }
}

/// Board as text: widgets lettered in insertion order, `.` for free cells.
pub fn render_board(snapshot: &SessionSnapshot, columns: u16, rows: u16) -> String {
    let mut cells = vec!['.'; usize::from(columns) * usize::from(rows)];
    for (index, widget) in snapshot.widgets.iter().enumerate() {
        let letter = char::from(b'A' + (index % 26) as u8);
        for cell in widget.rect().cells() {
            if cell.x < columns && cell.y < rows {
                cells[usize::from(cell.y) * usize::from(columns) + usize::from(cell.x)] = letter;
            }
        }
    }
    let mut out = String::new();
    for row in cells.chunks(usize::from(columns.max(1))) {
        let line: Vec<String> = row.iter().map(char::to_string).collect();
        let _ = writeln!(out, "{}", line.join(" "));
    }
    out
}

pub fn write_text(summary: &ReplaySummary, config: &EngineConfig, out: &mut impl Write) -> Result<()> {
    for report in &summary.reports {
        writeln!(out, "#{:<4} {}", report.seq, describe_outcome(&report.outcome))?;
    }
    writeln!(out)?;
    write!(
        out,
        "{}",
        render_board(&summary.snapshot, config.grid.columns, config.grid.rows)
    )?;
    writeln!(
        out,
        "{} widgets, {} failed events",
        summary.snapshot.widgets.len(),
        summary.failures
    )?;
    Ok(())
}

pub fn write_json(summary: &ReplaySummary, out: &mut impl Write) -> Result<()> {
    for report in &summary.reports {
        serde_json::to_writer(&mut *out, report)?;
        writeln!(out)?;
    }
    serde_json::to_writer(
        &mut *out,
        &serde_json::json!({
            "failures": summary.failures,
            "snapshot": summary.snapshot,
        }),
    )?;
    writeln!(out)?;
    Ok(())
}

pub fn run_replay(args: RunArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let catalog = load_catalog(args.catalog.as_deref())?;
    ensure_exists(&args.events)?;
    let file = std::fs::File::open(&args.events)?;
    let events = read_trace(BufReader::new(file))?;
    tracing::debug!(path = %args.events.display(), events = events.len(), "trace loaded");

    let summary = replay(config, &catalog, &events)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if args.json {
        write_json(&summary, &mut out)?;
    } else {
        write_text(&summary, &config, &mut out)?;
    }

    if args.strict && summary.failures > 0 {
        return Err(ReplayError::exit(
            2,
            format!("{} of {} events failed", summary.failures, summary.reports.len()),
        ));
    }
    Ok(())
}

pub fn print_defaults(out: &mut impl Write) -> Result<()> {
    let text = EngineConfig::default().to_toml_string()?;
    write!(out, "{text}")?;
    Ok(())
}
