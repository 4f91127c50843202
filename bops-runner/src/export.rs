//! Artifact export — CSV and JSON files for a backtest.
//!
//! Each run gets a directory named by its run id containing:
//! - `equity.csv`: `timestamp,equity`, one row per bar
//! - `trades.csv`: the trade log with exit reasons and excursions
//! - `metrics.json`: headline and extended statistics
//! - `manifest.json`: the full `BacktestResult`, schema-versioned
//!
//! Unknown schema versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bops_core::domain::{EquityPoint, Side, Trade};
use bops_core::engine::SkipReason;
use serde::Serialize;

use crate::config::RunId;
use crate::metrics::PerformanceMetrics;
use crate::runner::{BacktestResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

/// Contents of `metrics.json`.
#[derive(Debug, Serialize)]
struct MetricsReport<'a> {
    run_id: &'a RunId,
    symbol: &'a str,
    timeframe: &'a str,
    strategy: Option<&'a str>,
    status: &'static str,
    skip_reason: Option<SkipReason>,
    metrics: Option<&'a PerformanceMetrics>,
}

pub fn export_metrics_json(result: &BacktestResult) -> Result<String> {
    let completed = result.outcome.completed();
    let report = MetricsReport {
        run_id: &result.run_id,
        symbol: &result.symbol,
        timeframe: result.timeframe.as_str(),
        strategy: completed.map(|r| r.strategy.as_str()),
        status: if completed.is_some() { "completed" } else { "skipped" },
        skip_reason: result.outcome.skip_reason(),
        metrics: result.metrics.as_ref(),
    };
    serde_json::to_string_pretty(&report).context("failed to serialize metrics")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the equity curve as CSV with `timestamp,equity` columns.
///
/// Values are written at full precision and parse back to the same `f64`.
pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "equity"])?;
    for p in equity_curve {
        wtr.write_record([&p.timestamp.to_rfc3339(), &p.equity.to_string()])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the trade log as CSV.
///
/// Columns: side, entry_bar, entry_time, entry_price, entry_breadth, exit_bar,
/// exit_time, exit_price, exit_reason, size, gross_pnl, commission, net_pnl,
/// return_pct, bars_held, mae, mfe
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "side",
        "entry_bar",
        "entry_time",
        "entry_price",
        "entry_breadth",
        "exit_bar",
        "exit_time",
        "exit_price",
        "exit_reason",
        "size",
        "gross_pnl",
        "commission",
        "net_pnl",
        "return_pct",
        "bars_held",
        "mae",
        "mfe",
    ])?;

    for t in trades {
        let side = match t.side {
            Side::Long => "long",
            Side::Short => "short",
        };
        wtr.write_record([
            side,
            &t.entry_bar.to_string(),
            &t.entry_time.to_rfc3339(),
            &t.entry_price.to_string(),
            &t.entry_breadth.to_string(),
            &t.exit_bar.to_string(),
            &t.exit_time.to_rfc3339(),
            &t.exit_price.to_string(),
            &t.exit_reason.to_string(),
            &t.size.to_string(),
            &t.gross_pnl.to_string(),
            &t.commission.to_string(),
            &t.net_pnl.to_string(),
            &format!("{:.4}", t.return_pct() * 100.0),
            &t.bars_held.to_string(),
            &t.mae.to_string(),
            &t.mfe.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set under `output_dir/<run_id>/`.
///
/// Skipped runs still get a directory: empty CSVs (headers only) and a
/// `metrics.json` carrying the skip reason. Returns the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(&result.run_id);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let (equity, trades) = match result.outcome.completed() {
        Some(r) => (r.equity_curve.as_slice(), r.trades.as_slice()),
        None => (&[][..], &[][..]),
    };

    write(&run_dir.join("equity.csv"), &export_equity_csv(equity)?)?;
    write(&run_dir.join("trades.csv"), &export_trades_csv(trades)?)?;
    write(&run_dir.join("metrics.json"), &export_metrics_json(result)?)?;
    write(&run_dir.join("manifest.json"), &export_json(result)?)?;

    tracing::info!(run_id = %result.run_id, dir = %run_dir.display(), "artifacts saved");
    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's manifest.json.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
