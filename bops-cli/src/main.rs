//! BOPS command line: run one backtest, run a batch, or write a starter config.

mod obs;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use bops_core::components::StrategyVariant;
use bops_core::domain::Timeframe;
use bops_runner::batch::{run_batch, BatchJob};
use bops_runner::config::{BacktestConfig, DataSourceConfig, DEFAULT_CONFIG_TOML};
use bops_runner::data::build_provider;
use bops_runner::export::save_artifacts;
use bops_runner::runner::{run_backtest, BacktestResult};

#[derive(Parser)]
#[command(name = "bops", about = "BOPS breadth-of-price backtest engine")]
struct Cli {
    /// Log filter when BOPS_LOG is unset (e.g. info, debug, bops_runner=trace).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format: text or json.
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single backtest.
    Run {
        /// Path to TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the symbol.
        #[arg(long)]
        symbol: Option<String>,

        /// Override the bar interval (15m, 30m, 1h, 4h, 1d).
        #[arg(long)]
        timeframe: Option<String>,

        /// Override the start date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// Override the end date (YYYY-MM-DD).
        #[arg(long)]
        end: Option<String>,

        /// Read bars from a CSV file instead of the configured source.
        #[arg(long, conflicts_with = "synthetic")]
        csv: Option<PathBuf>,

        /// Use seeded synthetic bars instead of the configured source.
        #[arg(long)]
        synthetic: Option<u64>,

        /// Override the volume window of the active strategy.
        #[arg(long)]
        volume_window: Option<usize>,

        /// Directory for run artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print the summary only, write no artifacts.
        #[arg(long)]
        no_export: bool,
    },

    /// Run several configs in parallel.
    Batch {
        /// Config files, one job each.
        #[arg(required = true)]
        configs: Vec<PathBuf>,

        /// Directory for run artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print the summary only, write no artifacts.
        #[arg(long)]
        no_export: bool,
    },

    /// Write the annotated default config.
    InitConfig {
        /// Destination file. Prints to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Command-line replacements for config values.
#[derive(Default)]
struct Overrides {
    symbol: Option<String>,
    timeframe: Option<String>,
    start: Option<String>,
    end: Option<String>,
    csv: Option<PathBuf>,
    synthetic: Option<u64>,
    volume_window: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    obs::init_tracing(&cli.log_level, &cli.log_format)?;

    match cli.command {
        Commands::Run {
            config,
            symbol,
            timeframe,
            start,
            end,
            csv,
            synthetic,
            volume_window,
            output_dir,
            no_export,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            apply_overrides(
                &mut cfg,
                Overrides {
                    symbol,
                    timeframe,
                    start,
                    end,
                    csv,
                    synthetic,
                    volume_window,
                },
            )?;
            cfg.validate().context("invalid configuration")?;

            let provider = build_provider(&cfg.data).context("failed to set up data source")?;
            info!(
                symbol = %cfg.backtest.symbol,
                timeframe = %cfg.backtest.timeframe,
                source = provider.name(),
                "running backtest"
            );
            let result = run_backtest(&cfg, provider.as_ref())?;
            print_summary(&result);

            if !no_export {
                let run_dir = save_artifacts(&result, &output_dir)?;
                println!("\nArtifacts saved to: {}", run_dir.display());
            }
        }

        Commands::Batch {
            configs,
            output_dir,
            no_export,
        } => {
            let mut jobs = Vec::with_capacity(configs.len());
            for path in &configs {
                let cfg = load_config(Some(path))?;
                let provider = build_provider(&cfg.data)
                    .with_context(|| format!("failed to set up data source for {}", path.display()))?;
                let label = path.display().to_string();
                let job = BatchJob::fetch(label, cfg, provider.as_ref())
                    .with_context(|| format!("failed to load bars for {}", path.display()))?;
                jobs.push(job);
            }

            info!(jobs = jobs.len(), "running batch");
            let results = run_batch(&jobs);

            println!(
                "{:<32} {:<8} {:<4} {:>10} {:>8} {:>7} {:>7}",
                "Job", "Symbol", "TF", "Return %", "Sharpe", "Win %", "Trades"
            );
            println!("{}", "-".repeat(82));

            let mut failures = 0usize;
            for (job, outcome) in jobs.iter().zip(results) {
                match outcome {
                    Ok(result) => {
                        print_batch_row(&job.label, &result);
                        if !no_export {
                            save_artifacts(&result, &output_dir)?;
                        }
                    }
                    Err(err) => {
                        failures += 1;
                        error!(job = %job.label, error = %err, "batch job failed");
                        println!("{:<32} FAILED: {err}", truncate(&job.label, 32));
                    }
                }
            }

            if !no_export {
                println!("\nArtifacts saved under: {}", output_dir.display());
            }
            if failures > 0 {
                bail!("{failures} of {} batch jobs failed", jobs.len());
            }
        }

        Commands::InitConfig { output, force } => match output {
            Some(path) => {
                if path.exists() && !force {
                    bail!("{} already exists (use --force to overwrite)", path.display());
                }
                std::fs::write(&path, DEFAULT_CONFIG_TOML)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("Wrote default config to {}", path.display());
            }
            None => print!("{DEFAULT_CONFIG_TOML}"),
        },
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<BacktestConfig> {
    match path {
        Some(p) => BacktestConfig::from_file(p)
            .with_context(|| format!("failed to load config {}", p.display())),
        None => Ok(BacktestConfig::default()),
    }
}

fn apply_overrides(cfg: &mut BacktestConfig, overrides: Overrides) -> Result<()> {
    if let Some(symbol) = overrides.symbol {
        cfg.backtest.symbol = symbol;
    }
    if let Some(tf) = overrides.timeframe {
        cfg.backtest.timeframe = tf.parse::<Timeframe>()?;
    }
    if let Some(start) = overrides.start {
        cfg.backtest.start = parse_date(&start)?;
    }
    if let Some(end) = overrides.end {
        cfg.backtest.end = Some(parse_date(&end)?);
    }
    if let Some(path) = overrides.csv {
        cfg.data = DataSourceConfig::Csv { path };
    }
    if let Some(seed) = overrides.synthetic {
        cfg.data = DataSourceConfig::Synthetic { seed };
    }
    if let Some(window) = overrides.volume_window {
        match &mut cfg.strategy {
            StrategyVariant::BarPattern { volume_window }
            | StrategyVariant::SmaCrossover { volume_window, .. } => *volume_window = window,
        }
    }
    Ok(())
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}' (expected YYYY-MM-DD)"))
}

fn truncate(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len <= width {
        return s.to_string();
    }
    let tail: String = s.chars().skip(len - width.saturating_sub(3)).collect();
    format!("...{tail}")
}

fn print_batch_row(label: &str, result: &BacktestResult) {
    let label = truncate(label, 32);
    match (&result.metrics, result.outcome.skip_reason()) {
        (Some(m), _) => println!(
            "{:<32} {:<8} {:<4} {:>10.2} {:>8.3} {:>7.1} {:>7}",
            label,
            result.symbol,
            result.timeframe.as_str(),
            m.total_return_pct,
            m.sharpe,
            m.win_rate_pct,
            m.trade_count
        ),
        (None, Some(reason)) => println!(
            "{:<32} {:<8} {:<4} SKIPPED: {reason}",
            label,
            result.symbol,
            result.timeframe.as_str()
        ),
        (None, None) => println!("{label:<32} no metrics"),
    }
}

fn print_summary(result: &BacktestResult) {
    println!("\n=== Backtest Result ===");
    println!("Run ID:         {}", result.run_id);
    println!("Symbol:         {}", result.symbol);
    println!("Timeframe:      {}", result.timeframe);
    println!("Range:          {} to {}", result.start, result.end);
    println!("Data Source:    {}", result.data_source);
    println!("Dataset Hash:   {}", result.dataset_hash);

    let Some(run) = result.outcome.completed() else {
        if let Some(reason) = result.outcome.skip_reason() {
            println!("\nSkipped:        {reason}");
        }
        return;
    };

    println!("Strategy:       {}", run.strategy);
    println!("Breadth:        {}", run.breadth_source);
    println!("Bars:           {}", run.equity_curve.len());
    println!("Warm-up Bars:   {}", run.warmup_bars);

    let Some(m) = &result.metrics else {
        return;
    };

    println!("\n--- Performance ---");
    println!("Total Return:   {:.2}%", m.total_return_pct);
    println!("Buy & Hold:     {:.2}%", m.buy_and_hold_pct);
    println!("Sharpe:         {:.3}", m.sharpe);
    println!("Sortino:        {:.3}", m.sortino);
    println!("Max Drawdown:   {:.2}%", m.max_drawdown_pct);
    println!("Final Equity:   {:.2}", m.final_equity);
    println!("Peak Equity:    {:.2}", m.peak_equity);
    println!("Exposure:       {:.1}%", m.exposure_pct);

    println!("\n--- Trades ---");
    println!("Trade Count:    {}", m.trade_count);
    println!("Win Rate:       {:.1}%", m.win_rate_pct);
    println!("Avg Trade:      {:.3}%", m.avg_trade_pct);
    println!("Best Trade:     {:.3}%", m.best_trade_pct);
    println!("Worst Trade:    {:.3}%", m.worst_trade_pct);
    println!("Profit Factor:  {:.2}", m.profit_factor);
    println!("Expectancy:     {:.4}", m.expectancy);

    let mut by_reason: Vec<(String, usize)> = Vec::new();
    for t in &run.trades {
        let key = t.exit_reason.to_string();
        match by_reason.iter_mut().find(|(k, _)| *k == key) {
            Some((_, n)) => *n += 1,
            None => by_reason.push((key, 1)),
        }
    }
    if !by_reason.is_empty() {
        println!("\n--- Exits ---");
        for (reason, n) in by_reason {
            println!("{reason:<15} {n}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_config_values() {
        let mut cfg = BacktestConfig::default();
        apply_overrides(
            &mut cfg,
            Overrides {
                symbol: Some("YM=F".into()),
                timeframe: Some("4h".into()),
                start: Some("2024-02-01".into()),
                end: Some("2024-03-01".into()),
                synthetic: Some(42),
                volume_window: Some(10),
                ..Overrides::default()
            },
        )
        .unwrap();

        assert_eq!(cfg.backtest.symbol, "YM=F");
        assert_eq!(cfg.backtest.timeframe, Timeframe::H4);
        assert_eq!(cfg.backtest.start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(cfg.backtest.end, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(cfg.data, DataSourceConfig::Synthetic { seed: 42 });
        assert_eq!(cfg.strategy, StrategyVariant::BarPattern { volume_window: 10 });
    }

    #[test]
    fn bad_override_is_an_error() {
        let mut cfg = BacktestConfig::default();
        let err = apply_overrides(
            &mut cfg,
            Overrides {
                timeframe: Some("7m".into()),
                ..Overrides::default()
            },
        );
        assert!(err.is_err());

        let err = apply_overrides(
            &mut cfg,
            Overrides {
                start: Some("01/02/2024".into()),
                ..Overrides::default()
            },
        );
        assert!(err.is_err());
    }

    #[test]
    fn truncate_keeps_tail() {
        assert_eq!(truncate("short", 32), "short");
        assert_eq!(truncate("configs/very/long/path.toml", 12), "...path.toml");
    }

    #[test]
    fn cli_parses_run_flags() {
        let cli = Cli::try_parse_from([
            "bops", "run", "--synthetic", "3", "--timeframe", "15m", "--no-export",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                synthetic,
                timeframe,
                no_export,
                ..
            } => {
                assert_eq!(synthetic, Some(3));
                assert_eq!(timeframe.as_deref(), Some("15m"));
                assert!(no_export);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn csv_and_synthetic_conflict() {
        assert!(Cli::try_parse_from(["bops", "run", "--csv", "a.csv", "--synthetic", "1"]).is_err());
    }
}
