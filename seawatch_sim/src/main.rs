//! SeaWatch Simulator CLI
//!
//! Run maritime surveillance scenarios headlessly and check their invariants.

use clap::Parser;
use seawatch_sim::scenarios::ScenarioId;
use seawatch_sim::{ScenarioResult, ScenarioRunner, SimError, SimulationConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// SeaWatch maritime surveillance simulator
#[derive(Parser, Debug)]
#[command(name = "seawatch-sim")]
#[command(about = "Run cable-protection surveillance scenarios", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of vessels per scenario
    #[arg(short = 'n', long)]
    vessels: Option<usize>,

    /// Scenario to run (baseline, enhanced, high_threat, quiet, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Number of consecutive seeds to run (sweep mode)
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u64).range(1..))]
    seeds: u64,

    /// Simulated duration in seconds
    #[arg(short, long)]
    duration: Option<f64>,

    /// Tick interval in milliseconds
    #[arg(short, long)]
    interval_ms: Option<u64>,

    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Drive ticks from the wall clock instead of a virtual clock
    #[arg(long)]
    realtime: bool,

    /// Export frames, events and report of a single scenario to a JSON file
    #[arg(long)]
    export: Option<PathBuf>,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn base_config(args: &Args) -> Result<SimulationConfig, SimError> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_json_file(path)?,
        None => SimulationConfig::default(),
    };

    if let Some(seed) = args.seed {
        config.seed = if seed == 0 {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(42)
        } else {
            seed
        };
    }
    if let Some(vessels) = args.vessels {
        config.vessel_count = vessels;
    }
    if let Some(duration) = args.duration {
        config.duration_secs = duration;
    }
    if let Some(interval) = args.interval_ms {
        config.tick_interval_ms = interval;
    }

    config.validate()?;
    Ok(config)
}

fn report_result(result: &ScenarioResult) {
    if result.passed {
        info!(
            "✓ {} (seed={}) PASSED | ticks={} events={} high={}",
            result.scenario.name(),
            result.seed,
            result.total_ticks,
            result.event_count,
            result.high_severity_events
        );
    } else {
        error!(
            "✗ {} (seed={}) FAILED: {}",
            result.scenario.name(),
            result.seed,
            result.failure_reason.as_deref().unwrap_or("unknown")
        );
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    if !args.json {
        info!("SeaWatch Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let base = match base_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        match args.scenario.parse() {
            Ok(id) => vec![id],
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!("Available scenarios: baseline, enhanced, high_threat, quiet, all");
                return ExitCode::FAILURE;
            }
        }
    };

    // Handle --export mode
    if let Some(export_path) = &args.export {
        let [scenario] = scenarios.as_slice() else {
            eprintln!("Error: --export only supports a single scenario, not 'all'");
            return ExitCode::FAILURE;
        };

        let (result, export) = ScenarioRunner::from_config(base).run_with_export(*scenario);
        if let Err(e) = export.write_to_file(export_path) {
            error!("Failed to write export: {}", e);
            return ExitCode::FAILURE;
        }
        info!("Exported {} frames to {}", export.frames.len(), export_path.display());

        report_result(&result);
        return if result.passed {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    // Run simulations
    let mut all_results: Vec<ScenarioResult> = Vec::new();
    for seed_offset in 0..args.seeds {
        let runner = ScenarioRunner::from_config(base.clone()).with_seed(base.seed.wrapping_add(seed_offset));

        for scenario in &scenarios {
            let result = if args.realtime {
                match runner.run_realtime(*scenario).await {
                    Ok(result) => result,
                    Err(e) => {
                        error!("{} aborted: {}", scenario.name(), e);
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                runner.run(*scenario)
            };

            if !args.json {
                report_result(&result);
            }
            all_results.push(result);
        }
    }

    // Summary
    let total = all_results.len();
    let failed: Vec<&ScenarioResult> = all_results.iter().filter(|r| !r.passed).collect();

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": total - failed.len(),
            "failed": failed.len(),
            "results": all_results,
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                error!("Failed to encode summary: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if failed.is_empty() {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed.len(), total);
            for result in &failed {
                error!(
                    "  - {} seed={}: {}",
                    result.scenario.name(),
                    result.seed,
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    // Exit with proper code for CI
    if failed.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
