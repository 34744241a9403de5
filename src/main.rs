// =============================================================================
// Argus Market Screener — Main Entry Point
// =============================================================================
//
// Picks the analysis mode off the session clock (or ARGUS_MODE), runs the
// two-scope screening funnel, and writes the run artifacts. In the opening
// window it hands the pre-market candidates to the live monitor instead.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod config;
mod data;
mod funnel;
mod indicators;
mod monitor;
mod rank;
mod report;
mod risk;
mod scoring;
mod screener;
mod sector;
mod session;
mod signal;
mod types;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::data::FeedClient;
use crate::funnel::GatePolicy;
use crate::monitor::{OpenWindowMonitor, WatchItem};
use crate::report::{render_text, ReportWriter, RunArtifact};
use crate::risk::PositionSizer;
use crate::screener::run_full_screening;
use crate::session::RunMode;

const CONFIG_PATH: &str = "screener_config.json";
const REPORT_DIR: &str = "reports";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Argus Market Screener starting up");

    let mut cfg = AppConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "failed to load config, using defaults");
        let defaults = AppConfig::default();
        // Leave an editable config behind for the next run.
        if let Err(e) = defaults.save(CONFIG_PATH) {
            warn!(error = %e, "could not write default config");
        }
        defaults
    });

    // Operator overrides from the environment.
    if let Some(threshold) = std::env::var("ARGUS_MIN_SCORE")
        .ok()
        .and_then(|raw| raw.parse::<f64>().ok())
    {
        cfg.screening = cfg.screening.clone().merged(config::ScreeningOverrides {
            lenient_threshold: Some(threshold),
            ..Default::default()
        })?;
    }

    let mode = std::env::var("ARGUS_MODE")
        .ok()
        .and_then(|raw| session::parse_mode(&raw))
        .unwrap_or_else(|| session::choose_mode(chrono::Local::now().time()));

    let condition = std::env::var("ARGUS_CONDITION")
        .ok()
        .and_then(|raw| session::parse_condition(&raw))
        .unwrap_or_default();

    let policy = match std::env::var("ARGUS_POLICY").ok().as_deref() {
        Some("strict") => GatePolicy::Strict,
        _ => GatePolicy::Lenient {
            threshold: cfg.screening.lenient_threshold,
        },
    };

    info!(%mode, %condition, ?policy, "run parameters resolved");

    // ── 2. Build the feed client ─────────────────────────────────────────
    let provider = FeedClient::new(cfg.feed.clone());

    // ── 3. Screen ────────────────────────────────────────────────────────
    let run = run_full_screening(&provider, &cfg, policy, condition).await?;

    println!("{}", render_text(&run));

    let sizer = PositionSizer::default();
    for allocation in sizer.allocate(&run.candidates) {
        if allocation.fraction > 0.0 {
            info!(
                symbol = %allocation.symbol,
                fraction = format!("{:.1}%", allocation.fraction * 100.0),
                "suggested position size"
            );
        }
    }

    let artifact = RunArtifact::from_run(&run);
    match ReportWriter::new(REPORT_DIR).save(&artifact) {
        Ok(paths) => info!(
            json = %paths.json.display(),
            csv = %paths.csv.display(),
            "run artifacts ready"
        ),
        Err(e) => warn!(error = %e, "failed to write run artifacts"),
    }

    // ── 4. Opening window: confirm candidates live ───────────────────────
    if mode == RunMode::OpenMonitor {
        let watchlist: Vec<WatchItem> = run.candidates.iter().map(WatchItem::from).collect();
        run_open_monitor(&provider, &cfg, &watchlist).await;
    }

    info!(%mode, candidates = run.candidates.len(), "run complete");
    Ok(())
}

async fn run_open_monitor(provider: &FeedClient, cfg: &AppConfig, watchlist: &[WatchItem]) {
    if watchlist.is_empty() {
        warn!("no candidates to monitor in the opening window");
        return;
    }

    let monitor = OpenWindowMonitor::new(cfg.monitor.clone(), watchlist.to_vec());
    let outcome = monitor.run(provider).await;

    info!(
        buy = outcome.summary.buy_recommended,
        watch = outcome.summary.watch_list,
        avoid = outcome.summary.avoid_list,
        "opening-window decisions"
    );
    for entry in &outcome.buy_recommended {
        info!(
            symbol = %entry.symbol,
            name = %entry.name,
            signals = entry.signal_count,
            "buy recommended"
        );
    }
    for entry in &outcome.avoid_list {
        info!(symbol = %entry.symbol, "avoid: opening signals insufficient");
    }
}
