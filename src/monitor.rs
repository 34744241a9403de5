// =============================================================================
// Opening-Window Monitor — timed confirmation of pre-market candidates
// =============================================================================
//
// Watches the first minutes of the session (default 15) on a fixed tick
// (default 30 s), re-reading each watchlist entry's spot quote and intraday
// minute bars and re-running the open-signal checks. Per entity only the most
// recent observation counts; there is no cross-tick ordering beyond that.
// When the window elapses the accumulated signal counts collapse into three
// terminal buckets: buy-recommended, watch, avoid.
//
// Designed to be driven once per session:
//
//   let monitor = OpenWindowMonitor::new(cfg, watchlist);
//   let outcome = monitor.run(&provider).await;
//
// Cancellation is window-timeout only.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::time::{interval, Duration, Instant};
use tracing::{debug, info, warn};

use crate::data::MarketData;
use crate::indicators::sma::sma;
use crate::types::{Candidate, MinuteBar};

// =============================================================================
// Configuration
// =============================================================================

fn default_window_minutes() -> u64 {
    15
}

fn default_tick_secs() -> u64 {
    30
}

fn default_required_signals() -> usize {
    2
}

fn default_min_volume_ratio() -> f64 {
    1.3
}

fn default_max_display() -> usize {
    12
}

/// Opening-window monitor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u64,

    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,

    /// Signals required for a buy recommendation at window close.
    #[serde(default = "default_required_signals")]
    pub required_signals: usize,

    /// Minute-volume surge factor versus the trailing 5-minute mean.
    #[serde(default = "default_min_volume_ratio")]
    pub min_volume_ratio: f64,

    /// Entries shown per panel refresh in the log.
    #[serde(default = "default_max_display")]
    pub max_display: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            window_minutes: default_window_minutes(),
            tick_secs: default_tick_secs(),
            required_signals: default_required_signals(),
            min_volume_ratio: default_min_volume_ratio(),
            max_display: default_max_display(),
        }
    }
}

// =============================================================================
// Open signals
// =============================================================================

/// A confirmation observed during the opening window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpenSignal {
    /// Up more than 0.5% on the day.
    RelativeStrength,
    /// Up, but less than 0.5%.
    PriceUp,
    /// Last five minute-closes form a non-decreasing staircase.
    StaircaseRise,
    /// Price above the intraday 5-minute MA.
    AboveIntradayMa,
    /// Latest minute volume well above the trailing mean.
    VolumeSurge,
    /// Tight dispersion over the last ten minutes.
    LowDispersion,
}

impl std::fmt::Display for OpenSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RelativeStrength => write!(f, "relative-strength"),
            Self::PriceUp => write!(f, "price-up"),
            Self::StaircaseRise => write!(f, "staircase-rise"),
            Self::AboveIntradayMa => write!(f, "above-intraday-ma"),
            Self::VolumeSurge => write!(f, "volume-surge"),
            Self::LowDispersion => write!(f, "low-dispersion"),
        }
    }
}

/// Run the open-signal checks over one entity's latest observation. Pure.
pub fn analyze_open_signals(
    price: f64,
    change_pct: f64,
    minutes: &[MinuteBar],
    min_volume_ratio: f64,
) -> Vec<OpenSignal> {
    let mut signals = Vec::new();

    // 1) Day-level strength. The two levels are mutually exclusive.
    if change_pct.is_finite() {
        if change_pct > 0.5 {
            signals.push(OpenSignal::RelativeStrength);
        } else if change_pct > 0.0 {
            signals.push(OpenSignal::PriceUp);
        }
    }

    let closes: Vec<f64> = minutes.iter().map(|m| m.close).collect();
    let volumes: Vec<f64> = minutes.iter().map(|m| m.volume).collect();

    // 2) Staircase rise over the last five minute-closes.
    if closes.len() >= 6 {
        let recent = &closes[closes.len() - 5..];
        if recent.windows(2).all(|w| w[1] >= w[0]) {
            signals.push(OpenSignal::StaircaseRise);
        }
    }

    // 3) Price above the intraday 5-minute MA.
    if closes.len() >= 6 && price.is_finite() {
        if let Some(ma5) = sma(&closes, 5) {
            if price > ma5 {
                signals.push(OpenSignal::AboveIntradayMa);
            }
        }
    }

    // 4) Volume surge versus the trailing 5-minute mean.
    if volumes.len() >= 10 {
        let tail = &volumes[volumes.len() - 6..];
        let baseline = tail[..5].iter().sum::<f64>() / 5.0;
        let current = tail[5];
        if baseline > 0.0 && current / baseline >= min_volume_ratio {
            signals.push(OpenSignal::VolumeSurge);
        }
    }

    // 5) Tight dispersion over the last ten minutes.
    if closes.len() >= 12 && price.is_finite() && price > 0.0 {
        let window = &closes[closes.len() - 10..];
        let mean = window.iter().sum::<f64>() / window.len() as f64;
        let variance = window.iter().map(|c| (c - mean).powi(2)).sum::<f64>()
            / (window.len() - 1) as f64;
        if variance.sqrt() / price < 0.005 {
            signals.push(OpenSignal::LowDispersion);
        }
    }

    signals
}

// =============================================================================
// Monitor state and outcome
// =============================================================================

/// A watchlist entry carried into the opening window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchItem {
    pub symbol: String,
    pub name: String,
}

impl From<&Candidate> for WatchItem {
    fn from(c: &Candidate) -> Self {
        Self {
            symbol: c.symbol.clone(),
            name: c.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct EntityState {
    price: f64,
    change_pct: f64,
    signals: Vec<OpenSignal>,
}

/// One entity's final standing after the window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorEntry {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change_pct: f64,
    pub signals: Vec<OpenSignal>,
    pub signal_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSummary {
    pub total_watched: usize,
    pub buy_recommended: usize,
    pub watch_list: usize,
    pub avoid_list: usize,
}

/// Terminal decision buckets produced at window close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorOutcome {
    pub buy_recommended: Vec<MonitorEntry>,
    pub watch_list: Vec<MonitorEntry>,
    pub avoid_list: Vec<MonitorEntry>,
    pub summary: MonitorSummary,
}

// =============================================================================
// OpenWindowMonitor
// =============================================================================

pub struct OpenWindowMonitor {
    cfg: MonitorConfig,
    watchlist: Vec<WatchItem>,
    state: RwLock<HashMap<String, EntityState>>,
}

impl OpenWindowMonitor {
    pub fn new(cfg: MonitorConfig, watchlist: Vec<WatchItem>) -> Self {
        Self {
            cfg,
            watchlist,
            state: RwLock::new(HashMap::new()),
        }
    }

    /// Run for the configured window, then return the terminal buckets.
    pub async fn run<P: MarketData>(&self, provider: &P) -> MonitorOutcome {
        let deadline = Instant::now() + Duration::from_secs(self.cfg.window_minutes * 60);
        self.run_until(provider, deadline).await
    }

    /// Run until `deadline`. Exposed separately so tests can use short
    /// windows.
    pub async fn run_until<P: MarketData>(&self, provider: &P, deadline: Instant) -> MonitorOutcome {
        info!(
            watched = self.watchlist.len(),
            window_minutes = self.cfg.window_minutes,
            tick_secs = self.cfg.tick_secs,
            "opening-window monitor started"
        );

        let mut ticker = interval(Duration::from_secs(self.cfg.tick_secs.max(1)));
        loop {
            if Instant::now() >= deadline {
                break;
            }
            ticker.tick().await;
            if Instant::now() >= deadline {
                break;
            }
            self.update_all(provider).await;
            self.log_panel();
        }

        info!("opening window elapsed; generating final decisions");
        self.final_outcome()
    }

    async fn update_all<P: MarketData>(&self, provider: &P) {
        for item in &self.watchlist {
            let Some(quote) = provider.spot(&item.symbol).await else {
                // Keep the previous observation; the feed may recover on the
                // next tick.
                warn!(symbol = %item.symbol, "spot unavailable this tick");
                continue;
            };
            let minutes = provider.minute_bars(&item.symbol).await;
            let signals = analyze_open_signals(
                quote.price,
                quote.change_pct,
                &minutes,
                self.cfg.min_volume_ratio,
            );

            debug!(
                symbol = %item.symbol,
                price = quote.price,
                signals = signals.len(),
                "tick update"
            );

            // Most recent observation wins.
            self.state.write().insert(
                item.symbol.clone(),
                EntityState {
                    price: quote.price,
                    change_pct: quote.change_pct,
                    signals,
                },
            );
        }
    }

    fn log_panel(&self) {
        let state = self.state.read();
        let mut rows: Vec<(&WatchItem, usize)> = self
            .watchlist
            .iter()
            .map(|item| {
                let count = state.get(&item.symbol).map_or(0, |s| s.signals.len());
                (item, count)
            })
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.symbol.cmp(&b.0.symbol)));

        for (item, count) in rows.into_iter().take(self.cfg.max_display) {
            if let Some(s) = state.get(&item.symbol) {
                info!(
                    symbol = %item.symbol,
                    name = %item.name,
                    price = s.price,
                    change_pct = s.change_pct,
                    signals = count,
                    "monitor panel"
                );
            }
        }
    }

    fn final_outcome(&self) -> MonitorOutcome {
        let state = self.state.read();
        let mut buy_recommended = Vec::new();
        let mut watch_list = Vec::new();
        let mut avoid_list = Vec::new();

        for item in &self.watchlist {
            let observed = state.get(&item.symbol);
            let entry = MonitorEntry {
                symbol: item.symbol.clone(),
                name: item.name.clone(),
                price: observed.map_or(0.0, |s| s.price),
                change_pct: observed.map_or(0.0, |s| s.change_pct),
                signals: observed.map_or_else(Vec::new, |s| s.signals.clone()),
                signal_count: observed.map_or(0, |s| s.signals.len()),
            };

            if entry.signal_count >= self.cfg.required_signals {
                buy_recommended.push(entry);
            } else if entry.signal_count >= 1 {
                watch_list.push(entry);
            } else {
                avoid_list.push(entry);
            }
        }

        let summary = MonitorSummary {
            total_watched: self.watchlist.len(),
            buy_recommended: buy_recommended.len(),
            watch_list: watch_list.len(),
            avoid_list: avoid_list.len(),
        };

        MonitorOutcome {
            buy_recommended,
            watch_list,
            avoid_list,
            summary,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntitySeries, PeerQuote, SectorSnapshot};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn minute_bars(closes: &[f64], volumes: &[f64]) -> Vec<MinuteBar> {
        let base = NaiveDate::from_ymd_opt(2025, 8, 8)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        closes
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (&close, &volume))| MinuteBar {
                time: base + chrono::Duration::minutes(i as i64),
                close,
                volume,
            })
            .collect()
    }

    // ---- pure signal checks ----------------------------------------------

    #[test]
    fn day_strength_levels_are_exclusive() {
        let s = analyze_open_signals(10.0, 1.2, &[], 1.3);
        assert!(s.contains(&OpenSignal::RelativeStrength));
        assert!(!s.contains(&OpenSignal::PriceUp));

        let s = analyze_open_signals(10.0, 0.3, &[], 1.3);
        assert!(s.contains(&OpenSignal::PriceUp));
        assert!(!s.contains(&OpenSignal::RelativeStrength));

        let s = analyze_open_signals(10.0, -0.3, &[], 1.3);
        assert!(s.is_empty());
    }

    #[test]
    fn staircase_rise_needs_monotonic_tail() {
        let closes = [10.0, 10.01, 10.02, 10.02, 10.04, 10.05, 10.06];
        let vols = [1.0; 7];
        let s = analyze_open_signals(10.06, 0.0, &minute_bars(&closes, &vols), 1.3);
        assert!(s.contains(&OpenSignal::StaircaseRise));

        let closes = [10.0, 10.01, 10.05, 10.02, 10.04, 10.03, 10.06];
        let s = analyze_open_signals(10.06, 0.0, &minute_bars(&closes, &vols), 1.3);
        assert!(!s.contains(&OpenSignal::StaircaseRise));
    }

    #[test]
    fn above_intraday_ma_detected() {
        let closes = [10.0, 10.0, 10.0, 10.0, 10.0, 10.0];
        let vols = [1.0; 6];
        let s = analyze_open_signals(10.2, 0.0, &minute_bars(&closes, &vols), 1.3);
        assert!(s.contains(&OpenSignal::AboveIntradayMa));
        let s = analyze_open_signals(9.8, 0.0, &minute_bars(&closes, &vols), 1.3);
        assert!(!s.contains(&OpenSignal::AboveIntradayMa));
    }

    #[test]
    fn volume_surge_against_trailing_mean() {
        let closes = [10.0; 12];
        let mut vols = [100.0; 12];
        vols[11] = 200.0; // trailing mean of the prior five is 100
        let s = analyze_open_signals(10.0, 0.0, &minute_bars(&closes, &vols), 1.3);
        assert!(s.contains(&OpenSignal::VolumeSurge));

        vols[11] = 110.0;
        let s = analyze_open_signals(10.0, 0.0, &minute_bars(&closes, &vols), 1.3);
        assert!(!s.contains(&OpenSignal::VolumeSurge));
    }

    #[test]
    fn low_dispersion_on_quiet_tape() {
        let closes = [10.0; 15];
        let vols = [100.0; 15];
        let s = analyze_open_signals(10.0, 0.0, &minute_bars(&closes, &vols), 1.3);
        assert!(s.contains(&OpenSignal::LowDispersion));

        let mut wild = [10.0; 15];
        for (i, c) in wild.iter_mut().enumerate() {
            *c += if i % 2 == 0 { 0.5 } else { -0.5 };
        }
        let s = analyze_open_signals(10.0, 0.0, &minute_bars(&wild, &vols), 1.3);
        assert!(!s.contains(&OpenSignal::LowDispersion));
    }

    #[test]
    fn short_minute_history_limits_checks_to_day_level() {
        let closes = [10.0, 10.1];
        let vols = [1.0, 1.0];
        let s = analyze_open_signals(10.1, 1.0, &minute_bars(&closes, &vols), 1.3);
        assert_eq!(s, vec![OpenSignal::RelativeStrength]);
    }

    // ---- windowed run ----------------------------------------------------

    struct MockProvider {
        spots: HashMap<String, PeerQuote>,
        minutes: HashMap<String, Vec<MinuteBar>>,
    }

    impl MarketData for MockProvider {
        async fn sector_table(&self) -> Vec<SectorSnapshot> {
            Vec::new()
        }

        async fn sector_members(&self, _sector_code: &str) -> Vec<PeerQuote> {
            Vec::new()
        }

        async fn daily_history(&self, _symbol: &str, _lookback_days: u32) -> Option<EntitySeries> {
            None
        }

        async fn spot(&self, symbol: &str) -> Option<PeerQuote> {
            self.spots.get(symbol).cloned()
        }

        async fn minute_bars(&self, symbol: &str) -> Vec<MinuteBar> {
            self.minutes.get(symbol).cloned().unwrap_or_default()
        }
    }

    fn watch(symbol: &str) -> WatchItem {
        WatchItem {
            symbol: symbol.into(),
            name: format!("Issuer {symbol}"),
        }
    }

    fn strong_minutes() -> Vec<MinuteBar> {
        // Staircase closes and a final-volume surge.
        let closes: Vec<f64> = (0..12).map(|i| 10.0 + f64::from(i) * 0.01).collect();
        let mut vols = vec![100.0; 12];
        vols[11] = 300.0;
        minute_bars(&closes, &vols)
    }

    #[tokio::test(start_paused = true)]
    async fn window_produces_terminal_buckets() {
        let mut spots = HashMap::new();
        let mut minutes = HashMap::new();

        // Strong: relative strength + staircase + above MA + volume surge.
        spots.insert("600100".to_string(), PeerQuote {
            symbol: "600100".into(),
            name: "Strong".into(),
            price: 10.2,
            change_pct: 1.5,
        });
        minutes.insert("600100".to_string(), strong_minutes());

        // One signal only: small gain, no intraday data.
        spots.insert("600200".to_string(), PeerQuote {
            symbol: "600200".into(),
            name: "Tepid".into(),
            price: 8.0,
            change_pct: 0.2,
        });

        // Falling, no signals.
        spots.insert("600300".to_string(), PeerQuote {
            symbol: "600300".into(),
            name: "Fading".into(),
            price: 5.0,
            change_pct: -1.0,
        });

        let provider = MockProvider { spots, minutes };
        let monitor = OpenWindowMonitor::new(
            MonitorConfig {
                tick_secs: 1,
                ..Default::default()
            },
            vec![watch("600100"), watch("600200"), watch("600300")],
        );

        let outcome = monitor
            .run_until(&provider, Instant::now() + Duration::from_secs(3))
            .await;

        assert_eq!(outcome.summary.total_watched, 3);
        assert_eq!(outcome.buy_recommended.len(), 1);
        assert_eq!(outcome.buy_recommended[0].symbol, "600100");
        assert!(outcome.buy_recommended[0].signal_count >= 2);
        assert_eq!(outcome.watch_list.len(), 1);
        assert_eq!(outcome.watch_list[0].symbol, "600200");
        assert_eq!(outcome.avoid_list.len(), 1);
        assert_eq!(outcome.avoid_list[0].symbol, "600300");
    }

    #[tokio::test(start_paused = true)]
    async fn zero_window_sends_everything_to_avoid() {
        let provider = MockProvider {
            spots: HashMap::new(),
            minutes: HashMap::new(),
        };
        let monitor = OpenWindowMonitor::new(MonitorConfig::default(), vec![watch("600100")]);
        let outcome = monitor.run_until(&provider, Instant::now()).await;
        assert_eq!(outcome.avoid_list.len(), 1);
        assert_eq!(outcome.buy_recommended.len() + outcome.watch_list.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn latest_observation_wins_across_ticks() {
        // The provider reports a gain; the monitor should reflect whatever
        // the last tick saw, not an accumulation of earlier ticks.
        let mut spots = HashMap::new();
        spots.insert("600100".to_string(), PeerQuote {
            symbol: "600100".into(),
            name: "Strong".into(),
            price: 10.2,
            change_pct: 1.5,
        });
        let provider = MockProvider {
            spots,
            minutes: HashMap::new(),
        };
        let monitor = OpenWindowMonitor::new(
            MonitorConfig {
                tick_secs: 1,
                required_signals: 2,
                ..Default::default()
            },
            vec![watch("600100")],
        );
        let outcome = monitor
            .run_until(&provider, Instant::now() + Duration::from_secs(5))
            .await;
        // Only the day-level signal fires: exactly one signal, every tick.
        assert_eq!(outcome.watch_list.len(), 1);
        assert_eq!(outcome.watch_list[0].signal_count, 1);
    }
}
