// =============================================================================
// Screening Configuration — immutable engine settings with atomic save
// =============================================================================
//
// Central configuration for the Argus screening engine. A config value is
// built exactly once per run — either from defaults, from a JSON file, or from
// defaults plus an explicit [`ScreeningOverrides`] merge — and then injected
// by reference into the engines. Nothing mutates it afterwards.
//
// Validation is eager: a missing required weight or a non-finite threshold is
// a construction-time [`ConfigError`], never a per-evaluation surprise.
//
// Persistence uses an atomic tmp + rename pattern. All fields carry
// `#[serde(default)]` so that adding new fields never breaks loading an older
// config file.
// =============================================================================

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::scoring::Category;

/// Errors raised while constructing or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("weight map is missing required category '{0}'")]
    MissingWeight(Category),

    #[error("weight for category '{category}' is not a positive finite number: {value}")]
    InvalidWeight { category: Category, value: f64 },

    #[error("threshold '{name}' is not finite: {value}")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("price bounds inverted: min {min} > max {max}")]
    InvertedPriceBounds { min: f64, max: f64 },

    #[error("momentum band inverted: min {min} > max {max}")]
    InvertedMomentumBand { min: f64, max: f64 },

    #[error("moving-average windows must be strictly increasing and non-zero: {short}/{mid}/{long}")]
    InvalidMaWindows {
        short: usize,
        mid: usize,
        long: usize,
    },
}

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_weights() -> BTreeMap<Category, f64> {
    BTreeMap::from([
        (Category::Trend, 0.25),
        (Category::Momentum, 0.25),
        (Category::Volume, 0.20),
        (Category::Volatility, 0.15),
        (Category::Position, 0.15),
    ])
}

fn default_ma_windows() -> MaWindows {
    MaWindows {
        short: 5,
        mid: 10,
        long: 20,
    }
}

fn default_min_price() -> f64 {
    5.0
}

fn default_max_price() -> f64 {
    200.0
}

fn default_limit_move_pct() -> f64 {
    11.0
}

fn default_min_trading_days() -> usize {
    60
}

fn default_min_5d_change() -> f64 {
    2.0
}

fn default_max_5d_change() -> f64 {
    15.0
}

fn default_min_20d_change() -> f64 {
    5.0
}

fn default_max_volatility() -> f64 {
    0.40
}

fn default_volume_ratio_threshold() -> f64 {
    1.2
}

fn default_lenient_threshold() -> f64 {
    60.0
}

fn default_position_window() -> usize {
    20
}

fn default_max_candidates() -> usize {
    10
}

fn default_fallback_top_k() -> usize {
    3
}

fn default_name_blacklist() -> Vec<String> {
    ["ST", "*ST", "DELIST", "HALT"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Moving-average window triple used by the trend scorer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MaWindows {
    pub short: usize,
    pub mid: usize,
    pub long: usize,
}

// =============================================================================
// ScreeningConfig (instrument scope)
// =============================================================================

/// Tunable parameters for the instrument-scope screening engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningConfig {
    /// Weight per category. The five core categories (trend, momentum,
    /// volume, volatility, position) are required; money-flow and pattern
    /// weights are optional extensions. Weights should sum to 1 — that is a
    /// convention, not an enforced invariant.
    #[serde(default = "default_weights")]
    pub weights: BTreeMap<Category, f64>,

    /// Moving-average windows for the trend scorer.
    #[serde(default = "default_ma_windows")]
    pub ma_windows: MaWindows,

    // --- Pre-filter bounds ---------------------------------------------------
    #[serde(default = "default_min_price")]
    pub min_price: f64,

    #[serde(default = "default_max_price")]
    pub max_price: f64,

    /// Single-day percent moves at or beyond this magnitude are treated as
    /// limit-up/limit-down extremes and excluded by the pre-filter.
    #[serde(default = "default_limit_move_pct")]
    pub limit_move_pct: f64,

    /// Minimum bar count a history must carry to be scored at all.
    #[serde(default = "default_min_trading_days")]
    pub min_trading_days: usize,

    // --- Momentum band -------------------------------------------------------
    #[serde(default = "default_min_5d_change")]
    pub min_5d_change: f64,

    #[serde(default = "default_max_5d_change")]
    pub max_5d_change: f64,

    #[serde(default = "default_min_20d_change")]
    pub min_20d_change: f64,

    // --- Volatility / volume / position -------------------------------------
    /// Annualized volatility ceiling; above it the volatility category
    /// classifies as high.
    #[serde(default = "default_max_volatility")]
    pub max_volatility: f64,

    #[serde(default = "default_volume_ratio_threshold")]
    pub volume_ratio_threshold: f64,

    /// Lookback window for range position and the stop-loss rolling low.
    #[serde(default = "default_position_window")]
    pub position_window: usize,

    // --- Gating & ranking ----------------------------------------------------
    /// Total-score floor for the lenient gate policy.
    #[serde(default = "default_lenient_threshold")]
    pub lenient_threshold: f64,

    /// Maximum candidates returned per sector.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    /// Size of the best-available fallback when nothing clears the gate.
    #[serde(default = "default_fallback_top_k")]
    pub fallback_top_k: usize,

    /// Name markers that exclude an instrument outright (delisted or
    /// risk-flagged issues).
    #[serde(default = "default_name_blacklist")]
    pub name_blacklist: Vec<String>,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            weights: default_weights(),
            ma_windows: default_ma_windows(),
            min_price: default_min_price(),
            max_price: default_max_price(),
            limit_move_pct: default_limit_move_pct(),
            min_trading_days: default_min_trading_days(),
            min_5d_change: default_min_5d_change(),
            max_5d_change: default_max_5d_change(),
            min_20d_change: default_min_20d_change(),
            max_volatility: default_max_volatility(),
            volume_ratio_threshold: default_volume_ratio_threshold(),
            position_window: default_position_window(),
            lenient_threshold: default_lenient_threshold(),
            max_candidates: default_max_candidates(),
            fallback_top_k: default_fallback_top_k(),
            name_blacklist: default_name_blacklist(),
        }
    }
}

/// Explicit override set applied onto the defaults exactly once. Only the
/// fields operators actually tune are exposed here; everything else keeps its
/// default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreeningOverrides {
    pub weights: Option<BTreeMap<Category, f64>>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_5d_change: Option<f64>,
    pub max_5d_change: Option<f64>,
    pub min_20d_change: Option<f64>,
    pub max_volatility: Option<f64>,
    pub volume_ratio_threshold: Option<f64>,
    pub lenient_threshold: Option<f64>,
    pub max_candidates: Option<usize>,
}

impl ScreeningConfig {
    /// Categories that must be present in every weight map.
    pub const REQUIRED_WEIGHTS: [Category; 5] = [
        Category::Trend,
        Category::Momentum,
        Category::Volume,
        Category::Volatility,
        Category::Position,
    ];

    /// Build a validated config from defaults plus an override set.
    pub fn with_overrides(overrides: ScreeningOverrides) -> Result<Self, ConfigError> {
        Self::default().merged(overrides)
    }

    /// Apply an override set onto this config, re-validating the result.
    /// This is the only merge path; nothing mutates a config afterwards.
    pub fn merged(self, overrides: ScreeningOverrides) -> Result<Self, ConfigError> {
        let mut cfg = self;

        if let Some(weights) = overrides.weights {
            cfg.weights = weights;
        }
        if let Some(v) = overrides.min_price {
            cfg.min_price = v;
        }
        if let Some(v) = overrides.max_price {
            cfg.max_price = v;
        }
        if let Some(v) = overrides.min_5d_change {
            cfg.min_5d_change = v;
        }
        if let Some(v) = overrides.max_5d_change {
            cfg.max_5d_change = v;
        }
        if let Some(v) = overrides.min_20d_change {
            cfg.min_20d_change = v;
        }
        if let Some(v) = overrides.max_volatility {
            cfg.max_volatility = v;
        }
        if let Some(v) = overrides.volume_ratio_threshold {
            cfg.volume_ratio_threshold = v;
        }
        if let Some(v) = overrides.lenient_threshold {
            cfg.lenient_threshold = v;
        }
        if let Some(v) = overrides.max_candidates {
            cfg.max_candidates = v;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate the full field set. Called by every construction path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for category in Self::REQUIRED_WEIGHTS {
            match self.weights.get(&category) {
                None => return Err(ConfigError::MissingWeight(category)),
                Some(&w) if !w.is_finite() || w <= 0.0 => {
                    return Err(ConfigError::InvalidWeight { category, value: w })
                }
                Some(_) => {}
            }
        }
        // Optional weights still have to be sane numbers.
        for (&category, &w) in &self.weights {
            if !w.is_finite() || w <= 0.0 {
                return Err(ConfigError::InvalidWeight { category, value: w });
            }
        }

        for (name, value) in [
            ("min_price", self.min_price),
            ("max_price", self.max_price),
            ("limit_move_pct", self.limit_move_pct),
            ("min_5d_change", self.min_5d_change),
            ("max_5d_change", self.max_5d_change),
            ("min_20d_change", self.min_20d_change),
            ("max_volatility", self.max_volatility),
            ("volume_ratio_threshold", self.volume_ratio_threshold),
            ("lenient_threshold", self.lenient_threshold),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::InvalidThreshold { name, value });
            }
        }

        let MaWindows { short, mid, long } = self.ma_windows;
        if short == 0 || short >= mid || mid >= long {
            return Err(ConfigError::InvalidMaWindows { short, mid, long });
        }

        if self.min_price > self.max_price {
            return Err(ConfigError::InvertedPriceBounds {
                min: self.min_price,
                max: self.max_price,
            });
        }
        if self.min_5d_change > self.max_5d_change {
            return Err(ConfigError::InvertedMomentumBand {
                min: self.min_5d_change,
                max: self.max_5d_change,
            });
        }

        Ok(())
    }
}

// =============================================================================
// SectorConfig (sector scope)
// =============================================================================

fn default_sector_weights() -> SectorWeights {
    SectorWeights {
        momentum: 0.35,
        breadth: 0.25,
        attention: 0.20,
        stability: 0.20,
    }
}

fn default_min_member_count() -> u32 {
    8
}

fn default_max_sectors_to_analyze() -> usize {
    40
}

fn default_top_sectors() -> usize {
    5
}

fn default_min_sector_score() -> f64 {
    50.0
}

fn default_sector_blacklist() -> Vec<String> {
    ["ST", "*ST", "DELIST", "RISK ALERT"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Fixed four-factor weight set for the sector scope.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SectorWeights {
    pub momentum: f64,
    pub breadth: f64,
    pub attention: f64,
    pub stability: f64,
}

/// Tunable parameters for the sector-scope screening engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorConfig {
    #[serde(default = "default_sector_weights")]
    pub weights: SectorWeights,

    /// Sectors with fewer members than this are skipped (too thin to read).
    #[serde(default = "default_min_member_count")]
    pub min_member_count: u32,

    #[serde(default = "default_max_sectors_to_analyze")]
    pub max_sectors_to_analyze: usize,

    /// Number of top sectors handed to the instrument screener.
    #[serde(default = "default_top_sectors")]
    pub top_sectors: usize,

    /// Score floor for sector recommendations; below it the fallback kicks in.
    #[serde(default = "default_min_sector_score")]
    pub min_sector_score: f64,

    #[serde(default = "default_sector_blacklist")]
    pub name_blacklist: Vec<String>,
}

impl Default for SectorConfig {
    fn default() -> Self {
        Self {
            weights: default_sector_weights(),
            min_member_count: default_min_member_count(),
            max_sectors_to_analyze: default_max_sectors_to_analyze(),
            top_sectors: default_top_sectors(),
            min_sector_score: default_min_sector_score(),
            name_blacklist: default_sector_blacklist(),
        }
    }
}

impl SectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("sector.momentum_weight", self.weights.momentum),
            ("sector.breadth_weight", self.weights.breadth),
            ("sector.attention_weight", self.weights.attention),
            ("sector.stability_weight", self.weights.stability),
            ("sector.min_sector_score", self.min_sector_score),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidThreshold { name, value });
            }
        }
        Ok(())
    }
}

// =============================================================================
// AppConfig — top-level file-backed configuration
// =============================================================================

/// Top-level configuration for the Argus screener, persisted as JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub screening: ScreeningConfig,

    #[serde(default)]
    pub sector: SectorConfig,

    #[serde(default)]
    pub feed: crate::data::FeedConfig,

    #[serde(default)]
    pub monitor: crate::monitor::MonitorConfig,
}

impl AppConfig {
    /// Load configuration from a JSON file at `path` and validate it.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        config.screening.validate()?;
        config.sector.validate()?;

        info!(path = %path.display(), "screener config loaded");
        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content =
            serde_json::to_string_pretty(self).context("failed to serialise config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "screener config saved (atomic)");
        Ok(())
    }
}
