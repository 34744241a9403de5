// =============================================================================
// Instrument Screener — per-sector pipeline over the shared engine
// =============================================================================
//
// For each recommended sector:
//   1. Fetch member quotes (empty feed result skips the sector, logged).
//   2. Pre-filter out flagged names, out-of-band prices, limit moves.
//   3. Fetch each survivor's daily history (missing history skips the
//      instrument, logged) and require the minimum trading-day count.
//   4. Score all seven categories and aggregate (pure, per-entity).
//   5. Apply the selected gate policy.
//   6. Rank with the best-available fallback and truncate.
//
// `evaluate_entity` is deliberately free of IO so callers can spread entities
// across a worker pool; the reference loop here stays sequential out of
// deference to the rate-limited feed, not because the engine needs it.

use tracing::{debug, info, warn};

use crate::config::{AppConfig, ConfigError, ScreeningConfig};
use crate::data::MarketData;
use crate::funnel::{evaluate_gate, pre_filter, GatePolicy};
use crate::rank::{rank, rank_with_fallback};
use crate::scoring::{aggregate, analyze_series, AnalysisResult, ScoreBreakdown};
use crate::sector::{SectorAnalyzer, SectorRecommendation};
use crate::signal;
use crate::types::{Candidate, EntitySeries, MarketCondition, PeerQuote};

/// One fully evaluated entity: the candidate plus everything that produced it.
#[derive(Debug, Clone)]
pub struct ScoredEntity {
    pub candidate: Candidate,
    pub analysis: AnalysisResult,
    pub breakdown: Vec<ScoreBreakdown>,
}

/// Score one entity end to end. Pure: identical inputs yield an identical
/// candidate, and nothing here touches shared state.
pub fn evaluate_entity(
    series: &EntitySeries,
    quote: &PeerQuote,
    sector_code: &str,
    cfg: &ScreeningConfig,
    condition: MarketCondition,
) -> ScoredEntity {
    let analysis = analyze_series(series, cfg);
    let score = aggregate(&analysis, &cfg.weights, None);

    // A degenerate snapshot price falls back to the last bar's close.
    let price = if quote.price > 0.0 {
        quote.price
    } else {
        series.latest().map_or(0.0, |b| b.close)
    };

    let lows = series.lows();
    let stop = signal::stop_loss(&lows, cfg.position_window).unwrap_or(price * 0.97);

    let sig = signal::generate(
        &analysis,
        score.total,
        price,
        quote.change_pct,
        stop,
        condition,
    );

    let candidate = Candidate {
        symbol: quote.symbol.clone(),
        name: quote.name.clone(),
        price,
        change_pct: quote.change_pct,
        sector_code: sector_code.to_string(),
        total_score: score.total,
        risk_level: sig.risk_level,
        entry_signal: sig.entry_signal,
        stop_loss: stop,
        target_price: sig.target_price,
        risk_reward_ratio: sig.risk_reward_ratio,
        rank_reasons: sig.rank_reasons,
        plan: sig.plan,
    };

    ScoredEntity {
        candidate,
        analysis,
        breakdown: score.breakdown,
    }
}

/// Instrument-scope screening engine. Construction validates the config.
pub struct Screener {
    cfg: ScreeningConfig,
    condition: MarketCondition,
}

impl Screener {
    pub fn new(cfg: ScreeningConfig, condition: MarketCondition) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self { cfg, condition })
    }

    /// Screen one sector's members into a ranked candidate list.
    pub async fn screen_sector<P: MarketData>(
        &self,
        provider: &P,
        sector_code: &str,
        policy: GatePolicy,
        lookback_days: u32,
    ) -> Vec<Candidate> {
        let peers = provider.sector_members(sector_code).await;
        if peers.is_empty() {
            warn!(sector_code, "no member data; sector skipped");
            return Vec::new();
        }

        let peers = pre_filter(&peers, &self.cfg);
        debug!(sector_code, remaining = peers.len(), "pre-filter applied");

        let mut accepted = Vec::new();
        let mut all_scored = Vec::new();

        for peer in &peers {
            let Some(series) = provider.daily_history(&peer.symbol, lookback_days).await else {
                warn!(symbol = %peer.symbol, "history unavailable; instrument skipped");
                continue;
            };
            if series.len() < self.cfg.min_trading_days {
                debug!(
                    symbol = %peer.symbol,
                    bars = series.len(),
                    required = self.cfg.min_trading_days,
                    "history too short; instrument skipped"
                );
                continue;
            }

            let scored = evaluate_entity(&series, peer, sector_code, &self.cfg, self.condition);
            debug!(
                symbol = %peer.symbol,
                total = scored.candidate.total_score,
                categories = scored.breakdown.len(),
                "entity scored"
            );
            match evaluate_gate(policy, &scored.analysis, scored.candidate.total_score) {
                None => accepted.push(scored.candidate.clone()),
                Some(reason) => {
                    debug!(symbol = %peer.symbol, %reason, "gate rejection")
                }
            }
            all_scored.push(scored.candidate);
        }

        let ranked = rank_with_fallback(
            accepted,
            all_scored,
            self.cfg.max_candidates,
            self.cfg.fallback_top_k,
        );
        info!(sector_code, candidates = ranked.len(), "sector screening complete");
        ranked
    }
}

/// Output of a full two-scope screening pass.
#[derive(Debug, Clone)]
pub struct ScreeningRun {
    pub sectors: Vec<SectorRecommendation>,
    pub candidates: Vec<Candidate>,
}

/// Run the whole funnel: sector table, top sectors, then instruments within
/// each, merged into one globally ranked candidate list.
pub async fn run_full_screening<P: MarketData>(
    provider: &P,
    cfg: &AppConfig,
    policy: GatePolicy,
    condition: MarketCondition,
) -> Result<ScreeningRun, ConfigError> {
    let sector_analyzer = SectorAnalyzer::new(cfg.sector.clone())?;
    let screener = Screener::new(cfg.screening.clone(), condition)?;

    let table = provider.sector_table().await;
    info!(sectors = table.len(), "sector table fetched");
    let sectors = sector_analyzer.top_sectors(&table);

    let mut candidates = Vec::new();
    for rec in &sectors {
        info!(
            sector = %rec.sector.name,
            score = rec.sector.total_score,
            strength = %rec.strength,
            "screening sector members"
        );
        let mut found = screener
            .screen_sector(
                provider,
                &rec.sector.code,
                policy,
                cfg.feed.history_lookback_days,
            )
            .await;
        candidates.append(&mut found);
    }

    let count = candidates.len();
    Ok(ScreeningRun {
        sectors,
        candidates: rank(candidates, count),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Bar, MinuteBar, RiskLevel, SectorSnapshot, TradeAction};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    // ---- fixtures --------------------------------------------------------

    fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                date: start + chrono::Days::new(i as u64),
                open: c,
                high: c * 1.12,
                low: c * 0.985,
                close: c,
                volume: 1_000_000.0,
            })
            .collect()
    }

    fn series_from_closes(id: &str, closes: &[f64]) -> EntitySeries {
        EntitySeries::new(id, bars_from_closes(closes)).unwrap()
    }

    fn quote(symbol: &str, price: f64, change_pct: f64) -> PeerQuote {
        PeerQuote {
            symbol: symbol.into(),
            name: format!("Issuer {symbol}"),
            price,
            change_pct,
        }
    }

    struct MockProvider {
        members: HashMap<String, Vec<PeerQuote>>,
        histories: HashMap<String, EntitySeries>,
    }

    impl MarketData for MockProvider {
        async fn sector_table(&self) -> Vec<SectorSnapshot> {
            Vec::new()
        }

        async fn sector_members(&self, sector_code: &str) -> Vec<PeerQuote> {
            self.members.get(sector_code).cloned().unwrap_or_default()
        }

        async fn daily_history(&self, symbol: &str, _lookback_days: u32) -> Option<EntitySeries> {
            self.histories.get(symbol).cloned()
        }

        async fn spot(&self, _symbol: &str) -> Option<PeerQuote> {
            None
        }

        async fn minute_bars(&self, _symbol: &str) -> Vec<MinuteBar> {
            Vec::new()
        }
    }

    // ---- pure evaluation scenarios ---------------------------------------

    #[test]
    fn steady_riser_scores_buy_grade() {
        // Strictly rising closes 100 -> 120 on flat volume, with intraday
        // ranges that keep the close inside the safe zone. Expectation:
        // aligned-bullish trend (+20), moderate 5-day momentum (+15),
        // total above 65, a non-empty entry signal, and a risk grade in the
        // top two buckets.
        let cfg = ScreeningConfig::default();
        let closes: Vec<f64> = (100..=120).map(f64::from).collect();
        let series = series_from_closes("600100", &closes);
        let scored = evaluate_entity(
            &series,
            &quote("600100", 120.0, 0.84),
            "BK0001",
            &cfg,
            MarketCondition::Normal,
        );

        let c = &scored.candidate;
        assert!(c.total_score > 65.0, "total {} not above 65", c.total_score);
        assert!(!c.entry_signal.is_empty());
        assert!(
            c.risk_level == RiskLevel::Low || c.risk_level == RiskLevel::MediumLow,
            "risk level {} not in the top two buckets",
            c.risk_level
        );
        assert_eq!(c.plan.action, TradeAction::CautiousBuy);

        // The same inputs must survive both gate policies.
        assert!(evaluate_gate(GatePolicy::Strict, &scored.analysis, c.total_score).is_none());
        assert!(evaluate_gate(
            GatePolicy::Lenient { threshold: 60.0 },
            &scored.analysis,
            c.total_score
        )
        .is_none());
    }

    #[test]
    fn one_bar_series_scores_exactly_baseline() {
        let cfg = ScreeningConfig::default();
        let series = series_from_closes("600200", &[10.0]);
        let scored = evaluate_entity(
            &series,
            &quote("600200", 10.0, 0.0),
            "BK0001",
            &cfg,
            MarketCondition::Normal,
        );
        assert!((scored.candidate.total_score - 50.0).abs() < f64::EPSILON);
        assert!(scored.candidate.entry_signal.is_empty());
        assert_eq!(scored.candidate.plan.action, TradeAction::Watch);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let cfg = ScreeningConfig::default();
        let closes: Vec<f64> = (0..70).map(|i| 50.0 + (i as f64 * 0.3).sin() * 2.0).collect();
        let series = series_from_closes("600300", &closes);
        let q = quote("600300", 52.0, 0.5);
        let a = evaluate_entity(&series, &q, "BK0001", &cfg, MarketCondition::Normal);
        let b = evaluate_entity(&series, &q, "BK0001", &cfg, MarketCondition::Normal);
        assert_eq!(a.candidate.total_score, b.candidate.total_score);
        assert_eq!(a.candidate.stop_loss, b.candidate.stop_loss);
    }

    #[test]
    fn stop_loss_tracks_the_rolling_low() {
        let cfg = ScreeningConfig::default();
        let closes: Vec<f64> = (0..70).map(|i| 100.0 + f64::from(i) * 0.2).collect();
        let series = series_from_closes("600400", &closes);
        let scored = evaluate_entity(
            &series,
            &quote("600400", 113.8, 0.2),
            "BK0001",
            &cfg,
            MarketCondition::Normal,
        );
        let lows = series.lows();
        let window_low = crate::indicators::range::rolling_low(&lows, cfg.position_window).unwrap();
        assert!(scored.candidate.stop_loss <= window_low);
    }

    // ---- pipeline --------------------------------------------------------

    fn seventy_bar_riser() -> Vec<f64> {
        // Gentle rise with a final 5-day push inside the momentum band.
        let mut closes: Vec<f64> = (0..65).map(|i| 100.0 + f64::from(i) * 0.1).collect();
        let mut last = *closes.last().unwrap();
        for _ in 0..5 {
            last *= 1.008;
            closes.push(last);
        }
        closes
    }

    fn provider_with(
        sector: &str,
        entries: Vec<(PeerQuote, Option<EntitySeries>)>,
    ) -> MockProvider {
        let mut members = HashMap::new();
        let mut histories = HashMap::new();
        members.insert(
            sector.to_string(),
            entries.iter().map(|(q, _)| q.clone()).collect(),
        );
        for (q, series) in entries {
            if let Some(s) = series {
                histories.insert(q.symbol.clone(), s);
            }
        }
        MockProvider { members, histories }
    }

    #[tokio::test]
    async fn empty_member_list_yields_empty_result() {
        let provider = provider_with("BK0001", Vec::new());
        let screener = Screener::new(ScreeningConfig::default(), MarketCondition::Normal).unwrap();
        let out = screener
            .screen_sector(&provider, "BK0001", GatePolicy::Strict, 90)
            .await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn missing_history_skips_instrument_but_run_continues() {
        let closes = seventy_bar_riser();
        let provider = provider_with(
            "BK0001",
            vec![
                (quote("600500", 106.5, 0.7), Some(series_from_closes("600500", &closes))),
                (quote("600501", 50.0, 0.5), None), // feed failure for this one
            ],
        );
        let screener = Screener::new(ScreeningConfig::default(), MarketCondition::Normal).unwrap();
        let out = screener
            .screen_sector(&provider, "BK0001", GatePolicy::Lenient { threshold: 60.0 }, 90)
            .await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].symbol, "600500");
    }

    #[tokio::test]
    async fn short_history_is_skipped() {
        let provider = provider_with(
            "BK0001",
            vec![(
                quote("600600", 12.0, 0.3),
                Some(series_from_closes("600600", &[10.0, 10.1, 10.2])),
            )],
        );
        let screener = Screener::new(ScreeningConfig::default(), MarketCondition::Normal).unwrap();
        let out = screener
            .screen_sector(&provider, "BK0001", GatePolicy::Strict, 90)
            .await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn weak_sector_falls_back_to_best_available() {
        // Flat histories: every total sits at the weak end, below the lenient
        // threshold. The ranker's escape hatch still surfaces the best few.
        let flat: Vec<f64> = vec![50.0; 70];
        let provider = provider_with(
            "BK0001",
            vec![
                (quote("600700", 50.0, 0.0), Some(series_from_closes("600700", &flat))),
                (quote("600701", 50.0, 0.0), Some(series_from_closes("600701", &flat))),
                (quote("600702", 50.0, 0.0), Some(series_from_closes("600702", &flat))),
                (quote("600703", 50.0, 0.0), Some(series_from_closes("600703", &flat))),
            ],
        );
        let screener = Screener::new(ScreeningConfig::default(), MarketCondition::Normal).unwrap();
        let out = screener
            .screen_sector(&provider, "BK0001", GatePolicy::Lenient { threshold: 60.0 }, 90)
            .await;
        // fallback_top_k = 3, ties broken by symbol ascending
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].symbol, "600700");
        assert_eq!(out[1].symbol, "600701");
        assert_eq!(out[2].symbol, "600702");
    }

    #[tokio::test]
    async fn ranked_output_is_score_descending() {
        let riser = seventy_bar_riser();
        let flat: Vec<f64> = vec![50.0; 70];
        let provider = provider_with(
            "BK0001",
            vec![
                (quote("600800", 50.0, 0.0), Some(series_from_closes("600800", &flat))),
                (quote("600801", 106.5, 0.7), Some(series_from_closes("600801", &riser))),
            ],
        );
        let screener = Screener::new(ScreeningConfig::default(), MarketCondition::Normal).unwrap();
        let out = screener
            .screen_sector(&provider, "BK0001", GatePolicy::Lenient { threshold: 0.0 }, 90)
            .await;
        assert_eq!(out.len(), 2);
        assert!(out[0].total_score >= out[1].total_score);
        assert_eq!(out[0].symbol, "600801");
    }
}
