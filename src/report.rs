// =============================================================================
// Report Writer — text summary plus JSON and CSV artifacts per run
// =============================================================================
//
// Each screening run gets a fresh run id. Artifacts land in the output
// directory as `screening_<runid>.json` / `.csv`, written atomically
// (tmp + rename). The text report is for the terminal and the log.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::screener::ScreeningRun;
use crate::sector::SectorRecommendation;
use crate::types::{Candidate, RiskLevel};

/// Serialized artifact for one screening run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunArtifact {
    pub run_id: String,
    pub generated_at: String,
    pub sectors: Vec<SectorRecommendation>,
    pub candidates: Vec<Candidate>,
}

impl RunArtifact {
    pub fn from_run(run: &ScreeningRun) -> Self {
        Self {
            run_id: Uuid::new_v4().simple().to_string(),
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            sectors: run.sectors.clone(),
            candidates: run.candidates.clone(),
        }
    }
}

/// Render the run as a human-readable report.
pub fn render_text(run: &ScreeningRun) -> String {
    let mut out = Vec::new();
    out.push("=".repeat(80));
    out.push("Argus screening report".to_string());
    out.push("=".repeat(80));
    out.push(format!("recommended sectors: {}", run.sectors.len()));

    for (i, rec) in run.sectors.iter().enumerate() {
        out.push(format!(
            "{}. {} [{}]  score {:.1}  strength {} ({})",
            i + 1,
            rec.sector.name,
            rec.sector.code,
            rec.sector.total_score,
            rec.strength,
            rec.strength.advice(),
        ));
        out.push(format!("   {}", rec.reason));
    }

    out.push(String::new());
    out.push(format!("candidates: {}", run.candidates.len()));
    for (i, c) in run.candidates.iter().enumerate() {
        out.push(format!(
            "{}. {} ({})  score {:.1}  price {:.2}  change {:+.2}%",
            i + 1,
            c.name,
            c.symbol,
            c.total_score,
            c.price,
            c.change_pct,
        ));
        out.push(format!(
            "   risk {}  signal [{}]  action {}",
            c.risk_level,
            c.entry_signal_text(),
            c.plan.action,
        ));
        out.push(format!(
            "   stop {:.2}  target {:.2}  r/r {:.2}",
            c.stop_loss, c.target_price, c.risk_reward_ratio,
        ));
        if !c.rank_reasons.is_empty() {
            out.push(format!("   reasons: {}", c.rank_reasons.join(", ")));
        }
    }

    // Risk distribution across candidates.
    if !run.candidates.is_empty() {
        out.push(String::new());
        out.push("risk distribution:".to_string());
        for level in [
            RiskLevel::Low,
            RiskLevel::MediumLow,
            RiskLevel::Medium,
            RiskLevel::MediumHigh,
            RiskLevel::High,
        ] {
            let count = run.candidates.iter().filter(|c| c.risk_level == level).count();
            if count > 0 {
                out.push(format!("  {level}: {count}"));
            }
        }
    }

    out.push("=".repeat(80));
    out.join("\n")
}

/// Writes run artifacts into an output directory.
pub struct ReportWriter {
    out_dir: PathBuf,
}

/// Paths of the artifacts written for one run.
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub json: PathBuf,
    pub csv: PathBuf,
}

impl ReportWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Write the JSON and CSV artifacts for one run.
    pub fn save(&self, artifact: &RunArtifact) -> Result<ReportPaths> {
        std::fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("failed to create {}", self.out_dir.display()))?;

        let json = self.out_dir.join(format!("screening_{}.json", artifact.run_id));
        let csv = self.out_dir.join(format!("screening_{}.csv", artifact.run_id));

        let body = serde_json::to_string_pretty(artifact)
            .context("failed to serialise run artifact")?;
        atomic_write(&json, body.as_bytes())?;

        let csv_body = candidates_csv(&artifact.candidates)?;
        atomic_write(&csv, &csv_body)?;

        info!(run_id = %artifact.run_id, "run artifacts written");
        Ok(ReportPaths { json, csv })
    }
}

fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, content)
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to rename into {}", path.display()))?;
    Ok(())
}

fn candidates_csv(candidates: &[Candidate]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "symbol",
            "name",
            "sector",
            "price",
            "change_pct",
            "total_score",
            "risk_level",
            "entry_signal",
            "action",
            "stop_loss",
            "target_price",
            "risk_reward_ratio",
        ])
        .context("failed to write CSV header")?;

    for c in candidates {
        writer
            .write_record([
                c.symbol.clone(),
                c.name.clone(),
                c.sector_code.clone(),
                format!("{:.2}", c.price),
                format!("{:.2}", c.change_pct),
                format!("{:.1}", c.total_score),
                c.risk_level.to_string(),
                c.entry_signal_text(),
                c.plan.action.to_string(),
                format!("{:.2}", c.stop_loss),
                format!("{:.2}", c.target_price),
                format!("{:.2}", c.risk_reward_ratio),
            ])
            .context("failed to write CSV row")?;
    }

    writer
        .into_inner()
        .context("failed to flush CSV buffer")
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BuyPlan, EntryTag, TradeAction};

    fn candidate(symbol: &str, score: f64) -> Candidate {
        Candidate {
            symbol: symbol.into(),
            name: format!("Issuer {symbol}"),
            price: 21.5,
            change_pct: 2.1,
            sector_code: "BK0001".into(),
            total_score: score,
            risk_level: RiskLevel::from_score(score),
            entry_signal: vec![EntryTag::TrendUp, EntryTag::SteadyMomentum],
            stop_loss: 19.4,
            target_price: 23.2,
            risk_reward_ratio: 0.81,
            rank_reasons: vec!["bullish MA alignment".into()],
            plan: BuyPlan {
                action: TradeAction::CautiousBuy,
                buy_price_range: (20.8, 21.3),
                position_fraction: 0.035,
                holding_days: 5,
            },
        }
    }

    fn sample_run() -> ScreeningRun {
        ScreeningRun {
            sectors: Vec::new(),
            candidates: vec![candidate("600100", 71.5), candidate("600200", 66.0)],
        }
    }

    #[test]
    fn text_report_names_candidates_and_risk() {
        let text = render_text(&sample_run());
        assert!(text.contains("600100"));
        assert!(text.contains("trend-up | steady-momentum"));
        assert!(text.contains("risk distribution:"));
        assert!(text.contains("medium-low: 2"));
    }

    #[test]
    fn empty_run_renders_without_panic() {
        let text = render_text(&ScreeningRun {
            sectors: Vec::new(),
            candidates: Vec::new(),
        });
        assert!(text.contains("candidates: 0"));
    }

    #[test]
    fn csv_has_header_and_one_row_per_candidate() {
        let body = candidates_csv(&sample_run().candidates).unwrap();
        let text = String::from_utf8(body).unwrap();
        let lines: Vec<&str> = text.trim_end().lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("symbol,name,sector"));
        assert!(lines[1].contains("600100"));
    }

    #[test]
    fn artifacts_roundtrip_through_disk() {
        let dir = std::env::temp_dir().join(format!("argus-report-test-{}", std::process::id()));
        let writer = ReportWriter::new(&dir);
        let artifact = RunArtifact::from_run(&sample_run());
        let paths = writer.save(&artifact).unwrap();

        let loaded: RunArtifact =
            serde_json::from_str(&std::fs::read_to_string(&paths.json).unwrap()).unwrap();
        assert_eq!(loaded.run_id, artifact.run_id);
        assert_eq!(loaded.candidates.len(), 2);

        let csv_text = std::fs::read_to_string(&paths.csv).unwrap();
        assert!(csv_text.contains("600200"));

        let _ = std::fs::remove_dir_all(dir);
    }
}
