use serde::{Deserialize, Serialize};

use crate::config::{NormalizationMode, OpportunityConfig};
use crate::metrics::safe_div;
use crate::records::BoxScore;

/// The three possession levers, each in percentage form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Levers {
    pub to_pct: f64,
    pub oreb_pct: f64,
    pub ftr: f64,
}

/// Net possession-creating actions: turnovers cost a trip, offensive
/// rebounds add one, free-throw attempts score without using one.
pub fn opportunity_edge(tov: f64, oreb: f64, fta: f64, fta_weight: f64) -> f64 {
    -tov + oreb + fta_weight * fta
}

pub fn edge_for(b: &BoxScore, fta_weight: f64) -> f64 {
    opportunity_edge(b.tov as f64, b.oreb as f64, b.fta as f64, fta_weight)
}

pub fn opportunity_diff(team_edge: f64, opponent_edge: f64) -> f64 {
    team_edge - opponent_edge
}

/// Sorted reference values per lever, used to put a single game's levers
/// on a 0–100 scale.
#[derive(Debug, Clone, Default)]
pub struct LeverReference {
    to_pct: Vec<f64>,
    oreb_pct: Vec<f64>,
    ftr: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lever {
    Turnover,
    Rebound,
    FreeThrow,
}

impl LeverReference {
    pub fn from_levers(levers: &[Levers]) -> Self {
        let mut to_pct: Vec<f64> = levers.iter().map(|l| l.to_pct).filter(|v| v.is_finite()).collect();
        let mut oreb_pct: Vec<f64> = levers.iter().map(|l| l.oreb_pct).filter(|v| v.is_finite()).collect();
        let mut ftr: Vec<f64> = levers.iter().map(|l| l.ftr).filter(|v| v.is_finite()).collect();
        to_pct.sort_by(f64::total_cmp);
        oreb_pct.sort_by(f64::total_cmp);
        ftr.sort_by(f64::total_cmp);
        Self {
            to_pct,
            oreb_pct,
            ftr,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_pct.is_empty()
    }

    fn values(&self, lever: Lever) -> &[f64] {
        match lever {
            Lever::Turnover => &self.to_pct,
            Lever::Rebound => &self.oreb_pct,
            Lever::FreeThrow => &self.ftr,
        }
    }

    /// 0–100 position of `value` within the lever's reference population,
    /// where higher always means "more of this lever". An empty or constant
    /// reference maps everything to 50.
    pub fn scale(&self, lever: Lever, value: f64, mode: NormalizationMode) -> f64 {
        let values = self.values(lever);
        let (Some(&lo), Some(&hi)) = (values.first(), values.last()) else {
            return 50.0;
        };
        if (hi - lo).abs() < 1e-12 || !value.is_finite() {
            return 50.0;
        }
        match mode {
            NormalizationMode::MinMax => (100.0 * (value - lo) / (hi - lo)).clamp(0.0, 100.0),
            NormalizationMode::Percentile => {
                let below = values.partition_point(|v| *v < value);
                let at_or_below = values.partition_point(|v| *v <= value);
                let equal = at_or_below - below;
                100.0 * (below as f64 + 0.5 * equal as f64) / values.len() as f64
            }
        }
    }
}

/// Process-quality blend on a 0–100 scale. Turnover share is inverted so a
/// careful team scores high; rebounding and free-throw rate count as-is.
pub fn conversion_score(levers: &Levers, reference: &LeverReference, cfg: &OpportunityConfig) -> f64 {
    let mode = cfg.normalization;
    let to_component = 100.0 - reference.scale(Lever::Turnover, levers.to_pct, mode);
    let oreb_component = reference.scale(Lever::Rebound, levers.oreb_pct, mode);
    let ftr_component = reference.scale(Lever::FreeThrow, levers.ftr, mode);
    let blended = cfg.turnover_weight * to_component
        + cfg.oreb_weight * oreb_component
        + cfg.ftr_weight * ftr_component;
    blended.clamp(0.0, 100.0)
}

/// Approximate share of possessions that produced no points.
///
/// Box scores do not record per-possession outcomes, so this counts
/// possession-ending misses (misses not recovered on the offensive glass),
/// turnovers, and an estimate of free-throw trips where both attempts missed.
/// Treat the result as a heuristic, not an exact count.
pub fn empty_rate(b: &BoxScore, possessions: f64, fta_weight: f64) -> f64 {
    let misses = b.fga.saturating_sub(b.fgm) as f64;
    let unrecovered = (misses - b.oreb as f64).max(0.0);
    let ft_miss = 1.0 - safe_div(b.ftm as f64, b.fta as f64);
    let empty_ft_trips = fta_weight * b.fta as f64 * ft_miss * ft_miss;
    let empty = unrecovered + b.tov as f64 + empty_ft_trips;
    safe_div(empty, possessions).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_matches_documented_example() {
        let edge = opportunity_edge(10.0, 12.0, 20.0, 0.44);
        assert!((edge - 10.8).abs() < 1e-9);
    }

    #[test]
    fn diff_is_team_minus_opponent() {
        assert!((opportunity_diff(10.8, 4.3) - 6.5).abs() < 1e-9);
        assert!(opportunity_diff(1.0, 3.0) < 0.0);
    }

    #[test]
    fn conversion_score_rewards_ball_security() {
        let reference = LeverReference::from_levers(&[
            Levers { to_pct: 10.0, oreb_pct: 20.0, ftr: 20.0 },
            Levers { to_pct: 15.0, oreb_pct: 25.0, ftr: 25.0 },
            Levers { to_pct: 20.0, oreb_pct: 30.0, ftr: 30.0 },
        ]);
        let cfg = OpportunityConfig::default();
        let best = conversion_score(&Levers { to_pct: 10.0, oreb_pct: 30.0, ftr: 30.0 }, &reference, &cfg);
        let worst = conversion_score(&Levers { to_pct: 20.0, oreb_pct: 20.0, ftr: 20.0 }, &reference, &cfg);
        assert!((best - 100.0).abs() < 1e-9);
        assert!(worst.abs() < 1e-9);

        let sloppy = conversion_score(&Levers { to_pct: 20.0, oreb_pct: 30.0, ftr: 30.0 }, &reference, &cfg);
        assert!((sloppy - 60.0).abs() < 1e-9);
    }

    #[test]
    fn percentile_mode_shares_ties() {
        let reference = LeverReference::from_levers(&[
            Levers { to_pct: 10.0, oreb_pct: 20.0, ftr: 20.0 },
            Levers { to_pct: 10.0, oreb_pct: 20.0, ftr: 20.0 },
            Levers { to_pct: 20.0, oreb_pct: 30.0, ftr: 30.0 },
            Levers { to_pct: 30.0, oreb_pct: 40.0, ftr: 40.0 },
        ]);
        let p = reference.scale(Lever::Turnover, 10.0, NormalizationMode::Percentile);
        assert!((p - 25.0).abs() < 1e-9);
        let top = reference.scale(Lever::FreeThrow, 40.0, NormalizationMode::Percentile);
        assert!((top - 87.5).abs() < 1e-9);
    }

    #[test]
    fn empty_reference_is_neutral() {
        let reference = LeverReference::default();
        let score = conversion_score(&Levers::default(), &reference, &OpportunityConfig::default());
        assert!((score - 50.0).abs() < 1e-9);
    }

    #[test]
    fn empty_rate_guards_and_clamps() {
        assert_eq!(empty_rate(&BoxScore::default(), 0.0, 0.44), 0.0);
        let b = BoxScore {
            fgm: 40,
            fga: 88,
            ftm: 18,
            fta: 24,
            oreb: 10,
            tov: 13,
            ..BoxScore::default()
        };
        let rate = empty_rate(&b, 100.0, 0.44);
        // 38 unrecovered misses + 13 TOV + 0.44*24*0.0625
        assert!((rate - (51.0 + 0.66) / 100.0).abs() < 1e-9);
    }
}
