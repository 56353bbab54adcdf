use serde::{Deserialize, Serialize};

use crate::config::OpportunityConfig;
use crate::opportunity::{self, LeverReference, Levers};
use crate::records::{BoxScore, GameKey, TeamGameRecord};

/// Bring a rate to fraction form. Upstream feeds mix `43.5` and `0.435`;
/// anything above 1.5 in magnitude is read as a percentage.
pub fn normalize_pct(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let fraction = if value.abs() > 1.5 { value / 100.0 } else { value };
    fraction.clamp(0.0, 1.0)
}

/// Division that yields 0 instead of NaN/inf for empty denominators.
pub fn safe_div(num: f64, den: f64) -> f64 {
    if den == 0.0 || !den.is_finite() || !num.is_finite() {
        return 0.0;
    }
    num / den
}

/// Turnovers per 100 plays (FGA + `fta_weight`·FTA + TOV).
pub fn turnover_pct(b: &BoxScore, fta_weight: f64) -> f64 {
    let plays = b.fga as f64 + fta_weight * b.fta as f64 + b.tov as f64;
    100.0 * safe_div(b.tov as f64, plays)
}

/// Box-score possession estimate: FGA - OREB + TOV + `fta_weight`·FTA.
pub fn estimate_possessions(b: &BoxScore, fta_weight: f64) -> f64 {
    (b.fga as f64 - b.oreb as f64 + b.tov as f64 + fta_weight * b.fta as f64).max(0.0)
}

/// The opponent's own possession count: the recorded value when present,
/// else the estimate from the opponent box, else the team's count.
pub fn opponent_possessions(record: &TeamGameRecord, fta_weight: f64) -> f64 {
    if record.opp_possessions.is_finite() && record.opp_possessions > 0.0 {
        return record.opp_possessions;
    }
    let estimate = estimate_possessions(&record.opponent, fta_weight);
    if estimate > 0.0 { estimate } else { record.possessions }
}

/// Share of available offensive rebounds grabbed.
pub fn oreb_pct(team: &BoxScore, opponent: &BoxScore) -> f64 {
    let available = team.oreb as f64 + opponent.dreb as f64;
    100.0 * safe_div(team.oreb as f64, available)
}

/// Free-throw attempts per 100 field-goal attempts.
pub fn free_throw_rate(b: &BoxScore) -> f64 {
    100.0 * safe_div(b.fta as f64, b.fga as f64)
}

pub fn effective_fg_pct(b: &BoxScore) -> f64 {
    100.0 * safe_div(b.fgm as f64 + 0.5 * b.fg3m as f64, b.fga as f64)
}

pub fn ppp(points: f64, possessions: f64) -> f64 {
    safe_div(points, possessions)
}

pub fn levers(team: &BoxScore, opponent: &BoxScore, fta_weight: f64) -> Levers {
    Levers {
        to_pct: turnover_pct(team, fta_weight),
        oreb_pct: oreb_pct(team, opponent),
        ftr: free_throw_rate(team),
    }
}

/// Per-record derived values. Pure function of the record plus the
/// reference population used for the conversion score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub key: GameKey,
    pub to_pct: f64,
    pub oreb_pct: f64,
    pub ftr: f64,
    pub efg_pct: f64,
    pub opportunity_edge: f64,
    pub opponent_edge: f64,
    pub opportunity_diff: f64,
    pub opp_possessions: f64,
    pub ppp: f64,
    pub opp_ppp: f64,
    pub ppp_diff: f64,
    pub conversion_score: f64,
    pub empty_rate: f64,
}

impl DerivedMetrics {
    pub fn levers(&self) -> Levers {
        Levers {
            to_pct: self.to_pct,
            oreb_pct: self.oreb_pct,
            ftr: self.ftr,
        }
    }
}

pub fn derive(
    record: &TeamGameRecord,
    reference: &LeverReference,
    cfg: &OpportunityConfig,
) -> DerivedMetrics {
    let lv = levers(&record.stats, &record.opponent, cfg.fta_weight);
    let edge = opportunity::edge_for(&record.stats, cfg.fta_weight);
    let opponent_edge = opportunity::edge_for(&record.opponent, cfg.fta_weight);
    let team_ppp = ppp(record.stats.pts as f64, record.possessions);
    let opp_possessions = opponent_possessions(record, cfg.fta_weight);
    let opp_ppp = ppp(record.opponent.pts as f64, opp_possessions);

    DerivedMetrics {
        key: record.key(),
        to_pct: lv.to_pct,
        oreb_pct: lv.oreb_pct,
        ftr: lv.ftr,
        efg_pct: effective_fg_pct(&record.stats),
        opportunity_edge: edge,
        opponent_edge,
        opportunity_diff: opportunity::opportunity_diff(edge, opponent_edge),
        opp_possessions,
        ppp: team_ppp,
        opp_ppp,
        ppp_diff: team_ppp - opp_ppp,
        conversion_score: opportunity::conversion_score(&lv, reference, cfg),
        empty_rate: opportunity::empty_rate(&record.stats, record.possessions, cfg.fta_weight),
    }
}

/// Derive metrics for a whole dataset, normalizing the conversion levers
/// against the dataset itself. Output order matches input order.
pub fn derive_all(records: &[TeamGameRecord], cfg: &OpportunityConfig) -> Vec<DerivedMetrics> {
    let all_levers: Vec<Levers> = records
        .iter()
        .map(|r| levers(&r.stats, &r.opponent, cfg.fta_weight))
        .collect();
    let reference = LeverReference::from_levers(&all_levers);
    records
        .iter()
        .map(|r| derive(r, &reference, cfg))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Venue;
    use crate::records::fixtures::record;

    #[test]
    fn normalize_pct_handles_both_forms() {
        assert!((normalize_pct(43.5) - 0.435).abs() < 1e-12);
        assert!((normalize_pct(0.435) - 0.435).abs() < 1e-12);
        assert_eq!(normalize_pct(100.0), 1.0);
        assert_eq!(normalize_pct(0.0), 0.0);
        assert_eq!(normalize_pct(f64::NAN), 0.0);
    }

    #[test]
    fn normalize_pct_stays_in_unit_interval() {
        let mut v = 0.0;
        while v <= 100.0 {
            let n = normalize_pct(v);
            assert!((0.0..=1.0).contains(&n), "normalize_pct({v}) = {n}");
            v += 0.05;
        }
    }

    #[test]
    fn zero_denominators_yield_zero() {
        let empty = BoxScore::default();
        assert_eq!(turnover_pct(&empty, 0.44), 0.0);
        assert_eq!(estimate_possessions(&empty, 0.44), 0.0);
        assert_eq!(oreb_pct(&empty, &empty), 0.0);
        assert_eq!(free_throw_rate(&empty), 0.0);
        assert_eq!(effective_fg_pct(&empty), 0.0);
        assert_eq!(ppp(110.0, 0.0), 0.0);
    }

    #[test]
    fn rates_match_hand_computation() {
        let r = record(1, 10, 20, Venue::Home, true);
        // 13 / (88 + 0.44*23 + 13)
        assert!((turnover_pct(&r.stats, 0.44) - 100.0 * 13.0 / 111.12).abs() < 1e-9);
        // 10 / (10 + 34)
        assert!((oreb_pct(&r.stats, &r.opponent) - 100.0 * 10.0 / 44.0).abs() < 1e-9);
        assert!((free_throw_rate(&r.stats) - 100.0 * 23.0 / 88.0).abs() < 1e-9);
        assert!((effective_fg_pct(&r.stats) - 100.0 * 46.0 / 88.0).abs() < 1e-9);
    }

    #[test]
    fn derive_all_is_repeatable() {
        let rows = vec![
            record(1, 10, 20, Venue::Home, true),
            record(1, 20, 10, Venue::Away, false),
        ];
        let cfg = OpportunityConfig::default();
        let a = derive_all(&rows, &cfg);
        let b = derive_all(&rows, &cfg);
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].key, rows[0].key());
        assert!((a[0].ppp - 110.0 / 99.0).abs() < 1e-12);
        assert!((a[0].ppp_diff - 4.0 / 99.0).abs() < 1e-12);
    }

    #[test]
    fn each_side_is_rated_on_its_own_possessions() {
        // Lost 104-108 but on 90 trips against 100.
        let mut r = record(1, 10, 20, Venue::Home, false);
        r.stats.pts = 104;
        r.opponent.pts = 108;
        r.possessions = 90.0;
        r.opp_possessions = 100.0;
        let m = derive_all(std::slice::from_ref(&r), &OpportunityConfig::default())[0];
        assert!((m.ppp - 104.0 / 90.0).abs() < 1e-12);
        assert!((m.opp_ppp - 1.08).abs() < 1e-12);
        assert!(m.ppp_diff > 0.05);
        assert!(r.margin() < 0);
    }

    #[test]
    fn missing_opponent_possessions_are_estimated() {
        let mut r = record(1, 10, 20, Venue::Home, true);
        r.opp_possessions = 0.0;
        // 87 - 9 + 14 + 0.44*22
        let expected = 87.0 - 9.0 + 14.0 + 0.44 * 22.0;
        assert!((opponent_possessions(&r, 0.44) - expected).abs() < 1e-9);
        r.opp_possessions = f64::NAN;
        assert!((opponent_possessions(&r, 0.44) - expected).abs() < 1e-9);
        r.opponent = BoxScore::default();
        assert_eq!(opponent_possessions(&r, 0.44), r.possessions);
    }
}
