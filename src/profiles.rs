use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::classify::{Archetype, LeverProfile, classify_archetypes};
use crate::metrics::DerivedMetrics;
use crate::records::TeamGameRecord;
use crate::stats;

/// Season-long averages for one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSeasonProfile {
    pub team_id: u32,
    pub team: String,
    pub games: usize,
    pub wins: usize,
    pub to_pct: f64,
    pub oreb_pct: f64,
    pub ftr: f64,
    pub efg_pct: f64,
    pub pace: f64,
    pub ppp: f64,
    pub opp_ppp: f64,
    pub off_rating: f64,
    pub def_rating: f64,
    pub ft_points: f64,
    pub paint_points: f64,
    pub points: f64,
    pub opp_points: f64,
    pub total_points_sd: f64,
    pub archetype: Option<Archetype>,
}

impl TeamSeasonProfile {
    pub fn net_rating(&self) -> f64 {
        self.off_rating - self.def_rating
    }

    pub fn win_pct(&self) -> f64 {
        stats::rate(self.wins, self.games)
    }

    pub fn lever_profile(&self) -> LeverProfile {
        LeverProfile {
            team_id: self.team_id,
            to_pct: self.to_pct,
            oreb_pct: self.oreb_pct,
            ftr: self.ftr,
        }
    }
}

#[derive(Default)]
struct Accumulator<'a> {
    team: &'a str,
    wins: usize,
    to_pct: Vec<f64>,
    oreb_pct: Vec<f64>,
    ftr: Vec<f64>,
    efg_pct: Vec<f64>,
    pace: Vec<f64>,
    ppp: Vec<f64>,
    opp_ppp: Vec<f64>,
    off_rating: Vec<f64>,
    def_rating: Vec<f64>,
    ft_points: Vec<f64>,
    paint_points: Vec<f64>,
    points: Vec<f64>,
    opp_points: Vec<f64>,
    totals: Vec<f64>,
}

/// Aggregate per-team season profiles and attach each team's archetype.
/// `metrics` must be index-aligned with `records`. Output is sorted by team id.
pub fn build_profiles(records: &[TeamGameRecord], metrics: &[DerivedMetrics]) -> Vec<TeamSeasonProfile> {
    let mut by_team: BTreeMap<u32, Accumulator<'_>> = BTreeMap::new();
    for (r, m) in records.iter().zip(metrics) {
        let acc = by_team.entry(r.team_id).or_default();
        acc.team = &r.team;
        if r.won {
            acc.wins += 1;
        }
        acc.to_pct.push(m.to_pct);
        acc.oreb_pct.push(m.oreb_pct);
        acc.ftr.push(m.ftr);
        acc.efg_pct.push(m.efg_pct);
        acc.pace.push(r.pace);
        acc.ppp.push(m.ppp);
        acc.opp_ppp.push(m.opp_ppp);
        acc.off_rating.push(r.off_rating);
        acc.def_rating.push(r.def_rating);
        acc.ft_points.push(r.stats.ftm as f64);
        acc.paint_points.push(r.stats.paint_pts as f64);
        acc.points.push(r.stats.pts as f64);
        acc.opp_points.push(r.opponent.pts as f64);
        acc.totals.push(r.total_points() as f64);
    }

    let mut profiles: Vec<TeamSeasonProfile> = by_team
        .into_iter()
        .map(|(team_id, acc)| TeamSeasonProfile {
            team_id,
            team: acc.team.to_string(),
            games: acc.points.len(),
            wins: acc.wins,
            to_pct: stats::mean(&acc.to_pct),
            oreb_pct: stats::mean(&acc.oreb_pct),
            ftr: stats::mean(&acc.ftr),
            efg_pct: stats::mean(&acc.efg_pct),
            pace: stats::mean(&acc.pace),
            ppp: stats::mean(&acc.ppp),
            opp_ppp: stats::mean(&acc.opp_ppp),
            off_rating: stats::mean(&acc.off_rating),
            def_rating: stats::mean(&acc.def_rating),
            ft_points: stats::mean(&acc.ft_points),
            paint_points: stats::mean(&acc.paint_points),
            points: stats::mean(&acc.points),
            opp_points: stats::mean(&acc.opp_points),
            total_points_sd: stats::std_dev(&acc.totals),
            archetype: None,
        })
        .collect();

    let levers: Vec<LeverProfile> = profiles.iter().map(|p| p.lever_profile()).collect();
    let archetypes = classify_archetypes(&levers);
    for p in &mut profiles {
        p.archetype = archetypes.get(&p.team_id).copied();
    }
    profiles
}
