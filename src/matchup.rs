use serde::Serialize;
use tracing::debug;

use crate::classify::ArchetypeFavor;
use crate::config::{MatchupConfig, ModelConfig};
use crate::decision::{
    ArchetypeContext, ConfidenceTier, Decision, DriverSet, MarginRisk, Volatility, make_decision,
};
use crate::profiles::TeamSeasonProfile;
use crate::stats;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub home_team_id: u32,
    pub home_team: String,
    pub away_team_id: u32,
    pub away_team: String,
    pub pace: f64,
    pub home_ppp: f64,
    pub away_ppp: f64,
    pub home_points: f64,
    pub away_points: f64,
    pub total: f64,
    pub line: Option<f64>,
    /// Projected total minus the line.
    pub edge: Option<f64>,
    pub drivers: DriverSet,
    pub archetype: Option<ArchetypeContext>,
    pub volatility: Volatility,
    pub margin: MarginRisk,
    pub decision: Decision,
}

/// Project a game total from two season profiles and run the decision engine.
///
/// Pace is the mean of both teams' season pace. Each side's points per
/// possession averages its own PPP with what the opponent allows. The three
/// drivers are game-level: combined free-throw makes, combined paint points,
/// and the mean eFG%.
pub fn project_matchup(
    home: &TeamSeasonProfile,
    away: &TeamSeasonProfile,
    line: Option<f64>,
    cfg: &ModelConfig,
) -> Projection {
    let pace = stats::mean(&[home.pace, away.pace]);
    let home_ppp = stats::mean(&[home.ppp, away.opp_ppp]);
    let away_ppp = stats::mean(&[away.ppp, home.opp_ppp]);
    let home_points = pace * home_ppp;
    let away_points = pace * away_ppp;
    let total = home_points + away_points;
    let line = line.filter(|l| l.is_finite());
    let edge = line.map(|l| total - l);

    let drivers = DriverSet::from_values(
        Some(home.ft_points + away.ft_points),
        Some(home.paint_points + away.paint_points),
        Some(stats::mean(&[home.efg_pct, away.efg_pct])),
        &cfg.drivers,
    );
    let archetype = archetype_context(home, away, &cfg.matchup);
    let volatility = volatility(home, away, &cfg.matchup);
    let margin = margin_risk(home, away, &cfg.matchup);

    let decision = make_decision(&drivers, archetype.as_ref(), Some(&volatility), Some(margin), cfg);
    debug!(
        home = home.team_id,
        away = away.team_id,
        total,
        call = %decision.call,
        confidence = decision.confidence,
        "projected matchup"
    );

    Projection {
        home_team_id: home.team_id,
        home_team: home.team.clone(),
        away_team_id: away.team_id,
        away_team: away.team.clone(),
        pace,
        home_ppp,
        away_ppp,
        home_points,
        away_points,
        total,
        line,
        edge,
        drivers,
        archetype,
        volatility,
        margin,
        decision,
    }
}

/// Both archetypes must be known. Agreeing leans (or one lean against a
/// neutral side) carry through; opposite leans cancel.
pub fn archetype_context(
    home: &TeamSeasonProfile,
    away: &TeamSeasonProfile,
    cfg: &MatchupConfig,
) -> Option<ArchetypeContext> {
    let (h, a) = (home.archetype?, away.archetype?);
    let favor = match (h.favor(), a.favor()) {
        (x, y) if x == y => x,
        (ArchetypeFavor::Neutral, other) | (other, ArchetypeFavor::Neutral) => other,
        _ => ArchetypeFavor::Neutral,
    };
    let sample = home.games.min(away.games);
    let tier = if sample >= cfg.high_tier_games {
        ConfidenceTier::High
    } else if sample >= cfg.medium_tier_games {
        ConfidenceTier::Medium
    } else {
        ConfidenceTier::Low
    };
    Some(ArchetypeContext {
        label: format!("{} vs {}", h.label(), a.label()),
        tier,
        sample_size: u32::try_from(sample).unwrap_or(u32::MAX),
        favor,
    })
}

/// Mean game-total SD of both teams, rescaled so `calm_total_sd` is zero.
pub fn volatility(home: &TeamSeasonProfile, away: &TeamSeasonProfile, cfg: &MatchupConfig) -> Volatility {
    let sd = stats::mean(&[home.total_points_sd, away.total_points_sd]);
    Volatility::from_index((sd - cfg.calm_total_sd) / cfg.sd_per_volatility_point)
}

pub fn margin_risk(home: &TeamSeasonProfile, away: &TeamSeasonProfile, cfg: &MatchupConfig) -> MarginRisk {
    let gap = (home.net_rating() - away.net_rating()).abs();
    if gap >= cfg.blowout_net_gap {
        MarginRisk::BlowoutRisk
    } else if gap >= cfg.moderate_net_gap {
        MarginRisk::Moderate
    } else {
        MarginRisk::Competitive
    }
}
