use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bucketing::{Level, percentile_ranks};
use crate::config::{EnvironmentThresholds, PropThresholds};
use crate::metrics::DerivedMetrics;
use crate::records::TeamGameRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScoringEnvironment {
    FtDriven,
    ReboundHeavy,
    AssistHeavy,
    Grind,
    Shootout,
    Balanced,
}

impl ScoringEnvironment {
    pub const ALL: [ScoringEnvironment; 6] = [
        ScoringEnvironment::FtDriven,
        ScoringEnvironment::ReboundHeavy,
        ScoringEnvironment::AssistHeavy,
        ScoringEnvironment::Grind,
        ScoringEnvironment::Shootout,
        ScoringEnvironment::Balanced,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ScoringEnvironment::FtDriven => "FT-driven",
            ScoringEnvironment::ReboundHeavy => "Rebound-heavy",
            ScoringEnvironment::AssistHeavy => "Assist-heavy",
            ScoringEnvironment::Grind => "Grind",
            ScoringEnvironment::Shootout => "Shootout",
            ScoringEnvironment::Balanced => "Balanced",
        }
    }
}

/// Inputs the environment and prop classifiers look at for one team-game.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GameShape {
    pub ftr: f64,
    pub oreb_pct: f64,
    pub assists: f64,
    pub pace: f64,
    pub ppp: f64,
    pub off_rating: f64,
    pub def_rating: f64,
}

impl GameShape {
    pub fn from_record(record: &TeamGameRecord, metrics: &DerivedMetrics) -> Self {
        Self {
            ftr: metrics.ftr,
            oreb_pct: metrics.oreb_pct,
            assists: record.stats.ast as f64,
            pace: record.pace,
            ppp: metrics.ppp,
            off_rating: record.off_rating,
            def_rating: record.def_rating,
        }
    }
}

type EnvRule = fn(&GameShape, &EnvironmentThresholds) -> bool;

/// Evaluated top to bottom; the first matching rule wins.
const ENVIRONMENT_RULES: [(EnvRule, ScoringEnvironment); 5] = [
    (|g, t| g.ftr > t.ft_driven_ftr, ScoringEnvironment::FtDriven),
    (|g, t| g.oreb_pct > t.rebound_heavy_oreb_pct, ScoringEnvironment::ReboundHeavy),
    (|g, t| g.assists > t.assist_heavy_assists, ScoringEnvironment::AssistHeavy),
    (
        |g, t| g.pace < t.grind_max_pace && g.ppp < t.grind_max_ppp,
        ScoringEnvironment::Grind,
    ),
    (
        |g, t| g.pace > t.shootout_min_pace && g.ppp > t.shootout_min_ppp,
        ScoringEnvironment::Shootout,
    ),
];

/// Single environment label for a team-game. Total: anything that matches no
/// rule (including NaN inputs) is Balanced.
pub fn scoring_environment(shape: &GameShape, t: &EnvironmentThresholds) -> ScoringEnvironment {
    ENVIRONMENT_RULES
        .iter()
        .find(|(rule, _)| rule(shape, t))
        .map(|(_, env)| *env)
        .unwrap_or(ScoringEnvironment::Balanced)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PropTag {
    HighScoring,
    HighAssists,
    HighRebounds,
    HighFtVolume,
}

impl PropTag {
    pub fn label(self) -> &'static str {
        match self {
            PropTag::HighScoring => "High Scoring",
            PropTag::HighAssists => "High Assists",
            PropTag::HighRebounds => "High Rebounds",
            PropTag::HighFtVolume => "High FT Volume",
        }
    }
}

type PropRule = fn(&GameShape, &PropThresholds) -> bool;

const PROP_RULES: [(PropRule, PropTag); 4] = [
    (
        |g, t| {
            g.pace > t.high_scoring_min_pace
                && (g.off_rating > t.high_scoring_min_rating || g.def_rating > t.high_scoring_min_rating)
        },
        PropTag::HighScoring,
    ),
    (|g, t| g.assists > t.high_assists_min, PropTag::HighAssists),
    (
        |g, t| {
            g.oreb_pct > t.high_rebounds_oreb_pct
                || (g.pace > t.high_rebounds_fast_pace && g.oreb_pct > t.high_rebounds_fast_oreb_pct)
        },
        PropTag::HighRebounds,
    ),
    (|g, t| g.ftr > t.high_ft_volume_ftr, PropTag::HighFtVolume),
];

/// Every prop tag whose predicate holds. Predicates are independent, so the
/// set size equals the number of satisfied predicates.
pub fn prop_tags(shape: &GameShape, t: &PropThresholds) -> BTreeSet<PropTag> {
    PROP_RULES
        .iter()
        .filter(|(rule, _)| rule(shape, t))
        .map(|(_, tag)| *tag)
        .collect()
}

/// Whether a team profile tends to push or suppress totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchetypeFavor {
    OverFavorable,
    UnderFavorable,
    Neutral,
}

impl ArchetypeFavor {
    pub fn label(self) -> &'static str {
        match self {
            ArchetypeFavor::OverFavorable => "OVER-favorable",
            ArchetypeFavor::UnderFavorable => "UNDER-favorable",
            ArchetypeFavor::Neutral => "Neutral",
        }
    }
}

/// High/Med/Low position on the three possession levers. Built only from
/// season percentile ranks of TO%, OREB% and FTr, never from pace or PPP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Archetype {
    pub turnovers: Level,
    pub rebounding: Level,
    pub free_throws: Level,
}

impl Archetype {
    pub fn all() -> Vec<Archetype> {
        let mut out = Vec::with_capacity(27);
        for turnovers in Level::ALL {
            for rebounding in Level::ALL {
                for free_throws in Level::ALL {
                    out.push(Archetype {
                        turnovers,
                        rebounding,
                        free_throws,
                    });
                }
            }
        }
        out
    }

    pub fn label(&self) -> String {
        format!(
            "{} TO / {} OREB / {} FTr",
            self.turnovers.as_str(),
            self.rebounding.as_str(),
            self.free_throws.as_str()
        )
    }

    /// Low turnovers, extra offensive boards and free-throw volume all add
    /// scoring chances; two net levers either way decide the lean.
    pub fn favor(&self) -> ArchetypeFavor {
        let score = match self.turnovers {
            Level::Low => 1,
            Level::Med => 0,
            Level::High => -1,
        } + lever_sign(self.rebounding)
            + lever_sign(self.free_throws);
        if score >= 2 {
            ArchetypeFavor::OverFavorable
        } else if score <= -2 {
            ArchetypeFavor::UnderFavorable
        } else {
            ArchetypeFavor::Neutral
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

fn lever_sign(level: Level) -> i32 {
    match level {
        Level::Low => -1,
        Level::Med => 0,
        Level::High => 1,
    }
}

/// Season lever averages for one team, the archetype classifier's input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeverProfile {
    pub team_id: u32,
    pub to_pct: f64,
    pub oreb_pct: f64,
    pub ftr: f64,
}

/// Archetype per team from percentile ranks across the full team population.
pub fn classify_archetypes(profiles: &[LeverProfile]) -> HashMap<u32, Archetype> {
    let to_ranks = percentile_ranks(&profiles.iter().map(|p| p.to_pct).collect::<Vec<_>>());
    let oreb_ranks = percentile_ranks(&profiles.iter().map(|p| p.oreb_pct).collect::<Vec<_>>());
    let ftr_ranks = percentile_ranks(&profiles.iter().map(|p| p.ftr).collect::<Vec<_>>());

    profiles
        .iter()
        .enumerate()
        .map(|(i, p)| {
            (
                p.team_id,
                Archetype {
                    turnovers: Level::from_percentile(to_ranks[i]),
                    rebounding: Level::from_percentile(oreb_ranks[i]),
                    free_throws: Level::from_percentile(ftr_ranks[i]),
                },
            )
        })
        .collect()
}
