use std::collections::{BTreeMap, BTreeSet, HashMap};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::bucketing::{BucketSummary, quantile_buckets, summarize_buckets};
use crate::classify::{
    Archetype, ArchetypeFavor, GameShape, PropTag, ScoringEnvironment, prop_tags, scoring_environment,
};
use crate::config::{ModelConfig, SevereFailureThresholds};
use crate::metrics::{DerivedMetrics, derive_all, effective_fg_pct};
use crate::profiles::{TeamSeasonProfile, build_profiles};
use crate::records::{GameKey, TeamGameRecord, validate_pairs};
use crate::stats;

/// One team-game with everything the analyses read.
#[derive(Debug, Clone)]
pub struct AnalysisRow {
    pub record: TeamGameRecord,
    pub metrics: DerivedMetrics,
    pub environment: ScoringEnvironment,
    pub props: BTreeSet<PropTag>,
}

impl AnalysisRow {
    pub fn key(&self) -> GameKey {
        self.record.key()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SanityReport {
    pub records: usize,
    pub implausible_pace: Vec<GameKey>,
    pub unpaired_games: Vec<u64>,
}

impl SanityReport {
    pub fn is_clean(&self) -> bool {
        self.implausible_pace.is_empty() && self.unpaired_games.is_empty()
    }
}

/// Immutable, fully classified dataset shared read-only by every analysis.
#[derive(Debug, Clone)]
pub struct Dataset {
    rows: Vec<AnalysisRow>,
    profiles: Vec<TeamSeasonProfile>,
    profile_index: HashMap<u32, usize>,
    sanity: SanityReport,
}

impl Dataset {
    pub fn build(records: Vec<TeamGameRecord>, cfg: &ModelConfig) -> Self {
        let metrics = derive_all(&records, &cfg.opportunity);
        let profiles = build_profiles(&records, &metrics);
        let profile_index = profiles
            .iter()
            .enumerate()
            .map(|(i, p)| (p.team_id, i))
            .collect();

        let unpaired_games = validate_pairs(&records);
        let implausible_pace: Vec<GameKey> = records
            .iter()
            .filter(|r| !cfg.sanity.pace_is_plausible(r.pace))
            .map(|r| r.key())
            .collect();

        let rows: Vec<AnalysisRow> = records
            .into_par_iter()
            .zip(metrics.into_par_iter())
            .map(|(record, metrics)| {
                let shape = GameShape::from_record(&record, &metrics);
                AnalysisRow {
                    environment: scoring_environment(&shape, &cfg.environment),
                    props: prop_tags(&shape, &cfg.props),
                    record,
                    metrics,
                }
            })
            .collect();

        if !implausible_pace.is_empty() {
            warn!(
                count = implausible_pace.len(),
                min_pace = cfg.sanity.min_pace,
                max_pace = cfg.sanity.max_pace,
                "team-games with pace outside the plausible league range"
            );
        }
        if !unpaired_games.is_empty() {
            warn!(
                count = unpaired_games.len(),
                "games without a matching home/away record pair"
            );
        }
        debug!(records = rows.len(), teams = profiles.len(), "dataset built");

        let sanity = SanityReport {
            records: rows.len(),
            implausible_pace,
            unpaired_games,
        };

        Self {
            rows,
            profiles,
            profile_index,
            sanity,
        }
    }

    pub fn rows(&self) -> &[AnalysisRow] {
        &self.rows
    }

    pub fn profiles(&self) -> &[TeamSeasonProfile] {
        &self.profiles
    }

    pub fn profile(&self, team_id: u32) -> Option<&TeamSeasonProfile> {
        self.profile_index.get(&team_id).map(|i| &self.profiles[*i])
    }

    pub fn sanity(&self) -> &SanityReport {
        &self.sanity
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OpportunityOutcome {
    pub samples: usize,
    pub correlation: f64,
    pub buckets: Vec<BucketSummary>,
    /// Indexed by bucket number; an empty bucket keeps an empty list.
    pub bucket_keys: Vec<Vec<GameKey>>,
    pub edge_winners: usize,
    pub edge_winner_win_rate: f64,
    pub failure_rate: f64,
    pub failure_games: Vec<GameKey>,
}

/// Does winning the opportunity battle translate into winning the game?
pub fn opportunity_vs_outcome(ds: &Dataset, buckets: usize) -> OpportunityOutcome {
    let diffs: Vec<f64> = ds.rows.iter().map(|r| r.metrics.opportunity_diff).collect();
    let wins: Vec<bool> = ds.rows.iter().map(|r| r.record.won).collect();
    let win_indicator: Vec<f64> = wins.iter().map(|w| if *w { 1.0 } else { 0.0 }).collect();

    let edge_winners: Vec<&AnalysisRow> = ds
        .rows
        .iter()
        .filter(|r| r.metrics.opportunity_diff > 0.0)
        .collect();
    let edge_winner_wins = edge_winners.iter().filter(|r| r.record.won).count();
    let failure_games: Vec<GameKey> = edge_winners
        .iter()
        .filter(|r| !r.record.won)
        .map(|r| r.key())
        .collect();

    OpportunityOutcome {
        samples: ds.rows.len(),
        correlation: stats::pearson(&diffs, &win_indicator),
        buckets: summarize_buckets(&diffs, &wins, buckets),
        bucket_keys: keys_by_bucket(ds, &diffs, buckets),
        edge_winners: edge_winners.len(),
        edge_winner_win_rate: stats::rate(edge_winner_wins, edge_winners.len()),
        failure_rate: stats::rate(failure_games.len(), edge_winners.len()),
        failure_games,
    }
}

fn keys_by_bucket(ds: &Dataset, values: &[f64], buckets: usize) -> Vec<Vec<GameKey>> {
    let assignment = quantile_buckets(values, buckets);
    let mut out: Vec<Vec<GameKey>> = vec![Vec::new(); buckets.max(1)];
    for (row, bucket) in ds.rows.iter().zip(assignment) {
        out[bucket].push(row.key());
    }
    out
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentSummary {
    pub environment: ScoringEnvironment,
    pub label: &'static str,
    pub games: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub avg_ppp: f64,
    pub avg_ppp_diff: f64,
    pub avg_conversion_score: f64,
    pub keys: Vec<GameKey>,
}

/// Win rate and efficiency per scoring environment. Every label is listed,
/// including ones no game landed in.
pub fn environment_breakdown(ds: &Dataset) -> Vec<EnvironmentSummary> {
    ScoringEnvironment::ALL
        .iter()
        .map(|env| {
            let members: Vec<&AnalysisRow> =
                ds.rows.iter().filter(|r| r.environment == *env).collect();
            let wins = members.iter().filter(|r| r.record.won).count();
            EnvironmentSummary {
                environment: *env,
                label: env.label(),
                games: members.len(),
                wins,
                win_rate: stats::rate(wins, members.len()),
                avg_ppp: mean_of(&members, |r| r.metrics.ppp),
                avg_ppp_diff: mean_of(&members, |r| r.metrics.ppp_diff),
                avg_conversion_score: mean_of(&members, |r| r.metrics.conversion_score),
                keys: members.iter().map(|r| r.key()).collect(),
            }
        })
        .collect()
}

fn mean_of(rows: &[&AnalysisRow], f: impl Fn(&AnalysisRow) -> f64) -> f64 {
    let values: Vec<f64> = rows.iter().map(|r| f(r)).collect();
    stats::mean(&values)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideDriver {
    ProcessDriven,
    VarianceDriven,
    Insufficient,
}

impl OverrideDriver {
    pub fn label(self) -> &'static str {
        match self {
            OverrideDriver::ProcessDriven => "process-driven",
            OverrideDriver::VarianceDriven => "variance-driven",
            OverrideDriver::Insufficient => "insufficient data",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EfficiencyOverrides {
    pub edge_losers: usize,
    pub count: usize,
    pub share_of_edge_losers: f64,
    pub avg_ppp_advantage: f64,
    pub avg_conversion_score: f64,
    pub avg_efg_advantage: f64,
    pub driver: OverrideDriver,
    pub games: Vec<GameKey>,
}

/// Games lost on opportunity but won anyway. A conversion score at or above
/// the midpoint marks the subset as process-driven rather than hot shooting.
pub fn efficiency_overrides(ds: &Dataset) -> EfficiencyOverrides {
    let edge_losers: Vec<&AnalysisRow> = ds
        .rows
        .iter()
        .filter(|r| r.metrics.opportunity_diff < 0.0)
        .collect();
    let overrides: Vec<&AnalysisRow> = edge_losers.iter().copied().filter(|r| r.record.won).collect();

    let avg_conversion_score = mean_of(&overrides, |r| r.metrics.conversion_score);
    let driver = if overrides.is_empty() {
        OverrideDriver::Insufficient
    } else if avg_conversion_score >= 50.0 {
        OverrideDriver::ProcessDriven
    } else {
        OverrideDriver::VarianceDriven
    };

    EfficiencyOverrides {
        edge_losers: edge_losers.len(),
        count: overrides.len(),
        share_of_edge_losers: stats::rate(overrides.len(), edge_losers.len()),
        avg_ppp_advantage: mean_of(&overrides, |r| r.metrics.ppp_diff),
        avg_conversion_score,
        avg_efg_advantage: mean_of(&overrides, |r| {
            r.metrics.efg_pct - effective_fg_pct(&r.record.opponent)
        }),
        driver,
        games: overrides.iter().map(|r| r.key()).collect(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OpponentContext {
    pub samples: usize,
    pub skipped: Vec<GameKey>,
    pub opp_def_rating_vs_to_pct: f64,
    pub opp_def_rating_vs_oreb_pct: f64,
    pub opp_def_rating_vs_win: f64,
    pub pace_matchup: Vec<BucketSummary>,
    pub pace_matchup_keys: Vec<Vec<GameKey>>,
}

/// Opponent pressure proxies: the opponent's season defensive rating against
/// this game's ball security, glass work and result; plus win rate by
/// pace-matchup bucket (own season pace minus opponent season pace).
pub fn opponent_context(ds: &Dataset, pace_buckets: usize) -> OpponentContext {
    let mut opp_def = Vec::new();
    let mut to_pct = Vec::new();
    let mut oreb_pct = Vec::new();
    let mut wins = Vec::new();
    let mut pace_gap = Vec::new();
    let mut keys = Vec::new();
    let mut skipped = Vec::new();

    for row in &ds.rows {
        let (Some(own), Some(opp)) = (
            ds.profile(row.record.team_id),
            ds.profile(row.record.opponent_id),
        ) else {
            skipped.push(row.key());
            continue;
        };
        opp_def.push(opp.def_rating);
        to_pct.push(row.metrics.to_pct);
        oreb_pct.push(row.metrics.oreb_pct);
        wins.push(row.record.won);
        pace_gap.push(own.pace - opp.pace);
        keys.push(row.key());
    }

    let win_indicator: Vec<f64> = wins.iter().map(|w| if *w { 1.0 } else { 0.0 }).collect();
    let assignment = quantile_buckets(&pace_gap, pace_buckets);
    let mut pace_matchup_keys: Vec<Vec<GameKey>> = vec![Vec::new(); pace_buckets.max(1)];
    for (key, bucket) in keys.iter().zip(assignment) {
        pace_matchup_keys[bucket].push(*key);
    }

    OpponentContext {
        samples: keys.len(),
        skipped,
        opp_def_rating_vs_to_pct: stats::pearson(&opp_def, &to_pct),
        opp_def_rating_vs_oreb_pct: stats::pearson(&opp_def, &oreb_pct),
        opp_def_rating_vs_win: stats::pearson(&opp_def, &win_indicator),
        pace_matchup: summarize_buckets(&pace_gap, &wins, pace_buckets),
        pace_matchup_keys,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchetypeCount {
    pub archetype: Archetype,
    pub label: String,
    pub favor: ArchetypeFavor,
    pub count: usize,
    pub share: f64,
    pub team_ids: Vec<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchetypeDistribution {
    pub teams: usize,
    pub distinct: usize,
    pub rows: Vec<ArchetypeCount>,
}

/// How the team population spreads over the 27 archetypes, most common first.
pub fn archetype_distribution(ds: &Dataset) -> ArchetypeDistribution {
    let mut groups: BTreeMap<Archetype, Vec<u32>> = BTreeMap::new();
    for p in &ds.profiles {
        if let Some(archetype) = p.archetype {
            groups.entry(archetype).or_default().push(p.team_id);
        }
    }
    let teams: usize = groups.values().map(|v| v.len()).sum();

    let mut rows: Vec<ArchetypeCount> = groups
        .into_iter()
        .map(|(archetype, team_ids)| ArchetypeCount {
            label: archetype.label(),
            favor: archetype.favor(),
            count: team_ids.len(),
            share: stats::rate(team_ids.len(), teams),
            archetype,
            team_ids,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then(a.archetype.cmp(&b.archetype)));

    ArchetypeDistribution {
        teams,
        distinct: rows.len(),
        rows,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StackedPropGame {
    pub key: GameKey,
    pub tags: Vec<PropTag>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StackedProps {
    pub min_tags: usize,
    pub count: usize,
    pub share: f64,
    pub tag_counts: Vec<(PropTag, usize)>,
    pub games: Vec<StackedPropGame>,
}

/// Team-games carrying at least `min_tags` prop tags at once.
pub fn stacked_props(ds: &Dataset, min_tags: usize) -> StackedProps {
    let games: Vec<StackedPropGame> = ds
        .rows
        .iter()
        .filter(|r| r.props.len() >= min_tags)
        .map(|r| StackedPropGame {
            key: r.key(),
            tags: r.props.iter().copied().collect(),
        })
        .collect();

    let mut counts: BTreeMap<PropTag, usize> = BTreeMap::new();
    for g in &games {
        for tag in &g.tags {
            *counts.entry(*tag).or_default() += 1;
        }
    }

    StackedProps {
        min_tags,
        count: games.len(),
        share: stats::rate(games.len(), ds.rows.len()),
        tag_counts: counts.into_iter().collect(),
        games,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SevereFailures {
    pub thresholds: SevereFailureThresholds,
    pub count: usize,
    pub avg_pace: f64,
    pub league_avg_pace: f64,
    pub games: Vec<GameKey>,
    pub implausible_pace: Vec<GameKey>,
}

/// Losses despite clearing the edge, conversion and efficiency bars at once:
/// out-scoring the opponent per possession on fewer trips and still losing.
/// Anything found is a variance or data-quality flag, so matches with
/// implausible pace are called out separately.
pub fn severe_failures(ds: &Dataset, cfg: &ModelConfig) -> SevereFailures {
    let t = &cfg.severe_failure;
    let members: Vec<&AnalysisRow> = ds
        .rows
        .iter()
        .filter(|r| {
            !r.record.won
                && r.metrics.opportunity_diff >= t.min_opportunity_diff
                && r.metrics.conversion_score >= t.min_conversion_score
                && r.metrics.ppp_diff >= t.min_ppp_advantage
        })
        .collect();

    let all_pace: Vec<f64> = ds.rows.iter().map(|r| r.record.pace).collect();
    let implausible_pace = members
        .iter()
        .filter(|r| !cfg.sanity.pace_is_plausible(r.record.pace))
        .map(|r| r.key())
        .collect::<Vec<_>>();
    if !implausible_pace.is_empty() {
        warn!(
            count = implausible_pace.len(),
            "severe-failure games include implausible pace; check possession counts upstream"
        );
    }

    SevereFailures {
        thresholds: t.clone(),
        count: members.len(),
        avg_pace: mean_of(&members, |r| r.record.pace),
        league_avg_pace: stats::mean(&all_pace),
        games: members.iter().map(|r| r.key()).collect(),
        implausible_pace,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternReport {
    pub sanity: SanityReport,
    pub opportunity: OpportunityOutcome,
    pub environments: Vec<EnvironmentSummary>,
    pub overrides: EfficiencyOverrides,
    pub opponent_context: OpponentContext,
    pub archetypes: ArchetypeDistribution,
    pub stacked_props: StackedProps,
    pub severe_failures: SevereFailures,
}

pub const STACKED_PROP_MIN_TAGS: usize = 2;

/// Run the full battery. Analyses only read the dataset, so they run in
/// parallel and are gathered into one report.
pub fn run_all(ds: &Dataset, cfg: &ModelConfig) -> PatternReport {
    let ((opportunity, environments), ((overrides, opponent), ((archetypes, stacked), severe))) =
        rayon::join(
            || {
                rayon::join(
                    || opportunity_vs_outcome(ds, cfg.buckets.opportunity_buckets),
                    || environment_breakdown(ds),
                )
            },
            || {
                rayon::join(
                    || {
                        rayon::join(
                            || efficiency_overrides(ds),
                            || opponent_context(ds, cfg.buckets.pace_matchup_buckets),
                        )
                    },
                    || {
                        rayon::join(
                            || {
                                rayon::join(
                                    || archetype_distribution(ds),
                                    || stacked_props(ds, STACKED_PROP_MIN_TAGS),
                                )
                            },
                            || severe_failures(ds, cfg),
                        )
                    },
                )
            },
        );

    debug!(
        failures = opportunity.failure_games.len(),
        overrides = overrides.count,
        severe = severe.count,
        "pattern battery complete"
    );

    PatternReport {
        sanity: ds.sanity.clone(),
        opportunity,
        environments,
        overrides,
        opponent_context: opponent,
        archetypes,
        stacked_props: stacked,
        severe_failures: severe,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::fixtures::record;
    use crate::records::{BoxScore, Venue};

    fn pair(game_id: u64, home: u32, away: u32, home_won: bool) -> Vec<TeamGameRecord> {
        let mut h = record(game_id, home, away, Venue::Home, home_won);
        let mut a = record(game_id, away, home, Venue::Away, !home_won);
        std::mem::swap(&mut a.stats, &mut a.opponent);
        if !home_won {
            std::mem::swap(&mut h.stats, &mut h.opponent);
            std::mem::swap(&mut a.stats, &mut a.opponent);
        }
        vec![h, a]
    }

    #[test]
    fn empty_dataset_is_well_formed() {
        let cfg = ModelConfig::default();
        let ds = Dataset::build(Vec::new(), &cfg);
        let report = run_all(&ds, &cfg);
        assert_eq!(report.opportunity.samples, 0);
        assert_eq!(report.environments.len(), 6);
        assert_eq!(report.overrides.driver, OverrideDriver::Insufficient);
        assert_eq!(report.archetypes.teams, 0);
        assert!(report.sanity.is_clean());
    }

    #[test]
    fn failure_and_override_games_are_flagged() {
        let cfg = ModelConfig::default();
        let mut rows = pair(1, 10, 20, true);
        // Home side wins the opportunity battle but loses the game.
        rows[0].won = false;
        rows[1].won = true;
        rows[0].stats.oreb = 20;
        let ds = Dataset::build(rows, &cfg);
        let opp = opportunity_vs_outcome(&ds, 5);
        assert_eq!(
            opp.failure_games,
            vec![GameKey {
                game_id: 1,
                team_id: 10
            }]
        );
        let ov = efficiency_overrides(&ds);
        assert_eq!(ov.count, 1);
        assert_eq!(ov.games[0].team_id, 20);
    }

    #[test]
    fn implausible_pace_is_reported() {
        let cfg = ModelConfig::default();
        let mut rows = pair(7, 1, 2, true);
        rows[0].pace = 60.0;
        let ds = Dataset::build(rows, &cfg);
        assert_eq!(ds.sanity().implausible_pace.len(), 1);
        assert!(ds.sanity().unpaired_games.is_empty());
    }

    #[test]
    fn loss_with_better_efficiency_is_a_severe_failure() {
        let cfg = ModelConfig::default();
        let mut home = record(1, 10, 20, Venue::Home, false);
        home.stats = BoxScore {
            fgm: 35,
            fga: 80,
            fg3m: 10,
            ftm: 24,
            fta: 32,
            oreb: 18,
            dreb: 30,
            tov: 6,
            ast: 22,
            pts: 104,
            paint_pts: 50,
        };
        home.opponent.pts = 108;
        home.possessions = 90.0;
        home.opp_possessions = 100.0;

        let mut away = record(1, 20, 10, Venue::Away, true);
        away.stats = home.opponent;
        away.opponent = home.stats;
        away.possessions = 100.0;
        away.opp_possessions = 90.0;

        let mut rows = vec![home, away];
        rows.extend(pair(2, 10, 20, true));
        let ds = Dataset::build(rows, &cfg);

        let flagged = GameKey {
            game_id: 1,
            team_id: 10,
        };
        let row = ds.rows().iter().find(|r| r.key() == flagged).expect("row present");
        assert!(row.metrics.ppp_diff >= cfg.severe_failure.min_ppp_advantage);
        assert!(row.metrics.opportunity_diff >= cfg.severe_failure.min_opportunity_diff);
        assert!(row.metrics.conversion_score >= cfg.severe_failure.min_conversion_score);

        let severe = severe_failures(&ds, &cfg);
        assert_eq!(severe.games, vec![flagged]);
        assert_eq!(severe.count, 1);
        assert!(severe.implausible_pace.is_empty());
        assert!(opportunity_vs_outcome(&ds, 5).failure_games.contains(&flagged));
    }

    fn context_dataset() -> Dataset {
        let mut rows = Vec::new();
        rows.extend(pair(1, 1, 2, true));
        rows.extend(pair(2, 2, 3, true));
        rows.extend(pair(3, 3, 1, false));
        // Team 99 never appears on its own, so this row has no opponent profile.
        rows.push(record(4, 4, 99, Venue::Home, true));
        for r in &mut rows {
            let (pace, def_rating) = match r.team_id {
                1 => (104.0, 105.0),
                2 => (98.0, 110.0),
                3 => (92.0, 115.0),
                _ => (100.0, 110.0),
            };
            r.pace = pace;
            r.def_rating = def_rating;
        }
        Dataset::build(rows, &ModelConfig::default())
    }

    #[test]
    fn opponent_context_skips_rows_without_an_opponent_profile() {
        let ds = context_dataset();
        let ctx = opponent_context(&ds, 3);
        assert_eq!(ctx.samples, 6);
        assert_eq!(
            ctx.skipped,
            vec![GameKey {
                game_id: 4,
                team_id: 4
            }]
        );
    }

    #[test]
    fn opponent_context_buckets_pace_gaps_into_terciles() {
        let ds = context_dataset();
        let ctx = opponent_context(&ds, 3);
        assert_eq!(ctx.pace_matchup.len(), 3);
        assert_eq!(ctx.pace_matchup_keys.len(), 3);
        for (summary, keys) in ctx.pace_matchup.iter().zip(&ctx.pace_matchup_keys) {
            assert_eq!(summary.count, 2);
            assert_eq!(keys.len(), summary.count);
        }
        // Gaps are -12, -6, -6, 6, 6, 12.
        assert_eq!(ctx.pace_matchup[0].min, -12.0);
        assert_eq!(ctx.pace_matchup[2].max, 12.0);
        // The slowest-vs-fastest gap belongs to team 3 hosting team 1.
        assert!(ctx.pace_matchup_keys[0].contains(&GameKey {
            game_id: 3,
            team_id: 3
        }));
    }

    #[test]
    fn opponent_context_correlates_weak_defenses_with_wins() {
        let ds = context_dataset();
        let ctx = opponent_context(&ds, 3);
        // Winners faced ratings 110, 115, 115; losers 105, 110, 105.
        assert!((ctx.opp_def_rating_vs_win - 10.0 / 150f64.sqrt()).abs() < 1e-9);
        for r in [ctx.opp_def_rating_vs_to_pct, ctx.opp_def_rating_vs_oreb_pct] {
            assert!(r.is_finite() && (-1.0..=1.0).contains(&r));
        }
    }
}
