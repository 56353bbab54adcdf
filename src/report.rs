use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;
use tracing::info;

use crate::bucketing::BucketSummary;
use crate::patterns::{Dataset, PatternReport};
use crate::records::GameKey;

/// One team-game flattened for spreadsheets and downstream tools.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameRow {
    pub game_id: u64,
    pub date: String,
    pub season: String,
    pub team_id: u32,
    pub team: String,
    pub opponent_id: u32,
    pub venue: &'static str,
    pub won: bool,
    pub points: u32,
    pub opp_points: u32,
    pub possessions: f64,
    pub opp_possessions: f64,
    pub pace: f64,
    pub off_rating: f64,
    pub def_rating: f64,
    pub to_pct: f64,
    pub oreb_pct: f64,
    pub ftr: f64,
    pub efg_pct: f64,
    pub opportunity_edge: f64,
    pub opportunity_diff: f64,
    pub ppp: f64,
    pub opp_ppp: f64,
    pub ppp_diff: f64,
    pub conversion_score: f64,
    pub empty_rate: f64,
    pub environment: &'static str,
    pub props: Vec<&'static str>,
    pub archetype: Option<String>,
    pub archetype_favor: Option<&'static str>,
}

impl GameRow {
    fn header() -> Vec<String> {
        [
            "Game ID", "Date", "Season", "Team ID", "Team", "Opponent ID", "Venue", "Won",
            "Points", "Opp Points", "Possessions", "Opp Poss", "Pace", "ORtg", "DRtg", "TO%", "OREB%", "FTr",
            "eFG%", "Opp Edge", "Opp Diff", "PPP", "Opp PPP", "PPP Diff", "Conversion",
            "Empty Rate", "Environment", "Props", "Archetype", "Favor",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.game_id.to_string(),
            self.date.clone(),
            self.season.clone(),
            self.team_id.to_string(),
            self.team.clone(),
            self.opponent_id.to_string(),
            self.venue.to_string(),
            yes_no(self.won),
            self.points.to_string(),
            self.opp_points.to_string(),
            f1(self.possessions),
            f1(self.opp_possessions),
            f1(self.pace),
            f1(self.off_rating),
            f1(self.def_rating),
            f1(self.to_pct),
            f1(self.oreb_pct),
            f1(self.ftr),
            f1(self.efg_pct),
            f2(self.opportunity_edge),
            f2(self.opportunity_diff),
            f3(self.ppp),
            f3(self.opp_ppp),
            f3(self.ppp_diff),
            f1(self.conversion_score),
            f3(self.empty_rate),
            self.environment.to_string(),
            self.props.join(" | "),
            self.archetype.clone().unwrap_or_default(),
            self.archetype_favor.unwrap_or_default().to_string(),
        ]
    }
}

pub fn game_rows(ds: &Dataset) -> Vec<GameRow> {
    ds.rows()
        .iter()
        .map(|row| {
            let r = &row.record;
            let m = &row.metrics;
            let archetype = ds.profile(r.team_id).and_then(|p| p.archetype);
            GameRow {
                game_id: r.game_id,
                date: r.date.to_string(),
                season: r.season.clone(),
                team_id: r.team_id,
                team: r.team.clone(),
                opponent_id: r.opponent_id,
                venue: r.venue.as_str(),
                won: r.won,
                points: r.stats.pts,
                opp_points: r.opponent.pts,
                possessions: r.possessions,
                opp_possessions: m.opp_possessions,
                pace: r.pace,
                off_rating: r.off_rating,
                def_rating: r.def_rating,
                to_pct: m.to_pct,
                oreb_pct: m.oreb_pct,
                ftr: m.ftr,
                efg_pct: m.efg_pct,
                opportunity_edge: m.opportunity_edge,
                opportunity_diff: m.opportunity_diff,
                ppp: m.ppp,
                opp_ppp: m.opp_ppp,
                ppp_diff: m.ppp_diff,
                conversion_score: m.conversion_score,
                empty_rate: m.empty_rate,
                environment: row.environment.label(),
                props: row.props.iter().map(|t| t.label()).collect(),
                archetype: archetype.map(|a| a.label()),
                archetype_favor: archetype.map(|a| a.favor().label()),
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub games: usize,
    pub sheets: usize,
}

/// Games sheet plus one sheet per analysis.
pub fn export_workbook(path: &Path, rows: &[GameRow], report: &PatternReport) -> Result<ExportSummary> {
    let mut games = vec![GameRow::header()];
    games.extend(rows.iter().map(GameRow::cells));

    let sheets: Vec<(&str, Vec<Vec<String>>)> = vec![
        ("Games", games),
        ("Opportunity", opportunity_rows(report)),
        ("Environments", environment_rows(report)),
        ("Overrides", override_rows(report)),
        ("OpponentContext", opponent_rows(report)),
        ("Archetypes", archetype_rows(report)),
        ("StackedProps", stacked_rows(report)),
        ("SevereFailures", severe_rows(report)),
        ("Sanity", sanity_rows(report)),
    ];

    let mut workbook = Workbook::new();
    for (name, rows) in &sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name)?;
        write_rows(sheet, rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    info!(path = %path.display(), games = rows.len(), "workbook written");
    Ok(ExportSummary {
        games: rows.len(),
        sheets: sheets.len(),
    })
}

/// Pretty JSON, written to a temp file and swapped into place.
pub fn write_report_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let json = serde_json::to_string_pretty(value).context("serialize report")?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("rename into {}", path.display()))?;
    Ok(())
}

fn bucket_header(first: &str) -> Vec<String> {
    strings(&[first, "Bucket", "Games", "Min", "Max", "Mean", "Wins", "Win Rate", "Keys"])
}

fn bucket_cells(label: &str, b: &BucketSummary, keys: Option<&Vec<GameKey>>) -> Vec<String> {
    vec![
        label.to_string(),
        (b.bucket + 1).to_string(),
        b.count.to_string(),
        f2(b.min),
        f2(b.max),
        f2(b.mean),
        b.wins.to_string(),
        pct(b.win_rate),
        keys.map(|k| join_keys(k)).unwrap_or_default(),
    ]
}

fn opportunity_rows(report: &PatternReport) -> Vec<Vec<String>> {
    let o = &report.opportunity;
    let mut rows = vec![
        strings(&["Metric", "Value"]),
        vec!["Samples".to_string(), o.samples.to_string()],
        vec!["Correlation (opp diff vs win)".to_string(), f3(o.correlation)],
        vec!["Edge winners".to_string(), o.edge_winners.to_string()],
        vec!["Edge winner win rate".to_string(), pct(o.edge_winner_win_rate)],
        vec!["Failure rate".to_string(), pct(o.failure_rate)],
        vec!["Failure games".to_string(), join_keys(&o.failure_games)],
        Vec::new(),
        bucket_header("Opp Diff"),
    ];
    for b in &o.buckets {
        rows.push(bucket_cells("Opp Diff", b, o.bucket_keys.get(b.bucket)));
    }
    rows
}

fn environment_rows(report: &PatternReport) -> Vec<Vec<String>> {
    let mut rows = vec![strings(&[
        "Environment", "Games", "Wins", "Win Rate", "Avg PPP", "Avg PPP Diff", "Avg Conversion",
        "Keys",
    ])];
    for e in &report.environments {
        rows.push(vec![
            e.label.to_string(),
            e.games.to_string(),
            e.wins.to_string(),
            pct(e.win_rate),
            f3(e.avg_ppp),
            f3(e.avg_ppp_diff),
            f1(e.avg_conversion_score),
            join_keys(&e.keys),
        ]);
    }
    rows
}

fn override_rows(report: &PatternReport) -> Vec<Vec<String>> {
    let o = &report.overrides;
    vec![
        strings(&["Metric", "Value"]),
        vec!["Edge losers".to_string(), o.edge_losers.to_string()],
        vec!["Overrides".to_string(), o.count.to_string()],
        vec!["Share of edge losers".to_string(), pct(o.share_of_edge_losers)],
        vec!["Avg PPP advantage".to_string(), f3(o.avg_ppp_advantage)],
        vec!["Avg conversion score".to_string(), f1(o.avg_conversion_score)],
        vec!["Avg eFG% advantage".to_string(), f1(o.avg_efg_advantage)],
        vec!["Driver".to_string(), o.driver.label().to_string()],
        vec!["Games".to_string(), join_keys(&o.games)],
    ]
}

fn opponent_rows(report: &PatternReport) -> Vec<Vec<String>> {
    let o = &report.opponent_context;
    let mut rows = vec![
        strings(&["Metric", "Value"]),
        vec!["Samples".to_string(), o.samples.to_string()],
        vec!["Skipped (no opponent profile)".to_string(), o.skipped.len().to_string()],
        vec!["Opp DRtg vs TO%".to_string(), f3(o.opp_def_rating_vs_to_pct)],
        vec!["Opp DRtg vs OREB%".to_string(), f3(o.opp_def_rating_vs_oreb_pct)],
        vec!["Opp DRtg vs win".to_string(), f3(o.opp_def_rating_vs_win)],
        Vec::new(),
        bucket_header("Pace Gap"),
    ];
    for b in &o.pace_matchup {
        rows.push(bucket_cells("Pace Gap", b, o.pace_matchup_keys.get(b.bucket)));
    }
    rows
}

fn archetype_rows(report: &PatternReport) -> Vec<Vec<String>> {
    let a = &report.archetypes;
    let mut rows = vec![
        vec!["Teams".to_string(), a.teams.to_string()],
        vec!["Distinct archetypes".to_string(), a.distinct.to_string()],
        Vec::new(),
        strings(&["Archetype", "Favor", "Teams", "Share", "Team IDs"]),
    ];
    for r in &a.rows {
        rows.push(vec![
            r.label.clone(),
            r.favor.label().to_string(),
            r.count.to_string(),
            pct(r.share),
            r.team_ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", "),
        ]);
    }
    rows
}

fn stacked_rows(report: &PatternReport) -> Vec<Vec<String>> {
    let s = &report.stacked_props;
    let mut rows = vec![
        vec!["Min tags".to_string(), s.min_tags.to_string()],
        vec!["Games".to_string(), s.count.to_string()],
        vec!["Share".to_string(), pct(s.share)],
        Vec::new(),
        strings(&["Tag", "Tagged team-games"]),
    ];
    for (tag, count) in &s.tag_counts {
        rows.push(vec![tag.label().to_string(), count.to_string()]);
    }
    rows.push(Vec::new());
    rows.push(strings(&["Game ID", "Team ID", "Tags"]));
    for g in &s.games {
        rows.push(vec![
            g.key.game_id.to_string(),
            g.key.team_id.to_string(),
            g.tags.iter().map(|t| t.label()).collect::<Vec<_>>().join(" | "),
        ]);
    }
    rows
}

fn severe_rows(report: &PatternReport) -> Vec<Vec<String>> {
    let s = &report.severe_failures;
    vec![
        strings(&["Metric", "Value"]),
        vec!["Min opportunity diff".to_string(), f1(s.thresholds.min_opportunity_diff)],
        vec!["Min conversion score".to_string(), f1(s.thresholds.min_conversion_score)],
        vec!["Min PPP advantage".to_string(), f3(s.thresholds.min_ppp_advantage)],
        vec!["Games".to_string(), s.count.to_string()],
        vec!["Avg pace".to_string(), f1(s.avg_pace)],
        vec!["League avg pace".to_string(), f1(s.league_avg_pace)],
        vec!["Keys".to_string(), join_keys(&s.games)],
        vec!["Implausible pace".to_string(), join_keys(&s.implausible_pace)],
    ]
}

fn sanity_rows(report: &PatternReport) -> Vec<Vec<String>> {
    let s = &report.sanity;
    vec![
        strings(&["Check", "Value"]),
        vec!["Records".to_string(), s.records.to_string()],
        vec!["Implausible pace".to_string(), join_keys(&s.implausible_pace)],
        vec![
            "Unpaired games".to_string(),
            s.unpaired_games.iter().map(|g| g.to_string()).collect::<Vec<_>>().join(", "),
        ],
    ]
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn join_keys(keys: &[GameKey]) -> String {
    keys.iter()
        .map(|k| format!("{}:{}", k.game_id, k.team_id))
        .collect::<Vec<_>>()
        .join(", ")
}

fn yes_no(value: bool) -> String {
    if value { "Y" } else { "N" }.to_string()
}

fn f1(value: f64) -> String {
    format!("{value:.1}")
}

fn f2(value: f64) -> String {
    format!("{value:.2}")
}

fn f3(value: f64) -> String {
    format!("{value:.3}")
}

fn pct(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
