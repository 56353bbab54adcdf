use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};

use hoops_edge::config::ModelConfig;
use hoops_edge::decision::DecisionCase;
use hoops_edge::game_logs::{self, SeasonRange};
use hoops_edge::logging;
use hoops_edge::matchup::project_matchup;
use hoops_edge::patterns::{Dataset, PatternReport, run_all};
use hoops_edge::records::TeamGameRecord;
use hoops_edge::report::{export_workbook, game_rows, write_report_json};
use hoops_edge::synthetic::{SyntheticConfig, generate_season};

const USAGE: &str = "\
usage:
  hoops_edge analyze [--db PATH] [--season 2024-25] [--records FILE.json] [--synthetic TEAMS]
                     [--xlsx PATH] [--json PATH]
  hoops_edge decide CASE.json
  hoops_edge matchup --home ID --away ID [--line X] [--db PATH | --records FILE.json | --synthetic TEAMS]

env:
  HOOPS_CONFIG   model config JSON (defaults when unset)
  HOOPS_DB_PATH  game-log store (defaults to the user cache dir)
  RUST_LOG       log filter (default hoops_edge=info)";

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init_tracing();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let Some(command) = args.first() else {
        println!("{USAGE}");
        return Ok(());
    };
    let rest = &args[1..];
    match command.as_str() {
        "analyze" => analyze(rest, &ModelConfig::load_or_default()?),
        "decide" => decide(rest, &ModelConfig::load_or_default()?),
        "matchup" => matchup(rest, &ModelConfig::load_or_default()?),
        "help" | "-h" | "--help" => {
            println!("{USAGE}");
            Ok(())
        }
        other => Err(anyhow!("unknown command {other:?}\n{USAGE}")),
    }
}

fn analyze(args: &[String], cfg: &ModelConfig) -> Result<()> {
    let (records, source) = load_records(args)?;
    if records.is_empty() {
        println!("No team games found in {source}.");
        println!("Ingest some with `ingest_games` or `synth_season`, or pass --synthetic 30.");
        return Ok(());
    }

    let ds = Dataset::build(records, cfg);
    let report = run_all(&ds, cfg);
    print_report(&source, &ds, &report);

    if let Some(path) = arg_value(args, "--xlsx") {
        let path = PathBuf::from(path);
        let summary = export_workbook(&path, &game_rows(&ds), &report)?;
        println!("Workbook: {} ({} sheets)", path.display(), summary.sheets);
    }
    if let Some(path) = arg_value(args, "--json") {
        let path = PathBuf::from(path);
        write_report_json(&path, &report)?;
        println!("Report JSON: {}", path.display());
    }
    Ok(())
}

fn decide(args: &[String], cfg: &ModelConfig) -> Result<()> {
    let path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map(PathBuf::from)
        .context("decide needs a CASE.json path")?;
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("read decision case {}", path.display()))?;
    let case: DecisionCase = serde_json::from_str(&raw)
        .with_context(|| format!("parse decision case {}", path.display()))?;
    let decision = case.decide(cfg);
    let json = serde_json::to_string_pretty(&decision).context("serialize decision")?;
    println!("{json}");
    Ok(())
}

fn matchup(args: &[String], cfg: &ModelConfig) -> Result<()> {
    let home: u32 = parse_arg(args, "--home")?.context("matchup needs --home ID")?;
    let away: u32 = parse_arg(args, "--away")?.context("matchup needs --away ID")?;
    let line: Option<f64> = parse_arg(args, "--line")?;

    let (records, source) = load_records(args)?;
    if records.is_empty() {
        println!("No team games found in {source}; nothing to project.");
        return Ok(());
    }
    let ds = Dataset::build(records, cfg);
    let home_profile = ds
        .profile(home)
        .with_context(|| format!("team {home} has no games in {source}"))?;
    let away_profile = ds
        .profile(away)
        .with_context(|| format!("team {away} has no games in {source}"))?;

    let p = project_matchup(home_profile, away_profile, line, cfg);
    println!("{} vs {} ({source})", p.home_team, p.away_team);
    println!("Pace: {:.1}", p.pace);
    println!(
        "Projected: {:.1} - {:.1} (total {:.1})",
        p.home_points, p.away_points, p.total
    );
    if let (Some(line), Some(edge)) = (p.line, p.edge) {
        println!("Line: {line:.1}  edge {edge:+.1}");
    }
    println!(
        "Volatility: {:.1} ({})  Margin: {}",
        p.volatility.index,
        p.volatility.label,
        p.margin.label()
    );
    if let Some(a) = &p.archetype {
        println!("Archetypes: {} [{}]", a.label, a.favor.label());
    }
    println!(
        "Call: {} {} ({:?})  {}",
        p.decision.call, p.decision.confidence, p.decision.confidence_label, p.decision.reason
    );
    for r in &p.decision.reasoning {
        println!("  {} {}", r.icon, r.text);
    }
    Ok(())
}

/// Records from `--synthetic`, `--records` or the store, plus a label for
/// messages.
fn load_records(args: &[String]) -> Result<(Vec<TeamGameRecord>, String)> {
    if let Some(teams) = parse_arg::<usize>(args, "--synthetic")? {
        let cfg = SyntheticConfig {
            teams,
            ..SyntheticConfig::default()
        };
        let records = generate_season(&cfg)?;
        return Ok((records, format!("synthetic league ({teams} teams, seed {})", cfg.seed)));
    }
    if let Some(path) = arg_value(args, "--records") {
        let path = PathBuf::from(path);
        let records = game_logs::load_records_json(&path)?;
        return Ok((records, path.display().to_string()));
    }

    let db_path = arg_value(args, "--db")
        .map(PathBuf::from)
        .or_else(game_logs::default_db_path)
        .context("unable to resolve sqlite path")?;
    let range = arg_value(args, "--season")
        .map(|s| SeasonRange::parse(&s))
        .transpose()?;
    let conn = game_logs::open_db(&db_path)?;
    let records = game_logs::load_team_games(&conn, range.as_ref())?;
    let source = match &range {
        Some(r) => format!("{} season {r}", db_path.display()),
        None => db_path.display().to_string(),
    };
    info!(rows = records.len(), source = %source, "loaded team games");
    Ok((records, source))
}

fn print_report(source: &str, ds: &Dataset, report: &PatternReport) {
    println!("Source: {source}");
    println!(
        "Team-games: {}  Teams: {}",
        ds.rows().len(),
        ds.profiles().len()
    );
    if !report.sanity.is_clean() {
        warn!(
            implausible_pace = report.sanity.implausible_pace.len(),
            unpaired = report.sanity.unpaired_games.len(),
            "dataset failed sanity checks; results still reported"
        );
    }

    let o = &report.opportunity;
    println!();
    println!("Opportunity vs outcome");
    println!("  correlation {:+.3}", o.correlation);
    for b in &o.buckets {
        println!(
            "  Q{} [{:+.1} .. {:+.1}] n={} win {:.1}%",
            b.bucket + 1,
            b.min,
            b.max,
            b.count,
            b.win_rate * 100.0
        );
    }
    println!(
        "  edge winners {} (win {:.1}%), failures {:.1}%",
        o.edge_winners,
        o.edge_winner_win_rate * 100.0,
        o.failure_rate * 100.0
    );

    println!();
    println!("Scoring environments");
    for e in &report.environments {
        println!(
            "  {:<14} n={:<5} win {:>5.1}%  ppp {:.3}",
            e.label,
            e.games,
            e.win_rate * 100.0,
            e.avg_ppp
        );
    }

    let ov = &report.overrides;
    println!();
    println!(
        "Efficiency overrides: {} of {} edge losers ({:.1}%), ppp adv {:+.3}, conversion {:.1} -> {}",
        ov.count,
        ov.edge_losers,
        ov.share_of_edge_losers * 100.0,
        ov.avg_ppp_advantage,
        ov.avg_conversion_score,
        ov.driver.label()
    );

    let oc = &report.opponent_context;
    println!(
        "Opponent context: DRtg~TO% {:+.3}  DRtg~OREB% {:+.3}  DRtg~win {:+.3}",
        oc.opp_def_rating_vs_to_pct, oc.opp_def_rating_vs_oreb_pct, oc.opp_def_rating_vs_win
    );
    for b in &oc.pace_matchup {
        println!(
            "  pace gap T{} [{:+.1} .. {:+.1}] win {:.1}%",
            b.bucket + 1,
            b.min,
            b.max,
            b.win_rate * 100.0
        );
    }

    let a = &report.archetypes;
    println!();
    println!("Archetypes: {} teams, {} distinct", a.teams, a.distinct);
    for row in a.rows.iter().take(5) {
        println!("  {:<28} {:>3}  {}", row.label, row.count, row.favor.label());
    }

    let s = &report.stacked_props;
    println!(
        "Stacked props (>= {} tags): {} ({:.1}%)",
        s.min_tags,
        s.count,
        s.share * 100.0
    );
    let sf = &report.severe_failures;
    println!(
        "Severe failures: {} (avg pace {:.1} vs league {:.1})",
        sf.count, sf.avg_pace, sf.league_avg_pace
    );
}

fn arg_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn parse_arg<T: FromStr>(args: &[String], name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match arg_value(args, name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|err| anyhow!("invalid {name} {raw:?}: {err}")),
        None => Ok(None),
    }
}
