use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use hoops_edge::{game_logs, logging};
use hoops_edge::report::write_report_json;
use hoops_edge::synthetic::{SyntheticConfig, generate_season};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init_tracing();

    let defaults = SyntheticConfig::default();
    let cfg = SyntheticConfig {
        teams: parse_num_arg("--teams")?.unwrap_or(defaults.teams),
        games_per_team: parse_num_arg("--games")?.unwrap_or(defaults.games_per_team),
        seed: parse_num_arg("--seed")?.unwrap_or(defaults.seed),
        season_start: parse_num_arg("--season-start")?.unwrap_or(defaults.season_start),
    };
    let rows = generate_season(&cfg)?;
    println!(
        "Generated {} team-games ({} teams, {} games each, seed {})",
        rows.len(),
        cfg.teams,
        cfg.games_per_team,
        cfg.seed
    );

    if let Some(path) = arg_value("--json") {
        let path = PathBuf::from(path);
        write_report_json(&path, &rows)?;
        println!("JSON: {}", path.display());
        return Ok(());
    }

    let db_path = arg_value("--db")
        .map(PathBuf::from)
        .or_else(game_logs::default_db_path)
        .context("unable to resolve sqlite path")?;
    let mut conn = game_logs::open_db(&db_path)?;
    let source = format!("synthetic seed {}", cfg.seed);
    let summary = game_logs::ingest(&mut conn, db_path, &source, &rows)?;
    println!("DB: {}", summary.db_path.display());
    println!("Rows upserted: {}", summary.rows_upserted);
    Ok(())
}

fn arg_value(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            return Some(value.trim().to_string());
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn parse_num_arg<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match arg_value(name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow!("invalid {name} value {raw:?}")),
        None => Ok(None),
    }
}
