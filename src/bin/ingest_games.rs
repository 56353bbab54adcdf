use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use hoops_edge::{game_logs, logging};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init_tracing();

    let input = parse_path_arg("--input")
        .ok_or_else(|| anyhow!("usage: ingest_games --input rows.json [--db PATH]"))?;
    let db_path = parse_path_arg("--db")
        .or_else(game_logs::default_db_path)
        .context("unable to resolve sqlite path")?;

    let rows = game_logs::load_records_json(&input)?;
    if rows.is_empty() {
        println!("{} holds no team games; nothing ingested", input.display());
        return Ok(());
    }

    let mut conn = game_logs::open_db(&db_path)?;
    let source = input.display().to_string();
    let summary = game_logs::ingest(&mut conn, db_path, &source, &rows)?;

    println!("Ingest complete");
    println!("DB: {}", summary.db_path.display());
    println!("Rows upserted: {}", summary.rows_upserted);
    if !summary.unpaired_games.is_empty() {
        println!("Unpaired games: {}", summary.unpaired_games.len());
        for game_id in summary.unpaired_games.iter().take(6) {
            println!("   - {game_id}");
        }
    }
    let seasons = game_logs::list_seasons(&conn)?;
    println!("Seasons in store: {}", seasons.join(", "));
    Ok(())
}

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix(&prefix) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
