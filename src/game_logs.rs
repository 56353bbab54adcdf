use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, NaiveDate, Utc};
use rusqlite::{Connection, params};
use tracing::{debug, info};

use crate::records::{BoxScore, TeamGameRecord, Venue, validate_pairs};

pub const DB_PATH_ENV: &str = "HOOPS_DB_PATH";
const CACHE_DIR: &str = "hoops_edge";
const DB_FILE: &str = "game_logs.sqlite";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Regular season plus playoffs: Oct 1 of the start year through Jun 30 of
/// the following year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonRange {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SeasonRange {
    /// Accepts `2024-25`, `2024-2025` or a bare start year `2024`.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let (start_raw, end_raw) = match raw.split_once('-') {
            Some((a, b)) => (a, Some(b)),
            None => (raw, None),
        };
        let start_year: i32 = start_raw
            .parse()
            .with_context(|| format!("season start year in {raw:?}"))?;
        if let Some(end_raw) = end_raw {
            let end: i32 = end_raw
                .parse()
                .with_context(|| format!("season end year in {raw:?}"))?;
            let expected = match end_raw.len() {
                2 => (start_year + 1) % 100,
                4 => start_year + 1,
                _ => return Err(anyhow!("season end year must be 2 or 4 digits: {raw:?}")),
            };
            if end != expected {
                return Err(anyhow!("season {raw:?} does not span consecutive years"));
            }
        }
        Self::starting(start_year)
    }

    pub fn starting(start_year: i32) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(start_year, 10, 1)
            .ok_or_else(|| anyhow!("season start year out of range: {start_year}"))?;
        let end = NaiveDate::from_ymd_opt(start_year + 1, 6, 30)
            .ok_or_else(|| anyhow!("season end year out of range: {}", start_year + 1))?;
        Ok(Self {
            label: format!("{start_year}-{:02}", (start_year + 1) % 100),
            start,
            end,
        })
    }

    /// Season that a game date belongs to. Summer dates roll forward to the
    /// season that starts that autumn.
    pub fn containing(date: NaiveDate) -> Result<Self> {
        let start_year = if date.month() >= 7 { date.year() } else { date.year() - 1 };
        Self::starting(start_year)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl fmt::Display for SeasonRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} to {})", self.label, self.start, self.end)
    }
}

#[derive(Debug, Clone)]
pub struct IngestSummary {
    pub db_path: PathBuf,
    pub rows_upserted: usize,
    pub unpaired_games: Vec<u64>,
}

fn cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

/// `$HOOPS_DB_PATH` when set, otherwise the store under the user cache dir.
pub fn default_db_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(DB_PATH_ENV)
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }
    cache_dir().map(|dir| dir.join(DB_FILE))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS team_games (
            game_id INTEGER NOT NULL,
            team_id INTEGER NOT NULL,
            season TEXT NOT NULL,
            game_date TEXT NOT NULL,
            team TEXT NOT NULL,
            opponent_id INTEGER NOT NULL,
            venue TEXT NOT NULL,
            won INTEGER NOT NULL,
            stats_json TEXT NOT NULL,
            opponent_json TEXT NOT NULL,
            possessions REAL NOT NULL,
            opp_possessions REAL NOT NULL DEFAULT 0,
            pace REAL NOT NULL,
            off_rating REAL NOT NULL,
            def_rating REAL NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (game_id, team_id)
        );
        CREATE INDEX IF NOT EXISTS idx_team_games_date ON team_games(game_date);
        CREATE INDEX IF NOT EXISTS idx_team_games_team ON team_games(team_id);

        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            source TEXT NOT NULL,
            rows_upserted INTEGER NOT NULL,
            unpaired_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Insert or replace rows in one transaction; returns the number written.
pub fn upsert_team_games(conn: &mut Connection, rows: &[TeamGameRecord]) -> Result<usize> {
    let tx = conn.transaction().context("begin upsert transaction")?;
    for row in rows {
        upsert_row(&tx, row)?;
    }
    tx.commit().context("commit upsert transaction")?;
    debug!(rows = rows.len(), "upserted team games");
    Ok(rows.len())
}

/// Upsert a batch and log the run. Unpaired games are kept, only reported.
pub fn ingest(
    conn: &mut Connection,
    db_path: PathBuf,
    source: &str,
    rows: &[TeamGameRecord],
) -> Result<IngestSummary> {
    let unpaired_games = validate_pairs(rows);
    let rows_upserted = upsert_team_games(conn, rows)?;
    let unpaired_json = serde_json::to_string(&unpaired_games).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "INSERT INTO ingest_runs(started_at, source, rows_upserted, unpaired_json)
         VALUES (?1, ?2, ?3, ?4)",
        params![Utc::now().to_rfc3339(), source, rows_upserted as i64, unpaired_json],
    )
    .context("insert ingest run")?;
    info!(source, rows_upserted, unpaired = unpaired_games.len(), "ingest finished");
    Ok(IngestSummary {
        db_path,
        rows_upserted,
        unpaired_games,
    })
}

fn upsert_row(tx: &rusqlite::Transaction<'_>, r: &TeamGameRecord) -> Result<()> {
    let stats_json = serde_json::to_string(&r.stats).context("encode team box score")?;
    let opponent_json = serde_json::to_string(&r.opponent).context("encode opponent box score")?;
    tx.execute(
        r#"
        INSERT INTO team_games (
            game_id, team_id, season, game_date, team, opponent_id, venue, won,
            stats_json, opponent_json, possessions, opp_possessions, pace, off_rating,
            def_rating, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8,
            ?9, ?10, ?11, ?12, ?13, ?14,
            ?15, ?16
        )
        ON CONFLICT(game_id, team_id) DO UPDATE SET
            season = excluded.season,
            game_date = excluded.game_date,
            team = excluded.team,
            opponent_id = excluded.opponent_id,
            venue = excluded.venue,
            won = excluded.won,
            stats_json = excluded.stats_json,
            opponent_json = excluded.opponent_json,
            possessions = excluded.possessions,
            opp_possessions = excluded.opp_possessions,
            pace = excluded.pace,
            off_rating = excluded.off_rating,
            def_rating = excluded.def_rating,
            updated_at = excluded.updated_at
        "#,
        params![
            r.game_id as i64,
            r.team_id as i64,
            r.season,
            r.date.format(DATE_FORMAT).to_string(),
            r.team,
            r.opponent_id as i64,
            r.venue.as_str(),
            bool_to_i64(r.won),
            stats_json,
            opponent_json,
            r.possessions,
            r.opp_possessions,
            r.pace,
            r.off_rating,
            r.def_rating,
            Utc::now().to_rfc3339(),
        ],
    )
    .with_context(|| format!("upsert game {} team {}", r.game_id, r.team_id))?;
    Ok(())
}

struct RawRow {
    game_id: u64,
    team_id: u32,
    season: String,
    date: String,
    team: String,
    opponent_id: u32,
    venue: String,
    won: bool,
    stats_json: String,
    opponent_json: String,
    possessions: f64,
    opp_possessions: f64,
    pace: f64,
    off_rating: f64,
    def_rating: f64,
}

impl RawRow {
    fn into_record(self) -> Result<TeamGameRecord> {
        let date = NaiveDate::parse_from_str(&self.date, DATE_FORMAT)
            .with_context(|| format!("game {} date {:?}", self.game_id, self.date))?;
        let venue = Venue::parse(&self.venue)
            .ok_or_else(|| anyhow!("game {} venue {:?}", self.game_id, self.venue))?;
        let stats: BoxScore = serde_json::from_str(&self.stats_json)
            .with_context(|| format!("game {} team box score", self.game_id))?;
        let opponent: BoxScore = serde_json::from_str(&self.opponent_json)
            .with_context(|| format!("game {} opponent box score", self.game_id))?;
        Ok(TeamGameRecord {
            game_id: self.game_id,
            season: self.season,
            date,
            team_id: self.team_id,
            team: self.team,
            opponent_id: self.opponent_id,
            venue,
            won: self.won,
            stats,
            opponent,
            possessions: self.possessions,
            opp_possessions: self.opp_possessions,
            pace: self.pace,
            off_rating: self.off_rating,
            def_rating: self.def_rating,
        })
    }
}

/// Rows dated inside `range` (every row when `None`), oldest first. An empty
/// store yields an empty vector; callers decide how to present that.
pub fn load_team_games(conn: &Connection, range: Option<&SeasonRange>) -> Result<Vec<TeamGameRecord>> {
    let (from, to) = match range {
        Some(r) => (
            r.start.format(DATE_FORMAT).to_string(),
            r.end.format(DATE_FORMAT).to_string(),
        ),
        None => ("0000-01-01".to_string(), "9999-12-31".to_string()),
    };
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                game_id, team_id, season, game_date, team, opponent_id, venue, won,
                stats_json, opponent_json, possessions, opp_possessions, pace, off_rating,
                def_rating
            FROM team_games
            WHERE game_date >= ?1 AND game_date <= ?2
            ORDER BY game_date ASC, game_id ASC, team_id ASC
            "#,
        )
        .context("prepare load team games query")?;

    let rows = stmt
        .query_map(params![from, to], |row| {
            Ok(RawRow {
                game_id: row.get::<_, u64>(0)?,
                team_id: row.get::<_, u32>(1)?,
                season: row.get(2)?,
                date: row.get(3)?,
                team: row.get(4)?,
                opponent_id: row.get::<_, u32>(5)?,
                venue: row.get(6)?,
                won: row.get::<_, i64>(7)? != 0,
                stats_json: row.get(8)?,
                opponent_json: row.get(9)?,
                possessions: row.get(10)?,
                opp_possessions: row.get(11)?,
                pace: row.get(12)?,
                off_rating: row.get(13)?,
                def_rating: row.get(14)?,
            })
        })
        .context("query load team games")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode team game row")?.into_record()?);
    }
    debug!(rows = out.len(), "loaded team games");
    Ok(out)
}

pub fn list_seasons(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT DISTINCT season FROM team_games ORDER BY season ASC")
        .context("prepare list seasons query")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("query list seasons")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode season row")?);
    }
    Ok(out)
}

/// A JSON array of team-game records, as written by `synth_season --json`.
pub fn load_records_json(path: &Path) -> Result<Vec<TeamGameRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read records {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse records {}", path.display()))
}

fn bool_to_i64(value: bool) -> i64 {
    if value { 1 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn season_spans_calendar_boundary() {
        let s = SeasonRange::parse("2024-25").expect("parse season");
        assert_eq!(s.label, "2024-25");
        assert_eq!(s.start, NaiveDate::from_ymd_opt(2024, 10, 1).expect("date"));
        assert_eq!(s.end, NaiveDate::from_ymd_opt(2025, 6, 30).expect("date"));
        assert_eq!(SeasonRange::parse("2024-2025").expect("long form"), s);
        assert_eq!(SeasonRange::parse("2024").expect("bare year"), s);
        assert_eq!(SeasonRange::parse("1999-00").expect("century").label, "1999-00");
    }

    #[test]
    fn rejects_non_consecutive_seasons() {
        assert!(SeasonRange::parse("2024-26").is_err());
        assert!(SeasonRange::parse("twenty").is_err());
        assert!(SeasonRange::parse("2024-5").is_err());
    }

    #[test]
    fn containing_rolls_summer_forward() {
        let jan = NaiveDate::from_ymd_opt(2025, 1, 15).expect("date");
        assert_eq!(SeasonRange::containing(jan).expect("season").label, "2024-25");
        let aug = NaiveDate::from_ymd_opt(2025, 8, 1).expect("date");
        let next = SeasonRange::containing(aug).expect("season");
        assert_eq!(next.label, "2025-26");
        assert!(!next.contains(aug));
    }
}
