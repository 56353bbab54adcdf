use anyhow::{Result, anyhow};
use chrono::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::game_logs::SeasonRange;
use crate::records::{BoxScore, TeamGameRecord, Venue};

/// Days between opening night and the last generated game.
const SEASON_DAYS: i64 = 170;
const OPENING_NIGHT_OFFSET: i64 = 21;
/// Free-throw attempts per trip the generator assumes when sizing a box.
const FT_TRIP_SHARE: f64 = 0.44;
/// Largest gap between one side's trips and the game's shared pace.
const TRIP_SPREAD: f64 = 3.0;

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub teams: usize,
    pub games_per_team: usize,
    pub seed: u64,
    pub season_start: i32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            teams: 30,
            games_per_team: 82,
            seed: 7,
            season_start: 2024,
        }
    }
}

/// Per-team tendencies; every game samples around these.
#[derive(Debug, Clone, Copy)]
struct Style {
    pace: f64,
    to_rate: f64,
    ftr: f64,
    oreb: f64,
    efg: f64,
    paint_share: f64,
    assist_rate: f64,
}

impl Style {
    fn sample(rng: &mut StdRng) -> Self {
        Self {
            pace: rng.gen_range(95.0..104.0),
            to_rate: rng.gen_range(0.11..0.16),
            ftr: rng.gen_range(0.19..0.32),
            oreb: rng.gen_range(8.0..13.0),
            efg: rng.gen_range(0.50..0.58),
            paint_share: rng.gen_range(0.50..0.66),
            assist_rate: rng.gen_range(0.54..0.68),
        }
    }
}

/// A season of paired records: every game yields one row per team whose
/// `opponent` box is the other row's `stats`.
pub fn generate_season(cfg: &SyntheticConfig) -> Result<Vec<TeamGameRecord>> {
    if cfg.teams < 2 {
        return Err(anyhow!("synthetic league needs at least 2 teams (got {})", cfg.teams));
    }
    let season = SeasonRange::starting(cfg.season_start)?;
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let styles: Vec<Style> = (0..cfg.teams).map(|_| Style::sample(&mut rng)).collect();

    let games = cfg.teams * cfg.games_per_team / 2;
    let opening = season.start + Duration::days(OPENING_NIGHT_OFFSET);
    let mut out = Vec::with_capacity(games * 2);
    for g in 0..games {
        let home = rng.gen_range(0..cfg.teams);
        let mut away = rng.gen_range(0..cfg.teams - 1);
        if away >= home {
            away += 1;
        }
        let day = (g as i64 * SEASON_DAYS) / games.max(1) as i64;
        let date = opening + Duration::days(day);
        let game_id = cfg.season_start as u64 * 100_000 + g as u64 + 1;

        let base = (styles[home].pace + styles[away].pace) / 2.0 + rng.gen_range(-4.0..4.0);
        let home_trips = trips(&mut rng, base);
        let away_trips = trips(&mut rng, base);
        let pace = (home_trips + away_trips) / 2.0;
        let mut home_box = side(&mut rng, &styles[home], home_trips, 1.5);
        let mut away_box = side(&mut rng, &styles[away], away_trips, 0.0);
        if home_box.pts == away_box.pts {
            let winner = if rng.gen_bool(0.5) { &mut home_box } else { &mut away_box };
            winner.ftm += 1;
            winner.fta = winner.fta.max(winner.ftm);
            winner.pts += 1;
        }
        home_box.dreb = rebounds_left(&away_box);
        away_box.dreb = rebounds_left(&home_box);

        let home_id = home as u32 + 1;
        let away_id = away as u32 + 1;
        let home_won = home_box.pts > away_box.pts;
        for (team_id, opponent_id, venue, won, stats, opponent, own, other) in [
            (home_id, away_id, Venue::Home, home_won, home_box, away_box, home_trips, away_trips),
            (away_id, home_id, Venue::Away, !home_won, away_box, home_box, away_trips, home_trips),
        ] {
            out.push(TeamGameRecord {
                game_id,
                season: season.label.clone(),
                date,
                team_id,
                team: format!("Synth {team_id:02}"),
                opponent_id,
                venue,
                won,
                stats,
                opponent,
                possessions: own,
                opp_possessions: other,
                pace,
                off_rating: 100.0 * stats.pts as f64 / own,
                def_rating: 100.0 * opponent.pts as f64 / other,
            });
        }
    }
    debug!(teams = cfg.teams, games, seed = cfg.seed, "generated synthetic season");
    Ok(out)
}

/// One side's possession count around the game's shared pace. Offensive
/// boards and free-throw trips let the two sides differ by a few.
fn trips(rng: &mut StdRng, base: f64) -> f64 {
    (base + rng.gen_range(-TRIP_SPREAD..TRIP_SPREAD)).clamp(88.0, 112.0).round()
}

fn side(rng: &mut StdRng, s: &Style, possessions: f64, home_edge: f64) -> BoxScore {
    let tov = (possessions * (s.to_rate + rng.gen_range(-0.03..0.03)).max(0.05)).round();
    let oreb = (s.oreb + rng.gen_range(-4.0..4.0)).max(2.0).round();
    let ftr = (s.ftr + rng.gen_range(-0.08..0.08)).max(0.05);
    let fga = ((possessions - tov + oreb) / (1.0 + FT_TRIP_SHARE * ftr)).round().max(1.0);
    let fta = (fga * ftr).round();
    let fg3m = (fga * 0.38 * rng.gen_range(0.28..0.44)).round();
    let efg = s.efg + home_edge / 100.0 + rng.gen_range(-0.07..0.07);
    let fgm = (efg * fga - 0.5 * fg3m).round().clamp(fg3m, fga);
    let ftm = (fta * rng.gen_range(0.68..0.86)).round();
    let twos = fgm - fg3m;
    let paint = (2.0 * twos * (s.paint_share + rng.gen_range(-0.08..0.08)).clamp(0.3, 0.9)).round();
    let ast = (fgm * (s.assist_rate + rng.gen_range(-0.08..0.08))).round();

    BoxScore {
        fgm: fgm as u32,
        fga: fga as u32,
        fg3m: fg3m as u32,
        ftm: ftm as u32,
        fta: fta as u32,
        oreb: oreb as u32,
        dreb: 0,
        tov: tov as u32,
        ast: ast.max(0.0) as u32,
        pts: (2.0 * fgm + fg3m + ftm) as u32,
        paint_pts: paint as u32,
    }
}

/// Defensive boards available against `shooter`: missed shots it did not
/// recover itself.
fn rebounds_left(shooter: &BoxScore) -> u32 {
    shooter.fga.saturating_sub(shooter.fgm).saturating_sub(shooter.oreb)
}
