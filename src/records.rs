use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    Home,
    Away,
}

impl Venue {
    pub fn as_str(self) -> &'static str {
        match self {
            Venue::Home => "home",
            Venue::Away => "away",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "home" | "h" => Some(Venue::Home),
            "away" | "a" | "road" => Some(Venue::Away),
            _ => None,
        }
    }
}

/// Raw counting stats for one side of one game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxScore {
    pub fgm: u32,
    pub fga: u32,
    pub fg3m: u32,
    pub ftm: u32,
    pub fta: u32,
    pub oreb: u32,
    pub dreb: u32,
    pub tov: u32,
    pub ast: u32,
    pub pts: u32,
    pub paint_pts: u32,
}

/// One team's line for one game, as handed over by the game-log store.
/// `opponent` mirrors the same game from the other bench.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamGameRecord {
    pub game_id: u64,
    pub season: String,
    pub date: NaiveDate,
    pub team_id: u32,
    pub team: String,
    pub opponent_id: u32,
    pub venue: Venue,
    pub won: bool,
    pub stats: BoxScore,
    pub opponent: BoxScore,
    pub possessions: f64,
    /// Opponent's own possession count. Zero when the feed does not carry
    /// it; the metrics layer then estimates it from the opponent box.
    #[serde(default)]
    pub opp_possessions: f64,
    pub pace: f64,
    pub off_rating: f64,
    pub def_rating: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameKey {
    pub game_id: u64,
    pub team_id: u32,
}

impl TeamGameRecord {
    pub fn key(&self) -> GameKey {
        GameKey {
            game_id: self.game_id,
            team_id: self.team_id,
        }
    }

    pub fn opponent_key(&self) -> GameKey {
        GameKey {
            game_id: self.game_id,
            team_id: self.opponent_id,
        }
    }

    pub fn total_points(&self) -> u32 {
        self.stats.pts + self.opponent.pts
    }

    pub fn margin(&self) -> i64 {
        self.stats.pts as i64 - self.opponent.pts as i64
    }

    pub fn net_rating(&self) -> f64 {
        self.off_rating - self.def_rating
    }
}

/// Game ids whose records do not form exactly one home/away pair that
/// reference each other. Sorted ascending.
pub fn validate_pairs(records: &[TeamGameRecord]) -> Vec<u64> {
    let mut by_game: HashMap<u64, Vec<&TeamGameRecord>> = HashMap::new();
    for r in records {
        by_game.entry(r.game_id).or_default().push(r);
    }

    let mut bad: Vec<u64> = by_game
        .into_iter()
        .filter(|(_, rows)| !is_valid_pair(rows))
        .map(|(game_id, _)| game_id)
        .collect();
    bad.sort_unstable();
    bad
}

fn is_valid_pair(rows: &[&TeamGameRecord]) -> bool {
    let [a, b] = rows else {
        return false;
    };
    a.team_id != b.team_id
        && a.opponent_id == b.team_id
        && b.opponent_id == a.team_id
        && a.venue != b.venue
        && a.won != b.won
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn record(game_id: u64, team_id: u32, opponent_id: u32, venue: Venue, won: bool) -> TeamGameRecord {
        TeamGameRecord {
            game_id,
            season: "2024-25".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 11, 2).expect("valid date"),
            team_id,
            team: format!("T{team_id}"),
            opponent_id,
            venue,
            won,
            stats: BoxScore {
                fgm: 40,
                fga: 88,
                fg3m: 12,
                ftm: 18,
                fta: 23,
                oreb: 10,
                dreb: 33,
                tov: 13,
                ast: 25,
                pts: 110,
                paint_pts: 48,
            },
            opponent: BoxScore {
                fgm: 39,
                fga: 87,
                fg3m: 11,
                ftm: 17,
                fta: 22,
                oreb: 9,
                dreb: 34,
                tov: 14,
                ast: 24,
                pts: 106,
                paint_pts: 44,
            },
            possessions: 99.0,
            opp_possessions: 99.0,
            pace: 99.0,
            off_rating: 111.1,
            def_rating: 107.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::record;
    use super::*;

    #[test]
    fn paired_game_is_valid() {
        let rows = vec![
            record(1, 10, 20, Venue::Home, true),
            record(1, 20, 10, Venue::Away, false),
        ];
        assert!(validate_pairs(&rows).is_empty());
    }

    #[test]
    fn orphan_and_mismatched_games_are_reported() {
        let rows = vec![
            record(1, 10, 20, Venue::Home, true),
            record(2, 10, 30, Venue::Home, true),
            record(2, 30, 99, Venue::Away, false),
        ];
        assert_eq!(validate_pairs(&rows), vec![1, 2]);
    }

    #[test]
    fn venue_parse_accepts_short_forms() {
        assert_eq!(Venue::parse("H"), Some(Venue::Home));
        assert_eq!(Venue::parse(" road "), Some(Venue::Away));
        assert_eq!(Venue::parse("neutral"), None);
    }
}
