// Player ranking table loading and the PlayerPool.
//
// The table is a CSV with columns
//   player_id,name,position,team,rank_value,bye,status
// where `bye` and `status` are optional. Lower rank_value is better.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::draft::pick::Position;

const REQUIRED_COLUMNS: [&str; 5] = ["player_id", "name", "position", "team", "rank_value"];

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A ranked player. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// External id, shared with the draft feed.
    pub id: String,
    pub name: String,
    pub position: Position,
    pub team: String,
    pub bye: Option<u32>,
    /// Lower is better.
    pub rank: f64,
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// The ranking table could not be loaded. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum DataUnavailable {
    #[error("failed to read rankings file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("rankings table is missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("malformed rankings row at line {line}: {message}")]
    Malformed { line: u64, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("rankings table contains no usable rows")]
    Empty,
}

// ---------------------------------------------------------------------------
// Raw CSV serde struct (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawRanking {
    player_id: String,
    name: String,
    position: String,
    team: String,
    rank_value: String,
    #[serde(default)]
    bye: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

fn blank_to_none(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn player_from_raw(raw: RawRanking, line: u64) -> Result<Player, DataUnavailable> {
    let rank: f64 = raw
        .rank_value
        .trim()
        .parse()
        .map_err(|_| DataUnavailable::Malformed {
            line,
            message: format!("rank_value '{}' is not a number", raw.rank_value),
        })?;
    if !rank.is_finite() {
        return Err(DataUnavailable::Malformed {
            line,
            message: format!("rank_value '{}' is not finite", raw.rank_value),
        });
    }

    let bye = match blank_to_none(raw.bye) {
        Some(b) => Some(b.parse::<u32>().map_err(|_| DataUnavailable::Malformed {
            line,
            message: format!("bye '{b}' is not a week number"),
        })?),
        None => None,
    };

    Ok(Player {
        id: raw.player_id.trim().to_string(),
        name: raw.name.trim().to_string(),
        position: Position::parse_lenient(&raw.position),
        team: raw.team.trim().to_string(),
        bye,
        rank,
        status: blank_to_none(raw.status),
    })
}

// ---------------------------------------------------------------------------
// PlayerPool
// ---------------------------------------------------------------------------

/// The static ranking table, sorted by rank (ties keep file order).
#[derive(Debug, Clone)]
pub struct PlayerPool {
    players: Vec<Player>,
    index: HashMap<String, usize>,
    max_rank: f64,
}

impl PlayerPool {
    /// Load the ranking table from a CSV file.
    pub fn load(path: &Path) -> Result<Self, DataUnavailable> {
        let file = std::fs::File::open(path).map_err(|e| DataUnavailable::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let pool = Self::from_reader(file)?;
        info!("Loaded {} ranked players from {}", pool.len(), path.display());
        Ok(pool)
    }

    /// Load the ranking table from any CSV reader.
    ///
    /// Fails fast on the first malformed row. Rows with an empty player id
    /// are skipped with a warning; a repeated id keeps its first row.
    pub fn from_reader<R: Read>(rdr: R) -> Result<Self, DataUnavailable> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(rdr);

        let headers: HashSet<String> = reader.headers()?.iter().map(str::to_string).collect();
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !headers.contains(**c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DataUnavailable::MissingColumns(missing));
        }

        let mut players = Vec::new();
        for (i, result) in reader.deserialize::<RawRanking>().enumerate() {
            // The header is line 1, so data rows start at line 2.
            let line = i as u64 + 2;
            let raw = result.map_err(|e| DataUnavailable::Malformed {
                line,
                message: e.to_string(),
            })?;
            if raw.player_id.trim().is_empty() {
                warn!("skipping ranked player '{}': empty player_id", raw.name.trim());
                continue;
            }
            players.push(player_from_raw(raw, line)?);
        }

        Self::from_players(players)
    }

    /// Build a pool from already-validated players.
    pub fn from_players(players: Vec<Player>) -> Result<Self, DataUnavailable> {
        let mut seen = HashSet::new();
        let mut players: Vec<Player> = players
            .into_iter()
            .filter(|p| {
                let fresh = seen.insert(p.id.clone());
                if !fresh {
                    warn!("duplicate ranking for player {}, keeping the first", p.id);
                }
                fresh
            })
            .collect();
        if players.is_empty() {
            return Err(DataUnavailable::Empty);
        }

        // Stable: equal ranks keep file order.
        players.sort_by(|a, b| a.rank.total_cmp(&b.rank));

        let max_rank = players
            .iter()
            .map(|p| p.rank)
            .fold(f64::NEG_INFINITY, f64::max);
        let index = players
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();

        Ok(PlayerPool {
            players,
            index,
            max_rank,
        })
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// The worst rank in the table.
    pub fn max_rank(&self) -> f64 {
        self.max_rank
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.index.get(id).map(|&i| &self.players[i])
    }

    /// All players, best rank first.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// `max_rank - rank + 1`, never negative.
    pub fn base_score(&self, player: &Player) -> f64 {
        (self.max_rank - player.rank + 1.0).max(0.0)
    }

    /// Undrafted players, best rank first.
    pub fn available_players(&self, drafted: &BTreeSet<String>) -> Vec<Player> {
        self.players
            .iter()
            .filter(|p| !drafted.contains(&p.id))
            .cloned()
            .collect()
    }

    /// Distinct positions present in the table.
    pub fn positions(&self) -> BTreeSet<Position> {
        self.players.iter().map(|p| p.position).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
