// Individual pick representation and player positions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Football positions as they appear in ranking tables and the draft feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Position {
    Quarterback,
    RunningBack,
    WideReceiver,
    TightEnd,
    Kicker,
    Defense,
    /// Individual defensive players (DL, LB, DB).
    DefensivePlayer,
    /// Anything the feed or the table reports that we don't model.
    Other,
}

impl Position {
    /// Parse a position string into a Position enum.
    ///
    /// Handles Sleeper-style abbreviations:
    /// - "DEF"/"DST"/"D/ST" -> Defense, "PK" -> Kicker
    /// - "DL"/"LB"/"DB"/"DE"/"DT"/"CB"/"S"/"IDP" -> DefensivePlayer
    ///
    /// Unknown strings return `None`; callers decide whether that maps to
    /// `Other` or is an error.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "QB" => Some(Position::Quarterback),
            "RB" => Some(Position::RunningBack),
            "WR" => Some(Position::WideReceiver),
            "TE" => Some(Position::TightEnd),
            "K" | "PK" => Some(Position::Kicker),
            "DEF" | "DST" | "D/ST" => Some(Position::Defense),
            "DL" | "LB" | "DB" | "DE" | "DT" | "CB" | "S" | "IDP" => {
                Some(Position::DefensivePlayer)
            }
            _ => None,
        }
    }

    /// Lenient parse used for feed data: unknown strings become `Other`.
    pub fn parse_lenient(s: &str) -> Self {
        Self::from_str_pos(s).unwrap_or(Position::Other)
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Quarterback => "QB",
            Position::RunningBack => "RB",
            Position::WideReceiver => "WR",
            Position::TightEnd => "TE",
            Position::Kicker => "K",
            Position::Defense => "DEF",
            Position::DefensivePlayer => "IDP",
            Position::Other => "?",
        }
    }

    /// Whether this position may fill a FLEX slot (RB/WR/TE).
    pub fn is_flex_eligible(&self) -> bool {
        matches!(
            self,
            Position::RunningBack | Position::WideReceiver | Position::TightEnd
        )
    }

    /// Whether this position may fill a SUPER_FLEX slot (QB/RB/WR/TE).
    pub fn is_superflex_eligible(&self) -> bool {
        self.is_flex_eligible() || *self == Position::Quarterback
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.display_str())
    }
}

/// A single completed draft selection.
///
/// Picks are immutable once recorded. The feed is authoritative for
/// `pick_number`, `picked_by` and `player_id`; the remaining fields are
/// descriptive extras some feeds attach to each pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftPick {
    /// Sequential pick number across the whole draft (1-indexed).
    pub pick_number: u32,
    /// Identifier of the participant who made the selection.
    pub picked_by: String,
    /// External identifier of the selected player.
    pub player_id: String,
    /// Round the pick was made in, if the feed reports it.
    #[serde(default)]
    pub round: Option<u32>,
    /// Feed-side roster identifier of the drafting team.
    #[serde(default)]
    pub roster_id: Option<u32>,
    /// Player name as reported by the feed.
    #[serde(default)]
    pub player_name: Option<String>,
    /// Position string as reported by the feed (e.g. "RB").
    #[serde(default)]
    pub position: Option<String>,
    /// NFL team abbreviation as reported by the feed.
    #[serde(default)]
    pub team: Option<String>,
}

impl DraftPick {
    /// Minimal pick with only the authoritative fields set.
    pub fn new(pick_number: u32, picked_by: &str, player_id: &str) -> Self {
        DraftPick {
            pick_number,
            picked_by: picked_by.to_string(),
            player_id: player_id.to_string(),
            round: None,
            roster_id: None,
            player_name: None,
            position: None,
            team: None,
        }
    }

    /// The feed-reported position, if present and recognised.
    pub fn feed_position(&self) -> Option<Position> {
        self.position.as_deref().and_then(Position::from_str_pos)
    }
}
