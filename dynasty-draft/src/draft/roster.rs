// Roster construction and slot assignment.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::pick::Position;

/// A roster slot designation from `[league.roster]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Slot {
    /// A slot only one position may fill.
    Position(Position),
    /// RB/WR/TE.
    Flex,
    /// QB/RB/WR/TE.
    SuperFlex,
    /// Any position.
    Bench,
}

impl Slot {
    /// Parse a roster config key. Accepts every position abbreviation plus
    /// FLEX, SUPER_FLEX (or SUPERFLEX) and BENCH (or BN/BE).
    pub fn from_config_key(key: &str) -> Option<Self> {
        match key.trim().to_uppercase().as_str() {
            "FLEX" | "WRT" => Some(Slot::Flex),
            "SUPER_FLEX" | "SUPERFLEX" | "SFLEX" => Some(Slot::SuperFlex),
            "BENCH" | "BN" | "BE" => Some(Slot::Bench),
            other => Position::from_str_pos(other).map(Slot::Position),
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Slot::Position(p) => p.display_str(),
            Slot::Flex => "FLEX",
            Slot::SuperFlex => "SUPER_FLEX",
            Slot::Bench => "BENCH",
        }
    }

    /// Whether a player at `pos` may occupy this slot.
    pub fn accepts(&self, pos: Position) -> bool {
        match self {
            Slot::Position(p) => *p == pos,
            Slot::Flex => pos.is_flex_eligible(),
            Slot::SuperFlex => pos.is_superflex_eligible(),
            Slot::Bench => true,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// Per-slot required counts, parsed once from the league config.
pub type RosterRequirements = BTreeMap<Slot, usize>;

/// Parse `[league.roster]` into typed requirements. Unknown keys are
/// skipped with a warning; config validation rejects them up front.
pub fn requirements_from_config(roster: &HashMap<String, usize>) -> RosterRequirements {
    let mut reqs = RosterRequirements::new();
    for (key, &count) in roster {
        match Slot::from_config_key(key) {
            Some(slot) => *reqs.entry(slot).or_insert(0) += count,
            None => warn!("Ignoring unknown roster slot '{}'", key),
        }
    }
    reqs
}

/// A drafted player placed on the participant's roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosteredPlayer {
    pub player_id: String,
    pub name: String,
    pub position: Position,
}

/// A single slot on the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterSlot {
    pub slot: Slot,
    pub player: Option<RosteredPlayer>,
}

/// The participant's roster: configured slots plus anything that did not fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub slots: Vec<RosterSlot>,
    /// Players with no open slot left. Non-empty only when the feed reports
    /// more picks than the league has roster spots.
    pub overflow: Vec<RosteredPlayer>,
}

impl Roster {
    /// Create an empty roster. Slots are laid out in `Slot` order, so
    /// dedicated slots come before FLEX, SUPER_FLEX and BENCH.
    pub fn new(requirements: &RosterRequirements) -> Self {
        let slots = requirements
            .iter()
            .flat_map(|(&slot, &count)| {
                std::iter::repeat(slot)
                    .take(count)
                    .map(|slot| RosterSlot { slot, player: None })
            })
            .collect();
        Roster {
            slots,
            overflow: Vec::new(),
        }
    }

    /// Place a player on the roster.
    ///
    /// Slot assignment priority:
    /// 1. Dedicated position slot
    /// 2. FLEX (RB/WR/TE)
    /// 3. SUPER_FLEX (QB/RB/WR/TE)
    /// 4. Bench
    ///
    /// Returns the slot used, or `None` if the player went to overflow.
    pub fn add_player(&mut self, player: RosteredPlayer) -> Option<Slot> {
        let order = [
            Slot::Position(player.position),
            Slot::Flex,
            Slot::SuperFlex,
            Slot::Bench,
        ];
        for wanted in order {
            if !wanted.accepts(player.position) {
                continue;
            }
            if let Some(slot) = self
                .slots
                .iter_mut()
                .find(|s| s.slot == wanted && s.player.is_none())
            {
                slot.player = Some(player);
                return Some(wanted);
            }
        }
        self.overflow.push(player);
        None
    }

    /// Number of filled slots of the given kind.
    pub fn filled(&self, slot: Slot) -> usize {
        self.slots
            .iter()
            .filter(|s| s.slot == slot && s.player.is_some())
            .count()
    }

    /// Number of filled slots.
    pub fn filled_count(&self) -> usize {
        self.slots.iter().filter(|s| s.player.is_some()).count()
    }

    /// Total number of slots.
    pub fn total_count(&self) -> usize {
        self.slots.len()
    }
}
