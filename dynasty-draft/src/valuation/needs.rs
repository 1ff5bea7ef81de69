// Positional needs: how far the participant's roster is from the configured
// slot requirements.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::draft::pick::Position;
use crate::draft::roster::{Roster, RosterRequirements, RosteredPlayer, Slot};

/// Three-way fill classification, used for colour coding and need boosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NeedStatus {
    Met,
    Partial,
    Empty,
}

impl NeedStatus {
    /// `Empty` iff nothing is filled, `Met` iff filled >= required.
    pub fn classify(filled: usize, required: usize) -> Self {
        if filled == 0 {
            NeedStatus::Empty
        } else if filled >= required {
            NeedStatus::Met
        } else {
            NeedStatus::Partial
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NeedStatus::Met => "MET",
            NeedStatus::Partial => "PARTIAL",
            NeedStatus::Empty => "EMPTY",
        }
    }
}

/// Fill state of one slot kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionNeed {
    pub filled: usize,
    pub required: usize,
    pub status: NeedStatus,
}

impl PositionNeed {
    pub fn new(filled: usize, required: usize) -> Self {
        PositionNeed {
            filled,
            required,
            status: NeedStatus::classify(filled, required),
        }
    }

    /// Slots still open.
    pub fn needed(&self) -> usize {
        self.required.saturating_sub(self.filled)
    }

    /// Fill percentage, capped at 100.
    pub fn percentage(&self) -> f64 {
        if self.required == 0 {
            return 100.0;
        }
        (self.filled as f64 / self.required as f64 * 100.0).min(100.0)
    }
}

/// Needs for every required slot kind, plus roster overflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionalNeeds {
    pub slots: BTreeMap<Slot, PositionNeed>,
    /// Players that fit no open slot.
    pub overflow: usize,
}

impl PositionalNeeds {
    /// Place `players` on a fresh roster and classify each slot kind.
    ///
    /// Slot kinds with a requirement of zero are left out.
    pub fn compute(players: &[RosteredPlayer], requirements: &RosterRequirements) -> Self {
        let mut roster = Roster::new(requirements);
        for player in players {
            roster.add_player(player.clone());
        }
        if !roster.overflow.is_empty() {
            warn!(
                "All {}/{} roster slots filled with {} players left over; feed inconsistency",
                roster.filled_count(),
                roster.total_count(),
                roster.overflow.len()
            );
        }

        let slots = requirements
            .iter()
            .filter(|(_, &required)| required > 0)
            .map(|(&slot, &required)| (slot, PositionNeed::new(roster.filled(slot), required)))
            .collect();

        PositionalNeeds {
            slots,
            overflow: roster.overflow.len(),
        }
    }

    /// Need for a position's dedicated slot, if the league has one.
    pub fn dedicated(&self, pos: Position) -> Option<&PositionNeed> {
        self.slots.get(&Slot::Position(pos))
    }
}

/// Raw per-position counts on the participant's roster, regardless of slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionCounts(BTreeMap<Position, usize>);

impl PositionCounts {
    pub fn from_players(players: &[RosteredPlayer]) -> Self {
        let mut counts = BTreeMap::new();
        for p in players {
            *counts.entry(p.position).or_insert(0) += 1;
        }
        PositionCounts(counts)
    }

    pub fn count(&self, pos: Position) -> usize {
        self.0.get(&pos).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reqs(entries: &[(Slot, usize)]) -> RosterRequirements {
        entries.iter().copied().collect()
    }

    fn player(id: &str, pos: Position) -> RosteredPlayer {
        RosteredPlayer {
            player_id: id.to_string(),
            name: id.to_string(),
            position: pos,
        }
    }

    const QB: Slot = Slot::Position(Position::Quarterback);
    const RB: Slot = Slot::Position(Position::RunningBack);
    const WR: Slot = Slot::Position(Position::WideReceiver);
    const TE: Slot = Slot::Position(Position::TightEnd);

    #[test]
    fn classify_boundaries() {
        assert_eq!(NeedStatus::classify(0, 2), NeedStatus::Empty);
        assert_eq!(NeedStatus::classify(1, 2), NeedStatus::Partial);
        assert_eq!(NeedStatus::classify(2, 2), NeedStatus::Met);
        assert_eq!(NeedStatus::classify(3, 2), NeedStatus::Met);
    }

    #[test]
    fn two_qb_slots_one_filled_is_partial() {
        let needs = PositionalNeeds::compute(
            &[player("q1", Position::Quarterback)],
            &reqs(&[(QB, 2), (TE, 1)]),
        );
        let qb = needs.dedicated(Position::Quarterback).unwrap();
        assert_eq!((qb.filled, qb.required), (1, 2));
        assert_eq!(qb.status, NeedStatus::Partial);
        assert_eq!(qb.needed(), 1);
        assert!((qb.percentage() - 50.0).abs() < f64::EPSILON);
        assert_eq!(needs.dedicated(Position::TightEnd).unwrap().status, NeedStatus::Empty);
    }

    #[test]
    fn extra_players_flow_to_flex() {
        let players = vec![
            player("r1", Position::RunningBack),
            player("r2", Position::RunningBack),
            player("r3", Position::RunningBack),
        ];
        let needs = PositionalNeeds::compute(
            &players,
            &reqs(&[(RB, 2), (WR, 2), (Slot::Flex, 1), (Slot::Bench, 3)]),
        );
        assert_eq!(needs.slots[&RB].status, NeedStatus::Met);
        assert_eq!(needs.slots[&Slot::Flex].status, NeedStatus::Met);
        assert_eq!(needs.slots[&WR].status, NeedStatus::Empty);
        assert_eq!(needs.slots[&Slot::Bench].status, NeedStatus::Empty);
        assert_eq!(needs.overflow, 0);
    }

    #[test]
    fn overflow_counted() {
        let players = vec![player("t1", Position::TightEnd), player("t2", Position::TightEnd)];
        let needs = PositionalNeeds::compute(&players, &reqs(&[(TE, 1)]));
        assert_eq!(needs.overflow, 1);
        assert_eq!(needs.slots[&TE].filled, 1);
    }

    #[test]
    fn zero_requirement_omitted() {
        let needs = PositionalNeeds::compute(&[], &reqs(&[(QB, 1), (Slot::SuperFlex, 0)]));
        assert_eq!(needs.slots.len(), 1);
        assert!(!needs.slots.contains_key(&Slot::SuperFlex));
    }

    #[test]
    fn counts_by_position() {
        let players = vec![
            player("r1", Position::RunningBack),
            player("r2", Position::RunningBack),
            player("w1", Position::WideReceiver),
        ];
        let counts = PositionCounts::from_players(&players);
        assert_eq!(counts.count(Position::RunningBack), 2);
        assert_eq!(counts.count(Position::WideReceiver), 1);
        assert_eq!(counts.count(Position::Quarterback), 0);
    }
}
