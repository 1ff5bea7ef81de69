// Valuation engine: rankings, positional needs, recommendations.
//
// Everything here is a pure function of a DraftState snapshot.

pub mod needs;
pub mod rankings;
pub mod recommend;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::draft::order::Undetermined;
use crate::draft::pick::{DraftPick, Position};
use crate::draft::roster::{RosterRequirements, RosteredPlayer};
use crate::draft::state::DraftState;
use needs::{PositionCounts, PositionalNeeds};
use rankings::{Player, PlayerPool};
use recommend::{recommend, Balance, Recommendation, RecommendationParams};

/// Everything derived from one DraftState, handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub state: DraftState,
    /// Undrafted ranked players, best rank first.
    pub available: Vec<Player>,
    /// The participant's players with resolved positions, in pick order.
    pub roster: Vec<RosteredPlayer>,
    pub needs: PositionalNeeds,
    pub balance: Balance,
    pub recommendations: Vec<Recommendation>,
    pub picks_until_turn: Result<u32, Undetermined>,
}

impl EngineSnapshot {
    /// Available players at any of `positions`; all of them when empty.
    pub fn available_at(&self, positions: &[Position]) -> Vec<&Player> {
        self.available
            .iter()
            .filter(|p| positions.is_empty() || positions.contains(&p.position))
            .collect()
    }
}

/// Stateless evaluator holding the static inputs: the pool and the config.
#[derive(Debug, Clone)]
pub struct Engine {
    pool: Arc<PlayerPool>,
    requirements: RosterRequirements,
    params: RecommendationParams,
}

impl Engine {
    pub fn new(
        pool: Arc<PlayerPool>,
        requirements: RosterRequirements,
        params: RecommendationParams,
    ) -> Self {
        Engine {
            pool,
            requirements,
            params,
        }
    }

    pub fn pool(&self) -> &PlayerPool {
        &self.pool
    }

    pub fn params(&self) -> &RecommendationParams {
        &self.params
    }

    /// Resolve a pick to a rostered player, preferring the ranking table and
    /// falling back to what the feed reported.
    pub fn rostered(&self, pick: &DraftPick) -> RosteredPlayer {
        match self.pool.player(&pick.player_id) {
            Some(p) => RosteredPlayer {
                player_id: p.id.clone(),
                name: p.name.clone(),
                position: p.position,
            },
            None => {
                debug!(
                    "Player {} not in rankings; using feed data",
                    pick.player_id
                );
                RosteredPlayer {
                    player_id: pick.player_id.clone(),
                    name: pick
                        .player_name
                        .clone()
                        .unwrap_or_else(|| pick.player_id.clone()),
                    position: pick.feed_position().unwrap_or(Position::Other),
                }
            }
        }
    }

    /// Recompute every derived value from scratch.
    pub fn evaluate(&self, state: DraftState) -> EngineSnapshot {
        let available = self.pool.available_players(&state.drafted_ids);
        let roster: Vec<RosteredPlayer> =
            state.my_roster.iter().map(|p| self.rostered(p)).collect();
        let needs = PositionalNeeds::compute(&roster, &self.requirements);
        let counts = PositionCounts::from_players(&roster);
        let balance = Balance::from_counts(&counts, &self.params);
        let recommendations = recommend(&self.pool, &available, &needs, &counts, &self.params);
        let picks_until_turn = state.picks_until_turn();

        EngineSnapshot {
            state,
            available,
            roster,
            needs,
            balance,
            recommendations,
            picks_until_turn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::draft::order::{DraftOrder, DraftType};
    use crate::draft::roster::Slot;
    use needs::NeedStatus;

    const RANKINGS: &str = "\
player_id,name,position,team,rank_value,bye,status
1,QB One,QB,KC,1,10,Active
2,RB One,RB,SF,2,9,Active
3,WR One,WR,MIN,3,6,Active
4,TE One,TE,KC,4,10,Active
5,RB Two,RB,DAL,5,7,Active
6,WR Two,WR,CIN,6,12,Active";

    fn engine() -> Engine {
        let pool = PlayerPool::from_reader(RANKINGS.as_bytes()).unwrap();
        let requirements: RosterRequirements = [
            (Slot::Position(Position::Quarterback), 1),
            (Slot::Position(Position::RunningBack), 2),
            (Slot::Position(Position::WideReceiver), 2),
            (Slot::Position(Position::TightEnd), 1),
            (Slot::Bench, 4),
        ]
        .into_iter()
        .collect();
        Engine::new(Arc::new(pool), requirements, RecommendationParams::default())
    }

    fn order() -> DraftOrder {
        DraftOrder::new(vec!["me".into(), "them".into()], DraftType::Snake, Some(5))
    }

    #[test]
    fn not_started_snapshot() {
        let snap = engine().evaluate(DraftState::not_started("me"));
        assert_eq!(snap.available.len(), 6);
        assert!(snap.roster.is_empty());
        assert_eq!(snap.picks_until_turn, Err(Undetermined::NotStarted));
        assert_eq!(snap.recommendations.len(), 5);
        assert!(snap
            .needs
            .slots
            .values()
            .all(|n| n.status == NeedStatus::Empty));
    }

    #[test]
    fn drafted_players_leave_available_and_join_roster() {
        let picks = vec![
            DraftPick::new(1, "me", "1"),
            DraftPick::new(2, "them", "2"),
            DraftPick::new(3, "them", "3"),
        ];
        let state = DraftState::derive("me", picks, Some(order()), BTreeMap::new());
        let snap = engine().evaluate(state);

        let ids: Vec<&str> = snap.available.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["4", "5", "6"]);
        assert_eq!(snap.roster.len(), 1);
        assert_eq!(snap.roster[0].position, Position::Quarterback);
        assert_eq!(
            snap.needs.dedicated(Position::Quarterback).unwrap().status,
            NeedStatus::Met
        );
        assert_eq!(snap.picks_until_turn, Ok(0));
        assert!(snap.recommendations.iter().all(|r| !snap.state.drafted_ids.contains(&r.player.id)));
    }

    #[test]
    fn unranked_pick_uses_feed_position() {
        let mut pick = DraftPick::new(1, "me", "999");
        pick.player_name = Some("Rookie Runner".into());
        pick.position = Some("RB".into());
        let state = DraftState::derive("me", vec![pick], Some(order()), BTreeMap::new());
        let snap = engine().evaluate(state);
        assert_eq!(snap.roster[0].name, "Rookie Runner");
        assert_eq!(snap.roster[0].position, Position::RunningBack);
        assert_eq!(snap.balance.rb, 1);
        assert_eq!(snap.available.len(), 6);
    }

    #[test]
    fn position_filter() {
        let snap = engine().evaluate(DraftState::not_started("me"));
        let rbs = snap.available_at(&[Position::RunningBack]);
        assert_eq!(rbs.len(), 2);
        assert_eq!(snap.available_at(&[]).len(), 6);
        assert_eq!(
            snap.available_at(&[Position::Quarterback, Position::TightEnd]).len(),
            2
        );
    }

    #[test]
    fn same_state_same_snapshot() {
        let picks = vec![DraftPick::new(1, "them", "2"), DraftPick::new(2, "me", "5")];
        let state = DraftState::derive("me", picks, Some(order()), BTreeMap::new());
        let e = engine();
        assert_eq!(e.evaluate(state.clone()), e.evaluate(state));
    }
}
