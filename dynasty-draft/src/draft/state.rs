// Draft state: the immutable snapshot rebuilt from the full pick list on
// every refresh.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::order::{picks_until_turn, DraftOrder, Undetermined};
use super::pick::DraftPick;

/// Coarse phase of the draft as seen from the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DraftPhase {
    /// No picks and no draft order yet. A normal pre-draft state.
    NotStarted,
    InProgress,
    /// Every pick of a draft with a known round count has been made.
    Complete,
}

/// The complete derived state of the draft at one point in time.
///
/// Never patched in place: each refresh builds a new value with
/// [`DraftState::derive`] and the caller swaps it in wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftState {
    pub phase: DraftPhase,
    /// Identifier of the participant this assistant works for.
    pub participant: String,
    /// All recorded picks, ordered by pick number.
    pub picks: Vec<DraftPick>,
    /// Exactly the player ids appearing in `picks`.
    pub drafted_ids: BTreeSet<String>,
    /// The participant's own picks, in draft order.
    pub my_roster: Vec<DraftPick>,
    /// The pick about to be made: always `picks.len() + 1`.
    pub current_pick_index: u32,
    /// Seat order, once the feed has published it.
    pub draft_order: Option<DraftOrder>,
    /// Display names for participant ids, when the feed provides them.
    #[serde(default)]
    pub participant_names: BTreeMap<String, String>,
}

impl DraftState {
    /// State before anything is known about the draft.
    pub fn not_started(participant: &str) -> Self {
        DraftState {
            phase: DraftPhase::NotStarted,
            participant: participant.to_string(),
            picks: Vec::new(),
            drafted_ids: BTreeSet::new(),
            my_roster: Vec::new(),
            current_pick_index: 1,
            draft_order: None,
            participant_names: BTreeMap::new(),
        }
    }

    /// Build the state from the full pick list reported by the feed.
    ///
    /// Picks are ordered by pick number. A player id that appears more than
    /// once keeps only its earliest pick; later duplicates are dropped with a
    /// warning so the drafted set and the pick list stay in agreement.
    pub fn derive(
        participant: &str,
        raw_picks: Vec<DraftPick>,
        draft_order: Option<DraftOrder>,
        participant_names: BTreeMap<String, String>,
    ) -> Self {
        let mut raw_picks = raw_picks;
        raw_picks.sort_by_key(|p| p.pick_number);

        let mut drafted_ids = BTreeSet::new();
        let mut picks = Vec::with_capacity(raw_picks.len());
        for pick in raw_picks {
            if pick.player_id.is_empty() {
                warn!(
                    "Pick #{} by '{}' has no player id; keeping it for turn order only",
                    pick.pick_number, pick.picked_by
                );
                picks.push(pick);
                continue;
            }
            if !drafted_ids.insert(pick.player_id.clone()) {
                warn!(
                    "Player {} reported as drafted twice (pick #{}); ignoring duplicate",
                    pick.player_id, pick.pick_number
                );
                continue;
            }
            picks.push(pick);
        }

        let my_roster: Vec<DraftPick> = picks
            .iter()
            .filter(|p| p.picked_by == participant)
            .cloned()
            .collect();

        let draft_order = draft_order.filter(|o| !o.is_empty());
        let current_pick_index = picks.len() as u32 + 1;

        let phase = if picks.is_empty() && draft_order.is_none() {
            DraftPhase::NotStarted
        } else if draft_order
            .as_ref()
            .and_then(|o| o.total_picks())
            .is_some_and(|total| picks.len() as u32 >= total)
        {
            DraftPhase::Complete
        } else {
            DraftPhase::InProgress
        };

        DraftState {
            phase,
            participant: participant.to_string(),
            picks,
            drafted_ids,
            my_roster,
            current_pick_index,
            draft_order,
            participant_names,
        }
    }

    /// Number of picks completed so far.
    pub fn pick_count(&self) -> usize {
        self.picks.len()
    }

    /// Picks until the participant is next on the clock.
    pub fn picks_until_turn(&self) -> Result<u32, Undetermined> {
        if self.phase == DraftPhase::NotStarted {
            return Err(Undetermined::NotStarted);
        }
        if self.phase == DraftPhase::Complete {
            return Err(Undetermined::DraftComplete);
        }
        picks_until_turn(
            self.draft_order.as_ref(),
            &self.participant,
            self.current_pick_index,
        )
    }

    /// The most recent `n` picks, newest last.
    pub fn recent_picks(&self, n: usize) -> &[DraftPick] {
        let start = self.picks.len().saturating_sub(n);
        &self.picks[start..]
    }

    /// Display name for a participant id, falling back to the id itself.
    pub fn display_name<'a>(&'a self, participant: &'a str) -> &'a str {
        self.participant_names
            .get(participant)
            .map(String::as_str)
            .unwrap_or(participant)
    }
}
