// Draft order and turn calculation.
//
// Seats are numbered 1..=N in the order the first round is drafted. A linear
// draft repeats that order every round; a snake draft reverses it on every
// even round.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How the seat order advances from round to round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DraftType {
    Linear,
    Snake,
}

/// Why the number of picks until the participant's turn cannot be given.
///
/// Displayed as "unknown"; never collapsed into a number like 0 or -1.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Undetermined {
    #[error("draft order not available yet")]
    NotStarted,

    #[error("participant {participant} does not hold a seat in the draft order")]
    SeatNotFound { participant: String },

    #[error("draft is complete")]
    DraftComplete,
}

/// The full seat order of a draft, derived once from league metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftOrder {
    /// Participant identifiers indexed by seat (index 0 is seat 1).
    pub seats: Vec<String>,
    pub draft_type: DraftType,
    /// Number of rounds, when the feed reports it.
    pub rounds: Option<u32>,
}

impl DraftOrder {
    pub fn new(seats: Vec<String>, draft_type: DraftType, rounds: Option<u32>) -> Self {
        DraftOrder {
            seats,
            draft_type,
            rounds,
        }
    }

    /// Number of seats (participants) in the draft.
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Total number of picks in the draft, when the round count is known.
    pub fn total_picks(&self) -> Option<u32> {
        self.rounds.map(|r| r * self.seats.len() as u32)
    }

    /// Zero-based seat index of a participant.
    pub fn seat_of(&self, participant: &str) -> Option<usize> {
        self.seats.iter().position(|s| s == participant)
    }

    /// Zero-based seat index that makes the given 1-based pick.
    ///
    /// Returns `None` for pick 0 or an empty order.
    pub fn seat_for_pick(&self, pick_index: u32) -> Option<usize> {
        let n = self.seats.len();
        if n == 0 || pick_index == 0 {
            return None;
        }
        let zero_based = (pick_index - 1) as usize;
        let round = zero_based / n;
        let pos = zero_based % n;
        let seat = match self.draft_type {
            DraftType::Snake if round % 2 == 1 => n - 1 - pos,
            _ => pos,
        };
        Some(seat)
    }

    /// Participant on the clock for the given 1-based pick.
    pub fn participant_for_pick(&self, pick_index: u32) -> Option<&str> {
        self.seat_for_pick(pick_index)
            .map(|seat| self.seats[seat].as_str())
    }
}

/// Number of picks that will be made before `participant` is next on the
/// clock, counting from `current_pick_index` (the pick about to be made).
///
/// Returns `Ok(0)` exactly when the current pick belongs to the participant.
pub fn picks_until_turn(
    order: Option<&DraftOrder>,
    participant: &str,
    current_pick_index: u32,
) -> Result<u32, Undetermined> {
    let order = match order {
        Some(o) if !o.is_empty() => o,
        _ => return Err(Undetermined::NotStarted),
    };

    let my_seat = order
        .seat_of(participant)
        .ok_or_else(|| Undetermined::SeatNotFound {
            participant: participant.to_string(),
        })?;

    let current = current_pick_index.max(1);
    let total = order.total_picks();
    if total.is_some_and(|t| current > t) {
        return Err(Undetermined::DraftComplete);
    }

    // Every participant picks at least once in any window of 2N picks,
    // whichever draft type is in use.
    let window = 2 * order.len() as u32;
    for offset in 0..window {
        let pick = current + offset;
        if total.is_some_and(|t| pick > t) {
            break;
        }
        if order.seat_for_pick(pick) == Some(my_seat) {
            return Ok(offset);
        }
    }

    Err(Undetermined::DraftComplete)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seats(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("user_{i}")).collect()
    }

    fn linear(n: usize) -> DraftOrder {
        DraftOrder::new(seats(n), DraftType::Linear, None)
    }

    fn snake(n: usize) -> DraftOrder {
        DraftOrder::new(seats(n), DraftType::Snake, None)
    }

    #[test]
    fn linear_ten_team_seat_four_at_first_pick() {
        let order = linear(10);
        assert_eq!(picks_until_turn(Some(&order), "user_4", 1), Ok(3));
    }

    #[test]
    fn zero_when_on_the_clock() {
        let order = linear(10);
        assert_eq!(picks_until_turn(Some(&order), "user_4", 4), Ok(0));
        let order = snake(10);
        // Pick 17 is the 7th pick of round 2: seat 10 - 6 = 4.
        assert_eq!(picks_until_turn(Some(&order), "user_4", 17), Ok(0));
    }

    #[test]
    fn linear_wraps_to_next_round() {
        let order = linear(10);
        // Pick 5 just passed seat 4; next turn is pick 14.
        assert_eq!(picks_until_turn(Some(&order), "user_4", 5), Ok(9));
    }

    #[test]
    fn snake_reverses_even_rounds() {
        let order = snake(4);
        let sequence: Vec<usize> = (1..=12).filter_map(|p| order.seat_for_pick(p)).collect();
        assert_eq!(sequence, vec![0, 1, 2, 3, 3, 2, 1, 0, 0, 1, 2, 3]);
    }

    #[test]
    fn snake_turn_at_the_turn() {
        let order = snake(4);
        // Seat 4 picks at 4 and 5 back to back.
        assert_eq!(picks_until_turn(Some(&order), "user_4", 4), Ok(0));
        assert_eq!(picks_until_turn(Some(&order), "user_4", 5), Ok(0));
        assert_eq!(picks_until_turn(Some(&order), "user_4", 6), Ok(6));
        // Seat 1 after its first pick waits for the end of round 2.
        assert_eq!(picks_until_turn(Some(&order), "user_1", 2), Ok(6));
    }

    #[test]
    fn missing_order_is_undetermined() {
        assert_eq!(
            picks_until_turn(None, "user_1", 1),
            Err(Undetermined::NotStarted)
        );
        let empty = DraftOrder::new(vec![], DraftType::Snake, None);
        assert_eq!(
            picks_until_turn(Some(&empty), "user_1", 1),
            Err(Undetermined::NotStarted)
        );
    }

    #[test]
    fn participant_without_seat_is_undetermined() {
        let order = linear(10);
        assert_eq!(
            picks_until_turn(Some(&order), "stranger", 1),
            Err(Undetermined::SeatNotFound {
                participant: "stranger".to_string()
            })
        );
    }

    #[test]
    fn complete_draft_is_undetermined() {
        let order = DraftOrder::new(seats(4), DraftType::Snake, Some(2));
        assert_eq!(order.total_picks(), Some(8));
        assert_eq!(
            picks_until_turn(Some(&order), "user_1", 9),
            Err(Undetermined::DraftComplete)
        );
        // Seat 2 has no picks left after pick 7 in a two-round draft.
        assert_eq!(
            picks_until_turn(Some(&order), "user_2", 8),
            Err(Undetermined::DraftComplete)
        );
        assert_eq!(picks_until_turn(Some(&order), "user_1", 8), Ok(0));
    }

    #[test]
    fn participant_for_pick_lookup() {
        let order = snake(3);
        assert_eq!(order.participant_for_pick(1), Some("user_1"));
        assert_eq!(order.participant_for_pick(4), Some("user_3"));
        assert_eq!(order.participant_for_pick(0), None);
    }
}
