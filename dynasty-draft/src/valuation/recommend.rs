// Recommendation engine: ranks available players by base score adjusted for
// position caps, RB/WR balance and empty needs.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::needs::{NeedStatus, PositionCounts, PositionalNeeds};
use super::rankings::{Player, PlayerPool};
use crate::draft::pick::Position;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Tunable constants of the scoring rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationParams {
    /// How many recommendations to return.
    pub count: usize,
    /// Added to the under-represented side of the RB/WR balance.
    pub balance_boost: f64,
    /// RB/WR ratio above which WRs are boosted.
    pub ratio_upper: f64,
    /// RB/WR ratio below which RBs are boosted.
    pub ratio_lower: f64,
    /// Added to players whose dedicated slot is still EMPTY. 0 disables.
    pub empty_need_boost: f64,
    /// Roster count at which a position is excluded outright.
    pub position_caps: BTreeMap<Position, usize>,
}

impl Default for RecommendationParams {
    fn default() -> Self {
        let mut position_caps = BTreeMap::new();
        position_caps.insert(Position::Quarterback, 2);
        position_caps.insert(Position::TightEnd, 1);
        RecommendationParams {
            count: 5,
            balance_boost: 10.0,
            ratio_upper: 1.3,
            ratio_lower: 0.7,
            empty_need_boost: 0.0,
            position_caps,
        }
    }
}

// ---------------------------------------------------------------------------
// RB/WR balance
// ---------------------------------------------------------------------------

/// Which side of the RB/WR balance, if any, needs help.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceSignal {
    Neutral,
    /// Boost WRs.
    TooManyRb,
    /// Boost RBs.
    TooManyWr,
}

/// RB/WR counts on the participant's roster and the resulting signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub rb: usize,
    pub wr: usize,
    /// `None` when there are no WRs.
    pub ratio: Option<f64>,
    pub signal: BalanceSignal,
}

impl Balance {
    /// Classify the roster's RB/WR ratio. The range
    /// `ratio_lower..=ratio_upper` is a dead zone with no adjustment.
    pub fn from_counts(counts: &PositionCounts, params: &RecommendationParams) -> Self {
        let rb = counts.count(Position::RunningBack);
        let wr = counts.count(Position::WideReceiver);
        let ratio = (wr > 0).then(|| rb as f64 / wr as f64);
        let signal = match ratio {
            None if rb == 0 => BalanceSignal::Neutral,
            None => BalanceSignal::TooManyRb,
            Some(r) if r > params.ratio_upper => BalanceSignal::TooManyRb,
            Some(r) if r < params.ratio_lower => BalanceSignal::TooManyWr,
            Some(_) => BalanceSignal::Neutral,
        };
        Balance {
            rb,
            wr,
            ratio,
            signal,
        }
    }

    /// Whether a candidate at `pos` gets the balance boost.
    pub fn favors(&self, pos: Position) -> bool {
        matches!(
            (self.signal, pos),
            (BalanceSignal::TooManyRb, Position::WideReceiver)
                | (BalanceSignal::TooManyWr, Position::RunningBack)
        )
    }

    /// "4/1 = 4.0" style summary.
    pub fn describe(&self) -> String {
        match self.ratio {
            Some(r) => format!("{}/{} = {:.1}", self.rb, self.wr, r),
            None if self.rb == 0 => "0/0 (none drafted yet)".to_string(),
            None => format!("{}/0 = \u{221e} (no WRs yet)", self.rb),
        }
    }
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

/// A recommended pick with its score breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub player: Player,
    pub base_score: f64,
    /// Sum of the adjustments applied on top of the base score.
    pub boost: f64,
    pub score: f64,
    pub reason: String,
}

fn format_rank(rank: f64) -> String {
    if rank.fract() == 0.0 {
        format!("{rank:.0}")
    } else {
        format!("{rank:.1}")
    }
}

fn reason_for(
    player: &Player,
    needs: &PositionalNeeds,
    balance: &Balance,
    empty_boosted: bool,
) -> String {
    let pos = player.position;
    let mut reason = format!("Ranked #{} overall.", format_rank(player.rank));

    match pos {
        Position::RunningBack | Position::WideReceiver => {
            let _ = write!(reason, " Current RB/WR ratio: {}.", balance.describe());
            if balance.favors(pos) {
                let _ = write!(reason, " Need more {}s to balance roster.", pos);
            } else {
                reason.push_str(" Maintains good position balance.");
            }
        }
        _ => {
            if let Some(need) = needs.dedicated(pos) {
                if need.needed() > 0 {
                    let _ = write!(
                        reason,
                        " You need {} more {}(s). Currently have {}/{} {}s.",
                        need.needed(),
                        pos,
                        need.filled,
                        need.required,
                        pos
                    );
                } else {
                    let _ = write!(
                        reason,
                        " You've filled your {} requirement ({}/{}).",
                        pos, need.filled, need.required
                    );
                }
            }
        }
    }

    if empty_boosted {
        let _ = write!(reason, " No {} on your roster yet.", pos);
    }
    reason
}

/// Descending score, then better rank, then player id.
fn compare(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.player.rank.total_cmp(&b.player.rank))
        .then_with(|| a.player.id.cmp(&b.player.id))
}

/// Rank `available` players and return the top `params.count`.
///
/// 1. Players at a capped position are removed before any scoring.
/// 2. Score starts at the pool's base score.
/// 3. The balance boost goes to WRs when the roster is RB-heavy and to RBs
///    when it is WR-heavy.
/// 4. The empty-need boost goes to players whose dedicated slot is EMPTY.
pub fn recommend(
    pool: &PlayerPool,
    available: &[Player],
    needs: &PositionalNeeds,
    counts: &PositionCounts,
    params: &RecommendationParams,
) -> Vec<Recommendation> {
    let balance = Balance::from_counts(counts, params);

    let mut scored: Vec<Recommendation> = available
        .iter()
        .filter(|p| {
            params
                .position_caps
                .get(&p.position)
                .map_or(true, |&cap| counts.count(p.position) < cap)
        })
        .map(|p| {
            let base_score = pool.base_score(p);
            let mut boost = 0.0;
            if balance.favors(p.position) {
                boost += params.balance_boost;
            }
            let empty_boosted = params.empty_need_boost > 0.0
                && needs
                    .dedicated(p.position)
                    .is_some_and(|n| n.status == NeedStatus::Empty);
            if empty_boosted {
                boost += params.empty_need_boost;
            }
            Recommendation {
                player: p.clone(),
                base_score,
                boost,
                score: base_score + boost,
                reason: reason_for(p, needs, &balance, empty_boosted),
            }
        })
        .collect();

    scored.sort_by(compare);
    scored.truncate(params.count);
    scored
}
