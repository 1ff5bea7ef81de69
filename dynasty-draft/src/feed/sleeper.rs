// Sleeper public API client.
//
// Endpoints used (all unauthenticated GETs):
//   /league/{league_id}            -> draft_id
//   /draft/{draft_id}              -> type, draft_order, slot_to_roster_id, settings
//   /draft/{draft_id}/picks        -> completed picks
//   /league/{league_id}/rosters    -> roster_id -> owner_id (seat fallback)
//   /league/{league_id}/users      -> display names

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::{DraftFeed, DraftMetadata, FeedUnavailable};
use crate::config::Config;
use crate::draft::order::{DraftOrder, DraftType};
use crate::draft::pick::DraftPick;

// ---------------------------------------------------------------------------
// Raw API payloads (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawLeague {
    #[serde(default)]
    draft_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDraft {
    draft_id: String,
    #[serde(default, rename = "type")]
    draft_type: Option<String>,
    /// user_id -> 1-based slot.
    #[serde(default)]
    draft_order: Option<HashMap<String, u32>>,
    /// slot (as string) -> roster_id; empty slots are null.
    #[serde(default)]
    slot_to_roster_id: Option<HashMap<String, Option<u32>>>,
    #[serde(default)]
    settings: Option<RawDraftSettings>,
}

#[derive(Debug, Deserialize)]
struct RawDraftSettings {
    #[serde(default)]
    rounds: Option<u32>,
    #[serde(default)]
    teams: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawPick {
    pick_no: u32,
    #[serde(default)]
    round: Option<u32>,
    #[serde(default)]
    roster_id: Option<u32>,
    #[serde(default)]
    picked_by: Option<String>,
    #[serde(default)]
    player_id: Option<String>,
    #[serde(default)]
    metadata: Option<RawPickMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPickMetadata {
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    team: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRoster {
    roster_id: u32,
    #[serde(default)]
    owner_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    user_id: String,
    #[serde(default)]
    display_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Pure conversions (unit-test targets)
// ---------------------------------------------------------------------------

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn pick_from_raw(raw: RawPick) -> DraftPick {
    let meta = raw.metadata.unwrap_or_default();
    let player_name = match (non_empty(meta.first_name), non_empty(meta.last_name)) {
        (Some(first), Some(last)) => Some(format!("{first} {last}")),
        (Some(one), None) | (None, Some(one)) => Some(one),
        (None, None) => None,
    };
    DraftPick {
        pick_number: raw.pick_no,
        picked_by: raw.picked_by.unwrap_or_default(),
        player_id: raw.player_id.unwrap_or_default(),
        round: raw.round,
        roster_id: raw.roster_id,
        player_name,
        position: non_empty(meta.position),
        team: non_empty(meta.team),
    }
}

/// Parse a `/draft/{id}/picks` response body.
pub fn parse_picks(body: &str) -> Result<Vec<DraftPick>, serde_json::Error> {
    let raw: Option<Vec<RawPick>> = serde_json::from_str(body)?;
    Ok(raw.unwrap_or_default().into_iter().map(pick_from_raw).collect())
}

/// Map Sleeper's draft `type` string onto a draft type.
///
/// Sleeper defaults to snake; auction drafts have no seat order at all, so
/// they are treated as snake for turn purposes and logged.
pub fn draft_type_from_str(s: Option<&str>) -> DraftType {
    match s.map(str::to_ascii_lowercase).as_deref() {
        Some("linear") => DraftType::Linear,
        Some("snake") | None => DraftType::Snake,
        Some(other) => {
            warn!("Unrecognised draft type '{}', assuming snake order", other);
            DraftType::Snake
        }
    }
}

/// Seat count implied by the draft payload: the configured team count or the
/// slot mapping, whichever is larger. Slot numbers beyond it still widen the
/// list in [`place_seats`].
fn min_seats(raw: &RawDraft) -> usize {
    let teams = raw
        .settings
        .as_ref()
        .and_then(|s| s.teams)
        .unwrap_or(0) as usize;
    let slots = raw.slot_to_roster_id.as_ref().map_or(0, HashMap::len);
    teams.max(slots)
}

/// Put each participant at index `slot - 1`. Slots nobody holds keep a
/// `slot_{n}` placeholder so the pick cadence matches the real seat count.
fn place_seats(mut assigned: Vec<(u32, String)>, min_seats: usize) -> Vec<String> {
    assigned.sort();
    let max_slot = assigned.iter().map(|(slot, _)| *slot as usize).max().unwrap_or(0);
    let mut seats: Vec<Option<String>> = vec![None; max_slot.max(min_seats)];
    for (slot, seat) in assigned {
        let Some(entry) = (slot as usize).checked_sub(1).and_then(|i| seats.get_mut(i)) else {
            warn!("Ignoring seat '{}' with invalid slot {}", seat, slot);
            continue;
        };
        if let Some(existing) = entry.as_ref() {
            warn!(
                "Slot {} claimed by both '{}' and '{}'; keeping the first",
                slot, existing, seat
            );
        } else {
            *entry = Some(seat);
        }
    }
    seats
        .into_iter()
        .enumerate()
        .map(|(i, seat)| seat.unwrap_or_else(|| format!("slot_{}", i + 1)))
        .collect()
}

/// Seat list from `draft_order` (user_id -> slot). Sleeper leaves teams
/// without an owner out of this map.
fn seats_from_draft_order(order: &HashMap<String, u32>, min_seats: usize) -> Vec<String> {
    let assigned = order.iter().map(|(user, slot)| (*slot, user.clone())).collect();
    place_seats(assigned, min_seats)
}

/// Seat list from `slot_to_roster_id` joined with roster owners.
///
/// A roster with no owner keeps a `roster_{id}` placeholder; a slot with no
/// roster keeps a `slot_{n}` one.
fn seats_from_slots(
    slots: &HashMap<String, Option<u32>>,
    owners: &HashMap<u32, String>,
    min_seats: usize,
) -> Vec<String> {
    let assigned = slots
        .iter()
        .filter_map(|(slot, roster)| {
            let slot: u32 = slot.parse().ok()?;
            let id = (*roster)?;
            let seat = owners
                .get(&id)
                .cloned()
                .unwrap_or_else(|| format!("roster_{id}"));
            Some((slot, seat))
        })
        .collect();
    place_seats(assigned, min_seats)
}

// ---------------------------------------------------------------------------
// SleeperClient
// ---------------------------------------------------------------------------

/// HTTP client for one Sleeper league.
pub struct SleeperClient {
    http: reqwest::Client,
    base_url: String,
    league_id: String,
    timeout: Duration,
    /// The league's draft id, resolved on first use and fixed thereafter.
    draft_id: OnceCell<String>,
}

impl SleeperClient {
    pub fn new(
        base_url: &str,
        league_id: &str,
        timeout: Duration,
    ) -> Result<Self, FeedUnavailable> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedUnavailable::Http {
                url: base_url.to_string(),
                source: e,
            })?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            league_id: league_id.to_string(),
            timeout,
            draft_id: OnceCell::new(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, FeedUnavailable> {
        Self::new(
            &config.feed.base_url,
            &config.league.league_id,
            Duration::from_secs(config.feed.timeout_secs),
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FeedUnavailable> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);
        let resp = self.http.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                FeedUnavailable::Timeout {
                    secs: self.timeout.as_secs(),
                }
            } else {
                FeedUnavailable::Http {
                    url: url.clone(),
                    source: e,
                }
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FeedUnavailable::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(|e| FeedUnavailable::Http {
            url: url.clone(),
            source: e,
        })?;
        serde_json::from_str(&body).map_err(|e| FeedUnavailable::Decode {
            url,
            message: e.to_string(),
        })
    }

    /// Resolve the league's draft id. `None` while the league has no draft.
    async fn draft_id(&self) -> Result<Option<String>, FeedUnavailable> {
        if let Some(id) = self.draft_id.get() {
            return Ok(Some(id.clone()));
        }
        let league: Option<RawLeague> =
            self.get_json(&format!("/league/{}", self.league_id)).await?;
        let Some(id) = league.and_then(|l| non_empty(l.draft_id)) else {
            warn!("No draft found for league {}", self.league_id);
            return Ok(None);
        };
        info!("Resolved draft {} for league {}", id, self.league_id);
        // A concurrent resolver may have won the race; both saw the same id.
        let _ = self.draft_id.set(id.clone());
        Ok(Some(id))
    }

    async fn roster_owners(&self) -> Result<HashMap<u32, String>, FeedUnavailable> {
        let rosters: Option<Vec<RawRoster>> = self
            .get_json(&format!("/league/{}/rosters", self.league_id))
            .await?;
        Ok(rosters
            .unwrap_or_default()
            .into_iter()
            .filter_map(|r| non_empty(r.owner_id).map(|o| (r.roster_id, o)))
            .collect())
    }

    async fn participant_names(&self) -> BTreeMap<String, String> {
        let users: Result<Option<Vec<RawUser>>, _> = self
            .get_json(&format!("/league/{}/users", self.league_id))
            .await;
        match users {
            Ok(users) => users
                .unwrap_or_default()
                .into_iter()
                .filter_map(|u| non_empty(u.display_name).map(|n| (u.user_id, n)))
                .collect(),
            Err(e) => {
                warn!("Could not load league users, showing raw ids: {}", e);
                BTreeMap::new()
            }
        }
    }
}

#[async_trait]
impl DraftFeed for SleeperClient {
    async fn fetch_picks(&self) -> Result<Vec<DraftPick>, FeedUnavailable> {
        let Some(draft_id) = self.draft_id().await? else {
            return Ok(Vec::new());
        };
        let url = format!("{}/draft/{}/picks", self.base_url, draft_id);
        let raw: Option<Vec<RawPick>> = self.get_json(&format!("/draft/{draft_id}/picks")).await?;
        let picks: Vec<DraftPick> = raw
            .unwrap_or_default()
            .into_iter()
            .map(pick_from_raw)
            .collect();
        debug!("{} returned {} picks", url, picks.len());
        Ok(picks)
    }

    async fn fetch_metadata(&self) -> Result<Option<DraftMetadata>, FeedUnavailable> {
        let Some(draft_id) = self.draft_id().await? else {
            return Ok(None);
        };
        let raw: Option<RawDraft> = self.get_json(&format!("/draft/{draft_id}")).await?;
        let Some(raw) = raw else {
            return Ok(None);
        };

        let draft_type = draft_type_from_str(raw.draft_type.as_deref());
        let rounds = raw.settings.as_ref().and_then(|s| s.rounds);

        let seat_floor = min_seats(&raw);
        let seats = match (&raw.draft_order, &raw.slot_to_roster_id) {
            (Some(order), _) if !order.is_empty() => seats_from_draft_order(order, seat_floor),
            (_, Some(slots)) if !slots.is_empty() => {
                let owners = self.roster_owners().await?;
                seats_from_slots(slots, &owners, seat_floor)
            }
            _ => Vec::new(),
        };

        let order = if seats.is_empty() {
            None
        } else {
            Some(DraftOrder::new(seats, draft_type, rounds))
        };

        Ok(Some(DraftMetadata {
            draft_id: raw.draft_id,
            order,
            participant_names: self.participant_names().await,
        }))
    }
}
