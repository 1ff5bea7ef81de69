// Plain-text console front end.
//
// Prints each UI update to stdout and turns stdin lines into commands:
//   r            refresh now
//   a            toggle auto-refresh
//   i <secs>     set the refresh interval
//   f [POS ...]  filter the available list by position (no args clears)
//   q            quit

use std::collections::BTreeSet;
use std::fmt::Write as _;

use chrono::{DateTime, Local};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::draft::order::Undetermined;
use crate::draft::pick::Position;
use crate::draft::state::DraftPhase;
use crate::protocol::{UiUpdate, UserCommand};
use crate::valuation::needs::NeedStatus;
use crate::valuation::EngineSnapshot;

/// Rows shown in the available-players list.
const AVAILABLE_ROWS: usize = 15;
/// Rows shown in the recent-picks list.
const RECENT_PICKS: usize = 5;

const HELP: &str = "commands: r = refresh, a = toggle auto-refresh, i <secs> = interval, \
                    f [POS ...] = filter available, q = quit";

// ---------------------------------------------------------------------------
// Command parsing
// ---------------------------------------------------------------------------

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Forward to the app loop.
    Send(UserCommand),
    /// Change the local position filter.
    Filter(Vec<Position>),
    Help,
}

/// Parse one line of user input.
pub fn parse_command(line: &str) -> Result<ConsoleCommand, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(ConsoleCommand::Help);
    };
    match head.to_ascii_lowercase().as_str() {
        "r" | "refresh" => Ok(ConsoleCommand::Send(UserCommand::Refresh)),
        "a" | "auto" => Ok(ConsoleCommand::Send(UserCommand::ToggleAutoRefresh)),
        "q" | "quit" | "exit" => Ok(ConsoleCommand::Send(UserCommand::Quit)),
        "i" | "interval" => {
            let arg = words.next().ok_or("usage: i <seconds>")?;
            let secs: u64 = arg
                .parse()
                .map_err(|_| format!("'{arg}' is not a number of seconds"))?;
            Ok(ConsoleCommand::Send(UserCommand::SetInterval(secs)))
        }
        "f" | "filter" => {
            let positions = words
                .map(|w| Position::from_str_pos(w).ok_or(format!("unknown position '{w}'")))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ConsoleCommand::Filter(positions))
        }
        "h" | "help" | "?" => Ok(ConsoleCommand::Help),
        other => Err(format!("unknown command '{other}'")),
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// "picks until your turn" line. Never shows a number for unknown states.
pub fn render_turn(turn: &Result<u32, Undetermined>) -> String {
    match turn {
        Ok(0) => "You are on the clock!".to_string(),
        Ok(1) => "1 pick until your turn".to_string(),
        Ok(n) => format!("{n} picks until your turn"),
        Err(reason) => format!("Picks until your turn: unknown ({reason})"),
    }
}

fn status_marker(status: NeedStatus) -> &'static str {
    match status {
        NeedStatus::Met => "[ok]",
        NeedStatus::Partial => "[..]",
        NeedStatus::Empty => "[  ]",
    }
}

/// Full text rendering of a snapshot.
pub fn render_snapshot(
    snapshot: &EngineSnapshot,
    refreshed_at: DateTime<Local>,
    filter: &[Position],
) -> String {
    let state = &snapshot.state;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "=== Draft {:?} | pick #{} | updated {} ===",
        state.phase,
        state.current_pick_index,
        refreshed_at.format("%H:%M:%S")
    );
    let _ = writeln!(out, "{}", render_turn(&snapshot.picks_until_turn));
    if state.phase == DraftPhase::InProgress {
        let on_clock = state
            .draft_order
            .as_ref()
            .and_then(|o| o.participant_for_pick(state.current_pick_index));
        if let Some(who) = on_clock {
            let _ = writeln!(out, "On the clock: {}", state.display_name(who));
        }
    }

    let _ = writeln!(out, "\nRoster needs:");
    for (slot, need) in &snapshot.needs.slots {
        let _ = writeln!(
            out,
            "  {} {:<10} {}/{} ({:.0}%) {}",
            status_marker(need.status),
            slot.display_str(),
            need.filled,
            need.required,
            need.percentage(),
            need.status.label()
        );
    }
    if snapshot.needs.overflow > 0 {
        let _ = writeln!(out, "  {} player(s) beyond roster slots", snapshot.needs.overflow);
    }
    let _ = writeln!(out, "  RB/WR ratio: {}", snapshot.balance.describe());

    let _ = writeln!(out, "\nRecommended picks:");
    if snapshot.recommendations.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for (i, rec) in snapshot.recommendations.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {}. {} ({} {}) score {:.1}\n     {}",
            i + 1,
            rec.player.name,
            rec.player.position,
            rec.player.team,
            rec.score,
            rec.reason
        );
    }

    let available = snapshot.available_at(filter);
    if filter.is_empty() {
        let _ = writeln!(out, "\nBest available ({} left):", available.len());
    } else {
        let names: Vec<&str> = filter.iter().map(Position::display_str).collect();
        let _ = writeln!(
            out,
            "\nBest available [{}] ({} left):",
            names.join(" "),
            available.len()
        );
    }
    for p in available.iter().take(AVAILABLE_ROWS) {
        let bye = p.bye.map(|b| format!("bye {b}")).unwrap_or_default();
        let status = p.status.as_deref().unwrap_or("");
        let _ = writeln!(
            out,
            "  #{:<5} {:<26} {:<4} {:<4} {:<7} {}",
            p.rank, p.name, p.position, p.team, bye, status
        );
    }

    let recent = state.recent_picks(RECENT_PICKS);
    if !recent.is_empty() {
        let _ = writeln!(out, "\nRecent picks:");
        for pick in recent.iter().rev() {
            let player = pick.player_name.as_deref().unwrap_or(&pick.player_id);
            let _ = writeln!(
                out,
                "  #{:<4} {:<20} {}",
                pick.pick_number,
                state.display_name(&pick.picked_by),
                player
            );
        }
    }

    out
}

/// Filter positions with no player in the ranking table.
pub fn unranked_positions(filter: &[Position], ranked: &BTreeSet<Position>) -> Vec<Position> {
    filter.iter().copied().filter(|p| !ranked.contains(p)).collect()
}

/// Failure banner. The last good snapshot stays on screen above it.
pub fn render_failure(message: &str, last_success: Option<DateTime<Local>>) -> String {
    match last_success {
        Some(at) => format!(
            "!! Refresh failed: {message}. Showing data from {} (stale).",
            at.format("%H:%M:%S")
        ),
        None => format!("!! Refresh failed: {message}. No draft data loaded yet."),
    }
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

/// Run the console front end until the user quits or the app loop exits.
///
/// `ranked` is the set of positions in the ranking table; filters outside it
/// are rejected.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
    ranked: BTreeSet<Position>,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut filter: Vec<Position> = Vec::new();
    let mut latest: Option<(Box<EngineSnapshot>, DateTime<Local>)> = None;

    println!("{HELP}");

    loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(UiUpdate::Snapshot { snapshot, refreshed_at }) => {
                        println!("{}", render_snapshot(&snapshot, refreshed_at, &filter));
                        latest = Some((snapshot, refreshed_at));
                    }
                    Some(UiUpdate::RefreshFailed { message, last_success }) => {
                        println!("{}", render_failure(&message, last_success));
                    }
                    Some(UiUpdate::RefreshSettings { auto_refresh, interval_secs }) => {
                        println!(
                            "Auto-refresh {} (every {}s)",
                            if auto_refresh { "on" } else { "off" },
                            interval_secs
                        );
                    }
                    Some(UiUpdate::Notice(msg)) => println!("{msg}"),
                    None => {
                        // Channel closed: app is shutting down
                        break;
                    }
                }
            }

            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("stdin closed, quitting");
                    let _ = cmd_tx.send(UserCommand::Quit).await;
                    break;
                };
                match parse_command(&line) {
                    Ok(ConsoleCommand::Send(cmd)) => {
                        debug!("User command: {:?}", cmd);
                        let quit = cmd == UserCommand::Quit;
                        let _ = cmd_tx.send(cmd).await;
                        if quit {
                            break;
                        }
                    }
                    Ok(ConsoleCommand::Filter(positions)) => {
                        let unranked = unranked_positions(&positions, &ranked);
                        if !unranked.is_empty() {
                            let names: Vec<&str> = unranked.iter().map(Position::display_str).collect();
                            println!("No ranked players at {}", names.join(" "));
                            continue;
                        }
                        filter = positions;
                        match &latest {
                            Some((snapshot, at)) => println!("{}", render_snapshot(snapshot, *at, &filter)),
                            None => println!("Filter set; waiting for draft data"),
                        }
                    }
                    Ok(ConsoleCommand::Help) => println!("{HELP}"),
                    Err(msg) => println!("{msg}\n{HELP}"),
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use chrono::TimeZone;

    use crate::draft::order::{DraftOrder, DraftType};
    use crate::draft::pick::DraftPick;
    use crate::draft::roster::{RosterRequirements, Slot};
    use crate::draft::state::DraftState;
    use crate::valuation::rankings::PlayerPool;
    use crate::valuation::recommend::RecommendationParams;
    use crate::valuation::Engine;

    fn snapshot() -> EngineSnapshot {
        let pool = PlayerPool::from_reader(
            "player_id,name,position,team,rank_value,bye,status\n\
             1,Josh Allen,QB,BUF,1,12,Active\n\
             2,Bijan Robinson,RB,ATL,2,5,Active\n\
             3,CeeDee Lamb,WR,DAL,3,7,Active\n\
             4,Sam LaPorta,TE,DET,4,5,Active"
                .as_bytes(),
        )
        .unwrap();
        let reqs: RosterRequirements = [
            (Slot::Position(Position::Quarterback), 1),
            (Slot::Position(Position::RunningBack), 2),
        ]
        .into_iter()
        .collect();
        let engine = Engine::new(Arc::new(pool), reqs, RecommendationParams::default());
        let mut names = BTreeMap::new();
        names.insert("u2".to_string(), "Rival Team".to_string());
        let mut pick = DraftPick::new(1, "u2", "99");
        pick.player_name = Some("Rookie Runner".into());
        let state = DraftState::derive(
            "u1",
            vec![pick],
            Some(DraftOrder::new(vec!["u2".into(), "u1".into()], DraftType::Snake, None)),
            names,
        );
        engine.evaluate(state)
    }

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 8, 30, 19, 5, 0).unwrap()
    }

    #[test]
    fn parse_basic_commands() {
        assert_eq!(parse_command("r"), Ok(ConsoleCommand::Send(UserCommand::Refresh)));
        assert_eq!(parse_command(" A "), Ok(ConsoleCommand::Send(UserCommand::ToggleAutoRefresh)));
        assert_eq!(parse_command("q"), Ok(ConsoleCommand::Send(UserCommand::Quit)));
        assert_eq!(parse_command(""), Ok(ConsoleCommand::Help));
        assert!(parse_command("zzz").is_err());
    }

    #[test]
    fn parse_interval() {
        assert_eq!(
            parse_command("i 45"),
            Ok(ConsoleCommand::Send(UserCommand::SetInterval(45)))
        );
        assert!(parse_command("i").is_err());
        assert!(parse_command("i soon").is_err());
    }

    #[test]
    fn parse_filter() {
        assert_eq!(
            parse_command("f rb wr"),
            Ok(ConsoleCommand::Filter(vec![Position::RunningBack, Position::WideReceiver]))
        );
        assert_eq!(parse_command("f"), Ok(ConsoleCommand::Filter(vec![])));
        assert!(parse_command("f XX").is_err());
    }

    #[test]
    fn turn_rendering_never_invents_numbers() {
        assert_eq!(render_turn(&Ok(0)), "You are on the clock!");
        assert_eq!(render_turn(&Ok(3)), "3 picks until your turn");
        let unknown = render_turn(&Err(Undetermined::NotStarted));
        assert!(unknown.contains("unknown"));
        assert!(!unknown.chars().any(|c| c.is_ascii_digit()));
    }

    #[test]
    fn snapshot_rendering() {
        let text = render_snapshot(&snapshot(), at(), &[]);
        assert!(text.contains("pick #2"));
        assert!(text.contains("19:05:00"));
        assert!(text.contains("You are on the clock!"));
        assert!(text.contains("On the clock: u1"));
        assert!(text.contains("QB"));
        assert!(text.contains("EMPTY"));
        assert!(text.contains("Josh Allen"));
        assert!(text.contains("Rival Team"));
        assert!(text.contains("Rookie Runner"));
        assert!(text.contains("Best available (4 left)"));
    }

    #[test]
    fn filtered_rendering() {
        let text = render_snapshot(&snapshot(), at(), &[Position::TightEnd]);
        assert!(text.contains("Best available [TE] (1 left)"));
        assert!(text.contains("Sam LaPorta"));
    }

    #[test]
    fn filters_checked_against_ranked_positions() {
        let ranked: BTreeSet<Position> = [Position::Quarterback, Position::RunningBack]
            .into_iter()
            .collect();
        assert!(unranked_positions(&[Position::RunningBack], &ranked).is_empty());
        assert_eq!(
            unranked_positions(&[Position::Kicker, Position::Quarterback], &ranked),
            vec![Position::Kicker]
        );
    }

    #[test]
    fn failure_rendering() {
        assert!(render_failure("timeout", Some(at())).contains("stale"));
        assert!(render_failure("timeout", None).contains("No draft data"));
    }
}
