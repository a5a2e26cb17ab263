//! Host console: command parsing, execution, and event rendering for the
//! `rolltable-host` binary.

use std::fmt::Write as _;

use rolltable_dice::{NotationError, parse_notation};
use rolltable_protocol::{DiceRequest, ParticipantId, ServerMessage, Visibility};

use crate::RolltableError;
use crate::host::{HostHandle, HostSnapshot};

pub const HELP: &str = "\
commands:
  roll <NdS[+NdS...]> [public|private|targeted <id,id...>]
  kick <id>
  clear all | host | history | <id>
  autoclear on|off          your own tables
  force-autoclear on|off    every table
  autoclear-after <secs>    0 disables the timer
  crit <hit> <fail>
  nick <name>
  who
  help
  quit";

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Roll {
        dice: Vec<DiceRequest>,
        visibility: Visibility,
        targets: Vec<ParticipantId>,
    },
    Kick(ParticipantId),
    ClearAll,
    ClearHost,
    ClearHistory,
    ClearParticipant(ParticipantId),
    Autoclear(bool),
    ForceAutoclear(bool),
    AutoclearAfter(u32),
    Crit { hit: u32, fail: u32 },
    Nick(String),
    Who,
    Help,
    Quit,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("unknown command `{0}` (try `help`)")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error(transparent)]
    Notation(#[from] NotationError),
}

/// Parses one console line. Blank lines are `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, ConsoleError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let cmd = match (head, rest.as_slice()) {
        ("roll" | "r", [notation, tail @ ..]) => {
            let dice = parse_notation(notation)?;
            let (visibility, targets) = match tail {
                [] | ["public"] => (Visibility::Public, Vec::new()),
                ["private"] => (Visibility::Private, Vec::new()),
                ["targeted", ids] => (
                    Visibility::Targeted,
                    ids.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(ParticipantId::from)
                        .collect(),
                ),
                _ => {
                    return Err(ConsoleError::Usage(
                        "roll <dice> [public|private|targeted <id,id...>]",
                    ));
                }
            };
            ConsoleCommand::Roll {
                dice,
                visibility,
                targets,
            }
        }
        ("roll" | "r", []) => return Err(ConsoleError::Usage("roll <dice>")),
        ("kick", [id]) => ConsoleCommand::Kick(ParticipantId::from(*id)),
        ("kick", _) => return Err(ConsoleError::Usage("kick <id>")),
        ("clear", ["all"]) => ConsoleCommand::ClearAll,
        ("clear", ["host" | "dm"]) => ConsoleCommand::ClearHost,
        ("clear", ["history"]) => ConsoleCommand::ClearHistory,
        ("clear", [id]) => ConsoleCommand::ClearParticipant(ParticipantId::from(*id)),
        ("clear", _) => {
            return Err(ConsoleError::Usage("clear all | host | history | <id>"));
        }
        ("autoclear", [flag]) => ConsoleCommand::Autoclear(on_off(flag, "autoclear on|off")?),
        ("force-autoclear", [flag]) => {
            ConsoleCommand::ForceAutoclear(on_off(flag, "force-autoclear on|off")?)
        }
        ("autoclear-after", [secs]) => ConsoleCommand::AutoclearAfter(
            secs.parse()
                .map_err(|_| ConsoleError::Usage("autoclear-after <secs>"))?,
        ),
        ("crit", [hit, fail]) => {
            let usage = || ConsoleError::Usage("crit <hit> <fail>");
            ConsoleCommand::Crit {
                hit: hit.parse().map_err(|_| usage())?,
                fail: fail.parse().map_err(|_| usage())?,
            }
        }
        ("nick", [_, ..]) => ConsoleCommand::Nick(rest.join(" ")),
        ("who", []) => ConsoleCommand::Who,
        ("help" | "?", _) => ConsoleCommand::Help,
        ("quit" | "exit", _) => ConsoleCommand::Quit,
        (other, _) => return Err(ConsoleError::Unknown(other.to_string())),
    };
    Ok(Some(cmd))
}

fn on_off(flag: &str, usage: &'static str) -> Result<bool, ConsoleError> {
    match flag {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        _ => Err(ConsoleError::Usage(usage)),
    }
}

/// Runs a command against the host. Returns text to show, if any.
///
/// `Quit` is the caller's business and yields nothing here.
pub async fn execute(
    host: &HostHandle,
    cmd: ConsoleCommand,
) -> Result<Option<String>, RolltableError> {
    match cmd {
        ConsoleCommand::Roll {
            dice,
            visibility,
            targets,
        } => host.dm_roll(dice, visibility, targets).await?,
        ConsoleCommand::Kick(id) => host.kick(id).await?,
        ConsoleCommand::ClearAll => host.clear_all_tables().await?,
        ConsoleCommand::ClearHost => host.clear_host_table().await?,
        ConsoleCommand::ClearHistory => host.clear_history().await?,
        ConsoleCommand::ClearParticipant(id) => {
            host.clear_participant_table(id).await?
        }
        ConsoleCommand::Autoclear(enabled) => {
            host.set_host_autoclear(enabled).await?
        }
        ConsoleCommand::ForceAutoclear(enabled) => {
            let mut settings = *host.snapshot().await?.room.settings();
            settings.force_autoclear = enabled;
            host.update_settings(settings).await?
        }
        ConsoleCommand::AutoclearAfter(secs) => {
            let mut settings = *host.snapshot().await?.room.settings();
            settings.autoclear_seconds = secs;
            host.update_settings(settings).await?
        }
        ConsoleCommand::Crit { hit, fail } => {
            let mut settings = *host.snapshot().await?.room.settings();
            settings.crit_hit_threshold = hit;
            settings.crit_fail_threshold = fail;
            host.update_settings(settings).await?
        }
        ConsoleCommand::Nick(nick) => host.update_host_profile(nick, None).await?,
        ConsoleCommand::Who => return Ok(Some(render_who(&host.snapshot().await?))),
        ConsoleCommand::Help => return Ok(Some(HELP.to_string())),
        ConsoleCommand::Quit => {}
    }
    Ok(None)
}

/// The participant roster, host first.
pub fn render_who(snapshot: &HostSnapshot) -> String {
    let room = &snapshot.room;
    let settings = room.settings();
    let mut out = format!(
        "room {} | crit {}/{} | autoclear {}s{}\n",
        room.room_name(),
        settings.crit_hit_threshold,
        settings.crit_fail_threshold,
        settings.autoclear_seconds,
        if settings.force_autoclear { " (forced)" } else { "" },
    );
    let _ = writeln!(
        out,
        "  dm        {} (host){}{}",
        room.host_nick(),
        if snapshot.host_autoclear { " [autoclear]" } else { "" },
        table_suffix(room.host_table().map(|t| t.total)),
    );
    for (id, p) in room.participants_by_join() {
        let _ = writeln!(
            out,
            "  {:<9} {}{}{}{}",
            id.as_str(),
            p.nick,
            if p.connected { "" } else { " (offline)" },
            if p.autoclear { " [autoclear]" } else { "" },
            table_suffix(p.table.as_ref().map(|t| t.total)),
        );
    }
    let _ = write!(out, "  history: {} rolls", room.history().len());
    out
}

fn table_suffix(total: Option<u64>) -> String {
    total.map(|t| format!(" table={t}")).unwrap_or_default()
}

/// One line describing a host feed event, or `None` for events the
/// console does not show.
pub fn describe(msg: &ServerMessage) -> Option<String> {
    let line = match msg {
        ServerMessage::RollResult {
            player_id,
            nick,
            dice,
            total,
            visibility,
            ..
        } => {
            let groups: Vec<String> = dice
                .iter()
                .map(|g| {
                    let faces: Vec<String> =
                        g.results.iter().map(u32::to_string).collect();
                    format!("{}d{} [{}]", g.count, g.sides, faces.join(", "))
                })
                .collect();
            format!(
                "{nick} ({player_id}) rolled {} = {total} ({visibility})",
                groups.join(" + ")
            )
        }
        ServerMessage::PlayerJoined { player_id, nick, .. } => {
            format!("{nick} joined as {player_id}")
        }
        ServerMessage::PlayerLeft { player_id, nick } => {
            format!("{nick} ({player_id}) left")
        }
        ServerMessage::TableCleared { player_id: Some(id) } => {
            format!("table cleared: {id}")
        }
        ServerMessage::TableCleared { player_id: None } => {
            "all player tables cleared".to_string()
        }
        ServerMessage::HistoryCleared => "history cleared".to_string(),
        ServerMessage::PlayerList { players } => {
            let online = players.iter().filter(|p| p.connected).count();
            format!("{online}/{} players online", players.len())
        }
        _ => return None,
    };
    Some(line)
}
