//! Terminal tic-tac-toe.
//!
//! Run with:
//!   cargo run -p duel -- host --name Ana
//!   cargo run -p duel -- join --addr 127.0.0.1:7878 --name Bo
//!   cargo run -p duel -- pair
//!   cargo run -p duel -- solo
//!
//! Type `help` at the prompt for the command list. Logs go to stderr and
//! follow `RUST_LOG`.

use std::{pin::Pin, sync::Arc};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use futures::{Stream, StreamExt, stream};
use tictactoe_core::{Board, GameMode};
use tictactoe_sync::{Command, SyncConfig, SyncEvent, SyncHandle, spawn};
use tictactoe_transport::{
    Acceptor, MemoryNetwork, PeerInfo, SERVICE_PREFIX, TcpAcceptor, TcpConnector,
    advertised_name,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    task::JoinHandle,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_ADDR: &str = "127.0.0.1:7878";

#[derive(Debug, Parser)]
#[command(name = "duel", about = "Tic-tac-toe against a friend or the computer")]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Wait for an opponent on a TCP address.
    Host {
        #[arg(long, default_value = DEFAULT_ADDR)]
        addr: String,
        #[arg(long, default_value = "Host")]
        name: String,
    },
    /// Join a hosted game.
    Join {
        #[arg(long, default_value = DEFAULT_ADDR)]
        addr: String,
        #[arg(long, default_value = "Guest")]
        name: String,
    },
    /// Both players in this process, linked in memory.
    Pair {
        #[arg(long, default_value = "Ana")]
        host_name: String,
        #[arg(long, default_value = "Bo")]
        joiner_name: String,
    },
    /// Play against the computer.
    Solo {
        #[arg(long, default_value = "Player")]
        name: String,
    },
    /// Two players sharing this terminal without a link.
    Local,
}

/// One actor driven from this terminal.
struct Seat {
    label: String,
    handle: SyncHandle,
    task: JoinHandle<()>,
}

type EventStream = Pin<Box<dyn Stream<Item = (usize, SyncEvent)> + Send>>;

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Place { row: usize, col: usize },
    Reset,
    Rematch,
    Decline,
    Cancel,
    Quit,
    Dismiss,
    State,
    Help,
    Exit,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = SyncConfig::from_env().context("invalid TICTACTOE_* setting")?;

    let (seats, events) = match cli.mode {
        Mode::Host { addr, name } => {
            let acceptor = TcpAcceptor::bind(addr.as_str())
                .await
                .with_context(|| format!("binding {addr}"))?;
            println!(
                "Hosting {} on {}, waiting for an opponent...",
                advertised_name(),
                acceptor.local_address()
            );
            let (seat, events) = seat(&config, GameMode::Remote, &name, 0)?;
            seat.handle.listen(Box::new(acceptor))?;
            (vec![seat], vec![events])
        }
        Mode::Join { addr, name } => {
            let (seat, events) = seat(&config, GameMode::Remote, &name, 0)?;
            println!("Connecting to {addr}...");
            seat.handle
                .connect(Arc::new(TcpConnector), PeerInfo::new(SERVICE_PREFIX, addr))?;
            (vec![seat], vec![events])
        }
        Mode::Pair {
            host_name,
            joiner_name,
        } => {
            let network = MemoryNetwork::new();
            let acceptor = network.advertise(advertised_name())?;
            let peer = PeerInfo::new(SERVICE_PREFIX, acceptor.local_address());
            let (host, host_events) = seat(&config, GameMode::Remote, &host_name, 0)?;
            let (joiner, joiner_events) = seat(&config, GameMode::Remote, &joiner_name, 1)?;
            host.handle.listen(Box::new(acceptor))?;
            joiner.handle.discover(Arc::new(network.clone()))?;
            joiner.handle.connect(Arc::new(network), peer)?;
            (vec![host, joiner], vec![host_events, joiner_events])
        }
        Mode::Solo { name } => {
            let (seat, events) = seat(&config, GameMode::SinglePlayer, &name, 0)?;
            (vec![seat], vec![events])
        }
        Mode::Local => {
            let (seat, events) = seat(&config, GameMode::LocalMultiplayer, "Player", 0)?;
            (vec![seat], vec![events])
        }
    };

    print_help();
    let result = drive(&seats, stream::select_all(events)).await;

    for seat in seats {
        let _ = seat.handle.disconnect();
        drop(seat.handle);
        if let Err(e) = seat.task.await {
            tracing::warn!(seat = %seat.label, error = %e, "actor task failed");
        }
    }
    result
}

fn seat(
    config: &SyncConfig,
    mode: GameMode,
    name: &str,
    index: usize,
) -> Result<(Seat, EventStream)> {
    let (handle, events, task) = spawn(config.clone(), mode)?;
    handle.set_player_name(name)?;
    let stream: EventStream = Box::pin(events.into_stream().map(move |event| (index, event)));
    Ok((
        Seat {
            label: name.to_string(),
            handle,
            task,
        },
        stream,
    ))
}

async fn drive(
    seats: &[Seat],
    mut events: impl Stream<Item = (usize, SyncEvent)> + Unpin,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_board: Option<Board> = None;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_input(&line) {
                    Ok(Input::Exit) => break,
                    Ok(Input::Help) => print_help(),
                    Ok(Input::State) => {
                        for seat in seats {
                            let snapshot = seat.handle.snapshot().await?;
                            println!("{}", serde_json::to_string_pretty(&snapshot)?);
                        }
                    }
                    Ok(input) => dispatch(seats, input).await?,
                    Err(e) => println!("{e}"),
                }
            }
            event = events.next() => {
                let Some((index, event)) = event else { break };
                let label = seats.get(index).map_or("?", |seat| seat.label.as_str());
                render(label, seats.len() > 1, &event, &mut last_board);
            }
        }
    }
    Ok(())
}

/// Routes an input to the seat it concerns.
async fn dispatch(seats: &[Seat], input: Input) -> Result<()> {
    let mut target = &seats[0];
    if seats.len() > 1 {
        for seat in seats {
            let snapshot = seat.handle.snapshot().await?;
            let concerned = match input {
                Input::Place { .. } => snapshot.is_local_turn(),
                Input::Rematch | Input::Decline => snapshot.dialogs().rematch.is_some(),
                Input::Cancel => snapshot.dialogs().rematch_wait,
                Input::Dismiss => snapshot.dialogs().disconnect_alert.is_some(),
                _ => false,
            };
            if concerned {
                target = seat;
                break;
            }
        }
    }

    let command = match input {
        Input::Place { row, col } => Command::PlaceMark { row, col },
        Input::Reset => Command::ConfirmReset,
        Input::Rematch => Command::AcceptRematch,
        Input::Decline => Command::DeclineRematch,
        Input::Cancel => Command::CancelRematchWait,
        Input::Quit => Command::Quit,
        Input::Dismiss => Command::DismissAlert,
        Input::State | Input::Help | Input::Exit => return Ok(()),
    };
    target.handle.send(command)?;
    Ok(())
}

fn parse_input(line: &str) -> Result<Input> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let input = match words.as_slice() {
        [row, col] => Input::Place {
            row: row.parse().with_context(|| format!("bad row {row:?}"))?,
            col: col.parse().with_context(|| format!("bad column {col:?}"))?,
        },
        ["reset"] => Input::Reset,
        ["rematch" | "yes"] => Input::Rematch,
        ["decline" | "no"] => Input::Decline,
        ["cancel"] => Input::Cancel,
        ["quit"] => Input::Quit,
        ["ok" | "dismiss"] => Input::Dismiss,
        ["state"] => Input::State,
        ["help" | "?"] => Input::Help,
        ["exit"] => Input::Exit,
        _ => bail!("unknown command {line:?}, type help"),
    };
    Ok(input)
}

fn render(label: &str, labelled: bool, event: &SyncEvent, last_board: &mut Option<Board>) {
    let say = |text: String| {
        if labelled {
            println!("[{label}] {text}");
        } else {
            println!("{text}");
        }
    };
    match event {
        SyncEvent::Updated(session) => {
            let board = *session.game().board();
            if last_board.as_ref() != Some(&board) {
                println!("\n{board}");
                say(session.status_line());
                *last_board = Some(board);
            }
        }
        SyncEvent::ConnectionChanged(state) => tracing::debug!(%label, %state, "connection"),
        SyncEvent::Connected { role } => say(format!("Connected, playing {}", role.player())),
        SyncEvent::ConnectionFailed(reason) => say(format!("Connection failed: {reason}")),
        SyncEvent::OpponentJoined { name } => say(format!("{name} joined")),
        SyncEvent::Ready => say("Ready".to_string()),
        SyncEvent::GameOver(outcome) => say(format!("Game over: {outcome:?}")),
        SyncEvent::ResetPending => say("Waiting for the opponent to confirm the reset".to_string()),
        SyncEvent::ResetCommitted => say("New game".to_string()),
        SyncEvent::RematchPrompt(prompt) => say(format!("Rematch? ({prompt:?}) yes/no")),
        SyncEvent::RematchWaiting => say("Waiting for the opponent, cancel to stop".to_string()),
        SyncEvent::RematchDeclined => say("Rematch declined".to_string()),
        SyncEvent::HandshakeTimedOut => say("The opponent did not answer".to_string()),
        SyncEvent::OpponentLeft => say("Your opponent left the game. ok to dismiss".to_string()),
        SyncEvent::PeerLost { message } => say(format!("{message}. ok to dismiss")),
        SyncEvent::Disconnected => say("Disconnected".to_string()),
        SyncEvent::PeersDiscovered(peers) => {
            for peer in peers {
                say(format!("Found {}", peer.display_name()));
            }
        }
        SyncEvent::DiscoveryFailed(reason) => say(format!("Discovery failed: {reason}")),
        SyncEvent::NavigateToGame => say("Game screen".to_string()),
        SyncEvent::ReturnToMenu => say("Back to the menu".to_string()),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  <row> <col>     place a mark (0-2)");
    println!("  reset           start over");
    println!("  rematch | yes   accept or ask for a rematch");
    println!("  decline | no    decline a rematch");
    println!("  cancel          stop waiting for a rematch answer");
    println!("  quit            leave the game");
    println!("  ok              dismiss an alert");
    println!("  state           print the session as JSON");
    println!("  exit            disconnect and exit");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("1 2").unwrap(), Input::Place { row: 1, col: 2 });
        assert_eq!(parse_input("  yes ").unwrap(), Input::Rematch);
        assert_eq!(parse_input("ok").unwrap(), Input::Dismiss);
        assert!(parse_input("1 x").is_err());
        assert!(parse_input("jump").is_err());
    }

    #[test]
    fn test_cli_parses_modes() {
        let cli = Cli::try_parse_from(["duel", "join", "--addr", "10.0.0.2:7000", "--name", "Bo"])
            .unwrap();
        match cli.mode {
            Mode::Join { addr, name } => {
                assert_eq!(addr, "10.0.0.2:7000");
                assert_eq!(name, "Bo");
            }
            other => panic!("unexpected mode {other:?}"),
        }
    }
}
