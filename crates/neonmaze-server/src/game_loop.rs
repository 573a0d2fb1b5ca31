use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use neonmaze_core::entities::PlayerId;
use neonmaze_core::geometry::GameTime;
use neonmaze_core::net::messages::ClientMessage;
use neonmaze_core::net::protocol::encode_server_message;
use neonmaze_core::simulation::{Command, Outbound, Recipient, Simulation};

/// Commands sent from the WebSocket handlers to the game tick loop.
#[derive(Debug)]
pub enum GameCommand {
    /// A socket was accepted; frames for `player_id` go to `tx`.
    Connected {
        player_id: PlayerId,
        tx: mpsc::Sender<Bytes>,
    },
    Client {
        player_id: PlayerId,
        message: ClientMessage,
    },
    Disconnected {
        player_id: PlayerId,
    },
    Stop,
}

/// Snapshot of the loop published after every tick, read by `/health`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStatus {
    pub tick: u64,
    pub connections: usize,
    pub players: usize,
    pub level: u32,
    pub rounds_completed: u32,
}

/// Spawn the fixed-rate simulation loop as a tokio task.
/// Returns the command sender, the status receiver and the task handle.
pub fn spawn_game_loop(
    sim: Simulation,
    tick_interval: Duration,
) -> (
    mpsc::UnboundedSender<GameCommand>,
    watch::Receiver<LoopStatus>,
    JoinHandle<()>,
) {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = watch::channel(LoopStatus::default());

    let handle = tokio::spawn(async move {
        run_game_loop(sim, tick_interval, cmd_rx, status_tx).await;
    });

    (cmd_tx, status_rx, handle)
}

/// The server-authoritative tick loop. Commands are queued into the
/// simulation as they arrive; only `step` mutates the world.
async fn run_game_loop(
    mut sim: Simulation,
    tick_interval: Duration,
    mut cmd_rx: mpsc::UnboundedReceiver<GameCommand>,
    status_tx: watch::Sender<LoopStatus>,
) {
    let started = Instant::now();
    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut connections: HashMap<PlayerId, mpsc::Sender<Bytes>> = HashMap::new();

    tracing::info!(
        tick_interval_ms = tick_interval.as_millis() as u64,
        "Game loop started"
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = GameTime::try_from(started.elapsed().as_millis())
                    .unwrap_or(GameTime::MAX);
                let outbound = sim.step(now);
                dispatch(&outbound, &connections, sim.tick());

                let world = sim.world();
                status_tx.send_replace(LoopStatus {
                    tick: sim.tick(),
                    connections: connections.len(),
                    players: world.players.len(),
                    level: world.level,
                    rounds_completed: world.rounds_completed,
                });
            }
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(GameCommand::Connected { player_id, tx }) => {
                        connections.insert(player_id, tx);
                    },
                    Some(GameCommand::Client { player_id, message }) => {
                        sim.submit(Command::Client { player_id, message });
                    },
                    Some(GameCommand::Disconnected { player_id }) => {
                        connections.remove(&player_id);
                        sim.submit(Command::Disconnect { player_id });
                    },
                    Some(GameCommand::Stop) | None => break,
                }
            }
        }
    }

    tracing::info!(tick = sim.tick(), "Game loop stopped");
}

/// Encode each message once and fan it out. A full channel drops the frame
/// for that client only; nothing here ever waits on a socket.
fn dispatch(
    outbound: &[Outbound],
    connections: &HashMap<PlayerId, mpsc::Sender<Bytes>>,
    tick: u64,
) {
    for Outbound { recipient, message } in outbound {
        let data = match encode_server_message(message) {
            Ok(data) => Bytes::from(data),
            Err(e) => {
                tracing::error!(tick, error = %e, "Failed to encode server message");
                continue;
            },
        };
        match recipient {
            Recipient::All => {
                for (&player_id, tx) in connections {
                    deliver(player_id, tx, data.clone());
                }
            },
            Recipient::Player(player_id) => {
                if let Some(tx) = connections.get(player_id) {
                    deliver(*player_id, tx, data);
                }
            },
        }
    }
}

fn deliver(player_id: PlayerId, tx: &mpsc::Sender<Bytes>, data: Bytes) {
    match tx.try_send(data) {
        Ok(()) => {},
        Err(mpsc::error::TrySendError::Full(_)) => {
            tracing::debug!(player_id, "Outbound buffer full, dropping frame");
        },
        // The socket task is gone; its Disconnected command is on the way.
        Err(mpsc::error::TrySendError::Closed(_)) => {},
    }
}
