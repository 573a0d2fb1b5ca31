use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use neonmaze_core::entities::PlayerId;
use neonmaze_core::net::messages::{ClientMessage, ServerFullMsg, ServerMessage};
use neonmaze_core::net::protocol::{
    PROTOCOL_VERSION, decode_client_message, decode_message_type, encode_server_message,
};

use crate::game_loop::GameCommand;
use crate::state::{AppState, ConnectionGuard};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> axum::response::Response {
    ws.max_message_size(state.config.limits.max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, state))
        .into_response()
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let max_players = state.config.limits.max_players;
    let Some(_guard) =
        ConnectionGuard::try_acquire(Arc::clone(&state.ws_connection_count), max_players)
    else {
        tracing::warn!(max = max_players, "Connection limit reached, rejecting");
        reject_full(&mut ws_sender, max_players).await;
        return;
    };

    let player_id = state.alloc_player_id();
    let (tx, rx) = mpsc::channel::<Bytes>(state.config.limits.player_message_buffer);
    if state
        .commands
        .send(GameCommand::Connected { player_id, tx })
        .is_err()
    {
        tracing::error!(player_id, "Game loop is gone, dropping connection");
        return;
    }
    tracing::info!(player_id, "Player connected");

    spawn_writer(ws_sender, rx);

    read_loop(&mut ws_receiver, &state, player_id).await;

    // Removing the sender on the loop side also ends the writer task.
    let _ = state.commands.send(GameCommand::Disconnected { player_id });
    tracing::info!(player_id, "Player disconnected");
}

/// Tell an over-cap client why, then close.
async fn reject_full(ws_sender: &mut SplitSink<WebSocket, Message>, max_players: usize) {
    let msg = ServerMessage::ServerFull(ServerFullMsg {
        max_players: u32::try_from(max_players).unwrap_or(u32::MAX),
    });
    match encode_server_message(&msg) {
        Ok(data) => {
            if let Err(e) = ws_sender.send(Message::Binary(data.into())).await {
                tracing::debug!(error = %e, "Failed to send server_full");
            }
        },
        Err(e) => tracing::error!(error = %e, "Failed to encode server_full"),
    }
    let _ = ws_sender.send(Message::Close(None)).await;
}

fn spawn_writer(mut ws_sender: SplitSink<WebSocket, Message>, mut rx: mpsc::Receiver<Bytes>) {
    tokio::spawn(async move {
        while let Some(data) = rx.recv().await {
            if ws_sender.send(Message::Binary(data)).await.is_err() {
                break;
            }
        }
        let _ = ws_sender.close().await;
    });
}

/// Per-connection rate limiter (token bucket).
struct RateLimiter {
    tokens: f64,
    last_refill: tokio::time::Instant,
    max_tokens: f64,
    refill_rate: f64, // tokens per second
}

impl RateLimiter {
    fn new(max_tokens: f64, refill_rate: f64) -> Self {
        Self {
            tokens: max_tokens,
            last_refill: tokio::time::Instant::now(),
            max_tokens,
            refill_rate,
        }
    }

    /// Returns true if the message is allowed; false if rate-limited.
    fn allow(&mut self) -> bool {
        let now = tokio::time::Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Decode client frames and forward them to the loop. Anything malformed,
/// oversized or server-only is dropped without a reply.
async fn read_loop(
    ws_receiver: &mut SplitStream<WebSocket>,
    state: &AppState,
    player_id: PlayerId,
) {
    let rate = state.config.limits.ws_rate_limit_per_sec;
    let mut rate_limiter = RateLimiter::new(rate, rate);
    let max_size = state.config.limits.max_message_size;

    while let Some(Ok(msg)) = ws_receiver.next().await {
        let data = match msg {
            Message::Binary(d) => d,
            Message::Close(_) => break,
            _ => continue,
        };

        if !rate_limiter.allow() {
            tracing::warn!(player_id, "Rate limited");
            continue;
        }
        if data.is_empty() || data.len() > max_size {
            tracing::debug!(player_id, len = data.len(), "Dropping frame with bad length");
            continue;
        }

        let msg_type = match decode_message_type(&data) {
            Ok(t) => t,
            Err(e) => {
                tracing::debug!(player_id, error = %e, "Dropping undecodable frame");
                continue;
            },
        };
        if msg_type.is_server_only() {
            tracing::warn!(player_id, ?msg_type, "Rejected server-only message from client");
            continue;
        }

        let message = match decode_client_message(&data) {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(player_id, ?msg_type, error = %e, "Dropping malformed payload");
                continue;
            },
        };

        if let ClientMessage::Join(join) = &message
            && join.protocol_version != PROTOCOL_VERSION
        {
            tracing::warn!(
                player_id,
                client = join.protocol_version,
                server = PROTOCOL_VERSION,
                "Protocol version mismatch, closing"
            );
            break;
        }

        if state
            .commands
            .send(GameCommand::Client { player_id, message })
            .is_err()
        {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn rate_limiter_allows_burst_then_blocks() {
        let mut limiter = RateLimiter::new(3.0, 0.0); // no refill
        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(!limiter.allow());
    }

    #[tokio::test]
    async fn rate_limiter_refills_over_time() {
        let mut limiter = RateLimiter::new(2.0, 100.0);
        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(!limiter.allow());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(limiter.allow());
    }

    #[tokio::test]
    async fn rate_limiter_caps_at_max_tokens() {
        let mut limiter = RateLimiter::new(2.0, 50.0);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(!limiter.allow());
    }
}
