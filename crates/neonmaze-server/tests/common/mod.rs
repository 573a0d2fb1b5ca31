use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use neonmaze_core::entities::PlayerId;
use neonmaze_core::net::messages::{ClientMessage, JoinMsg, ServerMessage};
use neonmaze_core::net::protocol::{PROTOCOL_VERSION, decode_server_message, encode_client_message};
use neonmaze_core::test_helpers::{TEST_SEED, quiet_tuning};

use neonmaze_server::build_app;
use neonmaze_server::config::ServerConfig;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestServer {
    pub addr: SocketAddr,
    _serve: tokio::task::JoinHandle<()>,
    _game_loop: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Start a test server with a fixed seed and a hazard-free map.
    pub async fn new() -> Self {
        Self::from_config(test_config()).await
    }

    pub async fn with_max_players(max_players: usize) -> Self {
        let mut config = test_config();
        config.limits.max_players = max_players;
        Self::from_config(config).await
    }

    async fn from_config(config: ServerConfig) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (app, _state, game_loop) = build_app(config);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            _serve: handle,
            _game_loop: game_loop,
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listen_addr = "127.0.0.1:0".to_string();
    config.game.seed = Some(TEST_SEED);
    config.game.tuning = Some(quiet_tuning());
    config
}

/// Connect a WebSocket client to the given URL.
pub async fn ws_connect(url: &str) -> WsStream {
    let (stream, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    stream
}

pub async fn ws_send_client_msg(stream: &mut WsStream, msg: &ClientMessage) {
    let encoded = encode_client_message(msg).unwrap();
    stream.send(Message::Binary(encoded.into())).await.unwrap();
}

pub async fn ws_send_join(stream: &mut WsStream, name: &str) {
    let msg = ClientMessage::Join(JoinMsg {
        name: Some(name.to_string()),
        protocol_version: PROTOCOL_VERSION,
    });
    ws_send_client_msg(stream, &msg).await;
}

/// Join and consume the private handshake. Returns the assigned id.
pub async fn ws_join(stream: &mut WsStream, name: &str) -> PlayerId {
    ws_send_join(stream, name).await;
    let msg = ws_read_until(stream, |m| matches!(m, ServerMessage::PlayerIdAssigned(_))).await;
    let ServerMessage::PlayerIdAssigned(assigned) = msg else {
        unreachable!()
    };
    let id = assigned.player_id;
    ws_read_until(stream, |m| {
        matches!(m, ServerMessage::PlayerJoined(j) if j.player.id == id)
    })
    .await;
    assigned.player_id
}

/// Read the next binary frame (5s timeout).
pub async fn ws_read_raw(stream: &mut WsStream) -> Vec<u8> {
    let deadline = Duration::from_secs(5);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => return data.to_vec(),
                Some(Ok(Message::Close(_))) => panic!("WebSocket closed unexpectedly"),
                Some(Err(e)) => panic!("WebSocket error: {e}"),
                None => panic!("WebSocket stream ended"),
                _ => continue,
            }
        }
    })
    .await
    .expect("Timed out waiting for WebSocket message")
}

/// Read the next ServerMessage (5s timeout).
pub async fn ws_read_server_msg(stream: &mut WsStream) -> ServerMessage {
    let data = ws_read_raw(stream).await;
    decode_server_message(&data).unwrap()
}

/// Skip frames until one matches.
pub async fn ws_read_until(
    stream: &mut WsStream,
    pred: impl Fn(&ServerMessage) -> bool,
) -> ServerMessage {
    loop {
        let msg = ws_read_server_msg(stream).await;
        if pred(&msg) {
            return msg;
        }
    }
}

/// Next message that is not the per-tick `game_update`.
pub async fn ws_read_event(stream: &mut WsStream) -> ServerMessage {
    ws_read_until(stream, |m| !matches!(m, ServerMessage::GameUpdate(_))).await
}

/// True once the server closes the socket (5s timeout).
pub async fn ws_expect_closed(stream: &mut WsStream) -> bool {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return true,
                _ => continue,
            }
        }
    })
    .await
    .unwrap_or(false)
}
