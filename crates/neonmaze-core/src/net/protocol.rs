use serde::{Deserialize, Serialize};

use super::messages::{
    BombExplosionMsg, ClientMessage, EffectEndedMsg, EffectStartedMsg, EnemyKilledMsg,
    EntityRemovedMsg, GameStateMsg, GameUpdateMsg, ItemAcquiredMsg, ItemCollectedMsg,
    ItemUsedMsg, JoinMsg, LevelMsg, MapResetMsg, MapSizeMsg, MessageType, MoveMsg, NewItemMsg,
    PlayerEliminatedMsg, PlayerEnemyHitMsg, PlayerIdMsg, PlayerJoinedMsg, PlayerRevivedMsg,
    PlayerTeleportedMsg, PlayerTrapHitMsg, ScreenSizeMsg, ServerFullMsg, ServerMessage,
    TrapWarningMsg, UseItemMsg,
};

/// Current protocol version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Default simulation tick rate in Hz.
pub const DEFAULT_TICK_RATE_HZ: u32 = 30;

/// Maximum message payload size in bytes.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024; // 64 KiB

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("empty message")]
    EmptyMessage,
    #[error("unknown message type: 0x{0:02x}")]
    UnknownMessageType(u8),
    #[error("payload too large: {0} bytes (max {MAX_MESSAGE_SIZE})")]
    PayloadTooLarge(usize),
    #[error("serialize error: {0}")]
    SerializeError(String),
    #[error("deserialize error: {0}")]
    DeserializeError(String),
}

/// Encode a serializable payload with a 1-byte type prefix.
pub fn encode_message<T: Serialize>(
    msg_type: MessageType,
    payload: &T,
) -> Result<Vec<u8>, ProtocolError> {
    let payload_bytes =
        rmp_serde::to_vec(payload).map_err(|e| ProtocolError::SerializeError(e.to_string()))?;
    let total = 1 + payload_bytes.len();
    if total > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge(total));
    }
    let mut buf = Vec::with_capacity(total);
    buf.push(msg_type as u8);
    buf.extend_from_slice(&payload_bytes);
    Ok(buf)
}

/// Encode a `ClientMessage` to wire format.
pub fn encode_client_message(msg: &ClientMessage) -> Result<Vec<u8>, ProtocolError> {
    match msg {
        ClientMessage::Join(m) => encode_message(MessageType::Join, m),
        ClientMessage::ScreenSize(m) => encode_message(MessageType::ScreenSize, m),
        ClientMessage::Move(m) => encode_message(MessageType::Move, m),
        ClientMessage::UseItem(m) => encode_message(MessageType::UseItem, m),
    }
}

/// Wire discriminator for a `ServerMessage`.
pub fn server_message_type(msg: &ServerMessage) -> MessageType {
    match msg {
        ServerMessage::GameState(_) => MessageType::GameState,
        ServerMessage::GameUpdate(_) => MessageType::GameUpdate,
        ServerMessage::MapReset(_) => MessageType::MapReset,
        ServerMessage::MapSize(_) => MessageType::MapSize,
        ServerMessage::PlayerIdAssigned(_) => MessageType::PlayerIdAssigned,
        ServerMessage::GameLevel(_) => MessageType::GameLevel,
        ServerMessage::LevelUp(_) => MessageType::LevelUp,
        ServerMessage::ServerFull(_) => MessageType::ServerFull,
        ServerMessage::PlayerJoined(_) => MessageType::PlayerJoined,
        ServerMessage::PlayerLeft(_) => MessageType::PlayerLeft,
        ServerMessage::DotEaten(_) => MessageType::DotEaten,
        ServerMessage::PowerPelletEaten(_) => MessageType::PowerPelletEaten,
        ServerMessage::ItemCollected(_) => MessageType::ItemCollected,
        ServerMessage::ItemAcquired(_) => MessageType::ItemAcquired,
        ServerMessage::NewItem(_) => MessageType::NewItem,
        ServerMessage::ItemUsed(_) => MessageType::ItemUsed,
        ServerMessage::BombExplosion(_) => MessageType::BombExplosion,
        ServerMessage::PlayerFrozen(_) => MessageType::PlayerFrozen,
        ServerMessage::PlayerConfused(_) => MessageType::PlayerConfused,
        ServerMessage::PlayerSpeedUp(_) => MessageType::PlayerSpeedUp,
        ServerMessage::PlayerShield(_) => MessageType::PlayerShield,
        ServerMessage::PlayerSlowed(_) => MessageType::PlayerSlowed,
        ServerMessage::EffectEnded(_) => MessageType::EffectEnded,
        ServerMessage::TrapWarning(_) => MessageType::TrapWarning,
        ServerMessage::PlayerTrapHit(_) => MessageType::PlayerTrapHit,
        ServerMessage::PlayerTeleported(_) => MessageType::PlayerTeleported,
        ServerMessage::PlayerEliminated(_) => MessageType::PlayerEliminated,
        ServerMessage::PlayerRevived(_) => MessageType::PlayerRevived,
        ServerMessage::EnemyKilled(_) => MessageType::EnemyKilled,
        ServerMessage::PlayerEnemyHit(_) => MessageType::PlayerEnemyHit,
    }
}

/// Encode a `ServerMessage` to wire format.
pub fn encode_server_message(msg: &ServerMessage) -> Result<Vec<u8>, ProtocolError> {
    let t = server_message_type(msg);
    match msg {
        ServerMessage::GameState(m) => encode_message(t, m),
        ServerMessage::GameUpdate(m) => encode_message(t, m),
        ServerMessage::MapReset(m) => encode_message(t, m),
        ServerMessage::MapSize(m) => encode_message(t, m),
        ServerMessage::PlayerIdAssigned(m) | ServerMessage::PlayerLeft(m) => encode_message(t, m),
        ServerMessage::GameLevel(m) | ServerMessage::LevelUp(m) => encode_message(t, m),
        ServerMessage::ServerFull(m) => encode_message(t, m),
        ServerMessage::PlayerJoined(m) => encode_message(t, m),
        ServerMessage::DotEaten(m) | ServerMessage::PowerPelletEaten(m) => encode_message(t, m),
        ServerMessage::ItemCollected(m) => encode_message(t, m),
        ServerMessage::ItemAcquired(m) => encode_message(t, m),
        ServerMessage::NewItem(m) => encode_message(t, m),
        ServerMessage::ItemUsed(m) => encode_message(t, m),
        ServerMessage::BombExplosion(m) => encode_message(t, m),
        ServerMessage::PlayerFrozen(m)
        | ServerMessage::PlayerConfused(m)
        | ServerMessage::PlayerSpeedUp(m)
        | ServerMessage::PlayerShield(m)
        | ServerMessage::PlayerSlowed(m) => encode_message(t, m),
        ServerMessage::EffectEnded(m) => encode_message(t, m),
        ServerMessage::TrapWarning(m) => encode_message(t, m),
        ServerMessage::PlayerTrapHit(m) => encode_message(t, m),
        ServerMessage::PlayerTeleported(m) => encode_message(t, m),
        ServerMessage::PlayerEliminated(m) => encode_message(t, m),
        ServerMessage::PlayerRevived(m) => encode_message(t, m),
        ServerMessage::EnemyKilled(m) => encode_message(t, m),
        ServerMessage::PlayerEnemyHit(m) => encode_message(t, m),
    }
}

/// Extract the message type byte from raw wire data.
pub fn decode_message_type(data: &[u8]) -> Result<MessageType, ProtocolError> {
    let Some(&first) = data.first() else {
        return Err(ProtocolError::EmptyMessage);
    };
    MessageType::from_byte(first).ok_or(ProtocolError::UnknownMessageType(first))
}

/// Decode a MessagePack payload (bytes after the type prefix).
pub fn decode_payload<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, ProtocolError> {
    if data.is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    rmp_serde::from_slice(&data[1..]).map_err(|e| ProtocolError::DeserializeError(e.to_string()))
}

/// Decode raw wire data into a `ClientMessage`.
pub fn decode_client_message(data: &[u8]) -> Result<ClientMessage, ProtocolError> {
    let msg_type = decode_message_type(data)?;
    match msg_type {
        MessageType::Join => Ok(ClientMessage::Join(decode_payload::<JoinMsg>(data)?)),
        MessageType::ScreenSize => Ok(ClientMessage::ScreenSize(decode_payload::<
            ScreenSizeMsg,
        >(data)?)),
        MessageType::Move => Ok(ClientMessage::Move(decode_payload::<MoveMsg>(data)?)),
        MessageType::UseItem => Ok(ClientMessage::UseItem(decode_payload::<UseItemMsg>(data)?)),
        _ => Err(ProtocolError::UnknownMessageType(data[0])),
    }
}

/// Decode raw wire data into a `ServerMessage`.
pub fn decode_server_message(data: &[u8]) -> Result<ServerMessage, ProtocolError> {
    let msg_type = decode_message_type(data)?;
    let msg = match msg_type {
        MessageType::GameState => {
            ServerMessage::GameState(Box::new(decode_payload::<GameStateMsg>(data)?))
        },
        MessageType::GameUpdate => {
            ServerMessage::GameUpdate(decode_payload::<GameUpdateMsg>(data)?)
        },
        MessageType::MapReset => ServerMessage::MapReset(decode_payload::<MapResetMsg>(data)?),
        MessageType::MapSize => ServerMessage::MapSize(decode_payload::<MapSizeMsg>(data)?),
        MessageType::PlayerIdAssigned => {
            ServerMessage::PlayerIdAssigned(decode_payload::<PlayerIdMsg>(data)?)
        },
        MessageType::GameLevel => ServerMessage::GameLevel(decode_payload::<LevelMsg>(data)?),
        MessageType::LevelUp => ServerMessage::LevelUp(decode_payload::<LevelMsg>(data)?),
        MessageType::ServerFull => {
            ServerMessage::ServerFull(decode_payload::<ServerFullMsg>(data)?)
        },
        MessageType::PlayerJoined => {
            ServerMessage::PlayerJoined(Box::new(decode_payload::<PlayerJoinedMsg>(data)?))
        },
        MessageType::PlayerLeft => ServerMessage::PlayerLeft(decode_payload::<PlayerIdMsg>(data)?),
        MessageType::DotEaten => ServerMessage::DotEaten(decode_payload::<EntityRemovedMsg>(data)?),
        MessageType::PowerPelletEaten => {
            ServerMessage::PowerPelletEaten(decode_payload::<EntityRemovedMsg>(data)?)
        },
        MessageType::ItemCollected => {
            ServerMessage::ItemCollected(decode_payload::<ItemCollectedMsg>(data)?)
        },
        MessageType::ItemAcquired => {
            ServerMessage::ItemAcquired(decode_payload::<ItemAcquiredMsg>(data)?)
        },
        MessageType::NewItem => ServerMessage::NewItem(decode_payload::<NewItemMsg>(data)?),
        MessageType::ItemUsed => ServerMessage::ItemUsed(decode_payload::<ItemUsedMsg>(data)?),
        MessageType::BombExplosion => {
            ServerMessage::BombExplosion(decode_payload::<BombExplosionMsg>(data)?)
        },
        MessageType::PlayerFrozen => {
            ServerMessage::PlayerFrozen(decode_payload::<EffectStartedMsg>(data)?)
        },
        MessageType::PlayerConfused => {
            ServerMessage::PlayerConfused(decode_payload::<EffectStartedMsg>(data)?)
        },
        MessageType::PlayerSpeedUp => {
            ServerMessage::PlayerSpeedUp(decode_payload::<EffectStartedMsg>(data)?)
        },
        MessageType::PlayerShield => {
            ServerMessage::PlayerShield(decode_payload::<EffectStartedMsg>(data)?)
        },
        MessageType::PlayerSlowed => {
            ServerMessage::PlayerSlowed(decode_payload::<EffectStartedMsg>(data)?)
        },
        MessageType::EffectEnded => {
            ServerMessage::EffectEnded(decode_payload::<EffectEndedMsg>(data)?)
        },
        MessageType::TrapWarning => {
            ServerMessage::TrapWarning(decode_payload::<TrapWarningMsg>(data)?)
        },
        MessageType::PlayerTrapHit => {
            ServerMessage::PlayerTrapHit(decode_payload::<PlayerTrapHitMsg>(data)?)
        },
        MessageType::PlayerTeleported => {
            ServerMessage::PlayerTeleported(decode_payload::<PlayerTeleportedMsg>(data)?)
        },
        MessageType::PlayerEliminated => {
            ServerMessage::PlayerEliminated(decode_payload::<PlayerEliminatedMsg>(data)?)
        },
        MessageType::PlayerRevived => {
            ServerMessage::PlayerRevived(decode_payload::<PlayerRevivedMsg>(data)?)
        },
        MessageType::EnemyKilled => {
            ServerMessage::EnemyKilled(decode_payload::<EnemyKilledMsg>(data)?)
        },
        MessageType::PlayerEnemyHit => {
            ServerMessage::PlayerEnemyHit(decode_payload::<PlayerEnemyHitMsg>(data)?)
        },
        MessageType::Join | MessageType::ScreenSize | MessageType::Move | MessageType::UseItem => {
            return Err(ProtocolError::UnknownMessageType(data[0]));
        },
    };
    Ok(msg)
}
