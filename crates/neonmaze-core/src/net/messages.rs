use serde::{Deserialize, Serialize};

use crate::effects::EffectKind;
use crate::entities::{
    AiEnemy, Consumable, EnemyKind, EntityId, Item, ItemKind, Player, PlayerId, TrapKind,
};
use crate::geometry::{Direction, Position};

/// Network message type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    // Client -> Server
    Join = 0x01,
    ScreenSize = 0x02,
    Move = 0x03,
    UseItem = 0x04,

    // Server -> Client: world snapshots and session
    GameState = 0x10,
    GameUpdate = 0x11,
    MapReset = 0x12,
    MapSize = 0x13,
    PlayerIdAssigned = 0x14,
    GameLevel = 0x15,
    LevelUp = 0x16,
    ServerFull = 0x17,

    // Server -> Client: roster
    PlayerJoined = 0x20,
    PlayerLeft = 0x21,

    // Server -> Client: pickups and items
    DotEaten = 0x30,
    PowerPelletEaten = 0x31,
    ItemCollected = 0x32,
    ItemAcquired = 0x33,
    NewItem = 0x34,
    ItemUsed = 0x35,
    BombExplosion = 0x36,

    // Server -> Client: status effects
    PlayerFrozen = 0x40,
    PlayerConfused = 0x41,
    PlayerSpeedUp = 0x42,
    PlayerShield = 0x43,
    PlayerSlowed = 0x44,
    EffectEnded = 0x45,

    // Server -> Client: hazards
    TrapWarning = 0x50,
    PlayerTrapHit = 0x51,
    PlayerTeleported = 0x52,
    PlayerEliminated = 0x53,
    PlayerRevived = 0x54,
    EnemyKilled = 0x55,
    PlayerEnemyHit = 0x56,
}

impl MessageType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::Join),
            0x02 => Some(Self::ScreenSize),
            0x03 => Some(Self::Move),
            0x04 => Some(Self::UseItem),
            0x10 => Some(Self::GameState),
            0x11 => Some(Self::GameUpdate),
            0x12 => Some(Self::MapReset),
            0x13 => Some(Self::MapSize),
            0x14 => Some(Self::PlayerIdAssigned),
            0x15 => Some(Self::GameLevel),
            0x16 => Some(Self::LevelUp),
            0x17 => Some(Self::ServerFull),
            0x20 => Some(Self::PlayerJoined),
            0x21 => Some(Self::PlayerLeft),
            0x30 => Some(Self::DotEaten),
            0x31 => Some(Self::PowerPelletEaten),
            0x32 => Some(Self::ItemCollected),
            0x33 => Some(Self::ItemAcquired),
            0x34 => Some(Self::NewItem),
            0x35 => Some(Self::ItemUsed),
            0x36 => Some(Self::BombExplosion),
            0x40 => Some(Self::PlayerFrozen),
            0x41 => Some(Self::PlayerConfused),
            0x42 => Some(Self::PlayerSpeedUp),
            0x43 => Some(Self::PlayerShield),
            0x44 => Some(Self::PlayerSlowed),
            0x45 => Some(Self::EffectEnded),
            0x50 => Some(Self::TrapWarning),
            0x51 => Some(Self::PlayerTrapHit),
            0x52 => Some(Self::PlayerTeleported),
            0x53 => Some(Self::PlayerEliminated),
            0x54 => Some(Self::PlayerRevived),
            0x55 => Some(Self::EnemyKilled),
            0x56 => Some(Self::PlayerEnemyHit),
            _ => None,
        }
    }

    /// Whether only the server may send this type.
    pub fn is_server_only(self) -> bool {
        (self as u8) >= 0x10
    }
}

// ============================================================================
// Client -> Server
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientMessage {
    Join(JoinMsg),
    ScreenSize(ScreenSizeMsg),
    Move(MoveMsg),
    UseItem(UseItemMsg),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinMsg {
    pub name: Option<String>,
    pub protocol_version: u8,
}

/// Client viewport in pixels; the server derives map dimensions from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenSizeMsg {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveMsg {
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseItemMsg {
    pub item_kind: ItemKind,
    pub target: Position,
}

// ============================================================================
// Server -> Client
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    GameState(Box<GameStateMsg>),
    GameUpdate(GameUpdateMsg),
    MapReset(MapResetMsg),
    MapSize(MapSizeMsg),
    PlayerIdAssigned(PlayerIdMsg),
    GameLevel(LevelMsg),
    LevelUp(LevelMsg),
    ServerFull(ServerFullMsg),
    PlayerJoined(Box<PlayerJoinedMsg>),
    PlayerLeft(PlayerIdMsg),
    DotEaten(EntityRemovedMsg),
    PowerPelletEaten(EntityRemovedMsg),
    ItemCollected(ItemCollectedMsg),
    ItemAcquired(ItemAcquiredMsg),
    NewItem(NewItemMsg),
    ItemUsed(ItemUsedMsg),
    BombExplosion(BombExplosionMsg),
    PlayerFrozen(EffectStartedMsg),
    PlayerConfused(EffectStartedMsg),
    PlayerSpeedUp(EffectStartedMsg),
    PlayerShield(EffectStartedMsg),
    PlayerSlowed(EffectStartedMsg),
    EffectEnded(EffectEndedMsg),
    TrapWarning(TrapWarningMsg),
    PlayerTrapHit(PlayerTrapHitMsg),
    PlayerTeleported(PlayerTeleportedMsg),
    PlayerEliminated(PlayerEliminatedMsg),
    PlayerRevived(PlayerRevivedMsg),
    EnemyKilled(EnemyKilledMsg),
    PlayerEnemyHit(PlayerEnemyHitMsg),
}

impl ServerMessage {
    /// Private notice announcing that `kind` started on the recipient.
    pub fn effect_started(kind: EffectKind, duration_ms: u64) -> Self {
        let msg = EffectStartedMsg { duration_ms };
        match kind {
            EffectKind::Frozen => Self::PlayerFrozen(msg),
            EffectKind::Confused => Self::PlayerConfused(msg),
            EffectKind::SpeedUp => Self::PlayerSpeedUp(msg),
            EffectKind::Shield => Self::PlayerShield(msg),
            EffectKind::Slowed => Self::PlayerSlowed(msg),
        }
    }
}

/// Full world snapshot sent privately on join. Trap positions are never
/// included; only their count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStateMsg {
    pub map: MapSizeMsg,
    pub players: Vec<Player>,
    pub dots: Vec<Consumable>,
    pub power_pellets: Vec<Consumable>,
    pub items: Vec<Item>,
    pub enemies: Vec<AiEnemy>,
    pub trap_count: u32,
    pub level: u32,
    pub rounds_completed: u32,
}

/// Per-tick delta broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameUpdateMsg {
    pub tick: u64,
    pub players: Vec<Player>,
    pub items: Vec<Item>,
    pub enemies: Vec<AiEnemy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapResetMsg {
    pub dots: Vec<Consumable>,
    pub power_pellets: Vec<Consumable>,
    pub items: Vec<Item>,
    pub trap_count: u32,
    pub level: u32,
}

/// Map extent in map units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSizeMsg {
    pub width: f32,
    pub height: f32,
    pub cell_size: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerIdMsg {
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelMsg {
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerFullMsg {
    pub max_players: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerJoinedMsg {
    pub player: Player,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRemovedMsg {
    pub id: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCollectedMsg {
    pub item_id: EntityId,
    pub player_id: PlayerId,
    pub item_kind: ItemKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAcquiredMsg {
    pub item_kind: ItemKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItemMsg {
    pub item: Item,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemUsedMsg {
    pub player_id: PlayerId,
    pub item_kind: ItemKind,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BombExplosionMsg {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectStartedMsg {
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectEndedMsg {
    pub effect: EffectKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrapWarningMsg {
    pub x: f32,
    pub y: f32,
    pub distance: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerTrapHitMsg {
    pub player_id: PlayerId,
    pub trap_id: EntityId,
    pub trap_kind: TrapKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerTeleportedMsg {
    pub from: Position,
    pub to: Position,
}

/// What eliminated a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EliminationCause {
    Trap { trap_kind: TrapKind },
    Enemy { enemy_kind: EnemyKind },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEliminatedMsg {
    pub cause: EliminationCause,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRevivedMsg {
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyKilledMsg {
    pub enemy_id: EntityId,
    pub player_id: PlayerId,
    pub score_gained: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEnemyHitMsg {
    pub player_id: PlayerId,
    pub enemy_id: EntityId,
    pub enemy_kind: EnemyKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_type_bytes_roundtrip() {
        for b in 0u8..=0xFF {
            if let Some(t) = MessageType::from_byte(b) {
                assert_eq!(t as u8, b);
            }
        }
    }

    #[test]
    fn client_types_are_not_server_only() {
        assert!(!MessageType::Join.is_server_only());
        assert!(!MessageType::UseItem.is_server_only());
        assert!(MessageType::GameUpdate.is_server_only());
        assert!(MessageType::PlayerEnemyHit.is_server_only());
    }

    #[test]
    fn effect_started_picks_variant() {
        assert!(matches!(
            ServerMessage::effect_started(EffectKind::Frozen, 3000),
            ServerMessage::PlayerFrozen(EffectStartedMsg { duration_ms: 3000 })
        ));
        assert!(matches!(
            ServerMessage::effect_started(EffectKind::Slowed, 5000),
            ServerMessage::PlayerSlowed(_)
        ));
    }
}
