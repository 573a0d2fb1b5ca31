use serde::{Deserialize, Serialize};

use crate::effects::{EffectKind, StatusEffects};
use crate::geometry::{Direction, GameTime, Position};
use crate::inventory::Inventory;

/// Connection-scoped player identifier, assigned by the host.
pub type PlayerId = u64;

/// Identifier for every non-player entity. Unique across all collections of a
/// world for the lifetime of the process.
pub type EntityId = u64;

/// Display color for players and enemies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeonColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Default for NeonColor {
    fn default() -> Self {
        Self::PALETTE[0]
    }
}

impl NeonColor {
    /// Palette players are drawn from on join.
    pub const PALETTE: &[NeonColor] = &[
        NeonColor {
            r: 255,
            g: 0,
            b: 255,
        }, // Magenta
        NeonColor {
            r: 0,
            g: 255,
            b: 255,
        }, // Cyan
        NeonColor { r: 255, g: 0, b: 0 }, // Red
        NeonColor { r: 0, g: 255, b: 0 }, // Green
        NeonColor { r: 0, g: 0, b: 255 }, // Blue
        NeonColor {
            r: 255,
            g: 255,
            b: 0,
        }, // Yellow
    ];
}

/// Pickups that become an inventory charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Bomb,
    SpeedUp,
    Freeze,
    Confusion,
    Shield,
}

impl ItemKind {
    pub const ALL: [ItemKind; 5] = [
        ItemKind::Bomb,
        ItemKind::SpeedUp,
        ItemKind::Freeze,
        ItemKind::Confusion,
        ItemKind::Shield,
    ];

    /// Status effect the item stamps when used, if any.
    pub fn effect(self) -> Option<EffectKind> {
        match self {
            Self::Bomb => None,
            Self::SpeedUp => Some(EffectKind::SpeedUp),
            Self::Freeze => Some(EffectKind::Frozen),
            Self::Confusion => Some(EffectKind::Confused),
            Self::Shield => Some(EffectKind::Shield),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrapKind {
    /// Lethal on contact.
    Spike,
    Slow,
    Teleport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Chaser,
    Wanderer,
    Guardian,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 3] = [EnemyKind::Chaser, EnemyKind::Wanderer, EnemyKind::Guardian];

    pub fn color(self) -> NeonColor {
        match self {
            Self::Chaser => NeonColor {
                r: 255,
                g: 51,
                b: 51,
            },
            Self::Wanderer => NeonColor {
                r: 255,
                g: 204,
                b: 0,
            },
            Self::Guardian => NeonColor {
                r: 51,
                g: 153,
                b: 255,
            },
        }
    }
}

/// A dot or power pellet. Destroyed on pickup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consumable {
    pub id: EntityId,
    pub position: Position,
    pub value: u64,
}

/// A pickup that grants one inventory charge of its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: EntityId,
    pub kind: ItemKind,
    pub position: Position,
}

/// Hidden single-use hazard. Never serialized to clients.
#[derive(Debug, Clone, PartialEq)]
pub struct Trap {
    pub id: EntityId,
    pub kind: TrapKind,
    pub position: Position,
    pub detection_radius: f32,
}

/// Home point a guardian is leashed to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuardPost {
    pub home: Position,
    pub leash_radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiEnemy {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub position: Position,
    pub direction: Direction,
    pub speed: f32,
    pub color: NeonColor,
    /// Clock value of the last direction decision.
    #[serde(skip)]
    pub last_decision_at: GameTime,
    pub guard: Option<GuardPost>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: NeonColor,
    pub position: Position,
    pub direction: Direction,
    pub score: u64,
    pub alive: bool,
    pub powered: bool,
    /// Milliseconds of powered state left; meaningless while `powered` is false.
    pub powered_remaining_ms: i64,
    pub effects: StatusEffects,
    pub inventory: Inventory,
}

impl Player {
    pub fn new(id: PlayerId, name: String, color: NeonColor, position: Position) -> Self {
        Self {
            id,
            name,
            color,
            position,
            direction: Direction::Right,
            score: 0,
            alive: true,
            powered: false,
            powered_remaining_ms: 0,
            effects: StatusEffects::default(),
            inventory: Inventory::default(),
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.effects.is_active(EffectKind::Frozen)
    }

    pub fn is_shielded(&self) -> bool {
        self.effects.is_shielded()
    }

    /// Start (or restart) the powered window.
    pub fn power_up(&mut self, duration_ms: i64) {
        self.powered = true;
        self.powered_remaining_ms = duration_ms;
    }

    /// Count down the powered window by one tick.
    pub fn drain_power(&mut self, elapsed_ms: i64) {
        if !self.powered {
            return;
        }
        self.powered_remaining_ms -= elapsed_ms;
        if self.powered_remaining_ms <= 0 {
            self.powered = false;
            self.powered_remaining_ms = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_effect_table() {
        assert_eq!(ItemKind::Bomb.effect(), None);
        assert_eq!(ItemKind::Freeze.effect(), Some(EffectKind::Frozen));
        assert_eq!(ItemKind::Confusion.effect(), Some(EffectKind::Confused));
        assert_eq!(ItemKind::SpeedUp.effect(), Some(EffectKind::SpeedUp));
        assert_eq!(ItemKind::Shield.effect(), Some(EffectKind::Shield));
    }

    #[test]
    fn powered_window_runs_out() {
        let mut p = Player::new(1, "P".into(), NeonColor::default(), Position::default());
        p.power_up(100);
        p.drain_power(60);
        assert!(p.powered);
        p.drain_power(60);
        assert!(!p.powered);
        assert_eq!(p.powered_remaining_ms, 0);
    }

    #[test]
    fn enemy_colors_are_distinct() {
        let colors: Vec<_> = EnemyKind::ALL.iter().map(|k| k.color()).collect();
        assert_ne!(colors[0], colors[1]);
        assert_ne!(colors[1], colors[2]);
        assert_ne!(colors[0], colors[2]);
    }
}
