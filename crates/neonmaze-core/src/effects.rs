use serde::{Deserialize, Serialize};

use crate::config::{EffectTable, GameTuning};
use crate::geometry::GameTime;

/// Timed status effects a player can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    SpeedUp,
    Frozen,
    Confused,
    Shield,
    Slowed,
}

impl EffectKind {
    pub const ALL: [EffectKind; 5] = [
        EffectKind::SpeedUp,
        EffectKind::Frozen,
        EffectKind::Confused,
        EffectKind::Shield,
        EffectKind::Slowed,
    ];

    /// Effects that a shield blocks from being applied.
    pub fn is_hostile(self) -> bool {
        matches!(self, Self::Frozen | Self::Confused | Self::Slowed)
    }
}

/// One effect slot: whether it is running and when it stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EffectState {
    pub active: bool,
    pub expires_at: GameTime,
}

/// All effect slots for a single player.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusEffects {
    pub speed_up: EffectState,
    pub frozen: EffectState,
    pub confused: EffectState,
    pub shield: EffectState,
    pub slowed: EffectState,
}

impl StatusEffects {
    pub fn get(&self, kind: EffectKind) -> &EffectState {
        match kind {
            EffectKind::SpeedUp => &self.speed_up,
            EffectKind::Frozen => &self.frozen,
            EffectKind::Confused => &self.confused,
            EffectKind::Shield => &self.shield,
            EffectKind::Slowed => &self.slowed,
        }
    }

    fn get_mut(&mut self, kind: EffectKind) -> &mut EffectState {
        match kind {
            EffectKind::SpeedUp => &mut self.speed_up,
            EffectKind::Frozen => &mut self.frozen,
            EffectKind::Confused => &mut self.confused,
            EffectKind::Shield => &mut self.shield,
            EffectKind::Slowed => &mut self.slowed,
        }
    }

    pub fn is_active(&self, kind: EffectKind) -> bool {
        self.get(kind).active
    }

    pub fn is_shielded(&self) -> bool {
        self.shield.active
    }

    /// Start (or refresh) an effect. The expiry only ever moves forward.
    /// Returns the effect's duration in milliseconds.
    pub fn apply(&mut self, kind: EffectKind, now: GameTime, table: &EffectTable) -> GameTime {
        let duration = table.duration(kind);
        let slot = self.get_mut(kind);
        slot.active = true;
        slot.expires_at = slot.expires_at.max(now.saturating_add(duration));
        duration
    }

    /// Apply an effect inflicted by someone else. Hostile effects bounce off
    /// an active shield; returns the duration when the effect landed.
    pub fn inflict(
        &mut self,
        kind: EffectKind,
        now: GameTime,
        table: &EffectTable,
    ) -> Option<GameTime> {
        if kind.is_hostile() && self.is_shielded() {
            return None;
        }
        Some(self.apply(kind, now, table))
    }

    /// Deactivate every effect whose expiry has passed, returning the kinds
    /// that ended this call.
    pub fn expire(&mut self, now: GameTime) -> Vec<EffectKind> {
        let mut ended = Vec::new();
        for kind in EffectKind::ALL {
            let slot = self.get_mut(kind);
            if slot.active && now > slot.expires_at {
                slot.active = false;
                ended.push(kind);
            }
        }
        ended
    }

    /// Turn every effect off. Expiry stamps are left as they were.
    pub fn clear(&mut self) {
        for kind in EffectKind::ALL {
            self.get_mut(kind).active = false;
        }
    }

    /// Movement speed after slow and speed-up multipliers. The two compose.
    pub fn movement_speed(&self, tuning: &GameTuning) -> f32 {
        let mut speed = tuning.player_base_speed;
        if self.slowed.active {
            speed *= tuning.slow_multiplier;
        }
        if self.speed_up.active {
            speed *= tuning.speed_up_multiplier;
        }
        speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_sets_expiry_from_table() {
        let table = EffectTable::default();
        let mut fx = StatusEffects::default();
        let dur = fx.apply(EffectKind::Frozen, 1000, &table);
        assert_eq!(dur, 3000);
        assert!(fx.is_active(EffectKind::Frozen));
        assert_eq!(fx.frozen.expires_at, 4000);
    }

    #[test]
    fn reapply_only_extends() {
        let table = EffectTable::default();
        let mut fx = StatusEffects::default();
        fx.apply(EffectKind::Shield, 5000, &table);
        fx.apply(EffectKind::Shield, 6000, &table);
        assert_eq!(fx.shield.expires_at, 16_000);
        // An earlier clock never pulls the stamp back.
        fx.apply(EffectKind::Shield, 0, &table);
        assert_eq!(fx.shield.expires_at, 16_000);
    }

    #[test]
    fn expire_is_strictly_after() {
        let table = EffectTable::default();
        let mut fx = StatusEffects::default();
        fx.apply(EffectKind::Confused, 0, &table);
        assert!(fx.expire(7000).is_empty());
        assert_eq!(fx.expire(7001), vec![EffectKind::Confused]);
        assert!(!fx.is_active(EffectKind::Confused));
        // Already ended: no second notification.
        assert!(fx.expire(9000).is_empty());
    }

    #[test]
    fn shield_blocks_hostile_effects_only() {
        let table = EffectTable::default();
        let mut fx = StatusEffects::default();
        fx.apply(EffectKind::Shield, 0, &table);
        assert_eq!(fx.inflict(EffectKind::Frozen, 10, &table), None);
        assert_eq!(fx.inflict(EffectKind::Confused, 10, &table), None);
        assert_eq!(fx.inflict(EffectKind::Slowed, 10, &table), None);
        assert_eq!(fx.inflict(EffectKind::SpeedUp, 10, &table), Some(5000));
        assert!(!fx.is_active(EffectKind::Frozen));
    }

    #[test]
    fn speed_multipliers_compose() {
        let tuning = GameTuning::default();
        let table = &tuning.effects;
        let mut fx = StatusEffects::default();
        assert!((fx.movement_speed(&tuning) - 5.0).abs() < f32::EPSILON);
        fx.apply(EffectKind::Slowed, 0, table);
        assert!((fx.movement_speed(&tuning) - 2.5).abs() < f32::EPSILON);
        fx.apply(EffectKind::SpeedUp, 0, table);
        assert!((fx.movement_speed(&tuning) - 3.75).abs() < f32::EPSILON);
    }

    #[test]
    fn clear_keeps_stamps() {
        let table = EffectTable::default();
        let mut fx = StatusEffects::default();
        fx.apply(EffectKind::Slowed, 100, &table);
        fx.clear();
        assert!(!fx.is_active(EffectKind::Slowed));
        assert_eq!(fx.slowed.expires_at, 5100);
    }
}
