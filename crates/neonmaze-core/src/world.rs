use std::collections::BTreeMap;

use crate::entities::{AiEnemy, Consumable, EntityId, Item, Player, PlayerId, Trap};
use crate::geometry::MapBounds;
use crate::net::messages::{GameStateMsg, GameUpdateMsg, MapResetMsg, MapSizeMsg};

/// The single authoritative aggregate. Everything the tick touches lives here.
///
/// Collections are `BTreeMap`s so iteration order, and therefore the outbound
/// message stream, is a pure function of the seed and the command stream.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldState {
    pub bounds: MapBounds,
    pub players: BTreeMap<PlayerId, Player>,
    pub dots: BTreeMap<EntityId, Consumable>,
    pub power_pellets: BTreeMap<EntityId, Consumable>,
    pub items: BTreeMap<EntityId, Item>,
    pub traps: BTreeMap<EntityId, Trap>,
    pub enemies: BTreeMap<EntityId, AiEnemy>,
    pub level: u32,
    pub rounds_completed: u32,
    next_entity_id: EntityId,
}

impl WorldState {
    pub fn new(bounds: MapBounds) -> Self {
        Self {
            bounds,
            players: BTreeMap::new(),
            dots: BTreeMap::new(),
            power_pellets: BTreeMap::new(),
            items: BTreeMap::new(),
            traps: BTreeMap::new(),
            enemies: BTreeMap::new(),
            level: 1,
            rounds_completed: 0,
            next_entity_id: 1,
        }
    }

    /// Allocate a fresh entity id. Ids are never reused.
    pub fn alloc_id(&mut self) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }

    /// Drop every per-round collection. Players survive.
    pub fn clear_transients(&mut self) {
        self.dots.clear();
        self.power_pellets.clear();
        self.items.clear();
        self.traps.clear();
        self.enemies.clear();
    }

    pub fn living_player_count(&self) -> usize {
        self.players.values().filter(|p| p.alive).count()
    }

    pub fn map_size_msg(&self) -> MapSizeMsg {
        let (width, height) = self.bounds.extent();
        MapSizeMsg {
            width,
            height,
            cell_size: self.bounds.cell_size,
        }
    }

    pub fn game_state_msg(&self) -> GameStateMsg {
        GameStateMsg {
            map: self.map_size_msg(),
            players: self.players.values().cloned().collect(),
            dots: self.dots.values().cloned().collect(),
            power_pellets: self.power_pellets.values().cloned().collect(),
            items: self.items.values().cloned().collect(),
            enemies: self.enemies.values().cloned().collect(),
            trap_count: self.traps.len() as u32,
            level: self.level,
            rounds_completed: self.rounds_completed,
        }
    }

    pub fn game_update_msg(&self, tick: u64) -> GameUpdateMsg {
        GameUpdateMsg {
            tick,
            players: self.players.values().cloned().collect(),
            items: self.items.values().cloned().collect(),
            enemies: self.enemies.values().cloned().collect(),
        }
    }

    pub fn map_reset_msg(&self) -> MapResetMsg {
        MapResetMsg {
            dots: self.dots.values().cloned().collect(),
            power_pellets: self.power_pellets.values().cloned().collect(),
            items: self.items.values().cloned().collect(),
            trap_count: self.traps.len() as u32,
            level: self.level,
        }
    }
}
