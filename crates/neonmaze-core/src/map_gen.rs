use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;

use crate::config::GameTuning;
use crate::entities::{
    AiEnemy, Consumable, EnemyKind, EntityId, GuardPost, Item, ItemKind, Trap, TrapKind,
};
use crate::geometry::{Cell, Direction, GameTime, MapBounds};
use crate::world::WorldState;

/// Which cells already hold something during placement.
#[derive(Debug, Default)]
struct CellIndex {
    dots: BTreeMap<Cell, EntityId>,
    blocked: BTreeSet<Cell>,
}

impl CellIndex {
    /// Index a live world. With `dots_block` set, dot cells count as occupied.
    fn from_world(world: &WorldState, dots_block: bool) -> Self {
        let cs = world.bounds.cell_size;
        let mut index = Self::default();
        for dot in world.dots.values() {
            let cell = Cell::containing(dot.position, cs);
            index.dots.insert(cell, dot.id);
            if dots_block {
                index.blocked.insert(cell);
            }
        }
        let others = world
            .power_pellets
            .values()
            .map(|p| p.position)
            .chain(world.items.values().map(|i| i.position))
            .chain(world.traps.values().map(|t| t.position));
        for pos in others {
            index.blocked.insert(Cell::containing(pos, cs));
        }
        index
    }

    /// Bounded-retry search for an unblocked interior cell.
    fn free_cell(&self, bounds: &MapBounds, attempts: u32, rng: &mut impl Rng) -> Option<Cell> {
        (0..attempts)
            .map(|_| bounds.random_interior_cell(rng))
            .find(|cell| !self.blocked.contains(cell))
    }

    /// Claim a cell, evicting whatever dot sat there.
    fn claim(&mut self, world: &mut WorldState, cell: Cell) {
        if let Some(dot_id) = self.dots.remove(&cell) {
            world.dots.remove(&dot_id);
        }
        self.blocked.insert(cell);
    }
}

/// Wipe and repopulate every per-round collection for the world's current
/// bounds and level. Individual placements that run out of attempts are
/// skipped.
pub fn generate(world: &mut WorldState, tuning: &GameTuning, rng: &mut impl Rng, now: GameTime) {
    world.clear_transients();
    let bounds = world.bounds;
    let cs = bounds.cell_size;
    let level = world.level;
    let mut index = CellIndex::default();

    let empty_chance = tuning.dot_empty_chance(level);
    for cell in bounds.interior_cells() {
        if rng.random::<f64>() > empty_chance {
            let id = world.alloc_id();
            world.dots.insert(
                id,
                Consumable {
                    id,
                    position: cell.position(cs),
                    value: tuning.dot_value,
                },
            );
            index.dots.insert(cell, id);
        }
    }

    for _ in 0..tuning.power_pellet_count {
        let Some(cell) = index.free_cell(&bounds, tuning.placement_attempts, rng) else {
            continue;
        };
        index.claim(world, cell);
        let id = world.alloc_id();
        world.power_pellets.insert(
            id,
            Consumable {
                id,
                position: cell.position(cs),
                value: tuning.power_pellet_value,
            },
        );
    }

    for _ in 0..tuning.item_count(level) {
        place_item(world, &mut index, tuning, rng);
    }
    for _ in 0..tuning.trap_count(level) {
        place_trap(world, &mut index, tuning, rng);
    }
    for _ in 0..tuning.enemy_count(level) {
        spawn_enemy(world, tuning, rng, now);
    }

    tracing::debug!(
        level,
        dots = world.dots.len(),
        pellets = world.power_pellets.len(),
        items = world.items.len(),
        traps = world.traps.len(),
        enemies = world.enemies.len(),
        "map generated"
    );
}

/// Place one random item on a free cell mid-round. Dots block, so nothing
/// visible disappears.
pub fn spawn_item(
    world: &mut WorldState,
    tuning: &GameTuning,
    rng: &mut impl Rng,
) -> Option<EntityId> {
    let mut index = CellIndex::from_world(world, true);
    place_item(world, &mut index, tuning, rng)
}

/// Place one hidden trap on a free cell mid-round.
pub fn spawn_trap(
    world: &mut WorldState,
    tuning: &GameTuning,
    rng: &mut impl Rng,
) -> Option<EntityId> {
    let mut index = CellIndex::from_world(world, true);
    place_trap(world, &mut index, tuning, rng)
}

/// Difficulty-weighted trap roll: spikes grow more common with level.
pub fn roll_trap_kind(tuning: &GameTuning, level: u32, rng: &mut impl Rng) -> TrapKind {
    let roll = rng.random::<f64>();
    let spike_chance = tuning.spike_base_chance + f64::from(level) * tuning.spike_chance_per_level;
    if roll < spike_chance {
        TrapKind::Spike
    } else if roll < tuning.slow_upper_bound {
        TrapKind::Slow
    } else {
        TrapKind::Teleport
    }
}

fn place_item(
    world: &mut WorldState,
    index: &mut CellIndex,
    tuning: &GameTuning,
    rng: &mut impl Rng,
) -> Option<EntityId> {
    let cell = index.free_cell(&world.bounds, tuning.placement_attempts, rng)?;
    index.claim(world, cell);
    let kind = ItemKind::ALL[rng.random_range(0..ItemKind::ALL.len())];
    let id = world.alloc_id();
    world.items.insert(
        id,
        Item {
            id,
            kind,
            position: cell.position(world.bounds.cell_size),
        },
    );
    Some(id)
}

fn place_trap(
    world: &mut WorldState,
    index: &mut CellIndex,
    tuning: &GameTuning,
    rng: &mut impl Rng,
) -> Option<EntityId> {
    let cell = index.free_cell(&world.bounds, tuning.placement_attempts, rng)?;
    index.claim(world, cell);
    let kind = roll_trap_kind(tuning, world.level, rng);
    let id = world.alloc_id();
    world.traps.insert(
        id,
        Trap {
            id,
            kind,
            position: cell.position(world.bounds.cell_size),
            detection_radius: tuning.trap_detection_radius(),
        },
    );
    Some(id)
}

fn spawn_enemy(world: &mut WorldState, tuning: &GameTuning, rng: &mut impl Rng, now: GameTime) {
    let position = world.bounds.random_position(rng);
    let kind = EnemyKind::ALL[rng.random_range(0..EnemyKind::ALL.len())];
    let direction = Direction::random(rng);
    let guard = (kind == EnemyKind::Guardian).then(|| GuardPost {
        home: position,
        leash_radius: tuning.guardian_leash_radius(),
    });
    let id = world.alloc_id();
    world.enemies.insert(
        id,
        AiEnemy {
            id,
            kind,
            position,
            direction,
            speed: tuning.enemy_speed(world.level),
            color: kind.color(),
            last_decision_at: now,
            guard,
        },
    );
}
