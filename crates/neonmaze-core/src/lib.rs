pub mod ai;
pub mod collision;
pub mod config;
pub mod effects;
pub mod entities;
pub mod geometry;
pub mod inventory;
pub mod lifecycle;
pub mod map_gen;
pub mod net;
pub mod simulation;
pub mod world;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::config::GameTuning;
    use crate::entities::{AiEnemy, Consumable, EnemyKind, EntityId, NeonColor, Player, PlayerId};
    use crate::geometry::{Direction, MapBounds, Position};
    use crate::net::messages::{ClientMessage, JoinMsg};
    use crate::net::protocol::PROTOCOL_VERSION;
    use crate::simulation::{Command, Simulation};
    use crate::world::WorldState;

    /// Seed shared by staged simulations.
    pub const TEST_SEED: u64 = 7;

    /// Tuning with no pellets, items, traps or random spawns. Dots are left
    /// at their normal density so regenerated rounds are playable.
    pub fn quiet_tuning() -> GameTuning {
        GameTuning {
            power_pellet_count: 0,
            base_item_count: 0,
            base_trap_count: 0,
            item_spawn_chance_per_level: 0.0,
            trap_spawn_chance_per_level: 0.0,
            ..GameTuning::default()
        }
    }

    /// A world at the tuning's largest size with nothing in it.
    pub fn empty_world(tuning: &GameTuning) -> WorldState {
        WorldState::new(MapBounds::new(
            tuning.max_map_width,
            tuning.max_map_height,
            tuning.cell_size,
        ))
    }

    /// Insert a standing player directly, bypassing the join handshake.
    pub fn add_player(world: &mut WorldState, id: PlayerId, position: Position) {
        let mut player = Player::new(id, format!("Player{id}"), NeonColor::default(), position);
        player.direction = Direction::None;
        world.players.insert(id, player);
    }

    /// Insert a stationary enemy that has never made a decision.
    pub fn add_enemy(world: &mut WorldState, id: EntityId, kind: EnemyKind, position: Position) {
        world.enemies.insert(
            id,
            AiEnemy {
                id,
                kind,
                position,
                direction: Direction::None,
                speed: 3.0,
                color: kind.color(),
                last_decision_at: 0,
                guard: None,
            },
        );
    }

    /// Queue a join with the default name.
    pub fn join(sim: &mut Simulation, player_id: PlayerId) {
        sim.submit(Command::Client {
            player_id,
            message: ClientMessage::Join(JoinMsg {
                name: None,
                protocol_version: PROTOCOL_VERSION,
            }),
        });
    }

    /// A simulation holding exactly one dot in the top-left cell and one
    /// standing player (id 1) at the map center. Returns the dot's id.
    pub fn staged_simulation(tuning: GameTuning) -> (Simulation, EntityId) {
        let mut sim = Simulation::new(tuning, TEST_SEED, 33);
        let world = sim.world_mut();
        world.clear_transients();
        let dot_id = world.alloc_id();
        let cs = world.bounds.cell_size;
        world.dots.insert(
            dot_id,
            Consumable {
                id: dot_id,
                position: Position::new(cs, cs),
                value: 10,
            },
        );
        let (w, h) = world.bounds.extent();
        add_player(world, 1, Position::new(w / 2.0, h / 2.0));
        (sim, dot_id)
    }
}
