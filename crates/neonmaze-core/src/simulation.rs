use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ai;
use crate::collision::{is_colliding, proximity};
use crate::config::{GameTuning, chance};
use crate::effects::EffectKind;
use crate::entities::{EntityId, NeonColor, Player, PlayerId};
use crate::geometry::{GameTime, MapBounds};
use crate::inventory;
use crate::lifecycle;
use crate::map_gen;
use crate::net::messages::{
    ClientMessage, EffectEndedMsg, EntityRemovedMsg, JoinMsg, LevelMsg, MoveMsg, NewItemMsg,
    PlayerIdMsg, PlayerJoinedMsg, ScreenSizeMsg, ServerFullMsg, ServerMessage, TrapWarningMsg,
};
use crate::world::WorldState;

/// Hard cap on concurrently joined players.
pub const DEFAULT_MAX_PLAYERS: usize = 99;

/// Longest display name kept on join, in characters.
pub const MAX_NAME_LEN: usize = 32;

/// Input to the simulation, queued between ticks.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Client {
        player_id: PlayerId,
        message: ClientMessage,
    },
    Disconnect {
        player_id: PlayerId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    All,
    Player(PlayerId),
}

/// A message addressed to one connection or to everyone.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub recipient: Recipient,
    pub message: ServerMessage,
}

impl Outbound {
    pub fn all(message: ServerMessage) -> Self {
        Self {
            recipient: Recipient::All,
            message,
        }
    }

    pub fn to(player_id: PlayerId, message: ServerMessage) -> Self {
        Self {
            recipient: Recipient::Player(player_id),
            message,
        }
    }
}

/// Single-writer owner of the world. Commands are queued with [`submit`] and
/// only take effect at the start of the next [`step`].
///
/// [`submit`]: Simulation::submit
/// [`step`]: Simulation::step
pub struct Simulation {
    world: WorldState,
    tuning: GameTuning,
    rng: StdRng,
    queue: VecDeque<Command>,
    tick: u64,
    tick_interval_ms: u64,
    max_players: usize,
}

impl Simulation {
    /// Build a simulation with a map generated at the largest allowed size.
    pub fn new(tuning: GameTuning, seed: u64, tick_interval_ms: u64) -> Self {
        let bounds = MapBounds::new(tuning.max_map_width, tuning.max_map_height, tuning.cell_size);
        let mut world = WorldState::new(bounds);
        let mut rng = StdRng::seed_from_u64(seed);
        map_gen::generate(&mut world, &tuning, &mut rng, 0);
        Self {
            world,
            tuning,
            rng,
            queue: VecDeque::new(),
            tick: 0,
            tick_interval_ms,
            max_players: DEFAULT_MAX_PLAYERS,
        }
    }

    pub fn with_max_players(mut self, max_players: usize) -> Self {
        self.max_players = max_players;
        self
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    /// Direct world access for hosts and tests that stage scenarios.
    pub fn world_mut(&mut self) -> &mut WorldState {
        &mut self.world
    }

    pub fn tuning(&self) -> &GameTuning {
        &self.tuning
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn pending_commands(&self) -> usize {
        self.queue.len()
    }

    pub fn submit(&mut self, command: Command) {
        self.queue.push_back(command);
    }

    /// Advance one fixed step at clock `now` and return everything to send.
    /// The per-tick `game_update` is always the last message.
    pub fn step(&mut self, now: GameTime) -> Vec<Outbound> {
        let mut out = Vec::new();
        self.tick += 1;

        while let Some(command) = self.queue.pop_front() {
            self.apply(command, now, &mut out);
        }

        self.move_players();
        ai::update_enemies(&mut self.world, now, &self.tuning, &mut self.rng);
        self.resolve_player_collisions(now, &mut out);
        ai::resolve_enemy_contacts(&mut self.world, &self.tuning, &mut out);
        self.expire_effects(now, &mut out);
        self.spawn_pickups(&mut out);

        if lifecycle::round_over(&self.world) {
            lifecycle::advance_round(&mut self.world, &self.tuning, &mut self.rng, now, &mut out);
        }

        out.push(Outbound::all(ServerMessage::GameUpdate(
            self.world.game_update_msg(self.tick),
        )));
        out
    }

    fn apply(&mut self, command: Command, now: GameTime, out: &mut Vec<Outbound>) {
        match command {
            Command::Client { player_id, message } => match message {
                ClientMessage::Join(msg) => self.handle_join(player_id, msg, out),
                ClientMessage::ScreenSize(msg) => self.handle_screen_size(player_id, msg, now, out),
                ClientMessage::Move(msg) => self.handle_move(player_id, msg),
                ClientMessage::UseItem(msg) => {
                    inventory::use_item(
                        &mut self.world,
                        player_id,
                        msg.item_kind,
                        msg.target,
                        now,
                        &self.tuning,
                        out,
                    );
                },
            },
            Command::Disconnect { player_id } => {
                if self.world.players.remove(&player_id).is_some() {
                    tracing::info!(player_id, "player left");
                    out.push(Outbound::all(ServerMessage::PlayerLeft(PlayerIdMsg {
                        player_id,
                    })));
                }
            },
        }
    }

    fn handle_join(&mut self, player_id: PlayerId, msg: JoinMsg, out: &mut Vec<Outbound>) {
        if self.world.players.contains_key(&player_id) {
            return;
        }
        if self.world.players.len() >= self.max_players {
            tracing::warn!(player_id, max = self.max_players, "join rejected: server full");
            out.push(Outbound::to(
                player_id,
                ServerMessage::ServerFull(ServerFullMsg {
                    max_players: self.max_players as u32,
                }),
            ));
            return;
        }

        let name = display_name(msg.name.as_deref(), player_id);
        let color = NeonColor::PALETTE[self.rng.random_range(0..NeonColor::PALETTE.len())];
        let position = self.world.bounds.random_position(&mut self.rng);
        let player = Player::new(player_id, name, color, position);
        tracing::info!(player_id, name = %player.name, "player joined");
        self.world.players.insert(player_id, player.clone());

        out.push(Outbound::to(
            player_id,
            ServerMessage::GameState(Box::new(self.world.game_state_msg())),
        ));
        out.push(Outbound::to(
            player_id,
            ServerMessage::PlayerIdAssigned(PlayerIdMsg { player_id }),
        ));
        out.push(Outbound::to(
            player_id,
            ServerMessage::GameLevel(LevelMsg {
                level: self.world.level,
            }),
        ));
        out.push(Outbound::all(ServerMessage::PlayerJoined(Box::new(
            PlayerJoinedMsg { player },
        ))));
    }

    fn handle_screen_size(
        &mut self,
        player_id: PlayerId,
        msg: ScreenSizeMsg,
        now: GameTime,
        out: &mut Vec<Outbound>,
    ) {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if !valid(msg.width) || !valid(msg.height) {
            return;
        }
        let (cols, rows) = self.tuning.grid_for_screen(msg.width, msg.height);
        let bounds = MapBounds::new(cols, rows, self.tuning.cell_size);
        let resized = bounds != self.world.bounds;
        if resized {
            tracing::debug!(player_id, cols, rows, "map resized");
            self.world.bounds = bounds;
            for player in self.world.players.values_mut() {
                player.position = bounds.clamp(player.position);
            }
        }
        // A new layout replaces everything left outside the old walls.
        if resized || self.world.dots.is_empty() {
            map_gen::generate(&mut self.world, &self.tuning, &mut self.rng, now);
            out.push(Outbound::all(ServerMessage::MapReset(self.world.map_reset_msg())));
        }
        out.push(Outbound::to(
            player_id,
            ServerMessage::MapSize(self.world.map_size_msg()),
        ));
    }

    fn handle_move(&mut self, player_id: PlayerId, msg: MoveMsg) {
        let Some(player) = self.world.players.get_mut(&player_id) else {
            return;
        };
        if player.is_frozen() {
            return;
        }
        player.direction = if player.effects.is_active(EffectKind::Confused) {
            msg.direction.inverted()
        } else {
            msg.direction
        };
    }

    fn move_players(&mut self) {
        let bounds = self.world.bounds;
        for player in self.world.players.values_mut() {
            if !player.alive || player.is_frozen() {
                continue;
            }
            let speed = player.effects.movement_speed(&self.tuning);
            player.position = bounds.step(player.position, player.direction, speed);
        }
    }

    /// Consumables, items and traps for every living, unfrozen player.
    fn resolve_player_collisions(&mut self, now: GameTime, out: &mut Vec<Outbound>) {
        let cell_size = self.world.bounds.cell_size;
        let ids: Vec<PlayerId> = self.world.players.keys().copied().collect();

        for player_id in ids {
            let Some(player) = self.world.players.get(&player_id) else {
                continue;
            };
            if !player.alive || player.is_frozen() {
                continue;
            }
            let pos = player.position;

            let dots: Vec<EntityId> = self
                .world
                .dots
                .values()
                .filter(|d| is_colliding(pos, d.position, cell_size))
                .map(|d| d.id)
                .collect();
            for id in dots {
                if let Some(dot) = self.world.dots.remove(&id)
                    && let Some(player) = self.world.players.get_mut(&player_id)
                {
                    player.score += dot.value;
                    out.push(Outbound::all(ServerMessage::DotEaten(EntityRemovedMsg {
                        id,
                    })));
                }
            }

            let pellets: Vec<EntityId> = self
                .world
                .power_pellets
                .values()
                .filter(|p| is_colliding(pos, p.position, cell_size))
                .map(|p| p.id)
                .collect();
            for id in pellets {
                if let Some(pellet) = self.world.power_pellets.remove(&id)
                    && let Some(player) = self.world.players.get_mut(&player_id)
                {
                    player.score += pellet.value;
                    player.power_up(self.tuning.powered_duration_ms);
                    out.push(Outbound::all(ServerMessage::PowerPelletEaten(
                        EntityRemovedMsg { id },
                    )));
                }
            }

            inventory::collect_items(&mut self.world, player_id, cell_size, out);

            let mut triggered = Vec::new();
            for trap in self.world.traps.values() {
                if let Some(distance) =
                    proximity(pos, trap.position, cell_size, trap.detection_radius)
                {
                    out.push(Outbound::to(
                        player_id,
                        ServerMessage::TrapWarning(TrapWarningMsg {
                            x: trap.position.x,
                            y: trap.position.y,
                            distance,
                        }),
                    ));
                }
                if is_colliding(pos, trap.position, cell_size) {
                    triggered.push(trap.id);
                }
            }
            for trap_id in triggered {
                let still_alive = self
                    .world
                    .players
                    .get(&player_id)
                    .is_some_and(|p| p.alive);
                if !still_alive {
                    break;
                }
                lifecycle::resolve_trap(
                    &mut self.world,
                    player_id,
                    trap_id,
                    now,
                    &self.tuning,
                    &mut self.rng,
                    out,
                );
            }

            if let Some(player) = self.world.players.get_mut(&player_id) {
                player.drain_power(self.tick_interval_ms as i64);
            }
        }
    }

    fn expire_effects(&mut self, now: GameTime, out: &mut Vec<Outbound>) {
        for player in self.world.players.values_mut() {
            for effect in player.effects.expire(now) {
                out.push(Outbound::to(
                    player.id,
                    ServerMessage::EffectEnded(EffectEndedMsg { effect }),
                ));
            }
        }
    }

    /// Occasional mid-round items and traps, more frequent at higher levels.
    fn spawn_pickups(&mut self, out: &mut Vec<Outbound>) {
        let level = self.world.level;
        let item_chance = chance(self.tuning.item_spawn_chance_per_level * f64::from(level));
        if self.rng.random_bool(item_chance)
            && self.world.items.len() < (self.tuning.item_spawn_cap_base + level) as usize
            && let Some(id) = map_gen::spawn_item(&mut self.world, &self.tuning, &mut self.rng)
            && let Some(item) = self.world.items.get(&id)
        {
            out.push(Outbound::all(ServerMessage::NewItem(NewItemMsg {
                item: item.clone(),
            })));
        }

        let trap_chance = chance(self.tuning.trap_spawn_chance_per_level * f64::from(level));
        if self.rng.random_bool(trap_chance)
            && self.world.traps.len() < (self.tuning.trap_spawn_cap_base + level) as usize
        {
            map_gen::spawn_trap(&mut self.world, &self.tuning, &mut self.rng);
        }
    }
}

/// Trimmed, length-limited display name with a fallback for blanks.
fn display_name(requested: Option<&str>, player_id: PlayerId) -> String {
    let trimmed = requested.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return format!("Player-{player_id}");
    }
    trimmed.chars().take(MAX_NAME_LEN).collect()
}
