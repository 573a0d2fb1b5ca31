use rand::Rng;

use crate::config::GameTuning;
use crate::effects::EffectKind;
use crate::entities::{EntityId, PlayerId, TrapKind};
use crate::geometry::GameTime;
use crate::map_gen;
use crate::net::messages::{
    EliminationCause, LevelMsg, PlayerEliminatedMsg, PlayerRevivedMsg, PlayerTeleportedMsg,
    PlayerTrapHitMsg, ServerMessage,
};
use crate::simulation::Outbound;
use crate::world::WorldState;

/// A round ends when everyone present is dead, or the board is cleared.
pub fn round_over(world: &WorldState) -> bool {
    let wiped = !world.players.is_empty() && world.living_player_count() == 0;
    let cleared = world.dots.is_empty() && world.power_pellets.is_empty();
    wiped || cleared
}

/// Close out the round: bump counters, rebuild the map, revive the dead and
/// announce the new layout.
pub fn advance_round(
    world: &mut WorldState,
    tuning: &GameTuning,
    rng: &mut impl Rng,
    now: GameTime,
    out: &mut Vec<Outbound>,
) {
    world.rounds_completed += 1;
    if tuning.rounds_per_level > 0 && world.rounds_completed % tuning.rounds_per_level == 0 {
        world.level += 1;
        tracing::info!(level = world.level, "level up");
        out.push(Outbound::all(ServerMessage::LevelUp(LevelMsg {
            level: world.level,
        })));
    }

    map_gen::generate(world, tuning, rng, now);

    let bounds = world.bounds;
    for player in world.players.values_mut().filter(|p| !p.alive) {
        player.alive = true;
        player.position = bounds.random_position(rng);
        player.powered = false;
        player.powered_remaining_ms = 0;
        player.effects.clear();
        out.push(Outbound::to(
            player.id,
            ServerMessage::PlayerRevived(PlayerRevivedMsg {
                position: player.position,
            }),
        ));
    }

    tracing::info!(
        round = world.rounds_completed,
        level = world.level,
        "round complete"
    );
    out.push(Outbound::all(ServerMessage::MapReset(world.map_reset_msg())));
}

/// Fire a trap on a player. The trap is removed whatever happens; a shielded
/// player absorbs it without any notice.
pub fn resolve_trap(
    world: &mut WorldState,
    player_id: PlayerId,
    trap_id: EntityId,
    now: GameTime,
    tuning: &GameTuning,
    rng: &mut impl Rng,
    out: &mut Vec<Outbound>,
) {
    let Some(trap) = world.traps.remove(&trap_id) else {
        return;
    };
    let bounds = world.bounds;
    let Some(player) = world.players.get_mut(&player_id) else {
        return;
    };
    if player.is_shielded() {
        tracing::debug!(player_id, trap_id, "trap absorbed by shield");
        return;
    }

    match trap.kind {
        TrapKind::Spike => {
            player.alive = false;
            out.push(Outbound::to(
                player_id,
                ServerMessage::PlayerEliminated(PlayerEliminatedMsg {
                    cause: EliminationCause::Trap {
                        trap_kind: trap.kind,
                    },
                }),
            ));
        },
        TrapKind::Slow => {
            if let Some(duration) = player.effects.inflict(EffectKind::Slowed, now, &tuning.effects)
            {
                out.push(Outbound::to(
                    player_id,
                    ServerMessage::effect_started(EffectKind::Slowed, duration),
                ));
            }
        },
        TrapKind::Teleport => {
            let from = player.position;
            let to = bounds.random_position(rng);
            player.position = to;
            out.push(Outbound::to(
                player_id,
                ServerMessage::PlayerTeleported(PlayerTeleportedMsg { from, to }),
            ));
        },
    }

    tracing::debug!(player_id, trap_id, kind = ?trap.kind, "trap triggered");
    out.push(Outbound::all(ServerMessage::PlayerTrapHit(PlayerTrapHitMsg {
        player_id,
        trap_id,
        trap_kind: trap.kind,
    })));
}
