use rand::Rng;

use crate::collision::is_colliding;
use crate::config::{GameTuning, chance};
use crate::entities::{AiEnemy, EnemyKind, EntityId, Player};
use crate::geometry::{Direction, GameTime, MapBounds, Position};
use crate::net::messages::{
    EliminationCause, EnemyKilledMsg, PlayerEliminatedMsg, PlayerEnemyHitMsg, ServerMessage,
};
use crate::simulation::Outbound;
use crate::world::WorldState;

/// Decide (when the cooldown allows) and move every enemy one tick.
pub fn update_enemies(
    world: &mut WorldState,
    now: GameTime,
    tuning: &GameTuning,
    rng: &mut impl Rng,
) {
    let targets: Vec<Position> = world
        .players
        .values()
        .filter(|p| p.alive)
        .map(|p| p.position)
        .collect();
    let bounds = world.bounds;

    for enemy in world.enemies.values_mut() {
        if now.saturating_sub(enemy.last_decision_at) > tuning.enemy_decision_cooldown_ms {
            enemy.direction = decide(enemy, &targets, tuning, rng);
            enemy.last_decision_at = now;
        }
        advance(enemy, &bounds);
    }
}

/// Pick the next direction for one enemy.
fn decide(
    enemy: &AiEnemy,
    targets: &[Position],
    tuning: &GameTuning,
    rng: &mut impl Rng,
) -> Direction {
    match enemy.kind {
        EnemyKind::Chaser => {
            let nearest = targets.iter().min_by(|a, b| {
                enemy
                    .position
                    .distance(a)
                    .total_cmp(&enemy.position.distance(b))
            });
            let Some(target) = nearest else {
                return enemy.direction;
            };
            if rng.random_bool(chance(tuning.chaser_accuracy)) {
                Direction::toward(enemy.position, *target)
            } else {
                Direction::random(rng)
            }
        },
        EnemyKind::Wanderer => wander(enemy.direction, tuning.wanderer_turn_chance, rng),
        EnemyKind::Guardian => match enemy.guard {
            Some(post) if enemy.position.distance(&post.home) > post.leash_radius => {
                Direction::toward(enemy.position, post.home)
            },
            _ => wander(enemy.direction, tuning.guardian_turn_chance, rng),
        },
    }
}

fn wander(current: Direction, turn_chance: f64, rng: &mut impl Rng) -> Direction {
    if rng.random_bool(chance(turn_chance)) {
        Direction::random(rng)
    } else {
        current
    }
}

fn advance(enemy: &mut AiEnemy, bounds: &MapBounds) {
    enemy.position = bounds.step(enemy.position, enemy.direction, enemy.speed);
}

/// Resolve every enemy touching a living player.
///
/// Shielded players are untouchable. A powered player destroys the enemy and
/// collects the bounty; anyone else is eliminated.
pub fn resolve_enemy_contacts(
    world: &mut WorldState,
    tuning: &GameTuning,
    out: &mut Vec<Outbound>,
) {
    let cell_size = world.bounds.cell_size;
    let enemy_ids: Vec<EntityId> = world.enemies.keys().copied().collect();

    for enemy_id in enemy_ids {
        let Some(enemy) = world.enemies.get(&enemy_id).cloned() else {
            continue;
        };
        for player in world.players.values_mut() {
            if !player.alive || !is_colliding(player.position, enemy.position, cell_size) {
                continue;
            }
            if player.is_shielded() {
                continue;
            }
            if player.powered {
                player.score += tuning.enemy_bounty;
                world.enemies.remove(&enemy_id);
                tracing::debug!(player_id = player.id, enemy_id, "enemy destroyed");
                out.push(Outbound::all(ServerMessage::EnemyKilled(EnemyKilledMsg {
                    enemy_id,
                    player_id: player.id,
                    score_gained: tuning.enemy_bounty,
                })));
                break;
            }
            eliminate(player, &enemy, out);
        }
    }
}

fn eliminate(player: &mut Player, enemy: &AiEnemy, out: &mut Vec<Outbound>) {
    player.alive = false;
    tracing::debug!(
        player_id = player.id,
        enemy_id = enemy.id,
        kind = ?enemy.kind,
        "player caught"
    );
    out.push(Outbound::to(
        player.id,
        ServerMessage::PlayerEliminated(PlayerEliminatedMsg {
            cause: EliminationCause::Enemy {
                enemy_kind: enemy.kind,
            },
        }),
    ));
    out.push(Outbound::all(ServerMessage::PlayerEnemyHit(PlayerEnemyHitMsg {
        player_id: player.id,
        enemy_id: enemy.id,
        enemy_kind: enemy.kind,
    })));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectKind;
    use crate::entities::GuardPost;
    use crate::simulation::Recipient;
    use crate::test_helpers::{add_enemy, add_player, empty_world};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn cooldown_gates_decisions() {
        let mut tuning = GameTuning::default();
        tuning.wanderer_turn_chance = 1.0;
        let mut world = empty_world(&tuning);
        add_enemy(&mut world, 10, EnemyKind::Wanderer, Position::new(200.0, 200.0));
        world.enemies.get_mut(&10).unwrap().last_decision_at = 1000;
        let mut rng = StdRng::seed_from_u64(0);

        update_enemies(&mut world, 1500, &tuning, &mut rng);
        assert_eq!(world.enemies[&10].last_decision_at, 1000);
        update_enemies(&mut world, 1501, &tuning, &mut rng);
        assert_eq!(world.enemies[&10].last_decision_at, 1501);
    }

    #[test]
    fn out_of_range_chances_do_not_panic() {
        let mut tuning = GameTuning::default();
        tuning.wanderer_turn_chance = 1.5;
        tuning.guardian_turn_chance = f64::NAN;
        tuning.chaser_accuracy = -0.5;
        let mut world = empty_world(&tuning);
        add_enemy(&mut world, 10, EnemyKind::Wanderer, Position::new(200.0, 200.0));
        add_enemy(&mut world, 11, EnemyKind::Guardian, Position::new(300.0, 200.0));
        add_enemy(&mut world, 12, EnemyKind::Chaser, Position::new(400.0, 200.0));
        add_player(&mut world, 1, Position::new(100.0, 100.0));
        let mut rng = StdRng::seed_from_u64(0);

        for step in 1..=20 {
            update_enemies(&mut world, step * 1000, &tuning, &mut rng);
        }
        // NaN reads as never turning.
        assert_eq!(world.enemies[&11].direction, Direction::None);
    }

    #[test]
    fn chaser_heads_for_nearest_player() {
        let mut tuning = GameTuning::default();
        tuning.chaser_accuracy = 1.0;
        let mut world = empty_world(&tuning);
        add_enemy(&mut world, 10, EnemyKind::Chaser, Position::new(200.0, 200.0));
        add_player(&mut world, 1, Position::new(100.0, 200.0));
        add_player(&mut world, 2, Position::new(500.0, 200.0));
        let mut rng = StdRng::seed_from_u64(0);

        update_enemies(&mut world, 10_000, &tuning, &mut rng);
        let enemy = &world.enemies[&10];
        assert_eq!(enemy.direction, Direction::Left);
        assert!(enemy.position.x < 200.0);
    }

    #[test]
    fn chaser_ignores_dead_players() {
        let mut tuning = GameTuning::default();
        tuning.chaser_accuracy = 1.0;
        let mut world = empty_world(&tuning);
        add_enemy(&mut world, 10, EnemyKind::Chaser, Position::new(200.0, 200.0));
        add_player(&mut world, 1, Position::new(180.0, 200.0));
        add_player(&mut world, 2, Position::new(200.0, 400.0));
        world.players.get_mut(&1).unwrap().alive = false;
        let mut rng = StdRng::seed_from_u64(0);

        update_enemies(&mut world, 10_000, &tuning, &mut rng);
        assert_eq!(world.enemies[&10].direction, Direction::Down);
    }

    #[test]
    fn guardian_returns_when_leashed() {
        let tuning = GameTuning::default();
        let mut world = empty_world(&tuning);
        add_enemy(&mut world, 10, EnemyKind::Guardian, Position::new(400.0, 200.0));
        world.enemies.get_mut(&10).unwrap().guard = Some(GuardPost {
            home: Position::new(200.0, 200.0),
            leash_radius: 100.0,
        });
        let mut rng = StdRng::seed_from_u64(0);

        update_enemies(&mut world, 10_000, &tuning, &mut rng);
        assert_eq!(world.enemies[&10].direction, Direction::Left);
    }

    #[test]
    fn enemies_slide_along_walls() {
        let tuning = GameTuning::default();
        let mut world = empty_world(&tuning);
        add_enemy(&mut world, 10, EnemyKind::Wanderer, Position::new(20.0, 100.0));
        world.enemies.get_mut(&10).unwrap().direction = Direction::Left;
        let mut rng = StdRng::seed_from_u64(0);

        update_enemies(&mut world, 0, &tuning, &mut rng);
        let pos = world.enemies[&10].position;
        assert_eq!(pos, Position::new(20.0, 100.0));
        assert!(world.bounds.contains(pos));
    }

    #[test]
    fn powered_player_collects_bounty() {
        let tuning = GameTuning::default();
        let mut world = empty_world(&tuning);
        add_player(&mut world, 1, Position::new(100.0, 100.0));
        add_enemy(&mut world, 10, EnemyKind::Chaser, Position::new(104.0, 100.0));
        world.players.get_mut(&1).unwrap().power_up(10_000);

        let mut out = Vec::new();
        resolve_enemy_contacts(&mut world, &tuning, &mut out);
        assert!(world.enemies.is_empty());
        assert_eq!(world.players[&1].score, 200);
        assert_eq!(out.len(), 1);
        assert_eq!(
            out[0].message,
            ServerMessage::EnemyKilled(EnemyKilledMsg {
                enemy_id: 10,
                player_id: 1,
                score_gained: 200,
            })
        );
    }

    #[test]
    fn unpowered_player_is_eliminated() {
        let tuning = GameTuning::default();
        let mut world = empty_world(&tuning);
        add_player(&mut world, 1, Position::new(100.0, 100.0));
        add_enemy(&mut world, 10, EnemyKind::Wanderer, Position::new(100.0, 95.0));

        let mut out = Vec::new();
        resolve_enemy_contacts(&mut world, &tuning, &mut out);
        assert!(!world.players[&1].alive);
        assert_eq!(world.enemies.len(), 1);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].recipient, Recipient::Player(1));
        assert!(matches!(out[1].message, ServerMessage::PlayerEnemyHit(_)));

        // Already dead: no repeat.
        out.clear();
        resolve_enemy_contacts(&mut world, &tuning, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn shield_makes_contact_harmless() {
        let tuning = GameTuning::default();
        let mut world = empty_world(&tuning);
        add_player(&mut world, 1, Position::new(100.0, 100.0));
        add_enemy(&mut world, 10, EnemyKind::Chaser, Position::new(100.0, 100.0));
        world
            .players
            .get_mut(&1)
            .unwrap()
            .effects
            .apply(EffectKind::Shield, 0, &tuning.effects);

        let mut out = Vec::new();
        resolve_enemy_contacts(&mut world, &tuning, &mut out);
        assert!(world.players[&1].alive);
        assert_eq!(world.enemies.len(), 1);
        assert!(out.is_empty());
    }
}
