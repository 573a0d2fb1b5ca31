use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::collision::{is_colliding, within_radius};
use crate::config::GameTuning;
use crate::entities::{EntityId, ItemKind, PlayerId};
use crate::geometry::{GameTime, Position};
use crate::net::messages::{
    BombExplosionMsg, EntityRemovedMsg, ItemAcquiredMsg, ItemCollectedMsg, ItemUsedMsg,
    ServerMessage,
};
use crate::simulation::Outbound;
use crate::world::WorldState;

/// Held item charges. Only kinds with a positive count are ever stored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory(BTreeMap<ItemKind, u32>);

impl Inventory {
    pub fn add(&mut self, kind: ItemKind) {
        *self.0.entry(kind).or_insert(0) += 1;
    }

    pub fn count(&self, kind: ItemKind) -> u32 {
        self.0.get(&kind).copied().unwrap_or(0)
    }

    /// Consume one charge. Returns false (and changes nothing) when none is held.
    pub fn take(&mut self, kind: ItemKind) -> bool {
        let Some(count) = self.0.get_mut(&kind) else {
            return false;
        };
        *count -= 1;
        if *count == 0 {
            self.0.remove(&kind);
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemKind, u32)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

/// Pick up every item the player is touching.
pub fn collect_items(
    world: &mut WorldState,
    player_id: PlayerId,
    cell_size: f32,
    out: &mut Vec<Outbound>,
) {
    let Some(pos) = world.players.get(&player_id).map(|p| p.position) else {
        return;
    };
    let touched: Vec<EntityId> = world
        .items
        .values()
        .filter(|item| is_colliding(pos, item.position, cell_size))
        .map(|item| item.id)
        .collect();

    for item_id in touched {
        let Some(item) = world.items.remove(&item_id) else {
            continue;
        };
        if let Some(player) = world.players.get_mut(&player_id) {
            player.inventory.add(item.kind);
        }
        out.push(Outbound::all(ServerMessage::ItemCollected(ItemCollectedMsg {
            item_id,
            player_id,
            item_kind: item.kind,
        })));
        out.push(Outbound::to(
            player_id,
            ServerMessage::ItemAcquired(ItemAcquiredMsg {
                item_kind: item.kind,
            }),
        ));
    }
}

/// Spend one charge of `kind` and apply its effect. A missing player or an
/// empty slot is a silent no-op; returns whether anything happened.
pub fn use_item(
    world: &mut WorldState,
    player_id: PlayerId,
    kind: ItemKind,
    target: Position,
    now: GameTime,
    tuning: &GameTuning,
    out: &mut Vec<Outbound>,
) -> bool {
    let Some(player) = world.players.get_mut(&player_id) else {
        return false;
    };
    if !player.inventory.take(kind) {
        return false;
    }

    match kind {
        ItemKind::Bomb => detonate(world, player_id, target, tuning.bomb_radius, out),
        ItemKind::Freeze | ItemKind::Confusion => {
            let Some(effect) = kind.effect() else {
                return true;
            };
            for other in world.players.values_mut() {
                if other.id == player_id {
                    continue;
                }
                if let Some(duration) = other.effects.inflict(effect, now, &tuning.effects) {
                    out.push(Outbound::to(
                        other.id,
                        ServerMessage::effect_started(effect, duration),
                    ));
                }
            }
        },
        ItemKind::SpeedUp | ItemKind::Shield => {
            let Some(effect) = kind.effect() else {
                return true;
            };
            if let Some(player) = world.players.get_mut(&player_id) {
                let duration = player.effects.apply(effect, now, &tuning.effects);
                out.push(Outbound::to(
                    player_id,
                    ServerMessage::effect_started(effect, duration),
                ));
            }
        },
    }

    tracing::debug!(player_id, ?kind, "item used");
    out.push(Outbound::all(ServerMessage::ItemUsed(ItemUsedMsg {
        player_id,
        item_kind: kind,
        position: target,
    })));
    true
}

/// Clear every dot and pellet within `radius` of `target` into the user's score.
fn detonate(
    world: &mut WorldState,
    player_id: PlayerId,
    target: Position,
    radius: f32,
    out: &mut Vec<Outbound>,
) {
    let mut gained = 0;

    let dots: Vec<EntityId> = world
        .dots
        .values()
        .filter(|d| within_radius(target, d.position, radius))
        .map(|d| d.id)
        .collect();
    for id in dots {
        if let Some(dot) = world.dots.remove(&id) {
            gained += dot.value;
            out.push(Outbound::all(ServerMessage::DotEaten(EntityRemovedMsg {
                id,
            })));
        }
    }

    let pellets: Vec<EntityId> = world
        .power_pellets
        .values()
        .filter(|p| within_radius(target, p.position, radius))
        .map(|p| p.id)
        .collect();
    for id in pellets {
        if let Some(pellet) = world.power_pellets.remove(&id) {
            gained += pellet.value;
            out.push(Outbound::all(ServerMessage::PowerPelletEaten(
                EntityRemovedMsg { id },
            )));
        }
    }

    if let Some(player) = world.players.get_mut(&player_id) {
        player.score += gained;
    }
    out.push(Outbound::all(ServerMessage::BombExplosion(BombExplosionMsg {
        x: target.x,
        y: target.y,
        radius,
        player_id,
    })));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectKind;
    use crate::entities::{Consumable, Item};
    use crate::simulation::Recipient;
    use crate::test_helpers::{add_player, empty_world};

    #[test]
    fn take_removes_key_at_zero() {
        let mut inv = Inventory::default();
        inv.add(ItemKind::Bomb);
        inv.add(ItemKind::Bomb);
        assert!(inv.take(ItemKind::Bomb));
        assert_eq!(inv.count(ItemKind::Bomb), 1);
        assert!(inv.take(ItemKind::Bomb));
        assert!(inv.is_empty());
        assert!(!inv.take(ItemKind::Bomb));
        assert!(inv.is_empty());
    }

    #[test]
    fn use_without_charge_is_silent() {
        let tuning = GameTuning::default();
        let mut world = empty_world(&tuning);
        add_player(&mut world, 1, Position::new(100.0, 100.0));
        let before = world.clone();
        let mut out = Vec::new();
        assert!(!use_item(
            &mut world,
            1,
            ItemKind::Freeze,
            Position::new(0.0, 0.0),
            0,
            &tuning,
            &mut out
        ));
        assert!(out.is_empty());
        assert_eq!(world, before);
        assert!(!use_item(
            &mut world,
            99,
            ItemKind::Bomb,
            Position::default(),
            0,
            &tuning,
            &mut out
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn bomb_clears_area_into_score() {
        let tuning = GameTuning::default();
        let mut world = empty_world(&tuning);
        let at = Position::new(200.0, 200.0);
        add_player(&mut world, 1, at);
        world.players.get_mut(&1).unwrap().inventory.add(ItemKind::Bomb);
        for (i, x) in [160.0, 200.0, 240.0].into_iter().enumerate() {
            let id = 100 + i as u64;
            world.dots.insert(
                id,
                Consumable {
                    id,
                    position: Position::new(x, 200.0),
                    value: 10,
                },
            );
        }
        world.power_pellets.insert(
            200,
            Consumable {
                id: 200,
                position: Position::new(200.0, 260.0),
                value: 50,
            },
        );
        // Outside the blast.
        world.dots.insert(
            300,
            Consumable {
                id: 300,
                position: Position::new(400.0, 400.0),
                value: 10,
            },
        );

        let mut out = Vec::new();
        assert!(use_item(&mut world, 1, ItemKind::Bomb, at, 0, &tuning, &mut out));
        assert_eq!(world.players[&1].score, 80);
        assert_eq!(world.dots.len(), 1);
        assert!(world.power_pellets.is_empty());
        let explosions = out
            .iter()
            .filter(|o| matches!(o.message, ServerMessage::BombExplosion(_)))
            .count();
        assert_eq!(explosions, 1);
        assert!(matches!(
            out.last().map(|o| &o.message),
            Some(ServerMessage::ItemUsed(_))
        ));
        assert!(world.players[&1].inventory.is_empty());
    }

    #[test]
    fn freeze_skips_user_and_shielded() {
        let tuning = GameTuning::default();
        let mut world = empty_world(&tuning);
        add_player(&mut world, 1, Position::new(40.0, 40.0));
        add_player(&mut world, 2, Position::new(80.0, 80.0));
        add_player(&mut world, 3, Position::new(120.0, 120.0));
        world.players.get_mut(&1).unwrap().inventory.add(ItemKind::Freeze);
        world
            .players
            .get_mut(&3)
            .unwrap()
            .effects
            .apply(EffectKind::Shield, 0, &tuning.effects);

        let mut out = Vec::new();
        use_item(&mut world, 1, ItemKind::Freeze, Position::default(), 1000, &tuning, &mut out);
        assert!(!world.players[&1].is_frozen());
        assert!(world.players[&2].is_frozen());
        assert_eq!(world.players[&2].effects.frozen.expires_at, 4000);
        assert!(!world.players[&3].is_frozen());

        let private: Vec<_> = out
            .iter()
            .filter(|o| matches!(o.message, ServerMessage::PlayerFrozen(_)))
            .map(|o| o.recipient)
            .collect();
        assert_eq!(private, vec![Recipient::Player(2)]);
    }

    #[test]
    fn shield_is_self_targeted() {
        let tuning = GameTuning::default();
        let mut world = empty_world(&tuning);
        add_player(&mut world, 1, Position::new(40.0, 40.0));
        add_player(&mut world, 2, Position::new(80.0, 80.0));
        world.players.get_mut(&1).unwrap().inventory.add(ItemKind::Shield);

        let mut out = Vec::new();
        let target = Position::new(55.0, 66.0);
        use_item(&mut world, 1, ItemKind::Shield, target, 0, &tuning, &mut out);
        assert!(world.players[&1].is_shielded());
        assert!(!world.players[&2].is_shielded());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].recipient, Recipient::Player(1));
        assert_eq!(
            out[1].message,
            ServerMessage::ItemUsed(ItemUsedMsg {
                player_id: 1,
                item_kind: ItemKind::Shield,
                position: target,
            })
        );
    }

    #[test]
    fn pickup_grants_one_charge() {
        let tuning = GameTuning::default();
        let mut world = empty_world(&tuning);
        add_player(&mut world, 1, Position::new(100.0, 100.0));
        world.items.insert(
            7,
            Item {
                id: 7,
                kind: ItemKind::SpeedUp,
                position: Position::new(105.0, 100.0),
            },
        );
        let mut out = Vec::new();
        collect_items(&mut world, 1, tuning.cell_size, &mut out);
        assert!(world.items.is_empty());
        assert_eq!(world.players[&1].inventory.count(ItemKind::SpeedUp), 1);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].recipient, Recipient::All);
        assert_eq!(out[1].recipient, Recipient::Player(1));

        out.clear();
        collect_items(&mut world, 1, tuning.cell_size, &mut out);
        assert!(out.is_empty());
    }
}
