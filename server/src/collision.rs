//! Per-tick overlap tests between projectiles, players and enemies.
//!
//! Detection is a brute-force pass over every pair with no spatial
//! partitioning: O(players × enemies) plus O(projectiles × targets).

use crate::store::EntityStore;
use shared::{check_collision, Enemy};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    /// A player projectile struck an active enemy.
    ProjectileHitEnemy { projectile_id: u32, enemy_id: u32 },
    /// An enemy projectile struck an active player.
    ProjectileHitPlayer { projectile_id: u32, player_id: u32 },
    /// An active player overlaps an active enemy.
    PlayerTouchedEnemy { player_id: u32, enemy_id: u32 },
}

/// Finds every collision in the current world state.
///
/// A projectile is consumed by its first hit, and an enemy destroyed by a
/// projectile earlier in the pass no longer collides with anything.
pub fn detect(store: &EntityStore, enemies: &[Enemy]) -> Vec<Collision> {
    let mut collisions = Vec::new();
    let mut destroyed = HashSet::new();

    for projectile in store.player_projectiles() {
        let hitbox = projectile.hitbox();
        let target = enemies
            .iter()
            .filter(|e| e.active && !destroyed.contains(&e.id))
            .find(|e| check_collision(&hitbox, &e.hitbox()));

        if let Some(enemy) = target {
            destroyed.insert(enemy.id);
            collisions.push(Collision::ProjectileHitEnemy {
                projectile_id: projectile.id,
                enemy_id: enemy.id,
            });
        }
    }

    for projectile in store.enemy_projectiles() {
        let hitbox = projectile.hitbox();
        let target = store
            .players()
            .filter(|p| p.is_active)
            .find(|p| check_collision(&hitbox, &p.hitbox()));

        if let Some(player) = target {
            collisions.push(Collision::ProjectileHitPlayer {
                projectile_id: projectile.id,
                player_id: player.id,
            });
        }
    }

    for player in store.players().filter(|p| p.is_active) {
        let hitbox = player.hitbox();
        for enemy in enemies
            .iter()
            .filter(|e| e.active && !destroyed.contains(&e.id))
        {
            if check_collision(&hitbox, &enemy.hitbox()) {
                collisions.push(Collision::PlayerTouchedEnemy {
                    player_id: player.id,
                    enemy_id: enemy.id,
                });
            }
        }
    }

    collisions
}
