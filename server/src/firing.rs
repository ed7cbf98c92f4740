//! Enemy fire timing.
//!
//! An enemy may fire when its own type-specific interval has passed and no
//! enemy of the same type fired within the shared per-type cooldown. Even then
//! it only fires with a small per-tick probability.

use crate::projectiles::ProjectileController;
use crate::store::EntityStore;
use log::debug;
use rand::Rng;
use shared::{Enemy, EnemyKind};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct EnemyFireControl {
    type_cooldown_ms: u64,
    fire_chance: f64,
    last_by_enemy: HashMap<u32, u64>,
    last_by_kind: HashMap<EnemyKind, u64>,
}

fn elapsed_more_than(last: Option<&u64>, now_ms: u64, window_ms: u64) -> bool {
    match last {
        None => true,
        Some(&last) => now_ms.saturating_sub(last) > window_ms,
    }
}

impl EnemyFireControl {
    pub fn new(type_cooldown_ms: u64, fire_chance: f64) -> Self {
        Self {
            type_cooldown_ms,
            fire_chance: fire_chance.clamp(0.0, 1.0),
            last_by_enemy: HashMap::new(),
            last_by_kind: HashMap::new(),
        }
    }

    /// Rolls fire decisions for every active, on-screen enemy. Returns the
    /// number of enemies that fired.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        enemies: &[Enemy],
        store: &mut EntityStore,
        projectiles: &mut ProjectileController,
        now_ms: u64,
        rng: &mut R,
    ) -> usize {
        let mut fired = 0;

        for enemy in enemies.iter().filter(|e| e.active && e.visible) {
            let profile = enemy.kind.profile();

            if !elapsed_more_than(
                self.last_by_enemy.get(&enemy.id),
                now_ms,
                profile.shot_interval_ms,
            ) {
                continue;
            }
            if !elapsed_more_than(
                self.last_by_kind.get(&enemy.kind),
                now_ms,
                self.type_cooldown_ms,
            ) {
                continue;
            }
            if !rng.gen_bool(self.fire_chance) {
                continue;
            }

            if profile.spread {
                projectiles.spawn_spread(store, enemy.x, enemy.y);
            } else {
                projectiles.spawn_enemy_projectile(store, enemy.x, enemy.y, profile.projectile);
            }
            self.last_by_enemy.insert(enemy.id, now_ms);
            self.last_by_kind.insert(enemy.kind, now_ms);
            fired += 1;
            debug!("Enemy {} ({:?}) fired", enemy.id, enemy.kind);
        }

        fired
    }

    /// Drops interval timers of enemies that are no longer in the formation.
    pub fn retain_enemies(&mut self, enemies: &[Enemy]) {
        self.last_by_enemy
            .retain(|id, _| enemies.iter().any(|enemy| enemy.id == *id));
    }

    pub fn tracked_enemies(&self) -> usize {
        self.last_by_enemy.len()
    }

    pub fn reset(&mut self) {
        self.last_by_enemy.clear();
        self.last_by_kind.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared::{ProjectileKind, SPREAD_ANGLE};

    fn setup() -> (EntityStore, ProjectileController, StdRng) {
        (
            EntityStore::new(),
            ProjectileController::new(400.0, 20.0, SPREAD_ANGLE),
            StdRng::seed_from_u64(11),
        )
    }

    #[test]
    fn test_normal_enemy_fires_single_shot() {
        let (mut store, mut projectiles, mut rng) = setup();
        let mut firing = EnemyFireControl::new(1000, 1.0);
        let enemies = vec![Enemy::new(1, EnemyKind::Normal, 100.0, 100.0)];

        assert_eq!(firing.update(&enemies, &mut store, &mut projectiles, 0, &mut rng), 1);
        let shot = store.enemy_projectiles().next().unwrap();
        assert_eq!(shot.kind, Some(ProjectileKind::Normal));
        assert_eq!(shot.vx, 0.0);
        assert_eq!(shot.y, 120.0);
    }

    #[test]
    fn test_falcon_fires_spread() {
        let (mut store, mut projectiles, mut rng) = setup();
        let mut firing = EnemyFireControl::new(1000, 1.0);
        let enemies = vec![Enemy::new(1, EnemyKind::Falcon, 100.0, 100.0)];

        firing.update(&enemies, &mut store, &mut projectiles, 0, &mut rng);
        assert_eq!(store.enemy_projectiles().count(), 2);
    }

    #[test]
    fn test_type_cooldown_is_shared() {
        let (mut store, mut projectiles, mut rng) = setup();
        let mut firing = EnemyFireControl::new(1000, 1.0);
        let enemies = vec![
            Enemy::new(1, EnemyKind::Normal, 100.0, 100.0),
            Enemy::new(2, EnemyKind::Normal, 150.0, 100.0),
        ];

        assert_eq!(firing.update(&enemies, &mut store, &mut projectiles, 0, &mut rng), 1);
        assert_eq!(firing.update(&enemies, &mut store, &mut projectiles, 1000, &mut rng), 0);
        // Enemy 2 has never fired and the type cooldown has passed.
        assert_eq!(firing.update(&enemies, &mut store, &mut projectiles, 1001, &mut rng), 1);
    }

    #[test]
    fn test_per_enemy_interval() {
        let (mut store, mut projectiles, mut rng) = setup();
        let mut firing = EnemyFireControl::new(1000, 1.0);
        let enemies = vec![Enemy::new(1, EnemyKind::Normal, 100.0, 100.0)];

        firing.update(&enemies, &mut store, &mut projectiles, 0, &mut rng);
        assert_eq!(firing.update(&enemies, &mut store, &mut projectiles, 1500, &mut rng), 0);
        assert_eq!(firing.update(&enemies, &mut store, &mut projectiles, 1501, &mut rng), 1);
    }

    #[test]
    fn test_hidden_or_inactive_enemies_hold_fire() {
        let (mut store, mut projectiles, mut rng) = setup();
        let mut firing = EnemyFireControl::new(1000, 1.0);
        let mut hidden = Enemy::new(1, EnemyKind::Normal, 100.0, 100.0);
        hidden.visible = false;
        let mut dead = Enemy::new(2, EnemyKind::Falcon, 100.0, 100.0);
        dead.active = false;

        assert_eq!(
            firing.update(&[hidden, dead], &mut store, &mut projectiles, 0, &mut rng),
            0
        );
    }

    #[test]
    fn test_zero_chance_never_fires() {
        let (mut store, mut projectiles, mut rng) = setup();
        let mut firing = EnemyFireControl::new(1000, 0.0);
        let enemies = vec![Enemy::new(1, EnemyKind::Normal, 100.0, 100.0)];
        for t in 0..100 {
            firing.update(&enemies, &mut store, &mut projectiles, t * 5000, &mut rng);
        }
        assert_eq!(store.enemy_projectiles().count(), 0);
    }

    #[test]
    fn test_retain_drops_departed_enemies() {
        let (mut store, mut projectiles, mut rng) = setup();
        let mut firing = EnemyFireControl::new(0, 1.0);
        let old_wave = vec![
            Enemy::new(1, EnemyKind::Normal, 100.0, 100.0),
            Enemy::new(2, EnemyKind::Falcon, 150.0, 100.0),
        ];
        firing.update(&old_wave, &mut store, &mut projectiles, 0, &mut rng);
        assert_eq!(firing.tracked_enemies(), 2);

        let new_wave = vec![Enemy::new(3, EnemyKind::Normal, 100.0, 100.0)];
        firing.retain_enemies(&new_wave);
        assert_eq!(firing.tracked_enemies(), 0);

        // The shared type cooldown survives the wave change.
        assert_eq!(firing.update(&new_wave, &mut store, &mut projectiles, 1, &mut rng), 1);
        assert_eq!(firing.tracked_enemies(), 1);
    }

    #[test]
    fn test_reset_clears_timers() {
        let (mut store, mut projectiles, mut rng) = setup();
        let mut firing = EnemyFireControl::new(1000, 1.0);
        let enemies = vec![Enemy::new(1, EnemyKind::Normal, 100.0, 100.0)];

        firing.update(&enemies, &mut store, &mut projectiles, 100, &mut rng);
        firing.reset();
        assert_eq!(firing.update(&enemies, &mut store, &mut projectiles, 100, &mut rng), 1);
    }
}
