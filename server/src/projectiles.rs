//! Projectile spawning, movement and off-screen culling.

use crate::store::EntityStore;
use log::debug;
use shared::{
    Owner, Projectile, ProjectileKind, FALCON_PROJECTILE_SPEED, NORMAL_PROJECTILE_SPEED,
};

#[derive(Debug, Clone)]
pub struct ProjectileController {
    player_speed: f32,
    normal_speed: f32,
    falcon_speed: f32,
    muzzle_offset: f32,
    spread_angle: f32,
    next_id: u32,
}

impl ProjectileController {
    pub fn new(player_speed: f32, muzzle_offset: f32, spread_angle: f32) -> Self {
        Self {
            player_speed,
            normal_speed: NORMAL_PROJECTILE_SPEED,
            falcon_speed: FALCON_PROJECTILE_SPEED,
            muzzle_offset,
            spread_angle,
            next_id: 1,
        }
    }

    pub fn with_enemy_speeds(mut self, normal: f32, falcon: f32) -> Self {
        self.normal_speed = normal;
        self.falcon_speed = falcon;
        self
    }

    pub fn enemy_speed(&self, kind: ProjectileKind) -> f32 {
        match kind {
            ProjectileKind::Normal => self.normal_speed,
            ProjectileKind::Falcon => self.falcon_speed,
        }
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    /// Fires straight up from just above the player.
    pub fn spawn_player_projectile(
        &mut self,
        store: &mut EntityStore,
        player_id: u32,
        x: f32,
        y: f32,
    ) -> u32 {
        let id = self.allocate_id();
        store.insert_player_projectile(Projectile {
            id,
            owner_id: Owner::Player(player_id),
            x,
            y: y - self.muzzle_offset,
            vx: 0.0,
            vy: -self.player_speed,
            kind: None,
        });
        debug!("Player {} projectile {} spawned", player_id, id);
        id
    }

    /// Fires straight down from just below the enemy.
    pub fn spawn_enemy_projectile(
        &mut self,
        store: &mut EntityStore,
        x: f32,
        y: f32,
        kind: ProjectileKind,
    ) -> u32 {
        let id = self.allocate_id();
        store.insert_enemy_projectile(Projectile {
            id,
            owner_id: Owner::Enemy,
            x,
            y: y + self.muzzle_offset,
            vx: 0.0,
            vy: self.enemy_speed(kind),
            kind: Some(kind),
        });
        id
    }

    /// Elite shot: two falcon projectiles angled symmetrically off vertical.
    pub fn spawn_spread(&mut self, store: &mut EntityStore, x: f32, y: f32) -> [u32; 2] {
        let speed = self.falcon_speed;
        let mut ids = [0; 2];

        for (slot, angle) in [-self.spread_angle, self.spread_angle].into_iter().enumerate() {
            let id = self.allocate_id();
            store.insert_enemy_projectile(Projectile {
                id,
                owner_id: Owner::Enemy,
                x,
                y: y + self.muzzle_offset,
                vx: speed * angle.sin(),
                vy: speed * angle.cos(),
                kind: Some(ProjectileKind::Falcon),
            });
            ids[slot] = id;
        }

        ids
    }

    /// Moves every projectile and drops those that left the world rectangle.
    pub fn update(&mut self, store: &mut EntityStore, dt: f32, width: f32, height: f32) {
        let (player_projectiles, enemy_projectiles) = store.projectiles_mut();
        for projectiles in [player_projectiles, enemy_projectiles] {
            projectiles.retain(|_, projectile| {
                projectile.advance(dt);
                projectile.is_within(width, height)
            });
        }
    }

    pub fn reset(&mut self, store: &mut EntityStore) {
        store.clear_projectiles();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use shared::{GAME_HEIGHT, GAME_WIDTH, SPREAD_ANGLE};

    fn controller() -> ProjectileController {
        ProjectileController::new(400.0, 20.0, SPREAD_ANGLE)
    }

    #[test]
    fn test_player_projectile_spawn() {
        let mut store = EntityStore::new();
        let mut projectiles = controller();
        let id = projectiles.spawn_player_projectile(&mut store, 3, 512.0, 700.0);

        let projectile = store.player_projectiles().next().unwrap();
        assert_eq!(projectile.id, id);
        assert_eq!(projectile.owner_id, Owner::Player(3));
        assert_eq!(projectile.y, 680.0);
        assert_eq!(projectile.vy, -400.0);
        assert!(projectile.kind.is_none());
    }

    #[test]
    fn test_enemy_projectile_speed_by_kind() {
        let mut store = EntityStore::new();
        let mut projectiles = controller();
        projectiles.spawn_enemy_projectile(&mut store, 100.0, 100.0, ProjectileKind::Normal);
        projectiles.spawn_enemy_projectile(&mut store, 100.0, 100.0, ProjectileKind::Falcon);

        let speeds: Vec<f32> = store.enemy_projectiles().map(|p| p.vy).collect();
        assert_eq!(speeds, vec![200.0, 300.0]);
        assert!(store.enemy_projectiles().all(|p| p.owner_id == Owner::Enemy));
    }

    #[test]
    fn test_enemy_speeds_are_configurable() {
        let mut store = EntityStore::new();
        let mut projectiles = controller().with_enemy_speeds(150.0, 350.0);
        projectiles.spawn_enemy_projectile(&mut store, 100.0, 100.0, ProjectileKind::Normal);
        projectiles.spawn_spread(&mut store, 100.0, 100.0);

        let shots: Vec<&Projectile> = store.enemy_projectiles().collect();
        assert_eq!(shots[0].vy, 150.0);
        for spread in &shots[1..] {
            assert_approx_eq!(spread.vx.hypot(spread.vy), 350.0, 0.001);
        }
    }

    #[test]
    fn test_spread_is_symmetric() {
        let mut store = EntityStore::new();
        let mut projectiles = controller();
        let [left, right] = projectiles.spawn_spread(&mut store, 200.0, 100.0);
        assert_ne!(left, right);

        let shots: Vec<&Projectile> = store.enemy_projectiles().collect();
        assert_eq!(shots.len(), 2);
        assert_approx_eq!(shots[0].vx, -shots[1].vx, 0.0001);
        assert_approx_eq!(shots[0].vy, shots[1].vy, 0.0001);
        assert!(shots[0].vy > 0.0);
        let angle = shots[1].vx.atan2(shots[1].vy);
        assert_approx_eq!(angle, SPREAD_ANGLE, 0.0001);
        assert!(shots.iter().all(|p| p.kind == Some(ProjectileKind::Falcon)));
    }

    #[test]
    fn test_update_moves_and_culls() {
        let mut store = EntityStore::new();
        let mut projectiles = controller();
        projectiles.spawn_player_projectile(&mut store, 1, 100.0, 30.0);
        projectiles.spawn_player_projectile(&mut store, 1, 100.0, 500.0);
        projectiles.spawn_enemy_projectile(&mut store, 100.0, 740.0, ProjectileKind::Normal);

        projectiles.update(&mut store, 0.05, GAME_WIDTH, GAME_HEIGHT);

        let remaining: Vec<&Projectile> = store.player_projectiles().collect();
        assert_eq!(remaining.len(), 1);
        assert_approx_eq!(remaining[0].y, 460.0, 0.001);
        assert_eq!(store.enemy_projectiles().count(), 0);
    }

    #[test]
    fn test_reset_clears_both_collections() {
        let mut store = EntityStore::new();
        let mut projectiles = controller();
        projectiles.spawn_player_projectile(&mut store, 1, 100.0, 300.0);
        projectiles.spawn_spread(&mut store, 100.0, 100.0);

        projectiles.reset(&mut store);
        assert_eq!(store.player_projectiles().count(), 0);
        assert_eq!(store.enemy_projectiles().count(), 0);
    }
}
