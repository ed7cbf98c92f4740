//! Enemy formation lifecycle: spawning, descent, destruction and reset.

use crate::config::GridLayout;
use log::{debug, info};
use rand::Rng;
use shared::{Enemy, EnemyKind};

#[derive(Debug, Clone)]
pub struct WaveDirector {
    grid: GridLayout,
    descent_speed: f32,
    enemies: Vec<Enemy>,
    wave: u32,
    next_enemy_id: u32,
}

impl WaveDirector {
    pub fn new(grid: GridLayout, descent_speed: f32) -> Self {
        Self {
            grid,
            descent_speed,
            enemies: Vec::new(),
            wave: 0,
            next_enemy_id: 1,
        }
    }

    pub fn wave(&self) -> u32 {
        self.wave
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn enemy(&self, id: u32) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn active_enemies(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.iter().filter(|e| e.active)
    }

    /// Replaces the current formation with a fresh grid for wave `n`.
    pub fn start_wave<R: Rng + ?Sized>(&mut self, n: u32, rng: &mut R) {
        self.enemies.clear();
        self.wave = n;

        for row in 0..self.grid.rows {
            for col in 0..self.grid.cols {
                let kind = if rng.gen_bool(self.grid.falcon_chance.clamp(0.0, 1.0)) {
                    EnemyKind::Falcon
                } else {
                    EnemyKind::Normal
                };
                let x = self.grid.origin_x + col as f32 * self.grid.spacing_x;
                let y = self.grid.origin_y + row as f32 * self.grid.spacing_y;

                self.enemies.push(Enemy::new(self.next_enemy_id, kind, x, y));
                self.next_enemy_id += 1;
            }
        }

        info!("Wave {} started with {} enemies", n, self.enemies.len());
    }

    pub fn update(&mut self, dt: f32, boundary_height: f32) {
        for enemy in &mut self.enemies {
            if enemy.active {
                enemy.y += self.descent_speed * dt;
            }
            enemy.visible = enemy.active && enemy.y >= 0.0 && enemy.y <= boundary_height;
        }
    }

    /// Returns true only when this call changed the enemy from active to
    /// inactive.
    pub fn destroy_enemy_by_id(&mut self, id: u32) -> bool {
        match self.enemies.iter_mut().find(|e| e.id == id) {
            Some(enemy) if enemy.active => {
                enemy.active = false;
                enemy.visible = false;
                debug!("Enemy {} destroyed", id);
                true
            }
            _ => false,
        }
    }

    pub fn reset_active_enemy_positions(&mut self) {
        for enemy in self.enemies.iter_mut().filter(|e| e.active) {
            enemy.y = enemy.start_y;
            enemy.visible = true;
        }
        info!("Active enemies of wave {} returned to their start row", self.wave);
    }

    pub fn all_inactive(&self) -> bool {
        self.enemies.iter().all(|e| !e.active)
    }

    pub fn any_reached_bottom(&self, height: f32) -> bool {
        self.active_enemies().any(|e| e.y >= height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn director() -> WaveDirector {
        WaveDirector::new(GridLayout::default(), 20.0)
    }

    #[test]
    fn test_start_wave_spawns_grid() {
        let mut waves = director();
        let mut rng = StdRng::seed_from_u64(7);
        waves.start_wave(1, &mut rng);

        assert_eq!(waves.wave(), 1);
        assert_eq!(waves.enemies().len(), 21);
        let first = &waves.enemies()[0];
        assert_eq!((first.x, first.y), (362.0, 160.0));
        let last = &waves.enemies()[20];
        assert_eq!((last.x, last.y), (362.0 + 6.0 * 50.0, 160.0 + 2.0 * 40.0));
        assert!(waves.enemies().iter().all(|e| e.active && e.start_y == e.y));
    }

    #[test]
    fn test_falcon_share_follows_chance() {
        let mut grid = GridLayout::default();
        grid.falcon_chance = 1.0;
        let mut waves = WaveDirector::new(grid, 20.0);
        waves.start_wave(1, &mut StdRng::seed_from_u64(1));
        assert!(waves.enemies().iter().all(|e| e.kind == EnemyKind::Falcon));

        let mut grid = GridLayout::default();
        grid.falcon_chance = 0.0;
        let mut waves = WaveDirector::new(grid, 20.0);
        waves.start_wave(1, &mut StdRng::seed_from_u64(1));
        assert!(waves.enemies().iter().all(|e| e.kind == EnemyKind::Normal));
    }

    #[test]
    fn test_enemy_ids_unique_across_waves() {
        let mut waves = director();
        let mut rng = StdRng::seed_from_u64(3);
        waves.start_wave(1, &mut rng);
        let first_ids: Vec<u32> = waves.enemies().iter().map(|e| e.id).collect();
        waves.start_wave(2, &mut rng);
        assert!(waves
            .enemies()
            .iter()
            .all(|e| !first_ids.contains(&e.id)));
    }

    #[test]
    fn test_update_descends_active_only() {
        let mut waves = director();
        waves.start_wave(1, &mut StdRng::seed_from_u64(3));
        let destroyed = waves.enemies()[0].id;
        waves.destroy_enemy_by_id(destroyed);

        waves.update(0.5, 768.0);

        assert_approx_eq!(waves.enemies()[0].y, 160.0, 0.001);
        assert_approx_eq!(waves.enemies()[1].y, 170.0, 0.001);
        assert!(!waves.enemies()[0].visible);
        assert!(waves.enemies()[1].visible);
    }

    #[test]
    fn test_enemy_below_boundary_is_invisible() {
        let mut waves = director();
        waves.start_wave(1, &mut StdRng::seed_from_u64(3));
        waves.update(1.0, 100.0);
        assert!(waves.enemies().iter().all(|e| !e.visible));
        assert!(waves.any_reached_bottom(100.0));
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut waves = director();
        waves.start_wave(1, &mut StdRng::seed_from_u64(3));
        let id = waves.enemies()[4].id;

        assert!(waves.destroy_enemy_by_id(id));
        assert!(!waves.destroy_enemy_by_id(id));
        assert!(!waves.destroy_enemy_by_id(9999));
        assert_eq!(waves.active_enemies().count(), 20);
    }

    #[test]
    fn test_reset_active_positions() {
        let mut waves = director();
        waves.start_wave(1, &mut StdRng::seed_from_u64(3));
        waves.update(100.0, 10_000.0);
        waves.update(0.0, 100.0);
        waves.reset_active_enemy_positions();

        for enemy in waves.enemies() {
            assert_eq!(enemy.y, enemy.start_y);
            assert!(enemy.visible);
        }
    }

    #[test]
    fn test_all_inactive() {
        let mut waves = director();
        waves.start_wave(1, &mut StdRng::seed_from_u64(3));
        assert!(!waves.all_inactive());

        let ids: Vec<u32> = waves.enemies().iter().map(|e| e.id).collect();
        for id in ids {
            waves.destroy_enemy_by_id(id);
        }
        assert!(waves.all_inactive());
        assert!(!waves.any_reached_bottom(0.0));
    }
}
