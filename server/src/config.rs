//! Tunable simulation parameters.

use shared::{
    ENEMY_COLLISION_COOLDOWN_MS, ENEMY_DESCENT_SPEED, ENEMY_FIRE_CHANCE, ENEMY_TYPE_COOLDOWN_MS,
    FALCON_PROJECTILE_SPEED, FIRE_COOLDOWN_MS, GAME_HEIGHT, GAME_WIDTH, INITIAL_LIVES,
    MUZZLE_OFFSET, NORMAL_PROJECTILE_SPEED, PLAYER_PROJECTILE_SPEED, PLAYER_SPEED, SPREAD_ANGLE,
    TICK_RATE,
};
use std::time::Duration;

/// Layout of the enemy formation spawned at the start of every wave.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub rows: u32,
    pub cols: u32,
    pub origin_x: f32,
    pub origin_y: f32,
    pub spacing_x: f32,
    pub spacing_y: f32,
    /// Probability that a cell spawns a Falcon instead of a Normal enemy.
    pub falcon_chance: f64,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            rows: 3,
            cols: 7,
            origin_x: 362.0,
            origin_y: 160.0,
            spacing_x: 50.0,
            spacing_y: 40.0,
            falcon_chance: 0.3,
        }
    }
}

impl GridLayout {
    pub fn len(&self) -> usize {
        (self.rows * self.cols) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub width: f32,
    pub height: f32,
    pub tick_rate: u32,
    /// Upper bound on the simulated step, in seconds.
    pub max_delta: f32,

    pub player_speed: f32,
    pub initial_lives: u32,
    pub fire_cooldown_ms: u64,
    pub enemy_collision_cooldown_ms: u64,

    pub player_projectile_speed: f32,
    pub normal_projectile_speed: f32,
    pub falcon_projectile_speed: f32,
    pub muzzle_offset: f32,
    pub spread_angle: f32,

    pub enemy_descent_speed: f32,
    pub enemy_type_cooldown_ms: u64,
    pub enemy_fire_chance: f64,
    pub grid: GridLayout,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: GAME_WIDTH,
            height: GAME_HEIGHT,
            tick_rate: TICK_RATE,
            max_delta: 0.05,
            player_speed: PLAYER_SPEED,
            initial_lives: INITIAL_LIVES,
            fire_cooldown_ms: FIRE_COOLDOWN_MS,
            enemy_collision_cooldown_ms: ENEMY_COLLISION_COOLDOWN_MS,
            player_projectile_speed: PLAYER_PROJECTILE_SPEED,
            normal_projectile_speed: NORMAL_PROJECTILE_SPEED,
            falcon_projectile_speed: FALCON_PROJECTILE_SPEED,
            muzzle_offset: MUZZLE_OFFSET,
            spread_angle: SPREAD_ANGLE,
            enemy_descent_speed: ENEMY_DESCENT_SPEED,
            enemy_type_cooldown_ms: ENEMY_TYPE_COOLDOWN_MS,
            enemy_fire_chance: ENEMY_FIRE_CHANCE,
            grid: GridLayout::default(),
        }
    }
}

impl GameConfig {
    pub fn with_tick_rate(mut self, tick_rate: u32) -> Self {
        self.tick_rate = tick_rate.max(1);
        self
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.tick_rate.max(1) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_has_21_cells() {
        let config = GameConfig::default();
        assert_eq!(config.grid.len(), 21);
        assert!(!config.grid.is_empty());
    }

    #[test]
    fn test_tick_duration() {
        let config = GameConfig::default();
        assert_eq!(config.tick_duration(), Duration::from_micros(16_666));

        let config = GameConfig::default().with_tick_rate(0);
        assert_eq!(config.tick_rate, 1);
        assert_eq!(config.tick_duration(), Duration::from_secs(1));
    }
}
