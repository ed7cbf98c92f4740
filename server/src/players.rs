//! Player lifecycle, movement, firing and damage rules.

use crate::projectiles::ProjectileController;
use crate::store::EntityStore;
use log::{debug, info};
use shared::{InputState, Player};
use std::collections::{HashMap, HashSet};

/// What a damage trigger did to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    Ignored,
    Damaged,
    Eliminated,
}

#[derive(Debug, Clone)]
pub struct PlayerController {
    speed: f32,
    initial_lives: u32,
    fire_cooldown_ms: u64,
    enemy_collision_cooldown_ms: u64,
    /// Most recent held-key state per player.
    inputs: HashMap<u32, InputState>,
    /// Fire presses seen since the last tick, consumed once.
    fire_latch: HashSet<u32>,
}

impl PlayerController {
    pub fn new(
        speed: f32,
        initial_lives: u32,
        fire_cooldown_ms: u64,
        enemy_collision_cooldown_ms: u64,
    ) -> Self {
        Self {
            speed,
            initial_lives,
            fire_cooldown_ms,
            enemy_collision_cooldown_ms,
            inputs: HashMap::new(),
            fire_latch: HashSet::new(),
        }
    }

    pub fn add_player(&mut self, store: &mut EntityStore, id: u32, color: &str) {
        let mut player = Player::new(id, color);
        player.lives = self.initial_lives;
        player.is_active = player.lives > 0;

        info!("Player {} added with color {}", id, color);
        store.insert_player(player);
        self.inputs.insert(id, InputState::default());
    }

    pub fn remove_player(&mut self, store: &mut EntityStore, id: u32) {
        if store.remove_player(id).is_some() {
            info!("Player {} removed", id);
        }
        self.inputs.remove(&id);
        self.fire_latch.remove(&id);
    }

    /// Buffers input for the next tick. Ignored for unknown or inactive players.
    pub fn apply_input(&mut self, store: &EntityStore, id: u32, input: InputState) {
        match store.player(id) {
            Some(player) if player.is_active => {
                if input.fire {
                    self.fire_latch.insert(id);
                }
                self.inputs.insert(id, input);
            }
            _ => {}
        }
    }

    /// Moves every active player by its held input and resolves fire requests.
    pub fn update(
        &mut self,
        store: &mut EntityStore,
        projectiles: &mut ProjectileController,
        dt: f32,
        now_ms: u64,
    ) {
        let mut shots = Vec::new();

        for player in store.players_mut() {
            if !player.is_active {
                continue;
            }
            let input = self.inputs.get(&player.id).copied().unwrap_or_default();

            let (dx, dy) = input.direction();
            player.x += dx * self.speed * dt;
            player.y += dy * self.speed * dt;

            let wants_fire = input.fire || self.fire_latch.contains(&player.id);
            let cooled_down = match player.last_shot_time {
                None => true,
                Some(last) => now_ms.saturating_sub(last) > self.fire_cooldown_ms,
            };
            if wants_fire && cooled_down {
                player.last_shot_time = Some(now_ms);
                shots.push((player.id, player.x, player.y));
            }
        }
        self.fire_latch.clear();

        for (id, x, y) in shots {
            projectiles.spawn_player_projectile(store, id, x, y);
        }
    }

    pub fn handle_projectile_hit(&mut self, store: &mut EntityStore, id: u32) -> HitOutcome {
        let Some(player) = store.player_mut(id) else {
            return HitOutcome::Ignored;
        };
        if !player.is_active || player.is_invincible {
            return HitOutcome::Ignored;
        }

        let outcome = Self::damage(player);
        debug!("Player {} hit by enemy projectile, lives {}", id, player.lives);
        outcome
    }

    /// Enemy contact only hurts once per cooldown window.
    pub fn handle_enemy_collision(
        &mut self,
        store: &mut EntityStore,
        id: u32,
        now_ms: u64,
    ) -> HitOutcome {
        let Some(player) = store.player_mut(id) else {
            return HitOutcome::Ignored;
        };
        if !player.is_active || player.is_invincible {
            return HitOutcome::Ignored;
        }

        let cooled_down = match player.last_enemy_collision_time {
            None => true,
            Some(last) => now_ms.saturating_sub(last) > self.enemy_collision_cooldown_ms,
        };
        if !cooled_down {
            return HitOutcome::Ignored;
        }

        player.last_enemy_collision_time = Some(now_ms);
        let outcome = Self::damage(player);
        debug!("Player {} collided with enemy, lives {}", id, player.lives);
        outcome
    }

    fn damage(player: &mut Player) -> HitOutcome {
        if player.take_hit() {
            info!("Player {} is out of lives", player.id);
            HitOutcome::Eliminated
        } else {
            HitOutcome::Damaged
        }
    }

    /// Flips invincibility for an active player. Returns the new state.
    pub fn toggle_invincible(&mut self, store: &mut EntityStore, id: u32) -> Option<bool> {
        let player = store.player_mut(id).filter(|p| p.is_active)?;
        player.is_invincible = !player.is_invincible;
        debug!("Player {} invincibility now {}", id, player.is_invincible);
        Some(player.is_invincible)
    }

    pub fn reset_players(&mut self, store: &mut EntityStore) {
        for player in store.players_mut() {
            player.lives = self.initial_lives;
            player.is_active = true;
            player.is_invincible = false;
            player.last_shot_time = None;
            player.last_enemy_collision_time = None;
            self.inputs.insert(player.id, InputState::default());
        }
        self.fire_latch.clear();
        info!("All players reset for a new game");
    }
}
