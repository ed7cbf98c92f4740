use crate::collision::{self, Collision};
use crate::config::GameConfig;
use crate::firing::EnemyFireControl;
use crate::players::PlayerController;
use crate::projectiles::ProjectileController;
use crate::store::EntityStore;
use crate::waves::WaveDirector;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{GameStatus, InputState, Snapshot};

/// Lifecycle of the simulation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nobody has signalled ready since the last time the room emptied.
    Idle,
    Running,
    /// The round ended and waits for a restart request.
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("restart requested while the game is still playing")]
    RestartWhilePlaying,
    #[error("game loop is already started")]
    NotIdle,
}

/// Owns the whole authoritative world and advances it one tick at a time.
#[derive(Debug, Clone)]
pub struct Game {
    config: GameConfig,
    phase: Phase,
    status: GameStatus,
    store: EntityStore,
    waves: WaveDirector,
    players: PlayerController,
    projectiles: ProjectileController,
    firing: EnemyFireControl,
    rng: StdRng,
    last_tick_ms: Option<u64>,
    tick: u64,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, rng: StdRng) -> Self {
        Self {
            phase: Phase::Idle,
            status: GameStatus::Playing,
            store: EntityStore::new(),
            waves: WaveDirector::new(config.grid.clone(), config.enemy_descent_speed),
            players: PlayerController::new(
                config.player_speed,
                config.initial_lives,
                config.fire_cooldown_ms,
                config.enemy_collision_cooldown_ms,
            ),
            projectiles: ProjectileController::new(
                config.player_projectile_speed,
                config.muzzle_offset,
                config.spread_angle,
            )
            .with_enemy_speeds(config.normal_projectile_speed, config.falcon_projectile_speed),
            firing: EnemyFireControl::new(config.enemy_type_cooldown_ms, config.enemy_fire_chance),
            rng,
            last_tick_ms: None,
            tick: 0,
            config,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn wave(&self) -> u32 {
        self.waves.wave()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    pub fn waves(&self) -> &WaveDirector {
        &self.waves
    }

    pub fn firing(&self) -> &EnemyFireControl {
        &self.firing
    }

    pub fn waves_mut(&mut self) -> &mut WaveDirector {
        &mut self.waves
    }

    pub fn add_player(&mut self, id: u32, color: &str) {
        self.players.add_player(&mut self.store, id, color);
    }

    pub fn remove_player(&mut self, id: u32) {
        self.players.remove_player(&mut self.store, id);
    }

    pub fn apply_input(&mut self, id: u32, input: InputState) {
        self.players.apply_input(&self.store, id, input);
    }

    pub fn toggle_invincible(&mut self, id: u32) -> Option<bool> {
        self.players.toggle_invincible(&mut self.store, id)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store
            .snapshot(self.waves.enemies(), self.waves.wave(), self.status)
    }

    fn reset_round(&mut self, now_ms: u64) {
        self.projectiles.reset(&mut self.store);
        self.players.reset_players(&mut self.store);
        self.firing.reset();
        self.status = GameStatus::Playing;
        self.waves.start_wave(1, &mut self.rng);
        self.phase = Phase::Running;
        self.last_tick_ms = Some(now_ms);
    }

    /// Starts the loop on the first ready signal. Only valid from `Idle`.
    pub fn start(&mut self, now_ms: u64) -> Result<(), GameError> {
        if self.phase != Phase::Idle {
            return Err(GameError::NotIdle);
        }
        info!("Starting game loop");
        self.reset_round(now_ms);
        Ok(())
    }

    /// Halts the loop once the room is empty.
    pub fn stop(&mut self) {
        if self.phase == Phase::Idle {
            return;
        }
        info!("Stopping game loop");
        self.phase = Phase::Idle;
        self.status = GameStatus::GameOver;
        self.last_tick_ms = None;
    }

    pub fn request_restart(&mut self, now_ms: u64) -> Result<(), GameError> {
        if self.phase != Phase::GameOver {
            warn!("Restart requested while game is still playing");
            return Err(GameError::RestartWhilePlaying);
        }
        info!("Restart approved");
        self.reset_round(now_ms);
        Ok(())
    }

    /// Advances the world to `now_ms` and returns the snapshot to broadcast.
    ///
    /// Does nothing unless the loop is running. The simulated step is capped
    /// at `max_delta` so a stalled loop cannot teleport entities.
    pub fn tick(&mut self, now_ms: u64) -> Option<Snapshot> {
        if self.phase != Phase::Running {
            return None;
        }

        let last = self.last_tick_ms.unwrap_or(now_ms);
        let dt = (now_ms.saturating_sub(last) as f32 / 1000.0).min(self.config.max_delta);
        self.last_tick_ms = Some(now_ms);
        self.tick += 1;

        let (width, height) = (self.config.width, self.config.height);

        self.players
            .update(&mut self.store, &mut self.projectiles, dt, now_ms);
        self.waves.update(dt, height);
        self.firing.update(
            self.waves.enemies(),
            &mut self.store,
            &mut self.projectiles,
            now_ms,
            &mut self.rng,
        );
        self.projectiles.update(&mut self.store, dt, width, height);
        self.resolve_collisions(now_ms);
        self.check_round_end(height);

        Some(self.snapshot())
    }

    fn resolve_collisions(&mut self, now_ms: u64) {
        for hit in collision::detect(&self.store, self.waves.enemies()) {
            match hit {
                Collision::ProjectileHitEnemy {
                    projectile_id,
                    enemy_id,
                } => {
                    self.store.remove_player_projectile(projectile_id);
                    self.waves.destroy_enemy_by_id(enemy_id);
                }
                Collision::ProjectileHitPlayer {
                    projectile_id,
                    player_id,
                } => {
                    self.store.remove_enemy_projectile(projectile_id);
                    self.players.handle_projectile_hit(&mut self.store, player_id);
                }
                Collision::PlayerTouchedEnemy { player_id, .. } => {
                    self.players
                        .handle_enemy_collision(&mut self.store, player_id, now_ms);
                }
            }
        }
    }

    fn check_round_end(&mut self, height: f32) {
        let total = self.store.player_count();
        if total > 0 && self.store.players().all(|p| !p.is_active) {
            info!("Game over: all players are out");
            self.game_over();
            return;
        }

        if self.waves.any_reached_bottom(height) {
            let shielded = {
                let mut active = self.store.players().filter(|p| p.is_active).peekable();
                active.peek().is_some() && active.all(|p| p.is_invincible)
            };
            if !shielded {
                info!("Game over: an enemy reached the bottom");
                self.game_over();
                return;
            }
            self.waves.reset_active_enemy_positions();
        }

        if self.waves.all_inactive() {
            let next = self.waves.wave() + 1;
            info!("Wave {} cleared", self.waves.wave());
            self.waves.start_wave(next, &mut self.rng);
            self.firing.retain_enemies(self.waves.enemies());
        }
    }

    fn game_over(&mut self) {
        self.status = GameStatus::GameOver;
        self.phase = Phase::GameOver;
    }
}
