//! Turns successive authoritative snapshots into presentation commands.
//!
//! Every collection is diffed by id against the previous snapshot: ids only in
//! the new snapshot are spawned, ids in both are updated and ids only in the
//! old one are despawned. Transitions that deserve a one-off effect (a hit
//! flash, an explosion, a wave banner, the game over screen) are detected here
//! so each fires exactly once.

use crate::interpolation::Interpolated;
use crate::prediction::{PredictedProjectile, PredictionQueue};
use crate::presentation::{
    enemy_projectile_sprite, EntityKey, PresentationCommand, PLAYER_PROJECTILE_SPRITE,
    PLAYER_SPRITE,
};
use log::{debug, info};
use shared::{Enemy, GameStatus, Owner, Player, Projectile, Snapshot};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
pub struct PlayerView {
    pub lives: u32,
    pub active: bool,
    pub invincible: bool,
    pub motion: Interpolated,
}

#[derive(Debug, Clone)]
pub struct EnemyView {
    pub active: bool,
    pub visible: bool,
    pub motion: Interpolated,
}

/// Mirror of a projectile, advanced locally between snapshots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileView {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

impl From<&Projectile> for ProjectileView {
    fn from(projectile: &Projectile) -> Self {
        Self {
            x: projectile.x,
            y: projectile.y,
            vx: projectile.vx,
            vy: projectile.vy,
        }
    }
}

pub struct StateReconciler {
    local_id: Option<u32>,
    window_ms: u64,
    players: BTreeMap<u32, PlayerView>,
    enemies: BTreeMap<u32, EnemyView>,
    player_projectiles: BTreeMap<u32, ProjectileView>,
    enemy_projectiles: BTreeMap<u32, ProjectileView>,
    wave: Option<u32>,
    status: Option<GameStatus>,
    commands: Vec<PresentationCommand>,
}

impl StateReconciler {
    pub fn new(window_ms: u64) -> Self {
        Self {
            local_id: None,
            window_ms,
            players: BTreeMap::new(),
            enemies: BTreeMap::new(),
            player_projectiles: BTreeMap::new(),
            enemy_projectiles: BTreeMap::new(),
            wave: None,
            status: None,
            commands: Vec::new(),
        }
    }

    pub fn set_local_id(&mut self, id: u32) {
        self.local_id = Some(id);
    }

    pub fn local_id(&self) -> Option<u32> {
        self.local_id
    }

    pub fn player(&self, id: u32) -> Option<&PlayerView> {
        self.players.get(&id)
    }

    pub fn enemy(&self, id: u32) -> Option<&EnemyView> {
        self.enemies.get(&id)
    }

    pub fn player_projectile(&self, id: u32) -> Option<&ProjectileView> {
        self.player_projectiles.get(&id)
    }

    pub fn enemy_projectile(&self, id: u32) -> Option<&ProjectileView> {
        self.enemy_projectiles.get(&id)
    }

    pub fn wave(&self) -> Option<u32> {
        self.wave
    }

    pub fn status(&self) -> Option<GameStatus> {
        self.status
    }

    /// Takes every command queued since the last call, in emission order.
    pub fn drain_commands(&mut self) -> Vec<PresentationCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn spawn_predicted(&mut self, predicted: &PredictedProjectile) {
        self.commands.push(PresentationCommand::Spawn {
            key: EntityKey::PredictedProjectile(predicted.local_id),
            sprite: PLAYER_PROJECTILE_SPRITE,
            x: predicted.x,
            y: predicted.y,
            tint: None,
        });
    }

    pub fn despawn_predicted(&mut self, local_id: u32) {
        self.commands.push(PresentationCommand::Despawn {
            key: EntityKey::PredictedProjectile(local_id),
        });
    }

    /// Reconciles one authoritative snapshot.
    pub fn apply(&mut self, snapshot: &Snapshot, prediction: &mut PredictionQueue, now_ms: u64) {
        self.apply_players(&snapshot.players, now_ms);
        self.apply_enemies(&snapshot.enemies, now_ms);
        self.apply_player_projectiles(&snapshot.player_projectiles, prediction);
        self.apply_enemy_projectiles(&snapshot.enemy_projectiles);
        self.apply_wave(snapshot.wave);
        self.apply_status(snapshot.game_state);
    }

    /// Advances local motion between snapshots and queues the resulting moves.
    pub fn frame(&mut self, now_ms: u64, dt: f32, prediction: &mut PredictionQueue) {
        let window_ms = self.window_ms;

        for (&id, view) in self.players.iter_mut() {
            if Some(id) == self.local_id {
                continue;
            }
            let (x, y) = view.motion.sample(now_ms, window_ms);
            self.commands.push(PresentationCommand::Move {
                key: EntityKey::Player(id),
                x,
                y,
            });
        }

        for (&id, view) in self.enemies.iter_mut().filter(|(_, v)| v.visible) {
            let (x, y) = view.motion.sample(now_ms, window_ms);
            self.commands.push(PresentationCommand::Move {
                key: EntityKey::Enemy(id),
                x,
                y,
            });
        }

        advance_projectiles(
            &mut self.player_projectiles,
            dt,
            EntityKey::PlayerProjectile,
            &mut self.commands,
        );
        advance_projectiles(
            &mut self.enemy_projectiles,
            dt,
            EntityKey::EnemyProjectile,
            &mut self.commands,
        );

        prediction.advance(dt);
        for local_id in prediction.expire(now_ms) {
            self.commands.push(PresentationCommand::Despawn {
                key: EntityKey::PredictedProjectile(local_id),
            });
        }
        for predicted in prediction.projectiles() {
            self.commands.push(PresentationCommand::Move {
                key: EntityKey::PredictedProjectile(predicted.local_id),
                x: predicted.x,
                y: predicted.y,
            });
        }
    }

    fn apply_players(&mut self, players: &BTreeMap<u32, Player>, now_ms: u64) {
        let removed: Vec<u32> = self
            .players
            .keys()
            .filter(|id| !players.contains_key(id))
            .copied()
            .collect();
        for id in removed {
            self.players.remove(&id);
            self.commands.push(PresentationCommand::Despawn {
                key: EntityKey::Player(id),
            });
        }

        for (&id, player) in players {
            let key = EntityKey::Player(id);
            let is_local = Some(id) == self.local_id;

            let Some(view) = self.players.get_mut(&id) else {
                self.commands.push(PresentationCommand::Spawn {
                    key,
                    sprite: PLAYER_SPRITE,
                    x: player.x,
                    y: player.y,
                    tint: Some(player.color.clone()),
                });
                if !player.is_active {
                    self.commands
                        .push(PresentationCommand::SetVisible { key, visible: false });
                }
                self.players.insert(
                    id,
                    PlayerView {
                        lives: player.lives,
                        active: player.is_active,
                        invincible: player.is_invincible,
                        motion: Interpolated::new(player.x, player.y, now_ms),
                    },
                );
                continue;
            };

            if player.lives < view.lives && !player.is_invincible {
                self.commands.push(PresentationCommand::HitCue { key });
            }
            if view.active && !player.is_active {
                let (x, y) = view.motion.current();
                self.commands.push(PresentationCommand::Explosion { x, y });
                self.commands
                    .push(PresentationCommand::SetVisible { key, visible: false });
                debug!("Player {} eliminated", id);
            } else if !view.active && player.is_active {
                self.commands
                    .push(PresentationCommand::SetVisible { key, visible: true });
            }

            if is_local {
                view.motion.snap(player.x, player.y, now_ms);
                self.commands.push(PresentationCommand::Move {
                    key,
                    x: player.x,
                    y: player.y,
                });
            } else {
                view.motion.retarget(player.x, player.y, now_ms);
            }

            view.lives = player.lives;
            view.active = player.is_active;
            view.invincible = player.is_invincible;
        }
    }

    fn apply_enemies(&mut self, enemies: &[Enemy], now_ms: u64) {
        let incoming: BTreeSet<u32> = enemies.iter().map(|e| e.id).collect();
        let removed: Vec<u32> = self
            .enemies
            .keys()
            .filter(|id| !incoming.contains(id))
            .copied()
            .collect();
        for id in removed {
            self.enemies.remove(&id);
            self.commands.push(PresentationCommand::Despawn {
                key: EntityKey::Enemy(id),
            });
        }

        for enemy in enemies {
            let key = EntityKey::Enemy(enemy.id);
            let visible = enemy.active && enemy.visible;

            let Some(view) = self.enemies.get_mut(&enemy.id) else {
                self.commands.push(PresentationCommand::Spawn {
                    key,
                    sprite: enemy.kind.profile().sprite,
                    x: enemy.x,
                    y: enemy.y,
                    tint: None,
                });
                if !visible {
                    self.commands
                        .push(PresentationCommand::SetVisible { key, visible: false });
                }
                self.enemies.insert(
                    enemy.id,
                    EnemyView {
                        active: enemy.active,
                        visible,
                        motion: Interpolated::new(enemy.x, enemy.y, now_ms),
                    },
                );
                continue;
            };

            if view.active && !enemy.active {
                let (x, y) = view.motion.current();
                self.commands.push(PresentationCommand::Explosion { x, y });
            }
            if view.visible != visible {
                self.commands
                    .push(PresentationCommand::SetVisible { key, visible });
            }

            // A respawned formation jumps back up instead of gliding there.
            if enemy.y < view.motion.target().1 {
                view.motion.snap(enemy.x, enemy.y, now_ms);
            } else {
                view.motion.retarget(enemy.x, enemy.y, now_ms);
            }
            view.active = enemy.active;
            view.visible = visible;
        }
    }

    fn apply_player_projectiles(
        &mut self,
        projectiles: &[Projectile],
        prediction: &mut PredictionQueue,
    ) {
        let incoming: BTreeSet<u32> = projectiles.iter().map(|p| p.id).collect();
        despawn_missing(
            &mut self.player_projectiles,
            &incoming,
            EntityKey::PlayerProjectile,
            &mut self.commands,
        );

        for projectile in projectiles {
            let key = EntityKey::PlayerProjectile(projectile.id);
            let view = ProjectileView::from(projectile);

            if self.player_projectiles.insert(projectile.id, view).is_some() {
                self.commands.push(PresentationCommand::Move {
                    key,
                    x: view.x,
                    y: view.y,
                });
                continue;
            }

            let claimed = match (self.local_id, projectile.owner_id) {
                (Some(local), Owner::Player(owner)) if local == owner => prediction.claim(owner),
                _ => None,
            };

            match claimed {
                Some(predicted) => {
                    debug!(
                        "Prediction {} confirmed as projectile {}",
                        predicted.local_id, projectile.id
                    );
                    self.commands.push(PresentationCommand::Rekey {
                        from: EntityKey::PredictedProjectile(predicted.local_id),
                        to: key,
                    });
                    self.commands.push(PresentationCommand::Move {
                        key,
                        x: view.x,
                        y: view.y,
                    });
                }
                None => self.commands.push(PresentationCommand::Spawn {
                    key,
                    sprite: PLAYER_PROJECTILE_SPRITE,
                    x: view.x,
                    y: view.y,
                    tint: None,
                }),
            }
        }
    }

    fn apply_enemy_projectiles(&mut self, projectiles: &[Projectile]) {
        let incoming: BTreeSet<u32> = projectiles.iter().map(|p| p.id).collect();
        despawn_missing(
            &mut self.enemy_projectiles,
            &incoming,
            EntityKey::EnemyProjectile,
            &mut self.commands,
        );

        for projectile in projectiles {
            let key = EntityKey::EnemyProjectile(projectile.id);
            let view = ProjectileView::from(projectile);

            if self.enemy_projectiles.insert(projectile.id, view).is_some() {
                self.commands.push(PresentationCommand::Move {
                    key,
                    x: view.x,
                    y: view.y,
                });
            } else {
                self.commands.push(PresentationCommand::Spawn {
                    key,
                    sprite: enemy_projectile_sprite(projectile.kind),
                    x: view.x,
                    y: view.y,
                    tint: None,
                });
            }
        }
    }

    fn apply_wave(&mut self, wave: u32) {
        if self.wave != Some(wave) {
            info!("Wave {}", wave);
            self.wave = Some(wave);
            self.commands.push(PresentationCommand::WaveChanged { wave });
        }
    }

    fn apply_status(&mut self, status: GameStatus) {
        let previous = self.status.replace(status);
        match (previous, status) {
            (Some(GameStatus::GameOver), GameStatus::GameOver) => {}
            (_, GameStatus::GameOver) => {
                info!("Game over");
                self.commands.push(PresentationCommand::GameOverShown);
            }
            (Some(GameStatus::GameOver), GameStatus::Playing) => {
                info!("Game restarted");
                self.commands.push(PresentationCommand::GameOverHidden);
            }
            _ => {}
        }
    }
}

fn despawn_missing(
    views: &mut BTreeMap<u32, ProjectileView>,
    incoming: &BTreeSet<u32>,
    key: fn(u32) -> EntityKey,
    commands: &mut Vec<PresentationCommand>,
) {
    views.retain(|id, _| {
        let keep = incoming.contains(id);
        if !keep {
            commands.push(PresentationCommand::Despawn { key: key(*id) });
        }
        keep
    });
}

fn advance_projectiles(
    views: &mut BTreeMap<u32, ProjectileView>,
    dt: f32,
    key: fn(u32) -> EntityKey,
    commands: &mut Vec<PresentationCommand>,
) {
    for (&id, view) in views.iter_mut() {
        view.x += view.vx * dt;
        view.y += view.vy * dt;
        commands.push(PresentationCommand::Move {
            key: key(id),
            x: view.x,
            y: view.y,
        });
    }
}
