use crate::connection::ConnectionEvents;
use crate::interpolation::InterpolationConfig;
use crate::prediction::{PredictedProjectile, PredictionQueue};
use crate::presentation::PresentationCommand;
use crate::reconciler::StateReconciler;
use log::{debug, info, warn};
use shared::{
    GameStatus, Snapshot, Welcome, FIRE_COOLDOWN_MS, MUZZLE_OFFSET, PLAYER_PROJECTILE_SPEED,
};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub fire_cooldown_ms: u64,
    /// Predictions the server has not confirmed after this long are dropped.
    pub prediction_max_age_ms: u64,
    pub projectile_speed: f32,
    pub muzzle_offset: f32,
    pub interpolation: InterpolationConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            fire_cooldown_ms: FIRE_COOLDOWN_MS,
            prediction_max_age_ms: 2000,
            projectile_speed: PLAYER_PROJECTILE_SPEED,
            muzzle_offset: MUZZLE_OFFSET,
            interpolation: InterpolationConfig::default(),
        }
    }
}

/// Everything the client knows about the match
///
/// Authoritative state arrives through [`ConnectionEvents`]. Local shots are
/// predicted through [`ClientGameState::try_fire`]. The host drives time
/// forward with [`ClientGameState::frame`] and applies the commands it drains.
pub struct ClientGameState {
    config: ClientConfig,
    reconciler: StateReconciler,
    prediction: PredictionQueue,
    local_id: Option<u32>,
    color: Option<String>,
    now_ms: u64,
    closed: bool,
}

impl ClientGameState {
    pub fn new(config: ClientConfig) -> Self {
        let reconciler = StateReconciler::new(config.interpolation.window_ms);
        let prediction = PredictionQueue::new(
            config.fire_cooldown_ms,
            config.prediction_max_age_ms,
            config.projectile_speed,
            config.muzzle_offset,
        );

        Self {
            config,
            reconciler,
            prediction,
            local_id: None,
            color: None,
            now_ms: 0,
            closed: false,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn local_id(&self) -> Option<u32> {
        self.local_id
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn reconciler(&self) -> &StateReconciler {
        &self.reconciler
    }

    pub fn prediction(&self) -> &PredictionQueue {
        &self.prediction
    }

    /// Sets the timestamp used for snapshots received from now on.
    pub fn set_time(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
    }

    /// Predicts a shot from the local player if it is alive and off cooldown.
    ///
    /// The shot itself reaches the server through the regular `input`
    /// message, so nothing is sent here.
    pub fn try_fire(&mut self, now_ms: u64) -> Option<PredictedProjectile> {
        let id = self.local_id?;
        if self.reconciler.status() == Some(GameStatus::GameOver) {
            return None;
        }
        let player = self.reconciler.player(id)?;
        if !player.active {
            return None;
        }

        let (x, y) = player.motion.current();
        let predicted = self.prediction.fire(id, x, y, now_ms)?;
        debug!(
            "Predicted shot {} at ({}, {})",
            predicted.local_id, predicted.x, predicted.y
        );
        self.reconciler.spawn_predicted(&predicted);
        Some(predicted)
    }

    pub fn frame(&mut self, now_ms: u64, dt: f32) {
        self.now_ms = now_ms;
        self.reconciler.frame(now_ms, dt, &mut self.prediction);
    }

    pub fn drain_commands(&mut self) -> Vec<PresentationCommand> {
        self.reconciler.drain_commands()
    }
}

impl ConnectionEvents for ClientGameState {
    fn on_welcome(&mut self, welcome: Welcome) {
        info!("Joined as player {} ({})", welcome.id, welcome.color);
        self.local_id = Some(welcome.id);
        self.color = Some(welcome.color);
        self.reconciler.set_local_id(welcome.id);
    }

    fn on_state(&mut self, snapshot: Snapshot) {
        if self.local_id.is_none() {
            warn!("Snapshot arrived before welcome");
        }
        self.reconciler
            .apply(&snapshot, &mut self.prediction, self.now_ms);
    }

    fn on_closed(&mut self) {
        info!("Server connection lost");
        self.closed = true;
        for local_id in self.prediction.clear() {
            self.reconciler.despawn_predicted(local_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::EntityKey;
    use shared::{Owner, Player, Projectile};

    fn joined() -> ClientGameState {
        let mut state = ClientGameState::new(ClientConfig::default());
        state.on_welcome(Welcome {
            id: 1,
            color: "#ff0000".to_string(),
        });
        let mut snapshot = Snapshot::default();
        snapshot.players.insert(1, Player::new(1, "#ff0000"));
        state.on_state(snapshot);
        state.drain_commands();
        state
    }

    #[test]
    fn test_cannot_fire_before_welcome() {
        let mut state = ClientGameState::new(ClientConfig::default());
        assert!(state.try_fire(0).is_none());
    }

    #[test]
    fn test_fire_spawns_predicted_projectile() {
        let mut state = joined();
        let shot = state.try_fire(1000).unwrap();

        assert_eq!((shot.x, shot.y), (512.0, 680.0));
        assert!(state.drain_commands().contains(&PresentationCommand::Spawn {
            key: EntityKey::PredictedProjectile(shot.local_id),
            sprite: "bullet",
            x: 512.0,
            y: 680.0,
            tint: None,
        }));
    }

    #[test]
    fn test_fire_twice_within_cooldown() {
        let mut state = joined();
        assert!(state.try_fire(1000).is_some());
        assert!(state.try_fire(1200).is_none());
        assert_eq!(state.prediction().len(), 1);
    }

    #[test]
    fn test_eliminated_player_cannot_fire() {
        let mut state = joined();
        let mut player = Player::new(1, "#ff0000");
        player.lives = 0;
        player.is_active = false;
        let mut snapshot = Snapshot::default();
        snapshot.players.insert(1, player);
        state.on_state(snapshot);

        assert!(state.try_fire(1000).is_none());
    }

    #[test]
    fn test_confirmed_shot_is_rekeyed() {
        let mut state = joined();
        let shot = state.try_fire(1000).unwrap();
        state.drain_commands();

        let mut snapshot = Snapshot::default();
        snapshot.players.insert(1, Player::new(1, "#ff0000"));
        snapshot.player_projectiles.push(Projectile {
            id: 77,
            owner_id: Owner::Player(1),
            x: 512.0,
            y: 675.0,
            vx: 0.0,
            vy: -400.0,
            kind: None,
        });
        state.set_time(1016);
        state.on_state(snapshot);

        assert!(state.drain_commands().contains(&PresentationCommand::Rekey {
            from: EntityKey::PredictedProjectile(shot.local_id),
            to: EntityKey::PlayerProjectile(77),
        }));
        assert!(state.prediction().is_empty());
    }

    #[test]
    fn test_close_discards_predictions() {
        let mut state = joined();
        let shot = state.try_fire(1000).unwrap();
        state.on_closed();

        assert!(state.is_closed());
        assert!(state.prediction().is_empty());
        assert!(state.drain_commands().contains(&PresentationCommand::Despawn {
            key: EntityKey::PredictedProjectile(shot.local_id)
        }));
    }
}
