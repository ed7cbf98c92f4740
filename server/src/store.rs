//! Keyed storage for players and in-flight projectiles.

use shared::{Enemy, GameStatus, Player, Projectile, Snapshot};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    players: BTreeMap<u32, Player>,
    player_projectiles: BTreeMap<u32, Projectile>,
    enemy_projectiles: BTreeMap<u32, Projectile>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_player(&mut self, player: Player) {
        self.players.insert(player.id, player);
    }

    pub fn remove_player(&mut self, id: u32) -> Option<Player> {
        self.players.remove(&id)
    }

    pub fn player(&self, id: u32) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: u32) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn insert_player_projectile(&mut self, projectile: Projectile) {
        self.player_projectiles.insert(projectile.id, projectile);
    }

    pub fn remove_player_projectile(&mut self, id: u32) -> Option<Projectile> {
        self.player_projectiles.remove(&id)
    }

    pub fn player_projectiles(&self) -> impl Iterator<Item = &Projectile> {
        self.player_projectiles.values()
    }

    pub fn insert_enemy_projectile(&mut self, projectile: Projectile) {
        self.enemy_projectiles.insert(projectile.id, projectile);
    }

    pub fn remove_enemy_projectile(&mut self, id: u32) -> Option<Projectile> {
        self.enemy_projectiles.remove(&id)
    }

    pub fn enemy_projectiles(&self) -> impl Iterator<Item = &Projectile> {
        self.enemy_projectiles.values()
    }

    /// Both projectile collections at once, player-owned first.
    pub fn projectiles_mut(
        &mut self,
    ) -> (
        &mut BTreeMap<u32, Projectile>,
        &mut BTreeMap<u32, Projectile>,
    ) {
        (&mut self.player_projectiles, &mut self.enemy_projectiles)
    }

    pub fn clear_projectiles(&mut self) {
        self.player_projectiles.clear();
        self.enemy_projectiles.clear();
    }

    /// Captures the world as an owned value, detached from any later mutation.
    pub fn snapshot(&self, enemies: &[Enemy], wave: u32, game_state: GameStatus) -> Snapshot {
        Snapshot {
            players: self.players.clone(),
            player_projectiles: self.player_projectiles.values().cloned().collect(),
            enemy_projectiles: self.enemy_projectiles.values().cloned().collect(),
            enemies: enemies.to_vec(),
            wave,
            game_state,
        }
    }
}
