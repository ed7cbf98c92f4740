//! Commands emitted to the rendering collaborator.
//!
//! The client core never draws anything. It diffs authoritative state into a
//! stream of these commands, and whatever owns sprites, sounds and HUD text
//! applies them in order.

use shared::ProjectileKind;

/// Identity of a rendered object. Predicted projectiles live in their own key
/// space until the server confirms them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKey {
    Player(u32),
    Enemy(u32),
    PlayerProjectile(u32),
    PredictedProjectile(u32),
    EnemyProjectile(u32),
}

pub const PLAYER_SPRITE: &str = "player";
pub const PLAYER_PROJECTILE_SPRITE: &str = "bullet";

pub fn enemy_projectile_sprite(kind: Option<ProjectileKind>) -> &'static str {
    match kind {
        Some(ProjectileKind::Falcon) => "falcon_bullet",
        _ => "enemy_bullet",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PresentationCommand {
    Spawn {
        key: EntityKey,
        sprite: &'static str,
        x: f32,
        y: f32,
        tint: Option<String>,
    },
    Move {
        key: EntityKey,
        x: f32,
        y: f32,
    },
    SetVisible {
        key: EntityKey,
        visible: bool,
    },
    Despawn {
        key: EntityKey,
    },
    /// A predicted object was confirmed under a server id.
    Rekey {
        from: EntityKey,
        to: EntityKey,
    },
    /// One-shot damage flash.
    HitCue {
        key: EntityKey,
    },
    Explosion {
        x: f32,
        y: f32,
    },
    WaveChanged {
        wave: u32,
    },
    GameOverShown,
    GameOverHidden,
}

impl PresentationCommand {
    /// The entity this command targets, if any.
    pub fn key(&self) -> Option<EntityKey> {
        match self {
            PresentationCommand::Spawn { key, .. }
            | PresentationCommand::Move { key, .. }
            | PresentationCommand::SetVisible { key, .. }
            | PresentationCommand::Despawn { key }
            | PresentationCommand::HitCue { key } => Some(*key),
            PresentationCommand::Rekey { to, .. } => Some(*to),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enemy_projectile_sprites() {
        assert_eq!(enemy_projectile_sprite(None), "enemy_bullet");
        assert_eq!(
            enemy_projectile_sprite(Some(ProjectileKind::Normal)),
            "enemy_bullet"
        );
        assert_eq!(
            enemy_projectile_sprite(Some(ProjectileKind::Falcon)),
            "falcon_bullet"
        );
    }

    #[test]
    fn test_command_key() {
        let rekey = PresentationCommand::Rekey {
            from: EntityKey::PredictedProjectile(1),
            to: EntityKey::PlayerProjectile(40),
        };
        assert_eq!(rekey.key(), Some(EntityKey::PlayerProjectile(40)));
        assert_eq!(PresentationCommand::GameOverShown.key(), None);
    }
}
