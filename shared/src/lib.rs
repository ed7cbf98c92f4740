use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f32::consts::PI;

pub mod protocol;

pub use protocol::{ClientMessage, ProtocolError, ServerMessage, Welcome};

pub const GAME_WIDTH: f32 = 1024.0;
pub const GAME_HEIGHT: f32 = 768.0;
pub const TICK_RATE: u32 = 60;

pub const PLAYER_SPEED: f32 = 250.0;
pub const PLAYER_SIZE: f32 = 40.0;
pub const PLAYER_SPAWN_X: f32 = 512.0;
pub const PLAYER_SPAWN_Y: f32 = 700.0;
pub const INITIAL_LIVES: u32 = 3;
pub const FIRE_COOLDOWN_MS: u64 = 300;
pub const ENEMY_COLLISION_COOLDOWN_MS: u64 = 500;

pub const PROJECTILE_WIDTH: f32 = 8.0;
pub const PROJECTILE_HEIGHT: f32 = 16.0;
pub const PLAYER_PROJECTILE_SPEED: f32 = 400.0;
pub const NORMAL_PROJECTILE_SPEED: f32 = 200.0;
pub const FALCON_PROJECTILE_SPEED: f32 = 300.0;
pub const MUZZLE_OFFSET: f32 = 20.0;
/// Half-angle of the elite spread shot, measured from straight down.
pub const SPREAD_ANGLE: f32 = PI / 12.0;

pub const ENEMY_DESCENT_SPEED: f32 = 20.0;
pub const ENEMY_TYPE_COOLDOWN_MS: u64 = 1000;
pub const ENEMY_FIRE_CHANCE: f64 = 0.05;

pub const PLAYER_COLORS: [&str; 10] = [
    "#FF0000", "#00FF00", "#0000FF", "#FFFF00", "#FF00FF", "#00FFFF", "#FFA500", "#800080",
    "#008000", "#FFC0CB",
];

/// Axis-aligned rectangle stored by its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Builds a rectangle from a center point, which is how every entity
    /// stores its position.
    pub fn centered(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    /// Strict overlap test; rectangles that only share an edge do not collide.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }
}

pub fn check_collision(a: &Rect, b: &Rect) -> bool {
    a.overlaps(b)
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: u32,
    pub color: String,
    pub x: f32,
    pub y: f32,
    pub lives: u32,
    pub is_active: bool,
    pub is_invincible: bool,
    #[serde(default)]
    pub last_shot_time: Option<u64>,
    #[serde(default)]
    pub last_enemy_collision_time: Option<u64>,
}

impl Player {
    pub fn new(id: u32, color: impl Into<String>) -> Self {
        Self {
            id,
            color: color.into(),
            x: PLAYER_SPAWN_X,
            y: PLAYER_SPAWN_Y,
            lives: INITIAL_LIVES,
            is_active: true,
            is_invincible: false,
            last_shot_time: None,
            last_enemy_collision_time: None,
        }
    }

    pub fn hitbox(&self) -> Rect {
        Rect::centered(self.x, self.y, PLAYER_SIZE, PLAYER_SIZE)
    }

    /// Removes one life. Returns true when the player just ran out.
    pub fn take_hit(&mut self) -> bool {
        let was_active = self.is_active;
        self.lives = self.lives.saturating_sub(1);
        self.is_active = self.lives > 0;
        was_active && !self.is_active
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    Normal,
    Falcon,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProjectileKind {
    Normal,
    Falcon,
}

/// Per-type enemy parameters. Every behavioural difference between enemy
/// types is read from here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyProfile {
    pub width: f32,
    pub height: f32,
    pub shot_interval_ms: u64,
    pub projectile: ProjectileKind,
    pub spread: bool,
    pub sprite: &'static str,
}

const NORMAL_PROFILE: EnemyProfile = EnemyProfile {
    width: 20.0,
    height: 20.0,
    shot_interval_ms: 1500,
    projectile: ProjectileKind::Normal,
    spread: false,
    sprite: "enemy",
};

const FALCON_PROFILE: EnemyProfile = EnemyProfile {
    width: 40.0,
    height: 40.0,
    shot_interval_ms: 3000,
    projectile: ProjectileKind::Falcon,
    spread: true,
    sprite: "falcon",
};

impl EnemyKind {
    pub fn profile(self) -> &'static EnemyProfile {
        match self {
            EnemyKind::Normal => &NORMAL_PROFILE,
            EnemyKind::Falcon => &FALCON_PROFILE,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Enemy {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    pub active: bool,
    pub visible: bool,
    pub start_y: f32,
}

impl Enemy {
    pub fn new(id: u32, kind: EnemyKind, x: f32, y: f32) -> Self {
        Self {
            id,
            kind,
            x,
            y,
            active: true,
            visible: true,
            start_y: y,
        }
    }

    pub fn hitbox(&self) -> Rect {
        let profile = self.kind.profile();
        Rect::centered(self.x, self.y, profile.width, profile.height)
    }
}

/// Who fired a projectile. Serialized as the player id or the string
/// `"enemy"`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "OwnerRepr", into = "OwnerRepr")]
pub enum Owner {
    Player(u32),
    Enemy,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum OwnerRepr {
    Id(u32),
    Tag(String),
}

impl TryFrom<OwnerRepr> for Owner {
    type Error = String;

    fn try_from(repr: OwnerRepr) -> Result<Self, Self::Error> {
        match repr {
            OwnerRepr::Id(id) => Ok(Owner::Player(id)),
            OwnerRepr::Tag(tag) if tag == "enemy" => Ok(Owner::Enemy),
            OwnerRepr::Tag(tag) => Err(format!("unknown projectile owner `{}`", tag)),
        }
    }
}

impl From<Owner> for OwnerRepr {
    fn from(owner: Owner) -> Self {
        match owner {
            Owner::Player(id) => OwnerRepr::Id(id),
            Owner::Enemy => OwnerRepr::Tag("enemy".to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Projectile {
    pub id: u32,
    pub owner_id: Owner,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ProjectileKind>,
}

impl Projectile {
    pub fn hitbox(&self) -> Rect {
        Rect::centered(self.x, self.y, PROJECTILE_WIDTH, PROJECTILE_HEIGHT)
    }

    pub fn advance(&mut self, dt: f32) {
        self.x += self.vx * dt;
        self.y += self.vy * dt;
    }

    pub fn is_within(&self, width: f32, height: f32) -> bool {
        self.x >= 0.0 && self.x <= width && self.y >= 0.0 && self.y <= height
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum GameStatus {
    #[default]
    Playing,
    GameOver,
}

/// Full authoritative world state as broadcast once per tick.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub players: BTreeMap<u32, Player>,
    pub player_projectiles: Vec<Projectile>,
    pub enemy_projectiles: Vec<Projectile>,
    pub enemies: Vec<Enemy>,
    pub wave: u32,
    pub game_state: GameStatus,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputState {
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
    #[serde(default)]
    pub up: bool,
    #[serde(default)]
    pub down: bool,
    #[serde(default)]
    pub fire: bool,
}

impl InputState {
    /// Movement direction normalized to unit length, or zero when idle.
    pub fn direction(&self) -> (f32, f32) {
        let mut dx: f32 = 0.0;
        let mut dy: f32 = 0.0;
        if self.left {
            dx -= 1.0;
        }
        if self.right {
            dx += 1.0;
        }
        if self.up {
            dy -= 1.0;
        }
        if self.down {
            dy += 1.0;
        }

        let len = (dx * dx + dy * dy).sqrt();
        if len > 0.0 {
            (dx / len, dy / len)
        } else {
            (0.0, 0.0)
        }
    }
}
