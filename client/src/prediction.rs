//! Locally predicted projectiles awaiting server confirmation.
//!
//! Firing spawns a projectile immediately under a local id and queues that id
//! per owner. When the server later reports a new projectile for the same
//! owner, the oldest queued prediction is claimed and takes the server's id.
//!
//! Matching is purely FIFO. It assumes the server confirms shots in the order
//! they were fired and drops none of them. A shot the server rejects (for
//! example on a cooldown edge) leaves a prediction behind that will be paired
//! with the next confirmed shot, or expire.

use log::warn;
use std::collections::{BTreeMap, HashMap, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictedProjectile {
    pub local_id: u32,
    pub owner: u32,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub fired_at: u64,
}

#[derive(Debug, Clone)]
pub struct PredictionQueue {
    cooldown_ms: u64,
    max_age_ms: u64,
    projectile_speed: f32,
    muzzle_offset: f32,
    last_fire: Option<u64>,
    next_local_id: u32,
    pending: HashMap<u32, VecDeque<u32>>,
    projectiles: BTreeMap<u32, PredictedProjectile>,
}

impl PredictionQueue {
    pub fn new(cooldown_ms: u64, max_age_ms: u64, projectile_speed: f32, muzzle_offset: f32) -> Self {
        Self {
            cooldown_ms,
            max_age_ms,
            projectile_speed,
            muzzle_offset,
            last_fire: None,
            next_local_id: 1,
            pending: HashMap::new(),
            projectiles: BTreeMap::new(),
        }
    }

    /// Spawns a predicted shot if the local cooldown allows it.
    pub fn fire(&mut self, owner: u32, x: f32, y: f32, now_ms: u64) -> Option<PredictedProjectile> {
        if let Some(last) = self.last_fire {
            if now_ms.saturating_sub(last) <= self.cooldown_ms {
                return None;
            }
        }
        self.last_fire = Some(now_ms);

        let local_id = self.next_local_id;
        self.next_local_id += 1;

        let projectile = PredictedProjectile {
            local_id,
            owner,
            x,
            y: y - self.muzzle_offset,
            vx: 0.0,
            vy: -self.projectile_speed,
            fired_at: now_ms,
        };
        self.projectiles.insert(local_id, projectile);
        self.pending.entry(owner).or_default().push_back(local_id);
        Some(projectile)
    }

    /// Removes and returns the oldest unconfirmed shot of `owner`.
    pub fn claim(&mut self, owner: u32) -> Option<PredictedProjectile> {
        let queue = self.pending.get_mut(&owner)?;
        while let Some(local_id) = queue.pop_front() {
            if let Some(projectile) = self.projectiles.remove(&local_id) {
                return Some(projectile);
            }
        }
        None
    }

    pub fn has_pending(&self, owner: u32) -> bool {
        self.pending
            .get(&owner)
            .map(|queue| !queue.is_empty())
            .unwrap_or(false)
    }

    pub fn advance(&mut self, dt: f32) {
        for projectile in self.projectiles.values_mut() {
            projectile.x += projectile.vx * dt;
            projectile.y += projectile.vy * dt;
        }
    }

    /// Drops predictions the server never confirmed. Returns their local ids.
    pub fn expire(&mut self, now_ms: u64) -> Vec<u32> {
        let max_age_ms = self.max_age_ms;
        let expired: Vec<u32> = self
            .projectiles
            .values()
            .filter(|p| now_ms.saturating_sub(p.fired_at) > max_age_ms)
            .map(|p| p.local_id)
            .collect();

        for local_id in &expired {
            self.projectiles.remove(local_id);
            warn!("Predicted projectile {} was never confirmed", local_id);
        }
        if !expired.is_empty() {
            for queue in self.pending.values_mut() {
                queue.retain(|id| !expired.contains(id));
            }
        }
        expired
    }

    pub fn get(&self, local_id: u32) -> Option<&PredictedProjectile> {
        self.projectiles.get(&local_id)
    }

    pub fn projectiles(&self) -> impl Iterator<Item = &PredictedProjectile> {
        self.projectiles.values()
    }

    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    pub fn clear(&mut self) -> Vec<u32> {
        self.pending.clear();
        let ids = self.projectiles.keys().copied().collect();
        self.projectiles.clear();
        ids
    }
}
