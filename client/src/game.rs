//! The entity registry: the single mutating entry point for applying
//! authoritative world snapshots.
//!
//! Each snapshot is diffed against the known entities in three independent
//! id namespaces (players, projectiles, powerups): create or update every
//! id present, then prune every id that disappeared. The local player id is
//! routed to the reconciliation path instead of the remote map.

use log::debug;
use std::collections::{HashMap, HashSet};

use crate::entities::{Correction, LocalPlayer, PowerupView, ProjectileView, RemotePlayer};
use shared::{PlayerRecord, PowerupRecord, ProjectileRecord};

/// Which id namespace an entity lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Player,
    Projectile,
    Powerup,
}

/// Scene-side effects of registry mutations. The real implementation
/// registers collision bodies against the static map and manages sprites;
/// the registry itself stays backend-free.
pub trait WorldHooks {
    fn entity_spawned(&mut self, _kind: EntityKind, _id: u32) {}
    fn entity_despawned(&mut self, _kind: EntityKind, _id: u32) {}
}

/// Hook implementation for contexts with no scene attached.
pub struct NoopHooks;

impl WorldHooks for NoopHooks {}

/// All entity state tracked by the client.
pub struct World {
    pub local_id: u32,
    pub local: LocalPlayer,
    pub remotes: HashMap<u32, RemotePlayer>,
    pub projectiles: HashMap<u32, ProjectileView>,
    pub powerups: HashMap<u32, PowerupView>,
    spawn_x: f32,
    spawn_y: f32,
}

impl World {
    pub fn new(local_id: u32, spawn_x: f32, spawn_y: f32) -> Self {
        Self {
            local_id,
            local: LocalPlayer::new(spawn_x, spawn_y),
            remotes: HashMap::new(),
            projectiles: HashMap::new(),
            powerups: HashMap::new(),
            spawn_x,
            spawn_y,
        }
    }

    /// Applies one decoded snapshot. Returns the correction strategy chosen
    /// for the local player, if its record was present.
    pub fn apply_snapshot(
        &mut self,
        players: &[PlayerRecord],
        projectiles: &[ProjectileRecord],
        powerups: &[PowerupRecord],
        hooks: &mut dyn WorldHooks,
    ) -> Option<Correction> {
        let mut local_correction = None;

        let mut seen = HashSet::new();
        for record in players {
            seen.insert(record.id);
            if record.id == self.local_id {
                // last-write-wins if the snapshot repeats our id
                local_correction = Some(self.local.apply_server_record(record));
                continue;
            }
            match self.remotes.get_mut(&record.id) {
                Some(remote) => remote.apply_server_record(record),
                None => {
                    let mut remote = RemotePlayer::new(record.x, record.y);
                    remote.apply_server_record(record);
                    self.remotes.insert(record.id, remote);
                    hooks.entity_spawned(EntityKind::Player, record.id);
                }
            }
        }
        self.remotes.retain(|id, _| {
            let keep = seen.contains(id);
            if !keep {
                hooks.entity_despawned(EntityKind::Player, *id);
            }
            keep
        });

        let mut seen = HashSet::new();
        for record in projectiles {
            seen.insert(record.id);
            match self.projectiles.get_mut(&record.id) {
                Some(projectile) => projectile.apply_server_record(record),
                None => {
                    self.projectiles
                        .insert(record.id, ProjectileView::from_record(record));
                    hooks.entity_spawned(EntityKind::Projectile, record.id);
                }
            }
        }
        self.projectiles.retain(|id, _| {
            let keep = seen.contains(id);
            if !keep {
                hooks.entity_despawned(EntityKind::Projectile, *id);
            }
            keep
        });

        let mut seen = HashSet::new();
        for record in powerups {
            seen.insert(record.id);
            match self.powerups.get_mut(&record.id) {
                Some(powerup) => powerup.apply_server_record(record),
                None => {
                    self.powerups
                        .insert(record.id, PowerupView::from_record(record));
                    hooks.entity_spawned(EntityKind::Powerup, record.id);
                }
            }
        }
        self.powerups.retain(|id, _| {
            let keep = seen.contains(id);
            if !keep {
                hooks.entity_despawned(EntityKind::Powerup, *id);
            }
            keep
        });

        if let Some(correction) = local_correction {
            debug!("local reconciliation: {:?}", correction);
        }
        local_correction
    }

    /// Advances every displayed entity by one frame. Network arrival never
    /// drives motion directly; this runs every frame regardless.
    pub fn update(&mut self, dt_ms: f32) {
        for projectile in self.projectiles.values_mut() {
            projectile.update(dt_ms);
        }
        for powerup in self.powerups.values_mut() {
            powerup.update(dt_ms);
        }
        for remote in self.remotes.values_mut() {
            remote.update(dt_ms);
        }
        self.local.update(dt_ms);
    }

    /// Tears the world back down to its initial state, firing despawn hooks
    /// for everything tracked. Used when the server announces a new game.
    pub fn reset(&mut self, hooks: &mut dyn WorldHooks) {
        for id in self.remotes.keys() {
            hooks.entity_despawned(EntityKind::Player, *id);
        }
        for id in self.projectiles.keys() {
            hooks.entity_despawned(EntityKind::Projectile, *id);
        }
        for id in self.powerups.keys() {
            hooks.entity_despawned(EntityKind::Powerup, *id);
        }
        self.remotes.clear();
        self.projectiles.clear();
        self.powerups.clear();
        self.local = LocalPlayer::new(self.spawn_x, self.spawn_y);
    }
}
