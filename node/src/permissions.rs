//! File-backed permission registry.
//!
//! The file maps a permission name to the players holding it:
//!
//! ```json
//! { "claimplayerrewards.use": ["76561198000000001", "*"] }
//! ```
//!
//! The entry `*` grants the permission to every player.

use claimrewards_execution::{
    persistence::{self, PersistError, PersistencePolicy},
    PermissionCheck,
};
use claimrewards_types::{constants::PERMISSION_WILDCARD, PlayerId};
use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

const LABEL: &str = "permissions";

#[derive(Debug)]
pub struct PermissionRegistry {
    path: PathBuf,
    policy: PersistencePolicy,
    grants: BTreeMap<String, BTreeSet<String>>,
}

impl PermissionRegistry {
    /// Loads the registry, creating an empty file when none exists.
    pub fn load(path: impl Into<PathBuf>, policy: PersistencePolicy) -> Result<Self, PersistError> {
        let path = path.into();
        let (grants, status) =
            persistence::load_json::<BTreeMap<String, BTreeSet<String>>>(&path, policy, LABEL)?;
        let registry = Self {
            path,
            policy,
            grants: grants.unwrap_or_default(),
        };
        if status.needs_write() {
            registry.save()?;
        }
        Ok(registry)
    }

    /// Makes `permission` known. Returns `true` if it was not registered yet.
    pub fn register(&mut self, permission: &str) -> bool {
        if self.grants.contains_key(permission) {
            return false;
        }
        info!(permission, "registered permission");
        self.grants.insert(permission.to_string(), BTreeSet::new());
        true
    }

    /// Grants `permission` to `player` (or to everyone with `*`).
    pub fn grant(&mut self, permission: &str, player: &str) -> bool {
        self.grants
            .entry(permission.to_string())
            .or_default()
            .insert(player.to_string())
    }

    pub fn revoke(&mut self, permission: &str, player: &str) -> bool {
        self.grants
            .get_mut(permission)
            .is_some_and(|holders| holders.remove(player))
    }

    pub fn holders(&self, permission: &str) -> impl Iterator<Item = &str> {
        self.grants
            .get(permission)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub fn save(&self) -> Result<(), PersistError> {
        match persistence::write_json(&self.path, &self.grants) {
            Ok(()) => {
                debug!(path = ?self.path, "permissions saved");
                Ok(())
            }
            Err(err) => self.policy.on_save_error(LABEL, err),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PermissionCheck for PermissionRegistry {
    fn has_permission(&self, player: &PlayerId, permission: &str) -> bool {
        self.grants.get(permission).is_some_and(|holders| {
            holders.contains(PERMISSION_WILDCARD) || holders.contains(player.as_str())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimrewards_execution::mocks::{player, write_raw};
    use claimrewards_types::constants::PERMISSION_CLAIM;

    #[test]
    fn missing_file_denies_everyone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("permissions.json");

        let registry = PermissionRegistry::load(&path, PersistencePolicy::FailOpen).unwrap();

        assert!(path.exists());
        assert!(!registry.has_permission(&player("P1"), PERMISSION_CLAIM));
    }

    #[test]
    fn grants_are_per_player_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("permissions.json");
        let mut registry = PermissionRegistry::load(&path, PersistencePolicy::FailOpen).unwrap();

        assert!(registry.register(PERMISSION_CLAIM));
        assert!(!registry.register(PERMISSION_CLAIM));
        assert!(registry.grant(PERMISSION_CLAIM, "P1"));
        registry.save().unwrap();

        let registry = PermissionRegistry::load(&path, PersistencePolicy::FailClosed).unwrap();
        assert!(registry.has_permission(&player("P1"), PERMISSION_CLAIM));
        assert!(!registry.has_permission(&player("P2"), PERMISSION_CLAIM));
        assert!(!registry.has_permission(&player("P1"), "other.permission"));
        assert_eq!(registry.holders(PERMISSION_CLAIM).collect::<Vec<_>>(), vec!["P1"]);
    }

    #[test]
    fn wildcard_grants_everyone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("permissions.json");
        write_raw(&path, r#"{"claimplayerrewards.use": ["*"]}"#);

        let mut registry = PermissionRegistry::load(&path, PersistencePolicy::FailClosed).unwrap();
        assert!(registry.has_permission(&player("anyone"), PERMISSION_CLAIM));

        assert!(registry.revoke(PERMISSION_CLAIM, "*"));
        assert!(!registry.revoke(PERMISSION_CLAIM, "*"));
        assert!(!registry.has_permission(&player("anyone"), PERMISSION_CLAIM));
    }
}
