//! Deterministic collaborators for tests.

use crate::{
    claim::{ClaimContext, ClaimOptions},
    host::{Clock, GrantError, ItemGrant, PermissionCheck},
};
use chrono::{DateTime, TimeZone, Utc};
use claimrewards_types::{constants::ALLOCATIONS_FILE, PlayerId, RewardConfig};
use std::{collections::HashSet, path::Path};

/// Builds a player id, panicking on invalid input.
pub fn player(id: &str) -> PlayerId {
    PlayerId::new(id).expect("valid player id")
}

/// 2024-01-01T00:00:00Z
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Writes `contents` verbatim to `path`, creating parent directories.
pub fn write_raw(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent directory");
    }
    std::fs::write(path, contents).expect("write fixture");
}

/// Writes an allocation file with the given entries into `data_dir`.
pub fn write_allocations(data_dir: &Path, entries: &[(&str, i64)]) {
    let table: serde_json::Map<String, serde_json::Value> = entries
        .iter()
        .map(|(id, amount)| (id.to_string(), serde_json::Value::from(*amount)))
        .collect();
    let json = serde_json::to_string_pretty(&table).expect("encode allocations");
    write_raw(&data_dir.join(ALLOCATIONS_FILE), &json);
}

/// Opens a context over `data_dir` seeded with `entries`, stamped at [`fixed_time`].
pub fn create_context(
    data_dir: &Path,
    entries: &[(&str, i64)],
    options: ClaimOptions,
) -> ClaimContext<FixedClock> {
    write_allocations(data_dir, entries);
    ClaimContext::open_with_clock(
        data_dir,
        RewardConfig::default(),
        options,
        FixedClock(fixed_time()),
    )
    .expect("open claim context")
}

/// Clock that always reports the same instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A single call to [`ItemGrant::grant`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrantCall {
    pub player: PlayerId,
    pub item: String,
    pub amount: u32,
    pub skin_id: u64,
}

/// Records every grant and succeeds.
#[derive(Debug, Default)]
pub struct RecordingGrant {
    pub calls: Vec<GrantCall>,
}

impl ItemGrant for RecordingGrant {
    fn grant(
        &mut self,
        player: &PlayerId,
        item: &str,
        amount: u32,
        skin_id: u64,
    ) -> Result<(), GrantError> {
        self.calls.push(GrantCall {
            player: player.clone(),
            item: item.to_string(),
            amount,
            skin_id,
        });
        Ok(())
    }
}

/// Rejects every grant, counting attempts.
#[derive(Debug, Default)]
pub struct FailingGrant {
    pub attempts: usize,
}

impl ItemGrant for FailingGrant {
    fn grant(
        &mut self,
        _player: &PlayerId,
        item: &str,
        _amount: u32,
        _skin_id: u64,
    ) -> Result<(), GrantError> {
        self.attempts += 1;
        Err(GrantError::UnknownItem(item.to_string()))
    }
}

/// Grants every permission to the listed players only.
#[derive(Debug, Default)]
pub struct StaticPermissions {
    allowed: HashSet<PlayerId>,
}

impl StaticPermissions {
    pub fn allow(players: &[&str]) -> Self {
        Self {
            allowed: players.iter().map(|id| player(id)).collect(),
        }
    }
}

impl PermissionCheck for StaticPermissions {
    fn has_permission(&self, player: &PlayerId, _permission: &str) -> bool {
        self.allowed.contains(player)
    }
}
