//! Pending reward allocations keyed by player.
//!
//! The backing file is a flat JSON object of player id to amount, e.g.
//! `{"76561198000000001": 50}`. A player present in the store always has a
//! positive amount; claiming removes the entry rather than zeroing it.

use claimrewards_types::PlayerId;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use crate::persistence::{self, PersistError, PersistencePolicy};

const LABEL: &str = "allocations";

/// In-memory allocation table backed by a JSON file.
#[derive(Debug)]
pub struct AllocationStore {
    path: PathBuf,
    policy: PersistencePolicy,
    entries: BTreeMap<PlayerId, u32>,
}

impl AllocationStore {
    /// Loads the allocation table from `path`.
    ///
    /// A missing file yields an empty store that is written out immediately.
    /// A corrupt file is handled per `policy`. Entries whose amount is not a
    /// positive `u32` are dropped with a warning. Keys are kept verbatim.
    pub fn load(path: impl Into<PathBuf>, policy: PersistencePolicy) -> Result<Self, PersistError> {
        let path = path.into();
        // `null` on disk is an empty table.
        let (raw, status) =
            persistence::load_json::<Option<BTreeMap<PlayerId, i64>>>(&path, policy, LABEL)?;
        let entries = sanitize(raw.flatten().unwrap_or_default());

        let store = Self {
            path,
            policy,
            entries,
        };
        if status.needs_write() {
            store.save()?;
        }
        info!(path = ?store.path, pending = store.entries.len(), "allocation store ready");
        Ok(store)
    }

    /// Returns the pending amount for `player`, if any.
    pub fn lookup(&self, player: &PlayerId) -> Option<u32> {
        self.entries.get(player).copied()
    }

    /// Removes `player`'s entry and returns the amount that was pending.
    ///
    /// Returns `None` and changes nothing when no entry exists. Callers pair
    /// this with a preceding [`lookup`](Self::lookup) under the same `&mut`
    /// borrow so no other claim can interleave.
    pub fn consume(&mut self, player: &PlayerId) -> Option<u32> {
        let amount = self.entries.remove(player);
        if amount.is_none() {
            debug!(%player, "consume on missing allocation");
        }
        amount
    }

    /// Overwrites the backing file with the full table.
    ///
    /// Under [`PersistencePolicy::FailOpen`] a failed write is logged and
    /// `Ok` is returned; the in-memory table stays authoritative.
    pub fn save(&self) -> Result<(), PersistError> {
        match persistence::write_json(&self.path, &self.entries) {
            Ok(()) => {
                debug!(path = ?self.path, pending = self.entries.len(), "allocations saved");
                Ok(())
            }
            Err(err) => self.policy.on_save_error(LABEL, err),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates allocations in player id order.
    pub fn iter(&self) -> impl Iterator<Item = (&PlayerId, u32)> {
        self.entries.iter().map(|(player, amount)| (player, *amount))
    }
}

fn sanitize(raw: BTreeMap<PlayerId, i64>) -> BTreeMap<PlayerId, u32> {
    raw.into_iter()
        .filter_map(|(player, amount)| match u32::try_from(amount) {
            Ok(amount) if amount > 0 => Some((player, amount)),
            _ => {
                warn!(%player, amount, "dropping allocation with out-of-range amount");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{player, write_raw};
    use proptest::prelude::*;

    fn store_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("ClaimPlayerRewards.json")
    }

    #[test]
    fn missing_file_creates_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(&dir);

        let store = AllocationStore::load(&path, PersistencePolicy::FailOpen).unwrap();

        assert!(store.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn lookup_and_consume() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(&dir);
        write_raw(&path, r#"{"P1": 50, "P2": 10}"#);
        let mut store = AllocationStore::load(&path, PersistencePolicy::FailOpen).unwrap();

        assert_eq!(store.lookup(&player("P1")), Some(50));
        assert_eq!(store.lookup(&player("P3")), None);

        assert_eq!(store.consume(&player("P1")), Some(50));
        assert_eq!(store.lookup(&player("P1")), None);
        assert_eq!(store.consume(&player("P1")), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn null_file_is_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(&dir);
        write_raw(&path, "null");

        let store = AllocationStore::load(&path, PersistencePolicy::FailClosed).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn drops_out_of_range_amounts() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(&dir);
        write_raw(&path, r#"{"P1": 0, "P2": -5, "P3": 7, "P5": 99999999999}"#);

        let store = AllocationStore::load(&path, PersistencePolicy::FailOpen).unwrap();

        let entries: Vec<_> = store.iter().collect();
        assert_eq!(entries, vec![(&player("P3"), 7)]);
    }

    #[test]
    fn unusual_keys_survive_claims_of_other_players() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(&dir);
        let long_key = "9".repeat(65);
        let table = BTreeMap::from([
            ("P1".to_string(), 50i64),
            (long_key.clone(), 7),
            ("a b".to_string(), 3),
            (String::new(), 2),
        ]);
        write_raw(&path, &serde_json::to_string(&table).unwrap());
        let mut store = AllocationStore::load(&path, PersistencePolicy::FailClosed).unwrap();
        assert_eq!(store.len(), 4);

        assert_eq!(store.consume(&player("P1")), Some(50));
        store.save().unwrap();

        let on_disk: BTreeMap<String, u32> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            on_disk,
            BTreeMap::from([(long_key, 7), ("a b".to_string(), 3), (String::new(), 2)])
        );
    }

    #[test]
    fn save_writes_sorted_indented_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(&dir);
        write_raw(&path, r#"{"b": 2, "a": 1, "c": 3}"#);
        let mut store = AllocationStore::load(&path, PersistencePolicy::FailOpen).unwrap();

        store.consume(&player("c"));
        store.save().unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "{\n  \"a\": 1,\n  \"b\": 2\n}"
        );
    }

    #[test]
    fn corrupt_file_recovers_empty_under_fail_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(&dir);
        write_raw(&path, "{\"P1\": 50,");

        let store = AllocationStore::load(&path, PersistencePolicy::FailOpen).unwrap();

        assert!(store.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
        assert!(path.with_extension("corrupt").exists());
    }

    #[test]
    fn corrupt_file_is_an_error_under_fail_closed() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(&dir);
        write_raw(&path, "[\"not\", \"a\", \"map\"]");

        let err = AllocationStore::load(&path, PersistencePolicy::FailClosed).unwrap_err();
        assert!(matches!(err, PersistError::Corrupt { .. }), "unexpected error: {err}");
    }

    #[test]
    fn save_failure_follows_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(&dir);
        write_raw(&path, r#"{"P1": 50}"#);
        let open = AllocationStore::load(&path, PersistencePolicy::FailOpen).unwrap();
        let closed = AllocationStore::load(&path, PersistencePolicy::FailClosed).unwrap();

        // Replace the target with a directory so the final rename fails.
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupied"), b"x").unwrap();

        assert!(open.save().is_ok());
        assert!(matches!(closed.save(), Err(PersistError::Io { .. })));
        assert_eq!(open.lookup(&player("P1")), Some(50));
    }

    proptest! {
        #[test]
        fn save_then_load_reproduces_table(
            table in proptest::collection::btree_map("[0-9]{1,17}", 1u32..=u32::MAX, 0..16)
        ) {
            let dir = tempfile::tempdir().unwrap();
            let path = store_path(&dir);
            let json = serde_json::to_string(&table).unwrap();
            write_raw(&path, &json);

            let store = AllocationStore::load(&path, PersistencePolicy::FailClosed).unwrap();
            store.save().unwrap();
            let reloaded = AllocationStore::load(&path, PersistencePolicy::FailClosed).unwrap();

            let got: BTreeMap<String, u32> = reloaded
                .iter()
                .map(|(player, amount)| (player.to_string(), amount))
                .collect();
            prop_assert_eq!(got, table);
        }

        #[test]
        fn consume_succeeds_at_most_once(
            table in proptest::collection::btree_map("[0-9]{1,6}", 1u32..1000, 1..8),
            attempts in 2usize..5,
        ) {
            let dir = tempfile::tempdir().unwrap();
            let path = store_path(&dir);
            write_raw(&path, &serde_json::to_string(&table).unwrap());
            let mut store = AllocationStore::load(&path, PersistencePolicy::FailClosed).unwrap();

            for (key, amount) in &table {
                let id = player(key);
                let results: Vec<_> = (0..attempts).map(|_| store.consume(&id)).collect();
                prop_assert_eq!(results[0], Some(*amount));
                prop_assert!(results[1..].iter().all(Option::is_none));
            }
            prop_assert!(store.is_empty());
        }
    }
}
