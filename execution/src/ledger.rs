//! Append-only history of processed claims.

use claimrewards_types::{ClaimHistory, ClaimRecord, PlayerId};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::persistence::{self, PersistError, PersistencePolicy};

const LABEL: &str = "ledger";

/// Borrowed view of [`ClaimHistory`] so saving does not clone the records.
#[derive(Serialize)]
struct HistoryRef<'a> {
    claims: &'a [ClaimRecord],
}

/// In-memory claim ledger backed by a JSON file.
///
/// Records are only ever appended. [`save`](Self::save) rewrites the whole
/// file from the in-memory sequence.
#[derive(Debug)]
pub struct ClaimLedger {
    path: PathBuf,
    policy: PersistencePolicy,
    claims: Vec<ClaimRecord>,
}

impl ClaimLedger {
    /// Loads the ledger from `path`, with the same missing/corrupt handling as
    /// [`AllocationStore::load`](crate::AllocationStore::load).
    pub fn load(path: impl Into<PathBuf>, policy: PersistencePolicy) -> Result<Self, PersistError> {
        let path = path.into();
        let (history, status) = persistence::load_json::<ClaimHistory>(&path, policy, LABEL)?;
        let ledger = Self {
            path,
            policy,
            claims: history.unwrap_or_default().claims,
        };
        if status.needs_write() {
            ledger.save()?;
        }
        info!(path = ?ledger.path, records = ledger.claims.len(), "claim ledger ready");
        Ok(ledger)
    }

    /// Appends a record in memory. Does not touch the disk.
    pub fn append(&mut self, record: ClaimRecord) {
        self.claims.push(record);
    }

    /// Overwrites the backing file with every record.
    pub fn save(&self) -> Result<(), PersistError> {
        let history = HistoryRef {
            claims: &self.claims,
        };
        match persistence::write_json(&self.path, &history) {
            Ok(()) => {
                debug!(path = ?self.path, records = self.claims.len(), "ledger saved");
                Ok(())
            }
            Err(err) => self.policy.on_save_error(LABEL, err),
        }
    }

    /// All records in append order.
    pub fn records(&self) -> &[ClaimRecord] {
        &self.claims
    }

    /// Records for a single player, in append order.
    pub fn claims_for<'a>(&'a self, player: &'a PlayerId) -> impl Iterator<Item = &'a ClaimRecord> {
        self.claims.iter().filter(move |record| &record.player == player)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}
