//! The claim transaction.
//!
//! A claim is a straight-line sequence over a [`ClaimContext`]:
//!
//! ```text
//! lookup ──absent──▶ NothingToClaim
//!   │
//!   ▼ amount
//! grant item ─▶ consume allocation ─▶ append ledger record
//!   ─▶ save allocations ─▶ save ledger ─▶ Claimed { amount, item }
//! ```
//!
//! There is no rollback. Once the allocation is consumed the in-memory state
//! is what later claims observe, even if a save fails afterwards.

use claimrewards_types::{
    constants::{ALLOCATIONS_FILE, LEDGER_FILE, PERMISSION_CLAIM},
    ClaimOutcome, ClaimRecord, PlayerId, RewardConfig,
};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    allocation::AllocationStore,
    host::{Clock, GrantError, ItemGrant, PermissionCheck, SystemClock},
    ledger::ClaimLedger,
    persistence::{PersistError, PersistencePolicy},
};

/// Knobs for how a claim reacts to collaborator failures.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClaimOptions {
    /// Applied to both stores on load and save.
    pub persistence: PersistencePolicy,
    /// Abort the claim, leaving the allocation in place, when the item
    /// grant fails. Off by default: a failed grant is logged and the claim
    /// still consumes the allocation.
    pub strict_grant: bool,
}

#[derive(Debug, Error)]
pub enum ClaimError {
    /// The grant failed with `strict_grant` set; nothing was changed.
    #[error("item grant failed for {player}: {source}")]
    Grant {
        player: PlayerId,
        #[source]
        source: GrantError,
    },
    /// The claim was applied in memory but could not be written under
    /// [`PersistencePolicy::FailClosed`].
    #[error("claim of {amount} for {player} applied but not persisted: {source}")]
    Persist {
        player: PlayerId,
        amount: u32,
        #[source]
        source: PersistError,
    },
}

/// Owns everything a claim reads or mutates.
///
/// Built once at startup and dropped at shutdown. Claims take `&mut self`,
/// so the lookup and consume of a single claim can never interleave with
/// another claim; share it across threads behind a `Mutex`.
pub struct ClaimContext<C: Clock = SystemClock> {
    config: RewardConfig,
    allocations: AllocationStore,
    ledger: ClaimLedger,
    options: ClaimOptions,
    clock: C,
}

impl ClaimContext<SystemClock> {
    /// Loads both stores from `data_dir` using wall-clock timestamps.
    pub fn open(
        data_dir: &Path,
        config: RewardConfig,
        options: ClaimOptions,
    ) -> Result<Self, PersistError> {
        Self::open_with_clock(data_dir, config, options, SystemClock)
    }
}

impl<C: Clock> ClaimContext<C> {
    /// Loads both stores from `data_dir`.
    pub fn open_with_clock(
        data_dir: &Path,
        config: RewardConfig,
        options: ClaimOptions,
        clock: C,
    ) -> Result<Self, PersistError> {
        let allocations =
            AllocationStore::load(data_dir.join(ALLOCATIONS_FILE), options.persistence)?;
        let ledger = ClaimLedger::load(data_dir.join(LEDGER_FILE), options.persistence)?;
        Ok(Self::new(config, allocations, ledger, options, clock))
    }

    pub fn new(
        config: RewardConfig,
        allocations: AllocationStore,
        ledger: ClaimLedger,
        options: ClaimOptions,
        clock: C,
    ) -> Self {
        Self {
            config,
            allocations,
            ledger,
            options,
            clock,
        }
    }

    /// Claims `player`'s pending allocation.
    ///
    /// Returns [`ClaimOutcome::NothingToClaim`] without side effects when no
    /// allocation exists. Otherwise grants the configured item, consumes the
    /// allocation, records the claim and saves both stores.
    pub fn claim_reward<G>(
        &mut self,
        player: &PlayerId,
        mut grant: G,
    ) -> Result<ClaimOutcome, ClaimError>
    where
        G: ItemGrant,
    {
        let Some(amount) = self.allocations.lookup(player) else {
            debug!(%player, "nothing to claim");
            return Ok(ClaimOutcome::NothingToClaim);
        };

        let item = self.config.item.clone();
        if let Err(source) = grant.grant(player, &item, amount, self.config.skin_id) {
            if self.options.strict_grant {
                warn!(%player, amount, %item, error = %source, "item grant failed; claim aborted");
                return Err(ClaimError::Grant {
                    player: player.clone(),
                    source,
                });
            }
            warn!(
                %player,
                amount,
                %item,
                error = %source,
                "item grant failed; consuming allocation anyway"
            );
        }

        let consumed = self.allocations.consume(player);
        debug_assert_eq!(consumed, Some(amount), "lookup and consume must agree");
        self.ledger
            .append(ClaimRecord::new(player.clone(), self.clock.now(), amount));

        // Attempt both saves even if the first one fails.
        let allocations_saved = self.allocations.save();
        let ledger_saved = self.ledger.save();
        if let Err(source) = allocations_saved.and(ledger_saved) {
            return Err(ClaimError::Persist {
                player: player.clone(),
                amount,
                source,
            });
        }

        info!(%player, amount, %item, "reward claimed");
        Ok(ClaimOutcome::Claimed { amount, item })
    }

    /// Runs the claim command for `player`: checks the claim permission,
    /// then claims. Without the permission nothing is read or written.
    pub fn authorize_and_claim<P, G>(
        &mut self,
        player: &PlayerId,
        permissions: &P,
        grant: G,
    ) -> Result<ClaimOutcome, ClaimError>
    where
        P: PermissionCheck + ?Sized,
        G: ItemGrant,
    {
        if !permissions.has_permission(player, PERMISSION_CLAIM) {
            debug!(%player, permission = PERMISSION_CLAIM, "claim denied");
            return Ok(ClaimOutcome::NoPermission);
        }
        self.claim_reward(player, grant)
    }

    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    pub fn allocations(&self) -> &AllocationStore {
        &self.allocations
    }

    pub fn ledger(&self) -> &ClaimLedger {
        &self.ledger
    }

    pub fn options(&self) -> ClaimOptions {
        self.options
    }
}
