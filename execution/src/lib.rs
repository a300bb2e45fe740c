//! Claimrewards execution layer.
//!
//! This crate holds the allocation store, the claim ledger and the claim
//! transaction that ties them together. The host server supplies the
//! player-facing collaborators through the traits in [`host`].
//!
//! ## Invariants
//! - A player present in the [`AllocationStore`] always has a positive amount.
//! - A successful claim removes exactly that player's entry and appends
//!   exactly one [`ClaimRecord`](claimrewards_types::ClaimRecord) carrying the
//!   pre-claim amount.
//! - The [`ClaimLedger`] is only ever appended to; saves rewrite the full file.
//!
//! ## Storage / recovery
//! Both stores are loaded fully into memory at startup and written back in
//! full at the end of every claim. Missing files are created empty; corrupt
//! files follow the configured [`PersistencePolicy`].
//!
//! The primary entrypoint is [`ClaimContext`].
//!
//! ## Minimal claim (example)
//! ```rust,ignore
//! use claimrewards_execution::{ClaimContext, ClaimOptions};
//! use claimrewards_types::{PlayerId, RewardConfig};
//!
//! # fn example(
//! #     data_dir: &std::path::Path,
//! #     grant: &mut impl claimrewards_execution::ItemGrant,
//! # ) -> anyhow::Result<()> {
//! let mut claims =
//!     ClaimContext::open(data_dir, RewardConfig::default(), ClaimOptions::default())?;
//! let outcome = claims.claim_reward(&PlayerId::new("76561198000000001")?, grant)?;
//! # Ok(())
//! # }
//! ```

pub mod allocation;
pub mod claim;
pub mod host;
pub mod ledger;
pub mod persistence;
pub mod reward_config;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;


pub use allocation::AllocationStore;
pub use claim::{ClaimContext, ClaimError, ClaimOptions};
pub use host::{Clock, GrantError, ItemGrant, PermissionCheck, SystemClock};
pub use ledger::ClaimLedger;
pub use persistence::{LoadStatus, PersistError, PersistencePolicy};
pub use reward_config::{load_reward_config, save_reward_config};
