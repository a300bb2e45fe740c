//! Types shared by the claimrewards execution layer and node.
//!
//! Everything here is plain data: the on-disk shapes of the allocation
//! and ledger files, the reward configuration, and the outcome of a claim.
//! File handling lives in `claimrewards-execution`.

pub mod claim;
pub mod config;
pub mod constants;
pub mod messages;
pub mod player;

pub use claim::{format_timestamp, ClaimHistory, ClaimOutcome, ClaimRecord};
pub use config::{RewardConfig, RewardConfigError};
pub use messages::MessageKey;
pub use player::{PlayerId, PlayerIdError};
