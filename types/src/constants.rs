/// Permission a player must hold to run the claim command.
pub const PERMISSION_CLAIM: &str = "claimplayerrewards.use";

/// Permission registry entry that grants a permission to every player.
pub const PERMISSION_WILDCARD: &str = "*";

/// Chat command name (without the leading slash).
pub const CLAIM_COMMAND: &str = "claim";

/// Item handed out when the config does not name one.
pub const DEFAULT_REWARD_ITEM: &str = "blood";

/// Skin id meaning "no skin".
pub const DEFAULT_SKIN_ID: u64 = 0;

/// Allocation table file name inside the data directory.
pub const ALLOCATIONS_FILE: &str = "ClaimPlayerRewards.json";

/// Claim ledger file name inside the data directory.
pub const LEDGER_FILE: &str = "ClaimedRewards.json";

/// Maximum accepted player id length.
pub const MAX_PLAYER_ID_LENGTH: usize = 64;
