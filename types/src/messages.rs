/// Keys of the player-facing messages. Wording is resolved by the host's
/// localization layer; the defaults below are used when no override exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKey {
    ClaimSuccess,
    NothingToClaim,
    NoPermission,
    /// The claim was aborted before anything was consumed.
    ClaimFailed,
}

impl MessageKey {
    pub const ALL: [MessageKey; 4] = [
        MessageKey::ClaimSuccess,
        MessageKey::NothingToClaim,
        MessageKey::NoPermission,
        MessageKey::ClaimFailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClaimSuccess => "ClaimSuccess",
            Self::NothingToClaim => "NothingToClaim",
            Self::NoPermission => "NoPermission",
            Self::ClaimFailed => "ClaimFailed",
        }
    }

    /// English template. `{0}` is the amount and `{1}` the item for `ClaimSuccess`.
    pub fn default_template(&self) -> &'static str {
        match self {
            Self::ClaimSuccess => "You have claimed {0} {1}.",
            Self::NothingToClaim => "Nothing to claim.",
            Self::NoPermission => "You do not have permission to use this command.",
            Self::ClaimFailed => "Your reward could not be delivered. Please try again later.",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == value)
    }
}
