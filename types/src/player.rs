use serde::{Deserialize, Serialize};
use std::{borrow::Borrow, fmt, str::FromStr};
use thiserror::Error as ThisError;

use crate::constants::MAX_PLAYER_ID_LENGTH;

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum PlayerIdError {
    #[error("player id is empty")]
    Empty,
    #[error("player id too long (len={len}, max={max})")]
    TooLong { len: usize, max: usize },
    #[error("player id contains whitespace: {0:?}")]
    Whitespace(String),
}

/// Identifier of a player as reported by the host (a SteamID64 on most servers).
///
/// Ids are opaque strings. Construction rejects empty, overlong and
/// whitespace-containing values; deserialization does not, so ledger files
/// written by older tooling still load.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(value: impl Into<String>) -> Result<Self, PlayerIdError> {
        let value = value.into();
        if value.is_empty() {
            return Err(PlayerIdError::Empty);
        }
        if value.len() > MAX_PLAYER_ID_LENGTH {
            return Err(PlayerIdError::TooLong {
                len: value.len(),
                max: MAX_PLAYER_ID_LENGTH,
            });
        }
        if value.chars().any(char::is_whitespace) {
            return Err(PlayerIdError::Whitespace(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PlayerId {
    type Err = PlayerIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for PlayerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets maps keyed by `PlayerId` be queried with a plain `&str`.
impl Borrow<str> for PlayerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_steam_id() {
        let id = PlayerId::new("76561198000000001").unwrap();
        assert_eq!(id.as_str(), "76561198000000001");
        assert_eq!(id.to_string(), "76561198000000001");
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert_eq!(PlayerId::new(""), Err(PlayerIdError::Empty));
        assert_eq!(
            "a b".parse::<PlayerId>(),
            Err(PlayerIdError::Whitespace("a b".to_string()))
        );
    }

    #[test]
    fn rejects_overlong() {
        let long = "7".repeat(MAX_PLAYER_ID_LENGTH + 1);
        assert_eq!(
            PlayerId::new(long),
            Err(PlayerIdError::TooLong {
                len: MAX_PLAYER_ID_LENGTH + 1,
                max: MAX_PLAYER_ID_LENGTH
            })
        );
    }

    #[test]
    fn serializes_as_bare_string() {
        let id = PlayerId::new("P1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"P1\"");
        let back: PlayerId = serde_json::from_str("\"P1\"").unwrap();
        assert_eq!(back, id);
    }
}
