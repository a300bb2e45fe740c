use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{messages::MessageKey, player::PlayerId};

/// Formats a UTC instant as ISO-8601 with seven fractional digits
/// (e.g. `2024-01-01T00:00:00.0000000Z`).
///
/// Seven digits (100ns ticks) keeps new records identical in shape to
/// existing ledger files.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    // Leap seconds report nanos >= 1e9.
    let ticks = (at.nanosecond() % 1_000_000_000) / 100;
    format!("{}.{:07}Z", at.format("%Y-%m-%dT%H:%M:%S"), ticks)
}

/// A processed claim. Field names match the ledger file format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    #[serde(rename = "steamid")]
    pub player: PlayerId,
    pub timestamp: String,
    pub amount_claimed: u32,
}

impl ClaimRecord {
    pub fn new(player: PlayerId, at: DateTime<Utc>, amount_claimed: u32) -> Self {
        Self {
            player,
            timestamp: format_timestamp(at),
            amount_claimed,
        }
    }
}

/// Top-level shape of the ledger file: `{ "claims": [...] }`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimHistory {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub claims: Vec<ClaimRecord>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ClaimRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ClaimRecord>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Result of dispatching a claim for a player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The allocation was consumed and `amount` of `item` was granted.
    Claimed { amount: u32, item: String },
    /// No allocation is pending for the player.
    NothingToClaim,
    /// The player lacks the claim permission; nothing was touched.
    NoPermission,
}

impl ClaimOutcome {
    pub fn message_key(&self) -> MessageKey {
        match self {
            Self::Claimed { .. } => MessageKey::ClaimSuccess,
            Self::NothingToClaim => MessageKey::NothingToClaim,
            Self::NoPermission => MessageKey::NoPermission,
        }
    }

    /// Positional arguments for the localized message template.
    pub fn message_args(&self) -> Vec<String> {
        match self {
            Self::Claimed { amount, item } => vec![amount.to_string(), item.clone()],
            Self::NothingToClaim | Self::NoPermission => Vec::new(),
        }
    }

    pub fn is_claimed(&self) -> bool {
        matches!(self, Self::Claimed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn timestamp_has_seven_fraction_digits() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_timestamp(at), "2024-01-01T00:00:00.0000000Z");

        let at = at + chrono::Duration::nanoseconds(123_456_789);
        assert_eq!(format_timestamp(at), "2024-01-01T00:00:00.1234567Z");
    }

    #[test]
    fn record_uses_ledger_field_names() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let record = ClaimRecord::new(PlayerId::new("P1").unwrap(), at, 50);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "steamid": "P1",
                "timestamp": "2024-01-01T00:00:00.0000000Z",
                "amount_claimed": 50
            })
        );
    }

    #[test]
    fn history_tolerates_null_and_missing_claims() {
        let history: ClaimHistory = serde_json::from_str(r#"{"claims": null}"#).unwrap();
        assert!(history.claims.is_empty());
        let history: ClaimHistory = serde_json::from_str("{}").unwrap();
        assert!(history.claims.is_empty());
    }

    #[test]
    fn outcome_maps_to_message() {
        let claimed = ClaimOutcome::Claimed {
            amount: 50,
            item: "blood".to_string(),
        };
        assert_eq!(claimed.message_key(), MessageKey::ClaimSuccess);
        assert_eq!(claimed.message_args(), vec!["50", "blood"]);
        assert!(claimed.is_claimed());
        assert_eq!(
            ClaimOutcome::NothingToClaim.message_key(),
            MessageKey::NothingToClaim
        );
        assert!(ClaimOutcome::NoPermission.message_args().is_empty());
    }

    proptest! {
        #[test]
        fn timestamp_parses_back_to_same_tick(
            secs in 0i64..4_102_444_800,
            nanos in 0u32..1_000_000_000,
        ) {
            let at = Utc.timestamp_opt(secs, nanos).unwrap();
            let formatted = format_timestamp(at);
            prop_assert_eq!(formatted.len(), 28);
            let parsed = DateTime::parse_from_rfc3339(&formatted).unwrap().with_timezone(&Utc);
            prop_assert_eq!(parsed.timestamp(), secs);
            prop_assert_eq!(parsed.nanosecond(), nanos / 100 * 100);
        }
    }
}
