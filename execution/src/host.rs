//! Seams to the host game server.
//!
//! The host owns the player objects, the inventory primitive, the
//! permission system and wall-clock time. The claim transaction only sees
//! them through these traits.

use chrono::{DateTime, Utc};
use claimrewards_types::PlayerId;
use thiserror::Error;

/// Why the host could not hand an item to a player.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrantError {
    #[error("unknown item: {0}")]
    UnknownItem(String),
    #[error("player {0} is not connected")]
    PlayerUnavailable(PlayerId),
    #[error("grant rejected: {0}")]
    Rejected(String),
}

/// Creates an item stack and places it in a player's inventory.
pub trait ItemGrant {
    fn grant(
        &mut self,
        player: &PlayerId,
        item: &str,
        amount: u32,
        skin_id: u64,
    ) -> Result<(), GrantError>;
}

impl<G: ItemGrant + ?Sized> ItemGrant for &mut G {
    fn grant(
        &mut self,
        player: &PlayerId,
        item: &str,
        amount: u32,
        skin_id: u64,
    ) -> Result<(), GrantError> {
        (**self).grant(player, item, amount, skin_id)
    }
}

/// Answers whether a player holds a named permission.
pub trait PermissionCheck {
    fn has_permission(&self, player: &PlayerId, permission: &str) -> bool;
}

/// Source of claim timestamps.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
