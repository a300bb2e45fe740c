//! Item grants delivered as host console commands.

use claimrewards_execution::{GrantError, ItemGrant};
use claimrewards_types::PlayerId;
use std::io::Write;
use tracing::debug;

/// Writes one `give <player> <item> <amount> <skin>` line per grant.
///
/// The host server reads these lines and performs the inventory insert.
pub struct ConsoleGrant<W: Write> {
    out: W,
}

impl<W: Write> ConsoleGrant<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ItemGrant for ConsoleGrant<W> {
    fn grant(
        &mut self,
        player: &PlayerId,
        item: &str,
        amount: u32,
        skin_id: u64,
    ) -> Result<(), GrantError> {
        if item.trim().is_empty() || item.contains(char::is_whitespace) {
            return Err(GrantError::UnknownItem(item.to_string()));
        }
        writeln!(self.out, "give {player} {item} {amount} {skin_id}")
            .and_then(|()| self.out.flush())
            .map_err(|err| GrantError::Rejected(err.to_string()))?;
        debug!(%player, item, amount, skin_id, "grant issued");
        Ok(())
    }
}
