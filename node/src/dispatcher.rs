//! Chat command routing.

use claimrewards_execution::{ClaimContext, ClaimError, Clock, ItemGrant, SystemClock};
use claimrewards_types::{constants::CLAIM_COMMAND, MessageKey, PlayerId};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, error, warn};

use crate::{lang::Messages, permissions::PermissionRegistry};

/// Commands the dispatcher understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Claim,
}

impl Command {
    /// Parses a chat line. Matching is case-insensitive and arguments after
    /// the command name are ignored.
    pub fn parse(line: &str) -> Option<Self> {
        let name = line.trim_start().strip_prefix('/')?.split_whitespace().next()?;
        name.eq_ignore_ascii_case(CLAIM_COMMAND).then_some(Self::Claim)
    }
}

/// Routes player chat commands to the claim transaction.
///
/// Claims are serialized through the inner mutex, so a dispatcher may be
/// shared between threads.
pub struct Dispatcher<C: Clock = SystemClock> {
    claims: Mutex<ClaimContext<C>>,
    permissions: PermissionRegistry,
    messages: Messages,
}

impl<C: Clock> Dispatcher<C> {
    pub fn new(
        claims: ClaimContext<C>,
        permissions: PermissionRegistry,
        messages: Messages,
    ) -> Self {
        Self {
            claims: Mutex::new(claims),
            permissions,
            messages,
        }
    }

    /// Handles one chat line from `player`. Returns the reply to show them,
    /// or `None` when the line is not a known command.
    pub fn dispatch<G: ItemGrant>(
        &self,
        player: &PlayerId,
        line: &str,
        grant: G,
    ) -> Option<String> {
        let command = Command::parse(line)?;
        debug!(%player, ?command, "dispatching");
        let reply = match command {
            Command::Claim => self.claim(player, grant),
        };
        Some(reply)
    }

    fn claim<G: ItemGrant>(&self, player: &PlayerId, grant: G) -> String {
        let result = self
            .with_claims(|claims| claims.authorize_and_claim(player, &self.permissions, grant));
        match result {
            Ok(outcome) => self.messages.outcome(&outcome),
            Err(ClaimError::Persist {
                player,
                amount,
                source,
            }) => {
                // The item is already in the player's inventory
                error!(%player, amount, error = %source, "claim delivered but not saved");
                let item = self.with_claims(|claims| claims.config().item.clone());
                self.messages
                    .render(MessageKey::ClaimSuccess, &[amount.to_string(), item])
            }
            Err(err @ ClaimError::Grant { .. }) => {
                warn!(error = %err, "claim aborted");
                self.messages.render(MessageKey::ClaimFailed, &[])
            }
        }
    }

    /// Runs `f` with exclusive access to the claim context.
    pub fn with_claims<R>(&self, f: impl FnOnce(&mut ClaimContext<C>) -> R) -> R {
        let mut claims = self.claims.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut claims)
    }

    pub fn permissions(&self) -> &PermissionRegistry {
        &self.permissions
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }
}
