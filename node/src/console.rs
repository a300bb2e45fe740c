//! Line-oriented chat input for running the dispatcher outside a game host.
//!
//! Each input line is `<player_id> <chat line>`. Replies are written as
//! `<player_id>: <reply>` to the reply sink; grants go to the grant sink.

use anyhow::{Context, Result};
use claimrewards_execution::{Clock, ItemGrant};
use claimrewards_types::PlayerId;
use std::io::{BufRead, Write};
use tracing::warn;

use crate::dispatcher::Dispatcher;

/// Counters reported when the input ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConsoleSummary {
    pub lines: usize,
    pub handled: usize,
    pub rejected: usize,
}

pub fn run_console<C, R, W, G>(
    dispatcher: &Dispatcher<C>,
    input: R,
    mut replies: W,
    mut grant: G,
) -> Result<ConsoleSummary>
where
    C: Clock,
    R: BufRead,
    W: Write,
    G: ItemGrant,
{
    let mut summary = ConsoleSummary::default();
    for line in input.lines() {
        let line = line.context("failed to read console input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        summary.lines += 1;

        let (id, chat) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let player = match PlayerId::new(id) {
            Ok(player) => player,
            Err(err) => {
                warn!(input = line, error = %err, "skipping line with invalid player id");
                summary.rejected += 1;
                continue;
            }
        };
        if let Some(reply) = dispatcher.dispatch(&player, chat, &mut grant) {
            summary.handled += 1;
            writeln!(replies, "{player}: {reply}").context("failed to write reply")?;
        }
    }
    replies.flush().context("failed to flush replies")?;
    Ok(summary)
}
