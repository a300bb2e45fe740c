use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use claimrewards_execution::Clock;
use claimrewards_node::{
    console::run_console, dispatcher::Dispatcher, grant::ConsoleGrant, Config, ValidatedConfig,
    DEFAULT_CONFIG_PATH, DEFAULT_DATA_DIR, DEFAULT_LANG_PATH, DEFAULT_PERMISSIONS_PATH,
};
use claimrewards_types::{
    constants::{CLAIM_COMMAND, PERMISSION_CLAIM, PERMISSION_WILDCARD},
    ClaimRecord, PlayerId,
};
use std::io::{self, Write};
use tracing::{info, warn, Level};

#[derive(Parser, Debug)]
#[command(author, version, about = "Claim pending player rewards")]
struct Args {
    /// Directory holding the allocation and ledger files
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    data_dir: String,

    /// Reward configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Message template file
    #[arg(long, default_value = DEFAULT_LANG_PATH)]
    lang: String,

    /// Permission registry file
    #[arg(long, default_value = DEFAULT_PERMISSIONS_PATH)]
    permissions: String,

    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// fail-open or fail-closed
    #[arg(long, default_value = "fail-open")]
    persistence: String,

    /// Abort a claim when the item cannot be granted
    #[arg(long)]
    strict_grant: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Cmd {
    /// Run the claim command once for a player. Grant commands go to
    /// stdout and the player's reply to stderr.
    Claim {
        #[arg(long)]
        player: String,
    },
    /// Dispatch `<player_id> <chat line>` lines read from stdin. Grant
    /// commands go to stdout and replies to stderr.
    Console,
    /// List pending allocations
    Pending,
    /// List recorded claims
    History {
        #[arg(long)]
        player: Option<String>,
    },
    /// Grant the claim permission (`*` for everyone)
    Grant { player: String },
    /// Revoke the claim permission
    Revoke { player: String },
}

fn build_config(args: &Args) -> Config {
    Config {
        data_dir: args.data_dir.clone(),
        config_path: args.config.clone(),
        lang_path: args.lang.clone(),
        permissions_path: args.permissions.clone(),
        log_level: args.log_level.clone(),
        log_json: args.log_json,
        persistence: args.persistence.clone(),
        strict_grant: args.strict_grant,
    }
}

fn init_tracing(level: Level, json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Accepts a player id or the wildcard.
fn permission_subject(value: &str) -> Result<String> {
    if value == PERMISSION_WILDCARD {
        return Ok(value.to_string());
    }
    let player =
        PlayerId::new(value).with_context(|| format!("invalid player id {value:?}"))?;
    Ok(player.to_string())
}

/// Dispatches `/claim` for `player`, keeping grant commands and the reply on
/// separate sinks.
fn claim_once<C: Clock>(
    dispatcher: &Dispatcher<C>,
    player: &PlayerId,
    mut replies: impl Write,
    grants: impl Write,
) -> Result<()> {
    let line = format!("/{CLAIM_COMMAND}");
    if let Some(reply) = dispatcher.dispatch(player, &line, ConsoleGrant::new(grants)) {
        writeln!(replies, "{player}: {reply}").context("failed to write reply")?;
    }
    Ok(())
}

fn run(config: &ValidatedConfig, command: Cmd) -> Result<()> {
    let mut stdout = io::stdout().lock();
    match command {
        Cmd::Claim { player } => {
            let player = PlayerId::new(player).context("invalid player id")?;
            let dispatcher = config.bootstrap()?;
            claim_once(&dispatcher, &player, io::stderr().lock(), &mut stdout)?;
        }
        Cmd::Console => {
            let dispatcher = config.bootstrap()?;
            let stdin = io::stdin().lock();
            let summary = run_console(
                &dispatcher,
                stdin,
                io::stderr().lock(),
                ConsoleGrant::new(&mut stdout),
            )?;
            info!(
                lines = summary.lines,
                handled = summary.handled,
                rejected = summary.rejected,
                "console input closed"
            );
        }
        Cmd::Pending => {
            let dispatcher = config.bootstrap()?;
            dispatcher.with_claims(|claims| -> io::Result<()> {
                for (player, amount) in claims.allocations().iter() {
                    writeln!(stdout, "{player}\t{amount}")?;
                }
                Ok(())
            })?;
        }
        Cmd::History { player } => {
            let player = player
                .map(PlayerId::new)
                .transpose()
                .context("invalid player id")?;
            let dispatcher = config.bootstrap()?;
            dispatcher.with_claims(|claims| -> io::Result<()> {
                let ledger = claims.ledger();
                let records: Box<dyn Iterator<Item = &ClaimRecord> + '_> = match &player {
                    Some(player) => Box::new(ledger.claims_for(player)),
                    None => Box::new(ledger.records().iter()),
                };
                for record in records {
                    writeln!(
                        stdout,
                        "{}\t{}\t{}",
                        record.timestamp, record.player, record.amount_claimed
                    )?;
                }
                Ok(())
            })?;
        }
        Cmd::Grant { player } => {
            let subject = permission_subject(&player)?;
            let mut permissions = config.load_permissions()?;
            if permissions.grant(PERMISSION_CLAIM, &subject) {
                permissions.save().context("failed to save permissions")?;
                info!(player = %subject, permission = PERMISSION_CLAIM, "permission granted");
            } else {
                warn!(
                    player = %subject,
                    permission = PERMISSION_CLAIM,
                    "permission already granted"
                );
            }
        }
        Cmd::Revoke { player } => {
            let subject = permission_subject(&player)?;
            let mut permissions = config.load_permissions()?;
            if permissions.revoke(PERMISSION_CLAIM, &subject) {
                permissions.save().context("failed to save permissions")?;
                info!(player = %subject, permission = PERMISSION_CLAIM, "permission revoked");
            } else {
                warn!(
                    player = %subject,
                    permission = PERMISSION_CLAIM,
                    "permission was not granted"
                );
            }
        }
    }
    stdout.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = build_config(&args)
        .validate()
        .context("invalid configuration")?;
    init_tracing(config.log_level, config.log_json);
    run(&config, args.command)
}
