//! Loading and saving the reward configuration file.

use claimrewards_types::RewardConfig;
use std::path::Path;
use tracing::{info, warn};

use crate::persistence::{self, LoadStatus, PersistError, PersistencePolicy};

const LABEL: &str = "reward config";

/// Loads the reward configuration from `path`.
///
/// Missing fields take their defaults. A missing file, or (under
/// [`PersistencePolicy::FailOpen`]) a corrupt or invalid one, is replaced by
/// the defaults and written back. Corrupt and invalid files are moved aside
/// first.
pub fn load_reward_config(
    path: &Path,
    policy: PersistencePolicy,
) -> Result<RewardConfig, PersistError> {
    let (loaded, mut status) = persistence::load_json::<RewardConfig>(path, policy, LABEL)?;
    let config = match loaded {
        Some(config) => match config.validate() {
            Ok(()) => config,
            Err(err) => {
                policy.on_load_error(
                    LABEL,
                    PersistError::Invalid {
                        path: path.to_path_buf(),
                        reason: err.to_string(),
                    },
                )?;
                persistence::quarantine(path);
                status = LoadStatus::Recovered;
                RewardConfig::default()
            }
        },
        None => RewardConfig::default(),
    };

    if status.needs_write() {
        warn!(path = ?path, "generating new configuration file");
        save_reward_config(path, &config, policy)?;
    }
    info!(item = %config.item, skin_id = config.skin_id, "reward config loaded");
    Ok(config)
}

/// Writes `config` to `path`, applying `policy` to failures.
pub fn save_reward_config(
    path: &Path,
    config: &RewardConfig,
    policy: PersistencePolicy,
) -> Result<(), PersistError> {
    match persistence::write_json(path, config) {
        Ok(()) => Ok(()),
        Err(err) => policy.on_save_error(LABEL, err),
    }
}
