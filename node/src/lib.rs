use anyhow::{Context, Result};
use claimrewards_execution::{
    load_reward_config, ClaimContext, ClaimOptions, PersistencePolicy,
};
use claimrewards_types::constants::PERMISSION_CLAIM;
use std::{
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;
use tracing::{info, Level};

pub mod console;
pub mod dispatcher;
pub mod grant;
pub mod lang;
pub mod permissions;

use dispatcher::Dispatcher;
use lang::Messages;
use permissions::PermissionRegistry;

pub const DEFAULT_DATA_DIR: &str = "oxide/data/ClaimPlayerRewards";
pub const DEFAULT_CONFIG_PATH: &str = "oxide/config/ClaimPlayerRewards.json";
pub const DEFAULT_LANG_PATH: &str = "oxide/lang/en/ClaimPlayerRewards.json";
pub const DEFAULT_PERMISSIONS_PATH: &str = "oxide/data/permissions.json";

/// Raw settings as supplied on the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub data_dir: String,
    pub config_path: String,
    pub lang_path: String,
    pub permissions_path: String,
    pub log_level: String,
    pub log_json: bool,
    pub persistence: String,
    pub strict_grant: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: DEFAULT_DATA_DIR.to_string(),
            config_path: DEFAULT_CONFIG_PATH.to_string(),
            lang_path: DEFAULT_LANG_PATH.to_string(),
            permissions_path: DEFAULT_PERMISSIONS_PATH.to_string(),
            log_level: "info".to_string(),
            log_json: false,
            persistence: PersistencePolicy::default().to_string(),
            strict_grant: false,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("invalid persistence policy: {value}")]
    InvalidPersistence { value: String },
    #[error("{field} must not be empty")]
    EmptyPath { field: &'static str },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedConfig {
    pub data_dir: PathBuf,
    pub config_path: PathBuf,
    pub lang_path: PathBuf,
    pub permissions_path: PathBuf,
    pub log_level: Level,
    pub log_json: bool,
    pub options: ClaimOptions,
}

fn non_empty_path(field: &'static str, value: &str) -> Result<PathBuf, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyPath { field });
    }
    Ok(PathBuf::from(trimmed))
}

impl Config {
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        let data_dir = non_empty_path("data_dir", &self.data_dir)?;
        let config_path = non_empty_path("config", &self.config_path)?;
        let lang_path = non_empty_path("lang", &self.lang_path)?;
        let permissions_path = non_empty_path("permissions", &self.permissions_path)?;

        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;
        let persistence = PersistencePolicy::from_str(&self.persistence).map_err(|_| {
            ConfigError::InvalidPersistence {
                value: self.persistence.clone(),
            }
        })?;

        Ok(ValidatedConfig {
            data_dir,
            config_path,
            lang_path,
            permissions_path,
            log_level,
            log_json: self.log_json,
            options: ClaimOptions {
                persistence,
                strict_grant: self.strict_grant,
            },
        })
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display())),
        _ => Ok(()),
    }
}

impl ValidatedConfig {
    pub fn policy(&self) -> PersistencePolicy {
        self.options.persistence
    }

    /// Loads the permission registry and makes sure the claim permission is
    /// registered in it.
    pub fn load_permissions(&self) -> Result<PermissionRegistry> {
        ensure_parent(&self.permissions_path)?;
        let mut permissions = PermissionRegistry::load(&self.permissions_path, self.policy())
            .context("failed to load permissions")?;
        if permissions.register(PERMISSION_CLAIM) {
            permissions.save().context("failed to save permissions")?;
        }
        Ok(permissions)
    }

    /// Creates missing directories and loads every file the claim command
    /// needs.
    pub fn bootstrap(&self) -> Result<Dispatcher> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("failed to create {}", self.data_dir.display()))?;
        ensure_parent(&self.config_path)?;
        ensure_parent(&self.lang_path)?;

        let reward = load_reward_config(&self.config_path, self.policy())
            .context("failed to load reward config")?;
        let messages =
            Messages::load(&self.lang_path, self.policy()).context("failed to load messages")?;
        let permissions = self.load_permissions()?;
        let claims = ClaimContext::open(&self.data_dir, reward, self.options)
            .context("failed to open claim stores")?;

        claims_summary(&claims);
        Ok(Dispatcher::new(claims, permissions, messages))
    }
}

fn claims_summary(claims: &ClaimContext) {
    info!(
        pending = claims.allocations().len(),
        claimed = claims.ledger().len(),
        item = %claims.config().item,
        persistence = %claims.options().persistence,
        strict_grant = claims.options().strict_grant,
        "claim stores ready"
    );
}
