//! JSON file persistence shared by the allocation store, the claim ledger
//! and the host-side configuration files.
//!
//! # Durability
//!
//! Every save rewrites the whole file using a write-rename pattern:
//! 1. Write the pretty-printed JSON to a sibling `*.tmp` file
//! 2. Sync the file to disk (`fsync`)
//! 3. Rename over the final path (atomic on POSIX)
//!
//! # Recovery
//!
//! A missing file loads as empty and is created immediately. An unreadable
//! or unparsable file is handled according to [`PersistencePolicy`]: under
//! `FailOpen` it is moved aside to `*.corrupt` (or the next free
//! `*.corrupt.N`), replaced by an empty file and the process keeps running.
//! Under `FailClosed` the error is returned.

use serde::{de::DeserializeOwned, Serialize};
use std::{
    fmt,
    io::{self, Write as IoWrite},
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;
use tracing::{error, info, warn};

/// Errors that can occur while reading or writing a persisted file.
#[derive(Debug, Error)]
pub enum PersistError {
    /// I/O error during file operations.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The in-memory value could not be encoded.
    #[error("failed to serialize {}: {source}", .path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The file exists but does not parse.
    #[error("{} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The file parses but its contents are rejected.
    #[error("{} is invalid: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },
}

impl PersistError {
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. }
            | Self::Serialize { path, .. }
            | Self::Corrupt { path, .. }
            | Self::Invalid { path, .. } => path,
        }
    }
}

/// What to do when a persisted file cannot be read or written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PersistencePolicy {
    /// Log the failure and continue with the in-memory state. Corrupt files
    /// load as empty.
    #[default]
    FailOpen,
    /// Return the failure to the caller.
    FailClosed,
}

impl PersistencePolicy {
    /// Applies the policy to a failed save.
    pub fn on_save_error(self, label: &str, err: PersistError) -> Result<(), PersistError> {
        match self {
            Self::FailOpen => {
                error!(
                    %label,
                    path = ?err.path(),
                    error = %err,
                    "failed to save; continuing with in-memory state"
                );
                Ok(())
            }
            Self::FailClosed => Err(err),
        }
    }

    /// Applies the policy to a failed load.
    pub fn on_load_error(self, label: &str, err: PersistError) -> Result<(), PersistError> {
        match self {
            Self::FailOpen => {
                warn!(%label, path = ?err.path(), error = %err, "failed to load; starting empty");
                Ok(())
            }
            Self::FailClosed => Err(err),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FailOpen => "fail-open",
            Self::FailClosed => "fail-closed",
        }
    }
}

impl fmt::Display for PersistencePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersistencePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fail-open" => Ok(Self::FailOpen),
            "fail-closed" => Ok(Self::FailClosed),
            other => Err(format!(
                "unknown persistence policy {other:?} (expected fail-open or fail-closed)"
            )),
        }
    }
}

/// How a file's contents were obtained by [`load_json`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    /// The file existed and parsed.
    Loaded,
    /// The file did not exist.
    Created,
    /// The file existed but was discarded.
    Recovered,
}

impl LoadStatus {
    /// Whether the caller should write its (empty or default) state back.
    pub fn needs_write(&self) -> bool {
        !matches!(self, Self::Loaded)
    }
}

/// Reads and parses `path`.
///
/// Returns `Ok(None)` when the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PersistError> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PersistError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_slice(&data)
        .map(Some)
        .map_err(|source| PersistError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

/// Loads `path`, applying `policy` to failures.
///
/// The returned value is `None` unless the status is [`LoadStatus::Loaded`].
/// Callers substitute their empty state and write it back when
/// [`LoadStatus::needs_write`] is set.
pub fn load_json<T: DeserializeOwned>(
    path: &Path,
    policy: PersistencePolicy,
    label: &str,
) -> Result<(Option<T>, LoadStatus), PersistError> {
    match read_json(path) {
        Ok(Some(value)) => {
            info!(%label, path = ?path, "loaded");
            Ok((Some(value), LoadStatus::Loaded))
        }
        Ok(None) => {
            info!(%label, path = ?path, "no file found, creating a new one");
            Ok((None, LoadStatus::Created))
        }
        Err(err) => {
            policy.on_load_error(label, err)?;
            quarantine(path);
            Ok((None, LoadStatus::Recovered))
        }
    }
}

/// Serializes `value` as indented JSON and atomically replaces `path`.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistError> {
    let data = serde_json::to_vec_pretty(value).map_err(|source| PersistError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    atomic_write(path, &data).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Atomically write data to a file using write-rename pattern.
fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let temp_path = path.with_extension("tmp");

    // Write to temp file
    {
        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
    }

    if let Err(err) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(err);
    }
    Ok(())
}

/// Moves an unusable file aside so the empty replacement does not destroy it.
///
/// Earlier quarantined copies are never overwritten: the first goes to
/// `*.corrupt`, later ones to `*.corrupt.1`, `*.corrupt.2`, and so on.
pub(crate) fn quarantine(path: &Path) {
    if !path.exists() {
        return;
    }
    let aside = quarantine_path(path);
    match std::fs::rename(path, &aside) {
        Ok(()) => warn!(path = ?path, moved_to = ?aside, "moved unreadable file aside"),
        Err(err) => warn!(path = ?path, error = %err, "could not move unreadable file aside"),
    }
}

fn quarantine_path(path: &Path) -> PathBuf {
    let first = path.with_extension("corrupt");
    if !first.exists() {
        return first;
    }
    (1u32..)
        .map(|n| path.with_extension(format!("corrupt.{n}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}
