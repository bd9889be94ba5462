//! Session-scoped alert memory, partitioned by identity.
//!
//! Only one identity is active at a time. Loading memory for a different
//! identity than the last active one is treated as an account switch: the
//! incoming identity starts from zeroed memory instead of whatever was left
//! over from an earlier login. Other identities' entries are not touched.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{AlertMemory, EpochMillis};
use crate::error::Result;
use crate::tracing::prelude::*;

/// Scope used when nobody is signed in.
pub const GUEST_SCOPE: &str = "guest";

/// Partition key for alert memory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    Guest,
    User(String),
}

impl Identity {
    /// Blank or missing user ids map to [`Identity::Guest`].
    pub fn from_user(user: Option<&str>) -> Self {
        match user.map(str::trim) {
            Some(id) if !id.is_empty() => Self::User(id.to_string()),
            _ => Self::Guest,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Guest => GUEST_SCOPE,
            Self::User(id) => id,
        }
    }
}

/// Storage for per-identity alert memory.
pub trait AlertStore: Send {
    /// Memory for `identity`, zeroed if none exists or the active identity
    /// changed. Makes `identity` the active one.
    fn load(&mut self, identity: &Identity) -> AlertMemory;

    /// Persist the observed count after an evaluation cycle. The
    /// acknowledgment time is not written here.
    ///
    /// Writing for an identity other than the active one switches to it
    /// first, exactly as [`AlertStore::load`] would.
    fn save(&mut self, identity: &Identity, memory: &AlertMemory) -> Result<()>;

    /// Record an explicit dismissal at `now`. Switches identity like
    /// `save`.
    fn acknowledge(&mut self, identity: &Identity, now: EpochMillis) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredAlert {
    last_observed_count: u64,
    #[serde(default)]
    last_acknowledged_at: Option<EpochMillis>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    active_identity: Option<String>,
    #[serde(default)]
    entries: BTreeMap<String, StoredAlert>,
}

/// [`AlertStore`] living for one session.
///
/// Kept in memory, optionally mirrored to a JSON file so consecutive CLI
/// runs of the same session share it. The file is not meant to outlive
/// the session.
#[derive(Debug, Default)]
pub struct SessionAlertStore {
    snapshot: Snapshot,
    path: Option<PathBuf>,
}

impl SessionAlertStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a file-backed store. A missing file starts an empty session;
    /// an unreadable one is discarded.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshot = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Discarding unreadable session file");
                Snapshot::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Snapshot::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            snapshot,
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn active_identity(&self) -> Option<&str> {
        self.snapshot.active_identity.as_deref()
    }

    /// Read an identity's memory without making it active.
    pub fn peek(&self, identity: &Identity) -> Option<AlertMemory> {
        let key = identity.key();
        self.snapshot
            .entries
            .get(key)
            .map(|stored| to_memory(key, stored))
    }

    /// Make `key` the active identity. Switching from another identity
    /// zeroes the incoming identity's entry. Returns whether it switched.
    fn switch_to(&mut self, key: &str) -> bool {
        if self.snapshot.active_identity.as_deref() == Some(key) {
            return false;
        }
        if let Some(previous) = &self.snapshot.active_identity {
            debug!(
                previous = %previous,
                identity = %key,
                "Identity switched, resetting alert memory"
            );
        }
        self.snapshot.active_identity = Some(key.to_string());
        self.snapshot
            .entries
            .insert(key.to_string(), StoredAlert::default());
        true
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&self.snapshot)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl AlertStore for SessionAlertStore {
    fn load(&mut self, identity: &Identity) -> AlertMemory {
        let key = identity.key();
        if self.switch_to(key) {
            if let Err(e) = self.persist() {
                warn!(error = %e, "Failed to persist alert memory reset");
            }
        }

        let stored = self.snapshot.entries.get(key).copied().unwrap_or_default();
        to_memory(key, &stored)
    }

    fn save(&mut self, identity: &Identity, memory: &AlertMemory) -> Result<()> {
        let key = identity.key();
        self.switch_to(key);
        self.snapshot
            .entries
            .entry(key.to_string())
            .or_default()
            .last_observed_count = memory.last_observed_count;
        self.persist()
    }

    fn acknowledge(&mut self, identity: &Identity, now: EpochMillis) -> Result<()> {
        let key = identity.key();
        self.switch_to(key);
        self.snapshot
            .entries
            .entry(key.to_string())
            .or_default()
            .last_acknowledged_at = Some(now);
        self.persist()
    }
}

fn to_memory(key: &str, stored: &StoredAlert) -> AlertMemory {
    AlertMemory {
        identity: key.to_string(),
        last_observed_count: stored.last_observed_count,
        last_acknowledged_at: stored.last_acknowledged_at,
    }
}
