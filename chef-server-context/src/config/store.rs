// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Chef Server Context Authors

//! Mutable configuration state shared by everything in the process that
//! acts as a Chef client.
//!
//! The store only offers whole-state operations (`reset`, `from_file`,
//! `save`, `restore`) plus keyed reads and writes. Each operation takes the
//! internal lock once, so readers never observe a half-applied snapshot.
//! A sequence of operations is not atomic: two threads switching the same
//! store in and out will interleave.

use crate::config::{ConfigLoadError, ConfigSnapshot, FileConfigBuilder};
use log::*;
use std::{
    path::Path,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

#[derive(Debug, Default)]
pub struct ConfigStore {
    baseline: ConfigSnapshot,
    live: RwLock<ConfigSnapshot>,
}

impl ConfigStore {
    /// Create an empty store whose baseline is also empty
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that starts from, and resets to, the given values
    pub fn with_baseline(baseline: ConfigSnapshot) -> Self {
        ConfigStore {
            live: RwLock::new(baseline.clone()),
            baseline,
        }
    }

    /// Clear every value and go back to the baseline
    pub fn reset(&self) {
        *self.write() = self.baseline.clone();
    }

    /// Parse a TOML configuration file (and its `.d` snippets) on top of the
    /// current values.
    ///
    /// The live values are only replaced once the whole file parsed
    /// successfully. On error they are left as they were before the call.
    pub fn from_file(&self, path: &Path) -> Result<(), ConfigLoadError> {
        let loaded = FileConfigBuilder::new()
            .base(self.save())
            .server_config_file(path)
            .build()?;
        debug!(
            "Loaded {} configuration options from {}",
            loaded.len(),
            path.display()
        );
        *self.write() = loaded;
        Ok(())
    }

    /// Take a snapshot of the current values
    pub fn save(&self) -> ConfigSnapshot {
        self.read().clone()
    }

    /// Replace the current values wholesale with a snapshot
    pub fn restore(&self, snapshot: ConfigSnapshot) {
        *self.write() = snapshot;
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.read().get(key).cloned()
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        self.read().get_str(key).map(str::to_string)
    }

    pub fn set(
        &self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) {
        let _ = self.write().insert(key, value);
    }

    pub fn unset(&self, key: &str) -> Option<serde_json::Value> {
        self.write().remove(key)
    }

    // A panic while holding the lock cannot leave a snapshot half-written,
    // so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, ConfigSnapshot> {
        self.live.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ConfigSnapshot> {
        self.live.write().unwrap_or_else(PoisonError::into_inner)
    }
}
