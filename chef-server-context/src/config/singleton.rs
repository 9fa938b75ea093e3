// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Chef Server Context Authors

use super::{ConfigSnapshot, ConfigStore};
use std::sync::OnceLock;

static GLOBAL_STORE: OnceLock<ConfigStore> = OnceLock::new();

/// Initialize the global configuration store with a custom baseline
///
/// This function can be called at application startup to choose the values
/// the global store resets to. If not called, the store is created empty on
/// first access via `global_store()`.
///
/// Returns the baseline back as the error if the store already exists
/// (either explicitly or automatically initialized).
pub fn initialize_global_store(
    baseline: ConfigSnapshot,
) -> Result<(), ConfigSnapshot> {
    let mut baseline = Some(baseline);
    let _ = GLOBAL_STORE.get_or_init(|| {
        ConfigStore::with_baseline(baseline.take().unwrap_or_default())
    });
    match baseline {
        None => Ok(()),
        Some(rejected) => Err(rejected),
    }
}

/// Get reference to the process-wide configuration store
///
/// This is the store `ChefServer::new()` switches in and out. Explicit stores
/// can be passed through `ChefServerBuilder::store()` instead.
pub fn global_store() -> &'static ConfigStore {
    GLOBAL_STORE.get_or_init(ConfigStore::new)
}

/// Check if the global store has been created
pub fn is_initialized() -> bool {
    GLOBAL_STORE.get().is_some()
}
