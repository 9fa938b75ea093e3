// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Chef Server Context Authors

use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A frozen copy of a configuration store at one instant.
///
/// Snapshots compare by value, so two snapshots taken from the same store
/// state are equal, and a snapshot of a freshly parsed file equals a snapshot
/// of any other store that parsed the same file from the same baseline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigSnapshot {
    values: BTreeMap<String, serde_json::Value>,
}

impl ConfigSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    /// Get an option as a string, ignoring values of other types
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(serde_json::Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Option<serde_json::Value> {
        self.values.insert(key.into(), value.into())
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.values.remove(key)
    }
}

impl From<BTreeMap<String, serde_json::Value>> for ConfigSnapshot {
    fn from(values: BTreeMap<String, serde_json::Value>) -> Self {
        ConfigSnapshot { values }
    }
}

impl<K: Into<String>, V: Into<serde_json::Value>> FromIterator<(K, V)>
    for ConfigSnapshot
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        ConfigSnapshot {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
