// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Chef Server Context Authors

//! Acting as a Chef server client from outside its workspace
//!
//! A [`ChefServer`] knows the configuration file of one server. Switching it
//! in replaces the contents of a [`ConfigStore`] with that file, switching it
//! out puts the previous contents back. Between the two, anything reading
//! the store sees the server configuration.
//!
//! The protocol for one switch:
//!
//! 1. snapshot the store into `stored_config`
//! 2. reset the store to its baseline
//! 3. load the server configuration file into the store
//! 4. snapshot the store into `server_config`
//!
//! and switching out restores `stored_config`. If step 3 fails the store is
//! restored immediately and neither snapshot is updated, so the store always
//! holds one of the two snapshots.
//!
//! [`ChefServer::with_server_config`] and [`ChefServer::switch_in`] tie the
//! switch out to a scope, so it also runs on early return, error or panic.

use crate::{
    cheffish::CheffishDetails,
    config::{
        global_store, ConfigLoadError, ConfigSnapshot, ConfigStore,
        CHEF_SERVER_URL, CLIENT_KEY, DEFAULT_SERVER_CONFIG,
        ENCRYPTED_DATA_BAG_SECRET, NODE_NAME,
    },
    error::{Error, Result},
    rest::{Headers, HttpConnector, Method, RestClient, RestConnector},
    secrets::{EncryptedDataBagStore, SecretStore},
};
use log::*;
use serde_json::Value;
use std::{
    fmt,
    ops::Deref,
    path::{Path, PathBuf},
};

pub struct ChefServer<'s> {
    store: &'s ConfigStore,
    config_file: PathBuf,
    stored_config: ConfigSnapshot,
    server_config: ConfigSnapshot,
    connector: Box<dyn RestConnector>,
    secrets: Box<dyn SecretStore>,
}

impl fmt::Debug for ChefServer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChefServer")
            .field("config_file", &self.config_file)
            .field("stored_config", &self.stored_config)
            .field("server_config", &self.server_config)
            .finish_non_exhaustive()
    }
}

impl ChefServer<'static> {
    /// Server from the delivery workspace configuration, switched in and
    /// out of the global store
    pub fn new() -> Result<Self> {
        ChefServerBuilder::new().build()
    }

    /// Server from the given configuration file, switched in and out of the
    /// global store
    pub fn from_config_file(path: impl Into<PathBuf>) -> Result<Self> {
        ChefServerBuilder::new().config_file(path).build()
    }
}

impl<'s> ChefServer<'s> {
    pub fn builder() -> ChefServerBuilder<'s> {
        ChefServerBuilder::new()
    }

    pub fn store(&self) -> &'s ConfigStore {
        self.store
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// The server configuration as parsed on the last switch in
    pub fn server_config(&self) -> &ConfigSnapshot {
        &self.server_config
    }

    /// The configuration that was active before the last switch in
    pub fn stored_config(&self) -> &ConfigSnapshot {
        &self.stored_config
    }

    /// Switch the server configuration in.
    ///
    /// Pair every successful call with `unload_server_config()`, or use
    /// `switch_in()`/`with_server_config()` which do that automatically.
    pub fn load_server_config(&mut self) -> Result<()> {
        let stored = self.store.save();
        self.store.reset();

        if let Err(e) = self.store.from_file(&self.config_file) {
            warn!(
                "Failed to load server configuration from {}, restoring previous configuration",
                self.config_file.display()
            );
            self.store.restore(stored);
            return Err(e.into());
        }

        self.server_config = self.store.save();
        self.stored_config = stored;
        debug!(
            "Switched in server configuration from {}",
            self.config_file.display()
        );
        Ok(())
    }

    /// Switch the server configuration out, restoring the configuration
    /// saved by the last `load_server_config()`.
    pub fn unload_server_config(&self) {
        self.store.restore(self.stored_config.clone());
        debug!(
            "Switched out server configuration from {}",
            self.config_file.display()
        );
    }

    /// Switch the server configuration in until the returned guard is
    /// dropped.
    pub fn switch_in(&mut self) -> Result<ServerConfigGuard<'_, 's>> {
        self.load_server_config()?;
        Ok(ServerConfigGuard { server: self })
    }

    /// Run `f` with the server configuration switched in.
    ///
    /// The previous configuration is restored before this returns, whether
    /// `f` succeeds, fails or panics. The result of `f` is passed through
    /// untouched.
    pub fn with_server_config<T, E, F>(
        &mut self,
        f: F,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce(&ChefServer<'s>) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        let guard = self.switch_in()?;
        let result = f(&guard);
        drop(guard);
        result
    }

    /// Send a request to the server as its configured client.
    pub fn rest(
        &self,
        method: Method,
        path: &str,
        headers: &Headers,
        data: Option<&Value>,
    ) -> Result<Value> {
        let client = self.connect()?;
        Ok(client.request(method, path, headers, data)?)
    }

    /// Fetch and decrypt an item of an encrypted data bag.
    ///
    /// The secret is read from `secret_key_path` when given, and from the
    /// `encrypted_data_bag_secret` option of the server configuration
    /// otherwise. Without either, `ConfigLoadError::RequiredOption` is
    /// returned before anything is read or fetched.
    pub fn encrypted_data_bag_item(
        &self,
        bag: &str,
        item: &str,
        secret_key_path: Option<&Path>,
    ) -> Result<Value> {
        let secret_key_path = match secret_key_path {
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(self.required(ENCRYPTED_DATA_BAG_SECRET)?),
        };
        let secret = self.secrets.load_secret(&secret_key_path)?;
        let client = self.connect()?;
        self.secrets.load(client.as_ref(), bag, item, &secret)
    }

    /// Connection details for Cheffish, missing options are left empty
    pub fn cheffish_details(&self) -> CheffishDetails {
        CheffishDetails::from(&self.server_config)
    }

    fn connect(&self) -> Result<Box<dyn RestClient>> {
        Ok(self.connector.connect(
            self.required(CHEF_SERVER_URL)?,
            self.required(NODE_NAME)?,
            self.required(CLIENT_KEY)?,
        )?)
    }

    fn required(&self, key: &str) -> Result<&str> {
        self.server_config.get_str(key).ok_or_else(|| {
            Error::from(ConfigLoadError::RequiredOption(key.to_string()))
        })
    }
}

/// Keeps the server configuration switched in while alive.
///
/// Dereferences to the [`ChefServer`] it was created from.
#[must_use = "the server configuration is switched out on drop"]
pub struct ServerConfigGuard<'a, 's> {
    server: &'a ChefServer<'s>,
}

impl<'s> Deref for ServerConfigGuard<'_, 's> {
    type Target = ChefServer<'s>;

    fn deref(&self) -> &Self::Target {
        self.server
    }
}

impl Drop for ServerConfigGuard<'_, '_> {
    fn drop(&mut self) {
        self.server.unload_server_config();
    }
}

#[derive(Default)]
pub struct ChefServerBuilder<'s> {
    store: Option<&'s ConfigStore>,
    config_file: Option<PathBuf>,
    connector: Option<Box<dyn RestConnector>>,
    secrets: Option<Box<dyn SecretStore>>,
}

impl<'s> ChefServerBuilder<'s> {
    pub fn new() -> Self {
        ChefServerBuilder {
            store: None,
            config_file: None,
            connector: None,
            secrets: None,
        }
    }

    /// Store to switch the server configuration in and out of.
    /// Defaults to the global store.
    pub fn store(mut self, store: &'s ConfigStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Defaults to `DEFAULT_SERVER_CONFIG`
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Defaults to `HttpConnector`
    pub fn rest_connector(
        mut self,
        connector: impl RestConnector + 'static,
    ) -> Self {
        self.connector = Some(Box::new(connector));
        self
    }

    /// Defaults to `EncryptedDataBagStore`
    pub fn secret_store(
        mut self,
        secrets: impl SecretStore + 'static,
    ) -> Self {
        self.secrets = Some(Box::new(secrets));
        self
    }

    /// Load the server configuration once to capture it, leaving the store
    /// as it was found.
    pub fn build(self) -> Result<ChefServer<'s>> {
        let mut server = ChefServer {
            store: match self.store {
                Some(store) => store,
                None => global_store(),
            },
            config_file: self
                .config_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SERVER_CONFIG)),
            stored_config: ConfigSnapshot::new(),
            server_config: ConfigSnapshot::new(),
            connector: self
                .connector
                .unwrap_or_else(|| Box::new(HttpConnector::new())),
            secrets: self
                .secrets
                .unwrap_or_else(|| Box::new(EncryptedDataBagStore)),
        };

        server.load_server_config()?;
        server.unload_server_config();

        info!(
            "Captured server configuration from {}",
            server.config_file.display()
        );
        Ok(server)
    }
}
