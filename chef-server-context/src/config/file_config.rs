// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Chef Server Context Authors

use crate::config::{ConfigLoadError, ConfigSnapshot};
use glob::glob;
use log::*;
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Workspace configuration used when no file is given explicitly
pub static DEFAULT_SERVER_CONFIG: &str =
    "/var/opt/delivery/workspace/.chef/knife.toml";

/// Placeholder expanded to the directory holding the main config file
pub static CONFIG_DIR_KEYWORD: &str = "{config_dir}";

// This enum represents the different kinds of sources for our configuration.
// By wrapping the PathBuf, we preserve the context of whether the user
// specified a single file or a whole directory.
#[derive(Debug)]
pub enum ConfigSource {
    File { path: PathBuf, required: bool },
    Directory(PathBuf),
}

#[derive(Debug, Default)]
pub struct FileConfigBuilder {
    base: ConfigSnapshot,
    sources: Vec<ConfigSource>,
    config_dir: Option<PathBuf>,
}

impl FileConfigBuilder {
    /// Creates a new, empty FileConfigBuilder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the values the sources are merged on top of.
    pub fn base(&mut self, base: ConfigSnapshot) -> &mut Self {
        self.base = base;
        self
    }

    /// Adds a single file that must exist and parse.
    ///
    /// # Arguments
    ///
    /// * `path` - A path to the configuration file.
    pub fn file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.sources.push(ConfigSource::File {
            path: path.into(),
            required: true,
        });
        self
    }

    /// Adds a single file that is skipped when it does not exist.
    pub fn optional_file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.sources.push(ConfigSource::File {
            path: path.into(),
            required: false,
        });
        self
    }

    /// Adds a directory as a configuration source.
    /// All files within this directory will be loaded through globbing.
    ///
    /// # Arguments
    ///
    /// * `path` - A path to the directory.
    pub fn directory(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.sources.push(ConfigSource::Directory(path.into()));
        self
    }

    /// Expand `{config_dir}` in string values to the given directory.
    pub fn config_dir(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.config_dir = Some(path.into());
        self
    }

    /// Load a server configuration file together with its snippets
    /// directory, resolving `{config_dir}` against the file location.
    pub fn server_config_file(&mut self, path: &Path) -> &mut Self {
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        self.file(path).directory(snippets_dir(path)).config_dir(dir)
    }

    /// Consumes the sources and attempts to build the configuration.
    ///
    /// Each file replaces the top-level options it sets, keys are kept
    /// exactly as written. Quoted dotted keys such as `"knife.editor"` stay
    /// a single option.
    pub fn build(&mut self) -> Result<ConfigSnapshot, ConfigLoadError> {
        let mut snapshot = self.base.clone();

        // Apply the sources in order
        for (index, source) in self.sources.iter().enumerate() {
            match source {
                ConfigSource::File { path, required } => {
                    debug!(
                        "Loading configuration from FILE (#{}): {}",
                        index,
                        path.display()
                    );
                    if !path.exists() {
                        if *required {
                            return Err(ConfigLoadError::MissingFile {
                                file: path.display().to_string(),
                            });
                        }
                        continue;
                    }
                    self.merge_file(&mut snapshot, path)?;
                }
                ConfigSource::Directory(path) => {
                    if !path.is_dir() {
                        continue;
                    }
                    debug!(
                        "Loading configuration from DIRECTORY (#{}): {}",
                        index,
                        path.display()
                    );

                    let files = glob(&path.join("*").display().to_string())
                        .map_err(ConfigLoadError::GlobPattern)?
                        .filter_map(|entry| entry.ok())
                        .filter(|path| path.is_file());
                    for file in files {
                        self.merge_file(&mut snapshot, &file)?;
                    }
                }
            }
        }

        debug!("File configuration build process finished.");
        Ok(snapshot)
    }

    fn merge_file(
        &self,
        snapshot: &mut ConfigSnapshot,
        path: &Path,
    ) -> Result<(), ConfigLoadError> {
        let contents = fs::read_to_string(path).map_err(|source| {
            ConfigLoadError::Read {
                file: path.display().to_string(),
                source,
            }
        })?;
        let table: toml::Table =
            toml::from_str(&contents).map_err(|source| {
                ConfigLoadError::Parse {
                    file: path.display().to_string(),
                    source,
                }
            })?;

        let config_dir =
            self.config_dir.as_ref().map(|d| d.display().to_string());
        for (key, value) in table {
            let mut value = toml_to_json(value);
            if let Some(dir) = &config_dir {
                translate_value(&mut value, dir);
            }
            let _ = snapshot.insert(key, value);
        }
        Ok(())
    }
}

/// Directory holding optional snippets for a config file: `knife.d` for
/// `knife.toml`
pub fn snippets_dir(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}.d"))
}

// Datetimes keep their TOML spelling, non-finite floats become null
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Value::from(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(d) => Value::String(d.to_string()),
        toml::Value::Array(items) => {
            Value::Array(items.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

fn translate_value(value: &mut Value, config_dir: &str) {
    match value {
        Value::String(s) if s.contains(CONFIG_DIR_KEYWORD) => {
            *s = s.replace(CONFIG_DIR_KEYWORD, config_dir);
        }
        Value::Array(items) => {
            items
                .iter_mut()
                .for_each(|item| translate_value(item, config_dir));
        }
        Value::Object(map) => {
            map.values_mut()
                .for_each(|item| translate_value(item, config_dir));
        }
        _ => {}
    }
}
