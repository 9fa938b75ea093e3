// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Chef Server Context Authors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigLoadError {
    // Error reading a configuration file or snippet
    #[error("Failed to read configuration file {file}")]
    Read {
        file: String,
        source: std::io::Error,
    },

    // TOML syntax error
    #[error("Failed to parse configuration file {file}: {source}")]
    Parse {
        file: String,
        source: toml::de::Error,
    },

    // Glob error
    #[error("Glob pattern error")]
    GlobPattern(#[from] glob::PatternError),

    // The configuration file itself does not exist
    #[error("Missing configuration file {file}")]
    MissingFile { file: String },

    #[error("Required option {0} not set in server configuration")]
    RequiredOption(String),
}
