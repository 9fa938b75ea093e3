// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Chef Server Context Authors

pub mod data_bag;
pub mod encrypted_value;

pub use data_bag::{decrypt_item, EncryptedDataBagStore};
pub use encrypted_value::EncryptedValue;

use crate::{error::Error, rest::RestClient};
use std::{fmt, fs, path::Path};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SecretLoadError {
    /// Error reading the secret file
    #[error("failed to read secret file {path}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// The secret file has no content besides whitespace
    #[error("secret file {path} is empty")]
    Empty { path: String },
}

#[derive(Error, Debug)]
pub enum DecryptionError {
    /// The item returned by the server is not a JSON object
    #[error("data bag item is not a JSON object")]
    NotAnObject,

    /// A field does not have the shape of an encrypted value
    #[error("field {field} is not an encrypted value")]
    Format {
        field: String,
        source: serde_json::Error,
    },

    /// Error decoding base64
    #[error("failed to decode base64")]
    Base64(#[from] base64::DecodeError),

    #[error("unsupported encrypted data bag version {0}")]
    UnsupportedVersion(u32),

    #[error("cipher {cipher} is not valid for encrypted data bag version {version}")]
    UnsupportedCipher { version: u32, cipher: String },

    /// Version 2 values must carry an HMAC
    #[error("encrypted value has no hmac")]
    MissingHmac,

    /// Version 3 values must carry an authentication tag
    #[error("encrypted value has no auth_tag")]
    MissingAuthTag,

    /// Error computing the HMAC
    #[error("failed to compute HMAC")]
    Hmac(#[source] openssl::error::ErrorStack),

    /// The HMAC does not match, the secret is wrong or the data was modified
    #[error("invalid HMAC, check the secret")]
    InvalidHmac,

    /// Error decrypting the value
    #[error("failed to decrypt encrypted value, check the secret")]
    Decrypt(#[source] openssl::error::ErrorStack),

    /// Decrypted data is not JSON
    #[error("decrypted data is not valid JSON")]
    Plaintext(#[source] serde_json::Error),

    #[error("decrypted data has no json_wrapper")]
    MissingJsonWrapper,
}

/// Shared secret protecting encrypted data bag items
#[derive(Clone, PartialEq, Eq)]
pub struct Secret {
    bytes: Vec<u8>,
}

impl Secret {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

impl From<&str> for Secret {
    fn from(v: &str) -> Self {
        Secret {
            bytes: v.as_bytes().to_vec(),
        }
    }
}

/// Read a secret file, ignoring surrounding whitespace
pub fn load_secret_file(path: &Path) -> Result<Secret, SecretLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|source| SecretLoadError::Read {
            path: path.display().to_string(),
            source,
        })?;
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        return Err(SecretLoadError::Empty {
            path: path.display().to_string(),
        });
    }
    Ok(Secret::from(trimmed))
}

/// Access to encrypted data bag items.
pub trait SecretStore {
    fn load_secret(&self, path: &Path) -> Result<Secret, SecretLoadError>;

    /// Fetch `bag`/`item` through `client` and decrypt it with `secret`
    fn load(
        &self,
        client: &dyn RestClient,
        bag: &str,
        item: &str,
        secret: &Secret,
    ) -> Result<serde_json::Value, Error>;
}
