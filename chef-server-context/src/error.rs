// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Chef Server Context Authors

use thiserror::Error;

/// Errors surfaced by `ChefServer`.
///
/// Every variant wraps the error of the layer that failed without changing
/// its message.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    ConfigLoad(#[from] crate::config::ConfigLoadError),
    #[error(transparent)]
    SecretLoad(#[from] crate::secrets::SecretLoadError),
    #[error(transparent)]
    Decryption(#[from] crate::secrets::DecryptionError),
    #[error(transparent)]
    Request(#[from] crate::rest::RequestError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoadError;
    use crate::rest::RequestError;
    use crate::secrets::{DecryptionError, SecretLoadError};

    #[test]
    fn test_messages_pass_through() {
        let err: Error = ConfigLoadError::MissingFile {
            file: "/tmp/knife.toml".to_string(),
        }
        .into();
        assert_eq!(
            format!("{err}"),
            "Missing configuration file /tmp/knife.toml"
        );

        let err: Error = SecretLoadError::Empty {
            path: "/tmp/secret".to_string(),
        }
        .into();
        assert_eq!(format!("{err}"), "secret file /tmp/secret is empty");

        let err: Error = DecryptionError::InvalidHmac.into();
        assert_eq!(format!("{err}"), "invalid HMAC, check the secret");

        let err: Error = RequestError::InvalidUrl {
            url: "nope".to_string(),
            reason: "relative URL without a base".to_string(),
        }
        .into();
        assert_eq!(
            format!("{err}"),
            "invalid request URL nope: relative URL without a base"
        );
    }

    #[test]
    fn test_source_is_preserved() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = SecretLoadError::Read {
            path: "/tmp/secret".to_string(),
            source: io,
        }
        .into();
        // Transparent variants forward source() to the wrapped error
        let source = err.source().expect("missing source");
        assert_eq!(format!("{source}"), "gone");
    }
}
