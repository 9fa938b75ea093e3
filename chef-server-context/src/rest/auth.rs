// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Chef Server Context Authors

//! Chef request signing, protocol version 1.0
//!
//! The canonical request is a five line string naming the method, the
//! hashed path, the hashed body, the timestamp and the client name. It is
//! encrypted with the client private key (RSA, PKCS#1 v1.5 padding) and the
//! base64 result is spread over `X-Ops-Authorization-N` headers of 60
//! characters each.

use crate::rest::{Method, RequestError};
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use openssl::{
    pkey::Private,
    rsa::{Padding, Rsa},
    sha::sha1,
};
use std::{fmt, fs, path::Path};

pub const SIGNING_PROTOCOL_VERSION: &str = "1.0";
pub const AUTHORIZATION_LINE_LEN: usize = 60;

// PKCS#1 v1.5 padding overhead
const PKCS1_PADDING_LEN: usize = 11;

pub struct RequestSigner {
    client_name: String,
    key: Rsa<Private>,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("client_name", &self.client_name)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    pub fn new(client_name: impl Into<String>, key: Rsa<Private>) -> Self {
        RequestSigner {
            client_name: client_name.into(),
            key,
        }
    }

    /// Load the signing key from `client_key`, which holds either a PEM
    /// encoded private key or the path to one
    pub fn from_client_key(
        client_name: impl Into<String>,
        client_key: &str,
    ) -> Result<Self, RequestError> {
        let pem = if client_key.trim_start().starts_with("-----BEGIN") {
            client_key.as_bytes().to_vec()
        } else {
            fs::read(Path::new(client_key)).map_err(|source| {
                RequestError::KeyRead {
                    path: client_key.to_string(),
                    source,
                }
            })?
        };
        let key = Rsa::private_key_from_pem(&pem)
            .map_err(RequestError::InvalidKey)?;
        Ok(Self::new(client_name, key))
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// Produce the authentication headers for one request
    pub fn sign(
        &self,
        method: &Method,
        path: &str,
        body: &[u8],
        timestamp: DateTime<Utc>,
    ) -> Result<Vec<(String, String)>, RequestError> {
        let timestamp = canonical_time(timestamp);
        let content_hash = hash_base64(body);
        let canonical = canonical_request(
            method,
            &hash_base64(canonical_path(path).as_bytes()),
            &content_hash,
            &timestamp,
            &self.client_name,
        );

        let signature = self.private_encrypt(canonical.as_bytes())?;
        let encoded = general_purpose::STANDARD.encode(signature);

        let mut headers = vec![
            (
                "X-Ops-Sign".to_string(),
                format!("algorithm=sha1;version={SIGNING_PROTOCOL_VERSION};"),
            ),
            ("X-Ops-Userid".to_string(), self.client_name.clone()),
            ("X-Ops-Timestamp".to_string(), timestamp),
            ("X-Ops-Content-Hash".to_string(), content_hash),
        ];
        headers.extend(
            encoded
                .as_bytes()
                .chunks(AUTHORIZATION_LINE_LEN)
                .enumerate()
                .map(|(i, line)| {
                    (
                        format!("X-Ops-Authorization-{}", i + 1),
                        line.iter().map(|b| *b as char).collect(),
                    )
                }),
        );
        Ok(headers)
    }

    fn private_encrypt(&self, data: &[u8]) -> Result<Vec<u8>, RequestError> {
        let size = self.key.size() as usize;
        let max = size.saturating_sub(PKCS1_PADDING_LEN);
        if data.len() > max {
            return Err(RequestError::CanonicalRequestTooLong {
                length: data.len(),
                max,
            });
        }

        let mut signature = vec![0; size];
        let len = self
            .key
            .private_encrypt(data, &mut signature, Padding::PKCS1)
            .map_err(RequestError::Sign)?;
        signature.truncate(len);
        Ok(signature)
    }
}

/// Base64 encoded SHA-1 digest
pub fn hash_base64(data: &[u8]) -> String {
    general_purpose::STANDARD.encode(sha1(data))
}

/// Collapse repeated slashes and drop a trailing one
pub fn canonical_path(path: &str) -> String {
    let mut canonical = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && canonical.ends_with('/') {
            continue;
        }
        canonical.push(c);
    }
    if canonical.len() > 1 && canonical.ends_with('/') {
        let _ = canonical.pop();
    }
    canonical
}

pub fn canonical_time(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub fn canonical_request(
    method: &Method,
    hashed_path: &str,
    content_hash: &str,
    timestamp: &str,
    user_id: &str,
) -> String {
    format!(
        "Method:{}\nHashed Path:{hashed_path}\nX-Ops-Content-Hash:{content_hash}\nX-Ops-Timestamp:{timestamp}\nX-Ops-UserId:{user_id}",
        method.as_str()
    )
}
