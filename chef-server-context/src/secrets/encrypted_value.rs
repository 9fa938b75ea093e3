// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Chef Server Context Authors

use crate::secrets::{DecryptionError, Secret};
use base64::{engine::general_purpose, Engine as _};
use openssl::{
    hash::MessageDigest, memcmp, pkey::PKey, sha::sha256, sign::Signer,
    symm::Cipher,
};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;

pub const CBC_CIPHER: &str = "aes-256-cbc";
pub const GCM_CIPHER: &str = "aes-256-gcm";

/// One encrypted field of a data bag item, as stored on the server.
///
/// Versions 1 and 2 use AES-256-CBC; version 2 adds an HMAC-SHA256 over the
/// base64 ciphertext. Version 3 uses AES-256-GCM. The AES key is always the
/// SHA-256 digest of the shared secret.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncryptedValue {
    pub encrypted_data: String,
    pub iv: String,
    pub version: u32,
    pub cipher: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hmac: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_tag: Option<String>,
}

impl EncryptedValue {
    pub fn decrypt(&self, secret: &Secret) -> Result<Value, DecryptionError> {
        let plaintext = match self.version {
            1 => {
                self.check_cipher(CBC_CIPHER)?;
                self.decrypt_cbc(secret)?
            }
            2 => {
                self.check_cipher(CBC_CIPHER)?;
                self.verify_hmac(secret)?;
                self.decrypt_cbc(secret)?
            }
            3 => {
                self.check_cipher(GCM_CIPHER)?;
                self.decrypt_gcm(secret)?
            }
            other => return Err(DecryptionError::UnsupportedVersion(other)),
        };
        unwrap_plaintext(&plaintext)
    }

    fn check_cipher(&self, expected: &str) -> Result<(), DecryptionError> {
        if self.cipher != expected {
            return Err(DecryptionError::UnsupportedCipher {
                version: self.version,
                cipher: self.cipher.clone(),
            });
        }
        Ok(())
    }

    fn verify_hmac(&self, secret: &Secret) -> Result<(), DecryptionError> {
        let expected = decode_base64(
            self.hmac.as_deref().ok_or(DecryptionError::MissingHmac)?,
        )?;
        let computed = compute_hmac(secret, self.encrypted_data.as_bytes())?;
        if computed.len() != expected.len()
            || !memcmp::eq(&computed, &expected)
        {
            return Err(DecryptionError::InvalidHmac);
        }
        Ok(())
    }

    fn decrypt_cbc(
        &self,
        secret: &Secret,
    ) -> Result<Vec<u8>, DecryptionError> {
        openssl::symm::decrypt(
            Cipher::aes_256_cbc(),
            &secret_key(secret),
            Some(&decode_base64(&self.iv)?),
            &decode_base64(&self.encrypted_data)?,
        )
        .map_err(DecryptionError::Decrypt)
    }

    fn decrypt_gcm(
        &self,
        secret: &Secret,
    ) -> Result<Vec<u8>, DecryptionError> {
        let tag = decode_base64(
            self.auth_tag
                .as_deref()
                .ok_or(DecryptionError::MissingAuthTag)?,
        )?;
        openssl::symm::decrypt_aead(
            Cipher::aes_256_gcm(),
            &secret_key(secret),
            Some(&decode_base64(&self.iv)?),
            &[],
            &decode_base64(&self.encrypted_data)?,
            &tag,
        )
        .map_err(DecryptionError::Decrypt)
    }
}

/// AES key derived from the shared secret
pub(crate) fn secret_key(secret: &Secret) -> [u8; 32] {
    sha256(secret.as_bytes())
}

/// HMAC-SHA256 keyed with the raw shared secret
pub(crate) fn compute_hmac(
    secret: &Secret,
    data: &[u8],
) -> Result<Vec<u8>, DecryptionError> {
    let pkey =
        PKey::hmac(secret.as_bytes()).map_err(DecryptionError::Hmac)?;
    let mut signer = Signer::new(MessageDigest::sha256(), &pkey)
        .map_err(DecryptionError::Hmac)?;
    signer.update(data).map_err(DecryptionError::Hmac)?;
    signer.sign_to_vec().map_err(DecryptionError::Hmac)
}

// Values written by chef-client wrap base64 at 60 columns
fn decode_base64(encoded: &str) -> Result<Vec<u8>, DecryptionError> {
    let compact: String =
        encoded.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(general_purpose::STANDARD.decode(compact)?)
}

fn unwrap_plaintext(plaintext: &[u8]) -> Result<Value, DecryptionError> {
    let mut wrapper: Value = serde_json::from_slice(plaintext)
        .map_err(DecryptionError::Plaintext)?;
    wrapper
        .get_mut("json_wrapper")
        .map(Value::take)
        .ok_or(DecryptionError::MissingJsonWrapper)
}
