// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Chef Server Context Authors

//! Testing utilities
//!
//! Fixture writers for server configuration directories and recording fakes
//! standing in for the Chef server and the secret store.
//!
//! The helpers panic on failure, they are only meant to be called from
//! tests.

use crate::{
    error::Error,
    rest::{Headers, Method, RequestError, RestClient, RestConnector},
    secrets::{
        encrypted_value::{compute_hmac, secret_key, CBC_CIPHER, GCM_CIPHER},
        EncryptedValue, Secret, SecretLoadError, SecretStore,
    },
};
use base64::{engine::general_purpose, Engine as _};
use openssl::{
    rand::rand_bytes,
    rsa::Rsa,
    symm::{encrypt, encrypt_aead, Cipher},
};
use serde_json::{json, Value};
use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

pub const TEST_SERVER_URL: &str =
    "https://172.31.6.129/organizations/chef_delivery";
pub const TEST_NODE_NAME: &str = "delivery";

/// Write a `knife.toml` in the given directory
///
/// # Arguments
///
/// * `dir`: Directory to write the file in, also used as `{config_dir}`
/// * `overrides`: Option names to string values replacing or extending the
///   defaults
///
/// # Returns
///
/// The path of the written file. The file points `client_key` and
/// `encrypted_data_bag_secret` at files in `dir` which are not created.
pub fn write_server_config(
    dir: &Path,
    overrides: Option<HashMap<String, String>>,
) -> PathBuf {
    let mut options: BTreeMap<String, String> = [
        ("chef_server_url", TEST_SERVER_URL),
        ("node_name", TEST_NODE_NAME),
        ("client_key", "{config_dir}/delivery.pem"),
        (
            "encrypted_data_bag_secret",
            "{config_dir}/encrypted_data_bag_secret",
        ),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    options.extend(overrides.unwrap_or_default());

    // A JSON string literal is a valid TOML basic string, quoting the key
    // keeps dotted names as a single option
    let contents: String = options
        .iter()
        .map(|(key, value)| {
            format!(
                "{} = {}\n",
                Value::from(key.as_str()),
                Value::from(value.as_str())
            )
        })
        .collect();

    let path = dir.join("knife.toml");
    std::fs::write(&path, contents).expect("failed to write knife.toml");
    path
}

/// Generate an RSA key and write it as `delivery.pem` in the given directory
pub fn write_client_key(dir: &Path) -> PathBuf {
    let key = Rsa::generate(2048).expect("failed to generate RSA key");
    let pem = key
        .private_key_to_pem()
        .expect("failed to encode RSA key as PEM");
    let path = dir.join("delivery.pem");
    std::fs::write(&path, pem).expect("failed to write client key");
    path
}

/// Write `encrypted_data_bag_secret` in the given directory
pub fn write_secret(dir: &Path, secret: &str) -> PathBuf {
    let path = dir.join("encrypted_data_bag_secret");
    std::fs::write(&path, secret).expect("failed to write secret");
    path
}

/// Encrypt a value the way Chef clients store data bag item fields
pub fn encrypt_value(
    value: &Value,
    secret: &Secret,
    version: u32,
) -> EncryptedValue {
    let plaintext = serde_json::to_vec(&json!({ "json_wrapper": value }))
        .expect("failed to serialize value");
    let key = secret_key(secret);
    let b64 = |data: &[u8]| general_purpose::STANDARD.encode(data);

    match version {
        1 | 2 => {
            let mut iv = [0u8; 16];
            rand_bytes(&mut iv).expect("failed to generate IV");
            let ciphertext =
                encrypt(Cipher::aes_256_cbc(), &key, Some(&iv), &plaintext)
                    .expect("failed to encrypt");
            let encrypted_data = b64(&ciphertext);
            let hmac = (version == 2).then(|| {
                b64(&compute_hmac(secret, encrypted_data.as_bytes())
                    .expect("failed to compute HMAC"))
            });
            EncryptedValue {
                encrypted_data,
                iv: b64(&iv),
                version,
                cipher: CBC_CIPHER.to_string(),
                hmac,
                auth_tag: None,
            }
        }
        3 => {
            let mut iv = [0u8; 12];
            rand_bytes(&mut iv).expect("failed to generate IV");
            let mut tag = [0u8; 16];
            let ciphertext = encrypt_aead(
                Cipher::aes_256_gcm(),
                &key,
                Some(&iv),
                &[],
                &plaintext,
                &mut tag,
            )
            .expect("failed to encrypt");
            EncryptedValue {
                encrypted_data: b64(&ciphertext),
                iv: b64(&iv),
                version,
                cipher: GCM_CIPHER.to_string(),
                hmac: None,
                auth_tag: Some(b64(&tag)),
            }
        }
        other => panic!("no encryption for version {other}"), //#[allow_ci]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectCall {
    pub server_url: String,
    pub client_name: String,
    pub client_key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestCall {
    pub method: Method,
    pub path: String,
    pub headers: Headers,
    pub data: Option<Value>,
}

/// Connector whose clients answer every request with the same response
/// and record what they were asked
#[derive(Debug, Clone)]
pub struct RecordingConnector {
    response: Value,
    connects: Arc<Mutex<Vec<ConnectCall>>>,
    requests: Arc<Mutex<Vec<RequestCall>>>,
}

impl RecordingConnector {
    pub fn new(response: Value) -> Self {
        RecordingConnector {
            response,
            connects: Arc::default(),
            requests: Arc::default(),
        }
    }

    pub fn connects(&self) -> Vec<ConnectCall> {
        self.connects.lock().expect("poisoned").clone()
    }

    pub fn requests(&self) -> Vec<RequestCall> {
        self.requests.lock().expect("poisoned").clone()
    }
}

impl RestConnector for RecordingConnector {
    fn connect(
        &self,
        server_url: &str,
        client_name: &str,
        client_key: &str,
    ) -> Result<Box<dyn RestClient>, RequestError> {
        self.connects.lock().expect("poisoned").push(ConnectCall {
            server_url: server_url.to_string(),
            client_name: client_name.to_string(),
            client_key: client_key.to_string(),
        });
        Ok(Box::new(RecordingClient {
            response: self.response.clone(),
            requests: Arc::clone(&self.requests),
        }))
    }
}

struct RecordingClient {
    response: Value,
    requests: Arc<Mutex<Vec<RequestCall>>>,
}

impl RestClient for RecordingClient {
    fn request(
        &self,
        method: Method,
        path: &str,
        headers: &Headers,
        data: Option<&Value>,
    ) -> Result<Value, RequestError> {
        self.requests.lock().expect("poisoned").push(RequestCall {
            method,
            path: path.to_string(),
            headers: headers.clone(),
            data: data.cloned(),
        });
        Ok(self.response.clone())
    }
}

/// Secret store returning a fixed item without touching the filesystem or
/// the server
///
/// The secret "loaded" from a path is the path itself, so tests can tell
/// which path reached `load()`.
#[derive(Debug, Clone)]
pub struct RecordingSecretStore {
    item: Value,
    secret_paths: Arc<Mutex<Vec<PathBuf>>>,
    loads: Arc<Mutex<Vec<(String, String, Secret)>>>,
}

impl RecordingSecretStore {
    pub fn new(item: Value) -> Self {
        RecordingSecretStore {
            item,
            secret_paths: Arc::default(),
            loads: Arc::default(),
        }
    }

    pub fn secret_for(path: &Path) -> Secret {
        Secret::from(path.display().to_string().as_str())
    }

    pub fn secret_paths(&self) -> Vec<PathBuf> {
        self.secret_paths.lock().expect("poisoned").clone()
    }

    /// `(bag, item, secret)` of every `load()` call
    pub fn loads(&self) -> Vec<(String, String, Secret)> {
        self.loads.lock().expect("poisoned").clone()
    }
}

impl SecretStore for RecordingSecretStore {
    fn load_secret(&self, path: &Path) -> Result<Secret, SecretLoadError> {
        self.secret_paths
            .lock()
            .expect("poisoned")
            .push(path.to_path_buf());
        Ok(Self::secret_for(path))
    }

    fn load(
        &self,
        _client: &dyn RestClient,
        bag: &str,
        item: &str,
        secret: &Secret,
    ) -> Result<Value, Error> {
        self.loads.lock().expect("poisoned").push((
            bag.to_string(),
            item.to_string(),
            secret.clone(),
        ));
        Ok(self.item.clone())
    }
}
