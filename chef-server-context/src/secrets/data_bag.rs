// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Chef Server Context Authors

use crate::{
    error::Error,
    rest::{Headers, Method, RestClient},
    secrets::{
        load_secret_file, DecryptionError, EncryptedValue, Secret,
        SecretLoadError, SecretStore,
    },
};
use log::*;
use serde_json::{Map, Value};
use std::path::Path;

/// Item field stored in clear text
pub const ID_FIELD: &str = "id";

/// Encrypted data bags stored on a Chef server
#[derive(Debug, Default, Clone, Copy)]
pub struct EncryptedDataBagStore;

impl SecretStore for EncryptedDataBagStore {
    fn load_secret(&self, path: &Path) -> Result<Secret, SecretLoadError> {
        load_secret_file(path)
    }

    fn load(
        &self,
        client: &dyn RestClient,
        bag: &str,
        item: &str,
        secret: &Secret,
    ) -> Result<Value, Error> {
        debug!("Fetching encrypted data bag item {bag}/{item}");
        let raw = client.request(
            Method::GET,
            &format!("data/{bag}/{item}"),
            &Headers::new(),
            None,
        )?;
        Ok(decrypt_item(&raw, secret)?)
    }
}

/// Decrypt every field of a raw data bag item except its `id`
pub fn decrypt_item(
    raw: &Value,
    secret: &Secret,
) -> Result<Value, DecryptionError> {
    let fields = raw.as_object().ok_or(DecryptionError::NotAnObject)?;
    fields
        .iter()
        .map(|(name, value)| {
            if name == ID_FIELD {
                return Ok((name.clone(), value.clone()));
            }
            let encrypted: EncryptedValue =
                serde_json::from_value(value.clone()).map_err(|source| {
                    DecryptionError::Format {
                        field: name.clone(),
                        source,
                    }
                })?;
            Ok((name.clone(), encrypted.decrypt(secret)?))
        })
        .collect::<Result<Map<_, _>, _>>()
        .map(Value::Object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{encrypt_value, write_client_key};
    use crate::rest::{HttpConnector, RestConnector};
    use serde_json::json;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn secret() -> Secret {
        Secret::from("0b3f8e5ad1c24f7e9a6d2c8b4e1f7a3d")
    }

    fn encrypted_item(version: u32) -> Value {
        json!({
            "id": "ent-org-proj",
            "github": encrypt_value(&json!("gh-token"), &secret(), version),
            "ssh": encrypt_value(
                &json!({"user": "builder", "port": 22}),
                &secret(),
                version
            ),
        })
    }

    #[test]
    fn test_decrypt_item() {
        for version in [1, 2, 3] {
            let decrypted = decrypt_item(&encrypted_item(version), &secret())
                .expect("failed to decrypt item");
            assert_eq!(
                decrypted,
                json!({
                    "id": "ent-org-proj",
                    "github": "gh-token",
                    "ssh": {"user": "builder", "port": 22},
                })
            );
        }
    }

    #[test]
    fn test_decrypt_item_errors() {
        assert!(matches!(
            decrypt_item(&json!(["not", "an", "object"]), &secret()),
            Err(DecryptionError::NotAnObject)
        ));

        let r = decrypt_item(
            &json!({"id": "x", "plain": "not encrypted"}),
            &secret(),
        );
        match r {
            Err(DecryptionError::Format { field, .. }) => {
                assert_eq!(field, "plain")
            }
            other => panic!("unexpected result: {other:?}"), //#[allow_ci]
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_load_from_server() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/organizations/chef_delivery/data/delivery-secrets/ent-org-proj",
            ))
            .and(header_exists("X-Ops-Authorization-1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(encrypted_item(2)),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let tmpdir = tempfile::tempdir().expect("failed to create tempdir");
        let key_path = write_client_key(tmpdir.path());
        let base_url =
            format!("{}/organizations/chef_delivery", mock_server.uri());

        let item = tokio::task::spawn_blocking(move || {
            let key = key_path.display().to_string();
            let client = HttpConnector::new()
                .connect(&base_url, "delivery", &key)
                .expect("failed to connect");
            EncryptedDataBagStore.load(
                client.as_ref(),
                "delivery-secrets",
                "ent-org-proj",
                &secret(),
            )
        })
        .await
        .expect("blocking task failed")
        .expect("failed to load item");

        assert_eq!(item["github"], json!("gh-token"));
        assert_eq!(item["id"], json!("ent-org-proj"));
    }
}
