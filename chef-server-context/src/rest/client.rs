// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Chef Server Context Authors

use crate::rest::{
    Headers, Method, RequestError, RequestSigner, RestClient, RestConnector,
};
use chrono::Utc;
use log::*;
use reqwest::{
    blocking::Client,
    header::{ACCEPT, CONTENT_TYPE},
    Url,
};
use serde_json::Value;
use std::time::Duration;

/// Seconds to wait for a response, same as knife's `rest_timeout`
pub const DEFAULT_REST_TIMEOUT: u64 = 300;

/// Client version announced to the server
pub const CHEF_VERSION: &str = "12.0.0";

/// Creates blocking HTTPS clients for a Chef server.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    timeout: Duration,
    insecure: bool,
}

impl Default for HttpConnector {
    fn default() -> Self {
        HttpConnector {
            timeout: Duration::from_secs(DEFAULT_REST_TIMEOUT),
            insecure: false,
        }
    }
}

impl HttpConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Skip server certificate verification (INSECURE - for testing only)
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    fn http_client(&self) -> Result<Client, RequestError> {
        let mut builder = Client::builder().timeout(self.timeout);
        if self.insecure {
            warn!("Server certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }
        Ok(builder.build()?)
    }
}

impl RestConnector for HttpConnector {
    fn connect(
        &self,
        server_url: &str,
        client_name: &str,
        client_key: &str,
    ) -> Result<Box<dyn RestClient>, RequestError> {
        let signer = RequestSigner::from_client_key(client_name, client_key)?;
        Ok(Box::new(ChefRestClient::new(
            self.http_client()?,
            server_url,
            signer,
        )))
    }
}

/// Signed JSON requests against one Chef server URL.
#[derive(Debug)]
pub struct ChefRestClient {
    client: Client,
    base_url: String,
    signer: RequestSigner,
}

impl ChefRestClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        signer: RequestSigner,
    ) -> Self {
        ChefRestClient {
            client,
            base_url: base_url.into(),
            signer,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn create_url(&self, path: &str) -> Result<Url, RequestError> {
        let absolute =
            path.starts_with("http://") || path.starts_with("https://");
        let url = if absolute {
            path.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        };
        Url::parse(&url).map_err(|e| RequestError::InvalidUrl {
            url,
            reason: e.to_string(),
        })
    }
}

impl RestClient for ChefRestClient {
    fn request(
        &self,
        method: Method,
        path: &str,
        headers: &Headers,
        data: Option<&Value>,
    ) -> Result<Value, RequestError> {
        let url = self.create_url(path)?;
        let body = match data {
            Some(data) => serde_json::to_vec(data)?,
            None => Vec::new(),
        };
        let auth_headers =
            self.signer.sign(&method, url.path(), &body, Utc::now())?;

        let mut builder = self
            .client
            .request(method.clone(), url.clone())
            .header(ACCEPT, "application/json")
            .header("X-Chef-Version", CHEF_VERSION);
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        for (name, value) in auth_headers {
            builder = builder.header(name, value);
        }
        if data.is_some() {
            builder =
                builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        debug!("Sending {method} request to {url}");
        let response = builder.send()?;
        let status = response.status();
        let text = response.text()?;

        if !status.is_success() {
            return Err(RequestError::Status {
                method: method.to_string(),
                url: url.to_string(),
                code: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::write_client_key;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn connect(base_url: String, key_path: String) -> Box<dyn RestClient> {
        HttpConnector::new()
            .timeout(Duration::from_secs(5))
            .connect(&base_url, "delivery", &key_path)
            .expect("failed to connect")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_signed_get_request() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/organizations/chef_delivery/pushy/jobs"))
            .and(header("X-Ops-Userid", "delivery"))
            .and(header("X-Ops-Sign", "algorithm=sha1;version=1.0;"))
            .and(header("X-Chef-Version", CHEF_VERSION))
            .and(header("X-Custom", "yes"))
            .and(header_exists("X-Ops-Timestamp"))
            .and(header_exists("X-Ops-Content-Hash"))
            .and(header_exists("X-Ops-Authorization-1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"jobs": []})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let tmpdir = tempfile::tempdir().expect("failed to create tempdir");
        let key_path = write_client_key(tmpdir.path());
        let base_url =
            format!("{}/organizations/chef_delivery", mock_server.uri());

        let response = tokio::task::spawn_blocking(move || {
            let client =
                connect(base_url, key_path.display().to_string());
            let headers =
                Headers::from([("X-Custom".to_string(), "yes".to_string())]);
            client.request(Method::GET, "/pushy/jobs", &headers, None)
        })
        .await
        .expect("blocking task failed")
        .expect("request failed");

        assert_eq!(response, json!({"jobs": []}));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_post_with_json_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/organizations/chef_delivery/pushy/jobs"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(json!({"command": "chef-client"})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&mock_server)
            .await;

        let tmpdir = tempfile::tempdir().expect("failed to create tempdir");
        let key_path = write_client_key(tmpdir.path());
        let base_url =
            format!("{}/organizations/chef_delivery/", mock_server.uri());

        let response = tokio::task::spawn_blocking(move || {
            let client =
                connect(base_url, key_path.display().to_string());
            let data = json!({"command": "chef-client"});
            client.request(
                Method::POST,
                "pushy/jobs",
                &Headers::new(),
                Some(&data),
            )
        })
        .await
        .expect("blocking task failed")
        .expect("request failed");

        // An empty body is returned as null
        assert_eq!(response, Value::Null);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
            .mount(&mock_server)
            .await;

        let tmpdir = tempfile::tempdir().expect("failed to create tempdir");
        let key_path = write_client_key(tmpdir.path());
        let base_url = mock_server.uri();

        let result = tokio::task::spawn_blocking(move || {
            let client =
                connect(base_url, key_path.display().to_string());
            client.request(
                Method::GET,
                "/nodes/missing",
                &Headers::new(),
                None,
            )
        })
        .await
        .expect("blocking task failed");

        match result {
            Err(RequestError::Status { code, body, .. }) => {
                assert_eq!(code, 404);
                assert_eq!(body, "nope");
            }
            other => panic!("unexpected result: {other:?}"), //#[allow_ci]
        }
    }

    #[test]
    fn test_connect_missing_key() {
        let r = HttpConnector::new().connect(
            "https://chef.example.com",
            "delivery",
            "/nonexistent/delivery.pem",
        );
        assert!(matches!(r, Err(RequestError::KeyRead { .. })));
    }

    #[test]
    fn test_create_url() {
        let key = openssl::rsa::Rsa::generate(2048)
            .expect("failed to generate key");
        let client = ChefRestClient::new(
            Client::new(),
            "https://chef.example.com/organizations/chef_delivery/",
            RequestSigner::new("delivery", key),
        );

        assert_eq!(
            client.base_url(),
            "https://chef.example.com/organizations/chef_delivery/"
        );

        let joined = client.create_url("/nodes").expect("invalid url");
        assert_eq!(
            joined.as_str(),
            "https://chef.example.com/organizations/chef_delivery/nodes"
        );

        let absolute = client
            .create_url("https://other.example.com/roles")
            .expect("invalid url");
        assert_eq!(absolute.as_str(), "https://other.example.com/roles");

        let broken = ChefRestClient::new(
            Client::new(),
            "not a url",
            RequestSigner::new(
                "delivery",
                openssl::rsa::Rsa::generate(2048)
                    .expect("failed to generate key"),
            ),
        );
        assert!(matches!(
            broken.create_url("nodes"),
            Err(RequestError::InvalidUrl { .. })
        ));
    }
}
