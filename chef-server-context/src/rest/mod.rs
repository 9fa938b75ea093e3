// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Chef Server Context Authors

//! Authenticated requests against a Chef server
//!
//! [`RestConnector`] builds a [`RestClient`] from the three values a Chef
//! client identity consists of: server URL, client name and private key.
//! [`HttpConnector`] is the real implementation; tests substitute their own.

pub mod auth;
pub mod client;

pub use auth::RequestSigner;
pub use client::{ChefRestClient, HttpConnector};
pub use reqwest::Method;

use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Extra request headers, by name
pub type Headers = BTreeMap<String, String>;

#[derive(Error, Debug)]
pub enum RequestError {
    /// Transport errors from reqwest
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    /// The request URL could not be built
    #[error("invalid request URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The server answered with a non-success status
    #[error("{method} {url} failed with HTTP status {code}")]
    Status {
        method: String,
        url: String,
        code: u16,
        body: String,
    },

    /// Error reading the client private key
    #[error("failed to read client key {path}")]
    KeyRead {
        path: String,
        source: std::io::Error,
    },

    /// Error parsing the client private key
    #[error("failed to parse client key")]
    InvalidKey(#[source] openssl::error::ErrorStack),

    /// The canonical request does not fit in one RSA block
    #[error("canonical request of {length} bytes exceeds the {max} bytes the client key can sign")]
    CanonicalRequestTooLong { length: usize, max: usize },

    /// Error signing the request
    #[error("failed to sign request")]
    Sign(#[source] openssl::error::ErrorStack),

    /// Error (de)serializing request or response bodies
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A client authenticated as one Chef identity.
pub trait RestClient {
    /// Issue a request and return the parsed JSON response.
    ///
    /// `path` is relative to the server URL the client was created for,
    /// unless it is an absolute URL. `data` is sent as a JSON body.
    fn request(
        &self,
        method: Method,
        path: &str,
        headers: &Headers,
        data: Option<&Value>,
    ) -> Result<Value, RequestError>;
}

/// Factory for [`RestClient`]s.
pub trait RestConnector {
    /// `client_key` is either the path of a PEM file or the PEM itself.
    fn connect(
        &self,
        server_url: &str,
        client_name: &str,
        client_key: &str,
    ) -> Result<Box<dyn RestClient>, RequestError>;
}
