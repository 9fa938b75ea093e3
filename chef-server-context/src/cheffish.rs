// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Chef Server Context Authors

use crate::config::{ConfigSnapshot, CHEF_SERVER_URL, CLIENT_KEY, NODE_NAME};
use serde_derive::{Deserialize, Serialize};

/// Connection details in the shape Cheffish resources expect:
///
/// ```json
/// {
///   "chef_server_url": "https://chef.example.com/organizations/org",
///   "options": {
///     "client_name": "delivery",
///     "signing_key_filename": "/path/to/delivery.pem"
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheffishDetails {
    pub chef_server_url: Option<String>,
    pub options: CheffishOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheffishOptions {
    pub client_name: Option<String>,
    pub signing_key_filename: Option<String>,
}

impl From<&ConfigSnapshot> for CheffishDetails {
    fn from(config: &ConfigSnapshot) -> Self {
        let get = |key: &str| config.get_str(key).map(str::to_string);
        CheffishDetails {
            chef_server_url: get(CHEF_SERVER_URL),
            options: CheffishOptions {
                client_name: get(NODE_NAME),
                signing_key_filename: get(CLIENT_KEY),
            },
        }
    }
}
