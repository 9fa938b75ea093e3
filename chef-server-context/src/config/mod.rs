mod error;
mod file_config;
mod singleton;
mod snapshot;
mod store;

pub use error::*;
pub use file_config::*;
pub use singleton::*;
pub use snapshot::*;
pub use store::*;

// Options read from the server configuration
pub const CHEF_SERVER_URL: &str = "chef_server_url";
pub const NODE_NAME: &str = "node_name";
pub const CLIENT_KEY: &str = "client_key";
pub const ENCRYPTED_DATA_BAG_SECRET: &str = "encrypted_data_bag_secret";
