pub mod cheffish;
pub mod config;
pub mod error;
pub mod rest;
pub mod secrets;
pub mod server;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{global_store, ConfigSnapshot, ConfigStore};
pub use error::{Error, Result};
pub use server::{ChefServer, ChefServerBuilder, ServerConfigGuard};
