// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Chef Server Context Authors

// The global store is process wide, so this file holds a single test.

use chef_server_context::{
    config::{initialize_global_store, is_initialized, NODE_NAME},
    global_store, ChefServer, ConfigSnapshot, Result,
};
use serde_json::json;

#[test]
fn test_switch_global_store() {
    let baseline: ConfigSnapshot =
        [("log_level", json!("warn"))].into_iter().collect();
    assert!(!is_initialized());
    assert!(initialize_global_store(baseline.clone()).is_ok());
    assert!(initialize_global_store(baseline.clone()).is_err());

    let dir = tempfile::tempdir().expect("failed to create tempdir");
    let path = dir.path().join("knife.toml");
    std::fs::write(
        &path,
        "chef_server_url = \"https://chef.example.com/organizations/org\"\n\
         node_name = \"delivery\"\n",
    )
    .expect("failed to write knife.toml");

    global_store().set(NODE_NAME, "workstation");
    let before = global_store().save();

    let mut server =
        ChefServer::from_config_file(&path).expect("failed to build server");
    assert_eq!(global_store().save(), before);

    let seen = server
        .with_server_config(|s| {
            let store = s.store();
            Ok::<_, chef_server_context::Error>((
                store.get_str(NODE_NAME),
                store.get_str("log_level"),
            ))
        })
        .expect("scoped execution failed");

    // The file is loaded on top of the baseline, not the caller's values
    assert_eq!(seen.0.as_deref(), Some("delivery"));
    assert_eq!(seen.1.as_deref(), Some("warn"));
    assert_eq!(global_store().save(), before);

    let r: Result<()> = server.with_server_config(|_| Ok(()));
    assert!(r.is_ok());
    assert_eq!(
        global_store().get_str(NODE_NAME).as_deref(),
        Some("workstation")
    );
}
