#![cfg(test)]
use std::path::PathBuf;

use crate::auth::domain::{CredentialTable, RoleKey, UserRecord};

/// Unique snapshot path under the system temp dir.
pub fn temp_snapshot_path(prefix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{}_{}.json", prefix, uuid::Uuid::new_v4()))
}

/// `{"alice": {"Secret": "s1", "Roles": ["auth.admin"]}}`
pub fn alice_table() -> CredentialTable {
    [("alice".into(), UserRecord::new("s1".into(), vec![RoleKey::admin()]))].into_iter().collect()
}
