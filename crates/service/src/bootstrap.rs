//! Initial snapshot for a fresh deployment: a single administrator record.

use std::path::Path;

use crate::auth::{AuthError, CredentialTable, RoleKey, SecretKey, UserKey};
use crate::errors::SnapshotError;
use crate::storage::SnapshotCodec;

/// Split a whitespace separated role list, dropping empty entries.
pub fn parse_roles(roles: &str) -> Vec<RoleKey> {
    roles.split_whitespace().map(RoleKey::from).collect()
}

/// Table holding only `name`. An empty name is rejected with `UserNotUnique`.
pub fn initial_table(name: UserKey, secret: SecretKey, roles: Vec<RoleKey>) -> Result<CredentialTable, AuthError> {
    let mut table = CredentialTable::new();
    table.add_user(name, secret, roles)?;
    Ok(table)
}

/// Write `table` to `path`, creating the parent directory when needed.
pub async fn write_snapshot<C>(codec: &C, table: &CredentialTable, path: &Path) -> Result<(), SnapshotError>
where
    C: SnapshotCodec + ?Sized,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|e| SnapshotError::io(parent, e))?;
    }
    codec.store(table, path).await
}
