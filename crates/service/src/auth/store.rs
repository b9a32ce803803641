use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use parking_lot::{Mutex, MutexGuard};

use super::domain::{CredentialTable, RoleKey, SecretKey, UserKey};
use super::errors::AuthError;
use crate::errors::SnapshotError;
use crate::storage::SnapshotCodec;

/// Concurrent, authoritative credential table.
///
/// One lock guards the whole table. Every operation holds it for its full
/// read-modify-write, so no caller ever observes a half-applied mutation.
/// Construct once at startup and share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct CredentialStore {
    table: Mutex<CredentialTable>,
    snapshot_path: OnceLock<PathBuf>,
    // held across dump and write so snapshots land in dump order
    store_lock: tokio::sync::Mutex<()>,
}

impl CredentialStore {
    /// Empty store with no persistence path bound.
    pub fn new() -> Self { Self::default() }

    /// Store over an existing table, with no persistence path bound.
    pub fn with_table(table: CredentialTable) -> Self {
        Self { table: Mutex::new(table), ..Self::default() }
    }

    pub fn len(&self) -> usize { self.table.lock().len() }

    pub fn is_empty(&self) -> bool { self.table.lock().is_empty() }

    /// Path bound by the last successful [`Self::load_snapshot`].
    pub fn snapshot_path(&self) -> Option<&Path> { self.snapshot_path.get().map(PathBuf::as_path) }

    /// Check a secret; returns a copy of the user's roles.
    pub fn authenticate(&self, user: &UserKey, secret: &SecretKey) -> Result<Vec<RoleKey>, AuthError> {
        self.table.lock().authenticate(user, secret)
    }

    /// Role membership only; the secret is not checked.
    pub fn authorize(&self, user: &UserKey, role: &RoleKey) -> Result<(), AuthError> {
        self.table.lock().authorize(user, role)
    }

    pub fn authenticate_admin(&self, user: &UserKey, secret: &SecretKey) -> Result<(), AuthError> {
        self.table.lock().authenticate_admin(user, secret)
    }

    /// Authenticate an administrator and keep the table locked for the
    /// returned scope, so the privilege check and the mutations that follow
    /// see the same table.
    ///
    /// Calling other methods of this store while the scope is alive deadlocks.
    pub fn admin(&self, user: &UserKey, secret: &SecretKey) -> Result<AdminScope<'_>, AuthError> {
        let guard = self.table.lock();
        guard.authenticate_admin(user, secret)?;
        Ok(AdminScope { table: guard, admin: user.clone() })
    }

    pub fn change_secret(&self, user: &UserKey, secret: SecretKey) -> Result<(), AuthError> {
        self.table.lock().change_secret(user, secret)
    }

    pub fn add_user(&self, user: UserKey, secret: SecretKey, roles: Vec<RoleKey>) -> Result<(), AuthError> {
        self.table.lock().add_user(user, secret, roles)
    }

    pub fn delete_user(&self, user: &UserKey) -> Result<(), AuthError> {
        self.table.lock().delete_user(user)
    }

    pub fn add_role(&self, user: &UserKey, role: RoleKey) -> Result<(), AuthError> {
        self.table.lock().add_role(user, role)
    }

    pub fn delete_role(&self, user: &UserKey, role: &RoleKey) -> Result<(), AuthError> {
        self.table.lock().delete_role(user, role)
    }

    /// Independent copy of the whole table, taken under the lock.
    pub fn dump(&self) -> CredentialTable { self.table.lock().clone() }

    /// Replace the table with the snapshot at `path` and bind `path` for
    /// later stores.
    ///
    /// On failure the table is left empty and no path is bound. Only one
    /// load can succeed per store; later calls fail with `PathAlreadyBound`
    /// and leave the table untouched.
    pub async fn load_snapshot<C>(&self, codec: &C, path: impl AsRef<Path>) -> Result<usize, SnapshotError>
    where
        C: SnapshotCodec + ?Sized,
    {
        let path = path.as_ref();
        if let Some(bound) = self.snapshot_path.get() {
            return Err(SnapshotError::PathAlreadyBound { bound: bound.clone() });
        }

        match codec.load(path).await {
            Ok(loaded) => {
                let mut table = self.table.lock();
                if self.snapshot_path.set(path.to_path_buf()).is_err() {
                    let bound = self.snapshot_path.get().cloned().unwrap_or_default();
                    return Err(SnapshotError::PathAlreadyBound { bound });
                }
                *table = loaded;
                Ok(table.len())
            }
            Err(e) => {
                let mut table = self.table.lock();
                if self.snapshot_path.get().is_none() {
                    *table = CredentialTable::default();
                }
                Err(e)
            }
        }
    }

    /// Write a consistent copy of the table to the bound snapshot path.
    ///
    /// Concurrent calls are serialized; the last one to start writes last.
    pub async fn store_snapshot<C>(&self, codec: &C) -> Result<(), SnapshotError>
    where
        C: SnapshotCodec + ?Sized,
    {
        let path = self.snapshot_path.get().ok_or(SnapshotError::NoPersistencePath)?;
        let _serial = self.store_lock.lock().await;
        let table = self.dump();
        codec.store(&table, path).await
    }
}

/// Table access granted by a successful admin login.
///
/// Holds the table lock until dropped.
pub struct AdminScope<'a> {
    table: MutexGuard<'a, CredentialTable>,
    admin: UserKey,
}

impl AdminScope<'_> {
    /// The administrator this scope was opened for.
    pub fn admin(&self) -> &UserKey { &self.admin }

    pub fn change_secret(&mut self, user: &UserKey, secret: SecretKey) -> Result<(), AuthError> {
        self.table.change_secret(user, secret)
    }

    pub fn add_user(&mut self, user: UserKey, secret: SecretKey, roles: Vec<RoleKey>) -> Result<(), AuthError> {
        self.table.add_user(user, secret, roles)
    }

    pub fn delete_user(&mut self, user: &UserKey) -> Result<(), AuthError> {
        self.table.delete_user(user)
    }

    pub fn add_role(&mut self, user: &UserKey, role: RoleKey) -> Result<(), AuthError> {
        self.table.add_role(user, role)
    }

    pub fn delete_role(&mut self, user: &UserKey, role: &RoleKey) -> Result<(), AuthError> {
        self.table.delete_role(user, role)
    }

    pub fn dump(&self) -> CredentialTable { self.table.clone() }
}
