//! Service layer holding the credential store and its persistence.
//! - `auth`: typed keys, the credential table and the locked store.
//! - `storage`: snapshot codecs that move the table to and from disk.
//! - `bootstrap`: initial snapshot for a fresh deployment.

pub mod auth;
pub mod bootstrap;
pub mod errors;
pub mod storage;
#[cfg(test)]
pub mod test_support;

pub use auth::{AdminScope, AuthError, CredentialStore};
pub use errors::SnapshotError;
