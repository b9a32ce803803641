//! Auth module: credential domain, error taxonomy and the locked store.
//!
//! This module centralizes login, role queries and administrative mutations
//! under the service crate.

pub mod domain;
pub mod errors;
pub mod store;

pub use domain::{CredentialTable, RoleKey, SecretKey, UserKey, UserRecord, ROLE_ADMIN};
pub use errors::AuthError;
pub use store::{AdminScope, CredentialStore};
