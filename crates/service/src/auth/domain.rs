use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::errors::AuthError;

/// Role that grants administrative capability.
pub const ROLE_ADMIN: &str = "auth.admin";

macro_rules! string_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn is_empty(&self) -> bool { self.0.is_empty() }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self { Self(value.to_string()) }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self { Self(value) }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
        }
    };
}

string_key!(
    /// Identifies a principal. The empty key is never stored.
    UserKey
);

string_key!(
    /// Names a role. The empty role is never stored.
    RoleKey
);

impl RoleKey {
    pub fn admin() -> Self { Self(ROLE_ADMIN.to_string()) }
}

/// Shared secret of a principal, compared by exact equality.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretKey(String);

impl From<&str> for SecretKey {
    fn from(value: &str) -> Self { Self(value.to_string()) }
}

impl From<String> for SecretKey {
    fn from(value: String) -> Self { Self(value) }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("SecretKey(***)") }
}

/// Secret and roles of one principal, as persisted in the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "Secret", alias = "secret")]
    pub secret: SecretKey,
    #[serde(rename = "Roles", alias = "roles", default, deserialize_with = "null_as_empty")]
    pub roles: Vec<RoleKey>,
}

impl UserRecord {
    pub fn new(secret: SecretKey, roles: Vec<RoleKey>) -> Self { Self { secret, roles } }

    pub fn has_role(&self, role: &RoleKey) -> bool { self.roles.iter().any(|r| r == role) }
}

// Older snapshots carry `"Roles": null` for a user whose roles were all removed.
fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<RoleKey>, D::Error> {
    Ok(Option::<Vec<RoleKey>>::deserialize(d)?.unwrap_or_default())
}

/// The authoritative `user -> record` map.
///
/// Reads are public; mutations are crate-private so every write goes through
/// the lock held by [`crate::auth::CredentialStore`]. Each mutation copies the
/// record, modifies the copy and writes it back whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialTable(HashMap<UserKey, UserRecord>);

impl CredentialTable {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn get(&self, user: &UserKey) -> Option<&UserRecord> { self.0.get(user) }

    pub fn contains(&self, user: &UserKey) -> bool { self.0.contains_key(user) }

    /// Whether any stored key violates the non-empty invariant.
    pub(crate) fn has_empty_key(&self) -> bool { self.0.keys().any(UserKey::is_empty) }

    fn record(&self, user: &UserKey) -> Result<&UserRecord, AuthError> {
        self.0.get(user).ok_or_else(|| AuthError::UserNotFound { user: user.clone() })
    }

    // NOTE: cleartext comparison, not constant time.
    pub(crate) fn authenticate(&self, user: &UserKey, secret: &SecretKey) -> Result<Vec<RoleKey>, AuthError> {
        let record = self.record(user)?;
        if record.secret != *secret {
            return Err(AuthError::LoginFailed { user: user.clone() });
        }
        Ok(record.roles.clone())
    }

    pub(crate) fn authorize(&self, user: &UserKey, role: &RoleKey) -> Result<(), AuthError> {
        if self.record(user)?.has_role(role) {
            Ok(())
        } else {
            Err(AuthError::RoleNotFound { user: user.clone(), role: role.clone() })
        }
    }

    pub(crate) fn authenticate_admin(&self, user: &UserKey, secret: &SecretKey) -> Result<(), AuthError> {
        let admin = RoleKey::admin();
        if self.authenticate(user, secret)?.contains(&admin) {
            Ok(())
        } else {
            Err(AuthError::RoleNotFound { user: user.clone(), role: admin })
        }
    }

    pub(crate) fn change_secret(&mut self, user: &UserKey, secret: SecretKey) -> Result<(), AuthError> {
        let mut record = self.record(user)?.clone();
        record.secret = secret;
        self.0.insert(user.clone(), record);
        Ok(())
    }

    pub(crate) fn add_user(&mut self, user: UserKey, secret: SecretKey, roles: Vec<RoleKey>) -> Result<(), AuthError> {
        if user.is_empty() || self.0.contains_key(&user) {
            return Err(AuthError::UserNotUnique { user });
        }
        self.0.insert(user, UserRecord::new(secret, roles));
        Ok(())
    }

    pub(crate) fn delete_user(&mut self, user: &UserKey) -> Result<(), AuthError> {
        if user.is_empty() || self.0.remove(user).is_none() {
            return Err(AuthError::UserNotFound { user: user.clone() });
        }
        Ok(())
    }

    pub(crate) fn add_role(&mut self, user: &UserKey, role: RoleKey) -> Result<(), AuthError> {
        let mut record = self.record(user)?.clone();
        if role.is_empty() {
            return Err(AuthError::RoleNotFound { user: user.clone(), role });
        }
        record.roles.push(role);
        self.0.insert(user.clone(), record);
        Ok(())
    }

    /// Removes every occurrence of `role`. Absent roles are not an error.
    pub(crate) fn delete_role(&mut self, user: &UserKey, role: &RoleKey) -> Result<(), AuthError> {
        let mut record = self.record(user)?.clone();
        if role.is_empty() {
            return Err(AuthError::RoleNotFound { user: user.clone(), role: role.clone() });
        }
        record.roles.retain(|r| r != role);
        self.0.insert(user.clone(), record);
        Ok(())
    }
}

impl FromIterator<(UserKey, UserRecord)> for CredentialTable {
    fn from_iter<I: IntoIterator<Item = (UserKey, UserRecord)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for CredentialTable {
    type Item = (UserKey, UserRecord);
    type IntoIter = std::collections::hash_map::IntoIter<UserKey, UserRecord>;

    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(names: &[&str]) -> Vec<RoleKey> { names.iter().copied().map(RoleKey::from).collect() }

    #[test]
    fn decodes_snapshot_with_null_roles() -> Result<(), anyhow::Error> {
        let raw = r#"{"alice":{"Secret":"s1","Roles":["auth.admin","ops"]},"bob":{"Secret":"s2","Roles":null}}"#;
        let table: CredentialTable = serde_json::from_str(raw)?;

        assert_eq!(table.len(), 2);
        let alice = table.get(&"alice".into()).ok_or_else(|| anyhow::anyhow!("alice missing"))?;
        assert_eq!(alice.secret, SecretKey::from("s1"));
        assert_eq!(alice.roles, roles(&["auth.admin", "ops"]));
        let bob = table.get(&"bob".into()).ok_or_else(|| anyhow::anyhow!("bob missing"))?;
        assert!(bob.roles.is_empty());
        Ok(())
    }

    #[test]
    fn encodes_with_capitalized_field_names() -> Result<(), anyhow::Error> {
        let table: CredentialTable =
            [("alice".into(), UserRecord::new("s1".into(), roles(&["auth.admin"])))].into_iter().collect();
        let value = serde_json::to_value(&table)?;
        assert_eq!(value, serde_json::json!({"alice": {"Secret": "s1", "Roles": ["auth.admin"]}}));
        Ok(())
    }

    #[test]
    fn add_role_keeps_duplicates_in_order() {
        let mut table = CredentialTable::new();
        table.add_user("carol".into(), "pw".into(), roles(&["a"])).unwrap();
        table.add_role(&"carol".into(), "b".into()).unwrap();
        table.add_role(&"carol".into(), "a".into()).unwrap();
        assert_eq!(table.get(&"carol".into()).unwrap().roles, roles(&["a", "b", "a"]));
    }

    #[test]
    fn delete_role_removes_every_occurrence() {
        let mut table = CredentialTable::new();
        table.add_user("carol".into(), "pw".into(), roles(&["a", "b", "a", "c"])).unwrap();
        table.delete_role(&"carol".into(), &"a".into()).unwrap();
        assert_eq!(table.get(&"carol".into()).unwrap().roles, roles(&["b", "c"]));
    }

    #[test]
    fn empty_role_is_rejected_after_user_lookup() {
        let mut table = CredentialTable::new();
        assert_eq!(
            table.add_role(&"ghost".into(), "".into()),
            Err(AuthError::UserNotFound { user: "ghost".into() })
        );
        table.add_user("carol".into(), "pw".into(), vec![]).unwrap();
        assert_eq!(
            table.add_role(&"carol".into(), "".into()),
            Err(AuthError::RoleNotFound { user: "carol".into(), role: "".into() })
        );
        assert!(table.get(&"carol".into()).unwrap().roles.is_empty());
    }

    #[test]
    fn change_secret_preserves_roles() {
        let mut table = CredentialTable::new();
        table.add_user("carol".into(), "old".into(), roles(&["ops"])).unwrap();
        table.change_secret(&"carol".into(), "new".into()).unwrap();
        assert_eq!(table.authenticate(&"carol".into(), &"new".into()), Ok(roles(&["ops"])));
        assert_eq!(
            table.authenticate(&"carol".into(), &"old".into()),
            Err(AuthError::LoginFailed { user: "carol".into() })
        );
    }

    #[test]
    fn secret_debug_is_redacted() {
        assert_eq!(format!("{:?}", SecretKey::from("hunter2")), "SecretKey(***)");
    }
}
