//! Remote entity stores.
//!
//! The reconciler only needs two operations from the remote side: read a
//! whole entity and replace a whole entity. [`EntityStore`] is that seam;
//! [`nexus::NexusStore`] talks to a real server and [`MemoryStore`] keeps
//! everything in memory for tests.
//!
//! # Testing
//!
//! ```
//! use memberkit::backend::{EntityStore, MemoryStore};
//! use memberkit::User;
//!
//! let store = MemoryStore::new();
//! store.insert(User::new("jdoe", ["nx-admin"].into_iter().collect()));
//!
//! let user = store.get("jdoe").unwrap().unwrap();
//! assert!(user.roles.contains("nx-admin"));
//! assert!(store.get("nobody").unwrap().is_none());
//! ```

pub mod nexus;

use crate::error::{Error, Result};
use crate::types::User;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Read/replace access to remote entities.
///
/// Writes replace the entire entity; the remote API has no partial
/// add/remove.
pub trait EntityStore: Send + Sync {
    /// Fetch an entity by key.
    ///
    /// Returns `Ok(None)` when the entity does not exist.
    fn get(&self, key: &str) -> Result<Option<User>>;

    /// Replace the entity stored under `key` with `user`.
    fn replace(&self, key: &str, user: &User) -> Result<()>;
}

impl<S: EntityStore + ?Sized> EntityStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<User>> {
        (**self).get(key)
    }

    fn replace(&self, key: &str, user: &User) -> Result<()> {
        (**self).replace(key, user)
    }
}

impl<S: EntityStore + ?Sized> EntityStore for &S {
    fn get(&self, key: &str) -> Result<Option<User>> {
        (**self).get(key)
    }

    fn replace(&self, key: &str, user: &User) -> Result<()> {
        (**self).replace(key, user)
    }
}

/// In-memory store for tests and dry runs.
///
/// Clones share the same underlying data, so a test can hand one clone to a
/// reconciler and inspect another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    users: Arc<Mutex<HashMap<String, User>>>,
    replace_calls: Arc<AtomicUsize>,
    fail_next: Arc<Mutex<Option<String>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given users.
    #[must_use]
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let store = Self::new();
        for user in users {
            store.insert(user);
        }
        store
    }

    /// Insert or overwrite a user, bypassing the replace counter.
    ///
    /// Used to simulate edits made by other actors.
    pub fn insert(&self, user: User) {
        lock(&self.users).insert(user.user_id.clone(), user);
    }

    /// Remove a user.
    pub fn remove(&self, key: &str) -> Option<User> {
        lock(&self.users).remove(key)
    }

    /// Current copy of a user.
    #[must_use]
    pub fn user(&self, key: &str) -> Option<User> {
        lock(&self.users).get(key).cloned()
    }

    /// Number of successful `replace` calls so far.
    #[must_use]
    pub fn replace_count(&self) -> usize {
        self.replace_calls.load(Ordering::SeqCst)
    }

    /// Make the next `get` or `replace` fail with `message`.
    pub fn fail_next(&self, message: impl Into<String>) {
        *lock(&self.fail_next) = Some(message.into());
    }

    fn take_failure(&self) -> Result<()> {
        match lock(&self.fail_next).take() {
            Some(message) => Err(Error::Other(message)),
            None => Ok(()),
        }
    }
}

impl EntityStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<User>> {
        self.take_failure()?;
        Ok(self.user(key))
    }

    fn replace(&self, key: &str, user: &User) -> Result<()> {
        self.take_failure()?;
        let mut users = lock(&self.users);
        if !users.contains_key(key) {
            return Err(Error::http(
                format!("memory://users/{key}"),
                404,
                "user not found",
            ));
        }
        users.insert(key.to_string(), user.clone());
        self.replace_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MemberSet;

    fn roles(members: &[&str]) -> MemberSet {
        members.iter().copied().collect()
    }

    #[test]
    fn test_memory_store_get_missing() {
        let store = MemoryStore::new();
        assert!(store.get("jdoe").unwrap().is_none());
    }

    #[test]
    fn test_memory_store_replace() {
        let store = MemoryStore::with_users([User::new("jdoe", roles(&["a"]))]);
        store
            .replace("jdoe", &User::new("jdoe", roles(&["b"])))
            .unwrap();
        assert_eq!(store.user("jdoe").unwrap().roles, roles(&["b"]));
        assert_eq!(store.replace_count(), 1);
    }

    #[test]
    fn test_memory_store_replace_missing_fails() {
        let store = MemoryStore::new();
        let err = store
            .replace("jdoe", &User::new("jdoe", roles(&["a"])))
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(store.replace_count(), 0);
    }

    #[test]
    fn test_memory_store_fail_next_once() {
        let store = MemoryStore::with_users([User::new("jdoe", roles(&[]))]);
        store.fail_next("connection reset");
        assert!(store.get("jdoe").is_err());
        assert!(store.get("jdoe").unwrap().is_some());
    }

    #[test]
    fn test_clones_share_data() {
        let store = MemoryStore::new();
        let other = store.clone();
        other.insert(User::new("jdoe", roles(&["a"])));
        assert!(store.user("jdoe").is_some());
    }

    #[test]
    fn test_arc_store() {
        let store: Arc<dyn EntityStore> =
            Arc::new(MemoryStore::with_users([User::new("jdoe", roles(&["a"]))]));
        assert!(store.get("jdoe").unwrap().is_some());
    }
}
