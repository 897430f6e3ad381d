//! Resource kinds managed by rolesync
//!
//! Each declared `[[user_roles]]` entry becomes a [`UserRole`] resource.
//! Records left in the state file for entries that were removed from the
//! config are turned back into resources by [`Factory`] so they can be
//! deleted.

pub mod user_role;

use anyhow::{Result, bail};
use declarative::{BoxedResource, Record, ResourceFactory};

use crate::config::RolesyncConfig;
pub use user_role::{StoreHandle, UserRole, UserRoleAttributes};

/// Resource type of [`UserRole`]
pub const USER_ROLE: &str = "user_role";

/// Build the declared resources from the config
pub fn declared(config: &RolesyncConfig, store: &StoreHandle) -> Vec<BoxedResource> {
    config
        .user_roles
        .iter()
        .map(|entry| {
            let attrs = UserRoleAttributes {
                userid: entry.userid.clone(),
                roles: entry.roles.clone(),
                ownership: entry.ownership,
            };
            Box::new(UserRole::new(attrs, store.clone())) as BoxedResource
        })
        .collect()
}

/// Rebuilds resources from state records
pub struct Factory {
    store: StoreHandle,
}

impl Factory {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }
}

impl ResourceFactory for Factory {
    fn restore(&self, record: &Record) -> Result<BoxedResource> {
        match record.resource_type.as_str() {
            USER_ROLE => {
                let attrs: UserRoleAttributes = record.decode()?;
                Ok(Box::new(UserRole::new(attrs, self.store.clone())))
            }
            other => bail!(
                "State record {} has unknown resource type '{other}'",
                record.key()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{ExecuteOptions, ExecutionPlan, StateFile, execute_simple};
    use memberkit::{MemberSet, MemoryStore, User};
    use serde_json::json;
    use std::sync::Arc;

    fn set(items: &[&str]) -> MemberSet {
        items.iter().copied().collect()
    }

    fn config(entries: &str) -> RolesyncConfig {
        RolesyncConfig::parse(&format!(
            "[server]\nurl = \"http://localhost:8081\"\n{entries}"
        ))
        .unwrap()
    }

    fn converge(config: &RolesyncConfig, store: &MemoryStore, state: &mut StateFile) {
        let handle: StoreHandle = Arc::new(store.clone());
        let plan = ExecutionPlan::build(
            declared(config, &handle),
            state,
            &Factory::new(handle.clone()),
            None,
        )
        .unwrap();
        let summary = execute_simple(plan, state, &ExecuteOptions::default()).unwrap();
        assert!(summary.is_success());
    }

    #[test]
    fn test_restore_unknown_type() {
        let factory = Factory::new(Arc::new(MemoryStore::new()));
        let record = Record::applied("bucket", "x", json!({}));
        assert!(factory.restore(&record).is_err());
    }

    #[test]
    fn test_full_lifecycle_preserves_foreign_roles() {
        let store = MemoryStore::with_users([User::new("jdoe", set(&["nx-admin"]))]);
        let mut state = StateFile::default();

        // create
        let v1 = config("[[user_roles]]\nuserid = \"jdoe\"\nroles = [\"nx-dev\"]\n");
        converge(&v1, &store, &mut state);
        assert_eq!(store.user("jdoe").unwrap().roles, set(&["nx-admin", "nx-dev"]));
        assert!(state.get(USER_ROLE, "jdoe").unwrap().applied);

        // someone else grants a role between runs
        let mut user = store.user("jdoe").unwrap();
        user.roles.insert("nx-support");
        store.insert(user);

        // update
        let v2 = config("[[user_roles]]\nuserid = \"jdoe\"\nroles = [\"nx-deploy\"]\n");
        converge(&v2, &store, &mut state);
        assert_eq!(
            store.user("jdoe").unwrap().roles,
            set(&["nx-admin", "nx-deploy", "nx-support"])
        );

        // in sync: no writes
        let writes = store.replace_count();
        converge(&v2, &store, &mut state);
        assert_eq!(store.replace_count(), writes);

        // removed from config: delete through the factory
        converge(&config(""), &store, &mut state);
        assert_eq!(
            store.user("jdoe").unwrap().roles,
            set(&["nx-admin", "nx-support"])
        );
        assert!(state.is_empty());
    }

    #[test]
    fn test_drift_is_repaired() {
        let store = MemoryStore::with_users([User::new("jdoe", set(&["nx-admin"]))]);
        let mut state = StateFile::default();
        let cfg = config("[[user_roles]]\nuserid = \"jdoe\"\nroles = [\"nx-dev\"]\n");
        converge(&cfg, &store, &mut state);

        // someone removes our role by hand
        store.insert(User::new("jdoe", set(&["nx-admin"])));
        converge(&cfg, &store, &mut state);
        assert_eq!(store.user("jdoe").unwrap().roles, set(&["nx-admin", "nx-dev"]));
    }

    #[test]
    fn test_deleted_user_drops_record() {
        let store = MemoryStore::with_users([User::new("jdoe", set(&[]))]);
        let mut state = StateFile::default();
        let cfg = config("[[user_roles]]\nuserid = \"jdoe\"\nroles = [\"nx-dev\"]\n");
        converge(&cfg, &store, &mut state);

        store.remove("jdoe");
        converge(&cfg, &store, &mut state);
        assert!(state.get(USER_ROLE, "jdoe").is_none());
    }

    #[test]
    fn test_failed_write_is_retried() {
        let store = MemoryStore::with_users([User::new("jdoe", set(&["nx-admin"]))]);
        let mut state = StateFile::default();
        let v1 = config("[[user_roles]]\nuserid = \"jdoe\"\nroles = [\"nx-dev\"]\n");
        converge(&v1, &store, &mut state);

        let v2 = config("[[user_roles]]\nuserid = \"jdoe\"\nroles = [\"nx-deploy\"]\n");
        let handle: StoreHandle = Arc::new(store.clone());
        let plan = ExecutionPlan::build(
            declared(&v2, &handle),
            &state,
            &Factory::new(handle.clone()),
            None,
        )
        .unwrap();
        store.fail_next("503 Service Unavailable");
        let summary = execute_simple(plan, &mut state, &ExecuteOptions::default()).unwrap();
        assert_eq!(summary.failed, 1);

        let record = state.get(USER_ROLE, "jdoe").unwrap();
        assert!(!record.applied);
        assert_eq!(record.attributes["roles"], json!(["nx-dev"]));

        converge(&v2, &store, &mut state);
        assert_eq!(store.user("jdoe").unwrap().roles, set(&["nx-admin", "nx-deploy"]));
        assert!(state.get(USER_ROLE, "jdoe").unwrap().applied);
    }

    #[test]
    fn test_unreadable_user_does_not_block_others() {
        let store = MemoryStore::with_users([
            User::new("alice", set(&["nx-admin"])),
            User::new("bob", set(&["nx-admin"])),
        ]);
        let mut state = StateFile::default();
        let alice = "[[user_roles]]\nuserid = \"alice\"\nroles = [\"nx-dev\"]\n";
        let bob = "[[user_roles]]\nuserid = \"bob\"\nroles = [\"nx-dev\"]\n";
        converge(&config(alice), &store, &mut state);

        let both = config(&format!("{alice}{bob}"));
        let handle: StoreHandle = Arc::new(store.clone());
        store.fail_next("HTTP 403 for alice");
        let plan = ExecutionPlan::build(
            declared(&both, &handle),
            &state,
            &Factory::new(handle.clone()),
            None,
        )
        .unwrap();
        let summary = execute_simple(plan, &mut state, &ExecuteOptions::default()).unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.created, 1);

        assert_eq!(store.user("bob").unwrap().roles, set(&["nx-admin", "nx-dev"]));
        let record = state.get(USER_ROLE, "alice").unwrap();
        assert!(!record.applied);
        assert!(record.last_error.as_deref().unwrap().contains("HTTP 403 for alice"));

        converge(&both, &store, &mut state);
        assert!(state.get(USER_ROLE, "alice").unwrap().applied);
    }
}
