//! Read-modify-write reconciliation against an [`EntityStore`].
//!
//! Every mutating call reads the entity right before computing its full
//! replacement, so members added by other actors since the last run survive.
//! The window between that read and the write is not protected; the remote
//! API offers no compare-and-swap.

use crate::backend::EntityStore;
use crate::error::Result;
use crate::reconcile::{self, compute_remainder_after_removal, compute_replacement, managed_view};
use crate::types::{MemberSet, Ownership, User};

/// What a write-back did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The entity does not exist; nothing was written.
    EntityAbsent,
    /// The replacement equals the current collection; nothing was written.
    Unchanged { members: MemberSet },
    /// The collection was replaced.
    Written {
        previous: MemberSet,
        current: MemberSet,
    },
}

impl WriteOutcome {
    /// Whether the entity was found.
    #[must_use]
    pub fn entity_present(&self) -> bool {
        !matches!(self, Self::EntityAbsent)
    }

    /// Whether a write happened.
    #[must_use]
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Written { .. })
    }

    /// Collection as it stands after the call, if the entity exists.
    #[must_use]
    pub fn members(&self) -> Option<&MemberSet> {
        match self {
            Self::EntityAbsent => None,
            Self::Unchanged { members } => Some(members),
            Self::Written { current, .. } => Some(current),
        }
    }
}

/// Result of reading the remote side for a managed subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// The entity is gone.
    Absent,
    /// The entity exists.
    Present {
        /// The full entity as read.
        user: User,
        /// Desired members that are actually present remotely.
        managed: MemberSet,
    },
}

impl Observation {
    /// Members of the desired subset found remotely; empty when absent.
    #[must_use]
    pub fn managed(&self) -> MemberSet {
        match self {
            Self::Absent => MemberSet::new(),
            Self::Present { managed, .. } => managed.clone(),
        }
    }
}

/// Applies desired subsets to a shared remote collection.
///
/// The store is injected so tests can pass a [`MemoryStore`](crate::backend::MemoryStore).
///
/// # Example
///
/// ```
/// use memberkit::backend::MemoryStore;
/// use memberkit::{MemberSet, Reconciler, User};
///
/// let store = MemoryStore::with_users([User::new("jdoe", ["nx-admin"].into_iter().collect())]);
/// let reconciler = Reconciler::new(store.clone());
///
/// let desired: MemberSet = ["nx-dev"].into_iter().collect();
/// reconciler.create("jdoe", &desired).unwrap();
/// assert_eq!(store.user("jdoe").unwrap().roles.to_string(), "nx-admin, nx-dev");
///
/// reconciler.delete("jdoe", &desired).unwrap();
/// assert_eq!(store.user("jdoe").unwrap().roles.to_string(), "nx-admin");
/// ```
#[derive(Debug, Clone)]
pub struct Reconciler<S> {
    store: S,
}

impl<S: EntityStore> Reconciler<S> {
    /// Create a reconciler over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch the entity as-is.
    pub fn fetch(&self, key: &str) -> Result<Option<User>> {
        self.store.get(key)
    }

    /// Replace the entity's whole collection with `members`.
    ///
    /// This is a full overwrite; callers pass the complete collection, not a
    /// delta. Skipped when the entity is not found.
    pub fn apply_desired(&self, key: &str, members: &MemberSet) -> Result<WriteOutcome> {
        self.write_with(key, |_| members.clone())
    }

    /// Add `desired` to whatever the entity currently holds.
    pub fn create(&self, key: &str, desired: &MemberSet) -> Result<WriteOutcome> {
        log::debug!("create {key}: adding [{desired}]");
        self.write_with(key, |remote| {
            compute_replacement(&MemberSet::new(), desired, remote)
        })
    }

    /// Read the entity and report which desired members it holds.
    pub fn read(&self, key: &str, desired: &MemberSet) -> Result<Observation> {
        match self.store.get(key)? {
            None => {
                log::debug!("read {key}: not found");
                Ok(Observation::Absent)
            }
            Some(user) => {
                let managed = managed_view(desired, &user.roles);
                Ok(Observation::Present { user, managed })
            }
        }
    }

    /// Swap the previously applied subset `prior` for `desired`.
    ///
    /// Members outside `prior` are kept, including ones other actors added
    /// since `prior` was applied.
    pub fn update(
        &self,
        key: &str,
        prior: &MemberSet,
        desired: &MemberSet,
    ) -> Result<WriteOutcome> {
        log::debug!("update {key}: [{prior}] -> [{desired}]");
        self.write_with(key, |remote| compute_replacement(prior, desired, remote))
    }

    /// Remove the previously applied subset, leaving the foreign remainder.
    pub fn delete(&self, key: &str, prior: &MemberSet) -> Result<WriteOutcome> {
        log::debug!("delete {key}: removing [{prior}]");
        self.write_with(key, |remote| compute_remainder_after_removal(prior, remote))
    }

    /// Whether the desired subset is in place.
    ///
    /// A missing entity is `Ok(false)`; store failures are `Err`, never
    /// `false`.
    pub fn exists(&self, key: &str, desired: &MemberSet, ownership: Ownership) -> Result<bool> {
        let user = self.store.get(key)?;
        Ok(reconcile::exists_under(
            ownership,
            desired,
            user.as_ref().map(|u| &u.roles),
        ))
    }

    /// Fetch, compute the full replacement from the fresh read, write.
    fn write_with(
        &self,
        key: &str,
        compute: impl FnOnce(&MemberSet) -> MemberSet,
    ) -> Result<WriteOutcome> {
        let Some(user) = self.store.get(key)? else {
            log::info!("{key} not found, skipping write");
            return Ok(WriteOutcome::EntityAbsent);
        };

        let replacement = compute(&user.roles);
        if replacement == user.roles {
            return Ok(WriteOutcome::Unchanged {
                members: replacement,
            });
        }

        self.store.replace(key, &user.with_roles(replacement.clone()))?;
        log::info!("{key}: roles [{}] -> [{replacement}]", user.roles);

        Ok(WriteOutcome::Written {
            previous: user.roles,
            current: replacement,
        })
    }
}
