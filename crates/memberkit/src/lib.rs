//! # memberkit
//!
//! Manage a subset of a collection that other actors share.
//!
//! A Nexus user's roles are a good example: this system is responsible for
//! a few of them, an identity team for others, a bootstrap script for the
//! rest. The remote API can only replace the whole role list, so every
//! write has to be computed locally from a fresh read:
//!
//! - create: `remote ∪ desired`
//! - update: `(remote - prior) ∪ desired`
//! - delete: `remote - prior`
//!
//! ## Example
//!
//! ```
//! use memberkit::backend::MemoryStore;
//! use memberkit::{MemberSet, Ownership, Reconciler, User};
//!
//! let store = MemoryStore::with_users([User::new("jdoe", ["nx-admin"].into_iter().collect())]);
//! let reconciler = Reconciler::new(store.clone());
//!
//! let desired: MemberSet = ["nx-dev", "nx-deploy"].into_iter().collect();
//! reconciler.create("jdoe", &desired).unwrap();
//! assert!(reconciler.exists("jdoe", &desired, Ownership::Shared).unwrap());
//!
//! // nx-admin was never ours and survives the delete
//! reconciler.delete("jdoe", &desired).unwrap();
//! assert_eq!(store.user("jdoe").unwrap().roles.to_string(), "nx-admin");
//! ```
//!
//! ## Existence
//!
//! [`reconcile::compute_existence`] is strict set equality and only makes
//! sense when the caller owns the whole collection. For shared collections
//! use [`reconcile::compute_containment`]. [`Reconciler::exists`] picks one
//! from the resource's [`Ownership`].

#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod reconcile;
pub mod reconciler;
pub mod types;

pub use backend::{EntityStore, MemoryStore};
pub use error::{Error, ErrorCategory, Result};
pub use reconcile::{
    compute_containment, compute_existence, compute_remainder_after_removal, compute_replacement,
    managed_view,
};
pub use reconciler::{Observation, Reconciler, WriteOutcome};
pub use types::{MemberSet, Ownership, User};
