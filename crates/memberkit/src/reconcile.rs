//! Set algebra for partially owned collections.
//!
//! The remote collection is shared: some members belong to this system (the
//! desired subset), the rest to somebody else (the foreign remainder). The
//! remote API can only replace the whole collection, so every write is a
//! full replacement computed here from the latest remote read.
//!
//! All functions are pure. `None` for the remote collection means the entity
//! was not found.

use crate::types::{MemberSet, Ownership};

/// Strict set equality between the desired subset and the remote collection.
///
/// Returns `false` when the entity is missing. Assumes the caller owns the
/// whole collection; see [`compute_containment`] for shared collections.
pub fn compute_existence(desired: &MemberSet, remote: Option<&MemberSet>) -> bool {
    let Some(remote) = remote else {
        return false;
    };
    if remote.len() != desired.len() {
        return false;
    }
    remote.iter().all(|member| desired.contains(member))
}

/// Whether every desired member is present remotely.
///
/// Returns `false` when the entity is missing. An empty desired subset is
/// contained in any existing collection.
pub fn compute_containment(desired: &MemberSet, remote: Option<&MemberSet>) -> bool {
    remote.is_some_and(|remote| desired.is_subset(remote))
}

/// Existence check under the given ownership mode.
pub fn exists_under(ownership: Ownership, desired: &MemberSet, remote: Option<&MemberSet>) -> bool {
    match ownership {
        Ownership::Shared => compute_containment(desired, remote),
        Ownership::Exclusive => compute_existence(desired, remote),
    }
}

/// The remote collection with every desired member removed.
///
/// This is the foreign remainder. Idempotent.
pub fn compute_remainder_after_removal(desired: &MemberSet, remote: &MemberSet) -> MemberSet {
    remote.difference(desired)
}

/// Full replacement that swaps `prior` for `desired` and keeps foreign members.
///
/// `(remote - prior) ∪ desired`. Create passes an empty `prior`; delete
/// passes an empty `desired`.
pub fn compute_replacement(
    prior: &MemberSet,
    desired: &MemberSet,
    remote: &MemberSet,
) -> MemberSet {
    compute_remainder_after_removal(prior, remote).union(desired)
}

/// The part of the remote collection this system accounts for.
pub fn managed_view(desired: &MemberSet, remote: &MemberSet) -> MemberSet {
    desired.intersection(remote)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(members: &[&str]) -> MemberSet {
        members.iter().copied().collect()
    }

    /// Small alphabet so generated sets overlap often
    fn members() -> impl Strategy<Value = MemberSet> {
        prop::collection::btree_set("[a-d]{1,2}", 0..6)
            .prop_map(|members| members.into_iter().collect())
    }

    proptest! {
        #[test]
        fn prop_existence_not_found(d in members()) {
            prop_assert!(!compute_existence(&d, None));
            prop_assert!(!compute_containment(&d, None));
        }

        #[test]
        fn prop_existence_symmetric(a in members(), b in members()) {
            prop_assert_eq!(
                compute_existence(&a, Some(&b)),
                compute_existence(&b, Some(&a))
            );
        }

        #[test]
        fn prop_existence_is_equality(a in members(), b in members()) {
            prop_assert_eq!(compute_existence(&a, Some(&b)), a == b);
            prop_assert!(compute_existence(&a, Some(&a)));
        }

        #[test]
        fn prop_remainder_idempotent(d in members(), r in members()) {
            let once = compute_remainder_after_removal(&d, &r);
            let twice = compute_remainder_after_removal(&d, &once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_remainder_preserves_foreign(d in members(), r in members()) {
            let out = compute_remainder_after_removal(&d, &r);
            for member in r.iter().filter(|m| !d.contains(m)) {
                prop_assert!(out.contains(member));
            }
            for member in d.iter() {
                prop_assert!(!out.contains(member));
            }
        }

        #[test]
        fn prop_replacement_keeps_foreign(
            prior in members(),
            desired in members(),
            remote in members(),
        ) {
            let out = compute_replacement(&prior, &desired, &remote);
            for member in desired.iter() {
                prop_assert!(out.contains(member));
            }
            for member in remote.iter().filter(|m| !prior.contains(m)) {
                prop_assert!(out.contains(member));
            }
            prop_assert!(compute_containment(&desired, Some(&out)));
        }
    }

    #[test]
    fn test_existence_equal_sets() {
        let d = set(&["admin", "dev"]);
        let r = set(&["admin", "dev"]);
        assert!(compute_existence(&d, Some(&r)));
    }

    #[test]
    fn test_existence_cardinality_mismatch() {
        let d = set(&["admin"]);
        let r = set(&["admin", "dev"]);
        assert!(!compute_existence(&d, Some(&r)));
    }

    #[test]
    fn test_existence_same_size_different_members() {
        let d = set(&["admin", "qa"]);
        let r = set(&["admin", "dev"]);
        assert!(!compute_existence(&d, Some(&r)));
    }

    #[test]
    fn test_containment() {
        let r = set(&["admin", "dev"]);
        assert!(compute_containment(&set(&["admin"]), Some(&r)));
        assert!(compute_containment(&set(&[]), Some(&r)));
        assert!(!compute_containment(&set(&["qa"]), Some(&r)));
        assert!(!compute_containment(&set(&[]), None));
    }

    #[test]
    fn test_exists_under_ownership() {
        let d = set(&["admin"]);
        let r = set(&["admin", "dev"]);
        assert!(exists_under(Ownership::Shared, &d, Some(&r)));
        assert!(!exists_under(Ownership::Exclusive, &d, Some(&r)));
    }

    #[test]
    fn test_remainder_drops_desired() {
        let d = set(&["dev"]);
        let r = set(&["admin", "dev", "qa"]);
        assert_eq!(compute_remainder_after_removal(&d, &r), set(&["admin", "qa"]));
    }

    #[test]
    fn test_remainder_empty_desired() {
        let d = set(&[]);
        let r = set(&["admin"]);
        assert_eq!(compute_remainder_after_removal(&d, &r), set(&["admin"]));
    }

    #[test]
    fn test_replacement_swaps_managed_subset() {
        // prior {dev}, now {qa}; admin belongs to someone else
        let out = compute_replacement(&set(&["dev"]), &set(&["qa"]), &set(&["admin", "dev"]));
        assert_eq!(out, set(&["admin", "qa"]));
    }

    #[test]
    fn test_replacement_create_is_union() {
        let out = compute_replacement(&set(&[]), &set(&["dev"]), &set(&["admin"]));
        assert_eq!(out, set(&["admin", "dev"]));
    }

    #[test]
    fn test_replacement_delete_is_remainder() {
        let prior = set(&["dev"]);
        let remote = set(&["admin", "dev"]);
        assert_eq!(
            compute_replacement(&prior, &set(&[]), &remote),
            compute_remainder_after_removal(&prior, &remote)
        );
    }

    #[test]
    fn test_managed_view() {
        let out = managed_view(&set(&["dev", "qa"]), &set(&["admin", "dev"]));
        assert_eq!(out, set(&["dev"]));
    }
}
