//! Core types for membership reconciliation.
//!
//! [`MemberSet`] is the unit everything else works in: the desired subset a
//! caller declares, the full collection observed remotely, and every
//! replacement computed from the two.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// An unordered set of collection members.
///
/// Backed by a `BTreeSet` so duplicates collapse on construction and
/// iteration order is stable for display and serialization.
///
/// # Example
///
/// ```
/// use memberkit::MemberSet;
///
/// let roles: MemberSet = ["nx-dev", "nx-admin", "nx-dev"].into_iter().collect();
/// assert_eq!(roles.len(), 2);
/// assert_eq!(roles.to_string(), "nx-admin, nx-dev");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberSet(BTreeSet<String>);

impl MemberSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `member` is in the set.
    #[must_use]
    pub fn contains(&self, member: &str) -> bool {
        self.0.contains(member)
    }

    /// Add a member, returning `false` if it was already present.
    pub fn insert(&mut self, member: impl Into<String>) -> bool {
        self.0.insert(member.into())
    }

    /// Iterate members in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Members of `self` or `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self(self.0.union(&other.0).cloned().collect())
    }

    /// Members of `self` that are not in `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        Self(self.0.difference(&other.0).cloned().collect())
    }

    /// Members present in both sets.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        Self(self.0.intersection(&other.0).cloned().collect())
    }

    /// Whether every member of `self` is in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Members as an owned, sorted vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for MemberSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for MemberSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a MemberSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<String>> for MemberSet {
    fn from(members: Vec<String>) -> Self {
        members.into_iter().collect()
    }
}

impl fmt::Display for MemberSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        write!(f, "{}", joined.join(", "))
    }
}

/// How much of the remote collection a declared resource claims.
///
/// Create, update and delete always act on the declared subset only. The
/// ownership mode decides what "the resource exists" means.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ownership {
    /// Other actors may hold members too; existence means every declared
    /// member is present remotely.
    #[default]
    Shared,
    /// The resource owns the whole collection; existence means the remote
    /// collection equals the declared set exactly.
    Exclusive,
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shared => write!(f, "shared"),
            Self::Exclusive => write!(f, "exclusive"),
        }
    }
}

/// A Nexus security user, the entity owning the `roles` collection.
///
/// Everything except `roles` is owned by the server and sent back unchanged
/// on every write; the remote API only supports replacing the whole user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Login id; the stable external key.
    pub user_id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email_address: String,
    /// Identity source (`default`, `LDAP`, ...).
    #[serde(default)]
    pub source: String,
    /// `active`, `disabled`, ...
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub read_only: bool,
    /// The shared collection attribute.
    #[serde(default)]
    pub roles: MemberSet,
    /// Roles granted by the identity source; read-only for us.
    #[serde(default)]
    pub external_roles: MemberSet,
}

impl User {
    /// Create a user with only an id and roles set.
    pub fn new(user_id: impl Into<String>, roles: MemberSet) -> Self {
        Self {
            user_id: user_id.into(),
            roles,
            ..Self::default()
        }
    }

    /// Same user with its roles replaced.
    #[must_use]
    pub fn with_roles(&self, roles: MemberSet) -> Self {
        Self {
            roles,
            ..self.clone()
        }
    }

    /// Display name, falling back to the id.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.user_id.clone()
        } else {
            full.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(members: &[&str]) -> MemberSet {
        members.iter().copied().collect()
    }

    #[test]
    fn test_duplicates_collapse() {
        let roles = set(&["a", "b", "a", "a"]);
        assert_eq!(roles.len(), 2);
        assert!(roles.contains("a"));
        assert!(roles.contains("b"));
    }

    #[test]
    fn test_set_algebra() {
        let a = set(&["admin", "dev"]);
        let b = set(&["dev", "qa"]);
        assert_eq!(a.union(&b), set(&["admin", "dev", "qa"]));
        assert_eq!(a.difference(&b), set(&["admin"]));
        assert_eq!(a.intersection(&b), set(&["dev"]));
        assert!(set(&["dev"]).is_subset(&a));
        assert!(MemberSet::new().is_subset(&a));
    }

    #[test]
    fn test_display_sorted() {
        assert_eq!(set(&["qa", "admin", "dev"]).to_string(), "admin, dev, qa");
        assert_eq!(MemberSet::new().to_string(), "");
    }

    #[test]
    fn test_serde_transparent() {
        let roles: MemberSet = serde_json::from_str(r#"["b","a","b"]"#).unwrap();
        assert_eq!(roles, set(&["a", "b"]));
        assert_eq!(serde_json::to_string(&roles).unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn test_ownership_serde() {
        let o: Ownership = serde_json::from_str(r#""exclusive""#).unwrap();
        assert_eq!(o, Ownership::Exclusive);
        assert_eq!(Ownership::default(), Ownership::Shared);
    }

    #[test]
    fn test_user_wire_format() {
        let json = r#"{
            "userId": "jdoe",
            "firstName": "Jane",
            "lastName": "Doe",
            "emailAddress": "jane@example.com",
            "source": "default",
            "status": "active",
            "readOnly": false,
            "roles": ["nx-dev", "nx-admin"],
            "externalRoles": []
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.user_id, "jdoe");
        assert_eq!(user.roles, set(&["nx-admin", "nx-dev"]));
        assert_eq!(user.display_name(), "Jane Doe");

        let back = serde_json::to_value(&user).unwrap();
        assert_eq!(back["emailAddress"], "jane@example.com");
        assert_eq!(back["roles"][0], "nx-admin");
    }

    #[test]
    fn test_with_roles_keeps_profile() {
        let user = User {
            email_address: "jane@example.com".into(),
            ..User::new("jdoe", set(&["a"]))
        };
        let updated = user.with_roles(set(&["b"]));
        assert_eq!(updated.email_address, "jane@example.com");
        assert_eq!(updated.roles, set(&["b"]));
        assert_eq!(updated.display_name(), "jdoe");
    }
}
