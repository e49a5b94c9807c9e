//! Structural policy matching.
//!
//! [`StructuralMatcher`] is the authoritative (and comparatively expensive)
//! decision about whether a policy's items and resources cover a request. The
//! evaluator only calls it once the fast-reject filter has admitted the request.
//!
//! [`PolicyItemsMatcher`] is the stock implementation: it checks item subjects
//! and access types, and matches resource values with glob patterns. Custom
//! conditions are not evaluated here.
//!
//! # Usage
//!
//! ```
//! use std::collections::HashSet;
//! use vigil_core::{Policy, PolicyItem, PolicyItemAccess};
//! use vigil_policy::matcher::{PolicyItemsMatcher, StructuralMatcher};
//!
//! let policy = Policy::new("1", "readers").with_item(PolicyItem {
//!     accesses: vec![PolicyItemAccess::allowed("read")],
//!     users: vec!["alice".to_string()],
//!     ..Default::default()
//! });
//!
//! let matcher = PolicyItemsMatcher::new();
//! assert!(matcher.is_access_allowed(&policy, "alice", &HashSet::new(), "read"));
//! assert!(!matcher.is_access_allowed(&policy, "alice", &HashSet::new(), "write"));
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use regex::{Regex, RegexBuilder};
use vigil_core::{
    ADMIN_ACCESS, ANY_ACCESS, AccessRequest, GROUP_PUBLIC, MATCH_ANY, Policy, PolicyItem,
    PolicyResource,
};

// =============================================================================
// Structural Matcher
// =============================================================================

/// Authoritative policy matching, consulted after the fast-reject filter.
///
/// Implementations must agree with the aggregates the filter is built from: an
/// item may only grant a subject listed in its users or groups (or the public
/// group), and only access types it allows.
pub trait StructuralMatcher: Send + Sync {
    /// Does any policy item grant `access_type` to the user or their groups?
    fn is_access_allowed(
        &self,
        policy: &Policy,
        user: &str,
        user_groups: &HashSet<String>,
        access_type: &str,
    ) -> bool;

    /// Do the policy's resources and items cover the request?
    fn is_policy_items_match(&self, policy: &Policy, request: &AccessRequest) -> bool;
}

// =============================================================================
// Policy Items Matcher
// =============================================================================

/// Item and resource matcher with regex caching for glob patterns.
///
/// This struct is thread-safe and can be shared across policies and requests.
pub struct PolicyItemsMatcher {
    public_group: String,

    /// Cache for compiled glob patterns.
    regex_cache: RwLock<HashMap<String, Regex>>,
}

impl Default for PolicyItemsMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PolicyItemsMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyItemsMatcher")
            .field("public_group", &self.public_group)
            .finish_non_exhaustive()
    }
}

impl PolicyItemsMatcher {
    /// Create a matcher using the standard public group.
    #[must_use]
    pub fn new() -> Self {
        Self::with_public_group(GROUP_PUBLIC)
    }

    /// Create a matcher treating `public_group` (case-insensitive) as the
    /// group every user belongs to.
    #[must_use]
    pub fn with_public_group(public_group: impl Into<String>) -> Self {
        Self {
            public_group: public_group.into(),
            regex_cache: RwLock::new(HashMap::new()),
        }
    }

    fn item_grants(
        &self,
        item: &PolicyItem,
        user: &str,
        user_groups: &HashSet<String>,
        access_type: &str,
    ) -> bool {
        self.item_covers_subject(item, user, user_groups)
            && Self::item_covers_access(item, access_type)
    }

    fn item_covers_subject(
        &self,
        item: &PolicyItem,
        user: &str,
        user_groups: &HashSet<String>,
    ) -> bool {
        item.users.iter().any(|u| u == user)
            || item.groups.iter().any(|group| {
                group.eq_ignore_ascii_case(&self.public_group) || user_groups.contains(group)
            })
    }

    fn item_covers_access(item: &PolicyItem, access_type: &str) -> bool {
        match access_type {
            "" | ANY_ACCESS => item.allows_any(),
            ADMIN_ACCESS => item.delegate_admin || item.allows(ADMIN_ACCESS),
            other => item.allows(other),
        }
    }

    /// Every resource kind named by both the policy and the request must match.
    fn resources_match(&self, policy: &Policy, request: &AccessRequest) -> bool {
        policy
            .resources
            .iter()
            .filter(|(_, resource)| !resource.values.is_empty())
            .all(|(kind, resource)| match request.resource.get(kind) {
                Some(value) => self.resource_matches(resource, value),
                None => true,
            })
    }

    fn resource_matches(&self, resource: &PolicyResource, value: &str) -> bool {
        let matched = resource
            .values
            .iter()
            .any(|pattern| self.matches_glob(pattern, value));
        matched != resource.is_excludes
    }

    /// Match a glob pattern against a resource value.
    ///
    /// Supports:
    /// - `*` - matches any run of characters, newlines included
    /// - `?` - matches a single character, newlines included
    /// - an empty pattern matches anything
    fn matches_glob(&self, pattern: &str, value: &str) -> bool {
        if pattern.is_empty() || pattern == MATCH_ANY {
            return true;
        }
        if !pattern.contains(['*', '?']) {
            return pattern == value;
        }

        let regex_pattern = regex::escape(pattern)
            .replace(r"\*", ".*")
            .replace(r"\?", ".");
        let regex_pattern = format!("^{regex_pattern}$");

        self.get_or_compile_regex(&regex_pattern)
            .map(|re| re.is_match(value))
            .unwrap_or(false)
    }

    /// Get a compiled regex from cache or compile and cache it.
    fn get_or_compile_regex(&self, pattern: &str) -> Option<Regex> {
        if let Some(re) = self
            .regex_cache
            .read()
            .ok()
            .and_then(|cache| cache.get(pattern).cloned())
        {
            return Some(re);
        }

        let re = RegexBuilder::new(pattern)
            .dot_matches_new_line(true)
            .build()
            .ok()?;
        if let Ok(mut cache) = self.regex_cache.write() {
            cache.insert(pattern.to_string(), re.clone());
        }

        Some(re)
    }
}

impl StructuralMatcher for PolicyItemsMatcher {
    fn is_access_allowed(
        &self,
        policy: &Policy,
        user: &str,
        user_groups: &HashSet<String>,
        access_type: &str,
    ) -> bool {
        policy
            .items
            .iter()
            .any(|item| self.item_grants(item, user, user_groups, access_type))
    }

    fn is_policy_items_match(&self, policy: &Policy, request: &AccessRequest) -> bool {
        self.resources_match(policy, request)
            && self.is_access_allowed(
                policy,
                &request.user,
                &request.user_groups,
                &request.access_type,
            )
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::PolicyItemAccess;

    // -------------------------------------------------------------------------
    // Test Helpers
    // -------------------------------------------------------------------------

    fn no_groups() -> HashSet<String> {
        HashSet::new()
    }

    fn create_test_policy() -> Policy {
        Policy::new("1", "sales tables")
            .with_resource("database", PolicyResource::new(["sales"]))
            .with_resource("table", PolicyResource::new(["orders_*", "refund?"]))
            .with_item(PolicyItem {
                accesses: vec![PolicyItemAccess::allowed("select")],
                users: vec!["alice".into()],
                groups: vec!["analysts".into()],
                ..Default::default()
            })
            .with_item(PolicyItem {
                accesses: vec![
                    PolicyItemAccess::allowed("update"),
                    PolicyItemAccess::disallowed("drop"),
                ],
                users: vec!["bob".into()],
                delegate_admin: true,
                ..Default::default()
            })
    }

    // -------------------------------------------------------------------------
    // Item Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_access_allowed_by_user() {
        let matcher = PolicyItemsMatcher::new();
        let policy = create_test_policy();

        assert!(matcher.is_access_allowed(&policy, "alice", &no_groups(), "select"));
        assert!(!matcher.is_access_allowed(&policy, "alice", &no_groups(), "update"));
        assert!(matcher.is_access_allowed(&policy, "bob", &no_groups(), "update"));
        assert!(!matcher.is_access_allowed(&policy, "bob", &no_groups(), "drop"));
    }

    #[test]
    fn test_access_allowed_by_group() {
        let matcher = PolicyItemsMatcher::new();
        let policy = create_test_policy();
        let groups: HashSet<String> = ["analysts".to_string()].into();

        assert!(matcher.is_access_allowed(&policy, "carol", &groups, "select"));
        assert!(!matcher.is_access_allowed(&policy, "carol", &no_groups(), "select"));
    }

    #[test]
    fn test_any_and_admin_access() {
        let matcher = PolicyItemsMatcher::new();
        let policy = create_test_policy();

        assert!(matcher.is_access_allowed(&policy, "alice", &no_groups(), ""));
        assert!(matcher.is_access_allowed(&policy, "alice", &no_groups(), ANY_ACCESS));
        assert!(!matcher.is_access_allowed(&policy, "alice", &no_groups(), ADMIN_ACCESS));
        assert!(matcher.is_access_allowed(&policy, "bob", &no_groups(), ADMIN_ACCESS));
    }

    #[test]
    fn test_public_group_grants_everyone() {
        let policy = Policy::new("1", "public read").with_item(PolicyItem {
            accesses: vec![PolicyItemAccess::allowed("read")],
            groups: vec!["public".into()],
            ..Default::default()
        });

        assert!(PolicyItemsMatcher::new().is_access_allowed(&policy, "zed", &no_groups(), "read"));
        assert!(
            !PolicyItemsMatcher::with_public_group("everyone").is_access_allowed(
                &policy,
                "zed",
                &no_groups(),
                "read"
            )
        );
    }

    // -------------------------------------------------------------------------
    // Resource Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_items_match_with_resources() {
        let matcher = PolicyItemsMatcher::new();
        let policy = create_test_policy();

        let request = AccessRequest::new("alice", "select")
            .with_resource("database", "sales")
            .with_resource("table", "orders_2024");
        assert!(matcher.is_policy_items_match(&policy, &request));

        let request = AccessRequest::new("alice", "select")
            .with_resource("database", "sales")
            .with_resource("table", "refunds");
        assert!(matcher.is_policy_items_match(&policy, &request));

        let request = AccessRequest::new("alice", "select")
            .with_resource("database", "hr")
            .with_resource("table", "orders_2024");
        assert!(!matcher.is_policy_items_match(&policy, &request));
    }

    #[test]
    fn test_unnamed_resource_kinds_are_unconstrained() {
        let matcher = PolicyItemsMatcher::new();
        let policy = create_test_policy();

        let request = AccessRequest::new("alice", "select").with_resource("database", "sales");
        assert!(matcher.is_policy_items_match(&policy, &request));
    }

    #[test]
    fn test_excludes_inverts_resource_match() {
        let matcher = PolicyItemsMatcher::new();
        let policy = Policy::new("1", "not tmp")
            .with_resource("database", PolicyResource::new(["tmp_*"]).excludes())
            .with_item(PolicyItem {
                accesses: vec![PolicyItemAccess::allowed("select")],
                users: vec!["alice".into()],
                ..Default::default()
            });

        let tmp = AccessRequest::new("alice", "select").with_resource("database", "tmp_x");
        let sales = AccessRequest::new("alice", "select").with_resource("database", "sales");
        assert!(!matcher.is_policy_items_match(&policy, &tmp));
        assert!(matcher.is_policy_items_match(&policy, &sales));
    }

    #[test]
    fn test_glob_escapes_regex_metacharacters() {
        let matcher = PolicyItemsMatcher::new();

        assert!(matcher.matches_glob("a.b*", "a.bc"));
        assert!(!matcher.matches_glob("a.b*", "axbc"));
        assert!(matcher.matches_glob("", "anything"));
        assert!(matcher.matches_glob("exact", "exact"));
        assert!(!matcher.matches_glob("exact", "exactly"));
    }

    #[test]
    fn test_glob_wildcards_cross_newlines() {
        let matcher = PolicyItemsMatcher::new();

        assert!(matcher.matches_glob("/data/*", "/data/a\nb"));
        assert!(matcher.matches_glob("a?b", "a\nb"));
        assert!(!matcher.matches_glob("a?b", "a\n\nb"));
    }

    #[test]
    fn test_multiline_resource_values_match_and_exclude() {
        let matcher = PolicyItemsMatcher::new();
        let item = PolicyItem {
            accesses: vec![PolicyItemAccess::allowed("read")],
            users: vec!["alice".into()],
            ..Default::default()
        };
        let included = Policy::new("1", "data")
            .with_resource("path", PolicyResource::new(["/data/*"]))
            .with_item(item.clone());
        let excluded = Policy::new("2", "not data")
            .with_resource("path", PolicyResource::new(["/data/*"]).excludes())
            .with_item(item);

        let request = AccessRequest::new("alice", "read").with_resource("path", "/data/a\nb");
        assert!(matcher.is_policy_items_match(&included, &request));
        assert!(!matcher.is_policy_items_match(&excluded, &request));
    }

    #[test]
    fn test_regex_cache() {
        let matcher = PolicyItemsMatcher::new();

        assert!(matcher.matches_glob("orders_*", "orders_1"));
        assert!(matcher.matches_glob("orders_*", "orders_2"));

        let cache = matcher.regex_cache.read().unwrap();
        assert_eq!(cache.len(), 1);
    }
}
