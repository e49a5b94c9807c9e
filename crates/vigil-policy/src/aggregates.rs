//! Per-policy aggregates used by the scorer and the fast-reject filter.
//!
//! The extractor scans a policy's items once and folds them into union sets of
//! users, groups and allowed access types, plus two flags: whether any item
//! delegates admin, and whether the allowed access types cover the service's
//! whole catalog.

use std::collections::HashSet;

use vigil_core::{GROUP_PUBLIC, Policy, ServiceDef};

/// Facts derived from a policy's items. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyAggregates {
    groups: HashSet<String>,
    users: HashSet<String>,
    access_perms: HashSet<String>,
    delegate_admin: bool,
    has_all_perms: bool,
    has_public_group: bool,
}

impl PolicyAggregates {
    /// Build the aggregates using the standard public group name.
    #[must_use]
    pub fn build(policy: &Policy, service_def: &ServiceDef) -> Self {
        Self::build_with_public_group(policy, service_def, GROUP_PUBLIC)
    }

    /// Build the aggregates, treating `public_group` (case-insensitive) as the
    /// group every user belongs to.
    #[must_use]
    pub fn build_with_public_group(
        policy: &Policy,
        service_def: &ServiceDef,
        public_group: &str,
    ) -> Self {
        let mut aggregates = Self::default();

        for item in &policy.items {
            aggregates.delegate_admin |= item.delegate_admin;

            aggregates.access_perms.extend(
                item.accesses
                    .iter()
                    .filter(|access| access.is_allowed)
                    .map(|access| access.access_type.clone()),
            );

            aggregates.groups.extend(item.groups.iter().cloned());
            aggregates.users.extend(item.users.iter().cloned());
        }

        aggregates.has_all_perms = service_def
            .access_type_names()
            .all(|name| aggregates.access_perms.contains(name));

        aggregates.has_public_group = aggregates
            .groups
            .iter()
            .any(|group| group.eq_ignore_ascii_case(public_group));

        tracing::debug!(
            policy_id = %policy.id,
            users = aggregates.users.len(),
            groups = aggregates.groups.len(),
            access_perms = aggregates.access_perms.len(),
            delegate_admin = aggregates.delegate_admin,
            has_all_perms = aggregates.has_all_perms,
            has_public_group = aggregates.has_public_group,
            "built policy aggregates"
        );

        aggregates
    }

    /// Union of all item subject groups.
    #[must_use]
    pub fn groups(&self) -> &HashSet<String> {
        &self.groups
    }

    /// Union of all item subject users.
    #[must_use]
    pub fn users(&self) -> &HashSet<String> {
        &self.users
    }

    /// Union of all allowed access types.
    #[must_use]
    pub fn access_perms(&self) -> &HashSet<String> {
        &self.access_perms
    }

    #[must_use]
    pub fn delegate_admin(&self) -> bool {
        self.delegate_admin
    }

    /// `true` iff every access type in the service catalog is allowed somewhere.
    #[must_use]
    pub fn has_all_perms(&self) -> bool {
        self.has_all_perms
    }

    #[must_use]
    pub fn has_public_group(&self) -> bool {
        self.has_public_group
    }
}
