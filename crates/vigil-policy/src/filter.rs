//! Fast-reject filter.
//!
//! Decides from a policy's aggregates alone whether the policy can possibly
//! apply to a request. A rejection is final. An admission only means the
//! structural matcher has to be consulted.
//!
//! The filter never rejects a request that some policy item would grant: every
//! item's users, groups and allowed access types are contained in the
//! aggregates it checks against.

use std::collections::HashSet;

use vigil_core::{ADMIN_ACCESS, ANY_ACCESS, AccessRequest};

use crate::aggregates::PolicyAggregates;

/// Subject and access-type pre-check over a policy's aggregates.
#[derive(Debug, Clone, Copy)]
pub struct FastRejectFilter<'a> {
    aggregates: &'a PolicyAggregates,
}

impl<'a> FastRejectFilter<'a> {
    #[must_use]
    pub fn new(aggregates: &'a PolicyAggregates) -> Self {
        Self { aggregates }
    }

    /// Subject test: public policy, named user, or a shared group.
    #[must_use]
    pub fn admits_subject(&self, user: &str, user_groups: &HashSet<String>) -> bool {
        self.aggregates.has_public_group()
            || self.aggregates.users().contains(user)
            || user_groups
                .iter()
                .any(|group| self.aggregates.groups().contains(group))
    }

    /// Access test. An empty access type means any access.
    #[must_use]
    pub fn admits_access(&self, access_type: &str) -> bool {
        let access_type = if access_type.is_empty() {
            ANY_ACCESS
        } else {
            access_type
        };

        let is_any_access = access_type == ANY_ACCESS;
        let is_admin_access = access_type == ADMIN_ACCESS;

        is_any_access
            || (is_admin_access && self.aggregates.delegate_admin())
            || self.aggregates.has_all_perms()
            || self.aggregates.access_perms().contains(access_type)
    }

    /// Both tests for a raw `(user, groups, access type)` triple.
    #[must_use]
    pub fn admits(&self, user: &str, user_groups: &HashSet<String>, access_type: &str) -> bool {
        self.admits_subject(user, user_groups) && self.admits_access(access_type)
    }

    /// Both tests for an access request.
    #[must_use]
    pub fn admits_request(&self, request: &AccessRequest) -> bool {
        if !self.admits_subject(&request.user, &request.user_groups) {
            return false;
        }

        request.is_access_type_any()
            || (request.is_access_type_delegated_admin() && self.aggregates.delegate_admin())
            || self.aggregates.has_all_perms()
            || self.aggregates.access_perms().contains(&request.access_type)
    }
}
