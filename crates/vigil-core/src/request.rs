//! Access request evaluated against policies.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::constants::{ADMIN_ACCESS, ANY_ACCESS};

/// A single access request: who wants which access to which resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRequest {
    pub user: String,

    #[serde(default)]
    pub user_groups: HashSet<String>,

    /// Requested access type; empty means any access.
    #[serde(default)]
    pub access_type: String,

    /// Resource kind name to the concrete value being accessed.
    #[serde(default)]
    pub resource: IndexMap<String, String>,
}

impl AccessRequest {
    /// Create a request for `access_type` by `user`.
    #[must_use]
    pub fn new(user: impl Into<String>, access_type: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            access_type: access_type.into(),
            ..Default::default()
        }
    }

    /// Add groups the user belongs to.
    #[must_use]
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.user_groups.extend(groups.into_iter().map(Into::into));
        self
    }

    /// Set the value accessed for a resource kind.
    #[must_use]
    pub fn with_resource(mut self, kind: impl Into<String>, value: impl Into<String>) -> Self {
        self.resource.insert(kind.into(), value.into());
        self
    }

    /// Returns `true` if the request asks for any access type.
    #[must_use]
    pub fn is_access_type_any(&self) -> bool {
        self.access_type.is_empty() || self.access_type == ANY_ACCESS
    }

    /// Returns `true` if the request asks for delegated admin access.
    #[must_use]
    pub fn is_access_type_delegated_admin(&self) -> bool {
        self.access_type == ADMIN_ACCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_type_classification() {
        assert!(AccessRequest::new("alice", "").is_access_type_any());
        assert!(AccessRequest::new("alice", ANY_ACCESS).is_access_type_any());
        assert!(!AccessRequest::new("alice", "read").is_access_type_any());

        assert!(AccessRequest::new("alice", ADMIN_ACCESS).is_access_type_delegated_admin());
        assert!(!AccessRequest::new("alice", "read").is_access_type_delegated_admin());
    }
}
