//! Access policy model.
//!
//! A [`Policy`] names the resources it protects (one [`PolicyResource`] per
//! resource kind) and lists [`PolicyItem`]s granting access types to users and
//! groups.
//!
//! # Example
//!
//! ```
//! use vigil_core::{Policy, PolicyItem, PolicyItemAccess, PolicyResource};
//!
//! let policy = Policy::new("1", "sales-readers")
//!     .with_resource("database", PolicyResource::new(["sales"]))
//!     .with_item(PolicyItem {
//!         accesses: vec![PolicyItemAccess::allowed("select")],
//!         groups: vec!["analysts".to_string()],
//!         ..Default::default()
//!     });
//!
//! assert_eq!(policy.items.len(), 1);
//! assert!(!policy.is_deny());
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;

// =============================================================================
// Policy
// =============================================================================

/// Access-control policy for a single service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    /// Unique identifier, used as the secondary ordering key.
    pub id: String,

    /// Human-readable policy name.
    #[serde(default)]
    pub name: String,

    /// Whether matching items allow or deny access.
    #[serde(default)]
    pub policy_type: PolicyType,

    /// Resource kind name to the patterns this policy covers for that kind.
    #[serde(default)]
    pub resources: IndexMap<String, PolicyResource>,

    /// Policy items in declaration order.
    #[serde(default)]
    pub items: Vec<PolicyItem>,

    /// Custom conditions attached to the whole policy.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<PolicyCondition>,
}

impl Policy {
    /// Create an empty allow policy.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Decode a policy from its JSON representation.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Json`](crate::VigilError::Json) if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the policy type.
    #[must_use]
    pub fn with_type(mut self, policy_type: PolicyType) -> Self {
        self.policy_type = policy_type;
        self
    }

    /// Add (or replace) the patterns for a resource kind.
    #[must_use]
    pub fn with_resource(mut self, kind: impl Into<String>, resource: PolicyResource) -> Self {
        self.resources.insert(kind.into(), resource);
        self
    }

    /// Append a policy item.
    #[must_use]
    pub fn with_item(mut self, item: PolicyItem) -> Self {
        self.items.push(item);
        self
    }

    /// Attach a policy-level custom condition.
    #[must_use]
    pub fn with_condition(mut self, condition: PolicyCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Returns `true` for deny policies.
    #[must_use]
    pub fn is_deny(&self) -> bool {
        self.policy_type == PolicyType::Deny
    }

    /// Number of custom conditions: policy-level plus those on every item.
    #[must_use]
    pub fn custom_conditions_count(&self) -> usize {
        self.conditions.len()
            + self
                .items
                .iter()
                .map(|item| item.conditions.len())
                .sum::<usize>()
    }
}

/// Whether a policy grants or denies what its items describe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyType {
    #[default]
    Allow,
    Deny,
}

// =============================================================================
// Policy Resource
// =============================================================================

/// Value patterns for one resource kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyResource {
    /// Patterns; `*` and `?` are wildcards, an empty pattern matches anything.
    #[serde(default)]
    pub values: Vec<String>,

    /// The policy applies to everything *except* the listed values.
    #[serde(default)]
    pub is_excludes: bool,

    /// The patterns also cover descendants of the listed values.
    #[serde(default)]
    pub is_recursive: bool,
}

impl PolicyResource {
    /// Create a resource with the given patterns.
    #[must_use]
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            is_excludes: false,
            is_recursive: false,
        }
    }

    /// Mark the resource as an exclusion list.
    #[must_use]
    pub fn excludes(mut self) -> Self {
        self.is_excludes = true;
        self
    }

    /// Mark the resource as recursive.
    #[must_use]
    pub fn recursive(mut self) -> Self {
        self.is_recursive = true;
        self
    }
}

// =============================================================================
// Policy Item
// =============================================================================

/// One rule granting access types to users and groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyItem {
    #[serde(default)]
    pub accesses: Vec<PolicyItemAccess>,

    #[serde(default)]
    pub users: Vec<String>,

    #[serde(default)]
    pub groups: Vec<String>,

    /// Grantees may administer this policy.
    #[serde(default)]
    pub delegate_admin: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<PolicyCondition>,
}

impl PolicyItem {
    /// Returns `true` if the item allows `access_type`.
    #[must_use]
    pub fn allows(&self, access_type: &str) -> bool {
        self.accesses
            .iter()
            .any(|a| a.is_allowed && a.access_type == access_type)
    }

    /// Returns `true` if the item allows at least one access type.
    #[must_use]
    pub fn allows_any(&self) -> bool {
        self.accesses.iter().any(|a| a.is_allowed)
    }
}

/// An access type together with whether it is allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyItemAccess {
    #[serde(rename = "type")]
    pub access_type: String,

    #[serde(default = "default_is_allowed")]
    pub is_allowed: bool,
}

fn default_is_allowed() -> bool {
    true
}

impl PolicyItemAccess {
    /// Create an allowed access entry.
    #[must_use]
    pub fn allowed(access_type: impl Into<String>) -> Self {
        Self {
            access_type: access_type.into(),
            is_allowed: true,
        }
    }

    /// Create an entry that lists the access type without allowing it.
    #[must_use]
    pub fn disallowed(access_type: impl Into<String>) -> Self {
        Self {
            access_type: access_type.into(),
            is_allowed: false,
        }
    }
}

/// Custom (non-resource, non-subject) match condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyCondition {
    #[serde(rename = "type")]
    pub condition_type: String,

    #[serde(default)]
    pub values: Vec<String>,
}

impl PolicyCondition {
    /// Create a condition of the given type.
    #[must_use]
    pub fn new<I, S>(condition_type: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            condition_type: condition_type.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
