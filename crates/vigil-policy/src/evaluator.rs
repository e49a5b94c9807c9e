//! Policy evaluator: eval-order scoring plus fast-reject pre-filtering.
//!
//! An evaluator is built once per policy, when the policy is loaded. The build
//! computes every aggregate and the eval order before the value is handed out,
//! so a [`PolicyEvaluator`] is immutable and can be shared across threads
//! without locking. An edited policy gets a new evaluator.
//!
//! # Example
//!
//! ```
//! use std::collections::HashSet;
//! use vigil_core::{Policy, PolicyItem, PolicyItemAccess, PolicyResource, ServiceDef};
//! use vigil_policy::PolicyEvaluatorBuilder;
//!
//! let service_def = ServiceDef::new("hive")
//!     .with_resource("database", 10)
//!     .with_access_types(["select", "update"]);
//! let policy = Policy::new("1", "sales readers")
//!     .with_resource("database", PolicyResource::new(["sales"]))
//!     .with_item(PolicyItem {
//!         accesses: vec![PolicyItemAccess::allowed("select")],
//!         users: vec!["alice".to_string()],
//!         ..Default::default()
//!     });
//!
//! let evaluator = PolicyEvaluatorBuilder::new(policy, service_def).build();
//!
//! assert_eq!(evaluator.eval_order(), 10_000 - 1 - 13 - 25);
//! assert!(evaluator.may_allow("alice", &HashSet::new(), "select"));
//! assert!(!evaluator.may_allow("bob", &HashSet::new(), "select"));
//! ```

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use vigil_core::{ANY_ACCESS, AccessRequest, Policy, ServiceDef};

use crate::aggregates::PolicyAggregates;
use crate::config::EvaluatorOptions;
use crate::filter::FastRejectFilter;
use crate::matcher::{PolicyItemsMatcher, StructuralMatcher};
use crate::priority::{self, EvalOrderBreakdown};

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`PolicyEvaluator`].
pub struct PolicyEvaluatorBuilder {
    policy: Arc<Policy>,
    service_def: Arc<ServiceDef>,
    options: EvaluatorOptions,
    matcher: Option<Arc<dyn StructuralMatcher>>,
}

impl PolicyEvaluatorBuilder {
    #[must_use]
    pub fn new(policy: impl Into<Arc<Policy>>, service_def: impl Into<Arc<ServiceDef>>) -> Self {
        Self {
            policy: policy.into(),
            service_def: service_def.into(),
            options: EvaluatorOptions::default(),
            matcher: None,
        }
    }

    #[must_use]
    pub fn options(mut self, options: EvaluatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Structural matcher consulted once a request passes the fast checks.
    ///
    /// Defaults to a [`PolicyItemsMatcher`] using the configured public group.
    #[must_use]
    pub fn matcher(mut self, matcher: Arc<dyn StructuralMatcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    /// Compute the aggregates and the eval order, and freeze the evaluator.
    #[must_use]
    pub fn build(self) -> PolicyEvaluator {
        let Self {
            policy,
            service_def,
            options,
            matcher,
        } = self;

        let matcher = matcher.unwrap_or_else(|| {
            Arc::new(PolicyItemsMatcher::with_public_group(
                options.public_group.clone(),
            ))
        });

        let aggregates =
            PolicyAggregates::build_with_public_group(&policy, &service_def, &options.public_group);

        let custom_conditions_count = if options.disable_custom_conditions {
            0
        } else {
            policy.custom_conditions_count()
        };

        let breakdown =
            priority::compute_breakdown(&policy, &service_def, &aggregates, custom_conditions_count);

        tracing::debug!(
            policy_id = %policy.id,
            service = %service_def.name,
            eval_order = breakdown.total(),
            fast_reject = options.fast_reject,
            "initialized policy evaluator"
        );

        PolicyEvaluator {
            policy,
            service_def,
            options,
            aggregates,
            breakdown,
            custom_conditions_count,
            matcher,
        }
    }
}

// =============================================================================
// Policy Evaluator
// =============================================================================

/// Immutable, precomputed view of one policy.
pub struct PolicyEvaluator {
    policy: Arc<Policy>,
    service_def: Arc<ServiceDef>,
    options: EvaluatorOptions,
    aggregates: PolicyAggregates,
    breakdown: EvalOrderBreakdown,
    custom_conditions_count: usize,
    matcher: Arc<dyn StructuralMatcher>,
}

impl std::fmt::Debug for PolicyEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEvaluator")
            .field("policy_id", &self.policy.id)
            .field("eval_order", &self.eval_order())
            .field("aggregates", &self.aggregates)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl PolicyEvaluator {
    /// Evaluate with default options and the stock matcher.
    #[must_use]
    pub fn new(policy: impl Into<Arc<Policy>>, service_def: impl Into<Arc<ServiceDef>>) -> Self {
        PolicyEvaluatorBuilder::new(policy, service_def).build()
    }

    /// Priority of the policy; lower values are evaluated first.
    #[must_use]
    pub fn eval_order(&self) -> i32 {
        self.breakdown.total()
    }

    #[must_use]
    pub fn breakdown(&self) -> &EvalOrderBreakdown {
        &self.breakdown
    }

    #[must_use]
    pub fn policy(&self) -> &Arc<Policy> {
        &self.policy
    }

    #[must_use]
    pub fn service_def(&self) -> &Arc<ServiceDef> {
        &self.service_def
    }

    #[must_use]
    pub fn options(&self) -> &EvaluatorOptions {
        &self.options
    }

    #[must_use]
    pub fn aggregates(&self) -> &PolicyAggregates {
        &self.aggregates
    }

    /// Custom condition count used for scoring (0 when conditions are disabled).
    #[must_use]
    pub fn custom_conditions_count(&self) -> usize {
        self.custom_conditions_count
    }

    #[must_use]
    pub fn filter(&self) -> FastRejectFilter<'_> {
        FastRejectFilter::new(&self.aggregates)
    }

    /// Can the policy grant `access_type` to the user?
    ///
    /// Returns `false` without consulting the structural matcher when neither
    /// the user nor any of their groups is covered, or the access type is never
    /// allowed by the policy. An empty access type is passed on as [`ANY_ACCESS`].
    #[must_use]
    pub fn may_allow(&self, user: &str, user_groups: &HashSet<String>, access_type: &str) -> bool {
        let access_type = if access_type.is_empty() {
            ANY_ACCESS
        } else {
            access_type
        };

        let admitted =
            !self.options.fast_reject || self.filter().admits(user, user_groups, access_type);

        let ret = admitted
            && self
                .matcher
                .is_access_allowed(&self.policy, user, user_groups, access_type);

        tracing::trace!(
            policy_id = %self.policy.id,
            user,
            ?user_groups,
            access_type,
            consulted_matcher = admitted,
            result = ret,
            "may_allow"
        );

        ret
    }

    /// Can the policy's items match the request?
    ///
    /// Same pre-check as [`may_allow`](Self::may_allow), reading the subject
    /// and access type from the request.
    #[must_use]
    pub fn may_match(&self, request: &AccessRequest) -> bool {
        let admitted = !self.options.fast_reject || self.filter().admits_request(request);

        let ret = admitted && self.matcher.is_policy_items_match(&self.policy, request);

        tracing::trace!(
            policy_id = %self.policy.id,
            user = %request.user,
            access_type = %request.access_type,
            consulted_matcher = admitted,
            result = ret,
            "may_match"
        );

        ret
    }

    /// Evaluation ordering: ascending eval order, then policy id.
    #[must_use]
    pub fn compare_eval_order(a: &Self, b: &Self) -> Ordering {
        a.eval_order()
            .cmp(&b.eval_order())
            .then_with(|| a.policy.id.cmp(&b.policy.id))
    }
}

// =============================================================================
// Tests
// =============================================================================
