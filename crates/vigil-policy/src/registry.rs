//! Published evaluators for one service.
//!
//! The registry holds evaluators sorted by eval order behind an `ArcSwap`.
//! Reads are a single atomic load. Writes build a new sorted vector and swap
//! it in, so readers holding an older snapshot keep a consistent view.
//!
//! ```
//! use vigil_core::{Policy, ServiceDef};
//! use vigil_policy::{EvaluatorRegistry, PolicyEvaluator};
//!
//! let def = ServiceDef::new("hdfs").with_access_types(["read"]);
//! let registry = EvaluatorRegistry::new();
//! registry.upsert(PolicyEvaluator::new(Policy::new("1", "p"), def));
//!
//! assert_eq!(registry.len(), 1);
//! ```

use std::sync::Arc;

use arc_swap::ArcSwap;
use vigil_core::AccessRequest;

use crate::evaluator::PolicyEvaluator;

type Snapshot = Vec<Arc<PolicyEvaluator>>;

/// Evaluators in evaluation order, swapped atomically on change.
pub struct EvaluatorRegistry {
    inner: ArcSwap<Snapshot>,
}

impl Default for EvaluatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EvaluatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluatorRegistry")
            .field("len", &self.len())
            .finish()
    }
}

impl EvaluatorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Create a registry from evaluators. Later duplicates of a policy id win.
    #[must_use]
    pub fn from_evaluators<I>(evaluators: I) -> Self
    where
        I: IntoIterator<Item = PolicyEvaluator>,
    {
        let mut snapshot: Snapshot = Vec::new();
        for evaluator in evaluators {
            snapshot.retain(|e| e.policy().id != evaluator.policy().id);
            snapshot.push(Arc::new(evaluator));
        }
        sort(&mut snapshot);

        Self {
            inner: ArcSwap::from_pointee(snapshot),
        }
    }

    /// Current evaluators, sorted ascending by eval order then policy id.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.load_full()
    }

    /// Publish an evaluator, replacing any evaluator for the same policy id.
    pub fn upsert(&self, evaluator: PolicyEvaluator) {
        let evaluator = Arc::new(evaluator);
        let policy_id = evaluator.policy().id.clone();

        self.inner.rcu(|current| {
            let mut next: Snapshot = current
                .iter()
                .filter(|e| e.policy().id != policy_id)
                .cloned()
                .collect();
            next.push(Arc::clone(&evaluator));
            sort(&mut next);
            next
        });

        tracing::debug!(
            policy_id = %policy_id,
            eval_order = evaluator.eval_order(),
            "published policy evaluator"
        );
    }

    /// Withdraw the evaluator for `policy_id`.
    pub fn remove(&self, policy_id: &str) -> Option<Arc<PolicyEvaluator>> {
        let previous = self.inner.rcu(|current| {
            current
                .iter()
                .filter(|e| e.policy().id != policy_id)
                .cloned()
                .collect::<Snapshot>()
        });

        let removed = previous
            .iter()
            .find(|e| e.policy().id == policy_id)
            .cloned();
        if removed.is_some() {
            tracing::debug!(policy_id, "withdrew policy evaluator");
        }
        removed
    }

    /// Evaluators whose policy may match the request, in evaluation order.
    ///
    /// Combining their decisions is left to the caller.
    #[must_use]
    pub fn candidates(&self, request: &AccessRequest) -> Vec<Arc<PolicyEvaluator>> {
        self.inner
            .load()
            .iter()
            .filter(|e| e.may_match(request))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.load().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.load().is_empty()
    }
}

fn sort(snapshot: &mut Snapshot) {
    snapshot.sort_by(|a, b| PolicyEvaluator::compare_eval_order(a, b));
}
