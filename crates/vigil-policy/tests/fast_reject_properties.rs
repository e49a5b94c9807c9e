//! Property-based tests for the fast-reject filter.
//!
//! Whenever the structural matcher accepts a request, the evaluator (filter
//! first, matcher second) must accept it as well.

use std::collections::HashSet;

use proptest::prelude::*;
use vigil_core::{
    ADMIN_ACCESS, ANY_ACCESS, AccessRequest, Policy, PolicyItem, PolicyItemAccess, PolicyResource,
    PolicyType, ServiceDef,
};
use vigil_policy::{PolicyEvaluator, PolicyItemsMatcher, StructuralMatcher};

const USERS: &[&str] = &["alice", "bob", "carol", "dave"];
const GROUPS: &[&str] = &["etl", "analysts", "admins", "public", "Public"];
const ACCESS_TYPES: &[&str] = &["read", "write", "execute", ADMIN_ACCESS];
const REQUESTED: &[&str] = &["", ANY_ACCESS, ADMIN_ACCESS, "read", "write", "execute", "append"];
const POLICY_PATHS: &[&str] = &["/data/*", "/data/?", "/tmp", "", "*"];
const REQUEST_PATHS: &[&str] = &["/data/x", "/tmp", "/etc"];

fn service_def() -> ServiceDef {
    ServiceDef::new("hdfs")
        .with_resource("path", 10)
        .with_access_types(["read", "write", "execute"])
}

fn arb_names(pool: &'static [&'static str]) -> impl Strategy<Value = Vec<String>> {
    proptest::sample::subsequence(pool, 0..=pool.len())
        .prop_map(|names| names.into_iter().map(String::from).collect())
}

fn arb_access() -> impl Strategy<Value = PolicyItemAccess> {
    (proptest::sample::select(ACCESS_TYPES), any::<bool>()).prop_map(|(access_type, allowed)| {
        PolicyItemAccess {
            access_type: access_type.to_string(),
            is_allowed: allowed,
        }
    })
}

fn arb_item() -> impl Strategy<Value = PolicyItem> {
    (
        proptest::collection::vec(arb_access(), 0..4),
        arb_names(USERS),
        arb_names(GROUPS),
        any::<bool>(),
    )
        .prop_map(|(accesses, users, groups, delegate_admin)| PolicyItem {
            accesses,
            users,
            groups,
            delegate_admin,
            ..Default::default()
        })
}

fn arb_policy() -> impl Strategy<Value = Policy> {
    (
        proptest::collection::vec(arb_item(), 0..4),
        any::<bool>(),
        proptest::sample::select(POLICY_PATHS),
    )
        .prop_map(|(items, deny, path)| {
            let mut policy = Policy::new("prop", "prop")
                .with_resource("path", PolicyResource::new([path]));
            policy.items = items;
            if deny {
                policy.policy_type = PolicyType::Deny;
            }
            policy
        })
}

fn arb_request() -> impl Strategy<Value = AccessRequest> {
    (
        proptest::sample::select(USERS),
        arb_names(GROUPS),
        proptest::sample::select(REQUESTED),
        proptest::sample::select(REQUEST_PATHS),
    )
        .prop_map(|(user, groups, access_type, path)| {
            AccessRequest::new(user, access_type)
                .with_groups(groups)
                .with_resource("path", path)
        })
}

proptest! {
    /// Property: the filter never rejects what the matcher would allow.
    #[test]
    fn prop_may_allow_is_sound(policy in arb_policy(), request in arb_request()) {
        let matcher = PolicyItemsMatcher::new();
        let evaluator = PolicyEvaluator::new(policy.clone(), service_def());

        if matcher.is_access_allowed(&policy, &request.user, &request.user_groups, &request.access_type) {
            prop_assert!(evaluator.may_allow(&request.user, &request.user_groups, &request.access_type));
        }
    }

    /// Property: same guarantee for request-shaped matching.
    #[test]
    fn prop_may_match_is_sound(policy in arb_policy(), request in arb_request()) {
        let matcher = PolicyItemsMatcher::new();
        let evaluator = PolicyEvaluator::new(policy.clone(), service_def());

        prop_assert_eq!(
            evaluator.may_match(&request),
            matcher.is_policy_items_match(&policy, &request)
        );
    }

    /// Property: eval order is a pure function of the policy.
    #[test]
    fn prop_eval_order_is_deterministic(policy in arb_policy()) {
        let first = PolicyEvaluator::new(policy.clone(), service_def()).eval_order();
        let second = PolicyEvaluator::new(policy, service_def()).eval_order();
        prop_assert_eq!(first, second);
    }

    /// Property: capped discounts stay within their caps.
    #[test]
    fn prop_discounts_are_capped(policy in arb_policy()) {
        let evaluator = PolicyEvaluator::new(policy, service_def());
        let breakdown = evaluator.breakdown();
        prop_assert!((0..=25).contains(&breakdown.users_groups));
        prop_assert!((0..=100).contains(&breakdown.resource));
        prop_assert!((0..=25).contains(&breakdown.access_types));
    }
}

#[test]
fn unknown_subject_is_rejected_for_any_access() {
    let policy = Policy::new("bob", "bob").with_item(PolicyItem {
        accesses: vec![PolicyItemAccess::allowed("read")],
        users: vec!["bob".into()],
        ..Default::default()
    });
    let evaluator = PolicyEvaluator::new(policy, service_def());

    assert!(!evaluator.may_allow("alice", &HashSet::new(), ""));
    assert!(!evaluator.may_allow("alice", &HashSet::new(), ANY_ACCESS));
}
