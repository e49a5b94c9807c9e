//! Eval-order scoring.
//!
//! Every policy starts at [`SCORE_DEFAULT`] and receives discounts for being
//! specific: narrow resource patterns, few subjects, broad access coverage,
//! few custom conditions, and deny semantics. Policies are evaluated in
//! ascending score order, so a larger discount means earlier evaluation.
//!
//! | Step | Discount | Cap |
//! |------|----------|-----|
//! | Resource patterns | 25 match-any, 10 `*`, 5 `?`, +5 excludes, +5 recursive | 100 |
//! | Users and groups | `\|users\| + \|groups\|`, or the cap for public | 25 |
//! | Access types | `round(25 * allowed / catalog)` | 25 |
//! | Custom conditions | `25 - 5 * count`, if positive | 25 |
//! | Deny policy | 4000 | - |

use vigil_core::{MATCH_ANY, MATCH_ONE, Policy, PolicyResource, ServiceDef};

use crate::aggregates::PolicyAggregates;

// =============================================================================
// Score Constants
// =============================================================================

pub const SCORE_DEFAULT: i32 = 10_000;
pub const SCORE_DISCOUNT_DENY_POLICY: i32 = 4_000;

pub const SCORE_MAX_DISCOUNT_RESOURCE: i32 = 100;
pub const SCORE_MAX_DISCOUNT_USERS_GROUPS: i32 = 25;
pub const SCORE_MAX_DISCOUNT_ACCESS_TYPES: i32 = 25;
pub const SCORE_MAX_DISCOUNT_CUSTOM_CONDITIONS: i32 = 25;

pub const RESOURCE_DISCOUNT_MATCH_ANY_WILDCARD: i32 = 25;
pub const RESOURCE_DISCOUNT_HAS_MATCH_ANY_WILDCARD: i32 = 10;
pub const RESOURCE_DISCOUNT_HAS_MATCH_ONE_CHARACTER_WILDCARD: i32 = 5;
pub const RESOURCE_DISCOUNT_IS_EXCLUDES: i32 = 5;
pub const RESOURCE_DISCOUNT_IS_RECURSIVE: i32 = 5;
pub const CUSTOM_CONDITION_PENALTY: i32 = 5;

// =============================================================================
// Breakdown
// =============================================================================

/// Individual discounts making up a policy's eval order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalOrderBreakdown {
    /// Resource specificity discount, already capped.
    pub resource: i32,
    pub users_groups: i32,
    pub access_types: i32,
    pub custom_conditions: i32,
    pub deny_policy: i32,
}

impl EvalOrderBreakdown {
    /// The eval order: the default score minus every discount.
    #[must_use]
    pub fn total(&self) -> i32 {
        SCORE_DEFAULT
            - self.resource
            - self.users_groups
            - self.access_types
            - self.custom_conditions
            - self.deny_policy
    }
}

// =============================================================================
// Scoring
// =============================================================================

/// Compute the eval order of a policy. Lower values are evaluated first.
///
/// The result is deterministic for a given policy and service definition and
/// may be negative.
#[must_use]
pub fn compute_eval_order(
    policy: &Policy,
    service_def: &ServiceDef,
    aggregates: &PolicyAggregates,
    custom_conditions_count: usize,
) -> i32 {
    compute_breakdown(policy, service_def, aggregates, custom_conditions_count).total()
}

/// Compute every discount step for a policy.
#[must_use]
pub fn compute_breakdown(
    policy: &Policy,
    service_def: &ServiceDef,
    aggregates: &PolicyAggregates,
    custom_conditions_count: usize,
) -> EvalOrderBreakdown {
    let breakdown = EvalOrderBreakdown {
        resource: resource_discount(policy, service_def),
        users_groups: users_groups_discount(aggregates),
        access_types: access_types_discount(
            aggregates.access_perms().len(),
            service_def.access_types.len(),
        ),
        custom_conditions: custom_conditions_discount(custom_conditions_count),
        deny_policy: if policy.is_deny() {
            SCORE_DISCOUNT_DENY_POLICY
        } else {
            0
        },
    };

    tracing::debug!(
        policy_id = %policy.id,
        policy_name = %policy.name,
        priority = breakdown.total(),
        ?breakdown,
        "computed policy eval order"
    );

    breakdown
}

/// Capped resource specificity discount.
///
/// Resource kinds without values, or unknown to the service definition, are
/// ignored. The remaining kinds are visited from the most general level up.
#[must_use]
pub fn resource_discount(policy: &Policy, service_def: &ServiceDef) -> i32 {
    let mut by_level: Vec<(i32, &PolicyResource)> = policy
        .resources
        .iter()
        .filter(|(_, resource)| !resource.values.is_empty())
        .filter_map(|(name, resource)| {
            service_def
                .resource_level(name)
                .map(|level| (level, resource))
        })
        .collect();
    by_level.sort_by_key(|(level, _)| *level);

    let discount = by_level
        .iter()
        .map(|(_, resource)| resource_kind_discount(resource))
        .fold(0_i32, i32::saturating_add);

    discount.min(SCORE_MAX_DISCOUNT_RESOURCE)
}

/// Uncapped discount contributed by one resource kind.
///
/// Only the strongest wildcard category counts. A match-any value ends the
/// scan and suppresses the excludes/recursive bonuses.
#[must_use]
pub fn resource_kind_discount(resource: &PolicyResource) -> i32 {
    let mut found_star_wildcard = false;
    let mut found_question_wildcard = false;

    for value in &resource.values {
        if value.is_empty() || value == MATCH_ANY {
            return RESOURCE_DISCOUNT_MATCH_ANY_WILDCARD;
        } else if value.contains(MATCH_ANY) {
            found_star_wildcard = true;
        } else if value.contains(MATCH_ONE) {
            found_question_wildcard = true;
        }
    }

    let mut discount = if found_star_wildcard {
        RESOURCE_DISCOUNT_HAS_MATCH_ANY_WILDCARD
    } else if found_question_wildcard {
        RESOURCE_DISCOUNT_HAS_MATCH_ONE_CHARACTER_WILDCARD
    } else {
        0
    };

    if resource.is_excludes {
        discount += RESOURCE_DISCOUNT_IS_EXCLUDES;
    }
    if resource.is_recursive {
        discount += RESOURCE_DISCOUNT_IS_RECURSIVE;
    }

    discount
}

fn users_groups_discount(aggregates: &PolicyAggregates) -> i32 {
    if aggregates.has_public_group() {
        return SCORE_MAX_DISCOUNT_USERS_GROUPS;
    }
    let subjects = aggregates.groups().len() + aggregates.users().len();
    clamp_count(subjects).min(SCORE_MAX_DISCOUNT_USERS_GROUPS)
}

/// `round(25 * allowed / catalog)`, rounding halves up.
///
/// Integer arithmetic: `floor((2 * 25 * allowed + catalog) / (2 * catalog))`.
/// An empty catalog yields no discount. Allowed types outside the catalog can
/// push the ratio above 1; the result is still held at 25.
fn access_types_discount(allowed: usize, catalog: usize) -> i32 {
    if catalog == 0 {
        return 0;
    }
    let max = SCORE_MAX_DISCOUNT_ACCESS_TYPES as usize;
    let rounded = (2 * max * allowed + catalog) / (2 * catalog);
    clamp_count(rounded).min(SCORE_MAX_DISCOUNT_ACCESS_TYPES)
}

fn custom_conditions_discount(count: usize) -> i32 {
    let penalty = clamp_count(count).saturating_mul(CUSTOM_CONDITION_PENALTY);
    SCORE_MAX_DISCOUNT_CUSTOM_CONDITIONS
        .saturating_sub(penalty)
        .max(0)
}

fn clamp_count(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}
