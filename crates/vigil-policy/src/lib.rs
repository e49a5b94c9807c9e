//! # vigil-policy
//!
//! Policy evaluation accelerator.
//!
//! For each access policy this crate precomputes:
//! - an **eval order**, so the most specific policies are evaluated first
//! - aggregates of the policy's users, groups and allowed access types, used
//!   by a **fast-reject filter** that skips structural matching for requests
//!   the policy cannot possibly cover
//!
//! ## Modules
//!
//! - [`aggregates`] - Union sets and flags extracted from policy items
//! - [`priority`] - Eval-order scoring
//! - [`filter`] - Fast-reject pre-check
//! - [`matcher`] - Structural matcher seam and the stock item/resource matcher
//! - [`evaluator`] - Per-policy evaluator and its builder
//! - [`registry`] - Atomically swapped, eval-ordered evaluator set
//! - [`config`] - Evaluator options and configuration loading
//! - [`observability`] - Tracing subscriber setup

pub mod aggregates;
pub mod config;
pub mod evaluator;
pub mod filter;
pub mod matcher;
pub mod observability;
pub mod priority;
pub mod registry;

pub use aggregates::PolicyAggregates;
pub use config::{ConfigError, EvaluatorOptions, LoggingConfig, VigilConfig, load_config};
pub use evaluator::{PolicyEvaluator, PolicyEvaluatorBuilder};
pub use filter::FastRejectFilter;
pub use matcher::{PolicyItemsMatcher, StructuralMatcher};
pub use priority::{EvalOrderBreakdown, compute_eval_order};
pub use registry::EvaluatorRegistry;
