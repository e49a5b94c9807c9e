//! # vigil-core
//!
//! In-memory model shared by the Vigil policy crates: access policies, the
//! service definitions they are written against, and the access requests they
//! are evaluated for.

pub mod constants;
pub mod error;
pub mod policy;
pub mod request;
pub mod service_def;

pub use constants::{ADMIN_ACCESS, ANY_ACCESS, GROUP_PUBLIC, MATCH_ANY, MATCH_ONE};
pub use error::{Result, VigilError};
pub use policy::{
    Policy, PolicyCondition, PolicyItem, PolicyItemAccess, PolicyResource, PolicyType,
};
pub use request::AccessRequest;
pub use service_def::{AccessTypeDef, ResourceDef, ServiceDef};
