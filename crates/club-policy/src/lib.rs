//! # club-policy
//!
//! Capability-based authorization core for the club platform.
//!
//! Every tenant-scoped action in the platform is gated by a single decision:
//! the host builds a [`PolicyDecisionRequest`] from its session and the target
//! resource, hands it to [`evaluate_policy`] together with the actor's
//! resolved capabilities, and enforces the returned
//! [`PolicyDecisionResponse`].
//!
//! ## Key invariants
//!
//! - **Tenant isolation first**: an actor never gets past the first gate for a
//!   resource owned by another organization, whatever capabilities it holds.
//! - **Default deny**: a capability missing from the actor's list is denied.
//! - **Closed catalog**: capabilities and roles are enums; unknown capability
//!   tokens fail to parse, unknown role names are ignored by the resolver.
//! - **Pure decisions**: evaluation has no state, no I/O and no error channel.

pub mod capability;
pub mod engine;
pub mod error;
pub mod ids;
pub mod role;
pub mod session;

pub use capability::{Capability, CATALOG_VERSION};
pub use engine::{
    evaluate_policy, evaluate_policy_with_trace, EvaluationStep, EvaluationTrace,
    PolicyActor, PolicyDecisionRequest, PolicyDecisionResponse, PolicyEffect, PolicyObligations,
    PolicyReasonCode, PolicyRequestContext, PolicyResource,
};
pub use error::PolicyError;
pub use ids::{OrganizationId, RequestId, UserId};
pub use role::{resolve_capabilities, Role};
pub use session::SessionContext;
