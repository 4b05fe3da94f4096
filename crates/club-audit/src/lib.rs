//! # club-audit
//!
//! Audit trail for club policy decisions.
//!
//! When a [`PolicyDecisionResponse`](club_policy::PolicyDecisionResponse)
//! carries the `require_audit` obligation, the host turns the decision into an
//! [`AuditEntry`] and hands it to an [`AuditWriter`]. The policy core only
//! knows the trait; the concrete writer is injected by the host.
//!
//! Two writers ship with the crate:
//!
//! - [`InMemoryAuditWriter`] — ordered, mutex-guarded list for tests and dev.
//! - [`JsonlAuditWriter`] — append-only JSONL file where each record carries
//!   the SHA-256 of the previous line, so tampering is detectable.
//!
//! ## Quick Example
//!
//! ```rust
//! use club_audit::{record_decision, InMemoryAuditWriter};
//! use club_policy::{
//!     evaluate_policy, Capability, OrganizationId, PolicyDecisionRequest,
//!     PolicyRequestContext, PolicyResource, RequestId, SessionContext,
//! };
//!
//! let session = SessionContext::from_roles("user-1", "org-1", vec!["member".into()]);
//! let request = PolicyDecisionRequest {
//!     actor: session.actor(),
//!     action: Capability::ReservationRead,
//!     resource: PolicyResource {
//!         resource_type: "reservation".to_string(),
//!         id: "res-1".to_string(),
//!         organization_id: OrganizationId::new("org-1"),
//!     },
//!     context: PolicyRequestContext::new("/portal/reservations/res-1", RequestId::generate()),
//! };
//!
//! let writer = InMemoryAuditWriter::new();
//! let response = evaluate_policy(&request, &session.capabilities);
//! assert!(record_decision(&writer, &request, &response).unwrap());
//! assert_eq!(writer.len(), 1);
//! ```

pub mod config;
pub mod entry;
pub mod error;
pub mod hasher;
pub mod jsonl;
pub mod writer;

pub use config::{AuditConfig, AuditSink};
pub use entry::{AuditActor, AuditDecision, AuditEntry, AuditResource};
pub use error::AuditError;
pub use jsonl::{AuditRecord, JsonlAuditWriter};
pub use writer::{record_decision, AuditWriter, InMemoryAuditWriter};
