// entry.rs — Audit entry data model.
//
// One entry per audited policy decision. Entries are written once and never
// mutated or deleted by this crate; retention belongs to the concrete writer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use club_policy::{
    Capability, OrganizationId, PolicyDecisionRequest, PolicyDecisionResponse, PolicyEffect,
    PolicyReasonCode, RequestId, UserId,
};

/// Who acted. Roles are deliberately not recorded; the decision is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditActor {
    pub user_id: UserId,
    pub organization_id: OrganizationId,
}

/// What was acted on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: String,
    pub organization_id: OrganizationId,
}

/// The recorded outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditDecision {
    pub effect: PolicyEffect,
    pub reason_code: PolicyReasonCode,
}

/// A single audit entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub request_id: RequestId,
    pub actor: AuditActor,
    pub action: Capability,
    pub resource: AuditResource,
    pub decision: AuditDecision,
    /// Arbitrary host-supplied context (route, client hashes, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl AuditEntry {
    /// Build the entry for a decision, stamped with the current time.
    ///
    /// The request id comes from the request context so entries correlate
    /// with host logs.
    pub fn from_decision(request: &PolicyDecisionRequest, response: &PolicyDecisionResponse) -> Self {
        Self {
            timestamp: Utc::now(),
            request_id: request.context.request_id.clone(),
            actor: AuditActor {
                user_id: request.actor.user_id.clone(),
                organization_id: request.actor.organization_id.clone(),
            },
            action: request.action,
            resource: AuditResource {
                resource_type: request.resource.resource_type.clone(),
                id: request.resource.id.clone(),
                organization_id: request.resource.organization_id.clone(),
            },
            decision: AuditDecision {
                effect: response.effect,
                reason_code: response.reason_code,
            },
            metadata: None,
        }
    }

    /// Attach metadata and return self (builder pattern).
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Attach the request route and client hashes from the request context.
    pub fn with_context_metadata(self, request: &PolicyDecisionRequest) -> Self {
        let ctx = &request.context;
        let mut metadata = serde_json::json!({ "route": ctx.route });
        if let Some(ip_hash) = &ctx.ip_hash {
            metadata["ip_hash"] = serde_json::Value::String(ip_hash.clone());
        }
        if let Some(ua_hash) = &ctx.user_agent_hash {
            metadata["user_agent_hash"] = serde_json::Value::String(ua_hash.clone());
        }
        self.with_metadata(metadata)
    }
}
