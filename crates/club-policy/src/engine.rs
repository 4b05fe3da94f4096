// engine.rs — Policy decision function.
//
// Every tenant-scoped action passes through `evaluate_policy()`, which checks
// in strict order:
//
// 1. Do actor and resource belong to the same organization? → No → Deny
// 2. Does the actor's capability list contain the action? → No → Deny
// 3. Allow, with a mandatory audit obligation
//
// Tenant isolation runs before the capability check so that no capability
// grant, however broad, reaches across tenants. Evaluation is a pure
// function of its arguments: no state, no caching, no error channel.
//
// The capability list passed in is authoritative. The engine never
// re-derives it from `actor.roles`; callers own its freshness.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::error::PolicyError;
use crate::ids::{OrganizationId, RequestId, UserId};

/// The identity making a request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyActor {
    pub user_id: UserId,
    /// The actor's tenant.
    pub organization_id: OrganizationId,
    pub roles: Vec<String>,
}

/// The thing being acted on, including the tenant that owns it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyResource {
    /// Resource kind (e.g. "reservation", "forum_post").
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: String,
    pub organization_id: OrganizationId,
}

/// Ambient request metadata, used for audit correlation only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyRequestContext {
    pub route: String,
    pub request_id: RequestId,
    /// Hash of the client IP; raw addresses never enter the context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent_hash: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl PolicyRequestContext {
    /// Context for `route` stamped with the current time.
    pub fn new(route: impl Into<String>, request_id: RequestId) -> Self {
        Self {
            route: route.into(),
            request_id,
            ip_hash: None,
            user_agent_hash: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_ip_hash(mut self, hash: impl Into<String>) -> Self {
        self.ip_hash = Some(hash.into());
        self
    }

    pub fn with_user_agent_hash(mut self, hash: impl Into<String>) -> Self {
        self.user_agent_hash = Some(hash.into());
        self
    }
}

/// A single authorization question. Built per call, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyDecisionRequest {
    pub actor: PolicyActor,
    pub action: Capability,
    pub resource: PolicyResource,
    pub context: PolicyRequestContext,
}

/// Whether the action may proceed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PolicyEffect {
    Allow,
    Deny,
}

impl fmt::Display for PolicyEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyEffect::Allow => f.write_str("allow"),
            PolicyEffect::Deny => f.write_str("deny"),
        }
    }
}

/// Machine-readable explanation of a decision.
///
/// `DenyScopeMismatch`, `DenyBreakGlassExpired` and
/// `DenyPolicyConditionFailed` are reserved: no rule produces them yet, but
/// they are part of the response vocabulary so exhaustive matches in host
/// code stay valid when those rules land.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyReasonCode {
    AllowRoleCapability,
    DenyCapabilityMissing,
    DenyResourceTenantMismatch,
    DenyScopeMismatch,
    DenyBreakGlassExpired,
    DenyPolicyConditionFailed,
}

impl PolicyReasonCode {
    pub const ALL: &'static [PolicyReasonCode] = &[
        PolicyReasonCode::AllowRoleCapability,
        PolicyReasonCode::DenyCapabilityMissing,
        PolicyReasonCode::DenyResourceTenantMismatch,
        PolicyReasonCode::DenyScopeMismatch,
        PolicyReasonCode::DenyBreakGlassExpired,
        PolicyReasonCode::DenyPolicyConditionFailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyReasonCode::AllowRoleCapability => "ALLOW_ROLE_CAPABILITY",
            PolicyReasonCode::DenyCapabilityMissing => "DENY_CAPABILITY_MISSING",
            PolicyReasonCode::DenyResourceTenantMismatch => "DENY_RESOURCE_TENANT_MISMATCH",
            PolicyReasonCode::DenyScopeMismatch => "DENY_SCOPE_MISMATCH",
            PolicyReasonCode::DenyBreakGlassExpired => "DENY_BREAK_GLASS_EXPIRED",
            PolicyReasonCode::DenyPolicyConditionFailed => "DENY_POLICY_CONDITION_FAILED",
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, PolicyReasonCode::AllowRoleCapability)
    }

    /// True for codes declared for future rules and not produced today.
    pub fn is_reserved(&self) -> bool {
        matches!(
            self,
            PolicyReasonCode::DenyScopeMismatch
                | PolicyReasonCode::DenyBreakGlassExpired
                | PolicyReasonCode::DenyPolicyConditionFailed
        )
    }
}

impl fmt::Display for PolicyReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyReasonCode {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PolicyReasonCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| PolicyError::UnknownReasonCode(s.to_string()))
    }
}

/// Side effects the caller must perform when acting on an allow.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyObligations {
    #[serde(default)]
    pub require_audit: bool,
    /// Fields the caller must strip from the response payload.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redact_fields: Vec<String>,
    /// How long the caller may cache this decision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<u64>,
}

/// The engine's only output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyDecisionResponse {
    pub effect: PolicyEffect,
    pub reason_code: PolicyReasonCode,
    /// Present only on allow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obligations: Option<PolicyObligations>,
}

impl PolicyDecisionResponse {
    fn deny(reason_code: PolicyReasonCode) -> Self {
        Self {
            effect: PolicyEffect::Deny,
            reason_code,
            obligations: None,
        }
    }

    fn allow_audited() -> Self {
        Self {
            effect: PolicyEffect::Allow,
            reason_code: PolicyReasonCode::AllowRoleCapability,
            obligations: Some(PolicyObligations {
                require_audit: true,
                ..PolicyObligations::default()
            }),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.effect == PolicyEffect::Allow
    }

    /// Whether the caller must write an audit entry for this decision.
    pub fn requires_audit(&self) -> bool {
        self.obligations
            .as_ref()
            .is_some_and(|obligations| obligations.require_audit)
    }
}

/// One gate in the decision chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvaluationStep {
    /// Which gate ran ("tenant_isolation", "capability_check").
    pub check: String,
    pub outcome: String,
    /// Whether this gate produced the final decision.
    pub terminal: bool,
}

/// A decision together with the gates that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvaluationTrace {
    pub response: PolicyDecisionResponse,
    pub steps: Vec<EvaluationStep>,
}

/// Decide whether `request.actor` may perform `request.action` on
/// `request.resource`, given the actor's resolved capabilities.
pub fn evaluate_policy(
    request: &PolicyDecisionRequest,
    actor_capabilities: &[Capability],
) -> PolicyDecisionResponse {
    evaluate_policy_with_trace(request, actor_capabilities).response
}

/// Same decision as [`evaluate_policy`], with every gate recorded.
pub fn evaluate_policy_with_trace(
    request: &PolicyDecisionRequest,
    actor_capabilities: &[Capability],
) -> EvaluationTrace {
    let mut steps = Vec::with_capacity(2);

    // Gate 1: tenant isolation.
    if request.actor.organization_id != request.resource.organization_id {
        steps.push(EvaluationStep {
            check: "tenant_isolation".to_string(),
            outcome: format!(
                "failed: actor org '{}' does not own {} '{}'",
                request.actor.organization_id, request.resource.resource_type, request.resource.id
            ),
            terminal: true,
        });
        return finish(
            request,
            PolicyDecisionResponse::deny(PolicyReasonCode::DenyResourceTenantMismatch),
            steps,
        );
    }
    steps.push(EvaluationStep {
        check: "tenant_isolation".to_string(),
        outcome: "passed".to_string(),
        terminal: false,
    });

    // Gate 2: capability possession.
    if !actor_capabilities.contains(&request.action) {
        steps.push(EvaluationStep {
            check: "capability_check".to_string(),
            outcome: format!("failed: '{}' not held", request.action),
            terminal: true,
        });
        return finish(
            request,
            PolicyDecisionResponse::deny(PolicyReasonCode::DenyCapabilityMissing),
            steps,
        );
    }
    steps.push(EvaluationStep {
        check: "capability_check".to_string(),
        outcome: format!("passed: '{}' held", request.action),
        terminal: true,
    });

    finish(request, PolicyDecisionResponse::allow_audited(), steps)
}

fn finish(
    request: &PolicyDecisionRequest,
    response: PolicyDecisionResponse,
    steps: Vec<EvaluationStep>,
) -> EvaluationTrace {
    tracing::debug!(
        request_id = %request.context.request_id,
        user_id = %request.actor.user_id,
        action = %request.action,
        resource_type = %request.resource.resource_type,
        effect = %response.effect,
        reason = %response.reason_code,
        "policy decision"
    );
    EvaluationTrace { response, steps }
}
