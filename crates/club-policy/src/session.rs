// session.rs — The resolved principal handed over by the host.
//
// Session management lives in the host application. By the time a request
// reaches the policy layer the session has been turned into this read-only
// shape, with capabilities already resolved from roles.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::engine::PolicyActor;
use crate::ids::{OrganizationId, UserId};
use crate::role::resolve_capabilities;

/// A ready-to-use principal for policy evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: UserId,
    pub organization_id: OrganizationId,
    pub roles: Vec<String>,
    /// Resolved when the session was built. Treated as authoritative.
    pub capabilities: Vec<Capability>,
}

impl SessionContext {
    /// Build a session, resolving `roles` into capabilities now.
    pub fn from_roles(
        user_id: impl Into<UserId>,
        organization_id: impl Into<OrganizationId>,
        roles: Vec<String>,
    ) -> Self {
        let capabilities = resolve_capabilities(&roles);
        Self {
            user_id: user_id.into(),
            organization_id: organization_id.into(),
            roles,
            capabilities,
        }
    }

    /// The actor half of a policy request.
    pub fn actor(&self) -> PolicyActor {
        PolicyActor {
            user_id: self.user_id.clone(),
            organization_id: self.organization_id.clone(),
            roles: self.roles.clone(),
        }
    }

    /// Whether the stored capabilities still match what the roles resolve to.
    ///
    /// Stale sessions (e.g. after a role change) should be re-resolved by the
    /// host; the engine will not do it.
    pub fn is_fresh(&self) -> bool {
        let stored: HashSet<Capability> = self.capabilities.iter().copied().collect();
        let current: HashSet<Capability> = resolve_capabilities(&self.roles).into_iter().collect();
        stored == current
    }

    /// Re-resolve capabilities from the current roles.
    pub fn refresh(&mut self) {
        self.capabilities = resolve_capabilities(&self.roles);
    }
}
