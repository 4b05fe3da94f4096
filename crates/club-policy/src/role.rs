// role.rs — Fixed roles and the role → capability resolver.
//
// The role table is compiled constant data shared by the whole process.
// Role lists arrive from external role-assignment storage that may evolve
// faster than this crate, so the resolver ignores names it does not know
// instead of failing.
//
// Containment invariant: `member` is the baseline; reservationist,
// treasurer and webmaster add to it; org_admin holds the full tenant-scoped
// catalog; platform_admin holds nothing tenant-scoped (it acts at platform
// scope, which this crate does not model).

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::error::PolicyError;

/// One of the fixed role names a user may hold (several at once).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Member,
    Reservationist,
    Treasurer,
    Webmaster,
    OrgAdmin,
    PlatformAdmin,
}

const MEMBER: &[Capability] = &[
    Capability::ContentRead,
    Capability::CommunityRead,
    Capability::CommunityPost,
    Capability::EventRead,
    Capability::EventRegister,
    Capability::ReservationRead,
    Capability::ReservationCreate,
    Capability::NotificationRead,
];

const RESERVATIONIST: &[Capability] = &[
    Capability::ContentRead,
    Capability::CommunityRead,
    Capability::CommunityPost,
    Capability::EventRead,
    Capability::EventRegister,
    Capability::ReservationRead,
    Capability::ReservationCreate,
    Capability::NotificationRead,
    Capability::ReservationManage,
];

const TREASURER: &[Capability] = &[
    Capability::ContentRead,
    Capability::CommunityRead,
    Capability::CommunityPost,
    Capability::EventRead,
    Capability::EventRegister,
    Capability::ReservationRead,
    Capability::ReservationCreate,
    Capability::NotificationRead,
    Capability::FinanceRead,
    Capability::FinanceManage,
    Capability::FinanceRefund,
];

const WEBMASTER: &[Capability] = &[
    Capability::ContentRead,
    Capability::CommunityRead,
    Capability::CommunityPost,
    Capability::EventRead,
    Capability::EventRegister,
    Capability::ReservationRead,
    Capability::ReservationCreate,
    Capability::NotificationRead,
    Capability::ContentWrite,
    Capability::ContentPublish,
    Capability::CommunityModerate,
    Capability::NavigationManage,
];

const PLATFORM_ADMIN: &[Capability] = &[];

impl Role {
    /// Every role, in declaration order.
    pub const ALL: &'static [Role] = &[
        Role::Member,
        Role::Reservationist,
        Role::Treasurer,
        Role::Webmaster,
        Role::OrgAdmin,
        Role::PlatformAdmin,
    ];

    /// The capability set granted by this role.
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Role::Member => MEMBER,
            Role::Reservationist => RESERVATIONIST,
            Role::Treasurer => TREASURER,
            Role::Webmaster => WEBMASTER,
            Role::OrgAdmin => Capability::ALL,
            Role::PlatformAdmin => PLATFORM_ADMIN,
        }
    }

    /// The role's wire name (e.g. `"org_admin"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Reservationist => "reservationist",
            Role::Treasurer => "treasurer",
            Role::Webmaster => "webmaster",
            Role::OrgAdmin => "org_admin",
            Role::PlatformAdmin => "platform_admin",
        }
    }

    /// Lenient lookup: `None` for names outside the fixed set.
    pub fn parse(name: &str) -> Option<Role> {
        Role::ALL.iter().copied().find(|role| role.as_str() == name)
    }

    /// Whether this role grants `capability`.
    pub fn grants(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or_else(|| PolicyError::UnknownRole(s.to_string()))
    }
}

/// Resolve a list of role names into a deduplicated capability list.
///
/// Unknown names are skipped. The result lists each capability once, in
/// order of first appearance while walking `roles` in order, so the same
/// input always yields the same output.
pub fn resolve_capabilities<S: AsRef<str>>(roles: &[S]) -> Vec<Capability> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::new();

    for name in roles {
        let name = name.as_ref();
        let Some(role) = Role::parse(name) else {
            tracing::trace!(role = name, "ignoring unknown role");
            continue;
        };
        for cap in role.capabilities() {
            if seen.insert(*cap) {
                resolved.push(*cap);
            }
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(caps: &[Capability]) -> HashSet<Capability> {
        caps.iter().copied().collect()
    }

    #[test]
    fn empty_input_resolves_to_nothing() {
        let none: [&str; 0] = [];
        assert!(resolve_capabilities(&none).is_empty());
    }

    #[test]
    fn single_unknown_role_resolves_to_nothing() {
        assert!(resolve_capabilities(&["bogus"]).is_empty());
    }

    #[test]
    fn unknown_roles_are_ignored_alongside_known_ones() {
        assert_eq!(
            resolve_capabilities(&["member", "bogus"]),
            resolve_capabilities(&["member"])
        );
    }

    #[test]
    fn union_is_deduplicated() {
        let caps = resolve_capabilities(&["member", "reservationist"]);
        let content_reads = caps
            .iter()
            .filter(|c| **c == Capability::ContentRead)
            .count();
        assert_eq!(content_reads, 1);
        assert!(caps.contains(&Capability::ReservationManage));
    }

    #[test]
    fn duplicate_role_names_do_not_duplicate_capabilities() {
        assert_eq!(
            resolve_capabilities(&["treasurer", "treasurer"]),
            resolve_capabilities(&["treasurer"])
        );
    }

    #[test]
    fn multi_role_union_covers_each_constituent() {
        let caps = set(&resolve_capabilities(&["treasurer", "webmaster"]));
        assert!(caps.contains(&Capability::FinanceRefund));
        assert!(caps.contains(&Capability::ContentPublish));
        assert!(caps.is_superset(&set(TREASURER)));
        assert!(caps.is_superset(&set(WEBMASTER)));
    }

    #[test]
    fn platform_admin_has_no_tenant_capabilities() {
        assert!(resolve_capabilities(&["platform_admin"]).is_empty());
    }

    #[test]
    fn staff_roles_are_strict_supersets_of_member() {
        let member = set(MEMBER);
        for role in [Role::Reservationist, Role::Treasurer, Role::Webmaster] {
            let caps = set(role.capabilities());
            assert!(caps.is_superset(&member), "{role} dropped a member capability");
            assert!(caps.len() > member.len(), "{role} adds nothing over member");
        }
    }

    #[test]
    fn org_admin_covers_every_tenant_role() {
        let admin = set(Role::OrgAdmin.capabilities());
        for role in Role::ALL {
            if *role == Role::PlatformAdmin {
                continue;
            }
            assert!(admin.is_superset(&set(role.capabilities())), "{role}");
        }
        assert_eq!(admin, set(Capability::ALL));
    }

    #[test]
    fn union_is_monotonic() {
        for r in Role::ALL {
            let alone = set(&resolve_capabilities(&[r.as_str()]));
            for other in Role::ALL {
                let both = set(&resolve_capabilities(&[r.as_str(), other.as_str()]));
                assert!(alone.is_subset(&both), "{r} + {other}");
            }
        }
    }

    #[test]
    fn resolution_is_stable_across_calls() {
        let roles = ["webmaster", "member", "treasurer"];
        assert_eq!(resolve_capabilities(&roles), resolve_capabilities(&roles));
    }

    #[test]
    fn role_tables_have_no_duplicates() {
        for role in Role::ALL {
            let caps = role.capabilities();
            assert_eq!(set(caps).len(), caps.len(), "{role}");
        }
    }

    #[test]
    fn role_names_round_trip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), *role);
            let json = serde_json::to_string(role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
        assert_eq!(
            "admin".parse::<Role>().unwrap_err(),
            PolicyError::UnknownRole("admin".to_string())
        );
    }

    #[test]
    fn grants_checks_the_table() {
        assert!(Role::Treasurer.grants(Capability::FinanceRefund));
        assert!(!Role::Member.grants(Capability::FinanceRefund));
    }
}
