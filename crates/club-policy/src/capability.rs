// capability.rs — The closed capability catalog.
//
// A capability is an atomic permission token namespaced `<domain>.<verb>`.
// The set of valid tokens is part of the deployed contract: adding one is a
// schema change that bumps CATALOG_VERSION, never something inferred at
// runtime. Referencing a capability that does not exist fails to compile;
// parsing an unknown token fails with `PolicyError::UnknownCapability`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// Revision of the capability catalog compiled into this crate.
pub const CATALOG_VERSION: &str = "2024-06";

/// A single permission token from the closed catalog.
///
/// Serializes as its dotted token (e.g. `"community.moderate"`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Capability {
    #[serde(rename = "content.read")]
    ContentRead,
    #[serde(rename = "content.write")]
    ContentWrite,
    #[serde(rename = "content.publish")]
    ContentPublish,
    #[serde(rename = "community.read")]
    CommunityRead,
    #[serde(rename = "community.post")]
    CommunityPost,
    #[serde(rename = "community.moderate")]
    CommunityModerate,
    #[serde(rename = "event.read")]
    EventRead,
    #[serde(rename = "event.register")]
    EventRegister,
    #[serde(rename = "event.manage")]
    EventManage,
    #[serde(rename = "reservation.read")]
    ReservationRead,
    #[serde(rename = "reservation.create")]
    ReservationCreate,
    #[serde(rename = "reservation.manage")]
    ReservationManage,
    #[serde(rename = "finance.read")]
    FinanceRead,
    #[serde(rename = "finance.manage")]
    FinanceManage,
    #[serde(rename = "finance.refund")]
    FinanceRefund,
    #[serde(rename = "navigation.manage")]
    NavigationManage,
    #[serde(rename = "notification.read")]
    NotificationRead,
    #[serde(rename = "notification.send")]
    NotificationSend,
    #[serde(rename = "member.manage")]
    MemberManage,
    #[serde(rename = "organization.manage")]
    OrganizationManage,
    #[serde(rename = "audit.read")]
    AuditRead,
}

impl Capability {
    /// Every capability in the catalog, in declaration order.
    pub const ALL: &'static [Capability] = &[
        Capability::ContentRead,
        Capability::ContentWrite,
        Capability::ContentPublish,
        Capability::CommunityRead,
        Capability::CommunityPost,
        Capability::CommunityModerate,
        Capability::EventRead,
        Capability::EventRegister,
        Capability::EventManage,
        Capability::ReservationRead,
        Capability::ReservationCreate,
        Capability::ReservationManage,
        Capability::FinanceRead,
        Capability::FinanceManage,
        Capability::FinanceRefund,
        Capability::NavigationManage,
        Capability::NotificationRead,
        Capability::NotificationSend,
        Capability::MemberManage,
        Capability::OrganizationManage,
        Capability::AuditRead,
    ];

    /// The dotted wire token for this capability.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ContentRead => "content.read",
            Capability::ContentWrite => "content.write",
            Capability::ContentPublish => "content.publish",
            Capability::CommunityRead => "community.read",
            Capability::CommunityPost => "community.post",
            Capability::CommunityModerate => "community.moderate",
            Capability::EventRead => "event.read",
            Capability::EventRegister => "event.register",
            Capability::EventManage => "event.manage",
            Capability::ReservationRead => "reservation.read",
            Capability::ReservationCreate => "reservation.create",
            Capability::ReservationManage => "reservation.manage",
            Capability::FinanceRead => "finance.read",
            Capability::FinanceManage => "finance.manage",
            Capability::FinanceRefund => "finance.refund",
            Capability::NavigationManage => "navigation.manage",
            Capability::NotificationRead => "notification.read",
            Capability::NotificationSend => "notification.send",
            Capability::MemberManage => "member.manage",
            Capability::OrganizationManage => "organization.manage",
            Capability::AuditRead => "audit.read",
        }
    }

    /// The namespace part of the token (`"finance"` for `finance.refund`).
    pub fn domain(&self) -> &'static str {
        let token = self.as_str();
        match token.split_once('.') {
            Some((domain, _)) => domain,
            None => token,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .iter()
            .copied()
            .find(|cap| cap.as_str() == s)
            .ok_or_else(|| PolicyError::UnknownCapability {
                token: s.to_string(),
                catalog_version: CATALOG_VERSION,
            })
    }
}
