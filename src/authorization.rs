//! Role-gated navigation.
//!
//! A static role → page table. The client builds its navigation from it and
//! the API checks it before running any staff endpoint.

use serde::Serialize;

use crate::models::UserRole;

/// A navigable page of the back office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Dashboard,
    Projects,
    Experts,
    Clients,
    VettingQuestions,
    InvitationLinks,
    Usage,
    RaIncentives,
    Analytics,
    Employees,
    Settings,
}

impl Page {
    pub const ALL: &'static [Page] = &[
        Page::Dashboard,
        Page::Projects,
        Page::Experts,
        Page::Clients,
        Page::VettingQuestions,
        Page::InvitationLinks,
        Page::Usage,
        Page::RaIncentives,
        Page::Analytics,
        Page::Employees,
        Page::Settings,
    ];

    /// Client route of the page.
    pub fn path(self) -> &'static str {
        match self {
            Self::Dashboard => "/",
            Self::Projects => "/projects",
            Self::Experts => "/experts",
            Self::Clients => "/clients",
            Self::VettingQuestions => "/vetting-questions",
            Self::InvitationLinks => "/invitation-links",
            Self::Usage => "/usage",
            Self::RaIncentives => "/ra-incentives",
            Self::Analytics => "/analytics",
            Self::Employees => "/employees",
            Self::Settings => "/settings",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.path() == path)
    }
}

const PM_PAGES: &[Page] = &[
    Page::Dashboard,
    Page::Projects,
    Page::Experts,
    Page::Clients,
    Page::VettingQuestions,
    Page::InvitationLinks,
    Page::Usage,
    Page::Analytics,
    Page::Settings,
];

const RA_PAGES: &[Page] = &[
    Page::Dashboard,
    Page::Projects,
    Page::Experts,
    Page::InvitationLinks,
    Page::RaIncentives,
    Page::Settings,
];

const FINANCE_PAGES: &[Page] = &[
    Page::Dashboard,
    Page::Projects,
    Page::Clients,
    Page::Usage,
    Page::RaIncentives,
    Page::Analytics,
    Page::Settings,
];

pub fn allowed_pages(role: UserRole) -> &'static [Page] {
    match role {
        UserRole::Admin => Page::ALL,
        UserRole::Pm => PM_PAGES,
        UserRole::Ra => RA_PAGES,
        UserRole::Finance => FINANCE_PAGES,
    }
}

pub fn can_access(role: UserRole, page: Page) -> bool {
    allowed_pages(role).contains(&page)
}

/// Same check keyed by client route; unknown routes are denied.
pub fn can_access_path(role: UserRole, path: &str) -> bool {
    Page::from_path(path).is_some_and(|page| can_access(role, page))
}

/// Payload of `GET /api/auth/permissions`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub role: UserRole,
    pub pages: Vec<&'static str>,
}

impl Permissions {
    pub fn for_role(role: UserRole) -> Self {
        Self {
            role,
            pages: allowed_pages(role).iter().map(|p| p.path()).collect(),
        }
    }
}
