//! Roles and the pages each role may reach.
//!
//! `Role` is a closed enumeration; there is no role-as-string comparison
//! anywhere in the workspace, and the role -> pages table is exhaustive by
//! construction.

use serde::{Deserialize, Serialize};

/// The access level of an account.
///
/// Serialised with the capitalised variant names so existing user-store
/// files (`"role": "Administrator"`) load unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
  Investor,
  Researcher,
  Administrator,
}

/// A navigable page identifier.
///
/// `Home` is a dynamic page: it resolves to the role's own dashboard at
/// render time (see [`Page::resolve`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Page {
  Investor,
  Researcher,
  Admin,
  Home,
}

impl Role {
  /// The ordered pages reachable by this role.
  pub fn pages(self) -> &'static [Page] {
    match self {
      Role::Investor => &[Page::Investor],
      Role::Researcher => &[Page::Researcher, Page::Home],
      Role::Administrator => &[Page::Admin, Page::Home],
    }
  }

  pub fn is_administrator(self) -> bool {
    matches!(self, Role::Administrator)
  }
}

impl Page {
  /// Resolve the dynamic `Home` page to the concrete dashboard for `role`.
  /// Concrete pages resolve to themselves.
  pub fn resolve(self, role: Role) -> Page {
    match self {
      Page::Home => match role {
        Role::Administrator => Page::Admin,
        Role::Researcher => Page::Researcher,
        Role::Investor => Page::Investor,
      },
      other => other,
    }
  }
}
