//! Role-based access decisions.
//!
//! The principal comes from the session layer; these functions decide what a
//! principal may do with a given child profile. Ownership resolution (which
//! child a parent owns, which profile a child login maps to) goes through the
//! store so a parent probing a foreign child gets a not-found, never data.

use serde::{Deserialize, Serialize};

use crate::entities::children;
use crate::entities::users::Role;

/// The authenticated identity attached to a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: i32,
    pub role: Role,
    pub username: String,
}

impl Principal {
    #[must_use]
    pub const fn is_parent(&self) -> bool {
        matches!(self.role, Role::Parent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
}

/// Whether `principal` may perform `op` on `child`.
///
/// Parents read and write their own children; child logins read only their
/// own profile. Everything else is denied.
#[must_use]
pub fn permits(principal: &Principal, child: &children::Model, op: Operation) -> bool {
    match principal.role {
        Role::Parent => child.parent_id == principal.id,
        Role::Child => op == Operation::Read && child.user_id == Some(principal.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child(parent_id: i32, user_id: Option<i32>) -> children::Model {
        children::Model {
            id: 1,
            name: "Alex".to_string(),
            username: "alex".to_string(),
            daily_allowance: 180,
            current_time: 120,
            last_reset: "2026-08-01T00:00:00+00:00".to_string(),
            parent_id,
            user_id,
            created_at: "2026-08-01T00:00:00+00:00".to_string(),
        }
    }

    fn principal(id: i32, role: Role) -> Principal {
        Principal {
            id,
            role,
            username: "p".to_string(),
        }
    }

    #[test]
    fn parent_reads_and_writes_own_child() {
        let p = principal(7, Role::Parent);
        let c = child(7, None);
        assert!(permits(&p, &c, Operation::Read));
        assert!(permits(&p, &c, Operation::Write));
    }

    #[test]
    fn parent_denied_on_foreign_child() {
        let p = principal(7, Role::Parent);
        let c = child(8, None);
        assert!(!permits(&p, &c, Operation::Read));
        assert!(!permits(&p, &c, Operation::Write));
    }

    #[test]
    fn child_reads_own_profile_only() {
        let p = principal(42, Role::Child);
        assert!(permits(&p, &child(7, Some(42)), Operation::Read));
        assert!(!permits(&p, &child(7, Some(42)), Operation::Write));
        assert!(!permits(&p, &child(7, Some(43)), Operation::Read));
        assert!(!permits(&p, &child(7, None), Operation::Read));
    }
}
