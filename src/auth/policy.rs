//! Per-operation access rules for applications.
//!
//! Every application handler asks [`ApplicationOp::scope`] which rows the
//! caller may touch, so the rule for each operation is stated once here.

use entity::user;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationOp {
    List,
    Show,
    Create,
    Edit,
    Update,
    Delete,
    Disable,
    Enable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Admins see every application, everyone else only their own.
    OwnerOrAdmin,
    /// Only the owner, admins included.
    Owner,
    /// Any non-admin caller, acting on their own applications.
    NonAdmin,
}

/// Row filter an operation runs under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    OwnedBy(String),
}

impl ApplicationOp {
    pub fn access(self) -> Access {
        match self {
            ApplicationOp::List | ApplicationOp::Show => Access::OwnerOrAdmin,
            ApplicationOp::Create => Access::NonAdmin,
            ApplicationOp::Edit | ApplicationOp::Update | ApplicationOp::Delete => Access::Owner,
            ApplicationOp::Disable | ApplicationOp::Enable => Access::OwnerOrAdmin,
        }
    }

    /// Returns `None` when the caller may not perform the operation at all.
    pub fn scope(self, caller: &user::Model) -> Option<Scope> {
        match self.access() {
            Access::OwnerOrAdmin if caller.is_admin() => Some(Scope::All),
            Access::NonAdmin if caller.is_admin() => None,
            Access::OwnerOrAdmin | Access::Owner | Access::NonAdmin => {
                Some(Scope::OwnedBy(caller.id.clone()))
            }
        }
    }
}
