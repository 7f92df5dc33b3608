//! Static capability table keyed by `(Role, Action)`.
//!
//! The match in [`is_allowed`] is exhaustive over both enums, so adding a
//! role or an action does not compile until every pair has been decided.
//! Checks here never look at complaint data.

use serde::Serialize;

use crate::error::CoreError;
use crate::lifecycle::ComplaintStatus;
use crate::roles::Role;
use crate::types::DbId;

/// Everything a caller can ask the service to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Submit,
    Claim,
    RequestApproval,
    Approve,
    ReturnForRevision,
    Complete,
    ReadComplaints,
    ViewReports,
    GenerateReport,
    ReadNotifications,
    ListEmployees,
}

impl Action {
    pub const ALL: [Action; 11] = [
        Action::Submit,
        Action::Claim,
        Action::RequestApproval,
        Action::Approve,
        Action::ReturnForRevision,
        Action::Complete,
        Action::ReadComplaints,
        Action::ViewReports,
        Action::GenerateReport,
        Action::ReadNotifications,
        Action::ListEmployees,
    ];
}

/// Which complaints a role may read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadScope {
    /// Only complaints the caller filed.
    Own,
    /// Unclaimed complaints plus those assigned to the caller.
    UnassignedAndAssigned,
    /// Every complaint.
    All,
}

pub fn is_allowed(role: Role, action: Action) -> bool {
    use Action::*;
    match (role, action) {
        (Role::Citizen, Submit) => true,
        (Role::Citizen, Claim | RequestApproval | Approve | ReturnForRevision | Complete) => false,
        (Role::Citizen, ReadComplaints | ReadNotifications) => true,
        (Role::Citizen, ViewReports | GenerateReport) => false,
        (Role::Citizen, ListEmployees) => false,

        (Role::Employee, Submit) => false,
        (Role::Employee, Claim | RequestApproval | Complete) => true,
        (Role::Employee, Approve | ReturnForRevision) => false,
        (Role::Employee, ReadComplaints | ReadNotifications) => true,
        (Role::Employee, ViewReports | GenerateReport) => true,
        (Role::Employee, ListEmployees) => false,

        (Role::OfficeHead, Submit | Claim | RequestApproval | Complete) => false,
        (Role::OfficeHead, Approve | ReturnForRevision) => true,
        (Role::OfficeHead, ReadComplaints | ReadNotifications) => true,
        (Role::OfficeHead, ViewReports | GenerateReport) => true,
        (Role::OfficeHead, ListEmployees) => true,
    }
}

/// Fail with `Forbidden` unless `role` may perform `action`.
pub fn authorize(role: Role, action: Action) -> Result<(), CoreError> {
    if is_allowed(role, action) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Role '{role}' may not perform {action:?}"
        )))
    }
}

pub fn read_scope(role: Role) -> ReadScope {
    match role {
        Role::Citizen => ReadScope::Own,
        Role::Employee => ReadScope::UnassignedAndAssigned,
        Role::OfficeHead => ReadScope::All,
    }
}

/// The complaint fields read scoping looks at.
#[derive(Debug, Clone, Copy)]
pub struct ReadTarget {
    pub citizen_id: DbId,
    pub employee_id: Option<DbId>,
    pub status: ComplaintStatus,
}

/// Whether `actor_id` holding `role` may see the complaint at all.
///
/// Callers report a `false` here as not found, so a complaint outside the
/// caller's scope is indistinguishable from a missing one.
pub fn can_read(role: Role, actor_id: DbId, target: &ReadTarget) -> bool {
    match read_scope(role) {
        ReadScope::Own => target.citizen_id == actor_id,
        ReadScope::UnassignedAndAssigned => {
            target.employee_id == Some(actor_id)
                || (target.employee_id.is_none() && target.status == ComplaintStatus::Waiting)
        }
        ReadScope::All => true,
    }
}
