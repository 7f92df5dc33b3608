//! Well-known roles.
//!
//! Names and ids must match the seed data in `20260301000001_create_roles_table.sql`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::StatusId;

pub const ROLE_CITIZEN: &str = "citizen";
pub const ROLE_EMPLOYEE: &str = "employee";
pub const ROLE_OFFICE_HEAD: &str = "office_head";

/// The three parties that interact with a complaint.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Citizen = 1,
    Employee = 2,
    OfficeHead = 3,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Citizen, Role::Employee, Role::OfficeHead];

    /// Database id in the `roles` lookup table.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Citizen => ROLE_CITIZEN,
            Role::Employee => ROLE_EMPLOYEE,
            Role::OfficeHead => ROLE_OFFICE_HEAD,
        }
    }

    pub fn from_id(id: StatusId) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.id() == id)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_CITIZEN => Ok(Role::Citizen),
            ROLE_EMPLOYEE => Ok(Role::Employee),
            ROLE_OFFICE_HEAD => Ok(Role::OfficeHead),
            other => Err(CoreError::Validation(format!("Unknown role '{other}'"))),
        }
    }
}
