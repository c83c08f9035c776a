//! Branches and the people attached to them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::audit::{AuditContext, AuditStamp};

/// A clinic location scoping patients, doctors and programs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Branch {
    pub id: String,
    /// Unique display name
    pub name: String,
    pub address: String,
    pub phone_number: String,
    pub email: String,
    pub is_active: bool,
    pub audit: AuditStamp,
}

impl Branch {
    /// Create a new active branch.
    pub fn new(name: String, address: String, ctx: &AuditContext) -> Self {
        Self {
            id: super::new_id(),
            name,
            address,
            phone_number: String::new(),
            email: String::new(),
            is_active: true,
            audit: AuditStamp::new(ctx),
        }
    }
}

/// An account that can act on the system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub full_name: String,
    /// Unrestricted access across all branches
    pub is_superuser: bool,
    pub created_at: String,
}

impl User {
    pub fn new(username: String, full_name: String) -> Self {
        Self {
            id: super::new_id(),
            username,
            full_name,
            is_superuser: false,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn superuser(username: String, full_name: String) -> Self {
        Self {
            is_superuser: true,
            ..Self::new(username, full_name)
        }
    }
}

/// Administrator of a single branch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BranchAdmin {
    pub user_id: String,
    pub branch_id: String,
    pub phone_number: String,
}

/// Non-clinical staff member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaffProfile {
    pub user_id: String,
    pub branch_id: Option<String>,
    pub position: String,
    pub joining_date: NaiveDate,
    pub is_active: bool,
}
