//! Doctor profiles.

use serde::{Deserialize, Serialize};

use super::audit::{AuditContext, AuditStamp};

/// Clinical profile of a user who treats patients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorProfile {
    pub id: String,
    /// Owning user account (one profile per user)
    pub user_id: String,
    pub branch_id: String,
    pub license_number: Option<String>,
    pub phone_number: Option<String>,
    pub years_of_experience: u32,
    /// Specialization names
    pub specializations: Vec<String>,
    pub address: String,
    pub is_active: bool,
    pub audit: AuditStamp,
}

impl DoctorProfile {
    pub fn new(user_id: String, branch_id: String, ctx: &AuditContext) -> Self {
        Self {
            id: super::new_id(),
            user_id,
            branch_id,
            license_number: None,
            phone_number: None,
            years_of_experience: 0,
            specializations: Vec::new(),
            address: String::new(),
            is_active: true,
            audit: AuditStamp::new(ctx),
        }
    }
}
