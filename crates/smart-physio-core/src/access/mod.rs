//! Role resolution and access policy.
//!
//! A principal's [`Role`] is resolved once from the store; the policy
//! functions are pure over it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{Database, DbError};
use crate::models::DoctorProfile;

/// Access errors.
#[derive(Error, Debug)]
pub enum AccessError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unknown user: {0}")]
    UnknownUser(String),
}

pub type AccessResult<T> = Result<T, AccessError>;

/// What a principal is, in order of precedence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Role {
    Superadmin,
    BranchAdmin { branch_id: String },
    Doctor { doctor_id: String, branch_id: String },
    Staff { branch_id: Option<String> },
    Other,
}

impl Role {
    /// Resolve the role of a user.
    pub fn resolve(db: &Database, user_id: &str) -> AccessResult<Role> {
        let user = db
            .get_user(user_id)?
            .ok_or_else(|| AccessError::UnknownUser(user_id.to_string()))?;

        if user.is_superuser {
            return Ok(Role::Superadmin);
        }
        if let Some(admin) = db.get_branch_admin(user_id)? {
            return Ok(Role::BranchAdmin {
                branch_id: admin.branch_id,
            });
        }
        if let Some(doctor) = db.get_doctor_by_user(user_id)? {
            return Ok(Role::Doctor {
                doctor_id: doctor.id,
                branch_id: doctor.branch_id,
            });
        }
        if let Some(staff) = db.get_staff_profile(user_id)? {
            return Ok(Role::Staff {
                branch_id: staff.branch_id,
            });
        }
        Ok(Role::Other)
    }

    /// Branch the principal is attached to, if any.
    pub fn branch_id(&self) -> Option<&str> {
        match self {
            Role::BranchAdmin { branch_id } | Role::Doctor { branch_id, .. } => Some(branch_id),
            Role::Staff { branch_id } => branch_id.as_deref(),
            Role::Superadmin | Role::Other => None,
        }
    }

    pub fn is_superadmin(&self) -> bool {
        matches!(self, Role::Superadmin)
    }

    pub fn is_branch_admin(&self) -> bool {
        matches!(self, Role::BranchAdmin { .. })
    }

    pub fn is_doctor(&self) -> bool {
        matches!(self, Role::Doctor { .. })
    }
}

// =========================================================================
// Policy
// =========================================================================

pub fn can_manage_branches(role: &Role) -> bool {
    role.is_superadmin() || role.is_branch_admin()
}

pub fn can_manage_consultations(role: &Role) -> bool {
    role.is_superadmin() || role.is_branch_admin()
}

pub fn can_record_payments(role: &Role) -> bool {
    role.is_superadmin() || role.is_branch_admin()
}

pub fn can_manage_treatments(role: &Role) -> bool {
    role.is_superadmin() || role.is_doctor()
}

/// Superadmins, and branch admins of the doctor's branch.
pub fn can_modify_doctor(role: &Role, doctor: &DoctorProfile) -> bool {
    match role {
        Role::Superadmin => true,
        Role::BranchAdmin { branch_id } => *branch_id == doctor.branch_id,
        _ => false,
    }
}

/// Superadmins, and anyone attached to the doctor's branch.
pub fn can_view_doctor(role: &Role, doctor: &DoctorProfile) -> bool {
    role.is_superadmin() || role.branch_id() == Some(doctor.branch_id.as_str())
}

/// Turn a policy decision into an error.
pub fn require(allowed: bool, action: &str) -> AccessResult<()> {
    if allowed {
        Ok(())
    } else {
        Err(AccessError::Forbidden(format!(
            "You don't have permission to {}",
            action
        )))
    }
}
