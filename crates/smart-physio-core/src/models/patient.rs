//! Patient models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::audit::{AuditContext, AuditStamp};

/// Patient gender as recorded at registration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
            Gender::Other => "O",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "M" => Some(Gender::Male),
            "F" => Some(Gender::Female),
            "O" => Some(Gender::Other),
            _ => None,
        }
    }
}

/// A patient registered at a branch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub address: String,
    pub phone: String,
    /// Unique when present
    pub email: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub current_medications: Option<String>,
    pub branch_id: Option<String>,
    pub is_active: bool,
    pub audit: AuditStamp,
}

impl Patient {
    /// Create a new patient with required fields.
    pub fn new(
        first_name: String,
        last_name: String,
        date_of_birth: NaiveDate,
        gender: Gender,
        ctx: &AuditContext,
    ) -> Self {
        Self {
            id: super::new_id(),
            first_name,
            last_name,
            date_of_birth,
            gender,
            address: String::new(),
            phone: String::new(),
            email: None,
            emergency_contact: None,
            emergency_phone: None,
            medical_history: None,
            allergies: None,
            current_medications: None,
            branch_id: None,
            is_active: true,
            audit: AuditStamp::new(ctx),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Age in whole years on the given date.
    pub fn age_on(&self, date: NaiveDate) -> u32 {
        date.years_since(self.date_of_birth).unwrap_or(0)
    }
}
