//! Treatment program catalog.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::audit::{AuditContext, AuditStamp};

/// A treatment a branch offers, billed per session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreatmentProgram {
    pub id: String,
    pub name: String,
    /// Default session rate for treatments prescribed from this program
    pub rate_per_session: Decimal,
    /// Typical duration in days
    pub default_duration_days: u32,
    pub branch_id: String,
    /// Doctors who deliver this program
    pub doctor_ids: Vec<String>,
    pub audit: AuditStamp,
}

impl TreatmentProgram {
    pub fn new(
        name: String,
        rate_per_session: Decimal,
        default_duration_days: u32,
        branch_id: String,
        ctx: &AuditContext,
    ) -> Self {
        Self {
            id: super::new_id(),
            name,
            rate_per_session,
            default_duration_days,
            branch_id,
            doctor_ids: Vec::new(),
            audit: AuditStamp::new(ctx),
        }
    }
}
