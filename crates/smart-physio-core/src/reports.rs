//! Branch and doctor dashboard statistics.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::{AppointmentCounts, Database, DbResult};
use crate::models::PatientTreatment;

/// Counts shown on a branch dashboard for one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub date: NaiveDate,
    /// Ongoing active treatments close to their last session
    pub expiring_treatments: Vec<PatientTreatment>,
    pub active_patients: u32,
    pub consultations_today: u32,
    /// Scheduled treatment sessions on `date`
    pub sessions_today: u32,
}

impl DashboardStats {
    pub fn for_branch(db: &Database, branch_id: &str, date: NaiveDate) -> DbResult<Self> {
        Ok(Self {
            date,
            expiring_treatments: db
                .list_expiring_treatments(branch_id, db.config().expiring_pending_threshold)?,
            active_patients: db.count_active_patients(branch_id)?,
            consultations_today: db.count_consultations_on(branch_id, date)?,
            sessions_today: db.count_scheduled_sessions_on(branch_id, date)?,
        })
    }
}

/// A doctor's own workload on one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorDashboardStats {
    pub date: NaiveDate,
    pub doctor_id: String,
    pub sessions: AppointmentCounts,
    pub consultations: AppointmentCounts,
    /// Patients with at least one treatment prescribed by this doctor
    pub assigned_patients: u32,
}

impl DoctorDashboardStats {
    pub fn for_doctor(db: &Database, doctor_id: &str, date: NaiveDate) -> DbResult<Self> {
        Ok(Self {
            date,
            doctor_id: doctor_id.to_string(),
            sessions: db.doctor_session_counts(doctor_id, date)?,
            consultations: db.doctor_consultation_counts(doctor_id, date)?,
            assigned_patients: db.count_assigned_patients(doctor_id)?,
        })
    }
}
