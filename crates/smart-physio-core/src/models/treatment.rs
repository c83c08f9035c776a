//! Patient treatment courses.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::audit::{AuditContext, AuditStamp};

/// Treatment course status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentStatus {
    /// Prescribed but not yet started
    Prescribed,
    /// Sessions are being delivered
    Ongoing,
    /// All sessions delivered
    Completed,
    Cancelled,
}

impl TreatmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TreatmentStatus::Prescribed => "prescribed",
            TreatmentStatus::Ongoing => "ongoing",
            TreatmentStatus::Completed => "completed",
            TreatmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "prescribed" => Some(TreatmentStatus::Prescribed),
            "ongoing" => Some(TreatmentStatus::Ongoing),
            "completed" => Some(TreatmentStatus::Completed),
            "cancelled" => Some(TreatmentStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether a treatment in this status should carry an invoice.
    pub fn is_billable(&self) -> bool {
        !matches!(
            self,
            TreatmentStatus::Prescribed | TreatmentStatus::Completed | TreatmentStatus::Cancelled
        )
    }
}

/// A prescribed course of a treatment program for one patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientTreatment {
    pub id: String,
    pub patient_id: String,
    pub program_id: String,
    pub doctor_id: String,
    pub start_date: NaiveDate,
    /// Set when the last session completes
    pub end_date: Option<NaiveDate>,
    /// Always at least 1
    pub total_sessions: u32,
    pub session_rate: Decimal,
    /// In `0..=total_sessions`
    pub sessions_completed: u32,
    pub status: TreatmentStatus,
    pub notes: String,
    /// At most one active treatment per (patient, program)
    pub is_active: bool,
    pub audit: AuditStamp,
}

impl PatientTreatment {
    /// Create a new ongoing treatment starting on `start_date`.
    pub fn new(
        patient_id: String,
        program_id: String,
        doctor_id: String,
        total_sessions: u32,
        session_rate: Decimal,
        start_date: NaiveDate,
        ctx: &AuditContext,
    ) -> Self {
        Self {
            id: super::new_id(),
            patient_id,
            program_id,
            doctor_id,
            start_date,
            end_date: None,
            total_sessions,
            session_rate,
            sessions_completed: 0,
            status: TreatmentStatus::Ongoing,
            notes: String::new(),
            is_active: true,
            audit: AuditStamp::new(ctx),
        }
    }

    pub fn pending_sessions(&self) -> u32 {
        self.total_sessions.saturating_sub(self.sessions_completed)
    }

    pub fn total_cost(&self) -> Decimal {
        Decimal::from(self.total_sessions) * self.session_rate
    }

    /// Value of the sessions delivered so far.
    pub fn amount_paid(&self) -> Decimal {
        Decimal::from(self.sessions_completed) * self.session_rate
    }

    /// Value of the sessions still to be delivered.
    pub fn balance_due(&self) -> Decimal {
        Decimal::from(self.pending_sessions()) * self.session_rate
    }

    pub fn is_fully_completed(&self) -> bool {
        self.sessions_completed >= self.total_sessions
    }
}
