//! Treatment sessions.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::audit::{AuditContext, AuditStamp};
use super::schedule::minutes_between;

/// Status shared by sessions and consultations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(AppointmentStatus::Scheduled),
            "completed" => Some(AppointmentStatus::Completed),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            "no_show" => Some(AppointmentStatus::NoShow),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, AppointmentStatus::Completed)
    }
}

/// One occurrence of a treatment (or a standalone session with a doctor).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreatmentSession {
    pub id: String,
    pub treatment_id: Option<String>,
    pub doctor_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub assessment_notes: String,
    pub status: AppointmentStatus,
    pub audit: AuditStamp,
}

impl TreatmentSession {
    /// Create a new scheduled session.
    pub fn new(
        treatment_id: Option<String>,
        doctor_id: String,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        ctx: &AuditContext,
    ) -> Self {
        Self {
            id: super::new_id(),
            treatment_id,
            doctor_id,
            date,
            start_time,
            end_time,
            assessment_notes: String::new(),
            status: AppointmentStatus::Scheduled,
            audit: AuditStamp::new(ctx),
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        minutes_between(self.start_time, self.end_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration() {
        let session = TreatmentSession::new(
            None,
            "doctor-1".into(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(10, 15, 0).unwrap(),
            &AuditContext::system(),
        );
        assert_eq!(session.duration_minutes(), 75);
        assert_eq!(session.status, AppointmentStatus::Scheduled);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppointmentStatus::NoShow.as_str(), "no_show");
        assert_eq!(AppointmentStatus::parse("no_show"), Some(AppointmentStatus::NoShow));
        assert_eq!(AppointmentStatus::parse("ongoing"), None);
    }
}
