//! Standalone doctor consultations.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::audit::{AuditContext, AuditStamp};
use super::session::AppointmentStatus;

/// Kind of consultation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationType {
    Initial,
    Followup,
    Emergency,
    Routine,
}

impl ConsultationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationType::Initial => "initial",
            ConsultationType::Followup => "followup",
            ConsultationType::Emergency => "emergency",
            ConsultationType::Routine => "routine",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "initial" => Some(ConsultationType::Initial),
            "followup" => Some(ConsultationType::Followup),
            "emergency" => Some(ConsultationType::Emergency),
            "routine" => Some(ConsultationType::Routine),
            _ => None,
        }
    }
}

/// A doctor visit billed at the fixed consultation fee.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientConsultation {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub consultation_type: ConsultationType,
    pub status: AppointmentStatus,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub notes: String,
    /// Height in cm
    pub height_cm: Option<f64>,
    /// Weight in kg
    pub weight_kg: Option<f64>,
    /// e.g. "120/80"
    pub blood_pressure: String,
    /// Beats per minute
    pub pulse: Option<u32>,
    /// SpO2 percentage, 0-100
    pub oxygen_saturation: Option<u32>,
    pub chief_complaint: String,
    pub primary_diagnosis: String,
    pub secondary_diagnosis: String,
    pub follow_up_date: Option<NaiveDate>,
    pub audit: AuditStamp,
}

impl PatientConsultation {
    /// Create a new scheduled consultation.
    pub fn new(
        patient_id: String,
        doctor_id: String,
        consultation_type: ConsultationType,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        ctx: &AuditContext,
    ) -> Self {
        Self {
            id: super::new_id(),
            patient_id,
            doctor_id,
            consultation_type,
            status: AppointmentStatus::Scheduled,
            date,
            start_time,
            end_time,
            notes: String::new(),
            height_cm: None,
            weight_kg: None,
            blood_pressure: String::new(),
            pulse: None,
            oxygen_saturation: None,
            chief_complaint: String::new(),
            primary_diagnosis: String::new(),
            secondary_diagnosis: String::new(),
            follow_up_date: None,
            audit: AuditStamp::new(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_consultation_is_scheduled() {
        let consultation = PatientConsultation::new(
            "patient-1".into(),
            "doctor-1".into(),
            ConsultationType::Initial,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            &AuditContext::system(),
        );
        assert_eq!(consultation.status, AppointmentStatus::Scheduled);
        assert_eq!(consultation.consultation_type.as_str(), "initial");
    }
}
