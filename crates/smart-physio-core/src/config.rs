//! Business settings for a clinic deployment.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Clinic-wide business constants.
///
/// Every field has a default, so a partial JSON document only overrides the
/// settings it names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClinicConfig {
    /// Fixed total of a consultation invoice
    pub consultation_fee: Decimal,
    /// Days between invoice issue and due date
    pub invoice_due_days: u32,
    /// Minimum treatment session length
    pub min_session_minutes: i64,
    /// Minimum weekly schedule slot length
    pub min_schedule_slot_minutes: i64,
    /// Treatments with fewer pending sessions than this count as expiring
    pub expiring_pending_threshold: u32,
    /// Zero padding of the invoice sequence number
    pub invoice_number_width: usize,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            consultation_fee: Decimal::from(600),
            invoice_due_days: 14,
            min_session_minutes: 60,
            min_schedule_slot_minutes: 30,
            expiring_pending_threshold: 7,
            invoice_number_width: 3,
        }
    }
}

impl ClinicConfig {
    /// Parse settings from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn due_period(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.invoice_due_days))
    }
}
