//! Invoices.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::audit::AuditStamp;
use super::consultation::PatientConsultation;
use super::treatment::PatientTreatment;

/// Invoice status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    PartiallyPaid,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::PartiallyPaid => "partially_paid",
            InvoiceStatus::Overdue => "overdue",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(InvoiceStatus::Draft),
            "sent" => Some(InvoiceStatus::Sent),
            "paid" => Some(InvoiceStatus::Paid),
            "partially_paid" => Some(InvoiceStatus::PartiallyPaid),
            "overdue" => Some(InvoiceStatus::Overdue),
            _ => None,
        }
    }
}

/// What an invoice bills for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceType {
    Consultation,
    Treatment,
}

/// A billing record for one consultation or one treatment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    pub id: String,
    /// `INV-<year>-<sequence>`, globally unique
    pub invoice_number: String,
    pub patient_id: String,
    pub consultation_id: Option<String>,
    pub treatment_id: Option<String>,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub notes: String,
    pub total: Decimal,
    /// Remaining amount after payments and discounts
    pub balance: Decimal,
    pub audit: AuditStamp,
}

impl Invoice {
    pub fn invoice_type(&self) -> InvoiceType {
        if self.consultation_id.is_some() {
            InvoiceType::Consultation
        } else {
            InvoiceType::Treatment
        }
    }

    /// Amount settled so far (payments plus discounts).
    pub fn amount_paid(&self) -> Decimal {
        self.total - self.balance
    }
}

/// A record that can be billed.
#[derive(Debug, Clone, Copy)]
pub enum Invoiceable<'a> {
    Consultation(&'a PatientConsultation),
    Treatment(&'a PatientTreatment),
}

impl Invoiceable<'_> {
    /// Amount to bill: the flat fee for a consultation, the full course cost
    /// for a treatment.
    pub fn total_cost(&self, consultation_fee: Decimal) -> Decimal {
        match self {
            Invoiceable::Consultation(_) => consultation_fee,
            Invoiceable::Treatment(treatment) => treatment.total_cost(),
        }
    }

    pub fn patient_id(&self) -> &str {
        match self {
            Invoiceable::Consultation(consultation) => &consultation.patient_id,
            Invoiceable::Treatment(treatment) => &treatment.patient_id,
        }
    }
}

/// Format an invoice number, e.g. `INV-2024-007`.
pub fn format_invoice_number(year: i32, sequence: u64, width: usize) -> String {
    format!("INV-{}-{:0width$}", year, sequence, width = width)
}
