//! Invoice creation for treatments and consultations.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{error, info};

use crate::db::{Database, DbError};
use crate::models::{
    format_invoice_number, today, AppointmentStatus, AuditContext, AuditStamp, Invoice,
    InvoiceStatus, Invoiceable, PatientConsultation,
};

/// Billing errors.
#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Precondition not met: {0}")]
    Precondition(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<rusqlite::Error> for BillingError {
    fn from(e: rusqlite::Error) -> Self {
        BillingError::Database(e.into())
    }
}

pub type BillingResult<T> = Result<T, BillingError>;

/// Outcome of a best-effort invoice creation, surfaced to the caller as a
/// notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceOutcome {
    Created { invoice_number: String },
    AlreadyExists,
    Failed { reason: String },
}

/// Billing engine over the clinic store.
pub struct BillingEngine<'a> {
    pub(super) db: &'a Database,
}

impl<'a> BillingEngine<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Amount to bill for a consultation or a treatment.
    pub fn total_cost(&self, invoiceable: Invoiceable<'_>) -> Decimal {
        invoiceable.total_cost(self.db.config().consultation_fee)
    }

    /// Take the next invoice number for an invoice issued on `issue_date`.
    ///
    /// The sequence is bumped on the current connection, so calling this
    /// inside the invoice-creating transaction serializes concurrent issuers.
    pub fn generate_invoice_number(&self, issue_date: NaiveDate) -> BillingResult<String> {
        let sequence = self.db.next_invoice_sequence()?;
        Ok(format_invoice_number(
            issue_date.year(),
            sequence,
            self.db.config().invoice_number_width,
        ))
    }

    /// Make sure a billable treatment carries its invoice.
    ///
    /// Runs in its own transaction and never fails: problems are logged and
    /// reported as [`InvoiceOutcome::Failed`].
    pub fn ensure_treatment_invoice(&self, treatment_id: &str, ctx: &AuditContext) -> InvoiceOutcome {
        match self.create_treatment_invoice(treatment_id, ctx) {
            Ok(Some(invoice)) => InvoiceOutcome::Created {
                invoice_number: invoice.invoice_number,
            },
            Ok(None) => InvoiceOutcome::AlreadyExists,
            Err(e) => {
                error!(treatment_id, error = %e, "Error creating treatment invoice");
                InvoiceOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Create the invoice of a treatment unless one exists.
    ///
    /// Returns `None` when the (patient, treatment) pair is already invoiced.
    pub fn create_treatment_invoice(
        &self,
        treatment_id: &str,
        ctx: &AuditContext,
    ) -> BillingResult<Option<Invoice>> {
        let tx = self.db.immediate_transaction()?;

        let treatment = self
            .db
            .get_treatment(treatment_id)?
            .ok_or_else(|| BillingError::NotFound(format!("Treatment {}", treatment_id)))?;

        if self
            .db
            .get_treatment_invoice(&treatment.patient_id, &treatment.id)?
            .is_some()
        {
            return Ok(None);
        }

        let program = self
            .db
            .get_program(&treatment.program_id)?
            .ok_or_else(|| BillingError::NotFound(format!("Program {}", treatment.program_id)))?;

        let invoice = self.issue_invoice(
            Invoiceable::Treatment(&treatment),
            format!("Treatment program: {}", program.name),
            ctx,
        )?;

        tx.commit()?;
        info!(
            invoice_number = %invoice.invoice_number,
            treatment_id,
            total = %invoice.total,
            "Created treatment invoice"
        );
        Ok(Some(invoice))
    }

    /// Create the fixed-fee invoice of a consultation.
    ///
    /// `consultation` is the record as it was before the transition to
    /// completed; it must still be scheduled. Runs on the caller's
    /// transaction so that a failure aborts the consultation save.
    pub fn create_for_consultation(
        &self,
        consultation: &PatientConsultation,
        ctx: &AuditContext,
    ) -> BillingResult<Invoice> {
        if consultation.status != AppointmentStatus::Scheduled {
            return Err(BillingError::Precondition(
                "Can only create invoices for scheduled consultations".into(),
            ));
        }

        if self.db.get_consultation_invoice(&consultation.id)?.is_some() {
            return Err(BillingError::Precondition(
                "Invoice already exists for this consultation".into(),
            ));
        }

        let invoice = self.issue_invoice(
            Invoiceable::Consultation(consultation),
            format!("Consultation on {}", consultation.date),
            ctx,
        )?;

        info!(
            invoice_number = %invoice.invoice_number,
            consultation_id = %consultation.id,
            "Created consultation invoice"
        );
        Ok(invoice)
    }

    /// Insert a sent invoice with `total = balance = total_cost`.
    fn issue_invoice(
        &self,
        invoiceable: Invoiceable<'_>,
        notes: String,
        ctx: &AuditContext,
    ) -> BillingResult<Invoice> {
        let issue_date = today();
        let total = self.total_cost(invoiceable);
        let (consultation_id, treatment_id) = match invoiceable {
            Invoiceable::Consultation(c) => (Some(c.id.clone()), None),
            Invoiceable::Treatment(t) => (None, Some(t.id.clone())),
        };

        let invoice = Invoice {
            id: crate::models::new_id(),
            invoice_number: self.generate_invoice_number(issue_date)?,
            patient_id: invoiceable.patient_id().to_string(),
            consultation_id,
            treatment_id,
            invoice_date: issue_date,
            due_date: issue_date + self.db.config().due_period(),
            status: InvoiceStatus::Sent,
            notes,
            total,
            balance: total,
            audit: AuditStamp::new(ctx),
        };

        self.db.insert_invoice(&invoice).map_err(|e| {
            if e.is_constraint_violation() {
                BillingError::Validation(format!("Invoice could not be created: {}", e))
            } else {
                e.into()
            }
        })?;

        Ok(invoice)
    }
}
