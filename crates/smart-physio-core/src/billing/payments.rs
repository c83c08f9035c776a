//! Payment recording and invoice settlement.

use rust_decimal::Decimal;
use tracing::{info, warn};

use super::{BillingEngine, BillingError, BillingResult};
use crate::db::minor;
use crate::models::{
    fits_currency_scale, from_minor, today, AuditContext, AuditStamp, Invoice, InvoiceStatus,
    Payment, PaymentRequest,
};

impl BillingEngine<'_> {
    /// Record a payment against an invoice and settle the invoice.
    ///
    /// The invoice total is re-checked against the sum of all stored payments
    /// inside one immediate transaction, so two concurrent payments cannot
    /// jointly overshoot it.
    pub fn record_payment(
        &self,
        invoice_id: &str,
        request: PaymentRequest,
        ctx: &AuditContext,
    ) -> BillingResult<Payment> {
        if request.amount <= Decimal::ZERO {
            return Err(BillingError::Validation(
                "Payment amount must be greater than zero".into(),
            ));
        }
        if request.discount_amount < Decimal::ZERO {
            return Err(BillingError::Validation(
                "Discount amount cannot be negative".into(),
            ));
        }
        if !fits_currency_scale(request.amount) || !fits_currency_scale(request.discount_amount) {
            return Err(BillingError::Validation(
                "Payment amounts cannot have fractions of a cent".into(),
            ));
        }

        let tx = self.db.immediate_transaction()?;

        let invoice = self
            .db
            .get_invoice(invoice_id)?
            .ok_or_else(|| BillingError::NotFound(format!("Invoice {}", invoice_id)))?;

        let reference = match request.reference {
            Some(reference) => reference,
            None => self.next_payment_reference(&invoice)?,
        };
        if self.db.payment_reference_exists(&reference)? {
            return Err(BillingError::Validation(format!(
                "Payment reference already exists: {}",
                reference
            )));
        }

        let total_minor = minor(invoice.total)?;
        let prior_minor = self.db.sum_payments_minor(&invoice.id)?;
        let new_minor = minor(request.amount)? + minor(request.discount_amount)?;

        if prior_minor + new_minor > total_minor {
            let max_allowed = from_minor(total_minor - prior_minor);
            warn!(
                invoice_number = %invoice.invoice_number,
                attempted = %(request.amount + request.discount_amount),
                %max_allowed,
                "Rejected payment exceeding invoice total"
            );
            return Err(BillingError::Validation(format!(
                "Total payment amount ({}) would exceed invoice total. Maximum allowed: {}",
                request.amount + request.discount_amount,
                max_allowed
            )));
        }

        let payment = Payment {
            id: crate::models::new_id(),
            invoice_id: invoice.id.clone(),
            amount: request.amount,
            discount_amount: request.discount_amount,
            payment_date: today(),
            method: request.method,
            reference,
            notes: request.notes,
            audit: AuditStamp::new(ctx),
        };
        self.db.insert_payment(&payment).map_err(|e| {
            if e.is_constraint_violation() {
                BillingError::Validation(format!("Payment could not be recorded: {}", e))
            } else {
                e.into()
            }
        })?;

        let settled = self.settle_invoice(&invoice.id, ctx)?;
        tx.commit()?;

        info!(
            invoice_number = %settled.invoice_number,
            reference = %payment.reference,
            amount = %payment.amount,
            status = settled.status.as_str(),
            "Recorded payment"
        );
        Ok(payment)
    }

    /// First unused `PAY-<invoice number>-<n>`, counting from the number of
    /// payments already recorded.
    fn next_payment_reference(&self, invoice: &Invoice) -> BillingResult<String> {
        let mut n = self.db.count_payments(&invoice.id)? + 1;
        loop {
            let reference = format!("PAY-{}-{}", invoice.invoice_number, n);
            if !self.db.payment_reference_exists(&reference)? {
                return Ok(reference);
            }
            n += 1;
        }
    }

    /// Recompute an invoice's status and balance from its payments.
    ///
    /// Runs on the caller's transaction. Fails without writing if the stored
    /// payments exceed the invoice total.
    pub fn settle_invoice(&self, invoice_id: &str, ctx: &AuditContext) -> BillingResult<Invoice> {
        let invoice = self
            .db
            .get_invoice(invoice_id)?
            .ok_or_else(|| BillingError::NotFound(format!("Invoice {}", invoice_id)))?;

        let total_minor = minor(invoice.total)?;
        let paid_minor = self.db.sum_payments_minor(&invoice.id)?;

        let (status, balance_minor) = match settlement(total_minor, paid_minor) {
            Some(settled) => settled,
            None => {
                return Err(BillingError::Validation(format!(
                    "Payments ({}) exceed invoice total ({})",
                    from_minor(paid_minor),
                    invoice.total
                )))
            }
        };

        self.db
            .update_invoice_settlement(&invoice.id, status, balance_minor, ctx)?;

        Ok(Invoice {
            status,
            balance: from_minor(balance_minor),
            ..invoice
        })
    }
}

/// Status and remaining balance for `paid` out of `total`, in minor units.
///
/// `None` if `paid` exceeds `total`. An unpaid invoice stays `sent`.
fn settlement(total: i64, paid: i64) -> Option<(InvoiceStatus, i64)> {
    if paid > total {
        None
    } else if paid == total {
        Some((InvoiceStatus::Paid, 0))
    } else if paid > 0 {
        Some((InvoiceStatus::PartiallyPaid, total - paid))
    } else {
        Some((InvoiceStatus::Sent, total))
    }
}
