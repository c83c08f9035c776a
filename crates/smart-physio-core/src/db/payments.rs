//! Payment database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{audit_from_row, minor, Database, DbResult, AUDIT_COLUMNS};
use crate::models::{from_minor, Payment};

const PAYMENT_COLUMNS: &str =
    "id, invoice_id, amount, discount_amount, payment_date, method, reference, notes";

fn payment_from_row(row: &Row<'_>) -> rusqlite::Result<Payment> {
    Ok(Payment {
        id: row.get(0)?,
        invoice_id: row.get(1)?,
        amount: from_minor(row.get(2)?),
        discount_amount: from_minor(row.get(3)?),
        payment_date: row.get(4)?,
        method: row.get(5)?,
        reference: row.get(6)?,
        notes: row.get(7)?,
        audit: audit_from_row(row, 8)?,
    })
}

impl Database {
    /// Insert a new payment.
    pub fn insert_payment(&self, payment: &Payment) -> DbResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO payments ({}, {}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                PAYMENT_COLUMNS, AUDIT_COLUMNS
            ),
            params![
                payment.id,
                payment.invoice_id,
                minor(payment.amount)?,
                minor(payment.discount_amount)?,
                payment.payment_date,
                payment.method,
                payment.reference,
                payment.notes,
                payment.audit.created_at,
                payment.audit.updated_at,
                payment.audit.created_by,
                payment.audit.updated_by,
            ],
        )?;
        Ok(())
    }

    pub fn get_payment(&self, id: &str) -> DbResult<Option<Payment>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {}, {} FROM payments WHERE id = ?",
                    PAYMENT_COLUMNS, AUDIT_COLUMNS
                ),
                [id],
                payment_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Payments of an invoice in the order they were recorded.
    pub fn list_payments_for_invoice(&self, invoice_id: &str) -> DbResult<Vec<Payment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {}, {} FROM payments WHERE invoice_id = ? ORDER BY created_at, rowid",
            PAYMENT_COLUMNS, AUDIT_COLUMNS
        ))?;
        let rows = stmt.query_map([invoice_id], payment_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Sum of `amount + discount_amount` over an invoice's payments, in minor units.
    pub fn sum_payments_minor(&self, invoice_id: &str) -> DbResult<i64> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(amount + discount_amount), 0) FROM payments WHERE invoice_id = ?",
            [invoice_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    pub fn count_payments(&self, invoice_id: &str) -> DbResult<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM payments WHERE invoice_id = ?",
            [invoice_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn payment_reference_exists(&self, reference: &str) -> DbResult<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM payments WHERE reference = ?)",
            [reference],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}
