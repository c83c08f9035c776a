//! Invoice database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{audit_from_row, minor, Database, DbResult, AUDIT_COLUMNS};
use crate::models::{from_minor, AuditContext, Invoice, InvoiceStatus};

const INVOICE_COLUMNS: &str = r#"
    id, invoice_number, patient_id, consultation_id, treatment_id, invoice_date,
    due_date, status, notes, total, balance"#;

fn invoice_from_row(row: &Row<'_>) -> rusqlite::Result<Invoice> {
    Ok(Invoice {
        id: row.get(0)?,
        invoice_number: row.get(1)?,
        patient_id: row.get(2)?,
        consultation_id: row.get(3)?,
        treatment_id: row.get(4)?,
        invoice_date: row.get(5)?,
        due_date: row.get(6)?,
        status: row.get(7)?,
        notes: row.get(8)?,
        total: from_minor(row.get(9)?),
        balance: from_minor(row.get(10)?),
        audit: audit_from_row(row, 11)?,
    })
}

impl Database {
    /// Insert a new invoice.
    pub fn insert_invoice(&self, invoice: &Invoice) -> DbResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO invoices ({}, {}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                INVOICE_COLUMNS, AUDIT_COLUMNS
            ),
            params![
                invoice.id,
                invoice.invoice_number,
                invoice.patient_id,
                invoice.consultation_id,
                invoice.treatment_id,
                invoice.invoice_date,
                invoice.due_date,
                invoice.status,
                invoice.notes,
                minor(invoice.total)?,
                minor(invoice.balance)?,
                invoice.audit.created_at,
                invoice.audit.updated_at,
                invoice.audit.created_by,
                invoice.audit.updated_by,
            ],
        )?;
        Ok(())
    }

    /// Get an invoice by ID.
    pub fn get_invoice(&self, id: &str) -> DbResult<Option<Invoice>> {
        self.query_invoice("id = ?1", params![id])
    }

    /// Get an invoice by its number.
    pub fn get_invoice_by_number(&self, invoice_number: &str) -> DbResult<Option<Invoice>> {
        self.query_invoice("invoice_number = ?1", params![invoice_number])
    }

    /// The invoice billing a patient's treatment, if any.
    pub fn get_treatment_invoice(
        &self,
        patient_id: &str,
        treatment_id: &str,
    ) -> DbResult<Option<Invoice>> {
        self.query_invoice(
            "patient_id = ?1 AND treatment_id = ?2",
            params![patient_id, treatment_id],
        )
    }

    /// The invoice billing a consultation, if any.
    pub fn get_consultation_invoice(&self, consultation_id: &str) -> DbResult<Option<Invoice>> {
        self.query_invoice("consultation_id = ?1", params![consultation_id])
    }

    fn query_invoice(
        &self,
        condition: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> DbResult<Option<Invoice>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {}, {} FROM invoices WHERE {}",
                    INVOICE_COLUMNS, AUDIT_COLUMNS, condition
                ),
                params,
                invoice_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List a patient's invoices, newest first.
    pub fn list_invoices_for_patient(&self, patient_id: &str) -> DbResult<Vec<Invoice>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {}, {} FROM invoices WHERE patient_id = ? ORDER BY invoice_date DESC, invoice_number DESC",
            INVOICE_COLUMNS, AUDIT_COLUMNS
        ))?;
        let rows = stmt.query_map([patient_id], invoice_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Persist a recomputed status and balance.
    pub fn update_invoice_settlement(
        &self,
        id: &str,
        status: InvoiceStatus,
        balance_minor: i64,
        ctx: &AuditContext,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE invoices SET
                status = ?2,
                balance = ?3,
                updated_at = ?4,
                updated_by = ?5
            WHERE id = ?1
            "#,
            params![id, status, balance_minor, chrono::Utc::now().to_rfc3339(), ctx.actor()],
        )?;
        Ok(rows_affected > 0)
    }

    /// Advance the invoice number sequence and return the new value.
    ///
    /// Must run inside the transaction that inserts the invoice so a rolled
    /// back insert also gives the number back.
    pub fn next_invoice_sequence(&self) -> DbResult<u64> {
        let value: i64 = self.conn.query_row(
            "UPDATE invoice_sequence SET last_value = last_value + 1 WHERE id = 1 RETURNING last_value",
            [],
            |row| row.get(0),
        )?;
        Ok(value as u64)
    }
}
