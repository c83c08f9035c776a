//! Patient treatment database operations.
//!
//! `sessions_completed` is only ever changed through relative updates
//! ([`Database::increment_sessions_completed`] /
//! [`Database::decrement_sessions_completed`]); `update_treatment` leaves it alone.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{audit_from_row, minor, Database, DbResult, AUDIT_COLUMNS};
use crate::models::{from_minor, AuditContext, PatientTreatment};

const TREATMENT_COLUMNS: &str = r#"
    id, patient_id, program_id, doctor_id, start_date, end_date, total_sessions,
    session_rate, sessions_completed, status, notes, is_active"#;

fn treatment_from_row(row: &Row<'_>) -> rusqlite::Result<PatientTreatment> {
    Ok(PatientTreatment {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        program_id: row.get(2)?,
        doctor_id: row.get(3)?,
        start_date: row.get(4)?,
        end_date: row.get(5)?,
        total_sessions: row.get(6)?,
        session_rate: from_minor(row.get(7)?),
        sessions_completed: row.get(8)?,
        status: row.get(9)?,
        notes: row.get(10)?,
        is_active: row.get(11)?,
        audit: audit_from_row(row, 12)?,
    })
}

impl Database {
    /// Insert a new treatment.
    pub fn insert_treatment(&self, treatment: &PatientTreatment) -> DbResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO patient_treatments ({}, {}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                TREATMENT_COLUMNS, AUDIT_COLUMNS
            ),
            params![
                treatment.id,
                treatment.patient_id,
                treatment.program_id,
                treatment.doctor_id,
                treatment.start_date,
                treatment.end_date,
                treatment.total_sessions,
                minor(treatment.session_rate)?,
                treatment.sessions_completed,
                treatment.status,
                treatment.notes,
                treatment.is_active,
                treatment.audit.created_at,
                treatment.audit.updated_at,
                treatment.audit.created_by,
                treatment.audit.updated_by,
            ],
        )?;
        Ok(())
    }

    /// Update the editable fields of a treatment.
    pub fn update_treatment(&self, treatment: &PatientTreatment) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patient_treatments SET
                program_id = ?2,
                doctor_id = ?3,
                end_date = ?4,
                total_sessions = ?5,
                session_rate = ?6,
                status = ?7,
                notes = ?8,
                is_active = ?9,
                updated_at = ?10,
                updated_by = ?11
            WHERE id = ?1
            "#,
            params![
                treatment.id,
                treatment.program_id,
                treatment.doctor_id,
                treatment.end_date,
                treatment.total_sessions,
                minor(treatment.session_rate)?,
                treatment.status,
                treatment.notes,
                treatment.is_active,
                treatment.audit.updated_at,
                treatment.audit.updated_by,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a treatment by ID.
    pub fn get_treatment(&self, id: &str) -> DbResult<Option<PatientTreatment>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {}, {} FROM patient_treatments WHERE id = ?",
                    TREATMENT_COLUMNS, AUDIT_COLUMNS
                ),
                [id],
                treatment_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List treatments of a patient, newest first.
    pub fn list_treatments_for_patient(&self, patient_id: &str) -> DbResult<Vec<PatientTreatment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {}, {} FROM patient_treatments WHERE patient_id = ? ORDER BY start_date DESC, created_at DESC",
            TREATMENT_COLUMNS, AUDIT_COLUMNS
        ))?;
        let rows = stmt.query_map([patient_id], treatment_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Active ongoing treatments of a branch with fewer than `threshold` sessions left.
    pub fn list_expiring_treatments(
        &self,
        branch_id: &str,
        threshold: u32,
    ) -> DbResult<Vec<PatientTreatment>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {}, {}
            FROM patient_treatments
            WHERE patient_id IN (SELECT id FROM patients WHERE branch_id = ?1)
              AND status = 'ongoing'
              AND is_active = 1
              AND total_sessions - sessions_completed < ?2
            ORDER BY total_sessions - sessions_completed, start_date
            "#,
            TREATMENT_COLUMNS, AUDIT_COLUMNS
        ))?;
        let rows = stmt.query_map(params![branch_id, threshold], treatment_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Count one more completed session as a single relative update.
    ///
    /// When the count reaches `total_sessions` the treatment becomes
    /// `completed` with `end_date = today` in the same statement. Returns
    /// `false` (and changes nothing) if every session was already completed
    /// or the treatment does not exist.
    pub fn increment_sessions_completed(
        &self,
        id: &str,
        today: NaiveDate,
        ctx: &AuditContext,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patient_treatments SET
                sessions_completed = sessions_completed + 1,
                status = CASE
                    WHEN sessions_completed + 1 >= total_sessions THEN 'completed'
                    ELSE status
                END,
                end_date = CASE
                    WHEN sessions_completed + 1 >= total_sessions THEN ?2
                    ELSE end_date
                END,
                updated_at = ?3,
                updated_by = ?4
            WHERE id = ?1 AND sessions_completed < total_sessions
            "#,
            params![id, today, chrono::Utc::now().to_rfc3339(), ctx.actor()],
        )?;
        Ok(rows_affected > 0)
    }

    /// Count one fewer completed session as a single relative update.
    ///
    /// A `completed` treatment reverts to `ongoing` and loses its end date.
    /// Returns `false` (and changes nothing) if the count is already zero or
    /// the treatment does not exist.
    pub fn decrement_sessions_completed(&self, id: &str, ctx: &AuditContext) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patient_treatments SET
                sessions_completed = sessions_completed - 1,
                status = CASE WHEN status = 'completed' THEN 'ongoing' ELSE status END,
                end_date = CASE WHEN status = 'completed' THEN NULL ELSE end_date END,
                updated_at = ?2,
                updated_by = ?3
            WHERE id = ?1 AND sessions_completed > 0
            "#,
            params![id, chrono::Utc::now().to_rfc3339(), ctx.actor()],
        )?;
        Ok(rows_affected > 0)
    }
}
