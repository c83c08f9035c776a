//! Treatment session database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{audit_from_row, Database, DbResult, AUDIT_COLUMNS};
use crate::models::TreatmentSession;

const SESSION_COLUMNS: &str =
    "id, treatment_id, doctor_id, date, start_time, end_time, assessment_notes, status";

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<TreatmentSession> {
    Ok(TreatmentSession {
        id: row.get(0)?,
        treatment_id: row.get(1)?,
        doctor_id: row.get(2)?,
        date: row.get(3)?,
        start_time: row.get(4)?,
        end_time: row.get(5)?,
        assessment_notes: row.get(6)?,
        status: row.get(7)?,
        audit: audit_from_row(row, 8)?,
    })
}

impl Database {
    /// Insert a new session.
    pub fn insert_session(&self, session: &TreatmentSession) -> DbResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO treatment_sessions ({}, {}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                SESSION_COLUMNS, AUDIT_COLUMNS
            ),
            params![
                session.id,
                session.treatment_id,
                session.doctor_id,
                session.date,
                session.start_time,
                session.end_time,
                session.assessment_notes,
                session.status,
                session.audit.created_at,
                session.audit.updated_at,
                session.audit.created_by,
                session.audit.updated_by,
            ],
        )?;
        Ok(())
    }

    /// Update an existing session.
    pub fn update_session(&self, session: &TreatmentSession) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE treatment_sessions SET
                treatment_id = ?2,
                doctor_id = ?3,
                date = ?4,
                start_time = ?5,
                end_time = ?6,
                assessment_notes = ?7,
                status = ?8,
                updated_at = ?9,
                updated_by = ?10
            WHERE id = ?1
            "#,
            params![
                session.id,
                session.treatment_id,
                session.doctor_id,
                session.date,
                session.start_time,
                session.end_time,
                session.assessment_notes,
                session.status,
                session.audit.updated_at,
                session.audit.updated_by,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a session by ID.
    pub fn get_session(&self, id: &str) -> DbResult<Option<TreatmentSession>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {}, {} FROM treatment_sessions WHERE id = ?",
                    SESSION_COLUMNS, AUDIT_COLUMNS
                ),
                [id],
                session_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Delete a session row.
    pub fn delete_session(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM treatment_sessions WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// List sessions of a treatment in date order.
    pub fn list_sessions_for_treatment(&self, treatment_id: &str) -> DbResult<Vec<TreatmentSession>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {}, {} FROM treatment_sessions WHERE treatment_id = ? ORDER BY date, start_time",
            SESSION_COLUMNS, AUDIT_COLUMNS
        ))?;
        let rows = stmt.query_map([treatment_id], session_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Number of sessions of a treatment in completed status.
    pub fn count_completed_sessions(&self, treatment_id: &str) -> DbResult<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM treatment_sessions WHERE treatment_id = ? AND status = 'completed'",
            [treatment_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Scheduled sessions on `date` with doctors of the branch.
    pub fn count_scheduled_sessions_on(&self, branch_id: &str, date: NaiveDate) -> DbResult<u32> {
        let count: u32 = self.conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM treatment_sessions s
            JOIN doctor_profiles d ON d.id = s.doctor_id
            WHERE d.branch_id = ?1 AND s.date = ?2 AND s.status = 'scheduled'
            "#,
            params![branch_id, date],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
