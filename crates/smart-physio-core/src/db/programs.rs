//! Treatment program database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{audit_from_row, minor, Database, DbError, DbResult, AUDIT_COLUMNS};
use crate::models::{from_minor, AuditStamp, TreatmentProgram};

impl Database {
    /// Insert a new treatment program.
    pub fn insert_program(&self, program: &TreatmentProgram) -> DbResult<()> {
        let doctor_ids_json = serde_json::to_string(&program.doctor_ids)?;
        self.conn.execute(
            r#"
            INSERT INTO treatment_programs (
                id, name, rate_per_session, default_duration_days, branch_id, doctor_ids,
                created_at, updated_at, created_by, updated_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                program.id,
                program.name,
                minor(program.rate_per_session)?,
                program.default_duration_days,
                program.branch_id,
                doctor_ids_json,
                program.audit.created_at,
                program.audit.updated_at,
                program.audit.created_by,
                program.audit.updated_by,
            ],
        )?;
        Ok(())
    }

    /// Get a treatment program by ID.
    pub fn get_program(&self, id: &str) -> DbResult<Option<TreatmentProgram>> {
        self.conn
            .query_row(
                &format!(
                    r#"
                    SELECT id, name, rate_per_session, default_duration_days, branch_id, doctor_ids, {}
                    FROM treatment_programs
                    WHERE id = ?
                    "#,
                    AUDIT_COLUMNS
                ),
                [id],
                program_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List the programs a branch offers.
    pub fn list_programs_for_branch(&self, branch_id: &str) -> DbResult<Vec<TreatmentProgram>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT id, name, rate_per_session, default_duration_days, branch_id, doctor_ids, {}
            FROM treatment_programs
            WHERE branch_id = ?
            ORDER BY name
            "#,
            AUDIT_COLUMNS
        ))?;

        let rows = stmt.query_map([branch_id], program_row)?;

        let mut programs = Vec::new();
        for row in rows {
            programs.push(row?.try_into()?);
        }
        Ok(programs)
    }
}

fn program_row(row: &Row<'_>) -> rusqlite::Result<ProgramRow> {
    Ok(ProgramRow {
        id: row.get(0)?,
        name: row.get(1)?,
        rate_per_session: row.get(2)?,
        default_duration_days: row.get(3)?,
        branch_id: row.get(4)?,
        doctor_ids: row.get(5)?,
        audit: audit_from_row(row, 6)?,
    })
}

/// Intermediate row struct for database mapping.
struct ProgramRow {
    id: String,
    name: String,
    rate_per_session: i64,
    default_duration_days: u32,
    branch_id: String,
    doctor_ids: String,
    audit: AuditStamp,
}

impl TryFrom<ProgramRow> for TreatmentProgram {
    type Error = DbError;

    fn try_from(row: ProgramRow) -> Result<Self, Self::Error> {
        let doctor_ids: Vec<String> = serde_json::from_str(&row.doctor_ids)?;

        Ok(TreatmentProgram {
            id: row.id,
            name: row.name,
            rate_per_session: from_minor(row.rate_per_session),
            default_duration_days: row.default_duration_days,
            branch_id: row.branch_id,
            doctor_ids,
            audit: row.audit,
        })
    }
}
