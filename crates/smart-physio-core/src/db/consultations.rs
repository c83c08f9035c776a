//! Consultation database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{audit_from_row, Database, DbResult, AUDIT_COLUMNS};
use crate::models::PatientConsultation;

const CONSULTATION_COLUMNS: &str = r#"
    id, patient_id, doctor_id, consultation_type, status, date, start_time, end_time,
    notes, height_cm, weight_kg, blood_pressure, pulse, oxygen_saturation,
    chief_complaint, primary_diagnosis, secondary_diagnosis, follow_up_date"#;

fn consultation_from_row(row: &Row<'_>) -> rusqlite::Result<PatientConsultation> {
    Ok(PatientConsultation {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        consultation_type: row.get(3)?,
        status: row.get(4)?,
        date: row.get(5)?,
        start_time: row.get(6)?,
        end_time: row.get(7)?,
        notes: row.get(8)?,
        height_cm: row.get(9)?,
        weight_kg: row.get(10)?,
        blood_pressure: row.get(11)?,
        pulse: row.get(12)?,
        oxygen_saturation: row.get(13)?,
        chief_complaint: row.get(14)?,
        primary_diagnosis: row.get(15)?,
        secondary_diagnosis: row.get(16)?,
        follow_up_date: row.get(17)?,
        audit: audit_from_row(row, 18)?,
    })
}

impl Database {
    /// Insert a new consultation.
    pub fn insert_consultation(&self, c: &PatientConsultation) -> DbResult<()> {
        self.conn.execute(
            &format!(
                r#"
                INSERT INTO patient_consultations ({}, {})
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                        ?17, ?18, ?19, ?20, ?21, ?22)
                "#,
                CONSULTATION_COLUMNS, AUDIT_COLUMNS
            ),
            params![
                c.id,
                c.patient_id,
                c.doctor_id,
                c.consultation_type,
                c.status,
                c.date,
                c.start_time,
                c.end_time,
                c.notes,
                c.height_cm,
                c.weight_kg,
                c.blood_pressure,
                c.pulse,
                c.oxygen_saturation,
                c.chief_complaint,
                c.primary_diagnosis,
                c.secondary_diagnosis,
                c.follow_up_date,
                c.audit.created_at,
                c.audit.updated_at,
                c.audit.created_by,
                c.audit.updated_by,
            ],
        )?;
        Ok(())
    }

    /// Update an existing consultation.
    pub fn update_consultation(&self, c: &PatientConsultation) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patient_consultations SET
                doctor_id = ?2,
                consultation_type = ?3,
                status = ?4,
                date = ?5,
                start_time = ?6,
                end_time = ?7,
                notes = ?8,
                height_cm = ?9,
                weight_kg = ?10,
                blood_pressure = ?11,
                pulse = ?12,
                oxygen_saturation = ?13,
                chief_complaint = ?14,
                primary_diagnosis = ?15,
                secondary_diagnosis = ?16,
                follow_up_date = ?17,
                updated_at = ?18,
                updated_by = ?19
            WHERE id = ?1
            "#,
            params![
                c.id,
                c.doctor_id,
                c.consultation_type,
                c.status,
                c.date,
                c.start_time,
                c.end_time,
                c.notes,
                c.height_cm,
                c.weight_kg,
                c.blood_pressure,
                c.pulse,
                c.oxygen_saturation,
                c.chief_complaint,
                c.primary_diagnosis,
                c.secondary_diagnosis,
                c.follow_up_date,
                c.audit.updated_at,
                c.audit.updated_by,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a consultation by ID.
    pub fn get_consultation(&self, id: &str) -> DbResult<Option<PatientConsultation>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {}, {} FROM patient_consultations WHERE id = ?",
                    CONSULTATION_COLUMNS, AUDIT_COLUMNS
                ),
                [id],
                consultation_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List consultations of a patient, newest first.
    pub fn list_consultations_for_patient(
        &self,
        patient_id: &str,
    ) -> DbResult<Vec<PatientConsultation>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {}, {} FROM patient_consultations WHERE patient_id = ? ORDER BY date DESC, start_time DESC",
            CONSULTATION_COLUMNS, AUDIT_COLUMNS
        ))?;
        let rows = stmt.query_map([patient_id], consultation_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Consultations on `date` with doctors of the branch.
    pub fn count_consultations_on(&self, branch_id: &str, date: NaiveDate) -> DbResult<u32> {
        let count: u32 = self.conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM patient_consultations c
            JOIN doctor_profiles d ON d.id = c.doctor_id
            WHERE d.branch_id = ?1 AND c.date = ?2
            "#,
            params![branch_id, date],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
