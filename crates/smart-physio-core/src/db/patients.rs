//! Patient database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{audit_from_row, Database, DbResult, AUDIT_COLUMNS};
use crate::models::Patient;

const PATIENT_COLUMNS: &str = r#"
    id, first_name, last_name, date_of_birth, gender, address, phone, email,
    emergency_contact, emergency_phone, medical_history, allergies,
    current_medications, branch_id, is_active"#;

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        date_of_birth: row.get(3)?,
        gender: row.get(4)?,
        address: row.get(5)?,
        phone: row.get(6)?,
        email: row.get(7)?,
        emergency_contact: row.get(8)?,
        emergency_phone: row.get(9)?,
        medical_history: row.get(10)?,
        allergies: row.get(11)?,
        current_medications: row.get(12)?,
        branch_id: row.get(13)?,
        is_active: row.get(14)?,
        audit: audit_from_row(row, 15)?,
    })
}

impl Database {
    /// Insert a new patient.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO patients ({}, {}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
                PATIENT_COLUMNS, AUDIT_COLUMNS
            ),
            params![
                patient.id,
                patient.first_name,
                patient.last_name,
                patient.date_of_birth,
                patient.gender,
                patient.address,
                patient.phone,
                patient.email,
                patient.emergency_contact,
                patient.emergency_phone,
                patient.medical_history,
                patient.allergies,
                patient.current_medications,
                patient.branch_id,
                patient.is_active,
                patient.audit.created_at,
                patient.audit.updated_at,
                patient.audit.created_by,
                patient.audit.updated_by,
            ],
        )?;
        Ok(())
    }

    /// Update an existing patient.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                first_name = ?2,
                last_name = ?3,
                date_of_birth = ?4,
                gender = ?5,
                address = ?6,
                phone = ?7,
                email = ?8,
                emergency_contact = ?9,
                emergency_phone = ?10,
                medical_history = ?11,
                allergies = ?12,
                current_medications = ?13,
                branch_id = ?14,
                is_active = ?15,
                updated_at = ?16,
                updated_by = ?17
            WHERE id = ?1
            "#,
            params![
                patient.id,
                patient.first_name,
                patient.last_name,
                patient.date_of_birth,
                patient.gender,
                patient.address,
                patient.phone,
                patient.email,
                patient.emergency_contact,
                patient.emergency_phone,
                patient.medical_history,
                patient.allergies,
                patient.current_medications,
                patient.branch_id,
                patient.is_active,
                patient.audit.updated_at,
                patient.audit.updated_by,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {}, {} FROM patients WHERE id = ?",
                    PATIENT_COLUMNS, AUDIT_COLUMNS
                ),
                [id],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List patients of a branch by name.
    pub fn list_patients_for_branch(&self, branch_id: &str) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {}, {} FROM patients WHERE branch_id = ? ORDER BY last_name, first_name",
            PATIENT_COLUMNS, AUDIT_COLUMNS
        ))?;
        let rows = stmt.query_map([branch_id], patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Count active patients of a branch.
    pub fn count_active_patients(&self, branch_id: &str) -> DbResult<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM patients WHERE branch_id = ? AND is_active = 1",
            [branch_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditContext, Branch, Gender};
    use chrono::NaiveDate;

    fn setup_db() -> (Database, Branch) {
        let db = Database::open_in_memory().unwrap();
        let branch = Branch::new("Central".into(), "1 Main St".into(), &AuditContext::system());
        db.insert_branch(&branch).unwrap();
        (db, branch)
    }

    fn make_patient(first: &str, branch: &Branch) -> Patient {
        let mut patient = Patient::new(
            first.into(),
            "Rao".into(),
            NaiveDate::from_ymd_opt(1990, 6, 15).unwrap(),
            Gender::Female,
            &AuditContext::new("user-1"),
        );
        patient.branch_id = Some(branch.id.clone());
        patient
    }

    #[test]
    fn test_insert_and_get() {
        let (db, branch) = setup_db();

        let mut patient = make_patient("Asha", &branch);
        patient.allergies = Some("Penicillin".into());
        db.insert_patient(&patient).unwrap();

        let retrieved = db.get_patient(&patient.id).unwrap().unwrap();
        assert_eq!(retrieved, patient);
        assert_eq!(retrieved.audit.created_by.as_deref(), Some("user-1"));
    }

    #[test]
    fn test_update_patient() {
        let (db, branch) = setup_db();

        let mut patient = make_patient("Asha", &branch);
        db.insert_patient(&patient).unwrap();

        patient.phone = "555-0101".into();
        patient.audit.touch(&AuditContext::new("user-2"));
        assert!(db.update_patient(&patient).unwrap());

        let retrieved = db.get_patient(&patient.id).unwrap().unwrap();
        assert_eq!(retrieved.phone, "555-0101");
        assert_eq!(retrieved.audit.created_by.as_deref(), Some("user-1"));
        assert_eq!(retrieved.audit.updated_by.as_deref(), Some("user-2"));
    }

    #[test]
    fn test_email_unique_when_present() {
        let (db, branch) = setup_db();

        let mut first = make_patient("Asha", &branch);
        first.email = Some("asha@example.test".into());
        db.insert_patient(&first).unwrap();

        let mut second = make_patient("Anil", &branch);
        second.email = Some("asha@example.test".into());
        assert!(db.insert_patient(&second).unwrap_err().is_constraint_violation());

        // Several patients without email are fine
        db.insert_patient(&make_patient("Bina", &branch)).unwrap();
        db.insert_patient(&make_patient("Chet", &branch)).unwrap();
    }

    #[test]
    fn test_count_active_patients() {
        let (db, branch) = setup_db();

        db.insert_patient(&make_patient("Asha", &branch)).unwrap();
        let mut inactive = make_patient("Anil", &branch);
        inactive.is_active = false;
        db.insert_patient(&inactive).unwrap();

        assert_eq!(db.count_active_patients(&branch.id).unwrap(), 1);
        assert_eq!(db.list_patients_for_branch(&branch.id).unwrap().len(), 2);
    }
}
