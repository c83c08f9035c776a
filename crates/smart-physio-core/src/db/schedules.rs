//! Patient weekly schedule database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{audit_from_row, invalid_code, Database, DbResult, AUDIT_COLUMNS};
use crate::models::{parse_weekday, weekday_code, PatientWeeklySchedule};

const SCHEDULE_COLUMNS: &str = "id, treatment_id, day_of_week, start_time, end_time, notes";

fn schedule_from_row(row: &Row<'_>) -> rusqlite::Result<PatientWeeklySchedule> {
    let code: String = row.get(2)?;
    Ok(PatientWeeklySchedule {
        id: row.get(0)?,
        treatment_id: row.get(1)?,
        day_of_week: parse_weekday(&code).ok_or_else(|| invalid_code(2, &code))?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        notes: row.get(5)?,
        audit: audit_from_row(row, 6)?,
    })
}

impl Database {
    /// Insert a weekly slot. Fails on a second slot for the same treatment and day.
    pub fn insert_weekly_schedule(&self, schedule: &PatientWeeklySchedule) -> DbResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO patient_weekly_schedules ({}, {}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                SCHEDULE_COLUMNS, AUDIT_COLUMNS
            ),
            params![
                schedule.id,
                schedule.treatment_id,
                weekday_code(schedule.day_of_week),
                schedule.start_time,
                schedule.end_time,
                schedule.notes,
                schedule.audit.created_at,
                schedule.audit.updated_at,
                schedule.audit.created_by,
                schedule.audit.updated_by,
            ],
        )?;
        Ok(())
    }

    pub fn get_weekly_schedule(&self, id: &str) -> DbResult<Option<PatientWeeklySchedule>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {}, {} FROM patient_weekly_schedules WHERE id = ?",
                    SCHEDULE_COLUMNS, AUDIT_COLUMNS
                ),
                [id],
                schedule_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Weekly slots of a treatment, Monday first.
    pub fn list_weekly_schedules(&self, treatment_id: &str) -> DbResult<Vec<PatientWeeklySchedule>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {}, {}
            FROM patient_weekly_schedules
            WHERE treatment_id = ?
            ORDER BY CASE day_of_week
                WHEN 'mon' THEN 1 WHEN 'tue' THEN 2 WHEN 'wed' THEN 3 WHEN 'thu' THEN 4
                WHEN 'fri' THEN 5 WHEN 'sat' THEN 6 ELSE 7
            END
            "#,
            SCHEDULE_COLUMNS, AUDIT_COLUMNS
        ))?;
        let rows = stmt.query_map([treatment_id], schedule_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn delete_weekly_schedule(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM patient_weekly_schedules WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AuditContext, Branch, DoctorProfile, Gender, Patient, PatientTreatment, TreatmentProgram,
        User,
    };
    use chrono::{NaiveDate, NaiveTime, Weekday};
    use rust_decimal::Decimal;

    fn setup_treatment() -> (Database, PatientTreatment) {
        let db = Database::open_in_memory().unwrap();
        let ctx = AuditContext::system();
        let branch = Branch::new("Central".into(), "1 Main St".into(), &ctx);
        db.insert_branch(&branch).unwrap();
        let user = User::new("doc".into(), "Doc".into());
        db.insert_user(&user).unwrap();
        let doctor = DoctorProfile::new(user.id, branch.id.clone(), &ctx);
        db.insert_doctor(&doctor).unwrap();
        let patient = Patient::new(
            "Asha".into(),
            "Rao".into(),
            NaiveDate::from_ymd_opt(1990, 6, 15).unwrap(),
            Gender::Female,
            &ctx,
        );
        db.insert_patient(&patient).unwrap();
        let program = TreatmentProgram::new("Back care".into(), Decimal::from(400), 14, branch.id, &ctx);
        db.insert_program(&program).unwrap();
        let treatment = PatientTreatment::new(
            patient.id,
            program.id,
            doctor.id,
            6,
            Decimal::from(400),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            &ctx,
        );
        db.insert_treatment(&treatment).unwrap();
        (db, treatment)
    }

    fn slot(treatment_id: &str, day: Weekday) -> PatientWeeklySchedule {
        PatientWeeklySchedule::new(
            treatment_id.to_string(),
            day,
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            &AuditContext::system(),
        )
    }

    #[test]
    fn test_schedule_ordering_and_uniqueness() {
        let (db, treatment) = setup_treatment();
        db.insert_weekly_schedule(&slot(&treatment.id, Weekday::Fri)).unwrap();
        db.insert_weekly_schedule(&slot(&treatment.id, Weekday::Mon)).unwrap();

        let days: Vec<Weekday> = db
            .list_weekly_schedules(&treatment.id)
            .unwrap()
            .into_iter()
            .map(|s| s.day_of_week)
            .collect();
        assert_eq!(days, vec![Weekday::Mon, Weekday::Fri]);

        let err = db
            .insert_weekly_schedule(&slot(&treatment.id, Weekday::Mon))
            .unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_get_and_delete() {
        let (db, treatment) = setup_treatment();
        let schedule = slot(&treatment.id, Weekday::Wed);
        db.insert_weekly_schedule(&schedule).unwrap();
        assert_eq!(db.get_weekly_schedule(&schedule.id).unwrap().unwrap(), schedule);
        assert!(db.delete_weekly_schedule(&schedule.id).unwrap());
        assert!(db.get_weekly_schedule(&schedule.id).unwrap().is_none());
    }
}
