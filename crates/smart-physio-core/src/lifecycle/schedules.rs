//! Recurring weekly slots of a treatment.

use tracing::info;

use super::{LifecycleError, LifecycleResult};
use crate::db::Database;
use crate::models::{weekday_code, AuditContext, AuditStamp, PatientWeeklySchedule};

/// Weekly schedule manager.
pub struct ScheduleBook<'a> {
    db: &'a Database,
}

impl<'a> ScheduleBook<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Add a weekly slot to a treatment; one slot per day.
    pub fn add_weekly_schedule(
        &self,
        mut schedule: PatientWeeklySchedule,
        ctx: &AuditContext,
    ) -> LifecycleResult<PatientWeeklySchedule> {
        let min_minutes = self.db.config().min_schedule_slot_minutes;
        if schedule.duration_minutes() < min_minutes {
            return Err(LifecycleError::Validation(format!(
                "Time slot must be at least {} minutes",
                min_minutes
            )));
        }

        if self.db.get_treatment(&schedule.treatment_id)?.is_none() {
            return Err(LifecycleError::NotFound(format!(
                "Treatment {}",
                schedule.treatment_id
            )));
        }

        schedule.audit = AuditStamp::new(ctx);
        self.db.insert_weekly_schedule(&schedule).map_err(|e| {
            if e.is_constraint_violation() {
                LifecycleError::Validation(format!(
                    "Treatment already has a slot on {}",
                    weekday_code(schedule.day_of_week)
                ))
            } else {
                e.into()
            }
        })?;
        info!(
            treatment_id = %schedule.treatment_id,
            day = weekday_code(schedule.day_of_week),
            actor = ?ctx.actor(),
            "Weekly slot added"
        );
        Ok(schedule)
    }

    pub fn weekly_schedule(&self, treatment_id: &str) -> LifecycleResult<Vec<PatientWeeklySchedule>> {
        Ok(self.db.list_weekly_schedules(treatment_id)?)
    }

    pub fn remove_weekly_schedule(
        &self,
        schedule_id: &str,
        ctx: &AuditContext,
    ) -> LifecycleResult<()> {
        if !self.db.delete_weekly_schedule(schedule_id)? {
            return Err(LifecycleError::NotFound(format!("Schedule {}", schedule_id)));
        }
        info!(schedule_id, actor = ?ctx.actor(), "Weekly slot removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{NewTreatment, TreatmentLifecycle};
    use crate::models::{Branch, DoctorProfile, Gender, Patient, TreatmentProgram, User};
    use chrono::{NaiveDate, NaiveTime, Weekday};
    use rust_decimal::Decimal;

    fn setup() -> (Database, String) {
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
        let program =
            TreatmentProgram::new("Back care".into(), Decimal::from(400), 14, branch.id, &ctx);
        db.insert_program(&program).unwrap();
        let treatment = TreatmentLifecycle::new(&db)
            .create_treatment(
                NewTreatment {
                    patient_id: patient.id,
                    program_id: program.id,
                    doctor_id: doctor.id,
                    total_sessions: 8,
                    session_rate: None,
                    notes: String::new(),
                },
                &ctx,
            )
            .unwrap();
        (db, treatment.id)
    }

    fn slot(treatment_id: &str, day: Weekday, minutes: u32) -> PatientWeeklySchedule {
        PatientWeeklySchedule::new(
            treatment_id.to_string(),
            day,
            NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(16 + minutes / 60, minutes % 60, 0).unwrap(),
            &AuditContext::system(),
        )
    }

    #[test]
    fn test_slot_length_enforced() {
        let (db, treatment_id) = setup();
        let book = ScheduleBook::new(&db);
        let ctx = AuditContext::new("reception");
        assert!(matches!(
            book.add_weekly_schedule(slot(&treatment_id, Weekday::Mon, 20), &ctx),
            Err(LifecycleError::Validation(_))
        ));
        assert!(book
            .add_weekly_schedule(slot(&treatment_id, Weekday::Mon, 30), &ctx)
            .is_ok());
    }

    #[test]
    fn test_one_slot_per_day() {
        let (db, treatment_id) = setup();
        let book = ScheduleBook::new(&db);
        let ctx = AuditContext::new("reception");
        book.add_weekly_schedule(slot(&treatment_id, Weekday::Tue, 45), &ctx)
            .unwrap();
        let duplicate = book.add_weekly_schedule(slot(&treatment_id, Weekday::Tue, 60), &ctx);
        match duplicate {
            Err(LifecycleError::Validation(msg)) => assert!(msg.contains("tue")),
            other => panic!("expected validation error, got {:?}", other),
        }

        let added = book
            .add_weekly_schedule(slot(&treatment_id, Weekday::Thu, 60), &ctx)
            .unwrap();
        let slots = book.weekly_schedule(&treatment_id).unwrap();
        assert_eq!(slots.len(), 2);
        assert!(slots
            .iter()
            .all(|s| s.audit.created_by.as_deref() == Some("reception")));
        book.remove_weekly_schedule(&added.id, &ctx).unwrap();
        assert!(book.remove_weekly_schedule(&added.id, &ctx).is_err());
    }

    #[test]
    fn test_unknown_treatment() {
        let (db, _) = setup();
        let book = ScheduleBook::new(&db);
        let ctx = AuditContext::new("reception");
        assert!(matches!(
            book.add_weekly_schedule(slot("missing", Weekday::Fri, 60), &ctx),
            Err(LifecycleError::NotFound(_))
        ));
    }
}
