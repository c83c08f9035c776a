//! Session lifecycle integration tests.
//!
//! Exercise the completed-session counter through session saves, edits and
//! deletes, and the treatment status transitions it drives.

use chrono::{Duration, NaiveTime};
use proptest::prelude::*;
use rust_decimal::Decimal;

use smart_physio_core::db::Database;
use smart_physio_core::lifecycle::{LifecycleError, NewTreatment, SessionLifecycle, TreatmentLifecycle};
use smart_physio_core::models::{
    today, AppointmentStatus, AuditContext, Branch, DoctorProfile, Gender, Patient,
    PatientTreatment, TreatmentProgram, TreatmentSession, TreatmentStatus, User,
};

struct Clinic {
    db: Database,
    branch_id: String,
    doctor_id: String,
    patient_id: String,
    program_id: String,
}

fn clinic() -> Clinic {
    let db = Database::open_in_memory().unwrap();
    let ctx = AuditContext::system();

    let branch = Branch::new("Central".into(), "1 Main St".into(), &ctx);
    db.insert_branch(&branch).unwrap();
    let user = User::new("doc".into(), "Dr. Mehta".into());
    db.insert_user(&user).unwrap();
    let doctor = DoctorProfile::new(user.id, branch.id.clone(), &ctx);
    db.insert_doctor(&doctor).unwrap();

    let mut patient = Patient::new(
        "Asha".into(),
        "Rao".into(),
        chrono::NaiveDate::from_ymd_opt(1990, 6, 15).unwrap(),
        Gender::Female,
        &ctx,
    );
    patient.branch_id = Some(branch.id.clone());
    db.insert_patient(&patient).unwrap();

    let program =
        TreatmentProgram::new("Knee rehab".into(), Decimal::from(500), 30, branch.id.clone(), &ctx);
    db.insert_program(&program).unwrap();

    Clinic {
        db,
        branch_id: branch.id,
        doctor_id: doctor.id,
        patient_id: patient.id,
        program_id: program.id,
    }
}

fn prescribe(clinic: &Clinic, total_sessions: u32) -> PatientTreatment {
    TreatmentLifecycle::new(&clinic.db)
        .create_treatment(
            NewTreatment {
                patient_id: clinic.patient_id.clone(),
                program_id: clinic.program_id.clone(),
                doctor_id: clinic.doctor_id.clone(),
                total_sessions,
                session_rate: None,
                notes: String::new(),
            },
            &AuditContext::new("doctor"),
        )
        .unwrap()
}

fn session(clinic: &Clinic, treatment_id: &str, status: AppointmentStatus) -> TreatmentSession {
    let mut session = TreatmentSession::new(
        Some(treatment_id.to_string()),
        clinic.doctor_id.clone(),
        today(),
        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        &AuditContext::new("doctor"),
    );
    session.status = status;
    session
}

fn stored(clinic: &Clinic, treatment_id: &str) -> PatientTreatment {
    clinic.db.get_treatment(treatment_id).unwrap().unwrap()
}

#[test]
fn test_short_session_rejected() {
    let clinic = clinic();
    let treatment = prescribe(&clinic, 3);
    let mut short = session(&clinic, &treatment.id, AppointmentStatus::Scheduled);
    short.end_time = NaiveTime::from_hms_opt(9, 30, 0).unwrap();

    let result = SessionLifecycle::new(&clinic.db).create_session(short.clone(), &AuditContext::system());
    assert!(matches!(result, Err(LifecycleError::Validation(_))));
    assert!(clinic.db.get_session(&short.id).unwrap().is_none());
}

#[test]
fn test_future_completion_rejected() {
    let clinic = clinic();
    let treatment = prescribe(&clinic, 3);
    let mut future = session(&clinic, &treatment.id, AppointmentStatus::Completed);
    future.date = today() + Duration::days(1);

    let result = SessionLifecycle::new(&clinic.db).create_session(future, &AuditContext::system());
    assert!(matches!(result, Err(LifecycleError::Validation(_))));
    assert_eq!(stored(&clinic, &treatment.id).sessions_completed, 0);

    // Scheduling a future session is fine
    let mut planned = session(&clinic, &treatment.id, AppointmentStatus::Scheduled);
    planned.date = today() + Duration::days(7);
    assert!(SessionLifecycle::new(&clinic.db)
        .create_session(planned, &AuditContext::system())
        .is_ok());
}

#[test]
fn test_last_session_completes_treatment() {
    let clinic = clinic();
    let lifecycle = SessionLifecycle::new(&clinic.db);
    let ctx = AuditContext::new("doctor");
    let treatment = prescribe(&clinic, 2);

    let first = lifecycle
        .create_session(session(&clinic, &treatment.id, AppointmentStatus::Completed), &ctx)
        .unwrap();
    assert_eq!(stored(&clinic, &treatment.id).status, TreatmentStatus::Ongoing);

    let second = lifecycle
        .create_session(session(&clinic, &treatment.id, AppointmentStatus::Scheduled), &ctx)
        .unwrap();
    let mut second = second.record;
    second.status = AppointmentStatus::Completed;
    let second = lifecycle.update_session(second, &ctx).unwrap().record;

    let done = stored(&clinic, &treatment.id);
    assert_eq!(done.sessions_completed, 2);
    assert_eq!(done.status, TreatmentStatus::Completed);
    assert_eq!(done.end_date, Some(today()));
    assert_eq!(clinic.db.count_completed_sessions(&treatment.id).unwrap(), 2);

    // Reverting any completed session reopens the treatment
    let mut reopened = second.clone();
    reopened.status = AppointmentStatus::Scheduled;
    lifecycle.update_session(reopened, &ctx).unwrap();
    let ongoing = stored(&clinic, &treatment.id);
    assert_eq!(ongoing.sessions_completed, 1);
    assert_eq!(ongoing.status, TreatmentStatus::Ongoing);
    assert_eq!(ongoing.end_date, None);

    lifecycle.delete_session(&first.record.id, &ctx).unwrap();
    assert_eq!(stored(&clinic, &treatment.id).sessions_completed, 0);
}

#[test]
fn test_completing_beyond_total_fails() {
    let clinic = clinic();
    let lifecycle = SessionLifecycle::new(&clinic.db);
    let ctx = AuditContext::system();
    let treatment = prescribe(&clinic, 1);

    let extra = lifecycle
        .create_session(session(&clinic, &treatment.id, AppointmentStatus::Scheduled), &ctx)
        .unwrap()
        .record;
    lifecycle
        .create_session(session(&clinic, &treatment.id, AppointmentStatus::Completed), &ctx)
        .unwrap();
    assert_eq!(stored(&clinic, &treatment.id).status, TreatmentStatus::Completed);

    let mut extra_completed = extra.clone();
    extra_completed.status = AppointmentStatus::Completed;
    let result = lifecycle.update_session(extra_completed, &ctx);
    assert!(matches!(result, Err(LifecycleError::Precondition(_))));

    // The failed save left nothing behind
    assert_eq!(
        clinic.db.get_session(&extra.id).unwrap().unwrap().status,
        AppointmentStatus::Scheduled
    );
    assert_eq!(stored(&clinic, &treatment.id).sessions_completed, 1);
}

#[test]
fn test_sessions_need_an_ongoing_treatment() {
    let clinic = clinic();
    let ctx = AuditContext::system();
    let treatment = prescribe(&clinic, 4);
    TreatmentLifecycle::new(&clinic.db)
        .set_status(&treatment.id, TreatmentStatus::Cancelled, &ctx)
        .unwrap();

    let result = SessionLifecycle::new(&clinic.db)
        .create_session(session(&clinic, &treatment.id, AppointmentStatus::Scheduled), &ctx);
    assert!(matches!(result, Err(LifecycleError::Validation(_))));
}

#[test]
fn test_moving_a_completed_session() {
    let clinic = clinic();
    let lifecycle = SessionLifecycle::new(&clinic.db);
    let ctx = AuditContext::system();
    let knee = prescribe(&clinic, 3);

    let back_program = TreatmentProgram::new(
        "Back care".into(),
        Decimal::from(400),
        14,
        clinic.branch_id.clone(),
        &ctx,
    );
    clinic.db.insert_program(&back_program).unwrap();
    let back = TreatmentLifecycle::new(&clinic.db)
        .create_treatment(
            NewTreatment {
                patient_id: clinic.patient_id.clone(),
                program_id: back_program.id.clone(),
                doctor_id: clinic.doctor_id.clone(),
                total_sessions: 2,
                session_rate: None,
                notes: String::new(),
            },
            &ctx,
        )
        .unwrap();

    let moved = lifecycle
        .create_session(session(&clinic, &knee.id, AppointmentStatus::Completed), &ctx)
        .unwrap()
        .record;
    assert_eq!(stored(&clinic, &knee.id).sessions_completed, 1);

    let mut moved = moved;
    moved.treatment_id = Some(back.id.clone());
    lifecycle.update_session(moved, &ctx).unwrap();

    assert_eq!(stored(&clinic, &knee.id).sessions_completed, 0);
    assert_eq!(stored(&clinic, &back.id).sessions_completed, 1);

    let treatments = clinic.db.list_treatments_for_patient(&clinic.patient_id).unwrap();
    assert_eq!(treatments.len(), 2);
    assert!(treatments.iter().all(|t| t.status == TreatmentStatus::Ongoing));
}

#[test]
fn test_session_without_treatment() {
    let clinic = clinic();
    let mut walk_in = TreatmentSession::new(
        None,
        clinic.doctor_id.clone(),
        today(),
        NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
        &AuditContext::system(),
    );
    walk_in.status = AppointmentStatus::Completed;

    let saved = SessionLifecycle::new(&clinic.db)
        .create_session(walk_in, &AuditContext::system())
        .unwrap();
    assert!(saved.invoice_outcomes.is_empty());
}

proptest! {
    /// The counter stays within bounds whatever sequence of completions and
    /// reversals is applied.
    #[test]
    fn counter_stays_in_bounds(
        total in 1u32..6,
        steps in proptest::collection::vec(any::<bool>(), 1..25)
    ) {
        let clinic = clinic();
        let treatment = prescribe(&clinic, total);
        let lifecycle = SessionLifecycle::new(&clinic.db);
        let ctx = AuditContext::system();
        let mut expected = 0u32;

        for complete in steps {
            let result = if complete {
                lifecycle.complete(&treatment.id, &ctx)
            } else {
                lifecycle.uncomplete(&treatment.id, &ctx)
            };

            match result {
                Ok(_) if complete => expected += 1,
                Ok(_) => expected -= 1,
                Err(LifecycleError::Precondition(_)) => {
                    let at_bound = if complete { expected == total } else { expected == 0 };
                    prop_assert!(at_bound, "refused away from the bound at {}", expected);
                }
                Err(e) => prop_assert!(false, "unexpected error: {}", e),
            }

            let current = stored(&clinic, &treatment.id);
            prop_assert_eq!(current.sessions_completed, expected);
            prop_assert!(current.sessions_completed <= current.total_sessions);
            prop_assert_eq!(
                current.status == TreatmentStatus::Completed,
                expected == total
            );
        }
    }
}
