//! End-to-end treatment course: sessions, invoice, payments.

use chrono::NaiveTime;
use rust_decimal::Decimal;

use smart_physio_core::billing::{BillingEngine, BillingError, InvoiceOutcome};
use smart_physio_core::db::Database;
use smart_physio_core::lifecycle::{NewTreatment, SessionLifecycle, TreatmentLifecycle};
use smart_physio_core::models::{
    today, AppointmentStatus, AuditContext, Branch, DoctorProfile, Gender, InvoiceStatus, Patient,
    PaymentMethod, PaymentRequest, TreatmentProgram, TreatmentSession, TreatmentStatus, User,
};
use smart_physio_core::{open_clinic_in_memory, FfiInvoiceOutcome, FfiSessionInput};

#[test]
fn test_three_session_course_paid_in_two_installments() {
    let db = Database::open_in_memory().unwrap();
    let admin = AuditContext::new("admin");
    let doctor_ctx = AuditContext::new("dr.mehta");

    let branch = Branch::new("Central".into(), "1 Main St".into(), &admin);
    db.insert_branch(&branch).unwrap();
    let user = User::new("dr.mehta".into(), "Dr. Mehta".into());
    db.insert_user(&user).unwrap();
    let doctor = DoctorProfile::new(user.id, branch.id.clone(), &admin);
    db.insert_doctor(&doctor).unwrap();
    let patient = Patient::new(
        "Asha".into(),
        "Rao".into(),
        chrono::NaiveDate::from_ymd_opt(1990, 6, 15).unwrap(),
        Gender::Female,
        &admin,
    );
    db.insert_patient(&patient).unwrap();
    let program = TreatmentProgram::new("Knee rehab".into(), Decimal::from(500), 30, branch.id, &admin);
    db.insert_program(&program).unwrap();

    let treatment = TreatmentLifecycle::new(&db)
        .create_treatment(
            NewTreatment {
                patient_id: patient.id.clone(),
                program_id: program.id,
                doctor_id: doctor.id.clone(),
                total_sessions: 3,
                session_rate: Some(Decimal::from(500)),
                notes: "Post-op ACL".into(),
            },
            &doctor_ctx,
        )
        .unwrap();

    let sessions = SessionLifecycle::new(&db);
    let mut outcomes = Vec::new();
    for hour in [9, 11, 14] {
        let mut session = TreatmentSession::new(
            Some(treatment.id.clone()),
            doctor.id.clone(),
            today(),
            NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(hour + 1, 0, 0).unwrap(),
            &doctor_ctx,
        );
        session.status = AppointmentStatus::Completed;
        outcomes.push(sessions.create_session(session, &doctor_ctx).unwrap().invoice_outcomes);
    }

    // Invoiced once, while the course was still ongoing
    assert!(matches!(outcomes[0].as_slice(), [InvoiceOutcome::Created { .. }]));
    assert_eq!(outcomes[1], vec![InvoiceOutcome::AlreadyExists]);
    assert!(outcomes[2].is_empty());

    let finished = db.get_treatment(&treatment.id).unwrap().unwrap();
    assert_eq!(finished.status, TreatmentStatus::Completed);
    assert_eq!(finished.sessions_completed, 3);
    assert_eq!(finished.end_date, Some(today()));
    assert_eq!(finished.total_cost(), Decimal::from(1500));

    let invoice = db
        .get_treatment_invoice(&patient.id, &treatment.id)
        .unwrap()
        .unwrap();
    assert_eq!(invoice.total, Decimal::from(1500));
    assert_eq!(invoice.notes, "Treatment program: Knee rehab");

    let billing = BillingEngine::new(&db);
    let cashier = AuditContext::new("cashier");

    billing
        .record_payment(
            &invoice.id,
            PaymentRequest::new(Decimal::from(1000), PaymentMethod::Cash),
            &cashier,
        )
        .unwrap();
    let invoice = db.get_invoice(&invoice.id).unwrap().unwrap();
    assert_eq!(invoice.status, InvoiceStatus::PartiallyPaid);
    assert_eq!(invoice.balance, Decimal::from(500));

    billing
        .record_payment(
            &invoice.id,
            PaymentRequest::new(Decimal::from(500), PaymentMethod::Card),
            &cashier,
        )
        .unwrap();
    let invoice = db.get_invoice(&invoice.id).unwrap().unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Paid);
    assert_eq!(invoice.balance, Decimal::ZERO);

    let third = billing.record_payment(
        &invoice.id,
        PaymentRequest::new(Decimal::new(1, 2), PaymentMethod::Cash),
        &cashier,
    );
    assert!(matches!(third, Err(BillingError::Validation(_))));
    assert_eq!(db.list_payments_for_invoice(&invoice.id).unwrap().len(), 2);
}

#[test]
fn test_course_through_ffi() {
    let core = open_clinic_in_memory().unwrap();
    let branch = core
        .create_branch("Lakeside".into(), "22 Shore Rd".into(), Some("root".into()))
        .unwrap();
    let user_id = core
        .create_user("dr.iyer".into(), "Dr. Iyer".into(), false)
        .unwrap();
    let doctor_id = core
        .create_doctor(user_id, branch.id.clone(), Some("root".into()))
        .unwrap();
    let patient = core
        .create_patient(
            "Kiran".into(),
            "Shah".into(),
            "1978-11-02".into(),
            "M".into(),
            Some(branch.id.clone()),
            None,
        )
        .unwrap();
    let program_id = core
        .create_program("Spine care".into(), "350.50".into(), 21, branch.id.clone(), None)
        .unwrap();
    let treatment = core
        .create_treatment(patient.id.clone(), program_id, doctor_id.clone(), 2, None, None)
        .unwrap();
    assert_eq!(treatment.status, "ongoing");

    let input = |start: &str, end: &str| FfiSessionInput {
        treatment_id: Some(treatment.id.clone()),
        doctor_id: doctor_id.clone(),
        date: today().to_string(),
        start_time: start.into(),
        end_time: end.into(),
        status: "scheduled".into(),
        assessment_notes: String::new(),
    };

    let first = core.create_session(input("09:00", "10:00"), None).unwrap();
    assert_eq!(
        first.invoice_outcomes,
        Vec::<FfiInvoiceOutcome>::new(),
        "scheduling does not touch the treatment"
    );

    let mut completed = input("09:00", "10:00");
    completed.status = "completed".into();
    let saved = core
        .update_session(first.session.id.clone(), completed, None)
        .unwrap();
    assert!(matches!(
        saved.invoice_outcomes.as_slice(),
        [FfiInvoiceOutcome::Created { .. }]
    ));

    let stats = core
        .dashboard(branch.id.clone(), today().to_string())
        .unwrap();
    assert_eq!(stats.active_patients, 1);
    // Two sessions total, one still pending
    assert_eq!(stats.expiring_treatments.len(), 1);

    let workload = core
        .doctor_dashboard(doctor_id.clone(), today().to_string())
        .unwrap();
    assert_eq!(workload.total_sessions, 1);
    assert_eq!(workload.todays_completed_sessions, 1);
    assert_eq!(workload.monthly_sessions, 1);
    assert_eq!(workload.scheduled_sessions_today, 0);
    assert_eq!(workload.assigned_patients, 1);

    let invoice = &core.list_invoices(patient.id.clone()).unwrap()[0];
    assert_eq!(invoice.total, "701.00");
    assert_eq!(invoice.status, "sent");

    core.delete_session(first.session.id, None).unwrap();
    let reverted = core.get_treatment(treatment.id.clone()).unwrap().unwrap();
    assert_eq!(reverted.sessions_completed, 0);
    assert_eq!(reverted.balance_due, "701.00");
}
