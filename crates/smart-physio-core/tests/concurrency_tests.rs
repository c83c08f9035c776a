//! Concurrent writers on one file-backed clinic database.
//!
//! Each thread opens its own connection, the way separate app processes
//! would, and races the others on the same treatment counter or invoice.

use std::path::Path;
use std::sync::Barrier;
use std::thread;

use rust_decimal::Decimal;

use smart_physio_core::billing::{BillingEngine, BillingError};
use smart_physio_core::db::Database;
use smart_physio_core::lifecycle::{LifecycleError, NewTreatment, SessionLifecycle, TreatmentLifecycle};
use smart_physio_core::models::{
    AuditContext, Branch, DoctorProfile, Gender, Invoice, InvoiceStatus, Patient, PaymentMethod,
    PaymentRequest, PatientTreatment, TreatmentProgram, TreatmentStatus, User,
};

const THREADS: usize = 4;

/// Seed a clinic with one treatment at 100 per session and invoice it.
fn seed(path: &Path, total_sessions: u32) -> (PatientTreatment, Invoice) {
    let db = Database::open(path).unwrap();
    let ctx = AuditContext::system();

    let branch = Branch::new("Central".into(), "1 Main St".into(), &ctx);
    db.insert_branch(&branch).unwrap();
    let user = User::new("doc".into(), "Dr. Mehta".into());
    db.insert_user(&user).unwrap();
    let doctor = DoctorProfile::new(user.id, branch.id.clone(), &ctx);
    db.insert_doctor(&doctor).unwrap();
    let patient = Patient::new(
        "Asha".into(),
        "Rao".into(),
        chrono::NaiveDate::from_ymd_opt(1990, 6, 15).unwrap(),
        Gender::Female,
        &ctx,
    );
    db.insert_patient(&patient).unwrap();
    let program = TreatmentProgram::new("Knee rehab".into(), Decimal::from(500), 30, branch.id, &ctx);
    db.insert_program(&program).unwrap();

    let treatment = TreatmentLifecycle::new(&db)
        .create_treatment(
            NewTreatment {
                patient_id: patient.id,
                program_id: program.id,
                doctor_id: doctor.id,
                total_sessions,
                session_rate: Some(Decimal::from(100)),
                notes: String::new(),
            },
            &ctx,
        )
        .unwrap();
    let invoice = BillingEngine::new(&db)
        .create_treatment_invoice(&treatment.id, &ctx)
        .unwrap()
        .unwrap();
    (treatment, invoice)
}

#[test]
fn test_concurrent_completions_never_overcount() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clinic.db");
    // Fewer sessions than attempts, so some completions must be refused
    let (treatment, _) = seed(&path, 30);
    let barrier = Barrier::new(THREADS);

    let successes: usize = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|n| {
                let (path, treatment_id, barrier) = (&path, &treatment.id, &barrier);
                s.spawn(move || {
                    let db = Database::open(path).unwrap();
                    let lifecycle = SessionLifecycle::new(&db);
                    let ctx = AuditContext::new(format!("doctor-{}", n));
                    barrier.wait();

                    let mut completed = 0;
                    for _ in 0..10 {
                        match lifecycle.complete(treatment_id, &ctx) {
                            Ok(_) => completed += 1,
                            Err(LifecycleError::Precondition(_)) => {}
                            Err(e) => panic!("unexpected error: {}", e),
                        }
                    }
                    completed
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    let db = Database::open(&path).unwrap();
    let stored = db.get_treatment(&treatment.id).unwrap().unwrap();
    assert_eq!(successes, 30);
    assert_eq!(stored.sessions_completed as usize, successes);
    assert_eq!(stored.status, TreatmentStatus::Completed);
}

#[test]
fn test_concurrent_payments_never_overshoot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clinic.db");
    let (_, invoice) = seed(&path, 40);
    assert_eq!(invoice.total, Decimal::from(4000));
    let barrier = Barrier::new(THREADS);

    let successes = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|n| {
                let (path, invoice_id, barrier) = (&path, &invoice.id, &barrier);
                s.spawn(move || {
                    let db = Database::open(path).unwrap();
                    let ctx = AuditContext::new(format!("cashier-{}", n));
                    barrier.wait();

                    let request = PaymentRequest::new(Decimal::from(1500), PaymentMethod::Cash);
                    match BillingEngine::new(&db).record_payment(invoice_id, request, &ctx) {
                        Ok(_) => 1,
                        Err(BillingError::Validation(_)) => 0,
                        Err(e) => panic!("unexpected error: {}", e),
                    }
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum::<i64>()
    });

    let db = Database::open(&path).unwrap();
    let stored = db.get_invoice(&invoice.id).unwrap().unwrap();
    let payments = db.list_payments_for_invoice(&invoice.id).unwrap();

    // Two payments fit in 4000; a third would overshoot
    assert_eq!(successes, 2);
    assert_eq!(payments.len(), 2);
    assert_eq!(stored.amount_paid(), Decimal::from(1500 * successes));
    assert!(stored.amount_paid() <= stored.total);
    assert_eq!(stored.balance, Decimal::from(1000));
    assert_eq!(stored.status, InvoiceStatus::PartiallyPaid);

    let mut references: Vec<_> = payments.iter().map(|p| p.reference.as_str()).collect();
    references.sort_unstable();
    references.dedup();
    assert_eq!(references.len(), 2);
}
