//! Consultation saves and their invoicing.

use tracing::{debug, info};

use super::{LifecycleError, LifecycleResult};
use crate::billing::BillingEngine;
use crate::db::Database;
use crate::models::{AuditContext, AuditStamp, Invoice, PatientConsultation};

/// Consultation lifecycle manager.
pub struct ConsultationLifecycle<'a> {
    db: &'a Database,
}

impl<'a> ConsultationLifecycle<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn validate(&self, consultation: &PatientConsultation) -> LifecycleResult<()> {
        if consultation.end_time <= consultation.start_time {
            return Err(LifecycleError::Validation(
                "End time must be after start time".into(),
            ));
        }
        if consultation.oxygen_saturation.map_or(false, |spo2| spo2 > 100) {
            return Err(LifecycleError::Validation(
                "Oxygen saturation must be between 0 and 100".into(),
            ));
        }
        if let Some(follow_up) = consultation.follow_up_date {
            if follow_up < consultation.date {
                return Err(LifecycleError::Validation(
                    "Follow-up date cannot precede the consultation".into(),
                ));
            }
        }
        Ok(())
    }

    /// Validate and insert a new consultation, stamped with the context's actor.
    pub fn create_consultation(
        &self,
        mut consultation: PatientConsultation,
        ctx: &AuditContext,
    ) -> LifecycleResult<PatientConsultation> {
        self.validate(&consultation)?;
        consultation.audit = AuditStamp::new(ctx);
        self.db.insert_consultation(&consultation)?;
        info!(
            consultation_id = %consultation.id,
            patient_id = %consultation.patient_id,
            actor = ?ctx.actor(),
            "Consultation scheduled"
        );
        Ok(consultation)
    }

    /// Persist an edited consultation.
    ///
    /// Moving a scheduled consultation to `completed` creates its invoice in
    /// the same transaction; if that fails nothing is saved.
    pub fn update_consultation(
        &self,
        mut consultation: PatientConsultation,
        ctx: &AuditContext,
    ) -> LifecycleResult<(PatientConsultation, Option<Invoice>)> {
        self.validate(&consultation)?;

        let tx = self.db.immediate_transaction()?;
        let previous = self.db.get_consultation(&consultation.id)?.ok_or_else(|| {
            LifecycleError::NotFound(format!("Consultation {}", consultation.id))
        })?;

        consultation.audit.touch(ctx);
        self.db.update_consultation(&consultation)?;

        let invoice = if consultation.status.is_completed() && !previous.status.is_completed() {
            debug!(consultation_id = %consultation.id, "Consultation completed");
            Some(BillingEngine::new(self.db).create_for_consultation(&previous, ctx)?)
        } else {
            None
        };

        tx.commit()?;
        Ok((consultation, invoice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::BillingError;
    use crate::models::{
        AppointmentStatus, Branch, ConsultationType, DoctorProfile, Gender, Patient, User,
    };
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal::Decimal;

    fn setup() -> (Database, PatientConsultation) {
        let db = Database::open_in_memory().unwrap();
        let ctx = AuditContext::system();
        let branch = Branch::new("Central".into(), "1 Main St".into(), &ctx);
        db.insert_branch(&branch).unwrap();
        let user = User::new("doc".into(), "Doc".into());
        db.insert_user(&user).unwrap();
        let doctor = DoctorProfile::new(user.id, branch.id, &ctx);
        db.insert_doctor(&doctor).unwrap();
        let patient = Patient::new(
            "Ravi".into(),
            "Kumar".into(),
            NaiveDate::from_ymd_opt(1985, 1, 20).unwrap(),
            Gender::Male,
            &ctx,
        );
        db.insert_patient(&patient).unwrap();
        let consultation = PatientConsultation::new(
            patient.id,
            doctor.id,
            ConsultationType::Initial,
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(11, 30, 0).unwrap(),
            &ctx,
        );
        (db, consultation)
    }

    #[test]
    fn test_completion_creates_invoice() {
        let (db, consultation) = setup();
        let lifecycle = ConsultationLifecycle::new(&db);
        let ctx = AuditContext::new("admin");
        let mut consultation = lifecycle.create_consultation(consultation, &ctx).unwrap();
        assert_eq!(consultation.audit.created_by.as_deref(), Some("admin"));
        let stored = db.get_consultation(&consultation.id).unwrap().unwrap();
        assert_eq!(stored.audit.created_by.as_deref(), Some("admin"));

        consultation.status = AppointmentStatus::Completed;
        let (saved, invoice) = lifecycle.update_consultation(consultation, &ctx).unwrap();
        let invoice = invoice.unwrap();
        assert_eq!(invoice.total, Decimal::from(600));
        assert_eq!(invoice.consultation_id.as_deref(), Some(saved.id.as_str()));

        // Saving again while completed does not bill twice
        let (_, again) = lifecycle.update_consultation(saved, &ctx).unwrap();
        assert!(again.is_none());
    }

    #[test]
    fn test_failed_invoice_aborts_save() {
        let (db, consultation) = setup();
        let lifecycle = ConsultationLifecycle::new(&db);
        let ctx = AuditContext::system();
        let mut consultation = lifecycle.create_consultation(consultation, &ctx).unwrap();

        // No-show consultations cannot be invoiced
        consultation.status = AppointmentStatus::NoShow;
        let (mut consultation, _) = lifecycle.update_consultation(consultation, &ctx).unwrap();

        consultation.status = AppointmentStatus::Completed;
        let result = lifecycle.update_consultation(consultation.clone(), &ctx);
        assert!(matches!(
            result,
            Err(LifecycleError::Billing(BillingError::Precondition(_)))
        ));

        let stored = db.get_consultation(&consultation.id).unwrap().unwrap();
        assert_eq!(stored.status, AppointmentStatus::NoShow);
    }

    #[test]
    fn test_validation() {
        let (db, mut consultation) = setup();
        let lifecycle = ConsultationLifecycle::new(&db);

        consultation.oxygen_saturation = Some(120);
        assert!(lifecycle.validate(&consultation).is_err());

        consultation.oxygen_saturation = Some(97);
        consultation.end_time = consultation.start_time;
        assert!(lifecycle.validate(&consultation).is_err());
    }
}
