//! Treatment creation and edits.

use rust_decimal::Decimal;
use tracing::{debug, info};

use super::{DomainEvent, EventDispatcher, LifecycleError, LifecycleResult, Saved};
use crate::db::{Database, DbError};
use crate::models::{fits_currency_scale, today, AuditContext, PatientTreatment, TreatmentStatus};

/// Input for prescribing a treatment.
#[derive(Debug, Clone)]
pub struct NewTreatment {
    pub patient_id: String,
    pub program_id: String,
    pub doctor_id: String,
    pub total_sessions: u32,
    /// Defaults to the program's rate per session
    pub session_rate: Option<Decimal>,
    pub notes: String,
}

/// Treatment lifecycle manager.
pub struct TreatmentLifecycle<'a> {
    db: &'a Database,
}

impl<'a> TreatmentLifecycle<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Prescribe a treatment starting today.
    ///
    /// New treatments are not invoiced; the invoice follows the first save of
    /// an existing billable treatment.
    pub fn create_treatment(
        &self,
        input: NewTreatment,
        ctx: &AuditContext,
    ) -> LifecycleResult<PatientTreatment> {
        if input.total_sessions < 1 {
            return Err(LifecycleError::Validation(
                "Total sessions must be at least 1".into(),
            ));
        }

        let program = self
            .db
            .get_program(&input.program_id)?
            .ok_or_else(|| LifecycleError::NotFound(format!("Program {}", input.program_id)))?;
        if self.db.get_patient(&input.patient_id)?.is_none() {
            return Err(LifecycleError::NotFound(format!("Patient {}", input.patient_id)));
        }
        if self.db.get_doctor(&input.doctor_id)?.is_none() {
            return Err(LifecycleError::NotFound(format!("Doctor {}", input.doctor_id)));
        }

        let session_rate = input.session_rate.unwrap_or(program.rate_per_session);
        if session_rate < Decimal::ZERO {
            return Err(LifecycleError::Validation(
                "Session rate cannot be negative".into(),
            ));
        }
        if !fits_currency_scale(session_rate) {
            return Err(LifecycleError::Validation(
                "Session rate cannot have fractions of a cent".into(),
            ));
        }

        let mut treatment = PatientTreatment::new(
            input.patient_id,
            input.program_id,
            input.doctor_id,
            input.total_sessions,
            session_rate,
            today(),
            ctx,
        );
        treatment.notes = input.notes;

        self.db
            .insert_treatment(&treatment)
            .map_err(duplicate_active_treatment)?;

        info!(
            treatment_id = %treatment.id,
            program = %program.name,
            total_sessions = treatment.total_sessions,
            "Created treatment"
        );
        Ok(treatment)
    }

    /// Persist edits to an existing treatment.
    ///
    /// The completed-session counter is owned by the session lifecycle and is
    /// never written here. A billable treatment gets its invoice after commit.
    pub fn update_treatment(
        &self,
        mut treatment: PatientTreatment,
        ctx: &AuditContext,
    ) -> LifecycleResult<Saved<PatientTreatment>> {
        let tx = self.db.immediate_transaction()?;

        let stored = self
            .db
            .get_treatment(&treatment.id)?
            .ok_or_else(|| LifecycleError::NotFound(format!("Treatment {}", treatment.id)))?;

        if treatment.total_sessions < 1 {
            return Err(LifecycleError::Validation(
                "Total sessions must be at least 1".into(),
            ));
        }
        if treatment.total_sessions < stored.sessions_completed {
            return Err(LifecycleError::Validation(format!(
                "Total sessions cannot be below the {} already completed",
                stored.sessions_completed
            )));
        }
        if treatment.patient_id != stored.patient_id {
            return Err(LifecycleError::Validation(
                "A treatment cannot be moved to another patient".into(),
            ));
        }

        treatment.sessions_completed = stored.sessions_completed;
        treatment.audit.touch(ctx);
        self.db
            .update_treatment(&treatment)
            .map_err(duplicate_active_treatment)?;

        tx.commit()?;

        if stored.status != treatment.status {
            debug!(
                treatment_id = %treatment.id,
                from = stored.status.as_str(),
                to = treatment.status.as_str(),
                "Treatment status changed"
            );
        }

        let events = DomainEvent::for_saved_treatment(&treatment);
        let outcomes = EventDispatcher::new(self.db).dispatch(&events, ctx);
        Ok(Saved::new(treatment, outcomes))
    }

    /// Change only the status of a treatment.
    pub fn set_status(
        &self,
        treatment_id: &str,
        status: TreatmentStatus,
        ctx: &AuditContext,
    ) -> LifecycleResult<Saved<PatientTreatment>> {
        let mut treatment = self
            .db
            .get_treatment(treatment_id)?
            .ok_or_else(|| LifecycleError::NotFound(format!("Treatment {}", treatment_id)))?;
        treatment.status = status;
        self.update_treatment(treatment, ctx)
    }
}

fn duplicate_active_treatment(e: DbError) -> LifecycleError {
    if e.is_constraint_violation() {
        LifecycleError::Validation(
            "Patient already has an active treatment for this program".into(),
        )
    } else {
        e.into()
    }
}
