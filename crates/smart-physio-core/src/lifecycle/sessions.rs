//! Treatment session lifecycle.
//!
//! A session moving into `completed` counts one more delivered session on its
//! treatment; moving out of `completed`, or being deleted while completed,
//! counts one fewer. The counter only changes through relative updates at the
//! store, so concurrent completions never lose an increment.

use tracing::debug;

use super::{DomainEvent, EventDispatcher, LifecycleError, LifecycleResult, Saved};
use crate::db::Database;
use crate::models::{
    today, AppointmentStatus, AuditContext, PatientTreatment, TreatmentSession, TreatmentStatus,
};

/// Session lifecycle manager.
pub struct SessionLifecycle<'a> {
    db: &'a Database,
}

impl<'a> SessionLifecycle<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Check a session against its invariants before it is written.
    ///
    /// `previous` is the stored version for an update, `None` for a new
    /// session. The treatment must be ongoing when the session is first
    /// attached to it.
    pub fn validate(
        &self,
        session: &TreatmentSession,
        previous: Option<&TreatmentSession>,
    ) -> LifecycleResult<()> {
        let min_minutes = self.db.config().min_session_minutes;
        if session.duration_minutes() < min_minutes {
            return Err(LifecycleError::Validation(format!(
                "Session duration must be at least {} minutes",
                min_minutes
            )));
        }

        if session.status.is_completed() && session.date > today() {
            return Err(LifecycleError::Validation(
                "Cannot mark future sessions as completed".into(),
            ));
        }

        if let Some(treatment_id) = &session.treatment_id {
            let newly_attached =
                previous.map_or(true, |p| p.treatment_id.as_ref() != Some(treatment_id));
            let becomes_completed = session.status.is_completed()
                && !previous.map_or(false, |p| p.status.is_completed());

            if newly_attached || becomes_completed {
                let treatment = self.treatment(treatment_id)?;
                let closed = matches!(
                    treatment.status,
                    TreatmentStatus::Prescribed | TreatmentStatus::Cancelled
                );
                if (newly_attached && treatment.status != TreatmentStatus::Ongoing) || closed {
                    return Err(LifecycleError::Validation(
                        "Cannot add sessions to a treatment that is not ongoing".into(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Count one more completed session on a treatment.
    pub fn complete(&self, treatment_id: &str, ctx: &AuditContext) -> LifecycleResult<PatientTreatment> {
        if !self
            .db
            .increment_sessions_completed(treatment_id, today(), ctx)?
        {
            self.treatment(treatment_id)?;
            return Err(LifecycleError::Precondition(
                "All sessions already completed".into(),
            ));
        }

        let treatment = self.treatment(treatment_id)?;
        debug!(
            treatment_id,
            sessions_completed = treatment.sessions_completed,
            total_sessions = treatment.total_sessions,
            status = treatment.status.as_str(),
            "Session completed"
        );
        Ok(treatment)
    }

    /// Count one fewer completed session on a treatment.
    pub fn uncomplete(&self, treatment_id: &str, ctx: &AuditContext) -> LifecycleResult<PatientTreatment> {
        if !self.db.decrement_sessions_completed(treatment_id, ctx)? {
            self.treatment(treatment_id)?;
            return Err(LifecycleError::Precondition(
                "No completed sessions to revert".into(),
            ));
        }

        let treatment = self.treatment(treatment_id)?;
        debug!(
            treatment_id,
            sessions_completed = treatment.sessions_completed,
            status = treatment.status.as_str(),
            "Session completion reverted"
        );
        Ok(treatment)
    }

    /// Apply a status transition of a saved session to its treatment.
    ///
    /// Returns the treatment if its counter changed.
    pub fn on_save(
        &self,
        session: &TreatmentSession,
        previous_status: Option<AppointmentStatus>,
        ctx: &AuditContext,
    ) -> LifecycleResult<Option<PatientTreatment>> {
        let Some(treatment_id) = &session.treatment_id else {
            return Ok(None);
        };
        let was_completed = previous_status.map_or(false, |s| s.is_completed());

        match (was_completed, session.status.is_completed()) {
            (false, true) => self.complete(treatment_id, ctx).map(Some),
            (true, false) => self.uncomplete(treatment_id, ctx).map(Some),
            _ => Ok(None),
        }
    }

    /// Revert a completed session's contribution before it is removed.
    pub fn on_delete(
        &self,
        session: &TreatmentSession,
        ctx: &AuditContext,
    ) -> LifecycleResult<Option<PatientTreatment>> {
        match &session.treatment_id {
            Some(treatment_id) if session.status.is_completed() => {
                self.uncomplete(treatment_id, ctx).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Validate and insert a new session.
    pub fn create_session(
        &self,
        session: TreatmentSession,
        ctx: &AuditContext,
    ) -> LifecycleResult<Saved<TreatmentSession>> {
        let tx = self.db.immediate_transaction()?;

        self.validate(&session, None)?;
        self.db.insert_session(&session)?;
        let treatment = self.on_save(&session, None, ctx)?;

        tx.commit()?;
        Ok(Saved::new(session, self.dispatch(treatment.as_ref(), ctx)))
    }

    /// Validate and persist an edited session.
    pub fn update_session(
        &self,
        mut session: TreatmentSession,
        ctx: &AuditContext,
    ) -> LifecycleResult<Saved<TreatmentSession>> {
        let tx = self.db.immediate_transaction()?;

        let previous = self
            .db
            .get_session(&session.id)?
            .ok_or_else(|| LifecycleError::NotFound(format!("Session {}", session.id)))?;
        self.validate(&session, Some(&previous))?;

        session.audit.touch(ctx);
        self.db.update_session(&session)?;

        let treatment = if previous.treatment_id == session.treatment_id {
            self.on_save(&session, Some(previous.status), ctx)?
        } else {
            // Moved to another treatment: release the old one, count on the new one
            self.on_delete(&previous, ctx)?;
            self.on_save(&session, None, ctx)?
        };

        tx.commit()?;
        Ok(Saved::new(session, self.dispatch(treatment.as_ref(), ctx)))
    }

    /// Delete a session, reverting its completion first.
    pub fn delete_session(
        &self,
        session_id: &str,
        ctx: &AuditContext,
    ) -> LifecycleResult<Saved<TreatmentSession>> {
        let tx = self.db.immediate_transaction()?;

        let session = self
            .db
            .get_session(session_id)?
            .ok_or_else(|| LifecycleError::NotFound(format!("Session {}", session_id)))?;
        let treatment = self.on_delete(&session, ctx)?;
        self.db.delete_session(session_id)?;

        tx.commit()?;
        Ok(Saved::new(session, self.dispatch(treatment.as_ref(), ctx)))
    }

    fn dispatch(
        &self,
        treatment: Option<&PatientTreatment>,
        ctx: &AuditContext,
    ) -> Vec<crate::billing::InvoiceOutcome> {
        let events = treatment
            .map(DomainEvent::for_saved_treatment)
            .unwrap_or_default();
        EventDispatcher::new(self.db).dispatch(&events, ctx)
    }

    fn treatment(&self, treatment_id: &str) -> LifecycleResult<PatientTreatment> {
        self.db
            .get_treatment(treatment_id)?
            .ok_or_else(|| LifecycleError::NotFound(format!("Treatment {}", treatment_id)))
    }
}
