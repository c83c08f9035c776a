//! Post-commit domain events.

use tracing::debug;

use crate::billing::{BillingEngine, InvoiceOutcome};
use crate::db::Database;
use crate::models::{AuditContext, PatientTreatment};

/// Something a committed save wants the rest of the system to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    /// A saved treatment is in a billable state and may need its invoice.
    TreatmentBillable { treatment_id: String },
}

impl DomainEvent {
    /// Events for a treatment that was just persisted.
    pub fn for_saved_treatment(treatment: &PatientTreatment) -> Vec<DomainEvent> {
        if treatment.status.is_billable() {
            vec![DomainEvent::TreatmentBillable {
                treatment_id: treatment.id.clone(),
            }]
        } else {
            Vec::new()
        }
    }
}

/// Dispatches events in order, after the transaction that produced them has
/// committed.
pub struct EventDispatcher<'a> {
    billing: BillingEngine<'a>,
}

impl<'a> EventDispatcher<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            billing: BillingEngine::new(db),
        }
    }

    /// Dispatch every event; one outcome per event.
    pub fn dispatch(&self, events: &[DomainEvent], ctx: &AuditContext) -> Vec<InvoiceOutcome> {
        events
            .iter()
            .map(|event| {
                debug!(?event, "Dispatching domain event");
                match event {
                    DomainEvent::TreatmentBillable { treatment_id } => {
                        self.billing.ensure_treatment_invoice(treatment_id, ctx)
                    }
                }
            })
            .collect()
    }
}
