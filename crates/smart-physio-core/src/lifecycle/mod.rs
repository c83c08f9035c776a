//! Record lifecycles: sessions, treatments, consultations and weekly schedules.
//!
//! Each save runs in one immediate transaction. Cascades that must not block
//! the save (treatment invoicing) are returned as [`DomainEvent`]s and
//! dispatched after commit.

mod consultations;
mod events;
mod schedules;
mod sessions;
mod treatments;

pub use consultations::*;
pub use events::*;
pub use schedules::*;
pub use sessions::*;
pub use treatments::*;

use thiserror::Error;

use crate::billing::{BillingError, InvoiceOutcome};
use crate::db::DbError;

/// Lifecycle errors.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error(transparent)]
    Billing(#[from] BillingError),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Precondition not met: {0}")]
    Precondition(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<rusqlite::Error> for LifecycleError {
    fn from(e: rusqlite::Error) -> Self {
        LifecycleError::Database(e.into())
    }
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// A committed record together with the outcomes of the cascades it triggered.
#[derive(Debug, Clone)]
pub struct Saved<T> {
    pub record: T,
    pub invoice_outcomes: Vec<InvoiceOutcome>,
}

impl<T> Saved<T> {
    fn new(record: T, invoice_outcomes: Vec<InvoiceOutcome>) -> Self {
        Self {
            record,
            invoice_outcomes,
        }
    }
}
