//! Domain models for the clinic.

mod audit;
mod branch;
mod consultation;
mod doctor;
mod invoice;
mod money;
mod patient;
mod payment;
mod program;
mod schedule;
mod session;
mod treatment;

pub use audit::*;
pub use branch::*;
pub use consultation::*;
pub use doctor::*;
pub use invoice::*;
pub use money::*;
pub use patient::*;
pub use payment::*;
pub use program::*;
pub use schedule::*;
pub use session::*;
pub use treatment::*;

/// Today's date in the clinic's reference timezone (UTC).
pub fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}

/// Generate a new record identifier.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
