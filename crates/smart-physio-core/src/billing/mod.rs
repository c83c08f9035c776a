//! Invoicing and payment settlement.

mod engine;
mod payments;

pub use engine::*;
