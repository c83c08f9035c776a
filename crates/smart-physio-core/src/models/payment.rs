//! Payments against invoices.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::audit::AuditStamp;

/// How a payment was made.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Insurance,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Insurance => "insurance",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "card" => Some(PaymentMethod::Card),
            "insurance" => Some(PaymentMethod::Insurance),
            _ => None,
        }
    }
}

/// A settled payment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: String,
    pub invoice_id: String,
    pub amount: Decimal,
    pub discount_amount: Decimal,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    /// Unique across all payments
    pub reference: String,
    pub notes: Option<String>,
    pub audit: AuditStamp,
}

impl Payment {
    /// Amount this payment settles, discount included.
    pub fn total_payment(&self) -> Decimal {
        self.amount + self.discount_amount
    }
}

/// Input for recording a payment.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub amount: Decimal,
    pub discount_amount: Decimal,
    pub method: PaymentMethod,
    /// Generated from the invoice number when absent
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl PaymentRequest {
    pub fn new(amount: Decimal, method: PaymentMethod) -> Self {
        Self {
            amount,
            discount_amount: Decimal::ZERO,
            method,
            reference: None,
            notes: None,
        }
    }

    pub fn with_discount(mut self, discount_amount: Decimal) -> Self {
        self.discount_amount = discount_amount;
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn total_payment(&self) -> Decimal {
        self.amount + self.discount_amount
    }
}
