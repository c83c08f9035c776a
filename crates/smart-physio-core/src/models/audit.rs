//! Audit stamping for mutating operations.

use serde::{Deserialize, Serialize};

/// The acting user of a mutating operation.
///
/// Passed explicitly to every write so that records can be stamped with
/// `created_by` / `updated_by` without any ambient per-request state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditContext {
    /// User ID of the actor, `None` for system-initiated writes
    pub actor: Option<String>,
}

impl AuditContext {
    /// Context for a write performed by the given user.
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: Some(actor.into()),
        }
    }

    /// Context for a write with no human actor.
    pub fn system() -> Self {
        Self { actor: None }
    }

    /// Actor user ID, if any.
    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }
}

/// Audit columns carried by every persisted record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditStamp {
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
    /// User who created the record
    pub created_by: Option<String>,
    /// User who last updated the record
    pub updated_by: Option<String>,
}

impl AuditStamp {
    /// Stamp for a record created now by the context's actor.
    pub fn new(ctx: &AuditContext) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            created_at: now.clone(),
            updated_at: now,
            created_by: ctx.actor.clone(),
            updated_by: ctx.actor.clone(),
        }
    }

    /// Record an update by the context's actor.
    pub fn touch(&mut self, ctx: &AuditContext) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
        self.updated_by = ctx.actor.clone();
    }
}
