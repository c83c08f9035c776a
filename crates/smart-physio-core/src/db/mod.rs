//! Database layer for the clinic store.
//!
//! Store methods run on the shared connection and never open transactions
//! themselves; service operations wrap them in [`Database::immediate_transaction`].

mod schema;
mod branches;
mod doctors;
mod patients;
mod programs;
mod treatments;
mod sessions;
mod schedules;
mod consultations;
mod invoices;
mod payments;

pub use doctors::AppointmentCounts;
pub use schema::*;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Type, ValueRef};
use rusqlite::{Connection, Row, ToSql, Transaction, TransactionBehavior};
use rust_decimal::Decimal;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::config::ClinicConfig;
use crate::models::{
    to_minor, AppointmentStatus, AuditStamp, ConsultationType, Gender, InvoiceStatus,
    PaymentMethod, TreatmentStatus,
};

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

impl DbError {
    /// Whether this error comes from a uniqueness, check or foreign-key constraint.
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            DbError::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => {
                err.code == rusqlite::ErrorCode::ConstraintViolation
            }
            DbError::Constraint(_) => true,
            _ => false,
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// How long a writer waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
    config: ClinicConfig,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        Self::open_with_config(path, ClinicConfig::default())
    }

    /// Open database at path with explicit business settings.
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: ClinicConfig) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let db = Self { conn, config };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        Self::open_in_memory_with_config(ClinicConfig::default())
    }

    /// Create in-memory database with explicit business settings.
    pub fn open_in_memory_with_config(config: ClinicConfig) -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn, config };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Business settings this store was opened with.
    pub fn config(&self) -> &ClinicConfig {
        &self.config
    }

    /// Begin a write transaction that takes the database write lock up front.
    ///
    /// Store methods called while the returned transaction is alive run inside
    /// it. Dropping it without `commit()` rolls everything back.
    pub fn immediate_transaction(&self) -> DbResult<Transaction<'_>> {
        Ok(Transaction::new_unchecked(
            &self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

// =========================================================================
// Column helpers
// =========================================================================

/// Audit columns, in the order [`audit_from_row`] expects them.
pub(crate) const AUDIT_COLUMNS: &str = "created_at, updated_at, created_by, updated_by";

/// Read the four audit columns starting at `idx`.
pub(crate) fn audit_from_row(row: &Row<'_>, idx: usize) -> rusqlite::Result<AuditStamp> {
    Ok(AuditStamp {
        created_at: row.get(idx)?,
        updated_at: row.get(idx + 1)?,
        created_by: row.get(idx + 2)?,
        updated_by: row.get(idx + 3)?,
    })
}

/// Convert an amount to stored minor units.
pub(crate) fn minor(amount: Decimal) -> DbResult<i64> {
    to_minor(amount).ok_or_else(|| {
        DbError::Constraint(format!(
            "Amount must be in whole cents and in range: {}",
            amount
        ))
    })
}

/// Error for a text column holding an unknown code.
pub(crate) fn invalid_code(idx: usize, code: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        Box::new(DbError::Constraint(format!("Unknown code: {}", code))),
    )
}

/// Store status enums as their text codes.
macro_rules! text_code_column {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.as_str()))
                }
            }

            impl FromSql for $ty {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    let code = value.as_str()?;
                    <$ty>::parse(code).ok_or_else(|| {
                        FromSqlError::Other(Box::new(DbError::Constraint(format!(
                            "Unknown {} code: {}",
                            stringify!($ty),
                            code
                        ))))
                    })
                }
            }
        )*
    };
}

text_code_column!(
    AppointmentStatus,
    ConsultationType,
    Gender,
    InvoiceStatus,
    PaymentMethod,
    TreatmentStatus,
);
