//! Smart Physio Core Library
//!
//! Treatment tracking and billing engine for multi-branch physiotherapy clinics.
//!
//! # Architecture
//!
//! ```text
//!   Session save / delete ──► SessionLifecycle ──► relative counter update
//!                                   │                 (sessions_completed ± 1)
//!                                   │
//!   Treatment save ─────────► TreatmentLifecycle
//!                                   │
//!                          [COMMIT: one IMMEDIATE transaction]
//!                                   │
//!                           DomainEvent::TreatmentBillable
//!                                   │
//!                             EventDispatcher
//!                                   │
//!                                   ▼
//!   Consultation completed ──► BillingEngine ◄── Payment recorded
//!     (same transaction)        │   invoice sequence, totals,
//!                               │   settlement of status/balance
//!                               ▼
//!                         invoices / payments
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite store
//! - [`models`]: Domain types (Patient, PatientTreatment, Invoice, etc.)
//! - [`billing`]: Invoice creation and payment settlement
//! - [`lifecycle`]: Session, treatment, consultation and schedule saves
//! - [`access`]: Role resolution and access policy
//! - [`reports`]: Branch dashboard statistics
//! - [`config`]: Business settings

pub mod access;
pub mod billing;
pub mod config;
pub mod db;
pub mod lifecycle;
pub mod models;
pub mod reports;

// Re-export commonly used types
pub use access::{AccessError, Role};
pub use billing::{BillingEngine, BillingError, InvoiceOutcome};
pub use config::ClinicConfig;
pub use db::{Database, DbError};
pub use lifecycle::{
    ConsultationLifecycle, DomainEvent, EventDispatcher, LifecycleError, NewTreatment, Saved,
    ScheduleBook, SessionLifecycle, TreatmentLifecycle,
};
pub use models::{
    AppointmentStatus, AuditContext, Invoice, InvoiceStatus, Patient, PatientConsultation,
    PatientTreatment, Payment, PaymentMethod, PaymentRequest, TreatmentSession, TreatmentStatus,
};
pub use reports::{DashboardStats, DoctorDashboardStats};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;

use models::{Branch, ConsultationType, DoctorProfile, Gender, TreatmentProgram, User};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinicError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Precondition not met: {0}")]
    Precondition(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<DbError> for ClinicError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(what) => ClinicError::NotFound(what),
            other if other.is_constraint_violation() => ClinicError::Validation(other.to_string()),
            other => ClinicError::Database(other.to_string()),
        }
    }
}

impl From<BillingError> for ClinicError {
    fn from(e: BillingError) -> Self {
        match e {
            BillingError::Database(db) => db.into(),
            BillingError::Validation(msg) => ClinicError::Validation(msg),
            BillingError::Precondition(msg) => ClinicError::Precondition(msg),
            BillingError::NotFound(what) => ClinicError::NotFound(what),
        }
    }
}

impl From<LifecycleError> for ClinicError {
    fn from(e: LifecycleError) -> Self {
        match e {
            LifecycleError::Database(db) => db.into(),
            LifecycleError::Billing(billing) => billing.into(),
            LifecycleError::Validation(msg) => ClinicError::Validation(msg),
            LifecycleError::Precondition(msg) => ClinicError::Precondition(msg),
            LifecycleError::NotFound(what) => ClinicError::NotFound(what),
        }
    }
}

impl From<AccessError> for ClinicError {
    fn from(e: AccessError) -> Self {
        match e {
            AccessError::Database(db) => db.into(),
            AccessError::Forbidden(msg) => ClinicError::Forbidden(msg),
            AccessError::UnknownUser(user) => ClinicError::NotFound(format!("User {}", user)),
        }
    }
}

impl From<serde_json::Error> for ClinicError {
    fn from(e: serde_json::Error) -> Self {
        ClinicError::Serialization(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ClinicError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ClinicError::Database(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a clinic database at the given path.
#[uniffi::export]
pub fn open_clinic(path: String) -> Result<Arc<ClinicCore>, ClinicError> {
    let db = Database::open(&path)?;
    Ok(ClinicCore::wrap(db))
}

/// Open or create a clinic database with settings given as JSON.
#[uniffi::export]
pub fn open_clinic_with_config(
    path: String,
    config_json: String,
) -> Result<Arc<ClinicCore>, ClinicError> {
    let config = ClinicConfig::from_json_str(&config_json)?;
    let db = Database::open_with_config(&path, config)?;
    Ok(ClinicCore::wrap(db))
}

/// Create an in-memory clinic database (for testing).
#[uniffi::export]
pub fn open_clinic_in_memory() -> Result<Arc<ClinicCore>, ClinicError> {
    let db = Database::open_in_memory()?;
    Ok(ClinicCore::wrap(db))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct ClinicCore {
    db: Arc<Mutex<Database>>,
}

impl ClinicCore {
    fn wrap(db: Database) -> Arc<Self> {
        Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }
}

#[uniffi::export]
impl ClinicCore {
    // =========================================================================
    // Branches, Users and Doctors
    // =========================================================================

    /// Create a new branch.
    pub fn create_branch(
        &self,
        name: String,
        address: String,
        actor: Option<String>,
    ) -> Result<FfiBranch, ClinicError> {
        let db = self.db.lock()?;
        let branch = Branch::new(name, address, &audit(actor));
        db.insert_branch(&branch)?;
        Ok(branch.into())
    }

    /// List all branches by name.
    pub fn list_branches(&self) -> Result<Vec<FfiBranch>, ClinicError> {
        let db = self.db.lock()?;
        let branches = db.list_branches()?;
        Ok(branches.into_iter().map(|b| b.into()).collect())
    }

    /// Register a user identity.
    pub fn create_user(
        &self,
        username: String,
        full_name: String,
        is_superuser: bool,
    ) -> Result<String, ClinicError> {
        let db = self.db.lock()?;
        let user = if is_superuser {
            User::superuser(username, full_name)
        } else {
            User::new(username, full_name)
        };
        db.insert_user(&user)?;
        Ok(user.id)
    }

    /// Create a doctor profile with the default working week.
    pub fn create_doctor(
        &self,
        user_id: String,
        branch_id: String,
        actor: Option<String>,
    ) -> Result<String, ClinicError> {
        let db = self.db.lock()?;
        let doctor = DoctorProfile::new(user_id, branch_id, &audit(actor));
        let tx = db.immediate_transaction()?;
        db.insert_doctor(&doctor)?;
        db.set_default_availability(&doctor.id)?;
        tx.commit().map_err(DbError::from)?;
        Ok(doctor.id)
    }

    /// Resolve the role of a user.
    pub fn resolve_role(&self, user_id: String) -> Result<FfiRole, ClinicError> {
        let db = self.db.lock()?;
        Ok(Role::resolve(&db, &user_id)?.into())
    }

    // =========================================================================
    // Patients and Programs
    // =========================================================================

    /// Create a new patient.
    pub fn create_patient(
        &self,
        first_name: String,
        last_name: String,
        date_of_birth: String,
        gender: String,
        branch_id: Option<String>,
        actor: Option<String>,
    ) -> Result<FfiPatient, ClinicError> {
        let db = self.db.lock()?;
        let gender = Gender::parse(&gender)
            .ok_or_else(|| ClinicError::Validation(format!("Unknown gender: {}", gender)))?;
        let mut patient = Patient::new(
            first_name,
            last_name,
            parse_date(&date_of_birth)?,
            gender,
            &audit(actor),
        );
        patient.branch_id = branch_id;
        db.insert_patient(&patient)?;
        Ok(patient.into())
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, patient_id: String) -> Result<Option<FfiPatient>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.get_patient(&patient_id)?.map(|p| p.into()))
    }

    /// Create a treatment program offered by a branch.
    pub fn create_program(
        &self,
        name: String,
        rate_per_session: String,
        default_duration_days: u32,
        branch_id: String,
        actor: Option<String>,
    ) -> Result<String, ClinicError> {
        let db = self.db.lock()?;
        let program = TreatmentProgram::new(
            name,
            parse_money(&rate_per_session)?,
            default_duration_days,
            branch_id,
            &audit(actor),
        );
        db.insert_program(&program)?;
        Ok(program.id)
    }

    // =========================================================================
    // Treatments
    // =========================================================================

    /// Prescribe a treatment starting today.
    pub fn create_treatment(
        &self,
        patient_id: String,
        program_id: String,
        doctor_id: String,
        total_sessions: u32,
        session_rate: Option<String>,
        actor: Option<String>,
    ) -> Result<FfiTreatment, ClinicError> {
        let db = self.db.lock()?;
        let input = NewTreatment {
            patient_id,
            program_id,
            doctor_id,
            total_sessions,
            session_rate: session_rate.as_deref().map(parse_money).transpose()?,
            notes: String::new(),
        };
        let treatment = TreatmentLifecycle::new(&db).create_treatment(input, &audit(actor))?;
        Ok(treatment.into())
    }

    /// Get a treatment by ID.
    pub fn get_treatment(&self, treatment_id: String) -> Result<Option<FfiTreatment>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.get_treatment(&treatment_id)?.map(|t| t.into()))
    }

    /// List a patient's treatments.
    pub fn list_treatments(&self, patient_id: String) -> Result<Vec<FfiTreatment>, ClinicError> {
        let db = self.db.lock()?;
        let treatments = db.list_treatments_for_patient(&patient_id)?;
        Ok(treatments.into_iter().map(|t| t.into()).collect())
    }

    /// Change the status of a treatment.
    pub fn update_treatment_status(
        &self,
        treatment_id: String,
        status: String,
        actor: Option<String>,
    ) -> Result<FfiTreatmentSaved, ClinicError> {
        let db = self.db.lock()?;
        let status = TreatmentStatus::parse(&status)
            .ok_or_else(|| ClinicError::Validation(format!("Unknown treatment status: {}", status)))?;
        let saved = TreatmentLifecycle::new(&db).set_status(&treatment_id, status, &audit(actor))?;
        Ok(FfiTreatmentSaved {
            treatment: saved.record.into(),
            invoice_outcomes: outcomes(saved.invoice_outcomes),
        })
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Create a treatment session.
    pub fn create_session(
        &self,
        input: FfiSessionInput,
        actor: Option<String>,
    ) -> Result<FfiSessionSaved, ClinicError> {
        let db = self.db.lock()?;
        let ctx = audit(actor);
        let mut session = TreatmentSession::new(
            input.treatment_id,
            input.doctor_id,
            parse_date(&input.date)?,
            parse_time(&input.start_time)?,
            parse_time(&input.end_time)?,
            &ctx,
        );
        session.status = parse_appointment_status(&input.status)?;
        session.assessment_notes = input.assessment_notes;

        let saved = SessionLifecycle::new(&db).create_session(session, &ctx)?;
        Ok(saved.into())
    }

    /// Update a session; status transitions cascade to its treatment.
    pub fn update_session(
        &self,
        session_id: String,
        input: FfiSessionInput,
        actor: Option<String>,
    ) -> Result<FfiSessionSaved, ClinicError> {
        let db = self.db.lock()?;
        let mut session = db
            .get_session(&session_id)?
            .ok_or_else(|| ClinicError::NotFound(format!("Session {}", session_id)))?;
        session.treatment_id = input.treatment_id;
        session.doctor_id = input.doctor_id;
        session.date = parse_date(&input.date)?;
        session.start_time = parse_time(&input.start_time)?;
        session.end_time = parse_time(&input.end_time)?;
        session.status = parse_appointment_status(&input.status)?;
        session.assessment_notes = input.assessment_notes;

        let saved = SessionLifecycle::new(&db).update_session(session, &audit(actor))?;
        Ok(saved.into())
    }

    /// Delete a session, reverting its completion first.
    pub fn delete_session(
        &self,
        session_id: String,
        actor: Option<String>,
    ) -> Result<Vec<FfiInvoiceOutcome>, ClinicError> {
        let db = self.db.lock()?;
        let saved = SessionLifecycle::new(&db).delete_session(&session_id, &audit(actor))?;
        Ok(outcomes(saved.invoice_outcomes))
    }

    // =========================================================================
    // Consultations
    // =========================================================================

    /// Schedule a consultation.
    pub fn create_consultation(
        &self,
        patient_id: String,
        doctor_id: String,
        consultation_type: String,
        date: String,
        start_time: String,
        end_time: String,
        actor: Option<String>,
    ) -> Result<FfiConsultation, ClinicError> {
        let db = self.db.lock()?;
        let ctx = audit(actor);
        let consultation_type = ConsultationType::parse(&consultation_type).ok_or_else(|| {
            ClinicError::Validation(format!("Unknown consultation type: {}", consultation_type))
        })?;
        let consultation = PatientConsultation::new(
            patient_id,
            doctor_id,
            consultation_type,
            parse_date(&date)?,
            parse_time(&start_time)?,
            parse_time(&end_time)?,
            &ctx,
        );
        let consultation =
            ConsultationLifecycle::new(&db).create_consultation(consultation, &ctx)?;
        Ok(consultation.into())
    }

    /// Change the status of a consultation; completing it issues its invoice.
    pub fn update_consultation_status(
        &self,
        consultation_id: String,
        status: String,
        actor: Option<String>,
    ) -> Result<FfiConsultationSaved, ClinicError> {
        let db = self.db.lock()?;
        let mut consultation = db
            .get_consultation(&consultation_id)?
            .ok_or_else(|| ClinicError::NotFound(format!("Consultation {}", consultation_id)))?;
        consultation.status = parse_appointment_status(&status)?;

        let (consultation, invoice) =
            ConsultationLifecycle::new(&db).update_consultation(consultation, &audit(actor))?;
        Ok(FfiConsultationSaved {
            consultation: consultation.into(),
            invoice: invoice.map(|i| i.into()),
        })
    }

    // =========================================================================
    // Invoices and Payments
    // =========================================================================

    /// Get an invoice by ID.
    pub fn get_invoice(&self, invoice_id: String) -> Result<Option<FfiInvoice>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.get_invoice(&invoice_id)?.map(|i| i.into()))
    }

    /// Get the invoice of a patient's treatment.
    pub fn get_treatment_invoice(
        &self,
        patient_id: String,
        treatment_id: String,
    ) -> Result<Option<FfiInvoice>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db
            .get_treatment_invoice(&patient_id, &treatment_id)?
            .map(|i| i.into()))
    }

    /// List a patient's invoices, newest first.
    pub fn list_invoices(&self, patient_id: String) -> Result<Vec<FfiInvoice>, ClinicError> {
        let db = self.db.lock()?;
        let invoices = db.list_invoices_for_patient(&patient_id)?;
        Ok(invoices.into_iter().map(|i| i.into()).collect())
    }

    /// Record a payment against an invoice.
    pub fn record_payment(
        &self,
        invoice_id: String,
        amount: String,
        discount_amount: String,
        method: String,
        reference: Option<String>,
        notes: Option<String>,
        actor: Option<String>,
    ) -> Result<FfiPayment, ClinicError> {
        let db = self.db.lock()?;
        let method = PaymentMethod::parse(&method)
            .ok_or_else(|| ClinicError::Validation(format!("Unknown payment method: {}", method)))?;
        let request = PaymentRequest {
            amount: parse_money(&amount)?,
            discount_amount: parse_money(&discount_amount)?,
            method,
            reference,
            notes,
        };
        let payment = BillingEngine::new(&db).record_payment(&invoice_id, request, &audit(actor))?;
        Ok(payment.into())
    }

    /// List the payments of an invoice.
    pub fn list_payments(&self, invoice_id: String) -> Result<Vec<FfiPayment>, ClinicError> {
        let db = self.db.lock()?;
        let payments = db.list_payments_for_invoice(&invoice_id)?;
        Ok(payments.into_iter().map(|p| p.into()).collect())
    }

    // =========================================================================
    // Reports
    // =========================================================================

    /// Dashboard counts of a branch for a day.
    pub fn dashboard(&self, branch_id: String, date: String) -> Result<FfiDashboard, ClinicError> {
        let db = self.db.lock()?;
        let stats = DashboardStats::for_branch(&db, &branch_id, parse_date(&date)?)?;
        Ok(stats.into())
    }

    /// A doctor's appointment counts for `date` and its month.
    pub fn doctor_dashboard(
        &self,
        doctor_id: String,
        date: String,
    ) -> Result<FfiDoctorDashboard, ClinicError> {
        let db = self.db.lock()?;
        let stats = DoctorDashboardStats::for_doctor(&db, &doctor_id, parse_date(&date)?)?;
        Ok(stats.into())
    }
}

// =========================================================================
// Input Parsing
// =========================================================================

fn audit(actor: Option<String>) -> AuditContext {
    AuditContext { actor }
}

fn parse_date(value: &str) -> Result<NaiveDate, ClinicError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| ClinicError::Validation(format!("Invalid date '{}': {}", value, e)))
}

fn parse_time(value: &str) -> Result<NaiveTime, ClinicError> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|e| ClinicError::Validation(format!("Invalid time '{}': {}", value, e)))
}

fn parse_money(value: &str) -> Result<Decimal, ClinicError> {
    let amount = Decimal::from_str(value.trim())
        .map_err(|e| ClinicError::Validation(format!("Invalid amount '{}': {}", value, e)))?;
    if !models::fits_currency_scale(amount) {
        return Err(ClinicError::Validation(format!(
            "Amount '{}' has fractions of a cent",
            value
        )));
    }
    Ok(amount)
}

fn parse_appointment_status(value: &str) -> Result<AppointmentStatus, ClinicError> {
    AppointmentStatus::parse(value)
        .ok_or_else(|| ClinicError::Validation(format!("Unknown status: {}", value)))
}

fn outcomes(outcomes: Vec<InvoiceOutcome>) -> Vec<FfiInvoiceOutcome> {
    outcomes.into_iter().map(|o| o.into()).collect()
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe branch.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBranch {
    pub id: String,
    pub name: String,
    pub address: String,
    pub is_active: bool,
}

impl From<Branch> for FfiBranch {
    fn from(branch: Branch) -> Self {
        Self {
            id: branch.id,
            name: branch.name,
            address: branch.address,
            is_active: branch.is_active,
        }
    }
}

/// FFI-safe role.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum FfiRole {
    Superadmin,
    BranchAdmin { branch_id: String },
    Doctor { doctor_id: String, branch_id: String },
    Staff { branch_id: Option<String> },
    Other,
}

impl From<Role> for FfiRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Superadmin => FfiRole::Superadmin,
            Role::BranchAdmin { branch_id } => FfiRole::BranchAdmin { branch_id },
            Role::Doctor {
                doctor_id,
                branch_id,
            } => FfiRole::Doctor {
                doctor_id,
                branch_id,
            },
            Role::Staff { branch_id } => FfiRole::Staff { branch_id },
            Role::Other => FfiRole::Other,
        }
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub full_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub branch_id: Option<String>,
    pub is_active: bool,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            full_name: patient.full_name(),
            id: patient.id,
            date_of_birth: patient.date_of_birth.to_string(),
            gender: patient.gender.as_str().to_string(),
            branch_id: patient.branch_id,
            is_active: patient.is_active,
        }
    }
}

/// FFI-safe treatment with derived amounts.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTreatment {
    pub id: String,
    pub patient_id: String,
    pub program_id: String,
    pub doctor_id: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub total_sessions: u32,
    pub sessions_completed: u32,
    pub pending_sessions: u32,
    pub session_rate: String,
    pub total_cost: String,
    pub balance_due: String,
    pub status: String,
    pub is_active: bool,
}

impl From<PatientTreatment> for FfiTreatment {
    fn from(treatment: PatientTreatment) -> Self {
        Self {
            pending_sessions: treatment.pending_sessions(),
            total_cost: treatment.total_cost().to_string(),
            balance_due: treatment.balance_due().to_string(),
            id: treatment.id,
            patient_id: treatment.patient_id,
            program_id: treatment.program_id,
            doctor_id: treatment.doctor_id,
            start_date: treatment.start_date.to_string(),
            end_date: treatment.end_date.map(|d| d.to_string()),
            total_sessions: treatment.total_sessions,
            sessions_completed: treatment.sessions_completed,
            session_rate: treatment.session_rate.to_string(),
            status: treatment.status.as_str().to_string(),
            is_active: treatment.is_active,
        }
    }
}

/// Saved treatment and the invoicing it triggered.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTreatmentSaved {
    pub treatment: FfiTreatment,
    pub invoice_outcomes: Vec<FfiInvoiceOutcome>,
}

/// FFI-safe session input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSessionInput {
    pub treatment_id: Option<String>,
    pub doctor_id: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM` or `HH:MM:SS`
    pub start_time: String,
    pub end_time: String,
    pub status: String,
    pub assessment_notes: String,
}

/// FFI-safe session.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSession {
    pub id: String,
    pub treatment_id: Option<String>,
    pub doctor_id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub status: String,
    pub assessment_notes: String,
}

impl From<TreatmentSession> for FfiSession {
    fn from(session: TreatmentSession) -> Self {
        Self {
            id: session.id,
            treatment_id: session.treatment_id,
            doctor_id: session.doctor_id,
            date: session.date.to_string(),
            start_time: session.start_time.format("%H:%M:%S").to_string(),
            end_time: session.end_time.format("%H:%M:%S").to_string(),
            status: session.status.as_str().to_string(),
            assessment_notes: session.assessment_notes,
        }
    }
}

/// Saved session and the invoicing it triggered.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSessionSaved {
    pub session: FfiSession,
    pub invoice_outcomes: Vec<FfiInvoiceOutcome>,
}

impl From<Saved<TreatmentSession>> for FfiSessionSaved {
    fn from(saved: Saved<TreatmentSession>) -> Self {
        Self {
            session: saved.record.into(),
            invoice_outcomes: outcomes(saved.invoice_outcomes),
        }
    }
}

/// FFI-safe consultation.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiConsultation {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub consultation_type: String,
    pub status: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

impl From<PatientConsultation> for FfiConsultation {
    fn from(c: PatientConsultation) -> Self {
        Self {
            id: c.id,
            patient_id: c.patient_id,
            doctor_id: c.doctor_id,
            consultation_type: c.consultation_type.as_str().to_string(),
            status: c.status.as_str().to_string(),
            date: c.date.to_string(),
            start_time: c.start_time.format("%H:%M:%S").to_string(),
            end_time: c.end_time.format("%H:%M:%S").to_string(),
        }
    }
}

/// Saved consultation and the invoice its completion issued.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiConsultationSaved {
    pub consultation: FfiConsultation,
    pub invoice: Option<FfiInvoice>,
}

/// FFI-safe invoice.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInvoice {
    pub id: String,
    pub invoice_number: String,
    pub patient_id: String,
    pub consultation_id: Option<String>,
    pub treatment_id: Option<String>,
    pub invoice_date: String,
    pub due_date: String,
    pub status: String,
    pub notes: String,
    pub total: String,
    pub balance: String,
    pub amount_paid: String,
}

impl From<Invoice> for FfiInvoice {
    fn from(invoice: Invoice) -> Self {
        Self {
            amount_paid: invoice.amount_paid().to_string(),
            id: invoice.id,
            invoice_number: invoice.invoice_number,
            patient_id: invoice.patient_id,
            consultation_id: invoice.consultation_id,
            treatment_id: invoice.treatment_id,
            invoice_date: invoice.invoice_date.to_string(),
            due_date: invoice.due_date.to_string(),
            status: invoice.status.as_str().to_string(),
            notes: invoice.notes,
            total: invoice.total.to_string(),
            balance: invoice.balance.to_string(),
        }
    }
}

/// FFI-safe invoice creation outcome.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum FfiInvoiceOutcome {
    Created { invoice_number: String },
    AlreadyExists,
    Failed { reason: String },
}

impl From<InvoiceOutcome> for FfiInvoiceOutcome {
    fn from(outcome: InvoiceOutcome) -> Self {
        match outcome {
            InvoiceOutcome::Created { invoice_number } => {
                FfiInvoiceOutcome::Created { invoice_number }
            }
            InvoiceOutcome::AlreadyExists => FfiInvoiceOutcome::AlreadyExists,
            InvoiceOutcome::Failed { reason } => FfiInvoiceOutcome::Failed { reason },
        }
    }
}

/// FFI-safe payment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPayment {
    pub id: String,
    pub invoice_id: String,
    pub amount: String,
    pub discount_amount: String,
    pub payment_date: String,
    pub method: String,
    pub reference: String,
    pub notes: Option<String>,
}

impl From<Payment> for FfiPayment {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            invoice_id: payment.invoice_id,
            amount: payment.amount.to_string(),
            discount_amount: payment.discount_amount.to_string(),
            payment_date: payment.payment_date.to_string(),
            method: payment.method.as_str().to_string(),
            reference: payment.reference,
            notes: payment.notes,
        }
    }
}

/// FFI-safe dashboard statistics.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDashboard {
    pub date: String,
    pub expiring_treatments: Vec<FfiTreatment>,
    pub active_patients: u32,
    pub consultations_today: u32,
    pub sessions_today: u32,
}

impl From<DashboardStats> for FfiDashboard {
    fn from(stats: DashboardStats) -> Self {
        Self {
            date: stats.date.to_string(),
            expiring_treatments: stats
                .expiring_treatments
                .into_iter()
                .map(|t| t.into())
                .collect(),
            active_patients: stats.active_patients,
            consultations_today: stats.consultations_today,
            sessions_today: stats.sessions_today,
        }
    }
}

/// FFI-safe per-doctor dashboard statistics.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoctorDashboard {
    pub date: String,
    pub doctor_id: String,
    pub total_sessions: u32,
    pub monthly_sessions: u32,
    pub todays_completed_sessions: u32,
    pub scheduled_sessions_today: u32,
    pub total_consultations: u32,
    pub monthly_consultations: u32,
    pub todays_completed_consultations: u32,
    pub scheduled_consultations_today: u32,
    pub assigned_patients: u32,
}

impl From<DoctorDashboardStats> for FfiDoctorDashboard {
    fn from(stats: DoctorDashboardStats) -> Self {
        Self {
            date: stats.date.to_string(),
            doctor_id: stats.doctor_id,
            total_sessions: stats.sessions.total,
            monthly_sessions: stats.sessions.completed_this_month,
            todays_completed_sessions: stats.sessions.completed_today,
            scheduled_sessions_today: stats.sessions.scheduled_today,
            total_consultations: stats.consultations.total,
            monthly_consultations: stats.consultations.completed_this_month,
            todays_completed_consultations: stats.consultations.completed_today,
            scheduled_consultations_today: stats.consultations.scheduled_today,
            assigned_patients: stats.assigned_patients,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facade_treatment_flow() {
        let core = open_clinic_in_memory().unwrap();
        let branch = core
            .create_branch("Central".into(), "1 Main St".into(), None)
            .unwrap();
        assert_eq!(core.list_branches().unwrap().len(), 1);
        let user_id = core
            .create_user("doc".into(), "Doc".into(), false)
            .unwrap();
        let doctor_id = core
            .create_doctor(user_id.clone(), branch.id.clone(), None)
            .unwrap();
        assert_eq!(
            core.resolve_role(user_id).unwrap(),
            FfiRole::Doctor {
                doctor_id: doctor_id.clone(),
                branch_id: branch.id.clone()
            }
        );

        let patient = core
            .create_patient(
                "Asha".into(),
                "Rao".into(),
                "1990-06-15".into(),
                "F".into(),
                Some(branch.id.clone()),
                None,
            )
            .unwrap();
        let program_id = core
            .create_program("Knee rehab".into(), "500".into(), 30, branch.id.clone(), None)
            .unwrap();
        let treatment = core
            .create_treatment(patient.id.clone(), program_id, doctor_id.clone(), 2, None, None)
            .unwrap();
        assert_eq!(treatment.total_cost, "1000.00");
        assert_eq!(core.list_treatments(patient.id.clone()).unwrap().len(), 1);

        let today = models::today().to_string();
        let saved = core
            .create_session(
                FfiSessionInput {
                    treatment_id: Some(treatment.id.clone()),
                    doctor_id,
                    date: today,
                    start_time: "09:00".into(),
                    end_time: "10:00".into(),
                    status: "completed".into(),
                    assessment_notes: String::new(),
                },
                Some("doc-user".into()),
            )
            .unwrap();
        assert!(matches!(
            saved.invoice_outcomes.as_slice(),
            [FfiInvoiceOutcome::Created { .. }]
        ));

        let invoice = core
            .get_treatment_invoice(patient.id.clone(), treatment.id)
            .unwrap()
            .unwrap();
        let payment = core
            .record_payment(
                invoice.id.clone(),
                "1000".into(),
                "0".into(),
                "card".into(),
                None,
                None,
                None,
            )
            .unwrap();
        assert_eq!(payment.reference, format!("PAY-{}-1", invoice.invoice_number));
        assert_eq!(core.get_invoice(invoice.id).unwrap().unwrap().status, "paid");
    }

    #[test]
    fn test_errors_are_classified() {
        let core = open_clinic_in_memory().unwrap();
        assert!(matches!(
            core.create_patient(
                "A".into(),
                "B".into(),
                "15/06/1990".into(),
                "F".into(),
                None,
                None
            ),
            Err(ClinicError::Validation(_))
        ));
        assert!(matches!(
            core.update_treatment_status("missing".into(), "ongoing".into(), None),
            Err(ClinicError::NotFound(_))
        ));
        assert!(matches!(
            core.record_payment(
                "missing".into(),
                "10".into(),
                "0".into(),
                "bitcoin".into(),
                None,
                None,
                None
            ),
            Err(ClinicError::Validation(_))
        ));
        assert!(matches!(
            core.create_program("Spine care".into(), "350.505".into(), 21, "b".into(), None),
            Err(ClinicError::Validation(_))
        ));
    }

    #[test]
    fn test_open_with_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clinic.db");
        let core = open_clinic_with_config(
            path.to_string_lossy().into_owned(),
            r#"{"consultation_fee": "750"}"#.into(),
        )
        .unwrap();
        assert!(core.list_invoices("nobody".into()).unwrap().is_empty());

        assert!(matches!(
            open_clinic_with_config(path.to_string_lossy().into_owned(), "{".into()),
            Err(ClinicError::Serialization(_))
        ));
    }
}
