//! SQLite schema definition.

/// Complete database schema for the clinic store.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Users, Branches and Roles
-- ============================================================================

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL,
    is_superuser INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS branches (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    address TEXT NOT NULL DEFAULT '',
    phone_number TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL DEFAULT '',
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    created_by TEXT,
    updated_by TEXT
);

CREATE TABLE IF NOT EXISTS branch_admins (
    user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
    branch_id TEXT NOT NULL REFERENCES branches(id) ON DELETE CASCADE,
    phone_number TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS staff_profiles (
    user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
    branch_id TEXT REFERENCES branches(id) ON DELETE SET NULL,
    position TEXT NOT NULL,
    joining_date TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1
);

-- ============================================================================
-- Doctors
-- ============================================================================

CREATE TABLE IF NOT EXISTS doctor_profiles (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    branch_id TEXT NOT NULL REFERENCES branches(id) ON DELETE CASCADE,
    license_number TEXT,
    phone_number TEXT,
    years_of_experience INTEGER NOT NULL DEFAULT 0,
    specializations TEXT NOT NULL DEFAULT '[]',   -- JSON array of strings
    address TEXT NOT NULL DEFAULT '',
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    created_by TEXT,
    updated_by TEXT
);

CREATE INDEX IF NOT EXISTS idx_doctors_branch ON doctor_profiles(branch_id);

CREATE TABLE IF NOT EXISTS weekly_availability (
    doctor_id TEXT NOT NULL REFERENCES doctor_profiles(id) ON DELETE CASCADE,
    day TEXT NOT NULL CHECK (day IN ('mon', 'tue', 'wed', 'thu', 'fri', 'sat', 'sun')),
    is_available INTEGER NOT NULL DEFAULT 1,
    login_time TEXT,
    logout_time TEXT,
    break_start_time TEXT,
    break_end_time TEXT,
    PRIMARY KEY (doctor_id, day)
);

-- ============================================================================
-- Patients and Programs
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    date_of_birth TEXT NOT NULL,
    gender TEXT NOT NULL CHECK (gender IN ('M', 'F', 'O')),
    address TEXT NOT NULL DEFAULT '',
    phone TEXT NOT NULL DEFAULT '',
    email TEXT UNIQUE,
    emergency_contact TEXT,
    emergency_phone TEXT,
    medical_history TEXT,
    allergies TEXT,
    current_medications TEXT,
    branch_id TEXT REFERENCES branches(id) ON DELETE CASCADE,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    created_by TEXT,
    updated_by TEXT
);

CREATE INDEX IF NOT EXISTS idx_patients_branch ON patients(branch_id);
CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(last_name, first_name);

CREATE TABLE IF NOT EXISTS treatment_programs (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    rate_per_session INTEGER NOT NULL CHECK (rate_per_session >= 0),   -- minor units
    default_duration_days INTEGER NOT NULL DEFAULT 0,
    branch_id TEXT NOT NULL REFERENCES branches(id) ON DELETE CASCADE,
    doctor_ids TEXT NOT NULL DEFAULT '[]',        -- JSON array of doctor IDs
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    created_by TEXT,
    updated_by TEXT
);

-- ============================================================================
-- Treatments and Sessions
-- ============================================================================

CREATE TABLE IF NOT EXISTS patient_treatments (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    program_id TEXT NOT NULL REFERENCES treatment_programs(id) ON DELETE RESTRICT,
    doctor_id TEXT NOT NULL REFERENCES doctor_profiles(id) ON DELETE RESTRICT,
    start_date TEXT NOT NULL,
    end_date TEXT,
    total_sessions INTEGER NOT NULL CHECK (total_sessions >= 1),
    session_rate INTEGER NOT NULL CHECK (session_rate >= 0),           -- minor units
    sessions_completed INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'ongoing'
        CHECK (status IN ('prescribed', 'ongoing', 'completed', 'cancelled')),
    notes TEXT NOT NULL DEFAULT '',
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    created_by TEXT,
    updated_by TEXT,
    CHECK (sessions_completed >= 0 AND sessions_completed <= total_sessions)
);

-- At most one active treatment per (patient, program)
CREATE UNIQUE INDEX IF NOT EXISTS idx_treatments_active_unique
    ON patient_treatments(patient_id, program_id) WHERE is_active = 1;
CREATE INDEX IF NOT EXISTS idx_treatments_patient ON patient_treatments(patient_id);
CREATE INDEX IF NOT EXISTS idx_treatments_status ON patient_treatments(status);

CREATE TABLE IF NOT EXISTS treatment_sessions (
    id TEXT PRIMARY KEY,
    treatment_id TEXT REFERENCES patient_treatments(id) ON DELETE CASCADE,
    doctor_id TEXT NOT NULL REFERENCES doctor_profiles(id) ON DELETE RESTRICT,
    date TEXT NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    assessment_notes TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'scheduled'
        CHECK (status IN ('scheduled', 'completed', 'cancelled', 'no_show')),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    created_by TEXT,
    updated_by TEXT
);

CREATE INDEX IF NOT EXISTS idx_sessions_treatment ON treatment_sessions(treatment_id);
CREATE INDEX IF NOT EXISTS idx_sessions_date ON treatment_sessions(date);

CREATE TABLE IF NOT EXISTS patient_weekly_schedules (
    id TEXT PRIMARY KEY,
    treatment_id TEXT NOT NULL REFERENCES patient_treatments(id) ON DELETE CASCADE,
    day_of_week TEXT NOT NULL CHECK (day_of_week IN ('mon', 'tue', 'wed', 'thu', 'fri', 'sat', 'sun')),
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    notes TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    created_by TEXT,
    updated_by TEXT,
    UNIQUE (treatment_id, day_of_week)
);

-- ============================================================================
-- Consultations
-- ============================================================================

CREATE TABLE IF NOT EXISTS patient_consultations (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    doctor_id TEXT NOT NULL REFERENCES doctor_profiles(id) ON DELETE RESTRICT,
    consultation_type TEXT NOT NULL
        CHECK (consultation_type IN ('initial', 'followup', 'emergency', 'routine')),
    status TEXT NOT NULL DEFAULT 'scheduled'
        CHECK (status IN ('scheduled', 'completed', 'cancelled', 'no_show')),
    date TEXT NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    notes TEXT NOT NULL DEFAULT '',
    height_cm REAL,
    weight_kg REAL,
    blood_pressure TEXT NOT NULL DEFAULT '',
    pulse INTEGER,
    oxygen_saturation INTEGER CHECK (oxygen_saturation BETWEEN 0 AND 100),
    chief_complaint TEXT NOT NULL DEFAULT '',
    primary_diagnosis TEXT NOT NULL DEFAULT '',
    secondary_diagnosis TEXT NOT NULL DEFAULT '',
    follow_up_date TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    created_by TEXT,
    updated_by TEXT
);

CREATE INDEX IF NOT EXISTS idx_consultations_patient ON patient_consultations(patient_id);
CREATE INDEX IF NOT EXISTS idx_consultations_date ON patient_consultations(date);

-- ============================================================================
-- Invoices and Payments
-- ============================================================================

CREATE TABLE IF NOT EXISTS invoices (
    id TEXT PRIMARY KEY,
    invoice_number TEXT NOT NULL UNIQUE,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE RESTRICT,
    consultation_id TEXT REFERENCES patient_consultations(id) ON DELETE CASCADE,
    treatment_id TEXT REFERENCES patient_treatments(id) ON DELETE CASCADE,
    invoice_date TEXT NOT NULL,
    due_date TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'draft'
        CHECK (status IN ('draft', 'sent', 'paid', 'partially_paid', 'overdue')),
    notes TEXT NOT NULL DEFAULT '',
    total INTEGER NOT NULL CHECK (total >= 0),         -- minor units
    balance INTEGER NOT NULL CHECK (balance >= 0),     -- minor units
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    created_by TEXT,
    updated_by TEXT
);

-- One invoice per (patient, treatment) and per consultation
CREATE UNIQUE INDEX IF NOT EXISTS idx_invoices_treatment_unique
    ON invoices(patient_id, treatment_id) WHERE treatment_id IS NOT NULL;
CREATE UNIQUE INDEX IF NOT EXISTS idx_invoices_consultation_unique
    ON invoices(consultation_id) WHERE consultation_id IS NOT NULL;
CREATE INDEX IF NOT EXISTS idx_invoices_patient ON invoices(patient_id);

-- Invoice number sequence (single row, bumped inside the creating transaction)
CREATE TABLE IF NOT EXISTS invoice_sequence (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    last_value INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO invoice_sequence (id, last_value) VALUES (1, 0);

CREATE TABLE IF NOT EXISTS payments (
    id TEXT PRIMARY KEY,
    invoice_id TEXT NOT NULL REFERENCES invoices(id) ON DELETE RESTRICT,
    amount INTEGER NOT NULL CHECK (amount > 0),                     -- minor units
    discount_amount INTEGER NOT NULL DEFAULT 0 CHECK (discount_amount >= 0),
    payment_date TEXT NOT NULL,
    method TEXT NOT NULL CHECK (method IN ('cash', 'card', 'insurance')),
    reference TEXT NOT NULL UNIQUE,
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    created_by TEXT,
    updated_by TEXT
);

CREATE INDEX IF NOT EXISTS idx_payments_invoice ON payments(invoice_id);
"#;
