//! Doctor profile and availability database operations.

use chrono::{NaiveDate, Weekday};
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::{audit_from_row, invalid_code, Database, DbError, DbResult, AUDIT_COLUMNS};
use crate::models::{parse_weekday, weekday_code, AuditStamp, DoctorProfile, WeeklyAvailability, WEEK};

/// Appointment counts of one doctor, relative to a reference day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentCounts {
    /// Every appointment regardless of status or date
    pub total: u32,
    /// Completed during the calendar month of the reference day
    pub completed_this_month: u32,
    pub completed_today: u32,
    pub scheduled_today: u32,
}

impl Database {
    /// Insert a new doctor profile.
    pub fn insert_doctor(&self, doctor: &DoctorProfile) -> DbResult<()> {
        let specializations_json = serde_json::to_string(&doctor.specializations)?;
        self.conn.execute(
            r#"
            INSERT INTO doctor_profiles (
                id, user_id, branch_id, license_number, phone_number,
                years_of_experience, specializations, address, is_active,
                created_at, updated_at, created_by, updated_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                doctor.id,
                doctor.user_id,
                doctor.branch_id,
                doctor.license_number,
                doctor.phone_number,
                doctor.years_of_experience,
                specializations_json,
                doctor.address,
                doctor.is_active,
                doctor.audit.created_at,
                doctor.audit.updated_at,
                doctor.audit.created_by,
                doctor.audit.updated_by,
            ],
        )?;
        Ok(())
    }

    /// Get a doctor profile by ID.
    pub fn get_doctor(&self, id: &str) -> DbResult<Option<DoctorProfile>> {
        self.query_doctor("id", id)
    }

    /// Get the doctor profile owned by a user.
    pub fn get_doctor_by_user(&self, user_id: &str) -> DbResult<Option<DoctorProfile>> {
        self.query_doctor("user_id", user_id)
    }

    fn query_doctor(&self, column: &str, value: &str) -> DbResult<Option<DoctorProfile>> {
        self.conn
            .query_row(
                &format!(
                    r#"
                    SELECT id, user_id, branch_id, license_number, phone_number,
                           years_of_experience, specializations, address, is_active, {}
                    FROM doctor_profiles
                    WHERE {} = ?
                    "#,
                    AUDIT_COLUMNS, column
                ),
                [value],
                doctor_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List doctors of a branch.
    pub fn list_doctors_for_branch(&self, branch_id: &str) -> DbResult<Vec<DoctorProfile>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT id, user_id, branch_id, license_number, phone_number,
                   years_of_experience, specializations, address, is_active, {}
            FROM doctor_profiles
            WHERE branch_id = ?
            ORDER BY created_at
            "#,
            AUDIT_COLUMNS
        ))?;

        let rows = stmt.query_map([branch_id], doctor_row)?;

        let mut doctors = Vec::new();
        for row in rows {
            doctors.push(row?.try_into()?);
        }
        Ok(doctors)
    }

    // =========================================================================
    // Weekly availability
    // =========================================================================

    /// Insert an availability row unless one already exists for that day.
    ///
    /// Returns whether a row was inserted.
    pub fn insert_availability_if_absent(&self, entry: &WeeklyAvailability) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO weekly_availability (
                doctor_id, day, is_available, login_time, logout_time,
                break_start_time, break_end_time
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                entry.doctor_id,
                weekday_code(entry.day),
                entry.is_available,
                entry.login_time,
                entry.logout_time,
                entry.break_start_time,
                entry.break_end_time,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Replace the availability row for a day.
    pub fn upsert_availability(&self, entry: &WeeklyAvailability) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO weekly_availability (
                doctor_id, day, is_available, login_time, logout_time,
                break_start_time, break_end_time
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (doctor_id, day) DO UPDATE SET
                is_available = excluded.is_available,
                login_time = excluded.login_time,
                logout_time = excluded.logout_time,
                break_start_time = excluded.break_start_time,
                break_end_time = excluded.break_end_time
            "#,
            params![
                entry.doctor_id,
                weekday_code(entry.day),
                entry.is_available,
                entry.login_time,
                entry.logout_time,
                entry.break_start_time,
                entry.break_end_time,
            ],
        )?;
        Ok(())
    }

    /// Get the availability row for one day.
    pub fn get_availability(
        &self,
        doctor_id: &str,
        day: Weekday,
    ) -> DbResult<Option<WeeklyAvailability>> {
        self.conn
            .query_row(
                r#"
                SELECT doctor_id, day, is_available, login_time, logout_time,
                       break_start_time, break_end_time
                FROM weekly_availability
                WHERE doctor_id = ?1 AND day = ?2
                "#,
                params![doctor_id, weekday_code(day)],
                |row| {
                    let code: String = row.get(1)?;
                    Ok(WeeklyAvailability {
                        doctor_id: row.get(0)?,
                        day: parse_weekday(&code).ok_or_else(|| invalid_code(1, &code))?,
                        is_available: row.get(2)?,
                        login_time: row.get(3)?,
                        logout_time: row.get(4)?,
                        break_start_time: row.get(5)?,
                        break_end_time: row.get(6)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Availability for all seven days; days without a row are unavailable.
    pub fn weekly_availability(&self, doctor_id: &str) -> DbResult<Vec<WeeklyAvailability>> {
        WEEK.iter()
            .map(|day| {
                Ok(self
                    .get_availability(doctor_id, *day)?
                    .unwrap_or_else(|| WeeklyAvailability::unavailable(doctor_id, *day)))
            })
            .collect()
    }

    /// Create the default working week for a doctor, keeping existing days.
    pub fn set_default_availability(&self, doctor_id: &str) -> DbResult<()> {
        for day in WEEK {
            self.insert_availability_if_absent(&WeeklyAvailability::default_for(doctor_id, day))?;
        }
        Ok(())
    }
}

fn doctor_row(row: &Row<'_>) -> rusqlite::Result<DoctorRow> {
    Ok(DoctorRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        branch_id: row.get(2)?,
        license_number: row.get(3)?,
        phone_number: row.get(4)?,
        years_of_experience: row.get(5)?,
        specializations: row.get(6)?,
        address: row.get(7)?,
        is_active: row.get(8)?,
        audit: audit_from_row(row, 9)?,
    })
}

/// Intermediate row struct for database mapping.
struct DoctorRow {
    id: String,
    user_id: String,
    branch_id: String,
    license_number: Option<String>,
    phone_number: Option<String>,
    years_of_experience: u32,
    specializations: String,
    address: String,
    is_active: bool,
    audit: AuditStamp,
}

impl TryFrom<DoctorRow> for DoctorProfile {
    type Error = DbError;

    fn try_from(row: DoctorRow) -> Result<Self, Self::Error> {
        let specializations: Vec<String> = serde_json::from_str(&row.specializations)?;

        Ok(DoctorProfile {
            id: row.id,
            user_id: row.user_id,
            branch_id: row.branch_id,
            license_number: row.license_number,
            phone_number: row.phone_number,
            years_of_experience: row.years_of_experience,
            specializations,
            address: row.address,
            is_active: row.is_active,
            audit: row.audit,
        })
    }
}

impl Database {
    /// Treatment session counts of a doctor around `date`.
    pub fn doctor_session_counts(&self, doctor_id: &str, date: NaiveDate) -> DbResult<AppointmentCounts> {
        self.appointment_counts("treatment_sessions", doctor_id, date)
    }

    /// Consultation counts of a doctor around `date`.
    pub fn doctor_consultation_counts(
        &self,
        doctor_id: &str,
        date: NaiveDate,
    ) -> DbResult<AppointmentCounts> {
        self.appointment_counts("patient_consultations", doctor_id, date)
    }

    /// Distinct patients with a treatment prescribed by the doctor.
    pub fn count_assigned_patients(&self, doctor_id: &str) -> DbResult<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(DISTINCT patient_id) FROM patient_treatments WHERE doctor_id = ?",
            [doctor_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn appointment_counts(
        &self,
        table: &'static str,
        doctor_id: &str,
        date: NaiveDate,
    ) -> DbResult<AppointmentCounts> {
        let sql = format!(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(status = 'completed'
                    AND strftime('%Y-%m', date) = strftime('%Y-%m', ?2)), 0),
                COALESCE(SUM(status = 'completed' AND date = ?2), 0),
                COALESCE(SUM(status = 'scheduled' AND date = ?2), 0)
            FROM {}
            WHERE doctor_id = ?1
            "#,
            table
        );
        let counts = self.conn.query_row(&sql, params![doctor_id, date], |row| {
            Ok(AppointmentCounts {
                total: row.get(0)?,
                completed_this_month: row.get(1)?,
                completed_today: row.get(2)?,
                scheduled_today: row.get(3)?,
            })
        })?;
        Ok(counts)
    }
}
