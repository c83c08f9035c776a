//! Weekly schedules for doctors and patients.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::audit::{AuditContext, AuditStamp};

/// All weekdays, Monday first.
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Three-letter storage code for a weekday.
pub fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "mon",
        Weekday::Tue => "tue",
        Weekday::Wed => "wed",
        Weekday::Thu => "thu",
        Weekday::Fri => "fri",
        Weekday::Sat => "sat",
        Weekday::Sun => "sun",
    }
}

/// Parse a storage code produced by [`weekday_code`].
pub fn parse_weekday(code: &str) -> Option<Weekday> {
    WEEK.iter().copied().find(|day| weekday_code(*day) == code)
}

/// Whole minutes between two times of day (negative if `end` precedes `start`).
pub fn minutes_between(start: NaiveTime, end: NaiveTime) -> i64 {
    (end - start).num_minutes()
}

/// One day of a doctor's working week.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeeklyAvailability {
    pub doctor_id: String,
    pub day: Weekday,
    pub is_available: bool,
    pub login_time: Option<NaiveTime>,
    pub logout_time: Option<NaiveTime>,
    pub break_start_time: Option<NaiveTime>,
    pub break_end_time: Option<NaiveTime>,
}

impl WeeklyAvailability {
    /// Default entry: weekdays 09:00-17:00, weekends off.
    pub fn default_for(doctor_id: &str, day: Weekday) -> Self {
        let weekend = matches!(day, Weekday::Sat | Weekday::Sun);
        Self {
            doctor_id: doctor_id.to_string(),
            day,
            is_available: !weekend,
            login_time: (!weekend).then(|| NaiveTime::from_hms_opt(9, 0, 0)).flatten(),
            logout_time: (!weekend).then(|| NaiveTime::from_hms_opt(17, 0, 0)).flatten(),
            break_start_time: None,
            break_end_time: None,
        }
    }

    /// Entry reported for a day with no stored row.
    pub fn unavailable(doctor_id: &str, day: Weekday) -> Self {
        Self {
            doctor_id: doctor_id.to_string(),
            day,
            is_available: false,
            login_time: None,
            logout_time: None,
            break_start_time: None,
            break_end_time: None,
        }
    }
}

/// A recurring weekly slot for a patient's treatment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientWeeklySchedule {
    pub id: String,
    /// Owning treatment; unique together with `day_of_week`
    pub treatment_id: String,
    pub day_of_week: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub notes: String,
    pub audit: AuditStamp,
}

impl PatientWeeklySchedule {
    pub fn new(
        treatment_id: String,
        day_of_week: Weekday,
        start_time: NaiveTime,
        end_time: NaiveTime,
        ctx: &AuditContext,
    ) -> Self {
        Self {
            id: super::new_id(),
            treatment_id,
            day_of_week,
            start_time,
            end_time,
            notes: String::new(),
            audit: AuditStamp::new(ctx),
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        minutes_between(self.start_time, self.end_time)
    }

    /// Display form, e.g. `"09:00 - 10:00"`.
    pub fn time_slot(&self) -> String {
        format!(
            "{} - {}",
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }
}
