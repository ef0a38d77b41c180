// libs/schedule-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// SCHEDULE MODELS
// ==============================================================================

/// A discrete bookable time unit within a doctor's day. The label is the
/// unique key within a (doctor, date) pair; appointments reference it
/// verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slot {
    pub time: String,
    pub position: i32,
    pub is_booked: bool,
}

/// The full set of slots a doctor has defined for one calendar date.
/// One ScheduleDay per (doctor_id, schedule_date); re-creating a day
/// replaces the previous slot set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleDay {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub schedule_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_minutes: i32,
    pub slots: Vec<Slot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row shape of the `doctor_schedules` collection (slots live in their own
/// collection so they can be conditionally updated one at a time).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleDayRow {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub schedule_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduleDayRow {
    pub fn into_day(self, slots: Vec<Slot>) -> ScheduleDay {
        ScheduleDay {
            id: self.id,
            doctor_id: self.doctor_id,
            schedule_date: self.schedule_date,
            start_time: self.start_time,
            end_time: self.end_time,
            slot_minutes: self.slot_minutes,
            slots,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Row shape of the `schedule_slots` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotRow {
    pub doctor_id: Uuid,
    pub schedule_date: NaiveDate,
    pub slot_time: String,
    pub position: i32,
    pub is_booked: bool,
}

impl SlotRow {
    pub fn into_slot(self) -> Slot {
        Slot {
            time: self.slot_time,
            position: self.position,
            is_booked: self.is_booked,
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleRequest {
    pub schedule_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum ScheduleError {
    #[error("Schedule not found")]
    NotFound,

    #[error("Slot not found")]
    SlotNotFound,

    #[error("Slot already booked")]
    SlotAlreadyBooked,

    #[error("Schedule has booked slots and cannot be replaced")]
    Conflict,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Transient(String),
}
