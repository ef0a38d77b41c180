// libs/booking-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use schedule_cell::models::ScheduleError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// A patient's claim on a specific slot. Records are never deleted;
/// cancellation is a status change, which keeps the audit trail and
/// distinguishes a cancelled booking from a slot that was never taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentRecord {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub patient_display_name: String,
    pub appointment_date: NaiveDate,
    pub slot_time: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub patient_display_name: String,
    pub appointment_date: NaiveDate,
    pub slot_time: String,
}

/// Identifies one booking for a lifecycle transition: the ledger key is
/// (doctor, patient, date, slot label).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentKeyRequest {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub appointment_date: NaiveDate,
    pub slot_time: String,
}

/// Read-side projection of one patient's history, partitioned by status.
/// Within each partition records keep booking order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientAppointments {
    pub pending: Vec<AppointmentRecord>,
    pub completed: Vec<AppointmentRecord>,
    pub cancelled: Vec<AppointmentRecord>,
}

impl PatientAppointments {
    pub fn partition(records: Vec<AppointmentRecord>) -> Self {
        let mut partitioned = Self::default();
        for record in records {
            match record.status {
                AppointmentStatus::Pending => partitioned.pending.push(record),
                AppointmentStatus::Completed => partitioned.completed.push(record),
                AppointmentStatus::Cancelled => partitioned.cancelled.push(record),
            }
        }
        partitioned
    }

    pub fn total(&self) -> usize {
        self.pending.len() + self.completed.len() + self.cancelled.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorLedgerQuery {
    pub date: Option<NaiveDate>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum BookingError {
    #[error("No schedule found for this doctor and date")]
    ScheduleNotFound,

    #[error("Slot not found")]
    SlotNotFound,

    #[error("Slot already booked")]
    SlotAlreadyBooked,

    #[error("Appointment record not found")]
    RecordNotFound,

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidTransition(AppointmentStatus),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Transient(String),
}

impl From<ScheduleError> for BookingError {
    fn from(e: ScheduleError) -> Self {
        match e {
            ScheduleError::NotFound => BookingError::ScheduleNotFound,
            ScheduleError::SlotNotFound => BookingError::SlotNotFound,
            ScheduleError::SlotAlreadyBooked => BookingError::SlotAlreadyBooked,
            ScheduleError::Conflict => {
                BookingError::Validation("Schedule has booked slots".to_string())
            }
            ScheduleError::Validation(msg) => BookingError::Validation(msg),
            ScheduleError::Transient(msg) => BookingError::Transient(msg),
        }
    }
}
