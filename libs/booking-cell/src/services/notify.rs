// libs/booking-cell/src/services/notify.rs
use async_trait::async_trait;
use tracing::info;

use crate::models::AppointmentRecord;

/// Hook point fired after a booking-flow mutation has been persisted.
/// Delivery (email, push) lives behind this trait; the coordinator only
/// guarantees the hook is invoked, never that delivery succeeds, and a
/// failing notifier never fails the booking.
#[async_trait]
pub trait BookingNotifier: Send + Sync {
    async fn appointment_confirmed(&self, record: &AppointmentRecord);
    async fn appointment_cancelled(&self, record: &AppointmentRecord);
}

/// Default notifier: writes tracing events only.
pub struct LogNotifier;

#[async_trait]
impl BookingNotifier for LogNotifier {
    async fn appointment_confirmed(&self, record: &AppointmentRecord) {
        info!(
            "Appointment confirmed: {} for patient {} with doctor {} at {} {}",
            record.id, record.patient_id, record.doctor_id, record.appointment_date, record.slot_time
        );
    }

    async fn appointment_cancelled(&self, record: &AppointmentRecord) {
        info!(
            "Appointment cancelled: {} for patient {} with doctor {} at {} {}",
            record.id, record.patient_id, record.doctor_id, record.appointment_date, record.slot_time
        );
    }
}
