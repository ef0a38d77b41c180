// libs/booking-cell/src/services/booking.rs
use std::sync::Arc;

use tracing::{info, warn};

use schedule_cell::models::ScheduleError;
use schedule_cell::services::schedule::ScheduleService;
use schedule_cell::services::slots::parse_slot_label;
use shared_config::AppConfig;

use crate::models::{
    AppointmentKeyRequest, AppointmentRecord, AppointmentStatus, BookAppointmentRequest,
    BookingError,
};
use crate::services::ledger::AppointmentLedgerService;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::notify::{BookingNotifier, LogNotifier};

/// The single authority over booking-flow mutations. Slot state and ledger
/// state are only ever changed together, through this type; screens and
/// handlers never write either collection directly.
///
/// Explicitly constructed and passed by reference where needed - there is
/// no process-wide shared instance.
pub struct BookingCoordinator {
    schedule_service: ScheduleService,
    ledger: AppointmentLedgerService,
    lifecycle: AppointmentLifecycleService,
    notifier: Arc<dyn BookingNotifier>,
}

impl BookingCoordinator {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_notifier(config, Arc::new(LogNotifier))
    }

    pub fn with_notifier(config: &AppConfig, notifier: Arc<dyn BookingNotifier>) -> Self {
        Self {
            schedule_service: ScheduleService::new(config),
            ledger: AppointmentLedgerService::new(config),
            lifecycle: AppointmentLifecycleService::new(),
            notifier,
        }
    }

    /// Book a slot for a patient.
    ///
    /// The slot is claimed with an atomic conditional write before the
    /// ledger record is appended: of two competing bookings for the same
    /// (doctor, date, time) key, exactly one claims the slot and the other
    /// gets SlotAlreadyBooked. The slot mutation is the cheap reversible
    /// half, so it goes first and is rolled back if the append fails.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<AppointmentRecord, BookingError> {
        info!(
            "Booking appointment for patient {} with doctor {} at {} {}",
            request.patient_id, request.doctor_id, request.appointment_date, request.slot_time
        );

        self.validate_booking_request(&request)?;

        // Retry safety: a booking that already went through for this exact
        // key is returned as-is instead of double-appending.
        if let Some(existing) = self
            .ledger
            .find_pending(
                request.doctor_id,
                request.patient_id,
                request.appointment_date,
                &request.slot_time,
                auth_token,
            )
            .await?
        {
            info!(
                "Booking already exists for this key, returning record {}",
                existing.id
            );
            return Ok(existing);
        }

        self.schedule_service
            .get_day(request.doctor_id, request.appointment_date, auth_token)
            .await?
            .ok_or(BookingError::ScheduleNotFound)?;

        self.schedule_service
            .book_slot_atomic(
                request.doctor_id,
                request.appointment_date,
                &request.slot_time,
                auth_token,
            )
            .await?;

        let record = match self.ledger.append(&request, auth_token).await {
            Ok(record) => record,
            Err(e) => {
                // Compensate: give the claimed slot back so capacity is not
                // leaked by a half-applied booking.
                if let Err(rollback_err) = self
                    .schedule_service
                    .set_slot_booked(
                        request.doctor_id,
                        request.appointment_date,
                        &request.slot_time,
                        false,
                        auth_token,
                    )
                    .await
                {
                    warn!(
                        "Failed to roll back slot '{}' for doctor {} on {} after ledger failure: {}",
                        request.slot_time,
                        request.doctor_id,
                        request.appointment_date,
                        rollback_err
                    );
                }
                return Err(e);
            }
        };

        self.notifier.appointment_confirmed(&record).await;

        info!("Appointment {} booked successfully", record.id);
        Ok(record)
    }

    /// Cancel a pending appointment and free its slot for rebooking.
    pub async fn cancel_appointment(
        &self,
        key: AppointmentKeyRequest,
        auth_token: &str,
    ) -> Result<AppointmentRecord, BookingError> {
        info!(
            "Cancelling appointment for patient {} with doctor {} at {} {}",
            key.patient_id, key.doctor_id, key.appointment_date, key.slot_time
        );

        let record = self
            .transition_appointment(&key, AppointmentStatus::Cancelled, auth_token)
            .await?;

        // Free the slot so it can be rebooked. A day the doctor has since
        // deleted has no slot left to free; that is not a cancel failure.
        match self
            .schedule_service
            .set_slot_booked(
                key.doctor_id,
                key.appointment_date,
                &key.slot_time,
                false,
                auth_token,
            )
            .await
        {
            Ok(()) => {}
            Err(ScheduleError::SlotNotFound) => {
                warn!(
                    "No slot '{}' left to free for doctor {} on {} (day deleted?)",
                    key.slot_time, key.doctor_id, key.appointment_date
                );
            }
            Err(e) => return Err(e.into()),
        }

        self.notifier.appointment_cancelled(&record).await;

        info!("Appointment {} cancelled", record.id);
        Ok(record)
    }

    /// Mark a pending appointment completed. The slot stays booked: a
    /// completed appointment consumed its capacity for the day.
    pub async fn complete_appointment(
        &self,
        key: AppointmentKeyRequest,
        auth_token: &str,
    ) -> Result<AppointmentRecord, BookingError> {
        info!(
            "Completing appointment for patient {} with doctor {} at {} {}",
            key.patient_id, key.doctor_id, key.appointment_date, key.slot_time
        );

        let record = self
            .transition_appointment(&key, AppointmentStatus::Completed, auth_token)
            .await?;

        info!("Appointment {} completed", record.id);
        Ok(record)
    }

    // Private helper methods

    fn validate_booking_request(&self, request: &BookAppointmentRequest) -> Result<(), BookingError> {
        if request.patient_display_name.trim().is_empty() {
            return Err(BookingError::Validation(
                "Patient display name must not be empty".to_string(),
            ));
        }

        if parse_slot_label(&request.slot_time).is_none() {
            return Err(BookingError::Validation(format!(
                "'{}' is not a valid slot time label",
                request.slot_time
            )));
        }

        Ok(())
    }

    async fn transition_appointment(
        &self,
        key: &AppointmentKeyRequest,
        new_status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<AppointmentRecord, BookingError> {
        let record = self
            .ledger
            .find(
                key.doctor_id,
                key.patient_id,
                key.appointment_date,
                &key.slot_time,
                auth_token,
            )
            .await?
            .ok_or(BookingError::RecordNotFound)?;

        self.lifecycle
            .validate_status_transition(&record.status, &new_status)?;

        // Conditioned on the record still being pending; a competing
        // transition that landed first shows up here as an empty update.
        self.ledger
            .update_status_if_pending(record.id, new_status, auth_token)
            .await?
            .ok_or(BookingError::InvalidTransition(record.status))
    }
}
