// libs/booking-cell/src/services/ledger.rs
use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{return_representation, SupabaseClient};

use crate::models::{
    AppointmentRecord, AppointmentStatus, BookAppointmentRequest, BookingError,
    PatientAppointments,
};

/// The per-doctor appointment ledger, backed by the normalized
/// `appointments` collection (one addressable row per record instead of an
/// array field inside the doctor document). Append-only by record; only
/// `status` is ever mutated.
pub struct AppointmentLedgerService {
    supabase: SupabaseClient,
}

impl AppointmentLedgerService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Append a new pending record to the doctor's ledger.
    pub async fn append(
        &self,
        request: &BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<AppointmentRecord, BookingError> {
        debug!(
            "Appending appointment for patient {} with doctor {} at {} {}",
            request.patient_id, request.doctor_id, request.appointment_date, request.slot_time
        );

        let now = Utc::now();
        let record_data = json!({
            "id": Uuid::new_v4(),
            "doctor_id": request.doctor_id,
            "patient_id": request.patient_id,
            "patient_display_name": request.patient_display_name,
            "appointment_date": request.appointment_date,
            "slot_time": request.slot_time,
            "status": AppointmentStatus::Pending.to_string(),
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let created: Vec<AppointmentRecord> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(record_data),
                Some(return_representation()),
            )
            .await
            .map_err(|e| BookingError::Transient(e.to_string()))?;

        created
            .into_iter()
            .next()
            .ok_or_else(|| BookingError::Transient("Failed to create appointment".to_string()))
    }

    /// Locate the record for a (doctor, patient, date, slot) key, regardless
    /// of status. The most recently created record wins: a cancelled booking
    /// may share its key with a later rebooking of the freed slot.
    pub async fn find(
        &self,
        doctor_id: Uuid,
        patient_id: Uuid,
        date: NaiveDate,
        slot_time: &str,
        auth_token: &str,
    ) -> Result<Option<AppointmentRecord>, BookingError> {
        self.find_with_status(doctor_id, patient_id, date, slot_time, None, auth_token)
            .await
    }

    /// Locate a still-pending record for the key, if any.
    pub async fn find_pending(
        &self,
        doctor_id: Uuid,
        patient_id: Uuid,
        date: NaiveDate,
        slot_time: &str,
        auth_token: &str,
    ) -> Result<Option<AppointmentRecord>, BookingError> {
        self.find_with_status(
            doctor_id,
            patient_id,
            date,
            slot_time,
            Some(AppointmentStatus::Pending),
            auth_token,
        )
        .await
    }

    /// Equality-conditioned status update: the write only lands while the
    /// record is still pending, which serializes competing transitions on
    /// the same record. Returns None when the condition matched nothing.
    pub async fn update_status_if_pending(
        &self,
        record_id: Uuid,
        new_status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Option<AppointmentRecord>, BookingError> {
        debug!("Updating appointment {} to {}", record_id, new_status);

        let path = format!(
            "/rest/v1/appointments?id=eq.{}&status=eq.{}",
            record_id,
            AppointmentStatus::Pending
        );
        let updated: Vec<AppointmentRecord> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(json!({
                    "status": new_status.to_string(),
                    "updated_at": Utc::now().to_rfc3339()
                })),
                Some(return_representation()),
            )
            .await
            .map_err(|e| BookingError::Transient(e.to_string()))?;

        Ok(updated.into_iter().next())
    }

    /// A patient's full history, partitioned by status in booking order.
    pub async fn list_for_patient(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<PatientAppointments, BookingError> {
        debug!("Listing appointments for patient {}", patient_id);

        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&order=created_at.asc",
            patient_id
        );
        let records: Vec<AppointmentRecord> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::Transient(e.to_string()))?;

        Ok(PatientAppointments::partition(records))
    }

    /// A doctor's ledger view, optionally narrowed to one date.
    pub async fn list_for_doctor(
        &self,
        doctor_id: Uuid,
        date: Option<NaiveDate>,
        auth_token: &str,
    ) -> Result<Vec<AppointmentRecord>, BookingError> {
        debug!("Listing appointments for doctor {}", doctor_id);

        let mut path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&order=created_at.asc",
            doctor_id
        );
        if let Some(date) = date {
            path.push_str(&format!("&appointment_date=eq.{}", date));
        }

        self.supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::Transient(e.to_string()))
    }

    // Private helper methods

    async fn find_with_status(
        &self,
        doctor_id: Uuid,
        patient_id: Uuid,
        date: NaiveDate,
        slot_time: &str,
        status: Option<AppointmentStatus>,
        auth_token: &str,
    ) -> Result<Option<AppointmentRecord>, BookingError> {
        let mut path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&patient_id=eq.{}&appointment_date=eq.{}&slot_time=eq.{}",
            doctor_id,
            patient_id,
            date,
            urlencoding::encode(slot_time)
        );
        if let Some(status) = status {
            path.push_str(&format!("&status=eq.{}", status));
        }
        path.push_str("&order=created_at.desc&limit=1");

        let records: Vec<AppointmentRecord> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BookingError::Transient(e.to_string()))?;

        Ok(records.into_iter().next())
    }
}
