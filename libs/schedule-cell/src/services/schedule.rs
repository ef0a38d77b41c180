// libs/schedule-cell/src/services/schedule.rs
use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{return_representation, SupabaseClient};

use crate::models::{
    CreateScheduleRequest, ScheduleDay, ScheduleDayRow, ScheduleError, Slot, SlotRow,
};
use crate::services::slots::{generate_slots, DEFAULT_SLOT_MINUTES};

/// Persistence layer for per-doctor, per-day slot sets. Keyed by
/// (doctor_id, schedule_date); slot rows are individually addressable so a
/// booking can flip one slot with an equality-conditioned write.
pub struct ScheduleService {
    supabase: SupabaseClient,
}

impl ScheduleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Create (or replace) the slot set for a doctor's date.
    ///
    /// Replacement is wholesale: the previous day's rows are deleted before
    /// the new ones are inserted. A day that already has booked slots is
    /// never replaced silently; the caller gets a conflict instead.
    pub async fn create_schedule(
        &self,
        doctor_id: Uuid,
        request: CreateScheduleRequest,
        auth_token: &str,
    ) -> Result<ScheduleDay, ScheduleError> {
        debug!(
            "Creating schedule for doctor {} on {}",
            doctor_id, request.schedule_date
        );

        let slot_minutes = request.slot_minutes.unwrap_or(DEFAULT_SLOT_MINUTES);
        let slots = generate_slots(request.start_time, request.end_time, slot_minutes)?;

        let booked = self
            .get_slot_rows(doctor_id, request.schedule_date, Some(true), auth_token)
            .await?;
        if !booked.is_empty() {
            warn!(
                "Refusing to replace schedule for doctor {} on {}: {} booked slot(s)",
                doctor_id,
                request.schedule_date,
                booked.len()
            );
            return Err(ScheduleError::Conflict);
        }

        // The delete only touches free rows, so a booking that lands between
        // the check above and this call keeps its slot. Once the free rows
        // are gone nothing is left to claim, and the re-check below surfaces
        // any booking that slipped in before the delete.
        self.delete_free_slot_rows(doctor_id, request.schedule_date, auth_token)
            .await?;

        let booked = self
            .get_slot_rows(doctor_id, request.schedule_date, Some(true), auth_token)
            .await?;
        if !booked.is_empty() {
            warn!(
                "Schedule replacement for doctor {} on {} lost the race to a booking",
                doctor_id, request.schedule_date
            );
            return Err(ScheduleError::Conflict);
        }

        self.delete_day_row(doctor_id, request.schedule_date, auth_token)
            .await?;

        let now = Utc::now();
        let day_id = Uuid::new_v4();
        let day_data = json!({
            "id": day_id,
            "doctor_id": doctor_id,
            "schedule_date": request.schedule_date,
            "start_time": request.start_time.format("%H:%M:%S").to_string(),
            "end_time": request.end_time.format("%H:%M:%S").to_string(),
            "slot_minutes": slot_minutes,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let created: Vec<ScheduleDayRow> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/doctor_schedules",
                Some(auth_token),
                Some(day_data),
                Some(return_representation()),
            )
            .await
            .map_err(|e| ScheduleError::Transient(e.to_string()))?;

        let day_row = created
            .into_iter()
            .next()
            .ok_or_else(|| ScheduleError::Transient("Failed to create schedule day".to_string()))?;

        let slot_rows: Vec<Value> = slots
            .iter()
            .map(|slot| {
                json!({
                    "doctor_id": doctor_id,
                    "schedule_date": request.schedule_date,
                    "slot_time": slot.time,
                    "position": slot.position,
                    "is_booked": false
                })
            })
            .collect();

        let _: Vec<SlotRow> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/schedule_slots",
                Some(auth_token),
                Some(Value::Array(slot_rows)),
                Some(return_representation()),
            )
            .await
            .map_err(|e| ScheduleError::Transient(e.to_string()))?;

        info!(
            "Schedule created for doctor {} on {} with {} slots",
            doctor_id,
            request.schedule_date,
            slots.len()
        );

        Ok(day_row.into_day(slots))
    }

    /// Fetch one day's schedule with its ordered slots.
    pub async fn get_day(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Option<ScheduleDay>, ScheduleError> {
        debug!("Fetching schedule for doctor {} on {}", doctor_id, date);

        let path = format!(
            "/rest/v1/doctor_schedules?doctor_id=eq.{}&schedule_date=eq.{}",
            doctor_id, date
        );
        let result: Vec<ScheduleDayRow> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ScheduleError::Transient(e.to_string()))?;

        let Some(day_row) = result.into_iter().next() else {
            return Ok(None);
        };

        let slots = self
            .get_slot_rows(doctor_id, date, None, auth_token)
            .await?
            .into_iter()
            .map(SlotRow::into_slot)
            .collect();

        Ok(Some(day_row.into_day(slots)))
    }

    /// List a doctor's schedule days in a date range, ascending by date.
    pub async fn list_upcoming(
        &self,
        doctor_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<ScheduleDay>, ScheduleError> {
        debug!(
            "Listing schedules for doctor {} between {} and {}",
            doctor_id, from, to
        );

        if from > to {
            return Err(ScheduleError::Validation(
                "Range start must not be after range end".to_string(),
            ));
        }

        let path = format!(
            "/rest/v1/doctor_schedules?doctor_id=eq.{}&schedule_date=gte.{}&schedule_date=lte.{}&order=schedule_date.asc",
            doctor_id, from, to
        );
        let rows: Vec<ScheduleDayRow> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ScheduleError::Transient(e.to_string()))?;

        let mut days = Vec::with_capacity(rows.len());
        for row in rows {
            let slots = self
                .get_slot_rows(doctor_id, row.schedule_date, None, auth_token)
                .await?
                .into_iter()
                .map(SlotRow::into_slot)
                .collect();
            days.push(row.into_day(slots));
        }

        Ok(days)
    }

    /// Desired-state slot update: setting the value it already has succeeds
    /// silently. Fails with SlotNotFound when no slot carries that label on
    /// that day.
    pub async fn set_slot_booked(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        slot_time: &str,
        booked: bool,
        auth_token: &str,
    ) -> Result<(), ScheduleError> {
        debug!(
            "Setting slot '{}' booked={} for doctor {} on {}",
            slot_time, booked, doctor_id, date
        );

        let path = format!(
            "/rest/v1/schedule_slots?doctor_id=eq.{}&schedule_date=eq.{}&slot_time=eq.{}",
            doctor_id,
            date,
            urlencoding::encode(slot_time)
        );
        let updated: Vec<SlotRow> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(json!({ "is_booked": booked })),
                Some(return_representation()),
            )
            .await
            .map_err(|e| ScheduleError::Transient(e.to_string()))?;

        if updated.is_empty() {
            return Err(ScheduleError::SlotNotFound);
        }

        Ok(())
    }

    /// Atomically claim a free slot. The store applies the is_booked=false
    /// condition and the write in one operation, so competing bookings for
    /// the same (doctor, date, time) key serialize here: exactly one caller
    /// sees its row come back, the rest get SlotAlreadyBooked.
    pub async fn book_slot_atomic(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        slot_time: &str,
        auth_token: &str,
    ) -> Result<Slot, ScheduleError> {
        debug!(
            "Attempting atomic booking of slot '{}' for doctor {} on {}",
            slot_time, doctor_id, date
        );

        let path = format!(
            "/rest/v1/schedule_slots?doctor_id=eq.{}&schedule_date=eq.{}&slot_time=eq.{}&is_booked=eq.false",
            doctor_id,
            date,
            urlencoding::encode(slot_time)
        );
        let updated: Vec<SlotRow> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(json!({ "is_booked": true })),
                Some(return_representation()),
            )
            .await
            .map_err(|e| ScheduleError::Transient(e.to_string()))?;

        if let Some(row) = updated.into_iter().next() {
            return Ok(row.into_slot());
        }

        // The conditional write matched nothing: either the slot does not
        // exist or someone else already holds it.
        let existing = self
            .get_slot_rows(doctor_id, date, None, auth_token)
            .await?;
        if existing.iter().any(|row| row.slot_time == slot_time) {
            warn!(
                "Slot '{}' already booked for doctor {} on {}",
                slot_time, doctor_id, date
            );
            Err(ScheduleError::SlotAlreadyBooked)
        } else {
            Err(ScheduleError::SlotNotFound)
        }
    }

    /// Remove a whole day's slot set. Slots are never deleted individually.
    pub async fn delete_day(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<(), ScheduleError> {
        debug!("Deleting schedule for doctor {} on {}", doctor_id, date);

        let slots_path = format!(
            "/rest/v1/schedule_slots?doctor_id=eq.{}&schedule_date=eq.{}",
            doctor_id, date
        );
        let _: Vec<Value> = self
            .supabase
            .request(Method::DELETE, &slots_path, Some(auth_token), None)
            .await
            .map_err(|e| ScheduleError::Transient(e.to_string()))?;

        self.delete_day_row(doctor_id, date, auth_token).await
    }

    // Private helper methods

    async fn get_slot_rows(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        booked_filter: Option<bool>,
        auth_token: &str,
    ) -> Result<Vec<SlotRow>, ScheduleError> {
        let mut path = format!(
            "/rest/v1/schedule_slots?doctor_id=eq.{}&schedule_date=eq.{}&order=position.asc",
            doctor_id, date
        );
        if let Some(booked) = booked_filter {
            path.push_str(&format!("&is_booked=eq.{}", booked));
        }

        self.supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| ScheduleError::Transient(e.to_string()))
    }

    async fn delete_free_slot_rows(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<(), ScheduleError> {
        let path = format!(
            "/rest/v1/schedule_slots?doctor_id=eq.{}&schedule_date=eq.{}&is_booked=eq.false",
            doctor_id, date
        );
        let _: Vec<Value> = self
            .supabase
            .request(Method::DELETE, &path, Some(auth_token), None)
            .await
            .map_err(|e| ScheduleError::Transient(e.to_string()))?;

        Ok(())
    }

    async fn delete_day_row(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<(), ScheduleError> {
        let path = format!(
            "/rest/v1/doctor_schedules?doctor_id=eq.{}&schedule_date=eq.{}",
            doctor_id, date
        );
        let _: Vec<Value> = self
            .supabase
            .request(Method::DELETE, &path, Some(auth_token), None)
            .await
            .map_err(|e| ScheduleError::Transient(e.to_string()))?;

        Ok(())
    }
}
