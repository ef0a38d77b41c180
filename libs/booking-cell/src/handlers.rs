// libs/booking-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    AppointmentKeyRequest, BookAppointmentRequest, BookingError, DoctorLedgerQuery,
};
use crate::services::booking::BookingCoordinator;
use crate::services::ledger::AppointmentLedgerService;

fn map_booking_error(e: BookingError) -> AppError {
    match e {
        BookingError::ScheduleNotFound => {
            AppError::NotFound("No schedule found for this doctor and date".to_string())
        }
        BookingError::SlotNotFound => AppError::NotFound("Slot not found".to_string()),
        BookingError::SlotAlreadyBooked => {
            AppError::Conflict("Slot is no longer available".to_string())
        }
        BookingError::RecordNotFound => {
            AppError::NotFound("Appointment record not found".to_string())
        }
        BookingError::InvalidTransition(status) => AppError::BadRequest(format!(
            "Appointment cannot be modified in current status: {}",
            status
        )),
        BookingError::Validation(msg) => AppError::ValidationError(msg),
        BookingError::Transient(msg) => AppError::ExternalService(msg),
    }
}

/// Book a slot for a patient. Conflicts surface immediately as 409 so the
/// caller can pick another slot.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let coordinator = BookingCoordinator::new(&state);

    let record = coordinator
        .book_appointment(request, token)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": record
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(key): Json<AppointmentKeyRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let coordinator = BookingCoordinator::new(&state);

    let record = coordinator
        .cancel_appointment(key, token)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": record
    })))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(key): Json<AppointmentKeyRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let coordinator = BookingCoordinator::new(&state);

    let record = coordinator
        .complete_appointment(key, token)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": record
    })))
}

/// A patient's appointments, partitioned into pending / completed /
/// cancelled.
#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let ledger = AppointmentLedgerService::new(&state);

    let appointments = ledger
        .list_for_patient(patient_id, token)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments
    })))
}

/// A doctor's ledger, optionally narrowed to one date.
#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<DoctorLedgerQuery>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let ledger = AppointmentLedgerService::new(&state);

    let appointments = ledger
        .list_for_doctor(doctor_id, query.date, token)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments
    })))
}
