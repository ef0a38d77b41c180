// libs/schedule-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::{Duration, NaiveDate, Utc};
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{CreateScheduleRequest, ScheduleError, ScheduleRangeQuery};
use crate::services::schedule::ScheduleService;

/// Upcoming-schedule window the doctor app shows by default.
const DEFAULT_UPCOMING_DAYS: i64 = 7;

fn map_schedule_error(e: ScheduleError) -> AppError {
    match e {
        ScheduleError::NotFound => AppError::NotFound("Schedule not found".to_string()),
        ScheduleError::SlotNotFound => AppError::NotFound("Slot not found".to_string()),
        ScheduleError::SlotAlreadyBooked => {
            AppError::Conflict("Slot is already booked".to_string())
        }
        ScheduleError::Conflict => AppError::Conflict(
            "Schedule has booked slots and cannot be replaced".to_string(),
        ),
        ScheduleError::Validation(msg) => AppError::ValidationError(msg),
        ScheduleError::Transient(msg) => AppError::ExternalService(msg),
    }
}

/// Create or replace a doctor's slot set for a date.
#[axum::debug_handler]
pub async fn create_schedule(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let schedule_service = ScheduleService::new(&state);

    let day = schedule_service
        .create_schedule(doctor_id, request, token)
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "schedule": day
    })))
}

/// Get the slot set for one (doctor, date) pair.
#[axum::debug_handler]
pub async fn get_schedule_day(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path((doctor_id, date)): Path<(Uuid, NaiveDate)>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let schedule_service = ScheduleService::new(&state);

    let day = schedule_service
        .get_day(doctor_id, date, token)
        .await
        .map_err(map_schedule_error)?
        .ok_or_else(|| AppError::NotFound("Schedule not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "schedule": day
    })))
}

/// List a doctor's upcoming schedule days, ascending by date. Defaults to
/// the next seven days when no range is given.
#[axum::debug_handler]
pub async fn list_upcoming_schedules(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<Uuid>,
    Query(range): Query<ScheduleRangeQuery>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let schedule_service = ScheduleService::new(&state);

    let today = Utc::now().date_naive();
    let from = range.from.unwrap_or(today);
    let to = range
        .to
        .unwrap_or(from + Duration::days(DEFAULT_UPCOMING_DAYS));

    let days = schedule_service
        .list_upcoming(doctor_id, from, to, token)
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "schedules": days
    })))
}

/// Delete a whole day's slot set.
#[axum::debug_handler]
pub async fn delete_schedule_day(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path((doctor_id, date)): Path<(Uuid, NaiveDate)>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let schedule_service = ScheduleService::new(&state);

    schedule_service
        .delete_day(doctor_id, date, token)
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true
    })))
}
