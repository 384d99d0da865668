//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for business logic.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Local, NaiveDate, Utc};
use sha2::{Digest, Sha256};

use super::dto::{
    AckResponse, DayRequest, DeleteSlotRequest, DispatchQuery, DispatchResponse, HealthResponse,
    PublicKeyResponse, SaveSlotRequest, SendPushRequest, SubscribeRequest, UnsubscribeRequest,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::{AnalyticsSummary, DailySession, TimeSlot, UserId};
use crate::push::{run_dispatch, DispatchMode, DispatchOutcome, SkipReason};
use crate::reminder::NotificationContent;
use crate::services::{analytics, planner, subscriptions, DayOverview};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Verify the service is running and the repository is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Daily Sessions
// =============================================================================

fn request_date(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}

/// POST /v1/days/start
///
/// Start (or restart) the user's session for the given date.
pub async fn start_day(
    State(state): State<AppState>,
    Json(request): Json<DayRequest>,
) -> HandlerResult<DailySession> {
    let session = planner::start_day(
        state.repository.as_ref(),
        request.user_id,
        request_date(request.date),
        Utc::now(),
    )
    .await?;
    Ok(Json(session))
}

/// POST /v1/days/end
///
/// End the user's session for the given date.
pub async fn end_day(
    State(state): State<AppState>,
    Json(request): Json<DayRequest>,
) -> HandlerResult<DailySession> {
    let session = planner::end_day(
        state.repository.as_ref(),
        request.user_id,
        request_date(request.date),
        Utc::now(),
    )
    .await?;
    Ok(Json(session))
}

/// GET /v1/days/{user_id}/{date}
///
/// Fetch the session and its slots for one day.
pub async fn get_day(
    State(state): State<AppState>,
    Path((user_id, date)): Path<(UserId, NaiveDate)>,
) -> HandlerResult<DayOverview> {
    planner::get_day(state.repository.as_ref(), user_id, date)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No session for user {} on {}", user_id, date)))
}

/// GET /v1/days/{user_id}/{date}/slots
///
/// List the slots of one day's session.
pub async fn get_slots(
    State(state): State<AppState>,
    Path((user_id, date)): Path<(UserId, NaiveDate)>,
) -> HandlerResult<Vec<TimeSlot>> {
    let overview = planner::get_day(state.repository.as_ref(), user_id, date)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No session for user {} on {}", user_id, date))
        })?;
    Ok(Json(overview.slots))
}

// =============================================================================
// Time Slots
// =============================================================================

/// PUT /v1/slots
///
/// Insert or overwrite the slot at the given grid-aligned time.
pub async fn save_slot(
    State(state): State<AppState>,
    Json(request): Json<SaveSlotRequest>,
) -> HandlerResult<TimeSlot> {
    let slot = planner::save_slot(
        state.repository.as_ref(),
        request.session_id,
        request.slot_time,
        request.activity,
        request.condition_score,
    )
    .await?;
    Ok(Json(slot))
}

/// DELETE /v1/slots
///
/// Delete the slot at the given time. Deleting a missing slot succeeds.
pub async fn delete_slot(
    State(state): State<AppState>,
    Json(request): Json<DeleteSlotRequest>,
) -> HandlerResult<AckResponse> {
    planner::delete_slot(
        state.repository.as_ref(),
        request.session_id,
        request.slot_time,
    )
    .await?;
    Ok(Json(AckResponse { success: true }))
}

// =============================================================================
// Analytics
// =============================================================================

/// GET /v1/analytics/{user_id}
///
/// Aggregate statistics over the trailing 30-day window.
pub async fn get_analytics(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> HandlerResult<AnalyticsSummary> {
    let summary = analytics::analytics_summary(
        state.repository.as_ref(),
        user_id,
        Local::now().date_naive(),
    )
    .await?;
    Ok(Json(summary))
}

/// GET /v1/analytics/{user_id}/export
///
/// The window's raw data as a CSV download.
pub async fn export_analytics(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Response, AppError> {
    let csv = analytics::export_csv(
        state.repository.as_ref(),
        user_id,
        Local::now().date_naive(),
    )
    .await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"planner-export.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

// =============================================================================
// Push Subscriptions
// =============================================================================

/// GET /v1/push/vapid-public-key
///
/// The key browsers need to create a subscription; null when push is
/// not configured.
pub async fn vapid_public_key(State(state): State<AppState>) -> HandlerResult<PublicKeyResponse> {
    Ok(Json(PublicKeyResponse {
        public_key: state.vapid_public_key.clone(),
    }))
}

/// POST /v1/push/subscribe
///
/// Store (or replace) the user's push subscription.
pub async fn subscribe(
    State(state): State<AppState>,
    Json(request): Json<SubscribeRequest>,
) -> HandlerResult<AckResponse> {
    subscriptions::subscribe(
        state.repository.as_ref(),
        request.user_id,
        request.subscription,
        Utc::now(),
    )
    .await?;
    Ok(Json(AckResponse { success: true }))
}

/// DELETE /v1/push/subscribe
///
/// Remove the user's push subscription; removing a missing one succeeds.
pub async fn unsubscribe(
    State(state): State<AppState>,
    Json(request): Json<UnsubscribeRequest>,
) -> HandlerResult<AckResponse> {
    subscriptions::unsubscribe(state.repository.as_ref(), request.user_id).await?;
    Ok(Json(AckResponse { success: true }))
}

/// POST /v1/push/send
///
/// Send a one-off notification to one user, bypassing grid and
/// quiet-hours gating. Used to verify an installation end to end.
pub async fn send_push(
    State(state): State<AppState>,
    Json(request): Json<SendPushRequest>,
) -> HandlerResult<AckResponse> {
    let sender = state.push.as_ref().ok_or(AppError::PushNotConfigured)?;

    let record = subscriptions::find_subscription(state.repository.as_ref(), request.user_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No subscription for user {}", request.user_id))
        })?;

    let content = NotificationContent::test(request.title, request.body);
    sender.send(&record.subscription, &content).await?;

    Ok(Json(AckResponse { success: true }))
}

// =============================================================================
// Cron Dispatch
// =============================================================================

/// Compare a presented token against the shared secret.
///
/// Both sides are hashed first so the comparison cost does not depend on
/// where the strings diverge.
fn token_matches(provided: &str, secret: &str) -> bool {
    Sha256::digest(provided.as_bytes()) == Sha256::digest(secret.as_bytes())
}

fn check_cron_auth(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let secret = match &state.cron_secret {
        Some(s) => s,
        // No secret configured: open endpoint, for local development only.
        None => return Ok(()),
    };

    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match provided {
        Some(token) if token_matches(token, secret) => Ok(()),
        _ => Err(AppError::Unauthorized(
            "Missing or invalid bearer token".to_string(),
        )),
    }
}

/// POST /v1/cron/dispatch
///
/// One reminder dispatch tick, invoked by an external scheduler every
/// 15 minutes. Authenticated with `Authorization: Bearer <CRON_SECRET>`.
pub async fn cron_dispatch(
    State(state): State<AppState>,
    Query(query): Query<DispatchQuery>,
    headers: HeaderMap,
) -> HandlerResult<DispatchResponse> {
    check_cron_auth(&state, &headers)?;

    let mode = match query.mode.as_deref() {
        Some(raw) => raw
            .parse::<DispatchMode>()
            .map_err(AppError::BadRequest)?,
        None => state.dispatch_mode,
    };

    let sender = match &state.push {
        Some(sender) => sender,
        None => {
            return Ok(Json(
                DispatchOutcome::Skipped {
                    reason: SkipReason::NotConfigured,
                    time: Utc::now(),
                }
                .into(),
            ));
        }
    };

    let outcome = run_dispatch(
        state.repository.as_ref(),
        sender.as_ref(),
        mode,
        Local::now(),
    )
    .await?;

    Ok(Json(outcome.into()))
}
