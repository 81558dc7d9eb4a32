use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::AppError,
    models::{AlertSnapshot, ConditionValue, CurrentUser, EventKind, NotificationEvent},
    services::{
        alerts_service::{self, CreateAlertInput, UpdateAlertInput},
        notifier::DispatchOutcome,
    },
    AppState,
};

fn caller(user: &Option<Extension<CurrentUser>>) -> Option<&CurrentUser> {
    user.as_ref().map(|Extension(u)| u)
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(v)| v)
        .map_err(|rejection| AppError::Validation(format!("Invalid JSON body: {}", rejection.body_text())))
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
}

// GET /alerts?userId=
pub async fn get_alerts(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Query(q): Query<ListQuery>,
) -> Result<Response, AppError> {
    let alerts = alerts_service::list_alerts(&state, caller(&user), q.user_id).await?;

    Ok((StatusCode::OK, Json(json!({ "success": true, "alerts": alerts }))).into_response())
}

// POST /alerts
pub async fn post_create_alert(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    body: Result<Json<CreateAlertInput>, JsonRejection>,
) -> Result<Response, AppError> {
    let input = json_body(body)?;
    let alert = alerts_service::create_alert(&state, caller(&user), input).await?;

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "alert": alert }))).into_response())
}

// GET /alerts/:id
pub async fn get_alert(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let alert = alerts_service::get_alert(&state, caller(&user), &id).await?;

    Ok((StatusCode::OK, Json(json!({ "success": true, "alert": alert }))).into_response())
}

// PUT /alerts/:id
pub async fn put_update_alert(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
    body: Result<Json<UpdateAlertInput>, JsonRejection>,
) -> Result<Response, AppError> {
    let input = json_body(body)?;
    let alert = alerts_service::update_alert(&state, caller(&user), &id, input).await?;

    Ok((StatusCode::OK, Json(json!({ "success": true, "alert": alert }))).into_response())
}

// DELETE /alerts/:id
pub async fn delete_alert(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    alerts_service::delete_alert(&state, caller(&user), &id).await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "success": true, "message": "Alert deleted successfully" })),
    )
        .into_response())
}

fn outcome_response(outcome: DispatchOutcome) -> Response {
    let message = if outcome.email_sent {
        "Notification email sent"
    } else {
        "Notification processed; email not sent"
    };

    let mut body = json!({
        "success": true,
        "emailSent": outcome.email_sent,
        "message": message,
    });
    if let Some(w) = outcome.warning {
        body["warning"] = Value::String(w);
    }

    (StatusCode::OK, Json(body)).into_response()
}

// POST /alerts/notify
pub async fn post_notify(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let body = json_body(body)?;

    let kind = body
        .get("type")
        .and_then(Value::as_str)
        .and_then(EventKind::parse)
        .ok_or_else(|| {
            AppError::Validation("type must be \"alert_created\" or \"alert_triggered\"".to_string())
        })?;

    let user_id = body
        .get("userId")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("userId is required".to_string()))?
        .to_string();

    let alert = body
        .get("alert")
        .ok_or_else(|| AppError::Validation("alert is required".to_string()))
        .and_then(|a| AlertSnapshot::from_wire(a).map_err(AppError::Validation))?;

    let outcome = alerts_service::notify(&state, NotificationEvent { kind, user_id, alert }).await?;

    Ok(outcome_response(outcome))
}

#[derive(Deserialize)]
struct TriggerBody {
    #[serde(default, rename = "currentNav", alias = "observed")]
    observed: Option<ConditionValue>,
}

// POST /alerts/:id/trigger
pub async fn post_trigger_alert(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, AppError> {
    let observed = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        serde_json::from_slice::<TriggerBody>(&body)
            .map_err(|e| AppError::Validation(format!("Invalid JSON body: {e}")))?
            .observed
    };

    let outcome = alerts_service::trigger_alert(&state, caller(&user), &id, observed).await?;

    Ok(outcome_response(outcome))
}
