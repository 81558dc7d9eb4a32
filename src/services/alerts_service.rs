use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::AppError,
    models::{Alert, AlertSnapshot, Condition, ConditionValue, CurrentUser, EventKind, NotificationEvent},
    services::{
        gateway::{self, AlertUpdate, NewAlert},
        notifier::DispatchOutcome,
        notify_queue,
    },
    AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertInput {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub fund_id: Option<String>,
    #[serde(default, rename = "type")]
    pub alert_type: Option<String>,
    #[serde(default)]
    pub condition: Option<Value>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAlertInput {
    #[serde(default, rename = "type")]
    pub alert_type: Option<String>,
    #[serde(default)]
    pub condition: Option<Value>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// With an authenticated caller, only their own alerts are reachable.
/// Without one the `userId` supplied by the upstream layer is trusted.
fn ensure_owner(caller: Option<&CurrentUser>, owner_id: &str) -> Result<(), AppError> {
    match caller {
        Some(u) if u.id != owner_id => Err(AppError::Forbidden),
        _ => Ok(()),
    }
}

async fn existing_alert(
    state: &AppState,
    caller: Option<&CurrentUser>,
    id: &str,
) -> Result<Alert, AppError> {
    let alert = gateway::get_alert(state.store.as_ref(), id)
        .await?
        .ok_or(AppError::NotFound("alert"))?;
    ensure_owner(caller, &alert.user_id)?;
    Ok(alert)
}

pub async fn create_alert(
    state: &AppState,
    caller: Option<&CurrentUser>,
    input: CreateAlertInput,
) -> Result<Alert, AppError> {
    let user_id = non_empty(input.user_id);
    let alert_type = non_empty(input.alert_type);
    let condition = input.condition.filter(|c| !c.is_null());

    let (Some(user_id), Some(alert_type), Some(condition)) = (user_id, alert_type, condition) else {
        return Err(AppError::Validation(
            "Missing required fields: userId, type, and condition are required".to_string(),
        ));
    };

    let condition = Condition::from_wire(&condition).map_err(AppError::Validation)?;
    ensure_owner(caller, &user_id)?;

    let alert = gateway::create_alert(
        state.store.as_ref(),
        NewAlert {
            user_id,
            fund_id: non_empty(input.fund_id),
            alert_type,
            condition,
            is_active: input.is_active.unwrap_or(true),
        },
    )
    .await?;

    tracing::info!(alert_id = %alert.id, user_id = %alert.user_id, "alert created");

    notify_queue::enqueue(
        &state.notify_tx,
        NotificationEvent {
            kind: EventKind::Created,
            user_id: alert.user_id.clone(),
            alert: AlertSnapshot::from(&alert),
        },
    );

    Ok(alert)
}

pub async fn get_alert(
    state: &AppState,
    caller: Option<&CurrentUser>,
    id: &str,
) -> Result<Alert, AppError> {
    existing_alert(state, caller, id).await
}

pub async fn list_alerts(
    state: &AppState,
    caller: Option<&CurrentUser>,
    user_id: Option<String>,
) -> Result<Vec<Alert>, AppError> {
    let user_id = non_empty(user_id)
        .or_else(|| caller.map(|u| u.id.clone()))
        .ok_or_else(|| AppError::Unauthorized("userId is required".to_string()))?;
    ensure_owner(caller, &user_id)?;

    Ok(gateway::list_alerts(state.store.as_ref(), &user_id).await?)
}

pub async fn update_alert(
    state: &AppState,
    caller: Option<&CurrentUser>,
    id: &str,
    input: UpdateAlertInput,
) -> Result<Alert, AppError> {
    existing_alert(state, caller, id).await?;

    let alert_type = match input.alert_type {
        Some(t) if t.trim().is_empty() => {
            return Err(AppError::Validation("type must not be empty".to_string()));
        }
        other => other.map(|t| t.trim().to_string()),
    };

    let condition = match input.condition.filter(|c| !c.is_null()) {
        Some(raw) => Some(Condition::from_wire(&raw).map_err(AppError::Validation)?),
        None => None,
    };

    let update = AlertUpdate {
        alert_type,
        condition,
        is_active: input.is_active,
    };

    let alert = gateway::update_alert(state.store.as_ref(), id, update)
        .await?
        // deleted between the read and the write
        .ok_or(AppError::NotFound("alert"))?;

    tracing::info!(alert_id = %alert.id, is_active = alert.is_active, "alert updated");
    Ok(alert)
}

pub async fn delete_alert(
    state: &AppState,
    caller: Option<&CurrentUser>,
    id: &str,
) -> Result<(), AppError> {
    existing_alert(state, caller, id).await?;

    if !gateway::delete_alert(state.store.as_ref(), id).await? {
        return Err(AppError::NotFound("alert"));
    }

    tracing::info!(alert_id = %id, "alert deleted");
    Ok(())
}

/// Sends the "alert fired" email for an existing alert, attaching the
/// observed value when one is given. Waits for the dispatcher.
pub async fn trigger_alert(
    state: &AppState,
    caller: Option<&CurrentUser>,
    id: &str,
    observed: Option<ConditionValue>,
) -> Result<DispatchOutcome, AppError> {
    let alert = existing_alert(state, caller, id).await?;
    if !alert.is_active {
        return Err(AppError::Validation("alert is not active".to_string()));
    }

    let mut snapshot = AlertSnapshot::from(&alert);
    if let Some(observed) = observed {
        snapshot.condition = alert.condition.with_observed(observed);
    }

    let event = NotificationEvent {
        kind: EventKind::Triggered,
        user_id: alert.user_id.clone(),
        alert: snapshot,
    };

    state.notifier.dispatch(state.store.as_ref(), &event).await
}

/// Dispatch for an explicit notify request.
pub async fn notify(state: &AppState, event: NotificationEvent) -> Result<DispatchOutcome, AppError> {
    state.notifier.dispatch(state.store.as_ref(), &event).await
}
