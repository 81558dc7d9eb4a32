//! Turns an alert event into an email for the alert's owner.
//!
//! Only an unknown user or a user without an email is a hard failure. A
//! disabled mailer, a provider error or a timeout all come back as
//! `email_sent = false` plus a warning.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use tokio::time;

use crate::{
    error::AppError,
    models::{AlertSnapshot, EventKind, NotificationEvent, UserContact},
    services::{
        gateway,
        mailer::{Delivery, Mailer, OutboundEmail},
    },
    store::{AlertStore, StoreError},
    templates::{self, Hbs},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
    pub email_sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl DispatchOutcome {
    fn sent() -> Self {
        Self {
            email_sent: true,
            warning: None,
        }
    }

    fn not_sent(warning: String) -> Self {
        Self {
            email_sent: false,
            warning: Some(warning),
        }
    }
}

#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    hbs: Hbs,
    timeout: Duration,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, hbs: Hbs, timeout: Duration) -> Self {
        Self {
            mailer,
            hbs,
            timeout,
        }
    }

    pub async fn dispatch(
        &self,
        store: &dyn AlertStore,
        event: &NotificationEvent,
    ) -> Result<DispatchOutcome, AppError> {
        let contact = time::timeout(self.timeout, gateway::get_user_contact(store, &event.user_id))
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))??
            .ok_or(AppError::NotFound("user"))?;

        let Some(to) = contact.email() else {
            return Err(AppError::ContactUnavailable(event.user_id.clone()));
        };

        let email = match self.render(event.kind, &contact, to, &event.alert) {
            Ok(e) => e,
            Err(e) => {
                tracing::error!(error = %e, kind = event.kind.as_str(), "failed to render alert email");
                return Ok(DispatchOutcome::not_sent(format!("Failed to render email: {e}")));
            }
        };

        let outcome = match time::timeout(self.timeout, self.mailer.send(email)).await {
            Ok(Ok(Delivery::Sent { .. })) => DispatchOutcome::sent(),
            Ok(Ok(Delivery::Skipped(warning))) => DispatchOutcome::not_sent(warning),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, user_id = %event.user_id, "alert email failed");
                DispatchOutcome::not_sent(format!("Failed to send email: {e}"))
            }
            Err(_) => {
                tracing::warn!(user_id = %event.user_id, timeout = ?self.timeout, "alert email timed out");
                DispatchOutcome::not_sent(format!(
                    "Failed to send email: mail provider timed out after {:?}",
                    self.timeout
                ))
            }
        };

        tracing::info!(
            kind = event.kind.as_str(),
            user_id = %event.user_id,
            alert_id = ?event.alert.id,
            email_sent = outcome.email_sent,
            "alert notification processed"
        );

        Ok(outcome)
    }

    pub fn render(
        &self,
        kind: EventKind,
        contact: &UserContact,
        to: &str,
        alert: &AlertSnapshot,
    ) -> Result<OutboundEmail, handlebars::RenderError> {
        let fund_name = alert
            .fund
            .as_ref()
            .map(|f| f.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("any fund");

        let observed = alert.condition.observed_metric();
        let ctx = json!({
            "name": contact.display_name(),
            "fund_name": fund_name,
            "alert_type": alert.alert_type,
            "comparison": alert.condition.comparison(),
            "value": alert.condition.value().to_string(),
            "observed": observed.as_ref().map(|(_, v)| v.to_string()),
            "observed_label": observed.as_ref().map(|(key, _)| metric_label(key)),
        });

        let (template, subject) = match kind {
            EventKind::Created => (templates::ALERT_CREATED, format!("Alert created for {fund_name}")),
            EventKind::Triggered => (templates::ALERT_TRIGGERED, format!("Alert triggered: {fund_name}")),
        };

        Ok(OutboundEmail {
            to: to.to_string(),
            subject,
            html: self.hbs.render(template, &ctx)?,
        })
    }
}

// `currentNav` -> "NAV", `currentReturn` -> "Return"
fn metric_label(key: &str) -> &str {
    match key.strip_prefix("current") {
        Some("Nav") | Some("") | None => "NAV",
        Some(rest) => rest,
    }
}
