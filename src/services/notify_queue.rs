use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;

use crate::{
    config::NotifyTransport,
    models::NotificationEvent,
    AppState,
};

const QUEUE_CAPACITY: usize = 256;

pub type NotifyTx = mpsc::Sender<NotificationEvent>;
pub type NotifyRx = mpsc::Receiver<NotificationEvent>;

pub fn channel() -> (NotifyTx, NotifyRx) {
    mpsc::channel(QUEUE_CAPACITY)
}

/// Hands the event to the background worker without waiting. A full or
/// closed queue drops the event.
pub fn enqueue(tx: &NotifyTx, event: NotificationEvent) {
    if let Err(e) = tx.try_send(event) {
        let (reason, event) = match e {
            mpsc::error::TrySendError::Full(ev) => ("queue full", ev),
            mpsc::error::TrySendError::Closed(ev) => ("queue closed", ev),
        };
        tracing::warn!(
            reason,
            kind = event.kind.as_str(),
            user_id = %event.user_id,
            alert_id = ?event.alert.id,
            "dropping alert notification"
        );
    }
}

pub fn spawn_notification_worker(state: AppState, mut rx: NotifyRx) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let client = NotifyClient::new(state.settings.notify_base_url.clone(), state.settings.notify_timeout);

        while let Some(event) = rx.recv().await {
            let state = state.clone();
            let client = client.clone();
            // one slow delivery must not hold up the rest
            tokio::spawn(async move {
                deliver(&state, &client, event).await;
            });
        }
    })
}

async fn deliver(state: &AppState, client: &NotifyClient, event: NotificationEvent) {
    match state.settings.notify_transport {
        NotifyTransport::Inline => {
            match state.notifier.dispatch(state.store.as_ref(), &event).await {
                Ok(outcome) => {
                    if let Some(w) = outcome.warning {
                        tracing::warn!(user_id = %event.user_id, warning = %w, "alert notification not emailed");
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, user_id = %event.user_id, "alert notification failed");
                }
            }
        }
        NotifyTransport::Http => {
            if let Err(e) = client.notify(&event).await {
                tracing::warn!(error = %e, user_id = %event.user_id, "notify sub-call failed");
            }
        }
    }
}

/// Client for `POST {base}/alerts/notify`.
#[derive(Clone)]
pub struct NotifyClient {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyResponse {
    #[serde(default)]
    pub email_sent: bool,
    #[serde(default)]
    pub warning: Option<String>,
}

impl NotifyClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn notify(&self, event: &NotificationEvent) -> Result<NotifyResponse, String> {
        let url = format!("{}/alerts/notify", self.base_url);
        let body = json!({
            "type": event.kind,
            "userId": event.user_id,
            "alert": event.alert,
        });

        let res = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("notify failed: {status} {body}"));
        }

        res.json::<NotifyResponse>().await.map_err(|e| e.to_string())
    }
}
