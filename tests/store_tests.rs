use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use fundalerts::{
    config::{self, NotifyTransport},
    models::{AlertPatch, Condition, ConditionValue, FundRef, StoredAlert, UserContact},
    routes,
    services::{
        gateway::{self, AlertUpdate, NewAlert},
        mailer::{Delivery, MailError, Mailer, OutboundEmail},
        notify_queue,
    },
    store::{AlertStore, MemoryStore, StoreError},
    AppState,
};

/// Wraps a [`MemoryStore`]; fund lookups can be made to fail and alert
/// listings to stall.
struct FaultyStore {
    inner: MemoryStore,
    funds_down: bool,
    stall_listing: bool,
}

impl FaultyStore {
    fn funds_down() -> Self {
        Self {
            inner: MemoryStore::new(),
            funds_down: true,
            stall_listing: false,
        }
    }

    fn stalled_listing() -> Self {
        Self {
            inner: MemoryStore::new(),
            funds_down: false,
            stall_listing: true,
        }
    }
}

#[async_trait]
impl AlertStore for FaultyStore {
    async fn insert_alert(&self, alert: &StoredAlert) -> Result<(), StoreError> {
        self.inner.insert_alert(alert).await
    }

    async fn find_alert(&self, id: &str) -> Result<Option<StoredAlert>, StoreError> {
        self.inner.find_alert(id).await
    }

    async fn list_alerts(&self, user_id: &str) -> Result<Vec<StoredAlert>, StoreError> {
        if self.stall_listing {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        self.inner.list_alerts(user_id).await
    }

    async fn update_alert(
        &self,
        id: &str,
        patch: &AlertPatch,
    ) -> Result<Option<StoredAlert>, StoreError> {
        self.inner.update_alert(id, patch).await
    }

    async fn delete_alert(&self, id: &str) -> Result<bool, StoreError> {
        self.inner.delete_alert(id).await
    }

    async fn find_fund(&self, fund_id: &str) -> Result<Option<FundRef>, StoreError> {
        if self.funds_down {
            return Err(StoreError::Backend("funds collection unreachable".to_string()));
        }
        self.inner.find_fund(fund_id).await
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<UserContact>, StoreError> {
        self.inner.find_user(user_id).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
}

#[derive(Default)]
struct CountingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
}

#[async_trait]
impl Mailer for CountingMailer {
    async fn send(&self, email: OutboundEmail) -> Result<Delivery, MailError> {
        self.sent.lock().unwrap().push(email);
        Ok(Delivery::Sent { id: None })
    }
}

fn below(value: u64) -> Condition {
    Condition::threshold("below", ConditionValue::Number(value.into()))
}

fn new_alert(fund_id: Option<&str>) -> NewAlert {
    NewAlert {
        user_id: "u1".to_string(),
        fund_id: fund_id.map(str::to_string),
        alert_type: "price".to_string(),
        condition: below(100),
        is_active: true,
    }
}

async fn app_over(store: Arc<dyn AlertStore>, store_timeout: Duration) -> (Router, Arc<CountingMailer>) {
    let mut settings = config::load();
    settings.notify_transport = NotifyTransport::Inline;
    settings.store_timeout = store_timeout;

    let mailer = Arc::new(CountingMailer::default());
    let (state, rx) = AppState::new(settings, store, mailer.clone()).expect("templates");
    notify_queue::spawn_notification_worker(state.clone(), rx);

    (routes::app(state), mailer)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn fund_lookup_failure_does_not_fail_a_committed_create() {
    let store = FaultyStore::funds_down();

    let alert = gateway::create_alert(&store, new_alert(Some("f1"))).await.unwrap();
    assert!(alert.fund.is_none());
    assert_eq!(alert.fund_id.as_deref(), Some("f1"));
    assert_eq!(store.inner.write_count(), 1);

    let updated = gateway::update_alert(
        &store,
        &alert.id,
        AlertUpdate {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert!(!updated.is_active);
    assert!(updated.fund.is_none());
}

#[tokio::test]
async fn fund_lookup_failure_still_fails_plain_reads() {
    let store = FaultyStore::funds_down();
    let alert = gateway::create_alert(&store, new_alert(Some("f1"))).await.unwrap();

    assert!(gateway::get_alert(&store, &alert.id).await.is_err());
}

#[tokio::test]
async fn create_over_fund_outage_returns_201_and_notifies() {
    let store = Arc::new(FaultyStore::funds_down());
    store
        .inner
        .put_user(UserContact {
            id: "u1".to_string(),
            email: Some("u1@example.com".to_string()),
            name: None,
        })
        .await;
    let (app, mailer) = app_over(store.clone(), Duration::from_secs(2)).await;

    let req = Request::builder()
        .method("POST")
        .uri("/alerts")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "userId": "u1", "fundId": "f1", "type": "price", "condition": { "type": "below", "value": 100 } })
                .to_string(),
        ))
        .unwrap();
    let (status, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body.get("fund").is_none());
    assert_eq!(store.inner.write_count(), 1);

    let mut delivered = false;
    for _ in 0..200 {
        if !mailer.sent.lock().unwrap().is_empty() {
            delivered = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(delivered);
}

#[tokio::test]
async fn stalled_store_call_times_out_as_500() {
    let store = Arc::new(FaultyStore::stalled_listing());
    let (app, _) = app_over(store, Duration::from_millis(100)).await;

    let req = Request::builder()
        .method("GET")
        .uri("/alerts?userId=u1")
        .body(Body::empty())
        .unwrap();
    let (status, body) = tokio::time::timeout(Duration::from_secs(5), send(&app, req))
        .await
        .expect("request should not hang");

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn memory_store_counts_only_effective_writes() {
    let store = MemoryStore::new();

    assert!(store.update_alert("not-an-id", &AlertPatch::default()).await.unwrap().is_none());
    assert!(!store.delete_alert("64b7f0c2a1b2c3d4e5f60718").await.unwrap());
    assert_eq!(store.write_count(), 0);

    let alert = gateway::create_alert(&store, new_alert(None)).await.unwrap();
    assert_eq!(store.write_count(), 1);

    // empty patch leaves the document as is
    store.update_alert(&alert.id, &AlertPatch::default()).await.unwrap();
    assert_eq!(store.write_count(), 1);

    assert!(store.delete_alert(&alert.id).await.unwrap());
    assert_eq!(store.write_count(), 2);
}
