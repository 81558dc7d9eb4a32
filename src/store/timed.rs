use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time;

use super::{AlertStore, StoreError};
use crate::models::{AlertPatch, FundRef, StoredAlert, UserContact};

/// Puts a deadline on every call to the wrapped store, so a stalled database
/// surfaces as [`StoreError::Timeout`] instead of a hung request.
pub struct TimedStore {
    inner: Arc<dyn AlertStore>,
    limit: Duration,
}

impl TimedStore {
    pub fn new(inner: Arc<dyn AlertStore>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>> + Send,
    ) -> Result<T, StoreError> {
        time::timeout(self.limit, call)
            .await
            .map_err(|_| StoreError::Timeout(self.limit))?
    }
}

#[async_trait]
impl AlertStore for TimedStore {
    async fn insert_alert(&self, alert: &StoredAlert) -> Result<(), StoreError> {
        self.bounded(self.inner.insert_alert(alert)).await
    }

    async fn find_alert(&self, id: &str) -> Result<Option<StoredAlert>, StoreError> {
        self.bounded(self.inner.find_alert(id)).await
    }

    async fn list_alerts(&self, user_id: &str) -> Result<Vec<StoredAlert>, StoreError> {
        self.bounded(self.inner.list_alerts(user_id)).await
    }

    async fn update_alert(
        &self,
        id: &str,
        patch: &AlertPatch,
    ) -> Result<Option<StoredAlert>, StoreError> {
        self.bounded(self.inner.update_alert(id, patch)).await
    }

    async fn delete_alert(&self, id: &str) -> Result<bool, StoreError> {
        self.bounded(self.inner.delete_alert(id)).await
    }

    async fn find_fund(&self, fund_id: &str) -> Result<Option<FundRef>, StoreError> {
        self.bounded(self.inner.find_fund(fund_id)).await
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<UserContact>, StoreError> {
        self.bounded(self.inner.find_user(user_id)).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.bounded(self.inner.ping()).await
    }
}
