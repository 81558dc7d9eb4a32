use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::{AlertStore, StoreError};
use crate::models::{AlertPatch, FundRef, StoredAlert, UserContact};

#[derive(Default)]
struct Inner {
    // insertion order
    alerts: Vec<StoredAlert>,
    funds: HashMap<String, FundRef>,
    users: HashMap<String, UserContact>,
}

/// In-process store for tests and database-less runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    writes: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_user(&self, user: UserContact) {
        self.inner.write().await.users.insert(user.id.clone(), user);
    }

    pub async fn put_fund(&self, fund_id: &str, fund: FundRef) {
        self.inner
            .write()
            .await
            .funds
            .insert(fund_id.to_string(), fund);
    }

    /// Number of alert inserts, updates and deletes that changed a document.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes every call fail like an unreachable database.
    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("store unavailable".to_string()));
        }
        Ok(())
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

fn parse_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn insert_alert(&self, alert: &StoredAlert) -> Result<(), StoreError> {
        self.check()?;
        self.record_write();
        self.inner.write().await.alerts.push(alert.clone());
        Ok(())
    }

    async fn find_alert(&self, id: &str) -> Result<Option<StoredAlert>, StoreError> {
        self.check()?;
        let Some(oid) = parse_id(id) else {
            return Ok(None);
        };
        let inner = self.inner.read().await;
        Ok(inner.alerts.iter().find(|a| a.id == oid).cloned())
    }

    async fn list_alerts(&self, user_id: &str) -> Result<Vec<StoredAlert>, StoreError> {
        self.check()?;
        let inner = self.inner.read().await;
        let mut items: Vec<StoredAlert> = inner
            .alerts
            .iter()
            .rev()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        // stable: equal timestamps keep latest-inserted first
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn update_alert(
        &self,
        id: &str,
        patch: &AlertPatch,
    ) -> Result<Option<StoredAlert>, StoreError> {
        self.check()?;
        let Some(oid) = parse_id(id) else {
            return Ok(None);
        };

        let mut inner = self.inner.write().await;
        let Some(a) = inner.alerts.iter_mut().find(|a| a.id == oid) else {
            return Ok(None);
        };
        if !patch.is_empty() {
            self.record_write();
        }

        if let Some(t) = &patch.alert_type {
            a.alert_type = t.clone();
        }
        if let Some(c) = &patch.condition {
            a.condition = c.clone();
        }
        if let Some(active) = patch.is_active {
            a.is_active = active;
        }
        Ok(Some(a.clone()))
    }

    async fn delete_alert(&self, id: &str) -> Result<bool, StoreError> {
        self.check()?;
        let Some(oid) = parse_id(id) else {
            return Ok(false);
        };

        let mut inner = self.inner.write().await;
        let before = inner.alerts.len();
        inner.alerts.retain(|a| a.id != oid);
        let removed = inner.alerts.len() < before;
        if removed {
            self.record_write();
        }
        Ok(removed)
    }

    async fn find_fund(&self, fund_id: &str) -> Result<Option<FundRef>, StoreError> {
        self.check()?;
        Ok(self.inner.read().await.funds.get(fund_id).cloned())
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<UserContact>, StoreError> {
        self.check()?;
        Ok(self.inner.read().await.users.get(user_id).cloned())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }
}
