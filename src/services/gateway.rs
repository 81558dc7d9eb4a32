//! Typed alert operations over an [`AlertStore`].
//!
//! Conditions are serialized on the way in and deserialized on every read,
//! and each returned alert carries the `{name, code}` projection of its fund
//! when the fund exists. A dangling fund id just yields no projection, and so
//! does a failed fund lookup once a create or update has been written.

use std::collections::HashMap;

use chrono::Utc;
use mongodb::bson::oid::ObjectId;

use crate::{
    models::{Alert, AlertPatch, Condition, FundRef, StoredAlert, UserContact},
    store::{AlertStore, StoreError},
};

#[derive(Debug, Clone)]
pub struct NewAlert {
    pub user_id: String,
    pub fund_id: Option<String>,
    pub alert_type: String,
    pub condition: Condition,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AlertUpdate {
    pub alert_type: Option<String>,
    pub condition: Option<Condition>,
    pub is_active: Option<bool>,
}

async fn fund_projection(
    store: &dyn AlertStore,
    fund_id: Option<&str>,
) -> Result<Option<FundRef>, StoreError> {
    match fund_id {
        Some(id) => store.find_fund(id).await,
        None => Ok(None),
    }
}

fn into_alert(stored: StoredAlert, fund: Option<FundRef>) -> Result<Alert, StoreError> {
    let id = stored.id.to_hex();
    let condition = Condition::from_stored(&stored.condition).map_err(|source| {
        StoreError::Corrupt {
            id: id.clone(),
            source,
        }
    })?;

    Ok(Alert {
        id,
        user_id: stored.user_id,
        fund_id: stored.fund_id,
        alert_type: stored.alert_type,
        condition,
        is_active: stored.is_active,
        created_at: stored.created_at,
        fund,
    })
}

async fn hydrate(store: &dyn AlertStore, stored: StoredAlert) -> Result<Alert, StoreError> {
    let fund = fund_projection(store, stored.fund_id.as_deref()).await?;
    into_alert(stored, fund)
}

/// After a committed write the fund join is display only, so a failed lookup
/// leaves the projection empty instead of failing the write.
async fn hydrate_written(store: &dyn AlertStore, stored: StoredAlert) -> Result<Alert, StoreError> {
    let fund = match fund_projection(store, stored.fund_id.as_deref()).await {
        Ok(fund) => fund,
        Err(e) => {
            tracing::warn!(
                error = %e,
                alert_id = %stored.id.to_hex(),
                fund_id = ?stored.fund_id,
                "fund lookup failed after write; returning alert without fund"
            );
            None
        }
    };
    into_alert(stored, fund)
}

pub async fn create_alert(store: &dyn AlertStore, new: NewAlert) -> Result<Alert, StoreError> {
    let stored = StoredAlert {
        id: ObjectId::new(),
        user_id: new.user_id,
        fund_id: new.fund_id,
        alert_type: new.alert_type,
        condition: new.condition.to_stored()?,
        is_active: new.is_active,
        created_at: Utc::now().timestamp_millis(),
    };

    store.insert_alert(&stored).await?;

    hydrate_written(store, stored).await
}

pub async fn get_alert(store: &dyn AlertStore, id: &str) -> Result<Option<Alert>, StoreError> {
    match store.find_alert(id).await? {
        Some(stored) => Ok(Some(hydrate(store, stored).await?)),
        None => Ok(None),
    }
}

pub async fn list_alerts(store: &dyn AlertStore, user_id: &str) -> Result<Vec<Alert>, StoreError> {
    let stored = store.list_alerts(user_id).await?;

    // one lookup per distinct fund
    let mut funds: HashMap<String, Option<FundRef>> = HashMap::new();
    let mut items = Vec::with_capacity(stored.len());
    for s in stored {
        let fund = match s.fund_id.as_deref() {
            Some(fid) => {
                if !funds.contains_key(fid) {
                    let f = store.find_fund(fid).await?;
                    funds.insert(fid.to_string(), f);
                }
                funds.get(fid).cloned().flatten()
            }
            None => None,
        };
        items.push(into_alert(s, fund)?);
    }

    Ok(items)
}

pub async fn update_alert(
    store: &dyn AlertStore,
    id: &str,
    update: AlertUpdate,
) -> Result<Option<Alert>, StoreError> {
    let patch = AlertPatch {
        alert_type: update.alert_type,
        condition: update.condition.as_ref().map(Condition::to_stored).transpose()?,
        is_active: update.is_active,
    };

    match store.update_alert(id, &patch).await? {
        Some(stored) => Ok(Some(hydrate_written(store, stored).await?)),
        None => Ok(None),
    }
}

pub async fn delete_alert(store: &dyn AlertStore, id: &str) -> Result<bool, StoreError> {
    store.delete_alert(id).await
}

pub async fn get_user_contact(
    store: &dyn AlertStore,
    user_id: &str,
) -> Result<Option<UserContact>, StoreError> {
    store.find_user(user_id).await
}
