use async_trait::async_trait;
use futures_util::StreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::Database;

use super::{AlertStore, StoreError};
use crate::models::{AlertPatch, FundRef, StoredAlert, UserContact};

const ALERTS: &str = "alerts";
const FUNDS: &str = "funds";
const USERS: &str = "users";

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

// Funds and users come from other subsystems and may be keyed by ObjectId
// or by plain string.
fn any_id_filter(id: &str) -> Document {
    match ObjectId::parse_str(id) {
        Ok(oid) => doc! { "_id": { "$in": [oid, id] } },
        Err(_) => doc! { "_id": id },
    }
}

fn id_to_string(d: &Document) -> String {
    match d.get("_id") {
        Some(mongodb::bson::Bson::ObjectId(oid)) => oid.to_hex(),
        Some(mongodb::bson::Bson::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

#[async_trait]
impl AlertStore for MongoStore {
    async fn insert_alert(&self, alert: &StoredAlert) -> Result<(), StoreError> {
        self.db
            .collection::<StoredAlert>(ALERTS)
            .insert_one(alert, None)
            .await?;
        Ok(())
    }

    async fn find_alert(&self, id: &str) -> Result<Option<StoredAlert>, StoreError> {
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        let found = self
            .db
            .collection::<StoredAlert>(ALERTS)
            .find_one(doc! { "_id": oid }, None)
            .await?;
        Ok(found)
    }

    async fn list_alerts(&self, user_id: &str) -> Result<Vec<StoredAlert>, StoreError> {
        let find_opts = FindOptions::builder()
            .sort(doc! { "created_at": -1, "_id": -1 })
            .build();

        let mut cursor = self
            .db
            .collection::<StoredAlert>(ALERTS)
            .find(doc! { "user_id": user_id }, find_opts)
            .await?;

        let mut items: Vec<StoredAlert> = Vec::new();
        while let Some(res) = cursor.next().await {
            items.push(res?);
        }

        Ok(items)
    }

    async fn update_alert(
        &self,
        id: &str,
        patch: &AlertPatch,
    ) -> Result<Option<StoredAlert>, StoreError> {
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        if patch.is_empty() {
            return self.find_alert(id).await;
        }

        let mut set = Document::new();
        if let Some(t) = &patch.alert_type {
            set.insert("alert_type", t.clone());
        }
        if let Some(c) = &patch.condition {
            set.insert("condition", c.clone());
        }
        if let Some(active) = patch.is_active {
            set.insert("is_active", active);
        }

        let opts = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let updated = self
            .db
            .collection::<StoredAlert>(ALERTS)
            .find_one_and_update(doc! { "_id": oid }, doc! { "$set": set }, opts)
            .await?;
        Ok(updated)
    }

    async fn delete_alert(&self, id: &str) -> Result<bool, StoreError> {
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(false);
        };

        let res = self
            .db
            .collection::<StoredAlert>(ALERTS)
            .delete_one(doc! { "_id": oid }, None)
            .await?;
        Ok(res.deleted_count > 0)
    }

    async fn find_fund(&self, fund_id: &str) -> Result<Option<FundRef>, StoreError> {
        let found = self
            .db
            .collection::<Document>(FUNDS)
            .find_one(any_id_filter(fund_id), None)
            .await?;

        Ok(found.map(|d| FundRef {
            name: d.get_str("name").unwrap_or_default().to_string(),
            code: d
                .get_str("code")
                .or_else(|_| d.get_str("scheme_code"))
                .unwrap_or_default()
                .to_string(),
        }))
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<UserContact>, StoreError> {
        let found = self
            .db
            .collection::<Document>(USERS)
            .find_one(any_id_filter(user_id), None)
            .await?;

        Ok(found.map(|d| UserContact {
            id: id_to_string(&d),
            email: d.get_str("email").ok().map(str::to_string),
            name: d
                .get_str("name")
                .or_else(|_| d.get_str("username"))
                .ok()
                .map(str::to_string),
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}
