use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::Condition;

/// Alert document as it lives in the `alerts` collection. `condition` is the
/// serialized [`Condition`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAlert {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub user_id: String,
    #[serde(default)]
    pub fund_id: Option<String>,

    pub alert_type: String,
    pub condition: String,

    pub is_active: bool,
    // unix millis
    pub created_at: i64,
}

/// Only the supplied fields are written.
#[derive(Debug, Clone, Default)]
pub struct AlertPatch {
    pub alert_type: Option<String>,
    pub condition: Option<String>,
    pub is_active: Option<bool>,
}

impl AlertPatch {
    pub fn is_empty(&self) -> bool {
        self.alert_type.is_none() && self.condition.is_none() && self.is_active.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundRef {
    pub name: String,
    pub code: String,
}

/// Alert as exposed to callers: condition deserialized, fund joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub user_id: String,
    pub fund_id: Option<String>,
    #[serde(rename = "type")]
    pub alert_type: String,
    pub condition: Condition,
    pub is_active: bool,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fund: Option<FundRef>,
}
