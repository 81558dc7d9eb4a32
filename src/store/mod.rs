//! Raw document access for alerts, funds and users.
//!
//! [`AlertStore`] is the seam between the services and the database. The
//! services only ever see this trait; `main` picks the backend.

use std::time::Duration;

use async_trait::async_trait;

use crate::models::{AlertPatch, FundRef, StoredAlert, UserContact};

pub mod memory;
pub mod mongo;
pub mod timed;

pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use timed::TimedStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Backend(String),

    #[error("database call timed out after {0:?}")]
    Timeout(Duration),

    #[error("alert {id} has a corrupt condition payload: {source}")]
    Corrupt {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not serialize condition: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(e: mongodb::error::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// Every operation touches exactly one document (or one owner's listing);
/// atomicity is whatever the backend gives per document.
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn insert_alert(&self, alert: &StoredAlert) -> Result<(), StoreError>;

    /// `Ok(None)` for unknown or malformed ids.
    async fn find_alert(&self, id: &str) -> Result<Option<StoredAlert>, StoreError>;

    /// Owner's alerts, newest first.
    async fn list_alerts(&self, user_id: &str) -> Result<Vec<StoredAlert>, StoreError>;

    /// Applies the supplied fields and returns the document after the write.
    async fn update_alert(
        &self,
        id: &str,
        patch: &AlertPatch,
    ) -> Result<Option<StoredAlert>, StoreError>;

    /// `Ok(false)` when nothing matched.
    async fn delete_alert(&self, id: &str) -> Result<bool, StoreError>;

    async fn find_fund(&self, fund_id: &str) -> Result<Option<FundRef>, StoreError>;

    async fn find_user(&self, user_id: &str) -> Result<Option<UserContact>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
