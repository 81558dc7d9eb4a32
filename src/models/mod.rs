pub mod alert;
pub mod condition;
pub mod notification;
pub mod user;

pub use alert::{Alert, AlertPatch, FundRef, StoredAlert};
pub use condition::{Condition, ConditionValue};
pub use notification::{AlertSnapshot, EventKind, NotificationEvent};
pub use user::{CurrentUser, UserContact};
