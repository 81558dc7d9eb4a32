use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Alert, Condition, FundRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "alert_created")]
    Created,
    #[serde(rename = "alert_triggered")]
    Triggered,
}

impl EventKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "alert_created" => Some(EventKind::Created),
            "alert_triggered" => Some(EventKind::Triggered),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Created => "alert_created",
            EventKind::Triggered => "alert_triggered",
        }
    }
}

/// The alert fields a notification needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub alert_type: String,
    pub condition: Condition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fund: Option<FundRef>,
}

impl AlertSnapshot {
    /// Reads the `alert` member of a notify request. The condition may be an
    /// object or its JSON-string encoding; `fundName` is accepted in place of
    /// a joined `fund`.
    pub fn from_wire(raw: &Value) -> Result<Self, String> {
        let Some(map) = raw.as_object() else {
            return Err("alert must be a JSON object".to_string());
        };

        let condition = map
            .get("condition")
            .ok_or_else(|| "alert.condition is required".to_string())
            .and_then(Condition::from_wire)?;

        let alert_type = map
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let fund = match map.get("fund") {
            Some(f @ Value::Object(_)) => serde_json::from_value::<FundRef>(f.clone()).ok(),
            _ => map
                .get("fundName")
                .and_then(Value::as_str)
                .map(|name| FundRef {
                    name: name.to_string(),
                    code: String::new(),
                }),
        };

        Ok(AlertSnapshot {
            id: map.get("id").and_then(Value::as_str).map(str::to_string),
            alert_type,
            condition,
            fund,
        })
    }
}

impl From<&Alert> for AlertSnapshot {
    fn from(a: &Alert) -> Self {
        AlertSnapshot {
            id: Some(a.id.clone()),
            alert_type: a.alert_type.clone(),
            condition: a.condition.clone(),
            fund: a.fund.clone(),
        }
    }
}

/// Built at the moment of the event, consumed once by the dispatcher.
#[derive(Debug, Clone)]
pub struct NotificationEvent {
    pub kind: EventKind,
    pub user_id: String,
    pub alert: AlertSnapshot,
}
