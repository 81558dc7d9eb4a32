use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Comparison value of a condition. Numbers keep their JSON
/// representation so `100` stays `100` and `99.5` stays `99.5`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Number(Number),
    Text(String),
}

impl ConditionValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConditionValue::Number(n) => n.as_f64(),
            ConditionValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl std::fmt::Display for ConditionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConditionValue::Number(n) => write!(f, "{n}"),
            ConditionValue::Text(s) => f.write_str(s),
        }
    }
}

/// What an alert watches.
///
/// On the wire both variants are plain objects: `{type, value}` for a
/// threshold, `{type, value, currentNav}` once an observed NAV is attached.
/// The variant is picked by the presence of `currentNav`. Any other keys the
/// client sent (`period`, `currentReturn`, ...) ride along in `extra` and are
/// written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    Triggered {
        #[serde(rename = "type")]
        comparison: String,
        value: ConditionValue,
        #[serde(rename = "currentNav", alias = "currentValue")]
        observed: ConditionValue,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    Threshold {
        #[serde(rename = "type")]
        comparison: String,
        value: ConditionValue,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

const NAV_METRIC: &str = "currentNav";

impl Condition {
    pub fn threshold(comparison: impl Into<String>, value: ConditionValue) -> Self {
        Condition::Threshold {
            comparison: comparison.into(),
            value,
            extra: Map::new(),
        }
    }

    /// Same condition with `observed` attached as the current NAV.
    pub fn with_observed(&self, observed: ConditionValue) -> Self {
        let mut extra = self.extra().clone();
        extra.remove(NAV_METRIC);
        extra.remove("currentValue");

        Condition::Triggered {
            comparison: self.comparison().to_string(),
            value: self.value().clone(),
            observed,
            extra,
        }
    }

    pub fn comparison(&self) -> &str {
        match self {
            Condition::Threshold { comparison, .. } | Condition::Triggered { comparison, .. } => {
                comparison
            }
        }
    }

    pub fn value(&self) -> &ConditionValue {
        match self {
            Condition::Threshold { value, .. } | Condition::Triggered { value, .. } => value,
        }
    }

    pub fn extra(&self) -> &Map<String, Value> {
        match self {
            Condition::Threshold { extra, .. } | Condition::Triggered { extra, .. } => extra,
        }
    }

    /// The observed metric and its wire key. `currentNav` wins; otherwise the
    /// first `current*` member holding a number or string is used.
    pub fn observed_metric(&self) -> Option<(&str, ConditionValue)> {
        if let Condition::Triggered { observed, .. } = self {
            return Some((NAV_METRIC, observed.clone()));
        }

        self.extra().iter().find_map(|(key, v)| {
            if key.len() <= "current".len() || !key.starts_with("current") {
                return None;
            }
            match v {
                Value::Number(n) => Some((key.as_str(), ConditionValue::Number(n.clone()))),
                Value::String(s) => Some((key.as_str(), ConditionValue::Text(s.clone()))),
                _ => None,
            }
        })
    }

    pub fn observed(&self) -> Option<ConditionValue> {
        self.observed_metric().map(|(_, v)| v)
    }

    /// Validates a condition as it arrives from a client. Accepts an object or
    /// an object encoded as a JSON string; requires a non-empty `type` and a
    /// `value`.
    pub fn from_wire(raw: &Value) -> Result<Self, String> {
        let parsed;
        let obj = match raw {
            Value::Object(_) => raw,
            Value::String(s) => {
                parsed = serde_json::from_str::<Value>(s)
                    .map_err(|_| "condition must be a JSON object".to_string())?;
                &parsed
            }
            _ => return Err("condition must be a JSON object".to_string()),
        };

        let Some(map) = obj.as_object() else {
            return Err("condition must be a JSON object".to_string());
        };
        match map.get("type") {
            Some(Value::String(t)) if !t.trim().is_empty() => {}
            _ => return Err("condition.type is required".to_string()),
        }
        match map.get("value") {
            Some(Value::Number(_)) | Some(Value::String(_)) => {}
            _ => return Err("condition.value must be a number or string".to_string()),
        }

        serde_json::from_value(obj.clone()).map_err(|e| format!("invalid condition: {e}"))
    }

    /// Persisted form.
    pub fn to_stored(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_stored(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
