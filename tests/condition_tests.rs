use serde_json::json;

use fundalerts::models::{AlertSnapshot, Condition, ConditionValue};

#[test]
fn stored_form_round_trips() {
    let conditions = [
        json!({ "type": "below", "value": 100 }),
        json!({ "type": "above", "value": 12.75 }),
        json!({ "type": "change_pct", "value": "-5" }),
        json!({ "type": "below", "value": 100, "currentNav": 98.1 }),
    ];

    for raw in conditions {
        let c = Condition::from_wire(&raw).unwrap();
        let stored = c.to_stored().unwrap();
        assert_eq!(Condition::from_stored(&stored).unwrap(), c);
        assert_eq!(serde_json::to_value(&c).unwrap(), raw);
    }
}

#[test]
fn observed_metric_selects_triggered_variant() {
    let c = Condition::from_wire(&json!({ "type": "below", "value": 100, "currentValue": "97" })).unwrap();
    assert_eq!(c.observed(), Some(ConditionValue::Text("97".to_string())));
    // always written back under the canonical name
    assert_eq!(
        serde_json::to_value(&c).unwrap(),
        json!({ "type": "below", "value": 100, "currentNav": "97" })
    );

    let c = Condition::from_wire(&json!({ "type": "below", "value": 100 })).unwrap();
    assert!(c.observed().is_none());
    assert!(matches!(c, Condition::Threshold { .. }));
}

#[test]
fn extra_condition_keys_survive_storage() {
    let conditions = [
        json!({ "type": "above", "value": 100, "period": "1Y" }),
        json!({ "type": "return_above", "value": 12, "currentReturn": 14.2 }),
        json!({ "type": "below", "value": 100, "currentNav": 98.1, "source": "amfi", "window": { "days": 7 } }),
    ];

    for raw in conditions {
        let c = Condition::from_wire(&raw).unwrap();
        let back = Condition::from_stored(&c.to_stored().unwrap()).unwrap();
        assert_eq!(back, c);
        assert_eq!(serde_json::to_value(&back).unwrap(), raw);
    }
}

#[test]
fn current_prefixed_member_is_the_observed_metric() {
    let c = Condition::from_wire(&json!({ "type": "return_above", "value": 12, "currentReturn": 14.2 })).unwrap();
    assert!(matches!(c, Condition::Threshold { .. }));

    let (key, value) = c.observed_metric().unwrap();
    assert_eq!(key, "currentReturn");
    assert_eq!(value.as_f64(), Some(14.2));

    // an explicit NAV replaces the old one and keeps the rest
    let fired = Condition::from_wire(&json!({ "type": "below", "value": 100, "currentNav": 99, "period": "1M" }))
        .unwrap()
        .with_observed(ConditionValue::Text("95.5".to_string()));
    assert_eq!(
        serde_json::to_value(&fired).unwrap(),
        json!({ "type": "below", "value": 100, "currentNav": "95.5", "period": "1M" })
    );
}

#[test]
fn from_wire_rejects_incomplete_payloads() {
    let bad = [
        json!(null),
        json!([1, 2]),
        json!("[]"),
        json!({ "value": 1 }),
        json!({ "type": "", "value": 1 }),
        json!({ "type": "below" }),
        json!({ "type": "below", "value": null }),
        json!({ "type": "below", "value": { "nested": true } }),
    ];

    for raw in bad {
        assert!(Condition::from_wire(&raw).is_err(), "{raw}");
    }
}

#[test]
fn text_values_parse_as_numbers_when_possible() {
    assert_eq!(ConditionValue::Text(" 42.5 ".to_string()).as_f64(), Some(42.5));
    assert_eq!(ConditionValue::Text("n/a".to_string()).as_f64(), None);
    assert_eq!(ConditionValue::Number(7u64.into()).to_string(), "7");
}

#[test]
fn snapshot_from_wire_reads_fund_name_and_string_condition() {
    let snap = AlertSnapshot::from_wire(&json!({
        "id": "a9",
        "type": "price",
        "condition": "{\"type\":\"above\",\"value\":10}",
        "fundName": "Gilt Fund"
    }))
    .unwrap();

    assert_eq!(snap.id.as_deref(), Some("a9"));
    assert_eq!(snap.fund.unwrap().name, "Gilt Fund");
    assert_eq!(snap.condition.comparison(), "above");

    assert!(AlertSnapshot::from_wire(&json!({ "type": "price" })).is_err());
}
