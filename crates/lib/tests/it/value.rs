use jsondepot::value::{Kind, Value, ids_equal, kind_of};
use serde_json::json;

use crate::helpers::{j, v};

#[test]
fn test_round_trip_through_serde() {
    let source = r#"{"z":1,"a":[1.5,"x",null,true],"m":{"id":"k"}}"#;
    let value: Value = serde_json::from_str(source).unwrap();
    assert_eq!(kind_of(&value), Kind::Map);
    assert_eq!(serde_json::to_string(&value).unwrap(), source);
}

#[test]
fn test_conversion_from_json_literal() {
    let value = v(json!({"list": [{"id": 2}], "n": -3}));
    let list = value.get("list").and_then(Value::as_list).unwrap();
    assert_eq!(list[0].id(), Some(&Value::from(2)));
    assert_eq!(value.get("n").and_then(Value::as_number).and_then(|n| n.as_i64()), Some(-3));
    assert_eq!(j(&value), json!({"list": [{"id": 2}], "n": -3}));
}

#[test]
fn test_loose_id_equality() {
    assert!(ids_equal(&Value::from(7), &Value::from("7")));
    assert!(ids_equal(&Value::from("7"), &Value::from(7.0)));
    assert!(!ids_equal(&Value::from("seven"), &Value::from(7)));
    assert!(!ids_equal(&Value::from(true), &Value::from(1)));
    assert!(ids_equal(&Value::Null, &Value::Null));
}
