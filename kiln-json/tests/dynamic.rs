use kiln_json::{Concurrency, Dynamic, Engine, Error, JsonErrorKind, SerializeError, record};
use kiln_testhelpers::test;
use serde_json::Value;

const DOCUMENT: &str = r#"
{
    "name": "kiln",
    "version": 3,
    "ratio": -0.125,
    "tiny": 1e-9,
    "flags": [true, false, null],
    "nested": {"empty": {}, "list": [], "text": "tab\t \"quoted\" é 😀"},
    "matrix": [[1, 2], [3.5, -4.5e-3]]
}
"#;

/// Structural equality between the two trees, numbers compared as `f64`.
fn same(ours: &Dynamic, theirs: &Value) -> bool {
    match (ours, theirs) {
        (Dynamic::Null, Value::Null) => true,
        (Dynamic::Bool(a), Value::Bool(b)) => a == b,
        (Dynamic::Number(a), Value::Number(b)) => b.as_f64() == Some(*a),
        (Dynamic::String(a), Value::String(b)) => a == b,
        (Dynamic::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same(x, y))
        }
        (Dynamic::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| same(x, y)))
        }
        _ => false,
    }
}

#[test]
fn parsed_documents_agree_with_serde_json() {
    let expected: Value = serde_json::from_str(DOCUMENT).unwrap();
    for mode in [Concurrency::SingleThreaded, Concurrency::ThreadSafe] {
        let de = Engine::new().deserializer::<Dynamic>(mode).unwrap();
        let parsed = de.deserialize(DOCUMENT).unwrap();
        assert!(same(&parsed, &expected), "{parsed:?}");
        assert_eq!(de.deserialize_reader(DOCUMENT.as_bytes()).unwrap(), parsed);
    }
}

#[test]
fn member_order_is_preserved() {
    let parsed: Dynamic = kiln_json::from_str(r#"{"z":1,"a":2,"m":3,"a":4}"#).unwrap();
    let keys: Vec<&str> = parsed
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, ["z", "a", "m"]);
    assert_eq!(parsed.get("a").and_then(Dynamic::as_f64), Some(4.0));
}

#[test]
fn written_documents_parse_back_identically() {
    let parsed: Dynamic = kiln_json::from_str(DOCUMENT).unwrap();
    let written = kiln_json::to_string(&parsed).unwrap();
    assert!(!written.contains('\n'));

    let reparsed: Value = serde_json::from_str(&written).unwrap();
    assert_eq!(reparsed, serde_json::from_str::<Value>(DOCUMENT).unwrap());
    assert_eq!(kiln_json::from_str::<Dynamic>(&written).unwrap(), parsed);
}

#[test]
fn numbers_are_doubles() {
    let n: Dynamic = kiln_json::from_str("9007199254740993").unwrap();
    assert_eq!(n.as_f64(), Some(9007199254740992.0));

    let err = kiln_json::from_str::<Dynamic>("[1e400]").unwrap_err();
    assert!(matches!(
        err.as_parse().map(|e| &e.kind),
        Some(JsonErrorKind::NumberOutOfRange { target_type: "f64", .. })
    ));
}

#[derive(Default)]
struct Point {
    x: i32,
    y: i32,
}

record!(Point { x: i32, y: i32 });

#[test]
fn typed_values_use_their_own_plan() {
    let mut map = indexmap::IndexMap::new();
    map.insert("origin".to_string(), Dynamic::typed(Point { x: 0, y: -1 }));
    map.insert("count".to_string(), Dynamic::typed(7u64));
    map.insert(
        "path".to_string(),
        Dynamic::typed(vec![Point { x: 1, y: 2 }, Point { x: 3, y: 4 }]),
    );
    map.insert("label".to_string(), Dynamic::typed(Some("here".to_string())));
    let value = Dynamic::Object(map);

    let engine = Engine::new();
    let ser = engine.serializer::<Dynamic>(Concurrency::ThreadSafe).unwrap();
    assert_eq!(
        ser.serialize(&value).unwrap(),
        r#"{"origin":{"x":0,"y":-1},"count":7,"path":[{"x":1,"y":2},{"x":3,"y":4}],"label":"here"}"#
    );
    // the runtime shapes went through the same cache
    let point = engine
        .program(
            <Point as kiln_json::Shaped>::SHAPE,
            kiln_json::Direction::Serialize,
        )
        .unwrap();
    assert_eq!(point.node_count(), 2);
}

#[test]
fn typed_values_without_a_plan_fail_when_written() {
    fn double(x: u8) -> u8 {
        x * 2
    }
    let value = Dynamic::Array(vec![
        Dynamic::Number(1.0),
        Dynamic::typed(double as fn(u8) -> u8),
    ]);
    let mut out = Vec::new();
    let err = Engine::new()
        .serializer::<Dynamic>(Concurrency::SingleThreaded)
        .unwrap()
        .serialize_into(&value, &mut out)
        .unwrap_err();
    match err {
        Error::Serialize(SerializeError::UnsupportedType { type_name, source }) => {
            assert_eq!(type_name, "fn(u8) -> u8");
            assert_eq!(source.code(), "json::unsupported_shape");
        }
        other => panic!("expected an unsupported type, got {other}"),
    }
    assert!(out.is_empty());
}

#[test]
fn non_finite_numbers_cannot_be_written() {
    for n in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let err = kiln_json::to_string(&Dynamic::Number(n)).unwrap_err();
        assert!(matches!(
            err,
            Error::Serialize(SerializeError::NonFiniteFloat { .. })
        ));
    }
}
