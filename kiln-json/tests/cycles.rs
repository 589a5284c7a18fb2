use std::sync::{Arc, OnceLock};

use kiln_json::kiln_shape::Reflect;
use kiln_json::{Concurrency, Dynamic, Engine, Error, SerializeError, record};
use kiln_testhelpers::test;

#[derive(Default, Debug)]
struct Link {
    name: String,
    next: OnceLock<Arc<Link>>,
}

record!(Link {
    name: String,
    next: OnceLock<Arc<Link>>,
});

fn link(name: &str) -> Arc<Link> {
    Arc::new(Link {
        name: name.into(),
        next: OnceLock::new(),
    })
}

#[track_caller]
fn assert_cycle_through(err: Error, expected: &str) {
    match err {
        Error::Serialize(SerializeError::Cycle { type_name }) => {
            assert!(type_name.ends_with(expected), "{type_name}");
        }
        other => panic!("expected a cycle, got {other}"),
    }
}

#[test]
fn a_link_to_itself_is_a_cycle() {
    let a = link("a");
    a.next.set(a.clone()).unwrap();

    for mode in [Concurrency::SingleThreaded, Concurrency::ThreadSafe] {
        let ser = Engine::new().serializer::<Arc<Link>>(mode).unwrap();
        let err = ser.serialize(&a).unwrap_err();
        assert!(err.is_cycle());
        assert_cycle_through(err, "Link");
    }
}

#[test]
fn a_longer_loop_is_a_cycle() {
    let a = link("a");
    let b = link("b");
    let c = link("c");
    a.next.set(b.clone()).unwrap();
    b.next.set(c.clone()).unwrap();
    c.next.set(a.clone()).unwrap();

    let err = kiln_json::to_string(&b).unwrap_err();
    assert!(err.is_cycle());
}

#[test]
fn shared_but_acyclic_values_are_written_each_time() {
    #[derive(Default)]
    struct Pair {
        left: Arc<Link>,
        right: Arc<Link>,
        all: Vec<Arc<Link>>,
    }
    record!(Pair {
        left: Arc<Link>,
        right: Arc<Link>,
        all: Vec<Arc<Link>>,
    });

    let tail = link("tail");
    let head = link("head");
    head.next.set(tail.clone()).unwrap();
    let pair = Pair {
        left: head.clone(),
        right: tail.clone(),
        all: vec![head.clone(), head, tail],
    };
    let json = kiln_json::to_string(&pair).unwrap();
    let head_json = r#"{"name":"head","next":{"name":"tail","next":null}}"#;
    let tail_json = r#"{"name":"tail","next":null}"#;
    assert_eq!(
        json,
        format!(r#"{{"left":{head_json},"right":{tail_json},"all":[{head_json},{head_json},{tail_json}]}}"#)
    );
}

#[test]
fn a_failed_call_leaves_nothing_behind() {
    let looped = link("loop");
    looped.next.set(looped.clone()).unwrap();
    let straight = link("start");
    straight.next.set(link("end")).unwrap();

    for mode in [Concurrency::SingleThreaded, Concurrency::ThreadSafe] {
        let ser = Engine::new().serializer::<Arc<Link>>(mode).unwrap();
        for _ in 0..3 {
            assert!(ser.serialize(&looped).unwrap_err().is_cycle());
            assert_eq!(
                ser.serialize(&straight).unwrap(),
                r#"{"name":"start","next":{"name":"end","next":null}}"#
            );
        }

        let mut out = b"prefix ".to_vec();
        assert!(ser.serialize_into(&looped, &mut out).is_err());
        assert_eq!(out, b"prefix ");
    }
}

#[test]
fn cycles_through_dynamic_values_are_caught() {
    #[derive(Default)]
    struct Envelope {
        label: String,
        payload: OnceLock<Dynamic>,
    }
    record!(Envelope {
        label: String,
        payload: OnceLock<Dynamic>,
    });

    let envelope = Arc::new(Envelope {
        label: "outer".into(),
        payload: OnceLock::new(),
    });
    let erased: Arc<dyn Reflect> = envelope.clone();
    envelope
        .payload
        .set(Dynamic::Array(vec![Dynamic::Typed(erased.clone())]))
        .unwrap();

    let err = kiln_json::to_string(&Dynamic::Typed(erased)).unwrap_err();
    assert_cycle_through(err, "Envelope");

    // the same type nested by value is fine
    let inner = Envelope {
        label: "inner".into(),
        payload: OnceLock::from(Dynamic::Bool(true)),
    };
    let outer = Envelope {
        label: "outer".into(),
        payload: OnceLock::from(Dynamic::typed(inner)),
    };
    assert_eq!(
        kiln_json::to_string(&outer).unwrap(),
        r#"{"label":"outer","payload":{"label":"inner","payload":true}}"#
    );
}

#[test]
fn cycles_that_skip_records_are_caught() {
    let cell: Arc<OnceLock<Dynamic>> = Arc::new(OnceLock::new());
    let erased: Arc<dyn Reflect> = cell.clone();
    cell.set(Dynamic::Typed(erased.clone())).unwrap();

    let err = kiln_json::to_string(&Dynamic::Typed(erased)).unwrap_err();
    assert_cycle_through(err, "Dynamic>");

    // entered through a typed shared pointer instead
    for mode in [Concurrency::SingleThreaded, Concurrency::ThreadSafe] {
        let ser = Engine::new()
            .serializer::<Arc<OnceLock<Dynamic>>>(mode)
            .unwrap();
        assert!(ser.serialize(&cell).unwrap_err().is_cycle());
    }

    // one value reached twice without a loop is still written twice
    let shared = Dynamic::typed(vec![1u8, 2]);
    let twice = Dynamic::Array(vec![shared.clone(), shared]);
    assert_eq!(kiln_json::to_string(&twice).unwrap(), "[[1,2],[1,2]]");
}

#[test]
fn cyclic_types_read_without_trouble() {
    let chain: Arc<Link> =
        kiln_json::from_str(r#"{"name":"a","next":{"name":"b","next":{"name":"c"}}}"#).unwrap();
    let names: Vec<&str> = std::iter::successors(Some(&chain), |l| l.next.get())
        .map(|l| l.name.as_str())
        .collect();
    assert_eq!(names, ["a", "b", "c"]);
}
