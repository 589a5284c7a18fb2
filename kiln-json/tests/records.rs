use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use kiln_json::{
    CompileErrorKind, Concurrency, DeclaredNames, Engine, EngineOptions, Error, JsonErrorKind,
    Overrides, RenameAll, RenameRule, record,
};
use kiln_json::kiln_shape::{Member, Shape};
use kiln_testhelpers::test;

#[derive(Default, Debug, Clone, PartialEq)]
struct Person {
    age: i32,
    name: String,
}

record!(Person {
    age: i32 => "Age",
    name: String => "Name",
});

#[derive(Default, Debug, Clone, PartialEq)]
struct Team {
    title: String,
    lead: Option<Person>,
    members: Vec<Person>,
    tags: BTreeMap<String, u8>,
}

record!(Team {
    title: String,
    lead: Option<Person>,
    members: Vec<Person>,
    tags: BTreeMap<String, u8>,
});

fn bart() -> Person {
    Person {
        age: 21,
        name: "Bart".into(),
    }
}

#[test]
fn unknown_members_are_skipped() {
    let de = Engine::new()
        .deserializer::<Person>(Concurrency::ThreadSafe)
        .unwrap();
    let with_bogus = de
        .deserialize(r#"{"Name":"Bart","Bogus":[1,2],"Age":21}"#)
        .unwrap();
    let plain = de.deserialize(r#"{"Name":"Bart","Age":21}"#).unwrap();
    assert_eq!(with_bogus, plain);
    assert_eq!(plain, bart());

    // anything at all may hide in an unknown member
    let noisy = de
        .deserialize(r#"{"x":{"y":[null,true,{"z":"é\n"}],"w":-1.5e3},"Name":"Bart","Age":21}"#)
        .unwrap();
    assert_eq!(noisy, bart());
}

#[test]
fn repeated_members_keep_the_last_value() {
    let de = Engine::new()
        .deserializer::<Person>(Concurrency::SingleThreaded)
        .unwrap();
    let person = de.deserialize(r#"{"Age":1,"Age":2}"#).unwrap();
    assert_eq!(person.age, 2);
    assert_eq!(person.name, "");
}

#[test]
fn members_are_written_in_declaration_order() {
    let ser = Engine::new()
        .serializer::<Person>(Concurrency::ThreadSafe)
        .unwrap();
    assert_eq!(ser.serialize(&bart()).unwrap(), r#"{"Age":21,"Name":"Bart"}"#);
}

#[test]
fn escaped_member_names_match() {
    let person: Person = kiln_json::from_str(r#"{"\u004eame":"Bart","\u0041g\u0065":21}"#).unwrap();
    assert_eq!(person, bart());
}

#[test]
fn nested_records_round_trip() {
    let team = Team {
        title: "Springfield \"Isotopes\"".into(),
        lead: Some(bart()),
        members: vec![
            bart(),
            Person {
                age: 10,
                name: "Lisa".into(),
            },
        ],
        tags: [("home".to_string(), 1), ("away".to_string(), 2)].into(),
    };
    for mode in [Concurrency::SingleThreaded, Concurrency::ThreadSafe] {
        let engine = Engine::new();
        let json = engine.serializer::<Team>(mode).unwrap().serialize(&team).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"title":"Springfield \"Isotopes\"","lead":{"Age":21,"Name":"Bart"},"#,
                r#""members":[{"Age":21,"Name":"Bart"},{"Age":10,"Name":"Lisa"}],"#,
                r#""tags":{"away":2,"home":1}}"#
            )
        );
        let back = engine.deserializer::<Team>(mode).unwrap().deserialize(&json).unwrap();
        assert_eq!(back, team);
    }

    let empty: Team = kiln_json::from_str(r#"{"lead":null}"#).unwrap();
    assert_eq!(empty, Team::default());
}

#[test]
fn string_keyed_maps() {
    let engine = Engine::new();

    let ordered: IndexMap<String, Vec<u8>> = engine
        .deserializer(Concurrency::ThreadSafe)
        .unwrap()
        .deserialize(r#"{"z":[1],"a":[],"z":[2,3]}"#)
        .unwrap();
    assert_eq!(ordered.keys().collect::<Vec<_>>(), ["z", "a"]);
    assert_eq!(ordered["z"], [2, 3]);
    let json = engine
        .serializer::<IndexMap<String, Vec<u8>>>(Concurrency::ThreadSafe)
        .unwrap()
        .serialize(&ordered)
        .unwrap();
    assert_eq!(json, r#"{"z":[2,3],"a":[]}"#);

    let hashed: HashMap<String, Option<bool>> =
        kiln_json::from_str(r#"{"yes":true,"unknown":null}"#).unwrap();
    assert_eq!(hashed["yes"], Some(true));
    assert_eq!(hashed["unknown"], None);
}

#[test]
fn naming_strategies_apply_to_both_directions() {
    #[derive(Default, Debug, PartialEq)]
    struct Settings {
        max_retries: u8,
        log_level: String,
    }
    record!(Settings {
        max_retries: u8,
        log_level: String => "level" | "log",
    });

    let engine =
        Engine::with_options(EngineOptions::new().naming(RenameAll(RenameRule::CamelCase)))
            .unwrap();
    let value = Settings {
        max_retries: 3,
        log_level: "warn".into(),
    };
    let json = engine
        .serializer::<Settings>(Concurrency::ThreadSafe)
        .unwrap()
        .serialize(&value)
        .unwrap();
    assert_eq!(json, r#"{"maxRetries":3,"level":"warn"}"#);

    let de = engine.deserializer::<Settings>(Concurrency::ThreadSafe).unwrap();
    assert_eq!(de.deserialize(&json).unwrap(), value);
    assert_eq!(de.deserialize(r#"{"maxRetries":3,"log":"warn"}"#).unwrap(), value);
    // the declared field name is no longer a candidate
    assert_eq!(
        de.deserialize(r#"{"max_retries":9,"log":"warn"}"#).unwrap().max_retries,
        0
    );

    let overridden = Overrides::new(DeclaredNames)
        .set::<Settings>("max_retries", ["retries", "tries"])
        .unwrap();
    let engine = Engine::with_options(EngineOptions::new().naming(overridden)).unwrap();
    let de = engine.deserializer::<Settings>(Concurrency::ThreadSafe).unwrap();
    assert_eq!(de.deserialize(r#"{"tries":4}"#).unwrap().max_retries, 4);
}

#[test]
fn clashing_names_fail_before_the_first_call() {
    let engine = Engine::with_options(
        EngineOptions::new().naming(|_: &'static Shape, _: &Member| vec!["same".to_string()]),
    )
    .unwrap();
    let err = engine
        .deserializer::<Person>(Concurrency::ThreadSafe)
        .unwrap_err();
    let Error::Compile(err) = err else {
        panic!("expected a compile error, got {err}");
    };
    assert_eq!(err.kind, CompileErrorKind::DuplicateName { name: "same".into() });
    assert_eq!(err.path, "$");

    let err = engine
        .serializer::<Team>(Concurrency::ThreadSafe)
        .unwrap_err();
    assert!(err.is_compile());
}

#[test]
fn records_reject_non_objects() {
    let de = Engine::new()
        .deserializer::<Person>(Concurrency::ThreadSafe)
        .unwrap();
    for (input, offset) in [("[]", 0), ("  \"Bart\"", 2), (r#"{"Age" 21}"#, 7), (r#"{Age:21}"#, 1)] {
        let err = de.deserialize(input).unwrap_err();
        let parse = err.as_parse().unwrap_or_else(|| panic!("{input}: {err}"));
        assert!(
            matches!(parse.kind, JsonErrorKind::UnexpectedChar { .. }),
            "{input}: {parse}"
        );
        assert_eq!(parse.offset(), offset, "{input}");
    }
}
