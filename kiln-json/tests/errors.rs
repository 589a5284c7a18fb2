use std::io;

use kiln_json::kiln_shape::{Def, EnumDef, GenericDef, MultiArrayDef, Shape, Shaped, shape_of};
use kiln_json::{
    CompileErrorKind, Concurrency, Dynamic, Engine, EngineOptions, Error, JsonErrorKind,
    SerializeError, Unsupported, record,
};
use kiln_testhelpers::test;

struct Colour;

impl Shaped for Colour {
    const SHAPE: &'static Shape = &const {
        Shape::new::<Self>(Def::Enum(EnumDef {
            variants: &["Red", "Green", "Blue"],
        }))
    };
}

struct Plugin;

impl Shaped for Plugin {
    const SHAPE: &'static Shape = &const { Shape::new::<Self>(Def::Interface) };
}

struct Grid;

impl Shaped for Grid {
    const SHAPE: &'static Shape = &const {
        Shape::new::<Self>(Def::MultiArray(MultiArrayDef {
            rank: 3,
            item: shape_of::<f64>,
        }))
    };
}

struct Param;

impl Shaped for Param {
    const SHAPE: &'static Shape =
        &const { Shape::new::<Self>(Def::Generic(GenericDef { param: "T" })) };
}

#[derive(Default)]
struct Canvas {
    title: String,
    palette: Vec<Option<Colour>>,
}

record!(Canvas {
    title: String,
    palette: Vec<Option<Colour>>,
});

/// The reason and path, which must agree for both directions.
#[track_caller]
fn unsupported<T: Shaped>() -> (Unsupported, String) {
    let engine = Engine::new();
    let errors = [
        engine.serializer::<T>(Concurrency::ThreadSafe).err(),
        engine.deserializer::<T>(Concurrency::ThreadSafe).err(),
    ]
    .map(|result| match result {
        Some(Error::Compile(err)) => match err.kind {
            CompileErrorKind::Unsupported(reason) => (reason, err.path),
            other => panic!("expected an unsupported shape, got {other:?}"),
        },
        _ => panic!("expected a compile error"),
    });
    let [serialize, deserialize] = errors;
    assert_eq!(serialize, deserialize);
    serialize
}

#[test]
fn shapes_without_a_plan_are_rejected_when_compiled() {
    assert_eq!(unsupported::<Colour>(), (Unsupported::Enum, "$".into()));
    assert_eq!(unsupported::<Plugin>(), (Unsupported::Interface, "$".into()));
    assert_eq!(
        unsupported::<Vec<Grid>>(),
        (Unsupported::MultiArray { rank: 3 }, "$[]".into())
    );
    assert_eq!(
        unsupported::<Option<Param>>(),
        (Unsupported::OpenGeneric { param: "T" }, "$".into())
    );
    assert_eq!(
        unsupported::<Canvas>(),
        (Unsupported::Enum, "$.palette[]".into())
    );
    assert_eq!(
        unsupported::<Vec<std::collections::BTreeMap<i32, String>>>(),
        (Unsupported::NonStringKey { key: "i32" }, "$[]".into())
    );

    let err = kiln_json::to_string(&Canvas::default()).unwrap_err();
    assert_eq!(
        err.to_string(),
        format!(
            "cannot compile `{}` at $.palette[]: enums are not supported",
            std::any::type_name::<Colour>()
        )
    );
}

#[test]
fn compile_failures_are_cached() {
    let engine = Engine::new();
    let first = engine.serializer::<Canvas>(Concurrency::ThreadSafe).unwrap_err();
    let again = engine.serializer::<Canvas>(Concurrency::SingleThreaded).unwrap_err();
    assert_eq!(first.as_compile(), again.as_compile());
}

fn nested(depth: usize) -> String {
    format!("{}1{}", "[".repeat(depth), "]".repeat(depth))
}

#[test]
fn input_nesting_is_limited() {
    let engine = Engine::with_options(EngineOptions::new().max_depth(4)).unwrap();
    let de = engine.deserializer::<Dynamic>(Concurrency::ThreadSafe).unwrap();
    assert!(de.deserialize(&nested(4)).is_ok());
    let err = de.deserialize(&nested(5)).unwrap_err();
    let err = err.as_parse().unwrap();
    assert_eq!(err.kind, JsonErrorKind::DepthLimitExceeded { limit: 4 });
    assert_eq!(err.offset(), 4);

    // typed plans count the same way
    let de = engine
        .deserializer::<Vec<Vec<Vec<Vec<Vec<u8>>>>>>(Concurrency::ThreadSafe)
        .unwrap();
    assert!(matches!(
        de.deserialize(&nested(5)).unwrap_err().as_parse().map(|e| &e.kind),
        Some(JsonErrorKind::DepthLimitExceeded { .. })
    ));

    // and so do skipped members
    #[derive(Default, Debug)]
    struct Flat {
        id: u8,
    }
    record!(Flat { id: u8 });
    let de = engine.deserializer::<Flat>(Concurrency::ThreadSafe).unwrap();
    assert!(de.deserialize(r#"{"junk":[[1]],"id":1}"#).is_ok());
    let err = de
        .deserialize(&format!(r#"{{"junk":{},"id":1}}"#, nested(8)))
        .unwrap_err();
    assert!(matches!(
        err.as_parse().map(|e| &e.kind),
        Some(JsonErrorKind::DepthLimitExceeded { limit: 4 })
    ));

    // the default limit
    assert!(kiln_json::from_str::<Dynamic>(&nested(128)).is_ok());
    assert!(kiln_json::from_str::<Dynamic>(&nested(129)).is_err());
}

#[test]
fn output_nesting_is_limited() {
    let mut value = Dynamic::Number(1.0);
    for _ in 0..5 {
        value = Dynamic::Array(vec![value]);
    }
    let engine = Engine::with_options(EngineOptions::new().max_depth(4)).unwrap();
    let err = engine
        .serializer::<Dynamic>(Concurrency::ThreadSafe)
        .unwrap()
        .serialize(&value)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Serialize(SerializeError::DepthLimitExceeded { limit: 4 })
    ));
    assert_eq!(kiln_json::to_string(&value).unwrap(), nested(5));
}

#[track_caller]
fn parse_error<T: Shaped + core::fmt::Debug>(input: &str) -> (&'static str, usize) {
    let err = kiln_json::from_str::<T>(input).unwrap_err();
    let reader_err = Engine::new()
        .deserializer::<T>(Concurrency::ThreadSafe)
        .unwrap()
        .deserialize_reader(input.as_bytes())
        .unwrap_err();
    let (Some(a), Some(b)) = (err.as_parse(), reader_err.as_parse()) else {
        panic!("{input}: expected parse errors, got {err} and {reader_err}");
    };
    assert_eq!(a, b, "{input}: slice and reader disagree");
    (a.kind.code(), a.offset())
}

#[test]
fn error_codes_and_offsets() {
    assert_eq!(parse_error::<u8>("1 2"), ("json::trailing_characters", 2));
    assert_eq!(parse_error::<Vec<u8>>("[1] x"), ("json::trailing_characters", 4));
    assert_eq!(parse_error::<Vec<u8>>("[1,]"), ("json::trailing_comma", 3));
    assert_eq!(parse_error::<Dynamic>(r#"{"a":1, }"#), ("json::trailing_comma", 8));
    assert_eq!(parse_error::<Vec<u8>>("[1,2,x]"), ("json::unexpected_char", 5));
    assert_eq!(parse_error::<Vec<u8>>("[1 2]"), ("json::unexpected_char", 3));
    assert_eq!(parse_error::<u8>(""), ("json::unexpected_eof", 0));
    assert_eq!(parse_error::<Vec<u8>>("[1,"), ("json::unexpected_eof", 3));
    assert_eq!(parse_error::<String>("\"abc"), ("json::unexpected_eof", 4));
    assert_eq!(parse_error::<bool>("tru"), ("json::unexpected_eof", 3));
    assert_eq!(parse_error::<bool>("trUe"), ("json::unexpected_char", 2));
    assert_eq!(parse_error::<i32>("-"), ("json::invalid_number", 1));
    assert_eq!(parse_error::<i32>("01"), ("json::invalid_number", 1));
    assert_eq!(parse_error::<f64>("1."), ("json::invalid_number", 2));
    assert_eq!(parse_error::<f64>("1e+"), ("json::invalid_number", 3));
    assert_eq!(parse_error::<i32>("1.5"), ("json::invalid_number", 0));
    assert_eq!(parse_error::<u8>(" 300"), ("json::number_out_of_range", 1));
    assert_eq!(parse_error::<String>(r#""\x""#), ("json::invalid_escape", 1));
    assert_eq!(parse_error::<String>(r#""\u12g4""#), ("json::invalid_escape", 1));
    assert_eq!(parse_error::<String>("\"a\u{1}\""), ("json::control_character", 2));
    assert_eq!(parse_error::<Option<u8>>("nul"), ("json::unexpected_eof", 3));
}

#[test]
fn invalid_utf8_in_strings_is_rejected() {
    let de = Engine::new()
        .deserializer::<String>(Concurrency::ThreadSafe)
        .unwrap();
    let err = de.deserialize_slice(b"\"ab\xff\"").unwrap_err();
    assert_eq!(
        err.as_parse().map(|e| &e.kind),
        Some(&JsonErrorKind::InvalidUtf8)
    );
}

struct Broken;

impl io::Write for Broken {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Read for Broken {
    fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::other("source closed"))
    }
}

#[test]
fn io_failures_are_reported() {
    let err = Engine::new()
        .serializer::<Vec<u32>>(Concurrency::ThreadSafe)
        .unwrap()
        .serialize_to_writer(&vec![1, 2, 3], Broken)
        .unwrap_err();
    match err {
        Error::Serialize(SerializeError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
        other => panic!("expected an I/O error, got {other}"),
    }

    let err = Engine::new()
        .deserializer::<Vec<u32>>(Concurrency::ThreadSafe)
        .unwrap()
        .deserialize_reader(Broken)
        .unwrap_err();
    assert_eq!(
        err.as_parse().map(|e| e.kind.code()),
        Some("json::io")
    );
}

#[test]
fn bad_arguments_are_rejected() {
    let err = Engine::with_options(EngineOptions::new().pool_capacity(0)).unwrap_err();
    assert_eq!(err.argument, "pool_capacity");

    let err = kiln_json::Overrides::new(kiln_json::DeclaredNames)
        .set::<Canvas>("title", Vec::<String>::new())
        .unwrap_err();
    assert_eq!(err.argument, "names");
    assert!(Error::from(err).is_argument());
}
