use jtree::{from_str, parse_str, record, visible_fields, ErrorCode, Options};

#[derive(Debug, Default, PartialEq)]
pub struct T0 {
    pub t1: T1,
    pub f0: i32,
    pub f1: String,
    pub t2: Option<Box<T2>>,
    pub ff: Option<String>,
}

#[derive(Debug, Default, PartialEq)]
pub struct T1 {
    pub f0: i32,
    pub f2: String,
}

#[derive(Debug, Default, PartialEq)]
pub struct T2 {
    pub f3: i32,
    pub f4: String,
    pub s: i32,
    pub zz: Option<String>,
}

record! {
    T0 {
        #[embed] pub t1,
        #[tag = "F0"] pub f0,
        #[tag = "f1"] pub f1,
        #[embed] pub t2,
        #[tag = "FF"] pub ff,
    }
}

record! {
    T1 {
        #[tag = "F0"] pub f0,
        #[tag = "f2"] pub f2,
    }
}

record! {
    T2 {
        #[tag = "f3,string"] pub f3,
        #[tag = "f4"] pub f4,
        #[tag = "-"] pub s,
        #[tag = "ZZ"] pub zz,
    }
}

const SRC: &str = r#"{
    "F0": 1,
    "f1": "aaa",
    "f2": "bbb",
    "f3": "123",
    "f4": "ccc",
    "S": 2,
    "ZZ": null
}"#;

fn expected() -> T0 {
    T0 {
        t1: T1 {
            f0: 0,
            f2: "bbb".to_owned(),
        },
        f0: 1,
        f1: "aaa".to_owned(),
        t2: Some(Box::new(T2 {
            f3: 123,
            f4: "ccc".to_owned(),
            s: 0,
            zz: None,
        })),
        ff: None,
    }
}

#[test]
fn test_object() {
    let t: T0 = from_str(SRC).unwrap();
    assert_eq!(t, expected());

    let t: Option<Box<T0>> = from_str(SRC).unwrap();
    assert_eq!(t, Some(Box::new(expected())));
}

#[test]
fn test_disallow_unknown_fields() {
    let mut t = T0::default();
    let err = parse_str(SRC)
        .unwrap()
        .decode_with(&mut t, &Options::new().disallow_unknown_fields())
        .unwrap_err();
    match err.code() {
        ErrorCode::UndefinedField(key, ty) => {
            assert_eq!(&**key, "S");
            assert!(ty.ends_with("T0"), "{}", ty);
        }
        code => panic!("unexpected error: {}", code),
    }
    assert!(err.is_data());
}

#[test]
fn test_unknown_fields_deep() {
    #[derive(Debug, Default)]
    pub struct Outer {
        pub inner: Vec<T1>,
    }
    record! {
        Outer { pub inner }
    }

    let src = r#"{"inner": [{"F0": 1}, {"bogus": true}]}"#;
    assert!(from_str::<Outer>(src).is_ok());

    let mut outer = Outer::default();
    let err = parse_str(src)
        .unwrap()
        .decode_with(&mut outer, &Options::new().disallow_unknown_fields())
        .unwrap_err();
    assert!(matches!(err.code(), ErrorCode::UndefinedField(..)));
}

#[test]
fn test_visible_fields() {
    let fields = visible_fields::<T0>();
    let names: Vec<&str> = fields.iter().map(|f| f.name()).collect();
    assert_eq!(names, ["F0", "f2", "f1", "f3", "f4", "ZZ", "FF"]);

    let f0 = fields.iter().find(|f| f.name() == "F0").unwrap();
    assert_eq!(f0.path(), [1]);

    let f3 = fields.iter().find(|f| f.name() == "f3").unwrap();
    assert_eq!(f3.path(), [3, 0]);
    assert!(f3.options().is_string());
}

#[derive(Debug, Default, PartialEq)]
pub struct A {
    pub b1: B,
    pub b2: B,
    pub c: C,
}

#[derive(Debug, Default, PartialEq)]
pub struct B {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Default, PartialEq)]
pub struct C {
    pub inner: B,
    pub z: i32,
}

record! {
    A {
        #[embed] pub b1,
        #[embed] pub b2,
        #[embed] pub c,
    }
}

record! {
    B { pub x, pub y }
}

record! {
    C {
        #[embed] pub inner,
        #[tag = "x"] pub z,
    }
}

#[test]
fn test_ambiguity() {
    // b1, b2 and c.z all provide `x` one level down; b1 is declared first.
    let a: A = from_str(r#"{"x": 1, "y": 2}"#).unwrap();
    assert_eq!(a.b1, B { x: 1, y: 2 });
    assert_eq!(a.b2, B::default());
    assert_eq!(a.c, C::default());

    let paths: Vec<(String, Vec<usize>)> = visible_fields::<A>()
        .into_iter()
        .map(|f| (f.name().to_owned(), f.path().to_vec()))
        .collect();
    assert_eq!(
        paths,
        [("x".to_owned(), vec![0, 0]), ("y".to_owned(), vec![0, 1])]
    );
}

#[derive(Debug, Default)]
pub struct Shallow {
    pub deep: Deep,
    pub x: String,
}

#[derive(Debug, Default)]
pub struct Deep {
    pub x: i32,
    pub only_deep: i32,
}

record! {
    Shallow {
        #[embed] pub deep,
        pub x,
    }
}

record! {
    Deep { pub x, pub only_deep }
}

#[test]
fn test_shallower_field_wins() {
    let s: Shallow = from_str(r#"{"x": "top", "only_deep": 5}"#).unwrap();
    assert_eq!(s.x, "top");
    assert_eq!(s.deep.x, 0);
    assert_eq!(s.deep.only_deep, 5);
}

#[derive(Debug, Default)]
pub struct Node1 {
    pub next: Option<Box<Node2>>,
    pub a: i32,
}

#[derive(Debug, Default)]
pub struct Node2 {
    pub back: Option<Box<Node1>>,
    pub b: i32,
}

record! {
    Node1 {
        #[embed] pub next,
        pub a,
    }
}

record! {
    Node2 {
        #[embed] pub back,
        pub b,
    }
}

#[test]
fn test_embedding_cycle_is_skipped() {
    let names: Vec<String> = visible_fields::<Node1>()
        .iter()
        .map(|f| f.name().to_owned())
        .collect();
    assert_eq!(names, ["a", "b"]);

    let n: Node1 = from_str(r#"{"a": 1, "b": 2}"#).unwrap();
    assert_eq!(n.a, 1);
    assert_eq!(n.next.as_ref().map(|n| n.b), Some(2));
    assert!(n.next.as_ref().unwrap().back.is_none());
}

#[derive(Debug, Default)]
pub struct Private {
    pub shown: i32,
    hidden: i32,
    embedded: B,
}

record! {
    Private {
        pub shown,
        hidden,
        #[embed] embedded,
    }
}

#[test]
fn test_private_fields_are_skipped() {
    let p: Private = from_str(r#"{"shown": 1, "hidden": 2, "x": 3}"#).unwrap();
    assert_eq!(p.shown, 1);
    assert_eq!(p.hidden, 0);
    assert_eq!(p.embedded, B::default());

    let names: Vec<String> = visible_fields::<Private>()
        .iter()
        .map(|f| f.name().to_owned())
        .collect();
    assert_eq!(names, ["shown"]);
}

#[derive(Debug, Default)]
pub struct Blobs {
    pub raw: Vec<u8>,
    pub hex: Vec<u8>,
    pub list: Vec<Vec<u8>>,
    pub counts: Vec<u32>,
    pub unknown: Vec<u8>,
}

record! {
    Blobs {
        #[tag = ",string"] pub raw,
        #[tag = ",hex"] pub hex,
        #[tag = ",[hex]"] pub list,
        #[tag = ",[string]"] pub counts,
        #[tag = ",nosuch"] pub unknown,
    }
}

#[test]
fn test_field_options() {
    let b: Blobs = from_str(
        r#"{
            "raw": "text",
            "hex": "cafe",
            "list": ["00", "ff"],
            "counts": ["1", "2"],
            "unknown": "AQI="
        }"#,
    )
    .unwrap();
    assert_eq!(b.raw, b"text");
    assert_eq!(b.hex, [0xca, 0xfe]);
    assert_eq!(b.list, [vec![0x00], vec![0xff]]);
    assert_eq!(b.counts, [1, 2]);
    // An encoding name the registry does not know falls back to Base64.
    assert_eq!(b.unknown, [1, 2]);
}

#[test]
fn test_field_error_aborts() {
    let err = from_str::<T0>(r#"{"f1": 5, "F0": "x"}"#).unwrap_err();
    assert_eq!(*err.code(), ErrorCode::CannotConvertString("i32"));
}

#[test]
fn test_record_from_non_object() {
    let err = from_str::<T1>("[]").unwrap_err();
    assert!(matches!(err.code(), ErrorCode::SequenceExpected(ty) if ty.ends_with("T1")));
}

#[test]
fn test_null_resets_record() {
    let mut t = expected();
    parse_str("null").unwrap().decode(&mut t).unwrap();
    assert_eq!(t, T0::default());
}
