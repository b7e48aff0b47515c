use jtree::{
    from_str, parse_str, record, Abstract, Context, Error, ErrorCode, Node, Options, Poly, Result,
    TypeRegistry, Value,
};
use std::fmt::Debug;
use std::sync::Arc;
use std::thread;

trait UserType: Debug + Send + Sync {
    fn impl_kind(&self) -> &'static str;
}

impl Abstract for dyn UserType {}

#[derive(Debug, Default, PartialEq)]
pub struct UserTypeInt {
    pub kind: String,
    pub int: i32,
}

#[derive(Debug, Default, PartialEq)]
pub struct UserTypeStr {
    pub kind: String,
    pub string: String,
}

record! {
    UserTypeInt {
        #[tag = "kind"] pub kind,
        #[tag = "int"] pub int,
    }
}

record! {
    UserTypeStr {
        #[tag = "kind"] pub kind,
        #[tag = "string"] pub string,
    }
}

impl UserType for UserTypeInt {
    fn impl_kind(&self) -> &'static str {
        "int"
    }
}

impl UserType for UserTypeStr {
    fn impl_kind(&self) -> &'static str {
        "string"
    }
}

fn user_type(node: &Node, ctx: &Context) -> Result<Box<dyn UserType>> {
    let object = match node.as_object() {
        Some(object) => object,
        None => return Err(Error::custom("object expected")),
    };
    let kind = match object.field_by_name("kind").and_then(Node::as_str) {
        Some(kind) => kind,
        None => return Err(Error::custom("malformed object")),
    };
    let opts = Options::new().context(ctx.clone());
    match kind {
        "int" => {
            let mut dest = UserTypeInt::default();
            node.decode_with(&mut dest, &opts)?;
            Ok(Box::new(dest))
        }
        "string" => {
            let mut dest = UserTypeStr::default();
            node.decode_with(&mut dest, &opts)?;
            Ok(Box::new(dest))
        }
        _ => Err(Error::custom(format!("unknown kind '{}'", kind))),
    }
}

fn registry() -> Arc<TypeRegistry> {
    let types = TypeRegistry::new();
    types.register::<dyn UserType, _>(user_type);
    Arc::new(types)
}

#[test]
fn test_user_type() {
    let opts = Options::new().types(registry());

    let mut dest = Poly::<dyn UserType>::default();
    parse_str(r#"{"kind": "int", "int": 1}"#)
        .unwrap()
        .decode_with(&mut dest, &opts)
        .unwrap();
    assert_eq!(dest.impl_kind(), "int");
    assert_eq!(format!("{:?}", dest.get().unwrap()), r#"UserTypeInt { kind: "int", int: 1 }"#);

    let mut dest = Poly::<dyn UserType>::default();
    parse_str(r#"{"kind": "string", "string": "aaa"}"#)
        .unwrap()
        .decode_with(&mut dest, &opts)
        .unwrap();
    assert_eq!(dest.impl_kind(), "string");
}

#[test]
fn test_user_type_in_sequence() {
    let src = r#"[
        {"kind": "int", "int": 123},
        {"kind": "string", "string": "text"},
    ]"#;
    let mut dest: Vec<Poly<dyn UserType>> = Vec::new();
    parse_str(src)
        .unwrap()
        .decode_with(&mut dest, &Options::new().types(registry()))
        .unwrap();
    let kinds: Vec<&str> = dest.iter().map(|v| v.impl_kind()).collect();
    assert_eq!(kinds, ["int", "string"]);
}

#[test]
fn test_constructor_errors_propagate() {
    let opts = Options::new().types(registry());
    let mut dest = Poly::<dyn UserType>::default();
    let err = parse_str(r#"{"kind": "float"}"#)
        .unwrap()
        .decode_with(&mut dest, &opts)
        .unwrap_err();
    assert_eq!(err.to_string(), "unknown kind 'float'");
    assert!(dest.get().is_none());
}

#[test]
fn test_constructor_receives_context() {
    let opts = Options::new().types(registry()).disallow_unknown_fields();
    let mut dest = Poly::<dyn UserType>::default();
    let err = parse_str(r#"{"kind": "int", "extra": 1}"#)
        .unwrap()
        .decode_with(&mut dest, &opts)
        .unwrap_err();
    assert!(matches!(err.code(), ErrorCode::UndefinedField(key, _) if &**key == "extra"));
}

#[test]
fn test_constructor_keeps_decode_depth() {
    let src = r#"[{"kind": "int", "int": 1}]"#;
    let mut dest: Vec<Poly<dyn UserType>> = Vec::new();

    let opts = Options::new().types(registry()).recursion_limit(3);
    parse_str(src).unwrap().decode_with(&mut dest, &opts).unwrap();
    assert_eq!(dest[0].impl_kind(), "int");

    let opts = Options::new().types(registry()).recursion_limit(2);
    let err = parse_str(src)
        .unwrap()
        .decode_with(&mut dest, &opts)
        .unwrap_err();
    assert_eq!(*err.code(), ErrorCode::RecursionLimitExceeded);
}

#[test]
fn test_null_empties_slot() {
    let opts = Options::new().types(registry());
    let mut dest = Poly::<dyn UserType>::default();
    parse_str(r#"{"kind": "int", "int": 1}"#)
        .unwrap()
        .decode_with(&mut dest, &opts)
        .unwrap();
    parse_str("null").unwrap().decode_with(&mut dest, &opts).unwrap();
    assert!(dest.get().is_none());
}

#[test]
fn test_unregistered_type_is_incompatible() {
    let mut dest = Poly::<dyn UserType>::default();
    let err = parse_str("1").unwrap().decode(&mut dest).unwrap_err();
    match err.code() {
        ErrorCode::IncompatibleTypes(from, to) => {
            assert_eq!(*from, "f64");
            assert!(to.contains("UserType"), "{}", to);
        }
        code => panic!("unexpected error: {}", code),
    }
}

trait Text {
    fn text(&self) -> String;
}

impl Text for String {
    fn text(&self) -> String {
        self.clone()
    }
}

// Strings convert, nothing else does.
impl Abstract for dyn Text {
    fn from_value(value: Value) -> Option<Box<Self>> {
        match value {
            Value::String(s) => Some(Box::new(s)),
            _ => None,
        }
    }
}

#[test]
fn test_default_synthesis_conversion() {
    let mut dest = Poly::<dyn Text>::default();
    parse_str(r#""hello""#).unwrap().decode(&mut dest).unwrap();
    assert_eq!(dest.text(), "hello");

    let err = parse_str("[1]").unwrap().decode(&mut dest).unwrap_err();
    assert!(matches!(
        err.code(),
        ErrorCode::IncompatibleTypes("Vec<Value>", _)
    ));
}

#[test]
fn test_value_constructor() {
    let types = TypeRegistry::new();
    types.register::<Value, _>(|node: &Node, _ctx: &Context| -> Result<Box<Value>> {
        Ok(Box::new(Value::from(node.kind())))
    });
    let opts = Options::new().types(Arc::new(types));

    let mut v = Value::Null;
    parse_str("[1, 2]").unwrap().decode_with(&mut v, &opts).unwrap();
    assert_eq!(v, Value::from("array"));

    let v: Value = from_str("[1, 2]").unwrap();
    assert_eq!(v, Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]));
}

#[test]
#[should_panic(expected = "already registered")]
fn test_duplicate_registration_panics() {
    let types = TypeRegistry::new();
    types.register::<dyn UserType, _>(user_type);
    types.register::<dyn UserType, _>(user_type);
}

#[test]
fn test_concurrent_lookup() {
    let types = registry();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let types = Arc::clone(&types);
            thread::spawn(move || {
                let src = format!(r#"{{"kind": "int", "int": {}}}"#, i);
                let mut dest = Poly::<dyn UserType>::default();
                parse_str(&src)
                    .unwrap()
                    .decode_with(&mut dest, &Options::new().types(types))
                    .unwrap();
                dest.impl_kind()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), "int");
    }
}
