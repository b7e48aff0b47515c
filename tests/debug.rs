use jtree::{parse_str, Error, Number, Options, Poly, TypeRegistry, Value};

#[test]
fn number() {
    assert_eq!(format!("{:?}", Number::from(1)), "Number(1)");
    assert_eq!(format!("{:?}", Number::from(-1)), "Number(-1)");
    assert_eq!(
        format!("{:?}", "1.50".parse::<Number>().unwrap()),
        "Number(1.5)"
    );
}

#[test]
fn node_null() {
    assert_eq!(format!("{:?}", parse_str("null").unwrap()), "Null");
}

#[test]
fn node_bool() {
    assert_eq!(format!("{:?}", parse_str("true").unwrap()), "Bool(true)");
    assert_eq!(format!("{:?}", parse_str("false").unwrap()), "Bool(false)");
}

#[test]
fn node_number() {
    assert_eq!(format!("{:?}", parse_str("1").unwrap()), "Number(1)");
    assert_eq!(format!("{:?}", parse_str("-1.0").unwrap()), "Number(-1)");
    assert_eq!(format!("{:?}", parse_str("1e30").unwrap()), "Number(1e+30)");
}

#[test]
fn node_string() {
    assert_eq!(format!("{:?}", parse_str(r#""s""#).unwrap()), "String(\"s\")");
}

#[test]
fn node_array() {
    assert_eq!(format!("{:?}", parse_str("[]").unwrap()), "Array []");
    assert_eq!(
        format!("{:?}", parse_str("[1, null,]").unwrap()),
        "Array [Number(1), Null]"
    );
}

#[test]
fn node_object() {
    assert_eq!(format!("{:?}", parse_str("{}").unwrap()), "Object {}");
    assert_eq!(
        format!("{:?}", parse_str(r#"{"b": 1, "a": "x"}"#).unwrap()),
        r#"Object {"b": Number(1), "a": String("x")}"#
    );
}

#[test]
fn value() {
    assert_eq!(format!("{:?}", Value::Number(1.0)), "Number(1.0)");
    assert_eq!(format!("{:?}", Value::from("s")), "String(\"s\")");
}

#[test]
fn error() {
    let err = parse_str("[1 2]").unwrap_err();
    let expected = "Error(\"unexpected token `2`\", offset: 3)";
    assert_eq!(format!("{:?}", err), expected);

    let err = jtree::from_str::<u8>("true x").unwrap_err();
    assert_eq!(format!("{:?}", err), "Error(\"trailing characters\", offset: 5)");

    let err: Error = jtree::from_str::<bool>("[]").unwrap_err();
    assert_eq!(format!("{:?}", err), "Error(\"sequence expected: bool\")");
}

#[test]
fn options() {
    let opts = Options::new().as_string().disallow_unknown_fields();
    let debug = format!("{:?}", opts);
    assert!(debug.starts_with("Options { as_string: true, encoding: false, elem: None"));
    assert!(debug.contains("disallow_unknown_fields: true"));
}

#[test]
fn registry() {
    assert_eq!(
        format!("{:?}", TypeRegistry::new()),
        "TypeRegistry { len: 0 }"
    );
    assert_eq!(
        format!("{:?}", jtree::EncodingRegistry::new()),
        r#"EncodingRegistry { schemes: ["base64", "hex"] }"#
    );
    assert_eq!(format!("{:?}", Poly::<String>::default()), "Poly(None)");
}
