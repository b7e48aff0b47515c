use indoc::indoc;
use jtree::{parse_slice, parse_str, Category, ErrorCode, Node, Number, Object, Parser};

fn num(s: &str) -> Node {
    Node::Number(s.parse::<Number>().unwrap())
}

fn object<const N: usize>(entries: [(&str, Node); N]) -> Node {
    Node::Object(entries.into_iter().map(|(k, v)| (k.to_owned(), v)).collect())
}

#[test]
fn test_parse_array() {
    let expected = Node::Array(vec![num("123"), Node::from("aaa"), Node::from("bbb")]);
    assert_eq!(parse_str(r#"[123,"aaa","bbb"]"#).unwrap(), expected);
    assert_eq!(parse_str(r#"[123,"aaa","bbb",]"#).unwrap(), expected);
    assert_eq!(parse_str("[]").unwrap(), Node::Array(vec![]));
    assert_eq!(parse_str("[ ]").unwrap(), Node::Array(vec![]));

    for src in [r#"[123,"aaa","bbb","#, r#"[123,"aaa","bbb""#, "["] {
        let err = parse_str(src).unwrap_err();
        assert_eq!(*err.code(), ErrorCode::EofWhileParsingList, "{}", src);
        assert!(err.is_eof());
    }
}

#[test]
fn test_parse_object() {
    let expected = object([
        ("a", num("123")),
        ("b", Node::from("aaa")),
        ("c", Node::from("bbb")),
    ]);
    assert_eq!(
        parse_str(r#"{"a":123,"b":"aaa","c":"bbb"}"#).unwrap(),
        expected
    );
    assert_eq!(
        parse_str(r#"{"a":123,"b":"aaa","c":"bbb",}"#).unwrap(),
        expected
    );
    assert_eq!(parse_str("{}").unwrap(), Node::Object(Object::new()));

    for src in [r#"{"a":123,"b":"aaa","c":"bbb""#, r#"{"a":123,"b":"aaa","c":"#] {
        let err = parse_str(src).unwrap_err();
        assert_eq!(*err.code(), ErrorCode::EofWhileParsingObject, "{}", src);
    }
}

#[test]
fn test_structural_errors_carry_position() {
    let err = parse_str(r#"{"a":123,"b":"aaa","c","#).unwrap_err();
    assert_eq!(*err.code(), ErrorCode::ColonExpected(",".into()));
    assert_eq!(err.offset(), Some(22));
    assert_eq!(err.to_string(), "colon expected: `,` at position 22");

    let err = parse_str(r#"{"a":123,"b":"aaa",123}"#).unwrap_err();
    assert_eq!(*err.code(), ErrorCode::ObjectKeyExpected("123".into()));
    assert_eq!(err.offset(), Some(19));
    assert_eq!(err.to_string(), "object key expected: `123` at position 19");

    let err = parse_str("[1 2]").unwrap_err();
    assert_eq!(*err.code(), ErrorCode::UnexpectedToken("2".into()));
    assert_eq!(err.offset(), Some(3));
    assert_eq!(err.classify(), Category::Syntax);

    let err = parse_str("[true, nul]").unwrap_err();
    assert_eq!(*err.code(), ErrorCode::UndefinedKeyword("nul".into()));
    assert_eq!(err.offset(), Some(7));

    let err = parse_str("[1.2.3]").unwrap_err();
    assert_eq!(*err.code(), ErrorCode::InvalidNumber("1.2.3".into()));
    assert_eq!(err.offset(), Some(1));
}

#[test]
fn test_lexical_errors() {
    let err = parse_str(r#"{"a": @}"#).unwrap_err();
    assert_eq!(*err.code(), ErrorCode::UnexpectedCharacter('@'));
    assert_eq!(err.offset(), Some(6));
    assert_eq!(err.classify(), Category::Lexical);

    let err = parse_str(r#""\uD834x""#).unwrap_err();
    assert_eq!(*err.code(), ErrorCode::InvalidSurrogatePair);

    let err = parse_str(r#""\uDD1E""#).unwrap_err();
    assert_eq!(*err.code(), ErrorCode::InvalidSurrogatePair);

    let err = parse_str(r#""unterminated"#).unwrap_err();
    assert_eq!(*err.code(), ErrorCode::EofWhileParsingString);

    let err = parse_slice(b"[\"\xff\"]").unwrap_err();
    assert_eq!(*err.code(), ErrorCode::InvalidUtf8);
}

#[test]
fn test_string_escapes() {
    let node = parse_str(r#""\uD834\uDD1E \x41\t\"\\\/\z привет""#).unwrap();
    assert_eq!(node.as_str(), Some("\u{1D11E} A\t\"\\/z привет"));
}

#[test]
fn test_scalars() {
    assert_eq!(parse_str("true").unwrap(), Node::Bool(true));
    assert_eq!(parse_str(" false ").unwrap(), Node::Bool(false));
    assert_eq!(parse_str("null").unwrap(), Node::Null);
    assert_eq!(parse_str("-0").unwrap(), Node::from(0));
    assert_eq!(parse_str("1.5e3").unwrap(), Node::from(1500));
    assert_eq!(parse_str("100").unwrap(), num("1e2"));

    let big = parse_str("123456789012345678901234567890").unwrap();
    assert_eq!(
        big.as_number().unwrap().to_string(),
        "123456789012345678901234567890"
    );
}

#[test]
fn test_duplicate_keys() {
    let node = parse_str(r#"{"a": 1, "b": 2, "a": 3}"#).unwrap();
    let object = node.as_object().unwrap();
    assert_eq!(object.keys().collect::<Vec<_>>(), ["a", "b"]);
    assert_eq!(object["a"], Node::from(3));
    assert_eq!(object.num_fields(), 2);
}

#[test]
fn test_object_inspection() {
    let node = parse_str(indoc! {r#"
        {
            "name": "disk",
            "size": 1024,
            "tags": ["ssd", "nvme",],
        }
    "#})
    .unwrap();
    assert_eq!(node.kind(), "object");
    assert_eq!(node["tags"].kind(), "array");
    assert_eq!(node["tags"][1].as_str(), Some("nvme"));
    assert_eq!(node["missing"], Node::Null);
    assert_eq!(node["tags"][7], Node::Null);

    let object = node.as_object().unwrap();
    let (key, value) = object.field(1).unwrap();
    assert_eq!(key, "size");
    assert_eq!(*value, Node::from(1024));
    assert!(object.field(3).is_none());
    assert_eq!(object.field_by_name("name"), Some(&Node::from("disk")));
}

#[test]
fn test_trailing_characters() {
    let err = parse_str("1 2").unwrap_err();
    assert_eq!(*err.code(), ErrorCode::TrailingCharacters);
    assert_eq!(err.offset(), Some(2));

    assert!(parse_str("[1,] \n\t").is_ok());
}

#[test]
fn test_empty_input() {
    let err = parse_str("  ").unwrap_err();
    assert_eq!(*err.code(), ErrorCode::EofWhileParsingValue);
    assert!(err.is_eof());
}

#[test]
fn test_parser_leaves_rest_of_input() {
    let mut parser = Parser::from_str(r#"{"a": 1} tail"#);
    assert_eq!(parser.parse().unwrap(), object([("a", Node::from(1))]));
    assert_eq!(parser.offset(), 8);
    let err = parser.parse().unwrap_err();
    assert_eq!(*err.code(), ErrorCode::UndefinedKeyword("tail".into()));
}

#[test]
fn test_reparse_of_canonical_numbers() {
    let node = parse_str("[0.000001, 1e-7, 1e21, 123456789012345678901]").unwrap();
    let texts: Vec<String> = node
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n.as_number().unwrap().to_string())
        .collect();
    assert_eq!(texts, ["0.000001", "1e-7", "1e+21", "123456789012345678901"]);

    let text = format!("[{}]", texts.join(","));
    assert_eq!(parse_str(&text).unwrap(), node);
}
