//! Integration tests for parsing, evaluation and interchange

use dynval::{
    evaluate, parse, parse_json, parse_with_config, to_json_string, Dictionary, EvalConfig,
    EvalErrorKind, List, NumericType, Set, Value,
};

fn width(value: &Value) -> NumericType {
    value.as_number().unwrap().numeric_type()
}

// ============================================================================
// Reference scenarios
// ============================================================================

mod scenarios {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_arithmetic_literal() {
        let value = parse("5 + 3 * 2").unwrap();
        assert_eq!(value, Value::from(11i8));
        assert_eq!(width(&value), NumericType::Byte);
    }

    #[test]
    fn test_list_with_group() {
        let value = parse("[1, 2, (3+4)]").unwrap();
        let list = value.as_list().unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.get(2), Some(&Value::from(7i8)));
    }

    #[test]
    fn test_set_keeps_duplicates() {
        let value = parse("(1,2,2,3)").unwrap();
        let set = value.as_set().unwrap();
        let items: Vec<String> = set.iter().map(|v| v.to_notation()).collect();
        assert_eq!(items, vec!["1", "2", "2", "3"]);
    }

    #[test]
    fn test_dictionary() {
        let value = parse("{name: bob, age: 5}").unwrap();
        assert_eq!(value.type_name(), "Dictionary");
        let dict = value.as_dict().unwrap();
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["name", "age"]);
        assert_eq!(dict.get("name"), Some(&Value::from("bob")));
        assert_eq!(dict.get("age"), Some(&Value::from(5i8)));
    }

    #[test]
    fn test_division_by_zero() {
        let err = parse("10 / 0").unwrap_err();
        assert_eq!(err.kind, EvalErrorKind::DivisionByZero);
    }

    #[test]
    fn test_expression_variables() {
        let mut value = parse("temp.a + temp.b").unwrap();
        let expr = value.as_expression_mut().unwrap();
        assert_eq!(
            expr.variables().names().collect::<Vec<_>>(),
            vec!["temp.a", "temp.b"]
        );
        assert!(!expr.is_resolved());

        expr.assign("temp.a", Value::from(2i8)).unwrap();
        let err = expr.evaluate().unwrap_err();
        assert_eq!(err.kind, EvalErrorKind::UnassignedVariable("temp.b".to_string()));

        expr.assign("temp.b", Value::from(3.5f32)).unwrap();
        assert!(expr.is_resolved());
        assert_eq!(expr.evaluate().unwrap(), Value::from(5.5f32));
    }
}

// ============================================================================
// Round-trip
// ============================================================================

mod round_trip {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assert_round_trip(value: Value) {
        let text = value.to_notation();
        let back = parse(&text).unwrap_or_else(|e| panic!("`{}` failed: {}", text, e));
        assert_eq!(back, value, "notation was `{}`", text);
        assert_eq!(back.type_name(), value.type_name());
    }

    #[test]
    fn test_scalars() {
        assert_round_trip(Value::Null);
        assert_round_trip(Value::Bool(false));
        assert_round_trip(Value::from(-128i8));
        assert_round_trip(Value::from(40_000i32));
        assert_round_trip(Value::from(i64::MAX));
        assert_round_trip(Value::from(2.5f32));
        assert_round_trip(Value::from(0.1f64));
        assert_round_trip(Value::from(""));
        assert_round_trip(Value::from("hello, world"));
        assert_round_trip(Value::from("true"));
        assert_round_trip(Value::from("a + b"));
        assert_round_trip(Value::from("it's"));
    }

    #[test]
    fn test_containers() {
        let mut dict = Dictionary::new();
        dict.insert("name", Value::from("Ada"));
        dict.insert("1", Value::Null);
        dict.insert(
            "scores",
            Value::from(List::from_items(vec![Value::from(1i8), Value::from(2.5f32)])),
        );
        dict.insert("tags", Value::from(Set::from_items(vec![Value::from("x")])));
        assert_round_trip(Value::from(dict));

        assert_round_trip(Value::from(List::new()));
        assert_round_trip(Value::from(Set::new()));
        assert_round_trip(Value::from(Set::from_items(vec![
            Value::from(1i8),
            Value::from(Set::from_items(vec![Value::from(2i8), Value::from(3i8)])),
        ])));
    }

    #[test]
    fn test_class_names() {
        assert_round_trip(Value::from(
            List::from_items(vec![Value::from(1i8)]).with_class_name("Row"),
        ));
        assert_round_trip(Value::from(
            Set::from_items(vec![Value::from("a")]).with_class_name("Tags"),
        ));
        let mut point = Dictionary::new().with_class_name("Point");
        point.insert("x", Value::from(1i8));
        assert_round_trip(Value::from(point));
    }

    #[test]
    fn test_parse_render_is_stable() {
        let text = "{\"a\": [1, (2, 3), {\"b\": Null}], \"c\": \"d\"}";
        assert_eq!(parse(text).unwrap().to_notation(), text);
    }
}

// ============================================================================
// Evaluator
// ============================================================================

mod evaluation {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_literal_results() {
        assert_eq!(evaluate("5 + 3 * 2").unwrap(), "11");
        assert_eq!(evaluate("(1 + 2) * 3 > 8 && !false").unwrap(), "true");
        assert_eq!(evaluate("'a' + 1").unwrap(), "\"a1\"");
        assert_eq!(evaluate("7 / 2").unwrap(), "3.5");
        assert_eq!(evaluate("6 / 2").unwrap(), "3");
        assert_eq!(evaluate("1.5 / 2").unwrap(), "0.75");
    }

    #[test]
    fn test_widening_across_widths() {
        let value = parse("100 * 100").unwrap();
        assert_eq!(value, Value::from(10_000i16));
        assert_eq!(width(&value), NumericType::Short);
    }

    #[test]
    fn test_failures() {
        assert!(matches!(
            parse("1 +").unwrap_err().kind,
            EvalErrorKind::MissingOperand(_)
        ));
        assert!(matches!(
            parse("true + 1").unwrap_err().kind,
            EvalErrorKind::WrongInputType { .. }
        ));
        assert_eq!(
            parse("5 # 3 + 1").unwrap_err().kind,
            EvalErrorKind::UnrecognizedSymbols(vec!["#".to_string()])
        );
        assert_eq!(
            parse("1e308 * 10 + 1").unwrap_err().kind,
            EvalErrorKind::NonFiniteResult
        );
    }

    #[test]
    fn test_parse_agrees_with_evaluate_on_groups() {
        for text in ["2(3)", "(2)(3)", "(2)3", "3(1 + 1)"] {
            assert_eq!(parse(text).unwrap().to_notation(), evaluate(text).unwrap());
        }
        assert_eq!(parse("- -2").unwrap(), Value::from(2i8));
    }

    #[test]
    fn test_strict_config_rejects_identifiers() {
        let err = parse_with_config("price * qty", EvalConfig::strict()).unwrap_err();
        assert_eq!(
            err.kind,
            EvalErrorKind::UnrecognizedSymbols(vec!["price".to_string(), "qty".to_string()])
        );
        assert_eq!(
            parse_with_config("2 * 3", EvalConfig::strict()).unwrap(),
            Value::from(6i8)
        );
    }
}

// ============================================================================
// Errors
// ============================================================================

mod errors {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unbalanced_brackets() {
        for text in ["[1, 2", "{a: 1", "(1, 2]", "'open", "1)"] {
            let err = parse(text).unwrap_err();
            assert!(
                matches!(err.kind, EvalErrorKind::ParseError(_)),
                "`{}` gave {:?}",
                text,
                err
            );
        }
    }

    #[test]
    fn test_error_propagates_from_nested_piece() {
        let err = parse("{a: [1, (2, 3 / 0)]}").unwrap_err();
        assert_eq!(err.kind, EvalErrorKind::DivisionByZero);
    }

    #[test]
    fn test_error_rendering() {
        let source = "[1, 2}";
        let err = parse(source).unwrap_err();
        let rendered = err.format_with_source(source);
        assert!(rendered.contains("1:6"), "{}", rendered);
    }
}

// ============================================================================
// Mutation
// ============================================================================

mod mutation {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_edit_parsed_list() {
        let mut value = parse("[3, 'b', 1, Null, 'a', 1]").unwrap();
        let list = value.as_list_mut().unwrap();
        list.dedup();
        list.sort();
        list.insert(0, Value::Bool(true)).unwrap();
        let removed = list.remove(0).unwrap();
        assert_eq!(removed, Value::Bool(true));
        list.combine(&parse("(9, 8)").unwrap());
        assert_eq!(value.to_notation(), "[Null, 1, 3, \"a\", \"b\", 9, 8]");
    }

    #[test]
    fn test_set_read_isolation() {
        let value = parse("([1, 2], 3)").unwrap();
        let set = value.as_set().unwrap();
        let mut first = set.get(0).unwrap();
        first.as_list_mut().unwrap().append(Value::from(99i8));
        assert_eq!(set.get(0).unwrap().as_list().unwrap().len(), 2);
        assert_eq!(value.to_notation(), "([1, 2], 3)");
    }

    #[test]
    fn test_dictionary_merge() {
        let mut value = parse("{a: 1, b: 2}").unwrap();
        let other = parse("{b: 20, c: 30}").unwrap();
        let dict = value.as_dict_mut().unwrap();
        dict.combine(&other).unwrap();
        dict.remove("a").unwrap();
        assert_eq!(value.to_notation(), "{\"b\": 20, \"c\": 30}");
    }
}

// ============================================================================
// JSON
// ============================================================================

mod json {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_json_to_notation() {
        let value = parse_json(r#"{"ClassName": "Pair", "__set__": [1, "x"]}"#).unwrap();
        assert_eq!(value.type_name(), "Pair");
        assert_eq!(
            value.to_notation(),
            "{\"ClassName\": \"Pair\", \"__set__\": [1, \"x\"]}"
        );
    }

    #[test]
    fn test_notation_to_json() {
        let value = parse("{id: 7, flags: (true, false), note: Null}").unwrap();
        assert_eq!(
            to_json_string(&value, false).unwrap(),
            r#"{"id":7,"flags":{"__set__":[true,false]},"note":null}"#
        );
    }
}
