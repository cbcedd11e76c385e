use jsv::{
    CompileError, Format, FormatCheck, FormatVerdict, SerdeSchema, ValidationResult, Validator,
    ValidatorOptions,
};
use regex::Regex;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::thread;

fn schema(value: Value) -> SerdeSchema {
    serde_json::from_value(value).unwrap()
}

fn foo_with_format() -> SerdeSchema {
    schema(json!({
        "type": "object",
        "properties": { "foo": { "type": "string", "format": "as" } }
    }))
}

fn fields(result: &ValidationResult) -> Vec<(&str, &str)> {
    result
        .errors
        .iter()
        .map(|e| (e.field.as_str(), e.message.as_str()))
        .collect()
}

#[test]
fn custom_format_pattern() {
    let options = ValidatorOptions::new().with_format("as", Regex::new("^a+$").unwrap());
    let validator = Validator::compile(foo_with_format(), options).unwrap();

    assert!(!validator.is_valid(&json!({ "foo": "" })));
    assert!(!validator.is_valid(&json!({ "foo": "b" })));
    assert!(!validator.is_valid(&json!({ "foo": "aaab" })));
    assert!(validator.is_valid(&json!({ "foo": "a" })));
    assert!(validator.is_valid(&json!({ "foo": "aaaaaa" })));

    assert_eq!(
        vec![("data.foo", "must be as format")],
        fields(&validator.validate(&json!({ "foo": "b" })))
    );
}

#[test]
fn custom_format_function() {
    let re = Regex::new("^a+$").unwrap();
    let options = ValidatorOptions::new().with_format(
        "as",
        FormatCheck::predicate(move |value, _| value.as_str().map_or(false, |s| re.is_match(s))),
    );
    let validator = Validator::compile(foo_with_format(), options).unwrap();

    assert!(!validator.is_valid(&json!({ "foo": "" })));
    assert!(!validator.is_valid(&json!({ "foo": "aaab" })));
    assert!(validator.is_valid(&json!({ "foo": "aaaaaa" })));
}

#[test]
fn custom_format_function_with_custom_message() {
    let options = ValidatorOptions::new().with_format(
        "as",
        FormatCheck::predicate(|value, _| {
            if value != "as" {
                FormatVerdict::from("custom error message")
            } else {
                FormatVerdict::Pass
            }
        }),
    );
    let validator = Validator::compile(foo_with_format(), options).unwrap();

    let result = validator.validate(&json!({ "foo": "" }));
    assert!(!result.valid);
    assert_eq!(vec![("data.foo", "custom error message")], fields(&result));
}

#[test]
fn custom_format_function_receives_declaring_node() {
    let touched = Arc::new(Mutex::new(vec![]));
    let seen = touched.clone();

    let options = ValidatorOptions::new().with_format(
        "as",
        FormatCheck::predicate(move |value, node: &SerdeSchema| {
            seen.lock().unwrap().push(node.clone());
            value == "as"
        }),
    );

    let source = foo_with_format();
    let validator = Validator::compile(source.clone(), options).unwrap();

    assert!(validator.is_valid(&json!({ "foo": "as" })));

    let touched = touched.lock().unwrap();
    assert_eq!(1, touched.len());
    assert_eq!(source.properties.as_ref().unwrap().get("foo"), Some(&touched[0]));
}

#[test]
fn inline_format() {
    let mut source = foo_with_format();
    source
        .properties
        .as_mut()
        .unwrap()
        .get_mut("foo")
        .unwrap()
        .format = Some(Format::inline(|value, _| value == "as"));

    // No "as" format is registered; the inline predicate does not need one.
    let validator = Validator::compile(source, ValidatorOptions::new()).unwrap();

    assert!(!validator.is_valid(&json!({ "foo": "s" })));
    assert!(validator.is_valid(&json!({ "foo": "as" })));
    assert_eq!(
        vec![("data.foo", "must be custom format")],
        fields(&validator.validate(&json!({ "foo": "s" })))
    );
}

#[test]
fn unknown_format_fails_to_compile() {
    let result = Validator::compile(foo_with_format(), ValidatorOptions::new());
    assert!(matches!(result, Err(CompileError::UnknownFormat(ref name)) if name == "as"));
}

#[test]
fn external_schemas() {
    let options = ValidatorOptions::new().with_schema("ext", schema(json!({ "type": "string" })));
    let validator =
        Validator::compile(schema(json!({ "required": true, "$ref": "#ext" })), options).unwrap();

    assert!(validator.is_valid(&json!("hello string")));
    assert!(!validator.is_valid(&json!(42)));
    assert_eq!(
        vec![("data", "is required")],
        fields(&validator.validate_missing())
    );
}

#[test]
fn percent_encoded_pointer() {
    let validator = Validator::from_value(
        json!({
            "properties": {
                "a b": { "type": "string" },
                "c": { "$ref": "#/properties/a%20b" }
            }
        }),
        ValidatorOptions::new(),
    )
    .unwrap();

    assert_eq!(
        vec![("data.c", "is the wrong type")],
        fields(&validator.validate(&json!({ "c": 1 })))
    );
}

#[test]
fn missing_external_schema_fails_to_compile() {
    let result = Validator::compile(schema(json!({ "$ref": "#ext" })), ValidatorOptions::new());

    match result {
        Err(CompileError::UnresolvedReference { reference }) => assert_eq!("#ext", reference),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn does_not_mutate_schema() {
    let source = schema(json!({
        "items": [{}],
        "additionalItems": { "type": "integer" }
    }));
    let copy = source.clone();

    let validator = Validator::compile(source, ValidatorOptions::new()).unwrap();

    assert_eq!(&copy, validator.to_schema());
    assert!(validator.is_valid(&json!(["anything", 1, 2])));
    assert!(!validator.is_valid(&json!(["anything", 1.5])));
}

#[test]
fn to_schema_round_trips() {
    let value = json!({
        "required": true,
        "type": "object",
        "title": "greeting",
        "properties": { "hello": { "type": "string", "required": true } }
    });

    let validator = Validator::from_value(value.clone(), ValidatorOptions::new()).unwrap();
    assert_eq!(value, serde_json::to_value(validator.to_schema()).unwrap());
}

#[test]
fn recursive_schema() {
    let validator = Validator::from_value(
        json!({
            "definitions": {
                "node": {
                    "type": "object",
                    "required": ["value"],
                    "properties": {
                        "value": { "type": "integer" },
                        "children": { "type": "array", "items": { "$ref": "#/definitions/node" } }
                    }
                }
            },
            "$ref": "#/definitions/node"
        }),
        ValidatorOptions::new(),
    )
    .unwrap();

    let tree = json!({
        "value": 1,
        "children": [
            { "value": 2, "children": [] },
            { "value": 3, "children": [{ "value": "four" }, {}] }
        ]
    });

    assert_eq!(
        vec![
            ("data.children.1.children.0.value", "is the wrong type"),
            ("data.children.1.children.1.value", "is required"),
        ],
        fields(&validator.validate(&tree))
    );
}

#[test]
fn greedy_never_reports_fewer_errors() {
    let source = json!({
        "type": "object",
        "required": ["a", "b"],
        "additionalProperties": false,
        "properties": {
            "a": { "type": "array", "minItems": 2, "items": { "type": "string" }, "uniqueItems": true },
            "c": { "type": "string", "minLength": 3, "pattern": "^x", "format": "email" },
            "d": { "enum": [1, 2], "minimum": 5 }
        }
    });

    let instances = vec![
        json!({}),
        json!({ "a": [1] }),
        json!({ "a": [1, 1], "b": 0, "c": "ab", "d": 3, "e": true }),
        json!({ "a": ["x", "x"], "b": 0, "c": "yy@z" }),
        json!({ "b": 0, "d": 3 }),
    ];

    let lazy = Validator::from_value(source.clone(), ValidatorOptions::new()).unwrap();
    let greedy = Validator::from_value(source, ValidatorOptions::new().with_greedy(true)).unwrap();

    for instance in &instances {
        let lazy_errors = lazy.validate(instance).errors;
        let greedy_errors = greedy.validate(instance).errors;

        assert!(
            greedy_errors.len() >= lazy_errors.len(),
            "greedy found fewer errors for {}",
            instance
        );
        assert_eq!(lazy_errors.is_empty(), greedy_errors.is_empty());
    }
}

#[test]
fn shared_across_threads() {
    let validator = Arc::new(
        Validator::from_value(
            json!({ "type": "object", "properties": { "n": { "type": "integer", "maximum": 10 } } }),
            ValidatorOptions::new(),
        )
        .unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let validator = validator.clone();
            thread::spawn(move || {
                let result = validator.validate(&json!({ "n": i * 3 }));
                (i * 3 <= 10, result)
            })
        })
        .collect();

    for handle in handles {
        let (expect_valid, result) = handle.join().unwrap();
        assert_eq!(expect_valid, result.valid);
        assert!(result.errors.len() <= 1);
    }
}

#[test]
fn recompiling_gives_identical_results() {
    let source = json!({
        "type": "object",
        "properties": {
            "tags": { "type": "array", "items": [{ "type": "string" }], "additionalItems": false },
            "self": { "$ref": "#" }
        },
        "required": ["tags"]
    });
    let instance = json!({ "self": { "tags": [1, 2] }, "extra": null });

    let first = Validator::from_value(source.clone(), ValidatorOptions::new().with_greedy(true))
        .unwrap()
        .validate(&instance);
    let second = Validator::from_value(source, ValidatorOptions::new().with_greedy(true))
        .unwrap()
        .validate(&instance);

    assert_eq!(first, second);
    assert_eq!(
        vec![
            ("data.tags", "is required"),
            ("data.self.tags.0", "is the wrong type"),
            ("data.self.tags", "has additional items"),
        ],
        fields(&first)
    );
}
