//! Conversion harness over inline fixture tables.
//!
//! Success fixtures are (name, yaml, expected json) triples compared
//! structurally through `serde_json`. Failure fixtures are (name, yaml,
//! expected error fragment) triples checked against the rendered error
//! message. Law tests (idempotence, round-trip, escape preservation)
//! reuse the success table.

use serde_json::{json, Value};
use yamlite::{json_text_to_yaml, json_to_yaml, yaml_to_json, yaml_to_json_value, Options};

/// Success fixtures: YAML input and the JSON document it must produce.
fn success_fixtures() -> Vec<(&'static str, &'static str, Value)> {
    vec![
        (
            "booleans-and-yes-no",
            "a: true\nb: yes\nc: no",
            json!({"a": true, "b": true, "c": false}),
        ),
        (
            "literal-vs-folded",
            "a: |\n  one\n  two\nb: >\n  one\n  two",
            json!({"a": "one\ntwo\n", "b": "one two\n"}),
        ),
        (
            "scalar-anchor-alias",
            "base: &x 42\nother: *x",
            json!({"base": 42, "other": 42}),
        ),
        (
            "merge-with-override",
            "defaults: &d\n  a: 1\n  b: 2\nitem:\n  <<: *d\n  b: 99",
            json!({"defaults": {"a": 1, "b": 2}, "item": {"a": 1, "b": 99}}),
        ),
        (
            "flow-nulls-and-pair",
            "arr: [1, , {k: v}, 3]",
            json!({"arr": [1, null, {"k": "v"}, 3]}),
        ),
        (
            "binary-tag",
            "icon: !!binary SGk=",
            json!({"icon": [72, 105]}),
        ),
        (
            "scalar-kinds",
            "i: 42\nneg: -7\nf: 1.5\nexp: 1e3\ns: hello\nempty:\nquoted: \"42\"",
            json!({
                "i": 42, "neg": -7, "f": 1.5, "exp": 1000.0,
                "s": "hello", "empty": null, "quoted": "42"
            }),
        ),
        (
            "nested-blocks",
            "server:\n  host: localhost\n  ports:\n    - 80\n    - 443\n  tls:\n    enabled: yes",
            json!({
                "server": {
                    "host": "localhost",
                    "ports": [80, 443],
                    "tls": {"enabled": true}
                }
            }),
        ),
        (
            "sequence-of-mappings",
            "- name: a\n  size: 1\n- name: b\n  size: 2",
            json!([{"name": "a", "size": 1}, {"name": "b", "size": 2}]),
        ),
        (
            "nested-sequences",
            "- - 1\n  - 2\n- - 3",
            json!([[1, 2], [3]]),
        ),
        (
            "flow-nested",
            "m: [[1, 2], [], [3]]",
            json!({"m": [[1, 2], [], [3]]}),
        ),
        (
            "comments-ignored",
            "# header\na: 1 # trailing\n# middle\nb: 2",
            json!({"a": 1, "b": 2}),
        ),
        (
            "multiline-plain-folds",
            "desc: first line\n  continued here\nnext: 1",
            json!({"desc": "first line continued here", "next": 1}),
        ),
        (
            "chomp-strip-and-keep",
            "s: |-\n  one\n  two\nk: |+\n  one\n\nlast: 1",
            json!({"s": "one\ntwo", "k": "one\n\n", "last": 1}),
        ),
        (
            "quoted-escapes-pass-through",
            "s: \"tab\\there\\nand\\\\more\"",
            json!({"s": "tab\there\nand\\more"}),
        ),
        (
            "single-quote-literal",
            "s: 'it''s literal \\n here'",
            json!({"s": "it's literal \\n here"}),
        ),
        (
            "subtree-alias",
            "base: &b\n  x: 1\n  y:\n    - 2\ncopy: *b",
            json!({"base": {"x": 1, "y": [2]}, "copy": {"x": 1, "y": [2]}}),
        ),
        (
            "alias-inside-flow",
            "n: &n 5\narr: [*n, 6]",
            json!({"n": 5, "arr": [5, 6]}),
        ),
        (
            "merge-keeps-local-only-keys",
            "defaults: &d\n  a: 1\nitem:\n  <<: *d\n  z: 9",
            json!({"defaults": {"a": 1}, "item": {"a": 1, "z": 9}}),
        ),
        (
            "merge-replaces-containers-wholesale",
            "defaults: &d\n  opts:\n    x: 1\n    y: 2\nitem:\n  <<: *d\n  opts:\n    z: 3",
            json!({
                "defaults": {"opts": {"x": 1, "y": 2}},
                "item": {"opts": {"z": 3}}
            }),
        ),
        (
            "str-tag-overrides-number",
            "v: !!str 123",
            json!({"v": "123"}),
        ),
        (
            "map-and-seq-tags-on-empty",
            "m: !!map\ns: !!seq",
            json!({"m": {}, "s": []}),
        ),
        (
            "timestamp-normalizes-to-utc",
            "d: 2001-12-14\nt: 2001-12-14 21:59:43\nz: 2001-12-14T21:59:43+05:00",
            json!({
                "d": "2001-12-14T00:00:00Z",
                "t": "2001-12-14T21:59:43Z",
                "z": "2001-12-14T16:59:43Z"
            }),
        ),
        (
            "timestamp-tag-enforced",
            "t: !!timestamp 2020-02-29T12:00:00Z",
            json!({"t": "2020-02-29T12:00:00Z"}),
        ),
        (
            "anchored-sequence",
            "tags: &t\n  - a\n  - b\nmore: *t",
            json!({"tags": ["a", "b"], "more": ["a", "b"]}),
        ),
        (
            "bare-dash-items",
            "- \n- 1",
            json!([null, 1]),
        ),
        (
            "item-with-nested-block",
            "-\n  a: 1\n- x",
            json!([{"a": 1}, "x"]),
        ),
        (
            "root-scalar",
            "42",
            json!(42),
        ),
        (
            "empty-document",
            "",
            json!(null),
        ),
        (
            "quoted-keys",
            "\"key with spaces\": 1\n'other key': 2",
            json!({"key with spaces": 1, "other key": 2}),
        ),
        (
            "null-spellings",
            "a: null\nb: NULL\nc:",
            json!({"a": null, "b": null, "c": null}),
        ),
    ]
}

/// Failure fixtures: YAML input and a fragment of the error message.
fn failure_fixtures() -> Vec<(&'static str, &'static str, &'static str)> {
    vec![
        ("unclosed-array", "a: [1, 2", "Unclosed inline array"),
        ("unclosed-double-quote", "a: \"never", "Unclosed quoted literal"),
        ("unclosed-single-quote", "a: 'never", "Unclosed quoted literal"),
        ("duplicated-key", "a: 1\na: 2", "Duplicated key"),
        ("double-key", "a: b: c", "Double key"),
        ("expected-key", "a: 1\njust text", "Expected key"),
        ("empty-key", ": 1", "Empty key"),
        ("multi-line-key", "\"a\nb\": 1", "Multi-line key"),
        ("bad-initial-char", "]bad: 1", "Invalid initial character"),
        ("invalid-indentation", "a: 1\n  b: 2", "Invalid indentation"),
        ("unconsumed-content", "a: [1] junk", "Unconsumed content"),
        ("item-after-key-inline", "a: - 1", "Invalid collection item"),
        ("marker-inside-flow", "a: [- 1]", "Invalid collection item"),
        ("unknown-tag", "a: !!fancy 1", "Unknown tag"),
        ("int-tag-mismatch", "a: !!int nope", "Invalid value for tag"),
        ("bool-tag-mismatch", "a: !!bool 17", "Invalid value for tag"),
        ("binary-tag-mismatch", "a: !!binary ???", "Invalid value for tag"),
        ("bad-block-modifier", "a: |x\n  y", "Invalid block modifier"),
        ("block-on-item", "- |\n  text", "Block modifier on collection item"),
        ("bad-anchor-name", "a: & x", "Invalid anchor or alias name"),
        ("numeric-anchor-name", "a: &1x 2", "Invalid anchor or alias name"),
        ("duplicate-anchor", "a: &x 1\nb: &x 2", "Duplicate anchor"),
        ("anchor-not-found", "a: *missing", "not found"),
        ("forward-alias", "a: *later\nb: &later 1", "not found"),
        ("alias-with-value", "a: *x trailing", "Alias with value"),
        ("recursive-alias", "a: &x\n  inner: *x", "Recursive alias"),
        ("merge-without-alias", "m:\n  <<: 1", "Invalid merge"),
        ("merge-in-flow", "a: [<<: *x]", "Merge key inside inline array"),
        ("merge-as-item", "- <<: *x", "Merge key inside collection"),
        ("merge-on-scalar", "v: &s 1\nm:\n  <<: *s", "Merge of a single value"),
    ]
}

#[test]
fn test_success_fixtures() {
    let mut passed = 0;
    let mut errors: Vec<String> = Vec::new();

    for (name, yaml, expected) in success_fixtures() {
        match yaml_to_json_value(yaml, &Options::default()) {
            Ok(actual) if actual == expected => passed += 1,
            Ok(actual) => errors.push(format!(
                "{}: mismatch\n    expected: {}\n    actual:   {}",
                name, expected, actual
            )),
            Err(e) => errors.push(format!("{}: unexpected error: {}", name, e)),
        }
    }

    println!("\nResults: {} passed, {} failed", passed, errors.len());
    for error in &errors {
        println!("  - {}", error);
    }
    assert!(errors.is_empty(), "{} fixtures failed", errors.len());
}

#[test]
fn test_failure_fixtures() {
    let mut passed = 0;
    let mut errors: Vec<String> = Vec::new();

    for (name, yaml, fragment) in failure_fixtures() {
        match yaml_to_json_value(yaml, &Options::default()) {
            Ok(v) => errors.push(format!("{}: expected error, got {}", name, v)),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains(fragment) {
                    passed += 1;
                } else {
                    errors.push(format!(
                        "{}: wrong error\n    expected fragment: {}\n    actual: {}",
                        name, fragment, msg
                    ));
                }
            }
        }
    }

    println!("\nResults: {} passed, {} failed", passed, errors.len());
    for error in &errors {
        println!("  - {}", error);
    }
    assert!(errors.is_empty(), "{} fixtures failed", errors.len());
}

/// Errors carry the 1-based source line.
#[test]
fn test_error_line_numbers() {
    let err = yaml_to_json("a: 1\nb: 2\nb: 3", &Options::default()).unwrap_err();
    assert!(err.to_string().ends_with("at line 3"), "got: {}", err);

    let err = yaml_to_json("ok: 1\nbad: !!nope 2", &Options::default()).unwrap_err();
    assert!(err.to_string().ends_with("at line 2"), "got: {}", err);
}

/// Converting YAML to JSON, back to YAML, and to JSON again is a fixed
/// point once comments, anchors and merges have expanded.
#[test]
fn test_yaml_idempotence() {
    let opts = Options::default();
    for (name, yaml, _) in success_fixtures() {
        let first = yaml_to_json_value(yaml, &opts).unwrap();
        let reencoded = json_to_yaml(&first, &opts);
        let second = yaml_to_json_value(&reencoded, &opts)
            .unwrap_or_else(|e| panic!("{}: reparse failed: {}\n{}", name, e, reencoded));
        assert_eq!(first, second, "{}: not idempotent\n{}", name, reencoded);
    }
}

/// JSON documents survive a trip through YAML unchanged.
#[test]
fn test_json_round_trip() {
    let opts = Options::default();
    let values = vec![
        json!(null),
        json!(true),
        json!(-3),
        json!(2.5),
        json!("plain words"),
        json!(""),
        json!("yes"),
        json!("07"),
        json!("2001-12-14"),
        json!("multi\nline\ntext\n"),
        json!([1, 2.5, "x", true, null]),
        json!({"a": [1, [2, []]], "b": {"c": {}, "d": "- not a list"}}),
        json!({"key with spaces": {"deep": ["mixed", 4, false]}}),
    ];
    for v in values {
        let yaml = json_to_yaml(&v, &opts);
        let back = yaml_to_json_value(&yaml, &opts)
            .unwrap_or_else(|e| panic!("reparse failed: {}\n{}", e, yaml));
        assert_eq!(v, back, "round-trip changed value\n{}", yaml);
    }
}

/// Control characters, backslash, quote, and Unicode separators survive
/// YAML → JSON → YAML.
#[test]
fn test_escape_preservation() {
    let opts = Options::default();
    let yaml = "s: \"a\\bb\\tc\\nd\\fe\\rf\\\\g\\\"h\\u0085i\\u2028j\\u2029k\"";
    let v = yaml_to_json_value(yaml, &opts).unwrap();
    assert_eq!(
        v,
        json!({"s": "a\u{8}b\tc\nd\u{c}e\rf\\g\"h\u{85}i\u{2028}j\u{2029}k"})
    );
    let reencoded = json_to_yaml(&v, &opts);
    let back = yaml_to_json_value(&reencoded, &opts).unwrap();
    assert_eq!(v, back);
}

#[test]
fn test_json_text_to_yaml() {
    let opts = Options::default();
    let yaml = json_text_to_yaml("{\"a\": [1, 2], \"b\": \"x\"}", &opts).unwrap();
    assert_eq!(yaml, "a:\n  - 1\n  - 2\nb: x\n");

    let err = json_text_to_yaml("{not json", &opts).unwrap_err();
    assert!(err.to_string().contains("Invalid JSON"));
}

#[test]
fn test_indent_width_option() {
    let opts = Options {
        indent_width: 4,
        ..Options::default()
    };
    let json = yaml_to_json("a:\n  b: 1", &opts).unwrap();
    assert_eq!(json, "{\n    \"a\": {\n        \"b\": 1\n    }\n}");

    let yaml = json_to_yaml(&json!({"a": {"b": 1}}), &opts);
    assert_eq!(yaml, "a:\n    b: 1\n");
}

#[test]
fn test_duplicate_keys_option() {
    let opts = Options {
        allow_duplicate_keys: true,
        ..Options::default()
    };
    // serde_json keeps the last occurrence.
    let v = yaml_to_json_value("a: 1\na: 2", &opts).unwrap();
    assert_eq!(v, json!({"a": 2}));
}

#[test]
fn test_yes_no_option_off() {
    let opts = Options {
        yes_no_bool: false,
        ..Options::default()
    };
    let v = yaml_to_json_value("a: yes\nb: true", &opts).unwrap();
    assert_eq!(v, json!({"a": "yes", "b": true}));
    assert_eq!(json_to_yaml(&json!({"b": true}), &opts), "b: true\n");
}
