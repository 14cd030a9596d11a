// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end callable synthesis: naming, validation, records and degradation.

use serde_json::{Value, json};
use std::sync::Arc;
use tb_callable::{CallableSynthesizer, SynthesisOptions};
use tb_core::{Arguments, CanonicalTool, ToolError, tool_fn};
use tb_schema::{TypeCache, TypeRef, TypeSynthesizer};

fn args(v: Value) -> Arguments {
    v.as_object().cloned().unwrap()
}

fn echo(name: &str, parameters: Value) -> CanonicalTool {
    CanonicalTool::new(name, "", parameters).with_func(tool_fn(|a| Ok(Value::Object(a))))
}

#[test]
fn long_name_tool_end_to_end() {
    let long = "a".repeat(80);
    let tool = echo(
        &long,
        json!({"type": "object", "properties": {"x": {"type": "string"}}, "required": ["x"]}),
    );
    let callable = CallableSynthesizer::new().synthesize(&tool, None, SynthesisOptions::default());

    assert_eq!(callable.name().chars().count(), 64);
    assert_eq!(&callable.name()[..32], &long[..32]);

    let err = callable.call(Arguments::new()).unwrap_err();
    match err {
        ToolError::InvalidArguments { tool, fields, .. } => {
            assert_eq!(tool, callable.name());
            assert_eq!(fields, vec!["x".to_string()]);
        }
        other => panic!("expected invalid arguments, got {other:?}"),
    }
    assert_eq!(callable.call(args(json!({"x": "ok"}))).unwrap(), json!({"x": "ok"}));
}

#[test]
fn single_field_shortcut_through_call() {
    let tool = echo(
        "weather",
        json!({"type": "object", "properties": {"city": {"type": "string"}}, "required": ["city"]}),
    );
    let callable = CallableSynthesizer::new().synthesize(&tool, None, SynthesisOptions::default());
    let out = callable.call(args(json!({"place": "Shanghai"}))).unwrap();
    assert_eq!(out, json!({"city": "Shanghai"}));
}

#[test]
fn nested_record_parameter() {
    let schema = json!({
        "type": "object",
        "properties": {
            "address": {"$ref": "#/$defs/Address"}
        },
        "required": ["address"],
        "$defs": {
            "Address": {
                "title": "Address",
                "type": "object",
                "properties": {"street": {"type": "string"}, "zip": {"type": "integer"}},
                "required": ["street"]
            }
        }
    });
    let tool = echo("ship", schema);
    let callable = CallableSynthesizer::new().synthesize(&tool, None, SynthesisOptions::default());
    let record = callable.param("address").unwrap().ty.as_record().unwrap().clone();
    assert_eq!(record.name, "Address");

    callable.call(args(json!({"address": {"street": "Main"}}))).unwrap();
    let err = callable.call(args(json!({"address": {"zip": 1}}))).unwrap_err();
    assert!(matches!(err, ToolError::InvalidArguments { .. }));
}

#[test]
fn required_nullable_field_accepts_null() {
    let tool = echo(
        "t",
        json!({
            "type": "object",
            "properties": {"x": {"anyOf": [{"type": "integer"}, {"type": "null"}]}},
            "required": ["x"]
        }),
    );
    let callable = CallableSynthesizer::new().synthesize(&tool, None, SynthesisOptions::default());
    assert_eq!(callable.param("x").unwrap().ty, TypeRef::Integer.optional());

    let out = callable.call(args(json!({"x": null}))).unwrap();
    assert_eq!(out["x"], Value::Null);
    callable.call(args(json!({"x": 4}))).unwrap();

    let err = callable.call(Arguments::new()).unwrap_err();
    let ToolError::InvalidArguments { fields, .. } = err else {
        panic!("expected invalid arguments");
    };
    assert_eq!(fields, vec!["x".to_string()]);
}

#[test]
fn optional_record_field_accepts_null() {
    let tool = echo(
        "ship",
        json!({
            "type": "object",
            "properties": {
                "addr": {
                    "type": "object",
                    "properties": {"street": {"type": "string"}, "zip": {"type": "integer"}},
                    "required": ["street"]
                }
            },
            "required": ["addr"]
        }),
    );
    let callable = CallableSynthesizer::new().synthesize(&tool, None, SynthesisOptions::default());

    callable.call(args(json!({"addr": {"street": "Main", "zip": null}}))).unwrap();

    let err = callable.call(args(json!({"addr": {"street": "Main", "zip": "x"}}))).unwrap_err();
    let ToolError::InvalidArguments { fields, .. } = err else {
        panic!("expected invalid arguments");
    };
    assert_eq!(fields, vec!["addr".to_string()]);
}

#[test]
fn shared_cache_reuses_records_across_tools() {
    let cache = Arc::new(TypeCache::new());
    let synth = CallableSynthesizer::with_types(TypeSynthesizer::with_cache(cache.clone()));
    let point = json!({"title": "Point", "type": "object", "properties": {"x": {"type": "number"}}});
    let schema = json!({"type": "object", "properties": {"p": point}});
    let a = synth.synthesize(&echo("a", schema.clone()), None, SynthesisOptions::default());
    let b = synth.synthesize(&echo("b", schema), None, SynthesisOptions::default());
    assert!(a.param("p").unwrap().ty.same_record(&b.param("p").unwrap().ty));
    assert_eq!(cache.len(), 1);
}

#[test]
fn unresolvable_ref_still_synthesizes() {
    let tool = echo(
        "loose",
        json!({"type": "object", "properties": {"cfg": {"$ref": "#/$defs/Missing"}}}),
    );
    let callable = CallableSynthesizer::new().synthesize(&tool, None, SynthesisOptions::with_type_docstring());
    assert_eq!(callable.param("cfg").unwrap().ty, TypeRef::Map);
    assert!(callable.doc().contains("cfg (object) (optional)"));
    callable.call(args(json!({"cfg": {"anything": 1}}))).unwrap();
}

#[test]
fn batch_conversion_keeps_every_tool() {
    let tools = vec![
        echo("ok", json!({"type": "object", "properties": {"a": {"type": "string"}}})),
        echo("bad_ref", json!({"type": "object", "properties": {"b": {"$ref": "#/nowhere"}}})),
        CanonicalTool::new("unimplemented", "", json!({})),
    ];
    let out = CallableSynthesizer::new().synthesize_all(&tools, None, SynthesisOptions::default());
    let names: Vec<&str> = out.iter().map(|c| c.name()).collect();
    assert_eq!(names, ["ok", "bad_ref", "unimplemented"]);
}
