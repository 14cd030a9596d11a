// SPDX-License-Identifier: MIT OR Apache-2.0
//! Integration tests for type synthesis: primitives, unions, refs, records and caching.

use serde_json::{Value, json};
use std::sync::Arc;
use tb_schema::{TypeCache, TypeRef, TypeSynthesizer, resolve};

fn synth(schema: &Value) -> TypeRef {
    TypeSynthesizer::new().to_type(schema, schema)
}

// ---------------------------------------------------------------------------
// Primitives and containers
// ---------------------------------------------------------------------------

#[test]
fn primitive_mapping() {
    assert_eq!(synth(&json!({"type": "string"})), TypeRef::String);
    assert_eq!(synth(&json!({"type": "integer"})), TypeRef::Integer);
    assert_eq!(synth(&json!({"type": "number"})), TypeRef::Float);
    assert_eq!(synth(&json!({"type": "boolean"})), TypeRef::Boolean);
    assert_eq!(synth(&json!({"type": "null"})), TypeRef::Null);
    assert_eq!(synth(&json!({})), TypeRef::Any);
}

#[test]
fn array_items_and_bare_array() {
    assert_eq!(
        synth(&json!({"type": "array", "items": {"type": "integer"}})),
        TypeRef::List(Box::new(TypeRef::Integer))
    );
    assert_eq!(
        synth(&json!({"type": "array"})),
        TypeRef::List(Box::new(TypeRef::Any))
    );
}

#[test]
fn object_without_properties_is_map() {
    assert_eq!(synth(&json!({"type": "object"})), TypeRef::Map);
    assert_eq!(synth(&json!({"type": "object", "properties": {}})), TypeRef::Map);
}

// ---------------------------------------------------------------------------
// Unions
// ---------------------------------------------------------------------------

#[test]
fn optional_string_from_any_of() {
    let t = synth(&json!({"anyOf": [{"type": "string"}, {"type": "null"}]}));
    assert_eq!(t, TypeRef::Optional(Box::new(TypeRef::String)));
}

#[test]
fn string_or_integer_union() {
    let t = synth(&json!({"anyOf": [{"type": "string"}, {"type": "integer"}]}));
    assert_eq!(t, TypeRef::Union(vec![TypeRef::String, TypeRef::Integer]));
}

#[test]
fn one_of_behaves_like_any_of() {
    let t = synth(&json!({"oneOf": [{"type": "boolean"}, {"type": "null"}]}));
    assert_eq!(t, TypeRef::Optional(Box::new(TypeRef::Boolean)));
}

#[test]
fn null_only_union() {
    assert_eq!(synth(&json!({"anyOf": [{"type": "null"}]})), TypeRef::Null);
    assert_eq!(synth(&json!({"anyOf": []})), TypeRef::Any);
}

#[test]
fn type_array_union() {
    let t = synth(&json!({"type": ["integer", "null"]}));
    assert_eq!(t, TypeRef::Optional(Box::new(TypeRef::Integer)));
}

#[test]
fn nullable_flag_makes_optional() {
    let t = synth(&json!({"type": "string", "nullable": true}));
    assert_eq!(t, TypeRef::Optional(Box::new(TypeRef::String)));
}

// ---------------------------------------------------------------------------
// Refs
// ---------------------------------------------------------------------------

#[test]
fn ref_resolution_yields_object_with_x() {
    let root = json!({
        "$defs": {"A": {"type": "object", "properties": {"x": {"type": "string"}}}}
    });
    let resolved = resolve(&json!({"$ref": "#/$defs/A"}), &root);
    assert_eq!(resolved.schema["type"], "object");
    assert_eq!(resolved.schema["properties"]["x"]["type"], "string");

    let t = TypeSynthesizer::new().to_type(&json!({"$ref": "#/$defs/A"}), &root);
    let record = t.as_record().expect("record");
    assert_eq!(record.field("x").unwrap().ty, TypeRef::String);
}

#[test]
fn nullable_sibling_of_ref_makes_optional() {
    let root = json!({"$defs": {"Id": {"type": "integer"}}});
    let t = TypeSynthesizer::new().to_type(&json!({"$ref": "#/$defs/Id", "nullable": true}), &root);
    assert_eq!(t, TypeRef::Integer.optional());

    let plain = TypeSynthesizer::new().to_type(&json!({"$ref": "#/$defs/Id"}), &root);
    assert_eq!(plain, TypeRef::Integer);
}

#[test]
fn unresolvable_ref_is_untyped_map() {
    let t = TypeSynthesizer::new().to_type(&json!({"$ref": "#/$defs/Missing"}), &json!({}));
    assert_eq!(t, TypeRef::Map);
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[test]
fn record_fields_follow_declaration_order() {
    let s = json!({
        "type": "object",
        "title": "Weather Query",
        "properties": {
            "city": {"type": "string", "description": "City"},
            "days": {"type": "integer", "default": 3},
            "units": {"type": "string", "enum": ["c", "f"]}
        },
        "required": ["city"]
    });
    let t = synth(&s);
    let record = t.as_record().unwrap();
    assert_eq!(record.name, "WeatherQuery");
    let names: Vec<&str> = record.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["city", "days", "units"]);
    let days = record.field("days").unwrap();
    assert!(!days.required);
    assert_eq!(days.default, Some(json!(3)));
    assert_eq!(days.annotation(), TypeRef::Optional(Box::new(TypeRef::Integer)));
    assert_eq!(record.field("city").unwrap().description, "City");
}

#[test]
fn round_trip_preserves_names_required_and_kinds() {
    let s = json!({
        "type": "object",
        "properties": {
            "name": {"type": "string"},
            "count": {"type": "integer"},
            "ratio": {"type": "number"},
            "on": {"type": "boolean"},
            "tags": {"type": "array", "items": {"type": "string"}},
            "point": {
                "type": "object",
                "properties": {"x": {"type": "number"}, "y": {"type": "number"}},
                "required": ["x", "y"]
            }
        },
        "required": ["name", "tags"]
    });
    let back = synth(&s).to_json_schema();
    assert_eq!(back["type"], "object");
    assert_eq!(back["required"], json!(["name", "tags"]));
    for (field, kind) in [
        ("name", "string"),
        ("count", "integer"),
        ("ratio", "number"),
        ("on", "boolean"),
        ("tags", "array"),
        ("point", "object"),
    ] {
        assert_eq!(back["properties"][field]["type"], kind, "field {field}");
    }
    assert_eq!(back["properties"]["tags"]["items"]["type"], "string");
    assert_eq!(back["properties"]["point"]["required"], json!(["x", "y"]));
}

// ---------------------------------------------------------------------------
// Caching
// ---------------------------------------------------------------------------

#[test]
fn same_schema_maps_to_same_record_instance() {
    let synth = TypeSynthesizer::new();
    let s = json!({"type": "object", "properties": {"q": {"type": "string"}}});
    let a = synth.to_type(&s, &s);
    let b = synth.to_type(&s, &s);
    assert!(a.same_record(&b));
    assert_eq!(synth.cache().len(), 1);
}

#[test]
fn shared_cache_across_synthesizers() {
    let cache = Arc::new(TypeCache::new());
    let one = TypeSynthesizer::with_cache(cache.clone());
    let two = TypeSynthesizer::with_cache(cache.clone());
    let s = json!({"type": "object", "properties": {"q": {"type": "string"}}});
    assert!(one.to_type(&s, &s).same_record(&two.to_type(&s, &s)));
    assert_eq!(cache.len(), 1);
}

#[test]
fn different_titles_are_different_records() {
    let synth = TypeSynthesizer::new();
    let a = json!({"type": "object", "title": "A", "properties": {"q": {"type": "string"}}});
    let b = json!({"type": "object", "title": "B", "properties": {"q": {"type": "string"}}});
    assert!(!synth.to_type(&a, &a).same_record(&synth.to_type(&b, &b)));
    assert_eq!(synth.cache().len(), 2);
}

#[test]
fn concurrent_synthesis_publishes_one_entry() {
    let synth = TypeSynthesizer::new();
    let s = json!({"type": "object", "properties": {"q": {"type": "string"}, "n": {"type": "integer"}}});
    let types: Vec<TypeRef> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| synth.to_type(&s, &s))).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(synth.cache().len(), 1);
    for t in &types[1..] {
        assert!(t.same_record(&types[0]));
    }
}

#[test]
fn bad_nested_record_degrades_only_that_field() {
    let s = json!({
        "type": "object",
        "properties": {
            "good": {"type": "string"},
            "bad": {"type": "object", "properties": {"": {"type": "string"}}}
        }
    });
    let t = synth(&s);
    let record = t.as_record().unwrap();
    assert_eq!(record.field("good").unwrap().ty, TypeRef::String);
    assert_eq!(record.field("bad").unwrap().ty, TypeRef::Map);
}
