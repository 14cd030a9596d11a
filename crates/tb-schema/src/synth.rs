// SPDX-License-Identifier: MIT OR Apache-2.0
//! JSON Schema → [`TypeRef`] synthesis with an injectable record cache.

use crate::resolve::{Schema, lookup_ref};
use crate::types::{RecordField, RecordType, TypeRef};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// Deepest record nesting the synthesizer will build before degrading.
pub const MAX_RECORD_DEPTH: usize = 32;

/// Why a record could not be built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthesisError {
    /// A property name is empty or contains control characters.
    #[error("record '{record}' has an invalid field name {field:?}")]
    InvalidFieldName {
        /// Record being built.
        record: String,
        /// Offending property name.
        field: String,
    },
    /// Records nest deeper than [`MAX_RECORD_DEPTH`].
    #[error("record '{record}' exceeds the maximum nesting depth of {max}")]
    DepthExceeded {
        /// Record being built.
        record: String,
        /// The depth limit.
        max: usize,
    },
    /// The schema node has no properties to build a record from.
    #[error("schema has no properties")]
    NoProperties,
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Key of a cached record: its derived name plus a structural fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Derived record name.
    pub name: String,
    /// Hex SHA-256 of the serialized node (and of the root when the node
    /// contains a `$ref`, since the target depends on it).
    pub fingerprint: String,
}

impl CacheKey {
    fn new(name: &str, node: &Schema, root: &Value) -> Self {
        let body = serde_json::to_string(node).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(body.as_bytes());
        if body.contains("\"$ref\"") {
            hasher.update(root.to_string().as_bytes());
        }
        Self {
            name: name.to_owned(),
            fingerprint: format!("{:x}", hasher.finalize()),
        }
    }
}

/// Thread-safe store of synthesized records.
///
/// Entries are published once and never mutated. Share one cache across
/// synthesizers to share records, or give each session its own.
#[derive(Debug, Default)]
pub struct TypeCache {
    entries: RwLock<HashMap<CacheKey, Arc<RecordType>>>,
}

impl TypeCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a published record.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<Arc<RecordType>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Publish `record` unless another thread got there first; returns the
    /// entry that ends up in the cache.
    pub fn insert_if_absent(&self, key: CacheKey, record: RecordType) -> Arc<RecordType> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.entry(key).or_insert_with(|| Arc::new(record)).clone()
    }

    /// Number of cached records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached record. Previously handed-out `Arc`s stay valid.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

// ---------------------------------------------------------------------------
// Naming
// ---------------------------------------------------------------------------

/// Derive a record name for an object schema.
///
/// Uses `title` with everything but ASCII alphanumerics stripped; failing
/// that, `prefix` + up to three sorted, title-cased property names +
/// `Model`; failing that, `prefix` + `Model`.
#[must_use]
pub fn record_name(schema: &Schema, prefix: &str) -> String {
    if let Some(title) = schema.get("title").and_then(Value::as_str) {
        let clean: String = title.chars().filter(char::is_ascii_alphanumeric).collect();
        if !clean.is_empty() {
            return clean;
        }
    }
    if let Some(props) = schema.get("properties").and_then(Value::as_object) {
        if !props.is_empty() {
            let mut names: Vec<&str> = props.keys().map(String::as_str).collect();
            names.sort_unstable();
            let joined: String = names.iter().take(3).map(|n| title_case(n)).collect();
            return format!("{prefix}{joined}Model");
        }
    }
    format!("{prefix}Model")
}

/// Capitalize the first letter of every alphabetic run, lowercase the rest.
fn title_case(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut prev_alpha = false;
    for c in word.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Synthesizer
// ---------------------------------------------------------------------------

/// Builds [`TypeRef`]s from JSON Schema, caching records in a [`TypeCache`].
#[derive(Debug, Clone, Default)]
pub struct TypeSynthesizer {
    cache: Arc<TypeCache>,
}

struct Context<'a> {
    root: &'a Value,
    active_refs: Vec<String>,
    depth: usize,
}

impl TypeSynthesizer {
    /// Create a synthesizer with a private cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a synthesizer that publishes into `cache`.
    #[must_use]
    pub fn with_cache(cache: Arc<TypeCache>) -> Self {
        Self { cache }
    }

    /// The cache this synthesizer publishes into.
    #[must_use]
    pub fn cache(&self) -> &Arc<TypeCache> {
        &self.cache
    }

    /// Synthesize the type of `schema`, resolving `$ref`s against `root`.
    ///
    /// Never fails: records that cannot be built degrade to
    /// [`TypeRef::Map`] with a warning.
    pub fn to_type(&self, schema: &Value, root: &Value) -> TypeRef {
        let mut cx = Context {
            root,
            active_refs: Vec::new(),
            depth: 0,
        };
        self.synth(schema, &mut cx)
    }

    /// Build (or fetch) the record for an object schema, surfacing failures.
    pub fn try_record(&self, schema: &Value, root: &Value) -> Result<Arc<RecordType>, SynthesisError> {
        let obj = schema
            .as_object()
            .filter(|o| o.get("properties").and_then(Value::as_object).is_some_and(|p| !p.is_empty()))
            .ok_or(SynthesisError::NoProperties)?;
        let mut cx = Context {
            root,
            active_refs: Vec::new(),
            depth: 0,
        };
        self.record(obj, &mut cx)
    }

    fn synth(&self, schema: &Value, cx: &mut Context<'_>) -> TypeRef {
        let Some(obj) = schema.as_object().filter(|o| !o.is_empty()) else {
            return TypeRef::Any;
        };

        if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
            if cx.active_refs.iter().any(|r| r == reference) {
                debug!(target: "tb.schema.synth", reference, "recursive $ref, using untyped map");
                return TypeRef::Map;
            }
            let root = cx.root;
            let ty = match lookup_ref(reference, root) {
                Some(target) => {
                    cx.active_refs.push(reference.to_owned());
                    let out = self.synth_object(target, cx);
                    cx.active_refs.pop();
                    out
                }
                None => {
                    debug!(target: "tb.schema.synth", reference, "unresolvable $ref, using untyped map");
                    TypeRef::Map
                }
            };
            // Siblings of a `$ref` may still mark it nullable.
            return if obj.get("nullable").and_then(Value::as_bool) == Some(true) {
                ty.optional()
            } else {
                ty
            };
        }
        self.synth_object(obj, cx)
    }

    fn synth_object(&self, obj: &Schema, cx: &mut Context<'_>) -> TypeRef {
        let ty = self.synth_shape(obj, cx);
        if obj.get("nullable").and_then(Value::as_bool) == Some(true) {
            ty.optional()
        } else {
            ty
        }
    }

    fn synth_shape(&self, obj: &Schema, cx: &mut Context<'_>) -> TypeRef {
        if let Some(key) = ["anyOf", "oneOf"].into_iter().find(|k| obj.contains_key(*k)) {
            let members: Vec<TypeRef> = obj[key]
                .as_array()
                .into_iter()
                .flatten()
                .map(|m| self.synth(m, cx))
                .collect();
            return union_of(members);
        }

        match obj.get("type") {
            Some(Value::String(t)) => self.synth_named(t, obj, cx),
            Some(Value::Array(types)) => {
                let members = types
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|t| self.synth_named(t, obj, cx))
                    .collect();
                union_of(members)
            }
            _ if obj.get("properties").and_then(Value::as_object).is_some_and(|p| !p.is_empty()) => {
                self.record_or_map(obj, cx)
            }
            _ => TypeRef::Any,
        }
    }

    fn synth_named(&self, ty: &str, obj: &Schema, cx: &mut Context<'_>) -> TypeRef {
        match ty {
            "null" => TypeRef::Null,
            "string" => TypeRef::String,
            "integer" => TypeRef::Integer,
            "number" => TypeRef::Float,
            "boolean" => TypeRef::Boolean,
            "array" => match obj.get("items") {
                Some(items) => TypeRef::List(Box::new(self.synth(items, cx))),
                None => TypeRef::List(Box::new(TypeRef::Any)),
            },
            "object" => {
                let has_props = obj
                    .get("properties")
                    .and_then(Value::as_object)
                    .is_some_and(|p| !p.is_empty());
                if has_props {
                    self.record_or_map(obj, cx)
                } else {
                    TypeRef::Map
                }
            }
            _ => TypeRef::Any,
        }
    }

    fn record_or_map(&self, obj: &Schema, cx: &mut Context<'_>) -> TypeRef {
        match self.record(obj, cx) {
            Ok(record) => TypeRef::Record(record),
            Err(err) => {
                warn!(target: "tb.schema.synth", error = %err, "record synthesis failed, degrading to untyped map");
                TypeRef::Map
            }
        }
    }

    fn record(&self, obj: &Schema, cx: &mut Context<'_>) -> Result<Arc<RecordType>, SynthesisError> {
        let name = record_name(obj, "Dynamic");
        let key = CacheKey::new(&name, obj, cx.root);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }
        if cx.depth >= MAX_RECORD_DEPTH {
            return Err(SynthesisError::DepthExceeded {
                record: name,
                max: MAX_RECORD_DEPTH,
            });
        }

        let required: Vec<&str> = obj
            .get("required")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .collect();
        let Some(props) = obj.get("properties").and_then(Value::as_object) else {
            return Err(SynthesisError::NoProperties);
        };

        cx.depth += 1;
        let mut fields = Vec::with_capacity(props.len());
        for (field_name, field_schema) in props {
            if field_name.is_empty() || field_name.chars().any(char::is_control) {
                cx.depth -= 1;
                return Err(SynthesisError::InvalidFieldName {
                    record: name,
                    field: field_name.clone(),
                });
            }
            let is_required = required.contains(&field_name.as_str());
            fields.push(RecordField {
                name: field_name.clone(),
                ty: self.synth(field_schema, cx),
                required: is_required,
                default: if is_required {
                    None
                } else {
                    field_schema.get("default").cloned()
                },
                description: field_schema
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
            });
        }
        cx.depth -= 1;

        Ok(self.cache.insert_if_absent(key, RecordType { name, fields }))
    }
}

/// Fold union members: drop nulls, then optional / union / any.
fn union_of(members: Vec<TypeRef>) -> TypeRef {
    let has_null = members.iter().any(|m| *m == TypeRef::Null);
    let mut non_null: Vec<TypeRef> = members.into_iter().filter(|m| *m != TypeRef::Null).collect();
    match non_null.len() {
        0 if has_null => TypeRef::Null,
        0 => TypeRef::Any,
        1 => {
            let only = non_null.remove(0);
            if has_null { only.optional() } else { only }
        }
        _ => {
            let union = TypeRef::Union(non_null);
            if has_null { union.optional() } else { union }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn name_from_title_is_sanitized() {
        let s = json!({"title": "user profile-v2", "properties": {"a": {}}});
        assert_eq!(record_name(s.as_object().unwrap(), "Dynamic"), "userprofilev2");
    }

    #[test]
    fn name_from_sorted_properties() {
        let s = json!({"properties": {"zeta": {}, "alpha": {}, "user_id": {}, "beta": {}}});
        assert_eq!(
            record_name(s.as_object().unwrap(), "Dynamic"),
            "DynamicAlphaBetaUser_IdModel"
        );
    }

    #[test]
    fn name_fallback() {
        let s = json!({"title": "###"});
        assert_eq!(record_name(s.as_object().unwrap(), "Dynamic"), "DynamicModel");
    }

    #[test]
    fn union_folding() {
        assert_eq!(
            union_of(vec![TypeRef::String, TypeRef::Null]),
            TypeRef::Optional(Box::new(TypeRef::String))
        );
        assert_eq!(union_of(vec![]), TypeRef::Any);
        assert_eq!(union_of(vec![TypeRef::Integer]), TypeRef::Integer);
    }

    #[test]
    fn empty_field_name_degrades_to_map() {
        let synth = TypeSynthesizer::new();
        let s = json!({"type": "object", "properties": {"": {"type": "string"}}});
        assert_eq!(synth.to_type(&s, &s), TypeRef::Map);
        assert!(matches!(
            synth.try_record(&s, &s),
            Err(SynthesisError::InvalidFieldName { .. })
        ));
        assert!(synth.cache().is_empty());
    }

    #[test]
    fn recursive_ref_becomes_map_at_the_cycle() {
        let root = json!({
            "$defs": {
                "Node": {
                    "type": "object",
                    "title": "Node",
                    "properties": {
                        "value": {"type": "integer"},
                        "children": {"type": "array", "items": {"$ref": "#/$defs/Node"}}
                    }
                }
            }
        });
        let synth = TypeSynthesizer::new();
        let t = synth.to_type(&json!({"$ref": "#/$defs/Node"}), &root);
        let record = t.as_record().expect("record");
        assert_eq!(record.name, "Node");
        assert_eq!(
            record.field("children").unwrap().ty,
            TypeRef::List(Box::new(TypeRef::Map))
        );
    }

    #[test]
    fn cache_clear_keeps_handed_out_records() {
        let synth = TypeSynthesizer::new();
        let s = json!({"type": "object", "properties": {"x": {"type": "string"}}});
        let first = synth.to_type(&s, &s);
        synth.cache().clear();
        assert!(synth.cache().is_empty());
        let second = synth.to_type(&s, &s);
        assert!(!first.same_record(&second));
        assert_eq!(first, second);
    }
}
