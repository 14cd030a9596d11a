// SPDX-License-Identifier: MIT OR Apache-2.0
//! Synthesized type descriptors.

use serde_json::{Map, Value, json};
use std::fmt;
use std::sync::Arc;

/// A structural type built from a JSON-Schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    /// No constraint.
    Any,
    /// The `null` type.
    Null,
    /// `string`.
    String,
    /// `integer`.
    Integer,
    /// `number`.
    Float,
    /// `boolean`.
    Boolean,
    /// Homogeneous list; element type is [`TypeRef::Any`] when `items` is absent.
    List(Box<TypeRef>),
    /// Untyped string-keyed map.
    Map,
    /// Named record with declared fields.
    Record(Arc<RecordType>),
    /// A value of the inner type, or null.
    Optional(Box<TypeRef>),
    /// One of several non-null types.
    Union(Vec<TypeRef>),
}

/// A named record synthesized from an object schema with properties.
///
/// Records are immutable once published to a [`TypeCache`](crate::TypeCache).
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    /// Identifier-safe record name.
    pub name: String,
    /// Fields in declaration order.
    pub fields: Vec<RecordField>,
}

/// One field of a [`RecordType`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordField {
    /// Field name as declared in `properties`.
    pub name: String,
    /// Declared type of the field value.
    pub ty: TypeRef,
    /// Whether the field appears in `required`.
    pub required: bool,
    /// Declared default, for optional fields.
    pub default: Option<Value>,
    /// Declared description, empty if none.
    pub description: String,
}

impl RecordField {
    /// Type a caller sees: optional fields accept null.
    #[must_use]
    pub fn annotation(&self) -> TypeRef {
        if self.required {
            self.ty.clone()
        } else {
            self.ty.clone().optional()
        }
    }
}

impl RecordType {
    /// Look a field up by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&RecordField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Names of required fields in declaration order.
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
    }

    /// Serialize back to an object schema.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            let mut prop = field.ty.to_json_schema();
            if let Value::Object(obj) = &mut prop {
                if !field.description.is_empty() {
                    obj.insert("description".into(), Value::String(field.description.clone()));
                }
                if let Some(default) = &field.default {
                    obj.insert("default".into(), default.clone());
                }
            }
            properties.insert(field.name.clone(), prop);
        }
        let required: Vec<&str> = self.required_fields().collect();
        json!({
            "type": "object",
            "title": self.name,
            "properties": properties,
            "required": required,
        })
    }
}

impl TypeRef {
    /// Wrap in [`TypeRef::Optional`] unless already nullable.
    #[must_use]
    pub fn optional(self) -> TypeRef {
        match self {
            TypeRef::Optional(_) | TypeRef::Null | TypeRef::Any => self,
            other => TypeRef::Optional(Box::new(other)),
        }
    }

    /// Whether `null` is an accepted value.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeRef::Optional(_) | TypeRef::Null | TypeRef::Any)
    }

    /// The record behind this type, looking through [`TypeRef::Optional`].
    #[must_use]
    pub fn as_record(&self) -> Option<&Arc<RecordType>> {
        match self {
            TypeRef::Record(r) => Some(r),
            TypeRef::Optional(inner) => inner.as_record(),
            _ => None,
        }
    }

    /// Whether `self` and `other` point at the same cached record instance.
    #[must_use]
    pub fn same_record(&self, other: &TypeRef) -> bool {
        match (self.as_record(), other.as_record()) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Whether `value` conforms to this type, shallowly for records.
    ///
    /// Records check only that the value is an object carrying every
    /// required field; nested field types are checked recursively.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (TypeRef::Any, _) => true,
            (TypeRef::Null, Value::Null) => true,
            (TypeRef::String, Value::String(_)) => true,
            (TypeRef::Integer, Value::Number(n)) => {
                n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            (TypeRef::Float, Value::Number(_)) => true,
            (TypeRef::Boolean, Value::Bool(_)) => true,
            (TypeRef::List(item), Value::Array(items)) => items.iter().all(|v| item.accepts(v)),
            (TypeRef::Map, Value::Object(_)) => true,
            (TypeRef::Record(record), Value::Object(obj)) => record.fields.iter().all(|f| {
                match obj.get(&f.name) {
                    Some(v) => f.annotation().accepts(v),
                    None => !f.required,
                }
            }),
            (TypeRef::Optional(_), Value::Null) => true,
            (TypeRef::Optional(inner), v) => inner.accepts(v),
            (TypeRef::Union(members), v) => members.iter().any(|m| m.accepts(v)),
            _ => false,
        }
    }

    /// Serialize back to a JSON-Schema fragment.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        match self {
            TypeRef::Any => json!({}),
            TypeRef::Null => json!({"type": "null"}),
            TypeRef::String => json!({"type": "string"}),
            TypeRef::Integer => json!({"type": "integer"}),
            TypeRef::Float => json!({"type": "number"}),
            TypeRef::Boolean => json!({"type": "boolean"}),
            TypeRef::List(item) if **item == TypeRef::Any => json!({"type": "array"}),
            TypeRef::List(item) => json!({"type": "array", "items": item.to_json_schema()}),
            TypeRef::Map => json!({"type": "object"}),
            TypeRef::Record(record) => record.to_json_schema(),
            TypeRef::Optional(inner) => {
                json!({"anyOf": [inner.to_json_schema(), {"type": "null"}]})
            }
            TypeRef::Union(members) => json!({
                "anyOf": members.iter().map(TypeRef::to_json_schema).collect::<Vec<_>>()
            }),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Any => f.write_str("any"),
            TypeRef::Null => f.write_str("null"),
            TypeRef::String => f.write_str("string"),
            TypeRef::Integer => f.write_str("integer"),
            TypeRef::Float => f.write_str("float"),
            TypeRef::Boolean => f.write_str("boolean"),
            TypeRef::List(item) => write!(f, "list[{item}]"),
            TypeRef::Map => f.write_str("map"),
            TypeRef::Record(record) => f.write_str(&record.name),
            TypeRef::Optional(inner) => write!(f, "optional[{inner}]"),
            TypeRef::Union(members) => {
                f.write_str("union[")?;
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{m}")?;
                }
                f.write_str("]")
            }
        }
    }
}
