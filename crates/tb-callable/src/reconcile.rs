// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reconcile caller-supplied argument names with the declared fields.

use serde_json::Value;
use tb_core::{AliasMap, Arguments};
use tracing::debug;

/// Property-level extension key listing accepted alternate names.
pub const ALIASES_KEY: &str = "x-aliases";

/// Collect `x-aliases` declared on each property of `schema`.
///
/// `{"properties": {"search_input": {"x-aliases": ["query"]}}}` yields
/// `{"query": "search_input"}`. An alias equal to its own field is skipped.
#[must_use]
pub fn aliases_from_schema(schema: &Value) -> AliasMap {
    let mut out = AliasMap::new();
    let Some(props) = schema.get("properties").and_then(Value::as_object) else {
        return out;
    };
    for (field, prop) in props {
        let aliases = prop.get(ALIASES_KEY).and_then(Value::as_array);
        for alias in aliases.into_iter().flatten().filter_map(Value::as_str) {
            if !alias.is_empty() && alias != field {
                out.entry(alias.to_owned()).or_insert_with(|| field.clone());
            }
        }
    }
    out
}

/// Declared property names of `schema`, in order.
#[must_use]
pub fn field_names(schema: &Value) -> Vec<&str> {
    schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|p| p.keys().map(String::as_str).collect())
        .unwrap_or_default()
}

/// Map `raw` onto the fields declared by `schema`.
///
/// Steps run in order:
/// 1. each alias present without its canonical field is renamed;
/// 2. a schema with one field, called with one unknown argument, gets that
///    value under its field name;
/// 3. any remaining unknown key whose lowercase alphanumerics match exactly
///    one absent field is renamed.
///
/// Keys are renamed but never dropped; unmatched keys stay for validation
/// to reject.
#[must_use]
pub fn reconcile(raw: Arguments, schema: &Value, aliases: &AliasMap) -> Arguments {
    let fields = field_names(schema);
    if raw.is_empty() || fields.is_empty() {
        return raw;
    }
    let mut args = raw;

    for (alias, canonical) in aliases {
        if !args.contains_key(canonical) {
            if let Some(value) = args.remove(alias) {
                debug!(target: "tb.callable.reconcile", alias = %alias, field = %canonical, "alias substituted");
                args.insert(canonical.clone(), value);
            }
        }
    }

    if let [only] = fields.as_slice() {
        if args.len() == 1 && !args.contains_key(*only) {
            let mut out = Arguments::new();
            if let Some((key, value)) = args.into_iter().next() {
                debug!(target: "tb.callable.reconcile", from = %key, field = %only, "single-field shortcut");
                out.insert((*only).to_owned(), value);
            }
            return out;
        }
    }

    let unknown: Vec<String> = args
        .keys()
        .filter(|k| !fields.contains(&k.as_str()))
        .cloned()
        .collect();
    for key in unknown {
        let simplified = simplify(&key);
        let mut matches = fields
            .iter()
            .filter(|f| simplify(f) == simplified && !args.contains_key(**f));
        let (Some(target), None) = (matches.next(), matches.next()) else {
            continue;
        };
        if let Some(value) = args.remove(&key) {
            debug!(target: "tb.callable.reconcile", from = %key, field = %target, "fuzzy match");
            args.insert((*target).to_owned(), value);
        }
    }
    args
}

fn simplify(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}
