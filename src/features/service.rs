//! Turns a raw JSON feature mapping into the ordered numeric vector the
//! scaler expects.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::common::error::{OncoError, OncoResult};

use super::domain::{canonical_key, FeatureSchema, FeatureVector, MissingPolicy};

/// Raw `features` object as received over the wire.
pub type RawFeatures = Map<String, Value>;

/// Validate presence, then coerce every canonical feature in column order.
pub fn order_features(
    schema: &FeatureSchema,
    policy: MissingPolicy,
    raw: &RawFeatures,
) -> OncoResult<FeatureVector> {
    if raw.is_empty() {
        return Err(OncoError::missing_input("Missing features data"));
    }

    // Keys spelled the training-time way ("worst radius"); exact keys still win.
    let aliases: HashMap<String, &Value> = raw
        .iter()
        .filter_map(|(key, value)| {
            let canonical = canonical_key(key);
            (canonical != *key).then_some((canonical, value))
        })
        .collect();

    let missing: Vec<&'static str> = schema
        .names()
        .iter()
        .copied()
        .filter(|name| lookup(raw, &aliases, name).is_none())
        .collect();

    if !missing.is_empty() && policy == MissingPolicy::Strict {
        return Err(OncoError::missing_features(&missing));
    }

    let mut values = Vec::with_capacity(schema.len());
    for name in schema.names() {
        let value = match lookup(raw, &aliases, name) {
            Some(value) => coerce(name, value)?,
            None => 0.0,
        };
        values.push(value);
    }

    Ok(FeatureVector {
        values,
        defaulted: missing,
    })
}

fn lookup<'a>(
    raw: &'a RawFeatures,
    aliases: &HashMap<String, &'a Value>,
    name: &str,
) -> Option<&'a Value> {
    raw.get(name)
        .or_else(|| aliases.get(name).copied())
        .filter(|v| !v.is_null())
}

/// Numbers pass through; strings are parsed the way a form field would be.
fn coerce(name: &str, value: &Value) -> OncoResult<f64> {
    let parsed = match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| OncoError::invalid_value(name, "number out of range"))?,
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
            OncoError::invalid_value(name, format!("could not convert '{s}' to float"))
        })?,
        other => {
            return Err(OncoError::invalid_value(
                name,
                format!("expected a number, got {}", json_type(other)),
            ))
        }
    };

    if !parsed.is_finite() {
        return Err(OncoError::invalid_value(name, "value must be finite"));
    }
    Ok(parsed)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
