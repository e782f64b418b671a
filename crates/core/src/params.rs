//! Tolerant parameter extraction from a JSON `params` object.
//!
//! Scene parameters arrive as free-form JSON. Every getter falls back to the
//! supplied default when the key is missing or has the wrong type, so a
//! partially specified config always produces a runnable scene.

use serde_json::{json, Value};

/// Reads `params[name]` as `f64`, accepting integers too.
pub fn param_f64(params: &Value, name: &str, default: f64) -> f64 {
    params.get(name).and_then(Value::as_f64).unwrap_or(default)
}

/// Reads `params[name]` as `f64` and clamps it into `[min, max]`.
///
/// Non-finite values fall back to `default` before clamping.
pub fn param_f64_clamped(params: &Value, name: &str, default: f64, min: f64, max: f64) -> f64 {
    let v = param_f64(params, name, default);
    let v = if v.is_finite() { v } else { default };
    v.clamp(min, max)
}

/// Reads `params[name]` as a non-negative integer.
pub fn param_usize(params: &Value, name: &str, default: usize) -> usize {
    params
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}

pub fn param_bool(params: &Value, name: &str, default: bool) -> bool {
    params.get(name).and_then(Value::as_bool).unwrap_or(default)
}

pub fn param_string(params: &Value, name: &str, default: &str) -> String {
    params
        .get(name)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_owned()
}

/// Schema entry for a numeric parameter.
pub fn number_schema(default: f64, min: f64, max: f64, description: &str) -> Value {
    json!({
        "type": "number",
        "default": default,
        "min": min,
        "max": max,
        "description": description,
    })
}

/// Schema entry for an integer parameter.
pub fn integer_schema(default: usize, min: usize, max: usize, description: &str) -> Value {
    json!({
        "type": "integer",
        "default": default,
        "min": min,
        "max": max,
        "description": description,
    })
}

/// Schema entry for a boolean parameter.
pub fn bool_schema(default: bool, description: &str) -> Value {
    json!({
        "type": "boolean",
        "default": default,
        "description": description,
    })
}

/// Schema entry for a string parameter restricted to `options`.
pub fn choice_schema(default: &str, options: &[&str], description: &str) -> Value {
    json!({
        "type": "string",
        "default": default,
        "options": options,
        "description": description,
    })
}
