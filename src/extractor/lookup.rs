//! Total lookups into an untrusted JSON tree.
//!
//! Every accessor walks a path of object keys (numeric segments index into
//! arrays) and falls back to a caller-supplied default on the first missing
//! or mistyped link. Nothing in here returns an error.

use serde_json::Value;

/// Follow `path` from `tree`, returning `None` as soon as a link is absent.
pub fn lookup<'a>(tree: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(tree, |node, segment| match node {
        Value::Object(map) => map.get(*segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// String at `path`, with numbers stringified. `null` counts as absent.
pub fn lookup_text(tree: &Value, path: &[&str]) -> Option<String> {
    match lookup(tree, path)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(number_text(n)),
        _ => None,
    }
}

/// Integral floats (`2020.0`) print without their fraction.
fn number_text(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}

pub fn text_or(tree: &Value, path: &[&str], default: &str) -> String {
    lookup_text(tree, path).unwrap_or_else(|| default.to_string())
}

/// Non-negative integer at `path`; negative or fractional values count as absent.
pub fn lookup_count(tree: &Value, path: &[&str]) -> Option<u32> {
    lookup(tree, path)?
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
}

pub fn count_or(tree: &Value, path: &[&str], default: u32) -> u32 {
    lookup_count(tree, path).unwrap_or(default)
}

/// Array at `path`, or an empty slice.
pub fn items<'a>(tree: &'a Value, path: &[&str]) -> &'a [Value] {
    lookup(tree, path)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
