//! Index-path access into the nested-array wire format.

use serde_json::Value;

/// Walks `path` into `value`, returning `None` on the first missing step.
///
/// Negative indices count from the end of the array, as in `[-1]` for the
/// last element. `null` at the end of the path is treated as missing.
pub fn get_nested<'a>(value: &'a Value, path: &[isize]) -> Option<&'a Value> {
    let mut current = value;
    for (depth, &index) in path.iter().enumerate() {
        let next = current.as_array().and_then(|list| {
            let len = list.len() as isize;
            let resolved = if index < 0 { len + index } else { index };
            if (0..len).contains(&resolved) {
                list.get(resolved as usize)
            } else {
                None
            }
        });
        match next {
            Some(v) => current = v,
            None => {
                tracing::trace!(?path, depth, "Index path missed");
                return None;
            }
        }
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// Returns the string at `path`, if any.
pub fn get_str<'a>(value: &'a Value, path: &[isize]) -> Option<&'a str> {
    get_nested(value, path).and_then(Value::as_str)
}

/// Returns the non-empty string at `path`, if any.
pub fn get_non_empty_str<'a>(value: &'a Value, path: &[isize]) -> Option<&'a str> {
    get_str(value, path).filter(|s| !s.is_empty())
}

/// Returns the integer at `path`; floats with no fractional part are accepted.
pub fn get_i64(value: &Value, path: &[isize]) -> Option<i64> {
    let v = get_nested(value, path)?;
    v.as_i64().or_else(|| {
        v.as_f64()
            .filter(|f| f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

/// Returns the array at `path`, if any.
pub fn get_array<'a>(value: &'a Value, path: &[isize]) -> Option<&'a Vec<Value>> {
    get_nested(value, path).and_then(Value::as_array)
}
