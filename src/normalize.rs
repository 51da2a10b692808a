//! Field coercion for untrusted roster input.
//!
//! Every function here is total: bad input falls back to a default instead
//! of failing, so one broken cell never costs the whole row.

use crate::model::Group;

/// Stored in place of an empty name on direct add/update and snapshot load.
pub const NAME_PLACEHOLDER: &str = "(이름 없음)";

pub fn to_group(token: &str) -> Group {
    match token.trim().to_uppercase().as_str() {
        "B" => Group::B,
        "C" => Group::C,
        _ => Group::A,
    }
}

/// Leading integer of `token` (`"3.7"` -> 3, `"12반"` -> 12), or 1 when there
/// is none or it is not positive.
pub fn to_positive_int(token: &str) -> u32 {
    let t = token.trim();
    let (negative, digits) = match t.as_bytes().first() {
        Some(b'-') => (true, &t[1..]),
        Some(b'+') => (false, &t[1..]),
        _ => (false, t),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    if negative || end == 0 {
        return 1;
    }
    match digits[..end].parse::<u32>() {
        Ok(n) if n >= 1 => n,
        _ => 1,
    }
}

pub fn positive_int_from_json(v: &serde_json::Value) -> u32 {
    match v {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                u32::try_from(i).ok().filter(|n| *n >= 1).unwrap_or(1)
            } else if let Some(f) = n.as_f64() {
                to_positive_int(&f.trunc().to_string())
            } else {
                1
            }
        }
        serde_json::Value::String(s) => to_positive_int(s),
        _ => 1,
    }
}

/// Trimmed name, or the placeholder when nothing is left. Quotes are kept as
/// typed; CSV tokens go through `clean_quoted` first.
pub fn to_non_empty_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        NAME_PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn clean_quoted(token: &str) -> String {
    let t = token.trim();
    let inner = if t.len() >= 2 && t.starts_with('"') && t.ends_with('"') {
        &t[1..t.len() - 1]
    } else {
        t
    };
    inner.replace("\"\"", "\"").trim().to_string()
}
