use serde_json::Value;

use crate::ipc::error::err;
use crate::model::{GroupFilter, StudentInput};
use crate::normalize;
use crate::roster::Roster;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        HandlerErr {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> Value {
        err(id, self.code, self.message, self.details)
    }
}

pub fn no_workspace() -> HandlerErr {
    HandlerErr::new("no_workspace", "select a workspace first")
}

pub fn roster_mut(roster: &mut Option<Roster>) -> Result<&mut Roster, HandlerErr> {
    roster.as_mut().ok_or_else(no_workspace)
}

pub fn get_required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

/// `group` param as a filter; absent means all groups.
pub fn parse_group_filter(params: &Value) -> Result<GroupFilter, HandlerErr> {
    let raw = match params.get("group") {
        None | Some(Value::Null) => return Ok(GroupFilter::All),
        Some(v) => v.as_str().unwrap_or("?"),
    };
    GroupFilter::parse(raw).ok_or_else(|| HandlerErr {
        code: "bad_params",
        message: "group must be one of A, B, C, ALL".to_string(),
        details: Some(serde_json::json!({ "group": params.get("group") })),
    })
}

fn token_of(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Builds a student input from request params, starting from `base` so an
/// update only needs the fields it changes. Values pass through the same
/// coercions as CSV import.
pub fn student_input_from_params(
    params: &Value,
    base: Option<StudentInput>,
) -> Result<StudentInput, HandlerErr> {
    let name = params.get("name").map(|v| token_of(v).trim().to_string());
    let mut input = match (base, name) {
        (_, Some(n)) if n.is_empty() => {
            return Err(HandlerErr::new("bad_params", "name must not be empty"));
        }
        (Some(mut b), n) => {
            if let Some(n) = n {
                b.name = n;
            }
            b
        }
        (None, Some(n)) => StudentInput {
            grade: 1,
            school_class: 1,
            number: 1,
            group: normalize::to_group(""),
            name: n,
            phone: String::new(),
            remarks: String::new(),
        },
        (None, None) => return Err(HandlerErr::new("bad_params", "missing name")),
    };

    if let Some(v) = params.get("grade") {
        input.grade = normalize::positive_int_from_json(v);
    }
    if let Some(v) = params.get("schoolClass") {
        input.school_class = normalize::positive_int_from_json(v);
    }
    if let Some(v) = params.get("number") {
        input.number = normalize::positive_int_from_json(v);
    }
    if let Some(v) = params.get("group") {
        input.group = normalize::to_group(&token_of(v));
    }
    if let Some(v) = params.get("phone") {
        input.phone = token_of(v).trim().to_string();
    }
    if let Some(v) = params.get("remarks") {
        input.remarks = token_of(v).trim().to_string();
    }
    Ok(input)
}
