use crate::ipc::error::ok;
use crate::ipc::helpers::{
    get_required_str, parse_group_filter, roster_mut, student_input_from_params, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::roster::{AlwaysConfirm, Answered, Confirmation};
use serde_json::{json, Value};

fn student_json(student: &crate::model::Student) -> Value {
    serde_json::to_value(student).unwrap_or(Value::Null)
}

fn handle_students_list(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let filter = parse_group_filter(&req.params)?;
    let roster = roster_mut(&mut state.roster)?;
    let students: Vec<Value> = roster.list(filter).iter().map(student_json).collect();
    Ok(json!({ "students": students }))
}

fn handle_students_create(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let roster = roster_mut(&mut state.roster)?;
    let input = student_input_from_params(&req.params, None)?;
    let student = roster.add(input);
    Ok(json!({ "student": student_json(&student) }))
}

fn handle_students_update(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let roster = roster_mut(&mut state.roster)?;
    let student_id = get_required_str(&req.params, "studentId")?;
    // Unknown ids are a silent no-op, same as the store.
    let Some(existing) = roster.get(&student_id).map(|s| s.input()) else {
        return Ok(json!({ "updated": false }));
    };
    let input = student_input_from_params(&req.params, Some(existing))?;
    let updated = roster.update(&student_id, input);
    Ok(json!({ "updated": updated }))
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let roster = roster_mut(&mut state.roster)?;
    let student_id = get_required_str(&req.params, "studentId")?;
    let answered;
    let confirm: &dyn Confirmation = match req.params.get("confirmed").and_then(|v| v.as_bool()) {
        Some(yes) => {
            answered = Answered(yes);
            &answered
        }
        None => &AlwaysConfirm,
    };
    let deleted = roster.delete(&student_id, confirm);
    Ok(json!({ "deleted": deleted }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "students.list" => handle_students_list(state, req),
        "students.create" => handle_students_create(state, req),
        "students.update" => handle_students_update(state, req),
        "students.delete" => handle_students_delete(state, req),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
