use crate::ipc::error::ok;
use crate::ipc::helpers::{parse_group_filter, roster_mut, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value};

fn handle_summarize(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let filter = parse_group_filter(&req.params)?;
    let roster = roster_mut(&mut state.roster)?;
    let students = roster.list(filter);
    let scope = filter.label();
    let text = state.analyzer.analyze(&students, &scope);
    Ok(json!({
        "scope": scope,
        "studentCount": students.len(),
        "text": text
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "analysis.summarize" => Some(match handle_summarize(state, req) {
            Ok(v) => ok(&req.id, v),
            Err(e) => e.response(&req.id),
        }),
        _ => None,
    }
}
