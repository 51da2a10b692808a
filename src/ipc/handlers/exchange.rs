use crate::import::ImportOutcome;
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_required_str, parse_group_filter, roster_mut, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// CSV text from `params.text`, or read from `params.path`. An unreadable
/// file counts as empty input.
fn import_text(params: &Value) -> Result<String, HandlerErr> {
    if let Some(text) = params.get("text").and_then(|v| v.as_str()) {
        return Ok(text.to_string());
    }
    let path = get_required_str(params, "path")?;
    match std::fs::read(&path) {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "failed to read import file");
            Err(HandlerErr {
                code: "import_empty",
                message: format!("could not read import file: {e}"),
                details: Some(json!({ "path": path, "imported": 0 })),
            })
        }
    }
}

fn handle_import_csv(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let roster = roster_mut(&mut state.roster)?;
    let text = import_text(&req.params)?;
    match roster.import_csv(&text) {
        ImportOutcome::Imported {
            count,
            skipped,
            total_rows,
        } => Ok(json!({
            "imported": count,
            "skipped": skipped,
            "totalRows": total_rows
        })),
        ImportOutcome::NoUsableRows {
            skipped,
            total_rows,
        } => Err(HandlerErr {
            code: "import_no_rows",
            message: "no row had a usable name".to_string(),
            details: Some(json!({
                "imported": 0,
                "skipped": skipped,
                "totalRows": total_rows
            })),
        }),
        ImportOutcome::EmptyInput => Err(HandlerErr {
            code: "import_empty",
            message: "import file is empty".to_string(),
            details: Some(json!({ "imported": 0 })),
        }),
    }
}

fn write_bytes_file(path: &Path, contents: &[u8]) -> Result<(), HandlerErr> {
    let fail = |e: std::io::Error| HandlerErr {
        code: "export_failed",
        message: e.to_string(),
        details: Some(json!({ "path": path.to_string_lossy() })),
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(fail)?;
    }
    std::fs::write(path, contents).map_err(fail)?;
    Ok(())
}

fn handle_export_csv(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let filter = parse_group_filter(&req.params)?;
    let out_dir = get_required_str(&req.params, "outDir")?;
    let roster = roster_mut(&mut state.roster)?;

    let Some(file) = roster.export_csv(filter) else {
        return Err(HandlerErr {
            code: "export_empty",
            message: "no students to export".to_string(),
            details: Some(json!({ "scope": filter.label() })),
        });
    };

    let path = PathBuf::from(out_dir).join(&file.file_name);
    write_bytes_file(&path, &file.bytes)?;
    tracing::info!(path = %path.display(), rows = file.rows_exported, "roster csv exported");
    Ok(json!({
        "path": path.to_string_lossy(),
        "fileName": file.file_name,
        "rowsExported": file.rows_exported
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "roster.importCsv" => handle_import_csv(state, req),
        "roster.exportCsv" => handle_export_csv(state, req),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
