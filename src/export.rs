use chrono::NaiveDate;

use crate::csv::{quote_always, quote_field};
use crate::model::Student;

pub const EXPORT_HEADER: &str = "학년,반,번호,그룹,이름,전화번호,비고";
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub rows_exported: usize,
}

/// Serializes an already filtered roster. Returns `None` for an empty set so
/// the caller never writes an empty file.
pub fn export_students_csv(
    students: &[Student],
    scope_label: &str,
    today: NaiveDate,
) -> Option<ExportFile> {
    if students.is_empty() {
        return None;
    }

    let mut sorted: Vec<&Student> = students.iter().collect();
    sort_for_export(&mut sorted);

    let mut lines = Vec::with_capacity(sorted.len() + 1);
    lines.push(EXPORT_HEADER.to_string());
    for s in &sorted {
        lines.push(format!(
            "{},{},{},{},{},{},{}",
            s.grade,
            s.school_class,
            s.number,
            s.group.as_str(),
            quote_field(&s.name),
            quote_field(&s.phone),
            quote_always(&s.remarks)
        ));
    }

    let body = lines.join("\n");
    let mut bytes = Vec::with_capacity(UTF8_BOM.len() + body.len());
    bytes.extend_from_slice(UTF8_BOM);
    bytes.extend_from_slice(body.as_bytes());

    Some(ExportFile {
        file_name: export_file_name(scope_label, today),
        bytes,
        rows_exported: sorted.len(),
    })
}

/// Group, then grade, class and number. `sort_by` is stable, so full ties
/// keep their roster order.
pub fn sort_for_export(students: &mut [&Student]) {
    students.sort_by(|a, b| {
        a.group
            .as_str()
            .cmp(b.group.as_str())
            .then(a.grade.cmp(&b.grade))
            .then(a.school_class.cmp(&b.school_class))
            .then(a.number.cmp(&b.number))
    });
}

pub fn export_file_name(scope_label: &str, today: NaiveDate) -> String {
    let label: String = scope_label
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();
    format!("학생명단_{}_{}.csv", label, today.format("%Y-%m-%d"))
}
