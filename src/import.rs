use crate::csv;
use crate::model::StudentInput;
use crate::normalize::{clean_quoted, to_group, to_positive_int};

const COL_GRADE: usize = 0;
const COL_CLASS: usize = 1;
const COL_NUMBER: usize = 2;
const COL_GROUP: usize = 3;
const COL_NAME: usize = 4;
const COL_PHONE: usize = 5;
const COL_REMARKS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRows {
    pub rows: Vec<StudentInput>,
    /// Non-blank data lines seen after the header.
    pub total_rows: usize,
    /// Rows dropped because the name column was empty.
    pub skipped: usize,
}

/// Whole-import result as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported {
        count: usize,
        skipped: usize,
        total_rows: usize,
    },
    /// The text parsed but no row had a usable name.
    NoUsableRows { skipped: usize, total_rows: usize },
    /// Empty or unreadable input.
    EmptyInput,
}

/// Parses a roster CSV blob. The first line is a header and is discarded
/// without looking at it. Returns `None` for empty input.
pub fn parse_roster_csv(text: &str) -> Option<ParsedRows> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.trim().is_empty() {
        return None;
    }

    let mut rows = Vec::new();
    let mut total_rows = 0usize;
    let mut skipped = 0usize;
    for line in text.lines().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        total_rows += 1;
        match parse_row(line) {
            Some(row) => rows.push(row),
            None => skipped += 1,
        }
    }

    Some(ParsedRows {
        rows,
        total_rows,
        skipped,
    })
}

/// One data line to a student input, or `None` when the name is missing.
pub fn parse_row(line: &str) -> Option<StudentInput> {
    let fields: Vec<String> = csv::tokenize_line(line)
        .iter()
        .map(|t| clean_quoted(t))
        .collect();
    let field = |i: usize| fields.get(i).map(String::as_str).unwrap_or("");

    let name = field(COL_NAME);
    if name.is_empty() {
        return None;
    }

    Some(StudentInput {
        grade: to_positive_int(field(COL_GRADE)),
        school_class: to_positive_int(field(COL_CLASS)),
        number: to_positive_int(field(COL_NUMBER)),
        group: to_group(field(COL_GROUP)),
        name: name.to_string(),
        phone: field(COL_PHONE).to_string(),
        remarks: field(COL_REMARKS).to_string(),
    })
}
