use std::collections::BTreeMap;

use crate::model::{Group, Student};

/// Turns the currently shown students into free-form text.
pub trait Analyzer {
    fn analyze(&self, students: &[Student], scope_label: &str) -> String;
}

/// Offline summary: head counts by group and grade, plus remark highlights.
pub struct LocalSummary;

impl Analyzer for LocalSummary {
    fn analyze(&self, students: &[Student], scope_label: &str) -> String {
        if students.is_empty() {
            return format!("[{scope_label}] 등록된 학생이 없습니다.");
        }

        let mut by_group: BTreeMap<Group, usize> = BTreeMap::new();
        let mut by_grade: BTreeMap<u32, usize> = BTreeMap::new();
        for s in students {
            *by_group.entry(s.group).or_default() += 1;
            *by_grade.entry(s.grade).or_default() += 1;
        }

        let mut lines = vec![format!("[{scope_label}] 총 {}명", students.len())];
        lines.push(format!(
            "그룹별: {}",
            by_group
                .iter()
                .map(|(g, n)| format!("{} {}명", g.as_str(), n))
                .collect::<Vec<_>>()
                .join(", ")
        ));
        lines.push(format!(
            "학년별: {}",
            by_grade
                .iter()
                .map(|(g, n)| format!("{}학년 {}명", g, n))
                .collect::<Vec<_>>()
                .join(", ")
        ));

        let noted: Vec<&Student> = students
            .iter()
            .filter(|s| !s.remarks.trim().is_empty())
            .collect();
        if !noted.is_empty() {
            lines.push(format!("비고가 있는 학생 {}명:", noted.len()));
            for s in noted {
                lines.push(format!("- {}: {}", s.name, s.remarks.trim()));
            }
        }
        lines.join("\n")
    }
}
