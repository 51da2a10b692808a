use chrono::{DateTime, Local, Utc};
use uuid::Uuid;

use crate::export::{self, ExportFile};
use crate::import::{self, ImportOutcome};
use crate::model::{GroupFilter, Student, StudentInput};
use crate::normalize;

// Draws from the injected generator before falling back to UUID v4.
const ID_ATTEMPTS: usize = 8;

/// Whole-snapshot persistence. `load` returns `None` when nothing was saved.
pub trait SnapshotStore {
    fn load(&self) -> anyhow::Result<Option<String>>;
    fn save(&self, snapshot: &str) -> anyhow::Result<()>;
}

pub trait IdGenerator {
    fn next_id(&self) -> String;
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Asked before a delete goes through.
pub trait Confirmation {
    fn confirm(&self, prompt: &str) -> bool;
}

pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub struct AlwaysConfirm;

impl Confirmation for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// A yes/no answer collected up front, e.g. by the UI before sending the request.
pub struct Answered(pub bool);

impl Confirmation for Answered {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

pub struct Roster {
    students: Vec<Student>,
    snapshots: Box<dyn SnapshotStore>,
    ids: Box<dyn IdGenerator>,
    clock: Box<dyn Clock>,
}

impl Roster {
    /// Reads the snapshot once. A missing or unreadable snapshot starts an
    /// empty roster; the problem is logged, never returned. Records are
    /// repaired one by one (see `restore`), so one bad entry costs only itself.
    pub fn open(
        snapshots: Box<dyn SnapshotStore>,
        ids: Box<dyn IdGenerator>,
        clock: Box<dyn Clock>,
    ) -> Roster {
        let students = match snapshots.load() {
            Ok(Some(text)) => match serde_json::from_str::<Vec<serde_json::Value>>(&text) {
                Ok(records) => restore(records, ids.as_ref()),
                Err(e) => {
                    tracing::warn!(error = %e, "roster snapshot is not valid; starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read roster snapshot; starting empty");
                Vec::new()
            }
        };
        tracing::debug!(count = students.len(), "roster loaded");
        Roster {
            students,
            snapshots,
            ids,
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn get(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    /// Insertion order; sorting belongs to export.
    pub fn list(&self, filter: GroupFilter) -> Vec<Student> {
        self.students
            .iter()
            .filter(|s| filter.matches(s.group))
            .cloned()
            .collect()
    }

    pub fn add(&mut self, input: StudentInput) -> Student {
        let student = self.mint(input);
        self.students.push(student.clone());
        self.persist();
        student
    }

    /// Replaces everything but `id` and `created_at`. Unknown ids are ignored.
    pub fn update(&mut self, id: &str, input: StudentInput) -> bool {
        let Some(existing) = self.students.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        let input = sanitize(input);
        existing.grade = input.grade;
        existing.school_class = input.school_class;
        existing.number = input.number;
        existing.group = input.group;
        existing.name = input.name;
        existing.phone = input.phone;
        existing.remarks = input.remarks;
        self.persist();
        true
    }

    pub fn delete(&mut self, id: &str, confirm: &dyn Confirmation) -> bool {
        let Some(pos) = self.students.iter().position(|s| s.id == id) else {
            return false;
        };
        let prompt = format!("{} 학생을 삭제할까요?", self.students[pos].name);
        if !confirm.confirm(&prompt) {
            return false;
        }
        self.students.remove(pos);
        self.persist();
        true
    }

    /// Appends every usable row of `text`; never replaces existing students.
    pub fn import_csv(&mut self, text: &str) -> ImportOutcome {
        let Some(parsed) = import::parse_roster_csv(text) else {
            return ImportOutcome::EmptyInput;
        };
        if parsed.rows.is_empty() {
            return ImportOutcome::NoUsableRows {
                skipped: parsed.skipped,
                total_rows: parsed.total_rows,
            };
        }

        let count = parsed.rows.len();
        for input in parsed.rows {
            let student = self.mint(input);
            self.students.push(student);
        }
        self.persist();
        tracing::info!(
            imported = count,
            skipped = parsed.skipped,
            "roster csv imported"
        );
        ImportOutcome::Imported {
            count,
            skipped: parsed.skipped,
            total_rows: parsed.total_rows,
        }
    }

    pub fn export_csv(&self, filter: GroupFilter) -> Option<ExportFile> {
        let students = self.list(filter);
        let today = self.clock.now().with_timezone(&Local).date_naive();
        export::export_students_csv(&students, &filter.label(), today)
    }

    fn mint(&self, input: StudentInput) -> Student {
        let id = unique_id(self.ids.as_ref(), |id| self.get(id).is_some());
        let input = sanitize(input);
        Student {
            id,
            grade: input.grade,
            school_class: input.school_class,
            number: input.number,
            group: input.group,
            name: input.name,
            phone: input.phone,
            remarks: input.remarks,
            created_at: self.clock.now(),
        }
    }

    fn persist(&self) {
        let text = match serde_json::to_string(&self.students) {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize roster snapshot");
                return;
            }
        };
        if let Err(e) = self.snapshots.save(&text) {
            tracing::error!(error = %e, "failed to write roster snapshot");
        }
    }
}

/// Rebuilds the roster from snapshot records. Unparseable records are
/// dropped, empty names get the placeholder and blank or repeated ids are
/// re-issued. Every repair is logged.
fn restore(records: Vec<serde_json::Value>, ids: &dyn IdGenerator) -> Vec<Student> {
    let mut students: Vec<Student> = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        let mut student = match serde_json::from_value::<Student>(record) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(index, error = %e, "dropping unreadable roster record");
                continue;
            }
        };
        if student.name.trim().is_empty() {
            tracing::warn!(index, id = %student.id, "roster record has no name; using placeholder");
        }
        student.name = normalize::to_non_empty_name(&student.name);
        if student.id.trim().is_empty() || students.iter().any(|s| s.id == student.id) {
            let fresh = unique_id(ids, |id| students.iter().any(|s| s.id == id));
            tracing::warn!(index, old = %student.id, new = %fresh, "re-issued roster id");
            student.id = fresh;
        }
        students.push(student);
    }
    students
}

fn unique_id(ids: &dyn IdGenerator, taken: impl Fn(&str) -> bool) -> String {
    for _ in 0..ID_ATTEMPTS {
        let id = ids.next_id();
        if !id.trim().is_empty() && !taken(&id) {
            return id;
        }
    }
    tracing::warn!(attempts = ID_ATTEMPTS, "id generator keeps repeating; using uuid v4");
    loop {
        let id = Uuid::new_v4().to_string();
        if !taken(&id) {
            return id;
        }
    }
}

// Typed input can still carry zeros or an empty name. Quotes are kept.
fn sanitize(mut input: StudentInput) -> StudentInput {
    input.grade = input.grade.max(1);
    input.school_class = input.school_class.max(1);
    input.number = input.number.max(1);
    input.name = normalize::to_non_empty_name(&input.name);
    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Group;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct MemorySnapshots {
        saved: Rc<RefCell<Option<String>>>,
        writes: Rc<Cell<usize>>,
        fail_load: bool,
        fail_save: bool,
    }

    impl SnapshotStore for MemorySnapshots {
        fn load(&self) -> anyhow::Result<Option<String>> {
            if self.fail_load {
                anyhow::bail!("disk on fire");
            }
            Ok(self.saved.borrow().clone())
        }

        fn save(&self, snapshot: &str) -> anyhow::Result<()> {
            if self.fail_save {
                anyhow::bail!("read-only volume");
            }
            *self.saved.borrow_mut() = Some(snapshot.to_string());
            self.writes.set(self.writes.get() + 1);
            Ok(())
        }
    }

    struct SeqIds(Cell<u32>);

    impl IdGenerator for SeqIds {
        fn next_id(&self) -> String {
            let n = self.0.get() + 1;
            self.0.set(n);
            format!("s{n}")
        }
    }

    struct SameId;

    impl IdGenerator for SameId {
        fn next_id(&self) -> String {
            "dup".to_string()
        }
    }

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn t0() -> DateTime<Utc> {
        "2024-03-01T09:00:00Z".parse().expect("timestamp")
    }

    fn open(mem: &MemorySnapshots) -> Roster {
        Roster::open(
            Box::new(mem.clone()),
            Box::new(SeqIds(Cell::new(0))),
            Box::new(FixedClock(t0())),
        )
    }

    fn input(name: &str, group: Group) -> StudentInput {
        StudentInput {
            grade: 1,
            school_class: 2,
            number: 3,
            group,
            name: name.to_string(),
            phone: String::new(),
            remarks: String::new(),
        }
    }

    #[test]
    fn add_assigns_id_and_timestamp_and_persists() {
        let mem = MemorySnapshots::default();
        let mut roster = open(&mem);
        let s = roster.add(input("Kim", Group::B));
        assert_eq!(s.id, "s1");
        assert_eq!(s.created_at, t0());
        assert_eq!(mem.writes.get(), 1);

        let reopened = open(&mem);
        assert_eq!(reopened.list(GroupFilter::All), vec![s]);
    }

    #[test]
    fn ids_never_collide_with_loaded_students() {
        let mem = MemorySnapshots::default();
        let mut first = open(&mem);
        first.add(input("Kim", Group::A));
        let mut second = open(&mem);
        let s = second.add(input("Lee", Group::A));
        assert_eq!(s.id, "s2");
    }

    #[test]
    fn list_filters_by_group_in_insertion_order() {
        let mem = MemorySnapshots::default();
        let mut roster = open(&mem);
        roster.add(input("c1", Group::C));
        roster.add(input("a1", Group::A));
        roster.add(input("c2", Group::C));
        let names: Vec<String> = roster
            .list(GroupFilter::Only(Group::C))
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["c1", "c2"]);
        assert_eq!(roster.list(GroupFilter::All).len(), 3);
    }

    #[test]
    fn update_keeps_id_and_created_at() {
        let mem = MemorySnapshots::default();
        let mut roster = open(&mem);
        let s = roster.add(input("Kim", Group::A));
        let mut changed = input("Kim Minsu", Group::C);
        changed.remarks = "moved".into();
        assert!(roster.update(&s.id, changed));
        let after = roster.get(&s.id).expect("student");
        assert_eq!(after.name, "Kim Minsu");
        assert_eq!(after.group, Group::C);
        assert_eq!(after.created_at, s.created_at);
        assert_eq!(mem.writes.get(), 2);
    }

    #[test]
    fn update_and_delete_of_unknown_id_are_silent() {
        let mem = MemorySnapshots::default();
        let mut roster = open(&mem);
        assert!(!roster.update("nope", input("x", Group::A)));
        assert!(!roster.delete("nope", &AlwaysConfirm));
        assert_eq!(mem.writes.get(), 0);
    }

    #[test]
    fn declined_confirmation_keeps_student() {
        let mem = MemorySnapshots::default();
        let mut roster = open(&mem);
        let s = roster.add(input("Kim", Group::A));
        assert!(!roster.delete(&s.id, &Answered(false)));
        assert_eq!(roster.len(), 1);
        assert!(roster.delete(&s.id, &Answered(true)));
        assert_eq!(roster.len(), 0);
        assert_eq!(mem.writes.get(), 2);
    }

    #[test]
    fn direct_add_fills_empty_name_and_zero_numbers() {
        let mem = MemorySnapshots::default();
        let mut roster = open(&mem);
        let mut raw = input("   ", Group::A);
        raw.grade = 0;
        let s = roster.add(raw);
        assert_eq!(s.name, normalize::NAME_PLACEHOLDER);
        assert_eq!(s.grade, 1);
    }

    #[test]
    fn direct_add_keeps_quotes_in_names() {
        let mem = MemorySnapshots::default();
        let mut roster = open(&mem);
        let bob = roster.add(input("\"Bob\"", Group::A));
        assert_eq!(bob.name, "\"Bob\"");
        let oneil = roster.add(input(" O\"\"Neil ", Group::A));
        assert!(roster.update(&oneil.id, input("O\"\"Neil", Group::B)));
        assert_eq!(roster.get(&oneil.id).map(|s| s.name.as_str()), Some("O\"\"Neil"));
    }

    #[test]
    fn repeating_id_generator_falls_back_to_uuid() {
        let mem = MemorySnapshots::default();
        let mut roster = Roster::open(
            Box::new(mem.clone()),
            Box::new(SameId),
            Box::new(FixedClock(t0())),
        );
        let first = roster.add(input("Kim", Group::A));
        let second = roster.add(input("Lee", Group::A));
        assert_eq!(first.id, "dup");
        assert_ne!(second.id, "dup");
        assert!(Uuid::parse_str(&second.id).is_ok());
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn failed_snapshot_write_keeps_memory_state() {
        let mem = MemorySnapshots {
            fail_save: true,
            ..Default::default()
        };
        let mut roster = open(&mem);
        let s = roster.add(input("Kim", Group::A));
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.get(&s.id), Some(&s));
        assert_eq!(mem.writes.get(), 0);
        assert!(mem.saved.borrow().is_none());
    }

    #[test]
    fn record_missing_fields_is_repaired_not_lost() {
        let mem = MemorySnapshots::default();
        *mem.saved.borrow_mut() = Some(
            serde_json::json!([
                { "id": "s1", "grade": 2, "schoolClass": 1, "number": 4, "group": "B",
                  "name": "Kim", "createdAt": "2024-03-01T09:00:00Z" },
                { "id": "s2", "schoolClass": 3, "name": "Lee",
                  "createdAt": "2024-03-01T09:00:00Z" },
                { "id": "s3", "name": "No timestamp" },
            ])
            .to_string(),
        );
        let roster = open(&mem);
        assert_eq!(roster.len(), 2);
        let lee = roster.get("s2").expect("lee kept");
        assert_eq!((lee.grade, lee.school_class, lee.number), (1, 3, 1));
        assert_eq!(lee.group, Group::A);
        assert!(roster.get("s3").is_none());
    }

    #[test]
    fn snapshot_with_blank_name_and_repeated_id_is_repaired() {
        let mem = MemorySnapshots::default();
        *mem.saved.borrow_mut() = Some(
            serde_json::json!([
                { "id": "s1", "name": "", "createdAt": "2024-03-01T09:00:00Z" },
                { "id": "s1", "name": "Lee", "createdAt": "2024-03-01T09:00:00Z" },
                { "name": "Park", "createdAt": "2024-03-01T09:00:00Z" },
            ])
            .to_string(),
        );
        let roster = open(&mem);
        let all = roster.list(GroupFilter::All);
        let names: Vec<&str> = all.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec![normalize::NAME_PLACEHOLDER, "Lee", "Park"]);
        let ids: Vec<&str> = all.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2", "s3"]);
    }

    #[test]
    fn corrupt_snapshot_starts_empty() {
        let mem = MemorySnapshots::default();
        *mem.saved.borrow_mut() = Some("{not json".to_string());
        let roster = open(&mem);
        assert_eq!(roster.len(), 0);
    }

    #[test]
    fn failing_load_starts_empty() {
        let mem = MemorySnapshots {
            fail_load: true,
            ..Default::default()
        };
        let roster = open(&mem);
        assert_eq!(roster.len(), 0);
    }

    #[test]
    fn import_appends_and_writes_once() {
        let mem = MemorySnapshots::default();
        let mut roster = open(&mem);
        roster.add(input("Existing", Group::B));

        let outcome = roster.import_csv(
            "학년,반,번호,그룹,이름,전화,비고\n1,2,3,a,Kim,010-1111,Good\n,,,,,,\n4,5,6,x,Park,,",
        );
        assert_eq!(
            outcome,
            ImportOutcome::Imported {
                count: 2,
                skipped: 1,
                total_rows: 3
            }
        );
        assert_eq!(mem.writes.get(), 2);

        let all = roster.list(GroupFilter::All);
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].name, "Existing");
        assert_eq!(all[1].name, "Kim");
        assert_eq!(all[1].group, Group::A);
        assert_eq!(all[2].group, Group::A);
        assert_ne!(all[1].id, all[2].id);
    }

    #[test]
    fn import_without_usable_rows_changes_nothing() {
        let mem = MemorySnapshots::default();
        let mut roster = open(&mem);
        assert_eq!(roster.import_csv(""), ImportOutcome::EmptyInput);
        assert_eq!(
            roster.import_csv("header\n,,,,,,\n"),
            ImportOutcome::NoUsableRows {
                skipped: 1,
                total_rows: 1
            }
        );
        assert_eq!(roster.len(), 0);
        assert_eq!(mem.writes.get(), 0);
    }

    #[test]
    fn export_uses_filter_scope() {
        let mem = MemorySnapshots::default();
        let mut roster = open(&mem);
        assert_eq!(roster.export_csv(GroupFilter::All), None);
        roster.add(input("Kim", Group::A));
        roster.add(input("Lee", Group::B));
        assert_eq!(roster.export_csv(GroupFilter::Only(Group::C)), None);

        let file = roster
            .export_csv(GroupFilter::Only(Group::B))
            .expect("export");
        assert_eq!(file.rows_exported, 1);
        assert!(file.file_name.starts_with("학생명단_B그룹_"));
    }
}
