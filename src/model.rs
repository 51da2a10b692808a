use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::normalize;

/// After-school class a student belongs to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(from = "String")]
pub enum Group {
    #[default]
    A,
    B,
    C,
}

impl Group {
    pub fn as_str(self) -> &'static str {
        match self {
            Group::A => "A",
            Group::B => "B",
            Group::C => "C",
        }
    }
}

// Snapshots are untrusted too: unknown groups coerce to A on load.
impl From<String> for Group {
    fn from(s: String) -> Self {
        normalize::to_group(&s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupFilter {
    All,
    Only(Group),
}

impl GroupFilter {
    /// Accepts `ALL`, `A`, `B`, `C` in any case. Blank means `ALL`.
    pub fn parse(s: &str) -> Option<GroupFilter> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" | "ALL" => Some(GroupFilter::All),
            "A" => Some(GroupFilter::Only(Group::A)),
            "B" => Some(GroupFilter::Only(Group::B)),
            "C" => Some(GroupFilter::Only(Group::C)),
            _ => None,
        }
    }

    pub fn matches(self, group: Group) -> bool {
        match self {
            GroupFilter::All => true,
            GroupFilter::Only(g) => g == group,
        }
    }

    /// Human-readable scope name used in export file names and summaries.
    pub fn label(self) -> String {
        match self {
            GroupFilter::All => "전체".to_string(),
            GroupFilter::Only(g) => format!("{}그룹", g.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    // Blank or missing ids are re-issued by the store on load.
    #[serde(default)]
    pub id: String,
    #[serde(default = "one", deserialize_with = "positive_int")]
    pub grade: u32,
    #[serde(default = "one", deserialize_with = "positive_int")]
    pub school_class: u32,
    #[serde(default = "one", deserialize_with = "positive_int")]
    pub number: u32,
    #[serde(default)]
    pub group: Group,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub remarks: String,
    pub created_at: DateTime<Utc>,
}

/// Editable part of a student; `id` and `created_at` belong to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentInput {
    pub grade: u32,
    pub school_class: u32,
    pub number: u32,
    pub group: Group,
    pub name: String,
    pub phone: String,
    pub remarks: String,
}

impl Student {
    pub fn input(&self) -> StudentInput {
        StudentInput {
            grade: self.grade,
            school_class: self.school_class,
            number: self.number,
            group: self.group,
            name: self.name.clone(),
            phone: self.phone.clone(),
            remarks: self.remarks.clone(),
        }
    }
}

fn one() -> u32 {
    1
}

fn positive_int<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    Ok(normalize::positive_int_from_json(&v))
}
