use serde::{Deserialize, Serialize};

use super::students::{default_active, split_name, status_label};
use super::{CsvRow, Resource, Searchable};

/// Teacher record as returned by `/teachers/`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Teacher {
    pub id: i64,
    #[serde(default)]
    pub teacher_id: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub qualification: Option<String>,
    #[serde(default)]
    pub experience_years: Option<u32>,
    #[serde(default)]
    pub office_room: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Create/update payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeacherForm {
    pub teacher_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub department: String,
    pub specialization: String,
    pub qualification: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<u32>,
}

impl From<&Teacher> for TeacherForm {
    fn from(teacher: &Teacher) -> Self {
        let (first_name, last_name) = split_name(teacher.full_name.as_deref().unwrap_or_default());
        Self {
            teacher_id: teacher.teacher_id.clone().unwrap_or_default(),
            email: teacher.email.clone().unwrap_or_default(),
            first_name,
            last_name,
            phone_number: String::new(),
            department: teacher.department.clone().unwrap_or_default(),
            specialization: teacher.specialization.clone().unwrap_or_default(),
            qualification: teacher.qualification.clone().unwrap_or_default(),
            experience_years: teacher.experience_years,
        }
    }
}

impl Resource for Teacher {
    const PATH: &'static str = "/teachers/";
    const LABEL: &'static str = "teachers";
    type Form = TeacherForm;
}

impl Searchable for Teacher {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            self.teacher_id.as_deref(),
            self.full_name.as_deref(),
            self.email.as_deref(),
            self.specialization.as_deref(),
        ]
    }
}

impl CsvRow for Teacher {
    const HEADER: &'static [&'static str] = &[
        "Teacher ID",
        "Name",
        "Email",
        "Department",
        "Specialization",
        "Experience",
        "Status",
    ];

    fn csv_row(&self) -> Vec<String> {
        vec![
            self.teacher_id.clone().unwrap_or_default(),
            self.full_name.clone().unwrap_or_default(),
            self.email.clone().unwrap_or_default(),
            self.department.clone().unwrap_or_default(),
            self.specialization.clone().unwrap_or_default(),
            format!("{} years", self.experience_years.unwrap_or(0)),
            status_label(self.is_active).to_string(),
        ]
    }
}

/// Search box plus the department dropdown
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeacherFilter {
    pub search: String,
    pub department: Option<String>,
}

impl TeacherFilter {
    pub fn matches(&self, teacher: &Teacher) -> bool {
        let department_matches = match self.department.as_deref() {
            None | Some("") => true,
            Some(department) => teacher.department.as_deref() == Some(department),
        };
        department_matches && teacher.matches_search(&self.search)
    }

    pub fn apply<'a>(&self, teachers: &'a [Teacher]) -> Vec<&'a Teacher> {
        teachers.iter().filter(|t| self.matches(t)).collect()
    }
}

/// Distinct non-empty departments, in first-seen order
pub fn departments(teachers: &[Teacher]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for department in teachers.iter().filter_map(|t| t.department.as_deref()) {
        if !department.is_empty() && !seen.iter().any(|d| d == department) {
            seen.push(department.to_string());
        }
    }
    seen
}
