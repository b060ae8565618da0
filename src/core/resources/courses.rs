use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::teachers::Teacher;
use super::{Resource, Searchable};

/// Shown when a course has no teacher assigned
pub const UNASSIGNED_TEACHER: &str = "TBA";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CourseStatus {
    #[default]
    #[display("ACTIVE")]
    Active,
    #[display("COMPLETED")]
    Completed,
    #[display("CANCELLED")]
    Cancelled,
}

/// Course record as returned by `/courses/`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    #[serde(default)]
    pub course_code: Option<String>,
    #[serde(default)]
    pub course_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub teacher: Option<Teacher>,
    #[serde(default)]
    pub credits: Option<u32>,
    #[serde(default)]
    pub semester: Option<String>,
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub max_students: Option<u32>,
    #[serde(default)]
    pub enrolled_count: u32,
    #[serde(default)]
    pub is_full: bool,
    #[serde(default)]
    pub status: CourseStatus,
}

impl Course {
    pub fn teacher_name(&self) -> &str {
        self.teacher
            .as_ref()
            .and_then(|t| t.full_name.as_deref())
            .unwrap_or(UNASSIGNED_TEACHER)
    }

    /// "enrolled/max", e.g. "12/30"
    pub fn enrollment_label(&self) -> String {
        match self.max_students {
            Some(max) => format!("{}/{}", self.enrolled_count, max),
            None => self.enrolled_count.to_string(),
        }
    }
}

/// Create/update payload. The teacher is referenced by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseForm {
    pub course_code: String,
    pub course_name: String,
    pub description: String,
    pub teacher_id: Option<i64>,
    pub credits: u32,
    pub semester: String,
    pub academic_year: String,
    pub schedule: String,
    pub room: String,
    pub max_students: u32,
    pub status: CourseStatus,
}

impl Default for CourseForm {
    fn default() -> Self {
        Self {
            course_code: String::new(),
            course_name: String::new(),
            description: String::new(),
            teacher_id: None,
            credits: 3,
            semester: "1".to_string(),
            academic_year: String::new(),
            schedule: String::new(),
            room: String::new(),
            max_students: 30,
            status: CourseStatus::Active,
        }
    }
}

impl From<&Course> for CourseForm {
    fn from(course: &Course) -> Self {
        let defaults = Self::default();
        Self {
            course_code: course.course_code.clone().unwrap_or_default(),
            course_name: course.course_name.clone().unwrap_or_default(),
            description: course.description.clone().unwrap_or_default(),
            teacher_id: course.teacher.as_ref().map(|t| t.id),
            credits: course.credits.unwrap_or(defaults.credits),
            semester: course.semester.clone().unwrap_or(defaults.semester),
            academic_year: course.academic_year.clone().unwrap_or_default(),
            schedule: course.schedule.clone().unwrap_or_default(),
            room: course.room.clone().unwrap_or_default(),
            max_students: course.max_students.unwrap_or(defaults.max_students),
            status: course.status,
        }
    }
}

impl Resource for Course {
    const PATH: &'static str = "/courses/";
    const LABEL: &'static str = "courses";
    type Form = CourseForm;
}

impl Searchable for Course {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![self.course_code.as_deref(), self.course_name.as_deref()]
    }
}
